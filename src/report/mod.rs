//! CSV renderers and the staged writer that puts them on disk.

use crate::core::io::is_stdio;
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub mod histogram_csv;
pub mod summary_csv;

/// Float cell with six decimals, or `NA` when the statistic has no data.
pub fn fmt_stat(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.6}", v),
        None => "NA".to_string(),
    }
}

enum Sink {
    File { tmp: PathBuf, dest: PathBuf },
    Stdout(Vec<u8>),
}

/// A rendered report waiting to be published.
///
/// File targets are rendered into a sibling `<name>.tmp` and only renamed
/// over the destination by [`Staged::commit`]; dropping an uncommitted file
/// target removes the temporary file. Stdout targets are buffered in memory.
pub struct Staged {
    sink: Sink,
    committed: bool,
}

impl Staged {
    pub fn commit(mut self) -> Result<()> {
        match &self.sink {
            Sink::File { tmp, dest } => fs::rename(tmp, dest)
                .with_context(|| format!("failed to move output to {}", dest.display()))?,
            Sink::Stdout(buf) => {
                let mut out = io::stdout().lock();
                out.write_all(buf).context("failed to write to stdout")?;
                out.flush().context("failed to flush stdout")?;
            }
        }
        self.committed = true;
        Ok(())
    }
}

impl Drop for Staged {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Sink::File { tmp, .. } = &self.sink {
            let _ = fs::remove_file(tmp);
        }
    }
}

fn tmp_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".tmp");
    dest.with_file_name(name)
}

/// Renders a report for `dest` without touching `dest` itself.
pub fn stage<F>(dest: &Path, render: F) -> Result<Staged>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    if is_stdio(dest) {
        let mut buf = Vec::new();
        render(&mut buf)?;
        return Ok(Staged {
            sink: Sink::Stdout(buf),
            committed: false,
        });
    }

    let tmp = tmp_path(dest);
    let file =
        File::create(&tmp).with_context(|| format!("failed to create {}", tmp.display()))?;
    // From here on, dropping `staged` cleans up the temporary file.
    let staged = Staged {
        sink: Sink::File {
            tmp: tmp.clone(),
            dest: dest.to_path_buf(),
        },
        committed: false,
    };
    let mut w = BufWriter::new(file);
    render(&mut w)?;
    w.flush()
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    Ok(staged)
}
