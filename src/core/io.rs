use anyhow::{Context, Result, bail};
use memchr::{memchr, memchr_iter, memrchr};
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct MmapSource {
    mmap: Mmap,
}

impl MmapSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        // SAFETY: read-only file mapping.
        let mmap = unsafe { Mmap::map(&file) }.with_context(|| "mmap failed")?;
        Ok(Self { mmap })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.mmap
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }
}

#[derive(Clone, Debug)]
pub enum ChunkData {
    MmapRange { start: usize, end: usize },
    Owned(Vec<u8>),
}

/// A run of whole lines. `first_line` is the 1-based number of its first line.
#[derive(Clone, Debug)]
pub struct Chunk {
    pub index: usize,
    pub first_line: u64,
    pub data: ChunkData,
    pub timing: ChunkTiming,
}

impl Chunk {
    /// Resolves the chunk bytes, borrowing from `source` for mapped input.
    pub fn bytes<'a>(&'a self, source: Option<&'a MmapSource>) -> Option<&'a [u8]> {
        match &self.data {
            ChunkData::MmapRange { start, end } => source.map(|s| &s.bytes()[*start..*end]),
            ChunkData::Owned(data) => Some(data.as_slice()),
        }
    }
}

pub const CHUNK_SIZE: usize = 16 * 1024 * 1024;
const READ_BUF: usize = 8 * 1024 * 1024;

#[derive(Clone, Copy, Debug, Default)]
pub struct ChunkTiming {
    pub bytes: usize,
    pub read: Duration,
    pub align: Duration,
}

fn count_lines(bytes: &[u8]) -> u64 {
    let newlines = memchr_iter(b'\n', bytes).count() as u64;
    match bytes.last() {
        Some(b'\n') | None => newlines,
        Some(_) => newlines + 1,
    }
}

pub struct MmapChunker {
    data: Arc<MmapSource>,
    pos: usize,
    chunk_size: usize,
    index: usize,
    next_line: u64,
}

impl MmapChunker {
    pub fn new(data: Arc<MmapSource>, chunk_size: usize) -> Self {
        Self {
            data,
            pos: 0,
            chunk_size: chunk_size.max(1),
            index: 0,
            next_line: 1,
        }
    }

    pub fn next_chunk(&mut self) -> Option<Chunk> {
        let bytes = self.data.bytes();
        let len = bytes.len();
        if self.pos >= len {
            return None;
        }
        let t_align = Instant::now();
        let start = self.pos;
        let target = (start + self.chunk_size).min(len);
        let end = if target >= len {
            len
        } else {
            match memchr(b'\n', &bytes[target - 1..]) {
                Some(off) => target + off,
                None => len,
            }
        };
        self.pos = end;
        let first_line = self.next_line;
        self.next_line += count_lines(&bytes[start..end]);
        let chunk = Chunk {
            index: self.index,
            first_line,
            data: ChunkData::MmapRange { start, end },
            timing: ChunkTiming {
                bytes: end - start,
                read: Duration::ZERO,
                align: t_align.elapsed(),
            },
        };
        self.index += 1;
        Some(chunk)
    }
}

/// Newline-aligned chunks from a sequential reader such as stdin.
pub struct ReaderChunker {
    reader: Box<dyn Read + Send>,
    buffer: Vec<u8>,
    read_buf: Vec<u8>,
    chunk_size: usize,
    index: usize,
    eof: bool,
    next_line: u64,
    acc_read: Duration,
    acc_align: Duration,
}

impl ReaderChunker {
    pub fn new(reader: Box<dyn Read + Send>, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            reader,
            buffer: Vec::with_capacity(chunk_size + (chunk_size / 4)),
            read_buf: vec![0u8; READ_BUF.min(chunk_size)],
            chunk_size,
            index: 0,
            eof: false,
            next_line: 1,
            acc_read: Duration::ZERO,
            acc_align: Duration::ZERO,
        }
    }

    pub fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        loop {
            if self.buffer.len() >= self.chunk_size || (self.eof && !self.buffer.is_empty()) {
                let t_align = Instant::now();
                let cut = if self.eof {
                    Some(self.buffer.len())
                } else {
                    memrchr(b'\n', &self.buffer).map(|nl| nl + 1)
                };
                self.acc_align += t_align.elapsed();
                if let Some(cut) = cut {
                    let tail = self.buffer.split_off(cut);
                    let chunk_bytes = std::mem::replace(&mut self.buffer, tail);
                    return Ok(Some(self.emit(chunk_bytes)));
                }
                // No newline yet: one very long line, keep reading.
            }

            if self.eof {
                return Ok(None);
            }

            let t_read = Instant::now();
            let n = self.reader.read(&mut self.read_buf).with_context(|| {
                format!("read error at chunk {} (line {})", self.index, self.next_line)
            })?;
            self.acc_read += t_read.elapsed();
            if n == 0 {
                self.eof = true;
                continue;
            }
            self.buffer.extend_from_slice(&self.read_buf[..n]);
        }
    }

    fn emit(&mut self, bytes: Vec<u8>) -> Chunk {
        let first_line = self.next_line;
        self.next_line += count_lines(&bytes);
        let chunk = Chunk {
            index: self.index,
            first_line,
            timing: ChunkTiming {
                bytes: bytes.len(),
                read: self.acc_read,
                align: self.acc_align,
            },
            data: ChunkData::Owned(bytes),
        };
        self.acc_read = Duration::ZERO;
        self.acc_align = Duration::ZERO;
        self.index += 1;
        chunk
    }
}

pub enum InputSource {
    Mmap { chunker: MmapChunker },
    Reader { chunker: ReaderChunker },
}

impl InputSource {
    /// Opens `path`, or stdin when the path is `-`.
    pub fn open(path: &Path, chunk_size: usize) -> Result<(Self, Option<Arc<MmapSource>>)> {
        if is_stdio(path) {
            let chunker = ReaderChunker::new(Box::new(io::stdin()), chunk_size);
            return Ok((InputSource::Reader { chunker }, None));
        }
        reject_compressed(path)?;
        let size = std::fs::metadata(path)
            .with_context(|| format!("failed to stat {}", path.display()))?
            .len();
        if size == 0 {
            let chunker = ReaderChunker::new(Box::new(io::empty()), chunk_size);
            return Ok((InputSource::Reader { chunker }, None));
        }
        let source = Arc::new(MmapSource::open(path)?);
        let chunker = MmapChunker::new(Arc::clone(&source), chunk_size);
        Ok((InputSource::Mmap { chunker }, Some(source)))
    }

    pub fn from_reader(reader: Box<dyn Read + Send>, chunk_size: usize) -> Self {
        InputSource::Reader {
            chunker: ReaderChunker::new(reader, chunk_size),
        }
    }

    pub fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        match self {
            InputSource::Mmap { chunker } => Ok(chunker.next_chunk()),
            InputSource::Reader { chunker } => chunker.next_chunk(),
        }
    }
}

/// `-` stands for stdin on input and stdout on output.
pub fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn reject_compressed(path: &Path) -> Result<()> {
    let mut file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut magic = [0u8; 2];
    let n = file
        .read(&mut magic)
        .with_context(|| "failed to read magic bytes")?;
    if n == 2 && magic == [0x1f, 0x8b] {
        bail!(
            "{} is gzip-compressed; decompress it first (e.g. zcat | genomedepth)",
            path.display()
        );
    }
    Ok(())
}
