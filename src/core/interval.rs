use crate::core::error::{CoverageError, Result};
use memchr::memchr;

/// One `bedtools genomecov -bga` row: `[start, end)` at a uniform depth.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IntervalRecord<'a> {
    pub chrom: &'a [u8],
    pub start: u64,
    pub end: u64,
    pub depth: u32,
}

impl IntervalRecord<'_> {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

enum NumError {
    Invalid,
    Overflow,
}

fn parse_u64(field: &[u8]) -> std::result::Result<u64, NumError> {
    if field.is_empty() {
        return Err(NumError::Invalid);
    }
    let mut v: u64 = 0;
    for &b in field {
        if !b.is_ascii_digit() {
            return Err(NumError::Invalid);
        }
        v = v
            .checked_mul(10)
            .and_then(|v| v.checked_add((b - b'0') as u64))
            .ok_or(NumError::Overflow)?;
    }
    Ok(v)
}

fn is_skipped(line: &[u8]) -> bool {
    line.is_empty()
        || line[0] == b'#'
        || line.starts_with(b"track")
        || line.starts_with(b"browser")
}

fn malformed(line_no: u64, reason: impl Into<String>) -> CoverageError {
    CoverageError::Parse {
        line: line_no,
        reason: reason.into(),
    }
}

/// Parses one line (without its `\n`). Blank, comment, `track` and `browser`
/// lines yield `Ok(None)`.
pub fn parse_line(line: &[u8], line_no: u64) -> Result<Option<IntervalRecord<'_>>> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if is_skipped(line) {
        return Ok(None);
    }

    let mut fields = [&line[..0]; 4];
    let mut rest = line;
    for (i, slot) in fields.iter_mut().enumerate() {
        match memchr(b'\t', rest) {
            Some(pos) => {
                *slot = &rest[..pos];
                rest = &rest[pos + 1..];
            }
            None if i == 3 => *slot = rest,
            None => {
                return Err(malformed(
                    line_no,
                    format!("expected 4 tab-separated fields, found {}", i + 1),
                ));
            }
        }
    }
    let [chrom, start, end, depth] = fields;

    if chrom.is_empty() {
        return Err(malformed(line_no, "empty chromosome name"));
    }
    let start = parse_u64(start).map_err(|_| {
        malformed(
            line_no,
            format!("invalid start '{}'", String::from_utf8_lossy(start)),
        )
    })?;
    let end = parse_u64(end).map_err(|_| {
        malformed(
            line_no,
            format!("invalid end '{}'", String::from_utf8_lossy(end)),
        )
    })?;
    if end < start {
        return Err(malformed(
            line_no,
            format!("end {} is before start {}", end, start),
        ));
    }
    let depth = match parse_u64(depth) {
        Ok(v) => u32::try_from(v).map_err(|_| CoverageError::DepthOverflow {
            line: line_no,
            value: v.to_string(),
        })?,
        Err(NumError::Overflow) => {
            return Err(CoverageError::DepthOverflow {
                line: line_no,
                value: String::from_utf8_lossy(depth).into_owned(),
            });
        }
        Err(NumError::Invalid) => {
            return Err(malformed(
                line_no,
                format!("invalid depth '{}'", String::from_utf8_lossy(depth)),
            ));
        }
    };
    if depth == 0 && end - start > u32::MAX as u64 {
        return Err(CoverageError::GapOverflow {
            line: line_no,
            length: end - start,
        });
    }

    Ok(Some(IntervalRecord {
        chrom,
        start,
        end,
        depth,
    }))
}

/// Lazily parses the records of a newline-aligned chunk.
///
/// `first_line` is the 1-based line number of the chunk's first line and is
/// only used for error messages. A final line without `\n` is still parsed.
pub struct Records<'a> {
    data: &'a [u8],
    pos: usize,
    line_no: u64,
}

impl<'a> Records<'a> {
    pub fn new(data: &'a [u8], first_line: u64) -> Self {
        Self {
            data,
            pos: 0,
            line_no: first_line,
        }
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<IntervalRecord<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.data.len() {
            let rest = &self.data[self.pos..];
            let (line, advance) = match memchr(b'\n', rest) {
                Some(nl) => (&rest[..nl], nl + 1),
                None => (rest, rest.len()),
            };
            self.pos += advance;
            let line_no = self.line_no;
            self.line_no += 1;
            match parse_line(line, line_no) {
                Ok(Some(rec)) => return Some(Ok(rec)),
                Ok(None) => continue,
                Err(e) => {
                    self.pos = self.data.len();
                    return Some(Err(e));
                }
            }
        }
        None
    }
}
