use crate::core::metrics::Histogram;
use anyhow::Result;
use std::io::Write;

/// One `[lo,hi),count` line per bin; the last bin is written `[lo,hi],count`.
pub fn write(w: &mut dyn Write, hist: &Histogram) -> Result<()> {
    for row in hist.rows() {
        let close = if row.closed { ']' } else { ')' };
        writeln!(
            w,
            "[{:.6},{:.6}{},{}",
            row.lower, row.upper, close, row.count
        )?;
    }
    Ok(())
}
