use thiserror::Error;

/// Fatal conditions raised by the coverage core. Every variant aborts the run.
#[derive(Debug, Error)]
pub enum CoverageError {
    #[error("malformed record at line {line}: {reason}")]
    Parse { line: u64, reason: String },

    #[error("depth {value} at line {line} does not fit in 32 bits (max {max})", max = u32::MAX)]
    DepthOverflow { line: u64, value: String },

    #[error("zero-depth run of {length} bases at line {line} does not fit in 32 bits")]
    GapOverflow { line: u64, length: u64 },

    #[error("failed to grow sample storage by {requested} elements")]
    Allocation { requested: usize },

    #[error("histogram bin count must be >= 1")]
    InvalidBins,
}

pub type Result<T> = std::result::Result<T, CoverageError>;
