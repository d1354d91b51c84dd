/// How the median of an even-sized sample is taken.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MedianMode {
    /// Mean of the two middle elements, indices `n/2 - 1` and `n/2`.
    #[default]
    Conventional,
    /// Mean of indices `n/2` and `n/2 + 1`, matching genomedepth 1.0 output.
    /// For `n == 2` the upper index is out of range and `n/2` is used twice.
    Legacy,
}

impl MedianMode {
    pub fn as_str(self) -> &'static str {
        match self {
            MedianMode::Conventional => "conventional",
            MedianMode::Legacy => "legacy",
        }
    }
}

pub const DEFAULT_BINS: usize = 20;

/// Settings applied when an aggregate is frozen into final metrics.
#[derive(Clone, Debug)]
pub struct FinalizeContext {
    pub median_mode: MedianMode,
    pub nbins: usize,
    pub depth_histogram: bool,
    pub gap_histogram: bool,
}

impl Default for FinalizeContext {
    fn default() -> Self {
        Self {
            median_mode: MedianMode::default(),
            nbins: DEFAULT_BINS,
            depth_histogram: false,
            gap_histogram: false,
        }
    }
}

/// Percentage of `part` in `whole`, or `None` when `whole` is zero.
pub fn percent_of(part: u64, whole: u64) -> Option<f64> {
    if whole == 0 {
        None
    } else {
        Some(part as f64 * 100.0 / whole as f64)
    }
}
