use super::breadth::BreadthRow;

/// Headline numbers for one run. `None` marks a statistic with no data
/// (empty input, no covered bases, or no gaps).
#[derive(Clone, Debug, PartialEq)]
pub struct CoverageSummary {
    pub genome_size: u64,
    pub total_bases: u128,
    pub empty_bases: u64,
    pub num_gaps: u64,
    pub breadth_1x: Option<f64>,
    pub breadth: Vec<BreadthRow>,
    pub mean_depth: Option<f64>,
    pub mean_depth_covered: Option<f64>,
    pub mean_gap_size: Option<f64>,
    pub median_depth: Option<f64>,
    pub median_depth_covered: Option<f64>,
    pub median_gap_size: Option<f64>,
}
