use crate::core::error::Result;
use crate::core::interval::IntervalRecord;
use crate::core::model::{FinalizeContext, percent_of};

pub mod breadth;
pub mod histogram;
pub mod order_stats;
pub mod samples;
mod summary;

pub use breadth::{BreadthCounters, BreadthRow};
pub use histogram::{Histogram, HistogramRow};
pub use samples::SampleStore;
pub use summary::CoverageSummary;

/// Running accumulators for one pass over the interval records.
///
/// Partial aggregates built from consecutive pieces of the input can be
/// combined with [`Agg::merge`]; merging in input order gives the same
/// result as a single sequential pass.
#[derive(Clone, Debug, Default)]
pub struct Agg {
    pub records: u64,
    pub npos: u64,
    pub ngaps: u64,
    pub empty_bases: u64,
    pub depths: SampleStore,
    pub gaps: SampleStore,
    pub breadth: BreadthCounters,
}

impl Agg {
    pub fn new(thresholds: &[u32]) -> Self {
        Self {
            records: 0,
            npos: 0,
            ngaps: 0,
            empty_bases: 0,
            depths: SampleStore::new(),
            gaps: SampleStore::new(),
            breadth: BreadthCounters::new(thresholds),
        }
    }

    pub fn update_record(&mut self, rec: &IntervalRecord<'_>) -> Result<()> {
        self.records += 1;
        let length = rec.len();
        if length == 0 {
            return Ok(());
        }

        self.depths.push_run(rec.depth, length)?;
        self.npos += length;

        if rec.depth == 0 {
            // Gap lengths are bounded by the parser.
            self.gaps.push(length as u32)?;
            self.ngaps += 1;
            self.empty_bases += length;
        }

        self.breadth.record(rec.depth, length);
        Ok(())
    }

    /// Appends `other`, which must cover the input right after `self`.
    pub fn merge(&mut self, other: Agg) -> Result<()> {
        self.records += other.records;
        self.npos += other.npos;
        self.ngaps += other.ngaps;
        self.empty_bases += other.empty_bases;
        self.depths.append(other.depths)?;
        self.gaps.append(other.gaps)?;
        self.breadth.merge(&other.breadth);
        Ok(())
    }

    /// Sorts the collected samples and derives every reported statistic.
    pub fn finalize(mut self, ctx: &FinalizeContext) -> Result<FinalMetrics> {
        self.depths.sort_ascending();
        self.gaps.sort_ascending();

        let depths = self.depths.as_slice();
        let gaps = self.gaps.as_slice();
        let covered = order_stats::tail(depths, self.empty_bases);

        let all = order_stats::summarize(depths, ctx.median_mode);
        let covered = order_stats::summarize(covered, ctx.median_mode);
        let gap = order_stats::summarize(gaps, ctx.median_mode);

        let summary = CoverageSummary {
            genome_size: self.npos,
            total_bases: all.total,
            empty_bases: self.empty_bases,
            num_gaps: self.ngaps,
            breadth_1x: percent_of(self.npos - self.empty_bases, self.npos),
            breadth: self.breadth.rows(self.npos),
            mean_depth: all.mean,
            mean_depth_covered: covered.mean,
            mean_gap_size: gap.mean,
            median_depth: all.median,
            median_depth_covered: covered.median,
            median_gap_size: gap.median,
        };

        let depth_histogram = if ctx.depth_histogram {
            Some(Histogram::from_sorted(depths, ctx.nbins)?)
        } else {
            None
        };
        let gap_histogram = if ctx.gap_histogram {
            Some(Histogram::from_sorted(gaps, ctx.nbins)?)
        } else {
            None
        };

        Ok(FinalMetrics {
            summary,
            depth_histogram,
            gap_histogram,
        })
    }
}

pub struct FinalMetrics {
    pub summary: CoverageSummary,
    pub depth_histogram: Option<Histogram>,
    pub gap_histogram: Option<Histogram>,
}
