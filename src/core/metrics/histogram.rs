use crate::core::error::{CoverageError, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct HistogramRow {
    pub lower: f64,
    pub upper: f64,
    pub count: u64,
    /// Only the last bin includes its upper bound.
    pub closed: bool,
}

/// Fixed-width histogram over a sorted sample.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    pub min: u32,
    pub max: u32,
    pub bin_width: f64,
    pub counts: Vec<u64>,
}

impl Histogram {
    /// Bins `sorted` (ascending) into `nbins` equal-width ranges in a single
    /// forward sweep. Bins `0..nbins-1` are half-open; the last bin is closed
    /// at `max` and takes everything the sweep has not assigned yet.
    pub fn from_sorted(sorted: &[u32], nbins: usize) -> Result<Self> {
        if nbins == 0 {
            return Err(CoverageError::InvalidBins);
        }
        let mut counts = vec![0u64; nbins];
        let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
            return Ok(Self {
                min: 0,
                max: 0,
                bin_width: 0.0,
                counts,
            });
        };
        let bin_width = (max - min) as f64 / nbins as f64;

        let mut idx = 0usize;
        for (bin, count) in counts.iter_mut().take(nbins - 1).enumerate() {
            let upper = min as f64 + bin_width * (bin + 1) as f64;
            while idx < sorted.len() && (sorted[idx] as f64) < upper {
                *count += 1;
                idx += 1;
            }
        }
        counts[nbins - 1] += (sorted.len() - idx) as u64;

        Ok(Self {
            min,
            max,
            bin_width,
            counts,
        })
    }

    pub fn nbins(&self) -> usize {
        self.counts.len()
    }

    pub fn total_count(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn rows(&self) -> Vec<HistogramRow> {
        let last = self.counts.len().saturating_sub(1);
        self.counts
            .iter()
            .enumerate()
            .map(|(i, &count)| {
                let lower = self.min as f64 + self.bin_width * i as f64;
                let upper = if i == last {
                    self.max as f64
                } else {
                    self.min as f64 + self.bin_width * (i + 1) as f64
                };
                HistogramRow {
                    lower,
                    upper,
                    count,
                    closed: i == last,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn ramp(n: u32) -> Vec<u32> {
        (0..n).map(|i| (i * 7919) % 503).collect::<Vec<_>>()
    }

    #[test]
    fn test_zero_bins_rejected() {
        assert!(matches!(
            Histogram::from_sorted(&[1, 2], 0),
            Err(CoverageError::InvalidBins)
        ));
    }

    #[test]
    fn test_empty_input_is_degenerate() {
        let h = Histogram::from_sorted(&[], 5).unwrap();
        assert_eq!(h.min, 0);
        assert_eq!(h.max, 0);
        assert_eq!(h.bin_width, 0.0);
        assert_eq!(h.counts, vec![0; 5]);
        assert_eq!(h.rows().len(), 5);
    }

    #[test]
    fn test_single_bin_spans_min_max() {
        let h = Histogram::from_sorted(&[2, 3, 3, 9], 1).unwrap();
        let rows = h.rows();
        assert_eq!(
            rows,
            vec![HistogramRow {
                lower: 2.0,
                upper: 9.0,
                count: 4,
                closed: true,
            }]
        );
    }

    #[test]
    fn test_half_open_bins() {
        // width 2.5: [0,2.5) [2.5,5) [5,7.5) [7.5,10]
        let h = Histogram::from_sorted(&[0, 1, 2, 3, 5, 5, 7, 8, 10], 4).unwrap();
        assert_eq!(h.bin_width, 2.5);
        assert_eq!(h.counts, vec![3, 1, 3, 2]);
    }

    #[test]
    fn test_constant_sample_lands_in_last_bin() {
        let h = Histogram::from_sorted(&[4, 4, 4], 3).unwrap();
        assert_eq!(h.counts, vec![0, 0, 3]);
        let rows = h.rows();
        assert_eq!(rows[2].lower, 4.0);
        assert_eq!(rows[2].upper, 4.0);
    }

    #[rstest]
    #[case(1)]
    #[case(5)]
    #[case(20)]
    #[case(1000)]
    fn test_counts_sum_to_sample_size(#[case] nbins: usize) {
        let mut values = ramp(10_007);
        values.sort_unstable();
        let h = Histogram::from_sorted(&values, nbins).unwrap();
        assert_eq!(h.nbins(), nbins);
        assert_eq!(h.total_count(), values.len() as u64);
        let rows = h.rows();
        assert_eq!(rows.last().unwrap().upper, *values.last().unwrap() as f64);
        assert!(rows.iter().rev().skip(1).all(|r| !r.closed));
    }

    #[test]
    fn test_every_element_inside_its_bin() {
        let mut values = ramp(2_000);
        values.sort_unstable();
        let h = Histogram::from_sorted(&values, 7).unwrap();
        let rows = h.rows();
        let mut idx = 0usize;
        for row in &rows {
            for _ in 0..row.count {
                let v = values[idx] as f64;
                assert!(v >= row.lower);
                if row.closed {
                    assert!(v <= row.upper);
                } else {
                    assert!(v < row.upper);
                }
                idx += 1;
            }
        }
        assert_eq!(idx, values.len());
    }
}
