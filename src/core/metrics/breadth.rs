use crate::core::model::percent_of;

#[derive(Clone, Debug, PartialEq)]
pub struct BreadthRow {
    pub threshold: u32,
    pub bases: u64,
    pub percent: Option<f64>,
}

/// Bases at or above each configured depth threshold, filled in one pass.
///
/// Thresholds keep the caller's order; duplicates are counted independently.
#[derive(Clone, Debug, Default)]
pub struct BreadthCounters {
    thresholds: Vec<u32>,
    bases: Vec<u64>,
}

impl BreadthCounters {
    pub fn new(thresholds: &[u32]) -> Self {
        Self {
            thresholds: thresholds.to_vec(),
            bases: vec![0; thresholds.len()],
        }
    }

    pub fn record(&mut self, depth: u32, length: u64) {
        for (t, b) in self.thresholds.iter().zip(self.bases.iter_mut()) {
            if depth >= *t {
                *b += length;
            }
        }
    }

    pub fn merge(&mut self, other: &BreadthCounters) {
        debug_assert_eq!(self.thresholds, other.thresholds);
        for (b, o) in self.bases.iter_mut().zip(&other.bases) {
            *b += o;
        }
    }

    pub fn bases(&self) -> &[u64] {
        &self.bases
    }

    pub fn rows(&self, npos: u64) -> Vec<BreadthRow> {
        self.thresholds
            .iter()
            .zip(&self.bases)
            .map(|(&threshold, &bases)| BreadthRow {
                threshold,
                bases,
                percent: percent_of(bases, npos),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_threshold_counts() {
        let mut b = BreadthCounters::new(&[1, 3, 10]);
        b.record(3, 5);
        b.record(0, 3);
        b.record(3, 2);
        assert_eq!(b.bases(), &[7, 7, 0]);
        let rows = b.rows(10);
        assert_eq!(rows[1].percent, Some(70.0));
        assert_eq!(rows[2].percent, Some(0.0));
    }

    #[test]
    fn test_no_positions_is_no_data() {
        let b = BreadthCounters::new(&[1]);
        assert_eq!(b.rows(0)[0].percent, None);
    }

    #[test]
    fn test_merge_sums_counters() {
        let mut a = BreadthCounters::new(&[2, 2]);
        a.record(5, 4);
        let mut b = BreadthCounters::new(&[2, 2]);
        b.record(1, 4);
        b.record(2, 1);
        a.merge(&b);
        assert_eq!(a.bases(), &[5, 5]);
    }

    #[test]
    fn test_monotone_in_threshold() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let mut thresholds: Vec<u32> = (0..rng.random_range(1..12))
                .map(|_| rng.random_range(0..60))
                .collect();
            thresholds.sort_unstable();
            let mut b = BreadthCounters::new(&thresholds);
            for _ in 0..200 {
                b.record(rng.random_range(0..64), rng.random_range(0..1_000));
            }
            assert!(b.bases().windows(2).all(|w| w[0] >= w[1]));
        }
    }
}
