//! Totals, means and medians over sorted sample slices.
//!
//! Every function here expects `values` sorted ascending where order matters
//! (median); empty input always yields `None` rather than a division by zero.

use crate::core::model::MedianMode;

/// Sum of all samples. `u128` because base count times depth overflows `u64`
/// on deep whole-genome data.
pub fn total(values: &[u32]) -> u128 {
    values.iter().map(|&v| v as u128).sum()
}

pub fn mean(values: &[u32]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(total(values) as f64 / values.len() as f64)
}

pub fn median(values: &[u32], mode: MedianMode) -> Option<f64> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    let mid = n / 2;
    if n % 2 == 1 {
        return Some(values[mid] as f64);
    }
    let (lo, hi) = match mode {
        MedianMode::Conventional => (values[mid - 1], values[mid]),
        MedianMode::Legacy => {
            let upper = values.get(mid + 1).copied().unwrap_or(values[mid]);
            (values[mid], upper)
        }
    };
    Some((lo as f64 + hi as f64) / 2.0)
}

/// Samples left after dropping the `skip` smallest ones.
///
/// Used for covered-only statistics: zero depths sort first, so skipping the
/// number of empty bases leaves exactly the covered bases.
pub fn tail(values: &[u32], skip: u64) -> &[u32] {
    let skip = usize::try_from(skip).unwrap_or(usize::MAX).min(values.len());
    &values[skip..]
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Summary {
    pub count: u64,
    pub total: u128,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

pub fn summarize(values: &[u32], mode: MedianMode) -> Summary {
    Summary {
        count: values.len() as u64,
        total: total(values),
        mean: mean(values),
        median: median(values, mode),
    }
}
