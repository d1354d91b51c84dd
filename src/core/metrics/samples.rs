use crate::core::error::{CoverageError, Result};

/// Minimum number of elements added to the backing storage when it fills up.
pub const SAMPLE_BLOCK: usize = 1_000_000;

/// Append-only store of per-base samples.
///
/// Storage grows by at least [`SAMPLE_BLOCK`] elements at a time, and by half
/// the current capacity once that is larger, so appends stay amortized O(1)
/// on genome-sized inputs. Reservation is fallible: a failed grow surfaces as
/// [`CoverageError::Allocation`] instead of aborting the process.
#[derive(Clone, Debug, Default)]
pub struct SampleStore {
    values: Vec<u32>,
}

impl SampleStore {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn push(&mut self, value: u32) -> Result<()> {
        self.reserve_for(1)?;
        self.values.push(value);
        Ok(())
    }

    /// Appends `count` copies of `value`.
    pub fn push_run(&mut self, value: u32, count: u64) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let count = usize::try_from(count).map_err(|_| CoverageError::Allocation {
            requested: usize::MAX,
        })?;
        self.reserve_for(count)?;
        let new_len = self.values.len() + count;
        self.values.resize(new_len, value);
        Ok(())
    }

    /// Moves every element of `other` to the end of this store, keeping its
    /// order. An empty store takes over `other`'s buffer without copying.
    pub fn append(&mut self, mut other: SampleStore) -> Result<()> {
        if self.values.is_empty() {
            self.values = other.values;
            return Ok(());
        }
        self.reserve_for(other.len())?;
        self.values.append(&mut other.values);
        Ok(())
    }

    pub fn sort_ascending(&mut self) {
        self.values.sort_unstable();
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    fn reserve_for(&mut self, additional: usize) -> Result<()> {
        let len = self.values.len();
        let needed = len
            .checked_add(additional)
            .ok_or(CoverageError::Allocation {
                requested: additional,
            })?;
        let capacity = self.values.capacity();
        if needed <= capacity {
            return Ok(());
        }
        let step = SAMPLE_BLOCK.max(capacity / 2);
        let shortfall = needed - capacity;
        let blocks = shortfall.div_ceil(step);
        let grow = blocks
            .checked_mul(step)
            .ok_or(CoverageError::Allocation {
                requested: shortfall,
            })?;
        // try_reserve_exact counts from len, not capacity.
        let target = capacity.saturating_add(grow);
        self.values
            .try_reserve_exact(target - len)
            .map_err(|_| CoverageError::Allocation { requested: grow })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_preserves_insertion_order() {
        let mut store = SampleStore::new();
        for v in [5, 1, 4, 1, 3] {
            store.push(v).unwrap();
        }
        assert_eq!(store.as_slice(), &[5, 1, 4, 1, 3]);
    }

    #[test]
    fn test_growth_is_block_sized() {
        let mut store = SampleStore::new();
        store.push(7).unwrap();
        assert!(store.capacity() >= SAMPLE_BLOCK);
        let cap = store.capacity();
        store.push_run(7, (cap - 1) as u64).unwrap();
        assert_eq!(store.capacity(), cap);
        assert_eq!(store.len(), cap);
    }

    #[test]
    fn test_large_run_grows_in_one_step() {
        let mut store = SampleStore::new();
        store.push_run(2, (SAMPLE_BLOCK + 10) as u64).unwrap();
        assert_eq!(store.len(), SAMPLE_BLOCK + 10);
        assert!(store.capacity() >= 2 * SAMPLE_BLOCK);
    }

    #[test]
    fn test_growth_step_scales_with_capacity() {
        let mut store = SampleStore::new();
        store.push_run(1, (3 * SAMPLE_BLOCK) as u64).unwrap();
        let cap = store.capacity();
        assert!(cap >= 3 * SAMPLE_BLOCK);
        store.push_run(1, (cap - store.len()) as u64).unwrap();
        assert_eq!(store.capacity(), cap);
        store.push(1).unwrap();
        assert_eq!(store.capacity(), cap + cap / 2);
    }

    #[test]
    fn test_zero_run_is_noop() {
        let mut store = SampleStore::new();
        store.push_run(9, 0).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.capacity(), 0);
    }

    #[test]
    fn test_sort_ascending_keeps_multiset() {
        let mut store = SampleStore::new();
        for v in [9, 0, 3, 3, 0, 12] {
            store.push(v).unwrap();
        }
        let before: u64 = store.as_slice().iter().map(|&v| v as u64).sum();
        store.sort_ascending();
        let after: u64 = store.as_slice().iter().map(|&v| v as u64).sum();
        assert_eq!(store.as_slice(), &[0, 0, 3, 3, 9, 12]);
        assert_eq!(before, after);
    }

    #[test]
    fn test_append_keeps_order() {
        let mut a = SampleStore::new();
        a.push_run(1, 2).unwrap();
        let mut b = SampleStore::new();
        b.push_run(4, 3).unwrap();
        a.append(b).unwrap();
        assert_eq!(a.as_slice(), &[1, 1, 4, 4, 4]);
    }

    #[test]
    fn test_append_into_empty_reuses_buffer() {
        let mut b = SampleStore::new();
        b.push_run(4, 3).unwrap();
        let ptr = b.as_slice().as_ptr();
        let mut a = SampleStore::new();
        a.append(b).unwrap();
        assert_eq!(a.as_slice(), &[4, 4, 4]);
        assert_eq!(a.as_slice().as_ptr(), ptr);
    }
}
