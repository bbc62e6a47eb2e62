//! Dense per-bin contents with a catch-all slot.

use std::path::Path;

use tracing::warn;

use crate::io::{self, PersistError};

/// Per-bin content and sum of squared weights.
///
/// Storage holds `n_bins + 1` slots. The last one is the catch-all: it
/// absorbs everything that has no bin (`None`) or an out-of-range bin.
///
/// ```
/// use hyperbin::BinContents;
///
/// let mut contents = BinContents::new(2);
/// contents.fill(Some(1), 2.0);
/// contents.fill(None, 0.5);
/// contents.fill(Some(7), 0.5);
///
/// assert_eq!(contents.content(Some(1)), 2.0);
/// assert_eq!(contents.catch_all(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BinContents {
    contents: Vec<f64>,
    sum_w2: Vec<f64>,
}

impl Default for BinContents {
    fn default() -> Self {
        Self::new(0)
    }
}

impl BinContents {
    /// A zeroed store for `n_bins` bins.
    pub fn new(n_bins: usize) -> Self {
        Self {
            contents: vec![0.0; n_bins + 1],
            sum_w2: vec![0.0; n_bins + 1],
        }
    }

    /// Resize to `n_bins` bins and zero everything.
    pub fn reset(&mut self, n_bins: usize) {
        self.contents.clear();
        self.contents.resize(n_bins + 1, 0.0);
        self.sum_w2.clear();
        self.sum_w2.resize(n_bins + 1, 0.0);
    }

    /// Number of true bins, catch-all excluded.
    #[inline]
    pub fn n_bins(&self) -> usize {
        self.contents.len() - 1
    }

    /// Storage slot of `bin`.
    ///
    /// `None` and `Some(n_bins)` map to the catch-all silently. Larger bin
    /// numbers are reported and map to the catch-all too.
    pub fn slot(&self, bin: Option<usize>) -> usize {
        let n_bins = self.n_bins();
        match bin {
            Some(bin) if bin <= n_bins => bin,
            Some(bin) => {
                warn!(bin, n_bins, "bin number out of range; using the catch-all slot");
                n_bins
            }
            None => n_bins,
        }
    }

    pub fn content(&self, bin: Option<usize>) -> f64 {
        self.contents[self.slot(bin)]
    }

    pub fn sum_w2(&self, bin: Option<usize>) -> f64 {
        self.sum_w2[self.slot(bin)]
    }

    /// Statistical error of the content: `sqrt(sum_w2)`.
    pub fn error(&self, bin: Option<usize>) -> f64 {
        self.sum_w2(bin).sqrt()
    }

    /// Content of the catch-all slot.
    pub fn catch_all(&self) -> f64 {
        self.contents[self.n_bins()]
    }

    pub fn set_content(&mut self, bin: Option<usize>, value: f64) {
        let slot = self.slot(bin);
        self.contents[slot] = value;
    }

    pub fn set_sum_w2(&mut self, bin: Option<usize>, value: f64) {
        let slot = self.slot(bin);
        self.sum_w2[slot] = value;
    }

    /// Add `weight` to the content and `weight²` to the sum of squares.
    pub fn fill(&mut self, bin: Option<usize>, weight: f64) {
        let slot = self.slot(bin);
        self.contents[slot] += weight;
        self.sum_w2[slot] += weight * weight;
    }

    /// Every slot's content, catch-all last.
    pub fn contents(&self) -> &[f64] {
        &self.contents
    }

    /// Every slot's sum of squared weights, catch-all last.
    pub fn sums_w2(&self) -> &[f64] {
        &self.sum_w2
    }

    pub fn read(dir: &Path) -> Result<Self, PersistError> {
        io::read_contents(dir)
    }

    pub fn write(&self, dir: &Path) -> Result<(), PersistError> {
        io::write_contents(self, dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use tracing_test::traced_test;

    #[test]
    fn test_new_is_zeroed() {
        let contents = BinContents::new(3);
        assert_eq!(contents.n_bins(), 3);
        assert_eq!(contents.contents(), &[0.0; 4]);
        assert_eq!(BinContents::default().n_bins(), 0);
    }

    #[test]
    fn test_fill_accumulates() {
        let mut contents = BinContents::new(2);
        contents.fill(Some(0), 3.0);
        contents.fill(Some(0), 4.0);

        assert_eq!(contents.content(Some(0)), 7.0);
        assert_eq!(contents.sum_w2(Some(0)), 25.0);
        assert_relative_eq!(contents.error(Some(0)), 5.0);
        assert_eq!(contents.content(Some(1)), 0.0);
    }

    #[test]
    #[traced_test]
    fn test_slot_mapping() {
        let contents = BinContents::new(4);
        assert_eq!(contents.slot(Some(2)), 2);
        assert_eq!(contents.slot(None), 4);
        assert_eq!(contents.slot(Some(4)), 4);
        assert!(!logs_contain("bin number out of range"));

        assert_eq!(contents.slot(Some(9)), 4);
        assert!(logs_contain("bin number out of range"));
    }

    #[test]
    fn test_reset_resizes_and_zeroes() {
        let mut contents = BinContents::new(2);
        contents.fill(Some(1), 1.0);
        contents.reset(5);
        assert_eq!(contents.n_bins(), 5);
        assert!(contents.contents().iter().all(|&c| c == 0.0));
        assert!(contents.sums_w2().iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_set_values() {
        let mut contents = BinContents::new(2);
        contents.set_content(Some(1), 2.5);
        contents.set_sum_w2(Some(1), 0.25);
        contents.set_content(None, -1.0);
        assert_eq!(contents.content(Some(1)), 2.5);
        assert_relative_eq!(contents.error(Some(1)), 0.5);
        assert_eq!(contents.catch_all(), -1.0);
    }

    proptest! {
        #[test]
        fn prop_unknown_bins_share_the_catch_all(n_bins in 0usize..64, extra in 1usize..1000, weight in 0.1f64..10.0) {
            let mut contents = BinContents::new(n_bins);
            contents.fill(None, weight);
            contents.fill(Some(n_bins + extra), weight);

            prop_assert_eq!(contents.slot(None), contents.slot(Some(n_bins + extra)));
            prop_assert!((0..n_bins).all(|b| contents.slot(Some(b)) != contents.slot(None)));
            prop_assert!((0..n_bins).all(|b| contents.content(Some(b)) == 0.0));
            prop_assert_eq!(contents.catch_all(), 2.0 * weight);
        }
    }
}
