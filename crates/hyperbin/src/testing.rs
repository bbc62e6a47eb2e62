//! Canonical binnings and random inputs shared by tests and benchmarks.

use ndarray::Array2;
use rand::prelude::*;

use crate::binning::MemoryBinning;
use crate::geometry::{Cuboid, Point, Volume};

fn interval(low: f64, high: f64) -> Volume {
    Volume::from_cuboid(Cuboid::new(Point::from([low]), Point::from([high])))
}

fn rectangle(low: [f64; 2], high: [f64; 2]) -> Volume {
    Volume::from_cuboid(Cuboid::new(Point::from(low), Point::from(high)))
}

/// The square `[0,10]²` split at `x = 5`.
///
/// Volume 0 is the root and links to volume 1 (`[0,5]×[0,10]`, bin 0) and
/// volume 2 (`[5,10]×[0,10]`, bin 1). No primaries.
pub fn split_square() -> MemoryBinning {
    let mut binning = MemoryBinning::new();
    binning.append(rectangle([0.0, 0.0], [10.0, 10.0]), vec![1, 2]);
    binning.append(rectangle([0.0, 0.0], [5.0, 10.0]), vec![]);
    binning.append(rectangle([5.0, 0.0], [10.0, 10.0]), vec![]);
    binning
}

/// An uneven 1D hierarchy on `(0, 8]` whose bin numbers do not follow the
/// tree layout.
///
/// ```text
/// 0 (0,8] ─┬─ 1 (0,4] ─┬─ 3 (0,2] ─┬─ 7 (0,1]   bin 3
///          │           │           └─ 8 (1,2]   bin 4
///          │           └─ 4 (2,4]               bin 0
///          └─ 2 (4,8] ─┬─ 5 (4,6]               bin 1
///                      └─ 6 (6,8]               bin 2
/// ```
pub fn nested_intervals() -> MemoryBinning {
    let mut binning = MemoryBinning::new();
    binning.append(interval(0.0, 8.0), vec![1, 2]);
    binning.append(interval(0.0, 4.0), vec![3, 4]);
    binning.append(interval(4.0, 8.0), vec![5, 6]);
    binning.append(interval(0.0, 2.0), vec![7, 8]);
    binning.append(interval(2.0, 4.0), vec![]);
    binning.append(interval(4.0, 6.0), vec![]);
    binning.append(interval(6.0, 8.0), vec![]);
    binning.append(interval(0.0, 1.0), vec![]);
    binning.append(interval(1.0, 2.0), vec![]);
    binning
}

/// `n` unit intervals `(i, i+1]` with no links and no primaries.
pub fn flat_intervals(n: usize) -> MemoryBinning {
    let mut binning = MemoryBinning::new();
    for i in 0..n {
        binning.append(interval(i as f64, (i + 1) as f64), vec![]);
    }
    binning
}

/// Exclusive upper bound on the depth of [`bisected_interval`].
pub const MAX_BISECTION_DEPTH: u32 = 32;

/// `(0, 2^depth]` bisected `depth` times into unit intervals.
///
/// Volumes are stored breadth first, so volume `i` links to `2i+1` and
/// `2i+2` and the unit interval `(k, k+1]` is bin `k`, as in
/// [`flat_intervals`].
///
/// # Panics
///
/// Panics if `depth` is [`MAX_BISECTION_DEPTH`] or more.
pub fn bisected_interval(depth: u32) -> MemoryBinning {
    assert!(
        depth < MAX_BISECTION_DEPTH,
        "depth must be below {MAX_BISECTION_DEPTH}, got {depth}"
    );
    let mut binning = MemoryBinning::new();
    for level in 0..=depth {
        let width = f64::from(1_u32 << (depth - level));
        let first = (1_usize << level) - 1;
        for k in 0..(1_usize << level) {
            let index = first + k;
            let links = if level == depth {
                vec![]
            } else {
                vec![2 * index + 1, 2 * index + 2]
            };
            let low = k as f64 * width;
            binning.append(interval(low, low + width), links);
        }
    }
    binning
}

/// Random points, one per row, uniform in `[low, high)` on every axis.
///
/// # Panics
///
/// Panics if `high` is below `low`.
pub fn random_points(rows: usize, dimension: usize, seed: u64, low: f64, high: f64) -> Array2<f64> {
    assert!(high >= low, "high must not be below low, got [{low}, {high})");
    let mut rng = StdRng::seed_from_u64(seed);
    let width = high - low;
    Array2::from_shape_fn((rows, dimension), |_| low + rng.r#gen::<f64>() * width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binning::{Binning, HierarchicalBinning};

    #[test]
    fn test_bisected_matches_flat() {
        let bisected = bisected_interval(3);
        let flat = flat_intervals(8);
        assert_eq!(bisected.n_volumes(), 15);
        assert_eq!(bisected.n_bins(), 8);
        for x in [0.5, 1.0, 3.25, 4.0, 7.9, 8.0] {
            let point = Point::from([x]);
            assert_eq!(bisected.classify(&point), flat.classify(&point), "x = {x}");
        }
    }

    #[test]
    #[should_panic(expected = "depth must be below 32")]
    fn test_bisected_rejects_overflowing_depth() {
        bisected_interval(MAX_BISECTION_DEPTH);
    }

    #[test]
    #[should_panic(expected = "high must not be below low")]
    fn test_random_points_rejects_inverted_range() {
        random_points(1, 1, 0, 1.0, 0.0);
    }

    #[test]
    fn test_random_points_shape_and_range() {
        let points = random_points(100, 3, 7, -2.0, 2.0);
        assert_eq!(points.dim(), (100, 3));
        assert!(points.iter().all(|&v| (-2.0..2.0).contains(&v)));
        assert_eq!(points, random_points(100, 3, 7, -2.0, 2.0));
    }
}
