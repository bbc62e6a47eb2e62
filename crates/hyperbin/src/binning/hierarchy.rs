//! Hierarchical binnings and the descent that classifies points into them.
//!
//! Testing a point against every bin is linear in the number of bins. A
//! hierarchical binning instead stores a tree (more generally, a DAG) of
//! [`Volume`]s: internal volumes carry links to the child volumes that tile
//! them, and only link-less (terminal) volumes are bins. Classification
//! tests a handful of volumes per level and walks down to a terminal one.
//!
//! ```text
//!   volume index          0                    internal
//!                  ┌──────┴──────┐
//!                  1             2             internal
//!               ┌──┴──┐       ┌──┴──┐
//!               3     4       5     6          3: internal, 4,5,6: bins
//!             ┌─┴─┐
//!             7   8                            bins
//!
//!   bin number:  4 → 0, 5 → 1, 6 → 2, 7 → 3, 8 → 4
//! ```
//!
//! Bin numbers are handed out to terminal volumes in volume-index order, so
//! they do not follow the tree layout.
//!
//! # Overlaps
//!
//! Siblings, and roots, are tested in stored order and the first volume that
//! contains the point wins. Overlapping volumes are not an error: the result
//! then depends on storage order.

use std::borrow::Cow;

use tracing::{debug, info, warn};

use super::validate::{check_hierarchy, HierarchyError};
use super::Binning;
use crate::cache::Cached;
use crate::geometry::{Cuboid, Point, Volume};

/// Default bound on the number of link hops during classification.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Disk-resident binnings above this many volumes report cache rebuilds.
const VERBOSE_REBUILD_THRESHOLD: usize = 2_000_000;

// =============================================================================
// BinNumbering
// =============================================================================

/// Two-way map between volume indices and bin numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinNumbering {
    bin_of_volume: Vec<Option<usize>>,
    volume_of_bin: Vec<usize>,
}

impl BinNumbering {
    /// Number the terminal volumes in index order.
    ///
    /// `terminal` yields, for each volume in index order, whether it has no
    /// links.
    pub fn from_terminal_flags(terminal: impl IntoIterator<Item = bool>) -> Self {
        let mut n_bins = 0;
        let bin_of_volume: Vec<Option<usize>> = terminal
            .into_iter()
            .map(|is_terminal| {
                if is_terminal {
                    n_bins += 1;
                    Some(n_bins - 1)
                } else {
                    None
                }
            })
            .collect();

        let mut volume_of_bin = vec![0; n_bins];
        for (volume, bin) in bin_of_volume.iter().enumerate() {
            if let Some(bin) = *bin {
                volume_of_bin[bin] = volume;
            }
        }

        Self {
            bin_of_volume,
            volume_of_bin,
        }
    }

    #[inline]
    pub fn n_bins(&self) -> usize {
        self.volume_of_bin.len()
    }

    /// Bin number of a volume; `None` for internal or unknown volumes.
    #[inline]
    pub fn bin_of(&self, volume: usize) -> Option<usize> {
        self.bin_of_volume.get(volume).copied().flatten()
    }

    /// Volume index of a bin.
    #[inline]
    pub fn volume_of(&self, bin: usize) -> Option<usize> {
        self.volume_of_bin.get(bin).copied()
    }

    /// Bin number for every volume, indexed by volume.
    pub fn bins_by_volume(&self) -> &[Option<usize>] {
        &self.bin_of_volume
    }

    /// Volume index for every bin, indexed by bin number.
    pub fn volumes_by_bin(&self) -> &[usize] {
        &self.volume_of_bin
    }
}

// =============================================================================
// HierarchyCache
// =============================================================================

/// Derived state of a hierarchical binning.
///
/// Every structural mutation of the owning binning must call
/// [`invalidate`](Self::invalidate).
#[derive(Debug, Clone, Default)]
pub struct HierarchyCache {
    limits: Cached<Cuboid>,
    numbering: Cached<BinNumbering>,
}

impl HierarchyCache {
    pub fn invalidate(&mut self) {
        self.limits.invalidate();
        self.numbering.invalidate();
    }

    /// Whether every derived value is current.
    pub fn is_current(&self) -> bool {
        self.limits.is_valid() && self.numbering.is_valid()
    }

    pub fn is_numbering_current(&self) -> bool {
        self.numbering.is_valid()
    }
}

// =============================================================================
// HierarchicalBinning Trait
// =============================================================================

/// A binning stored as a hierarchy of volumes.
///
/// Storage variants supply the accessors; the classification algorithm and
/// the derived caches are provided here.
///
/// Volumes are addressed by *volume index*; bins by *bin number*. Only
/// terminal volumes (those without links) have a bin number.
///
/// # Primary volumes
///
/// When primaries are present they are the only roots tested, and the global
/// bounding box is computed from them alone. They are expected to cover the
/// whole binning.
pub trait HierarchicalBinning: Binning {
    /// Number of stored volumes (internal and terminal).
    fn n_volumes(&self) -> usize;

    /// Volume at `index`.
    fn volume(&self, index: usize) -> Option<Cow<'_, Volume>>;

    /// Child volume indices of the volume at `index`. Empty for bins.
    fn links(&self, index: usize) -> Option<Cow<'_, [usize]>>;

    fn n_primaries(&self) -> usize;

    /// Volume index of the `i`-th primary volume.
    fn primary(&self, i: usize) -> Option<usize>;

    fn cache(&self) -> &HierarchyCache;

    /// Bound on link hops during classification.
    fn max_depth(&self) -> usize {
        DEFAULT_MAX_DEPTH
    }

    /// Whether the volume at `index` exists and has no links.
    fn is_terminal(&self, index: usize) -> bool {
        self.links(index).is_some_and(|links| links.is_empty())
    }

    fn volume_contains(&self, index: usize, point: &Point) -> bool {
        self.volume(index).is_some_and(|volume| volume.contains(point))
    }

    // -------------------------------------------------------------------------
    // Derived caches
    // -------------------------------------------------------------------------

    /// Current volume/bin numbering, rebuilt if stale.
    fn numbering(&self) -> &BinNumbering {
        self.cache().numbering.get_or_compute(|| {
            let n_volumes = self.n_volumes();
            let verbose = n_volumes > VERBOSE_REBUILD_THRESHOLD && self.is_disk_resident();
            if verbose {
                info!(n_volumes, "updating the volume/bin numbering of a large disk-resident binning");
            } else {
                debug!(n_volumes, "rebuilding bin numbering");
            }
            let numbering =
                BinNumbering::from_terminal_flags((0..n_volumes).map(|i| self.is_terminal(i)));
            if verbose {
                info!(n_bins = numbering.n_bins(), "bin numbering updated");
            }
            numbering
        })
    }

    /// Bounding box of the binning, rebuilt if stale.
    fn hierarchy_limits(&self) -> &Cuboid {
        self.cache().limits.get_or_compute(|| self.compute_limits())
    }

    /// Bounding box over the primary volumes if there are any, otherwise over
    /// every volume.
    fn compute_limits(&self) -> Cuboid {
        let dimension = self.dimension();
        let candidates: Vec<usize> = if self.n_primaries() > 0 {
            (0..self.n_primaries()).filter_map(|i| self.primary(i)).collect()
        } else {
            (0..self.n_volumes()).collect()
        };

        if candidates.len() > VERBOSE_REBUILD_THRESHOLD && self.is_disk_resident() {
            info!(
                n_volumes = candidates.len(),
                "determining the limits of a large disk-resident binning"
            );
        } else {
            debug!(n_volumes = candidates.len(), "recomputing binning limits");
        }

        let mut low = vec![f64::INFINITY; dimension];
        let mut high = vec![f64::NEG_INFINITY; dimension];
        for index in candidates {
            let Some(volume) = self.volume(index) else {
                warn!(index, "bounding box skips a volume index that does not exist");
                continue;
            };
            for d in 0..dimension {
                low[d] = low[d].min(volume.min(d));
                high[d] = high[d].max(volume.max(d));
            }
        }

        if low.iter().zip(&high).any(|(l, h)| !(l <= h)) {
            return Cuboid::degenerate(dimension);
        }
        Cuboid::from_corners_unchecked(Point::new(low), Point::new(high))
    }

    // -------------------------------------------------------------------------
    // Bin lookups
    // -------------------------------------------------------------------------

    /// Bin number of the volume at `index`; `None` for internal volumes.
    fn bin_number(&self, index: usize) -> Option<usize> {
        self.numbering().bin_of(index)
    }

    /// Volume index of bin `bin`.
    fn volume_index(&self, bin: usize) -> Option<usize> {
        self.numbering().volume_of(bin)
    }

    /// Geometry of bin `bin`.
    fn hierarchy_bin_volume(&self, bin: usize) -> Option<Volume> {
        self.volume(self.volume_index(bin)?).map(Cow::into_owned)
    }

    /// Volumes no descent can start below: the primaries if any, otherwise
    /// every volume no link points at.
    fn root_volumes(&self) -> Vec<usize> {
        if self.n_primaries() > 0 {
            return (0..self.n_primaries()).filter_map(|i| self.primary(i)).collect();
        }
        let n_volumes = self.n_volumes();
        let mut linked = vec![false; n_volumes];
        for index in 0..n_volumes {
            for &child in self.links(index).as_deref().unwrap_or_default() {
                if let Some(flag) = linked.get_mut(child) {
                    *flag = true;
                }
            }
        }
        (0..n_volumes).filter(|&i| !linked[i]).collect()
    }

    /// Check the link graph for dangling indices and cycles.
    fn validate_hierarchy(&self) -> Result<(), HierarchyError> {
        check_hierarchy(self)
    }

    // -------------------------------------------------------------------------
    // Classification
    // -------------------------------------------------------------------------

    /// Bin number of the bin containing `point`.
    ///
    /// 1. Points outside [`hierarchy_limits`](Self::hierarchy_limits) are rejected.
    /// 2. The first root (primary, or any volume when there are no primaries)
    ///    containing the point is selected.
    /// 3. Links are followed down to a terminal volume.
    fn locate(&self, point: &Point) -> Option<usize> {
        if !self.hierarchy_limits().contains(point) {
            return None;
        }

        let start = if self.n_primaries() > 0 {
            let found = (0..self.n_primaries())
                .filter_map(|i| self.primary(i))
                .find(|&index| self.volume_contains(index, point));
            match found {
                Some(index) => {
                    if self.is_terminal(index) {
                        debug!(index, "primary volume has no links");
                    }
                    index
                }
                None => {
                    warn!(
                        point = ?point.coords(),
                        "no primary volume contains a point inside the binning limits"
                    );
                    return None;
                }
            }
        } else {
            (0..self.n_volumes()).find(|&index| self.volume_contains(index, point))?
        };

        let terminal = self.follow_links(point, start)?;
        self.bin_number(terminal)
    }

    /// Walk from the volume at `start` down to the terminal volume containing
    /// `point`.
    ///
    /// Returns `None` when no child of a visited volume contains the point
    /// (a broken hierarchy), or when more than [`max_depth`](Self::max_depth)
    /// hops would be needed.
    fn follow_links(&self, point: &Point, start: usize) -> Option<usize> {
        let max_depth = self.max_depth();
        let mut current = start;
        let mut depth = 0;

        loop {
            let Some(links) = self.links(current) else {
                warn!(volume = current, "linked volume does not exist");
                return None;
            };
            if links.is_empty() {
                return Some(current);
            }
            if depth == max_depth {
                warn!(
                    volume = current,
                    max_depth, "hierarchy descent exceeded the maximum depth; the links may form a cycle"
                );
                return None;
            }

            match links
                .iter()
                .copied()
                .find(|&child| self.volume_contains(child, point))
            {
                Some(child) => current = child,
                None => {
                    warn!(
                        volume = current,
                        point = ?point.coords(),
                        "no linked volume contains the point; the hierarchy is broken"
                    );
                    return None;
                }
            }
            depth += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binning::MemoryBinning;
    use crate::testing::{nested_intervals, split_square};
    use tracing_test::traced_test;

    #[test]
    fn test_numbering_skips_internal_volumes() {
        let numbering =
            BinNumbering::from_terminal_flags([false, false, true, false, true, true]);
        assert_eq!(numbering.n_bins(), 3);
        assert_eq!(
            numbering.bins_by_volume(),
            &[None, None, Some(0), None, Some(1), Some(2)]
        );
        assert_eq!(numbering.volumes_by_bin(), &[2, 4, 5]);
        assert_eq!(numbering.bin_of(0), None);
        assert_eq!(numbering.bin_of(99), None);
        assert_eq!(numbering.volume_of(3), None);
    }

    #[test]
    fn test_nested_intervals_numbering() {
        let binning = nested_intervals();
        assert_eq!(binning.n_volumes(), 9);
        assert_eq!(
            binning.numbering().bins_by_volume(),
            &[None, None, None, None, Some(0), Some(1), Some(2), Some(3), Some(4)]
        );
        assert_eq!(binning.numbering().volumes_by_bin(), &[4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_nested_intervals_descent() {
        let binning = nested_intervals();
        // Volume layout on (0, 8]: 7 = (0,1], 8 = (1,2], 4 = (2,4], 5 = (4,6], 6 = (6,8].
        let cases = [(0.5, Some(3)), (1.5, Some(4)), (3.0, Some(0)), (5.0, Some(1)), (7.5, Some(2))];
        for (x, expected) in cases {
            assert_eq!(binning.locate(&Point::from([x])), expected, "x = {x}");
        }
        assert_eq!(binning.locate(&Point::from([0.0])), None);
        assert_eq!(binning.locate(&Point::from([8.0])), Some(2));
        assert_eq!(binning.locate(&Point::from([8.5])), None);
    }

    #[test]
    fn test_limits_cover_all_volumes_without_primaries() {
        let binning = split_square();
        let limits = binning.hierarchy_limits();
        assert_eq!(limits.low().coords(), &[0.0, 0.0]);
        assert_eq!(limits.high().coords(), &[10.0, 10.0]);
    }

    #[test]
    fn test_limits_use_primaries_only() {
        let mut binning = MemoryBinning::new();
        binning.append(Volume::from_cuboid(Cuboid::uniform(1, 0.0, 1.0)), vec![]);
        binning.append(Volume::from_cuboid(Cuboid::uniform(1, 5.0, 6.0)), vec![]);
        binning.add_primary(1);

        let limits = binning.hierarchy_limits();
        assert_eq!(limits.low().coords(), &[5.0]);
        assert_eq!(limits.high().coords(), &[6.0]);
        // Volume 0 is outside the primaries' bounds, so it is unreachable.
        assert_eq!(binning.locate(&Point::from([0.5])), None);
        assert_eq!(binning.locate(&Point::from([5.5])), Some(1));
    }

    #[test]
    fn test_empty_binning_limits_are_degenerate() {
        let binning = MemoryBinning::new();
        assert_eq!(binning.hierarchy_limits(), &Cuboid::degenerate(0));
        assert_eq!(binning.locate(&Point::origin(0)), None);
    }

    #[test]
    #[traced_test]
    fn test_broken_hierarchy() {
        let mut binning = MemoryBinning::new();
        binning.append(Volume::from_cuboid(Cuboid::uniform(1, 0.0, 10.0)), vec![1]);
        binning.append(Volume::from_cuboid(Cuboid::uniform(1, 0.0, 5.0)), vec![]);

        assert_eq!(binning.locate(&Point::from([2.0])), Some(0));
        assert_eq!(binning.locate(&Point::from([7.0])), None);
        assert!(logs_contain("the hierarchy is broken"));
    }

    #[test]
    #[traced_test]
    fn test_cycle_hits_depth_guard() {
        let mut binning = MemoryBinning::new().with_max_depth(16);
        binning.append(Volume::from_cuboid(Cuboid::uniform(1, 0.0, 10.0)), vec![1]);
        binning.append(Volume::from_cuboid(Cuboid::uniform(1, 0.0, 10.0)), vec![0]);

        assert_eq!(binning.locate(&Point::from([2.0])), None);
        assert!(logs_contain("exceeded the maximum depth"));
    }

    #[test]
    #[traced_test]
    fn test_uncovered_primary_reports() {
        let mut binning = MemoryBinning::new();
        binning.append(Volume::from_cuboid(Cuboid::uniform(1, 0.0, 1.0)), vec![]);
        binning.append(Volume::from_cuboid(Cuboid::uniform(1, 2.0, 3.0)), vec![]);
        binning.add_primary(0);
        binning.add_primary(1);

        // Inside the primaries' bounding box but in the gap between them.
        assert_eq!(binning.locate(&Point::from([1.5])), None);
        assert!(logs_contain("no primary volume contains"));
    }

    #[test]
    fn test_overlap_first_match_wins() {
        let mut binning = MemoryBinning::new();
        binning.append(Volume::from_cuboid(Cuboid::uniform(1, 0.0, 2.0)), vec![]);
        binning.append(Volume::from_cuboid(Cuboid::uniform(1, 1.0, 3.0)), vec![]);
        assert_eq!(binning.locate(&Point::from([1.5])), Some(0));
        assert_eq!(binning.locate(&Point::from([2.5])), Some(1));
    }

    #[test]
    fn test_root_volumes() {
        let binning = nested_intervals();
        assert_eq!(binning.root_volumes(), vec![0]);

        let mut flat = MemoryBinning::new();
        flat.append(Volume::from_cuboid(Cuboid::uniform(1, 0.0, 1.0)), vec![]);
        flat.append(Volume::from_cuboid(Cuboid::uniform(1, 1.0, 2.0)), vec![]);
        assert_eq!(flat.root_volumes(), vec![0, 1]);
        flat.add_primary(1);
        assert_eq!(flat.root_volumes(), vec![1]);
    }
}
