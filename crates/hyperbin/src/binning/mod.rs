//! Binning schemes: partitions of space into numbered bins.
//!
//! This module provides:
//! - [`Binning`]: the narrow contract every binning scheme implements
//! - [`HierarchicalBinning`]: binnings organised as a hierarchy of volumes
//! - [`MemoryBinning`]: the fully in-memory hierarchical binning
//! - [`HierarchyError`]: structural problems found by validation

mod hierarchy;
mod memory;
mod validate;

use std::fmt;
use std::path::Path;

use ndarray::ArrayView2;
use tracing::warn;

use crate::geometry::{Cuboid, Point, Volume};
use crate::io::PersistError;

pub use hierarchy::{BinNumbering, HierarchicalBinning, HierarchyCache, DEFAULT_MAX_DEPTH};
pub use memory::MemoryBinning;
pub use validate::HierarchyError;

/// Type tag shared by every hierarchical binning, whatever its storage.
pub const HIERARCHICAL_BINNING_TYPE: &str = "HyperBinning";

// =============================================================================
// Binning Trait
// =============================================================================

/// A partition of a bounded region of space into `n_bins()` bins.
///
/// Classification never fails loudly: a point outside every bin, or of the
/// wrong dimension, classifies to `None`, which content stores route to
/// their catch-all slot.
///
/// Binnings are `Send` but not `Sync`: their lazy caches fill in through a
/// shared reference. Share one across threads behind a lock.
pub trait Binning: fmt::Debug + Send {
    /// Tag identifying the kind of binning. Fixed by the concrete type.
    fn binning_type(&self) -> &'static str;

    /// Dimension of the space being binned; `0` until known.
    fn dimension(&self) -> usize;

    /// Set the dimension. Only the first non-zero value takes effect.
    fn set_dimension(&mut self, dimension: usize);

    /// Number of true bins.
    fn n_bins(&self) -> usize;

    /// Bin containing `point`, or `None` if there is none.
    fn classify(&self, point: &Point) -> Option<usize>;

    /// Geometry of bin `bin`, or `None` if the bin does not exist.
    fn bin_volume(&self, bin: usize) -> Option<Volume>;

    /// Box enclosing every bin.
    fn limits(&self) -> Cuboid;

    /// Replace this binning with the one stored in `dir`.
    fn load(&mut self, dir: &Path) -> Result<(), PersistError>;

    /// Write this binning into `dir`.
    fn save(&self, dir: &Path) -> Result<(), PersistError>;

    /// Deep copy behind a fresh box.
    fn clone_boxed(&self) -> Box<dyn Binning>;

    /// Whether the bins are paged from disk rather than held in memory.
    ///
    /// Only affects how chatty cache rebuilds are.
    fn is_disk_resident(&self) -> bool {
        false
    }

    /// Lower edge of the binned region along `axis`.
    fn min(&self, axis: usize) -> f64 {
        self.limits().low().get(axis)
    }

    /// Upper edge of the binned region along `axis`.
    fn max(&self, axis: usize) -> f64 {
        self.limits().high().get(axis)
    }

    fn is_same_binning_type(&self, other: &dyn Binning) -> bool {
        self.binning_type() == other.binning_type()
    }
}

/// Classify every row of a `(n_points, dimension)` matrix.
///
/// A matrix whose width does not match the binning's dimension is reported
/// once and classifies every row to `None`.
pub fn classify_rows<B>(binning: &B, points: ArrayView2<'_, f64>) -> Vec<Option<usize>>
where
    B: Binning + ?Sized,
{
    if points.ncols() != binning.dimension() {
        warn!(
            columns = points.ncols(),
            dimension = binning.dimension(),
            "point matrix width does not match the binning dimension"
        );
        return vec![None; points.nrows()];
    }
    points
        .rows()
        .into_iter()
        .map(|row| binning.classify(&Point::new(row.to_vec())))
        .collect()
}

// =============================================================================
// Dimension
// =============================================================================

/// A dimension that can be written once.
///
/// Starts at `0` (unknown). The first non-zero [`set`](Self::set) sticks;
/// every later call is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dimension(usize);

impl Dimension {
    #[inline]
    pub fn get(self) -> usize {
        self.0
    }

    #[inline]
    pub fn is_set(self) -> bool {
        self.0 != 0
    }

    /// Record `dimension` if none is known yet. Returns whether it took effect.
    pub fn set(&mut self, dimension: usize) -> bool {
        if self.is_set() || dimension == 0 {
            return false;
        }
        self.0 = dimension;
        true
    }
}
