//! The fully in-memory hierarchical binning.

use std::borrow::Cow;
use std::path::Path;

use tracing::{debug, warn};

use super::hierarchy::{HierarchicalBinning, HierarchyCache, DEFAULT_MAX_DEPTH};
use super::{Binning, Dimension, HIERARCHICAL_BINNING_TYPE};
use crate::geometry::{Cuboid, Point, Volume};
use crate::io::{self, PersistError};

/// A hierarchical binning holding every volume in memory.
///
/// Volumes, their links and the primary indices live in parallel vectors.
/// Every mutator drops the derived caches.
///
/// # Example
///
/// ```
/// use hyperbin::{Binning, Cuboid, MemoryBinning, Point, Volume};
///
/// let mut binning = MemoryBinning::new();
/// binning.append(Volume::from_cuboid(Cuboid::uniform(1, 0.0, 2.0)), vec![1, 2]);
/// binning.append(Volume::from_cuboid(Cuboid::uniform(1, 0.0, 1.0)), vec![]);
/// binning.append(Volume::from_cuboid(Cuboid::uniform(1, 1.0, 2.0)), vec![]);
///
/// assert_eq!(binning.n_bins(), 2);
/// assert_eq!(binning.classify(&Point::from([1.5])), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct MemoryBinning {
    dimension: Dimension,
    volumes: Vec<Volume>,
    links: Vec<Vec<usize>>,
    primaries: Vec<usize>,
    cache: HierarchyCache,
    max_depth: usize,
}

impl Default for MemoryBinning {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBinning {
    /// An empty binning of unknown dimension.
    pub fn new() -> Self {
        Self {
            dimension: Dimension::default(),
            volumes: Vec::new(),
            links: Vec::new(),
            primaries: Vec::new(),
            cache: HierarchyCache::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the bound on link hops during classification.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Read a binning from the tables in `dir`.
    pub fn read(dir: &Path) -> Result<Self, PersistError> {
        io::read_hierarchy(dir)
    }

    /// Append a volume and its links.
    ///
    /// The first volume fixes the dimension of an empty binning. A volume of
    /// any other dimension, or of dimension zero, is reported and rejected.
    /// Link indices are not
    /// checked; see [`validate_hierarchy`](HierarchicalBinning::validate_hierarchy).
    pub fn append(&mut self, volume: Volume, links: Vec<usize>) -> bool {
        if volume.dimension() == 0 {
            warn!("cannot append a zero-dimensional volume");
            return false;
        }
        if !self.dimension.is_set() {
            self.dimension.set(volume.dimension());
        } else if volume.dimension() != self.dimension.get() {
            warn!(
                expected = self.dimension.get(),
                got = volume.dimension(),
                "volume has the wrong dimension for this binning"
            );
            return false;
        }

        self.volumes.push(volume);
        self.links.push(links);
        self.cache.invalidate();
        true
    }

    /// Mark the volume at `index` as a primary (root) volume.
    pub fn add_primary(&mut self, index: usize) {
        self.primaries.push(index);
        self.cache.invalidate();
    }

    pub fn volumes(&self) -> &[Volume] {
        &self.volumes
    }

    pub fn primaries(&self) -> &[usize] {
        &self.primaries
    }

    /// Append every volume of `other`, shifting its links past ours.
    ///
    /// The roots of both sides become primaries, so the merged binning
    /// classifies into either side without scanning every volume. Bins of
    /// `other` are numbered after ours.
    ///
    /// Returns `false` and leaves `self` untouched if the dimensions differ, the
    /// dimension of `other` is unknown, or
    /// `other` is missing a volume it reports.
    pub fn merge(&mut self, other: &dyn HierarchicalBinning) -> bool {
        if other.n_volumes() == 0 {
            return true;
        }
        if other.dimension() == 0 {
            warn!("cannot merge a binning of unknown dimension");
            return false;
        }
        if self.dimension.is_set() && other.dimension() != self.dimension.get() {
            warn!(
                expected = self.dimension.get(),
                got = other.dimension(),
                "cannot merge binnings of different dimensions"
            );
            return false;
        }

        let offset = self.volumes.len();
        let mut volumes = Vec::with_capacity(other.n_volumes());
        let mut links = Vec::with_capacity(other.n_volumes());
        for index in 0..other.n_volumes() {
            let (Some(volume), Some(children)) = (other.volume(index), other.links(index)) else {
                warn!(index, "merged binning is missing a volume it reports");
                return false;
            };
            volumes.push(volume.into_owned());
            links.push(children.iter().map(|&c| c + offset).collect());
        }
        let other_roots = other.root_volumes();

        if self.primaries.is_empty() {
            self.primaries = self.root_volumes();
        }
        self.dimension.set(other.dimension());
        self.volumes.extend(volumes);
        self.links.extend(links);
        self.primaries.extend(other_roots.into_iter().map(|r| r + offset));
        self.cache.invalidate();

        debug!(
            n_volumes = self.volumes.len(),
            n_primaries = self.primaries.len(),
            "merged hierarchical binnings"
        );
        true
    }

    /// Write the binning as tables into `dir`.
    pub fn write(&self, dir: &Path) -> Result<(), PersistError> {
        io::write_hierarchy(self, dir)
    }
}

impl Binning for MemoryBinning {
    fn binning_type(&self) -> &'static str {
        HIERARCHICAL_BINNING_TYPE
    }

    fn dimension(&self) -> usize {
        self.dimension.get()
    }

    fn set_dimension(&mut self, dimension: usize) {
        if self.dimension.set(dimension) {
            self.cache.invalidate();
        }
    }

    fn n_bins(&self) -> usize {
        self.numbering().n_bins()
    }

    fn classify(&self, point: &Point) -> Option<usize> {
        self.locate(point)
    }

    fn bin_volume(&self, bin: usize) -> Option<Volume> {
        self.hierarchy_bin_volume(bin)
    }

    fn limits(&self) -> Cuboid {
        self.hierarchy_limits().clone()
    }

    fn load(&mut self, dir: &Path) -> Result<(), PersistError> {
        *self = Self::read(dir)?.with_max_depth(self.max_depth);
        Ok(())
    }

    fn save(&self, dir: &Path) -> Result<(), PersistError> {
        self.write(dir)
    }

    fn clone_boxed(&self) -> Box<dyn Binning> {
        Box::new(self.clone())
    }
}

impl HierarchicalBinning for MemoryBinning {
    fn n_volumes(&self) -> usize {
        self.volumes.len()
    }

    fn volume(&self, index: usize) -> Option<Cow<'_, Volume>> {
        self.volumes.get(index).map(Cow::Borrowed)
    }

    fn links(&self, index: usize) -> Option<Cow<'_, [usize]>> {
        self.links.get(index).map(|l| Cow::Borrowed(l.as_slice()))
    }

    fn n_primaries(&self) -> usize {
        self.primaries.len()
    }

    fn primary(&self, i: usize) -> Option<usize> {
        self.primaries.get(i).copied()
    }

    fn cache(&self) -> &HierarchyCache {
        &self.cache
    }

    fn max_depth(&self) -> usize {
        self.max_depth
    }
}
