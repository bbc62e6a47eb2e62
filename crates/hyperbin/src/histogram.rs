//! Histograms: a binning paired with per-bin contents.

use std::path::Path;

use ndarray::{Array1, ArrayView1, ArrayView2};
use tracing::{debug, warn};

use crate::binning::{classify_rows, Binning, HierarchicalBinning, MemoryBinning};
use crate::config::{LoadConfig, Storage};
use crate::content::BinContents;
use crate::geometry::Point;
use crate::io::{self, PersistError, VOLUME_TABLE};

/// A binning and the contents of its bins.
///
/// The histogram exclusively owns its binning. It starts unset; every
/// lookup on an unset histogram is reported and falls back to the
/// catch-all slot.
///
/// # Example
///
/// ```
/// use hyperbin::{Cuboid, Histogram, MemoryBinning, Point, Volume};
///
/// let mut binning = MemoryBinning::new();
/// binning.append(Volume::from_cuboid(Cuboid::uniform(1, 0.0, 1.0)), vec![]);
/// binning.append(Volume::from_cuboid(Cuboid::uniform(1, 1.0, 2.0)), vec![]);
///
/// let mut histogram = Histogram::with_binning(binning);
/// histogram.fill(&Point::from([1.5]), 2.0);
///
/// assert_eq!(histogram.value(&Point::from([1.2])), 2.0);
/// assert_eq!(histogram.value(&Point::from([0.5])), 0.0);
/// ```
#[derive(Debug, Default)]
pub struct Histogram {
    binning: Option<Box<dyn Binning>>,
    contents: BinContents,
}

impl Histogram {
    /// An unset histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// A histogram over `binning` with every bin empty.
    pub fn with_binning<B: Binning + 'static>(binning: B) -> Self {
        Self::from_boxed(Box::new(binning))
    }

    pub fn from_boxed(binning: Box<dyn Binning>) -> Self {
        let contents = BinContents::new(binning.n_bins());
        Self {
            binning: Some(binning),
            contents,
        }
    }

    /// Load the histogram stored in `dir` with the default options.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, PersistError> {
        Self::open_with(dir, &LoadConfig::default())
    }

    pub fn open_with(dir: impl AsRef<Path>, config: &LoadConfig) -> Result<Self, PersistError> {
        let mut histogram = Self::new();
        histogram.load(dir, config)?;
        Ok(histogram)
    }

    /// Replace this histogram with the one stored in `dir`.
    ///
    /// The binning kind is sniffed from the tables present, then the binning
    /// and the contents are read from the same directory. On failure the
    /// histogram is left unset.
    pub fn load(&mut self, dir: impl AsRef<Path>, config: &LoadConfig) -> Result<(), PersistError> {
        let dir = dir.as_ref();
        self.binning = None;
        self.contents = BinContents::default();

        let binning = load_binning(dir, config)?;
        let contents = BinContents::read(dir)?;
        if contents.n_bins() != binning.n_bins() {
            warn!(
                binning_bins = binning.n_bins(),
                content_bins = contents.n_bins(),
                "content table and binning disagree on the number of bins"
            );
        }

        debug!(dir = %dir.display(), n_bins = binning.n_bins(), "loaded histogram");
        self.binning = Some(binning);
        self.contents = contents;
        Ok(())
    }

    /// Write the binning and the contents into `dir`.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<(), PersistError> {
        let dir = dir.as_ref();
        let binning = self.binning.as_deref().ok_or(PersistError::NoBinning)?;
        binning.save(dir)?;
        self.contents.write(dir)
    }

    pub fn binning(&self) -> Option<&dyn Binning> {
        self.binning.as_deref()
    }

    pub fn contents(&self) -> &BinContents {
        &self.contents
    }

    pub fn contents_mut(&mut self) -> &mut BinContents {
        &mut self.contents
    }

    pub fn is_set(&self) -> bool {
        self.binning.is_some()
    }

    /// Dimension of the binning; `0`, with a diagnostic, when unset.
    pub fn dimension(&self) -> usize {
        match self.binning() {
            Some(binning) => binning.dimension(),
            None => {
                warn!("histogram has no binning; dimension is unknown");
                0
            }
        }
    }

    /// Bin containing `point`.
    pub fn classify(&self, point: &Point) -> Option<usize> {
        match self.binning() {
            Some(binning) => binning.classify(point),
            None => {
                warn!("histogram has no binning; every point falls in the catch-all slot");
                None
            }
        }
    }

    /// Content of the bin containing `point`.
    pub fn value(&self, point: &Point) -> f64 {
        self.contents.content(self.classify(point))
    }

    /// Add `weight` to the bin containing `point`.
    pub fn fill(&mut self, point: &Point, weight: f64) {
        let bin = self.classify(point);
        self.contents.fill(bin, weight);
    }

    /// Content of the bin containing each row of `points`.
    pub fn values(&self, points: ArrayView2<'_, f64>) -> Array1<f64> {
        self.classify_all(points)
            .into_iter()
            .map(|bin| self.contents.content(bin))
            .collect()
    }

    /// Fill one entry per row of `points`, with unit weights when `weights`
    /// is `None`.
    ///
    /// Returns `false` and fills nothing if `weights` does not have one entry
    /// per row.
    pub fn fill_rows(&mut self, points: ArrayView2<'_, f64>, weights: Option<ArrayView1<'_, f64>>) -> bool {
        if let Some(weights) = &weights {
            if weights.len() != points.nrows() {
                warn!(
                    rows = points.nrows(),
                    weights = weights.len(),
                    "weights do not match the number of points"
                );
                return false;
            }
        }

        let bins = self.classify_all(points);
        for (row, bin) in bins.into_iter().enumerate() {
            let weight = weights.as_ref().map_or(1.0, |w| w[row]);
            self.contents.fill(bin, weight);
        }
        true
    }

    fn classify_all(&self, points: ArrayView2<'_, f64>) -> Vec<Option<usize>> {
        match self.binning() {
            Some(binning) => classify_rows(binning, points),
            None => {
                warn!("histogram has no binning; every point falls in the catch-all slot");
                vec![None; points.nrows()]
            }
        }
    }
}

fn load_binning(dir: &Path, config: &LoadConfig) -> Result<Box<dyn Binning>, PersistError> {
    if io::sniff_binning_type(dir).is_none() {
        return Err(PersistError::MissingTable(io::table_path(dir, VOLUME_TABLE)));
    }

    match config.storage {
        Storage::MemoryResident => {
            let binning = MemoryBinning::read(dir)?.with_max_depth(config.max_depth);
            if config.validate {
                binning.validate_hierarchy()?;
            }
            Ok(Box::new(binning))
        }
        Storage::DiskResident => Err(PersistError::UnsupportedStorage(config.storage.to_string())),
    }
}
