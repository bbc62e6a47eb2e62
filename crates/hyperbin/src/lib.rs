//! hyperbin: hierarchical binning of multi-dimensional space.
//!
//! Points are classified into bins by descending a hierarchy of volumes
//! instead of testing every bin. Histograms pair a binning with per-bin
//! contents and can be persisted as Parquet tables.
//!
//! # Key Types
//!
//! - [`Point`] / [`Cuboid`] / [`Volume`] - Geometry
//! - [`Binning`] / [`HierarchicalBinning`] - Binning contracts
//! - [`MemoryBinning`] - In-memory hierarchical binning
//! - [`Histogram`] / [`BinContents`] - Contents lookup and filling
//! - [`LoadConfig`] - Options for loading persisted histograms
//!
//! # Example
//!
//! ```
//! use hyperbin::{Binning, Cuboid, MemoryBinning, Point, Volume};
//!
//! let mut binning = MemoryBinning::new();
//! binning.append(Volume::from_cuboid(Cuboid::uniform(2, 0.0, 10.0)), vec![1, 2]);
//! binning.append(
//!     Volume::from_cuboid(Cuboid::new(Point::from([0.0, 0.0]), Point::from([5.0, 10.0]))),
//!     vec![],
//! );
//! binning.append(
//!     Volume::from_cuboid(Cuboid::new(Point::from([5.0, 0.0]), Point::from([10.0, 10.0]))),
//!     vec![],
//! );
//!
//! assert_eq!(binning.classify(&Point::from([3.0, 3.0])), Some(0));
//! assert_eq!(binning.classify(&Point::from([7.0, 3.0])), Some(1));
//! assert_eq!(binning.classify(&Point::from([-1.0, 3.0])), None);
//! ```

pub mod binning;
pub mod cache;
pub mod config;
pub mod content;
pub mod geometry;
pub mod histogram;
pub mod io;
pub mod testing;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use binning::{classify_rows, Binning, HierarchicalBinning, HierarchyError, MemoryBinning};
pub use config::{ConfigError, LoadConfig, Storage};
pub use content::BinContents;
pub use geometry::{Cuboid, Point, Volume};
pub use histogram::Histogram;
pub use io::PersistError;
