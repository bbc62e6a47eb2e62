//! Persistence of binnings and bin contents.
//!
//! A persisted histogram is a directory of Parquet files, one per table:
//!
//! | File                            | Columns                                                          |
//! |---------------------------------|------------------------------------------------------------------|
//! | `HyperBinning.parquet`          | `binNumber`, `lowCorner_i`, `highCorner_i`, `linkedBins`         |
//! | `PrimaryVolumeNumbers.parquet`  | `volumeNumber`                                                   |
//! | `HistogramBase.parquet`         | `binNumber`, `binContent`, `sumW2`                               |
//!
//! Integer columns are written as Int32 and read as Int32 or Int64. Float
//! columns are written as Float64 and read as Float64 or Float32.

mod binning;
mod contents;
mod error;
mod table;

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::binning::HIERARCHICAL_BINNING_TYPE;

pub use binning::{read_hierarchy, write_hierarchy};
pub use contents::{read_contents, write_contents};
pub use error::PersistError;

pub const VOLUME_TABLE: &str = "HyperBinning.parquet";
pub const PRIMARY_TABLE: &str = "PrimaryVolumeNumbers.parquet";
pub const CONTENT_TABLE: &str = "HistogramBase.parquet";

pub(crate) const BIN_NUMBER: &str = "binNumber";
pub(crate) const LOW_CORNER_PREFIX: &str = "lowCorner_";
pub(crate) const HIGH_CORNER_PREFIX: &str = "highCorner_";
pub(crate) const LINKED_BINS: &str = "linkedBins";
pub(crate) const VOLUME_NUMBER: &str = "volumeNumber";
pub(crate) const BIN_CONTENT: &str = "binContent";
pub(crate) const SUM_W2: &str = "sumW2";

/// Path of `table` inside the source directory `dir`.
pub fn table_path(dir: &Path, table: &str) -> PathBuf {
    dir.join(table)
}

/// Decide which kind of binning `dir` holds from the tables present.
///
/// Returns `None`, with a diagnostic, when no known binning table is found.
pub fn sniff_binning_type(dir: &Path) -> Option<&'static str> {
    if table_path(dir, VOLUME_TABLE).is_file() {
        return Some(HIERARCHICAL_BINNING_TYPE);
    }
    warn!(dir = %dir.display(), "no known binning table found");
    None
}
