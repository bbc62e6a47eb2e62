//! Errors raised while reading or writing persisted histograms.

use std::io;
use std::path::PathBuf;

use crate::binning::HierarchyError;

/// Errors that can occur when loading or saving binnings and contents.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("missing table: {}", .0.display())]
    MissingTable(PathBuf),

    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("unsupported column type for {column}: expected {expected}, got {got}")]
    UnsupportedType {
        column: String,
        expected: String,
        got: String,
    },

    #[error("storage variant not supported: {0}")]
    UnsupportedStorage(String),

    #[error("bin number {bin} does not fit a store of {n_bins} bins")]
    BinOutOfRange { bin: i64, n_bins: usize },

    #[error("histogram has no binning to save")]
    NoBinning,

    #[error("table has no rows: {0}")]
    EmptyTable(String),

    #[error("invalid hierarchy: {0}")]
    Hierarchy(#[from] HierarchyError),
}
