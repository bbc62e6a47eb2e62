//! The content table: per-bin content and sum of squared weights.

use std::path::Path;

use tracing::debug;

use super::error::PersistError;
use super::table::{extract_float_column, extract_index_column, float_array, index_array, read_table, write_table};
use super::{table_path, BIN_CONTENT, BIN_NUMBER, CONTENT_TABLE, SUM_W2};
use crate::content::BinContents;

/// Read the content store in `dir`.
///
/// Rows may come in any order. A table of `n` rows describes `n - 1` bins
/// plus the catch-all slot, which is row key `n - 1`.
pub fn read_contents(dir: &Path) -> Result<BinContents, PersistError> {
    let table = read_table(&table_path(dir, CONTENT_TABLE))?;
    let n_rows = table.n_rows();
    if n_rows == 0 {
        return Err(PersistError::EmptyTable(CONTENT_TABLE.into()));
    }

    let bins = extract_index_column(&table, BIN_NUMBER)?;
    let contents = extract_float_column(&table, BIN_CONTENT)?;
    let sum_w2 = extract_float_column(&table, SUM_W2)?;

    let n_bins = n_rows - 1;
    let mut store = BinContents::new(n_bins);
    for ((&bin, content), w2) in bins.iter().zip(contents).zip(sum_w2) {
        let slot = usize::try_from(bin)
            .ok()
            .filter(|&slot| slot <= n_bins)
            .ok_or(PersistError::BinOutOfRange { bin, n_bins })?;
        store.set_content(Some(slot), content);
        store.set_sum_w2(Some(slot), w2);
    }

    debug!(n_bins, "read bin contents");
    Ok(store)
}

/// Write one row per slot, catch-all included, into `dir`.
pub fn write_contents(contents: &BinContents, dir: &Path) -> Result<(), PersistError> {
    std::fs::create_dir_all(dir)?;
    let slots: Vec<usize> = (0..=contents.n_bins()).collect();
    write_table(
        &table_path(dir, CONTENT_TABLE),
        vec![
            (BIN_NUMBER, index_array(&slots, BIN_NUMBER)?),
            (BIN_CONTENT, float_array(contents.contents().to_vec())),
            (SUM_W2, float_array(contents.sums_w2().to_vec())),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Float64Array, Int32Array};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn write_rows(dir: &Path, bins: Vec<i32>, contents: Vec<f64>) {
        let sum_w2 = contents.iter().map(|c| c * c).collect::<Vec<_>>();
        write_table(
            &table_path(dir, CONTENT_TABLE),
            vec![
                (BIN_NUMBER, Arc::new(Int32Array::from(bins)) as ArrayRef),
                (BIN_CONTENT, Arc::new(Float64Array::from(contents)) as ArrayRef),
                (SUM_W2, Arc::new(Float64Array::from(sum_w2)) as ArrayRef),
            ],
        )
        .unwrap();
    }

    #[test]
    fn test_rows_scatter_by_bin_number() {
        let dir = TempDir::new().unwrap();
        write_rows(dir.path(), vec![2, 0, 1], vec![9.0, 1.0, 2.0]);

        let store = read_contents(dir.path()).unwrap();
        assert_eq!(store.n_bins(), 2);
        assert_eq!(store.content(Some(0)), 1.0);
        assert_eq!(store.content(Some(1)), 2.0);
        assert_eq!(store.catch_all(), 9.0);
        assert_eq!(store.sum_w2(Some(1)), 4.0);
    }

    #[test]
    fn test_bin_out_of_range() {
        let dir = TempDir::new().unwrap();
        write_rows(dir.path(), vec![0, 5], vec![1.0, 2.0]);
        assert!(matches!(
            read_contents(dir.path()),
            Err(PersistError::BinOutOfRange { bin: 5, n_bins: 1 })
        ));

        write_rows(dir.path(), vec![0, -1], vec![1.0, 2.0]);
        assert!(matches!(
            read_contents(dir.path()),
            Err(PersistError::BinOutOfRange { bin: -1, .. })
        ));
    }

    #[test]
    fn test_empty_table() {
        let dir = TempDir::new().unwrap();
        write_rows(dir.path(), vec![], vec![]);
        assert!(matches!(
            read_contents(dir.path()),
            Err(PersistError::EmptyTable(_))
        ));
    }

    #[test]
    fn test_write_includes_catch_all() {
        let dir = TempDir::new().unwrap();
        let mut store = BinContents::new(2);
        store.fill(Some(1), 2.0);
        store.fill(None, 3.0);

        write_contents(&store, dir.path()).unwrap();
        let loaded = read_contents(dir.path()).unwrap();
        assert_eq!(loaded, store);
    }
}
