//! Parquet tables as Arrow record batches, and typed column extraction.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, Float32Array, Float64Array, Int32Array, Int64Array, LargeListArray,
    ListArray,
};
use arrow::datatypes::{Int32Type, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use tracing::debug;

use super::error::PersistError;

/// All record batches of one table.
pub(crate) struct Table {
    pub schema: SchemaRef,
    pub batches: Vec<RecordBatch>,
}

impl Table {
    pub fn n_rows(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.schema.field_with_name(name).is_ok()
    }
}

// =============================================================================
// Reading and writing
// =============================================================================

pub(crate) fn read_table(path: &Path) -> Result<Table, PersistError> {
    if !path.is_file() {
        return Err(PersistError::MissingTable(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let reader = builder.build()?;
    let batches: Result<Vec<_>, _> = reader.collect();
    let table = Table {
        schema,
        batches: batches?,
    };
    debug!(path = %path.display(), rows = table.n_rows(), "read table");
    Ok(table)
}

pub(crate) fn write_table(path: &Path, columns: Vec<(&str, ArrayRef)>) -> Result<(), PersistError> {
    let batch = RecordBatch::try_from_iter(columns)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    debug!(path = %path.display(), rows = batch.num_rows(), "wrote table");
    Ok(())
}

/// Number of consecutive `{prefix}0, {prefix}1, ...` columns in `schema`.
pub(crate) fn count_indexed_columns(schema: &Schema, prefix: &str) -> usize {
    (0..)
        .take_while(|i| schema.field_with_name(&format!("{prefix}{i}")).is_ok())
        .count()
}

// =============================================================================
// Column extraction
// =============================================================================

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef, PersistError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| PersistError::MissingColumn(name.into()))
}

fn unsupported(name: &str, expected: &str, array: &dyn Array) -> PersistError {
    PersistError::UnsupportedType {
        column: name.into(),
        expected: expected.into(),
        got: format!("{:?}", array.data_type()),
    }
}

/// Read an integer column. Accepts Int32 and Int64; nulls read as `-1`.
pub(crate) fn extract_index_column(table: &Table, name: &str) -> Result<Vec<i64>, PersistError> {
    let mut values = Vec::with_capacity(table.n_rows());
    for batch in &table.batches {
        let col = column(batch, name)?;

        if let Some(arr) = col.as_any().downcast_ref::<Int32Array>() {
            values.extend(arr.iter().map(|v| v.map_or(-1, i64::from)));
            continue;
        }
        if let Some(arr) = col.as_any().downcast_ref::<Int64Array>() {
            values.extend(arr.iter().map(|v| v.unwrap_or(-1)));
            continue;
        }

        return Err(unsupported(name, "Int32 or Int64", col.as_ref()));
    }
    Ok(values)
}

/// Read a float column. Accepts Float64 and Float32; nulls read as NaN.
pub(crate) fn extract_float_column(table: &Table, name: &str) -> Result<Vec<f64>, PersistError> {
    let mut values = Vec::with_capacity(table.n_rows());
    for batch in &table.batches {
        let col = column(batch, name)?;

        if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
            values.extend(arr.iter().map(|v| v.unwrap_or(f64::NAN)));
            continue;
        }
        if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
            values.extend(arr.iter().map(|v| v.map_or(f64::NAN, f64::from)));
            continue;
        }

        return Err(unsupported(name, "Float64 or Float32", col.as_ref()));
    }
    Ok(values)
}

/// Read a list-of-integers column. Null lists read as empty.
pub(crate) fn extract_index_list_column(
    table: &Table,
    name: &str,
) -> Result<Vec<Vec<i64>>, PersistError> {
    let mut values = Vec::with_capacity(table.n_rows());
    for batch in &table.batches {
        let col = column(batch, name)?;

        if let Some(arr) = col.as_any().downcast_ref::<ListArray>() {
            for i in 0..arr.len() {
                values.push(if arr.is_null(i) {
                    Vec::new()
                } else {
                    list_entries(name, arr.value(i).as_ref())?
                });
            }
            continue;
        }
        if let Some(arr) = col.as_any().downcast_ref::<LargeListArray>() {
            for i in 0..arr.len() {
                values.push(if arr.is_null(i) {
                    Vec::new()
                } else {
                    list_entries(name, arr.value(i).as_ref())?
                });
            }
            continue;
        }

        return Err(unsupported(name, "List<Int32>", col.as_ref()));
    }
    Ok(values)
}

fn list_entries(name: &str, entries: &dyn Array) -> Result<Vec<i64>, PersistError> {
    if let Some(arr) = entries.as_any().downcast_ref::<Int32Array>() {
        return Ok(arr.iter().flatten().map(i64::from).collect());
    }
    if let Some(arr) = entries.as_any().downcast_ref::<Int64Array>() {
        return Ok(arr.iter().flatten().collect());
    }
    Err(unsupported(name, "List<Int32>", entries))
}

// =============================================================================
// Column construction
// =============================================================================

/// Narrow an index for an Int32 column.
pub(crate) fn to_i32(value: usize, name: &str) -> Result<i32, PersistError> {
    i32::try_from(value).map_err(|_| PersistError::UnsupportedType {
        column: name.into(),
        expected: "Int32".into(),
        got: format!("index {value}"),
    })
}

pub(crate) fn index_array(values: &[usize], name: &str) -> Result<ArrayRef, PersistError> {
    let values = values
        .iter()
        .map(|&v| to_i32(v, name))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Arc::new(Int32Array::from(values)))
}

pub(crate) fn float_array(values: Vec<f64>) -> ArrayRef {
    Arc::new(Float64Array::from(values))
}

pub(crate) fn index_list_array(lists: &[Vec<usize>], name: &str) -> Result<ArrayRef, PersistError> {
    let lists = lists
        .iter()
        .map(|list| {
            list.iter()
                .map(|&v| to_i32(v, name).map(Some))
                .collect::<Result<Vec<_>, _>>()
                .map(Some)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Arc::new(ListArray::from_iter_primitive::<Int32Type, _, _>(lists)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{DataType, Field};
    use tempfile::TempDir;

    #[test]
    fn test_round_trip_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.parquet");

        write_table(
            &path,
            vec![
                ("key", index_array(&[3, 1, 2], "key").unwrap()),
                ("value", float_array(vec![0.5, 1.5, 2.5])),
                (
                    "links",
                    index_list_array(&[vec![1, 2], vec![], vec![0]], "links").unwrap(),
                ),
            ],
        )
        .unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(table.n_rows(), 3);
        assert_eq!(extract_index_column(&table, "key").unwrap(), vec![3, 1, 2]);
        assert_eq!(extract_float_column(&table, "value").unwrap(), vec![0.5, 1.5, 2.5]);
        assert_eq!(
            extract_index_list_column(&table, "links").unwrap(),
            vec![vec![1, 2], vec![], vec![0]]
        );
    }

    #[test]
    fn test_accepts_wide_and_narrow_types() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.parquet");
        write_table(
            &path,
            vec![
                ("key", Arc::new(Int64Array::from(vec![7_i64, 8])) as ArrayRef),
                ("value", Arc::new(Float32Array::from(vec![0.25_f32, 4.0])) as ArrayRef),
            ],
        )
        .unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(extract_index_column(&table, "key").unwrap(), vec![7, 8]);
        assert_eq!(extract_float_column(&table, "value").unwrap(), vec![0.25, 4.0]);
    }

    #[test]
    fn test_typed_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.parquet");
        write_table(&path, vec![("value", float_array(vec![1.0]))]).unwrap();
        let table = read_table(&path).unwrap();

        assert!(matches!(
            extract_index_column(&table, "value"),
            Err(PersistError::UnsupportedType { .. })
        ));
        assert!(matches!(
            extract_float_column(&table, "other"),
            Err(PersistError::MissingColumn(name)) if name == "other"
        ));
        assert!(matches!(
            read_table(&dir.path().join("absent.parquet")),
            Err(PersistError::MissingTable(_))
        ));
    }

    #[test]
    fn test_count_indexed_columns() {
        let schema = Schema::new(vec![
            Field::new("lowCorner_0", DataType::Float64, false),
            Field::new("lowCorner_1", DataType::Float64, false),
            Field::new("lowCorner_3", DataType::Float64, false),
        ]);
        assert_eq!(count_indexed_columns(&schema, "lowCorner_"), 2);
        assert_eq!(count_indexed_columns(&schema, "highCorner_"), 0);
    }

    #[test]
    fn test_index_overflow() {
        assert!(to_i32(usize::MAX, "key").is_err());
        assert_eq!(to_i32(5, "key").unwrap(), 5);
    }
}
