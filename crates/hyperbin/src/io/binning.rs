//! Volume and primary-index tables of hierarchical binnings.
//!
//! The volume table holds one row per cuboid. Consecutive rows sharing a
//! `binNumber` form one multi-cuboid volume; a change of key closes the
//! volume. Volume indices follow the order of the groups, not the key values.

use std::path::Path;

use tracing::{debug, warn};

use super::error::PersistError;
use super::table::{
    count_indexed_columns, extract_float_column, extract_index_column,
    extract_index_list_column, float_array, index_array, index_list_array, read_table,
    write_table, Table,
};
use super::{
    table_path, BIN_NUMBER, HIGH_CORNER_PREFIX, LINKED_BINS, LOW_CORNER_PREFIX, PRIMARY_TABLE,
    VOLUME_NUMBER, VOLUME_TABLE,
};
use crate::binning::{Binning, HierarchicalBinning, MemoryBinning};
use crate::geometry::{Cuboid, Point, Volume};

// =============================================================================
// Reading
// =============================================================================

/// Read the hierarchical binning stored in `dir`.
///
/// A missing primary-index table is reported and read as "no primaries".
pub fn read_hierarchy(dir: &Path) -> Result<MemoryBinning, PersistError> {
    let table = read_table(&table_path(dir, VOLUME_TABLE))?;
    let dimension = count_indexed_columns(&table.schema, LOW_CORNER_PREFIX);
    if dimension == 0 {
        return Err(PersistError::MissingColumn(format!("{LOW_CORNER_PREFIX}0")));
    }

    let mut binning = MemoryBinning::new();
    binning.set_dimension(dimension);
    for (volume, links) in read_volumes(&table, dimension)? {
        binning.append(volume, links);
    }

    match read_primaries(dir)? {
        Some(primaries) => primaries.into_iter().for_each(|p| binning.add_primary(p)),
        None => warn!(
            dir = %dir.display(),
            "no primary volume table; classification will start from every volume"
        ),
    }

    debug!(
        dimension,
        n_volumes = binning.n_volumes(),
        n_primaries = binning.n_primaries(),
        "read hierarchical binning"
    );
    Ok(binning)
}

fn read_volumes(table: &Table, dimension: usize) -> Result<Vec<(Volume, Vec<usize>)>, PersistError> {
    let keys = extract_index_column(table, BIN_NUMBER)?;
    let lows = (0..dimension)
        .map(|d| extract_float_column(table, &format!("{LOW_CORNER_PREFIX}{d}")))
        .collect::<Result<Vec<_>, _>>()?;
    let highs = (0..dimension)
        .map(|d| extract_float_column(table, &format!("{HIGH_CORNER_PREFIX}{d}")))
        .collect::<Result<Vec<_>, _>>()?;
    let links = extract_index_list_column(table, LINKED_BINS)?;

    let mut volumes = Vec::new();
    let mut current: Option<(i64, Volume)> = None;

    for (row, &key) in keys.iter().enumerate() {
        let low = Point::new(lows.iter().map(|axis| axis[row]).collect());
        let high = Point::new(highs.iter().map(|axis| axis[row]).collect());
        // A zero-width row stands in for a volume without cuboids.
        let cuboid = (low != high).then(|| Cuboid::new(low, high));

        if let Some((open_key, volume)) = current.as_mut() {
            if *open_key == key {
                if let Some(cuboid) = cuboid {
                    volume.push_cuboid(cuboid);
                }
                continue;
            }
        }
        // Key changed: the previous row closed its group.
        if let Some((_, volume)) = current.take() {
            volumes.push((volume, to_indices(&links[row - 1], LINKED_BINS)?));
        }
        let mut volume = Volume::new(dimension);
        if let Some(cuboid) = cuboid {
            volume.push_cuboid(cuboid);
        }
        current = Some((key, volume));
    }
    if let (Some((_, volume)), Some(last)) = (current, links.last()) {
        volumes.push((volume, to_indices(last, LINKED_BINS)?));
    }

    Ok(volumes)
}

fn read_primaries(dir: &Path) -> Result<Option<Vec<usize>>, PersistError> {
    let path = table_path(dir, PRIMARY_TABLE);
    if !path.is_file() {
        return Ok(None);
    }
    let table = read_table(&path)?;
    let primaries = extract_index_column(&table, VOLUME_NUMBER)?;
    to_indices(&primaries, VOLUME_NUMBER).map(Some)
}

fn to_indices(values: &[i64], name: &str) -> Result<Vec<usize>, PersistError> {
    values
        .iter()
        .map(|&v| {
            usize::try_from(v).map_err(|_| PersistError::UnsupportedType {
                column: name.into(),
                expected: "non-negative volume index".into(),
                got: v.to_string(),
            })
        })
        .collect()
}

// =============================================================================
// Writing
// =============================================================================

/// Write any hierarchical binning into `dir`, creating it if needed.
///
/// Each cuboid becomes one row keyed by its volume index, carrying the
/// volume's links. A volume without cuboids is written as a single
/// degenerate cuboid so the volume indices survive the round trip.
pub fn write_hierarchy<H>(binning: &H, dir: &Path) -> Result<(), PersistError>
where
    H: HierarchicalBinning + ?Sized,
{
    std::fs::create_dir_all(dir)?;
    let dimension = binning.dimension();

    let mut keys = Vec::new();
    let mut lows = vec![Vec::new(); dimension];
    let mut highs = vec![Vec::new(); dimension];
    let mut links = Vec::new();

    for index in 0..binning.n_volumes() {
        let (Some(volume), Some(children)) = (binning.volume(index), binning.links(index)) else {
            continue;
        };
        let degenerate = [Cuboid::degenerate(dimension)];
        let cuboids = if volume.is_empty() {
            &degenerate[..]
        } else {
            volume.cuboids()
        };
        for cuboid in cuboids {
            keys.push(index);
            for d in 0..dimension {
                lows[d].push(cuboid.low().get(d));
                highs[d].push(cuboid.high().get(d));
            }
            links.push(children.to_vec());
        }
    }

    let low_names: Vec<String> = (0..dimension).map(|d| format!("{LOW_CORNER_PREFIX}{d}")).collect();
    let high_names: Vec<String> = (0..dimension).map(|d| format!("{HIGH_CORNER_PREFIX}{d}")).collect();

    let mut columns = vec![(BIN_NUMBER, index_array(&keys, BIN_NUMBER)?)];
    columns.extend(low_names.iter().map(String::as_str).zip(lows.into_iter().map(float_array)));
    columns.extend(high_names.iter().map(String::as_str).zip(highs.into_iter().map(float_array)));
    columns.push((LINKED_BINS, index_list_array(&links, LINKED_BINS)?));
    write_table(&table_path(dir, VOLUME_TABLE), columns)?;

    let primaries: Vec<usize> = (0..binning.n_primaries())
        .filter_map(|i| binning.primary(i))
        .collect();
    write_table(
        &table_path(dir, PRIMARY_TABLE),
        vec![(VOLUME_NUMBER, index_array(&primaries, VOLUME_NUMBER)?)],
    )
}
