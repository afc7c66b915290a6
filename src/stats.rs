//! KWYK stats table reader
//!
//! A stats file is a whitespace separated table with a header row naming at
//! least the `label`, `kwyk_index`, `number_voxels` and `vol_inmm3` columns:
//!
//! ```text
//! label kwyk_index number_voxels vol_inmm3
//! Left-Hippocampus 17 4123 3987.5
//! ```
//!
//! Each row yields two measurements, one per [`Measure`], bound to the CDE
//! ids the registry assigns to their keys.

use crate::errors::{CdeError, CdeResult};
use crate::key::keys_for_row;
use crate::persist;
use crate::registry::CdeRegistry;
use crate::types::{Measure, Measurement, StatsRow, StructuralIndex};
use std::path::Path;
use tracing::{debug, info};

/// Columns every stats table must provide
pub const REQUIRED_COLUMNS: [&str; 4] = ["label", "kwyk_index", "number_voxels", "vol_inmm3"];

/// Parse a stats table
pub fn parse_stats(content: &str) -> CdeResult<Vec<StatsRow>> {
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header) = lines.next().ok_or_else(|| CdeError::MissingColumn {
        column: REQUIRED_COLUMNS[0].to_string(),
    })?;
    let header: Vec<&str> = header.split_whitespace().collect();

    let mut positions = [0usize; 4];
    for (slot, column) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = header
            .iter()
            .position(|h| *h == column)
            .ok_or_else(|| CdeError::MissingColumn {
                column: column.to_string(),
            })?;
    }
    let [label_at, index_at, voxels_at, volume_at] = positions;

    let mut rows = Vec::new();
    for (line_no, line) in lines {
        let cells: Vec<&str> = line.split_whitespace().collect();
        if cells.len() != header.len() {
            return Err(CdeError::InvalidRow {
                line: line_no,
                reason: format!("expected {} columns, found {}", header.len(), cells.len()),
            });
        }

        let number_voxels = numeric_cell(cells[voxels_at], "number_voxels", line_no)?;
        let vol_inmm3 = numeric_cell(cells[volume_at], "vol_inmm3", line_no)?;

        rows.push(StatsRow {
            label: cells[label_at].to_string(),
            kwyk_index: StructuralIndex::from_cell(cells[index_at]),
            number_voxels,
            vol_inmm3,
        });
    }

    debug!("Parsed {} stats rows", rows.len());
    Ok(rows)
}

/// Keep the cell text verbatim, but only if it is a number
fn numeric_cell(cell: &str, column: &str, line: usize) -> CdeResult<String> {
    if cell.parse::<f64>().map(f64::is_finite).unwrap_or(false) {
        Ok(cell.to_string())
    } else {
        Err(CdeError::InvalidRow {
            line,
            reason: format!("{} value {:?} is not a number", column, cell),
        })
    }
}

/// Resolve rows to measurements, allocating ids for new keys.
///
/// Returns the measurements and whether the registry changed. In strict mode
/// the first unknown key aborts with [`CdeError::UnknownKey`].
pub fn measurements_for_rows(
    rows: &[StatsRow],
    registry: &mut CdeRegistry,
    strict: bool,
) -> CdeResult<(Vec<Measurement>, bool)> {
    let mut measurements = Vec::with_capacity(rows.len() * Measure::all().len());
    let mut changed = false;

    for row in rows {
        for key in keys_for_row(row) {
            let (id, mutated) = registry.lookup_or_allocate(&key, &row.kwyk_index, strict)?;
            changed |= mutated;
            measurements.push(Measurement::new(id, row.value_of(key.measure)));
        }
    }

    Ok((measurements, changed))
}

/// Read a stats file and resolve its measurements against the registry
pub fn read_kwyk_stats(
    path: &Path,
    registry: &mut CdeRegistry,
    strict: bool,
) -> CdeResult<(Vec<Measurement>, bool)> {
    let content = persist::read_to_string(path)?;
    let rows = parse_stats(&content)?;
    let result = measurements_for_rows(&rows, registry, strict)?;
    info!(
        "Read {} measurements from {}",
        result.0.len(),
        path.display()
    );
    Ok(result)
}
