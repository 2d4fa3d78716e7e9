//! Test data generation utilities.
//!
//! This module writes parquet files of cell values with known patterns for
//! testing the gridscale server.

use arrow_array::{Float64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use parquet::arrow::ArrowWriter;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use gridscale::grid::{GridSystem, SquareGrid};

/// Center of the test block
pub const BLOCK_LON: f64 = 106.81234;
pub const BLOCK_LAT: f64 = -6.21234;
/// Width of a level-12 cell in degrees
pub const CELL_STEP: f64 = 0.00045;

/// Write `(gid, value)` rows to a parquet file with the default column names
pub fn write_cells_parquet(
    path: &Path,
    rows: &[(Option<&str>, Option<f64>)],
) -> Result<(), Box<dyn std::error::Error>> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("gid", DataType::Utf8, true),
        Field::new("value", DataType::Float64, true),
    ]));
    let gids: Vec<Option<&str>> = rows.iter().map(|(gid, _)| *gid).collect();
    let values: Vec<Option<f64>> = rows.iter().map(|(_, value)| *value).collect();

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(gids)),
            Arc::new(Float64Array::from(values)),
        ],
    )?;

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// Identifiers of a 3x3 block of level-12 cells around the block center,
/// listed row by row from the south-west corner
pub fn block_gids() -> Vec<String> {
    let grid = SquareGrid::new();
    let mut gids = Vec::with_capacity(9);
    for row in -1..=1 {
        for col in -1..=1 {
            let lon = BLOCK_LON + col as f64 * CELL_STEP;
            let lat = BLOCK_LAT + row as f64 * CELL_STEP;
            gids.push(
                grid.coordinate_to_identifier(lon, lat, 12)
                    .expect("block coordinates are valid"),
            );
        }
    }
    gids
}

/// Write the 3x3 block with values 1..=9, plus one row without a value
pub fn create_block_parquet(path: &Path) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let gids = block_gids();
    let mut rows: Vec<(Option<&str>, Option<f64>)> = gids
        .iter()
        .enumerate()
        .map(|(i, gid)| (Some(gid.as_str()), Some(i as f64 + 1.0)))
        .collect();

    let far = SquareGrid::new().coordinate_to_identifier(BLOCK_LON + 1.0, BLOCK_LAT, 12)?;
    rows.push((Some(far.as_str()), None));

    write_cells_parquet(path, &rows)?;
    Ok(gids)
}
