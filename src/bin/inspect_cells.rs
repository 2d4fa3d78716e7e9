//! Print a summary of a cell value parquet file.
//!
//! Usage: `inspect_cells <file> [--gid-column gid] [--value-column value]`

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;

use gridscale::data_loader::read_parquet;
use gridscale::grid::{size_for_level, Bounds, GridSystem, SquareGrid};

#[derive(Parser, Debug)]
#[command(name = "inspect_cells", about = "Summarize a cell value parquet file")]
struct Args {
    /// Parquet file to inspect
    file: PathBuf,

    #[arg(long, default_value = "gid")]
    gid_column: String,

    #[arg(long, default_value = "value")]
    value_column: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    println!("Inspecting cell file: {}", args.file.display());

    let rows = read_parquet(&args.file, &args.gid_column, &args.value_column)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let grid = SquareGrid::new();

    let mut levels: BTreeMap<usize, usize> = BTreeMap::new();
    let mut seen = std::collections::HashSet::new();
    let mut duplicates = 0usize;
    let mut missing = 0usize;
    let mut invalid = 0usize;
    let mut values = Vec::new();
    let mut coverage: Option<Bounds> = None;

    for row in &rows {
        *levels.entry(row.gid.chars().count()).or_default() += 1;
        if !seen.insert(row.gid.as_str()) {
            duplicates += 1;
        }
        match row.value {
            Some(v) => values.push(v),
            None => missing += 1,
        }
        match grid.identifier_to_bounds(&row.gid) {
            Ok(b) if row.value.is_some() => match coverage.as_mut() {
                Some(c) => c.expand(&b),
                None => coverage = Some(b),
            },
            Ok(_) => {}
            Err(_) => invalid += 1,
        }
    }

    println!("\n=== ROWS ===");
    println!("  total:              {}", rows.len());
    println!("  missing values:     {}", missing);
    println!("  duplicate gids:     {}", duplicates);
    println!("  invalid gids:       {}", invalid);

    println!("\n=== LEVELS ===");
    for (level, count) in &levels {
        match u8::try_from(*level).ok().and_then(size_for_level) {
            Some(size) => println!("  level {:>2} ({:>8} m): {}", level, size, count),
            None => println!("  length {:>2} (unknown): {}", level, count),
        }
    }

    println!("\n=== VALUES ===");
    if values.is_empty() {
        println!("  no values");
    } else {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        println!("  min:  {}", min);
        println!("  max:  {}", max);
        println!("  mean: {:.4}", mean);
    }

    println!("\n=== COVERAGE (cells with values) ===");
    match coverage {
        Some(b) => println!(
            "  lon [{:.6}, {:.6}], lat [{:.6}, {:.6}]",
            b.min_lon, b.max_lon, b.min_lat, b.max_lat
        ),
        None => println!("  none"),
    }

    Ok(())
}
