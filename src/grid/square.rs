//! Hierarchical square grid.
//!
//! The globe is addressed in integer units of 9e-6 degrees (one nominal
//! metre). Level 1 splits it into 4×2 cells of 90°. Each finer level splits
//! its parent 2×2 or 5×5 in turn, so cell sides follow [`LEVEL_SIZES_M`].
//! Every level adds one symbol, the row-major index of the child inside its
//! parent, which makes the identifier length equal to its level and a
//! parent's identifier a prefix of all of its descendants.

use geo::{Contains, Intersects, Polygon};

use super::{Bounds, GridSystem, LEVEL_SIZES_M, MAX_LEVEL};
use crate::error::{GridscaleError, Result};

const DEGREES_PER_UNIT: f64 = 9.0e-6;
const WORLD_WIDTH: u64 = 40_000_000;
const WORLD_HEIGHT: u64 = 20_000_000;
const TOP_COLUMNS: u64 = 4;
const TOP_ROWS: u64 = 2;

const SYMBOLS: &[u8; 25] = b"0123456789ABCDEFGHJKLMNPQ";

/// Upper bound on the number of cells a single polyfill may return
pub const POLYFILL_LIMIT: usize = 2_000_000;

/// Upper bound on the number of cells a single children expansion may return
pub const CHILDREN_LIMIT: usize = 1_000_000;

#[inline]
fn cell_size(level: u8) -> u64 {
    LEVEL_SIZES_M[level as usize - 1]
}

/// Children per side when going from `level - 1` to `level`
#[inline]
fn split(level: u8) -> u64 {
    cell_size(level - 1) / cell_size(level)
}

#[inline]
fn symbol(index: u64) -> char {
    SYMBOLS[index as usize] as char
}

fn check_level(level: u8) -> Result<()> {
    if level == 0 || level > MAX_LEVEL {
        return Err(GridscaleError::InvalidParameter {
            param: "level".to_string(),
            message: format!("level must be between 1 and {}, got {}", MAX_LEVEL, level),
        });
    }
    Ok(())
}

/// The default grid addressing system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquareGrid;

impl SquareGrid {
    pub fn new() -> Self {
        Self
    }

    fn to_units(lon: f64, lat: f64) -> (u64, u64) {
        let x = ((lon + 180.0) / DEGREES_PER_UNIT).floor().max(0.0) as u64;
        let y = ((lat + 90.0) / DEGREES_PER_UNIT).floor().max(0.0) as u64;
        // lon = 180 and lat = 90 belong to the last cell
        (x.min(WORLD_WIDTH - 1), y.min(WORLD_HEIGHT - 1))
    }

    fn encode(x: u64, y: u64, level: u8) -> String {
        let mut gid = String::with_capacity(level as usize);
        let top = cell_size(1);
        gid.push(symbol((y / top) * TOP_COLUMNS + x / top));

        for l in 2..=level {
            let parent = cell_size(l - 1);
            let size = cell_size(l);
            let n = parent / size;
            let col = (x % parent) / size;
            let row = (y % parent) / size;
            gid.push(symbol(row * n + col));
        }
        gid
    }

    /// Lower-left corner in units and the level of an identifier
    fn decode(gid: &str) -> Result<(u64, u64, u8)> {
        let len = gid.len();
        if len == 0 || len > MAX_LEVEL as usize {
            return Err(GridscaleError::InvalidIdentifier {
                message: format!(
                    "GID must have between 1 and {} characters, got {}",
                    MAX_LEVEL, len
                ),
            });
        }

        let (mut x, mut y) = (0u64, 0u64);
        for (i, b) in gid.bytes().enumerate() {
            let level = i as u8 + 1;
            let index = SYMBOLS
                .iter()
                .position(|&s| s == b)
                .ok_or_else(|| GridscaleError::InvalidIdentifier {
                    message: format!("'{}' has an unknown symbol at position {}", gid, i),
                })? as u64;

            let (cols, rows) = if level == 1 {
                (TOP_COLUMNS, TOP_ROWS)
            } else {
                (split(level), split(level))
            };
            if index >= cols * rows {
                return Err(GridscaleError::InvalidIdentifier {
                    message: format!(
                        "'{}' has symbol '{}' out of range at level {}",
                        gid, b as char, level
                    ),
                });
            }

            let size = cell_size(level);
            x += (index % cols) * size;
            y += (index / cols) * size;
        }

        Ok((x, y, len as u8))
    }

    fn unit_bounds(x: u64, y: u64, level: u8) -> Bounds {
        let size = cell_size(level);
        Bounds::new(
            x as f64 * DEGREES_PER_UNIT - 180.0,
            y as f64 * DEGREES_PER_UNIT - 90.0,
            (x + size) as f64 * DEGREES_PER_UNIT - 180.0,
            (y + size) as f64 * DEGREES_PER_UNIT - 90.0,
        )
    }

    /// Push every descendant of the cell at (x, y, level) down to `target`
    fn expand_all(x: u64, y: u64, level: u8, target: u8, out: &mut Vec<String>, limit: usize) -> Result<()> {
        let n = cell_size(level) / cell_size(target);
        if out.len() as u64 + n * n > limit as u64 {
            return Err(GridscaleError::InvalidParameter {
                param: "level".to_string(),
                message: format!("expansion exceeds the limit of {} cells", limit),
            });
        }

        let step = cell_size(target);
        for row in 0..n {
            for col in 0..n {
                out.push(Self::encode(x + col * step, y + row * step, target));
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn fill(
        &self,
        polygon: &Polygon<f64>,
        x: u64,
        y: u64,
        level: u8,
        target: u8,
        full_cover: bool,
        out: &mut Vec<String>,
    ) -> Result<()> {
        let cell = Self::unit_bounds(x, y, level).to_polygon();
        if !polygon.intersects(&cell) {
            return Ok(());
        }

        if level == target {
            if !full_cover || polygon.contains(&cell) {
                if out.len() >= POLYFILL_LIMIT {
                    return Err(polyfill_limit_error());
                }
                out.push(Self::encode(x, y, target));
            }
            return Ok(());
        }

        if polygon.contains(&cell) {
            return Self::expand_all(x, y, level, target, out, POLYFILL_LIMIT)
                .map_err(|_| polyfill_limit_error());
        }

        let child = level + 1;
        let n = split(child);
        let step = cell_size(child);
        for row in 0..n {
            for col in 0..n {
                self.fill(polygon, x + col * step, y + row * step, child, target, full_cover, out)?;
            }
        }
        Ok(())
    }
}

fn polyfill_limit_error() -> GridscaleError {
    GridscaleError::InvalidParameter {
        param: "polygon".to_string(),
        message: format!(
            "polygon covers more than {} cells at the requested level",
            POLYFILL_LIMIT
        ),
    }
}

impl GridSystem for SquareGrid {
    fn coordinate_to_identifier(&self, lon: f64, lat: f64, level: u8) -> Result<String> {
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(GridscaleError::InvalidCoordinate {
                message: format!("longitude {} is outside [-180, 180]", lon),
            });
        }
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(GridscaleError::InvalidCoordinate {
                message: format!("latitude {} is outside [-90, 90]", lat),
            });
        }
        if level == 0 || level > MAX_LEVEL {
            return Err(GridscaleError::InvalidCoordinate {
                message: format!("level must be between 1 and {}, got {}", MAX_LEVEL, level),
            });
        }

        let (x, y) = Self::to_units(lon, lat);
        Ok(Self::encode(x, y, level))
    }

    fn identifier_to_bounds(&self, gid: &str) -> Result<Bounds> {
        let (x, y, level) = Self::decode(gid)?;
        Ok(Self::unit_bounds(x, y, level))
    }

    fn children(&self, gid: &str, target_level: u8) -> Result<Vec<String>> {
        let (x, y, level) = Self::decode(gid)?;
        check_level(target_level)?;
        if target_level <= level {
            return Err(GridscaleError::InvalidParameter {
                param: "size".to_string(),
                message: format!(
                    "target level {} must be finer than the parent level {}",
                    target_level, level
                ),
            });
        }

        let mut out = Vec::new();
        Self::expand_all(x, y, level, target_level, &mut out, CHILDREN_LIMIT)?;
        Ok(out)
    }

    fn polyfill(&self, polygon: &Polygon<f64>, level: u8, full_cover: bool) -> Result<Vec<String>> {
        check_level(level)?;

        let top = cell_size(1);
        let mut out = Vec::new();
        for row in 0..TOP_ROWS {
            for col in 0..TOP_COLUMNS {
                self.fill(polygon, col * top, row * top, 1, level, full_cover, &mut out)?;
            }
        }
        Ok(out)
    }
}
