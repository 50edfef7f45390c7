//! Cell grid geometry: flavors, bounds and world-to-pixel mapping.

use std::path::Path;

use crate::error::{Error, Result};

pub const HEADER_EXTENSION: &str = "lotheader";
pub const PACK_PREFIX: &str = "world_";
pub const PACK_EXTENSION: &str = "lotpack";

/// Largest RGBA buffer a render may allocate (4 GiB)
pub const MAX_IMAGE_BYTES: u64 = 1 << 32;

/// Cell coordinate (one header/pack file pair on disk)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
}

impl CellCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn header_file_name(self) -> String {
        format!("{}_{}.{}", self.x, self.y, HEADER_EXTENSION)
    }

    pub fn pack_file_name(self) -> String {
        format!("{}{}_{}.{}", PACK_PREFIX, self.x, self.y, PACK_EXTENSION)
    }

    /// Parse `"<x>_<y>.lotheader"`.
    pub fn from_header_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(HEADER_EXTENSION)?.strip_suffix('.')?;
        let (x, y) = stem.split_once('_')?;
        Some(Self::new(x.parse().ok()?, y.parse().ok()?))
    }
}

impl std::fmt::Display for CellCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// The two fixed cell layouts the game has shipped with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GridFlavor {
    /// 32x32 chunks of 8x8 squares
    #[default]
    Cells256,
    /// 30x30 chunks of 10x10 squares
    Cells300,
}

impl GridFlavor {
    pub fn from_256_flag(b256: bool) -> Self {
        if b256 { Self::Cells256 } else { Self::Cells300 }
    }

    pub fn constants(self) -> GridConstants {
        match self {
            Self::Cells256 => GridConstants { chunks_per_cell: 32, squares_per_chunk: 8 },
            Self::Cells300 => GridConstants { chunks_per_cell: 30, squares_per_chunk: 10 },
        }
    }
}

impl std::str::FromStr for GridFlavor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "256" => Ok(Self::Cells256),
            "300" => Ok(Self::Cells300),
            other => Err(Error::InvalidInput(format!("unknown grid flavor '{other}' (expected 256 or 300)"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridConstants {
    pub chunks_per_cell: usize,
    pub squares_per_chunk: usize,
}

impl GridConstants {
    pub fn squares_per_cell(&self) -> usize {
        self.chunks_per_cell * self.squares_per_chunk
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks_per_cell * self.chunks_per_cell
    }
}

/// A ground square inside a cell, addressed by chunk and in-chunk offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SquarePos {
    pub chunk_x: usize,
    pub chunk_y: usize,
    pub x: usize,
    pub y: usize,
}

/// Inclusive rectangle of cell coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorldBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl WorldBounds {
    pub fn new(min: CellCoord, max: CellCoord) -> Self {
        Self {
            min_x: min.x.min(max.x),
            max_x: min.x.max(max.x),
            min_y: min.y.min(max.y),
            max_y: min.y.max(max.y),
        }
    }

    /// Smallest bounds containing every coordinate, or `None` for an empty set.
    pub fn enclosing(cells: impl IntoIterator<Item = CellCoord>) -> Option<Self> {
        cells.into_iter().fold(None, |acc, c| {
            Some(match acc {
                None => Self::new(c, c),
                Some(b) => Self {
                    min_x: b.min_x.min(c.x),
                    max_x: b.max_x.max(c.x),
                    min_y: b.min_y.min(c.y),
                    max_y: b.max_y.max(c.y),
                },
            })
        })
    }

    pub fn width(&self) -> u32 {
        self.max_x.abs_diff(self.min_x).saturating_add(1)
    }

    pub fn height(&self) -> u32 {
        self.max_y.abs_diff(self.min_y).saturating_add(1)
    }

    pub fn cell_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    pub fn contains(&self, cell: CellCoord) -> bool {
        (self.min_x..=self.max_x).contains(&cell.x) && (self.min_y..=self.max_y).contains(&cell.y)
    }

    /// Cells in render order: Y outer, X inner, both ascending.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        (self.min_y..=self.max_y)
            .flat_map(move |y| (self.min_x..=self.max_x).map(move |x| CellCoord::new(x, y)))
    }

    /// Output image size in pixels, one pixel per square.
    ///
    /// Fails when the RGBA buffer would exceed [`MAX_IMAGE_BYTES`].
    pub fn image_size(&self, grid: GridConstants) -> Result<(u32, u32)> {
        let spc = grid.squares_per_cell() as u32;
        let size = self
            .width()
            .checked_mul(spc)
            .zip(self.height().checked_mul(spc))
            .filter(|&(w, h)| {
                u64::from(w)
                    .checked_mul(u64::from(h))
                    .and_then(|pixels| pixels.checked_mul(4))
                    .is_some_and(|bytes| bytes <= MAX_IMAGE_BYTES)
            });
        size.ok_or_else(|| {
            Error::InvalidInput(format!(
                "cells {},{}..={},{} are too far apart for one image",
                self.min_x, self.min_y, self.max_x, self.max_y
            ))
        })
    }

    /// Pixel covered by `square` of `cell`. `cell` must lie inside these bounds
    /// and [`image_size`](Self::image_size) must have succeeded.
    pub fn pixel_of(&self, grid: GridConstants, cell: CellCoord, square: SquarePos) -> (u32, u32) {
        let spc = grid.squares_per_cell() as u32;
        let spch = grid.squares_per_chunk as u32;
        let px = cell.x.abs_diff(self.min_x) * spc + square.chunk_x as u32 * spch + square.x as u32;
        let py = cell.y.abs_diff(self.min_y) * spc + square.chunk_y as u32 * spch + square.y as u32;
        (px, py)
    }
}

/// Scan a map directory for `<x>_<y>.lotheader` files and return their bounds.
pub fn scan_bounds(dir: &Path) -> Result<Option<WorldBounds>> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::from(e).in_file(dir))?;
    let mut cells = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(cell) = entry.file_name().to_str().and_then(CellCoord::from_header_file_name) {
            cells.push(cell);
        }
    }
    tracing::debug!(dir = %dir.display(), cells = cells.len(), "scanned map directory");
    Ok(WorldBounds::enclosing(cells))
}
