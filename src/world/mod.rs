pub mod grid;
pub mod headers;
pub mod tiles;

pub use grid::{CellCoord, GridConstants, GridFlavor, SquarePos, WorldBounds, scan_bounds};
pub use headers::{CellSource, HeaderCache, MapDirectory, MemoryCells};
pub use tiles::TileRef;
