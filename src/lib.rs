//! Lot Map
//!
//! Renders a top-down overview PNG of a cell-based world map from its
//! `.lotheader` and `.lotpack` files, coloring each ground square by
//! user-defined tileset rules.

pub mod codec;
pub mod config;
pub mod error;
pub mod render;
pub mod rules;
pub mod world;

pub use error::{Error, Result};
pub use codec::{CellHeader, decode_cell, LotPackWriter};
pub use config::{RecentPaths, RunConfig};
pub use render::{
    CancelToken, Rasterizer, RenderOutcome, RenderProgress, RenderStats,
    render_map,
};
pub use rules::{Color, Rule, RuleSet, TileRange, TilesetCompare, classify};
pub use world::{
    CellCoord, CellSource, GridFlavor, MapDirectory, TileRef, WorldBounds,
};
