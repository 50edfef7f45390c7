use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::{ImageFormat, RgbaImage};

use crate::codec::{decode_cell, CellHeader};
use crate::error::{Error, Result};
use crate::rules::{classify, Color, RuleSet};
use crate::world::{CellCoord, CellSource, GridConstants, GridFlavor, WorldBounds};

/// Fill for squares no rule colored
pub const BACKGROUND: Color = Color::rgb(160, 160, 164);

/// Shared stop flag, polled once per cell
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderProgress {
    pub cell: CellCoord,
    /// 0-based position of `cell` in render order
    pub index: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub cells_rendered: usize,
    pub cells_missing: usize,
    pub cells_failed: usize,
    pub pixels_written: usize,
}

#[derive(Debug)]
pub enum RenderOutcome {
    Rendered { image: RgbaImage, stats: RenderStats },
    /// The source had no cells
    Empty,
    Cancelled { stats: RenderStats },
}

impl RenderOutcome {
    pub fn stats(&self) -> Option<RenderStats> {
        match self {
            Self::Rendered { stats, .. } | Self::Cancelled { stats } => Some(*stats),
            Self::Empty => None,
        }
    }
}

/// Paints one pixel per ground square of every cell a [`CellSource`] provides
pub struct Rasterizer<'a> {
    grid: GridConstants,
    rules: &'a RuleSet,
    background: Color,
    progress: Option<Box<dyn FnMut(RenderProgress) + 'a>>,
}

impl<'a> Rasterizer<'a> {
    pub fn new(flavor: GridFlavor, rules: &'a RuleSet) -> Self {
        Self {
            grid: flavor.constants(),
            rules,
            background: BACKGROUND,
            progress: None,
        }
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    /// Called before each cell is visited.
    pub fn on_progress(mut self, f: impl FnMut(RenderProgress) + 'a) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    pub fn grid(&self) -> GridConstants {
        self.grid
    }

    pub fn render(&mut self, source: &mut dyn CellSource, cancel: &CancelToken) -> Result<RenderOutcome> {
        let Some(bounds) = source.bounds()? else {
            tracing::info!("no cells found, nothing to render");
            return Ok(RenderOutcome::Empty);
        };
        let (width, height) = bounds.image_size(self.grid)?;
        tracing::info!(
            min_x = bounds.min_x, max_x = bounds.max_x, min_y = bounds.min_y, max_y = bounds.max_y,
            width, height, rules = self.rules.len(),
            "rendering map image"
        );

        let mut image = RgbaImage::from_pixel(width, height, self.background.to_rgba());
        let mut stats = RenderStats::default();
        let total = bounds.cell_count();

        for (index, cell) in bounds.cells().enumerate() {
            if let Some(progress) = self.progress.as_mut() {
                progress(RenderProgress { cell, index, total });
            }
            if cancel.is_cancelled() {
                tracing::info!(%cell, "render cancelled");
                source.release();
                return Ok(RenderOutcome::Cancelled { stats });
            }
            self.render_cell(source, &bounds, cell, &mut image, &mut stats);
        }

        tracing::info!(
            rendered = stats.cells_rendered,
            missing = stats.cells_missing,
            failed = stats.cells_failed,
            pixels = stats.pixels_written,
            "render finished"
        );
        Ok(RenderOutcome::Rendered { image, stats })
    }

    /// Problems with a single cell are logged and leave it at the background color.
    fn render_cell(
        &self,
        source: &mut dyn CellSource,
        bounds: &WorldBounds,
        cell: CellCoord,
        image: &mut RgbaImage,
        stats: &mut RenderStats,
    ) {
        tracing::debug!(%cell, "creating image for cell");
        let (header, pack) = match load_cell(source, cell) {
            Ok(Some(found)) => found,
            Ok(None) => {
                stats.cells_missing += 1;
                return;
            }
            Err(e) => {
                tracing::warn!(%cell, error = %e, "skipping unreadable cell");
                stats.cells_failed += 1;
                return;
            }
        };

        let decoded = match decode_cell(&pack, &header, self.grid) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!(%cell, error = %e, "skipping cell with bad lotpack data");
                stats.cells_failed += 1;
                source.forget(cell);
                return;
            }
        };

        for ground in &decoded.tiles {
            if let Some(color) = classify(ground.tile, self.rules) {
                let (x, y) = bounds.pixel_of(self.grid, cell, ground.square);
                image.put_pixel(x, y, color.to_rgba());
                stats.pixels_written += 1;
            }
        }
        stats.cells_rendered += 1;
    }

    /// Render and write a PNG. Nothing is written unless the render completes.
    pub fn render_to_file(
        &mut self,
        source: &mut dyn CellSource,
        cancel: &CancelToken,
        output: &Path,
    ) -> Result<RenderOutcome> {
        let outcome = self.render(source, cancel)?;
        if let RenderOutcome::Rendered { image, .. } = &outcome {
            tracing::info!(path = %output.display(), "writing PNG");
            image
                .save_with_format(output, ImageFormat::Png)
                .map_err(|e| Error::from(e).in_file(output))?;
        }
        Ok(outcome)
    }
}

/// Both files of a cell, or `None` if either is absent.
fn load_cell(source: &mut dyn CellSource, cell: CellCoord) -> Result<Option<(Arc<CellHeader>, Vec<u8>)>> {
    let Some(header) = source.header(cell)? else {
        return Ok(None);
    };
    Ok(source.pack(cell)?.map(|pack| (header, pack)))
}
