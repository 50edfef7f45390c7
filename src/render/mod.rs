//! Map image rendering.

pub mod raster;

pub use raster::{CancelToken, Rasterizer, RenderOutcome, RenderProgress, RenderStats, BACKGROUND};

use crate::config::RunConfig;
use crate::error::Result;
use crate::rules::read_rules;
use crate::world::MapDirectory;

/// Validate `config`, load its rule file and render the map directory to the output PNG.
pub fn render_map(
    config: &RunConfig,
    cancel: &CancelToken,
    progress: impl FnMut(RenderProgress),
) -> Result<RenderOutcome> {
    config.validate()?;
    let rules = read_rules(&config.rules_path)?;
    let mut source = MapDirectory::new(&config.map_dir);
    let outcome = Rasterizer::new(config.flavor, &rules)
        .on_progress(progress)
        .render_to_file(&mut source, cancel, &config.output_path);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::lotpack::{LotPackWriter, VERSION1};
    use crate::codec::CellHeader;
    use crate::rules::{write_rules, Color, Rule, RuleSet, TilesetCompare};
    use crate::world::{CellCoord, GridFlavor, SquarePos};

    #[test]
    fn test_render_map_from_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let maps = dir.path().join("map");
        std::fs::create_dir(&maps).unwrap();

        let cell = CellCoord::new(3, 3);
        let header = CellHeader::new(0, vec!["walls_exterior_01_7".to_string()]);
        let mut pack = LotPackWriter::new(VERSION1, GridFlavor::Cells300.constants(), 0);
        pack.set_stack(0, SquarePos { chunk_x: 29, chunk_y: 29, x: 9, y: 9 }, 0, &[0]).unwrap();
        std::fs::write(maps.join(cell.header_file_name()), header.encode()).unwrap();
        std::fs::write(maps.join(cell.pack_file_name()), pack.encode()).unwrap();

        let rules_path = dir.path().join("rules.txt");
        let color = Color::rgb(93, 44, 39);
        write_rules(&rules_path, &RuleSet::new(vec![Rule::new("walls", TilesetCompare::StartsWith, "walls_", color)]))
            .unwrap();

        let config = RunConfig {
            map_dir: maps,
            rules_path,
            output_path: dir.path().join("out.PNG"),
            flavor: GridFlavor::Cells300,
        };
        let mut calls = 0;
        let outcome = render_map(&config, &CancelToken::new(), |_| calls += 1).unwrap();
        assert_eq!(calls, 1);
        assert_eq!(outcome.stats().map(|s| s.pixels_written), Some(1));

        let saved = image::open(&config.output_path).unwrap().to_rgba8();
        assert_eq!(saved.dimensions(), (300, 300));
        assert_eq!(*saved.get_pixel(299, 299), color.to_rgba());
    }

    #[test]
    fn test_render_map_rejects_bad_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = RunConfig {
            map_dir: dir.path().join("absent"),
            rules_path: dir.path().join("rules.txt"),
            output_path: dir.path().join("out.png"),
            flavor: GridFlavor::Cells256,
        };
        assert!(render_map(&config, &CancelToken::new(), |_| {}).is_err());
        assert!(!config.output_path.exists());
    }
}
