//! Run settings and remembered paths.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::world::GridFlavor;

/// Everything one render needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub map_dir: PathBuf,
    pub rules_path: PathBuf,
    pub output_path: PathBuf,
    pub flavor: GridFlavor,
}

impl RunConfig {
    /// Fill paths missing from the command line from `recent`.
    pub fn resolve(
        map_dir: Option<PathBuf>,
        rules_path: Option<PathBuf>,
        output_path: Option<PathBuf>,
        flavor: GridFlavor,
        recent: &RecentPaths,
    ) -> Result<Self> {
        fn pick(arg: Option<PathBuf>, recent: &Option<PathBuf>, what: &str) -> Result<PathBuf> {
            arg.or_else(|| recent.clone())
                .ok_or_else(|| Error::InvalidInput(format!("no {what} given and none remembered")))
        }
        Ok(Self {
            map_dir: pick(map_dir, &recent.map_dir, "map directory")?,
            rules_path: pick(rules_path, &recent.rules_path, "rules file")?,
            output_path: pick(output_path, &recent.output_path, "output file")?,
            flavor,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.map_dir.is_dir() {
            return Err(Error::InvalidInput(format!(
                "map directory {} does not exist",
                self.map_dir.display()
            )));
        }
        if !self.rules_path.is_file() {
            return Err(Error::InvalidInput(format!(
                "rules file {} does not exist",
                self.rules_path.display()
            )));
        }
        let is_png = self
            .output_path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("png"));
        if !is_png {
            return Err(Error::InvalidInput(format!(
                "output file {} must end in .png",
                self.output_path.display()
            )));
        }
        Ok(())
    }
}

/// Last paths used by a successful render
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecentPaths {
    pub map_dir: Option<PathBuf>,
    pub rules_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
}

impl RecentPaths {
    /// `<config dir>/lotmap/recent.json`, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("lotmap").join("recent.json"))
    }

    /// A missing file yields empty settings.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::from(e).in_file(path)),
        };
        serde_json::from_str(&text).map_err(|e| Error::from(e).in_file(path))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::from(e).in_file(parent))?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|e| Error::from(e).in_file(path))
    }

    pub fn remember(&mut self, config: &RunConfig) {
        self.map_dir = Some(config.map_dir.clone());
        self.rules_path = Some(config.rules_path.clone());
        self.output_path = Some(config.output_path.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn valid_config(dir: &TempDir) -> RunConfig {
        let rules_path = dir.path().join("rules.txt");
        std::fs::write(&rules_path, "version = 1\n").unwrap();
        RunConfig {
            map_dir: dir.path().to_path_buf(),
            rules_path,
            output_path: dir.path().join("map.png"),
            flavor: GridFlavor::Cells256,
        }
    }

    #[test]
    fn test_validate() {
        let dir = TempDir::new().unwrap();
        let config = valid_config(&dir);
        config.validate().unwrap();

        let upper = RunConfig { output_path: dir.path().join("MAP.PNG"), ..config.clone() };
        upper.validate().unwrap();

        let bad = [
            RunConfig { map_dir: dir.path().join("nope"), ..config.clone() },
            RunConfig { rules_path: dir.path().join("nope.txt"), ..config.clone() },
            RunConfig { output_path: dir.path().join("map.jpg"), ..config.clone() },
            RunConfig { output_path: dir.path().join("map"), ..config.clone() },
        ];
        for c in bad {
            assert!(matches!(c.validate(), Err(Error::InvalidInput(_))), "{c:?}");
        }
    }

    #[test]
    fn test_resolve_falls_back_to_recent() {
        let recent = RecentPaths {
            map_dir: Some("old/map".into()),
            rules_path: Some("old/rules.txt".into()),
            output_path: None,
        };
        let config = RunConfig::resolve(None, Some("new.txt".into()), Some("out.png".into()), GridFlavor::Cells300, &recent)
            .unwrap();
        assert_eq!(config.map_dir, PathBuf::from("old/map"));
        assert_eq!(config.rules_path, PathBuf::from("new.txt"));
        assert_eq!(config.flavor, GridFlavor::Cells300);

        let err = RunConfig::resolve(None, None, None, GridFlavor::Cells256, &recent).unwrap_err();
        assert!(err.to_string().contains("output file"), "{err}");
    }

    #[test]
    fn test_recent_paths_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lotmap").join("recent.json");
        assert_eq!(RecentPaths::load(&path).unwrap(), RecentPaths::default());

        let mut recent = RecentPaths::default();
        recent.remember(&valid_config(&dir));
        recent.save(&path).unwrap();
        assert_eq!(RecentPaths::load(&path).unwrap(), recent);

        std::fs::write(&path, "{ not json").unwrap();
        let err = RecentPaths::load(&path).unwrap_err();
        assert!(err.to_string().contains("recent.json"), "{err}");
    }

    #[test]
    fn test_partial_file_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("recent.json");
        std::fs::write(&path, r#"{"rules_path": "r.txt"}"#).unwrap();
        let recent = RecentPaths::load(&path).unwrap();
        assert_eq!(recent.rules_path, Some(PathBuf::from("r.txt")));
        assert_eq!(recent.map_dir, None);
    }
}
