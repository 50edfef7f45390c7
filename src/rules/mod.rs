//! Tile classification rules.
//!
//! A rule maps tiles from matching tilesets (optionally restricted to an index
//! range) to a color. Rules declared later take priority over earlier ones.

pub mod classify;
pub mod file;
pub mod simple_file;

pub use classify::classify;
pub use file::{parse_rules, read_rules, rules_to_text, write_rules, RULES_VERSION_LATEST};
pub use simple_file::{SimpleBlock, SimpleFile};

use std::fmt;

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.r, self.g, self.b, self.a)
    }
}

/// How a rule's pattern is compared against a tileset name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TilesetCompare {
    Contains,
    Equals,
    StartsWith,
}

impl TilesetCompare {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Equals => "equals",
            Self::StartsWith => "startsWith",
        }
    }

    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "contains" => Some(Self::Contains),
            "equals" => Some(Self::Equals),
            "startsWith" => Some(Self::StartsWith),
            _ => None,
        }
    }

    pub fn matches(self, tileset: &str, pattern: &str) -> bool {
        match self {
            Self::Contains => tileset.contains(pattern),
            Self::Equals => tileset == pattern,
            Self::StartsWith => tileset.starts_with(pattern),
        }
    }
}

impl fmt::Display for TilesetCompare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive tile index range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileRange {
    pub min: u32,
    pub max: u32,
}

impl TileRange {
    pub fn new(min: u32, max: u32) -> Option<Self> {
        (min <= max).then_some(Self { min, max })
    }

    pub fn contains(&self, index: u32) -> bool {
        (self.min..=self.max).contains(&index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub compare: TilesetCompare,
    pub pattern: String,
    /// `None` matches every index
    pub tile_range: Option<TileRange>,
    pub color: Color,
}

impl Rule {
    pub fn new(name: impl Into<String>, compare: TilesetCompare, pattern: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            compare,
            pattern: pattern.into(),
            tile_range: None,
            color,
        }
    }

    /// Restrict the rule to tile indices `min..=max`.
    ///
    /// # Panics
    ///
    /// If `min > max`. Use [`TileRange::new`] to check untrusted bounds first.
    pub fn with_range(mut self, min: u32, max: u32) -> Self {
        assert!(min <= max, "tile range {min}..={max} is empty");
        self.tile_range = Some(TileRange { min, max });
        self
    }

    pub fn matches(&self, tileset: &str, index: u32) -> bool {
        self.compare.matches(tileset, &self.pattern)
            && self.tile_range.map_or(true, |r| r.contains(index))
    }
}

/// Rules in declaration order; the last matching rule wins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    pub version: i32,
    pub rules: Vec<Rule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self { version: RULES_VERSION_LATEST, rules: Vec::new() }
    }
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { version: RULES_VERSION_LATEST, rules }
    }

    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    /// The stock palette for vanilla map exports.
    pub fn builtin() -> Self {
        use TilesetCompare::*;
        let natural = "blends_natural_01";
        let tilesand = Color::rgb(132, 81, 76);
        Self::new(vec![
            Rule::new("normaltree", Contains, "_trees", Color::rgb(38, 53, 22)),
            Rule::new("jumbotree", Contains, "jumbo", Color::rgb(38, 53, 22)),
            Rule::new("rails", Contains, "_railroad", Color::rgb(73, 58, 43)),
            Rule::new("vegetation", StartsWith, "vegetation", Color::rgb(48, 73, 32)),
            Rule::new("sand", StartsWith, natural, Color::rgb(217, 207, 183)).with_range(0, 15),
            Rule::new("darkgrass", StartsWith, natural, Color::rgb(75, 88, 27)).with_range(16, 31),
            Rule::new("medgrass", StartsWith, natural, Color::rgb(97, 103, 36)).with_range(32, 47),
            Rule::new("litegrass", StartsWith, natural, Color::rgb(127, 120, 45)).with_range(48, 63),
            Rule::new("dirt", StartsWith, natural, Color::rgb(91, 63, 21)).with_range(64, 79),
            Rule::new("dirtgrass", StartsWith, natural, Color::rgb(91, 63, 21)).with_range(80, 95),
            Rule::new("water", StartsWith, "blends_natural_02", Color::rgb(108, 127, 131)),
            Rule::new("street", StartsWith, "blends_street_01", Color::rgb(128, 128, 128)),
            Rule::new("tilesandstone", StartsWith, "floors_exterior_tilesandstone", tilesand),
            Rule::new("tilesandwood", StartsWith, "floors_exterior_tilesandwood", tilesand),
            Rule::new("location", StartsWith, "location_", tilesand),
            Rule::new("corn", StartsWith, "vegetation_farm", Color::rgb(218, 165, 32)),
            Rule::new("walls", StartsWith, "walls_", Color::rgb(93, 44, 39)),
        ])
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
