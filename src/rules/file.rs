use std::path::Path;

use crate::error::{Error, Result};
use crate::rules::simple_file::{SimpleBlock, SimpleFile};
use crate::rules::{Color, Rule, RuleSet, TileRange, TilesetCompare};

pub const RULES_VERSION_LATEST: i32 = 1;

/// Parse rule file text. Errors carry the line of the offending block.
pub fn parse_rules(text: &str) -> Result<RuleSet> {
    let file = SimpleFile::parse(text)?;
    let version = file.version.unwrap_or(RULES_VERSION_LATEST);
    if !(1..=RULES_VERSION_LATEST).contains(&version) {
        return Err(Error::UnsupportedRulesVersion { found: version, latest: RULES_VERSION_LATEST });
    }

    let mut rules = RuleSet { version, rules: Vec::with_capacity(file.blocks.len()) };
    for block in &file.blocks {
        match block.name.as_str() {
            "rule" => rules.push(parse_rule(block)?),
            // Reserved for global options
            "settings" => {}
            other => {
                return Err(Error::syntax(block.line, format!("Unknown block name '{other}'")));
            }
        }
    }
    Ok(rules)
}

fn parse_rule(block: &SimpleBlock) -> Result<Rule> {
    let line = block.line;
    let field = |key: &str| block.value(key).map(str::trim).unwrap_or("");

    let name = field("name");
    if name.is_empty() {
        return Err(Error::syntax(line, "Empty or missing name"));
    }

    let tileset = field("tileset");
    if tileset.is_empty() {
        return Err(Error::syntax(line, "Empty or missing tileset"));
    }
    let args: Vec<&str> = tileset.split_whitespace().collect();
    let [compare, pattern] = args[..] else {
        return Err(Error::syntax(line, "Expected two tileset arguments"));
    };
    let compare = TilesetCompare::from_keyword(compare)
        .ok_or_else(|| Error::syntax(line, format!("Unknown tileset compare '{compare}'")))?;

    let tile_range = match field("tileRange") {
        "" => None,
        range => Some(parse_tile_range(range, line)?),
    };

    let color = parse_color(field("color"), line)?;

    Ok(Rule {
        name: name.to_string(),
        compare,
        pattern: pattern.to_string(),
        tile_range,
        color,
    })
}

fn parse_tile_range(s: &str, line: usize) -> Result<TileRange> {
    let args: Vec<&str> = s.split_whitespace().collect();
    let [min, max] = args[..] else {
        return Err(Error::syntax(line, "Expected two tilerange arguments"));
    };
    let invalid = || Error::syntax(line, format!("Invalid tilerange arguments '{s}'"));
    let min: u32 = min.parse().map_err(|_| invalid())?;
    let max: u32 = max.parse().map_err(|_| invalid())?;
    TileRange::new(min, max).ok_or_else(invalid)
}

/// Parse `"r g b"` or `"r g b a"`, each channel in `0..=255`. Alpha defaults to 255.
pub fn parse_color(s: &str, line: usize) -> Result<Color> {
    let invalid = || Error::syntax(line, format!("Invalid color '{s}'"));
    let channels = s
        .split_whitespace()
        .map(|c| c.parse::<u8>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>>>()?;
    match channels[..] {
        [r, g, b] => Ok(Color::rgb(r, g, b)),
        [r, g, b, a] => Ok(Color::rgba(r, g, b, a)),
        _ => Err(invalid()),
    }
}

/// Fields that would not read back as written.
fn check_writable(rule: &Rule) -> Result<()> {
    let name = rule.name.as_str();
    if name.is_empty() || name.trim() != name || name.contains(['\n', '\r']) {
        return Err(Error::InvalidInput(format!("rule name {name:?} cannot be written")));
    }
    if rule.pattern.is_empty() || rule.pattern.contains(char::is_whitespace) {
        return Err(Error::InvalidInput(format!(
            "rule '{name}': tileset pattern {:?} must be a single word",
            rule.pattern
        )));
    }
    Ok(())
}

fn rule_block(rule: &Rule) -> SimpleBlock {
    let mut block = SimpleBlock::new("rule");
    block.add_value("name", rule.name.as_str());
    block.add_value("tileset", format!("{} {}", rule.compare, rule.pattern));
    if let Some(range) = rule.tile_range {
        block.add_value("tileRange", format!("{} {}", range.min, range.max));
    }
    block.add_value("color", rule.color.to_string());
    block
}

/// Canonical text for a rule set, stamped with the latest format version.
///
/// Rules whose name or pattern [`parse_rules`] could not read back are rejected.
pub fn rules_to_text(rules: &RuleSet) -> Result<String> {
    let mut file = SimpleFile {
        version: Some(RULES_VERSION_LATEST),
        ..SimpleFile::default()
    };
    file.blocks.push(SimpleBlock::new("settings"));
    for rule in rules {
        check_writable(rule)?;
        file.blocks.push(rule_block(rule));
    }
    Ok(file.to_text())
}

pub fn read_rules(path: &Path) -> Result<RuleSet> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::from(e).in_file(path))?;
    let rules = parse_rules(&text).map_err(|e| e.in_file(path))?;
    tracing::debug!(path = %path.display(), rules = rules.len(), "read rule file");
    Ok(rules)
}

pub fn write_rules(path: &Path, rules: &RuleSet) -> Result<()> {
    let text = rules_to_text(rules)?;
    std::fs::write(path, text).map_err(|e| Error::from(e).in_file(path))
}
