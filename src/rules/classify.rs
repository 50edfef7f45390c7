use crate::rules::{Color, RuleSet};
use crate::world::TileRef;

/// Color for a tile, or `None` when the tile is unresolved or no rule matches.
///
/// Rules are scanned from last to first and the first match wins, so a rule
/// overrides every rule declared before it.
pub fn classify(tile: &TileRef, rules: &RuleSet) -> Option<Color> {
    let TileRef::Resolved { tileset, index } = tile else {
        return None;
    };
    rules
        .iter()
        .rev()
        .find(|rule| rule.matches(tileset, *index))
        .map(|rule| rule.color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Rule, TilesetCompare};

    const RED: Color = Color::rgb(255, 0, 0);
    const BLUE: Color = Color::rgb(0, 0, 255);

    #[test]
    fn test_last_declared_rule_wins() {
        let rules = RuleSet::new(vec![
            Rule::new("A", TilesetCompare::Contains, "foo", RED),
            Rule::new("B", TilesetCompare::Contains, "foo", BLUE),
        ]);
        assert_eq!(classify(&TileRef::resolved("foobar", 0), &rules), Some(BLUE));
    }

    #[test]
    fn test_later_rule_only_wins_when_it_matches() {
        let rules = RuleSet::new(vec![
            Rule::new("any", TilesetCompare::StartsWith, "blends", RED),
            Rule::new("range", TilesetCompare::StartsWith, "blends", BLUE).with_range(16, 31),
        ]);
        assert_eq!(classify(&TileRef::resolved("blends_natural_01", 20), &rules), Some(BLUE));
        assert_eq!(classify(&TileRef::resolved("blends_natural_01", 40), &rules), Some(RED));
    }

    #[test]
    fn test_no_match() {
        let rules = RuleSet::new(vec![Rule::new("x", TilesetCompare::Equals, "X", RED)]);
        assert_eq!(classify(&TileRef::resolved("Y", 0), &rules), None);
        assert_eq!(classify(&TileRef::resolved("X", 0), &RuleSet::default()), None);
    }

    #[test]
    fn test_unresolved_never_matches() {
        // Empty patterns match every tileset name.
        let rules = RuleSet::new(vec![
            Rule::new("all", TilesetCompare::Contains, "", RED),
            Rule::new("all2", TilesetCompare::StartsWith, "", BLUE),
        ]);
        assert_eq!(classify(&TileRef::Unresolved, &rules), None);
        assert_eq!(classify(&TileRef::resolved("anything", 3), &rules), Some(BLUE));
    }

    #[test]
    fn test_builtin_palette() {
        let rules = RuleSet::builtin();
        let dark = classify(&TileRef::resolved("blends_natural_01", 20), &rules);
        assert_eq!(dark, Some(Color::rgb(75, 88, 27)));
        // vegetation_farm is declared after vegetation, so it overrides it.
        let corn = classify(&TileRef::resolved("vegetation_farm_01", 3), &rules);
        assert_eq!(corn, Some(Color::rgb(218, 165, 32)));
        assert_eq!(classify(&TileRef::resolved("blends_natural_01", 96), &rules), None);
    }
}
