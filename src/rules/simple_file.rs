//! Block-structured settings text.
//!
//! ```text
//! version = 1
//! rule
//! {
//!     name = grass
//!     color = 75 88 27 255
//! }
//! ```
//!
//! The opening brace may also share the block name's line (`rule {`).
//! Blank lines and lines starting with `#` are ignored.

use std::fmt::Write as _;
use std::path::Path;

use indexmap::IndexMap;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimpleBlock {
    pub name: String,
    /// 1-based line of the block name
    pub line: usize,
    pub values: IndexMap<String, String>,
    pub blocks: Vec<SimpleBlock>,
}

impl SimpleBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn add_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    fn write_to(&self, out: &mut String, depth: usize) {
        let indent = "\t".repeat(depth);
        let _ = writeln!(out, "{indent}{}", self.name);
        let _ = writeln!(out, "{indent}{{");
        for (key, value) in &self.values {
            let _ = writeln!(out, "{indent}\t{key} = {value}");
        }
        for block in &self.blocks {
            block.write_to(out, depth + 1);
        }
        let _ = writeln!(out, "{indent}}}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimpleFile {
    pub version: Option<i32>,
    /// Top-level values other than `version`
    pub values: IndexMap<String, String>,
    pub blocks: Vec<SimpleBlock>,
}

fn is_block_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

impl SimpleFile {
    pub fn parse(text: &str) -> Result<Self> {
        // stack[0] is the file root
        let mut stack = vec![SimpleBlock::default()];
        let mut pending: Option<(String, usize)> = None;
        let mut version = None;

        for (i, raw) in text.lines().enumerate() {
            let line_no = i + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((name, name_line)) = pending.take() {
                if line != "{" {
                    return Err(Error::syntax(name_line, format!("Expected '{{' after '{name}'")));
                }
                stack.push(SimpleBlock { name, line: name_line, ..SimpleBlock::default() });
                continue;
            }

            if line == "}" {
                if stack.len() == 1 {
                    return Err(Error::syntax(line_no, "Unexpected '}'"));
                }
                if let Some(block) = stack.pop() {
                    if let Some(parent) = stack.last_mut() {
                        parent.blocks.push(block);
                    }
                }
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                if key.is_empty() {
                    return Err(Error::syntax(line_no, "Missing key before '='"));
                }
                if stack.len() == 1 && key == "version" {
                    let value = value.trim();
                    let parsed: i32 = value
                        .parse()
                        .map_err(|_| Error::syntax(line_no, format!("Invalid version '{value}'")))?;
                    version = Some(parsed);
                    continue;
                }
                if let Some(block) = stack.last_mut() {
                    block.add_value(key, value.trim());
                }
                continue;
            }

            if let Some(name) = line.strip_suffix('{').map(str::trim) {
                if !is_block_name(name) {
                    return Err(Error::syntax(line_no, format!("Invalid block name '{name}'")));
                }
                stack.push(SimpleBlock { name: name.to_string(), line: line_no, ..SimpleBlock::default() });
                continue;
            }

            if is_block_name(line) {
                pending = Some((line.to_string(), line_no));
                continue;
            }
            return Err(Error::syntax(line_no, format!("Unexpected text '{line}'")));
        }

        if let Some((name, line)) = pending {
            return Err(Error::syntax(line, format!("Expected '{{' after '{name}'")));
        }
        if stack.len() > 1 {
            let open = &stack[stack.len() - 1];
            return Err(Error::syntax(open.line, format!("Unterminated block '{}'", open.name)));
        }

        let root = stack.pop().unwrap_or_default();
        Ok(Self { version, values: root.values, blocks: root.blocks })
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        if let Some(version) = self.version {
            let _ = writeln!(out, "version = {version}");
        }
        for (key, value) in &self.values {
            let _ = writeln!(out, "{key} = {value}");
        }
        for block in &self.blocks {
            block.write_to(&mut out, 0);
        }
        out
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::from(e).in_file(path))?;
        Self::parse(&text).map_err(|e| e.in_file(path))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_text()).map_err(|e| Error::from(e).in_file(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_both_brace_styles() {
        let text = "version = 1\n\nrule\n{\n    name = a\n}\n# comment\nrule {\n  name = b = c\n}\n";
        let file = SimpleFile::parse(text).unwrap();
        assert_eq!(file.version, Some(1));
        assert_eq!(file.blocks.len(), 2);
        assert_eq!((file.blocks[0].name.as_str(), file.blocks[0].line), ("rule", 3));
        assert_eq!(file.blocks[0].value("name"), Some("a"));
        assert_eq!(file.blocks[1].line, 8);
        assert_eq!(file.blocks[1].value("name"), Some("b = c"));
    }

    #[test]
    fn test_nested_blocks() {
        let file = SimpleFile::parse("outer {\n inner {\n k = v\n }\n}\n").unwrap();
        assert_eq!(file.blocks[0].blocks[0].value("k"), Some("v"));
        assert_eq!(file.version, None);
    }

    #[test]
    fn test_syntax_errors_carry_lines() {
        let cases = [
            ("rule\nname = x\n", 1),
            ("rule {\n name = x\n", 1),
            ("}\n", 1),
            ("rule {\n}\nthis is junk\n", 3),
            ("\n = value\n", 2),
            ("rule {\n}\nversion = one\n", 3),
        ];
        for (text, line) in cases {
            let err = SimpleFile::parse(text).unwrap_err();
            assert_eq!(err.line(), Some(line), "{text:?}: {err}");
        }
    }

    #[test]
    fn test_write_then_parse() {
        let mut rule = SimpleBlock::new("rule");
        rule.add_value("name", "grass");
        rule.add_value("color", "1 2 3 255");
        let file = SimpleFile {
            version: Some(1),
            values: IndexMap::new(),
            blocks: vec![SimpleBlock::new("settings"), rule],
        };
        let text = file.to_text();
        assert!(text.starts_with("version = 1\nsettings\n{\n}\nrule\n{\n\tname = grass\n"));

        let parsed = SimpleFile::parse(&text).unwrap();
        assert_eq!(parsed.blocks[1].values, file.blocks[1].values);
    }

    #[test]
    fn test_missing_file_names_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("absent.txt");
        let err = SimpleFile::read(&path).unwrap_err();
        assert!(err.to_string().contains("absent.txt"));
    }
}
