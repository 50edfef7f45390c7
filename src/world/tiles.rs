/// A tile name resolved to its source tileset and index within it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TileRef {
    Resolved { tileset: String, index: u32 },
    /// The name did not have the `<tileset>_<index>` shape
    Unresolved,
}

impl TileRef {
    pub fn resolved(tileset: impl Into<String>, index: u32) -> Self {
        Self::Resolved { tileset: tileset.into(), index }
    }

    /// Split `"blends_natural_01_16"` into `("blends_natural_01", 16)` at the last underscore.
    pub fn parse(name: &str) -> Self {
        let Some((tileset, index)) = name.trim().rsplit_once('_') else {
            return Self::Unresolved;
        };
        if tileset.is_empty() || index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return Self::Unresolved;
        }
        match index.parse() {
            Ok(index) => Self::resolved(tileset, index),
            Err(_) => Self::Unresolved,
        }
    }

    pub fn tileset(&self) -> Option<&str> {
        match self {
            Self::Resolved { tileset, .. } => Some(tileset),
            Self::Unresolved => None,
        }
    }

    pub fn index(&self) -> Option<u32> {
        match self {
            Self::Resolved { index, .. } => Some(*index),
            Self::Unresolved => None,
        }
    }
}
