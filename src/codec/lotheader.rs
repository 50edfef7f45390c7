//! `.lotheader` cell headers.
//!
//! Only the leading part of the file is read: version, the tile name table and
//! the level range. Room and building tables follow but carry nothing the map
//! renderer needs.

use crate::codec::{BinaryReader, BinaryWriter};
use crate::error::{Error, Result};
use crate::world::TileRef;

pub const HEADER_MAGIC: &[u8; 4] = b"LOTH";
pub const HEADER_VERSION0: i32 = 0;
pub const HEADER_VERSION1: i32 = 1;
pub const HEADER_VERSION_LATEST: i32 = HEADER_VERSION1;

#[derive(Debug, Clone, PartialEq)]
pub struct CellHeader {
    pub version: i32,
    pub width: i32,
    pub height: i32,
    pub min_level: i32,
    pub max_level: i32,
    /// Tile names as stored; `tiles[i]` is the resolved form of `tile_names[i]`
    pub tile_names: Vec<String>,
    pub tiles: Vec<TileRef>,
}

impl CellHeader {
    /// Header with names resolved by [`TileRef::parse`].
    pub fn new(min_level: i32, tile_names: Vec<String>) -> Self {
        let tiles = tile_names.iter().map(|n| TileRef::parse(n)).collect();
        Self {
            version: HEADER_VERSION_LATEST,
            width: 8,
            height: 8,
            min_level,
            max_level: min_level.max(0),
            tile_names,
            tiles,
        }
    }

    /// Header with an externally resolved tile table.
    pub fn with_tiles(min_level: i32, tile_names: Vec<String>, tiles: Vec<TileRef>) -> Result<Self> {
        if tile_names.len() != tiles.len() {
            return Err(Error::InvalidHeader(format!(
                "{} tile names but {} resolved tiles",
                tile_names.len(),
                tiles.len()
            )));
        }
        Ok(Self { tiles, ..Self::new(min_level, tile_names) })
    }

    /// Look up a tile name table index read from a lot pack.
    pub fn tile(&self, index: i32) -> Result<&TileRef> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.tiles.get(i))
            .ok_or(Error::TileIndexOutOfRange { index, len: self.tiles.len() })
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        let has_magic = reader.eat_magic(HEADER_MAGIC);
        let version = reader.read_i32_le()?;
        if !(HEADER_VERSION0..=HEADER_VERSION_LATEST).contains(&version) {
            return Err(Error::UnsupportedHeaderVersion(version));
        }
        if has_magic && version < HEADER_VERSION1 {
            return Err(Error::InvalidHeader(format!("magic present with legacy version {version}")));
        }

        let count = reader.read_i32_le()?;
        // Every name takes at least its terminator byte.
        if count < 0 || count as usize > reader.remaining() {
            return Err(Error::InvalidHeader(format!("bad tile count {count}")));
        }
        let mut tile_names = Vec::with_capacity(count as usize);
        for _ in 0..count {
            tile_names.push(reader.read_line()?.trim().to_string());
        }

        let (width, height, min_level, max_level);
        if version >= HEADER_VERSION1 {
            width = reader.read_i32_le()?;
            height = reader.read_i32_le()?;
            min_level = reader.read_i32_le()?;
            max_level = reader.read_i32_le()?;
        } else {
            reader.skip(1)?;
            width = reader.read_i32_le()?;
            height = reader.read_i32_le()?;
            let levels = reader.read_i32_le()?;
            min_level = 0;
            max_level = levels - 1;
        }
        if min_level > 0 || max_level < min_level {
            return Err(Error::InvalidHeader(format!("bad level range {min_level}..={max_level}")));
        }

        let tiles = tile_names.iter().map(|n| TileRef::parse(n)).collect();
        Ok(Self { version, width, height, min_level, max_level, tile_names, tiles })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = BinaryWriter::new();
        if self.version >= HEADER_VERSION1 {
            w.write_bytes(HEADER_MAGIC);
        }
        w.write_i32_le(self.version);
        w.write_i32_le(self.tile_names.len() as i32);
        for name in &self.tile_names {
            w.write_line(name);
        }
        if self.version >= HEADER_VERSION1 {
            w.write_i32_le(self.width);
            w.write_i32_le(self.height);
            w.write_i32_le(self.min_level);
            w.write_i32_le(self.max_level);
        } else {
            w.write_u8(0);
            w.write_i32_le(self.width);
            w.write_i32_le(self.height);
            w.write_i32_le(self.max_level + 1);
        }
        // Empty room and building tables
        w.write_i32_le(0);
        w.write_i32_le(0);
        w.into_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["blends_natural_01_16".into(), "bogus".into(), "walls_exterior_01_4".into()]
    }

    #[test]
    fn test_versioned_header() {
        let header = CellHeader::new(-1, names());
        let parsed = CellHeader::parse(&header.encode()).unwrap();
        assert_eq!(parsed.version, HEADER_VERSION1);
        assert_eq!(parsed.min_level, -1);
        assert_eq!(parsed.tile_names, names());
        assert_eq!(parsed.tiles[0], TileRef::resolved("blends_natural_01", 16));
        assert_eq!(parsed.tiles[1], TileRef::Unresolved);
    }

    #[test]
    fn test_legacy_header_has_no_basement() {
        let header = CellHeader { version: HEADER_VERSION0, max_level: 7, ..CellHeader::new(0, names()) };
        let data = header.encode();
        assert_ne!(&data[..4], HEADER_MAGIC);

        let parsed = CellHeader::parse(&data).unwrap();
        assert_eq!((parsed.min_level, parsed.max_level), (0, 7));
        assert_eq!(parsed.tile_names.len(), 3);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut w = BinaryWriter::new();
        w.write_bytes(HEADER_MAGIC);
        w.write_i32_le(9);
        assert!(matches!(CellHeader::parse(w.as_slice()), Err(Error::UnsupportedHeaderVersion(9))));
    }

    #[test]
    fn test_truncated_names() {
        let mut w = BinaryWriter::new();
        w.write_i32_le(HEADER_VERSION0);
        w.write_i32_le(2);
        w.write_bytes(b"only_1\nunterminated");
        assert!(CellHeader::parse(w.as_slice()).is_err());
    }

    #[test]
    fn test_tile_lookup_bounds() {
        let header = CellHeader::new(0, names());
        assert!(header.tile(2).is_ok());
        assert!(matches!(header.tile(3), Err(Error::TileIndexOutOfRange { index: 3, len: 3 })));
        assert!(matches!(header.tile(-1), Err(Error::TileIndexOutOfRange { index: -1, .. })));
    }

    #[test]
    fn test_with_tiles_length_mismatch() {
        assert!(CellHeader::with_tiles(0, names(), vec![TileRef::Unresolved]).is_err());
    }
}
