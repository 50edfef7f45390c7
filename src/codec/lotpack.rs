//! `.lotpack` cell streams.
//!
//! Layout:
//!
//! ```text
//! ["LOTP" magic, i32 version]      only for versioned packs
//! i32 chunk count
//! i64 offset per chunk             index = chunk_x * chunks_per_cell + chunk_y
//! per chunk, for level min..=0, x, y:
//!     i32 -1, i32 skip             run of empty stacks (covers this one)
//!     i32 count, i32 room id, (count - 1) x i32 tile name index
//! ```

use crate::codec::{BinaryReader, BinaryWriter, CellHeader};
use crate::error::{Error, Result};
use crate::world::{GridConstants, SquarePos, TileRef};

pub const PACK_MAGIC: &[u8; 4] = b"LOTP";
pub const VERSION0: i32 = 0;
pub const VERSION1: i32 = 1;
pub const VERSION_LATEST: i32 = VERSION1;

/// Literal stacks hold `count - 1` tiles with `1 < count < MAX_STACK_COUNT`.
pub const MAX_STACK_COUNT: i32 = 30;
const EMPTY_RUN_MARKER: i32 = -1;

/// Read the optional magic + version prefix. Unversioned packs leave the cursor at 0.
pub fn read_version(reader: &mut BinaryReader) -> Result<i32> {
    reader.seek(0)?;
    if !reader.eat_magic(PACK_MAGIC) {
        return Ok(VERSION0);
    }
    let version = reader.read_i32_le()?;
    if !(VERSION0..=VERSION_LATEST).contains(&version) {
        return Err(Error::UnsupportedPackVersion(version));
    }
    Ok(version)
}

fn header_skip(version: i32) -> usize {
    if version >= VERSION1 { 8 } else { 0 }
}

/// Byte position of the offset table entry for chunk `index`.
pub fn offset_entry_position(version: i32, index: usize) -> usize {
    header_skip(version) + 4 + index * 8
}

/// Start of each chunk's stack stream, in row-major `chunk_x * chunks_per_cell + chunk_y` order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOffsetTable {
    chunks_per_cell: usize,
    offsets: Vec<u64>,
}

impl ChunkOffsetTable {
    pub fn read(reader: &mut BinaryReader, version: i32, grid: GridConstants) -> Result<Self> {
        let mut offsets = Vec::with_capacity(grid.chunk_count());
        for index in 0..grid.chunk_count() {
            reader.seek(offset_entry_position(version, index) as u64)?;
            let pos = reader.read_i64_le()?;
            let offset = u64::try_from(pos)
                .ok()
                .filter(|&o| o <= reader.len() as u64)
                .ok_or(Error::SeekOutOfRange { pos: pos as u64, len: reader.len() })?;
            offsets.push(offset);
        }
        Ok(Self { chunks_per_cell: grid.chunks_per_cell, offsets })
    }

    pub fn index(&self, chunk_x: usize, chunk_y: usize) -> usize {
        chunk_x * self.chunks_per_cell + chunk_y
    }

    pub fn offset(&self, chunk_x: usize, chunk_y: usize) -> u64 {
        self.offsets[self.index(chunk_x, chunk_y)]
    }

    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }
}

/// One encoded stack position
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackEntry {
    Literal { room_id: i32, tiles: Vec<i32> },
    /// This stack and the following `count - 1` are empty
    Skip { count: i32 },
}

impl StackEntry {
    pub fn read(reader: &mut BinaryReader) -> Result<Self> {
        let pos = reader.position();
        let count = reader.read_i32_le()?;
        if count == EMPTY_RUN_MARKER {
            let skip_pos = reader.position();
            let skip = reader.read_i32_le()?;
            if skip < 0 {
                return Err(Error::InvalidSkip { skip, pos: skip_pos });
            }
            return Ok(Self::Skip { count: skip });
        }
        if !(2..MAX_STACK_COUNT).contains(&count) {
            return Err(Error::InvalidStackCount { count, pos });
        }
        let room_id = reader.read_i32_le()?;
        let tiles = (1..count).map(|_| reader.read_i32_le()).collect::<Result<Vec<_>>>()?;
        Ok(Self::Literal { room_id, tiles })
    }

    pub fn write(&self, w: &mut BinaryWriter) {
        match self {
            Self::Skip { count } => {
                w.write_i32_le(EMPTY_RUN_MARKER);
                w.write_i32_le(*count);
            }
            Self::Literal { room_id, tiles } => {
                w.write_i32_le(tiles.len() as i32 + 1);
                w.write_i32_le(*room_id);
                for &t in tiles {
                    w.write_i32_le(t);
                }
            }
        }
    }
}

/// A level-0 tile reference and the square it sits on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundTile<'h> {
    pub square: SquarePos,
    pub tile: &'h TileRef,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub literal_stacks: usize,
    pub empty_stacks: usize,
    /// Tile indices read below ground level and dropped
    pub discarded_entries: usize,
    pub ground_entries: usize,
}

#[derive(Debug, Clone)]
pub struct DecodedCell<'h> {
    pub version: i32,
    pub tiles: Vec<GroundTile<'h>>,
    pub stats: DecodeStats,
}

/// Decode every chunk of a cell, collecting ground-level tiles in stream order.
///
/// Nothing is returned on error, so a failed cell contributes no pixels.
pub fn decode_cell<'h>(data: &[u8], header: &'h CellHeader, grid: GridConstants) -> Result<DecodedCell<'h>> {
    let mut tiles = Vec::new();
    let (version, stats) = decode_cell_with(data, header, grid, |t| tiles.push(t))?;
    Ok(DecodedCell { version, tiles, stats })
}

/// Streaming form of [`decode_cell`]. `visit` may already have been called when an error is returned.
pub fn decode_cell_with<'h>(
    data: &[u8],
    header: &'h CellHeader,
    grid: GridConstants,
    mut visit: impl FnMut(GroundTile<'h>),
) -> Result<(i32, DecodeStats)> {
    let mut reader = BinaryReader::new(data);
    let version = read_version(&mut reader)?;
    let table = ChunkOffsetTable::read(&mut reader, version, grid)?;
    let mut stats = DecodeStats::default();

    for chunk_y in 0..grid.chunks_per_cell {
        for chunk_x in 0..grid.chunks_per_cell {
            reader.seek(table.offset(chunk_x, chunk_y))?;
            decode_chunk(&mut reader, header, grid, chunk_x, chunk_y, &mut stats, &mut visit)?;
        }
    }
    Ok((version, stats))
}

fn decode_chunk<'h>(
    reader: &mut BinaryReader,
    header: &'h CellHeader,
    grid: GridConstants,
    chunk_x: usize,
    chunk_y: usize,
    stats: &mut DecodeStats,
    visit: &mut impl FnMut(GroundTile<'h>),
) -> Result<()> {
    // Empty runs carry over level boundaries within a chunk.
    let mut pending_skip = 0;
    for level in header.min_level..=0 {
        for x in 0..grid.squares_per_chunk {
            for y in 0..grid.squares_per_chunk {
                if pending_skip > 0 {
                    pending_skip -= 1;
                    stats.empty_stacks += 1;
                    continue;
                }
                match StackEntry::read(reader)? {
                    StackEntry::Skip { count } => {
                        pending_skip = (count - 1).max(0);
                        stats.empty_stacks += 1;
                    }
                    StackEntry::Literal { room_id: _, tiles } => {
                        stats.literal_stacks += 1;
                        if level != 0 {
                            stats.discarded_entries += tiles.len();
                            continue;
                        }
                        let square = SquarePos { chunk_x, chunk_y, x, y };
                        for index in tiles {
                            visit(GroundTile { square, tile: header.tile(index)? });
                            stats.ground_entries += 1;
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

type Stack = (i32, Vec<i32>);

/// Builds lot pack streams in the layout [`decode_cell`] reads
pub struct LotPackWriter {
    version: i32,
    grid: GridConstants,
    min_level: i32,
    chunks: Vec<Option<Vec<Option<Stack>>>>,
}

impl LotPackWriter {
    pub fn new(version: i32, grid: GridConstants, min_level: i32) -> Self {
        Self {
            version,
            grid,
            min_level: min_level.min(0),
            chunks: vec![None; grid.chunk_count()],
        }
    }

    fn stacks_per_chunk(&self) -> usize {
        let side = self.grid.squares_per_chunk;
        (1 - self.min_level) as usize * side * side
    }

    /// Place a stack of tile name indices. `tiles` must hold 1 to 28 entries.
    pub fn set_stack(&mut self, level: i32, square: SquarePos, room_id: i32, tiles: &[i32]) -> Result<()> {
        let count = tiles.len() as i32 + 1;
        if !(2..MAX_STACK_COUNT).contains(&count) {
            return Err(Error::InvalidStackCount { count, pos: 0 });
        }
        let g = self.grid;
        if level < self.min_level
            || level > 0
            || square.chunk_x >= g.chunks_per_cell
            || square.chunk_y >= g.chunks_per_cell
            || square.x >= g.squares_per_chunk
            || square.y >= g.squares_per_chunk
        {
            return Err(Error::InvalidInput(format!("stack position {square:?} level {level} outside cell")));
        }
        let per_chunk = self.stacks_per_chunk();
        let side = g.squares_per_chunk;
        let slot = (level - self.min_level) as usize * side * side + square.x * side + square.y;
        let chunk = self.chunks[square.chunk_x * g.chunks_per_cell + square.chunk_y]
            .get_or_insert_with(|| vec![None; per_chunk]);
        chunk[slot] = Some((room_id, tiles.to_vec()));
        Ok(())
    }

    fn chunk_stream(&self, stacks: Option<&Vec<Option<Stack>>>) -> Vec<u8> {
        let mut w = BinaryWriter::new();
        let total = self.stacks_per_chunk();
        let Some(stacks) = stacks else {
            StackEntry::Skip { count: total as i32 }.write(&mut w);
            return w.into_vec();
        };
        let mut run = 0;
        for stack in stacks {
            match stack {
                None => run += 1,
                Some((room_id, tiles)) => {
                    if run > 0 {
                        StackEntry::Skip { count: run }.write(&mut w);
                        run = 0;
                    }
                    StackEntry::Literal { room_id: *room_id, tiles: tiles.clone() }.write(&mut w);
                }
            }
        }
        if run > 0 {
            StackEntry::Skip { count: run }.write(&mut w);
        }
        w.into_vec()
    }

    pub fn encode(&self) -> Vec<u8> {
        let streams: Vec<Vec<u8>> = self.chunks.iter().map(|c| self.chunk_stream(c.as_ref())).collect();
        assemble(self.version, &streams)
    }
}

/// Lay out a pack from pre-encoded chunk streams, one per offset table entry.
pub fn assemble(version: i32, chunk_streams: &[Vec<u8>]) -> Vec<u8> {
    let mut w = BinaryWriter::with_capacity(16 + chunk_streams.iter().map(|s| s.len() + 8).sum::<usize>());
    if version >= VERSION1 {
        w.write_bytes(PACK_MAGIC);
        w.write_i32_le(version);
    }
    w.write_i32_le(chunk_streams.len() as i32);
    let table_pos = w.len();
    for _ in chunk_streams {
        w.write_i64_le(0);
    }
    for (i, stream) in chunk_streams.iter().enumerate() {
        let start = w.len() as i64;
        w.patch_i64_le(table_pos + i * 8, start);
        w.write_bytes(stream);
    }
    w.into_vec()
}
