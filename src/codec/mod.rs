pub mod reader;
pub mod writer;
pub mod lotheader;
pub mod lotpack;

pub use reader::BinaryReader;
pub use writer::BinaryWriter;
pub use lotheader::CellHeader;
pub use lotpack::{
    ChunkOffsetTable, StackEntry, GroundTile, DecodeStats, DecodedCell, LotPackWriter,
    decode_cell, decode_cell_with, read_version,
};
