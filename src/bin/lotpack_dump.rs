use std::path::PathBuf;

use clap::Parser;
use lotmap::codec::{decode_cell_with, read_version, BinaryReader, CellHeader, ChunkOffsetTable};
use lotmap::world::{CellCoord, GridFlavor};

#[derive(Parser)]
#[command(name = "lotpack-dump")]
#[command(about = "Print the structure of one world_<x>_<y>.lotpack file")]
struct Args {
    /// Path to the .lotpack file
    pack: PathBuf,

    /// Header to resolve tiles with (default: <x>_<y>.lotheader next to the pack)
    #[arg(long)]
    header: Option<PathBuf>,

    #[arg(long, default_value = "256")]
    grid: GridFlavor,

    /// Print every chunk offset
    #[arg(long)]
    offsets: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let grid = args.grid.constants();

    let data = std::fs::read(&args.pack)?;
    let mut reader = BinaryReader::new(&data);
    let version = read_version(&mut reader)?;
    let table = ChunkOffsetTable::read(&mut reader, version, grid)?;
    let offsets = table.offsets();

    println!("file:    {} ({} bytes)", args.pack.display(), data.len());
    println!("version: {}", version);
    println!(
        "chunks:  {} ({}x{} of {}x{} squares)",
        offsets.len(),
        grid.chunks_per_cell,
        grid.chunks_per_cell,
        grid.squares_per_chunk,
        grid.squares_per_chunk
    );
    if let (Some(min), Some(max)) = (offsets.iter().min(), offsets.iter().max()) {
        println!("offsets: {min}..={max}");
    }
    if args.offsets {
        for chunk_x in 0..grid.chunks_per_cell {
            for chunk_y in 0..grid.chunks_per_cell {
                println!("  [{chunk_x:2},{chunk_y:2}] {}", table.offset(chunk_x, chunk_y));
            }
        }
    }

    let header_path = match args.header {
        Some(path) => path,
        None => {
            let cell = args
                .pack
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_prefix("world_"))
                .and_then(|s| CellCoord::from_header_file_name(&format!("{s}.lotheader")))
                .ok_or("cannot derive cell from pack file name; pass --header")?;
            args.pack.with_file_name(cell.header_file_name())
        }
    };
    let header = CellHeader::parse(&std::fs::read(&header_path)?)?;
    println!(
        "header:  {} (version {}, {} tile names, levels {}..={})",
        header_path.display(),
        header.version,
        header.tile_names.len(),
        header.min_level,
        header.max_level
    );

    let mut tilesets = std::collections::BTreeMap::<&str, usize>::new();
    let (_, stats) = decode_cell_with(&data, &header, grid, |t| {
        *tilesets.entry(t.tile.tileset().unwrap_or("<unresolved>")).or_default() += 1;
    })?;
    println!("literal stacks:      {}", stats.literal_stacks);
    println!("empty stacks:        {}", stats.empty_stacks);
    println!("ground entries:      {}", stats.ground_entries);
    println!("below-ground (skip): {}", stats.discarded_entries);
    for (tileset, count) in tilesets {
        println!("  {count:8} {tileset}");
    }
    Ok(())
}
