use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ahash::AHashMap;

use crate::codec::CellHeader;
use crate::error::{Error, Result};
use crate::world::grid::{self, CellCoord, WorldBounds};

/// Where the rasterizer gets its cells from.
///
/// `Ok(None)` means the cell does not exist, which is normal for sparse worlds.
pub trait CellSource {
    fn bounds(&mut self) -> Result<Option<WorldBounds>>;
    fn header(&mut self, cell: CellCoord) -> Result<Option<Arc<CellHeader>>>;
    fn pack(&mut self, cell: CellCoord) -> Result<Option<Vec<u8>>>;
    /// Drop state held for one cell whose data turned out to be unusable.
    fn forget(&mut self, _cell: CellCoord) {}
    /// Drop any per-run state (called when a run ends or is cancelled).
    fn release(&mut self) {}
}

/// Parsed cell headers keyed by cell coordinate
#[derive(Debug, Default)]
pub struct HeaderCache {
    headers: AHashMap<CellCoord, Arc<CellHeader>>,
}

impl HeaderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, cell: CellCoord) -> Option<Arc<CellHeader>> {
        self.headers.get(&cell).cloned()
    }

    pub fn insert(&mut self, cell: CellCoord, header: CellHeader) -> Arc<CellHeader> {
        let header = Arc::new(header);
        self.headers.insert(cell, header.clone());
        header
    }

    pub fn remove(&mut self, cell: CellCoord) -> Option<Arc<CellHeader>> {
        self.headers.remove(&cell)
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn clear(&mut self) {
        self.headers.clear();
    }

    /// Return the cached header, reading `<dir>/<x>_<y>.lotheader` on first use.
    pub fn load(&mut self, dir: &Path, cell: CellCoord) -> Result<Option<Arc<CellHeader>>> {
        if let Some(header) = self.get(cell) {
            return Ok(Some(header));
        }
        let path = dir.join(cell.header_file_name());
        let Some(data) = read_optional(&path)? else {
            return Ok(None);
        };
        let header = CellHeader::parse(&data).map_err(|e| e.in_file(&path))?;
        Ok(Some(self.insert(cell, header)))
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::from(e).in_file(path)),
    }
}

/// A map export directory holding `<x>_<y>.lotheader` and `world_<x>_<y>.lotpack` files
#[derive(Debug)]
pub struct MapDirectory {
    root: PathBuf,
    headers: HeaderCache,
}

impl MapDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), headers: HeaderCache::new() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn headers(&self) -> &HeaderCache {
        &self.headers
    }

    /// Forget every loaded header so the next run rereads them from disk.
    pub fn reload(&mut self) {
        self.headers.clear();
    }
}

impl CellSource for MapDirectory {
    fn bounds(&mut self) -> Result<Option<WorldBounds>> {
        grid::scan_bounds(&self.root)
    }

    fn header(&mut self, cell: CellCoord) -> Result<Option<Arc<CellHeader>>> {
        self.headers.load(&self.root, cell)
    }

    fn pack(&mut self, cell: CellCoord) -> Result<Option<Vec<u8>>> {
        read_optional(&self.root.join(cell.pack_file_name()))
    }

    fn forget(&mut self, cell: CellCoord) {
        self.headers.remove(cell);
    }

    fn release(&mut self) {
        self.headers.clear();
    }
}

/// In-memory cells, for tools that generate map data without touching disk
#[derive(Debug, Default)]
pub struct MemoryCells {
    cells: AHashMap<CellCoord, (Arc<CellHeader>, Option<Vec<u8>>)>,
}

impl MemoryCells {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, cell: CellCoord, header: CellHeader, pack: Option<Vec<u8>>) {
        self.cells.insert(cell, (Arc::new(header), pack));
    }
}

impl CellSource for MemoryCells {
    fn bounds(&mut self) -> Result<Option<WorldBounds>> {
        Ok(WorldBounds::enclosing(self.cells.keys().copied()))
    }

    fn header(&mut self, cell: CellCoord) -> Result<Option<Arc<CellHeader>>> {
        Ok(self.cells.get(&cell).map(|(h, _)| h.clone()))
    }

    fn pack(&mut self, cell: CellCoord) -> Result<Option<Vec<u8>>> {
        Ok(self.cells.get(&cell).and_then(|(_, p)| p.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_header(dir: &Path, cell: CellCoord, names: &[&str]) {
        let header = CellHeader::new(0, names.iter().map(|s| s.to_string()).collect());
        std::fs::write(dir.join(cell.header_file_name()), header.encode()).unwrap();
    }

    #[test]
    fn test_cache_loads_once_and_clears() {
        let dir = tempfile::TempDir::new().unwrap();
        let cell = CellCoord::new(2, 3);
        write_header(dir.path(), cell, &["grass_1"]);

        let mut cache = HeaderCache::new();
        let first = cache.load(dir.path(), cell).unwrap().unwrap();
        assert_eq!(cache.len(), 1);

        // Served from the cache even after the file changes.
        write_header(dir.path(), cell, &["grass_1", "trees_2"]);
        let second = cache.load(dir.path(), cell).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        cache.clear();
        assert!(cache.is_empty());
        let reloaded = cache.load(dir.path(), cell).unwrap().unwrap();
        assert_eq!(reloaded.tile_names.len(), 2);
    }

    #[test]
    fn test_missing_files_are_none() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut map = MapDirectory::new(dir.path());
        let cell = CellCoord::new(0, 0);
        assert!(map.header(cell).unwrap().is_none());
        assert!(map.pack(cell).unwrap().is_none());
        assert!(map.bounds().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_header_names_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let cell = CellCoord::new(7, 8);
        std::fs::write(dir.path().join(cell.header_file_name()), b"LOTH\x09\x00\x00\x00").unwrap();

        let mut map = MapDirectory::new(dir.path());
        let err = map.header(cell).unwrap_err();
        assert!(err.to_string().contains("7_8.lotheader"), "{err}");
        assert!(map.headers().is_empty());
    }

    #[test]
    fn test_release_drops_headers() {
        let dir = tempfile::TempDir::new().unwrap();
        let cell = CellCoord::new(1, 1);
        write_header(dir.path(), cell, &["grass_1"]);

        let mut map = MapDirectory::new(dir.path());
        map.header(cell).unwrap();
        assert_eq!(map.headers().len(), 1);
        map.release();
        assert!(map.headers().is_empty());
    }

    #[test]
    fn test_forget_drops_one_cell() {
        let dir = tempfile::TempDir::new().unwrap();
        let (a, b) = (CellCoord::new(0, 0), CellCoord::new(1, 0));
        write_header(dir.path(), a, &["grass_1"]);
        write_header(dir.path(), b, &["grass_1"]);

        let mut map = MapDirectory::new(dir.path());
        map.header(a).unwrap();
        map.header(b).unwrap();
        map.forget(a);
        assert!(map.headers().get(a).is_none());
        assert!(map.headers().get(b).is_some());
    }
}
