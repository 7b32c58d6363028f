use bevy::prelude::*;
use serde::{Serialize, Deserialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use flate2::write::ZlibEncoder;
use flate2::read::ZlibDecoder;
use flate2::Compression;

use crate::game::error::SnapshotError;
use crate::game::math::Cell;
use crate::game::terrain::{ResourceKind, ResourceTile, TerrainSource, TileType};

pub const MAP_VERSION: u32 = 1;

/// Trees placed on a `T` glyph by [`TerrainSnapshot::from_ascii`].
pub const ASCII_TREES_PER_TILE: u32 = 1;
/// Mineral amount placed on `M` and `G` glyphs by [`TerrainSnapshot::from_ascii`].
pub const ASCII_MINERAL_AMOUNT: u32 = 100;

/// Dense copy of the terrain: one tile type and one resource tile per cell,
/// row-major with `y` as the row.
#[derive(Resource, Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TerrainSnapshot {
    pub version: u32,
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<TileType>,
    pub resources: Vec<ResourceTile>,
}

impl TerrainSnapshot {
    pub fn new(width: i32, height: i32, fill: TileType) -> Self {
        let size = (width.max(0) as usize) * (height.max(0) as usize);
        Self {
            version: MAP_VERSION,
            width,
            height,
            tiles: vec![fill; size],
            resources: vec![ResourceTile::default(); size],
        }
    }

    /// Parse a map drawn with one glyph per cell, first line is `y = 0`.
    ///
    /// | glyph | tile  | resource          |
    /// |-------|-------|-------------------|
    /// | `.`   | Grass |                   |
    /// | `,`   | Sand  |                   |
    /// | `=`   | Road  |                   |
    /// | `~`   | Water |                   |
    /// | `#`   | Rock  |                   |
    /// | `^`   | Cliff |                   |
    /// | `T`   | Grass | 1 tree            |
    /// | `M`   | Grass | 100 metal         |
    /// | `G`   | Grass | 100 gold          |
    ///
    /// Leading/trailing whitespace and blank lines are ignored so maps can be
    /// indented inside string literals.
    pub fn from_ascii(map: &str) -> Result<Self, SnapshotError> {
        let rows: Vec<&str> = map.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        let mut snapshot = Self::new(width as i32, rows.len() as i32, TileType::Grass);

        for (y, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != width {
                return Err(SnapshotError::RaggedRows { row: y, found, expected: width });
            }
            for (x, glyph) in row.chars().enumerate() {
                let cell = IVec2::new(x as i32, y as i32);
                let (tile, resource) = match glyph {
                    '.' => (TileType::Grass, ResourceTile::default()),
                    ',' => (TileType::Sand, ResourceTile::default()),
                    '=' => (TileType::Road, ResourceTile::default()),
                    '~' => (TileType::Water, ResourceTile::default()),
                    '#' => (TileType::Rock, ResourceTile::default()),
                    '^' => (TileType::Cliff, ResourceTile::default()),
                    'T' => (TileType::Grass, ResourceTile::forest(ASCII_TREES_PER_TILE)),
                    'M' => (TileType::Grass, ResourceTile::deposit(ResourceKind::Metal, ASCII_MINERAL_AMOUNT)),
                    'G' => (TileType::Grass, ResourceTile::deposit(ResourceKind::Gold, ASCII_MINERAL_AMOUNT)),
                    _ => return Err(SnapshotError::UnknownGlyph { glyph, x: cell.x, y: cell.y }),
                };
                snapshot.set_tile(cell, tile);
                snapshot.set_resource(cell, resource);
            }
        }
        Ok(snapshot)
    }

    #[inline]
    fn index(&self, cell: Cell) -> Option<usize> {
        if cell.x < 0 || cell.y < 0 || cell.x >= self.width || cell.y >= self.height {
            return None;
        }
        Some(cell.y as usize * self.width as usize + cell.x as usize)
    }

    /// Out-of-bounds writes are ignored.
    pub fn set_tile(&mut self, cell: Cell, tile: TileType) {
        if let Some(idx) = self.index(cell) {
            self.tiles[idx] = tile;
        }
    }

    pub fn set_resource(&mut self, cell: Cell, resource: ResourceTile) {
        if let Some(idx) = self.index(cell) {
            self.resources[idx] = resource;
        }
    }

    /// Fill an axis-aligned rectangle of tiles (inclusive min, exclusive max).
    pub fn fill_rect(&mut self, min: Cell, max: Cell, tile: TileType) {
        for y in min.y..max.y {
            for x in min.x..max.x {
                self.set_tile(IVec2::new(x, y), tile);
            }
        }
    }

    fn check_consistency(&self) -> Result<(), SnapshotError> {
        if self.version != MAP_VERSION {
            return Err(SnapshotError::Inconsistent(format!(
                "version {} (expected {})",
                self.version, MAP_VERSION
            )));
        }
        let expected = (self.width.max(0) as usize) * (self.height.max(0) as usize);
        if self.tiles.len() != expected || self.resources.len() != expected {
            return Err(SnapshotError::Inconsistent(format!(
                "{}x{} map with {} tiles and {} resource tiles",
                self.width,
                self.height,
                self.tiles.len(),
                self.resources.len()
            )));
        }
        Ok(())
    }
}

impl TerrainSource for TerrainSnapshot {
    fn dimensions(&self) -> IVec2 {
        IVec2::new(self.width, self.height)
    }

    fn tile_type(&self, cell: Cell) -> Option<TileType> {
        self.index(cell).and_then(|idx| self.tiles.get(idx).copied())
    }

    fn resource_tile(&self, cell: Cell) -> Option<ResourceTile> {
        self.index(cell).and_then(|idx| self.resources.get(idx).copied())
    }
}

pub fn save_snapshot(path: impl AsRef<Path>, snapshot: &TerrainSnapshot) -> Result<(), SnapshotError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let mut encoder = ZlibEncoder::new(writer, Compression::default());
    bincode::serialize_into(&mut encoder, snapshot)?;
    encoder.finish()?;
    Ok(())
}

pub fn load_snapshot(path: impl AsRef<Path>) -> Result<TerrainSnapshot, SnapshotError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut decoder = ZlibDecoder::new(reader);
    let snapshot: TerrainSnapshot = bincode::deserialize_from(&mut decoder)?;
    snapshot.check_consistency()?;
    Ok(snapshot)
}
