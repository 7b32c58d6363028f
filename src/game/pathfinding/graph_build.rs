use bevy::prelude::*;
use std::collections::VecDeque;

use crate::game::collections::GridMask;
use crate::game::config::TerrainConfig;
use crate::game::error::TerrainError;
use crate::game::math::{Cell, CARDINALS, DIAGONALS};
use crate::game::profiling::profile;
use crate::game::terrain::{TerrainSource, TileType};
use super::gates::detect_gates;
use super::graph::NavigationGraph;
use super::region::UnwalkableRegion;
use super::types::{NodeId, NodeType};

/// Dense copy of the tile types taken once per build. Out-of-bounds cells
/// read as unwalkable.
pub(crate) struct TileGrid {
    width: i32,
    height: i32,
    tiles: Vec<TileType>,
}

impl TileGrid {
    pub fn capture<T: TerrainSource + ?Sized>(terrain: &T) -> Result<Self, TerrainError> {
        let size = terrain.dimensions();
        if size.x <= 0 || size.y <= 0 {
            return Err(TerrainError::InvalidDimensions { width: size.x, height: size.y });
        }
        let mut tiles = Vec::with_capacity(size.x as usize * size.y as usize);
        for y in 0..size.y {
            for x in 0..size.x {
                let tile = terrain
                    .tile_type(IVec2::new(x, y))
                    .ok_or(TerrainError::MissingTile { x, y })?;
                tiles.push(tile);
            }
        }
        Ok(Self { width: size.x, height: size.y, tiles })
    }

    pub fn dimensions(&self) -> IVec2 {
        IVec2::new(self.width, self.height)
    }

    #[inline]
    pub fn tile(&self, cell: Cell) -> Option<TileType> {
        if cell.x < 0 || cell.y < 0 || cell.x >= self.width || cell.y >= self.height {
            return None;
        }
        self.tiles.get(cell.y as usize * self.width as usize + cell.x as usize).copied()
    }

    #[inline]
    pub fn is_walkable(&self, cell: Cell) -> bool {
        self.tile(cell).is_some_and(TileType::is_walkable)
    }
}

/// One flood-filled chunk of same-type unwalkable terrain.
pub(crate) struct UnwalkableBlob {
    pub shape: UnwalkableRegion,
    pub tile_type: TileType,
}

impl NavigationGraph {
    /// Build the graph from raw terrain.
    ///
    /// Unwalkable blobs become nodes first, then gates, then the walkable
    /// space left between them; nodes are linked, degenerate ones merged
    /// away, and the cell index rebuilt from the survivors.
    #[profile(50)]
    pub fn build<T: TerrainSource + ?Sized>(terrain: &T, config: &TerrainConfig) -> Result<Self, TerrainError> {
        config.validate()?;
        let grid = TileGrid::capture(terrain)?;
        let size = grid.dimensions();
        info!("[GRAPH BUILD] Building navigation graph for {}x{} map", size.x, size.y);

        let mut graph = NavigationGraph::new(size, config.walkable_region_size);

        let blobs = find_unwalkable_blobs(&grid, config.unwalkable_region_size);
        for blob in &blobs {
            graph.create_node(
                NodeType::Unwalkable,
                Some(blob.tile_type),
                blob.shape.region.cells().iter().copied(),
            );
        }
        debug!("[GRAPH BUILD] {} unwalkable blobs", blobs.len());

        let gates = detect_gates(&grid, &blobs, config);
        for line in gates {
            graph.create_node(NodeType::Gate, None, line);
        }

        graph.fill_walkable(&grid, config.walkable_region_size);
        graph.link_all();
        let merged = graph.cleanup();
        graph.rebuild_index();

        let stats = graph.stats();
        info!(
            "[GRAPH BUILD] Done: {} walkable, {} unwalkable, {} gates, {} links ({} nodes merged)",
            stats.walkable, stats.unwalkable, stats.gates, stats.links, merged
        );
        Ok(graph)
    }

    /// Flood fill walkable cells not claimed by an unwalkable or gate node.
    /// Seeds are taken in macro-block raster order; a fill is bounded only by
    /// already claimed or unwalkable cells.
    pub(super) fn fill_walkable(&mut self, grid: &TileGrid, block_size: i32) {
        let size = grid.dimensions();
        let mut visited = GridMask::new(size.x, size.y);
        let mut created = 0;

        for seed in block_raster(size, block_size) {
            if !grid.is_walkable(seed) || self.index.contains(seed) || !visited.insert(seed) {
                continue;
            }
            let mut cells = vec![seed];
            let mut queue = VecDeque::from([seed]);
            while let Some(cell) = queue.pop_front() {
                for dir in CARDINALS {
                    let next = cell + dir;
                    if grid.is_walkable(next) && !self.index.contains(next) && visited.insert(next) {
                        cells.push(next);
                        queue.push_back(next);
                    }
                }
            }
            self.create_node(NodeType::Walkable, None, cells);
            created += 1;
        }
        debug!("[GRAPH BUILD] {} walkable regions", created);
    }

    /// Orthogonal adjacency for every node, then diagonal.
    pub(super) fn link_all(&mut self) {
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for &id in &ids {
            self.link_adjacent(id, &CARDINALS);
        }
        for &id in &ids {
            self.link_adjacent(id, &DIAGONALS);
        }
    }

    /// Merge dead-end gates and tiny dead-end walkable nodes into their only
    /// (walkable) neighbor until nothing changes. Returns the merge count.
    pub(super) fn cleanup(&mut self) -> usize {
        let min_cells_x4 = self.walkable_region_size as usize;
        let mut merged = 0;
        loop {
            let candidate = self.nodes.values().find_map(|node| {
                let [link] = node.links.as_slice() else {
                    return None;
                };
                let target = self.nodes.get(&link.target)?;
                if target.node_type != NodeType::Walkable {
                    return None;
                }
                let degenerate = match node.node_type {
                    NodeType::Gate => true,
                    NodeType::Walkable => node.region.len() * 4 < min_cells_x4,
                    NodeType::Unwalkable => false,
                };
                degenerate.then_some((node.id, target.id))
            });
            let Some((from, into)) = candidate else {
                break;
            };
            self.merge_nodes(from, into);
            merged += 1;
        }
        merged
    }
}

/// All cells of the map, block by block in raster order, raster order inside
/// each block.
pub(crate) fn block_raster(size: IVec2, block_size: i32) -> impl Iterator<Item = Cell> {
    let block = block_size.max(1);
    let blocks_x = (size.x + block - 1) / block;
    let blocks_y = (size.y + block - 1) / block;
    (0..blocks_y).flat_map(move |by| {
        (0..blocks_x).flat_map(move |bx| {
            let min = IVec2::new(bx * block, by * block);
            let max = (min + IVec2::splat(block)).min(size);
            (min.y..max.y).flat_map(move |y| (min.x..max.x).map(move |x| IVec2::new(x, y)))
        })
    })
}

/// 4-connected fills of same-type unwalkable cells, each confined to its
/// `block_size` block, classified against the full map.
pub(crate) fn find_unwalkable_blobs(grid: &TileGrid, block_size: i32) -> Vec<UnwalkableBlob> {
    let size = grid.dimensions();
    let block = block_size.max(1);
    let mut visited = GridMask::new(size.x, size.y);
    let mut blobs = Vec::new();

    for seed in block_raster(size, block) {
        let Some(tile_type) = grid.tile(seed) else {
            continue;
        };
        if tile_type.is_walkable() || !visited.insert(seed) {
            continue;
        }
        let block_min = IVec2::new(seed.x.div_euclid(block), seed.y.div_euclid(block)) * block;
        let block_max = block_min + IVec2::splat(block);
        let in_block = |c: Cell| c.x >= block_min.x && c.y >= block_min.y && c.x < block_max.x && c.y < block_max.y;

        let mut cells = vec![seed];
        let mut queue = VecDeque::from([seed]);
        while let Some(cell) = queue.pop_front() {
            for dir in CARDINALS {
                let next = cell + dir;
                if in_block(next) && grid.tile(next) == Some(tile_type) && visited.insert(next) {
                    cells.push(next);
                    queue.push_back(next);
                }
            }
        }
        let shape = UnwalkableRegion::classify(cells, |c| grid.is_walkable(c));
        blobs.push(UnwalkableBlob { shape, tile_type });
    }
    blobs
}
