use bevy::prelude::*;
use rand::Rng;

use crate::game::collections::SparseCellIndex;
use crate::game::config::TerrainConfig;
use crate::game::error::TerrainError;
use crate::game::math::Cell;
use crate::game::pathfinding::{BridgePlan, Footprint, MapNode, NavigationGraph, NodeId, NodeType, Path, PlacementCheck};
use crate::game::resource_clusters::{ResourceCluster, ResourceClusterIndex};
use crate::game::terrain::{TerrainSource, TileType};

/// Terrain analysis for one scenario: the navigation graph, the resource
/// cluster index and a memo of tile types.
///
/// Built once at scenario load with [`TerrainAnalysis::init`]; afterwards the
/// graph is repaired through [`TerrainAnalysis::add_node`] and cluster
/// amounts are refreshed by [`TerrainAnalysis::tick`].
#[derive(Resource, Debug)]
pub struct TerrainAnalysis {
    config: TerrainConfig,
    graph: NavigationGraph,
    clusters: ResourceClusterIndex,
    tile_types: SparseCellIndex<TileType>,
}

impl TerrainAnalysis {
    pub fn init<T: TerrainSource + ?Sized>(terrain: &T, config: TerrainConfig) -> Result<Self, TerrainError> {
        let size = terrain.dimensions();
        info!("[TERRAIN] Analysing {}x{} terrain", size.x, size.y);
        let graph = NavigationGraph::build(terrain, &config)?;
        let clusters = ResourceClusterIndex::build(terrain, &config);
        Ok(Self {
            config,
            graph,
            clusters,
            tile_types: SparseCellIndex::new(),
        })
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn graph(&self) -> &NavigationGraph {
        &self.graph
    }

    pub fn clusters(&self) -> &ResourceClusterIndex {
        &self.clusters
    }

    /// Per-tick work: fold queued resource changes into cluster amounts.
    pub fn tick<T: TerrainSource + ?Sized>(&mut self, terrain: &T) {
        self.clusters.tick(terrain);
    }

    pub fn notify_resource_changed(&mut self, cells: &[Cell]) {
        self.clusters.notify_changed(cells);
    }

    pub fn get_shortest_path(&mut self, from: Cell, to: Cell, allowed: &[TileType]) -> Option<Path> {
        self.graph.get_shortest_path(from, to, allowed)
    }

    /// Up to `max_path_count` alternative routes, shortest first.
    pub fn get_paths(&mut self, from: Cell, to: Cell, allowed: &[TileType]) -> Vec<Path> {
        self.graph
            .get_paths(from, to, allowed, self.config.max_path_count, self.config.path_inflation)
    }

    /// Tile type at `cell`, read from the terrain once and remembered.
    /// Out-of-bounds cells are `None` and are not memoized.
    pub fn get_tile_type<T: TerrainSource + ?Sized>(&mut self, terrain: &T, cell: Cell) -> Option<TileType> {
        if let Some(&tile) = self.tile_types.get(cell) {
            return Some(tile);
        }
        let tile = terrain.tile_type(cell)?;
        self.tile_types.set(cell, tile);
        Some(tile)
    }

    pub fn add_node(&mut self, cells: &[Cell], node_type: NodeType) -> Option<NodeId> {
        self.graph.add_node(cells, node_type)
    }

    pub fn get_resource_clusters_around_point(&self, point: Cell, radius: i32) -> Vec<&ResourceCluster> {
        self.clusters.around_point(point, radius)
    }

    pub fn connect_map_nodes_by_bridge<P, R>(&self, path: &Path, footprint: Footprint, placement: &P, rng: &mut R) -> Option<BridgePlan>
    where
        P: PlacementCheck + ?Sized,
        R: Rng + ?Sized,
    {
        self.graph
            .connect_map_nodes_by_bridge(path, footprint, placement, rng, self.config.bridge_attempts)
    }

    pub fn get_map_node(&self, cell: Cell) -> Option<&MapNode> {
        self.graph.get_map_node(cell)
    }

    pub fn get_all_nodes(&self, node_type: NodeType) -> Vec<&MapNode> {
        self.graph.get_all_nodes(node_type)
    }
}
