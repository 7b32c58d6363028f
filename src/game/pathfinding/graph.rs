use bevy::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

use crate::game::collections::SparseCellIndex;
use crate::game::error::GraphError;
use crate::game::math::{Cell, CARDINALS, DIAGONALS};
use crate::game::terrain::TileType;
use super::region::Region;
use super::types::{link_weight, Link, MapNode, NodeId, NodeType};

/// Navigation graph over map regions.
///
/// Owns every [`MapNode`] and the authoritative cell → node index. Nodes are
/// kept in a `BTreeMap` so that iteration (and therefore building, cleanup
/// and search tie-breaking) is deterministic across runs.
#[derive(Clone, Debug, Default)]
pub struct NavigationGraph {
    pub(crate) nodes: BTreeMap<NodeId, MapNode>,
    pub(crate) index: SparseCellIndex<NodeId>,
    next_id: u32,
    pub(crate) dimensions: IVec2,
    pub(crate) walkable_region_size: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub walkable: usize,
    pub unwalkable: usize,
    pub gates: usize,
    pub links: usize,
}

impl NavigationGraph {
    pub(crate) fn new(dimensions: IVec2, walkable_region_size: i32) -> Self {
        Self {
            dimensions,
            walkable_region_size,
            ..Default::default()
        }
    }

    pub fn dimensions(&self) -> IVec2 {
        self.dimensions
    }

    #[inline]
    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.dimensions.x && cell.y < self.dimensions.y
    }

    /// Allocate the next id and insert a node for `cells`, claiming them in
    /// the index.
    pub(crate) fn create_node(&mut self, node_type: NodeType, tile_type: Option<TileType>, cells: impl IntoIterator<Item = Cell>) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        let region = Region::new(cells);
        self.index.set_many(region.cells().iter().copied(), id);
        self.nodes.insert(id, MapNode::new(id, node_type, tile_type, region));
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&MapNode> {
        self.nodes.get(&id)
    }

    pub fn node_id_at(&self, cell: Cell) -> Option<NodeId> {
        self.index.get(cell).copied()
    }

    /// Node owning `cell`, if any.
    pub fn get_map_node(&self, cell: Cell) -> Option<&MapNode> {
        self.node_id_at(cell).and_then(|id| self.nodes.get(&id))
    }

    /// All live nodes of a type, in id order.
    pub fn get_all_nodes(&self, node_type: NodeType) -> Vec<&MapNode> {
        self.nodes.values().filter(|n| n.node_type == node_type).collect()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &MapNode> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats::default();
        for node in self.nodes.values() {
            match node.node_type {
                NodeType::Walkable => stats.walkable += 1,
                NodeType::Unwalkable => stats.unwalkable += 1,
                NodeType::Gate => stats.gates += 1,
            }
            stats.links += node.links.len();
        }
        stats
    }

    /// Link two nodes in both directions with type-dependent weights.
    /// Existing links and self links are left alone.
    pub(crate) fn link_nodes(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }
        let (Some(type_a), Some(type_b)) = (self.nodes.get(&a).map(|n| n.node_type), self.nodes.get(&b).map(|n| n.node_type)) else {
            return;
        };
        if let Some(node) = self.nodes.get_mut(&a) {
            if !node.is_linked_to(b) {
                node.links.push(Link { target: b, weight: link_weight(type_a, type_b) });
            }
        }
        if let Some(node) = self.nodes.get_mut(&b) {
            if !node.is_linked_to(a) {
                node.links.push(Link { target: a, weight: link_weight(type_b, type_a) });
            }
        }
    }

    /// Drop every link of `id` and the reverse links held by its neighbors.
    /// Returns the former neighbors.
    pub(crate) fn unlink_node(&mut self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.nodes.get_mut(&id) else {
            return Vec::new();
        };
        let neighbors: Vec<NodeId> = node.links.drain(..).map(|link| link.target).collect();
        for neighbor in &neighbors {
            if let Some(other) = self.nodes.get_mut(neighbor) {
                other.links.retain(|link| link.target != id);
            }
        }
        neighbors
    }

    /// Link `id` to every node owning one of its cells' neighbors in
    /// `offsets`.
    pub(crate) fn link_adjacent(&mut self, id: NodeId, offsets: &[IVec2]) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        let mut found = BTreeSet::new();
        for &cell in node.region.cells() {
            for &offset in offsets {
                if let Some(&other) = self.index.get(cell + offset) {
                    if other != id {
                        found.insert(other);
                    }
                }
            }
        }
        for other in found {
            self.link_nodes(id, other);
        }
    }

    /// Recompute the full 8-neighborhood adjacency of one node.
    pub(crate) fn relink_node(&mut self, id: NodeId) {
        self.link_adjacent(id, &CARDINALS);
        self.link_adjacent(id, &DIAGONALS);
    }

    /// Move all cells of `from` into `into` and remove `from`.
    pub(crate) fn merge_nodes(&mut self, from: NodeId, into: NodeId) {
        if from == into {
            return;
        }
        let neighbors = self.unlink_node(from);
        let Some(merged) = self.nodes.remove(&from) else {
            return;
        };
        let cells = merged.region.cells().to_vec();
        self.index.set_many(cells.iter().copied(), into);
        if let Some(target) = self.nodes.get_mut(&into) {
            target.region.add_cells(cells);
        }
        for neighbor in neighbors {
            if neighbor != into && self.nodes.contains_key(&neighbor) {
                self.link_nodes(into, neighbor);
            }
        }
    }

    /// Drop the cell index and rebuild it from the live node set.
    pub(crate) fn rebuild_index(&mut self) {
        self.index.clear();
        for (id, node) in &self.nodes {
            self.index.set_many(node.region.cells().iter().copied(), *id);
        }
    }

    /// Verify the structural invariants: every node is non-empty, the index
    /// and the node regions agree in both directions, and links are symmetric
    /// and point at live nodes.
    pub fn check_consistency(&self) -> Result<(), GraphError> {
        let mut owned = 0;
        for (&id, node) in &self.nodes {
            if node.region.is_empty() {
                return Err(GraphError::EmptyNode(id));
            }
            for &cell in node.region.cells() {
                let indexed = self.node_id_at(cell);
                if indexed != Some(id) {
                    return Err(GraphError::MisindexedCell { cell, node: id, indexed });
                }
            }
            owned += node.region.len();
            for link in &node.links {
                if link.target == id {
                    return Err(GraphError::SelfLink(id));
                }
                let Some(target) = self.nodes.get(&link.target) else {
                    return Err(GraphError::DanglingLink { from: id, to: link.target });
                };
                if !target.is_linked_to(id) {
                    return Err(GraphError::OneWayLink { from: id, to: link.target });
                }
            }
        }
        if owned != self.index.len() {
            return Err(GraphError::IndexMismatch { indexed: self.index.len(), owned });
        }
        Ok(())
    }
}
