use bevy::prelude::*;
use std::collections::{BTreeSet, VecDeque};

use crate::game::collections::SparseCellIndex;
use crate::game::math::{Cell, CARDINALS, DIAGONALS};
use super::graph::NavigationGraph;
use super::types::{NodeId, NodeType};

impl NavigationGraph {
    /// Carve `cells` out of whatever nodes own them and make them a new node.
    ///
    /// Out-of-bounds and duplicate cells are ignored. Touched nodes lose the
    /// cells and are dropped when empty. A touched node cut into separate
    /// pieces keeps its id on the first piece in raster order; every other
    /// piece becomes a new node of the same type. All affected links are
    /// recomputed from scratch. Returns `None` when no usable cell remains.
    pub fn add_node(&mut self, cells: &[Cell], node_type: NodeType) -> Option<NodeId> {
        let mut seen = SparseCellIndex::with_capacity(cells.len());
        let cells: Vec<Cell> = cells
            .iter()
            .copied()
            .filter(|&c| self.in_bounds(c) && seen.set(c, ()).is_none())
            .collect();
        if cells.is_empty() {
            debug!("[PATHFINDING] add_node ignored: no in-bounds cells");
            return None;
        }

        let touched: BTreeSet<NodeId> = cells.iter().filter_map(|&c| self.node_id_at(c)).collect();
        for &id in &touched {
            self.unlink_node(id);
            if let Some(node) = self.nodes.get_mut(&id) {
                node.region.del_cells(&cells);
            }
        }
        let mut dropped = 0;
        for &id in &touched {
            if self.nodes.get(&id).is_some_and(|n| n.region.is_empty()) {
                self.nodes.remove(&id);
                dropped += 1;
            }
        }

        let new_id = self.create_node(node_type, None, cells);

        let mut pieces = Vec::new();
        for &id in &touched {
            pieces.extend(self.split_node(id));
        }

        self.relink_node(new_id);
        for &id in touched.iter().chain(pieces.iter()) {
            if self.nodes.contains_key(&id) {
                self.relink_node(id);
            }
        }

        debug!(
            "[PATHFINDING] add_node {:?} ({:?}): touched {} nodes, dropped {}, split off {}",
            new_id,
            node_type,
            touched.len(),
            dropped,
            pieces.len()
        );
        Some(new_id)
    }

    /// Break a node into its connected pieces. Returns the ids of the pieces
    /// split off; the node itself keeps the first one.
    fn split_node(&mut self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.nodes.get(&id) else {
            return Vec::new();
        };
        // Gate lines step diagonally, everything else was filled 4-connected
        let diagonal = node.node_type == NodeType::Gate;
        let mut components = connected_pieces(node.region.cells(), diagonal);
        if components.len() < 2 {
            return Vec::new();
        }
        let (node_type, tile_type) = (node.node_type, node.tile_type);

        let split_off = components.split_off(1);
        let mut ids = Vec::with_capacity(split_off.len());
        for piece in split_off {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.region.del_cells(&piece);
            }
            ids.push(self.create_node(node_type, tile_type, piece));
        }
        ids
    }
}

/// Connected components of `cells`, ordered by their first cell in raster
/// (y, x) order.
fn connected_pieces(cells: &[Cell], diagonal: bool) -> Vec<Vec<Cell>> {
    let mut seeds = cells.to_vec();
    seeds.sort_by_key(|c| (c.y, c.x));
    let mut remaining = SparseCellIndex::with_capacity(cells.len());
    remaining.set_many(cells.iter().copied(), ());

    let mut pieces = Vec::new();
    for seed in seeds {
        if remaining.delete(seed).is_none() {
            continue;
        }
        let mut piece = vec![seed];
        let mut queue = VecDeque::from([seed]);
        while let Some(cell) = queue.pop_front() {
            for &dir in CARDINALS.iter().chain(DIAGONALS.iter().filter(|_| diagonal)) {
                let next = cell + dir;
                if remaining.delete(next).is_some() {
                    piece.push(next);
                    queue.push_back(next);
                }
            }
        }
        pieces.push(piece);
    }
    pieces
}
