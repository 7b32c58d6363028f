use bevy::prelude::*;
use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap};

use crate::game::math::{chebyshev, Cell};
use crate::game::terrain::TileType;
use super::graph::NavigationGraph;
use super::types::{NodeId, NodeType, Path};

/// Open-set entry. Ordered so that `BinaryHeap` pops the lowest f-score
/// first, ties broken by the lower node id.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct OpenEntry {
    score: u64,
    cost: u64,
    id: NodeId,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl NavigationGraph {
    /// Shortest route between the nodes owning `from` and `to`. Unwalkable
    /// nodes are only entered when their tile type is in `allowed`.
    pub fn get_shortest_path(&mut self, from: Cell, to: Cell, allowed: &[TileType]) -> Option<Path> {
        let (start, goal) = self.endpoints(from, to)?;
        self.reset_weights(allowed);
        self.search(start, goal)
    }

    /// Up to `max_paths` distinct routes. After each route is found, every
    /// node on it gets `inflation` added to its weight so the next search
    /// prefers other nodes. Stops on a repeated route, a route made only of
    /// already inflated nodes, or no route at all.
    pub fn get_paths(&mut self, from: Cell, to: Cell, allowed: &[TileType], max_paths: usize, inflation: u64) -> Vec<Path> {
        let Some((start, goal)) = self.endpoints(from, to) else {
            return Vec::new();
        };
        self.reset_weights(allowed);

        let mut paths: Vec<Path> = Vec::new();
        let mut inflated = BTreeSet::new();
        while paths.len() < max_paths {
            let Some(path) = self.search(start, goal) else {
                break;
            };
            if paths.iter().any(|p| p.nodes == path.nodes) {
                break;
            }
            if path.nodes.iter().all(|id| inflated.contains(id)) {
                break;
            }
            for id in &path.nodes {
                if let Some(weight) = self.nodes.get_mut(id).and_then(|n| n.search.weight.as_mut()) {
                    *weight += inflation;
                }
                inflated.insert(*id);
            }
            paths.push(path);
        }
        debug!("[PATHFINDING] {} alternative paths from {:?} to {:?}", paths.len(), from, to);
        paths
    }

    fn endpoints(&self, from: Cell, to: Cell) -> Option<(NodeId, NodeId)> {
        let Some(start) = self.node_id_at(from) else {
            warn!("[PATHFINDING] No map node owns start cell {:?}", from);
            return None;
        };
        let Some(goal) = self.node_id_at(to) else {
            warn!("[PATHFINDING] No map node owns goal cell {:?}", to);
            return None;
        };
        Some((start, goal))
    }

    /// Per-query weights: passable nodes cost 1, unwalkable nodes cost 1 when
    /// their terrain is allowed and are blocked otherwise.
    pub(crate) fn reset_weights(&mut self, allowed: &[TileType]) {
        for node in self.nodes.values_mut() {
            node.search.weight = match node.node_type {
                NodeType::Walkable | NodeType::Gate => Some(1),
                NodeType::Unwalkable => node.tile_type.filter(|t| allowed.contains(t)).map(|_| 1),
            };
        }
    }

    /// A* with the weights currently set on the nodes.
    fn search(&mut self, start: NodeId, goal: NodeId) -> Option<Path> {
        for node in self.nodes.values_mut() {
            node.search.reset_progress();
        }
        let scale = self.walkable_region_size.max(1) as u64;
        let goal_center = self.nodes.get(&goal)?.region.center();
        let heuristic = |center: Cell| chebyshev(center, goal_center) as u64 / scale;

        let start_node = self.nodes.get_mut(&start)?;
        if start_node.search.weight.is_none() {
            debug!("[PATHFINDING] Start node {:?} is blocked", start);
            return None;
        }
        let h = heuristic(start_node.region.center());
        start_node.search.estimate = h;
        start_node.search.open = true;

        let mut open = BinaryHeap::new();
        open.push(OpenEntry { score: h, cost: 0, id: start });

        while let Some(entry) = open.pop() {
            let Some(current) = self.nodes.get_mut(&entry.id) else {
                continue;
            };
            if current.search.closed || entry.cost != current.search.cost {
                continue;
            }
            current.search.closed = true;
            if entry.id == goal {
                return self.reconstruct(goal);
            }
            let center = current.region.center();
            let links = current.links.clone();

            for link in links {
                let Some(next) = self.nodes.get_mut(&link.target) else {
                    continue;
                };
                let Some(weight) = next.search.weight else {
                    continue;
                };
                if next.search.closed {
                    continue;
                }
                let next_center = next.region.center();
                let cost = entry.cost + weight + link.weight as u64 * chebyshev(center, next_center) as u64;
                if next.search.open && cost >= next.search.cost {
                    continue;
                }
                let h = heuristic(next_center);
                next.search.cost = cost;
                next.search.estimate = h;
                next.search.parent = Some(entry.id);
                next.search.open = true;
                open.push(OpenEntry { score: cost + h, cost, id: link.target });
            }
        }
        None
    }

    fn reconstruct(&self, goal: NodeId) -> Option<Path> {
        let cost = self.nodes.get(&goal)?.search.cost;
        let mut nodes = vec![goal];
        let mut current = goal;
        while let Some(parent) = self.nodes.get(&current).and_then(|n| n.search.parent) {
            nodes.push(parent);
            current = parent;
        }
        nodes.reverse();
        let centers: Vec<Cell> = nodes
            .iter()
            .filter_map(|id| self.nodes.get(id).map(|n| n.region.center()))
            .collect();
        Some(Path::new(nodes, cost, &centers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_entry_pops_lowest_score_then_lowest_id() {
        let mut heap = BinaryHeap::new();
        heap.push(OpenEntry { score: 5, cost: 0, id: NodeId(1) });
        heap.push(OpenEntry { score: 3, cost: 0, id: NodeId(9) });
        heap.push(OpenEntry { score: 3, cost: 0, id: NodeId(4) });
        let order: Vec<NodeId> = std::iter::from_fn(|| heap.pop().map(|e| e.id)).collect();
        assert_eq!(order, vec![NodeId(4), NodeId(9), NodeId(1)]);
    }
}
