use serde::{Serialize, Deserialize};
use smallvec::SmallVec;

use crate::game::math::chebyshev;
use super::region::Region;
use crate::game::terrain::TileType;

/// Stable identifier of a [`MapNode`]. Ids increase monotonically and are
/// never reused, even after the node is merged away or replaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Navigational role of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeType {
    Walkable,
    Unwalkable,
    /// Short line of walkable cells connecting two obstacles (or an obstacle
    /// and the map border). Traversed like walkable ground.
    Gate,
}

impl NodeType {
    #[inline]
    pub fn is_passable(self) -> bool {
        !matches!(self, NodeType::Unwalkable)
    }
}

/// Directed edge weight for a transition between two node types.
///
/// Entering unwalkable terrain costs double, leaving it costs the same as
/// walking. The asymmetry is tuning, keep it.
#[inline]
pub fn link_weight(from: NodeType, to: NodeType) -> u32 {
    match (from.is_passable(), to.is_passable()) {
        (true, true) => 1,
        (true, false) => 2,
        (false, true) => 1,
        (false, false) => 2,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Link {
    pub target: NodeId,
    pub weight: u32,
}

/// Per-query scratch state. Reset at the start of every search.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct SearchState {
    /// `None` means blocked for the current query.
    pub weight: Option<u64>,
    pub cost: u64,
    pub estimate: u64,
    pub parent: Option<NodeId>,
    pub open: bool,
    pub closed: bool,
}

impl SearchState {
    pub fn reset_progress(&mut self) {
        self.cost = 0;
        self.estimate = 0;
        self.parent = None;
        self.open = false;
        self.closed = false;
    }
}

/// A connected region of the map with a single navigational type.
#[derive(Clone, Debug)]
pub struct MapNode {
    pub id: NodeId,
    pub node_type: NodeType,
    /// Terrain type of a terrain-derived unwalkable node. Building footprints
    /// and passable nodes have none.
    pub tile_type: Option<TileType>,
    pub region: Region,
    pub links: SmallVec<[Link; 8]>,
    pub(crate) search: SearchState,
}

impl MapNode {
    pub(crate) fn new(id: NodeId, node_type: NodeType, tile_type: Option<TileType>, region: Region) -> Self {
        Self {
            id,
            node_type,
            tile_type,
            region,
            links: SmallVec::new(),
            search: SearchState::default(),
        }
    }

    pub fn is_linked_to(&self, other: NodeId) -> bool {
        self.links.iter().any(|link| link.target == other)
    }

    pub fn link_to(&self, other: NodeId) -> Option<&Link> {
        self.links.iter().find(|link| link.target == other)
    }
}

/// Result of a route query: node sequence from start to goal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    pub nodes: Vec<NodeId>,
    /// Sum of chebyshev distances between consecutive node centers.
    pub length: u32,
    /// Search cost of the route, including any inflation applied while it was found.
    pub cost: u64,
}

impl Path {
    pub(crate) fn new(nodes: Vec<NodeId>, cost: u64, centers: &[bevy::math::IVec2]) -> Self {
        let length = centers
            .windows(2)
            .map(|pair| chebyshev(pair[0], pair[1]) as u32)
            .sum();
        Self { nodes, length, cost }
    }

    pub fn start(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn goal(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
