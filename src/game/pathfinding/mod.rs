//! Navigation graph over terrain regions.
//!
//! The map is partitioned into nodes: unwalkable blobs (chunked per
//! `unwalkable_region_size` block), gates (short walkable lines between
//! nearby obstacles or an obstacle and the border) and the walkable regions
//! those gates and obstacles carve out. Nodes are linked through 8-way cell
//! adjacency and searched with A*.

mod astar;
mod bridge;
mod gates;
mod graph;
mod graph_build;
mod incremental;
mod region;
mod types;

#[cfg(test)]
mod tests;

// ============================================================================
// PUBLIC API
// ============================================================================

pub use bridge::{BridgePlan, BridgeSection, Footprint, PlacementCheck};
pub use graph::{GraphStats, NavigationGraph};
pub use region::{corner_template, CellRole, Region, UnwalkableRegion};
pub use types::{link_weight, Link, MapNode, NodeId, NodeType, Path};
