use bevy::math::IVec2;
use thiserror::Error;

use crate::game::pathfinding::NodeId;

/// Fatal problems with the terrain handed to `TerrainAnalysis::init`.
///
/// There is no degraded mode before the graph exists, so these abort
/// initialization. Query-time problems never surface as errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TerrainError {
    #[error("terrain has invalid dimensions {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("terrain reports no tile type for in-bounds cell ({x}, {y})")]
    MissingTile { x: i32, y: i32 },

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Failures reading or writing a terrain snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding failed: {0}")]
    Codec(#[from] bincode::Error),

    #[error("unknown map glyph {glyph:?} at ({x}, {y})")]
    UnknownGlyph { glyph: char, x: i32, y: i32 },

    #[error("map rows have different widths (row {row} has {found}, expected {expected})")]
    RaggedRows { row: usize, found: usize, expected: usize },

    #[error("snapshot is inconsistent: {0}")]
    Inconsistent(String),
}

/// Failures loading a RON config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Broken structural invariant found by `NavigationGraph::check_consistency`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("node {0:?} has an empty region")]
    EmptyNode(NodeId),

    #[error("cell {cell} of node {node:?} is indexed to {indexed:?}")]
    MisindexedCell { cell: IVec2, node: NodeId, indexed: Option<NodeId> },

    #[error("node {0:?} links to itself")]
    SelfLink(NodeId),

    #[error("node {from:?} links to missing node {to:?}")]
    DanglingLink { from: NodeId, to: NodeId },

    #[error("link {from:?} -> {to:?} has no reverse")]
    OneWayLink { from: NodeId, to: NodeId },

    #[error("index holds {indexed} cells but nodes own {owned}")]
    IndexMismatch { indexed: usize, owned: usize },
}
