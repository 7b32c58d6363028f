pub mod analysis;
pub mod collections;
pub mod config;
pub mod error;
pub mod map;
pub mod math;
pub mod pathfinding;
pub mod profiling;
pub mod resource_clusters;
pub mod systems;
pub mod terrain;

pub use analysis::TerrainAnalysis;
pub use systems::{FootprintChanged, ResourceTilesChanged, TerrainAnalysisPlugin};
