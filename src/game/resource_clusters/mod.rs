//! Resource cluster index.
//!
//! Terrain is cut into `resource_cluster_size` blocks; deposits found from
//! each block are aggregated into one [`ResourceCluster`] with cached wood,
//! metal and gold amounts, and clusters are indexed by their walkable center
//! in an R-tree for radius queries.

mod cluster;
mod index;


pub use cluster::{ClusterId, ResourceCluster};
pub use index::ResourceClusterIndex;
