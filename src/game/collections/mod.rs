//! Cell-keyed containers shared by the navigation graph and the resource
//! cluster index.
//!
//! - [`SparseCellIndex`]: hash-backed cell → value map for sparse or unbounded use.
//! - [`GridMask`]: bitset flags over the map rectangle for whole-map passes.
//!
//! # Example
//!
//! ```rust
//! use bevy::math::IVec2;
//! use terranav::game::collections::SparseCellIndex;
//!
//! let mut owners = SparseCellIndex::new();
//! owners.set_many([IVec2::new(0, 0), IVec2::new(1, 0)], 7u32);
//! assert_eq!(owners.get(IVec2::new(1, 0)), Some(&7));
//! assert_eq!(owners.delete(IVec2::new(0, 0)), Some(7));
//! ```

pub mod grid_mask;
pub mod sparse_cell_index;


pub use grid_mask::GridMask;
pub use sparse_cell_index::SparseCellIndex;
