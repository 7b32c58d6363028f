//! Sparse Cell Index: hash-backed mapping from grid cell to an associated value.
//!
//! # Purpose
//!
//! Associate values with cells on grids that are large, sparse, or not anchored
//! at the origin (building footprints, claimed resource cells, memoized tile
//! types). Each use site keeps its own strongly typed instance instead of one
//! shared dynamically typed store.
//!
//! # Architecture
//!
//! Cells are packed into a single `u64` key (see [`pack_cell`]) and stored in an
//! `FxHashMap`. All operations are O(1) amortized. Iteration order is
//! unspecified; callers needing determinism must sort.

use rustc_hash::FxHashMap;

use crate::game::math::{pack_cell, unpack_cell, Cell};

#[derive(Debug, Clone)]
pub struct SparseCellIndex<T> {
    entries: FxHashMap<u64, T>,
}

impl<T> Default for SparseCellIndex<T> {
    fn default() -> Self {
        Self { entries: FxHashMap::default() }
    }
}

impl<T> SparseCellIndex<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut entries = FxHashMap::default();
        entries.reserve(capacity);
        Self { entries }
    }

    #[inline]
    pub fn get(&self, cell: Cell) -> Option<&T> {
        self.entries.get(&pack_cell(cell))
    }

    #[inline]
    pub fn get_mut(&mut self, cell: Cell) -> Option<&mut T> {
        self.entries.get_mut(&pack_cell(cell))
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        self.entries.contains_key(&pack_cell(cell))
    }

    /// Associate `value` with `cell`, returning the value it replaced.
    #[inline]
    pub fn set(&mut self, cell: Cell, value: T) -> Option<T> {
        self.entries.insert(pack_cell(cell), value)
    }

    /// Remove the value at `cell`, returning it if present.
    #[inline]
    pub fn delete(&mut self, cell: Cell) -> Option<T> {
        self.entries.remove(&pack_cell(cell))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Cell, &T)> + '_ {
        self.entries.iter().map(|(&key, value)| (unpack_cell(key), value))
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.entries.keys().map(|&key| unpack_cell(key))
    }
}

impl<T: Clone> SparseCellIndex<T> {
    /// Bulk set: associate the same value with every cell.
    pub fn set_many<I>(&mut self, cells: I, value: T)
    where
        I: IntoIterator<Item = Cell>,
    {
        for cell in cells {
            self.entries.insert(pack_cell(cell), value.clone());
        }
    }
}
