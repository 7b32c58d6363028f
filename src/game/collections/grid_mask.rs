//! Dense per-cell flags over a bounded grid, used for visited and claimed
//! bookkeeping during one-shot passes over the whole map.

use fixedbitset::FixedBitSet;

use crate::game::math::Cell;

#[derive(Debug, Clone)]
pub struct GridMask {
    width: i32,
    height: i32,
    bits: FixedBitSet,
}

impl GridMask {
    pub fn new(width: i32, height: i32) -> Self {
        let len = (width.max(0) as usize) * (height.max(0) as usize);
        Self {
            width,
            height,
            bits: FixedBitSet::with_capacity(len),
        }
    }

    #[inline]
    fn index(&self, cell: Cell) -> Option<usize> {
        if cell.x < 0 || cell.y < 0 || cell.x >= self.width || cell.y >= self.height {
            return None;
        }
        Some(cell.y as usize * self.width as usize + cell.x as usize)
    }

    /// Out-of-bounds cells are never set.
    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        self.index(cell).is_some_and(|idx| self.bits.contains(idx))
    }

    /// Set the flag, returning `true` if it was previously clear.
    /// Out-of-bounds cells are ignored and return `false`.
    #[inline]
    pub fn insert(&mut self, cell: Cell) -> bool {
        match self.index(cell) {
            Some(idx) => !self.bits.put(idx),
            None => false,
        }
    }

    pub fn count(&self) -> usize {
        self.bits.count_ones(..)
    }
}
