//! Cell sets with a cached centroid, and the corner/side classification of
//! unwalkable blobs used to place gates.

use bevy::prelude::*;

use crate::game::collections::SparseCellIndex;
use crate::game::math::{centroid, Cell, CARDINALS};

/// Ordered set of cells. The center is recomputed on every mutation.
#[derive(Clone, Debug, Default)]
pub struct Region {
    cells: Vec<Cell>,
    index: SparseCellIndex<()>,
    center: Cell,
}

impl Region {
    pub fn new(cells: impl IntoIterator<Item = Cell>) -> Self {
        let mut region = Self::default();
        region.add_cells(cells);
        region
    }

    /// Append cells not already present. Returns how many were added.
    pub fn add_cells(&mut self, cells: impl IntoIterator<Item = Cell>) -> usize {
        let before = self.cells.len();
        for cell in cells {
            if self.index.set(cell, ()).is_none() {
                self.cells.push(cell);
            }
        }
        let added = self.cells.len() - before;
        if added > 0 {
            self.recompute_center();
        }
        added
    }

    /// Remove the given cells. Returns how many were present.
    pub fn del_cells(&mut self, cells: &[Cell]) -> usize {
        let mut removed = 0;
        for &cell in cells {
            if self.index.delete(cell).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            let index = &self.index;
            self.cells.retain(|&cell| index.contains(cell));
            self.recompute_center();
        }
        removed
    }

    #[inline]
    pub fn has_cell(&self, cell: Cell) -> bool {
        self.index.contains(cell)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub fn center(&self) -> Cell {
        self.center
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn recompute_center(&mut self) {
        self.center = centroid(&self.cells);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellRole {
    /// Convex corner: both orthogonal neighbors of a rotation and their
    /// diagonal are open.
    OuterCorner,
    /// Concave corner: both orthogonals are blocked, the diagonal is open.
    InnerCorner,
    /// Boundary cell reachable by a straight ray from a corner.
    Side,
    Inner,
}

/// Orthogonal neighbors `a`, `b` and their shared diagonal `d` for a
/// rotation of `rotation * 90°`.
pub fn corner_template(rotation: u8) -> [IVec2; 3] {
    let mut a = IVec2::new(1, 0);
    let mut b = IVec2::new(0, 1);
    for _ in 0..(rotation % 4) {
        a = IVec2::new(-a.y, a.x);
        b = IVec2::new(-b.y, b.x);
    }
    [a, b, a + b]
}

/// A blob of unwalkable cells partitioned into corner/side/inner subsets.
///
/// Every cell of the region appears in exactly one subset.
#[derive(Clone, Debug)]
pub struct UnwalkableRegion {
    pub region: Region,
    pub outer_corners: Vec<Cell>,
    pub inner_corners: Vec<Cell>,
    pub sides: Vec<Cell>,
    pub inner: Vec<Cell>,
    roles: SparseCellIndex<CellRole>,
}

impl UnwalkableRegion {
    /// Classify a blob. `is_walkable` must return `false` for out-of-bounds
    /// cells. The result does not depend on the order of `cells`.
    pub fn classify(mut cells: Vec<Cell>, is_walkable: impl Fn(Cell) -> bool) -> Self {
        cells.sort_by_key(|c| (c.y, c.x));
        cells.dedup();
        let region = Region::new(cells.iter().copied());

        let mut roles: SparseCellIndex<CellRole> = SparseCellIndex::with_capacity(cells.len());
        for &cell in &cells {
            let open = |offset: IVec2| is_walkable(cell + offset);
            let outer = (0..4).any(|r| corner_template(r).iter().all(|&o| open(o)));
            let inner = || {
                (0..4).any(|r| {
                    let [a, b, d] = corner_template(r);
                    !open(a) && !open(b) && open(d)
                })
            };
            if outer {
                roles.set(cell, CellRole::OuterCorner);
            } else if inner() {
                roles.set(cell, CellRole::InnerCorner);
            }
        }

        let corners: Vec<Cell> = cells.iter().copied().filter(|&c| roles.contains(c)).collect();
        for corner in corners {
            for dir in CARDINALS {
                let mut next = corner + dir;
                while region.has_cell(next)
                    && !matches!(roles.get(next), Some(CellRole::OuterCorner | CellRole::InnerCorner))
                    && CARDINALS.iter().any(|&o| is_walkable(next + o))
                {
                    roles.set(next, CellRole::Side);
                    next += dir;
                }
            }
        }

        let mut outer_corners = Vec::new();
        let mut inner_corners = Vec::new();
        let mut sides = Vec::new();
        let mut inner = Vec::new();
        for &cell in &cells {
            let role = *roles.get(cell).unwrap_or(&CellRole::Inner);
            match role {
                CellRole::OuterCorner => outer_corners.push(cell),
                CellRole::InnerCorner => inner_corners.push(cell),
                CellRole::Side => sides.push(cell),
                CellRole::Inner => {
                    roles.set(cell, CellRole::Inner);
                    inner.push(cell);
                }
            }
        }
        Self { region, outer_corners, inner_corners, sides, inner, roles }
    }

    /// `None` for cells outside the blob.
    #[inline]
    pub fn role(&self, cell: Cell) -> Option<CellRole> {
        self.roles.get(cell).copied()
    }
}
