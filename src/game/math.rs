use bevy::prelude::*;

/// A grid cell coordinate. `x` grows east, `y` grows south (row index).
pub type Cell = IVec2;

/// The four orthogonal neighbor offsets, in a fixed order (E, S, W, N).
pub const CARDINALS: [IVec2; 4] = [
    IVec2::new(1, 0),
    IVec2::new(0, 1),
    IVec2::new(-1, 0),
    IVec2::new(0, -1),
];

/// The four diagonal neighbor offsets, in a fixed order (SE, SW, NW, NE).
pub const DIAGONALS: [IVec2; 4] = [
    IVec2::new(1, 1),
    IVec2::new(-1, 1),
    IVec2::new(-1, -1),
    IVec2::new(1, -1),
];

/// Pack a cell into a single hash key. Both halves keep their sign bits, so
/// negative coordinates never collide with positive ones.
#[inline]
pub fn pack_cell(cell: Cell) -> u64 {
    ((cell.x as u32 as u64) << 32) | (cell.y as u32 as u64)
}

#[inline]
pub fn unpack_cell(key: u64) -> Cell {
    IVec2::new((key >> 32) as u32 as i32, key as u32 as i32)
}

/// max(|dx|, |dy|), the grid metric for 8-directional movement.
#[inline]
pub fn chebyshev(a: Cell, b: Cell) -> i32 {
    let d = (a - b).abs();
    d.x.max(d.y)
}

#[inline]
pub fn distance_squared(a: Cell, b: Cell) -> i64 {
    let dx = (a.x - b.x) as i64;
    let dy = (a.y - b.y) as i64;
    dx * dx + dy * dy
}

/// Arithmetic mean of the cells, each axis rounded half away from zero.
/// An empty slice has center (0, 0).
pub fn centroid(cells: &[Cell]) -> Cell {
    if cells.is_empty() {
        return IVec2::ZERO;
    }
    let (sx, sy) = cells
        .iter()
        .fold((0i64, 0i64), |(sx, sy), c| (sx + c.x as i64, sy + c.y as i64));
    let n = cells.len() as f64;
    IVec2::new((sx as f64 / n).round() as i32, (sy as f64 / n).round() as i32)
}

/// Rasterize a connected line of cells from `from` to `to` (Bresenham).
///
/// The result always starts at `from` and ends at `to`; callers rely on the
/// first element to decide whether a line needs reversing. Consecutive cells
/// are 8-connected.
pub fn make_line(from: Cell, to: Cell) -> Vec<Cell> {
    if from.x == to.x {
        let step = (to.y - from.y).signum();
        let len = (to.y - from.y).abs();
        return (0..=len).map(|i| IVec2::new(from.x, from.y + i * step)).collect();
    }

    let steep = (to.y - from.y).abs() > (to.x - from.x).abs();
    if steep {
        shallow_line(transpose(from), transpose(to))
            .into_iter()
            .map(transpose)
            .collect()
    } else {
        shallow_line(from, to)
    }
}

#[inline]
fn transpose(cell: Cell) -> Cell {
    IVec2::new(cell.y, cell.x)
}

/// Bresenham for |dy| <= |dx|, stepping one cell in x per iteration.
fn shallow_line(from: Cell, to: Cell) -> Vec<Cell> {
    let dx = (to.x - from.x).abs();
    let dy = (to.y - from.y).abs();
    let sx = (to.x - from.x).signum();
    let sy = (to.y - from.y).signum();

    let mut cells = Vec::with_capacity(dx as usize + 1);
    let mut y = from.y;
    let mut error = 0;
    for i in 0..=dx {
        cells.push(IVec2::new(from.x + i * sx, y));
        error += dy;
        if 2 * error >= dx {
            y += sy;
            error -= dx;
        }
    }
    cells
}
