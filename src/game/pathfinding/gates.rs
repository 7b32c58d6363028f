use bevy::prelude::*;

use crate::game::collections::GridMask;
use crate::game::config::TerrainConfig;
use crate::game::math::{chebyshev, make_line, Cell};
use super::graph_build::{TileGrid, UnwalkableBlob};
use super::region::Region;

/// Find gate lines between nearby unwalkable blobs and between blobs and the
/// map border.
///
/// Pairs come first (in blob order), border gates second. A candidate loses
/// entirely if any of its cells was claimed by an earlier gate, or if it
/// crosses unwalkable terrain other than its own endpoints.
pub(crate) fn detect_gates(grid: &TileGrid, blobs: &[UnwalkableBlob], config: &TerrainConfig) -> Vec<Vec<Cell>> {
    let size = grid.dimensions();
    let mut claimed = GridMask::new(size.x, size.y);
    let mut gates = Vec::new();
    let mut candidates = 0;
    let pair_radius = 2 * config.walkable_region_size;

    for (i, first) in blobs.iter().enumerate() {
        for second in &blobs[i + 1..] {
            let (a, b) = (&first.shape, &second.shape);
            if chebyshev(a.region.center(), b.region.center()) > pair_radius {
                continue;
            }
            let Some((from, to)) = closest_pair(&a.outer_corners, &b.outer_corners, &b.sides, config.gate_threshold)
                .into_iter()
                .chain(closest_pair(&b.outer_corners, &a.outer_corners, &a.sides, config.gate_threshold))
                .min_by_key(|&(from, to)| chebyshev(from, to))
            else {
                continue;
            };
            candidates += 1;
            if let Some(line) = claim_line(grid, &mut claimed, make_line(from, to), &[&a.region, &b.region]) {
                gates.push(line);
            }
        }
    }

    for blob in blobs {
        let shape = &blob.shape;
        let Some((corner, distance)) = shape
            .outer_corners
            .iter()
            .map(|&c| (c, border_distance(c, size)))
            .min_by_key(|&(_, d)| d)
        else {
            continue;
        };
        if distance > config.gate_threshold {
            continue;
        }
        candidates += 1;
        let target = nearest_border_cell(corner, size);
        if let Some(line) = claim_line(grid, &mut claimed, make_line(corner, target), &[&shape.region]) {
            gates.push(line);
        }
    }

    debug!("[GRAPH BUILD] {} gate candidates, {} gates accepted", candidates, gates.len());
    gates
}

/// Closest (corner, target) pair with `targets` drawn from the other blob's
/// outer corners and sides. Ties keep the first pair found.
fn closest_pair(corners: &[Cell], other_corners: &[Cell], other_sides: &[Cell], threshold: i32) -> Option<(Cell, Cell)> {
    let mut best: Option<(Cell, Cell, i32)> = None;
    for &from in corners {
        for &to in other_corners.iter().chain(other_sides) {
            let d = chebyshev(from, to);
            if d <= threshold && best.map_or(true, |(_, _, best_d)| d < best_d) {
                best = Some((from, to, d));
            }
        }
    }
    best.map(|(from, to, _)| (from, to))
}

/// Strip the endpoint regions from `line` and claim what is left. Returns
/// `None` when nothing is left, when the line crosses other unwalkable
/// terrain, or when any cell already belongs to an earlier gate.
fn claim_line(grid: &TileGrid, claimed: &mut GridMask, line: Vec<Cell>, endpoints: &[&Region]) -> Option<Vec<Cell>> {
    let cells: Vec<Cell> = line
        .into_iter()
        .filter(|&c| !endpoints.iter().any(|r| r.has_cell(c)))
        .collect();
    if cells.is_empty()
        || cells.iter().any(|&c| !grid.is_walkable(c))
        || cells.iter().any(|&c| claimed.contains(c))
    {
        return None;
    }
    for &cell in &cells {
        claimed.insert(cell);
    }
    Some(cells)
}

#[inline]
fn border_distance(cell: Cell, size: IVec2) -> i32 {
    cell.x.min(cell.y).min(size.x - 1 - cell.x).min(size.y - 1 - cell.y)
}

/// Project `cell` onto the nearest map edge (west, north, east, south on ties).
fn nearest_border_cell(cell: Cell, size: IVec2) -> Cell {
    let options = [
        (cell.x, IVec2::new(0, cell.y)),
        (cell.y, IVec2::new(cell.x, 0)),
        (size.x - 1 - cell.x, IVec2::new(size.x - 1, cell.y)),
        (size.y - 1 - cell.y, IVec2::new(cell.x, size.y - 1)),
    ];
    options
        .into_iter()
        .min_by_key(|&(d, _)| d)
        .map(|(_, c)| c)
        .unwrap_or(cell)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_border_projection() {
        let size = IVec2::new(20, 10);
        assert_eq!(border_distance(IVec2::new(3, 5), size), 3);
        assert_eq!(nearest_border_cell(IVec2::new(3, 5), size), IVec2::new(0, 5));
        assert_eq!(nearest_border_cell(IVec2::new(10, 8), size), IVec2::new(10, 9));
        assert_eq!(nearest_border_cell(IVec2::new(17, 4), size), IVec2::new(19, 4));
    }

    #[test]
    fn test_closest_pair_respects_threshold() {
        let corners = [IVec2::new(0, 0), IVec2::new(0, 4)];
        let others = [IVec2::new(3, 4), IVec2::new(9, 0)];
        assert_eq!(closest_pair(&corners, &others, &[], 10), Some((IVec2::new(0, 4), IVec2::new(3, 4))));
        assert_eq!(closest_pair(&corners, &others, &[], 2), None);
        assert_eq!(closest_pair(&corners, &[], &[IVec2::new(2, 1)], 5), Some((IVec2::new(0, 0), IVec2::new(2, 1))));
    }
}
