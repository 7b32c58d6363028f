//! Bridge layout: a chain of building footprints laid across unwalkable
//! terrain so that two walkable nodes on a path become connected.

use bevy::prelude::*;
use rand::Rng;

use crate::game::collections::SparseCellIndex;
use crate::game::math::{chebyshev, distance_squared, make_line, Cell, CARDINALS, DIAGONALS};
use super::graph::NavigationGraph;
use super::types::{NodeId, NodeType, Path};

/// Decides whether a footprint may be placed. Supplied by the host, which
/// knows about units, existing buildings and build rules.
pub trait PlacementCheck {
    fn can_place(&self, center: Cell, cells: &[Cell]) -> bool;
}

impl<F> PlacementCheck for F
where
    F: Fn(Cell, &[Cell]) -> bool,
{
    fn can_place(&self, center: Cell, cells: &[Cell]) -> bool {
        self(center, cells)
    }
}

/// Rectangular building footprint, centered on a cell (even sizes lean
/// towards negative coordinates). Both sides are at least one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Footprint {
    width: i32,
    height: i32,
}

impl Footprint {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width: width.max(1), height: height.max(1) }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn area(&self) -> usize {
        (self.width * self.height) as usize
    }

    pub fn cells_at(&self, center: Cell) -> Vec<Cell> {
        let min = center - IVec2::new(self.width / 2, self.height / 2);
        let mut cells = Vec::with_capacity(self.area());
        for dy in 0..self.height {
            for dx in 0..self.width {
                cells.push(min + IVec2::new(dx, dy));
            }
        }
        cells
    }

    /// Nonzero offsets tried when the preferred center is rejected, nearest
    /// first. Never more than the footprint area.
    pub fn search_window(&self) -> Vec<IVec2> {
        let radius = self.width.max(self.height);
        let mut offsets = Vec::new();
        for y in -radius..=radius {
            for x in -radius..=radius {
                if x != 0 || y != 0 {
                    offsets.push(IVec2::new(x, y));
                }
            }
        }
        offsets.sort_by_key(|o| (distance_squared(*o, IVec2::ZERO), o.y, o.x));
        offsets.truncate(self.area());
        offsets
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeSection {
    pub center: Cell,
    pub cells: Vec<Cell>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgePlan {
    pub source: NodeId,
    pub destination: NodeId,
    pub sections: Vec<BridgeSection>,
    /// First section touches the source node and last section touches the
    /// destination node.
    pub complete: bool,
}

/// Nodes where a path leaves walkable ground and where it comes back.
#[derive(Clone, Copy, Debug)]
struct Crossing {
    source: NodeId,
    first_obstacle: NodeId,
    last_obstacle: NodeId,
    destination: NodeId,
}

impl NavigationGraph {
    /// Lay footprints along a straight line across the first unwalkable
    /// stretch of `path`.
    ///
    /// Each attempt picks a random source cell bordering the obstacle, aims
    /// at the closest destination cell bordering it, and places sections on
    /// the line cells not yet covered. The first complete layout wins;
    /// otherwise the largest partial one is returned marked incomplete.
    pub fn connect_map_nodes_by_bridge<P, R>(
        &self,
        path: &Path,
        footprint: Footprint,
        placement: &P,
        rng: &mut R,
        attempts: usize,
    ) -> Option<BridgePlan>
    where
        P: PlacementCheck + ?Sized,
        R: Rng + ?Sized,
    {
        let Some(crossing) = self.find_crossing(path) else {
            debug!("[BRIDGE] Path does not cross unwalkable terrain between walkable nodes");
            return None;
        };
        let sources = self.border_cells(crossing.source, crossing.first_obstacle);
        let targets = self.border_cells(crossing.destination, crossing.last_obstacle);
        if sources.is_empty() || targets.is_empty() {
            warn!("[BRIDGE] No border cells between {:?} and {:?}", crossing.source, crossing.destination);
            return None;
        }

        let mut best: Option<BridgePlan> = None;
        for attempt in 0..attempts.max(1) {
            let from = sources[rng.random_range(0..sources.len())];
            let Some(to) = targets.iter().copied().min_by_key(|&t| distance_squared(from, t)) else {
                break;
            };
            let sections = self.lay_sections(&make_line(from, to), footprint, placement, crossing.destination);
            let complete = match (sections.first(), sections.last()) {
                (Some(first), Some(last)) => {
                    self.touches_node(&first.cells, crossing.source) && self.touches_node(&last.cells, crossing.destination)
                }
                _ => false,
            };
            debug!("[BRIDGE] Attempt {}: {} sections, complete: {}", attempt + 1, sections.len(), complete);

            let plan = BridgePlan {
                source: crossing.source,
                destination: crossing.destination,
                sections,
                complete,
            };
            if complete {
                return Some(plan);
            }
            if !plan.sections.is_empty() && best.as_ref().map_or(true, |b| plan.sections.len() > b.sections.len()) {
                best = Some(plan);
            }
        }
        best
    }

    fn find_crossing(&self, path: &Path) -> Option<Crossing> {
        let node_type = |id: NodeId| self.node(id).map(|n| n.node_type);
        let nodes = &path.nodes;
        let start = nodes.windows(2).position(|pair| {
            node_type(pair[0]).is_some_and(NodeType::is_passable) && node_type(pair[1]) == Some(NodeType::Unwalkable)
        })?;
        let mut end = start + 1;
        while end < nodes.len() && node_type(nodes[end]) == Some(NodeType::Unwalkable) {
            end += 1;
        }
        let destination = *nodes.get(end)?;
        Some(Crossing {
            source: nodes[start],
            first_obstacle: nodes[start + 1],
            last_obstacle: nodes[end - 1],
            destination,
        })
    }

    /// Cells of `node` with an 8-neighbor owned by `neighbor`.
    fn border_cells(&self, node: NodeId, neighbor: NodeId) -> Vec<Cell> {
        let Some(node) = self.node(node) else {
            return Vec::new();
        };
        node.region
            .cells()
            .iter()
            .copied()
            .filter(|&c| {
                CARDINALS
                    .iter()
                    .chain(DIAGONALS.iter())
                    .any(|&o| self.node_id_at(c + o) == Some(neighbor))
            })
            .collect()
    }

    /// Any cell within one step (diagonals included) of `cells` owned by `node`.
    fn touches_node(&self, cells: &[Cell], node: NodeId) -> bool {
        cells.iter().any(|&c| {
            std::iter::once(IVec2::ZERO)
                .chain(CARDINALS)
                .chain(DIAGONALS)
                .any(|o| self.node_id_at(c + o) == Some(node))
        })
    }

    fn lay_sections<P>(&self, line: &[Cell], footprint: Footprint, placement: &P, destination: NodeId) -> Vec<BridgeSection>
    where
        P: PlacementCheck + ?Sized,
    {
        let window = footprint.search_window();
        let mut covered: SparseCellIndex<()> = SparseCellIndex::new();
        let mut sections: Vec<BridgeSection> = Vec::new();

        for &cell in line {
            if covered.contains(cell) {
                continue;
            }
            let found = {
                let previous = sections.last();
                let fits = |center: Cell| {
                    let cells = footprint.cells_at(center);
                    let free = cells.iter().all(|&c| self.in_bounds(c) && !covered.contains(c));
                    let attached = previous.map_or(true, |p| sections_touch(&p.cells, &cells));
                    (free && attached && placement.can_place(center, &cells)).then_some((center, cells))
                };
                std::iter::once(IVec2::ZERO)
                    .chain(window.iter().copied())
                    .find_map(|offset| fits(cell + offset))
            };
            let Some((center, cells)) = found else {
                debug!("[BRIDGE] No legal position near {:?}, stopping", cell);
                break;
            };
            covered.set_many(cells.iter().copied(), ());
            let reached = self.touches_node(&cells, destination);
            sections.push(BridgeSection { center, cells });
            if reached {
                break;
            }
        }
        sections
    }
}

fn sections_touch(a: &[Cell], b: &[Cell]) -> bool {
    a.iter().any(|&x| b.iter().any(|&y| chebyshev(x, y) <= 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footprint_cells_are_centered() {
        let fp = Footprint::new(3, 3);
        let cells = fp.cells_at(IVec2::new(5, 5));
        assert_eq!(cells.len(), 9);
        assert_eq!(cells[0], IVec2::new(4, 4));
        assert_eq!(cells[8], IVec2::new(6, 6));

        let even = Footprint::new(2, 2).cells_at(IVec2::new(5, 5));
        assert_eq!(even, vec![IVec2::new(4, 4), IVec2::new(5, 4), IVec2::new(4, 5), IVec2::new(5, 5)]);
    }

    #[test]
    fn test_degenerate_footprint_is_one_cell() {
        let fp = Footprint::new(-1, 0);
        assert_eq!((fp.width(), fp.height()), (1, 1));
        assert_eq!(fp.area(), 1);
        assert_eq!(fp.cells_at(IVec2::new(3, 3)), vec![IVec2::new(3, 3)]);
        assert_eq!(fp.search_window().len(), 1);
    }

    #[test]
    fn test_search_window_is_bounded_and_nearest_first() {
        let window = Footprint::new(2, 2).search_window();
        assert_eq!(window.len(), 4);
        assert!(window.iter().all(|o| distance_squared(*o, IVec2::ZERO) == 1));

        let window = Footprint::new(3, 3).search_window();
        assert_eq!(window.len(), 9);
        assert!(!window.contains(&IVec2::ZERO));
        for pair in window.windows(2) {
            assert!(distance_squared(pair[0], IVec2::ZERO) <= distance_squared(pair[1], IVec2::ZERO));
        }
    }
}
