use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::game::collections::SparseCellIndex;
use crate::game::math::{centroid, distance_squared, Cell};
use crate::game::terrain::{ResourceKind, TerrainSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClusterId(pub u32);

/// Resource deposits found around one cluster block.
///
/// Cell lists are fixed at build time; amounts are cached and recomputed
/// from the terrain after change notifications.
#[derive(Clone, Debug)]
pub struct ResourceCluster {
    pub id: ClusterId,
    /// Block coordinates (not cells) of the block whose fills formed this cluster.
    pub block: IVec2,
    cells: [Vec<Cell>; 3],
    amounts: [u32; 3],
    center: Cell,
}

impl ResourceCluster {
    pub(crate) fn new(id: ClusterId, block: IVec2, cells: [Vec<Cell>; 3]) -> Self {
        Self {
            id,
            block,
            cells,
            amounts: [0; 3],
            center: IVec2::ZERO,
        }
    }

    pub fn cells(&self, kind: ResourceKind) -> &[Cell] {
        &self.cells[kind.as_index()]
    }

    /// Every cell of the cluster, each once, wood cells first.
    pub fn all_cells(&self) -> Vec<Cell> {
        let mut all: Vec<Cell> = self.cells.iter().flatten().copied().collect();
        let mut seen = SparseCellIndex::with_capacity(all.len());
        all.retain(|&c| seen.set(c, ()).is_none());
        all
    }

    #[inline]
    pub fn amount(&self, kind: ResourceKind) -> u32 {
        self.amounts[kind.as_index()]
    }

    pub fn has_minerals(&self) -> bool {
        ResourceKind::ALL
            .iter()
            .any(|&kind| kind.is_mineral() && self.amount(kind) > 0)
    }

    /// Walkable cell closest to the cluster centroid.
    pub fn center(&self) -> Cell {
        self.center
    }

    /// Re-read every member cell from the terrain.
    pub(crate) fn recompute_amounts<T: TerrainSource + ?Sized>(&mut self, terrain: &T, wood_per_tree: u32) {
        let mut amounts = [0u32; 3];
        for &cell in self.cells(ResourceKind::Wood) {
            if let Some(tile) = terrain.resource_tile(cell) {
                amounts[ResourceKind::Wood.as_index()] =
                    amounts[ResourceKind::Wood.as_index()].saturating_add(tile.trees.saturating_mul(wood_per_tree));
            }
        }
        for kind in [ResourceKind::Metal, ResourceKind::Gold] {
            for &cell in self.cells(kind) {
                if let Some((found, amount)) = terrain.resource_tile(cell).and_then(|t| t.mineral) {
                    if found == kind {
                        amounts[kind.as_index()] = amounts[kind.as_index()].saturating_add(amount);
                    }
                }
            }
        }
        self.amounts = amounts;
    }

    pub(crate) fn place_center<T: TerrainSource + ?Sized>(&mut self, terrain: &T, search_radius: i32) {
        let mean = centroid(&self.all_cells());
        self.center = nearest_walkable(terrain, mean, search_radius).unwrap_or(mean);
    }
}

/// Search square rings around `origin` outwards; the first ring holding a
/// walkable cell yields its euclidean-closest one.
pub(crate) fn nearest_walkable<T: TerrainSource + ?Sized>(terrain: &T, origin: Cell, max_radius: i32) -> Option<Cell> {
    for r in 0..=max_radius.max(0) {
        let mut best: Option<Cell> = None;
        for dy in -r..=r {
            for dx in -r..=r {
                if dx.abs() != r && dy.abs() != r {
                    continue;
                }
                let cell = origin + IVec2::new(dx, dy);
                if !terrain.is_walkable(cell) {
                    continue;
                }
                if best.map_or(true, |b| distance_squared(cell, origin) < distance_squared(b, origin)) {
                    best = Some(cell);
                }
            }
        }
        if best.is_some() {
            return best;
        }
    }
    None
}
