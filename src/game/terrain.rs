use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::game::math::Cell;

/// Terrain type of a single tile. Immutable for the lifetime of a scenario.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TileType {
    Grass,
    Sand,
    Road,
    Water,
    Rock,
    Cliff,
}

impl TileType {
    pub const ALL: [TileType; 6] = [
        TileType::Grass,
        TileType::Sand,
        TileType::Road,
        TileType::Water,
        TileType::Rock,
        TileType::Cliff,
    ];

    #[inline]
    pub fn is_walkable(self) -> bool {
        matches!(self, TileType::Grass | TileType::Sand | TileType::Road)
    }
}

/// Deposit kind a cluster aggregates cells of.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Wood,
    Metal,
    Gold,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [ResourceKind::Wood, ResourceKind::Metal, ResourceKind::Gold];

    #[inline]
    pub fn as_index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn is_mineral(self) -> bool {
        !matches!(self, ResourceKind::Wood)
    }
}

/// Resource contents of one tile: trees and/or a mineral deposit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTile {
    pub trees: u32,
    /// Mineral kind (`Metal` or `Gold`) and remaining amount.
    pub mineral: Option<(ResourceKind, u32)>,
}

impl ResourceTile {
    pub fn forest(trees: u32) -> Self {
        Self { trees, mineral: None }
    }

    pub fn deposit(kind: ResourceKind, amount: u32) -> Self {
        Self { trees: 0, mineral: Some((kind, amount)) }
    }

    #[inline]
    pub fn has_wood(&self) -> bool {
        self.trees > 0
    }

    #[inline]
    pub fn mineral_kind(&self) -> Option<ResourceKind> {
        self.mineral.filter(|&(_, amount)| amount > 0).map(|(kind, _)| kind)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.has_wood() && self.mineral_kind().is_none()
    }
}

/// Read access to the live terrain, provided by the host simulation.
///
/// Coordinates outside `0..width` × `0..height` must return `None`.
pub trait TerrainSource {
    fn dimensions(&self) -> IVec2;

    fn tile_type(&self, cell: Cell) -> Option<TileType>;

    fn resource_tile(&self, cell: Cell) -> Option<ResourceTile>;

    #[inline]
    fn in_bounds(&self, cell: Cell) -> bool {
        let size = self.dimensions();
        cell.x >= 0 && cell.y >= 0 && cell.x < size.x && cell.y < size.y
    }

    /// In bounds and of a walkable tile type.
    #[inline]
    fn is_walkable(&self, cell: Cell) -> bool {
        self.tile_type(cell).is_some_and(TileType::is_walkable)
    }
}
