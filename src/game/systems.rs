use bevy::prelude::*;

use crate::game::analysis::TerrainAnalysis;
use crate::game::map::TerrainSnapshot;
use crate::game::math::Cell;
use crate::game::pathfinding::NodeType;

/// A building appeared on, or disappeared from, these cells.
#[derive(Message, Debug, Clone)]
pub struct FootprintChanged {
    pub cells: Vec<Cell>,
    pub node_type: NodeType,
}

/// Resource contents of these cells changed (harvested, regrown, depleted).
#[derive(Message, Debug, Clone)]
pub struct ResourceTilesChanged {
    pub cells: Vec<Cell>,
}

/// Feeds host-side terrain changes into the [`TerrainAnalysis`] resource on
/// every fixed tick. Both systems are no-ops until the analysis is inserted.
pub struct TerrainAnalysisPlugin;

impl Plugin for TerrainAnalysisPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<FootprintChanged>();
        app.add_message::<ResourceTilesChanged>();
        app.add_systems(
            FixedUpdate,
            (apply_footprint_changes, apply_resource_changes).chain(),
        );
    }
}

pub fn apply_footprint_changes(
    analysis: Option<ResMut<TerrainAnalysis>>,
    mut changes: MessageReader<FootprintChanged>,
) {
    let Some(mut analysis) = analysis else {
        changes.clear();
        return;
    };
    for change in changes.read() {
        if analysis.add_node(&change.cells, change.node_type).is_none() {
            warn!("[TERRAIN] Footprint change with no in-bounds cells ignored");
        }
    }
}

pub fn apply_resource_changes(
    analysis: Option<ResMut<TerrainAnalysis>>,
    terrain: Option<Res<TerrainSnapshot>>,
    mut changes: MessageReader<ResourceTilesChanged>,
) {
    let (Some(mut analysis), Some(terrain)) = (analysis, terrain) else {
        changes.clear();
        return;
    };
    for change in changes.read() {
        analysis.notify_resource_changed(&change.cells);
    }
    analysis.tick(&*terrain);
}
