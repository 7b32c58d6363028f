//! Tests for graph construction, incremental repair and route queries.
//!
//! Maps are small TerrainSnapshots built by filling rectangles, so every
//! expected node count can be worked out by hand.

use super::*;
use bevy::math::IVec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use crate::game::config::TerrainConfig;
use crate::game::error::{GraphError, TerrainError};
use crate::game::map::TerrainSnapshot;
use crate::game::math::Cell;
use crate::game::terrain::{ResourceTile, TerrainSource, TileType};

fn build(snapshot: &TerrainSnapshot) -> NavigationGraph {
    NavigationGraph::build(snapshot, &TerrainConfig::default()).unwrap()
}

/// 30x20 grass map split by water in columns 10..15, top to bottom.
fn water_strip_map() -> TerrainSnapshot {
    let mut snapshot = TerrainSnapshot::new(30, 20, TileType::Grass);
    snapshot.fill_rect(IVec2::new(10, 0), IVec2::new(15, 20), TileType::Water);
    snapshot
}

/// Two 4x4 rock squares on one row with a 4-cell corridor between them.
fn two_rocks_map() -> TerrainSnapshot {
    let mut snapshot = TerrainSnapshot::new(30, 30, TileType::Grass);
    snapshot.fill_rect(IVec2::new(4, 12), IVec2::new(8, 16), TileType::Rock);
    snapshot.fill_rect(IVec2::new(12, 12), IVec2::new(16, 16), TileType::Rock);
    snapshot
}

fn random_map(seed: u64, size: i32) -> TerrainSnapshot {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut snapshot = TerrainSnapshot::new(size, size, TileType::Grass);
    for _ in 0..12 {
        let min = IVec2::new(rng.i32(0..size - 2), rng.i32(0..size - 2));
        let extent = IVec2::new(rng.i32(1..8), rng.i32(1..8));
        let tile = [TileType::Rock, TileType::Water, TileType::Cliff, TileType::Sand][rng.usize(0..4)];
        snapshot.fill_rect(min, min + extent, tile);
    }
    snapshot
}

fn rect(min: IVec2, max: IVec2) -> Vec<Cell> {
    (min.y..max.y)
        .flat_map(|y| (min.x..max.x).map(move |x| IVec2::new(x, y)))
        .collect()
}

fn assert_path_is_linked(graph: &NavigationGraph, path: &Path) {
    for pair in path.nodes.windows(2) {
        let node = graph.node(pair[0]).unwrap();
        assert!(node.is_linked_to(pair[1]), "path step {:?} -> {:?} is not a link", pair[0], pair[1]);
    }
}

/// Everything observable about a graph, in id order.
fn signature(graph: &NavigationGraph) -> Vec<(NodeId, NodeType, Vec<Cell>, Vec<(NodeId, u32)>)> {
    graph
        .nodes()
        .map(|n| {
            (
                n.id,
                n.node_type,
                n.region.cells().to_vec(),
                n.links.iter().map(|l| (l.target, l.weight)).collect(),
            )
        })
        .collect()
}

#[test]
fn test_open_map_is_one_walkable_node() {
    let mut graph = build(&TerrainSnapshot::new(20, 20, TileType::Grass));

    let stats = graph.stats();
    assert_eq!(stats.walkable, 1);
    assert_eq!(stats.gates, 0);
    assert_eq!(stats.unwalkable, 0);
    assert_eq!(graph.node_count(), 1);

    let path = graph
        .get_shortest_path(IVec2::new(0, 0), IVec2::new(19, 19), &[])
        .expect("corner to corner path");
    assert_eq!(path.len(), 1);
    assert_eq!(path.length, 0);

    let paths = graph.get_paths(IVec2::new(0, 0), IVec2::new(19, 19), &[], 10, 100);
    assert_eq!(paths.len(), 1);
}

#[test]
fn test_water_strip_blocks_unless_allowed() {
    let mut graph = build(&water_strip_map());
    assert_eq!(graph.stats().gates, 0);
    assert_eq!(graph.stats().walkable, 2);
    // Columns 10..12 and 12..15 fall in different 4-blocks, five rows of blocks each
    assert_eq!(graph.stats().unwalkable, 10);

    let from = IVec2::new(2, 10);
    let to = IVec2::new(25, 10);
    assert!(graph.get_shortest_path(from, to, &[]).is_none());
    assert!(graph.get_shortest_path(from, to, &[TileType::Rock]).is_none());

    let path = graph
        .get_shortest_path(from, to, &[TileType::Water])
        .expect("path across water");
    assert_eq!(path.start(), graph.node_id_at(from));
    assert_eq!(path.goal(), graph.node_id_at(to));
    assert!(path.len() >= 4);
    for id in &path.nodes[1..path.len() - 1] {
        let node = graph.node(*id).unwrap();
        assert_eq!(node.node_type, NodeType::Unwalkable);
        assert_eq!(node.tile_type, Some(TileType::Water));
    }
    assert_path_is_linked(&graph, &path);
}

#[test]
fn test_transition_weights_are_asymmetric() {
    let graph = build(&water_strip_map());
    let land = graph.node_id_at(IVec2::new(2, 2)).unwrap();
    let water = graph.node_id_at(IVec2::new(10, 2)).unwrap();
    let deep = graph.node_id_at(IVec2::new(12, 2)).unwrap();

    assert_eq!(graph.node(land).unwrap().link_to(water).unwrap().weight, 2);
    assert_eq!(graph.node(water).unwrap().link_to(land).unwrap().weight, 1);
    assert_eq!(graph.node(water).unwrap().link_to(deep).unwrap().weight, 2);
    assert_eq!(link_weight(NodeType::Gate, NodeType::Walkable), 1);
}

#[test]
fn test_gate_between_nearby_rocks() {
    let graph = build(&two_rocks_map());
    let stats = graph.stats();
    assert_eq!(stats.unwalkable, 2);
    // One gate across the corridor, one from the west rock to the west border
    assert_eq!(stats.gates, 2);
    assert_eq!(stats.walkable, 1);

    let corridor = graph.get_map_node(IVec2::new(9, 12)).unwrap();
    assert_eq!(corridor.node_type, NodeType::Gate);
    assert_eq!(corridor.region.len(), 4);
    let west_rock = graph.node_id_at(IVec2::new(5, 13)).unwrap();
    let east_rock = graph.node_id_at(IVec2::new(13, 13)).unwrap();
    assert!(corridor.is_linked_to(west_rock));
    assert!(corridor.is_linked_to(east_rock));
    assert_eq!(corridor.link_to(west_rock).unwrap().weight, 2);

    let border = graph.get_map_node(IVec2::new(1, 12)).unwrap();
    assert_eq!(border.node_type, NodeType::Gate);
    assert!(border.region.has_cell(IVec2::new(0, 12)));
    assert!(graph.get_map_node(IVec2::new(20, 12)).is_some_and(|n| n.node_type == NodeType::Walkable));
}

#[test]
fn test_every_cell_owned_once_on_random_maps() {
    for seed in [1, 7, 42] {
        let snapshot = random_map(seed, 48);
        let graph = build(&snapshot);
        graph.check_consistency().unwrap();
        for y in 0..48 {
            for x in 0..48 {
                let cell = IVec2::new(x, y);
                let node = graph.get_map_node(cell).expect("every cell has an owner");
                assert!(node.region.has_cell(cell));
                assert_eq!(node.node_type == NodeType::Unwalkable, !snapshot.is_walkable(cell));
            }
        }
    }
}

#[test]
fn test_build_is_deterministic() {
    let snapshot = random_map(99, 40);
    let first = build(&snapshot);
    let second = build(&snapshot);
    assert_eq!(signature(&first), signature(&second));
}

#[test]
fn test_paths_exist_everywhere_when_all_terrain_allowed() {
    let snapshot = random_map(5, 40);
    let mut graph = build(&snapshot);
    let mut rng = fastrand::Rng::with_seed(5);
    for _ in 0..20 {
        let from = IVec2::new(rng.i32(0..40), rng.i32(0..40));
        let to = IVec2::new(rng.i32(0..40), rng.i32(0..40));
        let path = graph
            .get_shortest_path(from, to, &TileType::ALL)
            .expect("graph covers the whole map");
        assert_eq!(path.start(), graph.node_id_at(from));
        assert_eq!(path.goal(), graph.node_id_at(to));
        assert_path_is_linked(&graph, &path);
    }
}

#[test]
fn test_get_paths_are_bounded_and_distinct() {
    let mut graph = build(&water_strip_map());
    let from = IVec2::new(2, 10);
    let to = IVec2::new(25, 10);

    let shortest = graph.get_shortest_path(from, to, &[TileType::Water]).unwrap();
    let paths = graph.get_paths(from, to, &[TileType::Water], 10, 100);
    assert!(paths.len() > 1 && paths.len() <= 10);
    assert_eq!(paths[0].nodes, shortest.nodes);
    // Inflation pushes the second route through water the first one avoided
    assert!(paths[1].nodes.iter().any(|id| {
        !paths[0].nodes.contains(id) && graph.node(*id).is_some_and(|n| n.tile_type == Some(TileType::Water))
    }));
    for (i, a) in paths.iter().enumerate() {
        assert_path_is_linked(&graph, a);
        for b in &paths[i + 1..] {
            assert_ne!(a.nodes, b.nodes);
        }
    }

    assert!(graph.get_paths(from, to, &[TileType::Water], 2, 100).len() <= 2);
    assert!(graph.get_paths(from, to, &[], 10, 100).is_empty());
}

#[test]
fn test_unowned_endpoint_is_no_path() {
    let mut graph = build(&TerrainSnapshot::new(10, 10, TileType::Grass));
    assert!(graph.get_shortest_path(IVec2::new(-1, 0), IVec2::new(5, 5), &[]).is_none());
    assert!(graph.get_paths(IVec2::new(5, 5), IVec2::new(10, 10), &[], 10, 100).is_empty());
}

#[test]
fn test_add_node_shrinks_walkable_region() {
    let mut graph = build(&TerrainSnapshot::new(20, 20, TileType::Grass));
    let field = graph.node_id_at(IVec2::new(0, 0)).unwrap();
    let footprint = rect(IVec2::new(5, 5), IVec2::new(8, 8));

    let building = graph.add_node(&footprint, NodeType::Unwalkable).unwrap();
    graph.check_consistency().unwrap();

    for &cell in &footprint {
        let node = graph.get_map_node(cell).unwrap();
        assert_eq!(node.id, building);
        assert!(node.region.has_cell(cell));
    }
    let field_node = graph.node(field).unwrap();
    assert_eq!(field_node.region.len(), 400 - 9);
    assert!(!field_node.region.has_cell(IVec2::new(6, 6)));
    assert_eq!(field_node.links.len(), 1);
    assert_eq!(field_node.link_to(building).unwrap().weight, 2);
    assert_eq!(graph.node(building).unwrap().tile_type, None);
}

#[test]
fn test_add_node_repeated_is_stable() {
    let mut graph = build(&TerrainSnapshot::new(20, 20, TileType::Grass));
    let footprint = rect(IVec2::new(2, 2), IVec2::new(4, 5));

    let first = graph.add_node(&footprint, NodeType::Unwalkable).unwrap();
    let count = graph.node_count();
    let second = graph.add_node(&footprint, NodeType::Unwalkable).unwrap();

    assert_ne!(first, second, "ids are never reused");
    assert!(graph.node(first).is_none());
    assert_eq!(graph.node_count(), count);
    assert_eq!(graph.get_map_node(IVec2::new(3, 4)).unwrap().id, second);
    graph.check_consistency().unwrap();
}

#[test]
fn test_add_node_ignores_out_of_bounds_and_duplicates() {
    let mut graph = build(&TerrainSnapshot::new(10, 10, TileType::Grass));
    assert_eq!(graph.add_node(&[IVec2::new(-1, 0), IVec2::new(10, 3)], NodeType::Unwalkable), None);

    let id = graph
        .add_node(&[IVec2::new(1, 1), IVec2::new(1, 1), IVec2::new(50, 50)], NodeType::Unwalkable)
        .unwrap();
    assert_eq!(graph.node(id).unwrap().region.len(), 1);
    graph.check_consistency().unwrap();
}

#[test]
fn test_building_over_water_drops_old_nodes_and_blocks() {
    let mut graph = build(&water_strip_map());
    let strip = rect(IVec2::new(10, 0), IVec2::new(15, 20));
    let old_water: Vec<NodeId> = graph.get_all_nodes(NodeType::Unwalkable).iter().map(|n| n.id).collect();

    let wall = graph.add_node(&strip, NodeType::Unwalkable).unwrap();
    graph.check_consistency().unwrap();
    for id in old_water {
        assert!(graph.node(id).is_none());
    }
    assert_eq!(graph.get_all_nodes(NodeType::Unwalkable).len(), 1);
    assert_eq!(graph.node(wall).unwrap().links.len(), 2);

    // Building footprints have no terrain type, so no allow-list opens them
    assert!(graph
        .get_shortest_path(IVec2::new(2, 10), IVec2::new(25, 10), &TileType::ALL)
        .is_none());

    // Tearing the wall down reconnects both sides
    let bridge = graph.add_node(&strip, NodeType::Walkable).unwrap();
    let path = graph
        .get_shortest_path(IVec2::new(2, 10), IVec2::new(25, 10), &[])
        .unwrap();
    assert_eq!(path.len(), 3);
    assert_eq!(path.nodes[1], bridge);
}

#[test]
fn test_wall_splits_walkable_region() {
    let mut graph = build(&TerrainSnapshot::new(20, 20, TileType::Grass));
    let field = graph.node_id_at(IVec2::new(0, 0)).unwrap();
    let wall_cells = rect(IVec2::new(10, 0), IVec2::new(11, 20));

    let wall = graph.add_node(&wall_cells, NodeType::Unwalkable).unwrap();
    graph.check_consistency().unwrap();

    assert_eq!(graph.get_all_nodes(NodeType::Walkable).len(), 2);
    let west = graph.node_id_at(IVec2::new(0, 0)).unwrap();
    let east = graph.node_id_at(IVec2::new(19, 19)).unwrap();
    assert_eq!(west, field, "the piece holding the first cell keeps the id");
    assert_ne!(east, west);
    assert_eq!(graph.node(west).unwrap().region.len(), 200);
    assert_eq!(graph.node(east).unwrap().region.len(), 180);
    assert_eq!(graph.node(west).unwrap().region.center(), IVec2::new(5, 10));
    assert!(!graph.node(west).unwrap().is_linked_to(east));
    assert!(graph.node(east).unwrap().is_linked_to(wall));
    assert!(graph
        .get_shortest_path(IVec2::new(0, 0), IVec2::new(19, 19), &TileType::ALL)
        .is_none());

    // Opening the wall up again joins both sides through the new ground
    let opening = graph.add_node(&wall_cells, NodeType::Walkable).unwrap();
    graph.check_consistency().unwrap();
    let path = graph
        .get_shortest_path(IVec2::new(0, 0), IVec2::new(19, 19), &[])
        .unwrap();
    assert_eq!(path.nodes, vec![west, opening, east]);
}

#[test]
fn test_corner_contact_links_diagonally() {
    let mut graph = NavigationGraph::new(IVec2::new(4, 4), 10);
    let field = graph.create_node(NodeType::Walkable, None, [IVec2::new(0, 0)]);
    let rock = graph.create_node(NodeType::Unwalkable, Some(TileType::Rock), [IVec2::new(1, 1)]);
    graph.link_all();

    assert_eq!(graph.node(field).unwrap().link_to(rock).map(|l| l.weight), Some(2));
    assert_eq!(graph.node(rock).unwrap().link_to(field).map(|l| l.weight), Some(1));
    graph.check_consistency().unwrap();
}

#[test]
fn test_consistency_check_names_the_broken_invariant() {
    let mut graph = NavigationGraph::new(IVec2::new(4, 4), 10);
    let a = graph.create_node(NodeType::Walkable, None, [IVec2::new(0, 0)]);
    let b = graph.create_node(NodeType::Walkable, None, [IVec2::new(1, 0)]);
    graph.check_consistency().unwrap();

    graph.nodes.get_mut(&a).unwrap().links.push(Link { target: b, weight: 1 });
    assert_eq!(graph.check_consistency(), Err(GraphError::OneWayLink { from: a, to: b }));

    graph.nodes.get_mut(&a).unwrap().links.clear();
    graph.index.delete(IVec2::new(1, 0));
    assert_eq!(
        graph.check_consistency(),
        Err(GraphError::MisindexedCell { cell: IVec2::new(1, 0), node: b, indexed: None })
    );
}

#[test]
fn test_cleanup_merges_dead_ends_into_walkable_neighbor() {
    let mut graph = NavigationGraph::new(IVec2::new(10, 10), 10);
    let field = graph.create_node(NodeType::Walkable, None, rect(IVec2::new(0, 0), IVec2::new(10, 5)));
    let pocket = graph.create_node(NodeType::Walkable, None, [IVec2::new(0, 5), IVec2::new(1, 5)]);
    let gate = graph.create_node(NodeType::Gate, None, [IVec2::new(8, 5), IVec2::new(9, 5)]);
    let rock = graph.create_node(NodeType::Unwalkable, Some(TileType::Rock), rect(IVec2::new(4, 5), IVec2::new(6, 7)));
    // Small, but its only neighbor is the rock
    let ledge = graph.create_node(NodeType::Walkable, None, [IVec2::new(4, 7)]);
    graph.link_all();

    let before = graph.node_count();
    let merged = graph.cleanup();
    graph.rebuild_index();

    assert_eq!(merged, 2);
    assert_eq!(graph.node_count(), before - 2);
    assert!(graph.node(pocket).is_none());
    assert!(graph.node(gate).is_none());
    assert!(graph.node(ledge).is_some());
    assert!(graph.node(rock).is_some());
    assert_eq!(graph.node_id_at(IVec2::new(9, 5)), Some(field));
    assert_eq!(graph.node(field).unwrap().region.len(), 54);
    graph.check_consistency().unwrap();
}

#[test]
fn test_malformed_terrain_is_rejected() {
    struct Holey;
    impl TerrainSource for Holey {
        fn dimensions(&self) -> IVec2 {
            IVec2::new(4, 4)
        }
        fn tile_type(&self, cell: Cell) -> Option<TileType> {
            (cell != IVec2::new(2, 3)).then_some(TileType::Grass)
        }
        fn resource_tile(&self, _cell: Cell) -> Option<ResourceTile> {
            None
        }
    }

    let config = TerrainConfig::default();
    assert_eq!(
        NavigationGraph::build(&Holey, &config).unwrap_err(),
        TerrainError::MissingTile { x: 2, y: 3 }
    );
    assert!(matches!(
        NavigationGraph::build(&TerrainSnapshot::new(0, 5, TileType::Grass), &config),
        Err(TerrainError::InvalidDimensions { .. })
    ));
}

#[test]
fn test_bridge_across_water() {
    let mut graph = build(&water_strip_map());
    let path = graph
        .get_shortest_path(IVec2::new(2, 10), IVec2::new(25, 10), &[TileType::Water])
        .unwrap();
    let anywhere = |_center: Cell, _cells: &[Cell]| true;
    let mut rng = StdRng::seed_from_u64(7);

    let plan = graph
        .connect_map_nodes_by_bridge(&path, Footprint::new(1, 1), &anywhere, &mut rng, 3)
        .expect("bridge plan");
    assert!(plan.complete);
    assert_eq!(Some(plan.source), path.start());
    assert_eq!(Some(plan.destination), path.goal());
    // Five water columns, starting from a land cell next to the strip
    assert!(plan.sections.len() >= 5);
    for pair in plan.sections.windows(2) {
        assert!(pair[0].cells.iter().all(|c| !pair[1].cells.contains(c)));
    }
}

#[test]
fn test_bridge_blocked_placement_yields_nothing() {
    let mut graph = build(&water_strip_map());
    let path = graph
        .get_shortest_path(IVec2::new(2, 10), IVec2::new(25, 10), &[TileType::Water])
        .unwrap();
    let nowhere = |_center: Cell, _cells: &[Cell]| false;
    let mut rng = StdRng::seed_from_u64(7);
    assert!(graph
        .connect_map_nodes_by_bridge(&path, Footprint::new(2, 2), &nowhere, &mut rng, 3)
        .is_none());
}

#[test]
fn test_bridge_partial_when_far_side_is_illegal() {
    let mut graph = build(&water_strip_map());
    let path = graph
        .get_shortest_path(IVec2::new(2, 10), IVec2::new(25, 10), &[TileType::Water])
        .unwrap();
    let west_only = |_center: Cell, cells: &[Cell]| cells.iter().all(|c| c.x < 12);
    let mut rng = StdRng::seed_from_u64(3);

    let plan = graph
        .connect_map_nodes_by_bridge(&path, Footprint::new(1, 1), &west_only, &mut rng, 3)
        .expect("partial plan");
    assert!(!plan.complete);
    assert!(!plan.sections.is_empty());
    assert!(plan.sections.iter().all(|s| s.center.x < 12));
}

#[test]
fn test_bridge_needs_an_unwalkable_crossing() {
    let mut graph = build(&TerrainSnapshot::new(20, 20, TileType::Grass));
    let path = graph.get_shortest_path(IVec2::new(0, 0), IVec2::new(19, 19), &[]).unwrap();
    let anywhere = |_center: Cell, _cells: &[Cell]| true;
    let mut rng = StdRng::seed_from_u64(1);
    assert!(graph
        .connect_map_nodes_by_bridge(&path, Footprint::new(1, 1), &anywhere, &mut rng, 3)
        .is_none());
}
