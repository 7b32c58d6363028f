use bevy::prelude::*;
use rstar::primitives::GeomWithData;
use rstar::RTree;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::game::collections::{GridMask, SparseCellIndex};
use crate::game::config::TerrainConfig;
use crate::game::math::{Cell, CARDINALS};
use crate::game::profiling::profile;
use crate::game::terrain::{ResourceKind, ResourceTile, TerrainSource};
use crate::profile_log;
use super::cluster::{ClusterId, ResourceCluster};

type ClusterPoint = GeomWithData<[i64; 2], ClusterId>;

/// Spatial index of resource clusters, keyed by their walkable centers.
pub struct ResourceClusterIndex {
    clusters: BTreeMap<ClusterId, ResourceCluster>,
    owners: SparseCellIndex<ClusterId>,
    tree: RTree<ClusterPoint>,
    pending: Vec<Cell>,
    tick: u64,
    wood_per_tree: u32,
}

impl Default for ResourceClusterIndex {
    fn default() -> Self {
        Self {
            clusters: BTreeMap::new(),
            owners: SparseCellIndex::new(),
            tree: RTree::new(),
            pending: Vec::new(),
            tick: 0,
            wood_per_tree: 0,
        }
    }
}

impl std::fmt::Debug for ResourceClusterIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceClusterIndex")
            .field("clusters", &self.clusters.len())
            .field("indexed_cells", &self.owners.len())
            .field("pending", &self.pending.len())
            .field("tick", &self.tick)
            .finish()
    }
}

impl ResourceClusterIndex {
    /// Scan the map block by block and aggregate nearby deposits.
    ///
    /// Every unclaimed resource cell in a block seeds a 4-connected fill that
    /// may spill half a block past the block edges and stops growing once it
    /// holds `resource_cluster_max_mineral_cells` mineral cells. All fills
    /// seeded in one block form that block's cluster. Cells are claimed by the
    /// first fill that reaches them, even if its cluster is later discarded.
    #[profile(20)]
    pub fn build<T: TerrainSource + ?Sized>(terrain: &T, config: &TerrainConfig) -> Self {
        let size = terrain.dimensions();
        let block = config.resource_cluster_size.max(1);
        let half = block / 2;
        let blocks = IVec2::new((size.x + block - 1) / block, (size.y + block - 1) / block);
        let mut claimed = GridMask::new(size.x, size.y);
        let mut index = Self {
            wood_per_tree: config.wood_per_tree,
            ..Default::default()
        };
        let mut next_id = 0;
        let mut discarded = 0;

        for by in 0..blocks.y {
            for bx in 0..blocks.x {
                let block_min = IVec2::new(bx, by) * block;
                let block_max = (block_min + IVec2::splat(block)).min(size);
                let grown_min = block_min - IVec2::splat(half);
                let grown_max = block_min + IVec2::splat(block + half);
                let in_grown = |c: Cell| c.x >= grown_min.x && c.y >= grown_min.y && c.x < grown_max.x && c.y < grown_max.y;

                let mut members: [Vec<Cell>; 3] = Default::default();
                for y in block_min.y..block_max.y {
                    for x in block_min.x..block_max.x {
                        let seed = IVec2::new(x, y);
                        if claimed.contains(seed) || !has_resource(terrain, seed) {
                            continue;
                        }
                        fill_deposit(
                            terrain,
                            seed,
                            &in_grown,
                            config.resource_cluster_max_mineral_cells,
                            &mut claimed,
                            &mut members,
                        );
                    }
                }
                if members.iter().all(Vec::is_empty) {
                    continue;
                }

                let mut cluster = ResourceCluster::new(ClusterId(next_id), IVec2::new(bx, by), members);
                cluster.recompute_amounts(terrain, config.wood_per_tree);
                if cluster.amount(ResourceKind::Wood) <= config.min_cluster_wood && !cluster.has_minerals() {
                    discarded += 1;
                    continue;
                }
                next_id += 1;
                cluster.place_center(terrain, block);
                index.owners.set_many(cluster.all_cells(), cluster.id);
                index.clusters.insert(cluster.id, cluster);
            }
        }

        let points = index
            .clusters
            .values()
            .map(|c| GeomWithData::new([c.center().x as i64, c.center().y as i64], c.id))
            .collect();
        index.tree = RTree::bulk_load(points);

        info!(
            "[CLUSTERS] Indexed {} resource clusters ({} too small, discarded)",
            index.clusters.len(),
            discarded
        );
        index
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn get(&self, id: ClusterId) -> Option<&ResourceCluster> {
        self.clusters.get(&id)
    }

    /// All clusters in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceCluster> {
        self.clusters.values()
    }

    pub fn cluster_at(&self, cell: Cell) -> Option<&ResourceCluster> {
        self.owners.get(cell).and_then(|id| self.clusters.get(id))
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Clusters whose center lies within `radius` (euclidean) of `point`,
    /// sorted by id.
    pub fn around_point(&self, point: Cell, radius: i32) -> Vec<&ResourceCluster> {
        let r = radius.max(0) as i64;
        let mut ids: Vec<ClusterId> = self
            .tree
            .locate_within_distance([point.x as i64, point.y as i64], r * r)
            .map(|entry| entry.data)
            .collect();
        ids.sort();
        ids.iter().filter_map(|id| self.clusters.get(id)).collect()
    }

    /// Queue cells whose resource contents changed; handled on the next tick.
    pub fn notify_changed(&mut self, cells: &[Cell]) {
        self.pending.extend_from_slice(cells);
    }

    /// Recompute amounts of every cluster touched by queued notifications.
    /// Returns how many clusters were recomputed.
    pub fn tick<T: TerrainSource + ?Sized>(&mut self, terrain: &T) -> usize {
        self.tick += 1;
        let dirty: BTreeSet<ClusterId> = self
            .pending
            .drain(..)
            .filter_map(|cell| self.owners.get(cell).copied())
            .collect();
        for id in &dirty {
            if let Some(cluster) = self.clusters.get_mut(id) {
                cluster.recompute_amounts(terrain, self.wood_per_tree);
            }
        }
        profile_log!(self.tick, "[CLUSTERS] tick {}: {} clusters recomputed", self.tick, dirty.len());
        dirty.len()
    }

    /// Recompute every cluster from the terrain regardless of notifications.
    pub fn recompute_all<T: TerrainSource + ?Sized>(&mut self, terrain: &T) {
        for cluster in self.clusters.values_mut() {
            cluster.recompute_amounts(terrain, self.wood_per_tree);
        }
    }
}

fn has_resource<T: TerrainSource + ?Sized>(terrain: &T, cell: Cell) -> bool {
    terrain.resource_tile(cell).is_some_and(|t| !t.is_empty())
}

fn add_member(members: &mut [Vec<Cell>; 3], cell: Cell, tile: ResourceTile) -> bool {
    if tile.has_wood() {
        members[ResourceKind::Wood.as_index()].push(cell);
    }
    match tile.mineral_kind() {
        Some(kind) => {
            members[kind.as_index()].push(cell);
            true
        }
        None => false,
    }
}

fn fill_deposit<T: TerrainSource + ?Sized>(
    terrain: &T,
    seed: Cell,
    in_grown: &impl Fn(Cell) -> bool,
    max_mineral_cells: usize,
    claimed: &mut GridMask,
    members: &mut [Vec<Cell>; 3],
) {
    let Some(tile) = terrain.resource_tile(seed) else {
        return;
    };
    claimed.insert(seed);
    let mut minerals = usize::from(add_member(members, seed, tile));
    let mut queue = VecDeque::from([seed]);

    'fill: while let Some(cell) = queue.pop_front() {
        for dir in CARDINALS {
            if minerals >= max_mineral_cells {
                break 'fill;
            }
            let next = cell + dir;
            if !in_grown(next) || claimed.contains(next) {
                continue;
            }
            let Some(tile) = terrain.resource_tile(next).filter(|t| !t.is_empty()) else {
                continue;
            };
            claimed.insert(next);
            minerals += usize::from(add_member(members, next, tile));
            queue.push_back(next);
        }
    }
}
