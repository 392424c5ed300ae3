//! Zone bookkeeping for [`WorldMap`].
//!
//! A zone is the id shared by a connected run of tiles in the same
//! [`ZoneCategory`](crate::ZoneCategory). Ids are handed out when a tile is
//! inserted and coarsened by flood-fill merges whenever a new tile bridges
//! two regions. Zones never split, so an id may cover tiles that a later
//! stone placement disconnected.

use std::collections::{BTreeSet, HashSet, VecDeque};

use tracing::trace;

use crate::{
    Obstacle, Position, Tool,
    tile::{TileId, ZoneId},
    world::WorldMap,
};

impl WorldMap {
    fn fresh_zone(&mut self) -> ZoneId {
        let zone = ZoneId(self.next_zone);
        self.next_zone += 1;
        zone
    }

    /// Gives `id` a zone consistent with its current obstacle and merges every
    /// compatible neighbouring region into it.
    ///
    /// Called on insertion and again when a stone turns water into land.
    pub(crate) fn settle_zone(&mut self, id: TileId) {
        let category = self.tile(id).category();
        let inherited = self
            .tile(id)
            .neighbours()
            .map(|neighbour| self.tile(neighbour))
            .find(|neighbour| {
                neighbour.category() == category && neighbour.zone != ZoneId::UNASSIGNED
            })
            .map(|neighbour| neighbour.zone);

        let zone = match inherited {
            Some(zone) => zone,
            None => self.fresh_zone(),
        };
        self.tile_mut(id).zone = zone;

        let stale = self.tile(id).neighbours().any(|neighbour| {
            let neighbour = self.tile(neighbour);
            neighbour.category() == category && neighbour.zone != zone
        });
        if stale {
            self.merge_into(id, zone);
        }
    }

    /// Flood-fills out of `origin` through compatible tiles carrying any other
    /// id, retagging them to `zone`.
    fn merge_into(&mut self, origin: TileId, zone: ZoneId) {
        let category = self.tile(origin).category();
        let mut visited = HashSet::from([origin]);
        let mut queue = VecDeque::from([origin]);
        let mut retagged = 0usize;

        while let Some(id) = queue.pop_front() {
            let neighbours: Vec<TileId> = self.tile(id).neighbours().collect();
            for neighbour in neighbours {
                let tile = self.tile(neighbour);
                if tile.category() != category || tile.zone == zone || !visited.insert(neighbour) {
                    continue;
                }
                self.tile_mut(neighbour).zone = zone;
                retagged += 1;
                queue.push_back(neighbour);
            }
        }

        if retagged > 0 {
            self.zone_merges += 1;
            trace!(?zone, retagged, "merged zones");
        }
    }

    /// Every tile sharing `seed`'s zone, in breadth-first order from `seed`.
    pub fn zone_tiles(&self, seed: TileId) -> Vec<TileId> {
        let zone = self.tile(seed).zone;
        let mut visited = HashSet::from([seed]);
        let mut queue = VecDeque::from([seed]);
        let mut tiles = Vec::new();

        while let Some(id) = queue.pop_front() {
            tiles.push(id);
            for neighbour in self.tile(id).neighbours() {
                if self.tile(neighbour).zone == zone && visited.insert(neighbour) {
                    queue.push_back(neighbour);
                }
            }
        }
        tiles
    }

    pub fn zone_size(&self, seed: TileId) -> usize {
        self.zone_tiles(seed).len()
    }

    /// Sum of the rewards of every tool still lying in `seed`'s zone.
    pub fn zone_reward(&self, seed: TileId) -> i32 {
        self.zone_tiles(seed)
            .into_iter()
            .filter_map(|id| self.tile(id).tool)
            .map(Tool::reward)
            .sum()
    }

    /// Number of distinct zones bordering `seed`'s zone.
    pub fn adjacent_zone_count(&self, seed: TileId) -> usize {
        self.bordering_zones(seed).len()
    }

    /// Whether any tile of `seed`'s zone touches a tile of `zone`.
    pub fn is_adjacent_to_zone(&self, seed: TileId, zone: ZoneId) -> bool {
        self.bordering_zones(seed).contains(&zone)
    }

    fn bordering_zones(&self, seed: TileId) -> BTreeSet<ZoneId> {
        let own = self.tile(seed).zone;
        self.zone_tiles(seed)
            .into_iter()
            .flat_map(|id| self.tile(id).neighbours())
            .map(|neighbour| self.tile(neighbour).zone)
            .filter(|zone| *zone != own)
            .collect()
    }

    pub fn obstacles_in_zone(&self, seed: TileId, obstacle: Obstacle) -> usize {
        self.zone_tiles(seed)
            .into_iter()
            .filter(|id| self.tile(*id).obstacle == obstacle)
            .count()
    }

    pub fn tools_in_zone(&self, seed: TileId, tool: Tool) -> usize {
        self.zone_tiles(seed)
            .into_iter()
            .filter(|id| self.tile(*id).tool == Some(tool))
            .count()
    }

    /// Zone of the spawn tile.
    pub fn home_zone(&self) -> Option<ZoneId> {
        self.get(Position::HOME).map(|tile| tile.zone)
    }
}
