//! Candidate ranking.
//!
//! [`prioritize`] is generic; the functions below it are the reward and
//! validity strategies the planner plugs into it.

use std::cmp::Reverse;

use crate::{
    Obstacle, Position, RANKING_OFFSET, Tool,
    search::{
        find::harbour_tiles,
        heuristic::distance,
        path::{Avoid, find_path},
    },
    tile::TileId,
    world::WorldMap,
};

/// Drops invalid candidates and orders the rest by descending reward. The sort
/// is stable, so equal rewards keep their candidate order.
pub fn prioritize<R, V>(candidates: &[TileId], reward: R, is_valid: V) -> Vec<TileId>
where
    R: Fn(TileId) -> i32,
    V: Fn(TileId) -> bool,
{
    let mut scored: Vec<(TileId, i32)> = candidates
        .iter()
        .copied()
        .filter(|id| is_valid(*id))
        .map(|id| (id, reward(id)))
        .collect();
    scored.sort_by_key(|(_, reward)| Reverse(*reward));
    scored.into_iter().map(|(id, _)| id).collect()
}

/// Every candidate is acceptable.
pub fn always(_: TileId) -> bool {
    true
}

/// Turn-aware distance from the player to `id`.
pub fn player_distance(world: &WorldMap, id: TileId) -> i32 {
    let player = world.player();
    distance(
        world.player_tile().position(),
        world.tile(id).position(),
        player.facing,
    )
}

/// `numerator / distance`, leaving the numerator undivided when the
/// candidate is the player's own tile.
fn per_distance(world: &WorldMap, numerator: i32, id: TileId) -> i32 {
    match player_distance(world, id) {
        0 => numerator,
        d => numerator / d,
    }
}

/// Cells around `id` that are unknown or not yet explored.
pub fn unexplored_nearby(world: &WorldMap, id: TileId) -> i32 {
    let radius = world.config().reward_radius();
    let centre = world.tile(id).position();
    let mut count = 0;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if world.get(centre.offset(dx, dy)).is_none_or(|tile| !tile.explored) {
                count += 1;
            }
        }
    }
    count
}

pub fn unexplored_reward(world: &WorldMap, id: TileId) -> i32 {
    per_distance(world, unexplored_nearby(world, id), id)
}

/// Favours large, little explored bodies of water touching many zones.
/// Only the zone-count term is scaled by distance. When carrying gold, water
/// touching the home zone jumps ahead of everything else.
pub fn coastal_reward(world: &WorldMap, id: TileId) -> i32 {
    let zone = world.zone_tiles(id);
    let explored = zone.iter().filter(|tile| world.tile(**tile).explored).count();
    let unexplored = (zone.len() - explored) as i32;
    let borders = world.adjacent_zone_count(id) as i32 - 1;

    let mut reward = unexplored + per_distance(world, borders, id);
    if world.player().has(Tool::Gold)
        && world
            .home_zone()
            .is_some_and(|home| world.is_adjacent_to_zone(id, home))
    {
        reward += RANKING_OFFSET;
    }
    reward
}

pub fn harbour_reward(world: &WorldMap, id: TileId) -> i32 {
    let mut reward = unexplored_nearby(world, id) + world.zone_reward(id);
    if world.tile(id).obstacle == Obstacle::Tree {
        reward -= RANKING_OFFSET;
    }
    reward
}

/// With `must_escape` set, only accepts landings from which the player could
/// build another raft or lay stones back out.
pub fn harbour_valid(world: &WorldMap, id: TileId, must_escape: bool) -> bool {
    if !must_escape {
        return true;
    }
    let trees = world.obstacles_in_zone(id, Obstacle::Tree);
    let is_tree = world.tile(id).obstacle == Obstacle::Tree;
    (is_tree && trees > 1) || (!is_tree && trees > 0) || world.tools_in_zone(id, Tool::Stone) > 0
}

pub fn home_harbour_reward(world: &WorldMap, id: TileId) -> i32 {
    per_distance(world, 1, id)
}

/// Best value of bridging from the coastal tile `id` to a landing outside the
/// player's zone with the stones in hand, or `None` when no such landing exists.
pub fn stone_target_reward(world: &WorldMap, id: TileId) -> Option<i32> {
    let stones = world.player().count(Tool::Stone) as usize;
    let own_zone = world.player_tile().zone;
    let avoid = Avoid {
        water: false,
        trees: true,
        stones: true,
    };

    harbour_tiles(world, id, true)
        .into_iter()
        .filter(|harbour| world.tile(*harbour).zone != own_zone)
        .filter_map(|harbour| {
            let path = find_path(world, id, harbour, avoid)?;
            (path.len() - 1 <= stones).then(|| {
                (world.zone_reward(harbour) + world.zone_size(harbour) as i32) / path.len() as i32
            })
        })
        .max()
}

/// Nearest first, by turn-aware distance.
pub fn nearest_reward(world: &WorldMap, id: TileId) -> i32 {
    -player_distance(world, id)
}

/// Positions of `ids`, for log output.
pub fn positions(world: &WorldMap, ids: &[TileId]) -> Vec<Position> {
    ids.iter().map(|id| world.tile(*id).position()).collect()
}
