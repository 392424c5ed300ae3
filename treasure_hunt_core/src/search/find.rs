//! Breadth-first candidate discovery.
//!
//! Every finder is the same flood fill with a different pair of predicates:
//! one deciding which visited tiles are returned, the other deciding which
//! edges the fill may cross.

use std::collections::{HashSet, VecDeque};

use crate::{
    Obstacle, Position, Tool,
    tile::{Tile, TileId, ZoneId},
    world::WorldMap,
};

/// Flood-fills from `origin`, crossing an edge `from -> to` only when
/// `is_traversable(from, to)` holds, and returns every visited tile for which
/// `is_match` holds, in visit order. The origin itself is always visited.
pub fn find<M, T>(
    world: &WorldMap,
    origin: TileId,
    is_match: M,
    is_traversable: T,
) -> Vec<TileId>
where
    M: Fn(&Tile) -> bool,
    T: Fn(&Tile, &Tile) -> bool,
{
    let mut visited = HashSet::from([origin]);
    let mut queue = VecDeque::from([origin]);
    let mut matches = Vec::new();

    while let Some(id) = queue.pop_front() {
        let tile = world.tile(id);
        if is_match(tile) {
            matches.push(id);
        }
        for neighbour in tile.neighbours() {
            if visited.contains(&neighbour) || !is_traversable(tile, world.tile(neighbour)) {
                continue;
            }
            visited.insert(neighbour);
            queue.push_back(neighbour);
        }
    }

    matches
}

/// Unexplored tiles reachable from the player without changing medium: over
/// land when walking, over water when sailing.
pub fn unexplored_tiles(world: &WorldMap) -> Vec<TileId> {
    let sailing = world.player().sailing;
    find(
        world,
        world.player().tile,
        |tile| !tile.explored,
        |_, to| match to.obstacle {
            Obstacle::Wall | Obstacle::Wilderness => false,
            Obstacle::Water => sailing,
            _ => !sailing,
        },
    )
}

/// Water tiles bordering the zone of `origin`.
pub fn coastal_tiles(world: &WorldMap, origin: TileId) -> Vec<TileId> {
    let zone = world.tile(origin).zone;
    find(world, origin, Tile::is_water, |from, to| {
        from.zone == zone && (to.zone == zone || to.is_water())
    })
}

/// Whether the player could step onto `tile` when arriving from the water.
fn is_landing(world: &WorldMap, tile: &Tile, avoid_trees: bool) -> bool {
    let player = world.player();
    match tile.obstacle {
        Obstacle::None => true,
        Obstacle::Door => player.has(Tool::Key),
        Obstacle::Tree if player.has(Tool::Axe) => {
            !avoid_trees || tile_zone_trees(world, tile) > 1
        }
        _ => false,
    }
}

fn tile_zone_trees(world: &WorldMap, tile: &Tile) -> usize {
    world
        .tile_at(tile.position())
        .map_or(0, |id| world.obstacles_in_zone(id, Obstacle::Tree))
}

fn along_water(from: &Tile, to: &Tile) -> bool {
    from.is_water() || to.is_water()
}

/// Land tiles the player could land on from the body of water reachable
/// from `origin`.
///
/// With `avoid_trees` set, a tree only qualifies when its zone holds another
/// tree, so that cutting it never strands the player.
pub fn harbour_tiles(world: &WorldMap, origin: TileId, avoid_trees: bool) -> Vec<TileId> {
    find(
        world,
        origin,
        |tile| !tile.is_water() && is_landing(world, tile, avoid_trees),
        along_water,
    )
}

/// Landing tiles that belong to the home zone.
pub fn home_harbour_tiles(world: &WorldMap) -> Vec<TileId> {
    let home = world.home_zone().unwrap_or(ZoneId::UNASSIGNED);
    find(
        world,
        world.player().tile,
        |tile| tile.zone == home && is_landing(world, tile, false),
        along_water,
    )
}

/// Tiles at the given positions, skipping any that are not known.
pub fn tiles_at(world: &WorldMap, positions: impl IntoIterator<Item = Position>) -> Vec<TileId> {
    positions
        .into_iter()
        .filter_map(|position| world.tile_at(position))
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::{Action, view::View};

    use super::*;

    fn world_from(rows: &[&str]) -> WorldMap {
        let mut world = WorldMap::default();
        world.incorporate(&View::from_rows(rows).unwrap());
        world
    }

    fn positions(world: &WorldMap, ids: &[TileId]) -> Vec<Position> {
        ids.iter().map(|id| world.tile(*id).position()).collect()
    }

    #[test]
    fn find_returns_matches_in_visit_order() {
        let world = world_from(&["*****", "*****", "  ^  ", "*****", "*****"]);
        let origin = world.player().tile;
        let found = find(
            &world,
            origin,
            |tile| tile.is_walkable(),
            |_, to| to.is_walkable(),
        );
        assert_eq!(
            positions(&world, &found),
            vec![
                Position::new(0, 0),
                Position::new(1, 0),
                Position::new(-1, 0),
                Position::new(2, 0),
                Position::new(-2, 0),
            ]
        );
    }

    #[test]
    fn unexplored_search_stays_on_land() {
        let world = world_from(&["     ", "~~~~~", "  ^  ", "*****", "*****"]);
        let found = unexplored_tiles(&world);
        assert_eq!(found.len(), 4);
        assert!(found.iter().all(|id| world.tile(*id).position().y == 0));
    }

    #[test]
    fn coastal_tiles_border_the_player_zone() {
        let world = world_from(&["~~~~~", "~~~~~", "  ^  ", "*****", "*****"]);
        let found = coastal_tiles(&world, world.player().tile);
        let mut found = positions(&world, &found);
        found.sort();
        let expected: Vec<Position> = (-2..=2).map(|x| Position::new(x, -1)).collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn harbours_respect_tools_and_tree_avoidance() {
        let mut world = world_from(&[" -~T ", "*~~~*", "  ^  ", "*****", "*****"]);
        // Launch onto the water just north of home.
        world.player_mut().add_tool(Tool::Raft);
        assert!(world.apply(Action::Forward));
        let origin = world.player().tile;

        let plain = positions(&world, &harbour_tiles(&world, origin, false));
        assert!(plain.contains(&Position::new(1, 0)));
        assert!(plain.contains(&Position::new(-1, 0)));
        assert!(!plain.contains(&Position::new(-1, -2)), "door without key");
        assert!(!plain.contains(&Position::new(1, -2)), "tree without axe");

        world.player_mut().add_tool(Tool::Key);
        world.player_mut().add_tool(Tool::Axe);
        let tooled = positions(&world, &harbour_tiles(&world, origin, false));
        assert!(tooled.contains(&Position::new(-1, -2)));
        assert!(tooled.contains(&Position::new(1, -2)));
        let avoiding = positions(&world, &harbour_tiles(&world, origin, true));
        assert!(!avoiding.contains(&Position::new(1, -2)), "lone tree");
    }

    #[test]
    fn home_harbours_only_land_in_the_home_zone() {
        let mut world = world_from(&["     ", "~~~~~", "  ^  ", "*****", "*****"]);
        world.player_mut().add_tool(Tool::Raft);
        assert!(world.apply(Action::Forward));
        let found = positions(&world, &home_harbour_tiles(&world));
        assert!(!found.is_empty());
        assert!(found.iter().all(|position| position.y == 0));
    }
}
