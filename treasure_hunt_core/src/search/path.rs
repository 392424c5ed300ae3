use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap},
};

use tracing::trace;

use crate::{
    Obstacle, Tool,
    search::heuristic::distance,
    tile::{Tile, TileId},
    world::WorldMap,
};

/// What a path should stay clear of, on top of what the player cannot cross.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Avoid {
    /// Keep to land. The finish tile is exempt so a path can end at the shore.
    pub water: bool,
    /// Never cut trees on the way, even with an axe.
    pub trees: bool,
    /// Never step on a tile holding a stepping stone.
    pub stones: bool,
}

impl Avoid {
    pub const NOTHING: Avoid = Avoid {
        water: false,
        trees: false,
        stones: false,
    };

    pub const fn new(water: bool, trees: bool, stones: bool) -> Self {
        Avoid {
            water,
            trees,
            stones,
        }
    }
}

/// Whether the player, in its current state, may enter `tile` on the way to `finish`.
fn admits(world: &WorldMap, tile: TileId, finish: TileId, avoid: Avoid) -> bool {
    let player = world.player();
    let candidate: &Tile = world.tile(tile);

    if player.sailing {
        return candidate.is_water() || tile == finish;
    }

    match candidate.obstacle {
        Obstacle::Wilderness | Obstacle::Wall => return false,
        Obstacle::Water if avoid.water && tile != finish => return false,
        Obstacle::Tree if avoid.trees || !player.has(Tool::Axe) => return false,
        Obstacle::Door if !player.has(Tool::Key) => return false,
        _ => {}
    }
    !(avoid.stones && candidate.tool == Some(Tool::Stone))
}

/// Searches for a route from `start` to `finish` that the player could walk
/// (or sail) right now.
///
/// Frontier nodes are ordered by accumulated cost, where each edge adds the
/// turn-aware distance from the entered tile to the finish given the edge's
/// heading. That makes the search greedy toward the goal: it always finds a
/// route when one exists but not necessarily the shortest.
pub fn find_path(
    world: &WorldMap,
    start: TileId,
    finish: TileId,
    avoid: Avoid,
) -> Option<Vec<TileId>> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    struct Frontier {
        cost: i32,
        sequence: usize,
        tile: TileId,
        parent: Option<TileId>,
    }

    impl Ord for Frontier {
        fn cmp(&self, other: &Self) -> Ordering {
            // Reversed for min-heap behaviour; earlier pushes win ties.
            other
                .cost
                .cmp(&self.cost)
                .then_with(|| other.sequence.cmp(&self.sequence))
        }
    }

    impl PartialOrd for Frontier {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }

    let target = world.tile(finish).position();
    let mut frontier = BinaryHeap::new();
    let mut expanded: HashMap<TileId, Option<TileId>> = HashMap::new();
    let mut sequence = 0usize;

    frontier.push(Frontier {
        cost: 0,
        sequence,
        tile: start,
        parent: None,
    });

    while let Some(current) = frontier.pop() {
        if expanded.contains_key(&current.tile) {
            continue;
        }
        expanded.insert(current.tile, current.parent);

        if current.tile == finish {
            let mut path = vec![finish];
            let mut cursor = current.parent;
            while let Some(tile) = cursor {
                path.push(tile);
                cursor = expanded.get(&tile).copied().flatten();
            }
            path.reverse();
            trace!(length = path.len(), explored = expanded.len(), "path found");
            return Some(path);
        }

        for (direction, neighbour) in world.tile(current.tile).linked() {
            if expanded.contains_key(&neighbour) || !admits(world, neighbour, finish, avoid) {
                continue;
            }
            sequence += 1;
            frontier.push(Frontier {
                cost: current.cost + distance(world.tile(neighbour).position(), target, direction),
                sequence,
                tile: neighbour,
                parent: Some(current.tile),
            });
        }
    }

    None
}
