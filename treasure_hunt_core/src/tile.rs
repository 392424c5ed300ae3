use serde::{Deserialize, Serialize};

use crate::{Direction, Obstacle, Position, Tool, ZoneCategory};

/// Index of a tile in the world arena. Tiles are never removed, so ids stay valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(pub usize);

/// Label of a connected same-category region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneId(pub u32);

impl ZoneId {
    /// Placeholder carried by a tile between creation and zone settlement.
    pub const UNASSIGNED: ZoneId = ZoneId(u32::MAX);
}

/// Persistent state of one grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    position: Position,
    pub obstacle: Obstacle,
    pub tool: Option<Tool>,
    pub explored: bool,
    pub zone: ZoneId,
    neighbours: [Option<TileId>; 4],
}

impl Tile {
    pub(crate) fn new(
        position: Position,
        obstacle: Obstacle,
        tool: Option<Tool>,
        zone: ZoneId,
    ) -> Self {
        Tile {
            position,
            obstacle,
            tool,
            explored: false,
            zone,
            neighbours: [None; 4],
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn neighbour(&self, direction: Direction) -> Option<TileId> {
        self.neighbours[direction.index()]
    }

    pub(crate) fn link(&mut self, direction: Direction, tile: TileId) {
        self.neighbours[direction.index()] = Some(tile);
    }

    /// Present neighbours in N, E, S, W order.
    pub fn neighbours(&self) -> impl Iterator<Item = TileId> + '_ {
        self.neighbours.iter().flatten().copied()
    }

    /// Present neighbours paired with the direction leading to them.
    pub fn linked(&self) -> impl Iterator<Item = (Direction, TileId)> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(|direction| self.neighbour(direction).map(|id| (direction, id)))
    }

    /// Direction from this tile to `other`, if they are linked.
    pub fn direction_to(&self, other: TileId) -> Option<Direction> {
        self.linked()
            .find(|(_, id)| *id == other)
            .map(|(direction, _)| direction)
    }

    pub fn category(&self) -> ZoneCategory {
        self.obstacle.category()
    }

    /// Could be walked on given the right tool, regardless of inventory.
    pub fn is_walkable(&self) -> bool {
        self.category() == ZoneCategory::Walkable
    }

    pub fn is_water(&self) -> bool {
        self.obstacle == Obstacle::Water
    }

    /// Character shown for this tile when rendering the map model.
    pub fn to_char(&self) -> char {
        match self.tool {
            Some(tool) => tool.to_char(),
            None => self.obstacle.to_char(),
        }
    }
}
