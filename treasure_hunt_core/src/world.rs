//! The agent's persistent model of the world.
//!
//! `WorldMap` is a sparse, append-only graph of tiles built from successive
//! sensor windows. Once a tile exists its state is maintained locally from the
//! agent's own actions, so [`WorldMap::apply`] must refuse exactly the moves the
//! game engine would refuse or the two would drift apart.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use tracing::debug;

use crate::{
    Action, Direction, Obstacle, Position, Tool, ViewConfig,
    map::Grid,
    player::Player,
    tile::{Tile, TileId, ZoneId},
    view::View,
};

#[derive(Debug, Clone)]
pub struct WorldMap {
    config: ViewConfig,
    tiles: Vec<Tile>,
    positions: HashMap<Position, TileId>,
    tools: BTreeMap<Tool, BTreeSet<Position>>,
    obstacles: BTreeMap<Obstacle, BTreeSet<Position>>,
    pub(crate) next_zone: u32,
    pub(crate) zone_merges: usize,
    min: Position,
    max: Position,
    player: Player,
}

impl Default for WorldMap {
    fn default() -> Self {
        WorldMap::new(ViewConfig::default())
    }
}

impl WorldMap {
    /// A world containing only the home tile, with the player standing on it facing north.
    pub fn new(config: ViewConfig) -> Self {
        let mut world = WorldMap {
            config,
            tiles: Vec::new(),
            positions: HashMap::new(),
            tools: Tool::COLLECTIBLE
                .into_iter()
                .map(|tool| (tool, BTreeSet::new()))
                .collect(),
            obstacles: [Obstacle::Tree, Obstacle::Door]
                .into_iter()
                .map(|obstacle| (obstacle, BTreeSet::new()))
                .collect(),
            next_zone: 0,
            zone_merges: 0,
            min: Position::HOME,
            max: Position::HOME,
            player: Player::new(TileId(0)),
        };
        let home = world.insert_tile(Position::HOME, Obstacle::None, None);
        world.mark_explored(home);
        world
    }

    pub fn config(&self) -> ViewConfig {
        self.config
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn player_tile(&self) -> &Tile {
        self.tile(self.player.tile)
    }

    pub fn tile(&self, id: TileId) -> &Tile {
        &self.tiles[id.0]
    }

    pub(crate) fn tile_mut(&mut self, id: TileId) -> &mut Tile {
        &mut self.tiles[id.0]
    }

    pub fn tile_at(&self, position: Position) -> Option<TileId> {
        self.positions.get(&position).copied()
    }

    pub fn get(&self, position: Position) -> Option<&Tile> {
        self.tile_at(position).map(|id| self.tile(id))
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tile_ids(&self) -> impl Iterator<Item = TileId> {
        (0..self.tiles.len()).map(TileId)
    }

    /// Number of zone merges performed so far.
    pub fn zone_merges(&self) -> usize {
        self.zone_merges
    }

    /// Known positions of a tool still lying on the ground.
    pub fn tool_positions(&self, tool: Tool) -> impl Iterator<Item = Position> + '_ {
        self.tools.get(&tool).into_iter().flatten().copied()
    }

    /// Known positions of a standing tree or locked door. Other obstacles are not indexed.
    pub fn obstacle_positions(&self, obstacle: Obstacle) -> impl Iterator<Item = Position> + '_ {
        self.obstacles.get(&obstacle).into_iter().flatten().copied()
    }

    /// Adds a tile unless one already exists at `position`, linking it to its
    /// neighbours and settling its zone. Returns the id of the tile at `position`.
    pub fn insert_tile(
        &mut self,
        position: Position,
        obstacle: Obstacle,
        tool: Option<Tool>,
    ) -> TileId {
        if let Some(id) = self.tile_at(position) {
            return id;
        }

        let id = TileId(self.tiles.len());
        self.tiles
            .push(Tile::new(position, obstacle, tool, ZoneId::UNASSIGNED));
        self.positions.insert(position, id);

        for direction in Direction::ALL {
            if let Some(neighbour) = self.tile_at(position.step(direction)) {
                self.tile_mut(id).link(direction, neighbour);
                self.tile_mut(neighbour).link(direction.opposite(), id);
            }
        }

        if let Some(tool) = tool {
            self.tools.entry(tool).or_default().insert(position);
        }
        if let Some(positions) = self.obstacles.get_mut(&obstacle) {
            positions.insert(position);
        }

        self.min = Position::new(self.min.x.min(position.x), self.min.y.min(position.y));
        self.max = Position::new(self.max.x.max(position.x), self.max.y.max(position.y));

        self.settle_zone(id);
        id
    }

    /// Adds every tile revealed by `view` that is not already known.
    ///
    /// The window is first rotated to world orientation using the player's
    /// facing, then flood-filled outward from its centre so that every new
    /// tile is inserted next to an already linked one.
    pub fn incorporate(&mut self, view: &View) {
        let window = view.oriented(self.player.facing);
        let (cx, cy) = (window.width() / 2, window.height() / 2);
        let origin = self.player_tile().position();

        let mut visited = Grid::filled(window.width(), window.height(), false);
        let mut queue = VecDeque::from([(cx, cy)]);
        visited[(cx, cy)] = true;
        let mut added = 0usize;

        while let Some((x, y)) = queue.pop_front() {
            for direction in Direction::ALL {
                let (dx, dy) = direction.offset();
                let (nx, ny) = (x as i32 + dx, y as i32 + dy);
                if !window.contains(nx, ny) {
                    continue;
                }
                let (nx, ny) = (nx as usize, ny as usize);
                if visited[(nx, ny)] {
                    continue;
                }
                visited[(nx, ny)] = true;

                let position = origin.offset(nx as i32 - cx as i32, ny as i32 - cy as i32);
                if self.tile_at(position).is_none() {
                    let c = window[(nx, ny)];
                    self.insert_tile(position, Obstacle::from_char(c), Tool::from_char(c));
                    added += 1;
                }
                queue.push_back((nx, ny));
            }
        }

        if added > 0 {
            debug!(added, total = self.tiles.len(), "incorporated view");
        }
    }

    /// Applies one primitive action to the player. Returns `false`, leaving all
    /// state untouched, when the game engine would refuse the action.
    pub fn apply(&mut self, action: Action) -> bool {
        match action {
            Action::Left => {
                self.player.facing = self.player.facing.left();
                true
            }
            Action::Right => {
                self.player.facing = self.player.facing.right();
                true
            }
            Action::Forward => self.forward(),
            Action::Chop => self.use_tool_ahead(Tool::Axe, Obstacle::Tree),
            Action::Unlock => self.use_tool_ahead(Tool::Key, Obstacle::Door),
        }
    }

    /// The tile directly in front of the player, if known.
    pub fn ahead(&self) -> Option<TileId> {
        self.player_tile().neighbour(self.player.facing)
    }

    fn forward(&mut self) -> bool {
        let Some(next) = self.ahead() else {
            debug!("refused forward: nothing known ahead");
            return false;
        };

        match self.tile(next).obstacle {
            Obstacle::Water if !self.player.sailing => {
                if self.player.has(Tool::Stone) {
                    self.player.consume(Tool::Stone);
                    self.tile_mut(next).obstacle = Obstacle::None;
                    self.settle_zone(next);
                    debug!(position = ?self.tile(next).position(), "placed stepping stone");
                } else if self.player.has(Tool::Raft) {
                    self.player.sailing = true;
                    debug!("set sail");
                } else {
                    debug!("refused forward: water without stone or raft");
                    return false;
                }
            }
            Obstacle::Water => {}
            Obstacle::None => {
                if self.player.sailing {
                    self.player.sailing = false;
                    self.player.consume(Tool::Raft);
                    debug!("docked, raft left behind");
                }
            }
            obstacle => {
                debug!(?obstacle, "refused forward");
                return false;
            }
        }

        if let Some(tool) = self.tile_mut(next).tool.take() {
            let position = self.tile(next).position();
            if let Some(positions) = self.tools.get_mut(&tool) {
                positions.remove(&position);
            }
            self.player.add_tool(tool);
        }

        self.player.tile = next;
        self.mark_explored(next);
        true
    }

    fn use_tool_ahead(&mut self, tool: Tool, target: Obstacle) -> bool {
        if !self.player.has(tool) {
            debug!(?tool, "refused: tool not held");
            return false;
        }
        let Some(ahead) = self.ahead() else {
            debug!(?tool, "refused: not facing a tile");
            return false;
        };
        if self.tile(ahead).obstacle != target {
            debug!(?tool, ?target, "refused: wrong obstacle ahead");
            return false;
        }

        let position = self.tile(ahead).position();
        self.tile_mut(ahead).obstacle = Obstacle::None;
        if let Some(positions) = self.obstacles.get_mut(&target) {
            positions.remove(&position);
        }
        if tool == Tool::Axe {
            self.player.add_tool(Tool::Raft);
        }
        if tool.is_consumable() {
            self.player.consume(tool);
        }
        true
    }

    /// Marks `start` explored, then spreads the flag along each straight chain
    /// of neighbours that ends in an explored or wilderness tile within half the
    /// window extent, since standing anywhere on such a chain reveals nothing new.
    pub(crate) fn mark_explored(&mut self, start: TileId) {
        self.tile_mut(start).explored = true;
        let mut pending = vec![start];

        while let Some(id) = pending.pop() {
            for direction in Direction::ALL {
                let reach = match direction {
                    Direction::North | Direction::South => self.config.height / 2,
                    Direction::East | Direction::West => self.config.width / 2,
                };

                let mut chain = Vec::with_capacity(reach);
                let mut next = self.tile(id).neighbour(direction);
                let mut settled = false;
                for _ in 0..reach {
                    let Some(candidate) = next else { break };
                    let tile = self.tile(candidate);
                    if tile.explored || tile.obstacle == Obstacle::Wilderness {
                        settled = true;
                        break;
                    }
                    chain.push(candidate);
                    next = tile.neighbour(direction);
                }

                if settled {
                    for candidate in chain {
                        self.tile_mut(candidate).explored = true;
                        pending.push(candidate);
                    }
                }
            }
        }
    }

    /// Display character for `position`: `?` when unknown, tools over
    /// obstacles, and an arrow for the player.
    pub fn char_at(&self, position: Position) -> char {
        match self.get(position) {
            None => '?',
            Some(tile) if tile.tool.is_some() => tile.to_char(),
            Some(_) if position == self.player_tile().position() => facing_char(self.player.facing),
            Some(tile) => tile.to_char(),
        }
    }

    /// Text dump of the known map within [`bounds`](Self::bounds).
    pub fn render(&self) -> String {
        let mut out = String::new();
        for y in self.min.y..=self.max.y {
            for x in self.min.x..=self.max.x {
                out.push(self.char_at(Position::new(x, y)));
            }
            out.push('\n');
        }
        out
    }

    /// Smallest and largest known coordinates.
    pub fn bounds(&self) -> (Position, Position) {
        (self.min, self.max)
    }
}

pub fn facing_char(direction: Direction) -> char {
    match direction {
        Direction::North => '^',
        Direction::East => '>',
        Direction::South => 'v',
        Direction::West => '<',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_view() -> View {
        View::from_rows(&["     ", "     ", "  ^  ", "     ", "     "]).unwrap()
    }

    #[test]
    fn incorporating_a_window_creates_every_cell() {
        let mut world = WorldMap::default();
        world.incorporate(&open_view());
        assert_eq!(world.len(), 25);
        assert!(world.tile_at(Position::new(-2, -2)).is_some());
        assert!(world.tile_at(Position::new(2, 2)).is_some());
        let home_zone = world.player_tile().zone;
        assert!(world.tile_ids().all(|id| world.tile(id).zone == home_zone));
    }

    #[test]
    fn corridor_tiles_join_the_player_zone() {
        let mut world = WorldMap::default();
        let view = View::from_rows(&["*****", "*****", "  ^  ", "*****", "*****"]).unwrap();
        world.incorporate(&view);
        let home_zone = world.player_tile().zone;
        for x in [-2, -1, 1, 2] {
            assert_eq!(world.get(Position::new(x, 0)).unwrap().zone, home_zone);
        }
        let wall_zone = world.get(Position::new(0, -1)).unwrap().zone;
        assert_ne!(wall_zone, home_zone);
    }

    #[test]
    fn rotated_windows_land_in_world_orientation() {
        let mut world = WorldMap::default();
        world.apply(Action::Right);
        // Facing east, the cell straight ahead is (1, 0).
        let view = View::from_rows(&["     ", "  a  ", "  ^  ", "     ", "     "]).unwrap();
        world.incorporate(&view);
        assert_eq!(
            world.get(Position::new(1, 0)).unwrap().tool,
            Some(Tool::Axe)
        );
        assert_eq!(
            world.tool_positions(Tool::Axe).collect::<Vec<_>>(),
            vec![Position::new(1, 0)]
        );
    }

    #[test]
    fn forward_refuses_blocked_tiles() {
        let mut world = WorldMap::default();
        for obstacle in ['T', '-', '*', '.', '~'] {
            let mut world_copy = world.clone();
            let row = format!("  {obstacle}  ");
            let view =
                View::from_rows(&["     ", row.as_str(), "  ^  ", "     ", "     "]).unwrap();
            world_copy.incorporate(&view);
            assert!(!world_copy.apply(Action::Forward), "moved into {obstacle}");
            assert_eq!(world_copy.player_tile().position(), Position::HOME);
        }
        world.incorporate(&open_view());
        assert!(world.apply(Action::Forward));
        assert_eq!(world.player_tile().position(), Position::new(0, -1));
    }

    #[test]
    fn forward_collects_tools_and_clears_the_index() {
        let mut world = WorldMap::default();
        let view = View::from_rows(&["     ", "  k  ", "  ^  ", "     ", "     "]).unwrap();
        world.incorporate(&view);
        assert!(world.apply(Action::Forward));
        assert!(world.player().has(Tool::Key));
        assert_eq!(world.tool_positions(Tool::Key).count(), 0);
        assert_eq!(world.player_tile().tool, None);
    }

    #[test]
    fn chop_and_unlock_need_matching_obstacle_and_tool() {
        let mut world = WorldMap::default();
        let view = View::from_rows(&["     ", "  T  ", " -^  ", "     ", "     "]).unwrap();
        world.incorporate(&view);
        assert!(!world.apply(Action::Chop));
        world.player_mut().add_tool(Tool::Axe);
        assert!(!world.apply(Action::Unlock));
        assert!(world.apply(Action::Chop));
        assert!(world.player().has(Tool::Raft));
        assert_eq!(world.obstacle_positions(Obstacle::Tree).count(), 0);
        assert!(world.apply(Action::Left));
        assert!(!world.apply(Action::Unlock));
        world.player_mut().add_tool(Tool::Key);
        assert!(!world.apply(Action::Chop));
        assert!(world.apply(Action::Unlock));
        assert!(world.player().has(Tool::Key));
        assert_eq!(
            world.get(Position::new(-1, 0)).unwrap().obstacle,
            Obstacle::None
        );
    }

    #[test]
    fn stones_bridge_water_and_rafts_sail_it() {
        let mut world = WorldMap::default();
        let view = View::from_rows(&["  ~  ", "  ~  ", "  ^  ", "     ", "     "]).unwrap();
        world.incorporate(&view);
        let water_zone = world.get(Position::new(0, -2)).unwrap().zone;

        world.player_mut().add_tool(Tool::Stone);
        assert!(world.apply(Action::Forward));
        assert!(!world.player().sailing);
        assert_eq!(world.player().count(Tool::Stone), 0);
        let stone = world.player_tile();
        assert_eq!(stone.obstacle, Obstacle::None);
        assert_ne!(stone.zone, water_zone);
        assert_eq!(stone.zone, world.get(Position::HOME).unwrap().zone);

        assert!(!world.apply(Action::Forward));
        world.player_mut().add_tool(Tool::Raft);
        assert!(world.apply(Action::Forward));
        assert!(world.player().sailing);
        assert!(world.player().has(Tool::Raft));

        world.apply(Action::Right);
        world.apply(Action::Right);
        assert!(world.apply(Action::Forward));
        assert!(!world.player().sailing);
        assert!(!world.player().has(Tool::Raft));
    }

    #[test]
    fn explored_flag_spreads_along_short_chains() {
        let mut world = WorldMap::default();
        world.incorporate(&open_view());
        // Step north then back: the tile in between already explored, the
        // chain north of (0, -1) ends in unexplored tiles and stays unexplored.
        assert!(world.apply(Action::Forward));
        assert!(world.get(Position::new(0, -1)).unwrap().explored);
        assert!(!world.get(Position::new(0, -2)).unwrap().explored);

        // Arriving two tiles north of home by a detour fills in the gap.
        let mut world = WorldMap::default();
        world.incorporate(&open_view());
        for action in [
            Action::Right,
            Action::Forward,
            Action::Left,
            Action::Forward,
            Action::Forward,
            Action::Left,
        ] {
            assert!(world.apply(action));
        }
        assert!(!world.get(Position::new(0, -1)).unwrap().explored);
        assert!(world.apply(Action::Forward));
        assert_eq!(world.player_tile().position(), Position::new(0, -2));
        assert!(world.get(Position::new(0, -1)).unwrap().explored);
    }

    #[test]
    fn wilderness_counts_as_explored_boundary() {
        let mut world = WorldMap::default();
        let view = View::from_rows(&[".....", "     ", "  ^  ", "     ", "     "]).unwrap();
        world.incorporate(&view);
        assert!(!world.get(Position::new(0, -1)).unwrap().explored);

        // Step south and back: standing on home again, the chain north ends in wilderness.
        world.apply(Action::Right);
        world.apply(Action::Right);
        assert!(world.apply(Action::Forward));
        world.apply(Action::Left);
        world.apply(Action::Left);
        assert!(world.apply(Action::Forward));
        assert!(world.get(Position::new(0, -1)).unwrap().explored);
    }

    #[test]
    fn render_marks_unknown_and_player() {
        let mut world = WorldMap::default();
        let view = View::from_rows(&["     ", "  $  ", "  ^  ", "     ", "     "]).unwrap();
        world.incorporate(&view);
        let text = world.render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1].chars().nth(2), Some('$'));
        assert_eq!(lines[2].chars().nth(2), Some('^'));
    }
}
