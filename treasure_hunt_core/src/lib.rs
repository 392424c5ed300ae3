use serde::{Deserialize, Serialize};

pub mod agent;
pub mod environment;
pub mod map;
pub mod planner;
pub mod player;
pub mod search;
pub mod task;
pub mod tile;
pub mod view;
pub mod world;
pub mod zone;

/// Largest map the game engine will ever produce, in either axis.
pub const MAX_MAP_EXTENT: i32 = 81;

/// Penalty used to push a candidate to the back of a ranking (or bonus to pull it forward).
pub const RANKING_OFFSET: i32 = MAX_MAP_EXTENT * MAX_MAP_EXTENT;

/// A world-absolute coordinate. The agent spawns at the origin, which is also "home".
///
/// North is `y - 1`, east is `x + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const HOME: Position = Position { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// The adjacent position one step in `direction`.
    pub fn step(self, direction: Direction) -> Position {
        let (dx, dy) = direction.offset();
        Position {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// The position displaced by an arbitrary offset.
    pub fn offset(self, dx: i32, dy: i32) -> Position {
        Position {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// The four compass headings. The agent starts facing north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Neighbour iteration order used everywhere a deterministic order matters.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    pub const fn left(self) -> Direction {
        match self {
            Direction::North => Direction::West,
            Direction::East => Direction::North,
            Direction::South => Direction::East,
            Direction::West => Direction::South,
        }
    }

    pub const fn right(self) -> Direction {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
        }
    }

    pub const fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// Converts a window-relative offset (`lateral` to the right, `forward` ahead)
    /// into a world-absolute `(dx, dy)` for an agent facing `self`.
    pub const fn relative_to_world(self, lateral: i32, forward: i32) -> (i32, i32) {
        match self {
            Direction::North => (lateral, -forward),
            Direction::East => (forward, lateral),
            Direction::South => (-lateral, forward),
            Direction::West => (-forward, -lateral),
        }
    }
}

/// What stands on a tile and blocks (or conditionally blocks) movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Obstacle {
    #[default]
    None,
    /// Cut down with an axe, which also yields a raft.
    Tree,
    /// Opened with a key.
    Door,
    /// Crossed with a stepping stone or sailed on with a raft.
    Water,
    Wall,
    /// Everything outside the map.
    Wilderness,
}

/// Passability classes used for zoning. Two tiles can only share a zone when
/// they fall in the same category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneCategory {
    Walkable,
    Water,
    Wall,
    Wilderness,
}

impl Obstacle {
    /// Decodes an observation character. Anything unrecognised is open ground.
    pub fn from_char(c: char) -> Obstacle {
        match c.to_ascii_uppercase() {
            'T' => Obstacle::Tree,
            '-' => Obstacle::Door,
            '~' => Obstacle::Water,
            '*' => Obstacle::Wall,
            '.' => Obstacle::Wilderness,
            _ => Obstacle::None,
        }
    }

    pub const fn to_char(self) -> char {
        match self {
            Obstacle::None => ' ',
            Obstacle::Tree => 'T',
            Obstacle::Door => '-',
            Obstacle::Water => '~',
            Obstacle::Wall => '*',
            Obstacle::Wilderness => '.',
        }
    }

    /// Trees and doors are walkable for zoning purposes: with the right tool
    /// the agent can pass them.
    pub const fn category(self) -> ZoneCategory {
        match self {
            Obstacle::None | Obstacle::Tree | Obstacle::Door => ZoneCategory::Walkable,
            Obstacle::Water => ZoneCategory::Water,
            Obstacle::Wall => ZoneCategory::Wall,
            Obstacle::Wilderness => ZoneCategory::Wilderness,
        }
    }
}

/// Collectible (or crafted) items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tool {
    Axe,
    Key,
    Stone,
    Raft,
    Gold,
}

impl Tool {
    /// Tools that can be found lying on the map.
    pub const COLLECTIBLE: [Tool; 4] = [Tool::Gold, Tool::Key, Tool::Axe, Tool::Stone];

    pub fn from_char(c: char) -> Option<Tool> {
        match c {
            'a' => Some(Tool::Axe),
            'k' => Some(Tool::Key),
            'o' => Some(Tool::Stone),
            '$' => Some(Tool::Gold),
            _ => None,
        }
    }

    pub const fn to_char(self) -> char {
        match self {
            Tool::Axe => 'a',
            Tool::Key => 'k',
            Tool::Stone => 'o',
            Tool::Raft => 'r',
            Tool::Gold => '$',
        }
    }

    /// Maximum units that can be carried, `None` meaning unbounded.
    pub const fn carry_limit(self) -> Option<u32> {
        match self {
            Tool::Stone => None,
            Tool::Axe | Tool::Key | Tool::Raft | Tool::Gold => Some(1),
        }
    }

    /// Whether a successful use removes one unit from the inventory.
    pub const fn is_consumable(self) -> bool {
        matches!(self, Tool::Stone | Tool::Raft | Tool::Gold)
    }

    /// Arbitrary value of picking the tool up, used to rank zones.
    pub const fn reward(self) -> i32 {
        match self {
            Tool::Axe | Tool::Key => 1000,
            Tool::Stone => 100,
            Tool::Raft => 0,
            Tool::Gold => 10000,
        }
    }
}

/// Primitive actions understood by the game engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Forward,
    Left,
    Right,
    Chop,
    Unlock,
}

impl Action {
    /// Parses an action byte, accepting either case.
    pub fn from_char(c: char) -> Option<Action> {
        match c.to_ascii_lowercase() {
            'f' => Some(Action::Forward),
            'l' => Some(Action::Left),
            'r' => Some(Action::Right),
            'c' => Some(Action::Chop),
            'u' => Some(Action::Unlock),
            _ => None,
        }
    }

    pub const fn to_char(self) -> char {
        match self {
            Action::Forward => 'f',
            Action::Left => 'l',
            Action::Right => 'r',
            Action::Chop => 'c',
            Action::Unlock => 'u',
        }
    }

    pub const fn to_byte(self) -> u8 {
        self.to_char() as u8
    }
}

/// Size of the sensor window delivered every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    pub width: usize,
    pub height: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            width: 5,
            height: 5,
        }
    }
}

impl ViewConfig {
    /// A square window. Returns `None` unless `size` is odd and at least 3.
    pub fn square(size: usize) -> Option<Self> {
        let config = ViewConfig {
            width: size,
            height: size,
        };
        config.is_valid().then_some(config)
    }

    /// Both sides must be odd and at least 3 so the agent has a centre cell
    /// with a ring of neighbours around it.
    pub const fn is_valid(&self) -> bool {
        is_window_side(self.width) && is_window_side(self.height)
    }

    /// Bytes per frame on the wire: every cell except the centre.
    pub const fn frame_len(&self) -> usize {
        (self.width * self.height).saturating_sub(1)
    }

    /// Radius used when counting unexplored cells around a candidate.
    pub fn reward_radius(&self) -> i32 {
        (self.width / 2).max(self.height / 2) as i32
    }
}

pub(crate) const fn is_window_side(side: usize) -> bool {
    side >= 3 && side % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turning_left_then_right_is_identity() {
        for direction in Direction::ALL {
            assert_eq!(direction.left().right(), direction);
            assert_eq!(direction.left().left(), direction.opposite());
        }
    }

    #[test]
    fn observation_characters_decode() {
        assert_eq!(Obstacle::from_char('T'), Obstacle::Tree);
        assert_eq!(Obstacle::from_char('t'), Obstacle::Tree);
        assert_eq!(Obstacle::from_char('~'), Obstacle::Water);
        assert_eq!(Obstacle::from_char('a'), Obstacle::None);
        assert_eq!(Obstacle::from_char('O'), Obstacle::None);
        assert_eq!(Tool::from_char('$'), Some(Tool::Gold));
        assert_eq!(Tool::from_char('O'), None);
        assert_eq!(Action::from_char('F'), Some(Action::Forward));
        assert_eq!(Action::from_char('x'), None);
    }

    #[test]
    fn relative_offsets_follow_facing() {
        // One cell straight ahead.
        assert_eq!(Direction::North.relative_to_world(0, 1), (0, -1));
        assert_eq!(Direction::East.relative_to_world(0, 1), (1, 0));
        assert_eq!(Direction::South.relative_to_world(0, 1), (0, 1));
        assert_eq!(Direction::West.relative_to_world(0, 1), (-1, 0));
        // One cell to the right hand side.
        assert_eq!(Direction::North.relative_to_world(1, 0), (1, 0));
        assert_eq!(Direction::East.relative_to_world(1, 0), (0, 1));
        assert_eq!(Direction::South.relative_to_world(1, 0), (-1, 0));
        assert_eq!(Direction::West.relative_to_world(1, 0), (0, -1));
    }

    #[test]
    fn view_config_rejects_even_sizes() {
        assert!(ViewConfig::square(4).is_none());
        assert!(ViewConfig::square(1).is_none());
        let flat = ViewConfig {
            width: 5,
            height: 0,
        };
        assert!(!flat.is_valid());
        assert_eq!(flat.frame_len(), 0);
        assert_eq!(ViewConfig::square(7).map(|c| c.frame_len()), Some(48));
        assert_eq!(ViewConfig::default().reward_radius(), 2);
    }
}
