//! An offline stand-in for the game engine.
//!
//! The environment owns the full map, renders the agent's sensor window each
//! tick and applies actions with the game's rules, so agents can be run and
//! tested without a server.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::{
    Action, Direction, Obstacle, Position, Tool, ViewConfig,
    agent::Agent,
    map::Grid,
    view::{View, ViewError},
    world::facing_char,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvironmentError {
    #[error("invalid sensor window")]
    View(#[from] ViewError),
    #[error("map string is empty")]
    Empty,
    #[error("no start marker ('^', '>', 'v' or '<') found in map")]
    MissingStart,
    #[error("second start marker found at ({x}, {y})")]
    MultipleStarts { x: usize, y: usize },
}

/// Represents the outcome of processing an agent's action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult {
    Success,
    /// The action was refused and nothing changed.
    Failure(String),
    /// The agent drowned or walked off the map.
    Lost(String),
    /// The agent stands on the start tile holding the gold.
    Win,
}

/// Manages the simulation environment.
#[derive(Debug, Clone)]
pub struct Environment {
    config: ViewConfig,
    terrain: Grid<Obstacle>,
    items: Grid<Option<Tool>>,
    placed_stones: BTreeSet<Position>,
    start: Position,
    position: Position,
    facing: Direction,
    sailing: bool,
    inventory: BTreeMap<Tool, u32>,
    steps: usize,
}

impl Environment {
    pub fn config(&self) -> ViewConfig {
        self.config
    }

    /// Grid coordinates of the agent.
    pub fn position(&self) -> Position {
        self.position
    }

    /// The agent's position relative to where it started, which is how the
    /// agent itself names positions.
    pub fn relative_position(&self) -> Position {
        Position::new(
            self.position.x - self.start.x,
            self.position.y - self.start.y,
        )
    }

    pub fn facing(&self) -> Direction {
        self.facing
    }

    pub fn sailing(&self) -> bool {
        self.sailing
    }

    pub fn count(&self, tool: Tool) -> u32 {
        self.inventory.get(&tool).copied().unwrap_or(0)
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    fn has(&self, tool: Tool) -> bool {
        self.count(tool) > 0
    }

    /// Terrain at grid coordinates. Everything off the map is wilderness.
    fn obstacle_at(&self, position: Position) -> Obstacle {
        cell(position)
            .and_then(|(x, y)| self.terrain.get(x, y))
            .copied()
            .unwrap_or(Obstacle::Wilderness)
    }

    fn tool_at(&self, position: Position) -> Option<Tool> {
        cell(position)
            .and_then(|(x, y)| self.items.get(x, y))
            .copied()
            .flatten()
    }

    fn clear_obstacle(&mut self, position: Position) {
        if let Some(obstacle) = cell(position).and_then(|(x, y)| self.terrain.get_mut(x, y)) {
            *obstacle = Obstacle::None;
        }
    }

    fn take_tool(&mut self, position: Position) -> Option<Tool> {
        cell(position)
            .and_then(|(x, y)| self.items.get_mut(x, y))
            .and_then(Option::take)
    }

    fn cell_char(&self, position: Position) -> char {
        if self.placed_stones.contains(&position) {
            return 'O';
        }
        match self.tool_at(position) {
            Some(tool) => tool.to_char(),
            None => self.obstacle_at(position).to_char(),
        }
    }

    /// The sensor window as the agent sees it: rotated so that row 0 is ahead.
    pub fn view(&self) -> View {
        let (width, height) = (self.config.width, self.config.height);
        let (cx, cy) = (width as i32 / 2, height as i32 / 2);
        View::new(Grid::from_generator(width, height, |col, row| {
            let lateral = col as i32 - cx;
            let forward = cy - row as i32;
            if lateral == 0 && forward == 0 {
                return '^';
            }
            let (dx, dy) = self.facing.relative_to_world(lateral, forward);
            self.cell_char(self.position.offset(dx, dy))
        }))
    }

    /// Applies one action with the game's rules.
    pub fn process_action(&mut self, action: Action) -> ActionResult {
        self.steps += 1;
        let ahead = self.position.step(self.facing);

        match action {
            Action::Left => {
                self.facing = self.facing.left();
                ActionResult::Success
            }
            Action::Right => {
                self.facing = self.facing.right();
                ActionResult::Success
            }
            Action::Chop => {
                if !self.has(Tool::Axe) {
                    return ActionResult::Failure("No axe to chop with.".to_string());
                }
                if self.obstacle_at(ahead) != Obstacle::Tree {
                    return ActionResult::Failure("No tree ahead.".to_string());
                }
                self.clear_obstacle(ahead);
                self.inventory.insert(Tool::Raft, 1);
                ActionResult::Success
            }
            Action::Unlock => {
                if !self.has(Tool::Key) {
                    return ActionResult::Failure("No key to unlock with.".to_string());
                }
                if self.obstacle_at(ahead) != Obstacle::Door {
                    return ActionResult::Failure("No door ahead.".to_string());
                }
                self.clear_obstacle(ahead);
                ActionResult::Success
            }
            Action::Forward => self.forward(ahead),
        }
    }

    fn forward(&mut self, ahead: Position) -> ActionResult {
        match self.obstacle_at(ahead) {
            Obstacle::Wall => return ActionResult::Failure("Cannot move into a wall.".to_string()),
            Obstacle::Tree => return ActionResult::Failure("A tree is in the way.".to_string()),
            Obstacle::Door => return ActionResult::Failure("The door is locked.".to_string()),
            Obstacle::Wilderness => {
                return ActionResult::Lost("Walked off the edge of the map.".to_string());
            }
            Obstacle::Water if !self.sailing => {
                if self.has(Tool::Stone) {
                    if let Some(stones) = self.inventory.get_mut(&Tool::Stone) {
                        *stones -= 1;
                    }
                    self.clear_obstacle(ahead);
                    self.placed_stones.insert(ahead);
                } else if self.has(Tool::Raft) {
                    self.sailing = true;
                } else {
                    return ActionResult::Lost("Drowned.".to_string());
                }
            }
            Obstacle::Water => {}
            Obstacle::None => {
                if self.sailing {
                    self.sailing = false;
                    self.inventory.remove(&Tool::Raft);
                }
            }
        }

        self.position = ahead;
        if let Some(tool) = self.take_tool(ahead) {
            let held = self.inventory.entry(tool).or_insert(0);
            if tool.carry_limit().is_none_or(|limit| *held < limit) {
                *held += 1;
            }
            debug!(?tool, "environment: tool picked up");
        }

        if self.position == self.start && self.has(Tool::Gold) {
            info!(steps = self.steps, "returned home with the gold");
            return ActionResult::Win;
        }
        ActionResult::Success
    }

    /// Runs a single tick: show the agent its window and apply its answer.
    /// Returns `None` when the agent had no action.
    pub fn step(&mut self, agent: &mut dyn Agent) -> Option<ActionResult> {
        let view = self.view();
        let action = agent.next_action(&view)?;
        let result = self.process_action(action);
        if let ActionResult::Failure(reason) = &result {
            debug!(?action, %reason, "environment refused action");
        }
        Some(result)
    }

    /// Runs ticks until the game ends or `max_steps` ticks have passed.
    pub fn run(&mut self, agent: &mut dyn Agent, max_steps: usize) -> ActionResult {
        for _ in 0..max_steps {
            match self.step(agent) {
                Some(result @ (ActionResult::Win | ActionResult::Lost(_))) => return result,
                Some(_) | None => {}
            }
        }
        ActionResult::Failure(format!("Gave up after {max_steps} steps."))
    }

    /// The full map as text, with the agent drawn at its position.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for y in 0..self.terrain.height() as i32 {
            for x in 0..self.terrain.width() as i32 {
                let position = Position::new(x, y);
                if position == self.position {
                    out.push(facing_char(self.facing));
                } else {
                    out.push(self.cell_char(position));
                }
            }
            out.push('\n');
        }
        out
    }
}

/// Grid coordinates of `position`, or `None` when it lies above or left of the map.
fn cell(position: Position) -> Option<(usize, usize)> {
    (position.x >= 0 && position.y >= 0).then_some((position.x as usize, position.y as usize))
}

fn start_facing(c: char) -> Option<Direction> {
    match c {
        '^' => Some(Direction::North),
        '>' => Some(Direction::East),
        'v' => Some(Direction::South),
        '<' => Some(Direction::West),
        _ => None,
    }
}

/// Loads an environment from a game map. Each line is a row; short rows are
/// padded with wilderness. The start marker gives the agent's initial facing.
pub fn load_environment_from_string(
    map_string: &str,
    config: ViewConfig,
) -> Result<Environment, EnvironmentError> {
    if !config.is_valid() {
        return Err(ViewError::BadSize {
            width: config.width,
            height: config.height,
        }
        .into());
    }
    let mut lines: Vec<&str> = map_string.lines().collect();
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    if lines.is_empty() {
        return Err(EnvironmentError::Empty);
    }

    let rows: Vec<Vec<char>> = lines.iter().map(|line| line.chars().collect()).collect();
    let height = rows.len();
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let cell = |x: usize, y: usize| rows[y].get(x).copied().unwrap_or('.');

    let mut start = None;
    for (y, row) in rows.iter().enumerate() {
        for (x, c) in row.iter().enumerate() {
            if let Some(facing) = start_facing(*c) {
                if start.is_some() {
                    return Err(EnvironmentError::MultipleStarts { x, y });
                }
                start = Some((Position::new(x as i32, y as i32), facing));
            }
        }
    }
    let (start, facing) = start.ok_or(EnvironmentError::MissingStart)?;

    let terrain = Grid::from_generator(width, height, |x, y| {
        let c = cell(x, y);
        if start_facing(c).is_some() {
            Obstacle::None
        } else {
            Obstacle::from_char(c)
        }
    });
    let items = Grid::from_generator(width, height, |x, y| Tool::from_char(cell(x, y)));

    Ok(Environment {
        config,
        terrain,
        items,
        placed_stones: BTreeSet::new(),
        start,
        position: start,
        facing,
        sailing: false,
        inventory: BTreeMap::new(),
        steps: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(map: &str) -> Environment {
        load_environment_from_string(map, ViewConfig::default()).unwrap()
    }

    #[test]
    fn parse_errors_are_reported() {
        let config = ViewConfig::default();
        assert_eq!(
            load_environment_from_string("\n\n", config).unwrap_err(),
            EnvironmentError::Empty
        );
        assert_eq!(
            load_environment_from_string("***\n* *\n***", config).unwrap_err(),
            EnvironmentError::MissingStart
        );
        assert_eq!(
            load_environment_from_string("^ >", config).unwrap_err(),
            EnvironmentError::MultipleStarts { x: 2, y: 0 }
        );
        let even = ViewConfig {
            width: 4,
            height: 4,
        };
        assert_eq!(
            load_environment_from_string("^", even).unwrap_err(),
            EnvironmentError::View(ViewError::BadSize {
                width: 4,
                height: 4,
            })
        );
    }

    #[test]
    fn view_is_rotated_with_the_agent() {
        let mut env = load(
            "\
*****
*$  *
* ^k*
*  a*
*****",
        );
        let north = env.view();
        assert_eq!(north.cells()[(1, 1)], '$');
        assert_eq!(north.cells()[(3, 2)], 'k');
        assert_eq!(north.cells()[(3, 3)], 'a');

        assert_eq!(env.process_action(Action::Right), ActionResult::Success);
        let east = env.view();
        // Facing east the key is straight ahead and the gold behind on the left.
        assert_eq!(east.cells()[(2, 1)], 'k');
        assert_eq!(east.cells()[(1, 3)], '$');
        assert_eq!(east.cells()[(3, 1)], 'a');
        assert_eq!(east.cells()[(0, 0)], '*');
    }

    #[test]
    fn off_map_cells_are_wilderness() {
        let env = load("^");
        let view = env.view();
        assert_eq!(view.cells()[(0, 0)], '.');
        assert_eq!(view.cells()[(2, 2)], '^');
    }

    #[test]
    fn forward_follows_game_rules() {
        let mut env = load(
            "\
~
T
-
^",
        );
        assert!(matches!(
            env.process_action(Action::Forward),
            ActionResult::Failure(_)
        ));
        assert!(matches!(env.process_action(Action::Unlock), ActionResult::Failure(_)));
        env.inventory.insert(Tool::Key, 1);
        assert_eq!(env.process_action(Action::Unlock), ActionResult::Success);
        assert_eq!(env.process_action(Action::Forward), ActionResult::Success);
        assert!(matches!(
            env.process_action(Action::Forward),
            ActionResult::Failure(_)
        ));
        env.inventory.insert(Tool::Axe, 1);
        assert_eq!(env.process_action(Action::Chop), ActionResult::Success);
        assert_eq!(env.count(Tool::Raft), 1);
        assert_eq!(env.process_action(Action::Forward), ActionResult::Success);
        assert_eq!(env.process_action(Action::Forward), ActionResult::Success);
        assert!(env.sailing());
        assert!(matches!(env.process_action(Action::Forward), ActionResult::Lost(_)));
    }

    #[test]
    fn water_without_means_drowns() {
        let mut env = load("~\n^");
        assert!(matches!(env.process_action(Action::Forward), ActionResult::Lost(_)));
    }

    #[test]
    fn stones_are_placed_before_rafts_launch() {
        let mut env = load("~~\no^");
        assert_eq!(env.process_action(Action::Left), ActionResult::Success);
        assert_eq!(env.process_action(Action::Forward), ActionResult::Success);
        assert_eq!(env.count(Tool::Stone), 1);
        env.inventory.insert(Tool::Raft, 1);
        assert_eq!(env.process_action(Action::Right), ActionResult::Success);
        assert_eq!(env.process_action(Action::Forward), ActionResult::Success);
        assert!(!env.sailing());
        assert_eq!(env.count(Tool::Stone), 0);
        assert!(env.placed_stones.contains(&Position::new(0, 0)));
    }

    #[test]
    fn returning_home_with_gold_wins() {
        let mut env = load("$\n^");
        assert_eq!(env.process_action(Action::Forward), ActionResult::Success);
        assert_eq!(env.count(Tool::Gold), 1);
        env.process_action(Action::Left);
        env.process_action(Action::Left);
        assert_eq!(env.process_action(Action::Forward), ActionResult::Win);
        assert_eq!(env.relative_position(), Position::HOME);
    }
}
