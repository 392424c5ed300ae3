use std::collections::VecDeque;

use crate::{
    Action, Direction, Obstacle, Position,
    tile::TileId,
    world::WorldMap,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("path steps from {from:?} to {to:?}, which are not adjacent")]
    InvalidPath { from: Position, to: Position },
}

/// A committed queue of primitive actions. Tasks are consumed front to back
/// and never edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Task {
    actions: VecDeque<Action>,
}

impl Task {
    /// Turns a tile path into the actions that walk it, starting out facing `facing`.
    ///
    /// Each edge costs zero, one or two turns (a reversal is two lefts), a chop
    /// or unlock when the next tile is a tree or a door, and one forward.
    pub fn compile(
        world: &WorldMap,
        path: &[TileId],
        facing: Direction,
    ) -> Result<Task, TaskError> {
        let mut actions = VecDeque::new();
        let mut facing = facing;

        for pair in path.windows(2) {
            let (from, to) = (world.tile(pair[0]), world.tile(pair[1]));
            let heading = from
                .direction_to(pair[1])
                .or_else(|| to.direction_to(pair[0]).map(Direction::opposite))
                .ok_or(TaskError::InvalidPath {
                    from: from.position(),
                    to: to.position(),
                })?;

            if heading == facing.right() {
                actions.push_back(Action::Right);
            } else if heading == facing.left() {
                actions.push_back(Action::Left);
            } else if heading == facing.opposite() {
                actions.extend([Action::Left, Action::Left]);
            }
            facing = heading;

            match to.obstacle {
                Obstacle::Tree => actions.push_back(Action::Chop),
                Obstacle::Door => actions.push_back(Action::Unlock),
                _ => {}
            }
            actions.push_back(Action::Forward);
        }

        Ok(Task { actions })
    }

    /// Takes the next action off the front of the queue.
    pub fn pop(&mut self) -> Option<Action> {
        self.actions.pop_front()
    }

    pub fn is_finished(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn actions(&self) -> impl Iterator<Item = Action> + '_ {
        self.actions.iter().copied()
    }
}
