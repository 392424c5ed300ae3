use std::io::BufRead;

use tracing::{debug, warn};

use crate::{
    Action, ViewConfig,
    planner::{self, Plan},
    view::View,
    world::WorldMap,
};

/// Trait defining the behavior of an agent.
/// Every tick the agent receives the sensor window and answers with at most one action.
pub trait Agent {
    /// Updates the agent's map from `view` and decides what to do next.
    /// `None` means the agent has nothing to do this tick.
    fn next_action(&mut self, view: &View) -> Option<Action>;

    /// The agent's model of the world so far.
    fn world(&self) -> &WorldMap;
}

/// An agent that follows tasks produced by the behaviour planner, replanning
/// only once the current task runs out.
#[derive(Debug, Clone, Default)]
pub struct PlanningAgent {
    world: WorldMap,
    plan: Option<Plan>,
}

impl PlanningAgent {
    pub fn new(config: ViewConfig) -> Self {
        Self {
            world: WorldMap::new(config),
            plan: None,
        }
    }

    /// The plan currently being executed, if any.
    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }
}

impl Agent for PlanningAgent {
    fn next_action(&mut self, view: &View) -> Option<Action> {
        self.world.incorporate(view);

        if self.plan.as_ref().is_none_or(|p| p.task.is_finished()) {
            self.plan = planner::plan(&self.world);
        }

        let action = self.plan.as_mut()?.task.pop()?;
        if self.world.apply(action) {
            Some(action)
        } else {
            // The map and the task disagree; start over next tick.
            warn!(?action, "task action refused, discarding task");
            self.plan = None;
            None
        }
    }

    fn world(&self) -> &WorldMap {
        &self.world
    }
}

/// An agent driven by a human typing action characters.
///
/// Actions the map model would refuse are skipped so the model never drifts
/// from the game. Unrecognised characters are ignored.
pub struct ManualAgent<R> {
    world: WorldMap,
    input: R,
    pending: Vec<char>,
}

impl<R: BufRead> ManualAgent<R> {
    pub fn new(config: ViewConfig, input: R) -> Self {
        Self {
            world: WorldMap::new(config),
            input,
            pending: Vec::new(),
        }
    }

    /// Next typed character, reading another line when the buffer runs dry.
    fn next_char(&mut self) -> Option<char> {
        while self.pending.is_empty() {
            let mut line = String::new();
            match self.input.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => self.pending = line.chars().rev().collect(),
                Err(err) => {
                    warn!(%err, "failed to read manual input");
                    return None;
                }
            }
        }
        self.pending.pop()
    }
}

impl<R: BufRead> Agent for ManualAgent<R> {
    fn next_action(&mut self, view: &View) -> Option<Action> {
        self.world.incorporate(view);

        while let Some(c) = self.next_char() {
            let Some(action) = Action::from_char(c) else {
                continue;
            };
            if self.world.apply(action) {
                return Some(action);
            }
            debug!(?action, "ignoring illegal manual action");
        }
        None
    }

    fn world(&self) -> &WorldMap {
        &self.world
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::{Position, Tool};

    use super::*;

    fn view(rows: &[&str]) -> View {
        View::from_rows(rows).unwrap()
    }

    #[test]
    fn planning_agent_follows_its_task() {
        let mut agent = PlanningAgent::default();
        let window = view(&["*****", "**$**", "**^**", "*****", "*****"]);
        assert_eq!(agent.next_action(&window), Some(Action::Forward));
        assert!(agent.world().player().has(Tool::Gold));
        assert!(agent.plan().unwrap().task.is_finished());
    }

    #[test]
    fn planning_agent_idles_without_targets() {
        let mut agent = PlanningAgent::default();
        let window = view(&["*****", "*****", "**^**", "*****", "*****"]);
        assert_eq!(agent.next_action(&window), None);
        assert!(agent.plan().is_none());
    }

    #[test]
    fn manual_agent_skips_illegal_and_unknown_input() {
        let input = Cursor::new("x c\nF\nl\n");
        let mut agent = ManualAgent::new(ViewConfig::default(), input);
        let window = view(&["     ", "     ", "  ^  ", "     ", "     "]);

        assert_eq!(agent.next_action(&window), Some(Action::Forward));
        assert_eq!(agent.world().player_tile().position(), Position::new(0, -1));
        assert_eq!(agent.next_action(&window), Some(Action::Left));
        assert_eq!(agent.next_action(&window), None);
    }
}
