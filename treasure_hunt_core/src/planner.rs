//! The behaviour planner.
//!
//! Planning walks a fixed decision table. Each rule names a [`Behaviour`] and
//! the hazards to avoid; the first rule whose targets yield a path wins and
//! its path is compiled into a [`Task`].

use tracing::{debug, info, warn};

use crate::{
    Obstacle, Position, Tool,
    search::{
        Avoid,
        find::{coastal_tiles, harbour_tiles, home_harbour_tiles, tiles_at, unexplored_tiles},
        find_path, prioritize,
        prioritize::{
            always, coastal_reward, harbour_reward, harbour_valid, home_harbour_reward,
            nearest_reward, positions, stone_target_reward, unexplored_reward,
        },
    },
    task::Task,
    tile::TileId,
    world::WorldMap,
};

/// High-level goals the planner can pursue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Behaviour {
    Explore,
    GetTool(Tool),
    ChopTree,
    UnlockDoor,
    SetSail,
    PlaceStone,
    /// Land from the water. `must_escape` is set when the chosen landing's
    /// zone offers a way back out, either a tree to build a raft from or a stone.
    Dock { must_escape: bool },
    GoHome,
}

/// A successful planning result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub behaviour: Behaviour,
    pub target: Position,
    pub task: Task,
}

fn when(condition: bool, attempt: impl FnOnce() -> Option<Plan>) -> Option<Plan> {
    if condition { attempt() } else { None }
}

pub struct Planner<'a> {
    world: &'a WorldMap,
}

impl<'a> Planner<'a> {
    pub fn new(world: &'a WorldMap) -> Self {
        Planner { world }
    }

    /// Runs the decision table, returning the first plan that works.
    pub fn plan(&self) -> Option<Plan> {
        let plan = if self.world.player().has(Tool::Gold) {
            self.return_with_gold()
        } else {
            self.search_for_gold()
        };
        if plan.is_none() {
            warn!("no behaviour produced a plan");
        }
        plan
    }

    fn search_for_gold(&self) -> Option<Plan> {
        let player = self.world.player();
        let has = |tool| player.has(tool);

        when(player.sailing, || {
            self.explore(Avoid::new(false, true, true))
                .or_else(|| self.dock(true))
                .or_else(|| self.dock(false))
        })
        .or_else(|| self.get_tool(Tool::Gold))
        .or_else(|| when(!has(Tool::Key), || self.get_tool(Tool::Key)))
        .or_else(|| when(!has(Tool::Axe), || self.get_tool(Tool::Axe)))
        .or_else(|| {
            when(has(Tool::Key) || has(Tool::Stone), || {
                self.get_tool(Tool::Stone).or_else(|| self.unlock_door())
            })
        })
        .or_else(|| self.explore(Avoid::new(true, true, !has(Tool::Key))))
        .or_else(|| {
            when(has(Tool::Axe), || {
                when(has(Tool::Key), || {
                    self.explore(Avoid::new(true, false, false))
                })
                .or_else(|| self.explore(Avoid::new(true, false, true)))
            })
        })
        .or_else(|| when(!has(Tool::Raft), || self.chop_tree()))
        .or_else(|| when(has(Tool::Stone), || self.place_stone()))
        .or_else(|| {
            when(has(Tool::Raft), || {
                self.set_sail(Avoid::new(true, true, true))
            })
        })
        .or_else(|| when(has(Tool::Axe), || self.chop_tree()))
        .or_else(|| self.get_tool(Tool::Stone))
    }

    fn return_with_gold(&self) -> Option<Plan> {
        let sailing = self.world.player().sailing;

        self.go_home()
            .or_else(|| when(sailing, || self.dock(true)))
            .or_else(|| when(!sailing, || self.chop_tree()))
            .or_else(|| self.explore(Avoid::NOTHING))
    }

    fn explore(&self, avoid: Avoid) -> Option<Plan> {
        self.attempt(Behaviour::Explore, avoid)
    }

    fn get_tool(&self, tool: Tool) -> Option<Plan> {
        let stones = self.world.player().has(Tool::Key) || tool == Tool::Stone;
        self.attempt(Behaviour::GetTool(tool), Avoid::new(true, false, !stones))
    }

    fn chop_tree(&self) -> Option<Plan> {
        let stones = self.world.player().has(Tool::Key);
        self.attempt(Behaviour::ChopTree, Avoid::new(true, false, !stones))
    }

    fn unlock_door(&self) -> Option<Plan> {
        let player = self.world.player();
        when(player.has(Tool::Key), || {
            self.attempt(
                Behaviour::UnlockDoor,
                Avoid::new(!player.sailing, true, true),
            )
        })
    }

    fn place_stone(&self) -> Option<Plan> {
        self.attempt(Behaviour::PlaceStone, Avoid::new(true, true, false))
    }

    fn set_sail(&self, avoid: Avoid) -> Option<Plan> {
        self.attempt(Behaviour::SetSail, avoid)
    }

    /// Lands from the water, preferring landings with a way back out. The
    /// first tier that yields any harbour is the only one tried.
    fn dock(&self, avoid_trees: bool) -> Option<Plan> {
        let tiers = [(avoid_trees, true), (true, true), (avoid_trees, false)];
        let Some((must_escape, targets)) = tiers
            .into_iter()
            .map(|(trees, must_escape)| (must_escape, self.harbours(trees, must_escape)))
            .find(|(_, targets)| !targets.is_empty())
        else {
            debug!("no harbours");
            return None;
        };
        self.follow(
            Behaviour::Dock { must_escape },
            Avoid::new(false, avoid_trees, false),
            targets,
        )
    }

    /// Heads for the spawn tile, falling back to launching a raft toward it.
    /// Afloat paths ignore avoidance flags, so there is nothing to relax while sailing.
    fn go_home(&self) -> Option<Plan> {
        let player = self.world.player();
        self.attempt(Behaviour::GoHome, Avoid::new(true, false, false))
            .or_else(|| {
                when(!player.sailing && player.has(Tool::Raft), || {
                    self.set_sail(Avoid::new(true, false, false))
                })
            })
    }

    fn harbours(&self, avoid_trees: bool, must_escape: bool) -> Vec<TileId> {
        let world = self.world;
        prioritize(
            &harbour_tiles(world, world.player().tile, avoid_trees),
            |id| harbour_reward(world, id),
            |id| harbour_valid(world, id, must_escape),
        )
    }

    /// Candidate destinations for `behaviour`, best first.
    pub fn targets(&self, behaviour: Behaviour, avoid: Avoid) -> Vec<TileId> {
        let world = self.world;
        let player = world.player().tile;
        let nearest = |ids: Vec<TileId>| prioritize(&ids, |id| nearest_reward(world, id), always);

        match behaviour {
            Behaviour::Explore => prioritize(
                &unexplored_tiles(world),
                |id| unexplored_reward(world, id),
                always,
            ),
            Behaviour::GetTool(tool) => nearest(tiles_at(world, world.tool_positions(tool))),
            Behaviour::ChopTree => {
                nearest(tiles_at(world, world.obstacle_positions(Obstacle::Tree)))
            }
            Behaviour::UnlockDoor => {
                nearest(tiles_at(world, world.obstacle_positions(Obstacle::Door)))
            }
            Behaviour::SetSail => prioritize(
                &coastal_tiles(world, player),
                |id| coastal_reward(world, id),
                always,
            ),
            Behaviour::PlaceStone => prioritize(
                &coastal_tiles(world, player),
                |id| stone_target_reward(world, id).unwrap_or(0),
                |id| stone_target_reward(world, id).is_some(),
            ),
            Behaviour::Dock { must_escape } => self.harbours(avoid.trees, must_escape),
            Behaviour::GoHome if world.player().sailing => prioritize(
                &home_harbour_tiles(world),
                |id| home_harbour_reward(world, id),
                always,
            ),
            Behaviour::GoHome => tiles_at(world, [Position::HOME]),
        }
    }

    fn attempt(&self, behaviour: Behaviour, avoid: Avoid) -> Option<Plan> {
        self.follow(behaviour, avoid, self.targets(behaviour, avoid))
    }

    /// Tries every target in order and compiles the first path found.
    fn follow(&self, behaviour: Behaviour, avoid: Avoid, targets: Vec<TileId>) -> Option<Plan> {
        let world = self.world;
        let player = world.player();

        if targets.is_empty() {
            debug!(?behaviour, "no targets");
            return None;
        }
        debug!(?behaviour, candidates = ?positions(world, &targets), "ranked targets");

        let (target, path) = targets.iter().find_map(|target| {
            find_path(world, player.tile, *target, avoid).map(|path| (*target, path))
        })?;
        let target = world.tile(target).position();

        match Task::compile(world, &path, player.facing) {
            Ok(task) if task.is_empty() => {
                debug!(?behaviour, ?target, "already at target");
                None
            }
            Ok(task) => {
                info!(?behaviour, ?target, actions = task.len(), "planned task");
                Some(Plan {
                    behaviour,
                    target,
                    task,
                })
            }
            Err(err) => {
                warn!(?behaviour, %err, "discarding path");
                None
            }
        }
    }
}

/// Plans the next task for the player in `world`.
pub fn plan(world: &WorldMap) -> Option<Plan> {
    Planner::new(world).plan()
}
