use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::{Direction, Tool, tile::TileId};

/// The agent as represented inside its own map model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub tile: TileId,
    pub facing: Direction,
    pub sailing: bool,
    inventory: BTreeMap<Tool, u32>,
}

impl Player {
    pub fn new(tile: TileId) -> Self {
        Player {
            tile,
            facing: Direction::North,
            sailing: false,
            inventory: BTreeMap::new(),
        }
    }

    pub fn count(&self, tool: Tool) -> u32 {
        self.inventory.get(&tool).copied().unwrap_or(0)
    }

    pub fn has(&self, tool: Tool) -> bool {
        self.count(tool) > 0
    }

    /// Picks up one unit. Returns `false` when the carry limit is reached and
    /// the tool is thrown away instead.
    pub fn add_tool(&mut self, tool: Tool) -> bool {
        let held = self.inventory.entry(tool).or_insert(0);
        match tool.carry_limit() {
            Some(limit) if *held >= limit => {
                warn!(?tool, "carry limit reached, discarding");
                false
            }
            _ => {
                *held += 1;
                debug!(?tool, held = *held, "picked up tool");
                true
            }
        }
    }

    /// Removes one unit of a consumable tool after a successful use.
    pub(crate) fn consume(&mut self, tool: Tool) {
        if let Some(held) = self.inventory.get_mut(&tool) {
            *held = held.saturating_sub(1);
        }
    }

    /// Tools with a non-zero count, in a stable order.
    pub fn inventory(&self) -> impl Iterator<Item = (Tool, u32)> + '_ {
        self.inventory
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(tool, count)| (*tool, *count))
    }
}
