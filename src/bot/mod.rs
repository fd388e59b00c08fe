//! Bot opponents
//!
//! Bots read a `&WorldState` and return a `PlayerInput`, exactly like a
//! human at the keyboard. Their behavior state lives here, never in the
//! replicated world.

pub mod demon;
pub mod hunter;
pub mod perception;
pub mod steering;

pub use demon::{DemonBot, DemonState};
pub use hunter::{HunterBot, HunterState};

use rand::Rng;

use crate::sim::{PlayerInput, Role, WorldState};

/// A bot for either role
#[derive(Debug, Clone)]
pub enum Bot {
    Hunter(HunterBot),
    Demon(DemonBot),
}

impl Bot {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Hunter => Bot::Hunter(HunterBot::new()),
            Role::Demon => Bot::Demon(DemonBot::new()),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Bot::Hunter(_) => Role::Hunter,
            Bot::Demon(_) => Role::Demon,
        }
    }

    pub fn think<R: Rng>(&mut self, world: &WorldState, rng: &mut R, dt: f32) -> PlayerInput {
        match self {
            Bot::Hunter(bot) => bot.think(world, rng, dt),
            Bot::Demon(bot) => bot.think(world, rng, dt),
        }
    }
}
