//! Deterministic simulation module
//!
//! All gameplay rules live here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (derived from the match seed and tick)
//! - Stable iteration order (by entity ID)
//! - No rendering, input-device, or network dependencies

pub mod geometry;
pub mod spawn;
pub mod state;
pub mod tick;

pub use geometry::{
    Footprint, circle_vs_box, circle_vs_circle, has_line_of_sight, position_blocked, ray_vs_box,
    ray_vs_circle,
};
pub use spawn::{generate_world, respawn};
pub use state::{
    Creature, Demon, Entity, EntityKind, EventKind, GamePhase, Hunter, LogEntry, Pickup,
    Projectile, Role, StaticMap, WanderTimer, WorldState,
};
pub use tick::{PlayerInput, advance, slide_move};
