//! Night Hunt - an asymmetric hunter vs. demon survival game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (geometry, world state, day/night tick)
//! - `bot`: Perception-driven bot controllers for either role
//! - `net`: Host-authoritative replication (input relay, snapshots, interpolation)
//! - `game`: Local match driver (fixed timestep, human/bot controllers)
//! - `settings`: Match configuration

pub mod bot;
pub mod game;
pub mod net;
pub mod settings;
pub mod sim;

pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Map dimensions (world pixels)
    pub const MAP_WIDTH: f32 = 2000.0;
    pub const MAP_HEIGHT: f32 = 1600.0;

    /// Day/night cycle (seconds)
    pub const DAY_DURATION: f32 = 90.0;
    pub const NIGHT_DURATION: f32 = 60.0;

    /// Combatant bodies
    pub const HUNTER_RADIUS: f32 = 15.0;
    pub const DEMON_RADIUS: f32 = 16.0;
    pub const HUNTER_SPEED: f32 = 170.0;
    /// Disguised (daytime) demon speed
    pub const DEMON_SPEED: f32 = 150.0;
    /// Demon speed multiplier once night falls
    pub const DEMON_NIGHT_SPEED_MULT: f32 = 1.35;

    /// Shooting
    pub const BULLET_SPEED: f32 = 720.0;
    pub const BULLET_RADIUS: f32 = 3.0;
    pub const SHOOT_COOLDOWN: f32 = 0.6;
    /// Seconds of daylight burned by each daytime shot
    pub const SHOOT_PENALTY: f32 = 3.0;

    /// Demon abilities
    pub const EAT_RADIUS: f32 = 40.0;
    /// Seconds of daylight burned by each mushroom eaten
    pub const EAT_BONUS: f32 = 6.0;
    pub const STUN_DURATION: f32 = 3.0;
    pub const TRACKING_DURATION: f32 = 6.0;

    /// Cabin refuge
    pub const CABIN_SIZE: f32 = 60.0;
    /// Distance of the door point below the cabin center
    pub const CABIN_DOOR_OFFSET: f32 = CABIN_SIZE + 20.0;
    pub const CABIN_INTERACT_RADIUS: f32 = 40.0;
    pub const CABIN_ENTER_TIME: f32 = 1.5;

    /// Obstacles
    pub const TREE_SIZE_MIN: f32 = 30.0;
    pub const TREE_SIZE_MAX: f32 = 50.0;
    /// Tree collision half-size as a fraction of its canopy size
    pub const TREE_COLLISION_FRACTION: f32 = 0.35;
    pub const BUSH_SIZE: f32 = 36.0;
    pub const TREE_COUNT: usize = 45;
    pub const BUSH_COUNT: usize = 18;

    /// Wandering creatures
    pub const CREATURE_COUNT: usize = 8;
    pub const CREATURE_RADIUS: f32 = 10.0;
    pub const CREATURE_SPEED: f32 = 55.0;
    /// Stop/go countdown ranges (ticks)
    pub const CREATURE_MOVE_TICKS: (u32, u32) = (40, 160);
    pub const CREATURE_IDLE_TICKS: (u32, u32) = (60, 240);

    /// Mushrooms
    pub const PICKUP_COUNT: usize = 12;
    pub const PICKUP_RADIUS: f32 = 8.0;

    /// Placement
    pub const MIN_SPAWN_SPACING: f32 = 70.0;
    pub const PLACEMENT_ATTEMPTS: u32 = 60;

    /// Line-of-sight sampling step (world pixels)
    pub const LOS_STEP: f32 = 8.0;

    /// Event log
    pub const MAX_LOG_ENTRIES: usize = 5;
    pub const LOG_ENTRY_TTL: f32 = 4.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Signed shortest rotation from `from` to `to` (radians, [-π, π))
#[inline]
pub fn angle_between(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

/// Unit vector for a facing angle
#[inline]
pub fn heading(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Facing angle of a direction vector
#[inline]
pub fn bearing(dir: Vec2) -> f32 {
    dir.y.atan2(dir.x)
}
