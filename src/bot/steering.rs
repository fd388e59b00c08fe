//! From "where I want to go" to four booleans
//!
//! Bots decide on an [`Intent`] (direction, speed fraction, buttons). The
//! intent is bent away from nearby obstacles, quantized to four-directional
//! input, and duty-cycled so that a speed fraction below 1.0 still produces
//! a slower average walk through an on/off input.

use glam::Vec2;

use crate::sim::{PlayerInput, StaticMap};

/// Obstacles whose surface is closer than this push back
pub const AVOID_RANGE: f32 = 45.0;
/// Strength of the obstacle push (divided by the surface gap)
pub const AVOID_WEIGHT: f32 = 6.0;
/// Dominant axis fires above this magnitude
pub const PRIMARY_THRESHOLD: f32 = 0.1;
/// Secondary axis fires only above this magnitude
pub const SECONDARY_THRESHOLD: f32 = 0.45;
/// Close enough to a destination to count as arrived
pub const ARRIVE_DISTANCE: f32 = 14.0;

/// What a bot wants to do this tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Intent {
    /// Desired direction (unit length, or zero to stand still)
    pub dir: Vec2,
    /// Fraction of full speed, 0..=1
    pub speed: f32,
    pub action: bool,
    pub skill: bool,
}

impl Intent {
    /// Stand still
    pub fn hold() -> Self {
        Self::default()
    }

    /// Head from `from` toward `to` at `speed`
    pub fn toward(from: Vec2, to: Vec2, speed: f32) -> Self {
        Self {
            dir: (to - from).normalize_or_zero(),
            speed,
            ..Default::default()
        }
    }

    pub fn with_action(mut self) -> Self {
        self.action = true;
        self
    }

    pub fn with_skill(mut self, skill: bool) -> Self {
        self.skill = skill;
        self
    }
}

/// True once `pos` is within arrival distance of `target`
#[inline]
pub fn arrived(pos: Vec2, target: Vec2) -> bool {
    pos.distance(target) <= ARRIVE_DISTANCE
}

/// Push a desired direction away from nearby obstacles
///
/// Each obstacle within `AVOID_RANGE` adds a push along its outward normal,
/// weighted by the inverse of the surface gap.
pub fn avoid_obstacles(pos: Vec2, radius: f32, desired: Vec2, map: &StaticMap) -> Vec2 {
    if desired == Vec2::ZERO {
        return Vec2::ZERO;
    }
    let mut steer = desired;
    for footprint in map.blockers() {
        let (gap, away) = footprint.clearance(pos, radius);
        if gap < AVOID_RANGE {
            steer += away * (AVOID_WEIGHT / gap.max(1.0)) * (1.0 - gap.max(0.0) / AVOID_RANGE);
        }
    }
    steer
}

/// Quantize a steering vector into four-directional input
///
/// The dominant axis fires above `PRIMARY_THRESHOLD`; the other axis only
/// above `SECONDARY_THRESHOLD`, so diagonals happen but not every frame.
pub fn to_input(steer: Vec2) -> PlayerInput {
    let steer = steer.clamp_length_max(1.0);
    let (ax, ay) = (steer.x.abs(), steer.y.abs());
    let (fire_x, fire_y) = if ax >= ay {
        (ax > PRIMARY_THRESHOLD, ay > SECONDARY_THRESHOLD)
    } else {
        (ax > SECONDARY_THRESHOLD, ay > PRIMARY_THRESHOLD)
    };
    PlayerInput {
        right: fire_x && steer.x > 0.0,
        left: fire_x && steer.x < 0.0,
        down: fire_y && steer.y > 0.0,
        up: fire_y && steer.y < 0.0,
        ..Default::default()
    }
}

/// Duty-cycle gate turning a speed fraction into on/off movement ticks
#[derive(Debug, Clone, Default)]
pub struct Throttle {
    budget: f32,
}

impl Throttle {
    /// Pass movement through on roughly `speed` of all calls
    pub fn gate(&mut self, input: PlayerInput, speed: f32) -> PlayerInput {
        self.budget = (self.budget + speed.clamp(0.0, 1.0)).min(2.0);
        if self.budget >= 1.0 {
            self.budget -= 1.0;
            input
        } else {
            PlayerInput {
                action: input.action,
                skill: input.skill,
                ..Default::default()
            }
        }
    }
}

/// Turn an intent into input for a body at `pos`
pub fn resolve(
    intent: Intent,
    pos: Vec2,
    radius: f32,
    map: &StaticMap,
    throttle: &mut Throttle,
) -> PlayerInput {
    let steer = avoid_obstacles(pos, radius, intent.dir, map);
    let mut input = throttle.gate(to_input(steer), intent.speed);
    input.action = intent.action;
    input.skill = intent.skill;
    input
}
