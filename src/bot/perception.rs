//! What a bot can know about the world
//!
//! Both bot controllers use the same visibility rules: a day/night vision
//! radius, bush concealment, and the sampled line-of-sight test the
//! simulation itself uses.

use glam::Vec2;

use crate::sim::{StaticMap, WorldState, has_line_of_sight};

/// Vision radius in daylight
pub const DAY_VISION: f32 = 600.0;
/// Vision radius at night
pub const NIGHT_VISION: f32 = 380.0;
/// Multiplier on the vision radius of an observer crouched in a bush
pub const BUSH_VISION_FACTOR: f32 = 0.7;
/// A bush only hides its occupant beyond this distance
pub const CLOSE_DETECT_RANGE: f32 = 60.0;

/// True if `pos` is inside any bush
pub fn in_bush(pos: Vec2, map: &StaticMap) -> bool {
    map.bushes.iter().any(|b| b.pos.distance(pos) < b.size)
}

/// Hunter's vision radius for an observer at `pos`
pub fn vision_radius(is_night: bool, pos: Vec2, map: &StaticMap) -> f32 {
    let base = if is_night { NIGHT_VISION } else { DAY_VISION };
    observer_radius(base, pos, map)
}

/// `base` vision, cut down while the observer stands in a bush
pub fn observer_radius(base: f32, pos: Vec2, map: &StaticMap) -> f32 {
    if in_bush(pos, map) {
        base * BUSH_VISION_FACTOR
    } else {
        base
    }
}

/// Can an observer at `from` see a target at `to`?
///
/// Within `radius`, not hidden in a bush (unless very close), and with an
/// unobstructed sampled line of sight.
pub fn can_see(from: Vec2, to: Vec2, radius: f32, map: &StaticMap) -> bool {
    let dist = from.distance(to);
    if dist > radius {
        return false;
    }
    if dist > CLOSE_DETECT_RANGE && in_bush(to, map) {
        return false;
    }
    has_line_of_sight(from, to, map.blockers())
}

/// Can the hunter see the demon right now?
pub fn hunter_sees_demon(world: &WorldState) -> bool {
    if world.hunter.in_cabin {
        return false;
    }
    let eye = world.hunter.body.pos;
    can_see(
        eye,
        world.demon.body.pos,
        vision_radius(world.is_night, eye, &world.map),
        &world.map,
    )
}

/// Positions of everything the hunter could take a shot at
pub fn hunter_marks(world: &WorldState) -> Vec<Vec2> {
    let eye = world.hunter.body.pos;
    let radius = vision_radius(world.is_night, eye, &world.map);
    let mut marks: Vec<Vec2> = world
        .creatures
        .iter()
        .map(|c| c.body.pos)
        .filter(|&p| can_see(eye, p, radius, &world.map))
        .collect();
    if hunter_sees_demon(world) {
        marks.push(world.demon.body.pos);
    }
    marks
}
