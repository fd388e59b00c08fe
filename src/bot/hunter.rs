//! Hunter bot
//!
//! Priority order each tick: get indoors at night, chase a demon caught
//! feeding, otherwise idle and patrol. A little daytime paranoia makes it
//! take the odd shot at whatever moves.

use glam::Vec2;
use rand::Rng;

use super::perception::{hunter_marks, hunter_sees_demon};
use super::steering::{AVOID_RANGE, Intent, Throttle, arrived, resolve, to_input};
use crate::consts::*;
use crate::sim::spawn::random_open_point;
use crate::sim::{GamePhase, PlayerInput, WorldState};
use crate::{angle_between, bearing, heading};

/// Idle wait range before picking a new patrol target (seconds)
pub const HUNTER_IDLE_TIME: (f32, f32) = (0.8, 2.5);
/// Chance an idle hunter heads for a mushroom rather than a random spot
pub const PICKUP_PATROL_CHANCE: f64 = 0.7;
/// Fire when the facing is within this angle of the target bearing
pub const FIRE_TOLERANCE: f32 = 0.3;
/// Per-tick chance of a nervous daytime shot
pub const PARANOIA_CHANCE: f64 = 0.002;
/// Net displacement below which a moving hunter counts as stuck
pub const STUCK_EPSILON: f32 = 8.0;
/// Seconds of being stuck before giving up on the current target
pub const STUCK_TIME: f32 = 0.75;
/// Patrol targets closer than this are not worth walking to
pub const MIN_PATROL_DISTANCE: f32 = 250.0;

const RETURN_SPEED: f32 = 1.0;
const CHASE_SPEED: f32 = 0.9;
const PATROL_SPEED: f32 = 0.6;
/// Stop this far inside the door radius so the door timer can fill
const DOOR_STANDOFF: f32 = CABIN_INTERACT_RADIUS * 0.5;
/// Arc swept around a blocking obstacle per detour (radians)
const DETOUR_ARC: f32 = std::f32::consts::FRAC_PI_3;
/// Detour waypoints sit this much further out than the hunter was
const DETOUR_MARGIN: f32 = 30.0;
/// Give up on a detour waypoint after this long (seconds)
const DETOUR_TIME: f32 = 1.5;

/// Hunter behavior state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HunterState {
    Idle { remaining: f32 },
    Patrol { target: Vec2 },
    /// Chasing a demon caught in the act
    Chase { target: Vec2 },
    /// Night: head for the cabin door
    ReturnCabin,
}

/// Temporary waypoint around whatever the hunter got stuck on
#[derive(Debug, Clone, Copy, PartialEq)]
struct Detour {
    waypoint: Vec2,
    remaining: f32,
}

/// Drives the hunter
#[derive(Debug, Clone)]
pub struct HunterBot {
    state: HunterState,
    witnessed_eating: bool,
    pickups_seen: Option<usize>,
    /// Where the current stuck window started
    stuck_anchor: Option<Vec2>,
    was_moving: bool,
    stuck_for: f32,
    detour: Option<Detour>,
    throttle: Throttle,
}

impl Default for HunterBot {
    fn default() -> Self {
        Self::new()
    }
}

impl HunterBot {
    pub fn new() -> Self {
        Self {
            state: HunterState::Idle { remaining: 0.0 },
            witnessed_eating: false,
            pickups_seen: None,
            stuck_anchor: None,
            was_moving: false,
            stuck_for: 0.0,
            detour: None,
            throttle: Throttle::default(),
        }
    }

    pub fn state(&self) -> &HunterState {
        &self.state
    }

    /// Has the bot seen the demon feeding today?
    pub fn has_witnessed_eating(&self) -> bool {
        self.witnessed_eating
    }

    /// Decide this tick's input
    pub fn think<R: Rng>(&mut self, world: &WorldState, rng: &mut R, dt: f32) -> PlayerInput {
        let hunter = &world.hunter;
        if world.phase != GamePhase::Playing || hunter.in_cabin {
            self.stuck_anchor = None;
            self.was_moving = false;
            self.stuck_for = 0.0;
            self.detour = None;
            return PlayerInput::default();
        }
        let pos = hunter.body.pos;

        let stuck = self.check_stuck(pos, dt);
        self.watch_for_feeding(world);
        self.pick_state(world);
        if stuck {
            self.unstick(world, rng);
        }

        let intent = match self.follow_detour(pos, dt) {
            Some(intent) => intent,
            None => self.act(world, rng, dt),
        };
        self.was_moving = intent.speed > 0.0 && intent.dir != Vec2::ZERO;
        let mut input = resolve(intent, pos, hunter.body.size, &world.map, &mut self.throttle);

        if let HunterState::Chase { target } = self.state {
            input.action = hunter.cooldown <= 0.0 && aligned(hunter.body.angle, &input, pos, target);
        } else if !world.is_night && hunter.cooldown <= 0.0 && rng.random_bool(PARANOIA_CHANCE) {
            let marks = hunter_marks(world);
            if !marks.is_empty() {
                let mark = marks[rng.random_range(0..marks.len())];
                log::debug!("hunter bot: nervous shot at ({:.0}, {:.0})", mark.x, mark.y);
                input = to_input(mark - pos);
                input.action = true;
            }
        }

        input
    }

    fn set_state(&mut self, next: HunterState) {
        if std::mem::discriminant(&next) != std::mem::discriminant(&self.state) {
            log::debug!("hunter bot: {:?} -> {:?}", self.state, next);
            self.detour = None;
        }
        self.state = next;
    }

    /// True once the hunter has tried to move for `STUCK_TIME` without
    /// leaving a small circle around where it started trying
    ///
    /// Net displacement is measured rather than per-tick movement, so
    /// jittering in place against an obstacle also counts.
    fn check_stuck(&mut self, pos: Vec2, dt: f32) -> bool {
        if !self.was_moving {
            self.stuck_anchor = None;
            self.stuck_for = 0.0;
            return false;
        }
        match self.stuck_anchor {
            Some(anchor) if pos.distance(anchor) < STUCK_EPSILON => self.stuck_for += dt,
            _ => {
                self.stuck_anchor = Some(pos);
                self.stuck_for = 0.0;
            }
        }
        if self.stuck_for < STUCK_TIME {
            return false;
        }
        log::debug!("hunter bot: stuck at ({:.0}, {:.0})", pos.x, pos.y);
        self.stuck_anchor = None;
        self.stuck_for = 0.0;
        true
    }

    /// Patrols give up their target; errands that must go on detour around
    /// the obstacle instead
    fn unstick<R: Rng>(&mut self, world: &WorldState, rng: &mut R) {
        let goal = match self.state {
            HunterState::Patrol { .. } => {
                self.set_state(HunterState::Idle { remaining: 0.0 });
                return;
            }
            HunterState::Idle { .. } => return,
            HunterState::ReturnCabin => world.map.door_point(),
            HunterState::Chase { target } => target,
        };
        let waypoint = detour_waypoint(world, goal, rng);
        log::debug!("hunter bot: detour via ({:.0}, {:.0})", waypoint.x, waypoint.y);
        self.detour = Some(Detour {
            waypoint,
            remaining: DETOUR_TIME,
        });
    }

    fn follow_detour(&mut self, pos: Vec2, dt: f32) -> Option<Intent> {
        let detour = self.detour.as_mut()?;
        detour.remaining -= dt;
        if detour.remaining <= 0.0 || arrived(pos, detour.waypoint) {
            self.detour = None;
            return None;
        }
        let speed = match self.state {
            HunterState::ReturnCabin => RETURN_SPEED,
            HunterState::Chase { .. } => CHASE_SPEED,
            _ => PATROL_SPEED,
        };
        Some(Intent::toward(pos, detour.waypoint, speed))
    }

    /// A mushroom vanished while the demon was in plain view
    fn watch_for_feeding(&mut self, world: &WorldState) {
        let count = world.pickups.len();
        let vanished = self.pickups_seen.is_some_and(|before| count < before);
        if world.is_night {
            self.witnessed_eating = false;
        } else if vanished && hunter_sees_demon(world) {
            if !self.witnessed_eating {
                log::debug!("hunter bot: saw the demon feeding");
            }
            self.witnessed_eating = true;
        }
        self.pickups_seen = Some(count);
    }

    fn pick_state(&mut self, world: &WorldState) {
        if world.is_night {
            self.set_state(HunterState::ReturnCabin);
        } else if self.witnessed_eating {
            self.set_state(HunterState::Chase {
                target: world.demon.body.pos,
            });
        } else if matches!(self.state, HunterState::ReturnCabin | HunterState::Chase { .. }) {
            self.set_state(HunterState::Idle { remaining: 0.0 });
        }
    }

    fn act<R: Rng>(&mut self, world: &WorldState, rng: &mut R, dt: f32) -> Intent {
        let pos = world.hunter.body.pos;
        match self.state {
            HunterState::ReturnCabin => {
                let door = world.map.door_point();
                if pos.distance(door) <= DOOR_STANDOFF {
                    Intent::hold()
                } else {
                    Intent::toward(pos, door, RETURN_SPEED)
                }
            }
            HunterState::Chase { target } => Intent::toward(pos, target, CHASE_SPEED),
            HunterState::Idle { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    let target = pick_patrol_target(world, rng);
                    self.set_state(HunterState::Patrol { target });
                    Intent::toward(pos, target, PATROL_SPEED)
                } else {
                    self.state = HunterState::Idle { remaining };
                    Intent::hold()
                }
            }
            HunterState::Patrol { target } => {
                if arrived(pos, target) {
                    self.set_state(HunterState::Idle {
                        remaining: rng.random_range(HUNTER_IDLE_TIME.0..HUNTER_IDLE_TIME.1),
                    });
                    Intent::hold()
                } else {
                    Intent::toward(pos, target, PATROL_SPEED)
                }
            }
        }
    }
}

/// Will the facing after this tick's input point at `target`?
fn aligned(current_angle: f32, input: &PlayerInput, pos: Vec2, target: Vec2) -> bool {
    let facing = if input.is_moving() {
        bearing(input.move_vector())
    } else {
        current_angle
    };
    let wanted = bearing(target - pos);
    angle_between(facing, wanted).abs() <= FIRE_TOLERANCE
}

/// A point a little way around the obstacle nearest the hunter
///
/// The waypoint is swept around the obstacle toward `goal`; when the goal
/// lies dead ahead the side is a coin flip. Pinned against the map edge with
/// no obstacle nearby, the hunter sidesteps instead.
fn detour_waypoint<R: Rng>(world: &WorldState, goal: Vec2, rng: &mut R) -> Vec2 {
    let pos = world.hunter.body.pos;
    let radius = world.hunter.body.size;
    let to_goal = (goal - pos).normalize_or_zero();
    let nearest = world
        .map
        .blockers()
        .map(|f| (f.clearance(pos, radius).0, f))
        .min_by(|a, b| a.0.total_cmp(&b.0));

    let waypoint = match nearest {
        Some((gap, footprint)) if gap < AVOID_RANGE => {
            let out = pos - footprint.center();
            let side = detour_side(out.normalize_or_zero().perp().dot(to_goal), rng);
            let angle = bearing(out) + side * DETOUR_ARC;
            footprint.center() + heading(angle) * (out.length() + DETOUR_MARGIN)
        }
        _ => {
            let side = detour_side(0.0, rng);
            pos + to_goal.perp() * side * (radius + DETOUR_MARGIN)
        }
    };
    waypoint.clamp(Vec2::splat(radius), world.map.bounds() - radius)
}

/// +1 or -1 following `lean`, random when it is too small to matter
fn detour_side<R: Rng>(lean: f32, rng: &mut R) -> f32 {
    if lean.abs() > 0.2 {
        lean.signum()
    } else if rng.random_bool(0.5) {
        1.0
    } else {
        -1.0
    }
}

/// A distant mushroom, or a random open spot far enough away
fn pick_patrol_target<R: Rng>(world: &WorldState, rng: &mut R) -> Vec2 {
    let pos = world.hunter.body.pos;
    let far_pickups: Vec<Vec2> = world
        .pickups
        .iter()
        .map(|p| p.pos)
        .filter(|p| p.distance(pos) >= MIN_PATROL_DISTANCE)
        .collect();
    if !far_pickups.is_empty() && rng.random_bool(PICKUP_PATROL_CHANCE) {
        return far_pickups[rng.random_range(0..far_pickups.len())];
    }
    let mut spot = random_open_point(rng, &world.map, HUNTER_RADIUS);
    for _ in 0..PLACEMENT_ATTEMPTS {
        if spot.distance(pos) >= MIN_PATROL_DISTANCE {
            break;
        }
        spot = random_open_point(rng, &world.map, HUNTER_RADIUS);
    }
    spot
}
