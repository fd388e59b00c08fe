//! Demon bot
//!
//! By day the demon hides among the wildlife: it forages for mushrooms and,
//! when the hunter is close enough to notice, freezes into the same stop/go
//! shuffle the creatures use. By night it hunts.

use glam::Vec2;
use rand::Rng;

use super::perception::{can_see, observer_radius};
use super::steering::{Intent, Throttle, arrived, resolve};
use crate::consts::*;
use crate::heading;
use crate::sim::spawn::random_open_point;
use crate::sim::{GamePhase, PlayerInput, WorldState};

/// Night vision radius in the open (the demon sees further in the dark than the hunter)
pub const DEMON_NIGHT_VISION: f32 = 460.0;
/// By day, react to a hunter seen within this distance (less from inside a bush)
pub const DEMON_DAY_ALERT_RANGE: f32 = 280.0;
/// Seconds spent around the last known hunter position
pub const INVESTIGATE_TIME: f32 = 5.0;
/// Random candidates considered per patrol pick
pub const PATROL_CANDIDATES: usize = 6;
/// Weight of the distance from the demon itself
pub const PATROL_SELF_WEIGHT: f32 = 1.0;
/// Weight of the distance from the previous patrol point
pub const PATROL_PREV_WEIGHT: f32 = 0.5;
/// Seconds of night without contact before the tracking skill is spent
pub const TRACKING_USE_DELAY: f32 = 12.0;

const CHASE_SPEED: f32 = 1.0;
const PATROL_SPEED: f32 = 0.7;
const INVESTIGATE_SPEED: f32 = 0.8;
const FORAGE_SPEED: f32 = 0.55;
const WANDER_SPEED: f32 = 0.4;
/// Creatures walk much slower than the demon
const MIMIC_SPEED: f32 = CREATURE_SPEED / DEMON_SPEED;
/// Stop/go phase length while mimicking (seconds)
const MIMIC_PHASE: (f32, f32) = (0.7, 2.5);
/// Start eating a bit inside the eat radius
const EAT_REACH: f32 = EAT_RADIUS * 0.75;

/// Demon behavior state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DemonState {
    /// Night: sweep the map
    Patrol { destination: Option<Vec2> },
    /// Night: head for the hunter's live position
    Chase { target: Vec2 },
    /// Night: search where the hunter was last seen
    Investigate { anchor: Vec2, remaining: f32 },
    /// Day: go for mushrooms, or wander when there are none
    Forage { wander: Option<Vec2> },
    /// Day: imitate creature movement while the hunter watches
    Mimic {
        heading: Vec2,
        moving: bool,
        remaining: f32,
    },
}

/// Drives the demon
#[derive(Debug, Clone)]
pub struct DemonBot {
    state: DemonState,
    previous_patrol: Option<Vec2>,
    throttle: Throttle,
}

impl Default for DemonBot {
    fn default() -> Self {
        Self::new()
    }
}

impl DemonBot {
    pub fn new() -> Self {
        Self {
            state: DemonState::Forage { wander: None },
            previous_patrol: None,
            throttle: Throttle::default(),
        }
    }

    pub fn state(&self) -> &DemonState {
        &self.state
    }

    /// Decide this tick's input
    pub fn think<R: Rng>(&mut self, world: &WorldState, rng: &mut R, dt: f32) -> PlayerInput {
        if world.phase != GamePhase::Playing || world.demon.is_stunned() {
            return PlayerInput::default();
        }
        let intent = if world.is_night {
            self.night(world, rng, dt)
        } else {
            self.day(world, rng, dt)
        };
        resolve(
            intent,
            world.demon.body.pos,
            world.demon.body.size,
            &world.map,
            &mut self.throttle,
        )
    }

    fn set_state(&mut self, next: DemonState) {
        if std::mem::discriminant(&next) != std::mem::discriminant(&self.state) {
            log::debug!("demon bot: {:?} -> {:?}", self.state, next);
        }
        self.state = next;
    }

    fn detects_hunter(world: &WorldState) -> bool {
        let hunter = &world.hunter;
        if hunter.in_cabin {
            return false;
        }
        let eye = world.demon.body.pos;
        world.demon.is_tracking()
            || can_see(
                eye,
                hunter.body.pos,
                observer_radius(DEMON_NIGHT_VISION, eye, &world.map),
                &world.map,
            )
    }

    fn night<R: Rng>(&mut self, world: &WorldState, rng: &mut R, dt: f32) -> Intent {
        let pos = world.demon.body.pos;
        let detected = Self::detects_hunter(world);

        if detected {
            self.set_state(DemonState::Chase {
                target: world.hunter.body.pos,
            });
        } else {
            match self.state {
                DemonState::Chase { target } => self.set_state(DemonState::Investigate {
                    anchor: target,
                    remaining: INVESTIGATE_TIME,
                }),
                DemonState::Forage { .. } | DemonState::Mimic { .. } => {
                    self.set_state(DemonState::Patrol { destination: None })
                }
                _ => {}
            }
        }

        let intent = match self.state {
            DemonState::Chase { target } => Intent::toward(pos, target, CHASE_SPEED),
            DemonState::Investigate { anchor, remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.set_state(DemonState::Patrol { destination: None });
                    Intent::hold()
                } else {
                    self.state = DemonState::Investigate { anchor, remaining };
                    if arrived(pos, anchor) {
                        Intent::hold()
                    } else {
                        Intent::toward(pos, anchor, INVESTIGATE_SPEED)
                    }
                }
            }
            DemonState::Patrol { destination } => {
                let destination = match destination {
                    Some(d) if !arrived(pos, d) => d,
                    previous => self.pick_patrol_point(world, previous, rng),
                };
                self.state = DemonState::Patrol {
                    destination: Some(destination),
                };
                Intent::toward(pos, destination, PATROL_SPEED)
            }
            DemonState::Forage { .. } | DemonState::Mimic { .. } => Intent::hold(),
        };

        let spend_tracking = !detected
            && world.demon.tracking_charge
            && world.night_elapsed >= TRACKING_USE_DELAY;
        intent.with_skill(spend_tracking)
    }

    /// Pick the candidate furthest from both the demon and the last patrol point
    fn pick_patrol_point<R: Rng>(
        &mut self,
        world: &WorldState,
        leaving: Option<Vec2>,
        rng: &mut R,
    ) -> Vec2 {
        let pos = world.demon.body.pos;
        let prev = self.previous_patrol.unwrap_or(pos);
        let score = |c: Vec2| PATROL_SELF_WEIGHT * pos.distance(c) + PATROL_PREV_WEIGHT * prev.distance(c);

        let best = (0..PATROL_CANDIDATES)
            .map(|_| random_open_point(rng, &world.map, DEMON_RADIUS))
            .max_by(|a, b| score(*a).total_cmp(&score(*b)))
            .unwrap_or(pos);
        self.previous_patrol = Some(leaving.unwrap_or(pos));
        log::debug!("demon bot: patrol to ({:.0}, {:.0})", best.x, best.y);
        best
    }

    fn day<R: Rng>(&mut self, world: &WorldState, rng: &mut R, dt: f32) -> Intent {
        let pos = world.demon.body.pos;
        let hunter = &world.hunter;
        let alert = observer_radius(DEMON_DAY_ALERT_RANGE, pos, &world.map);
        let watched = !hunter.in_cabin && can_see(pos, hunter.body.pos, alert, &world.map);

        match (watched, self.state) {
            (true, DemonState::Mimic { .. }) => {}
            (true, _) => self.set_state(DemonState::Mimic {
                heading: random_octant(rng),
                moving: false,
                remaining: rng.random_range(MIMIC_PHASE.0..MIMIC_PHASE.1),
            }),
            (false, DemonState::Forage { .. }) => {}
            (false, _) => self.set_state(DemonState::Forage { wander: None }),
        }

        match self.state {
            DemonState::Mimic {
                heading,
                moving,
                remaining,
            } => {
                let remaining = remaining - dt;
                let (heading, moving, remaining) = if remaining <= 0.0 {
                    let moving = !moving;
                    let heading = if moving { random_octant(rng) } else { heading };
                    (heading, moving, rng.random_range(MIMIC_PHASE.0..MIMIC_PHASE.1))
                } else {
                    (heading, moving, remaining)
                };
                self.state = DemonState::Mimic {
                    heading,
                    moving,
                    remaining,
                };
                if moving {
                    Intent {
                        dir: heading,
                        speed: MIMIC_SPEED,
                        ..Default::default()
                    }
                } else {
                    Intent::hold()
                }
            }
            DemonState::Forage { wander } => {
                let nearest = world
                    .pickups
                    .iter()
                    .map(|p| p.pos)
                    .min_by(|a, b| a.distance(pos).total_cmp(&b.distance(pos)));
                match nearest {
                    Some(food) if food.distance(pos) <= EAT_REACH => Intent::hold().with_action(),
                    Some(food) => Intent::toward(pos, food, FORAGE_SPEED),
                    None => {
                        let target = match wander {
                            Some(w) if !arrived(pos, w) => w,
                            _ => random_open_point(rng, &world.map, DEMON_RADIUS),
                        };
                        self.state = DemonState::Forage {
                            wander: Some(target),
                        };
                        Intent::toward(pos, target, WANDER_SPEED)
                    }
                }
            }
            _ => Intent::hold(),
        }
    }
}

/// One of the eight compass headings creatures walk along
fn random_octant<R: Rng>(rng: &mut R) -> Vec2 {
    heading(rng.random_range(0..8) as f32 * std::f32::consts::FRAC_PI_4)
}
