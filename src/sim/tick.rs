//! Fixed timestep simulation tick
//!
//! `advance` is the only writer of `WorldState`. It takes the previous state
//! by reference and returns the next one, so readers (interpolation buffers,
//! the broadcast encoder) always hold a complete snapshot.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::{circle_vs_circle, out_of_bounds, position_blocked};
use super::spawn::{respawn, wander_timer};
use super::state::{EventKind, GamePhase, Projectile, StaticMap, WorldState};
use crate::consts::*;
use crate::{bearing, heading, normalize_angle};

/// Input for one combatant for a single tick
///
/// Any combination is accepted; opposite directions cancel out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Hunter: fire. Demon: eat (day).
    pub action: bool,
    /// Demon: tracking skill (night)
    pub skill: bool,
}

impl PlayerInput {
    /// Normalized movement direction (screen coordinates, +y is down)
    pub fn move_vector(&self) -> Vec2 {
        let x = self.right as i8 - self.left as i8;
        let y = self.down as i8 - self.up as i8;
        Vec2::new(x as f32, y as f32).normalize_or_zero()
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.move_vector() != Vec2::ZERO
    }
}

/// Advance the world by one timestep
///
/// Returns the state unchanged unless the match is `Playing`.
pub fn advance(
    state: &WorldState,
    hunter_input: &PlayerInput,
    demon_input: &PlayerInput,
    dt: f32,
) -> WorldState {
    let mut next = state.clone();
    if next.phase != GamePhase::Playing {
        return next;
    }

    let mut rng = next.tick_rng();
    next.tick += 1;

    decay_log(&mut next, dt);
    update_cycle(&mut next, &mut rng, dt);

    // Projectiles spawned this tick resolve at the muzzle before moving
    let first_new_id = next.peek_next_id();
    update_hunter(&mut next, hunter_input, dt);
    update_demon(&mut next, demon_input, dt);
    if next.phase.is_game_over() {
        return next;
    }

    update_creatures(&mut next, &mut rng, dt);
    update_projectiles(&mut next, first_new_id, dt);
    next.projectiles.retain(|p| p.alive);

    next.normalize_order();
    next
}

/// Age the event log and drop expired entries
fn decay_log(state: &mut WorldState, dt: f32) {
    for entry in &mut state.log {
        entry.remaining -= dt;
    }
    state.log.retain(|e| e.remaining > 0.0);
}

/// Advance whichever timer is running and flip at most once
///
/// Shooting and eating may push `day_progress` to 1.0 mid-tick; the flip
/// then happens at the start of the next tick.
fn update_cycle<R: Rng>(state: &mut WorldState, rng: &mut R, dt: f32) {
    if state.is_night {
        state.night_elapsed += dt;
        if state.night_elapsed >= NIGHT_DURATION {
            begin_day(state, rng);
        }
    } else {
        state.day_progress = (state.day_progress + dt / DAY_DURATION).min(1.0);
        if state.day_progress >= 1.0 {
            begin_night(state);
        }
    }
}

fn begin_night(state: &mut WorldState) {
    state.is_night = true;
    state.day_progress = 1.0;
    state.night_elapsed = 0.0;

    state.hunter.in_cabin = false;
    state.hunter.door_timer = 0.0;

    state.demon.tracking_charge = true;
    state.demon.tracking_remaining = 0.0;
    state.demon.revealed = true;

    log::info!("Night falls (tick {})", state.tick);
    state.push_event(EventKind::NightFalls);
}

fn begin_day<R: Rng>(state: &mut WorldState, rng: &mut R) {
    state.is_night = false;
    state.day_progress = 0.0;
    state.night_elapsed = 0.0;

    if state.hunter.in_cabin {
        state.hunter.body.pos = state.map.door_point();
    }
    state.hunter.in_cabin = false;
    state.hunter.door_timer = 0.0;

    state.demon.stun_remaining = 0.0;
    state.demon.tracking_remaining = 0.0;
    state.demon.tracking_charge = false;
    state.demon.revealed = false;

    respawn(state, rng);

    log::info!("Dawn breaks (tick {})", state.tick);
    state.push_event(EventKind::DawnBreaks);
}

/// Move a circle by `delta`, sliding along obstacles
///
/// Tries the full displacement first, then X alone, then Y alone.
/// Returns the original position if every option is blocked.
pub fn slide_move(pos: Vec2, radius: f32, delta: Vec2, map: &StaticMap) -> Vec2 {
    if delta == Vec2::ZERO {
        return pos;
    }
    let bounds = map.bounds();
    let free = |p: Vec2| !position_blocked(p, radius, bounds, map.blockers());

    let full = pos + delta;
    if free(full) {
        return full;
    }
    let x_only = pos + Vec2::new(delta.x, 0.0);
    if delta.x != 0.0 && free(x_only) {
        return x_only;
    }
    let y_only = pos + Vec2::new(0.0, delta.y);
    if delta.y != 0.0 && free(y_only) {
        return y_only;
    }
    pos
}

fn update_hunter(state: &mut WorldState, input: &PlayerInput, dt: f32) {
    if state.hunter.in_cabin {
        return;
    }
    let map = state.map.clone();
    let door = map.door_point();
    let is_night = state.is_night;

    // Movement
    let dir = input.move_vector();
    let hunter = &mut state.hunter;
    let old = hunter.body.pos;
    hunter.body.pos = slide_move(old, hunter.body.size, dir * HUNTER_SPEED * dt, &map);
    hunter.vel = if dt > 0.0 {
        (hunter.body.pos - old) / dt
    } else {
        Vec2::ZERO
    };
    if dir != Vec2::ZERO {
        hunter.body.angle = bearing(dir);
    }

    // Cabin refuge (night only)
    let mut sheltered_now = false;
    if is_night {
        if hunter.body.pos.distance(door) <= CABIN_INTERACT_RADIUS {
            hunter.door_timer += dt;
            if hunter.door_timer >= CABIN_ENTER_TIME {
                hunter.in_cabin = true;
                hunter.door_timer = 0.0;
                hunter.vel = Vec2::ZERO;
                sheltered_now = true;
            }
        } else {
            hunter.door_timer = 0.0;
        }
    }

    // Shooting
    hunter.cooldown = (hunter.cooldown - dt).max(0.0);
    let fire = input.action && hunter.cooldown <= 0.0 && !hunter.in_cabin;
    if fire {
        hunter.cooldown = SHOOT_COOLDOWN;
        hunter.shots_fired += 1;
    }
    let muzzle = hunter.body.pos;
    let aim = heading(hunter.body.angle);

    if sheltered_now {
        log::info!("Hunter sheltered in the cabin (tick {})", state.tick);
        state.push_event(EventKind::HunterSheltered);
    }
    if fire {
        let id = state.next_entity_id();
        state.projectiles.push(Projectile {
            id,
            pos: muzzle,
            vel: aim * BULLET_SPEED,
            alive: true,
        });
        if !is_night {
            // Shooting in daylight hastens nightfall
            state.day_progress = (state.day_progress + SHOOT_PENALTY / DAY_DURATION).min(1.0);
        }
    }
}

fn update_demon(state: &mut WorldState, input: &PlayerInput, dt: f32) {
    let demon = &mut state.demon;
    if demon.is_stunned() {
        demon.stun_remaining = (demon.stun_remaining - dt).max(0.0);
        demon.vel = Vec2::ZERO;
        return;
    }
    demon.cooldown = (demon.cooldown - dt).max(0.0);
    demon.tracking_remaining = (demon.tracking_remaining - dt).max(0.0);

    let map = state.map.clone();
    let is_night = state.is_night;

    // Movement
    let speed = if is_night {
        DEMON_SPEED * DEMON_NIGHT_SPEED_MULT
    } else {
        DEMON_SPEED
    };
    let dir = input.move_vector();
    let old = demon.body.pos;
    demon.body.pos = slide_move(old, demon.body.size, dir * speed * dt, &map);
    demon.vel = if dt > 0.0 {
        (demon.body.pos - old) / dt
    } else {
        Vec2::ZERO
    };
    if dir != Vec2::ZERO {
        demon.body.angle = bearing(dir);
    }

    if is_night {
        if input.skill && demon.tracking_charge {
            demon.tracking_charge = false;
            demon.tracking_remaining = TRACKING_DURATION;
            state.push_event(EventKind::TrackingUsed);
        }
    } else if input.action {
        try_eat(state);
    }

    // Night contact kill
    let hunter = &state.hunter;
    let demon = &state.demon;
    if is_night
        && !hunter.in_cabin
        && circle_vs_circle(hunter.body.pos, hunter.body.size, demon.body.pos, demon.body.size)
    {
        log::info!("Demon caught the hunter (tick {})", state.tick);
        state.phase = GamePhase::GameOverDemonWins;
        state.push_event(EventKind::DemonWins);
    }
}

/// Eat the nearest mushroom within reach (at most one per tick)
fn try_eat(state: &mut WorldState) {
    let mouth = state.demon.body.pos;
    let nearest = state
        .pickups
        .iter()
        .enumerate()
        .map(|(i, p)| (i, p.pos.distance(mouth)))
        .filter(|&(_, d)| d <= EAT_RADIUS)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i);

    let Some(index) = nearest else {
        return;
    };
    state.pickups.remove(index);
    // Feeding hastens nightfall
    state.day_progress = (state.day_progress + EAT_BONUS / DAY_DURATION).min(1.0);
    state.push_event(EventKind::DemonAte);
}

/// Stop/go wandering; creatures turn around instead of sliding
fn update_creatures<R: Rng>(state: &mut WorldState, rng: &mut R, dt: f32) {
    let map = state.map.clone();
    let bounds = map.bounds();

    for creature in &mut state.creatures {
        creature.ai.countdown_ticks = creature.ai.countdown_ticks.saturating_sub(1);
        if creature.ai.countdown_ticks == 0 {
            let moving = !creature.ai.moving;
            creature.ai = wander_timer(moving, rng);
            if moving {
                let octant = rng.random_range(0..8) as f32;
                creature.body.angle = normalize_angle(octant * std::f32::consts::FRAC_PI_4);
            }
        }

        if creature.ai.moving {
            let target = creature.body.pos + heading(creature.body.angle) * CREATURE_SPEED * dt;
            if position_blocked(target, creature.body.size, bounds, map.blockers()) {
                creature.body.angle = normalize_angle(creature.body.angle + std::f32::consts::PI);
            } else {
                creature.body.pos = target;
            }
        }
    }
}

fn update_projectiles(state: &mut WorldState, first_new_id: u32, dt: f32) {
    let map = state.map.clone();
    let bounds = map.bounds();
    let is_night = state.is_night;
    let mut events = Vec::new();

    for bullet in &mut state.projectiles {
        if !bullet.alive {
            continue;
        }
        if bullet.id < first_new_id {
            bullet.pos += bullet.vel * dt;
        }

        if out_of_bounds(bullet.pos, bounds)
            || map
                .blockers()
                .any(|f| f.overlaps_circle(bullet.pos, BULLET_RADIUS))
        {
            bullet.alive = false;
            continue;
        }

        let demon = &mut state.demon;
        if circle_vs_circle(bullet.pos, BULLET_RADIUS, demon.body.pos, demon.body.size) {
            bullet.alive = false;
            if is_night {
                demon.stun_remaining = STUN_DURATION;
                demon.vel = Vec2::ZERO;
                events.push(EventKind::DemonStunned);
            } else {
                demon.revealed = true;
                state.phase = GamePhase::GameOverHunterWins;
                events.push(EventKind::HunterWins);
                break;
            }
            continue;
        }

        if let Some(index) = state
            .creatures
            .iter()
            .position(|c| circle_vs_circle(bullet.pos, BULLET_RADIUS, c.body.pos, c.body.size))
        {
            bullet.alive = false;
            state.creatures.remove(index);
            events.push(EventKind::CreatureShot);
        }
    }

    if state.phase == GamePhase::GameOverHunterWins {
        log::info!("Hunter shot the demon in daylight (tick {})", state.tick);
    }
    for kind in events {
        state.push_event(kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Creature, Entity, EntityKind, Pickup, WanderTimer};

    const EPS: f32 = 1e-3;

    fn open_world() -> WorldState {
        let map = StaticMap::open(MAP_WIDTH, MAP_HEIGHT, Vec2::new(1700.0, 1300.0));
        WorldState::new(
            1234,
            map,
            Vec2::new(500.0, 500.0),
            Vec2::new(1200.0, 400.0),
        )
    }

    fn with_tree(mut state: WorldState, pos: Vec2, size: f32) -> WorldState {
        let mut map = (*state.map).clone();
        map.trees.push(Entity::new(900, EntityKind::Tree, pos, size));
        state.map = std::sync::Arc::new(map);
        state
    }

    fn right() -> PlayerInput {
        PlayerInput {
            right: true,
            ..Default::default()
        }
    }

    fn idle() -> PlayerInput {
        PlayerInput::default()
    }

    #[test]
    fn test_straight_move_covers_speed_times_dt() {
        let state = open_world();
        let next = advance(&state, &right(), &idle(), SIM_DT);
        let moved = next.hunter.body.pos - state.hunter.body.pos;
        assert!((moved.x - HUNTER_SPEED * SIM_DT).abs() < EPS);
        assert!(moved.y.abs() < EPS);
        assert!(next.hunter.body.angle.abs() < EPS);

        // Diagonal input is normalized
        let diag = PlayerInput {
            up: true,
            left: true,
            ..Default::default()
        };
        let next = advance(&state, &diag, &idle(), SIM_DT);
        let moved = next.hunter.body.pos - state.hunter.body.pos;
        assert!((moved.length() - HUNTER_SPEED * SIM_DT).abs() < EPS);
        assert!(moved.x < 0.0 && moved.y < 0.0);
    }

    #[test]
    fn test_demon_moves_faster_at_night() {
        let mut state = open_world();
        let left = PlayerInput {
            left: true,
            ..Default::default()
        };
        let day = advance(&state, &idle(), &left, SIM_DT);
        let day_step = state.demon.body.pos.x - day.demon.body.pos.x;
        assert!((day_step - DEMON_SPEED * SIM_DT).abs() < EPS);

        state.is_night = true;
        state.day_progress = 1.0;
        let night = advance(&state, &idle(), &left, SIM_DT);
        let night_step = state.demon.body.pos.x - night.demon.body.pos.x;
        assert!((night_step - DEMON_SPEED * DEMON_NIGHT_SPEED_MULT * SIM_DT).abs() < EPS);
    }

    #[test]
    fn test_diagonal_into_obstacle_slides_along_free_axis() {
        // Tree box spans y 516..544; the hunter's edge sits 1px above it
        let state = with_tree(open_world(), Vec2::new(500.0, 530.0), 40.0);
        let down_right = PlayerInput {
            down: true,
            right: true,
            ..Default::default()
        };
        let next = advance(&state, &down_right, &idle(), SIM_DT);
        let moved = next.hunter.body.pos - state.hunter.body.pos;
        let step = HUNTER_SPEED * SIM_DT * std::f32::consts::FRAC_1_SQRT_2;
        assert!((moved.x - step).abs() < EPS, "should slide along x: {:?}", moved);
        assert!(moved.y.abs() < EPS);
    }

    #[test]
    fn test_blocked_head_on_stops() {
        let state = with_tree(open_world(), Vec2::new(530.0, 500.0), 40.0);
        let next = advance(&state, &right(), &idle(), SIM_DT);
        assert_eq!(next.hunter.body.pos, state.hunter.body.pos);
    }

    #[test]
    fn test_night_falls_exactly_once() {
        let mut state = open_world();
        state.day_progress = 1.0 - 0.001;
        let next = advance(&state, &idle(), &idle(), 5.0);
        assert!(next.is_night);
        assert_eq!(next.day_progress, 1.0);
        assert_eq!(next.night_elapsed, 0.0);
        assert!(next.demon.tracking_charge);
        assert!(next.demon.revealed);

        let later = advance(&next, &idle(), &idle(), SIM_DT);
        assert!(later.is_night);
        assert_eq!(later.day_progress, 1.0);
        assert!((later.night_elapsed - SIM_DT).abs() < EPS);
        let nightfalls = later
            .log
            .iter()
            .filter(|e| e.kind == EventKind::NightFalls)
            .count();
        assert_eq!(nightfalls, 1);
    }

    #[test]
    fn test_dawn_resets_and_respawns() {
        let mut state = open_world();
        state.is_night = true;
        state.day_progress = 1.0;
        state.night_elapsed = NIGHT_DURATION - 0.001;
        state.hunter.in_cabin = true;
        state.demon.stun_remaining = 1.0;
        state.demon.tracking_charge = true;

        let next = advance(&state, &idle(), &idle(), SIM_DT);
        assert!(!next.is_night);
        assert!(!next.hunter.in_cabin);
        assert_eq!(next.hunter.body.pos, next.map.door_point());
        assert_eq!(next.demon.stun_remaining, 0.0);
        assert!(!next.demon.tracking_charge);
        assert_eq!(next.pickups.len(), PICKUP_COUNT);
        assert_eq!(next.creatures.len(), CREATURE_COUNT);
        assert!(next.log.iter().any(|e| e.kind == EventKind::DawnBreaks));
    }

    #[test]
    fn test_shooting_scenario() {
        let mut state = open_world();
        state.hunter.body.pos = Vec2::new(100.0, 100.0);
        state.hunter.body.angle = 0.0;
        state.hunter.cooldown = 0.0;
        state.day_progress = 0.2;

        let fire = PlayerInput {
            action: true,
            ..Default::default()
        };
        let baseline = advance(&state, &idle(), &idle(), SIM_DT);
        let next = advance(&state, &fire, &idle(), SIM_DT);

        assert_eq!(next.projectiles.len(), 1);
        let bullet = &next.projectiles[0];
        assert_eq!(bullet.pos, Vec2::new(100.0, 100.0));
        assert!((bullet.vel - Vec2::new(BULLET_SPEED, 0.0)).length() < EPS);
        assert_eq!(next.hunter.cooldown, SHOOT_COOLDOWN);
        let penalty = next.day_progress - baseline.day_progress;
        assert!((penalty - SHOOT_PENALTY / DAY_DURATION).abs() < 1e-5);

        // The bullet flies on the following tick
        let after = advance(&next, &idle(), &idle(), SIM_DT);
        assert!((after.projectiles[0].pos.x - (100.0 + BULLET_SPEED * SIM_DT)).abs() < EPS);
    }

    #[test]
    fn test_cooldown_blocks_second_shot() {
        let mut state = open_world();
        state.hunter.cooldown = 0.3;
        let fire = PlayerInput {
            action: true,
            ..Default::default()
        };
        let next = advance(&state, &fire, &idle(), SIM_DT);
        assert!(next.projectiles.is_empty());
        assert_eq!(next.hunter.shots_fired, 0);
    }

    #[test]
    fn test_night_shot_has_no_daylight_penalty() {
        let mut state = open_world();
        state.is_night = true;
        state.day_progress = 1.0;
        let fire = PlayerInput {
            action: true,
            ..Default::default()
        };
        let next = advance(&state, &fire, &idle(), SIM_DT);
        assert_eq!(next.projectiles.len(), 1);
        assert_eq!(next.day_progress, 1.0);
    }

    #[test]
    fn test_eating_consumes_one_pickup_per_tick() {
        let mut state = open_world();
        let demon = state.demon.body.pos;
        state.pickups = vec![
            Pickup {
                id: 500,
                pos: demon + Vec2::new(20.0, 0.0),
            },
            Pickup {
                id: 501,
                pos: demon + Vec2::new(0.0, 10.0),
            },
            Pickup {
                id: 502,
                pos: demon + Vec2::new(300.0, 0.0),
            },
        ];
        state.day_progress = 0.1;

        let eat = PlayerInput {
            action: true,
            ..Default::default()
        };
        let baseline = advance(&state, &idle(), &idle(), SIM_DT);
        let next = advance(&state, &idle(), &eat, SIM_DT);

        assert_eq!(next.pickups.len(), 2);
        // The nearest one went
        assert!(next.pickups.iter().all(|p| p.id != 501));
        let bonus = next.day_progress - baseline.day_progress;
        assert!((bonus - EAT_BONUS / DAY_DURATION).abs() < 1e-5);
    }

    #[test]
    fn test_demon_cannot_eat_at_night() {
        let mut state = open_world();
        state.is_night = true;
        state.day_progress = 1.0;
        state.pickups = vec![Pickup {
            id: 500,
            pos: state.demon.body.pos,
        }];
        let eat = PlayerInput {
            action: true,
            ..Default::default()
        };
        let next = advance(&state, &idle(), &eat, SIM_DT);
        assert_eq!(next.pickups.len(), 1);
    }

    #[test]
    fn test_tracking_charge_is_one_shot() {
        let mut state = open_world();
        state.is_night = true;
        state.day_progress = 1.0;
        state.demon.tracking_charge = true;
        let skill = PlayerInput {
            skill: true,
            ..Default::default()
        };
        let next = advance(&state, &idle(), &skill, SIM_DT);
        assert!(!next.demon.tracking_charge);
        assert!((next.demon.tracking_remaining - TRACKING_DURATION).abs() < EPS);

        let again = advance(&next, &idle(), &skill, SIM_DT);
        assert!(again.demon.tracking_remaining < next.demon.tracking_remaining);
    }

    #[test]
    fn test_projectile_hit_day_vs_night() {
        let mut state = open_world();
        state.hunter.body.pos = Vec2::new(1100.0, 400.0);
        state.hunter.body.angle = 0.0;
        let fire = PlayerInput {
            action: true,
            ..Default::default()
        };

        // Daylight: the demon is exposed and the hunter wins
        let mut day = advance(&state, &fire, &idle(), SIM_DT);
        for _ in 0..30 {
            day = advance(&day, &idle(), &idle(), SIM_DT);
        }
        assert_eq!(day.phase, GamePhase::GameOverHunterWins);
        assert!(day.demon.revealed);

        // Night: the demon is only stunned
        state.is_night = true;
        state.day_progress = 1.0;
        let mut night = advance(&state, &fire, &idle(), SIM_DT);
        let mut stunned = false;
        for _ in 0..30 {
            night = advance(&night, &idle(), &idle(), SIM_DT);
            stunned |= night.demon.is_stunned();
        }
        assert_eq!(night.phase, GamePhase::Playing);
        assert!(stunned);
        assert!(night.projectiles.is_empty());
    }

    #[test]
    fn test_stunned_demon_cannot_move() {
        let mut state = open_world();
        state.demon.stun_remaining = 1.0;
        let left = PlayerInput {
            left: true,
            ..Default::default()
        };
        let next = advance(&state, &idle(), &left, SIM_DT);
        assert_eq!(next.demon.body.pos, state.demon.body.pos);
        assert!((next.demon.stun_remaining - (1.0 - SIM_DT)).abs() < EPS);
    }

    #[test]
    fn test_night_contact_kills_unsheltered_hunter() {
        let mut state = open_world();
        state.is_night = true;
        state.day_progress = 1.0;
        state.demon.body.pos = state.hunter.body.pos + Vec2::new(20.0, 0.0);
        let next = advance(&state, &idle(), &idle(), SIM_DT);
        assert_eq!(next.phase, GamePhase::GameOverDemonWins);
    }

    #[test]
    fn test_sheltered_hunter_is_immune() {
        let mut state = open_world();
        state.is_night = true;
        state.day_progress = 1.0;
        state.hunter.in_cabin = true;
        state.demon.body.pos = state.hunter.body.pos;
        let next = advance(&state, &idle(), &idle(), SIM_DT);
        assert_eq!(next.phase, GamePhase::Playing);
    }

    #[test]
    fn test_stunned_demon_does_not_kill() {
        let mut state = open_world();
        state.is_night = true;
        state.day_progress = 1.0;
        state.demon.stun_remaining = 2.0;
        state.demon.body.pos = state.hunter.body.pos;
        let next = advance(&state, &idle(), &idle(), SIM_DT);
        assert_eq!(next.phase, GamePhase::Playing);
    }

    #[test]
    fn test_hunter_enters_cabin_after_dwelling() {
        let mut state = open_world();
        state.is_night = true;
        state.day_progress = 1.0;
        state.hunter.body.pos = state.map.door_point();

        let ticks = (CABIN_ENTER_TIME / SIM_DT).ceil() as usize + 1;
        for _ in 0..ticks {
            state = advance(&state, &idle(), &idle(), SIM_DT);
        }
        assert!(state.hunter.in_cabin);
        assert!(state.log.iter().any(|e| e.kind == EventKind::HunterSheltered));

        // Sheltered hunters neither move nor shoot
        let fire_and_run = PlayerInput {
            action: true,
            left: true,
            ..Default::default()
        };
        let next = advance(&state, &fire_and_run, &idle(), SIM_DT);
        assert_eq!(next.hunter.body.pos, state.hunter.body.pos);
        assert!(next.projectiles.is_empty());
    }

    #[test]
    fn test_leaving_door_resets_timer() {
        let mut state = open_world();
        state.is_night = true;
        state.day_progress = 1.0;
        state.hunter.body.pos = state.map.door_point();
        state = advance(&state, &idle(), &idle(), 0.5);
        assert!(state.hunter.door_timer > 0.0);

        state.hunter.body.pos = state.map.door_point() + Vec2::new(200.0, 0.0);
        state = advance(&state, &idle(), &idle(), SIM_DT);
        assert_eq!(state.hunter.door_timer, 0.0);
    }

    #[test]
    fn test_creature_reverses_when_blocked() {
        let mut state = open_world();
        let mut body = Entity::new(700, EntityKind::Creature, Vec2::new(CREATURE_RADIUS + 0.5, 300.0), CREATURE_RADIUS);
        body.angle = std::f32::consts::PI; // heading into the west edge
        state.creatures.push(Creature {
            body,
            ai: WanderTimer {
                moving: true,
                countdown_ticks: 100,
            },
        });

        let next = advance(&state, &idle(), &idle(), SIM_DT);
        let creature = &next.creatures[0];
        assert_eq!(creature.body.pos, state.creatures[0].body.pos);
        assert!(creature.body.angle.abs() < EPS);
    }

    #[test]
    fn test_creature_shot_removes_both() {
        let mut state = open_world();
        state.hunter.body.angle = 0.0;
        state.creatures.push(Creature {
            body: Entity::new(700, EntityKind::Creature, Vec2::new(560.0, 500.0), CREATURE_RADIUS),
            ai: WanderTimer {
                moving: false,
                countdown_ticks: 1000,
            },
        });
        let fire = PlayerInput {
            action: true,
            ..Default::default()
        };
        let mut next = advance(&state, &fire, &idle(), SIM_DT);
        for _ in 0..10 {
            next = advance(&next, &idle(), &idle(), SIM_DT);
        }
        assert!(next.creatures.is_empty());
        assert!(next.projectiles.is_empty());
    }

    #[test]
    fn test_projectile_dies_on_tree_and_bounds() {
        let mut state = with_tree(open_world(), Vec2::new(600.0, 500.0), 40.0);
        state.hunter.body.angle = 0.0;
        let fire = PlayerInput {
            action: true,
            ..Default::default()
        };
        let mut next = advance(&state, &fire, &idle(), SIM_DT);
        for _ in 0..10 {
            next = advance(&next, &idle(), &idle(), SIM_DT);
        }
        assert!(next.projectiles.is_empty());

        let mut edge = open_world();
        edge.hunter.body.angle = std::f32::consts::PI;
        let mut next = advance(&edge, &fire, &idle(), SIM_DT);
        for _ in 0..60 {
            next = advance(&next, &idle(), &idle(), SIM_DT);
        }
        assert!(next.projectiles.is_empty());
    }

    #[test]
    fn test_game_over_is_absorbing() {
        let mut state = open_world();
        state.phase = GamePhase::GameOverDemonWins;
        let next = advance(&state, &right(), &right(), SIM_DT);
        assert_eq!(next, state);
    }

    #[test]
    fn test_log_entries_expire() {
        let mut state = open_world();
        state.push_event(EventKind::CreatureShot);
        let next = advance(&state, &idle(), &idle(), LOG_ENTRY_TTL + 0.1);
        assert!(next.log.iter().all(|e| e.kind != EventKind::CreatureShot));
    }

    #[test]
    fn test_advance_is_deterministic() {
        let state = crate::sim::spawn::generate_world(77);
        let mut a = state.clone();
        let mut b = state;
        for i in 0..200 {
            let input = PlayerInput {
                right: i % 3 == 0,
                down: i % 5 == 0,
                action: i % 7 == 0,
                ..Default::default()
            };
            a = advance(&a, &input, &input, SIM_DT);
            b = advance(&b, &input, &input, SIM_DT);
        }
        assert_eq!(a, b);
    }
}
