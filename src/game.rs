//! Local match driver
//!
//! Owns the world and one controller per role (a human's latest input, or a
//! bot), and feeds the fixed-timestep simulation from variable frame times.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::bot::Bot;
use crate::consts::*;
use crate::sim::{GamePhase, PlayerInput, Role, WorldState, advance, generate_world};

/// Who is steering a role
#[derive(Debug, Clone)]
pub enum Controller {
    /// Input comes from `LocalMatch::set_human_input`
    Human,
    Bot(Bot),
}

/// A match played entirely on this machine
pub struct LocalMatch {
    world: WorldState,
    hunter: Controller,
    demon: Controller,
    human_input: PlayerInput,
    bot_rng: Pcg32,
    /// Fixed simulation step (seconds)
    dt: f32,
    accumulator: f32,
}

impl LocalMatch {
    /// New match on a generated map; `human` plays that role, bots play the rest
    pub fn new(seed: u64, human: Option<Role>) -> Self {
        let controller = |role: Role| {
            if human == Some(role) {
                Controller::Human
            } else {
                Controller::Bot(Bot::for_role(role))
            }
        };
        log::info!("Local match (seed {}), human plays {:?}", seed, human);
        Self::with_world(
            generate_world(seed),
            controller(Role::Hunter),
            controller(Role::Demon),
        )
    }

    pub fn with_world(world: WorldState, hunter: Controller, demon: Controller) -> Self {
        // Separate stream from the tick RNG
        let bot_rng = Pcg32::seed_from_u64(world.seed.rotate_left(17) ^ 0xB07);
        Self {
            world,
            hunter,
            demon,
            human_input: PlayerInput::default(),
            bot_rng,
            dt: SIM_DT,
            accumulator: 0.0,
        }
    }

    /// Run the simulation at `physics_hz` instead of the default rate
    pub fn with_physics_hz(mut self, physics_hz: f32) -> Self {
        self.dt = 1.0 / physics_hz;
        self
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn set_human_input(&mut self, input: PlayerInput) {
        self.human_input = input;
    }

    /// Advance by a frame's worth of real time; returns the ticks run
    pub fn frame(&mut self, dt: f32) -> u32 {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= self.dt && substeps < MAX_SUBSTEPS {
            self.step();
            self.accumulator -= self.dt;
            substeps += 1;
        }
        substeps
    }

    /// Run exactly one simulation tick
    pub fn step(&mut self) {
        let (dt, human) = (self.dt, self.human_input);
        let hunter_input = Self::input_for(&mut self.hunter, &self.world, &mut self.bot_rng, human, dt);
        let demon_input = Self::input_for(&mut self.demon, &self.world, &mut self.bot_rng, human, dt);

        let before = self.world.phase;
        self.world = advance(&self.world, &hunter_input, &demon_input, dt);
        if self.world.phase != before {
            log::info!("Phase {:?} -> {:?} at tick {}", before, self.world.phase, self.world.tick);
        }
    }

    fn input_for(
        controller: &mut Controller,
        world: &WorldState,
        rng: &mut Pcg32,
        human_input: PlayerInput,
        dt: f32,
    ) -> PlayerInput {
        match controller {
            Controller::Human => human_input,
            Controller::Bot(bot) => bot.think(world, rng, dt),
        }
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn is_over(&self) -> bool {
        self.world.phase.is_game_over()
    }

    /// Run until the match ends or `max_ticks` pass
    pub fn run_to_end(&mut self, max_ticks: u64) -> GamePhase {
        let start = self.world.tick;
        while !self.is_over() && self.world.tick - start < max_ticks {
            self.step();
        }
        self.world.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_frame_accumulator_runs_fixed_ticks() {
        let mut game = LocalMatch::new(1, Some(Role::Hunter));
        assert_eq!(game.frame(SIM_DT * 0.5), 0);
        assert_eq!(game.frame(SIM_DT * 0.6), 1);
        assert_eq!(game.world().tick, 1);

        // A backlog is worked off at most MAX_SUBSTEPS ticks per frame
        game.accumulator = SIM_DT * 20.0;
        assert_eq!(game.frame(0.0), MAX_SUBSTEPS);
    }

    #[test]
    fn test_physics_rate_sets_the_step() {
        let mut slow = LocalMatch::new(3, Some(Role::Hunter)).with_physics_hz(30.0);
        let mut fast = LocalMatch::new(3, Some(Role::Hunter));
        assert!((slow.dt() - 1.0 / 30.0).abs() < 1e-6);

        // One 1/30 s frame: one coarse tick against two fine ones
        assert_eq!(slow.frame(1.0 / 30.0 + 1e-4), 1);
        assert_eq!(fast.frame(1.0 / 30.0 + 1e-4), 2);

        let east = PlayerInput {
            right: true,
            ..Default::default()
        };
        slow.set_human_input(east);
        fast.set_human_input(east);
        let (slow_start, fast_start) = (slow.world().hunter.body.pos, fast.world().hunter.body.pos);
        slow.step();
        fast.step();
        let slow_moved = slow.world().hunter.body.pos.x - slow_start.x;
        let fast_moved = fast.world().hunter.body.pos.x - fast_start.x;
        assert!((slow_moved - 2.0 * fast_moved).abs() < 1e-3, "{} vs {}", slow_moved, fast_moved);
    }

    #[test]
    fn test_human_input_reaches_the_hunter() {
        let mut game = LocalMatch::new(2, Some(Role::Hunter));
        let start = game.world().hunter.body.pos;
        game.set_human_input(PlayerInput {
            down: true,
            ..Default::default()
        });
        for _ in 0..10 {
            game.step();
        }
        assert!(game.world().hunter.body.pos.y > start.y);
    }

    #[test]
    fn test_bot_match_is_reproducible() {
        let mut a = LocalMatch::new(77, None);
        let mut b = LocalMatch::new(77, None);
        for _ in 0..600 {
            a.step();
            b.step();
        }
        assert_eq!(a.world(), b.world());
    }

    #[test]
    fn test_bots_make_progress() {
        let mut game = LocalMatch::new(5, None);
        let hunter = game.world().hunter.body.pos;
        let demon = game.world().demon.body.pos;
        for _ in 0..300 {
            game.step();
        }
        let world = game.world();
        let moved = |a: Vec2, b: Vec2| a.distance(b) > 20.0;
        assert!(moved(hunter, world.hunter.body.pos) || world.phase.is_game_over());
        assert!(moved(demon, world.demon.body.pos) || world.phase.is_game_over());
    }

    #[test]
    fn test_run_to_end_respects_budget() {
        let mut game = LocalMatch::new(9, None);
        let phase = game.run_to_end(100);
        assert!(game.world().tick <= 100);
        if phase == GamePhase::Playing {
            assert_eq!(game.world().tick, 100);
        }
    }
}
