//! Night Hunt headless runner
//!
//! Plays a bot-vs-bot match and logs the outcome. By default the two bots
//! sit on opposite ends of a host/client session pair joined by an
//! in-process loopback link, so the whole network path is exercised.
//!
//! Usage: `night-hunt [--local] [settings.json]`

use night_hunt::Settings;
use night_hunt::bot::Bot;
use night_hunt::game::LocalMatch;
use night_hunt::net::{ClientSession, HostSession, LoopbackTransport};
use night_hunt::sim::{GamePhase, WorldState, generate_world};
use rand::SeedableRng;
use rand_pcg::Pcg32;

const DEFAULT_SETTINGS_PATH: &str = "night-hunt.json";

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let local = args.iter().any(|a| a == "--local");
    let path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map(String::as_str)
        .unwrap_or(DEFAULT_SETTINGS_PATH);

    let settings = Settings::load(path);
    let seed = settings.resolve_seed();
    log::info!("Night Hunt starting (seed {})", seed);

    let world = if local {
        run_local(&settings, seed)
    } else {
        run_networked(&settings, seed)
    };
    report(&world, settings.physics_dt());
}

fn run_local(settings: &Settings, seed: u64) -> WorldState {
    let mut game = LocalMatch::new(seed, None).with_physics_hz(settings.physics_hz);
    let max_ticks = (settings.max_match_seconds / game.dt()) as u64;
    game.run_to_end(max_ticks);
    game.world().clone()
}

fn run_networked(settings: &Settings, seed: u64) -> WorldState {
    let (host_link, client_link) = LoopbackTransport::pair();
    let mut host = HostSession::new(host_link, generate_world(seed), settings);
    let mut client = ClientSession::new(client_link, settings);

    host.announce();
    client.poll();
    let client_role = client
        .role()
        .unwrap_or_else(|| settings.host_role.opposite());
    log::info!("Host plays {:?}, client plays {:?}", settings.host_role, client_role);

    let mut host_bot = Bot::for_role(settings.host_role);
    let mut client_bot = Bot::for_role(client_role);
    let mut rng = Pcg32::seed_from_u64(seed ^ 0x5EED);

    host.start();
    let dt = settings.physics_dt();
    let max_ticks = (settings.max_match_seconds / dt) as u64;
    for _ in 0..max_ticks {
        // The client bot plays from what the client renders
        if let Some(view) = client.render_frame(dt) {
            let input = client_bot.think(view, &mut rng, dt);
            client.set_input(input);
        }
        let host_input = host_bot.think(host.world(), &mut rng, dt);
        if host.step(&host_input, dt).phase.is_game_over() {
            break;
        }
    }
    client.render_frame(dt);

    if let Some(view) = client.target() {
        if view.phase != host.world().phase {
            log::warn!(
                "Client ended on {:?}, host on {:?}",
                view.phase,
                host.world().phase
            );
        }
    }
    if let Some(rtt) = client.latency().rtt() {
        log::info!("Final RTT {:.1} ms", rtt * 1000.0);
    }
    host.world().clone()
}

fn report(world: &WorldState, dt: f32) {
    let seconds = world.tick as f32 * dt;
    let outcome = match world.phase {
        GamePhase::GameOverHunterWins => "the hunter wins",
        GamePhase::GameOverDemonWins => "the demon wins",
        _ => "no winner (time limit)",
    };
    log::info!("Match over after {} ticks: {}", world.tick, outcome);
    println!("Seed {}: {} after {:.0}s", world.seed, outcome, seconds);
    println!(
        "  shots fired: {}, mushrooms left: {}, creatures left: {}",
        world.hunter.shots_fired,
        world.pickups.len(),
        world.creatures.len()
    );
}
