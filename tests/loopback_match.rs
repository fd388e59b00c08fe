use night_hunt::Settings;
use night_hunt::bot::Bot;
use night_hunt::net::{ClientSession, HostSession, LoopbackTransport, NetMessage, Transport};
use night_hunt::sim::{PlayerInput, Role, generate_world};
use rand::SeedableRng;
use rand_pcg::Pcg32;

fn settings(host_role: Role) -> Settings {
    Settings {
        seed: Some(2024),
        host_role,
        ..Default::default()
    }
}

#[test]
fn test_client_tracks_host_world() {
    let settings = settings(Role::Hunter);
    let (host_link, client_link) = LoopbackTransport::pair();
    let mut host = HostSession::new(host_link, generate_world(2024), &settings);
    let mut client = ClientSession::new(client_link, &settings);

    host.announce();
    client.poll();
    assert_eq!(client.role(), Some(Role::Demon));
    host.start();

    let mut host_bot = Bot::for_role(Role::Hunter);
    let mut client_bot = Bot::for_role(Role::Demon);
    let mut rng = Pcg32::seed_from_u64(1);
    let dt = settings.physics_dt();

    for _ in 0..600 {
        if let Some(view) = client.render_frame(dt) {
            let input = client_bot.think(view, &mut rng, dt);
            client.set_input(input);
        }
        let input = host_bot.think(host.world(), &mut rng, dt);
        host.step(&input, dt);
        if host.world().phase.is_game_over() {
            break;
        }
    }
    // Let the last broadcast land and the view settle
    for _ in 0..60 {
        host.step(&PlayerInput::default(), dt);
        client.render_frame(dt);
    }

    let authoritative = host.world();
    let view = client.target().expect("client should have a world");
    assert_eq!(view.map, authoritative.map);
    assert_eq!(view.phase, authoritative.phase);
    assert!(authoritative.tick - view.tick <= 3);
    assert!(view.hunter.body.pos.distance(authoritative.hunter.body.pos) < 10.0);
    assert!(!host.peer_lost());
    assert!(!client.host_lost());
    assert!(client.latency().rtt().is_some());
    assert!(!client.latency().is_lagging());
}

#[test]
fn test_client_input_moves_remote_role() {
    let settings = settings(Role::Demon);
    let (host_link, client_link) = LoopbackTransport::pair();
    let mut host = HostSession::new(host_link, generate_world(99), &settings);
    let mut client = ClientSession::new(client_link, &settings);
    host.announce();
    host.start();

    // The hunter spawns at the cabin door, which is kept clear below
    let start = host.world().hunter.body.pos;
    client.set_input(PlayerInput {
        down: true,
        ..Default::default()
    });
    let dt = settings.physics_dt();
    for _ in 0..20 {
        client.render_frame(dt);
        host.step(&PlayerInput::default(), dt);
    }
    assert_eq!(client.role(), Some(Role::Hunter));
    assert!(host.world().hunter.body.pos.y > start.y);
}

#[test]
fn test_garbage_on_the_wire_is_survivable() {
    let settings = settings(Role::Hunter);
    let (host_link, client_link) = LoopbackTransport::pair();
    let mut host = HostSession::new(host_link, generate_world(5), &settings);
    host.start();

    client_link.send("}{".to_string()).unwrap();
    client_link
        .send(
            NetMessage::InputUpdate {
                input: PlayerInput {
                    left: true,
                    ..Default::default()
                },
            }
            .encode()
            .unwrap(),
        )
        .unwrap();
    host.step(&PlayerInput::default(), settings.physics_dt());
    assert!(host.remote_input().left);
    assert_eq!(host.world().tick, 1);
}
