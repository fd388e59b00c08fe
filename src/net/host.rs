//! Host side: runs the simulation and streams it to the client

use super::latency::LatencyMonitor;
use super::protocol::{NetMessage, StateUpdate};
use super::transport::Transport;
use super::{receive_messages, send_message};
use crate::Settings;
use crate::sim::{PlayerInput, Role, WorldState, advance};

/// The authoritative end of a match
pub struct HostSession<T: Transport> {
    transport: T,
    world: WorldState,
    local_role: Role,
    /// Last input the client sent; persists until replaced
    remote_input: PlayerInput,
    started: bool,
    map_sent: bool,
    peer_lost: bool,
    broadcast_interval: f32,
    since_broadcast: f32,
    latency: LatencyMonitor,
}

impl<T: Transport> HostSession<T> {
    pub fn new(transport: T, world: WorldState, settings: &Settings) -> Self {
        Self {
            transport,
            world,
            local_role: settings.host_role,
            remote_input: PlayerInput::default(),
            started: false,
            map_sent: false,
            peer_lost: false,
            broadcast_interval: settings.broadcast_interval(),
            since_broadcast: 0.0,
            latency: LatencyMonitor::new(settings.ping_interval, settings.lag_threshold),
        }
    }

    /// Tell the client which role the host plays
    pub fn announce(&mut self) {
        self.send(&NetMessage::LobbyUpdate {
            host_role: self.local_role,
        });
    }

    /// Send the full starting world and begin simulating
    pub fn start(&mut self) {
        log::info!(
            "Host starting match (seed {}, playing {:?})",
            self.world.seed,
            self.local_role
        );
        self.send(&NetMessage::StartGame {
            state: Box::new(self.world.clone()),
        });
        self.started = true;
    }

    /// Run one physics tick with the local player's input
    pub fn step(&mut self, local_input: &PlayerInput, dt: f32) -> &WorldState {
        self.poll();

        if self.started {
            let (hunter, demon) = match self.local_role {
                Role::Hunter => (*local_input, self.remote_input),
                Role::Demon => (self.remote_input, *local_input),
            };
            let before = self.world.phase;
            self.world = advance(&self.world, &hunter, &demon, dt);
            if self.world.phase != before {
                log::info!("Phase {:?} -> {:?}", before, self.world.phase);
            }

            // The final result goes out at once; otherwise broadcasts keep their own rate
            let just_ended = self.world.phase != before && self.world.phase.is_game_over();
            self.since_broadcast += dt;
            if self.since_broadcast >= self.broadcast_interval || just_ended {
                self.since_broadcast = 0.0;
                self.broadcast();
            }
        }

        if let Some(ping) = self.latency.tick(dt as f64) {
            self.send(&ping);
        }
        &self.world
    }

    /// Handle everything the client sent since the last call
    pub fn poll(&mut self) {
        for message in receive_messages(&self.transport) {
            self.latency.on_packet();
            match message {
                NetMessage::InputUpdate { input } => self.remote_input = input,
                NetMessage::Ping { sent_at } => self.send(&NetMessage::Pong { sent_at }),
                NetMessage::Pong { sent_at } => self.latency.on_pong(sent_at),
                other => log::debug!("Host ignoring {}", other.kind()),
            }
        }
    }

    fn broadcast(&mut self) {
        if self.peer_lost {
            return;
        }
        let update = StateUpdate::from_world(&self.world, !self.map_sent);
        self.map_sent = true;
        self.send(&NetMessage::StateUpdate {
            update: Box::new(update),
        });
    }

    fn send(&mut self, message: &NetMessage) {
        if self.peer_lost {
            return;
        }
        if !send_message(&self.transport, message) {
            log::warn!("Client lost; broadcasting stopped");
            self.peer_lost = true;
        }
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn local_role(&self) -> Role {
        self.local_role
    }

    pub fn remote_input(&self) -> PlayerInput {
        self.remote_input
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn peer_lost(&self) -> bool {
        self.peer_lost
    }

    pub fn latency(&self) -> &LatencyMonitor {
        &self.latency
    }
}
