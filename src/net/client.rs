//! Client side: send input, render the host's world smoothly
//!
//! The client never simulates. It keeps the last rendered state and the
//! latest authoritative state, and each frame eases positions from one
//! toward the other with a frame-rate independent exponential filter.

use glam::Vec2;

use super::latency::LatencyMonitor;
use super::protocol::NetMessage;
use super::transport::Transport;
use super::{receive_messages, send_message};
use crate::Settings;
use crate::sim::{PlayerInput, Role, WorldState};

/// Exponential smoothing rate (1/s)
pub const SMOOTHING_RATE: f32 = 15.0;
/// Corrections larger than this jump instead of easing
pub const SNAP_DISTANCE: f32 = 120.0;

/// The non-authoritative end of a match
pub struct ClientSession<T: Transport> {
    transport: T,
    role: Option<Role>,
    /// What was rendered last frame
    previous: Option<WorldState>,
    /// Latest state from the host
    target: Option<WorldState>,
    input: PlayerInput,
    input_interval: f32,
    since_input: f32,
    host_lost: bool,
    latency: LatencyMonitor,
}

impl<T: Transport> ClientSession<T> {
    pub fn new(transport: T, settings: &Settings) -> Self {
        Self {
            transport,
            role: None,
            previous: None,
            target: None,
            input: PlayerInput::default(),
            input_interval: settings.input_interval(),
            since_input: 0.0,
            host_lost: false,
            latency: LatencyMonitor::new(settings.ping_interval, settings.lag_threshold),
        }
    }

    /// Input to report on the next send
    pub fn set_input(&mut self, input: PlayerInput) {
        self.input = input;
    }

    /// Handle everything the host sent since the last call
    pub fn poll(&mut self) {
        for message in receive_messages(&self.transport) {
            self.latency.on_packet();
            match message {
                NetMessage::LobbyUpdate { host_role } => {
                    let role = host_role.opposite();
                    log::info!("Joined lobby as {:?}", role);
                    self.role = Some(role);
                }
                NetMessage::StartGame { state } => {
                    log::info!("Match started (seed {})", state.seed);
                    self.previous = Some((*state).clone());
                    self.target = Some(*state);
                }
                NetMessage::StateUpdate { update } => match &self.target {
                    Some(prior) => {
                        let next = update.merge_into(prior);
                        if next.phase != prior.phase {
                            log::info!("Phase {:?} -> {:?}", prior.phase, next.phase);
                        }
                        self.target = Some(next);
                    }
                    None => log::debug!("STATE_UPDATE before START_GAME ignored"),
                },
                NetMessage::Ping { sent_at } => self.send(&NetMessage::Pong { sent_at }),
                NetMessage::Pong { sent_at } => self.latency.on_pong(sent_at),
                NetMessage::InputUpdate { .. } => log::debug!("Client ignoring INPUT_UPDATE"),
            }
        }
    }

    /// Process the network and produce the state to draw this frame
    pub fn render_frame(&mut self, dt: f32) -> Option<&WorldState> {
        self.poll();

        if self.target.is_some() {
            self.since_input += dt;
            if self.since_input >= self.input_interval {
                self.since_input = 0.0;
                let input = self.input;
                self.send(&NetMessage::InputUpdate { input });
            }
        }
        if let Some(ping) = self.latency.tick(dt as f64) {
            self.send(&ping);
        }

        let target = self.target.as_ref()?;
        let alpha = 1.0 - (-SMOOTHING_RATE * dt).exp();
        let rendered = match &self.previous {
            Some(previous) => interpolate(previous, target, alpha),
            None => target.clone(),
        };
        self.previous = Some(rendered);
        self.previous.as_ref()
    }

    fn send(&mut self, message: &NetMessage) {
        if self.host_lost {
            return;
        }
        if !send_message(&self.transport, message) {
            log::warn!("Host lost");
            self.host_lost = true;
        }
    }

    /// Role assigned by the host's lobby announcement
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Latest authoritative state
    pub fn target(&self) -> Option<&WorldState> {
        self.target.as_ref()
    }

    pub fn host_lost(&self) -> bool {
        self.host_lost
    }

    pub fn latency(&self) -> &LatencyMonitor {
        &self.latency
    }
}

/// Ease `from` toward `to` by `alpha`, snapping large corrections
fn approach(from: Vec2, to: Vec2, alpha: f32) -> Vec2 {
    if from.distance(to) > SNAP_DISTANCE {
        to
    } else {
        from.lerp(to, alpha)
    }
}

/// Target state with positions eased from `previous`
///
/// Entities are matched by id; anything new appears at its target position.
fn interpolate(previous: &WorldState, target: &WorldState, alpha: f32) -> WorldState {
    let mut out = target.clone();

    out.hunter.body.pos = approach(previous.hunter.body.pos, target.hunter.body.pos, alpha);
    out.demon.body.pos = approach(previous.demon.body.pos, target.demon.body.pos, alpha);

    for creature in &mut out.creatures {
        if let Some(old) = previous
            .creatures
            .iter()
            .find(|c| c.body.id == creature.body.id)
        {
            creature.body.pos = approach(old.body.pos, creature.body.pos, alpha);
        }
    }
    for bullet in &mut out.projectiles {
        if let Some(old) = previous.projectiles.iter().find(|p| p.id == bullet.id) {
            bullet.pos = approach(old.pos, bullet.pos, alpha);
        }
    }
    out
}
