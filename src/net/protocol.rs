//! Wire protocol
//!
//! Every frame is one JSON object with a `type` tag. The host streams
//! `STATE_UPDATE`s built by [`StateUpdate::from_world`]: positions are
//! rounded to whole pixels, and the static map rides along only on the first
//! broadcast.

use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::NetError;
use crate::consts::*;
use crate::sim::{
    Creature, Entity, EntityKind, GamePhase, LogEntry, Pickup, PlayerInput, Projectile, Role,
    StaticMap, WanderTimer, WorldState,
};

/// Integer pixel position on the wire
pub type NetPos = [i32; 2];

#[inline]
pub fn pack(v: Vec2) -> NetPos {
    [v.x.round() as i32, v.y.round() as i32]
}

#[inline]
pub fn unpack(p: NetPos) -> Vec2 {
    Vec2::new(p[0] as f32, p[1] as f32)
}

/// Every message either peer can send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetMessage {
    /// Host announces the role it plays; the client takes the other one
    LobbyUpdate { host_role: Role },
    /// Full initial world
    StartGame { state: Box<WorldState> },
    /// Client's current input
    InputUpdate { input: PlayerInput },
    /// Host's authoritative snapshot
    StateUpdate { update: Box<StateUpdate> },
    Ping { sent_at: f64 },
    Pong { sent_at: f64 },
}

impl NetMessage {
    pub fn encode(&self) -> Result<String, NetError> {
        serde_json::to_string(self).map_err(NetError::Encode)
    }

    pub fn decode(frame: &str) -> Result<Self, NetError> {
        serde_json::from_str(frame).map_err(NetError::Decode)
    }

    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            NetMessage::LobbyUpdate { .. } => "LOBBY_UPDATE",
            NetMessage::StartGame { .. } => "START_GAME",
            NetMessage::InputUpdate { .. } => "INPUT_UPDATE",
            NetMessage::StateUpdate { .. } => "STATE_UPDATE",
            NetMessage::Ping { .. } => "PING",
            NetMessage::Pong { .. } => "PONG",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HunterUpdate {
    pub pos: NetPos,
    pub vel: Vec2,
    pub angle: f32,
    pub cooldown: f32,
    pub shots_fired: u32,
    pub in_cabin: bool,
    pub door_timer: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemonUpdate {
    pub pos: NetPos,
    pub vel: Vec2,
    pub angle: f32,
    pub cooldown: f32,
    pub stun_remaining: f32,
    pub tracking_charge: bool,
    pub tracking_remaining: f32,
    pub revealed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureUpdate {
    pub id: u32,
    pub pos: NetPos,
    pub angle: f32,
    pub ai: WanderTimer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupUpdate {
    pub id: u32,
    pub pos: NetPos,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileUpdate {
    pub id: u32,
    pub pos: NetPos,
    pub vel: Vec2,
}

/// The dynamic part of a `WorldState`, as broadcast by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    pub phase: GamePhase,
    pub tick: u64,
    pub day_progress: f32,
    pub is_night: bool,
    pub night_elapsed: f32,
    pub hunter: HunterUpdate,
    pub demon: DemonUpdate,
    pub creatures: Vec<CreatureUpdate>,
    pub pickups: Vec<PickupUpdate>,
    pub projectiles: Vec<ProjectileUpdate>,
    pub log: Vec<LogEntry>,
    pub next_id: u32,
    /// Static layout; only present on the first broadcast
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<StaticMap>,
}

impl StateUpdate {
    /// Snapshot `world`, attaching the static map if `include_map`
    pub fn from_world(world: &WorldState, include_map: bool) -> Self {
        let hunter = &world.hunter;
        let demon = &world.demon;
        Self {
            phase: world.phase,
            tick: world.tick,
            day_progress: world.day_progress,
            is_night: world.is_night,
            night_elapsed: world.night_elapsed,
            hunter: HunterUpdate {
                pos: pack(hunter.body.pos),
                vel: hunter.vel,
                angle: hunter.body.angle,
                cooldown: hunter.cooldown,
                shots_fired: hunter.shots_fired,
                in_cabin: hunter.in_cabin,
                door_timer: hunter.door_timer,
            },
            demon: DemonUpdate {
                pos: pack(demon.body.pos),
                vel: demon.vel,
                angle: demon.body.angle,
                cooldown: demon.cooldown,
                stun_remaining: demon.stun_remaining,
                tracking_charge: demon.tracking_charge,
                tracking_remaining: demon.tracking_remaining,
                revealed: demon.revealed,
            },
            creatures: world
                .creatures
                .iter()
                .map(|c| CreatureUpdate {
                    id: c.body.id,
                    pos: pack(c.body.pos),
                    angle: c.body.angle,
                    ai: c.ai,
                })
                .collect(),
            pickups: world
                .pickups
                .iter()
                .map(|p| PickupUpdate {
                    id: p.id,
                    pos: pack(p.pos),
                })
                .collect(),
            projectiles: world
                .projectiles
                .iter()
                .map(|p| ProjectileUpdate {
                    id: p.id,
                    pos: pack(p.pos),
                    vel: p.vel,
                })
                .collect(),
            log: world.log.clone(),
            next_id: world.peek_next_id(),
            map: include_map.then(|| (*world.map).clone()),
        }
    }

    /// Apply this update on top of `prior`
    ///
    /// Everything dynamic comes from the update. The map is replaced only if
    /// the update carries one; the seed always comes from `prior`.
    pub fn merge_into(&self, prior: &WorldState) -> WorldState {
        let mut next = prior.clone();
        if let Some(map) = &self.map {
            next.map = Arc::new(map.clone());
        }

        next.phase = self.phase;
        next.tick = self.tick;
        next.day_progress = self.day_progress;
        next.is_night = self.is_night;
        next.night_elapsed = self.night_elapsed;

        let h = &self.hunter;
        next.hunter.body.pos = unpack(h.pos);
        next.hunter.vel = h.vel;
        next.hunter.body.angle = h.angle;
        next.hunter.cooldown = h.cooldown;
        next.hunter.shots_fired = h.shots_fired;
        next.hunter.in_cabin = h.in_cabin;
        next.hunter.door_timer = h.door_timer;

        let d = &self.demon;
        next.demon.body.pos = unpack(d.pos);
        next.demon.vel = d.vel;
        next.demon.body.angle = d.angle;
        next.demon.cooldown = d.cooldown;
        next.demon.stun_remaining = d.stun_remaining;
        next.demon.tracking_charge = d.tracking_charge;
        next.demon.tracking_remaining = d.tracking_remaining;
        next.demon.revealed = d.revealed;

        next.creatures = self
            .creatures
            .iter()
            .map(|c| {
                let mut body = Entity::new(c.id, EntityKind::Creature, unpack(c.pos), CREATURE_RADIUS);
                body.angle = c.angle;
                Creature { body, ai: c.ai }
            })
            .collect();
        next.pickups = self
            .pickups
            .iter()
            .map(|p| Pickup {
                id: p.id,
                pos: unpack(p.pos),
            })
            .collect();
        next.projectiles = self
            .projectiles
            .iter()
            .map(|p| Projectile {
                id: p.id,
                pos: unpack(p.pos),
                vel: p.vel,
                alive: true,
            })
            .collect();
        next.log = self.log.clone();
        next.set_next_id(self.next_id);
        next.normalize_order();
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{EventKind, advance, generate_world};

    fn busy_world() -> WorldState {
        let mut world = generate_world(31);
        let fire = PlayerInput {
            action: true,
            right: true,
            ..Default::default()
        };
        for _ in 0..20 {
            world = advance(&world, &fire, &PlayerInput::default(), SIM_DT);
        }
        world.push_event(EventKind::CreatureShot);
        world
    }

    #[test]
    fn test_message_tags_are_screaming_snake_case() {
        let frame = NetMessage::InputUpdate {
            input: PlayerInput {
                up: true,
                ..Default::default()
            },
        }
        .encode()
        .unwrap();
        assert!(frame.contains("\"type\":\"INPUT_UPDATE\""), "{}", frame);

        let frame = NetMessage::LobbyUpdate {
            host_role: Role::Demon,
        }
        .encode()
        .unwrap();
        assert!(frame.contains("LOBBY_UPDATE"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(NetMessage::decode("not json"), Err(NetError::Decode(_))));
        assert!(matches!(
            NetMessage::decode(r#"{"type":"TELEPORT"}"#),
            Err(NetError::Decode(_))
        ));
    }

    #[test]
    fn test_state_update_round_trip() {
        let world = busy_world();

        let frame = NetMessage::StateUpdate {
            update: Box::new(StateUpdate::from_world(&world, true)),
        }
        .encode()
        .unwrap();
        let NetMessage::StateUpdate { update } = NetMessage::decode(&frame).unwrap() else {
            panic!("wrong message kind");
        };

        // Merge onto a stale prior that has a different layout
        let prior = generate_world(32);
        let merged = update.merge_into(&prior);

        assert_eq!(merged.map, world.map);
        assert_eq!(merged.phase, world.phase);
        assert_eq!(merged.tick, world.tick);
        assert!((merged.day_progress - world.day_progress).abs() < 1e-6);
        assert!(merged.hunter.body.pos.distance(world.hunter.body.pos) <= 0.75);
        assert!(merged.demon.body.pos.distance(world.demon.body.pos) <= 0.75);
        assert_eq!(merged.hunter.shots_fired, world.hunter.shots_fired);

        let ids = |w: &WorldState| -> Vec<u32> { w.creatures.iter().map(|c| c.body.id).collect() };
        assert_eq!(ids(&merged), ids(&world));
        assert_eq!(merged.pickups.len(), world.pickups.len());
        assert_eq!(merged.projectiles.len(), world.projectiles.len());
        for (a, b) in merged.projectiles.iter().zip(&world.projectiles) {
            assert_eq!(a.id, b.id);
            assert!(a.pos.distance(b.pos) <= 0.75);
        }
        assert_eq!(merged.log, world.log);
        assert_eq!(merged.peek_next_id(), world.peek_next_id());
    }

    #[test]
    fn test_positions_are_whole_pixels() {
        let mut world = generate_world(5);
        world.hunter.body.pos = Vec2::new(100.4, 200.6);
        let update = StateUpdate::from_world(&world, false);
        assert_eq!(update.hunter.pos, [100, 201]);
        let json = serde_json::to_string(&update).unwrap();
        assert!(json.contains("[100,201]"));
    }

    #[test]
    fn test_map_sent_once_and_kept() {
        let world = generate_world(8);
        let first = StateUpdate::from_world(&world, true);
        let later = StateUpdate::from_world(&world, false);
        assert!(first.map.is_some());

        let json = serde_json::to_string(&later).unwrap();
        assert!(!json.contains("\"map\""));
        let decoded: StateUpdate = serde_json::from_str(&json).unwrap();
        assert!(decoded.map.is_none());

        let merged = decoded.merge_into(&world);
        assert!(Arc::ptr_eq(&merged.map, &world.map));
    }

    #[test]
    fn test_start_game_carries_full_state() {
        let world = generate_world(12);
        let frame = NetMessage::StartGame {
            state: Box::new(world.clone()),
        }
        .encode()
        .unwrap();
        let NetMessage::StartGame { state } = NetMessage::decode(&frame).unwrap() else {
            panic!("wrong message kind");
        };
        assert_eq!(state.map, world.map);
        assert_eq!(state.seed, world.seed);
        assert_eq!(state.creatures.len(), world.creatures.len());
    }
}
