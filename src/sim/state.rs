//! World state and core simulation types
//!
//! `WorldState` is the unit of replication: everything the host broadcasts
//! and the client interpolates lives here. Bot behavior state does not.

use std::sync::Arc;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geometry::Footprint;
use crate::consts::*;

/// Current phase of the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Menu,
    Lobby,
    /// Active gameplay
    Playing,
    /// Demon shot in daylight
    GameOverHunterWins,
    /// Hunter caught in the dark
    GameOverDemonWins,
}

impl GamePhase {
    pub fn is_game_over(&self) -> bool {
        matches!(self, GamePhase::GameOverHunterWins | GamePhase::GameOverDemonWins)
    }
}

/// The two combatant roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Hunter,
    Demon,
}

impl Role {
    pub fn opposite(self) -> Self {
        match self {
            Role::Hunter => Role::Demon,
            Role::Demon => Role::Hunter,
        }
    }
}

/// Entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Hunter,
    Demon,
    Creature,
    Tree,
    Cabin,
    Pickup,
    Bush,
}

/// Base entity record shared by everything placed on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub kind: EntityKind,
    pub pos: Vec2,
    /// Collision radius, or canopy half-extent for trees
    pub size: f32,
    /// Facing angle (radians)
    pub angle: f32,
}

impl Entity {
    pub fn new(id: u32, kind: EntityKind, pos: Vec2, size: f32) -> Self {
        Self {
            id,
            kind,
            pos,
            size,
            angle: 0.0,
        }
    }

    /// Movement-blocking footprint, `None` for anything that does not block
    ///
    /// Trees block with a box smaller than their canopy. Bushes never block.
    pub fn footprint(&self) -> Option<Footprint> {
        match self.kind {
            EntityKind::Tree => Some(Footprint::Box {
                center: self.pos,
                half: Vec2::splat(self.size * TREE_COLLISION_FRACTION),
            }),
            EntityKind::Cabin => Some(Footprint::Circle {
                center: self.pos,
                radius: self.size,
            }),
            _ => None,
        }
    }
}

/// The hunter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hunter {
    pub body: Entity,
    pub vel: Vec2,
    /// Seconds until the next shot is allowed
    pub cooldown: f32,
    /// Ammunition is unlimited; this only feeds the HUD
    pub shots_fired: u32,
    /// Sheltered inside the cabin (invulnerable, untargetable)
    pub in_cabin: bool,
    /// Progress toward entering the cabin (seconds)
    pub door_timer: f32,
}

impl Hunter {
    pub fn new(pos: Vec2) -> Self {
        Self {
            body: Entity::new(HUNTER_ID, EntityKind::Hunter, pos, HUNTER_RADIUS),
            vel: Vec2::ZERO,
            cooldown: 0.0,
            shots_fired: 0,
            in_cabin: false,
            door_timer: 0.0,
        }
    }
}

/// The demon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demon {
    pub body: Entity,
    pub vel: Vec2,
    pub cooldown: f32,
    /// Seconds of stun left; while > 0 the demon cannot move or act
    pub stun_remaining: f32,
    /// One tracking use per night
    pub tracking_charge: bool,
    /// Seconds the tracked bearing to the hunter stays valid
    pub tracking_remaining: f32,
    /// True once night falls (or when shot in daylight)
    pub revealed: bool,
}

impl Demon {
    pub fn new(pos: Vec2) -> Self {
        Self {
            body: Entity::new(DEMON_ID, EntityKind::Demon, pos, DEMON_RADIUS),
            vel: Vec2::ZERO,
            cooldown: 0.0,
            stun_remaining: 0.0,
            tracking_charge: false,
            tracking_remaining: 0.0,
            revealed: false,
        }
    }

    #[inline]
    pub fn is_stunned(&self) -> bool {
        self.stun_remaining > 0.0
    }

    #[inline]
    pub fn is_tracking(&self) -> bool {
        self.tracking_remaining > 0.0
    }
}

/// Stop/go timer driving creature wandering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WanderTimer {
    pub moving: bool,
    pub countdown_ticks: u32,
}

/// Wandering prey
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creature {
    pub body: Entity,
    pub ai: WanderTimer,
}

/// A hunter's bullet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub alive: bool,
}

/// A mushroom the demon can eat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub pos: Vec2,
}

/// Things worth telling the players about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    NightFalls,
    DawnBreaks,
    HunterSheltered,
    TrackingUsed,
    DemonAte,
    DemonStunned,
    CreatureShot,
    HunterWins,
    DemonWins,
}

impl EventKind {
    /// HUD text for this event
    pub fn message(&self) -> &'static str {
        match self {
            EventKind::NightFalls => "Night falls. The demon is loose.",
            EventKind::DawnBreaks => "Dawn breaks. The demon hides among the beasts.",
            EventKind::HunterSheltered => "The hunter barred the cabin door.",
            EventKind::TrackingUsed => "The demon has caught the hunter's scent!",
            EventKind::DemonAte => "Something is feeding in the woods...",
            EventKind::DemonStunned => "The demon staggers!",
            EventKind::CreatureShot => "A creature falls.",
            EventKind::HunterWins => "The demon is slain. The hunter wins!",
            EventKind::DemonWins => "The hunter is devoured. The demon wins!",
        }
    }
}

/// A recent event with a countdown until it expires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub kind: EventKind,
    /// Seconds until the entry is dropped
    pub remaining: f32,
}

/// Static map layout (never changes during a match)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticMap {
    pub width: f32,
    pub height: f32,
    pub trees: Vec<Entity>,
    pub bushes: Vec<Entity>,
    pub cabin: Entity,
}

impl StaticMap {
    /// An open map holding only the cabin
    pub fn open(width: f32, height: f32, cabin_pos: Vec2) -> Self {
        Self {
            width,
            height,
            trees: Vec::new(),
            bushes: Vec::new(),
            cabin: Entity::new(CABIN_ID, EntityKind::Cabin, cabin_pos, CABIN_SIZE),
        }
    }

    #[inline]
    pub fn bounds(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Footprints of every movement- and vision-blocking obstacle
    pub fn blockers(&self) -> impl Iterator<Item = Footprint> + Clone + '_ {
        self.trees
            .iter()
            .chain(std::iter::once(&self.cabin))
            .filter_map(Entity::footprint)
    }

    /// Where the hunter must stand to enter the cabin
    pub fn door_point(&self) -> Vec2 {
        self.cabin.pos + Vec2::new(0.0, CABIN_DOOR_OFFSET)
    }
}

/// Reserved IDs
pub const HUNTER_ID: u32 = 1;
pub const DEMON_ID: u32 = 2;
pub const CABIN_ID: u32 = 3;
pub(crate) const FIRST_DYNAMIC_ID: u32 = 16;

/// Complete world state (deterministic, serializable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub phase: GamePhase,
    /// Fraction of the day elapsed, 0..=1 (frozen at 1.0 during night)
    pub day_progress: f32,
    pub is_night: bool,
    /// Seconds since night fell
    pub night_elapsed: f32,
    pub hunter: Hunter,
    pub demon: Demon,
    /// Sorted by id for deterministic iteration
    pub creatures: Vec<Creature>,
    pub pickups: Vec<Pickup>,
    pub projectiles: Vec<Projectile>,
    /// Most recent events, oldest first
    pub log: Vec<LogEntry>,
    /// Shared between successive states; only replaced at match start
    pub map: Arc<StaticMap>,
    /// Match seed for reproducibility
    pub seed: u64,
    /// Simulation tick counter
    pub tick: u64,
    next_id: u32,
}

impl WorldState {
    /// Start a match on `map` with both combatants at their spawn points
    pub fn new(seed: u64, map: StaticMap, hunter_pos: Vec2, demon_pos: Vec2) -> Self {
        let first_free = map
            .trees
            .iter()
            .chain(&map.bushes)
            .map(|e| e.id + 1)
            .max()
            .unwrap_or(FIRST_DYNAMIC_ID)
            .max(FIRST_DYNAMIC_ID);
        Self {
            phase: GamePhase::Playing,
            day_progress: 0.0,
            is_night: false,
            night_elapsed: 0.0,
            hunter: Hunter::new(hunter_pos),
            demon: Demon::new(demon_pos),
            creatures: Vec::new(),
            pickups: Vec::new(),
            projectiles: Vec::new(),
            log: Vec::new(),
            map: Arc::new(map),
            seed,
            tick: 0,
            next_id: first_free,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Next ID that will be handed out (replicated so clients agree)
    pub fn peek_next_id(&self) -> u32 {
        self.next_id
    }

    pub(crate) fn set_next_id(&mut self, next_id: u32) {
        self.next_id = next_id;
    }

    /// Append an event, keeping only the newest entries
    pub fn push_event(&mut self, kind: EventKind) {
        log::debug!("tick {}: {:?}", self.tick, kind);
        self.log.push(LogEntry {
            kind,
            remaining: LOG_ENTRY_TTL,
        });
        if self.log.len() > MAX_LOG_ENTRIES {
            let excess = self.log.len() - MAX_LOG_ENTRIES;
            self.log.drain(..excess);
        }
    }

    /// Deterministic RNG for the current tick, derived from seed and tick
    pub fn tick_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed ^ self.tick.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }

    /// Ensure entity lists are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.creatures.sort_by_key(|c| c.body.id);
        self.pickups.sort_by_key(|p| p.id);
        self.projectiles.sort_by_key(|p| p.id);
    }

    /// Fraction of the current phase elapsed (day or night), for the HUD clock
    pub fn cycle_fraction(&self) -> f32 {
        if self.is_night {
            (self.night_elapsed / NIGHT_DURATION).clamp(0.0, 1.0)
        } else {
            self.day_progress
        }
    }
}
