//! Procedural placement
//!
//! Map generation at match start and the dawn respawn of mushrooms and
//! creatures share the same spacing-constrained placement routine. Every
//! search has a bounded retry budget; running out never fails the match.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::geometry::position_blocked;
use super::state::{
    Creature, Entity, EntityKind, FIRST_DYNAMIC_ID, Pickup, StaticMap, WanderTimer, WorldState,
};
use crate::consts::*;

/// Keep trees and bushes clear of the approach to the cabin door
const DOOR_CLEARANCE: f32 = 130.0;
/// Minimum spacing between tree trunks
const TREE_SPACING: f32 = 90.0;
/// Demon spawns at least this far from the hunter
const SPAWN_SEPARATION: f32 = 700.0;
/// Keep spawns off the map edge
const EDGE_MARGIN: f32 = 20.0;

/// Search for a spot a circle of `radius` can occupy
///
/// The spot must be inside the map, clear of every blocking obstacle, and at
/// least `spacing` away from each point in `avoid`. Gives up after
/// `PLACEMENT_ATTEMPTS` tries.
pub fn find_free_spot<R: Rng>(
    rng: &mut R,
    map: &StaticMap,
    radius: f32,
    avoid: &[Vec2],
    spacing: f32,
) -> Option<Vec2> {
    let inset = radius + EDGE_MARGIN;
    if map.width <= inset * 2.0 || map.height <= inset * 2.0 {
        return None;
    }
    for _ in 0..PLACEMENT_ATTEMPTS {
        let p = Vec2::new(
            rng.random_range(inset..map.width - inset),
            rng.random_range(inset..map.height - inset),
        );
        if position_blocked(p, radius, map.bounds(), map.blockers()) {
            continue;
        }
        if avoid.iter().all(|a| a.distance(p) >= spacing) {
            return Some(p);
        }
    }
    None
}

/// Fallback position when placement runs out of retries
#[inline]
pub fn corner_spot(radius: f32) -> Vec2 {
    Vec2::splat(radius + EDGE_MARGIN)
}

/// Any open spot on the map (used by bots to pick wander destinations)
pub fn random_open_point<R: Rng>(rng: &mut R, map: &StaticMap, radius: f32) -> Vec2 {
    find_free_spot(rng, map, radius, &[], 0.0).unwrap_or_else(|| corner_spot(radius))
}

/// Fresh stop/go countdown for a creature entering `moving` or idle
pub fn wander_timer<R: Rng>(moving: bool, rng: &mut R) -> WanderTimer {
    let (lo, hi) = if moving {
        CREATURE_MOVE_TICKS
    } else {
        CREATURE_IDLE_TICKS
    };
    WanderTimer {
        moving,
        countdown_ticks: rng.random_range(lo..=hi),
    }
}

/// Top up mushrooms and creatures to their fixed counts
pub fn respawn<R: Rng>(state: &mut WorldState, rng: &mut R) {
    let map = state.map.clone();
    let mut avoid: Vec<Vec2> = [state.hunter.body.pos, state.demon.body.pos]
        .into_iter()
        .chain(state.pickups.iter().map(|p| p.pos))
        .chain(state.creatures.iter().map(|c| c.body.pos))
        .collect();

    let mut added_pickups = 0;
    while state.pickups.len() < PICKUP_COUNT {
        let pos = find_free_spot(rng, &map, PICKUP_RADIUS, &avoid, MIN_SPAWN_SPACING)
            .unwrap_or_else(|| corner_spot(PICKUP_RADIUS));
        let id = state.next_entity_id();
        state.pickups.push(Pickup { id, pos });
        avoid.push(pos);
        added_pickups += 1;
    }

    let mut added_creatures = 0;
    while state.creatures.len() < CREATURE_COUNT {
        let pos = find_free_spot(rng, &map, CREATURE_RADIUS, &avoid, MIN_SPAWN_SPACING)
            .unwrap_or_else(|| corner_spot(CREATURE_RADIUS));
        let id = state.next_entity_id();
        let mut body = Entity::new(id, EntityKind::Creature, pos, CREATURE_RADIUS);
        body.angle = rng.random_range(-std::f32::consts::PI..std::f32::consts::PI);
        state.creatures.push(Creature {
            body,
            ai: wander_timer(false, rng),
        });
        avoid.push(pos);
        added_creatures += 1;
    }

    if added_pickups > 0 || added_creatures > 0 {
        log::info!(
            "Respawned {} mushrooms and {} creatures",
            added_pickups,
            added_creatures
        );
    }
}

/// Generate a complete starting world from a seed
///
/// Cabin in the middle, trees and bushes scattered with spacing, the hunter
/// at the cabin door, the demon far away, then mushrooms and creatures.
pub fn generate_world(seed: u64) -> WorldState {
    let mut rng = Pcg32::seed_from_u64(seed);
    let center = Vec2::new(MAP_WIDTH / 2.0, MAP_HEIGHT / 2.0);
    let mut map = StaticMap::open(MAP_WIDTH, MAP_HEIGHT, center);
    let door = map.door_point();
    let mut next_id = FIRST_DYNAMIC_ID;

    let mut trunks: Vec<Vec2> = Vec::new();
    for _ in 0..TREE_COUNT {
        let size = rng.random_range(TREE_SIZE_MIN..TREE_SIZE_MAX);
        let footprint = size * TREE_COLLISION_FRACTION;
        let Some(pos) = find_free_spot(&mut rng, &map, footprint, &trunks, TREE_SPACING) else {
            continue;
        };
        if pos.distance(door) < DOOR_CLEARANCE || pos.distance(center) < CABIN_SIZE + DOOR_CLEARANCE
        {
            continue;
        }
        map.trees
            .push(Entity::new(next_id, EntityKind::Tree, pos, size));
        next_id += 1;
        trunks.push(pos);
    }

    let mut bush_spots: Vec<Vec2> = Vec::new();
    for _ in 0..BUSH_COUNT {
        let Some(pos) = find_free_spot(&mut rng, &map, BUSH_SIZE, &bush_spots, BUSH_SIZE * 3.0)
        else {
            continue;
        };
        if pos.distance(door) < DOOR_CLEARANCE {
            continue;
        }
        map.bushes
            .push(Entity::new(next_id, EntityKind::Bush, pos, BUSH_SIZE));
        next_id += 1;
        bush_spots.push(pos);
    }

    log::info!(
        "Generated map (seed {}): {} trees, {} bushes",
        seed,
        map.trees.len(),
        map.bushes.len()
    );

    let hunter_pos = door;
    let demon_pos = find_free_spot(&mut rng, &map, DEMON_RADIUS, &[hunter_pos], SPAWN_SEPARATION)
        .unwrap_or_else(|| Vec2::new(MAP_WIDTH, MAP_HEIGHT) - corner_spot(DEMON_RADIUS));

    let mut state = WorldState::new(seed, map, hunter_pos, demon_pos);
    respawn(&mut state, &mut rng);
    state.normalize_order();
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_world_is_deterministic() {
        let a = generate_world(4242);
        let b = generate_world(4242);
        assert_eq!(a, b);
        let c = generate_world(4243);
        assert_ne!(a.map.trees, c.map.trees);
    }

    #[test]
    fn test_generated_world_is_populated_and_clear() {
        let state = generate_world(7);
        assert_eq!(state.pickups.len(), PICKUP_COUNT);
        assert_eq!(state.creatures.len(), CREATURE_COUNT);
        assert!(!state.map.trees.is_empty());

        let bounds = state.map.bounds();
        for creature in &state.creatures {
            assert!(!position_blocked(
                creature.body.pos,
                creature.body.size,
                bounds,
                state.map.blockers()
            ));
        }
        assert!(!position_blocked(
            state.hunter.body.pos,
            HUNTER_RADIUS,
            bounds,
            state.map.blockers()
        ));
        assert!(!position_blocked(
            state.demon.body.pos,
            DEMON_RADIUS,
            bounds,
            state.map.blockers()
        ));
    }

    #[test]
    fn test_generated_ids_stay_clear_of_reserved_range() {
        let state = generate_world(12);
        let map_ids = state.map.trees.iter().chain(&state.map.bushes).map(|e| e.id);
        let dynamic_ids = state
            .creatures
            .iter()
            .map(|c| c.body.id)
            .chain(state.pickups.iter().map(|p| p.id));
        let mut ids: Vec<u32> = map_ids.chain(dynamic_ids).collect();
        assert!(ids.iter().all(|&id| id >= FIRST_DYNAMIC_ID));
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn test_respawn_keeps_spacing() {
        let mut state = generate_world(99);
        state.pickups.clear();
        state.creatures.truncate(2);
        let mut rng = Pcg32::seed_from_u64(5);
        respawn(&mut state, &mut rng);
        assert_eq!(state.pickups.len(), PICKUP_COUNT);
        assert_eq!(state.creatures.len(), CREATURE_COUNT);

        for (i, a) in state.pickups.iter().enumerate() {
            for b in state.pickups.iter().skip(i + 1) {
                assert!(a.pos.distance(b.pos) >= MIN_SPAWN_SPACING);
            }
        }
    }

    #[test]
    fn test_placement_falls_back_to_corner() {
        // A map too small to fit anything
        let map = StaticMap::open(30.0, 30.0, Vec2::new(15.0, 15.0));
        let mut rng = Pcg32::seed_from_u64(1);
        assert!(find_free_spot(&mut rng, &map, 10.0, &[], 0.0).is_none());
        assert_eq!(random_open_point(&mut rng, &map, 10.0), corner_spot(10.0));
    }
}
