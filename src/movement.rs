//! Movement and zone hand-off.
//!
//! Every committed position goes through [`resolve_step`], so an entity that
//! starts a tick on an open tile never ends it inside a wall. The player
//! additionally tests door triggers before walls and, on a hit, is teleported
//! to the reciprocal door of the destination zone. Enemies skip the trigger
//! and just adopt whatever zone their new position resolves to.

use crate::config::{TRANSITION_INSET_TILES, TRANSITION_PIXEL_OFFSET};
use crate::entity::Entity;
use crate::error::TransitionError;
use crate::map::MapData;
use crate::types::{Facing, Point};
use log::error;

#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    Stationary,
    Moved,
    SlidX,
    SlidY,
    Blocked,
    Transitioned { from: String, to: String },
}

/// Axis-separated collision sliding: full move, else X only, else Y only,
/// else stay put.
pub fn resolve_step(map: &MapData, from: Point, delta: Point) -> (Point, MoveOutcome) {
    let full = from + delta;
    if !map.check_collision(full) {
        return (full, MoveOutcome::Moved);
    }
    if delta.x != 0.0 {
        let x_only = Point::new(from.x + delta.x, from.y);
        if !map.check_collision(x_only) {
            return (x_only, MoveOutcome::SlidX);
        }
    }
    if delta.y != 0.0 {
        let y_only = Point::new(from.x, from.y + delta.y);
        if !map.check_collision(y_only) {
            return (y_only, MoveOutcome::SlidY);
        }
    }
    (from, MoveOutcome::Blocked)
}

/// Moves the entity to just inside the door of `target_zone_id` that leads
/// back to its current zone. On error nothing is changed.
pub fn zone_transition(
    entity: &mut Entity,
    map: &MapData,
    target_zone_id: &str,
    tick: u64,
) -> Result<(), TransitionError> {
    let target = map
        .zone(target_zone_id)
        .ok_or_else(|| TransitionError::UnknownZone(target_zone_id.to_string()))?;
    let reciprocal = target.exit_to(&entity.current_zone_id).ok_or_else(|| {
        TransitionError::MissingReciprocalExit {
            source_zone: entity.current_zone_id.clone(),
            target: target.id.clone(),
        }
    })?;

    // Inset past the door's own trigger box so the entity does not bounce back
    let inset = TRANSITION_INSET_TILES * map.tile_size + TRANSITION_PIXEL_OFFSET;
    let inward = reciprocal.side.outward() * -1.0;
    let door = map.door_center(target, reciprocal);
    let arrival = door + inward * inset;

    crate::debug_zone!(
        entity.id,
        tick,
        "Zone transition {} -> {} via {:?} door, ({:.1},{:.1}) -> ({:.1},{:.1})",
        entity.current_zone_id,
        target.id,
        reciprocal.side,
        entity.position.x,
        entity.position.y,
        arrival.x,
        arrival.y
    );

    entity.position = arrival;
    entity.current_zone_id = target.id.clone();
    entity.target_door = None;
    Ok(())
}

/// Applies one tick of player (or any door-using entity) movement.
pub fn move_with_doors(
    entity: &mut Entity,
    map: &MapData,
    direction: Point,
    speed: f64,
    dt: f64,
    tick: u64,
) -> MoveOutcome {
    let dir = direction.normalized();
    if dir.is_zero() {
        entity.is_moving = false;
        return MoveOutcome::Stationary;
    }
    if let Some(facing) = Facing::from_direction(dir) {
        entity.facing = facing;
    }
    entity.is_moving = true;

    let delta = dir * (speed * dt);
    let candidate = entity.position + delta;

    let crossing = map
        .check_door_transition(candidate, &entity.current_zone_id)
        .map(|c| c.target_zone.to_string());
    if let Some(target_zone) = crossing {
        let from = entity.current_zone_id.clone();
        let previous = entity.position;
        entity.position = candidate;
        match zone_transition(entity, map, &target_zone, tick) {
            Ok(()) => {
                return MoveOutcome::Transitioned {
                    from,
                    to: entity.current_zone_id.clone(),
                };
            }
            Err(e) => {
                // Broken door data: stay in the old zone and move as if it were a wall
                error!(
                    "Entity {} could not pass from '{}' to '{}': {}",
                    entity.id, from, target_zone, e
                );
                entity.position = previous;
            }
        }
    }

    let (next, outcome) = resolve_step(map, entity.position, delta);
    crate::debug_move!(
        entity.id,
        tick,
        "{:?} ({:.1},{:.1}) -> ({:.1},{:.1})",
        outcome,
        entity.position.x,
        entity.position.y,
        next.x,
        next.y
    );
    entity.position = next;
    if outcome == MoveOutcome::Blocked {
        entity.is_moving = false;
    }
    sync_zone(entity, map, tick);
    outcome
}

/// Steers toward `target` without overshooting it. Returns the outcome of the
/// wall-resolved step.
pub fn move_toward(
    entity: &mut Entity,
    map: &MapData,
    target: Point,
    speed: f64,
    dt: f64,
    tick: u64,
) -> MoveOutcome {
    let offset = target - entity.position;
    let distance = offset.length();
    let step = (speed * dt).min(distance);
    step_along(entity, map, offset.normalized() * step, tick)
}

/// Moves directly away from `threat`.
pub fn move_away(
    entity: &mut Entity,
    map: &MapData,
    threat: Point,
    speed: f64,
    dt: f64,
    tick: u64,
) -> MoveOutcome {
    let away = (entity.position - threat).normalized();
    // Standing exactly on the threat: pick any direction
    let away = if away.is_zero() { Point::new(1.0, 0.0) } else { away };
    step_along(entity, map, away * (speed * dt), tick)
}

// Shared tail for AI steering: wall sliding plus zone adoption
fn step_along(entity: &mut Entity, map: &MapData, delta: Point, tick: u64) -> MoveOutcome {
    if delta.is_zero() {
        entity.is_moving = false;
        return MoveOutcome::Stationary;
    }
    if let Some(facing) = Facing::from_direction(delta) {
        entity.facing = facing;
    }
    let (next, outcome) = resolve_step(map, entity.position, delta);
    entity.position = next;
    entity.is_moving = outcome != MoveOutcome::Blocked;
    sync_zone(entity, map, tick);
    outcome
}

/// Adopts the zone under the entity's position. An unresolvable position is
/// a data-integrity problem: the zone id is left alone and logged.
pub fn sync_zone(entity: &mut Entity, map: &MapData, tick: u64) {
    match map.get_zone_at(entity.position) {
        Some(zone) if zone.id != entity.current_zone_id => {
            crate::debug_zone!(
                entity.id,
                tick,
                "Adopting zone {} (was {})",
                zone.id,
                entity.current_zone_id
            );
            entity.current_zone_id = zone.id.clone();
            entity.target_door = None;
        }
        Some(_) => {}
        None => error!(
            "Entity {} at ({:.1},{:.1}) is outside every zone",
            entity.id, entity.position.x, entity.position.y
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityKind, PLAYER_ID};
    use crate::map::test_support::hall_and_corridor;
    use assert_approx_eq::assert_approx_eq;

    fn player_at(x: f64, y: f64, zone: &str) -> Entity {
        Entity::new(PLAYER_ID, EntityKind::Player, Point::new(x, y), zone, 12.0, 100.0)
    }

    #[test]
    fn test_free_move() {
        let map = hall_and_corridor();
        let mut p = player_at(200.0, 200.0, "hall");
        let outcome = move_with_doors(&mut p, &map, Point::new(1.0, 0.0), 100.0, 0.1, 0);
        assert_eq!(outcome, MoveOutcome::Moved);
        assert_approx_eq!(p.position.x, 210.0);
        assert_eq!(p.facing, Facing::Right);
        assert!(p.is_moving);
    }

    #[test]
    fn test_slide_along_wall() {
        let map = hall_and_corridor();
        // Just inside the north margin (tile y=2 starts at 64)
        let mut p = player_at(200.0, 66.0, "hall");
        let outcome = move_with_doors(&mut p, &map, Point::new(1.0, -1.0), 100.0, 0.1, 0);
        assert_eq!(outcome, MoveOutcome::SlidX);
        assert!(p.position.x > 200.0);
        assert_approx_eq!(p.position.y, 66.0);
        assert!(!map.check_collision(p.position));
    }

    #[test]
    fn test_blocked_in_corner() {
        let map = hall_and_corridor();
        let mut p = player_at(66.0, 66.0, "hall");
        let outcome = move_with_doors(&mut p, &map, Point::new(-1.0, -1.0), 100.0, 0.1, 0);
        assert_eq!(outcome, MoveOutcome::Blocked);
        assert_approx_eq!(p.position.x, 66.0);
        assert_approx_eq!(p.position.y, 66.0);
    }

    #[test]
    fn test_door_transition_to_reciprocal_exit() {
        let map = hall_and_corridor();
        let mut p = player_at(590.0, 240.0, "hall");
        let outcome = move_with_doors(&mut p, &map, Point::new(1.0, 0.0), 200.0, 0.1, 1);
        assert_eq!(
            outcome,
            MoveOutcome::Transitioned {
                from: "hall".to_string(),
                to: "corridor".to_string()
            }
        );
        // Corridor west door at x=640, inset 1.5 tiles + 8
        assert_approx_eq!(p.position.x, 640.0 + 56.0);
        assert_approx_eq!(p.position.y, 240.0);
        assert_eq!(p.current_zone_id, "corridor");
        assert_eq!(map.get_zone_at(p.position).unwrap().id, "corridor");
        // Arrival is clear of the corridor's own trigger
        assert!(map.check_door_transition(p.position, "corridor").is_none());
        assert!(!map.check_collision(p.position));
    }

    #[test]
    fn test_door_round_trip_returns_to_hall() {
        let map = hall_and_corridor();
        let mut p = player_at(590.0, 240.0, "hall");
        move_with_doors(&mut p, &map, Point::new(1.0, 0.0), 200.0, 0.1, 1);
        assert_eq!(p.current_zone_id, "corridor");

        let mut ticks = 0;
        while p.current_zone_id == "corridor" && ticks < 20 {
            move_with_doors(&mut p, &map, Point::new(-1.0, 0.0), 200.0, 0.05, 2);
            ticks += 1;
        }
        assert_eq!(p.current_zone_id, "hall");
        let hall = map.zone("hall").unwrap();
        let (tx, ty) = map.tile_of(p.position);
        assert!(hall.bounds.contains_tile(tx, ty));
    }

    #[test]
    fn test_missing_reciprocal_exit_aborts() {
        let map = hall_and_corridor();
        let mut p = player_at(25.5 * 32.0, 100.0, "corridor");
        let before = p.position;
        let err = zone_transition(&mut p, &map, "attic", 0).unwrap_err();
        assert_eq!(
            err,
            TransitionError::MissingReciprocalExit {
                source_zone: "corridor".to_string(),
                target: "attic".to_string()
            }
        );
        assert_eq!(p.position, before);
        assert_eq!(p.current_zone_id, "corridor");

        let err = zone_transition(&mut p, &map, "cellar", 0).unwrap_err();
        assert_eq!(err, TransitionError::UnknownZone("cellar".to_string()));
    }

    #[test]
    fn test_broken_door_behaves_as_wall() {
        let map = hall_and_corridor();
        // Walking north through the corridor's one-way attic door
        let mut p = player_at(25.5 * 32.0, 50.0, "corridor");
        for _ in 0..10 {
            move_with_doors(&mut p, &map, Point::new(0.0, -1.0), 200.0, 0.05, 0);
        }
        assert_eq!(p.current_zone_id, "corridor");
        assert_eq!(map.get_zone_at(p.position).unwrap().id, "corridor");
    }

    #[test]
    fn test_enemy_adopts_zone_when_crossing() {
        let map = hall_and_corridor();
        let mut e = Entity::new(
            5,
            EntityKind::Dementor,
            Point::new(600.0, 240.0),
            "hall",
            12.0,
            40.0,
        );
        for _ in 0..10 {
            move_toward(&mut e, &map, Point::new(680.0, 240.0), 100.0, 0.1, 0);
        }
        assert_approx_eq!(e.position.x, 680.0);
        assert_eq!(e.current_zone_id, "corridor");
    }

    #[test]
    fn test_move_toward_does_not_overshoot() {
        let map = hall_and_corridor();
        let mut e = Entity::new(5, EntityKind::Dementor, Point::new(200.0, 200.0), "hall", 12.0, 40.0);
        move_toward(&mut e, &map, Point::new(203.0, 200.0), 100.0, 0.1, 0);
        assert_approx_eq!(e.position.x, 203.0);
        let outcome = move_toward(&mut e, &map, Point::new(203.0, 200.0), 100.0, 0.1, 0);
        assert_eq!(outcome, MoveOutcome::Stationary);
    }
}
