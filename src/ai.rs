//! Enemy decision logic, run once per tick for every live enemy.
//!
//! Regular enemies and Death Eaters pursue the player directly when they
//! share a zone, head for the connecting door when the player is one door
//! away and the door is within vision range, and otherwise stay dormant.
//! Dementors use the same pursuit but latch onto the player instead of
//! firing, and scatter while the player's Patronus is active.

use crate::config::{DOOR_PUSH_TILES, SimConfig};
use crate::entity::{EnemyArchetype, Entity, EntityId, EntityKind, PLAYER_ID};
use crate::map::MapData;
use crate::movement;
use crate::spell::{self, Spell, SpellBook};
use crate::types::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemySpell {
    Bolt,
    KillingCurse,
}

/// Tunables for one enemy kind.
#[derive(Debug, Clone, PartialEq)]
pub struct AiPolicy {
    pub max_health: f64,
    pub radius: f64,
    pub chase_speed: f64,
    pub flee_speed: f64,
    pub vision_range: f64,
    pub fire_range: f64,
    pub fire_cooldown: f64,
    pub spell: Option<EnemySpell>,
    pub score: u32,
}

/// Policy table handed to the simulation at construction.
#[derive(Debug, Clone)]
pub struct AiPolicyTable {
    pub slytherin: AiPolicy,
    pub dark_wizard: AiPolicy,
    pub death_eater: AiPolicy,
    pub dementor: AiPolicy,
}

impl AiPolicyTable {
    pub fn get(&self, kind: EntityKind) -> Option<&AiPolicy> {
        match kind {
            EntityKind::Player => None,
            EntityKind::Enemy(EnemyArchetype::Slytherin) => Some(&self.slytherin),
            EntityKind::Enemy(EnemyArchetype::DarkWizard) => Some(&self.dark_wizard),
            EntityKind::DeathEater => Some(&self.death_eater),
            EntityKind::Dementor => Some(&self.dementor),
        }
    }
}

impl Default for AiPolicyTable {
    fn default() -> Self {
        AiPolicyTable {
            slytherin: AiPolicy {
                max_health: 40.0,
                radius: 12.0,
                chase_speed: 90.0,
                flee_speed: 90.0,
                vision_range: 256.0,
                fire_range: 260.0,
                fire_cooldown: 2.0,
                spell: Some(EnemySpell::Bolt),
                score: 100,
            },
            dark_wizard: AiPolicy {
                max_health: 60.0,
                radius: 12.0,
                chase_speed: 80.0,
                flee_speed: 80.0,
                vision_range: 256.0,
                fire_range: 300.0,
                fire_cooldown: 1.5,
                spell: Some(EnemySpell::Bolt),
                score: 150,
            },
            death_eater: AiPolicy {
                max_health: 120.0,
                radius: 14.0,
                chase_speed: 70.0,
                flee_speed: 70.0,
                vision_range: 320.0,
                fire_range: 340.0,
                fire_cooldown: 3.5,
                spell: Some(EnemySpell::KillingCurse),
                score: 400,
            },
            dementor: AiPolicy {
                max_health: 80.0,
                radius: 14.0,
                chase_speed: 75.0,
                flee_speed: 150.0,
                vision_range: 288.0,
                fire_range: 0.0,
                fire_cooldown: 0.0,
                spell: None,
                score: 250,
            },
        }
    }
}

/// Read-only context for one AI pass.
pub struct AiFrame<'a> {
    pub map: &'a MapData,
    pub policies: &'a AiPolicyTable,
    pub spells: &'a SpellBook,
    pub config: &'a SimConfig,
    pub now: f64,
    pub dt: f64,
    pub tick: u64,
    pub patronus_active: bool,
}

#[derive(Debug, Clone)]
pub enum AiEvent {
    Fired(Spell),
    Attached(EntityId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sighting {
    Player,
    Door(Point),
    Unseen,
}

/// Decides what the enemy can see and caches the door target when pursuing
/// across a zone boundary. The door is looked up among the *enemy's* zone
/// exits, by the player's zone id.
pub fn sight(enemy: &mut Entity, player: &Entity, map: &MapData, vision_range: f64) -> Sighting {
    if enemy.current_zone_id == player.current_zone_id {
        enemy.target_door = None;
        return Sighting::Player;
    }
    let door = map.zone(&enemy.current_zone_id).and_then(|zone| {
        zone.exit_to(&player.current_zone_id)
            .map(|exit| (map.door_center(zone, exit), exit.side))
    });
    match door {
        Some((center, side)) if enemy.position.distance(&center) <= vision_range => {
            // Aim a little past the door so the step actually crosses it
            let target = center + side.outward() * (DOOR_PUSH_TILES * map.tile_size);
            enemy.target_door = Some(target);
            Sighting::Door(target)
        }
        _ => {
            enemy.target_door = None;
            Sighting::Unseen
        }
    }
}

/// Runs one AI step for every live enemy and collects spells fired and new
/// Dementor attachments.
pub fn run_enemy_ai(
    enemies: &mut [Entity],
    player: &Entity,
    frame: &AiFrame,
    next_spell_id: &mut u32,
) -> Vec<AiEvent> {
    let mut events = Vec::new();
    for enemy in enemies.iter_mut().filter(|e| e.is_alive()) {
        let Some(policy) = frame.policies.get(enemy.kind) else {
            continue;
        };
        if let Some(fall) = enemy.fall {
            let drift = enemy.position + fall.direction * (frame.config.fall_speed * frame.dt);
            movement::move_toward(enemy, frame.map, drift, frame.config.fall_speed, frame.dt, frame.tick);
            continue;
        }
        if enemy.is_dementor() {
            if let Some(event) = update_dementor(enemy, player, policy, frame) {
                events.push(event);
            }
        } else if let Some(event) = update_caster(enemy, player, policy, frame, next_spell_id) {
            events.push(event);
        }
    }
    events
}

fn update_caster(
    enemy: &mut Entity,
    player: &Entity,
    policy: &AiPolicy,
    frame: &AiFrame,
    next_spell_id: &mut u32,
) -> Option<AiEvent> {
    if enemy.is_stunned {
        enemy.is_moving = false;
        return None;
    }
    match sight(enemy, player, frame.map, policy.vision_range) {
        Sighting::Player => {
            let offset = player.position - enemy.position;
            let gap = offset.length() - (enemy.radius + player.radius + frame.config.pursuit_buffer);
            if gap > 0.0 {
                let stop_at = enemy.position + offset.normalized() * gap;
                movement::move_toward(enemy, frame.map, stop_at, policy.chase_speed, frame.dt, frame.tick);
            } else {
                enemy.is_moving = false;
            }
        }
        Sighting::Door(target) => {
            crate::debug_ai!(enemy.id, frame.tick, "Pursuing through door at ({:.1},{:.1})", target.x, target.y);
            movement::move_toward(enemy, frame.map, target, policy.chase_speed, frame.dt, frame.tick);
        }
        Sighting::Unseen => {
            enemy.is_moving = false;
            return None;
        }
    }

    // Firing needs a shared zone, range, a ready cooldown, and a living target
    let kind = policy.spell?;
    if enemy.current_zone_id != player.current_zone_id || !player.is_alive() {
        return None;
    }
    if enemy.position.distance(&player.position) > policy.fire_range {
        return None;
    }
    if let Some(last) = enemy.last_fire_time {
        if frame.now - last < policy.fire_cooldown {
            return None;
        }
    }
    let archetype = match kind {
        EnemySpell::Bolt => &frame.spells.enemy_bolt,
        EnemySpell::KillingCurse => &frame.spells.killing_curse,
    };
    let id = *next_spell_id;
    *next_spell_id += 1;
    enemy.last_fire_time = Some(frame.now);
    crate::debug_ai!(enemy.id, frame.tick, "Firing {} at player", archetype.name);
    Some(AiEvent::Fired(spell::cast_at(id, archetype, enemy, player.position, frame.now)))
}

fn update_dementor(
    dementor: &mut Entity,
    player: &Entity,
    policy: &AiPolicy,
    frame: &AiFrame,
) -> Option<AiEvent> {
    if frame.patronus_active {
        dementor.is_fleeing = true;
        dementor.attached_to = None;
        movement::move_away(dementor, frame.map, player.position, policy.flee_speed, frame.dt, frame.tick);
        return None;
    }
    if dementor.attached_to.is_some() {
        pin_to(dementor, player);
        return None;
    }
    if dementor.is_stunned {
        dementor.is_moving = false;
        return None;
    }

    match sight(dementor, player, frame.map, policy.vision_range) {
        Sighting::Player => {
            let distance = dementor.position.distance(&player.position);
            if player.is_alive() && distance < frame.config.dementor_attach_distance {
                crate::debug_ai!(dementor.id, frame.tick, "Attached to player");
                dementor.attached_to = Some(PLAYER_ID);
                pin_to(dementor, player);
                return Some(AiEvent::Attached(dementor.id));
            }
            movement::move_toward(dementor, frame.map, player.position, policy.chase_speed, frame.dt, frame.tick);
        }
        Sighting::Door(target) => {
            movement::move_toward(dementor, frame.map, target, policy.chase_speed, frame.dt, frame.tick);
        }
        Sighting::Unseen => dementor.is_moving = false,
    }
    None
}

// Attached Dementors ride along with the player, across zones too
fn pin_to(dementor: &mut Entity, player: &Entity) {
    dementor.position = player.position;
    dementor.current_zone_id = player.current_zone_id.clone();
    dementor.is_moving = player.is_moving;
    dementor.target_door = None;
}

/// Drains the player once per attached Dementor. Dementors let go when the
/// player is no longer valid. Returns the health actually drained.
pub fn apply_dementor_drain(enemies: &mut [Entity], player: &mut Entity, rate: f64, dt: f64) -> f64 {
    let mut drained = 0.0;
    for dementor in enemies
        .iter_mut()
        .filter(|e| e.is_dementor() && e.attached_to == Some(PLAYER_ID))
    {
        if !dementor.is_alive() || !player.is_alive() {
            dementor.attached_to = None;
            continue;
        }
        drained += player.take_damage(rate * dt);
    }
    drained
}

/// Patronus activation: every Dementor flees and lets go at once.
pub fn scatter_dementors(enemies: &mut [Entity]) -> usize {
    let mut count = 0;
    for dementor in enemies.iter_mut().filter(|e| e.is_dementor() && e.is_alive()) {
        dementor.is_fleeing = true;
        dementor.attached_to = None;
        count += 1;
    }
    count
}

/// Patronus expiry: fleeing Dementors go back to chasing.
pub fn calm_dementors(enemies: &mut [Entity]) {
    for dementor in enemies.iter_mut().filter(|e| e.is_dementor()) {
        dementor.is_fleeing = false;
    }
}

pub fn spawn_enemy(id: EntityId, kind: EntityKind, position: Point, zone_id: &str, policies: &AiPolicyTable) -> Option<Entity> {
    let policy = policies.get(kind)?;
    Some(Entity::new(id, kind, position, zone_id, policy.radius, policy.max_health))
}
