//! Spell archetypes, casting, projectile advance, and hit resolution.

use crate::config::{SimConfig, WAND_TIP_FORWARD, WAND_TIP_SIDE};
use crate::effects::EffectSystem;
use crate::entity::{EnemyArchetype, Entity, EntityId, EntityKind, FallState};
use crate::error::CastError;
use crate::map::MapData;
use crate::types::{Facing, Point, Rgb};
use crate::utils::blend_colors;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellType {
    Light,
    Stun,
    Disarm,
    Death,
    Patronus,
    EnemySpell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpellSource {
    Player,
    Enemy,
}

/// Static description of a spell; the cast key lives in the `SpellBook`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellArchetype {
    pub name: String,
    pub color: Rgb,
    pub damage: f64,
    pub speed: f64,
    pub cooldown: f64,
    pub power: f64,
    pub spell_type: SpellType,
    pub radius: f64,
    /// Range budget for straight spells; lifetime in seconds for patronus.
    pub range: f64,
}

impl SpellArchetype {
    #[allow(clippy::too_many_arguments)]
    fn new(
        name: &str,
        color: Rgb,
        damage: f64,
        speed: f64,
        cooldown: f64,
        power: f64,
        spell_type: SpellType,
        radius: f64,
        range: f64,
    ) -> Self {
        SpellArchetype {
            name: name.to_string(),
            color,
            damage,
            speed,
            cooldown,
            power,
            spell_type,
            radius,
            range,
        }
    }
}

/// Spell archetype table handed to the simulation at construction.
#[derive(Debug, Clone)]
pub struct SpellBook {
    keyed: HashMap<char, SpellArchetype>,
    pub enemy_bolt: SpellArchetype,
    pub killing_curse: SpellArchetype,
}

impl SpellBook {
    pub fn empty(enemy_bolt: SpellArchetype, killing_curse: SpellArchetype) -> Self {
        SpellBook {
            keyed: HashMap::new(),
            enemy_bolt,
            killing_curse,
        }
    }

    pub fn insert(&mut self, key: char, archetype: SpellArchetype) {
        self.keyed.insert(key.to_ascii_uppercase(), archetype);
    }

    pub fn get(&self, key: char) -> Option<&SpellArchetype> {
        self.keyed.get(&key.to_ascii_uppercase())
    }
}

impl Default for SpellBook {
    fn default() -> Self {
        let mut book = SpellBook::empty(
            SpellArchetype::new(
                "Dark Bolt",
                Rgb::new(120, 220, 80),
                10.0,
                300.0,
                0.0,
                1.0,
                SpellType::EnemySpell,
                5.0,
                400.0,
            ),
            SpellArchetype::new(
                "Killing Curse",
                Rgb::new(30, 255, 60),
                40.0,
                360.0,
                0.0,
                5.0,
                SpellType::Death,
                6.0,
                450.0,
            ),
        );
        book.insert(
            'Q',
            SpellArchetype::new("Stupefy", Rgb::new(230, 40, 40), 10.0, 420.0, 0.5, 2.0, SpellType::Stun, 6.0, 400.0),
        );
        book.insert(
            'W',
            SpellArchetype::new("Lumos Maxima", Rgb::new(255, 250, 200), 8.0, 480.0, 0.08, 1.0, SpellType::Light, 4.0, 360.0),
        );
        book.insert(
            'E',
            SpellArchetype::new("Expelliarmus", Rgb::new(200, 60, 200), 25.0, 400.0, 0.6, 3.0, SpellType::Disarm, 6.0, 400.0),
        );
        book.insert(
            'R',
            SpellArchetype::new("Avada Kedavra", Rgb::new(40, 255, 80), 100.0, 520.0, 3.0, 5.0, SpellType::Death, 6.0, 500.0),
        );
        book.insert(
            'F',
            SpellArchetype::new("Expecto Patronum", Rgb::new(190, 230, 255), 20.0, 160.0, 10.0, 10.0, SpellType::Patronus, 14.0, 6.0),
        );
        book
    }
}

/// Per-key cooldown bookkeeping for one caster.
#[derive(Debug, Clone, Default)]
pub struct SpellCooldowns {
    last_cast: HashMap<char, f64>,
}

impl SpellCooldowns {
    pub fn remaining(&self, key: char, archetype: &SpellArchetype, now: f64) -> f64 {
        self.last_cast
            .get(&key.to_ascii_uppercase())
            .map(|&t| (archetype.cooldown - (now - t)).max(0.0))
            .unwrap_or(0.0)
    }

    pub fn check(&self, key: char, archetype: &SpellArchetype, now: f64) -> Result<(), CastError> {
        let remaining = self.remaining(key, archetype, now);
        if remaining > 0.0 {
            return Err(CastError::OnCooldown {
                name: archetype.name.clone(),
                remaining,
            });
        }
        Ok(())
    }

    pub fn record(&mut self, key: char, now: f64) {
        self.last_cast.insert(key.to_ascii_uppercase(), now);
    }
}

/// A live projectile.
#[derive(Debug, Clone)]
pub struct Spell {
    pub id: u32,
    pub name: String,
    pub position: Point,
    pub velocity: Point,
    pub speed: f64,
    pub radius: f64,
    pub color: Rgb,
    pub damage: f64,
    pub spell_type: SpellType,
    pub source: SpellSource,
    pub caster: EntityId,
    pub power: f64,
    /// Remaining range budget; zero means annihilated or spent.
    pub life: f64,
    /// Patronus countdown in seconds.
    pub timer: f64,
    pub zone_id: String,
    pub cast_time: f64,
}

impl Spell {
    fn from_archetype(
        id: u32,
        archetype: &SpellArchetype,
        caster: &Entity,
        source: SpellSource,
        origin: Point,
        direction: Point,
        now: f64,
    ) -> Self {
        let is_patronus = archetype.spell_type == SpellType::Patronus;
        Spell {
            id,
            name: archetype.name.clone(),
            position: origin,
            velocity: direction.normalized() * archetype.speed,
            speed: archetype.speed,
            radius: archetype.radius,
            color: archetype.color,
            damage: archetype.damage,
            spell_type: archetype.spell_type,
            source,
            caster: caster.id,
            power: archetype.power,
            life: if is_patronus { 1.0 } else { archetype.range },
            timer: if is_patronus { archetype.range } else { 0.0 },
            zone_id: caster.current_zone_id.clone(),
            cast_time: now,
        }
    }

    pub fn is_patronus(&self) -> bool {
        self.spell_type == SpellType::Patronus
    }

    pub fn is_spent(&self) -> bool {
        if self.is_patronus() {
            self.timer <= 0.0 || self.life <= 0.0
        } else {
            self.life <= 0.0
        }
    }

    pub fn view(&self) -> SpellView {
        SpellView {
            id: self.id,
            position: self.position,
            radius: self.radius,
            color: self.color,
            spell_type: self.spell_type,
            source: self.source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpellView {
    pub id: u32,
    pub position: Point,
    pub radius: f64,
    pub color: Rgb,
    pub spell_type: SpellType,
    pub source: SpellSource,
}

// Wand hand position relative to the caster's center, per facing
pub fn wand_tip(position: Point, facing: Facing) -> Point {
    let offset = match facing {
        Facing::Up => Point::new(WAND_TIP_SIDE, -WAND_TIP_FORWARD),
        Facing::Down => Point::new(-WAND_TIP_SIDE, WAND_TIP_FORWARD),
        Facing::Left => Point::new(-WAND_TIP_FORWARD, -WAND_TIP_SIDE),
        Facing::Right => Point::new(WAND_TIP_FORWARD, WAND_TIP_SIDE),
    };
    position + offset
}

/// Spawns a spell along the caster's facing from the wand tip.
pub fn cast_facing(
    id: u32,
    archetype: &SpellArchetype,
    caster: &Entity,
    source: SpellSource,
    now: f64,
) -> Spell {
    let origin = wand_tip(caster.position, caster.facing);
    Spell::from_archetype(id, archetype, caster, source, origin, caster.facing.unit(), now)
}

/// Spawns a spell aimed at a point, used by AI casters.
pub fn cast_at(
    id: u32,
    archetype: &SpellArchetype,
    caster: &Entity,
    target: Point,
    now: f64,
) -> Spell {
    let direction = target - caster.position;
    let facing = Facing::from_direction(direction).unwrap_or(caster.facing);
    let origin = wand_tip(caster.position, facing);
    Spell::from_archetype(id, archetype, caster, SpellSource::Enemy, origin, direction, now)
}

/// Moves every spell one tick. Straight spells burn range by distance travelled
/// and die on walls; patronus spells home on the nearest living Dementor
/// anywhere on the map, pass through walls, and only expire by time.
pub fn advance_spells(spells: &mut Vec<Spell>, map: &MapData, enemies: &[Entity], dt: f64, tick: u64) {
    for spell in spells.iter_mut() {
        if spell.is_patronus() {
            spell.timer -= dt;
            let target = enemies
                .iter()
                .filter(|e| e.is_dementor() && e.is_alive())
                .min_by(|a, b| {
                    a.position
                        .distance(&spell.position)
                        .total_cmp(&b.position.distance(&spell.position))
                });
            spell.velocity = match target {
                Some(dementor) => (dementor.position - spell.position).normalized() * spell.speed,
                None => Point::ZERO,
            };
            let step = spell.velocity * dt;
            // Never overshoot the target it is homing on
            let step = match target {
                Some(d) if step.length() > d.position.distance(&spell.position) => {
                    d.position - spell.position
                }
                _ => step,
            };
            spell.position += step;
        } else {
            let step = spell.velocity * dt;
            spell.position += step;
            spell.life -= step.length();
            if spell.life <= 0.0 {
                crate::debug_spell!(spell.caster, tick, "{} #{} ran out of range", spell.name, spell.id);
                spell.life = 0.0;
                continue;
            }
            if map.check_collision(spell.position) {
                crate::debug_spell!(
                    spell.caster,
                    tick,
                    "{} #{} hit a wall at ({:.1},{:.1})",
                    spell.name,
                    spell.id,
                    spell.position.x,
                    spell.position.y
                );
                spell.life = 0.0;
                continue;
            }
        }
        if let Some(zone) = map.get_zone_at(spell.position) {
            if zone.id != spell.zone_id {
                spell.zone_id = zone.id.clone();
            }
        }
    }
    spells.retain(|s| !s.is_spent());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClashLoser {
    First,
    Second,
}

/// Lower power loses; on equal power the later cast loses.
pub fn clash_loser(a: &Spell, b: &Spell) -> ClashLoser {
    if a.power != b.power {
        return if a.power < b.power {
            ClashLoser::First
        } else {
            ClashLoser::Second
        };
    }
    if a.cast_time != b.cast_time {
        return if a.cast_time > b.cast_time {
            ClashLoser::First
        } else {
            ClashLoser::Second
        };
    }
    // Same instant: spawn order decides
    if a.id > b.id {
        ClashLoser::First
    } else {
        ClashLoser::Second
    }
}

/// Resolves spell-vs-spell clashes between opposing non-patronus spells.
/// The clash radius is twice the summed radii. Returns the number of clashes.
pub fn resolve_spell_clashes(spells: &mut Vec<Spell>, effects: &mut EffectSystem, tick: u64) -> usize {
    let mut clashes = 0;
    for i in 0..spells.len() {
        for j in (i + 1)..spells.len() {
            let (a, b) = (&spells[i], &spells[j]);
            if a.is_patronus() || b.is_patronus() || a.source == b.source {
                continue;
            }
            if a.life <= 0.0 || b.life <= 0.0 {
                continue;
            }
            if a.position.distance(&b.position) >= 2.0 * (a.radius + b.radius) {
                continue;
            }

            effects.spawn_beam(a.position, b.position, blend_colors(a.color, b.color));
            let loser = match clash_loser(a, b) {
                ClashLoser::First => i,
                ClashLoser::Second => j,
            };
            crate::debug_spell!(
                spells[loser].caster,
                tick,
                "Clash: {} (p{}) vs {} (p{}), {} annihilated",
                a.name,
                a.power,
                b.name,
                b.power,
                spells[loser].name
            );
            spells[loser].life = 0.0;
            clashes += 1;
        }
    }
    spells.retain(|s| !s.is_spent());
    clashes
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    Damaged,
    Stunned,
    Knockdown,
    Killed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub target: EntityId,
    pub spell_type: SpellType,
    pub damage: f64,
    pub outcome: HitOutcome,
    /// Patronus tick damage rather than a one-shot impact.
    pub continuous: bool,
    pub at: Point,
    pub color: Rgb,
}

fn overlaps(spell: &Spell, entity: &Entity) -> bool {
    spell.zone_id == entity.current_zone_id
        && spell.position.distance(&entity.position) < spell.radius + entity.radius
}

/// Applies a spell's type-specific effect to a target and reports the result.
pub fn apply_spell_effect(spell: &Spell, target: &mut Entity, config: &SimConfig) -> (f64, HitOutcome) {
    let (damage, outcome) = match spell.spell_type {
        SpellType::Stun => {
            let dealt = target.take_damage(spell.damage);
            target.stun(config.stun_duration);
            (dealt, HitOutcome::Stunned)
        }
        SpellType::Death if !target.is_player() => {
            let dealt = target.health;
            target.health = 0.0;
            (dealt, HitOutcome::Killed)
        }
        SpellType::Disarm if target.kind == EntityKind::Enemy(EnemyArchetype::Slytherin) => {
            let direction = if spell.velocity.x.abs() >= spell.velocity.y.abs() {
                Point::new(spell.velocity.x.signum(), 0.0)
            } else {
                Point::new(0.0, spell.velocity.y.signum())
            };
            target.fall = Some(FallState {
                direction,
                timer: config.fall_duration,
            });
            target.attached_to = None;
            (0.0, HitOutcome::Knockdown)
        }
        _ => (target.take_damage(spell.damage), HitOutcome::Damaged),
    };
    if !target.is_alive() {
        (damage, HitOutcome::Killed)
    } else {
        (damage, outcome)
    }
}

/// Resolves spell-vs-entity hits for one tick. Player spells hit enemies in
/// the same zone and are consumed, except patronus which persists, deals tick
/// damage on overlap, and scorches and scatters Dementors within its aura.
/// Enemy spells hit the player.
pub fn resolve_entity_hits(
    spells: &mut Vec<Spell>,
    player: &mut Entity,
    enemies: &mut [Entity],
    config: &SimConfig,
    dt: f64,
    tick: u64,
) -> Vec<Hit> {
    let mut hits = Vec::new();
    for spell in spells.iter_mut() {
        if spell.is_spent() {
            continue;
        }
        match spell.source {
            SpellSource::Player if spell.is_patronus() => {
                for enemy in enemies.iter_mut().filter(|e| e.is_alive()) {
                    let mut damage = 0.0;
                    if overlaps(spell, enemy) {
                        damage += spell.damage * dt;
                    }
                    if enemy.is_dementor()
                        && enemy.position.distance(&spell.position) <= config.patronus_aura_radius
                    {
                        damage += config.patronus_aura_dps * dt;
                        enemy.is_fleeing = true;
                        enemy.attached_to = None;
                    }
                    if damage > 0.0 {
                        let dealt = enemy.take_damage(damage);
                        let outcome = if enemy.is_alive() {
                            HitOutcome::Damaged
                        } else {
                            HitOutcome::Killed
                        };
                        hits.push(Hit {
                            target: enemy.id,
                            spell_type: SpellType::Patronus,
                            damage: dealt,
                            outcome,
                            continuous: true,
                            at: enemy.position,
                            color: spell.color,
                        });
                    }
                }
            }
            SpellSource::Player => {
                let target = enemies
                    .iter_mut()
                    .find(|e| e.is_alive() && e.fall.is_none() && overlaps(spell, e));
                if let Some(enemy) = target {
                    let (damage, outcome) = apply_spell_effect(spell, enemy, config);
                    crate::debug_combat!(
                        enemy.id,
                        tick,
                        "Hit by {} for {:.1} ({:?}), health {:.1}",
                        spell.name,
                        damage,
                        outcome,
                        enemy.health
                    );
                    hits.push(Hit {
                        target: enemy.id,
                        spell_type: spell.spell_type,
                        damage,
                        outcome,
                        continuous: false,
                        at: enemy.position,
                        color: spell.color,
                    });
                    spell.life = 0.0;
                }
            }
            SpellSource::Enemy => {
                if player.is_alive() && overlaps(spell, player) {
                    let (damage, outcome) = apply_spell_effect(spell, player, config);
                    crate::debug_combat!(
                        player.id,
                        tick,
                        "Player hit by {} for {:.1}, health {:.1}",
                        spell.name,
                        damage,
                        player.health
                    );
                    hits.push(Hit {
                        target: player.id,
                        spell_type: spell.spell_type,
                        damage,
                        outcome,
                        continuous: false,
                        at: player.position,
                        color: spell.color,
                    });
                    spell.life = 0.0;
                }
            }
        }
    }
    spells.retain(|s| !s.is_spent());
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::PLAYER_ID;
    use crate::map::test_support::hall_and_corridor;
    use assert_approx_eq::assert_approx_eq;

    fn player() -> Entity {
        let mut p = Entity::new(PLAYER_ID, EntityKind::Player, Point::new(200.0, 200.0), "hall", 12.0, 100.0);
        p.facing = Facing::Right;
        p
    }

    fn enemy(id: EntityId, kind: EntityKind, x: f64, y: f64) -> Entity {
        Entity::new(id, kind, Point::new(x, y), "hall", 12.0, 50.0)
    }

    fn spell_at(id: u32, source: SpellSource, power: f64, cast_time: f64, x: f64) -> Spell {
        let book = SpellBook::default();
        let caster = player();
        let mut s = cast_facing(id, book.get('W').unwrap(), &caster, source, cast_time);
        s.position = Point::new(x, 200.0);
        s.power = power;
        s
    }

    #[test]
    fn test_cast_from_wand_tip() {
        let book = SpellBook::default();
        let p = player();
        let s = cast_facing(1, book.get('q').unwrap(), &p, SpellSource::Player, 0.0);
        assert_approx_eq!(s.position.x, 200.0 + WAND_TIP_FORWARD);
        assert_approx_eq!(s.position.y, 200.0 + WAND_TIP_SIDE);
        assert_approx_eq!(s.velocity.x, 420.0);
        assert_approx_eq!(s.velocity.y, 0.0);
        assert_eq!(s.spell_type, SpellType::Stun);
        assert_eq!(s.zone_id, "hall");
    }

    #[test]
    fn test_wand_tip_differs_per_facing() {
        let origin = Point::new(0.0, 0.0);
        let tips: Vec<Point> = [Facing::Up, Facing::Down, Facing::Left, Facing::Right]
            .iter()
            .map(|f| wand_tip(origin, *f))
            .collect();
        for i in 0..tips.len() {
            for j in (i + 1)..tips.len() {
                assert_ne!(tips[i], tips[j]);
            }
        }
    }

    #[test]
    fn test_cooldown_rejects_recast() {
        let book = SpellBook::default();
        let w = book.get('W').unwrap();
        let mut cooldowns = SpellCooldowns::default();
        assert!(cooldowns.check('W', w, 1.0).is_ok());
        cooldowns.record('W', 1.0);

        match cooldowns.check('w', w, 1.05) {
            Err(CastError::OnCooldown { remaining, .. }) => assert_approx_eq!(remaining, 0.03),
            other => panic!("expected cooldown rejection, got {:?}", other),
        }
        assert!(cooldowns.check('W', w, 1.08).is_ok());
    }

    #[test]
    fn test_straight_spell_burns_range_and_hits_walls() {
        let map = hall_and_corridor();
        let p = player();
        let book = SpellBook::default();
        let mut spells = vec![cast_facing(1, book.get('W').unwrap(), &p, SpellSource::Player, 0.0)];
        advance_spells(&mut spells, &map, &[], 0.1, 0);
        assert_eq!(spells.len(), 1);
        assert_approx_eq!(spells[0].life, 360.0 - 48.0);

        // Far enough right to reach the hall's east wall band (x >= 576 away from the door)
        spells[0].position = Point::new(560.0, 100.0);
        advance_spells(&mut spells, &map, &[], 0.1, 1);
        assert!(spells.is_empty());
    }

    #[test]
    fn test_spell_expires_when_range_spent() {
        let map = hall_and_corridor();
        let p = player();
        let book = SpellBook::default();
        let mut spells = vec![cast_facing(1, book.get('W').unwrap(), &p, SpellSource::Player, 0.0)];
        spells[0].life = 10.0;
        advance_spells(&mut spells, &map, &[], 0.1, 0);
        assert!(spells.is_empty());
    }

    #[test]
    fn test_patronus_homes_and_expires_by_time() {
        let map = hall_and_corridor();
        let p = player();
        let book = SpellBook::default();
        let dementors = vec![
            enemy(1, EntityKind::Dementor, 200.0, 400.0),
            enemy(2, EntityKind::Dementor, 500.0, 200.0),
        ];
        let mut spells = vec![cast_facing(1, book.get('F').unwrap(), &p, SpellSource::Player, 0.0)];
        let start = spells[0].position;
        advance_spells(&mut spells, &map, &dementors, 0.1, 0);
        // Nearest Dementor is below the caster, so the charm turns downward
        assert!(spells[0].position.y > start.y);
        assert_approx_eq!(spells[0].timer, 5.9);

        spells[0].timer = 0.05;
        advance_spells(&mut spells, &map, &dementors, 0.1, 1);
        assert!(spells.is_empty());
    }

    #[test]
    fn test_patronus_homes_on_dementor_next_door() {
        let map = hall_and_corridor();
        let p = player();
        let book = SpellBook::default();
        let mut dementor = enemy(1, EntityKind::Dementor, 720.0, 240.0);
        dementor.current_zone_id = "corridor".to_string();
        let mut spells = vec![cast_facing(1, book.get('F').unwrap(), &p, SpellSource::Player, 0.0)];
        let start = spells[0].position;
        advance_spells(&mut spells, &map, &[dementor], 0.1, 0);
        assert!(spells[0].velocity.length() > 0.0);
        assert!(spells[0].position.x > start.x);
    }

    #[test]
    fn test_clash_power_wins() {
        let mut effects = EffectSystem::new(0.4);
        let mut spells = vec![
            spell_at(1, SpellSource::Player, 3.0, 0.0, 200.0),
            spell_at(2, SpellSource::Enemy, 1.0, 0.0, 205.0),
        ];
        assert_eq!(resolve_spell_clashes(&mut spells, &mut effects, 0), 1);
        assert_eq!(spells.len(), 1);
        assert_eq!(spells[0].id, 1);
        assert_eq!(effects.beams().len(), 1);
    }

    #[test]
    fn test_clash_tie_first_cast_wins() {
        let mut effects = EffectSystem::new(0.4);
        let mut spells = vec![
            spell_at(7, SpellSource::Enemy, 2.0, 1.50, 205.0),
            spell_at(8, SpellSource::Player, 2.0, 1.25, 200.0),
        ];
        resolve_spell_clashes(&mut spells, &mut effects, 0);
        assert_eq!(spells.len(), 1);
        // Spell 8 was cast earlier, so spell 7 is annihilated
        assert_eq!(spells[0].id, 8);
    }

    #[test]
    fn test_clash_threshold_is_twice_radii() {
        let mut effects = EffectSystem::new(0.4);
        // Radii 4 + 4: hit distance 8, clash distance 16
        let mut spells = vec![
            spell_at(1, SpellSource::Player, 1.0, 0.0, 200.0),
            spell_at(2, SpellSource::Enemy, 1.0, 0.1, 212.0),
        ];
        assert_eq!(resolve_spell_clashes(&mut spells, &mut effects, 0), 1);

        let mut spells = vec![
            spell_at(1, SpellSource::Player, 1.0, 0.0, 200.0),
            spell_at(2, SpellSource::Enemy, 1.0, 0.1, 217.0),
        ];
        assert_eq!(resolve_spell_clashes(&mut spells, &mut effects, 0), 0);

        // Same source never clashes
        let mut spells = vec![
            spell_at(1, SpellSource::Player, 1.0, 0.0, 200.0),
            spell_at(2, SpellSource::Player, 1.0, 0.1, 201.0),
        ];
        assert_eq!(resolve_spell_clashes(&mut spells, &mut effects, 0), 0);
    }

    #[test]
    fn test_player_spell_hits_same_zone_enemy_only() {
        let config = SimConfig::default();
        let mut p = player();
        let mut enemies = vec![enemy(1, EntityKind::Enemy(EnemyArchetype::DarkWizard), 300.0, 200.0)];
        let mut spells = vec![spell_at(1, SpellSource::Player, 1.0, 0.0, 295.0)];
        spells[0].zone_id = "corridor".to_string();
        assert!(resolve_entity_hits(&mut spells, &mut p, &mut enemies, &config, 0.016, 0).is_empty());
        assert_eq!(spells.len(), 1);

        spells[0].zone_id = "hall".to_string();
        let hits = resolve_entity_hits(&mut spells, &mut p, &mut enemies, &config, 0.016, 0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].outcome, HitOutcome::Damaged);
        assert_approx_eq!(enemies[0].health, 42.0);
        assert!(spells.is_empty());
    }

    #[test]
    fn test_stun_and_death_effects() {
        let config = SimConfig::default();
        let book = SpellBook::default();
        let caster = player();

        let mut target = enemy(1, EntityKind::DeathEater, 300.0, 200.0);
        let stun = cast_facing(1, book.get('Q').unwrap(), &caster, SpellSource::Player, 0.0);
        let (_, outcome) = apply_spell_effect(&stun, &mut target, &config);
        assert_eq!(outcome, HitOutcome::Stunned);
        assert!(target.is_stunned);
        assert_approx_eq!(target.stun_timer, config.stun_duration);

        let death = cast_facing(2, book.get('R').unwrap(), &caster, SpellSource::Player, 0.0);
        let mut target = enemy(2, EntityKind::Dementor, 300.0, 200.0);
        target.health = 5000.0;
        let (_, outcome) = apply_spell_effect(&death, &mut target, &config);
        assert_eq!(outcome, HitOutcome::Killed);
        assert_eq!(target.health, 0.0);

        // The killing curse only deals its damage to the player
        let mut victim = player();
        let curse = cast_at(3, &book.killing_curse, &target, victim.position, 0.0);
        let (damage, outcome) = apply_spell_effect(&curse, &mut victim, &config);
        assert_approx_eq!(damage, 40.0);
        assert_eq!(outcome, HitOutcome::Damaged);
        assert_approx_eq!(victim.health, 60.0);
    }

    #[test]
    fn test_disarm_knocks_down_slytherin() {
        let config = SimConfig::default();
        let book = SpellBook::default();
        let mut caster = player();
        caster.facing = Facing::Left;
        let disarm = cast_facing(1, book.get('E').unwrap(), &caster, SpellSource::Player, 0.0);

        let mut slytherin = enemy(1, EntityKind::Enemy(EnemyArchetype::Slytherin), 100.0, 200.0);
        let (damage, outcome) = apply_spell_effect(&disarm, &mut slytherin, &config);
        assert_eq!(outcome, HitOutcome::Knockdown);
        assert_eq!(damage, 0.0);
        let fall = slytherin.fall.unwrap();
        assert_eq!(fall.direction, Point::new(-1.0, 0.0));
        assert!(slytherin.is_alive());

        let mut wizard = enemy(2, EntityKind::Enemy(EnemyArchetype::DarkWizard), 100.0, 200.0);
        let (damage, outcome) = apply_spell_effect(&disarm, &mut wizard, &config);
        assert_eq!(outcome, HitOutcome::Damaged);
        assert_approx_eq!(damage, 25.0);
        assert!(wizard.fall.is_none());
    }

    #[test]
    fn test_patronus_persists_and_scatters_dementors() {
        let config = SimConfig::default();
        let book = SpellBook::default();
        let mut p = player();
        let mut enemies = vec![
            enemy(1, EntityKind::Dementor, 230.0, 200.0),
            enemy(2, EntityKind::Dementor, 300.0, 260.0),
            enemy(3, EntityKind::Dementor, 600.0, 400.0),
        ];
        enemies[0].attached_to = Some(PLAYER_ID);
        let mut spells = vec![cast_facing(1, book.get('F').unwrap(), &p, SpellSource::Player, 0.0)];

        let hits = resolve_entity_hits(&mut spells, &mut p, &mut enemies, &config, 0.5, 0);
        assert_eq!(spells.len(), 1, "patronus is not consumed by hits");
        assert!(hits.iter().all(|h| h.continuous));
        assert!(enemies[0].is_fleeing && enemies[1].is_fleeing);
        assert!(!enemies[2].is_fleeing);
        assert_eq!(enemies[0].attached_to, None);
        // Overlap tick damage plus aura damage for the first, aura only for the second
        assert_approx_eq!(enemies[0].health, 50.0 - 10.0 - 7.5);
        assert_approx_eq!(enemies[1].health, 50.0 - 7.5);
        assert_approx_eq!(enemies[2].health, 50.0);
    }
}
