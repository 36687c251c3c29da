use crate::ai::{self, AiEvent, AiFrame, AiPolicyTable};
use crate::config::SimConfig;
use crate::effects::{BeamView, EffectSystem, SparkView};
use crate::entity::{Entity, EntityId, EntityKind, EntityView, PLAYER_ID};
use crate::error::CastError;
use crate::map::MapData;
use crate::movement::{self, MoveOutcome};
use crate::spell::{self, Hit, HitOutcome, Spell, SpellBook, SpellCooldowns, SpellSource, SpellType, SpellView};
use crate::types::TickInput;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

const SPARK_COUNT: usize = 10;
const SPARK_SPEED: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    InProgress,
    Victory,
    Defeat,
}

/// Named audio signals; playback belongs to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SoundCue {
    Cast,
    Hit,
    Death,
    Clash,
    Door,
    DementorAttach,
    Patronus,
    LifeLost,
}

/// Discrete things that happened during a tick, drained by the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SimEvent {
    SpellCast { caster: EntityId, name: String, spell_type: SpellType },
    CastRejected(String),
    PlayerDamaged { amount: f64, health: f64 },
    EnemyDefeated { id: EntityId, kind: EntityKind },
    ScoreChanged(u32),
    LevelChanged(u32),
    ZoneChanged { from: String, to: String },
    DementorAttached(EntityId),
    LifeLost { lives_left: u32 },
    Victory,
    Defeat,
    Sound(SoundCue),
}

/// Read-only view of the whole simulation for one frame.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub time: f64,
    pub player: EntityView,
    pub enemies: Vec<EntityView>,
    pub spells: Vec<SpellView>,
    pub beams: Vec<BeamView>,
    pub sparks: Vec<SparkView>,
    pub lives: u32,
    pub score: u32,
    pub level: u32,
    pub patronus_remaining: f64,
    pub outcome: Outcome,
    pub message: Option<String>,
}

// Periodic reinforcements on top of the initial placement
#[derive(Debug)]
struct Spawner {
    timer: f64,
    remaining: u32,
    rng: StdRng,
}

/// One simulation instance. All collaborators are handed in at construction
/// and state is only mutated inside [`Game::tick`] and [`Game::cast`].
#[derive(Debug)]
pub struct Game {
    map: MapData,
    config: SimConfig,
    spell_book: SpellBook,
    policies: AiPolicyTable,
    pub player: Entity,
    pub lives: u32,
    cooldowns: SpellCooldowns,
    patronus_timer: f64,
    pub enemies: Vec<Entity>,
    pub spells: Vec<Spell>,
    effects: EffectSystem,
    events: Vec<SimEvent>,
    tick: u64,
    time: f64,
    score: u32,
    level: u32,
    spawner: Spawner,
    next_entity_id: EntityId,
    next_spell_id: u32,
    outcome: Outcome,
    message: Option<String>,
}

impl Game {
    /// Builds a game and places one enemy on every enemy spawn point.
    pub fn new(map: MapData, config: SimConfig, spell_book: SpellBook, policies: AiPolicyTable) -> Self {
        let player = Entity::new(
            PLAYER_ID,
            EntityKind::Player,
            map.player_spawn_position(),
            &map.player_spawn.zone,
            config.player_radius,
            config.player_max_health,
        );
        // Without spawn points there is nothing left to reinforce with
        let remaining = if map.enemy_spawns.is_empty() { 0 } else { config.spawn_budget };
        let spawner = Spawner {
            timer: 0.0,
            remaining,
            rng: StdRng::seed_from_u64(config.seed),
        };

        let mut game = Game {
            player,
            lives: config.player_lives,
            cooldowns: SpellCooldowns::default(),
            patronus_timer: 0.0,
            enemies: Vec::new(),
            spells: Vec::new(),
            effects: EffectSystem::new(config.beam_lifetime),
            events: Vec::new(),
            tick: 0,
            time: 0.0,
            score: 0,
            level: 1,
            spawner,
            next_entity_id: PLAYER_ID + 1,
            next_spell_id: 1,
            outcome: Outcome::InProgress,
            message: None,
            map,
            config,
            spell_book,
            policies,
        };
        for index in 0..game.map.enemy_spawns.len() {
            game.spawn_at(index);
        }
        info!(
            "Game created: player in '{}', {} enemies, {} reinforcements",
            game.player.current_zone_id,
            game.enemies.len(),
            game.spawner.remaining
        );
        game
    }

    pub fn map(&self) -> &MapData {
        &self.map
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn patronus_active(&self) -> bool {
        self.patronus_timer > 0.0
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advances the simulation by one frame. `dt` is clamped to the
    /// configured maximum; a long stall is never caught up. A non-finite
    /// `dt` counts as a zero-length frame.
    pub fn tick(&mut self, dt: f64, input: &TickInput) {
        if self.outcome != Outcome::InProgress {
            return;
        }
        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.config.max_frame_delta)
        } else {
            0.0
        };
        self.tick += 1;
        self.time += dt;

        // 1. Movement intent, then casts
        self.apply_player_input(input, dt);

        // 2. Animation state
        self.player.advance_animation(dt);
        for enemy in self.enemies.iter_mut() {
            enemy.advance_animation(dt);
        }

        // 3. Spells
        spell::advance_spells(&mut self.spells, &self.map, &self.enemies, dt, self.tick);

        // 4. Enemy AI
        self.run_ai(dt);

        // 5. Dementor drain
        let drained = ai::apply_dementor_drain(
            &mut self.enemies,
            &mut self.player,
            self.config.dementor_drain_rate,
            dt,
        );
        if drained > 0.0 {
            self.events.push(SimEvent::PlayerDamaged {
                amount: drained,
                health: self.player.health,
            });
        }

        // 6. Collisions
        self.resolve_collisions(dt);

        // 7. Timers
        self.update_timers(dt);

        // 8. Cosmetic effects
        self.effects.update(dt);

        // 9. Defeats, lives, end of game
        self.reap_defeated();
        self.check_end_conditions();
    }

    fn apply_player_input(&mut self, input: &TickInput, dt: f64) {
        if self.player.can_act() && self.player.is_alive() {
            let outcome = movement::move_with_doors(
                &mut self.player,
                &self.map,
                input.direction,
                self.config.player_speed,
                dt,
                self.tick,
            );
            if let MoveOutcome::Transitioned { from, to } = outcome {
                info!("Player entered '{}' from '{}'", to, from);
                self.events.push(SimEvent::ZoneChanged { from, to });
                self.events.push(SimEvent::Sound(SoundCue::Door));
            }
        } else {
            self.player.is_moving = false;
        }

        for &key in &input.casts {
            // Rejections are reported through events and the message line
            let _ = self.cast(key);
        }
    }

    /// Casts the spell bound to `key` from the player's wand. A cooldown
    /// rejection also sets the user-facing message and emits `CastRejected`.
    pub fn cast(&mut self, key: char) -> Result<(), CastError> {
        match self.try_cast(key) {
            Ok(()) => Ok(()),
            Err(err) => {
                if let CastError::OnCooldown { .. } = err {
                    let message = err.to_string();
                    debug!("Cast rejected: {}", message);
                    self.message = Some(message.clone());
                    self.events.push(SimEvent::CastRejected(message));
                } else {
                    debug!("Cast of '{}' ignored: {}", key, err);
                }
                Err(err)
            }
        }
    }

    fn try_cast(&mut self, key: char) -> Result<(), CastError> {
        if self.player.is_stunned {
            return Err(CastError::Stunned);
        }
        let archetype = self.spell_book.get(key).ok_or(CastError::UnknownSpell(key))?;
        self.cooldowns.check(key, archetype, self.time)?;

        let mut spell = spell::cast_facing(
            self.next_spell_id,
            archetype,
            &self.player,
            SpellSource::Player,
            self.time,
        );
        self.next_spell_id += 1;
        self.cooldowns.record(key, self.time);
        self.player.start_cast(self.config.cast_animation_time);
        crate::debug_spell!(
            PLAYER_ID,
            self.tick,
            "Cast {} #{} facing {:?}",
            spell.name,
            spell.id,
            self.player.facing
        );

        if spell.is_patronus() {
            // The charm and the global flee effect share one clock
            spell.timer = self.config.patronus_duration;
            self.patronus_timer = self.config.patronus_duration;
            let scattered = ai::scatter_dementors(&mut self.enemies);
            info!("Patronus summoned, {} Dementors scattered", scattered);
            self.events.push(SimEvent::Sound(SoundCue::Patronus));
        } else {
            self.events.push(SimEvent::Sound(SoundCue::Cast));
        }
        self.events.push(SimEvent::SpellCast {
            caster: PLAYER_ID,
            name: spell.name.clone(),
            spell_type: spell.spell_type,
        });
        self.spells.push(spell);
        Ok(())
    }

    fn run_ai(&mut self, dt: f64) {
        let frame = AiFrame {
            map: &self.map,
            policies: &self.policies,
            spells: &self.spell_book,
            config: &self.config,
            now: self.time,
            dt,
            tick: self.tick,
            patronus_active: self.patronus_timer > 0.0,
        };
        let events = ai::run_enemy_ai(&mut self.enemies, &self.player, &frame, &mut self.next_spell_id);
        for event in events {
            match event {
                AiEvent::Fired(spell) => {
                    self.events.push(SimEvent::SpellCast {
                        caster: spell.caster,
                        name: spell.name.clone(),
                        spell_type: spell.spell_type,
                    });
                    self.events.push(SimEvent::Sound(SoundCue::Cast));
                    self.spells.push(spell);
                }
                AiEvent::Attached(id) => {
                    self.events.push(SimEvent::DementorAttached(id));
                    self.events.push(SimEvent::Sound(SoundCue::DementorAttach));
                }
            }
        }
    }

    fn resolve_collisions(&mut self, dt: f64) {
        let clashes = spell::resolve_spell_clashes(&mut self.spells, &mut self.effects, self.tick);
        if clashes > 0 {
            self.events.push(SimEvent::Sound(SoundCue::Clash));
        }

        let hits = spell::resolve_entity_hits(
            &mut self.spells,
            &mut self.player,
            &mut self.enemies,
            &self.config,
            dt,
            self.tick,
        );
        for hit in hits {
            self.record_hit(hit);
        }
    }

    fn record_hit(&mut self, hit: Hit) {
        if hit.target == PLAYER_ID {
            self.events.push(SimEvent::PlayerDamaged {
                amount: hit.damage,
                health: self.player.health,
            });
        }
        if !hit.continuous {
            self.effects.spawn_sparks(hit.at, hit.color, SPARK_COUNT, SPARK_SPEED);
            self.events.push(SimEvent::Sound(SoundCue::Hit));
        }
        if hit.outcome == HitOutcome::Stunned && hit.target != PLAYER_ID {
            crate::debug_combat!(hit.target, self.tick, "Stunned");
        }
    }

    fn update_timers(&mut self, dt: f64) {
        if self.player.tick_stun(dt) {
            crate::debug_combat!(PLAYER_ID, self.tick, "Stun wore off");
        }
        for enemy in self.enemies.iter_mut() {
            if enemy.tick_stun(dt) {
                crate::debug_combat!(enemy.id, self.tick, "Stun wore off");
            }
            if let Some(fall) = enemy.fall.as_mut() {
                fall.timer -= dt;
                if fall.timer <= 0.0 {
                    crate::debug_combat!(enemy.id, self.tick, "Fall finished, defeated");
                    enemy.fall = None;
                    enemy.health = 0.0;
                }
            }
        }

        if self.patronus_timer > 0.0 {
            self.patronus_timer -= dt;
            if self.patronus_timer <= 0.0 {
                self.patronus_timer = 0.0;
                ai::calm_dementors(&mut self.enemies);
                info!("Patronus faded");
            }
        }

        self.update_spawner(dt);
    }

    fn update_spawner(&mut self, dt: f64) {
        if self.spawner.remaining == 0 {
            return;
        }
        self.spawner.timer += dt;
        if self.spawner.timer < self.config.spawn_interval {
            return;
        }
        self.spawner.timer -= self.config.spawn_interval;

        let alive = self.enemies.iter().filter(|e| e.is_alive()).count();
        if alive >= self.config.max_alive_enemies {
            debug!("Spawn skipped, {} enemies already alive", alive);
            return;
        }
        let index = self.spawner.rng.gen_range(0..self.map.enemy_spawns.len());
        if self.spawn_at(index) {
            self.spawner.remaining -= 1;
        }
    }

    // Places one enemy on the given spawn point. Returns false if the kind has no policy.
    fn spawn_at(&mut self, index: usize) -> bool {
        let Some(point) = self.map.enemy_spawns.get(index) else {
            return false;
        };
        let kind = EntityKind::from(point.kind);
        let position = self.map.grid_to_world(point.x, point.y);
        match ai::spawn_enemy(self.next_entity_id, kind, position, &point.zone, &self.policies) {
            Some(enemy) => {
                info!(
                    "Spawned {:?} #{} in '{}' at ({:.0},{:.0})",
                    kind, enemy.id, enemy.current_zone_id, position.x, position.y
                );
                self.next_entity_id += 1;
                self.enemies.push(enemy);
                true
            }
            None => {
                warn!("No AI policy for {:?}, spawn skipped", kind);
                false
            }
        }
    }

    fn reap_defeated(&mut self) {
        let (defeated, alive): (Vec<Entity>, Vec<Entity>) =
            std::mem::take(&mut self.enemies).into_iter().partition(|e| !e.is_alive());
        self.enemies = alive;

        for enemy in defeated {
            info!("{:?} #{} defeated", enemy.kind, enemy.id);
            self.events.push(SimEvent::EnemyDefeated {
                id: enemy.id,
                kind: enemy.kind,
            });
            self.events.push(SimEvent::Sound(SoundCue::Death));
            let value = self.policies.get(enemy.kind).map_or(0, |p| p.score);
            self.add_score(value);
        }
    }

    fn add_score(&mut self, value: u32) {
        if value == 0 {
            return;
        }
        self.score += value;
        self.events.push(SimEvent::ScoreChanged(self.score));
        let level = 1 + self.score / self.config.level_score_step;
        if level != self.level {
            self.level = level;
            info!("Reached level {}", level);
            self.events.push(SimEvent::LevelChanged(level));
        }
    }

    fn check_end_conditions(&mut self) {
        if !self.player.is_alive() {
            self.lives = self.lives.saturating_sub(1);
            info!("Player fell, {} lives left", self.lives);
            self.events.push(SimEvent::LifeLost { lives_left: self.lives });
            self.events.push(SimEvent::Sound(SoundCue::LifeLost));
            if self.lives == 0 {
                self.finish(Outcome::Defeat);
                return;
            }
            self.respawn_player();
        }

        if self.enemies.is_empty() && self.spawner.remaining == 0 {
            self.finish(Outcome::Victory);
        }
    }

    fn respawn_player(&mut self) {
        let p = &mut self.player;
        p.position = self.map.player_spawn_position();
        p.current_zone_id = self.map.player_spawn.zone.clone();
        p.health = p.max_health;
        p.is_stunned = false;
        p.stun_timer = 0.0;
        p.is_casting = false;
        p.cast_timer = 0.0;
        p.is_moving = false;
        for dementor in self.enemies.iter_mut().filter(|e| e.attached_to == Some(PLAYER_ID)) {
            dementor.attached_to = None;
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        self.outcome = outcome;
        let (event, text) = match outcome {
            Outcome::Victory => (SimEvent::Victory, "Victory! The castle is safe."),
            _ => (SimEvent::Defeat, "Defeat. The castle has fallen."),
        };
        info!("Game over after {} ticks: {:?}, score {}", self.tick, outcome, self.score);
        self.message = Some(text.to_string());
        self.events.push(event);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick,
            time: self.time,
            player: self.player.view(),
            enemies: self.enemies.iter().filter(|e| e.is_alive()).map(Entity::view).collect(),
            spells: self.spells.iter().map(Spell::view).collect(),
            beams: self.effects.beam_views(),
            sparks: self.effects.spark_views(),
            lives: self.lives,
            score: self.score,
            level: self.level,
            patronus_remaining: self.patronus_timer,
            outcome: self.outcome,
            message: self.message.clone(),
        }
    }
}
