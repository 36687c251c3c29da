use crate::map::SpawnKind;
use crate::types::{Facing, Point};
use serde::Serialize;

pub type EntityId = u32;

/// The player always carries this id; enemies count up from 1.
pub const PLAYER_ID: EntityId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EnemyArchetype {
    Slytherin,
    DarkWizard,
}

// Closed set of actor kinds, fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityKind {
    Player,
    Enemy(EnemyArchetype),
    DeathEater,
    Dementor,
}

impl From<SpawnKind> for EntityKind {
    fn from(kind: SpawnKind) -> Self {
        match kind {
            SpawnKind::Slytherin => EntityKind::Enemy(EnemyArchetype::Slytherin),
            SpawnKind::DarkWizard => EntityKind::Enemy(EnemyArchetype::DarkWizard),
            SpawnKind::DeathEater => EntityKind::DeathEater,
            SpawnKind::Dementor => EntityKind::Dementor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DementorState {
    Chasing,
    Attached,
    Fleeing,
}

// Scripted knockback after a disarm hit on a Slytherin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallState {
    pub direction: Point,
    pub timer: f64,
}

/// Mutable per-actor record shared by the player and every enemy kind.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Point,
    pub radius: f64,
    pub health: f64,
    pub max_health: f64,
    pub current_zone_id: String,
    pub facing: Facing,
    pub is_moving: bool,
    pub is_casting: bool,
    pub cast_timer: f64,
    pub is_stunned: bool,
    pub stun_timer: f64,
    pub anim_time: f64,
    // AI-only
    pub target_door: Option<Point>,
    pub is_fleeing: bool,
    pub attached_to: Option<EntityId>,
    pub last_fire_time: Option<f64>,
    pub fall: Option<FallState>,
}

impl Entity {
    pub fn new(
        id: EntityId,
        kind: EntityKind,
        position: Point,
        zone_id: &str,
        radius: f64,
        max_health: f64,
    ) -> Self {
        Entity {
            id,
            kind,
            position,
            radius,
            health: max_health,
            max_health,
            current_zone_id: zone_id.to_string(),
            facing: Facing::Down,
            is_moving: false,
            is_casting: false,
            cast_timer: 0.0,
            is_stunned: false,
            stun_timer: 0.0,
            anim_time: 0.0,
            target_door: None,
            is_fleeing: false,
            attached_to: None,
            last_fire_time: None,
            fall: None,
        }
    }

    pub fn is_player(&self) -> bool {
        self.kind == EntityKind::Player
    }

    pub fn is_dementor(&self) -> bool {
        self.kind == EntityKind::Dementor
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Movement and attacks are gated while stunned, casting, or falling.
    pub fn can_act(&self) -> bool {
        !self.is_stunned && !self.is_casting && self.fall.is_none()
    }

    pub fn dementor_state(&self) -> Option<DementorState> {
        if !self.is_dementor() {
            return None;
        }
        Some(if self.is_fleeing {
            DementorState::Fleeing
        } else if self.attached_to.is_some() {
            DementorState::Attached
        } else {
            DementorState::Chasing
        })
    }

    /// Subtracts damage, clamping at zero. Returns the health actually lost.
    pub fn take_damage(&mut self, amount: f64) -> f64 {
        let before = self.health;
        self.health = (self.health - amount.max(0.0)).max(0.0);
        before - self.health
    }

    pub fn stun(&mut self, duration: f64) {
        self.is_stunned = true;
        self.stun_timer = self.stun_timer.max(duration);
    }

    pub fn start_cast(&mut self, duration: f64) {
        self.is_casting = true;
        self.cast_timer = duration;
    }

    // Casting pose countdown plus the walk-cycle clock the renderer reads
    pub fn advance_animation(&mut self, dt: f64) {
        if self.is_casting {
            self.cast_timer -= dt;
            if self.cast_timer <= 0.0 {
                self.cast_timer = 0.0;
                self.is_casting = false;
            }
        }
        if self.is_moving {
            self.anim_time += dt;
        } else {
            self.anim_time = 0.0;
        }
    }

    /// Counts down the stun timer. Returns true on the tick the stun wears off.
    pub fn tick_stun(&mut self, dt: f64) -> bool {
        if !self.is_stunned {
            return false;
        }
        self.stun_timer -= dt;
        if self.stun_timer <= 0.0 {
            self.stun_timer = 0.0;
            self.is_stunned = false;
            return true;
        }
        false
    }

    pub fn view(&self) -> EntityView {
        EntityView {
            id: self.id,
            kind: self.kind,
            position: self.position,
            radius: self.radius,
            health: self.health,
            max_health: self.max_health,
            zone_id: self.current_zone_id.clone(),
            facing: self.facing,
            is_moving: self.is_moving,
            anim_time: self.anim_time,
            is_casting: self.is_casting,
            is_stunned: self.is_stunned,
            is_falling: self.fall.is_some(),
            dementor_state: self.dementor_state(),
        }
    }
}

/// Read-only copy of an entity for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityView {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Point,
    pub radius: f64,
    pub health: f64,
    pub max_health: f64,
    pub zone_id: String,
    pub facing: Facing,
    pub is_moving: bool,
    /// Seconds spent walking without a stop; drives the walk bob.
    pub anim_time: f64,
    pub is_casting: bool,
    pub is_stunned: bool,
    pub is_falling: bool,
    pub dementor_state: Option<DementorState>,
}
