//! Configuration constants and runtime settings for the simulation core.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// Map geometry
pub const WALL_MARGIN_TILES: i64 = 2; // Inner safe zone is the zone shrunk by this many tiles
pub const DOOR_WIDTH_TILES: i64 = 3; // Every door opening is 3 tiles wide
pub const DOOR_TOLERANCE_TILES: i64 = 1; // Slack on each end of a door opening
pub const DOOR_TRIGGER_SCALE: f64 = 1.2; // Trigger box padding, in tile sizes
pub const TRANSITION_INSET_TILES: f64 = 1.5; // How far inside the new zone an entity reappears
pub const TRANSITION_PIXEL_OFFSET: f64 = 8.0; // Extra push past the door trigger box
pub const DOOR_PUSH_TILES: f64 = 1.0; // Enemies aim this far past a door to cross it

// Player
pub const PLAYER_SPEED: f64 = 180.0; // World units per second
pub const PLAYER_RADIUS: f64 = 12.0;
pub const PLAYER_MAX_HEALTH: f64 = 100.0;
pub const PLAYER_LIVES: u32 = 3;
pub const CAST_ANIMATION_TIME: f64 = 0.25; // Seconds the casting pose blocks movement
pub const WAND_TIP_FORWARD: f64 = 20.0; // Wand tip distance ahead of the caster
pub const WAND_TIP_SIDE: f64 = 6.0; // Wand hand sits slightly off-centre

// Status effects
pub const STUN_DURATION: f64 = 2.0; // Seconds
pub const FALL_DURATION: f64 = 0.8; // Slytherin knockback fall
pub const FALL_SPEED: f64 = 140.0;

// Dementors
pub const DEMENTOR_ATTACH_DISTANCE: f64 = 24.0;
pub const DEMENTOR_DRAIN_RATE: f64 = 5.0; // Health per second, per attached Dementor

// Patronus
pub const PATRONUS_DURATION: f64 = 6.0; // Seconds the charm and the global flee effect last
pub const PATRONUS_AURA_RADIUS: f64 = 120.0;
pub const PATRONUS_AURA_DPS: f64 = 15.0; // Damage per second to Dementors in the aura

// Pursuit
pub const PURSUIT_BUFFER: f64 = 6.0; // Gap kept between an enemy and the player

// Spell-vs-spell clash beams (cosmetic)
pub const BEAM_LIFETIME: f64 = 0.4;

// Loop
pub const MAX_FRAME_DELTA: f64 = 0.05; // Clamp after a stall; no catch-up steps
pub const HEADLESS_FRAME_DELTA: f64 = 1.0 / 60.0;
pub const DEFAULT_HEADLESS_TICKS: u32 = 3600;

// Spawner
pub const SPAWN_INTERVAL: f64 = 12.0; // Seconds between periodic spawns
pub const SPAWN_BUDGET: u32 = 6; // Extra enemies after the initial placement
pub const MAX_ALIVE_ENEMIES: usize = 8;

// Scoring
pub const LEVEL_SCORE_STEP: u32 = 500;

// Host window
pub const WINDOW_WIDTH: i32 = 960;
pub const WINDOW_HEIGHT: i32 = 640;
pub const HUD_HEIGHT: f32 = 48.0;

/// Runtime tunables for one simulation instance.
///
/// Defaults mirror the constants above; a host may override any subset from
/// a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub player_speed: f64,
    pub player_radius: f64,
    pub player_max_health: f64,
    pub player_lives: u32,
    pub cast_animation_time: f64,
    pub stun_duration: f64,
    pub fall_duration: f64,
    pub fall_speed: f64,
    pub dementor_attach_distance: f64,
    pub dementor_drain_rate: f64,
    pub patronus_duration: f64,
    pub patronus_aura_radius: f64,
    pub patronus_aura_dps: f64,
    pub pursuit_buffer: f64,
    pub beam_lifetime: f64,
    pub max_frame_delta: f64,
    pub spawn_interval: f64,
    pub spawn_budget: u32,
    pub max_alive_enemies: usize,
    pub level_score_step: u32,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            player_speed: PLAYER_SPEED,
            player_radius: PLAYER_RADIUS,
            player_max_health: PLAYER_MAX_HEALTH,
            player_lives: PLAYER_LIVES,
            cast_animation_time: CAST_ANIMATION_TIME,
            stun_duration: STUN_DURATION,
            fall_duration: FALL_DURATION,
            fall_speed: FALL_SPEED,
            dementor_attach_distance: DEMENTOR_ATTACH_DISTANCE,
            dementor_drain_rate: DEMENTOR_DRAIN_RATE,
            patronus_duration: PATRONUS_DURATION,
            patronus_aura_radius: PATRONUS_AURA_RADIUS,
            patronus_aura_dps: PATRONUS_AURA_DPS,
            pursuit_buffer: PURSUIT_BUFFER,
            beam_lifetime: BEAM_LIFETIME,
            max_frame_delta: MAX_FRAME_DELTA,
            spawn_interval: SPAWN_INTERVAL,
            spawn_budget: SPAWN_BUDGET,
            max_alive_enemies: MAX_ALIVE_ENEMIES,
            level_score_step: LEVEL_SCORE_STEP,
            seed: 0,
        }
    }
}

impl SimConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_frame_delta <= 0.0 {
            return Err(ConfigError::Invalid("max_frame_delta must be positive"));
        }
        if self.player_lives == 0 {
            return Err(ConfigError::Invalid("player_lives must be at least 1"));
        }
        if self.level_score_step == 0 {
            return Err(ConfigError::Invalid("level_score_step must be at least 1"));
        }
        Ok(())
    }
}
