//! Wandfire simulation core: zone maps joined by doors, wall-sliding
//! movement, spell projectiles with clash resolution, and enemy AI, driven
//! one frame at a time by a host.

pub mod ai;
pub mod assets;
pub mod config;
pub mod effects;
pub mod entity;
pub mod error;
pub mod game;
pub mod logging;
pub mod map;
pub mod movement;
pub mod spell;
pub mod types;
pub mod utils;

pub use game::{Game, Outcome, SimEvent, Snapshot, SoundCue};
