// Error types: map loading, zone transitions, spell casting, configuration

use thiserror::Error;

/// Map descriptor load and validation errors
#[derive(Error, Debug)]
pub enum MapError {
    #[error("Malformed map descriptor: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Map asset '{0}' not found")]
    MissingAsset(String),
    #[error("Failed to read map file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Tile size must be positive, got {0}")]
    InvalidTileSize(f64),
    #[error("Map has no zones")]
    NoZones,
    #[error("Duplicate zone id '{0}'")]
    DuplicateZone(String),
    #[error("Zone '{0}' has empty bounds")]
    EmptyBounds(String),
    #[error("Spawn point references unknown zone '{0}'")]
    UnknownSpawnZone(String),
}

/// Zone hand-off failures. These are data-integrity problems: the transition
/// is aborted and the entity stays where it was.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Unknown zone '{0}'")]
    UnknownZone(String),
    #[error("Zone '{target}' has no exit back to '{source_zone}'")]
    MissingReciprocalExit { source_zone: String, target: String },
}

/// Rejected cast attempts
#[derive(Error, Debug, PartialEq)]
pub enum CastError {
    #[error("No spell bound to key '{0}'")]
    UnknownSpell(char),
    #[error("{name} is recharging ({remaining:.2}s)")]
    OnCooldown { name: String, remaining: f64 },
    #[error("Cannot cast while stunned")]
    Stunned,
}

/// Runtime configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}
