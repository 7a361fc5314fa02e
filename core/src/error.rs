//! Error types for encounter validation and definition loading

use std::path::PathBuf;

use thiserror::Error;

/// Why an encounter definition cannot be used.
///
/// Raised during `initialize`. The owning encounter is marked as errored and
/// never activates; other encounters are unaffected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    // ─── Triggers ───────────────────────────────────────────────────────────
    #[error("requireCombat and requireOutOfCombat cannot both be set to true")]
    CombatConflict,

    #[error("requireEntry and requireDeparture cannot both be set to true")]
    AreaConflict,

    #[error("invalid position")]
    InvalidPosition,

    #[error("invalid radius/size")]
    InvalidArea,

    #[error("At least one of requireEntry and requireDeparture must be set to true")]
    NoAreaRequirement,

    // ─── Timers ─────────────────────────────────────────────────────────────
    #[error("{name} invalid timestamps property")]
    InvalidTimestamps { name: String },

    #[error("{name} invalid position property")]
    InvalidTimerPosition { name: String },

    #[error("{name} invalid texture property")]
    InvalidTexture { name: String },

    #[error("{name} texture '{texture}' could not be loaded")]
    TextureNotFound { name: String, texture: String },

    #[error("{name} needs warning or alert text")]
    MissingAlertText { name: String },

    #[error("{name} invalid text property")]
    InvalidText { name: String },

    // ─── Actions ────────────────────────────────────────────────────────────
    #[error("{name} has no trigger")]
    MissingActionTrigger { name: String },

    #[error("{name} trigger invalid - {source}")]
    InvalidActionTrigger {
        name: String,
        #[source]
        source: Box<ValidationError>,
    },

    // ─── Phases ─────────────────────────────────────────────────────────────
    #[error("phase missing start trigger")]
    MissingStartTrigger,

    #[error("phase '{phase}' has no finish trigger but is not the last phase")]
    UnboundedPhase { phase: String },

    // ─── Encounters ─────────────────────────────────────────────────────────
    #[error("Map property undefined/invalid")]
    InvalidMap,

    #[error("Phase property undefined")]
    NoPhases,

    #[error("Reset property is undefined")]
    MissingReset,

    #[error("Reset trigger invalid - {0}")]
    InvalidReset(#[source] Box<ValidationError>),

    #[error("{encounter}: {source}")]
    InPhase {
        encounter: String,
        #[source]
        source: Box<ValidationError>,
    },
}

/// Errors while reading definition files
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read definition file {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse definition TOML in {path}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to parse definition JSON in {path}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported definition file {path} (expected .toml or .json)")]
    UnsupportedFormat { path: PathBuf },
}
