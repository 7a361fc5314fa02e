//! Cadence engine: scripted encounter timing and cue evaluation.
//!
//! Encounters are loaded from definitions, validated once, and then driven
//! frame by frame with a world snapshot. Cues (alert panels, direction
//! trails, markers, speech) go out through an [`EffectSink`].

pub mod actions;
pub mod context;
pub mod effects;
pub mod encounter;
pub mod error;
pub mod loader;
pub mod manager;
pub mod phase;
pub mod timers;
pub mod triggers;
pub mod world;

#[cfg(test)]
mod encounter_tests;
#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use actions::SkipAction;
pub use context::EngineContext;
pub use effects::{
    AlertPanel, EffectEvent, EffectHandle, EffectSink, MarkerSpec, RecordingSink,
    ResourceProvider, TextureId, TrailSpec,
};
pub use encounter::{Encounter, EncounterState};
pub use error::{LoadError, ValidationError};
pub use loader::{
    LoadedEncounters, build_encounters, load_dir, load_file, parse_definitions_json,
    parse_definitions_toml,
};
pub use manager::EncounterManager;
pub use phase::{DEFAULT_TIMER_SET, Phase, PhaseState};
pub use timers::{ActiveEntityRegistry, Timer, TimerBehavior, TimerInstanceId, TimerKind};
pub use triggers::{Trigger, TriggerBehavior};
pub use world::{KeyPress, ModifierKeys, Point3, WorldSnapshot, WorldState};

pub use cadence_types as types;
