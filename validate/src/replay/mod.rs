//! Replay engine for encounter validation
//!
//! Expands scripts into ticks and paces them with a virtual clock.

pub mod clock;
pub mod script;

pub use clock::VirtualClock;
pub use script::{Script, ScriptError, Tick};
