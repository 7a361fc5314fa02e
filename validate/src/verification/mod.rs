//! Checkpoint verification for encounter validation
//!
//! Defines expected engine output and verifies it against a replay.

pub mod checkpoint;

pub use checkpoint::{CheckpointVerifier, Expectations, Observation};
