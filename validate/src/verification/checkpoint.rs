//! Checkpoint-based cue verification
//!
//! Allows defining expected engine output at specific script times
//! and verifying that actual behavior matches expectations.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use cadence_core::{EncounterManager, EncounterState, RecordingSink};
use serde::{Deserialize, Serialize};

/// A checkpoint defines expected output at a specific script time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Script time in seconds when to check
    pub at_secs: f32,

    /// Alert texts that should be on screen
    #[serde(default)]
    pub alerts_visible: Vec<String>,

    /// Alert texts that should not be on screen
    #[serde(default)]
    pub alerts_absent: Vec<String>,

    /// Expected state per encounter id
    #[serde(default)]
    pub states: BTreeMap<String, EncounterState>,

    /// Lines that should have been spoken by this time
    #[serde(default)]
    pub spoken: Vec<String>,

    /// Optional description for debugging
    #[serde(default)]
    pub description: Option<String>,
}

/// Full expectations file for a script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expectations {
    #[serde(default)]
    pub meta: ExpectationsMeta,

    /// Checkpoints to verify, in time order
    #[serde(default, rename = "checkpoint")]
    pub checkpoints: Vec<Checkpoint>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpectationsMeta {
    #[serde(default)]
    pub description: Option<String>,

    /// Checkpoints are evaluated this many seconds early at most
    #[serde(default)]
    pub tolerance_secs: f32,
}

impl Expectations {
    /// Load expectations from a TOML file
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let expectations: Expectations = toml::from_str(&content)?;
        Ok(expectations)
    }
}

/// Engine output sampled after a tick
#[derive(Debug, Clone, Default)]
pub struct Observation {
    pub visible_alerts: Vec<String>,
    pub states: HashMap<String, EncounterState>,
    pub spoken: Vec<String>,
}

impl Observation {
    pub fn capture(manager: &EncounterManager, sink: &RecordingSink) -> Self {
        Self {
            visible_alerts: sink
                .alerts()
                .filter(|panel| panel.visible)
                .map(|panel| panel.text.clone())
                .collect(),
            states: manager
                .encounters()
                .iter()
                .map(|e| (e.id.clone(), e.state()))
                .collect(),
            spoken: sink.spoken().to_vec(),
        }
    }
}

/// Result of verifying a single checkpoint
#[derive(Debug, Clone)]
pub struct CheckpointResult {
    pub checkpoint_idx: usize,
    pub at_secs: f32,
    pub passed: bool,
    pub failures: Vec<String>,
}

/// Overall verification result
#[derive(Debug, Clone)]
pub struct VerificationResult {
    pub checkpoints_passed: u32,
    pub checkpoints_total: u32,
    pub results: Vec<CheckpointResult>,
}

impl VerificationResult {
    pub fn passed(&self) -> bool {
        self.checkpoints_passed == self.checkpoints_total
    }
}

/// Verifies engine output against expected checkpoints
#[derive(Debug)]
pub struct CheckpointVerifier {
    expectations: Expectations,
    current_checkpoint_idx: usize,
    results: Vec<CheckpointResult>,
}

impl CheckpointVerifier {
    pub fn new(expectations: Expectations) -> Self {
        Self {
            expectations,
            current_checkpoint_idx: 0,
            results: Vec::new(),
        }
    }

    /// Verify the next checkpoint if `elapsed_secs` has reached it.
    /// Call repeatedly until it returns `None` to drain every due checkpoint.
    pub fn check_time(
        &mut self,
        elapsed_secs: f32,
        observation: &Observation,
    ) -> Option<CheckpointResult> {
        let checkpoint = self.expectations.checkpoints.get(self.current_checkpoint_idx)?;
        let tolerance = self.expectations.meta.tolerance_secs;

        if elapsed_secs < checkpoint.at_secs - tolerance {
            return None;
        }

        let mut failures = Vec::new();

        for text in &checkpoint.alerts_visible {
            if !observation.visible_alerts.contains(text) {
                failures.push(format!("Alert '{}' should be visible but is not", text));
            }
        }

        for text in &checkpoint.alerts_absent {
            if observation.visible_alerts.contains(text) {
                failures.push(format!("Alert '{}' should not be visible", text));
            }
        }

        for (id, expected) in &checkpoint.states {
            match observation.states.get(id) {
                None => failures.push(format!("Encounter '{}' is not loaded", id)),
                Some(actual) if actual != expected => failures.push(format!(
                    "Encounter '{}' expected {:?} but is {:?}",
                    id, expected, actual
                )),
                Some(_) => {}
            }
        }

        for line in &checkpoint.spoken {
            if !observation.spoken.contains(line) {
                failures.push(format!("Line '{}' should have been spoken", line));
            }
        }

        let result = CheckpointResult {
            checkpoint_idx: self.current_checkpoint_idx,
            at_secs: checkpoint.at_secs,
            passed: failures.is_empty(),
            failures,
        };

        self.results.push(result.clone());
        self.current_checkpoint_idx += 1;

        Some(result)
    }

    /// Get final verification result. Checkpoints past the end of the
    /// script count as failed.
    pub fn finalize(mut self) -> VerificationResult {
        for (idx, checkpoint) in self
            .expectations
            .checkpoints
            .iter()
            .enumerate()
            .skip(self.current_checkpoint_idx)
        {
            self.results.push(CheckpointResult {
                checkpoint_idx: idx,
                at_secs: checkpoint.at_secs,
                passed: false,
                failures: vec!["Checkpoint was never reached".to_string()],
            });
        }

        let passed = self.results.iter().filter(|r| r.passed).count() as u32;
        let total = self.results.len() as u32;

        VerificationResult {
            checkpoints_passed: passed,
            checkpoints_total: total,
            results: self.results,
        }
    }

    /// Check if all checkpoints have been processed
    pub fn is_complete(&self) -> bool {
        self.current_checkpoint_idx >= self.expectations.checkpoints.len()
    }
}
