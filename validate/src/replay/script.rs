//! Replay scripts
//!
//! A script is a list of keyframes describing the player's world over time.
//! Each frame only needs the fields that change; everything else carries
//! over from the previous frame.
//!
//! ```toml
//! [meta]
//! step_secs = 0.1
//! tail_secs = 5.0
//!
//! [[frame]]
//! at = 0.0
//! map = 1149
//! position = [0.0, 0.0, 0.0]
//!
//! [[frame]]
//! at = 12.5
//! in_combat = true
//! keys = [70]
//! ```
//!
//! Between keyframes the replay ticks every `step_secs`, so timers see a
//! realistic frame cadence.

use std::path::{Path, PathBuf};

use cadence_core::{Point3, WorldSnapshot};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read script {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse script")]
    Syntax(#[from] toml::de::Error),

    #[error("frame {index} at {at}s comes before the frame preceding it")]
    OutOfOrder { index: usize, at: f32 },

    #[error("frame {index} position must have exactly three values")]
    InvalidPosition { index: usize },

    #[error("step_secs must be positive (got {0})")]
    InvalidStep(f32),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptMeta {
    #[serde(default)]
    pub description: Option<String>,

    /// Seconds between ticks when no keyframe is due
    #[serde(default = "default_step")]
    pub step_secs: f32,

    /// Keep ticking this long after the last keyframe
    #[serde(default)]
    pub tail_secs: f32,
}

impl Default for ScriptMeta {
    fn default() -> Self {
        Self {
            description: None,
            step_secs: default_step(),
            tail_secs: 0.0,
        }
    }
}

fn default_step() -> f32 {
    0.05
}

/// A keyframe. Unset fields keep their previous value.
#[derive(Debug, Clone, Deserialize)]
pub struct Frame {
    pub at: f32,
    #[serde(default)]
    pub map: Option<u32>,
    #[serde(default)]
    pub position: Option<Vec<f32>>,
    #[serde(default)]
    pub in_combat: Option<bool>,
    #[serde(default)]
    pub modifiers: Option<u8>,
    /// Key codes pressed at this instant
    #[serde(default)]
    pub keys: Vec<u32>,
}

impl Frame {
    fn apply(&self, world: &mut WorldSnapshot) {
        if let Some(map) = self.map {
            world.map_id = map;
        }
        if let Some(position) = self.position.as_deref().and_then(Point3::from_slice) {
            world.position = position;
        }
        if let Some(in_combat) = self.in_combat {
            world.in_combat = in_combat;
        }
        if let Some(modifiers) = self.modifiers {
            world.modifiers = modifiers;
        }
    }
}

/// One engine update: world state plus any key presses delivered first
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub at: f32,
    pub world: WorldSnapshot,
    pub keys: Vec<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub meta: ScriptMeta,

    #[serde(default, rename = "frame")]
    pub frames: Vec<Frame>,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let content = std::fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ScriptError> {
        let script: Script = toml::from_str(content)?;
        script.validate()?;
        Ok(script)
    }

    fn validate(&self) -> Result<(), ScriptError> {
        if self.meta.step_secs.is_nan() || self.meta.step_secs <= 0.0 {
            return Err(ScriptError::InvalidStep(self.meta.step_secs));
        }

        let mut last = f32::MIN;
        for (index, frame) in self.frames.iter().enumerate() {
            if frame.at < last {
                return Err(ScriptError::OutOfOrder {
                    index,
                    at: frame.at,
                });
            }
            last = frame.at;

            if let Some(position) = &frame.position
                && Point3::from_slice(position).is_none()
            {
                return Err(ScriptError::InvalidPosition { index });
            }
        }
        Ok(())
    }

    /// Seconds from start to the last tick
    pub fn duration(&self) -> f32 {
        self.frames.last().map_or(0.0, |f| f.at) + self.meta.tail_secs
    }

    /// Expand keyframes into the full tick sequence.
    ///
    /// Ticks fall on the step grid from 0 to [`Script::duration`]; keyframes
    /// get their own tick at their exact time.
    pub fn timeline(&self) -> Vec<Tick> {
        let step = self.meta.step_secs;
        let end = self.duration();

        let mut ticks: Vec<Tick> = Vec::new();
        let mut world = WorldSnapshot::default();
        let mut frames = self.frames.iter().peekable();
        let mut step_index: u32 = 0;

        loop {
            let grid = step_index as f32 * step;

            while let Some(frame) = frames.next_if(|f| f.at <= grid) {
                frame.apply(&mut world);
                ticks.push(Tick {
                    at: frame.at,
                    world,
                    keys: frame.keys.clone(),
                });
            }

            if grid > end {
                break;
            }
            if ticks.last().is_none_or(|t| t.at < grid) {
                ticks.push(Tick {
                    at: grid,
                    world,
                    keys: Vec::new(),
                });
            }
            step_index += 1;
        }
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[meta]
step_secs = 1.0
tail_secs = 2.0

[[frame]]
at = 0.0
map = 5
position = [1.0, 2.0, 3.0]

[[frame]]
at = 6.0
keys = [70]

[[frame]]
at = 6.5
in_combat = true
"#;

    #[test]
    fn timeline_fills_step_grid() {
        let script = Script::parse(SAMPLE).unwrap();
        let ticks = script.timeline();
        let times: Vec<f32> = ticks.iter().map(|t| t.at).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 6.5, 7.0, 8.0]);
        assert_eq!(script.duration(), 8.5);
    }

    #[test]
    fn fields_carry_over_between_frames() {
        let script = Script::parse(SAMPLE).unwrap();
        let ticks = script.timeline();

        let at_three = &ticks[3];
        assert_eq!(at_three.world.map_id, 5);
        assert_eq!(at_three.world.position, Point3::new(1.0, 2.0, 3.0));
        assert!(!at_three.world.in_combat);
        assert!(at_three.keys.is_empty());

        let at_six = &ticks[6];
        assert_eq!(at_six.keys, vec![70]);
        assert_eq!(at_six.world.map_id, 5);

        assert!(ticks[7].world.in_combat);
        assert!(ticks[9].world.in_combat);
    }

    #[test]
    fn rejects_out_of_order_frames() {
        let err = Script::parse(
            r#"
[[frame]]
at = 5.0

[[frame]]
at = 1.0
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ScriptError::OutOfOrder { index: 1, .. }));
    }

    #[test]
    fn rejects_bad_position_and_step() {
        let err = Script::parse("[[frame]]\nat = 0.0\nposition = [1.0, 2.0]\n").unwrap_err();
        assert!(matches!(err, ScriptError::InvalidPosition { index: 0 }));

        let err = Script::parse("[meta]\nstep_secs = 0.0\n").unwrap_err();
        assert!(matches!(err, ScriptError::InvalidStep(_)));
    }

    #[test]
    fn empty_script_has_single_tick() {
        let script = Script::parse("").unwrap();
        let ticks = script.timeline();
        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks[0].world, WorldSnapshot::default());
    }
}
