use cadence_types::SoundDefinition;
use tracing::debug;

use super::{TimerBehavior, TimerCommon};
use crate::context::EngineContext;
use crate::effects::ResourceProvider;
use crate::error::ValidationError;

/// Speaks its text once per timestamp.
///
/// A cursor walks the sorted timestamps; at most one line is spoken per
/// update. The cursor only rewinds on `activate` and `stop`.
#[derive(Debug)]
pub struct SoundTimer {
    pub common: TimerCommon,
    text: Option<String>,
    cursor: usize,
}

impl SoundTimer {
    pub fn from_definition(def: &SoundDefinition) -> Self {
        Self {
            common: TimerCommon::from_definition(&def.common),
            text: def.text.clone().filter(|s| !s.is_empty()),
            cursor: 0,
        }
    }

    /// Index of the next timestamp to speak
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl TimerBehavior for SoundTimer {
    fn common(&self) -> &TimerCommon {
        &self.common
    }

    fn initialize(&mut self, _resources: &mut dyn ResourceProvider) -> Result<(), ValidationError> {
        if self.text.is_none() {
            return Err(ValidationError::InvalidText {
                name: self.common.name.clone(),
            });
        }
        self.common.prepare_timestamps()
    }

    fn activate(&mut self, _ctx: &mut EngineContext<'_>) {
        if self.common.activated {
            return;
        }
        self.cursor = 0;
        self.common.activated = true;
    }

    fn deactivate(&mut self, ctx: &mut EngineContext<'_>) {
        if !self.common.activated {
            return;
        }
        ctx.effects.cancel_speech();
        self.common.activated = false;
    }

    fn stop(&mut self, ctx: &mut EngineContext<'_>) {
        if self.common.activated {
            ctx.effects.cancel_speech();
        }
        self.cursor = 0;
    }

    /// With `hide_sounds` set, due lines are consumed silently and stay
    /// skipped after sounds are shown again.
    fn update(&mut self, elapsed: f32, ctx: &mut EngineContext<'_>) {
        if !self.common.activated {
            return;
        }
        let Some(&t) = self.common.timestamps.get(self.cursor) else {
            return;
        };
        if elapsed < t {
            return;
        }

        self.cursor += 1;
        if ctx.settings.hide_sounds {
            return;
        }
        if let Some(text) = &self.text {
            debug!(timer = %self.common.name, at = t, "Speaking");
            ctx.effects.speak(text);
        }
    }
}
