//! Phase actions
//!
//! A skip action moves the clock of one or more timer sets forward each time
//! its trigger fires. Key triggers are reset after every fire, so a single
//! press yields exactly one skip.

use cadence_types::ActionDefinition;
use tracing::debug;

use crate::context::EngineContext;
use crate::error::ValidationError;
use crate::triggers::{Trigger, TriggerBehavior};

#[derive(Debug, Clone)]
pub struct SkipAction {
    pub name: String,
    pub target_sets: Vec<String>,
    /// Seconds added per fire
    pub time: f32,
    trigger: Option<Trigger>,
    accumulated: f32,
}

impl SkipAction {
    pub fn from_definition(def: &ActionDefinition) -> Self {
        match def {
            ActionDefinition::SkipTime {
                name,
                sets,
                trigger,
                time,
            } => Self {
                name: name.clone(),
                target_sets: sets.clone(),
                time: *time,
                trigger: trigger.as_ref().map(Trigger::from_definition),
                accumulated: 0.0,
            },
        }
    }

    /// An action without target sets loads fine and skips nothing
    pub fn initialize(&mut self) -> Result<(), ValidationError> {
        let Some(trigger) = self.trigger.as_mut() else {
            return Err(ValidationError::MissingActionTrigger {
                name: self.name.clone(),
            });
        };
        trigger
            .initialize()
            .map_err(|source| ValidationError::InvalidActionTrigger {
                name: self.name.clone(),
                source: Box::new(source),
            })
    }

    /// Total seconds skipped since the last reset
    pub fn accumulated(&self) -> f32 {
        self.accumulated
    }

    pub fn trigger_mut(&mut self) -> Option<&mut Trigger> {
        self.trigger.as_mut()
    }

    /// Returns `true` if the trigger fired this tick
    pub fn update(&mut self, ctx: &EngineContext<'_>) -> bool {
        let Some(trigger) = self.trigger.as_mut() else {
            return false;
        };
        if !trigger.triggered(ctx) {
            return false;
        }

        self.accumulated += self.time;
        trigger.reset();
        debug!(action = %self.name, total = self.accumulated, "Skip action fired");
        true
    }

    /// Arm the trigger
    pub fn start(&mut self) {
        if let Some(trigger) = self.trigger.as_mut() {
            trigger.reset();
            trigger.enable();
        }
    }

    /// Disarm the trigger
    pub fn stop(&mut self) {
        if let Some(trigger) = self.trigger.as_mut() {
            trigger.reset();
            trigger.disable();
        }
    }

    pub fn reset(&mut self) {
        if let Some(trigger) = self.trigger.as_mut() {
            trigger.reset();
        }
        self.accumulated = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use cadence_types::KeyBinding;

    use super::*;
    use crate::testing::{TestHarness, make_key_def, make_skip_def};
    use crate::world::KeyPress;

    fn make_bound_harness() -> TestHarness {
        let mut h = TestHarness::new();
        h.settings.key_binds = vec![KeyBinding {
            primary_key: 32,
            modifiers: 0,
        }];
        h
    }

    #[test]
    fn requires_trigger_but_not_sets() {
        let mut action = SkipAction::from_definition(&make_skip_def(&[], 30.0, Some(make_key_def(0))));
        assert_eq!(action.initialize(), Ok(()));

        let mut action = SkipAction::from_definition(&make_skip_def(&["boss"], 30.0, None));
        assert!(matches!(
            action.initialize(),
            Err(ValidationError::MissingActionTrigger { .. })
        ));
    }

    #[test]
    fn key_press_accumulates_once() {
        let mut h = make_bound_harness();
        let mut action =
            SkipAction::from_definition(&make_skip_def(&["boss"], 30.0, Some(make_key_def(0))));
        action.initialize().unwrap();
        action.start();

        assert!(!action.update(&h.ctx()));

        if let Some(trigger) = action.trigger_mut() {
            trigger.on_key_press(KeyPress::new(32), &h.ctx());
        }
        assert!(action.update(&h.ctx()));
        assert!(!action.update(&h.ctx()));
        assert_eq!(action.accumulated(), 30.0);

        if let Some(trigger) = action.trigger_mut() {
            trigger.on_key_press(KeyPress::new(32), &h.ctx());
        }
        assert!(action.update(&h.ctx()));
        assert_eq!(action.accumulated(), 60.0);

        action.reset();
        assert_eq!(action.accumulated(), 0.0);
    }

    #[test]
    fn stopped_action_ignores_presses() {
        let mut h = make_bound_harness();
        let mut action =
            SkipAction::from_definition(&make_skip_def(&["boss"], 30.0, Some(make_key_def(0))));
        action.initialize().unwrap();

        if let Some(trigger) = action.trigger_mut() {
            trigger.on_key_press(KeyPress::new(32), &h.ctx());
        }
        assert!(!action.update(&h.ctx()));
    }
}
