//! Trigger evaluation
//!
//! Triggers answer one question each tick: "has this condition been met?"
//!
//! | Kind | Evaluation |
//! |------|------------|
//! | `Location` | live: combat state + inside/outside an area |
//! | `Key` | latched: a bound key was pressed under the conditions |
//!
//! Phases arm and disarm triggers as they move through their lifecycle, so
//! a disarmed trigger never reports a fire (except an unbound key trigger,
//! which always passes).

mod conditions;
mod key;
mod location;

pub use conditions::TriggerConditions;
pub use key::KeyTrigger;
pub use location::LocationTrigger;

use cadence_types::{TriggerDefinition, TriggerKind};

use crate::context::EngineContext;
use crate::error::ValidationError;
use crate::world::KeyPress;

/// Common trigger lifecycle
pub trait TriggerBehavior {
    /// Check definition invariants. Called once before first use.
    fn initialize(&mut self) -> Result<(), ValidationError>;
    /// Arm the trigger
    fn enable(&mut self);
    /// Disarm the trigger
    fn disable(&mut self);
    /// Clear any latched state
    fn reset(&mut self);
    fn is_enabled(&self) -> bool;
    fn triggered(&self, ctx: &EngineContext<'_>) -> bool;
}

#[derive(Debug, Clone)]
pub enum Trigger {
    Location(LocationTrigger),
    Key(KeyTrigger),
}

impl Trigger {
    pub fn from_definition(def: &TriggerDefinition) -> Self {
        let conditions = TriggerConditions::from_definition(def);
        match def.kind {
            TriggerKind::Location => Trigger::Location(LocationTrigger::new(conditions)),
            TriggerKind::Key => Trigger::Key(KeyTrigger::new(conditions, def.key_bind)),
        }
    }

    pub fn conditions(&self) -> &TriggerConditions {
        match self {
            Trigger::Location(t) => &t.conditions,
            Trigger::Key(t) => &t.conditions,
        }
    }

    /// Forward a key press. Location triggers ignore it.
    pub fn on_key_press(&mut self, press: KeyPress, ctx: &EngineContext<'_>) {
        if let Trigger::Key(t) = self {
            t.on_key_press(press, ctx);
        }
    }

    fn behavior(&self) -> &dyn TriggerBehavior {
        match self {
            Trigger::Location(t) => t,
            Trigger::Key(t) => t,
        }
    }

    fn behavior_mut(&mut self) -> &mut dyn TriggerBehavior {
        match self {
            Trigger::Location(t) => t,
            Trigger::Key(t) => t,
        }
    }
}

impl TriggerBehavior for Trigger {
    fn initialize(&mut self) -> Result<(), ValidationError> {
        self.behavior_mut().initialize()
    }

    fn enable(&mut self) {
        self.behavior_mut().enable();
    }

    fn disable(&mut self) {
        self.behavior_mut().disable();
    }

    fn reset(&mut self) {
        self.behavior_mut().reset();
    }

    fn is_enabled(&self) -> bool {
        self.behavior().is_enabled()
    }

    fn triggered(&self, ctx: &EngineContext<'_>) -> bool {
        self.behavior().triggered(ctx)
    }
}
