use crate::context::EngineContext;
use crate::error::ValidationError;

use super::{TriggerBehavior, TriggerConditions};

/// Fires while the player is inside (entry) or outside (departure) an area,
/// optionally gated on combat state. Evaluated live, never latches.
#[derive(Debug, Clone, Default)]
pub struct LocationTrigger {
    pub conditions: TriggerConditions,
    enabled: bool,
}

impl LocationTrigger {
    pub fn new(conditions: TriggerConditions) -> Self {
        Self {
            conditions,
            enabled: false,
        }
    }
}

impl TriggerBehavior for LocationTrigger {
    fn initialize(&mut self) -> Result<(), ValidationError> {
        self.conditions.validate()?;
        if !self.conditions.has_area_requirement() {
            return Err(ValidationError::NoAreaRequirement);
        }
        Ok(())
    }

    fn enable(&mut self) {
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn reset(&mut self) {}

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn triggered(&self, ctx: &EngineContext<'_>) -> bool {
        if !self.enabled {
            return false;
        }

        let c = &self.conditions;
        let debug = ctx.settings.debug_mode;
        let in_combat = ctx.world.is_in_combat();

        if !debug && c.combat_required && !in_combat {
            return false;
        }
        if !debug && c.out_of_combat_required && in_combat {
            return false;
        }

        c.area_satisfied(ctx.world)
    }
}
