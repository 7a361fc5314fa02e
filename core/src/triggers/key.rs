use tracing::debug;

use crate::context::EngineContext;
use crate::error::ValidationError;
use crate::world::KeyPress;

use super::{TriggerBehavior, TriggerConditions};

/// Latches when the configured key binding is pressed while the combat and
/// area conditions hold. The latch stays set until reset or disabled.
#[derive(Debug, Clone, Default)]
pub struct KeyTrigger {
    pub conditions: TriggerConditions,
    /// Index into `EngineSettings::key_binds`
    pub key_bind: usize,
    enabled: bool,
    pressed: bool,
}

impl KeyTrigger {
    pub fn new(conditions: TriggerConditions, key_bind: usize) -> Self {
        Self {
            conditions,
            key_bind,
            enabled: false,
            pressed: false,
        }
    }

    pub fn is_latched(&self) -> bool {
        self.pressed
    }

    /// Observe a key press. Only enabled triggers listen.
    pub fn on_key_press(&mut self, press: KeyPress, ctx: &EngineContext<'_>) {
        if !self.enabled {
            return;
        }

        let binding = ctx.settings.key_bind(self.key_bind);
        if binding.is_unbound() {
            return;
        }
        if press.key != binding.primary_key
            || ctx.world.active_modifier_keys() != binding.modifiers
        {
            return;
        }

        let c = &self.conditions;
        let in_combat = ctx.world.is_in_combat();
        if !ctx.settings.debug_mode && c.combat_required && !in_combat {
            return;
        }
        // Out-of-combat requirement holds even in debug mode
        if c.out_of_combat_required && in_combat {
            return;
        }
        if !c.area_satisfied(ctx.world) {
            return;
        }

        debug!(key = press.key, key_bind = self.key_bind, "Key trigger latched");
        self.pressed = true;
    }
}

impl TriggerBehavior for KeyTrigger {
    fn initialize(&mut self) -> Result<(), ValidationError> {
        self.conditions.validate()
    }

    fn enable(&mut self) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        self.pressed = false;
    }

    fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        self.pressed = false;
    }

    fn reset(&mut self) {
        self.pressed = false;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn triggered(&self, ctx: &EngineContext<'_>) -> bool {
        // An unbound key never blocks progress
        if ctx.settings.key_bind(self.key_bind).is_unbound() {
            return true;
        }
        self.pressed
    }
}
