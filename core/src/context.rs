//! Per-call engine context
//!
//! Bundles everything an update needs that the engine does not own: the
//! world snapshot, settings, the shared registry and the effect sink.
//! Built fresh for each call by [`crate::EncounterManager`] (or by the host
//! when driving an [`crate::Encounter`] directly).

use cadence_types::EngineSettings;

use crate::effects::EffectSink;
use crate::timers::ActiveEntityRegistry;
use crate::world::WorldState;

pub struct EngineContext<'a> {
    pub world: &'a dyn WorldState,
    pub settings: &'a EngineSettings,
    pub registry: &'a mut ActiveEntityRegistry,
    pub effects: &'a mut dyn EffectSink,
}

impl<'a> EngineContext<'a> {
    pub fn new(
        world: &'a dyn WorldState,
        settings: &'a EngineSettings,
        registry: &'a mut ActiveEntityRegistry,
        effects: &'a mut dyn EffectSink,
    ) -> Self {
        Self {
            world,
            settings,
            registry,
            effects,
        }
    }

    /// Whether the player is on `map`
    pub fn on_map(&self, map: u32) -> bool {
        self.world.current_map_id() == map
    }
}
