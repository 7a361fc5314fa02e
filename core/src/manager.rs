//! Encounter manager
//!
//! Owns every loaded encounter together with the shared timer registry and
//! engine settings. The host feeds it world state and an effect sink once per
//! frame; the manager keeps the active set in step with the current map.

use cadence_types::EngineSettings;
use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::context::EngineContext;
use crate::effects::EffectSink;
use crate::encounter::Encounter;
use crate::timers::ActiveEntityRegistry;
use crate::world::{KeyPress, WorldState};

#[derive(Debug, Default)]
pub struct EncounterManager {
    encounters: Vec<Encounter>,
    registry: ActiveEntityRegistry,
    settings: EngineSettings,
    /// Indices into `encounters` that are currently activated
    active: Vec<usize>,
    /// Map seen on the previous update
    last_map: Option<u32>,
}

impl EncounterManager {
    pub fn new(encounters: Vec<Encounter>) -> Self {
        Self::with_settings(encounters, EngineSettings::default())
    }

    pub fn with_settings(encounters: Vec<Encounter>, settings: EngineSettings) -> Self {
        Self {
            encounters,
            registry: ActiveEntityRegistry::new(),
            settings,
            active: Vec::new(),
            last_map: None,
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn encounters(&self) -> &[Encounter] {
        &self.encounters
    }

    pub fn get(&self, id: &str) -> Option<&Encounter> {
        self.encounters.iter().find(|e| e.id == id)
    }

    /// Encounters activated for the current map
    pub fn active(&self) -> impl Iterator<Item = &Encounter> {
        self.active.iter().map(|&idx| &self.encounters[idx])
    }

    pub fn registry(&self) -> &ActiveEntityRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Visibility and binding changes apply from the next update
    pub fn settings_mut(&mut self) -> &mut EngineSettings {
        &mut self.settings
    }

    pub fn set_show_alerts(&mut self, show: bool) {
        self.settings.show_alerts = show;
    }

    pub fn set_show_directions(&mut self, show: bool) {
        self.settings.show_directions = show;
    }

    pub fn set_show_markers(&mut self, show: bool) {
        self.settings.show_markers = show;
    }

    pub fn set_hide_sounds(&mut self, hide: bool) {
        self.settings.hide_sounds = hide;
    }

    // ─── Frame Driving ──────────────────────────────────────────────────────

    /// Advance every active encounter. Detects map changes on its own.
    pub fn update(&mut self, now: NaiveDateTime, world: &dyn WorldState, sink: &mut dyn EffectSink) {
        if self.last_map != Some(world.current_map_id()) {
            self.on_map_changed(world, sink);
        }

        let Self {
            encounters,
            registry,
            settings,
            active,
            ..
        } = self;
        let mut ctx = EngineContext::new(world, settings, registry, sink);
        for &idx in active.iter() {
            encounters[idx].update(now, &mut ctx);
        }
    }

    /// Recompute the active set: enabled encounters on the current map are
    /// activated, everything else is deactivated.
    pub fn on_map_changed(&mut self, world: &dyn WorldState, sink: &mut dyn EffectSink) {
        let map = world.current_map_id();
        self.last_map = Some(map);

        let Self {
            encounters,
            registry,
            settings,
            active,
            ..
        } = self;
        let mut ctx = EngineContext::new(world, settings, registry, sink);

        // Deactivate first so released uids can be claimed by the new set
        for &idx in active.iter() {
            encounters[idx].deactivate(&mut ctx);
        }
        active.clear();

        for (idx, encounter) in encounters.iter_mut().enumerate() {
            if encounter.enabled() && encounter.is_valid() && encounter.map() == map {
                encounter.activate(&mut ctx);
                active.push(idx);
            }
        }

        info!(map, active = active.len(), "Map changed");
    }

    /// Enable or disable an encounter by id. Returns `false` if no such
    /// encounter exists.
    pub fn set_enabled(
        &mut self,
        id: &str,
        enabled: bool,
        world: &dyn WorldState,
        sink: &mut dyn EffectSink,
    ) -> bool {
        let Some(idx) = self.encounters.iter().position(|e| e.id == id) else {
            return false;
        };

        let Self {
            encounters,
            registry,
            settings,
            active,
            ..
        } = self;
        let mut ctx = EngineContext::new(world, settings, registry, sink);
        let encounter = &mut encounters[idx];
        encounter.set_enabled(enabled);

        let is_active = active.contains(&idx);
        if enabled && !is_active && encounter.is_valid() && ctx.on_map(encounter.map()) {
            encounter.activate(&mut ctx);
            active.push(idx);
        } else if !enabled && is_active {
            encounter.deactivate(&mut ctx);
            active.retain(|&i| i != idx);
        }

        debug!(encounter = %id, enabled, "Encounter toggled");
        true
    }

    /// Forward a key press to every active encounter
    pub fn handle_key_press(
        &mut self,
        press: KeyPress,
        world: &dyn WorldState,
        sink: &mut dyn EffectSink,
    ) {
        let Self {
            encounters,
            registry,
            settings,
            active,
            ..
        } = self;
        let ctx = EngineContext::new(world, settings, registry, sink);
        for &idx in active.iter() {
            encounters[idx].handle_key_press(press, &ctx);
        }
    }

    /// Abandon every running encounter and wait for first phases again
    pub fn reset_all(&mut self, world: &dyn WorldState, sink: &mut dyn EffectSink) {
        let Self {
            encounters,
            registry,
            settings,
            active,
            ..
        } = self;
        let mut ctx = EngineContext::new(world, settings, registry, sink);
        for &idx in active.iter() {
            encounters[idx].reset(&mut ctx);
        }
    }

    /// Deactivate everything and silence speech
    pub fn dispose(&mut self, world: &dyn WorldState, sink: &mut dyn EffectSink) {
        let Self {
            encounters,
            registry,
            settings,
            active,
            last_map,
        } = self;
        let mut ctx = EngineContext::new(world, settings, registry, sink);
        for &idx in active.iter() {
            encounters[idx].deactivate(&mut ctx);
        }
        ctx.effects.cancel_speech();

        active.clear();
        registry.clear();
        *last_map = None;
    }
}
