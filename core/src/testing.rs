//! Shared test doubles and definition builders

use cadence_types::{
    ActionDefinition, AlertDefinition, DirectionDefinition, EncounterDefinition, EngineSettings,
    MarkerDefinition, PhaseDefinition, SoundDefinition, TimerCommonDefinition, TriggerDefinition,
    TriggerKind,
};

use crate::context::EngineContext;
use crate::effects::{RecordingSink, ResourceProvider, TextureId};
use crate::timers::ActiveEntityRegistry;
use crate::world::WorldSnapshot;

// ═══════════════════════════════════════════════════════════════════════════
// Doubles
// ═══════════════════════════════════════════════════════════════════════════

/// Owns everything an [`EngineContext`] borrows
pub(crate) struct TestHarness {
    pub world: WorldSnapshot,
    pub settings: EngineSettings,
    pub registry: ActiveEntityRegistry,
    pub sink: RecordingSink,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            world: WorldSnapshot::default(),
            settings: EngineSettings::default(),
            registry: ActiveEntityRegistry::new(),
            sink: RecordingSink::new(),
        }
    }

    pub fn ctx(&mut self) -> EngineContext<'_> {
        EngineContext::new(&self.world, &self.settings, &mut self.registry, &mut self.sink)
    }
}

/// Resolves every non-empty reference except [`TestResources::MISSING`]
#[derive(Default)]
pub(crate) struct TestResources {
    loaded: Vec<String>,
}

impl TestResources {
    pub const MISSING: &'static str = "missing.png";
}

impl ResourceProvider for TestResources {
    fn load_texture(&mut self, reference: &str) -> Option<TextureId> {
        if reference.is_empty() || reference == Self::MISSING {
            return None;
        }
        self.loaded.push(reference.to_string());
        Some(TextureId(self.loaded.len() as u64))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Definition Builders
// ═══════════════════════════════════════════════════════════════════════════

/// Entry trigger on a sphere
pub(crate) fn make_location_def(position: [f32; 3], radius: f32) -> TriggerDefinition {
    TriggerDefinition {
        kind: TriggerKind::Location,
        position: Some(position.to_vec()),
        radius,
        entry_required: true,
        ..Default::default()
    }
}

/// Key trigger with no conditions
pub(crate) fn make_key_def(key_bind: usize) -> TriggerDefinition {
    TriggerDefinition {
        kind: TriggerKind::Key,
        key_bind,
        ..Default::default()
    }
}

fn make_common(timestamps: &[f32]) -> TimerCommonDefinition {
    TimerCommonDefinition {
        timestamps: timestamps.to_vec(),
        ..Default::default()
    }
}

/// Alert with warning "Incoming" and alert "Now"
pub(crate) fn make_alert_def(timestamps: &[f32], warning: f32, alert: f32) -> AlertDefinition {
    AlertDefinition {
        common: make_common(timestamps),
        warning_duration: warning,
        alert_duration: alert,
        warning_text: Some("Incoming".to_string()),
        warning_color: None,
        alert_text: Some("Now".to_string()),
        alert_color: None,
        icon: "raid".to_string(),
        fill_color: None,
    }
}

pub(crate) fn make_direction_def(timestamps: &[f32], duration: f32) -> DirectionDefinition {
    DirectionDefinition {
        common: make_common(timestamps),
        position: Some(vec![100.0, 0.0, 50.0]),
        duration,
        opacity: 0.8,
        anim_speed: 1.0,
        texture: Some("arrow.png".to_string()),
    }
}

pub(crate) fn make_marker_def(timestamps: &[f32], duration: f32) -> MarkerDefinition {
    MarkerDefinition {
        common: make_common(timestamps),
        position: Some(vec![10.0, 20.0, 30.0]),
        rotation: None,
        duration,
        opacity: 0.8,
        size: 1.0,
        texture: Some("circle.png".to_string()),
        text: None,
        fade_center: true,
    }
}

pub(crate) fn make_sound_def(timestamps: &[f32], text: &str) -> SoundDefinition {
    SoundDefinition {
        common: make_common(timestamps),
        text: Some(text.to_string()),
    }
}

pub(crate) fn make_skip_def(
    sets: &[&str],
    time: f32,
    trigger: Option<TriggerDefinition>,
) -> ActionDefinition {
    ActionDefinition::SkipTime {
        name: "Skip".to_string(),
        sets: sets.iter().map(|s| s.to_string()).collect(),
        trigger,
        time,
    }
}

pub(crate) fn make_phase_def(name: &str, start: TriggerDefinition) -> PhaseDefinition {
    PhaseDefinition {
        name: name.to_string(),
        start: Some(start),
        finish: None,
        alerts: Vec::new(),
        directions: Vec::new(),
        markers: Vec::new(),
        sounds: Vec::new(),
        actions: Vec::new(),
    }
}

/// Enabled encounter with a departure reset far from the origin
pub(crate) fn make_encounter_def(id: &str, map: i64, phases: Vec<PhaseDefinition>) -> EncounterDefinition {
    let mut reset = make_location_def([0.0, 0.0, 0.0], 1000.0);
    reset.entry_required = false;
    reset.departure_required = true;

    EncounterDefinition {
        id: id.to_string(),
        name: id.to_string(),
        category: "Raid".to_string(),
        description: String::new(),
        author: "test".to_string(),
        icon: "raid".to_string(),
        enabled: true,
        map,
        phases,
        reset: Some(reset),
    }
}
