//! Shared definition types for Cadence
//!
//! This crate contains the serializable records that describe encounters
//! (phases, triggers, timers, actions) and the engine settings. Records use
//! the camelCase keys of the community timer format; snake_case aliases are
//! accepted so TOML definition files read naturally.
//!
//! Nothing in here is validated. `cadence-core` turns these records into
//! runtime state and reports what is wrong with them.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Color Type
// ─────────────────────────────────────────────────────────────────────────────

/// RGBA color as [r, g, b, a] bytes
pub type Color = [u8; 4];

// ─────────────────────────────────────────────────────────────────────────────
// Triggers
// ─────────────────────────────────────────────────────────────────────────────

/// Discriminator for trigger records. Missing `type` means a location trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// Evaluated live against player position and combat state
    #[default]
    Location,
    /// Latches when a bound key is pressed under the configured conditions
    Key,
}

/// A trigger as written in a definition file.
///
/// ```toml
/// [encounter.reset]
/// type = "location"
/// position = [10.0, 0.0, 5.0]
/// radius = 20.0
/// requireDeparture = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerDefinition {
    #[serde(rename = "type", default)]
    pub kind: TriggerKind,

    /// Center of the sphere, or one corner of the box when `antipode` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec<f32>>,

    /// Opposite corner of an axis-aligned box
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub antipode: Option<Vec<f32>>,

    #[serde(default)]
    pub radius: f32,

    #[serde(default, rename = "requireCombat", alias = "require_combat")]
    pub combat_required: bool,

    #[serde(default, rename = "requireOutOfCombat", alias = "require_out_of_combat")]
    pub out_of_combat_required: bool,

    #[serde(default, rename = "requireEntry", alias = "require_entry")]
    pub entry_required: bool,

    #[serde(default, rename = "requireDeparture", alias = "require_departure")]
    pub departure_required: bool,

    /// Index into [`EngineSettings::key_binds`] (key triggers only)
    #[serde(default, rename = "keyBind", alias = "key_bind")]
    pub key_bind: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Timers
// ─────────────────────────────────────────────────────────────────────────────

/// Fields shared by every timer kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerCommonDefinition {
    /// Identity used to deduplicate the same effect across phases
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,

    #[serde(default = "default_timer_name")]
    pub name: String,

    /// Named clock this timer follows
    #[serde(default = "default_timer_set", rename = "set", alias = "timer_set")]
    pub timer_set: String,

    /// Seconds after phase start
    #[serde(default)]
    pub timestamps: Vec<f32>,
}

impl Default for TimerCommonDefinition {
    fn default() -> Self {
        Self {
            uid: None,
            name: default_timer_name(),
            timer_set: default_timer_set(),
            timestamps: Vec::new(),
        }
    }
}

/// Countdown panel shown before (warning) and after (alert) each timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertDefinition {
    #[serde(flatten)]
    pub common: TimerCommonDefinition,

    #[serde(default = "default_warning_duration", rename = "warningDuration", alias = "warning_duration")]
    pub warning_duration: f32,

    #[serde(default = "default_alert_duration", rename = "alertDuration", alias = "alert_duration")]
    pub alert_duration: f32,

    #[serde(default, rename = "warning", skip_serializing_if = "Option::is_none")]
    pub warning_text: Option<String>,

    #[serde(default, rename = "warningColor", alias = "warning_color", skip_serializing_if = "Option::is_none")]
    pub warning_color: Option<Vec<f32>>,

    #[serde(default, rename = "alert", skip_serializing_if = "Option::is_none")]
    pub alert_text: Option<String>,

    #[serde(default, rename = "alertColor", alias = "alert_color", skip_serializing_if = "Option::is_none")]
    pub alert_color: Option<Vec<f32>>,

    #[serde(default = "default_icon")]
    pub icon: String,

    #[serde(default, rename = "fillColor", alias = "fill_color", skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<Vec<f32>>,
}

/// Animated trail from the player to a world position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionDefinition {
    #[serde(flatten)]
    pub common: TimerCommonDefinition,

    #[serde(default, alias = "destination", skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec<f32>>,

    #[serde(default = "default_effect_duration")]
    pub duration: f32,

    #[serde(default = "default_opacity")]
    pub opacity: f32,

    #[serde(default = "default_anim_speed", rename = "animSpeed", alias = "anim_speed")]
    pub anim_speed: f32,

    #[serde(default, rename = "texture", skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
}

/// Billboard placed at a fixed world position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerDefinition {
    #[serde(flatten)]
    pub common: TimerCommonDefinition,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec<f32>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Vec<f32>>,

    #[serde(default = "default_effect_duration")]
    pub duration: f32,

    #[serde(default = "default_opacity")]
    pub opacity: f32,

    #[serde(default = "default_marker_size")]
    pub size: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default = "default_true", rename = "fadeCenter", alias = "fade_center")]
    pub fade_center: bool,
}

/// Text spoken once per timestamp
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoundDefinition {
    #[serde(flatten)]
    pub common: TimerCommonDefinition,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Actions
// ─────────────────────────────────────────────────────────────────────────────

/// Phase actions. Only time skipping exists today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ActionDefinition {
    /// Advance the clock of the named timer sets by `time` seconds each
    /// time the trigger fires
    #[serde(rename = "skipTime", alias = "skip_time")]
    SkipTime {
        #[serde(default = "default_action_name")]
        name: String,
        #[serde(default, alias = "timerSets", alias = "timer_sets")]
        sets: Vec<String>,
        #[serde(default)]
        trigger: Option<TriggerDefinition>,
        #[serde(default)]
        time: f32,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Phases & Encounters
// ─────────────────────────────────────────────────────────────────────────────

/// A bounded segment of an encounter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseDefinition {
    #[serde(default = "default_phase_name")]
    pub name: String,

    #[serde(default)]
    pub start: Option<TriggerDefinition>,

    /// Only the last phase of an encounter may omit this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish: Option<TriggerDefinition>,

    #[serde(default)]
    pub alerts: Vec<AlertDefinition>,

    #[serde(default)]
    pub directions: Vec<DirectionDefinition>,

    #[serde(default)]
    pub markers: Vec<MarkerDefinition>,

    #[serde(default)]
    pub sounds: Vec<SoundDefinition>,

    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
}

/// One schedulable, map-scoped scripted event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterDefinition {
    #[serde(default = "default_encounter_id")]
    pub id: String,

    #[serde(default = "default_encounter_name")]
    pub name: String,

    #[serde(default = "default_category")]
    pub category: String,

    #[serde(default = "default_description")]
    pub description: String,

    #[serde(default = "default_author")]
    pub author: String,

    #[serde(default = "default_icon")]
    pub icon: String,

    #[serde(default)]
    pub enabled: bool,

    /// Map id that gates activity (must be positive)
    #[serde(default)]
    pub map: i64,

    #[serde(default)]
    pub phases: Vec<PhaseDefinition>,

    #[serde(default)]
    pub reset: Option<TriggerDefinition>,
}

/// Root structure for TOML definition files.
/// A file can contain one or more encounters.
///
/// ```toml
/// [[encounter]]
/// id = "vale_guardian"
/// map = 1149
/// ...
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefinitionFile {
    #[serde(default, rename = "encounter")]
    pub encounters: Vec<EncounterDefinition>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Modifier key flags
pub mod modifiers {
    pub const NONE: u8 = 0;
    pub const CTRL: u8 = 0b001;
    pub const ALT: u8 = 0b010;
    pub const SHIFT: u8 = 0b100;
}

/// A configurable key binding referenced by key triggers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    /// Host key code (0 = unbound)
    #[serde(default)]
    pub primary_key: u32,

    /// Bitmask of [`modifiers`] flags that must be held
    #[serde(default)]
    pub modifiers: u8,
}

impl KeyBinding {
    pub fn is_unbound(&self) -> bool {
        self.primary_key == 0
    }
}

/// Runtime settings for the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Minimum seconds between timer updates of a running encounter
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: f32,

    /// Ignore combat requirements and always evaluate trigger areas
    #[serde(default)]
    pub debug_mode: bool,

    #[serde(default = "default_true")]
    pub show_alerts: bool,

    #[serde(default = "default_true")]
    pub show_directions: bool,

    #[serde(default = "default_true")]
    pub show_markers: bool,

    #[serde(default)]
    pub hide_sounds: bool,

    /// Key bindings addressed by `keyBind` in key triggers
    #[serde(default)]
    pub key_binds: Vec<KeyBinding>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval(),
            debug_mode: false,
            show_alerts: true,
            show_directions: true,
            show_markers: true,
            hide_sounds: false,
            key_binds: Vec::new(),
        }
    }
}

impl EngineSettings {
    /// Binding for a key trigger. Missing bindings count as unbound.
    pub fn key_bind(&self, index: usize) -> KeyBinding {
        self.key_binds.get(index).copied().unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Serde Defaults
// ─────────────────────────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}
fn default_timer_name() -> String {
    "Unnamed Timer".to_string()
}
fn default_timer_set() -> String {
    "default".to_string()
}
fn default_warning_duration() -> f32 {
    15.0
}
fn default_alert_duration() -> f32 {
    5.0
}
fn default_icon() -> String {
    "raid".to_string()
}
fn default_effect_duration() -> f32 {
    10.0
}
fn default_opacity() -> f32 {
    0.8
}
fn default_anim_speed() -> f32 {
    1.0
}
fn default_marker_size() -> f32 {
    1.0
}
fn default_action_name() -> String {
    "Unnamed Action".to_string()
}
fn default_phase_name() -> String {
    "Unnamed Phase".to_string()
}
fn default_encounter_id() -> String {
    "Unknown Id".to_string()
}
fn default_encounter_name() -> String {
    "Unknown Timer".to_string()
}
fn default_category() -> String {
    "Other".to_string()
}
fn default_description() -> String {
    "Timer description has not been set.".to_string()
}
fn default_author() -> String {
    "Unknown Author".to_string()
}
fn default_tick_interval() -> f32 {
    0.1
}
