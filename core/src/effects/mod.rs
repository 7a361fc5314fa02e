//! Effect and resource interfaces
//!
//! The engine never draws or speaks. Timers describe what should be on
//! screen and call lifecycle methods on an [`EffectSink`] the host provides:
//!
//! ```text
//! ┌──────────────┐  create / update / dispose  ┌──────────────────────┐
//! │    Timer     │ ──────────────────────────▶ │ EffectSink (host)    │
//! │ (engine)     │                             │ panels, trails, TTS  │
//! └──────────────┘                             └──────────────────────┘
//! ```
//!
//! Textures are resolved once, while timers initialize, through a
//! [`ResourceProvider`].

mod recording;

pub use recording::{EffectEvent, RecordingSink};

use cadence_types::Color;

use crate::world::Point3;

/// Opaque handle for a loaded texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// Opaque handle for an effect created by the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectHandle(pub u64);

/// Resolves texture references while timers initialize
pub trait ResourceProvider {
    /// Load a texture from the definition's content source
    fn load_texture(&mut self, reference: &str) -> Option<TextureId>;

    /// Built-in icon by name (e.g. "raid"). Falls back to `load_texture`.
    fn icon(&mut self, _name: &str) -> Option<TextureId> {
        None
    }
}

/// Visual state of one alert panel
#[derive(Debug, Clone, PartialEq)]
pub struct AlertPanel {
    /// Warning text while counting down, alert text afterwards
    pub text: String,
    pub text_color: Color,
    /// Countdown label (empty once the alert shows)
    pub timer_text: String,
    pub timer_text_color: Color,
    /// Countdown progress in `[0, 1]`
    pub fill: f32,
    pub fill_color: Color,
    pub icon: Option<TextureId>,
    pub visible: bool,
}

/// Trail from the player towards a destination
#[derive(Debug, Clone, PartialEq)]
pub struct TrailSpec {
    pub texture: TextureId,
    pub destination: Point3,
    pub opacity: f32,
    pub anim_speed: f32,
}

/// Billboard fixed in the world
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub texture: TextureId,
    pub position: Point3,
    pub rotation: Point3,
    pub size: f32,
    pub opacity: f32,
    pub text: Option<String>,
    pub fade_center: bool,
}

/// Lifecycle calls made by timers
///
/// Trails and markers are added hidden when their timer activates and are
/// shown/hidden as timestamps come and go. Alert panels only exist while a
/// timestamp window is live.
pub trait EffectSink {
    fn create_alert(&mut self, panel: &AlertPanel) -> EffectHandle;
    fn update_alert(&mut self, handle: EffectHandle, panel: &AlertPanel);
    fn dispose_alert(&mut self, handle: EffectHandle);

    fn add_trail(&mut self, trail: &TrailSpec) -> EffectHandle;
    /// Move the trail origin and set visibility
    fn update_trail(&mut self, handle: EffectHandle, origin: Point3, visible: bool);
    fn remove_trail(&mut self, handle: EffectHandle);

    fn add_marker(&mut self, marker: &MarkerSpec) -> EffectHandle;
    fn set_marker_visible(&mut self, handle: EffectHandle, visible: bool);
    fn remove_marker(&mut self, handle: EffectHandle);

    fn speak(&mut self, text: &str);
    /// Stop all queued and playing speech
    fn cancel_speech(&mut self);
}
