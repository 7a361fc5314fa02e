use cadence_types::MarkerDefinition;

use super::{TimerBehavior, TimerCommon};
use crate::context::EngineContext;
use crate::effects::{EffectHandle, MarkerSpec, ResourceProvider};
use crate::error::ValidationError;
use crate::world::Point3;

/// World billboard shown for `duration` seconds after each timestamp
#[derive(Debug)]
pub struct MarkerTimer {
    pub common: TimerCommon,
    position: Option<Point3>,
    rotation: Point3,
    duration: f32,
    opacity: f32,
    size: f32,
    texture_ref: Option<String>,
    text: Option<String>,
    fade_center: bool,
    spec: Option<MarkerSpec>,
    marker: Option<EffectHandle>,
    visible: bool,
}

impl MarkerTimer {
    pub fn from_definition(def: &MarkerDefinition) -> Self {
        Self {
            common: TimerCommon::from_definition(&def.common),
            position: def.position.as_deref().and_then(Point3::from_slice),
            rotation: def
                .rotation
                .as_deref()
                .and_then(Point3::from_slice)
                .unwrap_or(Point3::ZERO),
            duration: def.duration,
            opacity: def.opacity,
            size: def.size,
            texture_ref: def.texture.clone().filter(|s| !s.is_empty()),
            text: def.text.clone().filter(|s| !s.is_empty()),
            fade_center: def.fade_center,
            spec: None,
            marker: None,
            visible: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool, ctx: &mut EngineContext<'_>) {
        if let Some(handle) = self.marker
            && self.visible != visible
        {
            ctx.effects.set_marker_visible(handle, visible);
        }
        self.visible = visible;
    }
}

impl TimerBehavior for MarkerTimer {
    fn common(&self) -> &TimerCommon {
        &self.common
    }

    fn initialize(&mut self, resources: &mut dyn ResourceProvider) -> Result<(), ValidationError> {
        let name = || self.common.name.clone();

        let Some(position) = self.position else {
            return Err(ValidationError::InvalidTimerPosition { name: name() });
        };
        if self.common.timestamps.is_empty() {
            return Err(ValidationError::InvalidTimestamps { name: name() });
        }
        let Some(texture_ref) = self.texture_ref.as_deref() else {
            return Err(ValidationError::InvalidTexture { name: name() });
        };
        let Some(texture) = resources.load_texture(texture_ref) else {
            return Err(ValidationError::TextureNotFound {
                name: name(),
                texture: texture_ref.to_string(),
            });
        };

        self.spec = Some(MarkerSpec {
            texture,
            position,
            rotation: self.rotation,
            size: self.size,
            opacity: self.opacity,
            text: self.text.clone(),
            fade_center: self.fade_center,
        });
        self.common.prepare_timestamps()
    }

    fn activate(&mut self, ctx: &mut EngineContext<'_>) {
        if self.common.activated {
            return;
        }
        let Some(spec) = &self.spec else {
            return;
        };
        self.marker = Some(ctx.effects.add_marker(spec));
        self.visible = false;
        self.common.activated = true;
    }

    fn deactivate(&mut self, ctx: &mut EngineContext<'_>) {
        if !self.common.activated {
            return;
        }
        if let Some(handle) = self.marker.take() {
            ctx.effects.remove_marker(handle);
        }
        self.visible = false;
        self.common.activated = false;
    }

    fn stop(&mut self, ctx: &mut EngineContext<'_>) {
        self.set_visible(false, ctx);
    }

    fn update(&mut self, elapsed: f32, ctx: &mut EngineContext<'_>) {
        if !self.common.activated {
            return;
        }

        let live = self
            .common
            .timestamps
            .iter()
            .any(|&t| elapsed >= t && elapsed <= t + self.duration);
        self.set_visible(live && ctx.settings.show_markers, ctx);
    }
}
