use cadence_types::DirectionDefinition;

use super::{TimerBehavior, TimerCommon};
use crate::context::EngineContext;
use crate::effects::{EffectHandle, ResourceProvider, TrailSpec};
use crate::error::ValidationError;
use crate::world::Point3;

/// Trail from the player to a destination, shown for `duration` seconds
/// after each timestamp.
#[derive(Debug)]
pub struct DirectionTimer {
    pub common: TimerCommon,
    destination: Option<Point3>,
    duration: f32,
    opacity: f32,
    anim_speed: f32,
    texture_ref: Option<String>,
    spec: Option<TrailSpec>,
    trail: Option<EffectHandle>,
    visible: bool,
}

impl DirectionTimer {
    pub fn from_definition(def: &DirectionDefinition) -> Self {
        Self {
            common: TimerCommon::from_definition(&def.common),
            destination: def.position.as_deref().and_then(Point3::from_slice),
            duration: def.duration,
            opacity: def.opacity,
            anim_speed: def.anim_speed,
            texture_ref: def.texture.clone().filter(|s| !s.is_empty()),
            spec: None,
            trail: None,
            visible: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    fn live_at(&self, elapsed: f32) -> bool {
        self.common
            .timestamps
            .iter()
            .any(|&t| elapsed >= t && elapsed <= t + self.duration)
    }

    fn hide(&mut self, ctx: &mut EngineContext<'_>) {
        if let Some(handle) = self.trail
            && self.visible
        {
            ctx.effects
                .update_trail(handle, ctx.world.player_position(), false);
        }
        self.visible = false;
    }
}

impl TimerBehavior for DirectionTimer {
    fn common(&self) -> &TimerCommon {
        &self.common
    }

    fn initialize(&mut self, resources: &mut dyn ResourceProvider) -> Result<(), ValidationError> {
        let name = || self.common.name.clone();

        let Some(destination) = self.destination else {
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

        self.spec = Some(TrailSpec {
            texture,
            destination,
            opacity: self.opacity,
            anim_speed: self.anim_speed,
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
        self.trail = Some(ctx.effects.add_trail(spec));
        self.visible = false;
        self.common.activated = true;
    }

    fn deactivate(&mut self, ctx: &mut EngineContext<'_>) {
        if !self.common.activated {
            return;
        }
        if let Some(handle) = self.trail.take() {
            ctx.effects.remove_trail(handle);
        }
        self.visible = false;
        self.common.activated = false;
    }

    fn stop(&mut self, ctx: &mut EngineContext<'_>) {
        self.hide(ctx);
    }

    fn update(&mut self, elapsed: f32, ctx: &mut EngineContext<'_>) {
        let Some(handle) = self.trail else {
            return;
        };
        if !self.common.activated {
            return;
        }

        if self.live_at(elapsed) {
            let shown = ctx.settings.show_directions;
            ctx.effects
                .update_trail(handle, ctx.world.player_position(), shown);
            self.visible = shown;
        } else {
            self.hide(ctx);
        }
    }
}
