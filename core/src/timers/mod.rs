//! Timestamp-scheduled effect producers
//!
//! A timer is given the elapsed time of its timer set on every tick and
//! decides which effects should be live:
//!
//! | Kind | Live window per timestamp `t` |
//! |------|-------------------------------|
//! | `Alert` | `[t - warning, t + alert)` |
//! | `Direction` | `[t, t + duration]` |
//! | `Marker` | `[t, t + duration]` |
//! | `Sound` | crossing `t` (cursor, fires once) |
//!
//! Window-based timers re-enter a window if elapsed time moves backwards.
//! Sound timers keep a cursor that only rewinds on `activate`/`stop`.

mod alert;
mod direction;
mod marker;
mod registry;
mod sound;

pub use alert::AlertTimer;
pub use direction::DirectionTimer;
pub use marker::MarkerTimer;
pub use registry::ActiveEntityRegistry;
pub use sound::SoundTimer;

use std::sync::atomic::{AtomicU64, Ordering};

use cadence_types::{Color, TimerCommonDefinition};

use crate::context::EngineContext;
use crate::effects::ResourceProvider;
use crate::error::ValidationError;

// ═══════════════════════════════════════════════════════════════════════════
// Identity
// ═══════════════════════════════════════════════════════════════════════════

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a runtime timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerInstanceId(u64);

impl TimerInstanceId {
    pub fn next() -> Self {
        Self(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Alert,
    Direction,
    Marker,
    Sound,
}

// ═══════════════════════════════════════════════════════════════════════════
// Shared State
// ═══════════════════════════════════════════════════════════════════════════

/// Not `Clone`: a copy would share the registry identity.
#[derive(Debug)]
pub struct TimerCommon {
    pub id: TimerInstanceId,
    /// Dedup identity. Empty strings are treated as absent.
    pub uid: Option<String>,
    pub name: String,
    pub timer_set: String,
    /// Sorted ascending after `initialize`
    pub timestamps: Vec<f32>,
    pub(crate) activated: bool,
}

impl TimerCommon {
    pub fn from_definition(def: &TimerCommonDefinition) -> Self {
        Self {
            id: TimerInstanceId::next(),
            uid: def.uid.clone().filter(|uid| !uid.is_empty()),
            name: def.name.clone(),
            timer_set: def.timer_set.clone(),
            timestamps: def.timestamps.clone(),
            activated: false,
        }
    }

    /// Reject empty, negative or non-finite timestamps and sort the rest
    pub fn prepare_timestamps(&mut self) -> Result<(), ValidationError> {
        let valid = !self.timestamps.is_empty()
            && self.timestamps.iter().all(|t| t.is_finite() && *t >= 0.0);
        if !valid {
            return Err(ValidationError::InvalidTimestamps {
                name: self.name.clone(),
            });
        }
        self.timestamps.sort_by(f32::total_cmp);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Timer
// ═══════════════════════════════════════════════════════════════════════════

/// Lifecycle shared by every timer kind.
///
/// `activate` attaches long-lived effects (trails, markers), `stop` hides
/// whatever is showing, `deactivate` detaches everything.
pub trait TimerBehavior {
    fn common(&self) -> &TimerCommon;
    fn initialize(&mut self, resources: &mut dyn ResourceProvider) -> Result<(), ValidationError>;
    fn activate(&mut self, ctx: &mut EngineContext<'_>);
    fn deactivate(&mut self, ctx: &mut EngineContext<'_>);
    fn stop(&mut self, ctx: &mut EngineContext<'_>);
    fn update(&mut self, elapsed: f32, ctx: &mut EngineContext<'_>);
}

#[derive(Debug)]
pub enum Timer {
    Alert(AlertTimer),
    Direction(DirectionTimer),
    Marker(MarkerTimer),
    Sound(SoundTimer),
}

impl Timer {
    pub fn kind(&self) -> TimerKind {
        match self {
            Timer::Alert(_) => TimerKind::Alert,
            Timer::Direction(_) => TimerKind::Direction,
            Timer::Marker(_) => TimerKind::Marker,
            Timer::Sound(_) => TimerKind::Sound,
        }
    }

    pub fn id(&self) -> TimerInstanceId {
        self.common().id
    }

    pub fn uid(&self) -> Option<&str> {
        self.common().uid.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.common().name
    }

    pub fn timer_set(&self) -> &str {
        &self.common().timer_set
    }

    pub fn is_activated(&self) -> bool {
        self.common().activated
    }

    fn behavior(&self) -> &dyn TimerBehavior {
        match self {
            Timer::Alert(t) => t,
            Timer::Direction(t) => t,
            Timer::Marker(t) => t,
            Timer::Sound(t) => t,
        }
    }

    fn behavior_mut(&mut self) -> &mut dyn TimerBehavior {
        match self {
            Timer::Alert(t) => t,
            Timer::Direction(t) => t,
            Timer::Marker(t) => t,
            Timer::Sound(t) => t,
        }
    }
}

impl TimerBehavior for Timer {
    fn common(&self) -> &TimerCommon {
        self.behavior().common()
    }

    fn initialize(&mut self, resources: &mut dyn ResourceProvider) -> Result<(), ValidationError> {
        self.behavior_mut().initialize(resources)
    }

    fn activate(&mut self, ctx: &mut EngineContext<'_>) {
        self.behavior_mut().activate(ctx);
    }

    fn deactivate(&mut self, ctx: &mut EngineContext<'_>) {
        self.behavior_mut().deactivate(ctx);
    }

    fn stop(&mut self, ctx: &mut EngineContext<'_>) {
        self.behavior_mut().stop(ctx);
    }

    fn update(&mut self, elapsed: f32, ctx: &mut EngineContext<'_>) {
        self.behavior_mut().update(elapsed, ctx);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Colors
// ═══════════════════════════════════════════════════════════════════════════

pub mod colors {
    use cadence_types::Color;

    pub const WHITE: Color = [255, 255, 255, 255];
    pub const YELLOW: Color = [255, 255, 0, 255];
    pub const DARK_GRAY: Color = [169, 169, 169, 255];
}

/// Parse `[r, g, b]` (0-255) or `[r, g, b, a]` (alpha 0-1).
/// Anything else yields `fallback`.
pub fn parse_color(values: Option<&[f32]>, fallback: Color) -> Color {
    fn channel(v: f32) -> u8 {
        (v as i32).clamp(0, 255) as u8
    }

    match values {
        Some([r, g, b]) => [channel(*r), channel(*g), channel(*b), 255],
        Some([r, g, b, a]) => [
            channel(*r),
            channel(*g),
            channel(*b),
            (a.clamp(0.0, 1.0) * 255.0) as u8,
        ],
        _ => fallback,
    }
}
