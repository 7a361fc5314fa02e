//! Encounter state machine
//!
//! An encounter is a map-scoped sequence of phases with a reset trigger:
//!
//! ```text
//!             initialize            activate (on map)
//!  Suspended ───────────▶ Ready ─────────────────────▶ WaitingToRun
//!      ▲                                                   │ phase 0 start
//!      │ stop (map left / reset / last finish)             ▼
//!      └──────────────────────────────────────────────  Running ◀─┐
//!                                                 finish │        │ next start
//!                                                        ▼        │
//!                                              WaitingNextPhase ──┘
//! ```
//!
//! Failed validation parks the encounter in `Error` for good.
//!
//! Each call to [`Encounter::update`] applies at most one transition. Stop
//! and phase changes are checked before the periodic timer tick so timers
//! never see the elapsed time of a phase that just ended.

use cadence_types::EncounterDefinition;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::context::EngineContext;
use crate::effects::{ResourceProvider, TextureId};
use crate::error::ValidationError;
use crate::phase::Phase;
use crate::triggers::{Trigger, TriggerBehavior};
use crate::world::KeyPress;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterState {
    /// Failed validation. Terminal.
    Error,
    /// Idle, or stopped after a run
    #[default]
    Suspended,
    /// Validated, not yet engaged
    Ready,
    /// Armed, watching the first phase's start trigger
    WaitingToRun,
    Running,
    /// Between phases, watching the next phase's start trigger
    WaitingNextPhase,
}

#[derive(Debug)]
pub struct Encounter {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub author: String,
    icon_name: String,
    icon: Option<TextureId>,
    enabled: bool,
    map: u32,
    phases: Vec<Phase>,
    reset: Option<Trigger>,

    // ─── Runtime ────────────────────────────────────────────────────────────
    state: EncounterState,
    current_phase: usize,
    start_time: Option<NaiveDateTime>,
    last_update: Option<NaiveDateTime>,
    error: Option<ValidationError>,
    validated: bool,
}

impl Encounter {
    /// Build runtime state from a definition. Call [`Encounter::initialize`]
    /// before use.
    pub fn from_definition(def: &EncounterDefinition) -> Self {
        Self {
            id: def.id.clone(),
            name: def.name.clone(),
            category: def.category.clone(),
            description: def.description.clone(),
            author: def.author.clone(),
            icon_name: def.icon.clone(),
            icon: None,
            enabled: def.enabled,
            // Out-of-range ids fail validation as an undefined map
            map: u32::try_from(def.map).unwrap_or(0),
            phases: def.phases.iter().map(Phase::from_definition).collect(),
            reset: def.reset.as_ref().map(Trigger::from_definition),
            state: EncounterState::Suspended,
            current_phase: 0,
            start_time: None,
            last_update: None,
            error: None,
            validated: false,
        }
    }

    /// Validate the definition and resolve resources.
    ///
    /// On failure the encounter moves to `Error` and keeps the reason.
    pub fn initialize(&mut self, resources: &mut dyn ResourceProvider) -> Result<(), ValidationError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }

        match self.validate(resources) {
            Ok(()) => {
                self.validated = true;
                self.state = EncounterState::Ready;
                Ok(())
            }
            Err(err) => {
                warn!(encounter = %self.id, error = %err, "Encounter failed validation");
                self.state = EncounterState::Error;
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    fn validate(&mut self, resources: &mut dyn ResourceProvider) -> Result<(), ValidationError> {
        self.icon = resources
            .icon(&self.icon_name)
            .or_else(|| resources.load_texture(&self.icon_name));

        if self.map == 0 {
            return Err(ValidationError::InvalidMap);
        }
        if self.phases.is_empty() {
            return Err(ValidationError::NoPhases);
        }
        let Some(reset) = self.reset.as_mut() else {
            return Err(ValidationError::MissingReset);
        };
        reset
            .initialize()
            .map_err(|e| ValidationError::InvalidReset(Box::new(e)))?;

        let last = self.phases.len() - 1;
        for (index, phase) in self.phases.iter_mut().enumerate() {
            let result = phase.initialize(resources).and_then(|()| {
                if index < last && !phase.has_finish() {
                    Err(ValidationError::UnboundedPhase {
                        phase: phase.name.clone(),
                    })
                } else {
                    Ok(())
                }
            });
            result.map_err(|source| ValidationError::InPhase {
                encounter: self.id.clone(),
                source: Box::new(source),
            })?;
        }
        Ok(())
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn state(&self) -> EncounterState {
        self.state
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Change the enabled flag. The owner decides whether to (de)activate.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn map(&self) -> u32 {
        self.map
    }

    pub fn icon(&self) -> Option<TextureId> {
        self.icon
    }

    pub fn is_valid(&self) -> bool {
        self.validated
    }

    pub fn error(&self) -> Option<&ValidationError> {
        self.error.as_ref()
    }

    pub fn current_phase_index(&self) -> usize {
        self.current_phase
    }

    pub fn current_phase(&self) -> Option<&Phase> {
        self.phases.get(self.current_phase)
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self.state,
            EncounterState::Running | EncounterState::WaitingNextPhase
        )
    }

    /// Seconds since the current phase started
    pub fn elapsed_secs(&self, now: NaiveDateTime) -> Option<f32> {
        self.start_time.map(|start| secs_between(start, now))
    }

    // ─── Lifecycle ──────────────────────────────────────────────────────────

    /// Attach all phases and arm the first one. Only on the encounter's map.
    pub fn activate(&mut self, ctx: &mut EngineContext<'_>) {
        if !self.enabled || !self.validated {
            return;
        }
        if !matches!(
            self.state,
            EncounterState::Ready | EncounterState::Suspended
        ) {
            return;
        }
        if !ctx.on_map(self.map) {
            return;
        }

        for phase in &mut self.phases {
            phase.activate(ctx);
        }
        self.arm_first_phase();
        info!(encounter = %self.id, map = self.map, "Encounter activated");
    }

    /// Stop and detach everything
    pub fn deactivate(&mut self, ctx: &mut EngineContext<'_>) {
        if !self.validated {
            return;
        }
        self.stop(ctx);
        for phase in &mut self.phases {
            phase.deactivate(ctx);
        }
        self.state = EncounterState::Suspended;
    }

    /// Abandon the current run and wait for the first phase again
    pub fn reset(&mut self, ctx: &mut EngineContext<'_>) {
        if !matches!(
            self.state,
            EncounterState::WaitingToRun | EncounterState::Running | EncounterState::WaitingNextPhase
        ) {
            return;
        }
        self.stop(ctx);
        self.rearm(ctx);
    }

    /// Forward a key press to every trigger in the encounter
    pub fn handle_key_press(&mut self, press: KeyPress, ctx: &EngineContext<'_>) {
        if let Some(reset) = self.reset.as_mut() {
            reset.on_key_press(press, ctx);
        }
        for phase in &mut self.phases {
            phase.handle_key_press(press, ctx);
        }
    }

    /// Advance the state machine. Call once per frame.
    pub fn update(&mut self, now: NaiveDateTime, ctx: &mut EngineContext<'_>) {
        match self.state {
            EncounterState::WaitingToRun => {
                if !self.enabled {
                    info!(encounter = %self.id, "Encounter disabled");
                    self.stop(ctx);
                    return;
                }
                if ctx.on_map(self.map) && self.phases[0].start_triggered(ctx) {
                    self.run(now, ctx);
                }
                return;
            }
            EncounterState::Running | EncounterState::WaitingNextPhase => {}
            _ => return,
        }

        if self.should_stop(ctx) {
            info!(encounter = %self.id, "Encounter stopped");
            self.stop(ctx);
            self.rearm(ctx);
            return;
        }

        let next = self.current_phase + 1;

        if self.state == EncounterState::WaitingNextPhase {
            if next < self.phases.len() && self.phases[next].start_triggered(ctx) {
                debug!(encounter = %self.id, phase = next, "Advancing to next phase");
                self.current_phase = next;
                self.start_current_phase(now, ctx);
            }
            return;
        }

        let phase = &mut self.phases[self.current_phase];
        if phase.finish_triggered(ctx) {
            phase.stop(ctx);
            if let Some(next_phase) = self.phases.get_mut(next) {
                next_phase.wait_for_start();
            }
            self.state = EncounterState::WaitingNextPhase;
            return;
        }

        let due = self
            .last_update
            .is_none_or(|last| secs_between(last, now) >= ctx.settings.tick_interval_secs);
        if due && let Some(start) = self.start_time {
            self.last_update = Some(now);
            let elapsed = secs_between(start, now);
            self.phases[self.current_phase].update(elapsed, ctx);
        }
    }

    // ─── Internals ──────────────────────────────────────────────────────────

    fn should_stop(&self, ctx: &EngineContext<'_>) -> bool {
        if !self.enabled || !ctx.on_map(self.map) {
            return true;
        }

        let last = self.phases.len() - 1;
        if self.state == EncounterState::Running
            && self.current_phase == last
            && self.phases[last].finish_triggered(ctx)
        {
            return true;
        }

        self.reset.as_ref().is_some_and(|reset| reset.triggered(ctx))
    }

    fn run(&mut self, now: NaiveDateTime, ctx: &mut EngineContext<'_>) {
        if let Some(reset) = self.reset.as_mut() {
            reset.enable();
        }
        self.current_phase = 0;
        self.start_current_phase(now, ctx);
        info!(encounter = %self.id, "Encounter running");
    }

    fn start_current_phase(&mut self, now: NaiveDateTime, ctx: &mut EngineContext<'_>) {
        self.start_time = Some(now);
        self.last_update = Some(now);
        let phase = &mut self.phases[self.current_phase];
        phase.start(ctx);
        phase.update(0.0, ctx);
        self.state = EncounterState::Running;
    }

    fn stop(&mut self, ctx: &mut EngineContext<'_>) {
        for phase in &mut self.phases {
            phase.stop(ctx);
            phase.cancel_wait();
        }
        if let Some(reset) = self.reset.as_mut() {
            reset.disable();
            reset.reset();
        }
        self.current_phase = 0;
        self.start_time = None;
        self.last_update = None;
        if self.validated {
            self.state = EncounterState::Suspended;
        }
    }

    /// Wait for the first phase again if still enabled and on the map
    fn rearm(&mut self, ctx: &EngineContext<'_>) {
        if self.enabled && ctx.on_map(self.map) {
            self.arm_first_phase();
        }
    }

    fn arm_first_phase(&mut self) {
        self.phases[0].wait_for_start();
        self.current_phase = 0;
        self.state = EncounterState::WaitingToRun;
    }
}

fn secs_between(from: NaiveDateTime, to: NaiveDateTime) -> f32 {
    to.signed_duration_since(from).num_milliseconds() as f32 / 1000.0
}
