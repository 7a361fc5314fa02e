//! Phase state machine
//!
//! ```text
//!   Idle ──activate──▶ Activated ──start──▶ Running
//!    ▲                  │   ▲                  │
//!    └───deactivate─────┘   └──────stop────────┘
//! ```
//!
//! While running, a phase feeds each timer the elapsed time of its timer
//! set. Sets start in lockstep with `"default"` and drift apart only when a
//! skip action fires.

use cadence_types::PhaseDefinition;
use hashbrown::HashMap;
use tracing::debug;

use crate::actions::SkipAction;
use crate::context::EngineContext;
use crate::effects::ResourceProvider;
use crate::error::ValidationError;
use crate::timers::{
    ActiveEntityRegistry, AlertTimer, DirectionTimer, MarkerTimer, SoundTimer, Timer,
    TimerBehavior,
};
use crate::triggers::{Trigger, TriggerBehavior};
use crate::world::KeyPress;

/// Timer set every timer belongs to unless configured otherwise
pub const DEFAULT_TIMER_SET: &str = "default";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PhaseState {
    /// Loaded, timers detached
    #[default]
    Idle,
    /// Timers attached, waiting to be started
    Activated,
    /// Start fired, timers updating, finish armed
    Running,
}

#[derive(Debug)]
pub struct Phase {
    pub name: String,
    start: Option<Trigger>,
    finish: Option<Trigger>,
    timers: Vec<Timer>,
    actions: Vec<SkipAction>,
    state: PhaseState,
    /// Latest skip offset per timer set, cleared on stop
    set_offsets: HashMap<String, f32>,
}

impl Phase {
    pub fn from_definition(def: &PhaseDefinition) -> Self {
        let timers = def
            .alerts
            .iter()
            .map(|d| Timer::Alert(AlertTimer::from_definition(d)))
            .chain(
                def.directions
                    .iter()
                    .map(|d| Timer::Direction(DirectionTimer::from_definition(d))),
            )
            .chain(
                def.markers
                    .iter()
                    .map(|d| Timer::Marker(MarkerTimer::from_definition(d))),
            )
            .chain(
                def.sounds
                    .iter()
                    .map(|d| Timer::Sound(SoundTimer::from_definition(d))),
            )
            .collect();

        Self {
            name: def.name.clone(),
            start: def.start.as_ref().map(Trigger::from_definition),
            finish: def.finish.as_ref().map(Trigger::from_definition),
            timers,
            actions: def.actions.iter().map(SkipAction::from_definition).collect(),
            state: PhaseState::Idle,
            set_offsets: HashMap::new(),
        }
    }

    pub fn initialize(&mut self, resources: &mut dyn ResourceProvider) -> Result<(), ValidationError> {
        let Some(start) = self.start.as_mut() else {
            return Err(ValidationError::MissingStartTrigger);
        };
        start.initialize()?;

        if let Some(finish) = self.finish.as_mut() {
            finish.initialize()?;
        }
        for timer in &mut self.timers {
            timer.initialize(resources)?;
        }
        for action in &mut self.actions {
            action.initialize()?;
        }
        Ok(())
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn state(&self) -> PhaseState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PhaseState::Running
    }

    pub fn has_finish(&self) -> bool {
        self.finish.is_some()
    }

    pub fn timers(&self) -> &[Timer] {
        &self.timers
    }

    pub fn actions(&self) -> &[SkipAction] {
        &self.actions
    }

    pub fn start_triggered(&self, ctx: &EngineContext<'_>) -> bool {
        self.start.as_ref().is_some_and(|t| t.triggered(ctx))
    }

    pub fn finish_triggered(&self, ctx: &EngineContext<'_>) -> bool {
        self.finish.as_ref().is_some_and(|t| t.triggered(ctx))
    }

    /// Elapsed time seen by timers of `set`
    pub fn elapsed_for_set(&self, set: &str, elapsed: f32) -> f32 {
        set_elapsed(&self.set_offsets, set, elapsed)
    }

    // ─── Lifecycle ──────────────────────────────────────────────────────────

    /// Attach timers, skipping those whose uid another timer already owns
    pub fn activate(&mut self, ctx: &mut EngineContext<'_>) {
        if self.state != PhaseState::Idle {
            return;
        }
        for timer in &mut self.timers {
            if claim(timer, ctx.registry) {
                timer.activate(ctx);
            }
        }
        self.state = PhaseState::Activated;
    }

    pub fn deactivate(&mut self, ctx: &mut EngineContext<'_>) {
        if self.state == PhaseState::Idle {
            return;
        }
        self.stop(ctx);
        self.cancel_wait();

        for timer in &mut self.timers {
            release(timer, ctx.registry);
            timer.deactivate(ctx);
        }
        self.state = PhaseState::Idle;
    }

    /// Arm the start trigger
    pub fn wait_for_start(&mut self) {
        if let Some(start) = self.start.as_mut() {
            start.enable();
        }
        debug!(phase = %self.name, "Phase waiting");
    }

    /// Disarm the start trigger without touching timers
    pub fn cancel_wait(&mut self) {
        if let Some(start) = self.start.as_mut() {
            start.reset();
            start.disable();
        }
    }

    pub fn start(&mut self, ctx: &mut EngineContext<'_>) {
        if self.state != PhaseState::Activated {
            return;
        }

        if let Some(start) = self.start.as_mut() {
            start.reset();
            start.disable();
        }
        if let Some(finish) = self.finish.as_mut() {
            finish.enable();
        }
        for action in &mut self.actions {
            action.start();
        }

        // Ownership may have moved while this phase was stopped
        for timer in &mut self.timers {
            if claim(timer, ctx.registry) {
                timer.activate(ctx);
            } else {
                timer.deactivate(ctx);
            }
        }

        self.set_offsets.clear();
        self.state = PhaseState::Running;
        debug!(phase = %self.name, "Phase starting");
    }

    pub fn stop(&mut self, ctx: &mut EngineContext<'_>) {
        if self.state != PhaseState::Running {
            return;
        }

        for trigger in [self.start.as_mut(), self.finish.as_mut()].into_iter().flatten() {
            trigger.reset();
            trigger.disable();
        }
        for action in &mut self.actions {
            action.stop();
            action.reset();
        }
        for timer in &mut self.timers {
            timer.stop(ctx);
            release(timer, ctx.registry);
        }

        self.set_offsets.clear();
        self.state = PhaseState::Activated;
        debug!(phase = %self.name, "Phase stopping");
    }

    pub fn update(&mut self, elapsed: f32, ctx: &mut EngineContext<'_>) {
        if self.state != PhaseState::Running {
            return;
        }

        for action in &mut self.actions {
            if action.update(ctx) {
                // Last write wins when several actions target the same set
                for set in &action.target_sets {
                    self.set_offsets.insert(set.clone(), action.accumulated());
                }
            }
        }

        for timer in &mut self.timers {
            let timer_elapsed = set_elapsed(&self.set_offsets, timer.timer_set(), elapsed);
            timer.update(timer_elapsed, ctx);
        }
    }

    /// Forward a key press to every trigger this phase owns
    pub fn handle_key_press(&mut self, press: KeyPress, ctx: &EngineContext<'_>) {
        for trigger in [self.start.as_mut(), self.finish.as_mut()].into_iter().flatten() {
            trigger.on_key_press(press, ctx);
        }
        for action in &mut self.actions {
            if let Some(trigger) = action.trigger_mut() {
                trigger.on_key_press(press, ctx);
            }
        }
    }
}

fn set_elapsed(offsets: &HashMap<String, f32>, set: &str, elapsed: f32) -> f32 {
    let offset = offsets
        .get(set)
        .or_else(|| offsets.get(DEFAULT_TIMER_SET))
        .copied()
        .unwrap_or(0.0);
    elapsed + offset
}

fn claim(timer: &Timer, registry: &mut ActiveEntityRegistry) -> bool {
    match timer.uid() {
        Some(uid) => registry.claim(timer.kind(), uid, timer.id()),
        None => true,
    }
}

fn release(timer: &Timer, registry: &mut ActiveEntityRegistry) {
    if let Some(uid) = timer.uid() {
        registry.release(timer.kind(), uid, timer.id());
    }
}

#[cfg(test)]
mod tests {
    use cadence_types::{KeyBinding, PhaseDefinition};

    use super::*;
    use crate::testing::{
        TestHarness, TestResources, make_alert_def, make_key_def, make_location_def,
        make_phase_def, make_skip_def, make_sound_def,
    };
    use crate::world::Point3;

    fn make_phase(def: PhaseDefinition) -> Phase {
        let mut phase = Phase::from_definition(&def);
        phase.initialize(&mut TestResources::default()).unwrap();
        phase
    }

    #[test]
    fn missing_start_trigger_is_invalid() {
        let mut def = make_phase_def("P1", make_key_def(0));
        def.start = None;
        let mut phase = Phase::from_definition(&def);
        assert_eq!(
            phase.initialize(&mut TestResources::default()),
            Err(ValidationError::MissingStartTrigger)
        );
    }

    #[test]
    fn lifecycle_transitions() {
        let mut h = TestHarness::new();
        let mut phase = make_phase(make_phase_def("P1", make_key_def(0)));

        // Start before activate is a no-op
        phase.start(&mut h.ctx());
        assert_eq!(phase.state(), PhaseState::Idle);

        phase.activate(&mut h.ctx());
        phase.wait_for_start();
        assert_eq!(phase.state(), PhaseState::Activated);

        phase.start(&mut h.ctx());
        assert!(phase.is_running());

        phase.stop(&mut h.ctx());
        assert_eq!(phase.state(), PhaseState::Activated);

        phase.deactivate(&mut h.ctx());
        assert_eq!(phase.state(), PhaseState::Idle);
    }

    #[test]
    fn finish_on_departure_from_start_area() {
        let mut h = TestHarness::new();
        let mut def = make_phase_def("Area", make_key_def(0));
        def.start = Some(make_location_def([10.0, 0.0, 0.0], 1.0));
        let mut finish = make_location_def([10.0, 0.0, 0.0], 1.0);
        finish.entry_required = false;
        finish.departure_required = true;
        def.finish = Some(finish);
        let mut phase = make_phase(def);

        phase.activate(&mut h.ctx());
        phase.wait_for_start();

        h.world.position = Point3::new(10.0, 0.5, 0.0);
        assert!(phase.start_triggered(&h.ctx()));
        phase.start(&mut h.ctx());

        phase.update(1.0, &mut h.ctx());
        assert!(phase.is_running());
        assert!(!phase.finish_triggered(&h.ctx()));

        h.world.position = Point3::new(20.0, 0.0, 0.0);
        assert!(phase.finish_triggered(&h.ctx()));
    }

    #[test]
    fn skip_advances_only_target_set() {
        let mut h = TestHarness::new();
        h.settings.key_binds = vec![KeyBinding {
            primary_key: 32,
            modifiers: 0,
        }];

        let mut def = make_phase_def("Skip", make_key_def(0));
        def.actions = vec![make_skip_def(&["boss"], 30.0, Some(make_key_def(0)))];
        let mut phase = make_phase(def);

        phase.activate(&mut h.ctx());
        phase.start(&mut h.ctx());
        phase.update(2.0, &mut h.ctx());
        assert_eq!(phase.elapsed_for_set("boss", 2.0), 2.0);

        phase.handle_key_press(KeyPress::new(32), &h.ctx());
        phase.update(3.0, &mut h.ctx());
        assert_eq!(phase.elapsed_for_set("boss", 3.0), 33.0);
        assert_eq!(phase.elapsed_for_set(DEFAULT_TIMER_SET, 3.0), 3.0);
        assert_eq!(phase.elapsed_for_set("adds", 3.0), 3.0);

        // Offset persists until the trigger fires again
        phase.update(4.0, &mut h.ctx());
        assert_eq!(phase.elapsed_for_set("boss", 4.0), 34.0);

        phase.stop(&mut h.ctx());
        assert_eq!(phase.elapsed_for_set("boss", 4.0), 4.0);
        assert_eq!(phase.actions()[0].accumulated(), 0.0);
    }

    #[test]
    fn same_tick_skips_keep_last_offset() {
        let mut h = TestHarness::new();
        h.settings.key_binds = vec![KeyBinding {
            primary_key: 32,
            modifiers: 0,
        }];

        let mut def = make_phase_def("Skip", make_key_def(0));
        def.actions = vec![
            make_skip_def(&["boss"], 30.0, Some(make_key_def(0))),
            make_skip_def(&["boss"], 10.0, Some(make_key_def(0))),
        ];
        let mut phase = make_phase(def);

        phase.activate(&mut h.ctx());
        phase.start(&mut h.ctx());
        phase.handle_key_press(KeyPress::new(32), &h.ctx());
        phase.update(5.0, &mut h.ctx());

        assert_eq!(phase.actions()[0].accumulated(), 30.0);
        assert_eq!(phase.actions()[1].accumulated(), 10.0);
        assert_eq!(phase.elapsed_for_set("boss", 5.0), 15.0);
    }

    #[test]
    fn skipped_set_drives_its_timers() {
        let mut h = TestHarness::new();
        h.settings.key_binds = vec![KeyBinding {
            primary_key: 32,
            modifiers: 0,
        }];

        let mut sound = make_sound_def(&[20.0], "Boss soon");
        sound.common.timer_set = "boss".to_string();
        let mut def = make_phase_def("Skip", make_key_def(0));
        def.sounds = vec![sound];
        def.actions = vec![make_skip_def(&["boss"], 30.0, Some(make_key_def(0)))];
        let mut phase = make_phase(def);

        phase.activate(&mut h.ctx());
        phase.start(&mut h.ctx());
        phase.update(1.0, &mut h.ctx());
        assert!(h.sink.spoken().is_empty());

        phase.handle_key_press(KeyPress::new(32), &h.ctx());
        phase.update(1.1, &mut h.ctx());
        assert_eq!(h.sink.spoken(), ["Boss soon"]);
    }

    #[test]
    fn shared_uid_is_owned_by_first_phase() {
        let mut h = TestHarness::new();
        let mut alert = make_alert_def(&[10.0], 5.0, 2.0);
        alert.common.uid = Some("shared".to_string());

        let mut first_def = make_phase_def("P1", make_key_def(0));
        first_def.alerts = vec![alert.clone()];
        let mut second_def = make_phase_def("P2", make_key_def(0));
        second_def.alerts = vec![alert];

        let mut first = make_phase(first_def);
        let mut second = make_phase(second_def);
        first.activate(&mut h.ctx());
        second.activate(&mut h.ctx());

        assert!(first.timers()[0].is_activated());
        assert!(!second.timers()[0].is_activated());

        // Deactivating the non-owner keeps the entry
        second.deactivate(&mut h.ctx());
        assert_eq!(h.registry.len(), 1);

        // Ownership moves once the owner stops
        second.activate(&mut h.ctx());
        first.start(&mut h.ctx());
        first.stop(&mut h.ctx());
        second.start(&mut h.ctx());
        assert!(second.timers()[0].is_activated());
        assert_eq!(
            h.registry.owner(crate::timers::TimerKind::Alert, "shared"),
            Some(second.timers()[0].id())
        );
    }
}
