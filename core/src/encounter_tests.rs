//! Tests for the encounter state machine
//!
//! Verifies that:
//! - Validation errors park the encounter in `Error` with a readable reason
//! - Phases run, advance and stop on the expected ticks
//! - Timers see per-phase elapsed time through the tick gate

use cadence_types::{KeyBinding, PhaseDefinition};
use chrono::{NaiveDate, NaiveDateTime};

use crate::encounter::{Encounter, EncounterState};
use crate::error::ValidationError;
use crate::testing::{
    TestHarness, TestResources, make_alert_def, make_direction_def, make_encounter_def,
    make_key_def, make_phase_def, make_sound_def,
};
use crate::world::{KeyPress, Point3};

// ═══════════════════════════════════════════════════════════════════════════
// Test Helpers
// ═══════════════════════════════════════════════════════════════════════════

const MAP: i64 = 5;
const FINISH_KEY: u32 = 70;

fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 14)
        .unwrap()
        .and_hms_opt(20, 0, 0)
        .unwrap()
}

fn at(secs: f32) -> NaiveDateTime {
    t0() + chrono::Duration::milliseconds((secs * 1000.0).round() as i64)
}

/// Harness on the encounter map with key bind 1 bound to `FINISH_KEY`
fn make_harness() -> TestHarness {
    let mut h = TestHarness::new();
    h.world.map_id = MAP as u32;
    h.settings.key_binds = vec![
        KeyBinding::default(),
        KeyBinding {
            primary_key: FINISH_KEY,
            modifiers: 0,
        },
    ];
    h
}

fn make_encounter(phases: Vec<PhaseDefinition>) -> Encounter {
    let mut encounter = Encounter::from_definition(&make_encounter_def("test", MAP, phases));
    encounter.initialize(&mut TestResources::default()).unwrap();
    encounter
}

/// One phase, always-true start, alert at 10s (5s warning, 2s alert)
fn make_alert_encounter() -> Encounter {
    let mut phase = make_phase_def("Main", make_key_def(0));
    phase.alerts = vec![make_alert_def(&[10.0], 5.0, 2.0)];
    make_encounter(vec![phase])
}

/// Two phases; the first finishes on `FINISH_KEY`, the second starts at once
fn make_two_phase_encounter() -> Encounter {
    let mut first = make_phase_def("First", make_key_def(0));
    first.finish = Some(make_key_def(1));
    let mut second = make_phase_def("Second", make_key_def(0));
    second.sounds = vec![make_sound_def(&[1.0], "Second phase")];
    make_encounter(vec![first, second])
}

fn init_error(encounter: &mut Encounter) -> String {
    encounter
        .initialize(&mut TestResources::default())
        .unwrap_err()
        .to_string()
}

// ═══════════════════════════════════════════════════════════════════════════
// Validation
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn invalid_map_is_rejected() {
    let phase = make_phase_def("Main", make_key_def(0));
    let mut encounter = Encounter::from_definition(&make_encounter_def("bad", 0, vec![phase]));
    assert_eq!(init_error(&mut encounter), "Map property undefined/invalid");
    assert_eq!(encounter.state(), EncounterState::Error);
    assert_eq!(encounter.error(), Some(&ValidationError::InvalidMap));
}

#[test]
fn missing_phases_and_reset_are_rejected() {
    let mut encounter = Encounter::from_definition(&make_encounter_def("bad", MAP, Vec::new()));
    assert_eq!(init_error(&mut encounter), "Phase property undefined");

    let mut def = make_encounter_def("bad", MAP, vec![make_phase_def("Main", make_key_def(0))]);
    def.reset = None;
    let mut encounter = Encounter::from_definition(&def);
    assert_eq!(init_error(&mut encounter), "Reset property is undefined");
}

#[test]
fn invalid_reset_names_the_cause() {
    let mut def = make_encounter_def("bad", MAP, vec![make_phase_def("Main", make_key_def(0))]);
    if let Some(reset) = def.reset.as_mut() {
        reset.position = None;
    }
    let mut encounter = Encounter::from_definition(&def);
    assert_eq!(init_error(&mut encounter), "Reset trigger invalid - invalid position");
}

#[test]
fn phase_errors_are_prefixed_with_encounter_id() {
    let mut phase = make_phase_def("Main", make_key_def(0));
    phase.start = None;
    let mut encounter = Encounter::from_definition(&make_encounter_def("vg", MAP, vec![phase]));
    assert_eq!(init_error(&mut encounter), "vg: phase missing start trigger");

    let mut phase = make_phase_def("Main", make_key_def(0));
    phase.alerts = vec![make_alert_def(&[], 5.0, 2.0)];
    let mut encounter = Encounter::from_definition(&make_encounter_def("vg", MAP, vec![phase]));
    assert_eq!(init_error(&mut encounter), "vg: Unnamed Timer invalid timestamps property");
}

#[test]
fn only_last_phase_may_omit_finish() {
    let first = make_phase_def("First", make_key_def(0));
    let second = make_phase_def("Second", make_key_def(0));
    let mut encounter = Encounter::from_definition(&make_encounter_def("vg", MAP, vec![first, second]));
    assert!(matches!(
        encounter.initialize(&mut TestResources::default()),
        Err(ValidationError::InPhase { .. })
    ));
}

#[test]
fn errored_encounter_never_activates() {
    let mut h = make_harness();
    let mut encounter = Encounter::from_definition(&make_encounter_def("bad", 0, Vec::new()));
    let _ = encounter.initialize(&mut TestResources::default());

    encounter.activate(&mut h.ctx());
    encounter.update(t0(), &mut h.ctx());
    assert_eq!(encounter.state(), EncounterState::Error);
}

// ═══════════════════════════════════════════════════════════════════════════
// Activation
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn activation_requires_matching_map() {
    let mut h = make_harness();
    h.world.map_id = 99;
    let mut encounter = make_alert_encounter();
    assert_eq!(encounter.state(), EncounterState::Ready);

    encounter.activate(&mut h.ctx());
    assert_eq!(encounter.state(), EncounterState::Ready);

    h.world.map_id = MAP as u32;
    encounter.activate(&mut h.ctx());
    assert_eq!(encounter.state(), EncounterState::WaitingToRun);
}

#[test]
fn disabled_encounter_stays_ready() {
    let mut h = make_harness();
    let mut encounter = make_alert_encounter();
    encounter.set_enabled(false);

    encounter.activate(&mut h.ctx());
    assert_eq!(encounter.state(), EncounterState::Ready);
}

#[test]
fn deactivate_detaches_effects() {
    let mut h = make_harness();
    let mut phase = make_phase_def("Main", make_key_def(0));
    phase.directions = vec![make_direction_def(&[0.0], 10.0)];
    let mut encounter = make_encounter(vec![phase]);

    encounter.activate(&mut h.ctx());
    encounter.update(t0(), &mut h.ctx());
    assert_eq!(h.sink.visible_trail_count(), 1);

    encounter.deactivate(&mut h.ctx());
    assert_eq!(encounter.state(), EncounterState::Suspended);
    assert_eq!(h.sink.trails().count(), 0);

    // Idempotent
    encounter.deactivate(&mut h.ctx());
    assert_eq!(encounter.state(), EncounterState::Suspended);

    // Can come back
    encounter.activate(&mut h.ctx());
    assert_eq!(encounter.state(), EncounterState::WaitingToRun);
    assert_eq!(h.sink.trails().count(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// Running
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn single_phase_alert_end_to_end() {
    let mut h = make_harness();
    let mut encounter = make_alert_encounter();

    encounter.activate(&mut h.ctx());
    encounter.update(t0(), &mut h.ctx());
    assert_eq!(encounter.state(), EncounterState::Running);
    assert_eq!(h.sink.alert_count(), 0);

    encounter.update(at(6.0), &mut h.ctx());
    let panel = h.sink.alert_with_text("Incoming").unwrap();
    assert!((panel.fill - 0.2).abs() < 1e-6);

    encounter.update(at(11.0), &mut h.ctx());
    assert!(h.sink.alert_with_text("Now").is_some());

    encounter.update(at(13.0), &mut h.ctx());
    assert_eq!(h.sink.alert_count(), 0);
    assert_eq!(encounter.state(), EncounterState::Running);
}

#[test]
fn map_change_suspends_within_one_update() {
    let mut h = make_harness();
    let mut encounter = make_two_phase_encounter();
    encounter.activate(&mut h.ctx());
    encounter.update(t0(), &mut h.ctx());

    encounter.handle_key_press(KeyPress::new(FINISH_KEY), &h.ctx());
    encounter.update(at(1.0), &mut h.ctx());
    encounter.update(at(1.5), &mut h.ctx());
    assert_eq!(encounter.current_phase_index(), 1);

    h.world.map_id = 6;
    encounter.update(at(2.0), &mut h.ctx());
    assert_eq!(encounter.state(), EncounterState::Suspended);
    assert_eq!(encounter.current_phase_index(), 0);
}

#[test]
fn phases_advance_with_fresh_elapsed_time() {
    let mut h = make_harness();
    let mut encounter = make_two_phase_encounter();
    encounter.activate(&mut h.ctx());
    encounter.update(t0(), &mut h.ctx());

    // No press yet
    encounter.update(at(0.5), &mut h.ctx());
    assert_eq!(encounter.state(), EncounterState::Running);

    encounter.handle_key_press(KeyPress::new(FINISH_KEY), &h.ctx());
    encounter.update(at(20.0), &mut h.ctx());
    assert_eq!(encounter.state(), EncounterState::WaitingNextPhase);

    encounter.update(at(21.0), &mut h.ctx());
    assert_eq!(encounter.state(), EncounterState::Running);
    assert_eq!(encounter.current_phase_index(), 1);
    assert_eq!(encounter.elapsed_secs(at(21.5)), Some(0.5));

    // Sound at 1s of the second phase, not of the encounter
    encounter.update(at(21.5), &mut h.ctx());
    assert!(h.sink.spoken().is_empty());
    encounter.update(at(22.0), &mut h.ctx());
    assert_eq!(h.sink.spoken(), ["Second phase"]);
}

#[test]
fn last_phase_finish_stops_and_rearms() {
    let mut h = make_harness();
    let mut phase = make_phase_def("Only", make_key_def(1));
    phase.finish = Some(make_key_def(1));
    let mut encounter = make_encounter(vec![phase]);

    encounter.activate(&mut h.ctx());
    encounter.update(t0(), &mut h.ctx());
    assert_eq!(encounter.state(), EncounterState::WaitingToRun);

    encounter.handle_key_press(KeyPress::new(FINISH_KEY), &h.ctx());
    encounter.update(at(1.0), &mut h.ctx());
    assert_eq!(encounter.state(), EncounterState::Running);

    encounter.handle_key_press(KeyPress::new(FINISH_KEY), &h.ctx());
    encounter.update(at(2.0), &mut h.ctx());
    assert_eq!(encounter.state(), EncounterState::WaitingToRun);
    assert_eq!(encounter.current_phase_index(), 0);
}

#[test]
fn reset_trigger_stops_run() {
    let mut h = make_harness();
    let mut encounter = make_alert_encounter();
    encounter.activate(&mut h.ctx());
    encounter.update(t0(), &mut h.ctx());
    encounter.update(at(6.0), &mut h.ctx());
    assert_eq!(h.sink.alert_count(), 1);

    // Reset fires on departure from the 1000 radius around the origin
    h.world.position = Point3::new(2000.0, 0.0, 0.0);
    encounter.update(at(6.5), &mut h.ctx());
    assert_eq!(encounter.state(), EncounterState::WaitingToRun);
    assert_eq!(h.sink.alert_count(), 0);
}

#[test]
fn timer_updates_are_throttled() {
    let mut h = make_harness();
    let mut phase = make_phase_def("Main", make_key_def(0));
    phase.sounds = vec![make_sound_def(&[0.05], "Go")];
    let mut encounter = make_encounter(vec![phase]);

    encounter.activate(&mut h.ctx());
    encounter.update(t0(), &mut h.ctx());

    encounter.update(at(0.05), &mut h.ctx());
    assert!(h.sink.spoken().is_empty());

    encounter.update(at(0.1), &mut h.ctx());
    assert_eq!(h.sink.spoken().len(), 1);
}

#[test]
fn manual_reset_returns_to_first_phase() {
    let mut h = make_harness();
    let mut encounter = make_two_phase_encounter();
    encounter.activate(&mut h.ctx());
    encounter.update(t0(), &mut h.ctx());
    encounter.handle_key_press(KeyPress::new(FINISH_KEY), &h.ctx());
    encounter.update(at(1.0), &mut h.ctx());
    encounter.update(at(2.0), &mut h.ctx());
    assert_eq!(encounter.current_phase_index(), 1);

    encounter.reset(&mut h.ctx());
    assert_eq!(encounter.state(), EncounterState::WaitingToRun);
    assert_eq!(encounter.current_phase_index(), 0);
    assert!(encounter.enabled());
}

#[test]
fn disabling_suspends_on_next_update() {
    let mut h = make_harness();
    let mut encounter = make_alert_encounter();
    encounter.activate(&mut h.ctx());
    encounter.update(t0(), &mut h.ctx());

    encounter.set_enabled(false);
    encounter.update(at(1.0), &mut h.ctx());
    assert_eq!(encounter.state(), EncounterState::Suspended);
}

#[test]
fn disabled_waiting_encounter_never_runs() {
    let mut h = make_harness();
    let mut phase = make_phase_def("Main", make_key_def(0));
    phase.sounds = vec![make_sound_def(&[0.0], "Pull")];
    let mut encounter = make_encounter(vec![phase]);

    encounter.activate(&mut h.ctx());
    assert_eq!(encounter.state(), EncounterState::WaitingToRun);

    encounter.set_enabled(false);
    encounter.update(t0(), &mut h.ctx());
    assert_eq!(encounter.state(), EncounterState::Suspended);
    assert!(h.sink.spoken().is_empty());

    // Re-enabling arms the first phase again
    encounter.set_enabled(true);
    encounter.activate(&mut h.ctx());
    encounter.update(at(0.5), &mut h.ctx());
    assert_eq!(encounter.state(), EncounterState::Running);
    assert_eq!(h.sink.spoken(), ["Pull"]);
}
