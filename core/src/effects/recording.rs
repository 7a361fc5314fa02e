//! In-memory effect sink
//!
//! Keeps the current state of every effect plus an ordered event log. Used
//! by the validator to replay scripts and by tests to assert on output.

use std::collections::BTreeMap;

use super::{AlertPanel, EffectHandle, EffectSink, MarkerSpec, TrailSpec};
use crate::world::Point3;

/// A single lifecycle call, in the order it was made
#[derive(Debug, Clone, PartialEq)]
pub enum EffectEvent {
    AlertCreated { handle: EffectHandle, text: String },
    AlertDisposed { handle: EffectHandle, text: String },
    TrailAdded { handle: EffectHandle },
    TrailShown { handle: EffectHandle },
    TrailHidden { handle: EffectHandle },
    TrailRemoved { handle: EffectHandle },
    MarkerAdded { handle: EffectHandle },
    MarkerShown { handle: EffectHandle },
    MarkerHidden { handle: EffectHandle },
    MarkerRemoved { handle: EffectHandle },
    Spoke { text: String },
    SpeechCancelled,
}

#[derive(Debug, Clone)]
pub struct TrailState {
    pub spec: TrailSpec,
    pub origin: Point3,
    pub visible: bool,
}

#[derive(Debug, Clone)]
pub struct MarkerState {
    pub spec: MarkerSpec,
    pub visible: bool,
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    next_handle: u64,
    alerts: BTreeMap<EffectHandle, AlertPanel>,
    trails: BTreeMap<EffectHandle, TrailState>,
    markers: BTreeMap<EffectHandle, MarkerState>,
    spoken: Vec<String>,
    events: Vec<EffectEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> EffectHandle {
        self.next_handle += 1;
        EffectHandle(self.next_handle)
    }

    /// Alert panels that currently exist
    pub fn alerts(&self) -> impl Iterator<Item = &AlertPanel> {
        self.alerts.values()
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.len()
    }

    /// First live panel showing `text`
    pub fn alert_with_text(&self, text: &str) -> Option<&AlertPanel> {
        self.alerts.values().find(|p| p.text == text)
    }

    pub fn trails(&self) -> impl Iterator<Item = &TrailState> {
        self.trails.values()
    }

    pub fn visible_trail_count(&self) -> usize {
        self.trails.values().filter(|t| t.visible).count()
    }

    pub fn markers(&self) -> impl Iterator<Item = &MarkerState> {
        self.markers.values()
    }

    pub fn visible_marker_count(&self) -> usize {
        self.markers.values().filter(|m| m.visible).count()
    }

    /// Everything spoken so far, cancelled or not
    pub fn spoken(&self) -> &[String] {
        &self.spoken
    }

    pub fn events(&self) -> &[EffectEvent] {
        &self.events
    }

    /// Take the events recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<EffectEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EffectSink for RecordingSink {
    fn create_alert(&mut self, panel: &AlertPanel) -> EffectHandle {
        let handle = self.allocate();
        self.alerts.insert(handle, panel.clone());
        self.events.push(EffectEvent::AlertCreated {
            handle,
            text: panel.text.clone(),
        });
        handle
    }

    fn update_alert(&mut self, handle: EffectHandle, panel: &AlertPanel) {
        if let Some(existing) = self.alerts.get_mut(&handle) {
            *existing = panel.clone();
        }
    }

    fn dispose_alert(&mut self, handle: EffectHandle) {
        if let Some(panel) = self.alerts.remove(&handle) {
            self.events.push(EffectEvent::AlertDisposed {
                handle,
                text: panel.text,
            });
        }
    }

    fn add_trail(&mut self, trail: &TrailSpec) -> EffectHandle {
        let handle = self.allocate();
        self.trails.insert(
            handle,
            TrailState {
                spec: trail.clone(),
                origin: Point3::ZERO,
                visible: false,
            },
        );
        self.events.push(EffectEvent::TrailAdded { handle });
        handle
    }

    fn update_trail(&mut self, handle: EffectHandle, origin: Point3, visible: bool) {
        let Some(state) = self.trails.get_mut(&handle) else {
            return;
        };
        state.origin = origin;
        if state.visible != visible {
            state.visible = visible;
            self.events.push(if visible {
                EffectEvent::TrailShown { handle }
            } else {
                EffectEvent::TrailHidden { handle }
            });
        }
    }

    fn remove_trail(&mut self, handle: EffectHandle) {
        if self.trails.remove(&handle).is_some() {
            self.events.push(EffectEvent::TrailRemoved { handle });
        }
    }

    fn add_marker(&mut self, marker: &MarkerSpec) -> EffectHandle {
        let handle = self.allocate();
        self.markers.insert(
            handle,
            MarkerState {
                spec: marker.clone(),
                visible: false,
            },
        );
        self.events.push(EffectEvent::MarkerAdded { handle });
        handle
    }

    fn set_marker_visible(&mut self, handle: EffectHandle, visible: bool) {
        let Some(state) = self.markers.get_mut(&handle) else {
            return;
        };
        if state.visible != visible {
            state.visible = visible;
            self.events.push(if visible {
                EffectEvent::MarkerShown { handle }
            } else {
                EffectEvent::MarkerHidden { handle }
            });
        }
    }

    fn remove_marker(&mut self, handle: EffectHandle) {
        if self.markers.remove(&handle).is_some() {
            self.events.push(EffectEvent::MarkerRemoved { handle });
        }
    }

    fn speak(&mut self, text: &str) {
        self.spoken.push(text.to_string());
        self.events.push(EffectEvent::Spoke {
            text: text.to_string(),
        });
    }

    fn cancel_speech(&mut self) {
        self.events.push(EffectEvent::SpeechCancelled);
    }
}
