//! Countdown panels
//!
//! Each timestamp gets its own panel while its window is live:
//!
//! ```text
//!   t - warning          t              t + alert
//!       │── warning fill ──│── alert text ──│
//!       create                              dispose
//! ```

use std::collections::BTreeMap;

use cadence_types::{AlertDefinition, Color};

use super::{TimerBehavior, TimerCommon, colors, parse_color};
use crate::context::EngineContext;
use crate::effects::{AlertPanel, EffectHandle, ResourceProvider, TextureId};
use crate::error::ValidationError;

/// Countdowns below this show one decimal
const PRECISE_COUNTDOWN_SECS: f32 = 5.0;

#[derive(Debug, Clone)]
struct AlertStyle {
    warning_duration: f32,
    alert_duration: f32,
    warning_text: Option<String>,
    alert_text: Option<String>,
    warning_color: Color,
    alert_color: Color,
    fill_color: Color,
    icon: Option<TextureId>,
}

impl AlertStyle {
    /// Panel for timestamp `t` at `elapsed`, or `None` outside its window
    fn panel_at(&self, t: f32, elapsed: f32, visible: bool) -> Option<AlertPanel> {
        let warning = self.warning_duration;
        let active_time = elapsed - (t - warning);

        if active_time < 0.0 || active_time >= warning + self.alert_duration {
            return None;
        }

        if active_time >= warning {
            let text = self
                .alert_text
                .as_ref()
                .or(self.warning_text.as_ref())
                .cloned()
                .unwrap_or_default();
            return Some(AlertPanel {
                text,
                text_color: self.alert_color,
                timer_text: String::new(),
                timer_text_color: colors::WHITE,
                fill: 1.0,
                fill_color: self.fill_color,
                icon: self.icon,
                visible,
            });
        }

        let remaining = warning - active_time;
        let (timer_text, timer_text_color) = if remaining < PRECISE_COUNTDOWN_SECS {
            (format!("{:.1}", remaining), colors::YELLOW)
        } else {
            (format!("{}", remaining.floor() as i64), colors::WHITE)
        };

        Some(AlertPanel {
            text: self.warning_text.clone().unwrap_or_default(),
            text_color: self.warning_color,
            timer_text,
            timer_text_color,
            fill: active_time / warning,
            fill_color: self.fill_color,
            icon: self.icon,
            visible,
        })
    }
}

#[derive(Debug)]
struct LivePanel {
    handle: EffectHandle,
    panel: AlertPanel,
}

#[derive(Debug)]
pub struct AlertTimer {
    pub common: TimerCommon,
    icon_name: String,
    raw_colors: [Option<Vec<f32>>; 3],
    style: AlertStyle,
    /// Live panels keyed by timestamp index
    panels: BTreeMap<usize, LivePanel>,
}

impl AlertTimer {
    pub fn from_definition(def: &AlertDefinition) -> Self {
        Self {
            common: TimerCommon::from_definition(&def.common),
            icon_name: def.icon.clone(),
            raw_colors: [
                def.warning_color.clone(),
                def.alert_color.clone(),
                def.fill_color.clone(),
            ],
            style: AlertStyle {
                warning_duration: def.warning_duration,
                alert_duration: def.alert_duration,
                warning_text: def.warning_text.clone().filter(|s| !s.is_empty()),
                alert_text: def.alert_text.clone().filter(|s| !s.is_empty()),
                warning_color: colors::WHITE,
                alert_color: colors::WHITE,
                fill_color: colors::DARK_GRAY,
                icon: None,
            },
            panels: BTreeMap::new(),
        }
    }

    pub fn warning_duration(&self) -> f32 {
        self.style.warning_duration
    }

    pub fn alert_duration(&self) -> f32 {
        self.style.alert_duration
    }

    pub fn live_panel_count(&self) -> usize {
        self.panels.len()
    }

    fn dispose_panels(&mut self, ctx: &mut EngineContext<'_>) {
        for (_, live) in std::mem::take(&mut self.panels) {
            ctx.effects.dispose_alert(live.handle);
        }
    }
}

impl TimerBehavior for AlertTimer {
    fn common(&self) -> &TimerCommon {
        &self.common
    }

    fn initialize(&mut self, resources: &mut dyn ResourceProvider) -> Result<(), ValidationError> {
        let style = &mut self.style;
        if style.warning_text.is_none() && style.alert_text.is_none() {
            return Err(ValidationError::MissingAlertText {
                name: self.common.name.clone(),
            });
        }
        if style.warning_text.is_none() {
            style.warning_duration = 0.0;
        }
        if style.alert_text.is_none() {
            style.alert_duration = 0.0;
        }
        if style.warning_duration < 0.0 || style.alert_duration < 0.0 {
            return Err(ValidationError::InvalidTimestamps {
                name: self.common.name.clone(),
            });
        }

        self.common.prepare_timestamps()?;

        let [warning, alert, fill] = &self.raw_colors;
        style.warning_color = parse_color(warning.as_deref(), colors::WHITE);
        style.alert_color = parse_color(alert.as_deref(), colors::WHITE);
        style.fill_color = parse_color(fill.as_deref(), colors::DARK_GRAY);

        style.icon = resources
            .icon(&self.icon_name)
            .or_else(|| resources.load_texture(&self.icon_name));

        Ok(())
    }

    fn activate(&mut self, _ctx: &mut EngineContext<'_>) {
        self.common.activated = true;
    }

    fn deactivate(&mut self, ctx: &mut EngineContext<'_>) {
        if !self.common.activated {
            return;
        }
        self.dispose_panels(ctx);
        self.common.activated = false;
    }

    fn stop(&mut self, ctx: &mut EngineContext<'_>) {
        self.dispose_panels(ctx);
    }

    fn update(&mut self, elapsed: f32, ctx: &mut EngineContext<'_>) {
        if !self.common.activated {
            return;
        }

        let visible = ctx.settings.show_alerts;
        for (index, &t) in self.common.timestamps.iter().enumerate() {
            let next = self.style.panel_at(t, elapsed, visible);

            match next {
                Some(panel) => match self.panels.get_mut(&index) {
                    Some(live) => {
                        if live.panel != panel {
                            ctx.effects.update_alert(live.handle, &panel);
                            live.panel = panel;
                        }
                    }
                    None => {
                        let handle = ctx.effects.create_alert(&panel);
                        self.panels.insert(index, LivePanel { handle, panel });
                    }
                },
                None => {
                    if let Some(live) = self.panels.remove(&index) {
                        ctx.effects.dispose_alert(live.handle);
                    }
                }
            }
        }
    }
}
