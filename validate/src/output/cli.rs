//! Colored CLI output for engine events
//!
//! Formats encounter validation, state changes and effect events with
//! colored output for easy visual parsing.

use cadence_core::{EffectEvent, EncounterState};
use std::io::{self, Write};

use crate::verification::checkpoint::CheckpointResult;

/// Output verbosity level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum OutputLevel {
    /// Only show summary at end
    Quiet,
    /// Show alerts, speech and state changes (default)
    #[default]
    Normal,
    /// Also show trails and markers
    Verbose,
}

/// CLI output formatter with color support
#[derive(Debug)]
pub struct CliOutput {
    level: OutputLevel,
    use_colors: bool,
    encounters_valid: u32,
    encounters_invalid: u32,
    alerts_shown: u32,
    lines_spoken: u32,
    state_changes: u32,
}

impl Default for CliOutput {
    fn default() -> Self {
        Self::new(OutputLevel::Normal)
    }
}

impl CliOutput {
    pub fn new(level: OutputLevel) -> Self {
        Self {
            level,
            use_colors: atty::is(atty::Stream::Stdout),
            encounters_valid: 0,
            encounters_invalid: 0,
            alerts_shown: 0,
            lines_spoken: 0,
            state_changes: 0,
        }
    }

    pub fn invalid_count(&self) -> u32 {
        self.encounters_invalid
    }

    /// Format script seconds as MM:SS.ms
    pub fn format_time(&self, secs: f32) -> String {
        let mins = (secs / 60.0).floor() as u32;
        format!("{:02}:{:05.2}", mins, secs % 60.0)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ANSI Color Codes
    // ═══════════════════════════════════════════════════════════════════════════

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.paint("32", text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint("33", text)
    }

    fn red(&self, text: &str) -> String {
        self.paint("31", text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint("36", text)
    }

    fn magenta(&self, text: &str) -> String {
        self.paint("35", text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    fn bold(&self, text: &str) -> String {
        self.paint("1", text)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Validation Output
    // ═══════════════════════════════════════════════════════════════════════════

    /// Log an encounter that passed validation
    pub fn encounter_valid(&mut self, id: &str, name: &str, map: u32) {
        self.encounters_valid += 1;
        if self.level < OutputLevel::Normal {
            return;
        }

        let label = self.green("OK");
        let id = self.dim(&format!("[{}]", id));
        println!("{:>7} \"{}\" map {} {}", label, name, map, id);
    }

    /// Log an encounter that failed validation. Always printed.
    pub fn encounter_invalid(&mut self, id: &str, reason: &str) {
        self.encounters_invalid += 1;

        let label = self.red("INVALID");
        println!("{} {}: {}", label, self.bold(id), reason);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Replay Output
    // ═══════════════════════════════════════════════════════════════════════════

    /// Log encounter state transition
    pub fn state_change(
        &mut self,
        secs: f32,
        encounter_id: &str,
        from: EncounterState,
        to: EncounterState,
        phase: Option<&str>,
    ) {
        self.state_changes += 1;
        if self.level < OutputLevel::Normal {
            return;
        }

        let time_str = self.format_time(secs);
        let marker = self.cyan("~~~");
        let label = self.cyan("STATE:");
        let phase = phase
            .map(|p| self.dim(&format!("({})", p)))
            .unwrap_or_default();

        println!(
            "[{}] {} {} {} {:?} → {} {}",
            time_str,
            marker,
            label,
            encounter_id,
            from,
            self.bold(&format!("{:?}", to)),
            phase
        );
    }

    /// Log one effect sink call
    pub fn effect(&mut self, secs: f32, event: &EffectEvent) {
        let (marker, line, min_level) = match event {
            EffectEvent::AlertCreated { text, .. } => {
                self.alerts_shown += 1;
                (self.red("!!!"), format!("{} \"{}\"", self.red("ALERT:"), text), OutputLevel::Normal)
            }
            EffectEvent::AlertDisposed { text, .. } => (
                self.dim("<--"),
                format!("{} \"{}\"", self.dim("ALERT GONE:"), text),
                OutputLevel::Normal,
            ),
            EffectEvent::Spoke { text } => {
                self.lines_spoken += 1;
                (self.magenta(">>>"), format!("{} \"{}\"", self.magenta("SAY:"), text), OutputLevel::Normal)
            }
            EffectEvent::SpeechCancelled => (self.dim("x--"), self.dim("SPEECH CANCELLED"), OutputLevel::Verbose),
            EffectEvent::TrailShown { handle } => (
                self.green("-->"),
                format!("{} #{}", self.green("TRAIL SHOWN:"), handle.0),
                OutputLevel::Verbose,
            ),
            EffectEvent::TrailHidden { handle } => (
                self.yellow("<--"),
                format!("{} #{}", self.yellow("TRAIL HIDDEN:"), handle.0),
                OutputLevel::Verbose,
            ),
            EffectEvent::MarkerShown { handle } => (
                self.green("-->"),
                format!("{} #{}", self.green("MARKER SHOWN:"), handle.0),
                OutputLevel::Verbose,
            ),
            EffectEvent::MarkerHidden { handle } => (
                self.yellow("<--"),
                format!("{} #{}", self.yellow("MARKER HIDDEN:"), handle.0),
                OutputLevel::Verbose,
            ),
            EffectEvent::TrailAdded { .. }
            | EffectEvent::TrailRemoved { .. }
            | EffectEvent::MarkerAdded { .. }
            | EffectEvent::MarkerRemoved { .. } => return,
        };

        if self.level < min_level {
            return;
        }
        println!("[{}] {} {}", self.format_time(secs), marker, line);
    }

    /// Log checkpoint verification result
    pub fn checkpoint(&self, result: &CheckpointResult) {
        if self.level < OutputLevel::Normal && result.passed {
            return;
        }

        let time_str = self.format_time(result.at_secs);
        if result.passed {
            println!(
                "[{}] {} checkpoint #{}",
                time_str,
                self.green("PASS"),
                result.checkpoint_idx + 1
            );
        } else {
            println!(
                "[{}] {} checkpoint #{}",
                time_str,
                self.red("FAIL"),
                result.checkpoint_idx + 1
            );
            for failure in &result.failures {
                println!("         {}", self.red(failure));
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Summary Report
    // ═══════════════════════════════════════════════════════════════════════════

    /// Print final summary
    pub fn print_summary(&self, checkpoints_passed: Option<(u32, u32)>) {
        let line = "═".repeat(51);
        println!();
        println!("{}", line);
        println!("  ENCOUNTER VALIDATION SUMMARY");
        println!("{}", line);
        println!("Valid:           {}", self.encounters_valid);
        println!(
            "Invalid:         {}",
            if self.encounters_invalid > 0 {
                self.red(&self.encounters_invalid.to_string())
            } else {
                "0".to_string()
            }
        );
        println!("Alerts Shown:    {}", self.alerts_shown);
        println!("Lines Spoken:    {}", self.lines_spoken);
        println!("State Changes:   {}", self.state_changes);

        if let Some((passed, total)) = checkpoints_passed {
            let status = if passed == total {
                self.green(&format!("PASSED ({}/{})", passed, total))
            } else {
                self.red(&format!("FAILED ({}/{})", passed, total))
            };
            println!("Verification:    {}", status);
        }
        println!("{}", line);
    }

    /// Flush stdout
    pub fn flush(&self) {
        let _ = io::stdout().flush();
    }
}
