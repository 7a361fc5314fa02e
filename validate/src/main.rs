//! Encounter definition validator
//!
//! Loads encounter definitions, reports which ones fail validation, and
//! optionally replays a scripted world trace through the engine:
//! - Realtime mode (1x): Watch cues appear at their actual pace
//! - Accelerated mode: Fast CI validation with checkpoints

mod output;
mod replay;
mod resources;
mod verification;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use cadence_core::{
    EncounterManager, EncounterState, KeyPress, RecordingSink, WorldSnapshot, build_encounters,
    load_dir, load_file,
};
use cadence_types::{EncounterDefinition, EngineSettings};

use crate::output::{CliOutput, OutputLevel};
use crate::replay::{Script, VirtualClock};
use crate::resources::TextureDir;
use crate::verification::{CheckpointVerifier, Expectations, Observation};

// ═══════════════════════════════════════════════════════════════════════════════
// CLI Arguments
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ReplayMode {
    /// 1x speed with actual timing delays
    Realtime,
    /// Fast replay with virtual time (default)
    #[default]
    Accelerated,
}

#[derive(Parser, Debug)]
#[command(name = "cadence-validate")]
#[command(about = "Validate encounter definitions and replay scripted traces")]
#[command(version)]
struct Args {
    /// Definition files (.toml/.json) or directories
    #[arg(short, long, required = true, num_args = 1..)]
    definitions: Vec<PathBuf>,

    /// Directory textures are resolved against (skip the check if unset)
    #[arg(long)]
    textures: Option<PathBuf>,

    /// Engine settings TOML (key binds, visibility toggles)
    #[arg(long)]
    settings: Option<PathBuf>,

    // ─────────────────────────────────────────────────────────────────────────
    // Replay
    // ─────────────────────────────────────────────────────────────────────────
    /// Script TOML to replay through the engine
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Replay mode
    #[arg(long, value_enum, default_value_t = ReplayMode::Accelerated)]
    mode: ReplayMode,

    /// Custom speed multiplier (overrides --mode)
    #[arg(long)]
    speed: Option<f32>,

    // ─────────────────────────────────────────────────────────────────────────
    // Output Mode
    // ─────────────────────────────────────────────────────────────────────────
    /// Quiet mode: summary only
    #[arg(short, long)]
    quiet: bool,

    /// Verbose mode: also show trails and markers
    #[arg(short, long)]
    verbose: bool,

    // ─────────────────────────────────────────────────────────────────────────
    // Verification
    // ─────────────────────────────────────────────────────────────────────────
    /// Path to expectations TOML file for checkpoint verification
    #[arg(long, requires = "script")]
    expect: Option<PathBuf>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Main
// ═══════════════════════════════════════════════════════════════════════════════

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.quiet);

    let output_level = if args.quiet {
        OutputLevel::Quiet
    } else if args.verbose {
        OutputLevel::Verbose
    } else {
        OutputLevel::Normal
    };
    let mut cli = CliOutput::new(output_level);

    let settings = match &args.settings {
        Some(path) => load_settings(path)?,
        None => EngineSettings::default(),
    };

    // Load and validate definitions
    let mut definitions = Vec::new();
    for path in &args.definitions {
        definitions.extend(load_definitions(path)?);
    }
    if definitions.is_empty() {
        return Err("No encounter definitions found".into());
    }
    tracing::debug!(count = definitions.len(), "Loaded definitions");

    let mut textures = TextureDir::new(args.textures.clone());
    let loaded = build_encounters(&definitions, &mut textures);

    for encounter in &loaded.valid {
        cli.encounter_valid(&encounter.id, &encounter.name, encounter.map());
    }
    for encounter in &loaded.invalid {
        cli.encounter_invalid(&encounter.id, &encounter.description);
    }

    let Some(script_path) = &args.script else {
        cli.print_summary(None);
        cli.flush();
        if cli.invalid_count() > 0 {
            std::process::exit(1);
        }
        return Ok(());
    };

    // Replay
    let script = Script::load(script_path)?;
    let mut verifier = match &args.expect {
        Some(path) => Some(CheckpointVerifier::new(Expectations::load(path)?)),
        None => None,
    };

    let epoch = replay_epoch()?;
    let mut clock = match (args.speed, args.mode) {
        (Some(speed), _) => VirtualClock::new(epoch, speed),
        (None, ReplayMode::Realtime) => VirtualClock::realtime(epoch),
        (None, ReplayMode::Accelerated) => VirtualClock::instant(epoch),
    };
    if let Some(description) = &script.meta.description {
        eprintln!("Script: {}", description);
    }
    eprintln!(
        "Replaying {:.1}s ({})",
        script.duration(),
        if clock.is_instant_mode() {
            "accelerated".to_string()
        } else {
            format!("{:.1}x", clock.speed())
        }
    );

    let mut manager = EncounterManager::with_settings(loaded.valid, settings);
    let mut sink = RecordingSink::new();
    let mut last_world = WorldSnapshot::default();
    let mut seen: HashMap<String, EncounterState> = manager
        .encounters()
        .iter()
        .map(|e| (e.id.clone(), e.state()))
        .collect();
    let mut printed = 0;

    for tick in script.timeline() {
        let now = clock.advance_to_secs(tick.at);

        for &key in &tick.keys {
            manager.handle_key_press(KeyPress::new(key), &tick.world, &mut sink);
        }
        manager.update(now, &tick.world, &mut sink);
        last_world = tick.world;

        for event in sink.drain_events() {
            cli.effect(tick.at, &event);
        }
        report_state_changes(&manager, &mut seen, tick.at, &mut cli);

        if let Some(verifier) = verifier.as_mut() {
            let observation = Observation::capture(&manager, &sink);
            while let Some(result) = verifier.check_time(tick.at, &observation) {
                cli.checkpoint(&result);
                printed += 1;
            }
        }
    }

    manager.dispose(&last_world, &mut sink);
    cli.flush();
    tracing::debug!(elapsed = %clock.format_elapsed(), "Replay finished");

    let verification = verifier.map(CheckpointVerifier::finalize);
    if let Some(result) = &verification {
        // Checkpoints past the end of the script
        for unreached in result.results.iter().skip(printed) {
            cli.checkpoint(unreached);
        }
    }
    cli.print_summary(
        verification
            .as_ref()
            .map(|r| (r.checkpoints_passed, r.checkpoints_total)),
    );

    let failed = verification.is_some_and(|r| !r.passed());
    if failed || cli.invalid_count() > 0 {
        std::process::exit(1);
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════════════

/// Install the tracing subscriber. Engine logs go to stderr so they never
/// interleave with the report on stdout. Set `DEBUG_LOGGING=1` for debug
/// output from cadence crates; `RUST_LOG` overrides both.
fn init_logging(quiet: bool) {
    let debug_logging = std::env::var("DEBUG_LOGGING").is_ok();

    let filter_directive = if debug_logging {
        "warn,cadence_core=debug,cadence_validate=debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directive));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(filter)
        .init();
}

fn load_settings(path: &Path) -> Result<EngineSettings, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let settings: EngineSettings = toml::from_str(&content)
        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;
    Ok(settings)
}

fn load_definitions(path: &Path) -> Result<Vec<EncounterDefinition>, Box<dyn std::error::Error>> {
    if path.is_dir() {
        Ok(load_dir(path)?)
    } else {
        Ok(load_file(path)?)
    }
}

/// Fixed replay start so runs are reproducible
fn replay_epoch() -> Result<NaiveDateTime, Box<dyn std::error::Error>> {
    NaiveDate::from_ymd_opt(2026, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| "invalid replay epoch".into())
}

/// Print every encounter whose state moved since the last tick
fn report_state_changes(
    manager: &EncounterManager,
    seen: &mut HashMap<String, EncounterState>,
    secs: f32,
    cli: &mut CliOutput,
) {
    for encounter in manager.encounters() {
        let state = encounter.state();
        let previous = seen.insert(encounter.id.clone(), state);
        if let Some(previous) = previous
            && previous != state
        {
            let phase = encounter
                .is_running()
                .then(|| encounter.current_phase().map(|p| p.name.as_str()))
                .flatten();
            cli.state_change(secs, &encounter.id, previous, state, phase);
        }
    }
}
