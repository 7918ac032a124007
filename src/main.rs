// Round Analytics - Session Binary
// Manual round entry over stdin with live scoring, pattern detection,
// JSON session snapshots and an optional CSV audit log.

use anyhow::{Context, Result};
use round_analytics::config::{Config, MonitoringConfig};
use round_analytics::engine::RoundEngine;
use round_analytics::round_log::{RoundLogEntry, RoundLogger};
use round_analytics::snapshot::SessionSnapshot;
use round_analytics::types::QuickCategory;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::{IntervalStream, LinesStream};
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Config before logging: the log format depends on it
    let (config, config_loaded) = match Config::load_or_default() {
        Ok(cfg) => (cfg, true),
        Err(_) => (Config::default(), false),
    };
    init_logging(&config.monitoring);

    info!("🚀 Round Analytics Engine Starting...");
    info!("   ✅ Piecewise scoring + cumulative momentum");
    info!("   ✅ Pink / danger pattern detection");
    info!("   ✅ Atomic JSON session snapshots");

    if config_loaded {
        info!("⚙️  Configuration loaded");
    } else {
        warn!("⚠️  No config file found, using built-in defaults");
    }
    info!(
        "⚙️  Engine: pink_threshold={}, min_multiplier={}, policy={:?}, display_window={}",
        config.engine.pink_threshold,
        config.engine.min_multiplier,
        config.engine.out_of_range,
        config.engine.display_window
    );

    // Restore the previous session if snapshots are enabled
    let engine = if config.snapshot.enabled {
        match SessionSnapshot::load(&config.snapshot.path)? {
            Some(snapshot) => {
                let engine = snapshot.into_engine(config.engine.clone());
                info!(
                    "▶️  Session resumed: {} rounds, {} pinks",
                    engine.total_rounds(),
                    engine.pink_zones().len()
                );
                engine
            }
            None => RoundEngine::with_settings(config.engine.clone()),
        }
    } else {
        info!("ℹ️  Snapshots: DISABLED in config");
        RoundEngine::with_settings(config.engine.clone())
    };
    let engine = Arc::new(Mutex::new(engine));

    let round_logger = if config.round_log.enabled {
        Some(RoundLogger::new(&config.round_log.path)?)
    } else {
        None
    };

    if config.snapshot.enabled {
        let _autosave_handle = spawn_autosave(
            engine.clone(),
            config.snapshot.path.clone(),
            config.snapshot.autosave_secs,
        );
        info!(
            "💾 Autosave: every {}s → {}",
            config.snapshot.autosave_secs, config.snapshot.path
        );
    }

    info!("👂 Ready. Commands: <multiplier> | quick blue|purple|pink | threshold <x> | window <n> | show | save | reset | quit");

    run_command_loop(engine, &config, round_logger).await?;

    info!("👋 Shutting down");
    Ok(())
}

/// Read newline-delimited commands until EOF or quit. Piping a file in
/// replays a recorded sequence through the same path as live entry.
async fn run_command_loop(
    engine: Arc<Mutex<RoundEngine>>,
    config: &Config,
    mut round_logger: Option<RoundLogger>,
) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = LinesStream::new(stdin.lines());
    let mut rounds_since_save = 0u64;

    while let Some(line) = lines.next().await {
        let line = line.context("Failed to read from stdin")?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let command = match Command::parse(input) {
            Ok(cmd) => cmd,
            Err(usage) => {
                warn!("❓ {}", usage);
                continue;
            }
        };

        let flow = handle_command(
            command,
            &engine,
            config,
            &mut round_logger,
            &mut rounds_since_save,
        )?;
        if flow == Flow::Quit {
            break;
        }
    }

    // Persist whatever we have before going down
    if config.snapshot.enabled {
        save_session(&engine.lock().unwrap(), &config.snapshot.path);
        info!("💾 Final snapshot saved: {}", config.snapshot.path);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

fn handle_command(
    command: Command,
    engine: &Arc<Mutex<RoundEngine>>,
    config: &Config,
    round_logger: &mut Option<RoundLogger>,
    rounds_since_save: &mut u64,
) -> Result<Flow> {
    match command {
        Command::Submit(multiplier) => {
            let mut engine = engine.lock().unwrap();
            match engine.submit(multiplier) {
                Ok(state) => {
                    info!(
                        "🎯 Round {}: {:.2}x | total {} | 🌸 {} | ⚡ {}%",
                        state.total_rounds() - 1,
                        multiplier,
                        state.total_rounds(),
                        state.pink_count(),
                        state.danger_level_pct()
                    );
                    if state.danger_alert() {
                        warn!(
                            "🚨 DANGER ZONE: {} active window(s)",
                            state.danger_zones.len()
                        );
                    }
                    if let Some(logger) = round_logger.as_mut() {
                        if let Some(entry) = RoundLogEntry::latest(&engine) {
                            if let Err(e) = logger.log_round(&entry) {
                                warn!("Failed to write round log: {}", e);
                            }
                        }
                    }
                    *rounds_since_save += 1;
                    if config.snapshot.enabled
                        && *rounds_since_save >= config.snapshot.save_every_rounds
                    {
                        save_session(&engine, &config.snapshot.path);
                        *rounds_since_save = 0;
                    }
                }
                Err(e) => warn!("❌ Rejected: {}", e),
            }
        }
        Command::Quick(category) => {
            let mut engine = engine.lock().unwrap();
            let state = engine.submit_quick(category);
            info!(
                "⚡ Quick {}: {} entries logged",
                category.as_str(),
                state.quick_entries.len()
            );
        }
        Command::Reset => {
            let mut engine = engine.lock().unwrap();
            engine.reset();
            // Persist the cleared state so a restart does not resurrect it
            if config.snapshot.enabled {
                save_session(&engine, &config.snapshot.path);
            }
            *rounds_since_save = 0;
        }
        Command::Threshold(value) => {
            engine.lock().unwrap().set_pink_threshold(value);
        }
        Command::Window(value) => {
            engine.lock().unwrap().set_display_window(value);
            info!("🪟 Display window set to {}", value);
        }
        Command::Show => show_state(&engine.lock().unwrap()),
        Command::Save => {
            save_session(&engine.lock().unwrap(), &config.snapshot.path);
            *rounds_since_save = 0;
        }
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn show_state(engine: &RoundEngine) {
    let state = engine.state();
    info!(
        "📊 Session: {} rounds | phase {} | 🌸 {} pinks | ⚡ danger {}%",
        state.total_rounds(),
        state.phase().as_str(),
        state.pink_count(),
        state.danger_level_pct()
    );
    if state.rounds.is_empty() {
        return;
    }

    let window = engine.settings().display_window;
    let start = state.rounds.len().saturating_sub(window);
    info!("   Recent rounds: {:?}", &state.rounds[start..]);

    let momentum = state.momentum.last().copied().unwrap_or(0.0);
    let smoothed = state.smoothed_momentum.last().copied().unwrap_or(0.0);
    info!("   Momentum: {:+.3} (smoothed {:+.3})", momentum, smoothed);

    if !state.danger_zones.is_empty() {
        info!("   Danger windows end at: {:?}", state.danger_zones);
    }
    if !state.quick_entries.is_empty() {
        info!("   Quick entries: {}", state.quick_entries.len());
    }
}

fn save_session(engine: &RoundEngine, path: &str) {
    let snapshot = SessionSnapshot::from_engine(engine);
    match snapshot.save(path) {
        Ok(_) => debug!("💾 Session saved: {} rounds", snapshot.rounds.len()),
        Err(e) => warn!("Failed to save session: {}", e),
    }
}

/// Background autosave so a crash loses at most one interval of entries.
fn spawn_autosave(
    engine: Arc<Mutex<RoundEngine>>,
    path: String,
    interval_secs: u64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut ticks = IntervalStream::new(interval);

        while ticks.next().await.is_some() {
            let snapshot = {
                let engine = engine.lock().unwrap();
                SessionSnapshot::from_engine(&engine)
            };
            if let Err(e) = snapshot.save(&path) {
                warn!("Failed to autosave session: {}", e);
            } else {
                debug!("💾 Autosaved session ({} rounds)", snapshot.rounds.len());
            }
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Submit(f64),
    Quick(QuickCategory),
    Reset,
    Threshold(f64),
    Window(usize),
    Show,
    Save,
    Quit,
}

impl Command {
    fn parse(input: &str) -> Result<Self, String> {
        let mut parts = input.split_whitespace();
        let head = match parts.next() {
            Some(h) => h,
            None => return Err("empty command".to_string()),
        };

        match head.to_ascii_lowercase().as_str() {
            "submit" => {
                let value = parts
                    .next()
                    .ok_or_else(|| "usage: submit <multiplier>".to_string())?;
                let multiplier = value
                    .parse::<f64>()
                    .map_err(|_| format!("not a multiplier: {}", value))?;
                Ok(Command::Submit(multiplier))
            }
            "quick" => {
                let value = parts
                    .next()
                    .ok_or_else(|| "usage: quick blue|purple|pink".to_string())?;
                QuickCategory::parse(value)
                    .map(Command::Quick)
                    .ok_or_else(|| format!("unknown category: {}", value))
            }
            "threshold" => {
                let value = parts
                    .next()
                    .ok_or_else(|| "usage: threshold <multiplier>".to_string())?;
                let threshold = value
                    .parse::<f64>()
                    .map_err(|_| format!("not a multiplier: {}", value))?;
                if !threshold.is_finite() || threshold <= 0.0 {
                    return Err("threshold must be a positive number".to_string());
                }
                Ok(Command::Threshold(threshold))
            }
            "window" => {
                let value = parts
                    .next()
                    .ok_or_else(|| "usage: window <rounds>".to_string())?;
                let window = value
                    .parse::<usize>()
                    .map_err(|_| format!("not a round count: {}", value))?;
                if window == 0 {
                    return Err("window must be at least 1".to_string());
                }
                Ok(Command::Window(window))
            }
            "reset" => Ok(Command::Reset),
            "show" => Ok(Command::Show),
            "save" => Ok(Command::Save),
            "quit" | "exit" => Ok(Command::Quit),
            other => match other.parse::<f64>() {
                Ok(multiplier) => Ok(Command::Submit(multiplier)),
                Err(_) => Err(format!(
                    "unknown command: {} (try a multiplier, quick, threshold, window, show, save, reset, quit)",
                    other
                )),
            },
        }
    }
}

fn init_logging(monitoring: &MonitoringConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&monitoring.log_level));

    if monitoring.json_logs {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .init();
    }
}
