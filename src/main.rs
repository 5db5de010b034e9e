use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use anyhow::{bail, Context};
use doudizhu_monitor::capture::{FrameSource, ImageFileSource, WindowCapture};
use doudizhu_monitor::config::Config;
use doudizhu_monitor::detection::{AreaLocator, AssetBundle, TableReader};
use doudizhu_monitor::messaging::{Event, EventBus};
use doudizhu_monitor::{AppResult, MonitorHandle, MonitorLoop};
use rdev::{listen, EventType, Key};
use sysinfo::System;

const LOG_TARGET_STARTUP: &str = "doudizhu_monitor::startup";

/// Initialize tracing with file rotation
///
/// Logs go to `<config dir>/DoudizhuMonitor/logs/doudizhu-monitor.YYYY-MM-DD.log`.
/// Debug builds also log to the console.
fn initialize_tracing() {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = dirs::config_dir()
        .map(|dir| dir.join("DoudizhuMonitor").join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    let file_appender = rolling::daily(&log_dir, "doudizhu-monitor.log");

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true);

    #[cfg(debug_assertions)]
    {
        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer)
            .init();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();
    }

    tracing::info!("Log directory: {}", log_dir.display());
}

fn log_runtime_environment() {
    let version = env!("CARGO_PKG_VERSION");
    let os_name = System::long_os_version()
        .or_else(System::name)
        .unwrap_or_else(|| "Unknown OS".to_string());
    let kernel = System::kernel_version().unwrap_or_else(|| "Unknown Kernel".to_string());
    let architecture = std::env::consts::ARCH;

    tracing::info!(target: LOG_TARGET_STARTUP, "Starting Doudizhu Monitor v{} on ({})", version, architecture);
    tracing::info!(target: LOG_TARGET_STARTUP, "Operating System: {} (kernel {})", os_name, kernel);
    tracing::info!(target: LOG_TARGET_STARTUP, "Config: {}", Config::config_dir_display());
}

fn load_assets(config: &Config) -> AppResult<Arc<AssetBundle>> {
    let dir = config.asset_dir_full_path()?;
    let assets = AssetBundle::load(&dir, &config.geometry)
        .with_context(|| format!("Failed to load templates from {}", dir.display()))?;
    Ok(Arc::new(assets))
}

/// Read every region of one screenshot and print the result
fn probe(config: &Config, path: &Path) -> AppResult<()> {
    let assets = load_assets(config)?;
    let mut source = ImageFileSource::open(path)?;
    let Some(raw) = source.capture()? else {
        bail!("{} produced no frame", path.display());
    };

    let mut locator = AreaLocator::new(
        Arc::clone(&assets),
        config.layout.clone(),
        config.thresholds.show,
        config.thresholds.locate_luminance,
    );
    let Some(located) = locator.locate(&raw) else {
        bail!("No table area found in {}", path.display());
    };
    println!("Table area: {:?}", located.region);

    let reader = TableReader::new(assets, config.layout.clone(), config.thresholds.clone());
    let snapshot = reader.snapshot(&located.frame);
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

/// Ctrl+Shift+Alt+R re-locates the table, Ctrl+Shift+Alt+N forgets the round
fn spawn_hotkeys(handle: Arc<MonitorHandle>) {
    thread::spawn(move || {
        let mut modifier_keys = HashMap::new();

        if let Err(e) = listen(move |event: rdev::Event| match event.event_type {
            EventType::KeyPress(key) => match key {
                Key::ControlLeft | Key::ControlRight | Key::ShiftLeft | Key::ShiftRight | Key::Alt | Key::AltGr => {
                    modifier_keys.insert(key, true);
                }
                Key::KeyR | Key::KeyN => {
                    let held = |keys: &[Key]| keys.iter().any(|k| modifier_keys.contains_key(k));
                    let chord = held(&[Key::ControlLeft, Key::ControlRight])
                        && held(&[Key::ShiftLeft, Key::ShiftRight])
                        && held(&[Key::Alt, Key::AltGr]);
                    if !chord {
                        return;
                    }
                    if key == Key::KeyR {
                        tracing::info!("Hotkey: reset table area");
                        handle.reset_area();
                    } else {
                        tracing::info!("Hotkey: reset game");
                        handle.reset_game();
                    }
                }
                _ => {}
            },
            EventType::KeyRelease(key) => {
                modifier_keys.remove(&key);
            }
            _ => {}
        }) {
            tracing::error!("Error setting up keyboard listener: {:?}", e);
        }
    });
}

fn print_event(event: &Event) {
    match event {
        Event::AreaLocked { region } => println!("Table located at {:?}", region),
        Event::GameStarted {
            landlord,
            own_hand,
            bonus,
        } => println!("Game started: landlord {landlord}, hand {own_hand}, bonus {bonus}"),
        Event::ActionCommitted { action, view } => {
            if action.passed {
                println!("{}: pass", action.seat);
            } else {
                println!("{}: {}", action.seat, action.cards);
            }
            println!("  unseen {}  hands {:?}", view.unseen, view.hand_counts);
        }
        Event::HintReady { seat, hint } => {
            println!("Hint for {seat}: {} ({:.2})", hint.action, hint.confidence)
        }
        Event::AnomalyDetected { seat, reason, .. } => println!("Ignored read for {seat}: {reason}"),
        Event::GameFinished { seat, winner } => println!("Game over: {seat} went out, {winner:?} win"),
        Event::TickFailed { message } => eprintln!("Tick failed: {message}"),
        other => tracing::debug!("Event: {}", other.name()),
    }
}

fn run(config: Config) -> AppResult<()> {
    let assets = load_assets(&config)?;
    let bus = EventBus::new();
    let (events, _) = bus.subscribe();

    let capture = WindowCapture::new(config.window_title.clone());
    let handle = MonitorLoop::new(&config, assets, bus).spawn(capture)?;
    let handle = Arc::new(handle);

    println!("Watching window \"{}\"", config.window_title);
    println!("  Ctrl+Shift+Alt+R  re-locate table");
    println!("  Ctrl+Shift+Alt+N  reset game");
    spawn_hotkeys(Arc::clone(&handle));

    while let Ok(event) = events.recv() {
        if matches!(event, Event::Shutdown) {
            break;
        }
        print_event(&event);
    }
    Ok(())
}

fn main() -> AppResult<()> {
    initialize_tracing();
    log_runtime_environment();

    let config = Config::load().context("Failed to load configuration")?;

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("--probe") => {
            let Some(path) = args.get(2) else {
                bail!("usage: doudizhu-monitor --probe <screenshot.png>");
            };
            probe(&config, Path::new(path))
        }
        Some(other) => bail!("unknown argument: {other}"),
        None => run(config),
    }
}
