//! Headless driver for the navigator.
//!
//! - Parse command-line arguments.
//! - Load user configuration from `conf/config.toml`.
//! - Load the collection and restore its position.
//! - Read scroll commands from stdin until `quit`, EOF or Ctrl-C.

use anyhow::{Context, Result, anyhow};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};
use verse_flight::{
    DeepLinkTarget, FileMedium, HeadlessViewport, Navigator, NavigatorCommand, NavigatorEvent,
    NavigatorConfig, ProgressStore, ThreadFrameScheduler, Viewport, load_collection, load_config,
    serialize_config,
};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;
type SharedNavigator = Arc<Mutex<Navigator<HeadlessViewport>>>;

struct Args {
    collection_path: PathBuf,
    verse: Option<u32>,
}

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let args = parse_args()?;
    let config_path = Path::new("conf/config.toml");
    let config = load_config(config_path);
    if !config_path.exists() {
        write_default_config(config_path, &config);
    }
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        path = %args.collection_path.display(),
        level = %config.log_level,
        cache_dir = %config.cache_dir,
        "Starting verse flight"
    );

    let collection = load_collection(&args.collection_path)?;
    let deep_link = args
        .verse
        .map(|ordinal| DeepLinkTarget::new(collection.key().clone(), ordinal));

    let store = ProgressStore::new(Arc::new(FileMedium::open(config.cache_path())));
    let viewport = HeadlessViewport::new(config.viewport_height, config.content_height());
    let navigator: SharedNavigator = Arc::new(Mutex::new(Navigator::new(
        &config,
        store,
        viewport,
        Box::new(ThreadFrameScheduler),
    )));

    install_interrupt_handler(Arc::clone(&navigator));

    let event = apply(
        &navigator,
        NavigatorCommand::LoadCollection {
            collection,
            deep_link,
        },
    )?;
    report(&event);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read command from stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" {
            break;
        }
        match handle_line(&navigator, line) {
            Ok(Some(event)) => report(&event),
            Ok(None) => {}
            Err(err) => warn!("{err:#}"),
        }
    }

    apply(&navigator, NavigatorCommand::Teardown)?;
    info!("Navigator torn down");
    Ok(())
}

fn handle_line(navigator: &SharedNavigator, line: &str) -> Result<Option<NavigatorEvent>> {
    if line == "snap" {
        let event = apply(navigator, NavigatorCommand::GetSnapshot)?;
        let json = serde_json::to_string_pretty(&event.snapshot)
            .context("Failed to serialize snapshot")?;
        let mut out = io::stdout().lock();
        writeln!(out, "{json}").context("Failed to write snapshot")?;
        return Ok(None);
    }

    if let Some(rest) = line.strip_prefix("load ") {
        let mut parts = rest.split_whitespace();
        let path = parts
            .next()
            .ok_or_else(|| anyhow!("Usage: load <collection.json> [verse]"))?;
        let collection = load_collection(Path::new(path))?;
        let deep_link = parts
            .next()
            .map(|raw| raw.parse::<u32>().with_context(|| format!("Invalid verse: {raw}")))
            .transpose()?
            .map(|ordinal| DeepLinkTarget::new(collection.key().clone(), ordinal));
        let event = apply(
            navigator,
            NavigatorCommand::LoadCollection {
                collection,
                deep_link,
            },
        )?;
        return Ok(Some(event));
    }

    let mut guard = navigator
        .lock()
        .map_err(|_| anyhow!("Navigator lock poisoned"))?;
    let offset = match line.strip_prefix('%') {
        Some(raw) => {
            let fraction: f64 = raw
                .parse()
                .with_context(|| format!("Invalid fraction: {raw}"))?;
            fraction * guard.viewport().max_scroll_offset()
        }
        None => line
            .parse::<f64>()
            .with_context(|| format!("Unknown command: {line}"))?,
    };
    let sample = guard.viewport_mut().user_scroll(offset);
    Ok(Some(guard.apply_command(NavigatorCommand::Scrolled {
        offset: sample.offset,
        max_offset: sample.max_offset,
    })))
}

fn write_default_config(path: &Path, config: &NavigatorConfig) {
    let result = serialize_config(config).and_then(|contents| {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))
    });
    match result {
        Ok(()) => info!(path = %path.display(), "Wrote default config"),
        Err(err) => warn!(path = %path.display(), "Could not write default config: {err:#}"),
    }
}

fn apply(navigator: &SharedNavigator, command: NavigatorCommand) -> Result<NavigatorEvent> {
    let mut guard = navigator
        .lock()
        .map_err(|_| anyhow!("Navigator lock poisoned"))?;
    Ok(guard.apply_command(command))
}

fn report(event: &NavigatorEvent) {
    let snapshot = &event.snapshot;
    if event.hud_changed {
        info!(
            action = event.action,
            label = snapshot.hud.label.as_deref().unwrap_or("-"),
            group = snapshot.hud.group.as_deref().unwrap_or("-"),
            progress_pct = snapshot.hud.progress_pct,
            "Current record"
        );
    } else {
        info!(
            action = event.action,
            progress = snapshot.progress,
            camera_x = snapshot.camera_pose.x,
            "Progress"
        );
    }
}

fn install_interrupt_handler(navigator: SharedNavigator) {
    if let Err(err) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C; tearing down navigator");
        if let Ok(mut guard) = navigator.lock() {
            guard.teardown();
        }
        std::process::exit(130);
    }) {
        warn!("Failed to install Ctrl+C signal handler: {err}");
    }
}

fn parse_args() -> Result<Args> {
    let usage = "Usage: verse-flight <collection.json> [--verse N]";
    let mut collection_path = None;
    let mut verse = None;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--verse" {
            let raw = args.next().ok_or_else(|| anyhow!(usage))?;
            verse = Some(
                raw.parse::<u32>()
                    .with_context(|| format!("Invalid verse: {raw}"))?,
            );
        } else if collection_path.is_none() {
            collection_path = Some(PathBuf::from(arg));
        } else {
            return Err(anyhow!(usage));
        }
    }

    let path = collection_path.ok_or_else(|| anyhow!(usage))?;
    if !path.exists() {
        return Err(anyhow!("File not found: {}", path.display()));
    }
    Ok(Args {
        collection_path: path,
        verse,
    })
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(io::stderr)
                .with_filter(filter_layer),
        )
        .init();
    warn!("Logging initialized; override level with config.log_level or RUST_LOG");
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
