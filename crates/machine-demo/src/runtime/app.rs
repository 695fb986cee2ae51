use crate::infra::recorder::{EventRecorder, RecordKind};
use crate::runtime::config::{RuntimeConfig, DEFAULT_PLAY_FRAMES};
use crate::runtime::logging::init_tracing;
use crate::runtime::playback::Driver;
use crate::runtime::telemetry;
use crate::script::{self, ScriptError};
use machine_core::{MachineSettings, MachineSystem, PlaybackClock, Song, SongError};
use machine_io::bridge::{run_bridge, BridgeConfig};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("cannot load song {path}: {source}")]
    Song { path: PathBuf, source: SongError },
    #[error("bad script: {0}")]
    Script(#[from] ScriptError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub fn run_from_args() {
    let config = RuntimeConfig::from_env();
    if config.show_help {
        RuntimeConfig::print_help();
        return;
    }
    if let Err(e) = run(config) {
        error!(error = %e, "machine-demo failed");
        eprintln!("machine-demo: {e}");
        std::process::exit(1);
    }
}

pub fn run(config: RuntimeConfig) -> Result<(), RunError> {
    // Hold the guard so the log file is flushed on return
    let _log_guard = init_tracing(config.json_logs, config.log_dir.as_deref());

    telemetry::init();
    let _metrics_handle = telemetry::start_metrics_server(&config.metrics_addr);

    let clock = PlaybackClock::new();
    let settings = MachineSettings {
        crank_speed: config.crank_speed,
        song: Arc::new(load_song(config.song_path.as_deref())?),
    };

    let mut system = MachineSystem::with_settings(settings);
    system.set_frame_rate(config.frame_rate);
    system.set_development_flags(config.flags);
    if let Some(location) = config.location {
        system.set_location(location);
    }
    let system = Arc::new(Mutex::new(system));

    let recorder = init_recorder(config.record_path.as_ref())?;
    let driver = Driver::new(Arc::clone(&system), recorder, clock);
    driver.record(
        RecordKind::SessionStart,
        serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "machine": config.machine,
            "frame_rate": config.frame_rate,
            "crank_speed": config.crank_speed,
        }),
    );
    driver.select(config.machine);

    let stop = Arc::new(AtomicBool::new(false));
    let bridge_handle = config.bind_addr.as_ref().map(|addr| {
        let bridge_config = BridgeConfig {
            bind_addr: addr.clone(),
            require_handshake: config.require_handshake,
            ..Default::default()
        };
        let system_bridge = Arc::clone(&system);
        let stop_bridge = Arc::clone(&stop);
        info!(addr = %addr, "Starting bridge");
        thread::spawn(move || run_bridge(system_bridge, bridge_config, stop_bridge))
    });

    let mut exit_requested = false;
    if let Some(text) = &config.script {
        let tasks = script::parse(text)?;
        info!(tasks = tasks.len(), "Running script");
        exit_requested = driver.run_script(&tasks)?;
    } else if config.play {
        driver.play(config.frames.unwrap_or(DEFAULT_PLAY_FRAMES), &stop);
    } else if let Some(frames) = config.frames {
        let time = driver.seek(frames);
        info!(frame = frames, time, "Frame reached");
    }

    if let Some(handle) = bridge_handle {
        if exit_requested {
            stop.store(true, Ordering::Relaxed);
        } else {
            info!("Serving bridge until the process is stopped");
        }
        match handle.join() {
            Ok(result) => result?,
            Err(_) => warn!("Bridge thread panicked"),
        }
    }

    let (stats, frame, time) = {
        let system = system.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        (system.stats(), system.frame(), system.machine_time())
    };
    info!(
        requests = stats.requests,
        rewinds = stats.rewinds,
        frames_stepped = stats.frames_stepped,
        triggers = stats.triggers,
        notes = stats.notes,
        "Run complete"
    );
    driver.record(
        RecordKind::SessionEnd,
        serde_json::json!({ "frame": frame, "time": time, "stats": stats }),
    );
    Ok(())
}

fn load_song(path: Option<&Path>) -> Result<Song, RunError> {
    let Some(path) = path else {
        return Ok(Song::builtin());
    };
    let text = std::fs::read_to_string(path)?;
    let song = Song::from_json(&text).map_err(|source| RunError::Song {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), notes = song.len(), "Song loaded");
    Ok(song)
}

fn init_recorder(path: Option<&PathBuf>) -> Result<Option<Arc<EventRecorder>>, RunError> {
    let Some(path) = path else {
        return Ok(None);
    };
    match EventRecorder::new(path) {
        Ok(recorder) => {
            info!(path = %path.display(), "Session recording enabled");
            Ok(Some(Arc::new(recorder)))
        }
        Err(e) => {
            warn!(error = %e, path = %path.display(), "Failed to open session record");
            Err(e.into())
        }
    }
}
