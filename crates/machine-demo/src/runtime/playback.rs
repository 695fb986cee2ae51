use crate::infra::recorder::{EventRecorder, RecordKind};
use crate::runtime::telemetry;
use crate::script::Task;
use machine_core::{DisplayList, FrameEvent, MachineEvent, MachineSystem, PlaybackClock};
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Longest single sleep while playing, so `stop` is seen promptly.
const PLAY_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Serialize)]
struct Capture<'a> {
    machine: i32,
    frame: u32,
    time: f64,
    draw: &'a DisplayList,
}

/// Drives a shared system from the viewer side: seeks, playback, scripts.
/// Every call takes the lock once and releases it before recording.
pub struct Driver {
    system: Arc<Mutex<MachineSystem>>,
    recorder: Option<Arc<EventRecorder>>,
    clock: PlaybackClock,
}

impl Driver {
    pub fn new(
        system: Arc<Mutex<MachineSystem>>,
        recorder: Option<Arc<EventRecorder>>,
        clock: PlaybackClock,
    ) -> Self {
        Self {
            system,
            recorder,
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MachineSystem> {
        self.system
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn seek(&self, frame: u32) -> f64 {
        let (time, events) = {
            let mut system = self.lock();
            let before = system.stats();
            let time = system.request_frame(frame);
            telemetry::observe(&system, before);
            (time, system.drain_events())
        };
        self.report(&events);
        time
    }

    /// Select `number` and rewind it, as the demo host does after a selection.
    pub fn select(&self, number: i32) {
        self.lock().choose_machine(number);
        info!(machine = number, "Machine selected");
        self.record(
            RecordKind::MachineSelected,
            serde_json::json!({ "machine": number }),
        );
        self.seek(0);
    }

    /// Step in real time until `until`, or until `stop` is raised.
    pub fn play(&self, until: u32, stop: &AtomicBool) {
        let clock = PlaybackClock::new();
        let rate = self.lock().frame_rate();
        info!(until, rate, "Playing");

        loop {
            let frame = clock.frame_at(rate).min(until);
            self.seek(frame);
            if frame >= until || stop.load(Ordering::Relaxed) {
                break;
            }
            thread::sleep(clock.until_frame(frame + 1, rate).min(PLAY_POLL));
        }
    }

    pub fn capture(&self, path: Option<&Path>) -> std::io::Result<()> {
        let text = {
            let system = self.lock();
            let mut draw = DisplayList::new();
            system.render(&mut draw);
            let capture = Capture {
                machine: system.machine_number(),
                frame: system.frame(),
                time: system.machine_time(),
                draw: &draw,
            };
            serde_json::to_string_pretty(&capture)?
        };

        match path {
            Some(path) => {
                std::fs::write(path, &text)?;
                info!(path = %path.display(), "Display list written");
            }
            None => println!("{text}"),
        }
        self.record(
            RecordKind::Capture,
            serde_json::json!({ "path": path.map(|p| p.display().to_string()) }),
        );
        Ok(())
    }

    /// Run tasks in order. Returns true when the script asked to exit.
    pub fn run_script(&self, tasks: &[Task]) -> Result<bool, super::app::RunError> {
        for task in tasks {
            debug!(?task, "Script task");
            match task {
                Task::Machine(number) => self.select(*number),
                Task::Frame(frame) => {
                    let time = self.seek(*frame);
                    info!(frame, time, "Frame reached");
                }
                Task::Rate(rate) => self.lock().set_frame_rate(*rate),
                Task::Location(point) => self.lock().set_location(*point),
                Task::Flags(flags) => self.lock().set_development_flags(*flags),
                Task::Capture(path) => self.capture(path.as_deref())?,
                Task::Exit => return Ok(true),
            }
        }
        Ok(false)
    }

    fn report(&self, events: &[FrameEvent]) {
        for stamped in events {
            match &stamped.event {
                MachineEvent::Triggered { cam, target } => info!(
                    frame = stamped.frame,
                    cam = %cam,
                    target = %target,
                    "Trigger fired"
                ),
                MachineEvent::Note { pitch, beat, .. } => debug!(
                    frame = stamped.frame,
                    pitch = %pitch,
                    beat,
                    "Note played"
                ),
            }
            match serde_json::to_value(stamped) {
                Ok(details) => self.record(RecordKind::MachineEvent, details),
                Err(err) => warn!(error = %err, "Could not encode machine event"),
            }
        }
    }

    pub fn record(&self, kind: RecordKind, details: serde_json::Value) {
        if let Some(recorder) = &self.recorder {
            if let Err(err) =
                recorder.record_event(self.clock.now_us(), self.clock.unix_us(), kind, details)
            {
                warn!(error = %err, "Failed to write session record");
            }
        }
    }
}
