//! Selection and frame seeking around one owned machine.
//!
//! Seeking is replay: a backward request rewinds to time zero and every
//! forward request steps frame by frame, so the state at frame F depends only
//! on the selected machine, the frame rate and F.

use crate::factory::{build_machine, MachineSettings};
use crate::geometry::Point;
use crate::machine::{Machine, MachineEvent, MachineSnapshot};
use crate::render::Canvas;
use log::debug;
use serde::Serialize;
use std::collections::VecDeque;

pub const DEFAULT_MACHINE: i32 = 1;
pub const DEFAULT_FRAME_RATE: f64 = 30.0;
pub const DEFAULT_LOCATION: Point = Point::new(200, 500);
/// Undrained events beyond this drop oldest first.
pub const MAX_PENDING_EVENTS: usize = 1024;

/// Counters over the lifetime of a system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeekStats {
    pub requests: u64,
    pub rewinds: u64,
    pub frames_stepped: u64,
    pub triggers: u64,
    pub notes: u64,
}

/// A machine event stamped with the frame that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameEvent {
    pub frame: u32,
    pub time: f64,
    #[serde(flatten)]
    pub event: MachineEvent,
}

#[derive(Debug, Clone)]
pub struct MachineSystem {
    number: i32,
    frame_rate: f64,
    frame: u32,
    time: f64,
    location: Point,
    flags: u8,
    settings: MachineSettings,
    machine: Machine,
    events: VecDeque<FrameEvent>,
    stats: SeekStats,
}

impl MachineSystem {
    /// Machine 1 at the default location, 30 frames per second.
    pub fn new() -> Self {
        Self::with_settings(MachineSettings::default())
    }

    pub fn with_settings(settings: MachineSettings) -> Self {
        let machine = build_machine(DEFAULT_MACHINE, DEFAULT_LOCATION, &settings);
        Self {
            number: DEFAULT_MACHINE,
            frame_rate: DEFAULT_FRAME_RATE,
            frame: 0,
            time: 0.0,
            location: DEFAULT_LOCATION,
            flags: 0,
            settings,
            machine,
            events: VecDeque::new(),
            stats: SeekStats::default(),
        }
    }

    /// Replace the machine with a fresh build of `number`.
    ///
    /// The frame counter and time are kept; hosts that want the new machine
    /// at its start follow up with `request_frame(0)`.
    pub fn choose_machine(&mut self, number: i32) {
        self.machine = build_machine(number, self.location, &self.settings);
        self.number = number;
        debug!(
            "selected machine {} ({} parts) at frame {}",
            number,
            self.machine.len(),
            self.frame
        );
    }

    /// Settings apply from the next `choose_machine`.
    pub fn set_settings(&mut self, settings: MachineSettings) {
        self.settings = settings;
    }

    pub fn settings(&self) -> &MachineSettings {
        &self.settings
    }

    pub fn set_frame_rate(&mut self, rate: f64) {
        self.frame_rate = rate;
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Bring the machine to `target` and return the machine time there.
    pub fn request_frame(&mut self, target: u32) -> f64 {
        self.stats.requests += 1;

        if target < self.frame {
            debug!("rewind from frame {} to {}", self.frame, target);
            self.stats.rewinds += 1;
            self.frame = 0;
            self.time = 0.0;
            self.machine.reset_to_start();
            self.machine.jump_to_time(self.time);
            self.collect_events();
        }

        let delta = 1.0 / self.frame_rate;
        while self.frame < target {
            self.frame += 1;
            self.time = f64::from(self.frame) / self.frame_rate;
            self.machine.advance_by(delta);
            self.machine.jump_to_time(self.time);
            self.stats.frames_stepped += 1;
            self.collect_events();
        }

        self.time
    }

    fn collect_events(&mut self) {
        for event in self.machine.take_events() {
            match event {
                MachineEvent::Triggered { .. } => self.stats.triggers += 1,
                MachineEvent::Note { .. } => self.stats.notes += 1,
            }
            if self.events.len() == MAX_PENDING_EVENTS {
                self.events.pop_front();
            }
            self.events.push_back(FrameEvent {
                frame: self.frame,
                time: self.time,
                event,
            });
        }
    }

    /// Moves the current machine too.
    pub fn set_location(&mut self, location: Point) {
        self.location = location;
        self.machine.set_origin(location);
    }

    pub fn location(&self) -> Point {
        self.location
    }

    /// Selected number as given, even when it fell back to machine 1.
    pub fn machine_number(&self) -> i32 {
        self.number
    }

    pub fn machine_time(&self) -> f64 {
        self.time
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Stored for hosts; no behavior hangs off these bits.
    pub fn set_development_flags(&mut self, flags: u8) {
        self.flags = flags;
    }

    pub fn development_flags(&self) -> u8 {
        self.flags
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn render<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        self.machine.render(canvas);
    }

    pub fn snapshot(&self) -> MachineSnapshot {
        self.machine.snapshot()
    }

    /// Events since the last drain, oldest first. Hosts that never drain
    /// only see the newest `MAX_PENDING_EVENTS`.
    pub fn drain_events(&mut self) -> Vec<FrameEvent> {
        self.events.drain(..).collect()
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    pub fn stats(&self) -> SeekStats {
        self.stats
    }
}

impl Default for MachineSystem {
    fn default() -> Self {
        Self::new()
    }
}
