//! A machine placed on a host timeline.

use crate::factory::MachineSettings;
use crate::system::{MachineSystem, DEFAULT_MACHINE};
use serde::{Deserialize, Serialize};

/// What a host persists for one placed machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSettings {
    #[serde(default)]
    pub start_frame: u32,
    #[serde(default = "default_machine")]
    pub machine: i32,
}

fn default_machine() -> i32 {
    DEFAULT_MACHINE
}

impl Default for InstanceSettings {
    fn default() -> Self {
        Self {
            start_frame: 0,
            machine: DEFAULT_MACHINE,
        }
    }
}

/// Maps host timeline frames onto machine frames. The machine sits at frame
/// zero until the timeline reaches `start_frame`.
#[derive(Debug, Clone)]
pub struct MachineInstance {
    start_frame: u32,
    system: MachineSystem,
}

impl MachineInstance {
    pub fn new(settings: InstanceSettings, machine: MachineSettings) -> Self {
        let mut system = MachineSystem::with_settings(machine);
        system.choose_machine(settings.machine);
        Self {
            start_frame: settings.start_frame,
            system,
        }
    }

    pub fn start_frame(&self) -> u32 {
        self.start_frame
    }

    pub fn set_start_frame(&mut self, frame: u32) {
        self.start_frame = frame;
    }

    pub fn settings(&self) -> InstanceSettings {
        InstanceSettings {
            start_frame: self.start_frame,
            machine: self.system.machine_number(),
        }
    }

    pub fn machine_frame(&self, timeline_frame: u32) -> u32 {
        timeline_frame.saturating_sub(self.start_frame)
    }

    /// Seek to the machine frame matching `timeline_frame`.
    pub fn set_timeline_frame(&mut self, timeline_frame: u32) -> f64 {
        let frame = self.machine_frame(timeline_frame);
        self.system.request_frame(frame)
    }

    pub fn system(&self) -> &MachineSystem {
        &self.system
    }

    pub fn system_mut(&mut self) -> &mut MachineSystem {
        &mut self.system
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::MAX_PENDING_EVENTS;

    #[test]
    fn timeline_before_start_holds_frame_zero() {
        let settings = InstanceSettings {
            start_frame: 60,
            machine: 2,
        };
        let mut instance = MachineInstance::new(settings, MachineSettings::default());
        assert_eq!(instance.set_timeline_frame(10), 0.0);
        assert_eq!(instance.system().frame(), 0);

        instance.set_timeline_frame(90);
        assert_eq!(instance.system().frame(), 30);
        assert_eq!(instance.settings(), settings);
    }

    #[test]
    fn scrubbing_keeps_event_queue_bounded() {
        let settings = InstanceSettings {
            start_frame: 0,
            machine: 2,
        };
        let mut instance = MachineInstance::new(settings, MachineSettings::default());
        for _ in 0..50 {
            instance.set_timeline_frame(600);
            instance.set_timeline_frame(0);
        }
        assert!(instance.system().pending_events() <= MAX_PENDING_EVENTS);
        assert_eq!(instance.system().stats().rewinds, 50);
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let settings: InstanceSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, InstanceSettings::default());

        let settings: InstanceSettings =
            serde_json::from_str(r#"{"start_frame":12,"machine":2}"#).unwrap();
        assert_eq!(settings.start_frame, 12);
        assert_eq!(settings.machine, 2);
    }
}
