use crate::component::{Component, RotationSink, Signal};
use crate::geometry::Point;
use crate::parts::PartState;
use std::f64::consts::TAU;

/// Cam disk diameter in pixels.
pub const CAM_DIAMETER: f64 = 60.0;

/// Diameter of the hole drilled in the disk.
pub const HOLE_SIZE: f64 = 8.0;

/// Rotating disk with one hole. A fixed key rides on top of the disk and
/// drops in when the hole passes under it, firing a trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct Cam {
    position: Point,
    rotation: f64,
    keyed: bool,
}

impl Cam {
    pub fn new() -> Self {
        Self {
            position: Point::default(),
            rotation: 0.0,
            keyed: false,
        }
    }

    /// True while the key is resting in the hole.
    pub fn is_keyed(&self) -> bool {
        self.keyed
    }

    /// Whether the hole faces the key at `turns`.
    pub fn key_in_hole(turns: f64) -> bool {
        let angle = turns * TAU;
        let hole_y = angle.cos() * CAM_DIAMETER / 2.0;
        let hole_height = angle.sin() * HOLE_SIZE;
        hole_y <= -CAM_DIAMETER / 2.0 + hole_height / 2.0
    }
}

impl Default for Cam {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Cam {
    fn position(&self) -> Point {
        self.position
    }

    fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    fn jump_to_time(&mut self, _time: f64, signals: &mut Vec<Signal>) {
        if Self::key_in_hole(self.rotation) {
            if !self.keyed {
                self.keyed = true;
                signals.push(Signal::Trigger);
            }
        } else {
            self.keyed = false;
        }
    }

    fn reset_to_start(&mut self) {
        self.rotation = 0.0;
        self.keyed = false;
    }

    fn state(&self) -> PartState {
        PartState::Cam {
            rotation: self.rotation,
            keyed: self.keyed,
        }
    }
}

impl RotationSink for Cam {
    fn set_rotation(&mut self, turns: f64) {
        self.rotation = turns;
    }

    fn rotation(&self) -> f64 {
        self.rotation
    }
}
