use crate::component::{Component, Signal};
use crate::geometry::Point;
use crate::parts::PartState;

/// Hand crank: the only authority on rotation in a machine.
///
/// Rotation is a pure function of absolute time, `time * speed`, recomputed
/// and broadcast on every update pass. Advancing by a delta does nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct Crank {
    position: Point,
    speed: f64,
    rotation: f64,
}

impl Crank {
    /// `speed` is in turns per second.
    pub fn new(speed: f64) -> Self {
        Self {
            position: Point::default(),
            speed,
            rotation: 0.0,
        }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }
}

impl Component for Crank {
    fn position(&self) -> Point {
        self.position
    }

    fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    fn jump_to_time(&mut self, time: f64, signals: &mut Vec<Signal>) {
        self.rotation = time * self.speed;
        signals.push(Signal::Rotation(self.rotation));
    }

    fn reset_to_start(&mut self) {
        self.rotation = 0.0;
    }

    fn state(&self) -> PartState {
        PartState::Crank {
            rotation: self.rotation,
            speed: self.speed,
        }
    }
}
