use crate::component::{Component, RotationSink};
use crate::geometry::Point;
use crate::parts::PartState;

/// Rigid shaft. Passes its rotation unchanged to whatever it drives.
#[derive(Debug, Clone, PartialEq)]
pub struct Shaft {
    position: Point,
    diameter: u32,
    length: u32,
    rotation: f64,
}

impl Shaft {
    pub fn new(diameter: u32, length: u32) -> Self {
        Self {
            position: Point::default(),
            diameter,
            length,
            rotation: 0.0,
        }
    }

    pub fn diameter(&self) -> u32 {
        self.diameter
    }

    pub fn length(&self) -> u32 {
        self.length
    }
}

impl Component for Shaft {
    fn position(&self) -> Point {
        self.position
    }

    fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    fn reset_to_start(&mut self) {
        self.rotation = 0.0;
    }

    fn state(&self) -> PartState {
        PartState::Shaft {
            rotation: self.rotation,
            diameter: self.diameter,
            length: self.length,
        }
    }
}

impl RotationSink for Shaft {
    fn set_rotation(&mut self, turns: f64) {
        self.rotation = turns;
    }

    fn rotation(&self) -> f64 {
        self.rotation
    }
}
