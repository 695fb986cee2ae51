use crate::component::{Component, RotationSink};
use crate::geometry::Point;
use crate::parts::PartState;

/// Belt pulley. A belted peer turns at `rotation * radius / peer_radius`;
/// the ratio is fixed on the belt edge when the machine is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Pulley {
    position: Point,
    radius: f64,
    rotation: f64,
}

impl Pulley {
    pub fn new(radius: f64) -> Self {
        Self {
            position: Point::default(),
            radius,
            rotation: 0.0,
        }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl Component for Pulley {
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
        PartState::Pulley {
            rotation: self.rotation,
            radius: self.radius,
        }
    }
}

impl RotationSink for Pulley {
    fn set_rotation(&mut self, turns: f64) {
        self.rotation = turns;
    }

    fn rotation(&self) -> f64 {
        self.rotation
    }
}
