use crate::component::{Component, Openable, Signal};
use crate::geometry::Point;
use crate::parts::easing::OpenProgress;
use crate::parts::PartState;
use std::f64::consts::FRAC_PI_2;

/// Vertical lid scale drawn while the lid angle is zero.
pub const LID_ZERO_ANGLE_SCALE: f64 = 0.02;

/// Box with a hinged lid that swings up once opened.
#[derive(Debug, Clone, PartialEq)]
pub struct LidBox {
    position: Point,
    box_size: u32,
    lid_size: u32,
    lid: OpenProgress,
}

impl LidBox {
    pub fn new(box_size: u32, lid_size: u32) -> Self {
        Self {
            position: Point::default(),
            box_size,
            lid_size,
            lid: OpenProgress::new(0.0, FRAC_PI_2),
        }
    }

    pub fn box_size(&self) -> u32 {
        self.box_size
    }

    pub fn lid_size(&self) -> u32 {
        self.lid_size
    }

    /// Lid angle in radians, `0..=PI/2`.
    pub fn lid_angle(&self) -> f64 {
        self.lid.value()
    }

    /// Sine-eased vertical scale for the lid image.
    pub fn lid_scale(&self) -> f64 {
        self.lid.value().sin().max(LID_ZERO_ANGLE_SCALE)
    }
}

impl Component for LidBox {
    fn position(&self) -> Point {
        self.position
    }

    fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    fn advance_by(&mut self, delta: f64, _signals: &mut Vec<Signal>) {
        self.lid.advance(delta);
    }

    fn reset_to_start(&mut self) {
        self.lid.reset();
    }

    fn state(&self) -> PartState {
        PartState::LidBox {
            open: self.lid.is_requested(),
            lid_angle: self.lid_angle(),
            lid_scale: self.lid_scale(),
        }
    }
}

impl Openable for LidBox {
    fn open(&mut self) {
        self.lid.request();
    }

    fn is_open(&self) -> bool {
        self.lid.is_requested()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lid_rises_monotonically_and_stops_at_right_angle() {
        let mut lid_box = LidBox::new(250, 240);
        let mut signals = Vec::new();
        lid_box.open();

        let step = 1.0 / 30.0;
        let mut last = lid_box.lid_angle();
        let mut elapsed = 0.0;
        while lid_box.lid_angle() < FRAC_PI_2 {
            lid_box.advance_by(step, &mut signals);
            elapsed += step;
            assert!(lid_box.lid_angle() >= last);
            assert!(lid_box.lid_angle() <= FRAC_PI_2);
            last = lid_box.lid_angle();
        }
        assert!(elapsed <= 0.25 + step + 1e-9);
        assert!((lid_box.lid_scale() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn closed_lid_keeps_minimum_scale() {
        let lid_box = LidBox::new(250, 240);
        assert_eq!(lid_box.lid_scale(), LID_ZERO_ANGLE_SCALE);
        assert!(!lid_box.is_open());
    }
}
