use crate::component::{Component, Openable, Signal};
use crate::geometry::Point;
use crate::parts::easing::OpenProgress;
use crate::parts::PartState;

/// How far the spring stretches relative to its compressed length.
pub const SPRING_STRETCH: f64 = 6.0;

/// Figure on a compressed spring; pops up out of the box when opened.
#[derive(Debug, Clone, PartialEq)]
pub struct SpringFigure {
    position: Point,
    size: f64,
    spring: OpenProgress,
}

impl SpringFigure {
    pub fn new(size: f64, compressed_length: f64) -> Self {
        Self {
            position: Point::default(),
            size,
            spring: OpenProgress::new(compressed_length, compressed_length * SPRING_STRETCH),
        }
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn spring_length(&self) -> f64 {
        self.spring.value()
    }

    pub fn extended_length(&self) -> f64 {
        self.spring.target()
    }
}

impl Component for SpringFigure {
    fn position(&self) -> Point {
        self.position
    }

    fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    fn advance_by(&mut self, delta: f64, _signals: &mut Vec<Signal>) {
        self.spring.advance(delta);
    }

    fn reset_to_start(&mut self) {
        self.spring.reset();
    }

    fn state(&self) -> PartState {
        PartState::Figure {
            open: self.spring.is_requested(),
            spring_length: self.spring.value(),
        }
    }
}

impl Openable for SpringFigure {
    fn open(&mut self) {
        self.spring.request();
    }

    fn is_open(&self) -> bool {
        self.spring.is_requested()
    }
}
