//! Drawing seam. The kernel never rasterizes; it walks its parts and hands
//! each one's state to a host `Canvas`.

use crate::geometry::Point;
use crate::graph::PartId;
use crate::parts::PartState;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    /// Every part, in insertion order.
    Primary,
    /// Drawn after the primary pass, for parts with a foreground (box front).
    Last,
}

pub trait Canvas {
    /// `at` is the absolute position: machine origin plus part offset.
    fn draw(&mut self, layer: Layer, id: PartId, at: Point, state: &PartState);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawCommand {
    pub layer: Layer,
    pub id: PartId,
    pub at: Point,
    pub state: PartState,
}

/// Canvas that records what it was asked to draw.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(transparent)]
pub struct DisplayList {
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Canvas for DisplayList {
    fn draw(&mut self, layer: Layer, id: PartId, at: Point, state: &PartState) {
        self.commands.push(DrawCommand {
            layer,
            id,
            at,
            state: state.clone(),
        });
    }
}
