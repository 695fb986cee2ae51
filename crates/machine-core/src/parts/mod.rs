//! The stock mechanical parts and the `Part` enum a machine stores them in.

mod cam;
mod crank;
pub mod easing;
mod figure;
mod lid_box;
mod music_box;
mod pulley;
mod shaft;

pub use cam::{Cam, CAM_DIAMETER, HOLE_SIZE};
pub use crank::Crank;
pub use figure::{SpringFigure, SPRING_STRETCH};
pub use lid_box::{LidBox, LID_ZERO_ANGLE_SCALE};
pub use music_box::{MusicBox, BEATS_PER_ROTATION};
pub use pulley::Pulley;
pub use shaft::Shaft;

use crate::component::{Component, Openable, RotationSink, Signal};
use crate::geometry::Point;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartKind {
    Crank,
    Shaft,
    Pulley,
    Cam,
    LidBox,
    Figure,
    MusicBox,
}

impl PartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crank => "crank",
            Self::Shaft => "shaft",
            Self::Pulley => "pulley",
            Self::Cam => "cam",
            Self::LidBox => "lid_box",
            Self::Figure => "figure",
            Self::MusicBox => "music_box",
        }
    }

    /// Parts allowed at the tail of a drive edge.
    pub fn is_rotation_source(&self) -> bool {
        matches!(self, Self::Crank | Self::Shaft | Self::Pulley)
    }
}

/// Drawable state of one part.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PartState {
    Crank {
        rotation: f64,
        speed: f64,
    },
    Shaft {
        rotation: f64,
        diameter: u32,
        length: u32,
    },
    Pulley {
        rotation: f64,
        radius: f64,
    },
    Cam {
        rotation: f64,
        keyed: bool,
    },
    LidBox {
        open: bool,
        lid_angle: f64,
        lid_scale: f64,
    },
    Figure {
        open: bool,
        spring_length: f64,
    },
    MusicBox {
        rotation: f64,
        next_note: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Crank(Crank),
    Shaft(Shaft),
    Pulley(Pulley),
    Cam(Cam),
    LidBox(LidBox),
    Figure(SpringFigure),
    MusicBox(MusicBox),
}

macro_rules! each_part {
    ($part:expr, $inner:ident => $body:expr) => {
        match $part {
            Part::Crank($inner) => $body,
            Part::Shaft($inner) => $body,
            Part::Pulley($inner) => $body,
            Part::Cam($inner) => $body,
            Part::LidBox($inner) => $body,
            Part::Figure($inner) => $body,
            Part::MusicBox($inner) => $body,
        }
    };
}

impl Part {
    pub fn kind(&self) -> PartKind {
        match self {
            Self::Crank(_) => PartKind::Crank,
            Self::Shaft(_) => PartKind::Shaft,
            Self::Pulley(_) => PartKind::Pulley,
            Self::Cam(_) => PartKind::Cam,
            Self::LidBox(_) => PartKind::LidBox,
            Self::Figure(_) => PartKind::Figure,
            Self::MusicBox(_) => PartKind::MusicBox,
        }
    }

    pub fn as_sink(&self) -> Option<&dyn RotationSink> {
        match self {
            Self::Shaft(p) => Some(p),
            Self::Pulley(p) => Some(p),
            Self::Cam(p) => Some(p),
            Self::MusicBox(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_sink_mut(&mut self) -> Option<&mut dyn RotationSink> {
        match self {
            Self::Shaft(p) => Some(p),
            Self::Pulley(p) => Some(p),
            Self::Cam(p) => Some(p),
            Self::MusicBox(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_openable(&self) -> Option<&dyn Openable> {
        match self {
            Self::LidBox(p) => Some(p),
            Self::Figure(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_openable_mut(&mut self) -> Option<&mut dyn Openable> {
        match self {
            Self::LidBox(p) => Some(p),
            Self::Figure(p) => Some(p),
            _ => None,
        }
    }

    /// Current turn count for anything that rotates.
    pub fn rotation(&self) -> Option<f64> {
        match self {
            Self::Crank(c) => Some(c.rotation()),
            other => other.as_sink().map(|s| s.rotation()),
        }
    }

    pub fn radius(&self) -> Option<f64> {
        match self {
            Self::Pulley(p) => Some(p.radius()),
            _ => None,
        }
    }

    /// Parts drawn a second time, over everything else.
    pub fn has_foreground(&self) -> bool {
        matches!(self, Self::LidBox(_))
    }
}

impl Component for Part {
    fn position(&self) -> Point {
        each_part!(self, p => p.position())
    }

    fn set_position(&mut self, position: Point) {
        each_part!(self, p => p.set_position(position))
    }

    fn advance_by(&mut self, delta: f64, signals: &mut Vec<Signal>) {
        each_part!(self, p => p.advance_by(delta, signals))
    }

    fn jump_to_time(&mut self, time: f64, signals: &mut Vec<Signal>) {
        each_part!(self, p => p.jump_to_time(time, signals))
    }

    fn reset_to_start(&mut self) {
        each_part!(self, p => p.reset_to_start())
    }

    fn state(&self) -> PartState {
        each_part!(self, p => p.state())
    }
}

impl From<Crank> for Part {
    fn from(p: Crank) -> Self {
        Self::Crank(p)
    }
}

impl From<Shaft> for Part {
    fn from(p: Shaft) -> Self {
        Self::Shaft(p)
    }
}

impl From<Pulley> for Part {
    fn from(p: Pulley) -> Self {
        Self::Pulley(p)
    }
}

impl From<Cam> for Part {
    fn from(p: Cam) -> Self {
        Self::Cam(p)
    }
}

impl From<LidBox> for Part {
    fn from(p: LidBox) -> Self {
        Self::LidBox(p)
    }
}

impl From<SpringFigure> for Part {
    fn from(p: SpringFigure) -> Self {
        Self::Figure(p)
    }
}

impl From<MusicBox> for Part {
    fn from(p: MusicBox) -> Self {
        Self::MusicBox(p)
    }
}
