//! The stock machines a `MachineSystem` can select by number.

use crate::geometry::Point;
use crate::graph::MachineBuilder;
use crate::machine::Machine;
use crate::parts::{Cam, Crank, LidBox, MusicBox, Pulley, Shaft, SpringFigure};
use crate::song::Song;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Knobs shared by every stock machine.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineSettings {
    /// Crank speed in turns per second.
    pub crank_speed: f64,
    pub song: Arc<Song>,
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            crank_speed: 0.25,
            song: Arc::new(Song::builtin()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineKind {
    /// Crank, belt reduction, cam; a figure pops out of the box.
    BeltCam,
    /// Two belt stages, a music box on the first shaft.
    MusicBox,
}

impl MachineKind {
    /// Stock machine for a selection number. Unknown numbers get machine 1.
    pub fn from_number(number: i32) -> Self {
        match number {
            2 => Self::MusicBox,
            _ => Self::BeltCam,
        }
    }

    /// Stock layouts are fixed, so unlike `MachineBuilder::build` this
    /// cannot fail.
    pub fn build(self, location: Point, settings: &MachineSettings) -> Machine {
        match self {
            Self::BeltCam => belt_cam(location, settings),
            Self::MusicBox => music_box(location, settings),
        }
    }
}

pub fn build_machine(number: i32, location: Point, settings: &MachineSettings) -> Machine {
    MachineKind::from_number(number).build(location, settings)
}

fn belt_cam(location: Point, settings: &MachineSettings) -> Machine {
    let mut b = MachineBuilder::new(location);

    let lid_box = b.add(LidBox::new(250, 240), (0, 0));
    let figure = b.add(SpringFigure::new(200.0, 39.0), (0, -10));
    let crank = b.add(Crank::new(settings.crank_speed), (150, -110));

    let shaft = b.add(Shaft::new(10, 100), (50, -100));
    b.drive(crank, shaft);

    let small = b.add(Pulley::new(10.0), (75, -100));
    b.drive(shaft, small);

    let large = b.add(Pulley::new(40.0), (75, -175));
    b.belt(small, large);

    let cam_shaft = b.add(Shaft::new(10, 200), (-100, -175));
    b.drive(large, cam_shaft);

    let cam = b.add(Cam::new(), (-100, -175));
    b.trigger(cam, lid_box).trigger(cam, figure).drive(cam_shaft, cam);

    b.build().expect("machine 1 layout is acyclic and fully typed")
}

fn music_box(location: Point, settings: &MachineSettings) -> Machine {
    let mut b = MachineBuilder::new(location);

    // Draw order differs from wiring order: shafts sit behind the crank,
    // pulleys and cam in front.
    let lid_box = b.add(LidBox::new(250, 240), (0, 0));
    let figure = b.add(SpringFigure::new(200.0, 42.0), (0, -10));
    let shaft = b.add(Shaft::new(10, 100), (50, -210));
    let crank = b.add(Crank::new(settings.crank_speed), (150, -220));
    let shaft2 = b.add(Shaft::new(10, 150), (-100, -100));
    let shaft3 = b.add(Shaft::new(10, 30), (-100, -200));
    let drum = b.add(MusicBox::new(Arc::clone(&settings.song)), (-25, -100));
    let pulley1 = b.add(Pulley::new(20.0), (50, -210));
    let pulley2 = b.add(Pulley::new(50.0), (50, -100));
    let pulley3 = b.add(Pulley::new(20.0), (-100, -100));
    let pulley4 = b.add(Pulley::new(20.0), (-100, -200));
    let cam = b.add(Cam::new(), (-70, -200));

    b.drive(crank, shaft)
        .drive(shaft, drum)
        .drive(shaft, pulley1)
        .belt(pulley1, pulley2)
        .drive(pulley2, shaft2)
        .drive(shaft2, pulley3)
        .belt(pulley3, pulley4)
        .drive(pulley4, shaft3)
        .trigger(cam, lid_box)
        .trigger(cam, figure)
        .drive(shaft3, cam);

    b.build().expect("machine 2 layout is acyclic and fully typed")
}
