pub mod component;
pub mod factory;
pub mod geometry;
pub mod graph;
pub mod instance;
pub mod machine;
pub mod parts;
pub mod render;
pub mod song;
pub mod system;
pub mod timebase;

pub use component::{Component, Openable, RotationSink, Signal};
pub use factory::{build_machine, MachineKind, MachineSettings};
pub use geometry::Point;
pub use graph::{BuildError, Coupling, Drive, MachineBuilder, PartId};
pub use instance::{InstanceSettings, MachineInstance};
pub use machine::{Machine, MachineEvent, MachineSnapshot, PartSnapshot};
pub use parts::{Part, PartKind, PartState};
pub use render::{Canvas, DisplayList, DrawCommand, Layer};
pub use song::{Note, NotePlayed, Song, SongError};
pub use system::{FrameEvent, MachineSystem, SeekStats, MAX_PENDING_EVENTS};
pub use timebase::PlaybackClock;
