use crate::geometry::Point;
use crate::parts::PartState;
use crate::song::NotePlayed;

/// Discrete output of a lifecycle call. The owning machine routes it along
/// its edge tables after the call returns.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// Broadcast this many turns along the emitter's outgoing drive edges.
    Rotation(f64),
    /// Open every part subscribed to the emitting cam.
    Trigger,
    /// A music box note crossed the playhead.
    Note(NotePlayed),
}

/// Uniform lifecycle shared by every part of a machine.
///
/// Positions are offsets from the machine origin. Only `state` is required;
/// parts with no time-dependent behavior keep the default no-ops.
pub trait Component {
    fn position(&self) -> Point;

    fn set_position(&mut self, position: Point);

    /// Integrate continuous state forward by `delta` seconds.
    fn advance_by(&mut self, _delta: f64, _signals: &mut Vec<Signal>) {}

    /// Set state directly from an absolute time in seconds.
    fn jump_to_time(&mut self, _time: f64, _signals: &mut Vec<Signal>) {}

    /// Restore the time-zero state.
    fn reset_to_start(&mut self) {}

    /// Drawable state, read without side effects.
    fn state(&self) -> PartState;
}

/// Receives a turn count from an upstream driver.
pub trait RotationSink {
    fn set_rotation(&mut self, turns: f64);

    fn rotation(&self) -> f64;
}

/// One-shot capability fired by a cam.
pub trait Openable {
    fn open(&mut self);

    fn is_open(&self) -> bool;
}
