use crate::component::{Component, RotationSink, Signal};
use crate::geometry::Point;
use crate::parts::PartState;
use crate::song::Song;
use std::sync::Arc;

/// Beats that pass under the comb per turn of the drum.
pub const BEATS_PER_ROTATION: f64 = 12.0;

/// Music box drum. Each update plays every pending note whose beat is
/// strictly behind the drum position.
#[derive(Debug, Clone, PartialEq)]
pub struct MusicBox {
    position: Point,
    rotation: f64,
    song: Arc<Song>,
    next_note: usize,
}

impl MusicBox {
    pub fn new(song: Arc<Song>) -> Self {
        Self {
            position: Point::default(),
            rotation: 0.0,
            song,
            next_note: 0,
        }
    }

    pub fn song(&self) -> &Song {
        &self.song
    }

    /// Index of the next note to play; equals the song length once finished.
    pub fn next_note(&self) -> usize {
        self.next_note
    }

    pub fn current_beat(&self) -> f64 {
        BEATS_PER_ROTATION * self.rotation
    }
}

impl Component for MusicBox {
    fn position(&self) -> Point {
        self.position
    }

    fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    fn jump_to_time(&mut self, _time: f64, signals: &mut Vec<Signal>) {
        let current = self.current_beat();
        while let Some(beat) = self.song.beat_of(self.next_note) {
            if beat >= current {
                break;
            }
            if let Some(played) = self.song.played(self.next_note) {
                signals.push(Signal::Note(played));
            }
            self.next_note += 1;
        }
    }

    fn reset_to_start(&mut self) {
        self.rotation = 0.0;
        self.next_note = 0;
    }

    fn state(&self) -> PartState {
        PartState::MusicBox {
            rotation: self.rotation,
            next_note: self.next_note,
        }
    }
}

impl RotationSink for MusicBox {
    fn set_rotation(&mut self, turns: f64) {
        self.rotation = turns;
    }

    fn rotation(&self) -> f64 {
        self.rotation
    }
}
