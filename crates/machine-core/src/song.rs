//! Songs for the music box drum.
//!
//! A song is written in measures and beats (both 1-based) and flattened into
//! absolute beats, `(measure - 1) * beats_per_measure + (beat - 1)`, sorted so
//! the drum can play it with a single cursor.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default = "first_measure")]
    pub measure: u32,
    #[serde(default = "first_beat")]
    pub beat: f64,
    pub pitch: String,
}

fn first_measure() -> u32 {
    1
}

fn first_beat() -> f64 {
    1.0
}

impl Note {
    pub fn new(measure: u32, beat: f64, pitch: impl Into<String>) -> Self {
        Self {
            measure,
            beat,
            pitch: pitch.into(),
        }
    }
}

/// Note handed to the host when the drum passes its beat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotePlayed {
    pub index: usize,
    pub beat: f64,
    pub pitch: String,
}

#[derive(Debug, Error)]
pub enum SongError {
    #[error("invalid song document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("beats_per_measure must be positive")]
    NoBeatsPerMeasure,
    #[error("note {index} has {reason}")]
    InvalidNote { index: usize, reason: &'static str },
}

#[derive(Debug, Deserialize)]
struct SongDocument {
    beats_per_measure: u32,
    notes: Vec<Note>,
}

#[derive(Debug, Clone, PartialEq)]
struct ScheduledNote {
    beat: f64,
    pitch: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    beats_per_measure: u32,
    schedule: Vec<ScheduledNote>,
}

impl Song {
    pub fn new(beats_per_measure: u32, notes: Vec<Note>) -> Result<Self, SongError> {
        if beats_per_measure == 0 {
            return Err(SongError::NoBeatsPerMeasure);
        }

        let mut schedule = Vec::with_capacity(notes.len());
        for (index, note) in notes.into_iter().enumerate() {
            if note.measure == 0 {
                return Err(SongError::InvalidNote {
                    index,
                    reason: "a measure below 1",
                });
            }
            if !note.beat.is_finite() || note.beat < 1.0 {
                return Err(SongError::InvalidNote {
                    index,
                    reason: "a beat below 1",
                });
            }
            let beat = f64::from(note.measure - 1) * f64::from(beats_per_measure) + (note.beat - 1.0);
            schedule.push(ScheduledNote {
                beat,
                pitch: note.pitch,
            });
        }
        // Stable, so notes sharing a beat keep their written order.
        schedule.sort_by(|a, b| a.beat.total_cmp(&b.beat));

        Ok(Self {
            beats_per_measure,
            schedule,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, SongError> {
        let doc: SongDocument = serde_json::from_str(text)?;
        Self::new(doc.beats_per_measure, doc.notes)
    }

    /// The tune the second stock machine plays.
    pub fn builtin() -> Self {
        let notes = [
            (1, 1.0, "C5"),
            (1, 3.0, "C5"),
            (1, 4.0, "D5"),
            (1, 6.0, "D5"),
            (2, 1.0, "E5"),
            (2, 2.0, "G5"),
            (2, 3.0, "E5"),
            (2, 4.0, "C5"),
            (3, 1.0, "C5"),
            (3, 3.0, "C5"),
            (3, 4.0, "D5"),
            (3, 6.0, "D5"),
            (4, 1.0, "E5"),
            (4, 4.0, "C5"),
            (5, 1.0, "C5"),
            (5, 3.0, "C5"),
            (5, 4.0, "D5"),
            (5, 6.0, "D5"),
            (6, 1.0, "E5"),
            (6, 2.0, "G5"),
            (6, 3.0, "E5"),
            (6, 4.0, "C5"),
            (7, 1.0, "G5"),
            (7, 4.0, "C5"),
            (8, 1.0, "F5"),
            (8, 4.0, "E5"),
            (8, 6.0, "C5"),
        ]
        .into_iter()
        .map(|(measure, beat, pitch)| Note::new(measure, beat, pitch))
        .collect();

        Self::new(6, notes).unwrap_or_else(|_| Self::silent())
    }

    pub fn silent() -> Self {
        Self {
            beats_per_measure: 1,
            schedule: Vec::new(),
        }
    }

    pub fn beats_per_measure(&self) -> u32 {
        self.beats_per_measure
    }

    pub fn len(&self) -> usize {
        self.schedule.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedule.is_empty()
    }

    /// Absolute beat of the note at `index`, if any.
    pub fn beat_of(&self, index: usize) -> Option<f64> {
        self.schedule.get(index).map(|n| n.beat)
    }

    pub(crate) fn played(&self, index: usize) -> Option<NotePlayed> {
        self.schedule.get(index).map(|n| NotePlayed {
            index,
            beat: n.beat,
            pitch: n.pitch.clone(),
        })
    }
}

impl Default for Song {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_measures_into_absolute_beats() {
        let song = Song::new(
            4,
            vec![Note::new(2, 1.0, "E4"), Note::new(1, 2.5, "C4")],
        )
        .unwrap();
        assert_eq!(song.beat_of(0), Some(1.5));
        assert_eq!(song.beat_of(1), Some(4.0));
    }

    #[test]
    fn keeps_chords() {
        let song = Song::new(
            3,
            vec![Note::new(1, 1.0, "C4"), Note::new(1, 1.0, "E4")],
        )
        .unwrap();
        assert_eq!(song.len(), 2);
        assert_eq!(song.played(1).unwrap().pitch, "E4");
    }

    #[test]
    fn parses_json_with_defaults() {
        let song = Song::from_json(
            r#"{"beats_per_measure":3,"notes":[{"pitch":"A4"},{"measure":2,"pitch":"B4"}]}"#,
        )
        .unwrap();
        assert_eq!(song.beat_of(0), Some(0.0));
        assert_eq!(song.beat_of(1), Some(3.0));
    }

    #[test]
    fn rejects_bad_documents() {
        assert!(matches!(Song::from_json("{"), Err(SongError::Json(_))));
        assert!(matches!(
            Song::new(0, Vec::new()),
            Err(SongError::NoBeatsPerMeasure)
        ));
        assert!(matches!(
            Song::new(3, vec![Note::new(0, 1.0, "C4")]),
            Err(SongError::InvalidNote { index: 0, .. })
        ));
        assert!(matches!(
            Song::new(3, vec![Note::new(1, 0.5, "C4")]),
            Err(SongError::InvalidNote { index: 0, .. })
        ));
    }

    #[test]
    fn builtin_song_is_sorted_and_non_empty() {
        let song = Song::builtin();
        assert!(!song.is_empty());
        let beats: Vec<f64> = (0..song.len()).filter_map(|i| song.beat_of(i)).collect();
        assert!(beats.windows(2).all(|w| w[0] <= w[1]));
    }
}
