use crate::component::{Component, Signal};
use crate::geometry::Point;
use crate::graph::{Drive, PartId};
use crate::parts::{Part, PartState};
use crate::render::{Canvas, Layer};
use log::trace;
use serde::Serialize;

/// Discrete side effect produced during an update pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MachineEvent {
    /// A cam's key dropped into its hole and opened `target`.
    Triggered { cam: PartId, target: PartId },
    /// A music box drum passed a note.
    Note {
        part: PartId,
        index: usize,
        beat: f64,
        pitch: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartSnapshot {
    pub id: PartId,
    pub position: Point,
    pub state: PartState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineSnapshot {
    pub origin: Point,
    pub time: f64,
    pub parts: Vec<PartSnapshot>,
}

/// An assembled machine: exclusively owned parts, their drive and trigger
/// tables, and the shared origin and clock.
///
/// Lifecycle calls visit parts once each, in insertion order. Signals a part
/// emits are routed before the next part is visited.
#[derive(Debug, Clone)]
pub struct Machine {
    origin: Point,
    time: f64,
    parts: Vec<Part>,
    outgoing: Vec<Vec<Drive>>,
    triggers: Vec<Vec<PartId>>,
    signals: Vec<Signal>,
    stack: Vec<(PartId, f64)>,
    events: Vec<MachineEvent>,
}

impl Machine {
    pub(crate) fn from_graph(
        origin: Point,
        parts: Vec<Part>,
        outgoing: Vec<Vec<Drive>>,
        triggers: Vec<Vec<PartId>>,
    ) -> Self {
        Self {
            origin,
            time: 0.0,
            parts,
            outgoing,
            triggers,
            signals: Vec::new(),
            stack: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn set_origin(&mut self, origin: Point) {
        self.origin = origin;
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn part(&self, id: PartId) -> Option<&Part> {
        self.parts.get(id.0)
    }

    pub fn part_mut(&mut self, id: PartId) -> Option<&mut Part> {
        self.parts.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Drive edges leaving `id`, direct sinks first.
    pub fn drives_from(&self, id: PartId) -> &[Drive] {
        self.outgoing.get(id.0).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn drive_table(&self) -> &[Vec<Drive>] {
        &self.outgoing
    }

    /// Openables subscribed to the cam `id`.
    pub fn triggers_of(&self, id: PartId) -> &[PartId] {
        self.triggers.get(id.0).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn advance_by(&mut self, delta: f64) {
        for i in 0..self.parts.len() {
            self.parts[i].advance_by(delta, &mut self.signals);
            self.route(PartId(i));
        }
    }

    /// Set the clock and run one update pass at that time.
    pub fn jump_to_time(&mut self, time: f64) {
        self.time = time;
        for i in 0..self.parts.len() {
            self.parts[i].jump_to_time(time, &mut self.signals);
            self.route(PartId(i));
        }
    }

    /// Update pass at the current time.
    pub fn update(&mut self) {
        self.jump_to_time(self.time);
    }

    /// Every part back to its time-zero state. The clock is left alone.
    pub fn reset_to_start(&mut self) {
        for part in &mut self.parts {
            part.reset_to_start();
        }
    }

    /// Push `turns` from `source` through the drive tables, depth first.
    pub fn propagate(&mut self, source: PartId, turns: f64) {
        let mut stack = std::mem::take(&mut self.stack);
        stack.clear();
        self.push_children(&mut stack, source, turns);

        while let Some((id, turns)) = stack.pop() {
            if let Some(sink) = self.parts.get_mut(id.0).and_then(Part::as_sink_mut) {
                sink.set_rotation(turns);
            }
            self.push_children(&mut stack, id, turns);
        }
        self.stack = stack;
    }

    fn push_children(&self, stack: &mut Vec<(PartId, f64)>, from: PartId, turns: f64) {
        // Reversed so the first edge is popped first.
        for drive in self.drives_from(from).iter().rev() {
            stack.push((drive.to, drive.coupling.apply(turns)));
        }
    }

    fn route(&mut self, from: PartId) {
        if self.signals.is_empty() {
            return;
        }
        let mut signals = std::mem::take(&mut self.signals);
        for signal in signals.drain(..) {
            match signal {
                Signal::Rotation(turns) => self.propagate(from, turns),
                Signal::Trigger => self.fire(from),
                Signal::Note(note) => {
                    trace!("part {} played {} at beat {}", from, note.pitch, note.beat);
                    self.events.push(MachineEvent::Note {
                        part: from,
                        index: note.index,
                        beat: note.beat,
                        pitch: note.pitch,
                    });
                }
            }
        }
        self.signals = signals;
    }

    fn fire(&mut self, cam: PartId) {
        for i in 0..self.triggers_of(cam).len() {
            let target = self.triggers[cam.0][i];
            if let Some(openable) = self.parts.get_mut(target.0).and_then(Part::as_openable_mut) {
                openable.open();
                trace!("cam {} opened part {} at t={:.3}", cam, target, self.time);
                self.events.push(MachineEvent::Triggered { cam, target });
            }
        }
    }

    /// Events produced since the last call, oldest first.
    pub fn take_events(&mut self) -> Vec<MachineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Primary pass over every part, then a second pass for foregrounds.
    pub fn render<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        for (i, part) in self.parts.iter().enumerate() {
            canvas.draw(
                Layer::Primary,
                PartId(i),
                self.origin + part.position(),
                &part.state(),
            );
        }
        for (i, part) in self.parts.iter().enumerate() {
            if part.has_foreground() {
                canvas.draw(
                    Layer::Last,
                    PartId(i),
                    self.origin + part.position(),
                    &part.state(),
                );
            }
        }
    }

    pub fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot {
            origin: self.origin,
            time: self.time,
            parts: self
                .parts
                .iter()
                .enumerate()
                .map(|(i, part)| PartSnapshot {
                    id: PartId(i),
                    position: part.position(),
                    state: part.state(),
                })
                .collect(),
        }
    }
}
