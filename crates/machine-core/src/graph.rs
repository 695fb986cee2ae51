//! Machine assembly: parts live in an arena and are wired by index.
//!
//! Drive edges carry rotation, trigger edges carry the cam's "open" call.
//! `MachineBuilder::build` checks every edge against the capabilities of its
//! endpoints and rejects drive graphs that contain a cycle.

use crate::component::Component;
use crate::geometry::Point;
use crate::machine::Machine;
use crate::parts::{Part, PartKind};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

/// Index of a part inside its machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PartId(pub usize);

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coupling {
    /// Same turn count on both ends (shaft to pulley, crank to shaft, ...).
    Direct,
    /// Belt between two pulleys, `ratio = driver radius / driven radius`.
    Belt { ratio: f64 },
}

impl Coupling {
    pub fn apply(&self, turns: f64) -> f64 {
        match self {
            Self::Direct => turns,
            Self::Belt { ratio } => turns * ratio,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drive {
    pub from: PartId,
    pub to: PartId,
    pub coupling: Coupling,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("part {0} does not exist")]
    UnknownPart(PartId),
    #[error("{kind} {part} cannot drive other parts")]
    NotASource { part: PartId, kind: &'static str },
    #[error("{kind} {part} cannot be driven")]
    NotASink { part: PartId, kind: &'static str },
    #[error("belt {from} -> {to} must join two pulleys")]
    BeltNeedsPulleys { from: PartId, to: PartId },
    #[error("pulley {0} already drives a belt")]
    BeltTaken(PartId),
    #[error("{kind} {part} cannot trigger other parts")]
    NotACam { part: PartId, kind: &'static str },
    #[error("{kind} {part} cannot be opened")]
    NotOpenable { part: PartId, kind: &'static str },
    #[error("drive edges form a cycle through part {0}")]
    Cycle(PartId),
}

#[derive(Debug, Clone, Copy)]
enum Link {
    Drive(PartId, PartId),
    Belt(PartId, PartId),
}

/// Collects parts and edges, then validates them into a `Machine`.
#[derive(Debug)]
pub struct MachineBuilder {
    origin: Point,
    parts: Vec<Part>,
    links: Vec<Link>,
    triggers: Vec<(PartId, PartId)>,
}

impl MachineBuilder {
    pub fn new(origin: Point) -> Self {
        Self {
            origin,
            parts: Vec::new(),
            links: Vec::new(),
            triggers: Vec::new(),
        }
    }

    /// Append a part. Insertion order is update and draw order.
    pub fn add(&mut self, part: impl Into<Part>, position: impl Into<Point>) -> PartId {
        let mut part = part.into();
        part.set_position(position.into());
        self.parts.push(part);
        PartId(self.parts.len() - 1)
    }

    /// `sink` receives the turn count of `source` unchanged.
    pub fn drive(&mut self, source: PartId, sink: PartId) -> &mut Self {
        self.links.push(Link::Drive(source, sink));
        self
    }

    /// `driven` turns at `driver.radius / driven.radius` times the driver.
    pub fn belt(&mut self, driver: PartId, driven: PartId) -> &mut Self {
        self.links.push(Link::Belt(driver, driven));
        self
    }

    /// `cam` opens `target` each time its key drops into the hole.
    pub fn trigger(&mut self, cam: PartId, target: PartId) -> &mut Self {
        self.triggers.push((cam, target));
        self
    }

    pub fn build(self) -> Result<Machine, BuildError> {
        let count = self.parts.len();
        let mut outgoing: Vec<Vec<Drive>> = vec![Vec::new(); count];
        let mut belted = vec![false; count];

        for link in &self.links {
            let drive = match *link {
                Link::Drive(from, to) => {
                    let source = self.part(from)?;
                    let sink = self.part(to)?;
                    if !source.kind().is_rotation_source() {
                        return Err(BuildError::NotASource {
                            part: from,
                            kind: source.kind().as_str(),
                        });
                    }
                    if sink.as_sink().is_none() {
                        return Err(BuildError::NotASink {
                            part: to,
                            kind: sink.kind().as_str(),
                        });
                    }
                    Drive {
                        from,
                        to,
                        coupling: Coupling::Direct,
                    }
                }
                Link::Belt(from, to) => {
                    let (Some(r_from), Some(r_to)) =
                        (self.part(from)?.radius(), self.part(to)?.radius())
                    else {
                        return Err(BuildError::BeltNeedsPulleys { from, to });
                    };
                    if belted[from.0] {
                        return Err(BuildError::BeltTaken(from));
                    }
                    belted[from.0] = true;
                    Drive {
                        from,
                        to,
                        coupling: Coupling::Belt {
                            ratio: r_from / r_to,
                        },
                    }
                }
            };
            outgoing[drive.from.0].push(drive);
        }

        // A pulley turns its own sinks before its belt peer.
        for edges in &mut outgoing {
            edges.sort_by_key(|d| matches!(d.coupling, Coupling::Belt { .. }));
        }

        topo_order(&outgoing)?;

        let mut triggers: Vec<Vec<PartId>> = vec![Vec::new(); count];
        for &(cam, target) in &self.triggers {
            let source = self.part(cam)?;
            let openable = self.part(target)?;
            if source.kind() != PartKind::Cam {
                return Err(BuildError::NotACam {
                    part: cam,
                    kind: source.kind().as_str(),
                });
            }
            if openable.as_openable().is_none() {
                return Err(BuildError::NotOpenable {
                    part: target,
                    kind: openable.kind().as_str(),
                });
            }
            triggers[cam.0].push(target);
        }

        Ok(Machine::from_graph(
            self.origin,
            self.parts,
            outgoing,
            triggers,
        ))
    }

    fn part(&self, id: PartId) -> Result<&Part, BuildError> {
        self.parts.get(id.0).ok_or(BuildError::UnknownPart(id))
    }
}

/// Kahn's algorithm over the drive edges. Returns parts in an order where
/// every driver precedes what it drives.
pub fn topo_order(outgoing: &[Vec<Drive>]) -> Result<Vec<PartId>, BuildError> {
    let mut indeg = vec![0usize; outgoing.len()];
    for edges in outgoing {
        for d in edges {
            indeg[d.to.0] += 1;
        }
    }

    let mut queue: VecDeque<usize> = indeg
        .iter()
        .enumerate()
        .filter(|(_, &d)| d == 0)
        .map(|(i, _)| i)
        .collect();

    let mut order = Vec::with_capacity(outgoing.len());
    while let Some(u) = queue.pop_front() {
        order.push(PartId(u));
        for d in &outgoing[u] {
            indeg[d.to.0] -= 1;
            if indeg[d.to.0] == 0 {
                queue.push_back(d.to.0);
            }
        }
    }

    if order.len() != outgoing.len() {
        let stuck = indeg.iter().position(|&d| d > 0).unwrap_or_default();
        return Err(BuildError::Cycle(PartId(stuck)));
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parts::{Cam, Crank, LidBox, Pulley, Shaft};

    #[test]
    fn orders_drivers_first() {
        let mut b = MachineBuilder::new(Point::default());
        let shaft = b.add(Shaft::new(10, 100), (0, 0));
        let crank = b.add(Crank::new(1.0), (0, 0));
        b.drive(crank, shaft);
        let machine = b.build().unwrap();
        let order = topo_order(machine.drive_table()).unwrap();
        let pos = |id: PartId| order.iter().position(|p| *p == id).unwrap();
        assert!(pos(crank) < pos(shaft));
    }

    #[test]
    fn rejects_mutual_belts() {
        let mut b = MachineBuilder::new(Point::default());
        let p1 = b.add(Pulley::new(10.0), (0, 0));
        let p2 = b.add(Pulley::new(20.0), (0, 0));
        b.belt(p1, p2).belt(p2, p1);
        assert!(matches!(b.build(), Err(BuildError::Cycle(_))));
    }

    #[test]
    fn rejects_self_drive() {
        let mut b = MachineBuilder::new(Point::default());
        let shaft = b.add(Shaft::new(10, 10), (0, 0));
        b.drive(shaft, shaft);
        assert_eq!(b.build().unwrap_err(), BuildError::Cycle(shaft));
    }

    #[test]
    fn rejects_edges_against_capabilities() {
        let mut b = MachineBuilder::new(Point::default());
        let lid = b.add(LidBox::new(10, 10), (0, 0));
        let shaft = b.add(Shaft::new(10, 10), (0, 0));
        b.drive(lid, shaft);
        assert!(matches!(b.build(), Err(BuildError::NotASource { .. })));

        let mut b = MachineBuilder::new(Point::default());
        let crank = b.add(Crank::new(1.0), (0, 0));
        let lid = b.add(LidBox::new(10, 10), (0, 0));
        b.drive(crank, lid);
        assert!(matches!(b.build(), Err(BuildError::NotASink { .. })));

        let mut b = MachineBuilder::new(Point::default());
        let shaft = b.add(Shaft::new(10, 10), (0, 0));
        let pulley = b.add(Pulley::new(5.0), (0, 0));
        b.belt(shaft, pulley);
        assert!(matches!(
            b.build(),
            Err(BuildError::BeltNeedsPulleys { .. })
        ));

        let mut b = MachineBuilder::new(Point::default());
        let cam = b.add(Cam::new(), (0, 0));
        let shaft = b.add(Shaft::new(10, 10), (0, 0));
        b.trigger(cam, shaft);
        assert!(matches!(b.build(), Err(BuildError::NotOpenable { .. })));

        let mut b = MachineBuilder::new(Point::default());
        let shaft = b.add(Shaft::new(10, 10), (0, 0));
        b.trigger(shaft, PartId(7));
        assert_eq!(b.build().unwrap_err(), BuildError::UnknownPart(PartId(7)));
    }

    #[test]
    fn one_belt_per_driver() {
        let mut b = MachineBuilder::new(Point::default());
        let p1 = b.add(Pulley::new(10.0), (0, 0));
        let p2 = b.add(Pulley::new(20.0), (0, 0));
        let p3 = b.add(Pulley::new(30.0), (0, 0));
        b.belt(p1, p2).belt(p1, p3);
        assert_eq!(b.build().unwrap_err(), BuildError::BeltTaken(p1));
    }

    #[test]
    fn pulley_sinks_come_before_its_belt() {
        let mut b = MachineBuilder::new(Point::default());
        let p1 = b.add(Pulley::new(10.0), (0, 0));
        let p2 = b.add(Pulley::new(40.0), (0, 0));
        let shaft = b.add(Shaft::new(10, 10), (0, 0));
        b.belt(p1, p2).drive(p1, shaft);
        let machine = b.build().unwrap();
        let edges = machine.drives_from(p1);
        assert_eq!(edges[0].to, shaft);
        assert_eq!(edges[1].coupling, Coupling::Belt { ratio: 0.25 });
    }
}
