// This code is part of graphmap, a derivative of Qiskit.
//
// (C) Copyright IBM 2024
//
// This code is licensed under the Apache License, Version 2.0. You may
// obtain a copy of this license in the LICENSE.txt file in the root directory
// of this source tree or at http://www.apache.org/licenses/LICENSE-2.0.
//
// Any modifications or derivative works of this code must retain this
// copyright notice, and modified files need to carry a notice indicating
// that they have been altered from the originals.
//
// This file has been modified from the Qiskit original for graphmap.

use hashbrown::HashSet;
use thiserror::Error;

use graphmap_circuit::PhysicalQubit;

use super::crossing::{Crossing, PathId};

/// Errors raised when a [PathContainer] is asked about a path it does not hold.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathError {
    #[error("no path with id {0} is registered")]
    NotFound(PathId),
}

/// The nodes of one registered path, with the crossings it makes with the other paths.
#[derive(Clone, Debug)]
pub(super) struct PathSlot {
    pub nodes: Vec<PhysicalQubit>,
    pub crossings: Vec<Crossing>,
}

/// A registry of routing paths over the coupling graph.
///
/// Every path that makes it into the container is guaranteed to be compatible with every other one
/// in the sense that the swaps along each of them can be performed in the same round:
///
/// * the endpoints of a path appear in no other registered path, in any position;
/// * two paths share at most one node, and that shared node is recorded as a [Crossing] on both of
///   them.
///
/// Paths are stored in slots indexed by their [PathId].  Ids come from a counter that only resets
/// in [PathContainer::clear]; removing a path leaves its slot empty.
#[derive(Clone, Debug, Default)]
pub struct PathContainer {
    pub(super) slots: Vec<Option<PathSlot>>,
    pub(super) len: usize,
}

impl PathContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to register a new path.  The path is rejected, leaving the container untouched, if it
    /// has fewer than two nodes, visits a node twice, shares an endpoint with a registered path (in
    /// either direction), or shares more than one node with any registered path.
    pub fn try_add_path(&mut self, nodes: &[PhysicalQubit]) -> bool {
        let [first, .., last] = nodes else {
            return false;
        };
        let mut seen = HashSet::with_capacity(nodes.len());
        if !nodes.iter().all(|node| seen.insert(*node)) {
            return false;
        }
        let mut crossings = Vec::new();
        for (id, slot) in self.iter_slots() {
            let [other_first, .., other_last] = slot.nodes[..] else {
                continue;
            };
            if slot.nodes.contains(first)
                || slot.nodes.contains(last)
                || seen.contains(&other_first)
                || seen.contains(&other_last)
            {
                return false;
            }
            let mut shared = slot.nodes.iter().filter(|node| seen.contains(*node));
            match (shared.next(), shared.next()) {
                (None, _) => (),
                (Some(&node), None) => crossings.push(Crossing::new(id, [node])),
                (Some(_), Some(_)) => return false,
            }
        }
        let id = PathId::new(self.slots.len() as u32);
        for crossing in crossings.iter() {
            if let Some(slot) = self.slots[crossing.path_id.index()].as_mut() {
                slot.crossings
                    .push(Crossing::new(id, crossing.overlap.iter().copied()));
            }
        }
        self.slots.push(Some(PathSlot {
            nodes: nodes.to_vec(),
            crossings,
        }));
        self.len += 1;
        true
    }

    /// Is there a registered path joining `a` and `b`, in either direction?
    pub fn has_interaction(&self, a: PhysicalQubit, b: PhysicalQubit) -> bool {
        self.find_interaction(a, b).is_some()
    }

    /// The id of the registered path joining `a` and `b`, in either direction.
    pub fn find_interaction(&self, a: PhysicalQubit, b: PhysicalQubit) -> Option<PathId> {
        self.iter_slots().find_map(|(id, slot)| {
            let (first, last) = (slot.nodes.first()?, slot.nodes.last()?);
            ((*first == a && *last == b) || (*first == b && *last == a)).then_some(id)
        })
    }

    /// Remove a path, along with every crossing that any other path records against it.
    pub fn remove_path_by_id(&mut self, id: PathId) -> Result<(), PathError> {
        self.slots
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(PathError::NotFound(id))?;
        self.len -= 1;
        for slot in self.slots.iter_mut().flatten() {
            slot.crossings.retain(|crossing| crossing.path_id != id);
        }
        Ok(())
    }

    /// Exchange the contents of two slots.  The ids stay where they are, but the paths (and their
    /// crossing lists) move, and every crossing is relabelled to point at the new location of its
    /// neighbour.
    pub fn swap_paths(&mut self, a: PathId, b: PathId) -> Result<(), PathError> {
        for id in [a, b] {
            if !self.contains(id) {
                return Err(PathError::NotFound(id));
            }
        }
        if a == b {
            return Ok(());
        }
        self.slots.swap(a.index(), b.index());
        for slot in self.slots.iter_mut().flatten() {
            for crossing in slot.crossings.iter_mut() {
                if crossing.path_id == a {
                    crossing.path_id = b;
                } else if crossing.path_id == b {
                    crossing.path_id = a;
                }
            }
        }
        Ok(())
    }

    /// Remove every path and reset the id counter.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.len = 0;
    }

    /// The largest number of nodes shared by any crossing in the container, or 0 if nothing
    /// crosses.
    pub fn max_crossing_order(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .flat_map(|slot| slot.crossings.iter())
            .map(Crossing::order)
            .max()
            .unwrap_or(0)
    }

    /// Remove paths until no crossing shares more than `order` nodes.  Paths are removed in
    /// decreasing order of how many such crossings they have, with ties going to the larger id.
    pub fn remove_crossing_of_order_higher_than(&mut self, order: usize) {
        let mut ranked = self
            .iter_slots()
            .filter_map(|(id, slot)| {
                let count = slot
                    .crossings
                    .iter()
                    .filter(|crossing| crossing.order() > order)
                    .count();
                (count > 0).then_some((count, id))
            })
            .collect::<Vec<_>>();
        ranked.sort_unstable();
        while self.max_crossing_order() > order {
            let Some((_, id)) = ranked.pop() else {
                break;
            };
            if self.remove_path_by_id(id).is_ok() {
                tracing::debug!("removed path {} to limit crossing order to {}", id, order);
            }
        }
    }

    /// The node sequences of all registered paths, in id order.
    pub fn get_all_paths(&self) -> Vec<Vec<PhysicalQubit>> {
        self.iter().map(|(_, nodes)| nodes.to_vec()).collect()
    }

    /// Every node used by some registered path.
    pub fn get_all_nodes(&self) -> HashSet<PhysicalQubit> {
        self.iter()
            .flat_map(|(_, nodes)| nodes.iter().copied())
            .collect()
    }

    /// Number of registered paths.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn contains(&self, id: PathId) -> bool {
        matches!(self.slots.get(id.index()), Some(Some(_)))
    }

    pub fn path(&self, id: PathId) -> Option<&[PhysicalQubit]> {
        self.slot(id).map(|slot| slot.nodes.as_slice())
    }

    /// The crossings recorded on a path, in the order they were created.
    pub fn crossings(&self, id: PathId) -> Option<&[Crossing]> {
        self.slot(id).map(|slot| slot.crossings.as_slice())
    }

    /// Iterate over the registered paths in id order.
    pub fn iter(&self) -> impl Iterator<Item = (PathId, &[PhysicalQubit])> + '_ {
        self.iter_slots()
            .map(|(id, slot)| (id, slot.nodes.as_slice()))
    }

    #[inline]
    pub(super) fn slot(&self, id: PathId) -> Option<&PathSlot> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub(super) fn iter_slots(&self) -> impl Iterator<Item = (PathId, &PathSlot)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| Some((PathId::new(index as u32), slot.as_ref()?)))
    }
}
