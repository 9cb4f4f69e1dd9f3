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
use indexmap::IndexMap;
use itertools::Itertools;
use rustworkx_core::petgraph::algo::tarjan_scc;
use rustworkx_core::petgraph::prelude::*;
use rustworkx_core::petgraph::visit::EdgeRef;
use smallvec::SmallVec;

use graphmap_circuit::PhysicalQubit;

use super::container::PathContainer;
use super::crossing::PathId;

type BoundPaths = SmallVec<[PathId; 4]>;

/// Run-before relations between paths.  An edge `a -> b` weighted with node `x` means that `b` has
/// a half ending on `x`, which `a` also passes through, so `a` must do its swaps first.
type SequencingGraph = DiGraph<PathId, PhysicalQubit>;

/// The point at which a path is cut in two.  The qubit at the start of the path is swapped forwards
/// along the first half, and the qubit at the end is swapped backwards along the second half, so
/// the two meet at the boundary.
#[derive(Clone, Debug)]
struct Split {
    head: Vec<PhysicalQubit>,
    tail: Vec<PhysicalQubit>,
}

impl Split {
    fn new(nodes: &[PhysicalQubit]) -> Self {
        let (head, tail) = nodes.split_at(nodes.len() / 2);
        Split {
            head: head.to_vec(),
            tail: tail.to_vec(),
        }
    }

    /// Does one half of the split end at `node`?
    #[inline]
    fn is_bound_at(&self, node: PhysicalQubit) -> bool {
        self.head.last() == Some(&node) || self.tail.first() == Some(&node)
    }

    /// Try to move the boundary of a split that is bound at `node` so that neither half ends on a
    /// node for which `free` is false.  Each half always keeps at least one node.
    fn try_shift_boundary(
        &mut self,
        node: PhysicalQubit,
        free: impl Fn(PhysicalQubit) -> bool,
    ) -> bool {
        if self.head.len() + self.tail.len() < 4 {
            return false;
        }
        if self.head.last() == Some(&node) {
            if let [first, second, ..] = self.tail[..] {
                if free(first) && free(second) {
                    self.tail.remove(0);
                    self.head.push(first);
                    return true;
                }
            }
        } else if let [.., second_last, last] = self.head[..] {
            if free(second_last) && free(last) {
                self.head.pop();
                self.tail.insert(0, last);
                return true;
            }
        }
        if let [.., third_last, second_last, _] = self.head[..] {
            if free(third_last) && free(second_last) {
                let mut moved = self.head.split_off(self.head.len() - 2);
                moved.append(&mut self.tail);
                self.tail = moved;
                return true;
            }
        }
        if let [_, second, third, ..] = self.tail[..] {
            if free(second) && free(third) {
                self.head.extend(self.tail.drain(..2));
                return true;
            }
        }
        false
    }

    fn push_swaps(&self, swaps: &mut Vec<[PhysicalQubit; 2]>) {
        swaps.extend(self.head.iter().tuple_windows().map(|(&a, &b)| [a, b]));
        swaps.extend(
            self.tail
                .iter()
                .rev()
                .tuple_windows()
                .map(|(&a, &b)| [a, b]),
        );
    }
}

impl PathContainer {
    /// Produce the swaps that bring the endpoints of every registered path next to each other.
    ///
    /// Each path is split in two near its middle, and the swaps walk its endpoints in towards the
    /// split.  Where paths cross, the splits are moved (and the paths reordered) so that the swaps
    /// of one path do not carry another path's qubit away from its route.  A path whose conflict
    /// cannot be resolved that way is removed from the container and contributes no swaps.
    ///
    /// The swaps are ordered by path id, and must be applied in the order returned.
    pub fn generate_swaps(&mut self) -> Vec<[PhysicalQubit; 2]> {
        let mut splits = self
            .slots
            .iter()
            .map(|slot| slot.as_ref().map(|slot| Split::new(&slot.nodes)))
            .collect::<Vec<_>>();
        if self.max_crossing_order() > 0 {
            self.resolve_intersections(&mut splits);
        }
        let mut swaps = Vec::new();
        for split in splits.iter().flatten() {
            split.push_swaps(&mut swaps);
        }
        swaps
    }

    /// Map each crossing node that some path is currently split at to the paths split there.
    fn intersections(
        &self,
        splits: &[Option<Split>],
        settled: &HashSet<PhysicalQubit>,
    ) -> IndexMap<PhysicalQubit, BoundPaths, ::ahash::RandomState> {
        let mut out: IndexMap<PhysicalQubit, BoundPaths, ::ahash::RandomState> =
            IndexMap::default();
        for (id, slot) in self.iter_slots() {
            let Some(split) = splits[id.index()].as_ref() else {
                continue;
            };
            for &node in slot.crossings.iter().flat_map(|crossing| crossing.overlap.iter()) {
                if settled.contains(&node) || !split.is_bound_at(node) {
                    continue;
                }
                let bound = out.entry(node).or_default();
                if !bound.contains(&id) {
                    bound.push(id);
                }
            }
        }
        out
    }

    fn resolve_intersections(&mut self, splits: &mut [Option<Split>]) {
        let mut settled = HashSet::new();
        loop {
            let intersections = self.intersections(splits, &settled);
            // `max_by_key` keeps the last of equal elements.
            let Some((node, bound)) = intersections.into_iter().max_by_key(|(_, bound)| {
                let order = bound.len();
                let total = bound.iter().map(|&id| self.path_len(id)).sum::<usize>();
                (order, total + 1 - order)
            }) else {
                break;
            };
            if let [path] = bound[..] {
                self.sequence_after_partners(path, node, splits);
                settled.insert(node);
            } else {
                self.separate_bound_paths(node, &bound, splits);
            }
        }
        self.order_bound_paths(splits);
    }

    /// Reorder the paths so that each one runs after every path that passes through the node its
    /// split is bound at.  Reordering for one intersection can undo the order set up for another,
    /// and the constraints can form a cycle, so this works from the whole set at once.
    fn order_bound_paths(&mut self, splits: &mut [Option<Split>]) {
        loop {
            let graph = self.sequencing_graph(splits);
            if graph
                .edge_references()
                .all(|edge| graph[edge.source()] < graph[edge.target()])
            {
                return;
            }
            let components = tarjan_scc(&graph);
            if let Some(cycle) = components.iter().find(|component| component.len() > 1) {
                self.break_sequencing_cycle(&graph, cycle, splits);
                continue;
            }
            // The components come out in reverse topological order.
            let order = components
                .iter()
                .rev()
                .flatten()
                .map(|node| graph[*node])
                .collect::<Vec<_>>();
            self.reorder_paths(&order, splits);
            return;
        }
    }

    fn sequencing_graph(&self, splits: &[Option<Split>]) -> SequencingGraph {
        let mut graph = SequencingGraph::with_capacity(self.len, self.len);
        let mut nodes = vec![None; self.slots.len()];
        for (id, _) in self.iter_slots() {
            nodes[id.index()] = Some(graph.add_node(id));
        }
        for (id, slot) in self.iter_slots() {
            let (Some(split), Some(target)) = (splits[id.index()].as_ref(), nodes[id.index()])
            else {
                continue;
            };
            for crossing in slot.crossings.iter() {
                let Some(source) = nodes[crossing.path_id.index()] else {
                    continue;
                };
                for &node in crossing.overlap.iter() {
                    if split.is_bound_at(node) {
                        graph.add_edge(source, target, node);
                    }
                }
            }
        }
        graph
    }

    /// Remove one run-before edge of `cycle` by moving a split off its bound node, trying the
    /// highest ids first.  If no split can move, drop the highest id in the cycle.
    fn break_sequencing_cycle(
        &mut self,
        graph: &SequencingGraph,
        cycle: &[NodeIndex],
        splits: &mut [Option<Split>],
    ) {
        let mut bound = graph
            .edge_references()
            .filter(|edge| cycle.contains(&edge.source()) && cycle.contains(&edge.target()))
            .map(|edge| (graph[edge.target()], *edge.weight()))
            .collect::<SmallVec<[(PathId, PhysicalQubit); 4]>>();
        bound.sort_by(|a, b| b.0.cmp(&a.0));
        for (id, node) in bound {
            let Some(split) = splits[id.index()].as_mut() else {
                continue;
            };
            let crossings = self.crossings(id).unwrap_or_default();
            let free = |qubit: PhysicalQubit| !crossings.iter().any(|c| c.contains(qubit));
            if split.is_bound_at(node) && split.try_shift_boundary(node, free) {
                return;
            }
        }
        let Some(discard) = cycle.iter().map(|node| graph[*node]).max() else {
            return;
        };
        if self.remove_path_by_id(discard).is_ok() {
            tracing::debug!(
                "discarded path {}: its swaps conflict with a cycle of crossing paths",
                discard
            );
            splits[discard.index()] = None;
        }
    }

    /// Permute the registered paths, with their splits, into the slot order given by `order`.
    fn reorder_paths(&mut self, order: &[PathId], splits: &mut [Option<Split>]) {
        let slots = self.iter_slots().map(|(id, _)| id).collect::<Vec<_>>();
        let mut held = slots.clone();
        for (position, (&slot, wanted)) in slots.iter().zip(order).enumerate() {
            let Some(offset) = held[position..].iter().position(|id| id == wanted) else {
                continue;
            };
            if offset == 0 {
                continue;
            }
            let other = slots[position + offset];
            if self.swap_paths(slot, other).is_ok() {
                splits.swap(slot.index(), other.index());
                held.swap(position, position + offset);
            }
        }
    }

    /// Only one path is split at `node`, so its partners there must do their swaps first.  Move
    /// `path` into a slot after every partner.
    fn sequence_after_partners(
        &mut self,
        path: PathId,
        node: PhysicalQubit,
        splits: &mut [Option<Split>],
    ) {
        let mut partners = self
            .crossings(path)
            .unwrap_or_default()
            .iter()
            .filter(|crossing| crossing.contains(node))
            .map(|crossing| crossing.path_id)
            .collect::<BoundPaths>();
        partners.sort_unstable();
        let mut current = path;
        for partner in partners {
            if current < partner && self.swap_paths(current, partner).is_ok() {
                splits.swap(current.index(), partner.index());
                current = partner;
            }
        }
    }

    /// Several paths are split at `node`.  Try to move the split of the two longest away from it,
    /// and failing that, drop one of them.
    fn separate_bound_paths(
        &mut self,
        node: PhysicalQubit,
        bound: &[PathId],
        splits: &mut [Option<Split>],
    ) {
        let mut ranked = bound
            .iter()
            .map(|&id| (self.path_len(id), id))
            .collect::<SmallVec<[(usize, PathId); 4]>>();
        ranked.sort_unstable();
        let [.., (_, second), (_, first)] = ranked[..] else {
            return;
        };
        for id in [first, second] {
            let Some(split) = splits[id.index()].as_mut() else {
                continue;
            };
            let crossings = self.crossings(id).unwrap_or_default();
            let free = |qubit: PhysicalQubit| !crossings.iter().any(|c| c.contains(qubit));
            if split.try_shift_boundary(node, free) {
                return;
            }
        }
        let discard = first.max(second);
        if self.remove_path_by_id(discard).is_ok() {
            tracing::debug!(
                "discarded path {} at node {}: no split could be moved off the intersection",
                discard,
                node
            );
            splits[discard.index()] = None;
        }
    }

    #[inline]
    fn path_len(&self, id: PathId) -> usize {
        self.slot(id).map_or(0, |slot| slot.nodes.len())
    }
}

#[cfg(test)]
mod test {
    use rand::prelude::*;
    use rand_pcg::Pcg64Mcg;

    use crate::passes::path_map::{PathContainer, PathId};
    use graphmap_circuit::PhysicalQubit;

    fn qubits(nodes: &[u32]) -> Vec<PhysicalQubit> {
        nodes.iter().copied().map(PhysicalQubit::new).collect()
    }

    fn swaps(pairs: &[(u32, u32)]) -> Vec<[PhysicalQubit; 2]> {
        pairs
            .iter()
            .map(|&(a, b)| [PhysicalQubit(a), PhysicalQubit(b)])
            .collect()
    }

    fn container(paths: &[&[u32]]) -> PathContainer {
        let mut out = PathContainer::new();
        for path in paths {
            assert!(out.try_add_path(&qubits(path)), "failed to add {:?}", path);
        }
        out
    }

    fn paths(paths: &[&[u32]]) -> Vec<Vec<PhysicalQubit>> {
        paths.iter().map(|path| qubits(path)).collect()
    }

    #[test]
    fn no_intersection() {
        let mut container = container(&[&[0, 1, 2, 3], &[4, 5, 6], &[7, 8, 9, 10, 11]]);
        assert_eq!(
            container.generate_swaps(),
            swaps(&[(0, 1), (3, 2), (6, 5), (7, 8), (11, 10), (10, 9)])
        );
        assert_eq!(
            container.get_all_paths(),
            paths(&[&[0, 1, 2, 3], &[4, 5, 6], &[7, 8, 9, 10, 11]])
        );
    }

    #[test]
    fn two_node_path_needs_no_swaps() {
        let mut container = container(&[&[0, 1], &[2, 3, 4]]);
        assert_eq!(container.generate_swaps(), swaps(&[(4, 3)]));
    }

    #[test]
    fn empty_container() {
        assert!(PathContainer::new().generate_swaps().is_empty());
    }

    #[test]
    fn unresolvable_intersection_drops_path() {
        let mut container = container(&[&[0, 1, 2], &[3, 1, 4], &[10, 11, 12]]);
        assert_eq!(container.generate_swaps(), swaps(&[(2, 1), (12, 11)]));
        assert!(!container.contains(PathId(1)));
        assert_eq!(
            container.get_all_paths(),
            paths(&[&[0, 1, 2], &[10, 11, 12]])
        );
    }

    #[test]
    fn single_intersection_moves_split() {
        let mut container = container(&[&[0, 1, 2, 3], &[4, 1, 5], &[10, 11, 12]]);
        assert_eq!(
            container.generate_swaps(),
            swaps(&[(0, 1), (1, 2), (5, 1), (12, 11)])
        );
        assert_eq!(container.len(), 3);
    }

    #[test]
    fn single_intersection_reorders_paths() {
        let mut container = container(&[&[4, 1, 5], &[0, 1, 2, 3], &[10, 11, 12]]);
        assert_eq!(
            container.generate_swaps(),
            swaps(&[(0, 1), (1, 2), (5, 1), (12, 11)])
        );
        assert_eq!(
            container.get_all_paths(),
            paths(&[&[0, 1, 2, 3], &[4, 1, 5], &[10, 11, 12]])
        );
    }

    #[test]
    fn single_intersection_on_second_half() {
        let mut container = container(&[&[0, 1, 2, 3], &[4, 2, 5], &[10, 11, 12]]);
        assert_eq!(
            container.generate_swaps(),
            swaps(&[(3, 2), (2, 1), (5, 2), (12, 11)])
        );
    }

    #[test]
    fn bound_path_is_sequenced_last() {
        let mut container = container(&[&[9, 1, 10, 11], &[0, 1, 2, 3, 4, 5], &[6, 7, 8]]);
        assert_eq!(
            container.generate_swaps(),
            swaps(&[(0, 1), (1, 2), (5, 4), (4, 3), (9, 1), (11, 10), (8, 7)])
        );
        assert_eq!(
            container.get_all_paths(),
            paths(&[&[0, 1, 2, 3, 4, 5], &[9, 1, 10, 11], &[6, 7, 8]])
        );
    }

    #[test]
    fn double_crossing_shifts_head() {
        let mut container = container(&[&[0, 1, 2, 3, 4, 5], &[6, 2, 8], &[7, 4, 9, 10, 11, 12]]);
        assert_eq!(
            container.generate_swaps(),
            swaps(&[
                (5, 4),
                (4, 3),
                (3, 2),
                (2, 1),
                (8, 2),
                (7, 4),
                (4, 9),
                (12, 11),
                (11, 10),
            ])
        );
        assert_eq!(container.len(), 3);
    }

    #[test]
    fn double_crossing_shifts_tail() {
        let mut container = container(&[&[0, 1, 2, 3, 4, 5], &[7, 3, 9], &[6, 1, 8, 10, 11, 12]]);
        assert_eq!(
            container.generate_swaps(),
            swaps(&[
                (0, 1),
                (1, 2),
                (2, 3),
                (3, 4),
                (9, 3),
                (6, 1),
                (1, 8),
                (12, 11),
                (11, 10),
            ])
        );
        assert_eq!(container.len(), 3);
    }

    #[test]
    fn double_crossing_drops_one_path() {
        let mut container = container(&[&[0, 1, 2, 3], &[4, 1, 6], &[5, 2, 7]]);
        assert_eq!(
            container.generate_swaps(),
            swaps(&[(0, 1), (1, 2), (6, 1)])
        );
        assert_eq!(
            container.get_all_paths(),
            paths(&[&[0, 1, 2, 3], &[4, 1, 6]])
        );
    }

    #[test]
    fn double_crossing_drop_is_stable() {
        let mut container = container(&[&[0, 1, 2, 3, 4], &[5, 1, 7], &[6, 3, 8]]);
        let expected = swaps(&[(0, 1), (4, 3), (3, 2), (8, 3)]);
        assert_eq!(container.generate_swaps(), expected);
        assert_eq!(
            container.get_all_paths(),
            paths(&[&[0, 1, 2, 3, 4], &[6, 3, 8]])
        );
        assert_eq!(container.generate_swaps(), expected);
    }

    #[test]
    fn double_crossing_without_deletion() {
        let mut container = container(&[&[0, 1, 2, 3, 4], &[5, 6, 1, 8], &[7, 2, 9]]);
        assert_eq!(
            container.generate_swaps(),
            swaps(&[(0, 1), (1, 2), (2, 3), (5, 6), (8, 1), (9, 2)])
        );
        assert_eq!(
            container.get_all_paths(),
            paths(&[&[0, 1, 2, 3, 4], &[5, 6, 1, 8], &[7, 2, 9]])
        );
    }

    #[test]
    fn triple_crossing_at_one_node() {
        let mut container = container(&[
            &[9, 1, 10, 11],
            &[0, 1, 2, 3, 4, 5],
            &[6, 7, 8],
            &[12, 1, 13, 14, 15, 16],
        ]);
        assert_eq!(
            container.generate_swaps(),
            swaps(&[
                (0, 1),
                (1, 2),
                (5, 4),
                (4, 3),
                (12, 1),
                (1, 13),
                (16, 15),
                (15, 14),
                (8, 7),
                (9, 1),
                (11, 10),
            ])
        );
        assert_eq!(
            container.get_all_paths(),
            paths(&[
                &[0, 1, 2, 3, 4, 5],
                &[12, 1, 13, 14, 15, 16],
                &[6, 7, 8],
                &[9, 1, 10, 11],
            ])
        );
    }

    #[test]
    fn triple_crossing_along_one_path() {
        let mut container = container(&[
            &[0, 1, 2, 3, 4, 5],
            &[6, 1, 9, 12, 14, 16],
            &[7, 3, 10],
            &[8, 4, 11, 13, 15, 17],
        ]);
        assert_eq!(
            container.generate_swaps(),
            swaps(&[
                (0, 1),
                (1, 2),
                (5, 4),
                (4, 3),
                (6, 1),
                (1, 9),
                (16, 14),
                (14, 12),
                (8, 4),
                (4, 11),
                (17, 15),
                (15, 13),
            ])
        );
        assert!(!container.contains(PathId(2)));
        assert_eq!(container.len(), 3);
    }

    #[test]
    fn three_paths_bound_at_one_node() {
        let mut container = container(&[&[0, 1, 2, 3], &[4, 1, 7], &[10, 11, 12], &[5, 1, 6]]);
        assert_eq!(
            container.generate_swaps(),
            swaps(&[(0, 1), (1, 2), (7, 1), (12, 11)])
        );
        assert!(!container.contains(PathId(3)));
    }

    #[test]
    fn chained_crossings_discard_larger_id() {
        let mut container = container(&[&[0, 1, 2, 3], &[4, 1, 6, 8], &[5, 6, 7]]);
        assert_eq!(
            container.generate_swaps(),
            swaps(&[(0, 1), (1, 2), (4, 1), (8, 6)])
        );
        assert_eq!(
            container.get_all_paths(),
            paths(&[&[0, 1, 2, 3], &[4, 1, 6, 8]])
        );
    }

    /// Replay `swaps` and check that the two endpoint qubits of every surviving path finish on
    /// neighbouring nodes of that path.
    fn assert_endpoints_meet(container: &PathContainer, swaps: &[[PhysicalQubit; 2]]) {
        let size = container
            .get_all_nodes()
            .into_iter()
            .chain(swaps.iter().flatten().copied())
            .map(|node| node.index() + 1)
            .max()
            .unwrap_or(0);
        let mut position = (0..size as u32).collect::<Vec<u32>>();
        for [a, b] in swaps {
            position.swap(a.index(), b.index());
        }
        let located = |qubit: PhysicalQubit| {
            position
                .iter()
                .position(|&q| q == qubit.0)
                .map(|index| PhysicalQubit(index as u32))
                .unwrap()
        };
        for path in container.get_all_paths() {
            let (a, b) = (located(path[0]), located(path[path.len() - 1]));
            assert!(
                path.windows(2).any(|pair| *pair == [a, b] || *pair == [b, a]),
                "endpoints of {:?} finished on {} and {}",
                path,
                a,
                b
            );
        }
    }

    #[test]
    fn swaps_join_every_surviving_path() {
        let mut container = container(&[&[0, 1, 2, 3, 4, 5], &[6, 2, 8], &[7, 4, 9, 10, 11, 12]]);
        let swaps = container.generate_swaps();
        assert_endpoints_meet(&container, &swaps);
    }

    #[test]
    fn cyclic_bound_paths_are_reordered() {
        // Each path is split on the node it shares with the next one round the cycle, so no slot
        // order works until one of the splits moves.
        let mut container = container(&[
            &[29, 28, 27, 26, 25],
            &[32, 26, 20, 21, 22],
            &[13, 14, 15, 21, 27, 33],
        ]);
        let emitted = container.generate_swaps();
        assert_eq!(
            emitted,
            swaps(&[
                (25, 26),
                (26, 27),
                (27, 28),
                (32, 26),
                (22, 21),
                (21, 20),
                (13, 14),
                (14, 15),
                (33, 27),
                (27, 21),
            ])
        );
        assert_eq!(
            container.get_all_paths(),
            paths(&[
                &[29, 28, 27, 26, 25],
                &[32, 26, 20, 21, 22],
                &[13, 14, 15, 21, 27, 33],
            ])
        );
        assert_endpoints_meet(&container, &emitted);
    }

    /// A random shortest path between two nodes of a `size` by `size` grid.
    fn staircase(rng: &mut Pcg64Mcg, size: u32) -> Vec<PhysicalQubit> {
        let (mut row, mut col) = (rng.gen_range(0..size), rng.gen_range(0..size));
        let (end_row, end_col) = (rng.gen_range(0..size), rng.gen_range(0..size));
        let mut out = vec![PhysicalQubit(col + size * row)];
        while (row, col) != (end_row, end_col) {
            if col == end_col || (row != end_row && rng.gen_bool(0.5)) {
                row = if end_row > row { row + 1 } else { row - 1 };
            } else {
                col = if end_col > col { col + 1 } else { col - 1 };
            }
            out.push(PhysicalQubit(col + size * row));
        }
        out
    }

    #[test]
    fn random_grid_paths_always_meet() {
        let mut rng = Pcg64Mcg::seed_from_u64(2024);
        for _ in 0..2000 {
            let mut container = PathContainer::new();
            for _ in 0..8 {
                container.try_add_path(&staircase(&mut rng, 6));
            }
            let swaps = container.generate_swaps();
            assert_endpoints_meet(&container, &swaps);
        }
    }
}
