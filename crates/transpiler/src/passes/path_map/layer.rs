// This code is part of graphmap, a derivative of Qiskit.
//
// (C) Copyright IBM 2023
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

use std::collections::VecDeque;

use indexmap::IndexMap;
use rustworkx_core::petgraph::prelude::*;
use rustworkx_core::petgraph::visit::EdgeRef;

use graphmap_circuit::VirtualQubit;

use super::dag::InteractionDag;

/// The set of two-qubit interactions whose predecessors have all been executed.
///
/// One-qubit operations never need routing, so they are completed as soon as they become reachable
/// and only ever pass through the list of completed nodes.  Two-qubit operations wait in the ready
/// set until the router resolves them.
#[derive(Clone, Debug)]
pub struct Frontier<'a> {
    dag: &'a InteractionDag,
    /// Number of predecessors of each node that have not yet completed.
    required_predecessors: Vec<u32>,
    /// Ready interactions and the virtual qubits they act on, in the order they became ready.
    ready: IndexMap<NodeIndex, [VirtualQubit; 2], ::ahash::RandomState>,
    /// The ready interaction on each virtual qubit, if any.
    qubits: Vec<Option<NodeIndex>>,
    completed: Vec<NodeIndex>,
}

impl<'a> Frontier<'a> {
    pub fn new(dag: &'a InteractionDag) -> Self {
        let required_predecessors = dag
            .dag
            .node_indices()
            .map(|node| dag.dag.edges_directed(node, Incoming).count() as u32)
            .collect();
        let mut out = Frontier {
            dag,
            required_predecessors,
            ready: IndexMap::with_capacity_and_hasher(
                dag.num_qubits / 2,
                ::ahash::RandomState::default(),
            ),
            qubits: vec![None; dag.num_qubits],
            completed: Vec::with_capacity(dag.len()),
        };
        out.visit(dag.first_layer.iter().copied());
        out
    }

    /// Walk forwards from newly reachable nodes, completing one-qubit operations and queueing
    /// interactions.
    fn visit(&mut self, reachable: impl IntoIterator<Item = NodeIndex>) {
        let mut to_visit = reachable.into_iter().collect::<VecDeque<_>>();
        while let Some(node) = to_visit.pop_front() {
            match self.dag.node(node).interaction() {
                Some(qubits) => {
                    let [a, b] = qubits;
                    self.qubits[a.index()] = Some(node);
                    self.qubits[b.index()] = Some(node);
                    self.ready.insert(node, qubits);
                }
                None => {
                    self.completed.push(node);
                    self.release_successors(node, &mut to_visit);
                }
            }
        }
    }

    fn release_successors(&mut self, node: NodeIndex, to_visit: &mut VecDeque<NodeIndex>) {
        let dag = self.dag;
        for edge in dag.dag.edges_directed(node, Outgoing) {
            let successor = edge.target();
            let remaining = &mut self.required_predecessors[successor.index()];
            *remaining -= 1;
            if *remaining == 0 {
                to_visit.push_back(successor);
            }
        }
    }

    /// The ready interactions, in the order they became ready.
    pub fn ready_interactions(&self) -> impl Iterator<Item = (NodeIndex, [VirtualQubit; 2])> + '_ {
        self.ready.iter().map(|(node, qubits)| (*node, *qubits))
    }

    /// The ready interaction acting on `qubit`, if any.
    #[inline]
    pub fn interaction_on(&self, qubit: VirtualQubit) -> Option<NodeIndex> {
        self.qubits[qubit.index()]
    }

    /// Mark the ready interaction between `a` and `b` as executed, and advance the frontier past
    /// it.  Returns `None` if there is no such ready interaction.
    pub fn mark_resolved(&mut self, a: VirtualQubit, b: VirtualQubit) -> Option<NodeIndex> {
        let node = self.qubits[a.index()]?;
        let qubits = *self.ready.get(&node)?;
        if qubits != [a, b] && qubits != [b, a] {
            return None;
        }
        self.ready.shift_remove(&node);
        self.qubits[a.index()] = None;
        self.qubits[b.index()] = None;
        self.completed.push(node);
        let mut to_visit = VecDeque::new();
        self.release_successors(node, &mut to_visit);
        self.visit(to_visit);
        Some(node)
    }

    /// Take the nodes completed since the last call, in completion order.
    pub fn drain_completed(&mut self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.completed.drain(..)
    }

    /// Number of ready interactions.
    #[inline]
    pub fn len(&self) -> usize {
        self.ready.len()
    }

    /// Is there nothing left to route?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ready.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn v(qubit: u32) -> VirtualQubit {
        VirtualQubit::new(qubit)
    }

    fn indices(nodes: impl Iterator<Item = NodeIndex>) -> Vec<usize> {
        nodes.map(|node| node.index()).collect()
    }

    #[test]
    fn one_qubit_ops_complete_immediately() {
        let dag = InteractionDag::new(
            3,
            [
                vec![v(0)],
                vec![v(0), v(1)],
                vec![v(2)],
                vec![v(1)],
                vec![v(1), v(2)],
            ],
        )
        .unwrap();
        let mut frontier = Frontier::new(&dag);
        assert_eq!(indices(frontier.drain_completed()), vec![0, 2]);
        assert_eq!(
            frontier.ready_interactions().collect::<Vec<_>>(),
            vec![(NodeIndex::new(1), [v(0), v(1)])]
        );
        assert_eq!(frontier.interaction_on(v(1)), Some(NodeIndex::new(1)));
        assert_eq!(frontier.interaction_on(v(2)), None);

        assert_eq!(frontier.mark_resolved(v(1), v(0)), Some(NodeIndex::new(1)));
        assert_eq!(indices(frontier.drain_completed()), vec![1, 3]);
        assert_eq!(
            frontier.ready_interactions().collect::<Vec<_>>(),
            vec![(NodeIndex::new(4), [v(1), v(2)])]
        );
        assert_eq!(frontier.mark_resolved(v(1), v(2)), Some(NodeIndex::new(4)));
        assert_eq!(indices(frontier.drain_completed()), vec![4]);
        assert!(frontier.is_empty());
    }

    #[test]
    fn resolving_unknown_interaction_is_a_no_op() {
        let dag = InteractionDag::new(4, [[v(0), v(1)], [v(2), v(3)]]).unwrap();
        let mut frontier = Frontier::new(&dag);
        assert_eq!(frontier.len(), 2);
        assert_eq!(frontier.mark_resolved(v(0), v(2)), None);
        assert_eq!(frontier.mark_resolved(v(1), v(3)), None);
        assert_eq!(frontier.len(), 2);
        assert_eq!(frontier.mark_resolved(v(3), v(2)), Some(NodeIndex::new(1)));
        assert_eq!(
            frontier.ready_interactions().collect::<Vec<_>>(),
            vec![(NodeIndex::new(0), [v(0), v(1)])]
        );
    }

    #[test]
    fn interaction_waits_for_both_predecessors() {
        let dag = InteractionDag::new(4, [[v(0), v(1)], [v(2), v(3)], [v(1), v(2)]]).unwrap();
        let mut frontier = Frontier::new(&dag);
        frontier.mark_resolved(v(0), v(1));
        assert_eq!(frontier.len(), 1);
        assert_eq!(frontier.interaction_on(v(1)), None);
        frontier.mark_resolved(v(2), v(3));
        assert_eq!(
            frontier.ready_interactions().collect::<Vec<_>>(),
            vec![(NodeIndex::new(2), [v(1), v(2)])]
        );
    }
}
