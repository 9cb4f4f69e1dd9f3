// This code is part of graphmap, a derivative of Qiskit.
//
// (C) Copyright IBM 2022
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

use rustworkx_core::petgraph::algo::connected_components;
use rustworkx_core::petgraph::prelude::*;
use thiserror::Error;

use graphmap_circuit::PhysicalQubit;

/// The reasons that construction of a [CouplingGraph] might fail.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouplingError {
    #[error("the coupling graph has no qubits")]
    Empty,
    #[error("edge ({0}, {1}) refers to a qubit outside the coupling graph")]
    QubitOutOfBounds(u32, u32),
    #[error("qubit {0} is coupled to itself")]
    SelfLoop(u32),
    #[error("the coupling graph is not connected")]
    Disconnected,
}

/// The static connectivity of a device.  The nodes are the physical qubits, and an edge means a
/// two-qubit operation may be applied directly to that pair.
///
/// Couplings are symmetric for routing purposes, but the graph is stored as a directed graph with
/// both directions of every link present, so that directed traversals (like Dijkstra's search)
/// see every neighbour as an outgoing edge.
#[derive(Clone, Debug)]
pub struct CouplingGraph {
    graph: DiGraph<(), ()>,
}

impl CouplingGraph {
    /// Build the coupling graph of `num_qubits` physical qubits from a list of undirected links.
    /// Duplicate links (in either direction) are collapsed.  The graph must be connected, since
    /// otherwise some interactions could never be routed.
    pub fn new(num_qubits: u32, edges: &[[u32; 2]]) -> Result<Self, CouplingError> {
        if num_qubits == 0 {
            return Err(CouplingError::Empty);
        }
        let mut graph = DiGraph::with_capacity(num_qubits as usize, 2 * edges.len());
        for _ in 0..num_qubits {
            graph.add_node(());
        }
        for &[a, b] in edges {
            if a >= num_qubits || b >= num_qubits {
                return Err(CouplingError::QubitOutOfBounds(a, b));
            }
            if a == b {
                return Err(CouplingError::SelfLoop(a));
            }
            let (a, b) = (NodeIndex::new(a as usize), NodeIndex::new(b as usize));
            graph.update_edge(a, b, ());
            graph.update_edge(b, a, ());
        }
        if connected_components(&graph) != 1 {
            return Err(CouplingError::Disconnected);
        }
        Ok(CouplingGraph { graph })
    }

    /// A linear chain `0 - 1 - ... - (n - 1)`.
    pub fn line(num_qubits: u32) -> Result<Self, CouplingError> {
        let edges = (1..num_qubits).map(|q| [q - 1, q]).collect::<Vec<_>>();
        Self::new(num_qubits, &edges)
    }

    /// A closed chain, where the last qubit is also coupled to the first.
    pub fn ring(num_qubits: u32) -> Result<Self, CouplingError> {
        let mut edges = (1..num_qubits).map(|q| [q - 1, q]).collect::<Vec<_>>();
        if num_qubits > 2 {
            edges.push([num_qubits - 1, 0]);
        }
        Self::new(num_qubits, &edges)
    }

    /// A rectangular nearest-neighbour lattice.  Qubit `col + cols * row` sits at `(row, col)`.
    pub fn grid(rows: u32, cols: u32) -> Result<Self, CouplingError> {
        let mut edges = Vec::new();
        for row in 0..rows {
            for col in 0..cols {
                let qubit = col + cols * row;
                if col + 1 < cols {
                    edges.push([qubit, qubit + 1]);
                }
                if row + 1 < rows {
                    edges.push([qubit, qubit + cols]);
                }
            }
        }
        Self::new(rows * cols, &edges)
    }

    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.graph.node_count()
    }

    /// Are two qubits directly coupled?
    #[inline]
    pub fn contains_edge(&self, left: PhysicalQubit, right: PhysicalQubit) -> bool {
        self.graph
            .contains_edge(NodeIndex::new(left.index()), NodeIndex::new(right.index()))
    }

    /// The qubits directly coupled to `qubit`, in ascending order.
    pub fn neighbors(&self, qubit: PhysicalQubit) -> Vec<PhysicalQubit> {
        let mut out = self
            .graph
            .neighbors(NodeIndex::new(qubit.index()))
            .map(|n| PhysicalQubit::new(n.index() as u32))
            .collect::<Vec<_>>();
        out.sort_unstable();
        out
    }

    /// Every link once, as an ordered `[low, high]` pair.
    pub fn edges(&self) -> impl Iterator<Item = [PhysicalQubit; 2]> + '_ {
        self.graph.edge_indices().filter_map(|edge| {
            let (a, b) = self.graph.edge_endpoints(edge)?;
            (a < b).then(|| {
                [
                    PhysicalQubit::new(a.index() as u32),
                    PhysicalQubit::new(b.index() as u32),
                ]
            })
        })
    }

    /// The underlying graph, with both directions of each link.
    #[inline]
    pub fn graph(&self) -> &DiGraph<(), ()> {
        &self.graph
    }
}
