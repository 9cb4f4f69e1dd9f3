// This code is part of graphmap, a derivative of Qiskit.
//
// (C) Copyright IBM 2025
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

use fixedbitset::FixedBitSet;
use ndarray::{Array2, ArrayViewMut1, Axis};
use rustworkx_core::petgraph::prelude::*;

use crate::coupling::CouplingGraph;

/// Hop distance between every pair of physical qubits of a coupling graph.  The graph is required
/// to be connected, so every entry is filled in.
pub fn distance_matrix(coupling: &CouplingGraph) -> Array2<usize> {
    let n = coupling.num_qubits();
    let mut out = Array2::from_elem((n, n), usize::MAX);
    let mut visited = FixedBitSet::with_capacity(n);
    let mut queue = VecDeque::with_capacity(n);
    for (start, row) in out.axis_iter_mut(Axis(0)).enumerate() {
        visited.clear();
        queue.clear();
        fill_row(coupling.graph(), start, row, &mut visited, &mut queue);
    }
    out
}

/// Breadth-first walk out from `start`, writing the depth of each reached node into `row`.
fn fill_row(
    graph: &DiGraph<(), ()>,
    start: usize,
    mut row: ArrayViewMut1<usize>,
    visited: &mut FixedBitSet,
    queue: &mut VecDeque<(NodeIndex, usize)>,
) {
    visited.insert(start);
    queue.push_back((NodeIndex::new(start), 0));
    while let Some((node, depth)) = queue.pop_front() {
        row[node.index()] = depth;
        for neighbor in graph.neighbors(node) {
            if !visited.put(neighbor.index()) {
                queue.push_back((neighbor, depth + 1));
            }
        }
    }
}
