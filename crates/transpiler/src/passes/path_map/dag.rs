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

use rustworkx_core::petgraph::prelude::*;
use smallvec::SmallVec;
use thiserror::Error;

use graphmap_circuit::VirtualQubit;

/// Reasons an operation list cannot be turned into an [InteractionDag].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DagError {
    #[error("qubit {qubit} of operation {op} is out of range for {num_qubits} qubits")]
    QubitOutOfRange {
        op: usize,
        qubit: VirtualQubit,
        num_qubits: usize,
    },
    #[error("operation {0} acts on no qubits")]
    NoQubits(usize),
    #[error("operation {op} acts on {count} qubits, but at most two are supported")]
    TooManyQubits { op: usize, count: usize },
    #[error("operation {op} acts on qubit {qubit} more than once")]
    RepeatedQubit { op: usize, qubit: VirtualQubit },
}

/// Named access to the node elements in the [InteractionDag].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DAGNode {
    /// Position of the operation in the input sequence.
    pub index: usize,
    pub qubits: SmallVec<[VirtualQubit; 2]>,
}

impl DAGNode {
    /// The qubit pair, if this is a two-qubit operation.
    #[inline]
    pub fn interaction(&self) -> Option<[VirtualQubit; 2]> {
        match self.qubits[..] {
            [a, b] => Some([a, b]),
            _ => None,
        }
    }
}

/// A DAG representation of the logical circuit to be routed.  This only stores the dataflow
/// dependencies between the operations, not _what_ the operations are: each operation depends on
/// the previous operation on each of its qubits.  All qubit references are to virtual qubits.
#[derive(Clone, Debug)]
pub struct InteractionDag {
    pub num_qubits: usize,
    pub dag: DiGraph<DAGNode, ()>,
    /// Nodes with no predecessors, in input order.
    pub first_layer: Vec<NodeIndex>,
}

impl InteractionDag {
    pub fn new<I, Q>(num_qubits: usize, ops: I) -> Result<Self, DagError>
    where
        I: IntoIterator<Item = Q>,
        Q: AsRef<[VirtualQubit]>,
    {
        let ops = ops.into_iter();
        let mut qubit_pos: Vec<Option<NodeIndex>> = vec![None; num_qubits];
        let mut dag = DiGraph::with_capacity(ops.size_hint().0, 2 * ops.size_hint().0);
        let mut first_layer = Vec::<NodeIndex>::new();
        for (op, qubits) in ops.enumerate() {
            let qubits = qubits.as_ref();
            match qubits {
                [] => return Err(DagError::NoQubits(op)),
                [a, b] if a == b => return Err(DagError::RepeatedQubit { op, qubit: *a }),
                [_] | [_, _] => (),
                _ => {
                    return Err(DagError::TooManyQubits {
                        op,
                        count: qubits.len(),
                    })
                }
            }
            if let Some(&qubit) = qubits.iter().find(|qubit| qubit.index() >= num_qubits) {
                return Err(DagError::QubitOutOfRange {
                    op,
                    qubit,
                    num_qubits,
                });
            }
            let gate_index = dag.add_node(DAGNode {
                index: op,
                qubits: qubits.iter().copied().collect(),
            });
            let mut is_front = true;
            for qubit in qubits {
                if let Some(predecessor) = qubit_pos[qubit.index()] {
                    is_front = false;
                    dag.update_edge(predecessor, gate_index, ());
                }
                qubit_pos[qubit.index()] = Some(gate_index);
            }
            if is_front {
                first_layer.push(gate_index);
            }
        }
        Ok(InteractionDag {
            num_qubits,
            dag,
            first_layer,
        })
    }

    #[inline]
    pub fn node(&self, index: NodeIndex) -> &DAGNode {
        &self.dag[index]
    }

    /// Number of operations.
    #[inline]
    pub fn len(&self) -> usize {
        self.dag.node_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dag.node_count() == 0
    }
}
