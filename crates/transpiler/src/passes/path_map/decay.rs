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

use graphmap_circuit::PhysicalQubit;

use super::heuristic::DecayHeuristic;

/// Per-qubit multipliers that make recently swapped qubits more expensive to route through.
#[derive(Clone, Debug)]
pub struct QubitsDecay {
    decay: Vec<f64>,
    heuristic: DecayHeuristic,
    /// Swaps registered since the last reset.
    steps: usize,
}

impl QubitsDecay {
    pub fn new(num_qubits: usize, heuristic: DecayHeuristic) -> Self {
        QubitsDecay {
            decay: vec![1.; num_qubits],
            heuristic,
            steps: 0,
        }
    }

    #[inline]
    pub fn cost_bias(&self, qubit: PhysicalQubit) -> f64 {
        self.decay[qubit.index()]
    }

    /// The cost of routing over the link `a - b`.
    #[inline]
    pub fn edge_cost(&self, a: PhysicalQubit, b: PhysicalQubit) -> f64 {
        self.cost_bias(a).max(self.cost_bias(b))
    }

    pub fn register_swap(&mut self, swap: [PhysicalQubit; 2]) {
        self.steps += 1;
        if self.steps % self.heuristic.reset == 0 {
            self.decay_all();
        } else {
            for qubit in swap {
                self.decay[qubit.index()] += self.heuristic.increment;
            }
        }
    }

    /// Reset every multiplier to 1.0.
    pub fn decay_all(&mut self) {
        self.decay.fill(1.);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.decay.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.decay.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn swaps_raise_cost_until_reset() {
        let mut decay = QubitsDecay::new(
            4,
            DecayHeuristic {
                increment: 0.5,
                reset: 3,
            },
        );
        let q = PhysicalQubit::new;
        assert_eq!(decay.edge_cost(q(0), q(1)), 1.0);
        decay.register_swap([q(0), q(1)]);
        assert_eq!(decay.cost_bias(q(0)), 1.5);
        assert_eq!(decay.cost_bias(q(1)), 1.5);
        assert_eq!(decay.cost_bias(q(2)), 1.0);
        decay.register_swap([q(1), q(2)]);
        assert_eq!(decay.cost_bias(q(1)), 2.0);
        assert_eq!(decay.edge_cost(q(1), q(3)), 2.0);
        assert_eq!(decay.edge_cost(q(2), q(3)), 1.5);
        // The third swap hits the reset interval.
        decay.register_swap([q(2), q(3)]);
        assert!((0..4).all(|i| decay.cost_bias(q(i)) == 1.0));
        decay.register_swap([q(2), q(3)]);
        assert_eq!(decay.cost_bias(q(3)), 1.5);
    }

    #[test]
    fn explicit_reset() {
        let mut decay = QubitsDecay::new(2, DecayHeuristic::default());
        decay.register_swap([PhysicalQubit(0), PhysicalQubit(1)]);
        assert!(decay.cost_bias(PhysicalQubit(0)) > 1.0);
        decay.decay_all();
        assert_eq!(decay.cost_bias(PhysicalQubit(0)), 1.0);
        assert_eq!(decay.len(), 2);
    }
}
