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

//! Path-based routing.
//!
//! Every round, the router proposes one shortest path per ready two-qubit interaction.  The
//! [PathContainer] accepts the paths that can be swapped along in the same round (no shared
//! endpoints, at most one shared node per pair), and [PathContainer::generate_swaps] orders the
//! swaps along all of them so that crossing paths do not undo each other's work.

mod cache;
mod container;
mod crossing;
mod dag;
mod decay;
pub mod heuristic;
mod layer;
mod route;
mod sequencer;

pub use cache::PathCache;
pub use container::{PathContainer, PathError};
pub use crossing::{Crossing, Overlap, PathId};
pub use dag::{DAGNode, DagError, InteractionDag};
pub use decay::QubitsDecay;
pub use heuristic::{ConfigError, DecayHeuristic, RouterConfig};
pub use layer::Frontier;
pub use route::{
    route_circuit, swap_depth, RoutedOp, Router, RoutingError, RoutingResult, RoutingStats,
};
