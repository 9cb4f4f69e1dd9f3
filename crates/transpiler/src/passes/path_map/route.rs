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

use hashbrown::HashMap;
use ndarray::prelude::*;
use rustworkx_core::dictmap::*;
use rustworkx_core::petgraph::prelude::*;
use rustworkx_core::petgraph::visit::EdgeRef;
use rustworkx_core::shortest_path::dijkstra;
use smallvec::SmallVec;
use thiserror::Error;

use graphmap_circuit::{NLayout, PhysicalQubit, VirtualQubit};

use super::cache::PathCache;
use super::container::PathContainer;
use super::dag::InteractionDag;
use super::decay::QubitsDecay;
use super::heuristic::{ConfigError, RouterConfig};
use super::layer::Frontier;
use crate::coupling::CouplingGraph;
use crate::distance::distance_matrix;

/// Failures of the path-based router.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoutingError {
    #[error("the layout places {layout} virtual qubits, but the circuit uses {circuit}")]
    LayoutTooSmall { layout: usize, circuit: usize },
    #[error("the layout covers {layout} physical qubits, but the coupling graph has {coupling}")]
    LayoutWidth { layout: usize, coupling: usize },
    #[error("no route from physical qubit {0} to {1}")]
    NoRoute(PhysicalQubit, PhysicalQubit),
    #[error("routing stalled with {0} interactions outstanding")]
    Stalled(usize),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// One element of the routed output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoutedOp {
    /// An operation of the input circuit, with the physical qubits it acts on at its position in
    /// the output.  `index` is the position of the operation in the input.
    Gate {
        index: usize,
        qubits: SmallVec<[PhysicalQubit; 2]>,
    },
    /// An inserted swap.
    Swap([PhysicalQubit; 2]),
}

/// Summary of a routing run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoutingStats {
    /// Number of sequencing rounds that inserted swaps.
    pub rounds: usize,
    pub swaps: usize,
    /// Paths accepted by the container but dropped during sequencing.
    pub discarded_paths: usize,
    /// Ready interactions that could not be given a path in some round.
    pub deferred_interactions: usize,
    /// Rounds in which the closest interaction had to be routed on its own.
    pub forced_routes: usize,
    /// Histogram of the parallel depth of the swaps of each round.
    pub swap_depths: HashMap<usize, usize>,
    /// Histogram of the number of swaps inserted in each round.
    pub swaps_per_round: HashMap<usize, usize>,
    /// How often each interacting pair of virtual qubits (lower index first) was routed.
    pub interactions: HashMap<[VirtualQubit; 2], usize>,
}

/// The output of [Router::route].
#[derive(Clone, Debug)]
pub struct RoutingResult {
    pub ops: Vec<RoutedOp>,
    pub final_layout: NLayout,
    pub stats: RoutingStats,
}

impl RoutingResult {
    /// The inserted swaps, in order.
    pub fn swaps(&self) -> impl Iterator<Item = [PhysicalQubit; 2]> + '_ {
        self.ops.iter().filter_map(|op| match op {
            RoutedOp::Swap(swap) => Some(*swap),
            RoutedOp::Gate { .. } => None,
        })
    }
}

/// The depth of a list of swaps, if every swap runs as early as the swaps before it on the same
/// qubits allow.
pub fn swap_depth(swaps: &[[PhysicalQubit; 2]]) -> usize {
    let mut layer = HashMap::<PhysicalQubit, usize>::with_capacity(2 * swaps.len());
    let mut depth = 0;
    for &[a, b] in swaps {
        let next = 1 + layer
            .get(&a)
            .copied()
            .unwrap_or(0)
            .max(layer.get(&b).copied().unwrap_or(0));
        layer.insert(a, next);
        layer.insert(b, next);
        depth = depth.max(next);
    }
    depth
}

/// Everything that changes while a single circuit is routed.
struct RoutingState<'a> {
    dag: &'a InteractionDag,
    frontier: Frontier<'a>,
    layout: NLayout,
    decay: Option<QubitsDecay>,
    ops: Vec<RoutedOp>,
    stats: RoutingStats,
}

impl RoutingState<'_> {
    #[inline]
    fn physical_pair(&self, [a, b]: [VirtualQubit; 2]) -> [PhysicalQubit; 2] {
        [a.to_phys(&self.layout), b.to_phys(&self.layout)]
    }

    /// Emit every operation the frontier has completed, at the current layout.
    fn emit_completed(&mut self) {
        for node in self.frontier.drain_completed() {
            let node = self.dag.node(node);
            self.ops.push(RoutedOp::Gate {
                index: node.index,
                qubits: node
                    .qubits
                    .iter()
                    .map(|qubit| qubit.to_phys(&self.layout))
                    .collect(),
            });
        }
    }

    /// Execute ready interactions whose qubits are adjacent, until none are left.  Returns the
    /// number executed.
    fn execute_adjacent(&mut self, coupling: &CouplingGraph) -> usize {
        let mut executed = 0;
        loop {
            let adjacent = self
                .frontier
                .ready_interactions()
                .filter(|&(_, qubits)| {
                    let [a, b] = self.physical_pair(qubits);
                    coupling.contains_edge(a, b)
                })
                .map(|(_, qubits)| qubits)
                .collect::<SmallVec<[[VirtualQubit; 2]; 4]>>();
            if adjacent.is_empty() {
                return executed;
            }
            for [a, b] in adjacent {
                if self.frontier.mark_resolved(a, b).is_some() {
                    executed += 1;
                }
            }
            self.emit_completed();
        }
    }

    fn apply_swap(&mut self, swap: [PhysicalQubit; 2]) {
        let [a, b] = swap;
        self.layout.swap_physical(a, b);
        if let Some(decay) = self.decay.as_mut() {
            decay.register_swap(swap);
        }
        self.ops.push(RoutedOp::Swap(swap));
    }
}

/// Router that makes every two-qubit operation of a circuit act on coupled qubits, by moving many
/// interacting pairs together at once along non-conflicting paths.
///
/// Each round proposes one path per ready interaction, closest interactions first.  The
/// [PathContainer] keeps the paths that can be swapped along together, and its sequencer turns
/// them into swaps.
pub struct Router<'a> {
    coupling: &'a CouplingGraph,
    config: RouterConfig,
    distance: Array2<usize>,
    paths: PathContainer,
    cache: PathCache,
}

impl<'a> Router<'a> {
    pub fn new(coupling: &'a CouplingGraph, config: RouterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Router {
            coupling,
            distance: distance_matrix(coupling),
            paths: PathContainer::new(),
            cache: PathCache::new(config.path_length_threshold),
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Route `dag`, starting from `initial_layout`.
    pub fn route(
        &mut self,
        dag: &InteractionDag,
        initial_layout: &NLayout,
    ) -> Result<RoutingResult, RoutingError> {
        if initial_layout.num_physical_qubits() != self.coupling.num_qubits() {
            return Err(RoutingError::LayoutWidth {
                layout: initial_layout.num_physical_qubits(),
                coupling: self.coupling.num_qubits(),
            });
        }
        if initial_layout.num_qubits() < dag.num_qubits {
            return Err(RoutingError::LayoutTooSmall {
                layout: initial_layout.num_qubits(),
                circuit: dag.num_qubits,
            });
        }
        let mut state = RoutingState {
            dag,
            frontier: Frontier::new(dag),
            layout: initial_layout.clone(),
            decay: self
                .config
                .decay
                .map(|heuristic| QubitsDecay::new(self.coupling.num_qubits(), heuristic)),
            ops: Vec::with_capacity(dag.len()),
            stats: RoutingStats::default(),
        };
        state.emit_completed();
        state.execute_adjacent(self.coupling);
        while !state.frontier.is_empty() {
            if self.route_round(&mut state)? == 0 {
                state.stats.forced_routes += 1;
                if self.force_closest_interaction(&mut state)? == 0 {
                    return Err(RoutingError::Stalled(state.frontier.len()));
                }
            }
        }
        self.paths.clear();
        Ok(RoutingResult {
            ops: state.ops,
            final_layout: state.layout,
            stats: state.stats,
        })
    }

    /// Offer a path for every ready interaction, then apply the swaps of those that survive
    /// sequencing.  Returns the number of interactions executed.
    fn route_round(&mut self, state: &mut RoutingState) -> Result<usize, RoutingError> {
        self.paths.clear();
        let mut ready = state
            .frontier
            .ready_interactions()
            .map(|(_, qubits)| {
                let [a, b] = state.physical_pair(qubits);
                (self.distance[[a.index(), b.index()]], qubits)
            })
            .collect::<Vec<_>>();
        ready.sort_by_key(|(distance, _)| *distance);
        let limit = self.config.max_paths_per_round.unwrap_or(usize::MAX);
        for (position, (_, qubits)) in ready.iter().enumerate() {
            if self.paths.len() >= limit {
                state.stats.deferred_interactions += ready.len() - position;
                break;
            }
            let [a, b] = state.physical_pair(*qubits);
            let path = self.shortest_path(a, b, state.decay.as_ref())?;
            if self.paths.try_add_path(&path)
                || (self.config.alternative_paths
                    && self.try_alternative_paths(a, b, state.decay.as_ref())?)
            {
                continue;
            }
            tracing::trace!("deferred interaction {:?} on {} and {}", qubits, a, b);
            state.stats.deferred_interactions += 1;
        }
        if let Some(order) = self.config.max_crossing_order {
            let offered = self.paths.len();
            self.paths.remove_crossing_of_order_higher_than(order);
            state.stats.discarded_paths += offered - self.paths.len();
        }
        Ok(self.sequence(state))
    }

    /// The release valve: route only the closest ready interaction, which always succeeds because a
    /// lone path never conflicts.
    fn force_closest_interaction(
        &mut self,
        state: &mut RoutingState,
    ) -> Result<usize, RoutingError> {
        self.paths.clear();
        let Some([a, b]) = state
            .frontier
            .ready_interactions()
            .map(|(_, qubits)| state.physical_pair(qubits))
            .min_by_key(|[a, b]| self.distance[[a.index(), b.index()]])
        else {
            return Ok(0);
        };
        let path = self.shortest_path(a, b, state.decay.as_ref())?;
        tracing::debug!("forcing route between {} and {} along {:?}", a, b, path);
        if !self.paths.try_add_path(&path) {
            return Err(RoutingError::NoRoute(a, b));
        }
        Ok(self.sequence(state))
    }

    /// Turn the registered paths into swaps, apply them, and execute everything that became
    /// adjacent.
    fn sequence(&mut self, state: &mut RoutingState) -> usize {
        let offered = self.paths.len();
        let swaps = self.paths.generate_swaps();
        state.stats.discarded_paths += offered - self.paths.len();
        let routed = state
            .frontier
            .ready_interactions()
            .filter(|&(_, qubits)| {
                let [a, b] = state.physical_pair(qubits);
                self.paths.find_interaction(a, b).is_some()
            })
            .map(|(_, [a, b])| [a.min(b), a.max(b)])
            .collect::<Vec<_>>();
        for pair in routed {
            *state.stats.interactions.entry(pair).or_insert(0) += 1;
        }
        if !swaps.is_empty() {
            state.stats.rounds += 1;
            state.stats.swaps += swaps.len();
            *state
                .stats
                .swap_depths
                .entry(swap_depth(&swaps))
                .or_insert(0) += 1;
            *state.stats.swaps_per_round.entry(swaps.len()).or_insert(0) += 1;
        }
        tracing::debug!(
            "sequenced {} of {} paths into {} swaps",
            self.paths.len(),
            offered,
            swaps.len()
        );
        for swap in swaps {
            state.apply_swap(swap);
        }
        self.paths.clear();
        state.execute_adjacent(self.coupling)
    }

    /// Retry a rejected interaction through each neighbour of either endpoint.
    fn try_alternative_paths(
        &mut self,
        a: PhysicalQubit,
        b: PhysicalQubit,
        decay: Option<&QubitsDecay>,
    ) -> Result<bool, RoutingError> {
        for neighbor in self.coupling.neighbors(a) {
            if neighbor == b {
                continue;
            }
            let mut path = vec![a];
            path.extend(self.shortest_path(neighbor, b, decay)?);
            if self.paths.try_add_path(&path) {
                return Ok(true);
            }
        }
        for neighbor in self.coupling.neighbors(b) {
            if neighbor == a {
                continue;
            }
            let mut path = self.shortest_path(a, neighbor, decay)?;
            path.push(b);
            if self.paths.try_add_path(&path) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// The cheapest path from `a` to `b`.  Links are weighted by the decay multipliers if there are
    /// any, and the path cache is used only when there are not.
    fn shortest_path(
        &mut self,
        a: PhysicalQubit,
        b: PhysicalQubit,
        decay: Option<&QubitsDecay>,
    ) -> Result<Vec<PhysicalQubit>, RoutingError> {
        let use_cache = decay.is_none() && self.config.enable_caching;
        if use_cache {
            if let Some(path) = self.cache.get_path(a, b) {
                return Ok(path);
            }
        }
        let (start, goal) = (NodeIndex::new(a.index()), NodeIndex::new(b.index()));
        let mut shortest_paths: DictMap<NodeIndex, Vec<NodeIndex>> = DictMap::new();
        let _: Vec<Option<f64>> = dijkstra(
            self.coupling.graph(),
            start,
            Some(goal),
            |edge| {
                Ok::<_, RoutingError>(match decay {
                    Some(decay) => decay.edge_cost(
                        PhysicalQubit::new(edge.source().index() as u32),
                        PhysicalQubit::new(edge.target().index() as u32),
                    ),
                    None => 1.,
                })
            },
            Some(&mut shortest_paths),
        )?;
        let path = shortest_paths
            .swap_remove(&goal)
            .ok_or(RoutingError::NoRoute(a, b))?
            .into_iter()
            .map(|node| PhysicalQubit::new(node.index() as u32))
            .collect::<Vec<_>>();
        if use_cache {
            self.cache.add_path(&path);
        }
        Ok(path)
    }
}

/// Route `dag` over `coupling` from `initial_layout` with a fresh [Router].
pub fn route_circuit(
    coupling: &CouplingGraph,
    dag: &InteractionDag,
    initial_layout: &NLayout,
    config: RouterConfig,
) -> Result<RoutingResult, RoutingError> {
    Router::new(coupling, config)?.route(dag, initial_layout)
}
