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

use thiserror::Error;

/// Invalid router settings.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("decay increment must be finite and non-negative, not {0}")]
    DecayIncrement(f64),
    #[error("decay reset interval cannot be zero")]
    DecayReset,
    #[error("path length threshold must be at least 2, not {0}")]
    PathLengthThreshold(usize),
    #[error("the number of paths per round cannot be zero")]
    MaxPathsPerRound,
}

/// Define the characteristics of the "decay" heuristic.  In this, each physical qubit has a
/// multiplier associated with it, beginning at 1.0, and has [increment][Self::increment] added to
/// it each time the qubit is involved in a swap.  Routes are costed by the largest multiplier on
/// each link they use, so recently used qubits are avoided when an alternative exists.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecayHeuristic {
    /// The amount to add onto the multiplier of a physical qubit when it is used.
    pub increment: f64,
    /// How frequently (in terms of swaps) to reset all qubit multipliers back to 1.0.
    pub reset: usize,
}

impl DecayHeuristic {
    pub fn new(increment: f64, reset: usize) -> Result<Self, ConfigError> {
        let out = Self { increment, reset };
        out.validate()?;
        Ok(out)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.increment.is_finite() || self.increment < 0.0 {
            return Err(ConfigError::DecayIncrement(self.increment));
        }
        if self.reset == 0 {
            return Err(ConfigError::DecayReset);
        }
        Ok(())
    }
}

impl Default for DecayHeuristic {
    fn default() -> Self {
        Self {
            increment: 0.001,
            reset: 5,
        }
    }
}

/// A complete description of how the path-based router chooses its routes.  Start from the
/// [Default] and use the `with_*` methods to change individual components.
#[derive(Clone, Debug, PartialEq)]
pub struct RouterConfig {
    /// Bias route choice away from recently swapped qubits.  `None` routes on plain hop count.
    pub decay: Option<DecayHeuristic>,
    /// Memoise shortest paths.  Only takes effect when `decay` is `None`, since decay-biased
    /// routes change after every swap.
    pub enable_caching: bool,
    /// The shortest sub-path that the cache will store.
    pub path_length_threshold: usize,
    /// The maximum number of paths offered to the sequencer in one round.
    pub max_paths_per_round: Option<usize>,
    /// If set, paths are discarded before sequencing until no crossing shares more nodes than this.
    pub max_crossing_order: Option<usize>,
    /// When a route is rejected by the container, retry it through each neighbour of either end.
    pub alternative_paths: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            decay: Some(DecayHeuristic::default()),
            enable_caching: true,
            path_length_threshold: 3,
            max_paths_per_round: None,
            max_crossing_order: None,
            alternative_paths: true,
        }
    }
}

impl RouterConfig {
    /// Set the multiplier increment and reset interval of the decay heuristic.  The reset interval
    /// must be non-zero.
    pub fn with_decay(&self, increment: f64, reset: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            decay: Some(DecayHeuristic::new(increment, reset)?),
            ..self.clone()
        })
    }

    /// Route on plain hop count.
    pub fn without_decay(&self) -> Self {
        Self {
            decay: None,
            ..self.clone()
        }
    }

    pub fn with_caching(
        &self,
        enable: bool,
        path_length_threshold: usize,
    ) -> Result<Self, ConfigError> {
        if path_length_threshold < 2 {
            return Err(ConfigError::PathLengthThreshold(path_length_threshold));
        }
        Ok(Self {
            enable_caching: enable,
            path_length_threshold,
            ..self.clone()
        })
    }

    pub fn with_max_paths_per_round(&self, limit: Option<usize>) -> Result<Self, ConfigError> {
        if limit == Some(0) {
            return Err(ConfigError::MaxPathsPerRound);
        }
        Ok(Self {
            max_paths_per_round: limit,
            ..self.clone()
        })
    }

    pub fn with_max_crossing_order(&self, order: Option<usize>) -> Self {
        Self {
            max_crossing_order: order,
            ..self.clone()
        }
    }

    pub fn with_alternative_paths(&self, enable: bool) -> Self {
        Self {
            alternative_paths: enable,
            ..self.clone()
        }
    }

    /// Check settings that may have been written directly into the public fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(decay) = self.decay.as_ref() {
            decay.validate()?;
        }
        if self.path_length_threshold < 2 {
            return Err(ConfigError::PathLengthThreshold(self.path_length_threshold));
        }
        if self.max_paths_per_round == Some(0) {
            return Err(ConfigError::MaxPathsPerRound);
        }
        Ok(())
    }
}
