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

//! Routing of abstract circuits onto devices with restricted qubit connectivity.

pub mod coupling;
pub mod distance;
pub mod passes;

pub use coupling::{CouplingError, CouplingGraph};
