// This code is part of graphmap, a derivative of Qiskit.
//
// (C) Copyright IBM 2023, 2024
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

//! Circuit-level data shared by the routing passes: the qubit newtypes and the layout that maps
//! the virtual qubits of a circuit onto the physical qubits of a device.

pub mod nlayout;

pub use nlayout::{LayoutError, NLayout, PhysicalQubit, VirtualQubit};
