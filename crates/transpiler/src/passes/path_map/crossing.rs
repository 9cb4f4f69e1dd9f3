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

use std::fmt;

use smallvec::SmallVec;

use graphmap_circuit::PhysicalQubit;

/// Identifier of a path held by a [super::PathContainer].
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PathId(pub u32);

impl PathId {
    #[inline]
    pub fn new(val: u32) -> Self {
        Self(val)
    }
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The nodes shared by two crossing paths.  The container only ever creates single-node overlaps.
pub type Overlap = SmallVec<[PhysicalQubit; 1]>;

/// A crossing with another path, as recorded on one of the two paths involved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Crossing {
    /// The other path.
    pub path_id: PathId,
    /// The nodes shared between the two paths.
    pub overlap: Overlap,
}

impl Crossing {
    pub fn new(path_id: PathId, overlap: impl IntoIterator<Item = PhysicalQubit>) -> Self {
        Crossing {
            path_id,
            overlap: overlap.into_iter().collect(),
        }
    }

    /// Is this a crossing with path `path_id` over exactly the node set `nodes`?
    pub fn matches(&self, path_id: PathId, nodes: &[PhysicalQubit]) -> bool {
        self.path_id == path_id && self.touches(nodes)
    }

    /// Does this crossing share exactly the node set `nodes`, whichever path it is with?
    pub fn touches(&self, nodes: &[PhysicalQubit]) -> bool {
        self.overlap.len() == nodes.len() && nodes.iter().all(|node| self.overlap.contains(node))
    }

    /// Is `node` one of the shared nodes?
    #[inline]
    pub fn contains(&self, node: PhysicalQubit) -> bool {
        self.overlap.contains(&node)
    }

    /// The number of shared nodes.
    #[inline]
    pub fn order(&self) -> usize {
        self.overlap.len()
    }
}

impl fmt::Display for Crossing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C({}, [", self.path_id)?;
        for (i, node) in self.overlap.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", node)?;
        }
        write!(f, "])")
    }
}
