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

use std::fmt;

use hashbrown::HashMap;
use thiserror::Error;

/// A newtype for the different categories of qubits used within layouts.  This is to enforce
/// significantly more type safety when dealing with mixtures of physical and virtual qubits, as we
/// typically are when routing.  `NLayout` only works in terms of the correct newtype, meaning that
/// it's not possible to accidentally pass the wrong type of qubit to a lookup.
macro_rules! qubit_newtype {
    ($id: ident) => {
        #[repr(transparent)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $id(pub u32);

        impl $id {
            #[inline]
            pub fn new(val: u32) -> Self {
                Self(val)
            }
            #[inline]
            pub fn index(&self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $id {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $id {
            fn from(val: u32) -> Self {
                Self(val)
            }
        }
    };
}

qubit_newtype!(PhysicalQubit);
impl PhysicalQubit {
    /// Get the virtual qubit that currently occupies this physical qubit in the given layout, if
    /// any.
    pub fn to_virt(self, layout: &NLayout) -> Option<VirtualQubit> {
        layout.phys_to_virt[self.index()]
    }
}

qubit_newtype!(VirtualQubit);
impl VirtualQubit {
    /// Get the physical qubit that currently corresponds to this index of virtual qubit in the
    /// given layout.
    pub fn to_phys(self, layout: &NLayout) -> PhysicalQubit {
        layout.virt_to_phys[self.index()]
    }
}

/// The ways a layout can fail to be constructed from user input.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
    #[error("physical qubit {physical} is out of range for {num_physical} physical qubits")]
    PhysicalOutOfRange {
        physical: PhysicalQubit,
        num_physical: usize,
    },
    #[error("virtual qubit {virt} is out of range for {num_virtual} virtual qubits")]
    VirtualOutOfRange { virt: VirtualQubit, num_virtual: usize },
    #[error("physical qubit {0} is assigned to more than one virtual qubit")]
    DuplicatePhysical(PhysicalQubit),
    #[error("virtual qubit {0} has no physical qubit assigned")]
    Unmapped(VirtualQubit),
}

/// An unsigned integer Vector based layout class
///
/// This class tracks the layout (or mapping between virtual qubits in the the circuit and physical
/// qubits on the device) efficiently.  Every virtual qubit always has a physical position, but the
/// device may have more physical qubits than the circuit has virtual ones, so a physical qubit can
/// be unoccupied.  Swapping with an unoccupied position simply moves the virtual qubit.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NLayout {
    virt_to_phys: Vec<PhysicalQubit>,
    phys_to_virt: Vec<Option<VirtualQubit>>,
}

impl NLayout {
    /// Build a layout from an explicit mapping.  Every virtual qubit in `0..virtual_qubits` must be
    /// present in `qubit_indices`, and no two of them can share a physical qubit.
    pub fn new(
        qubit_indices: &HashMap<VirtualQubit, PhysicalQubit>,
        virtual_qubits: usize,
        physical_qubits: usize,
    ) -> Result<Self, LayoutError> {
        let mut virt_to_phys = vec![None; virtual_qubits];
        let mut phys_to_virt = vec![None; physical_qubits];
        for (&virt, &phys) in qubit_indices {
            if virt.index() >= virtual_qubits {
                return Err(LayoutError::VirtualOutOfRange {
                    virt,
                    num_virtual: virtual_qubits,
                });
            }
            Self::claim(&mut phys_to_virt, virt, phys)?;
            virt_to_phys[virt.index()] = Some(phys);
        }
        let virt_to_phys = virt_to_phys
            .into_iter()
            .enumerate()
            .map(|(virt, phys)| phys.ok_or(LayoutError::Unmapped(VirtualQubit(virt as u32))))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(NLayout {
            virt_to_phys,
            phys_to_virt,
        })
    }

    /// The identity layout, where virtual qubit `i` sits on physical qubit `i`.
    pub fn generate_trivial_layout(num_qubits: u32) -> Self {
        NLayout {
            virt_to_phys: (0..num_qubits).map(PhysicalQubit).collect(),
            phys_to_virt: (0..num_qubits).map(|q| Some(VirtualQubit(q))).collect(),
        }
    }

    /// Build a layout from the list of physical positions of each virtual qubit, on a device with
    /// `physical_qubits` qubits.
    pub fn from_virtual_to_physical(
        virt_to_phys: Vec<PhysicalQubit>,
        physical_qubits: usize,
    ) -> Result<Self, LayoutError> {
        let mut phys_to_virt = vec![None; physical_qubits];
        for (virt, phys) in virt_to_phys.iter().enumerate() {
            Self::claim(&mut phys_to_virt, VirtualQubit(virt as u32), *phys)?;
        }
        Ok(NLayout {
            virt_to_phys,
            phys_to_virt,
        })
    }

    fn claim(
        phys_to_virt: &mut [Option<VirtualQubit>],
        virt: VirtualQubit,
        phys: PhysicalQubit,
    ) -> Result<(), LayoutError> {
        let num_physical = phys_to_virt.len();
        let slot = phys_to_virt
            .get_mut(phys.index())
            .ok_or(LayoutError::PhysicalOutOfRange {
                physical: phys,
                num_physical,
            })?;
        if slot.is_some() {
            return Err(LayoutError::DuplicatePhysical(phys));
        }
        *slot = Some(virt);
        Ok(())
    }

    /// Get physical bit from virtual bit
    #[inline]
    pub fn virtual_to_physical(&self, r#virtual: VirtualQubit) -> PhysicalQubit {
        self.virt_to_phys[r#virtual.index()]
    }

    /// Get virtual bit from physical bit, if the physical qubit is occupied.
    #[inline]
    pub fn physical_to_virtual(&self, physical: PhysicalQubit) -> Option<VirtualQubit> {
        self.phys_to_virt[physical.index()]
    }

    /// Swap the specified virtual qubits
    pub fn swap_virtual(&mut self, bit_a: VirtualQubit, bit_b: VirtualQubit) {
        self.virt_to_phys.swap(bit_a.index(), bit_b.index());
        self.phys_to_virt[self.virt_to_phys[bit_a.index()].index()] = Some(bit_a);
        self.phys_to_virt[self.virt_to_phys[bit_b.index()].index()] = Some(bit_b);
    }

    /// Swap the contents of the specified physical qubits.  Either (or both) may be unoccupied.
    pub fn swap_physical(&mut self, bit_a: PhysicalQubit, bit_b: PhysicalQubit) {
        self.phys_to_virt.swap(bit_a.index(), bit_b.index());
        if let Some(virt) = self.phys_to_virt[bit_a.index()] {
            self.virt_to_phys[virt.index()] = bit_a;
        }
        if let Some(virt) = self.phys_to_virt[bit_b.index()] {
            self.virt_to_phys[virt.index()] = bit_b;
        }
    }

    /// Iterator of `(VirtualQubit, PhysicalQubit)` pairs, in order of the `VirtualQubit` indices.
    pub fn iter_virtual(
        &'_ self,
    ) -> impl ExactSizeIterator<Item = (VirtualQubit, PhysicalQubit)> + '_ {
        self.virt_to_phys
            .iter()
            .enumerate()
            .map(|(v, p)| (VirtualQubit::new(v as u32), *p))
    }

    /// Iterator of the occupied `(PhysicalQubit, VirtualQubit)` pairs, in order of the
    /// `PhysicalQubit` indices.
    pub fn iter_physical(&'_ self) -> impl Iterator<Item = (PhysicalQubit, VirtualQubit)> + '_ {
        self.phys_to_virt
            .iter()
            .enumerate()
            .filter_map(|(p, v)| v.map(|v| (PhysicalQubit::new(p as u32), v)))
    }

    /// Number of virtual qubits tracked by the layout.
    pub fn num_qubits(&self) -> usize {
        self.virt_to_phys.len()
    }

    /// Number of physical positions (occupied or not) known to the layout.
    pub fn num_physical_qubits(&self) -> usize {
        self.phys_to_virt.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn phys(idx: &[u32]) -> Vec<PhysicalQubit> {
        idx.iter().copied().map(PhysicalQubit).collect()
    }

    #[test]
    fn trivial_layout_is_identity() {
        let layout = NLayout::generate_trivial_layout(4);
        for (virt, phys) in layout.iter_virtual() {
            assert_eq!(virt.index(), phys.index());
            assert_eq!(phys.to_virt(&layout), Some(virt));
        }
        assert_eq!(layout.num_qubits(), 4);
        assert_eq!(layout.num_physical_qubits(), 4);
    }

    #[test]
    fn swap_physical_moves_into_empty_positions() {
        let mut layout = NLayout::from_virtual_to_physical(phys(&[2, 0]), 4).unwrap();
        assert_eq!(layout.physical_to_virtual(PhysicalQubit(1)), None);

        layout.swap_physical(PhysicalQubit(2), PhysicalQubit(1));
        assert_eq!(layout.virtual_to_physical(VirtualQubit(0)), PhysicalQubit(1));
        assert_eq!(layout.physical_to_virtual(PhysicalQubit(2)), None);

        layout.swap_physical(PhysicalQubit(3), PhysicalQubit(2));
        assert_eq!(layout.physical_to_virtual(PhysicalQubit(2)), None);
        assert_eq!(layout.physical_to_virtual(PhysicalQubit(3)), None);

        layout.swap_physical(PhysicalQubit(0), PhysicalQubit(1));
        assert_eq!(layout.virtual_to_physical(VirtualQubit(0)), PhysicalQubit(0));
        assert_eq!(layout.virtual_to_physical(VirtualQubit(1)), PhysicalQubit(1));
        assert_eq!(
            layout.iter_physical().collect::<Vec<_>>(),
            vec![
                (PhysicalQubit(0), VirtualQubit(0)),
                (PhysicalQubit(1), VirtualQubit(1))
            ]
        );
    }

    #[test]
    fn swap_virtual_keeps_both_directions_in_sync() {
        let mut layout = NLayout::generate_trivial_layout(3);
        layout.swap_virtual(VirtualQubit(0), VirtualQubit(2));
        assert_eq!(VirtualQubit(0).to_phys(&layout), PhysicalQubit(2));
        assert_eq!(PhysicalQubit(0).to_virt(&layout), Some(VirtualQubit(2)));
    }

    #[test]
    fn construction_errors() {
        assert_eq!(
            NLayout::from_virtual_to_physical(phys(&[0, 0]), 2),
            Err(LayoutError::DuplicatePhysical(PhysicalQubit(0)))
        );
        assert_eq!(
            NLayout::from_virtual_to_physical(phys(&[0, 5]), 2),
            Err(LayoutError::PhysicalOutOfRange {
                physical: PhysicalQubit(5),
                num_physical: 2
            })
        );

        let mut indices = HashMap::new();
        indices.insert(VirtualQubit(1), PhysicalQubit(3));
        assert_eq!(
            NLayout::new(&indices, 2, 4),
            Err(LayoutError::Unmapped(VirtualQubit(0)))
        );
        indices.insert(VirtualQubit(0), PhysicalQubit(0));
        let layout = NLayout::new(&indices, 2, 4).unwrap();
        assert_eq!(layout.virtual_to_physical(VirtualQubit(1)), PhysicalQubit(3));
        indices.insert(VirtualQubit(2), PhysicalQubit(1));
        assert_eq!(
            NLayout::new(&indices, 2, 4),
            Err(LayoutError::VirtualOutOfRange {
                virt: VirtualQubit(2),
                num_virtual: 2
            })
        );
    }
}
