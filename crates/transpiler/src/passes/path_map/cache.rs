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

use hashbrown::HashMap;

use graphmap_circuit::PhysicalQubit;

/// Memo of shortest paths between pairs of physical qubits.
///
/// Every contiguous sub-path of a shortest path is itself a shortest path, so adding one path fills
/// in the entries for all of its sub-paths with at least `threshold` nodes.  Entries are keyed on
/// the unordered endpoint pair and stored in ascending-endpoint orientation.
#[derive(Clone, Debug)]
pub struct PathCache {
    paths: HashMap<[PhysicalQubit; 2], Vec<PhysicalQubit>>,
    threshold: usize,
}

impl PathCache {
    pub fn new(threshold: usize) -> Self {
        PathCache {
            paths: HashMap::new(),
            threshold: threshold.max(2),
        }
    }

    #[inline]
    fn key(a: PhysicalQubit, b: PhysicalQubit) -> [PhysicalQubit; 2] {
        if a <= b {
            [a, b]
        } else {
            [b, a]
        }
    }

    /// Store `path` and all of its sub-paths that are long enough.  Existing entries are kept.
    pub fn add_path(&mut self, path: &[PhysicalQubit]) {
        for start in 0..path.len() {
            for end in (start + self.threshold)..=path.len() {
                let sub = &path[start..end];
                let (first, last) = (sub[0], sub[sub.len() - 1]);
                self.paths.entry(Self::key(first, last)).or_insert_with(|| {
                    if first <= last {
                        sub.to_vec()
                    } else {
                        sub.iter().rev().copied().collect()
                    }
                });
            }
        }
    }

    /// The cached path from `a` to `b`, oriented to start at `a`.
    pub fn get_path(&self, a: PhysicalQubit, b: PhysicalQubit) -> Option<Vec<PhysicalQubit>> {
        let path = self.paths.get(&Self::key(a, b))?;
        if path.first() == Some(&a) {
            Some(path.clone())
        } else {
            Some(path.iter().rev().copied().collect())
        }
    }

    #[inline]
    pub fn has_path(&self, a: PhysicalQubit, b: PhysicalQubit) -> bool {
        self.paths.contains_key(&Self::key(a, b))
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn qubits(nodes: &[u32]) -> Vec<PhysicalQubit> {
        nodes.iter().copied().map(PhysicalQubit::new).collect()
    }

    #[test]
    fn stores_long_enough_subpaths() {
        let mut cache = PathCache::new(3);
        cache.add_path(&qubits(&[0, 1, 2, 3]));
        // [0,1,2], [1,2,3] and [0,1,2,3].
        assert_eq!(cache.len(), 3);
        assert!(cache.has_path(PhysicalQubit(0), PhysicalQubit(3)));
        assert!(cache.has_path(PhysicalQubit(3), PhysicalQubit(1)));
        assert!(!cache.has_path(PhysicalQubit(0), PhysicalQubit(1)));
    }

    #[test]
    fn paths_come_back_oriented() {
        let mut cache = PathCache::new(3);
        cache.add_path(&qubits(&[7, 4, 1, 0]));
        assert_eq!(
            cache.get_path(PhysicalQubit(7), PhysicalQubit(0)),
            Some(qubits(&[7, 4, 1, 0]))
        );
        assert_eq!(
            cache.get_path(PhysicalQubit(0), PhysicalQubit(7)),
            Some(qubits(&[0, 1, 4, 7]))
        );
        assert_eq!(
            cache.get_path(PhysicalQubit(1), PhysicalQubit(7)),
            Some(qubits(&[1, 4, 7]))
        );
        assert_eq!(cache.get_path(PhysicalQubit(4), PhysicalQubit(1)), None);
    }

    #[test]
    fn first_entry_wins() {
        let mut cache = PathCache::new(2);
        cache.add_path(&qubits(&[0, 1, 2]));
        cache.add_path(&qubits(&[0, 3, 2]));
        assert_eq!(
            cache.get_path(PhysicalQubit(2), PhysicalQubit(0)),
            Some(qubits(&[2, 1, 0]))
        );
        cache.clear();
        assert!(cache.is_empty());
    }
}
