//! Greedy topological atom correspondence between two molecules.

use glam::Vec3;

use crate::molecule::Molecule;

/// Partial injective map from atoms of molecule A to atoms of molecule B.
///
/// Entry `i` is `Some(j)` when atom `i` of A corresponds to atom `j` of B.
/// No two entries share a destination, and mapped atoms always share an
/// element tag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CorrespondenceMap {
    map: Vec<Option<usize>>,
}

impl CorrespondenceMap {
    /// Map with `len` entries, all unmatched.
    #[must_use]
    pub fn unmatched(len: usize) -> Self {
        Self {
            map: vec![None; len],
        }
    }

    /// Identity map over `len` atoms.
    #[must_use]
    pub fn identity(len: usize) -> Self {
        Self {
            map: (0..len).map(Some).collect(),
        }
    }

    /// Wrap raw entries. Callers are responsible for injectivity.
    #[must_use]
    pub fn from_entries(map: Vec<Option<usize>>) -> Self {
        Self { map }
    }

    /// Raw entries, one per atom of A.
    #[must_use]
    pub fn entries(&self) -> &[Option<usize>] {
        &self.map
    }

    /// Destination of atom `i`, if matched.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<usize> {
        self.map.get(i).copied().flatten()
    }

    /// Number of entries (atoms of A).
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Number of matched entries.
    #[must_use]
    pub fn matched_count(&self) -> usize {
        self.map.iter().flatten().count()
    }

    /// `(i, j)` for every matched entry, in ascending `i`.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.map
            .iter()
            .enumerate()
            .filter_map(|(i, j)| j.map(|j| (i, j)))
    }

    /// Position pairs `(a[i], b[j])` for every matched entry.
    #[must_use]
    pub fn matched_points(&self, a: &[Vec3], b: &[Vec3]) -> Vec<(Vec3, Vec3)> {
        self.pairs()
            .filter_map(|(i, j)| Some((*a.get(i)?, *b.get(j)?)))
            .collect()
    }

    /// No two entries map to the same destination.
    #[must_use]
    pub fn is_injective(&self) -> bool {
        let mut seen = rustc_hash::FxHashSet::default();
        self.map.iter().flatten().all(|&j| seen.insert(j))
    }

    /// Reverse map from B (of length `len_b`) back to A.
    #[must_use]
    pub fn inverse(&self, len_b: usize) -> Self {
        let mut inverse = vec![None; len_b];
        for (i, j) in self.pairs() {
            if let Some(slot) = inverse.get_mut(j) {
                *slot = Some(i);
            }
        }
        Self { map: inverse }
    }

    /// Pair still-unmatched atoms by raw index where the destination index
    /// exists in B (of length `len_b`) and is not already taken.
    ///
    /// Element tags are ignored; this is the slot fallback used when the
    /// topological match leaves atoms without a partner.
    #[must_use]
    pub fn with_raw_index_fallback(mut self, len_b: usize) -> Self {
        let mut used = vec![false; len_b];
        for &j in self.map.iter().flatten() {
            if let Some(u) = used.get_mut(j) {
                *u = true;
            }
        }
        for (i, entry) in self.map.iter_mut().enumerate() {
            if entry.is_none() && i < len_b && !used[i] {
                *entry = Some(i);
                used[i] = true;
            }
        }
        self
    }
}

/// Resolve a correspondence from `a` (new structure) to `b` (reference).
///
/// Atoms of `a` are visited in index order; earlier atoms get first choice.
/// Each candidate `j` in `b` (unused, same element) is scored by how many of
/// atom `i`'s lower-index neighbors are already mapped onto neighbors of `j`.
/// The best score wins, ties go to the lowest `j`. The pass is greedy and
/// never backtracks, so symmetric substructures can come out suboptimal.
#[must_use]
pub fn resolve(a: &Molecule, b: &Molecule) -> CorrespondenceMap {
    let adj_a = a.adjacency();
    let adj_b = b.adjacency();
    let elements_b = b.elements();

    let mut map = vec![None; a.atom_count()];
    let mut used = vec![false; b.atom_count()];

    for (i, &element) in a.elements().iter().enumerate() {
        let mut best: Option<(usize, usize)> = None;

        for (j, &candidate) in elements_b.iter().enumerate() {
            if used[j] || candidate != element {
                continue;
            }
            let score = adj_a[i]
                .iter()
                .filter(|&&n| n < i)
                .filter_map(|&n| map[n])
                .filter(|m| adj_b[j].contains(m))
                .count();
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((j, score));
            }
        }

        if let Some((j, _)) = best {
            map[i] = Some(j);
            used[j] = true;
        }
    }

    let matched = map.iter().flatten().count();
    log::debug!(
        "correspondence: {matched}/{} atoms matched against {}",
        a.atom_count(),
        b.atom_count()
    );
    CorrespondenceMap { map }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::{Bond, Element};

    fn mol(elements: &[Element], bonds: &[(usize, usize)]) -> Molecule {
        let atoms = (0..elements.len())
            .map(|i| Vec3::new(i as f32, 0.0, 0.0))
            .collect();
        Molecule::new(
            atoms,
            elements.to_vec(),
            bonds.iter().map(|&(a, b)| Bond::new(a, b, 1)).collect(),
        )
        .unwrap()
    }

    fn assert_valid(map: &CorrespondenceMap, a: &Molecule, b: &Molecule) {
        assert!(map.is_injective());
        for (i, j) in map.pairs() {
            assert_eq!(a.elements()[i], b.elements()[j]);
        }
    }

    #[test]
    fn identical_molecules_map_to_identity() {
        use Element::{C, O};
        let a = mol(&[C, C, O], &[(0, 1), (1, 2)]);
        let map = resolve(&a, &a);
        assert_eq!(map, CorrespondenceMap::identity(3));
    }

    #[test]
    fn only_same_elements_match() {
        use Element::{C, N, O};
        let a = mol(&[O, N, C], &[]);
        let b = mol(&[C, O], &[]);
        let map = resolve(&a, &b);
        assert_eq!(map.entries(), &[Some(1), None, Some(0)]);
        assert_valid(&map, &a, &b);
    }

    #[test]
    fn topology_breaks_element_ties() {
        use Element::{C, O};
        // A: O0-C1, C2 isolated. B: C0 isolated, C1-O2.
        let a = mol(&[O, C, C], &[(0, 1)]);
        let b = mol(&[C, C, O], &[(1, 2)]);
        let map = resolve(&a, &b);
        // O0 -> O2; C1 is bonded to O0 so it prefers C1 (neighbor of O2)
        // over the first-encountered C0.
        assert_eq!(map.entries(), &[Some(2), Some(1), Some(0)]);
        assert_valid(&map, &a, &b);
    }

    #[test]
    fn equal_scores_pick_lowest_index() {
        use Element::C;
        let a = mol(&[C], &[]);
        let b = mol(&[C, C, C], &[]);
        assert_eq!(resolve(&a, &b).entries(), &[Some(0)]);
    }

    #[test]
    fn greedy_never_backtracks() {
        use Element::{C, N};
        // A: C0, N1-C2. B: N0-C1, C2.
        // C0 is visited first with no mapped neighbors and grabs C1, so C2
        // lands on the isolated C2 and the N-C bond is lost.
        let a = mol(&[C, N, C], &[(1, 2)]);
        let b = mol(&[N, C, C], &[(0, 1)]);
        let map = resolve(&a, &b);
        assert_eq!(map.entries(), &[Some(1), Some(0), Some(2)]);
        assert_valid(&map, &a, &b);
    }

    #[test]
    fn surplus_atoms_stay_unmatched() {
        use Element::C;
        let a = mol(&[C, C, C], &[(0, 1), (1, 2)]);
        let b = mol(&[C], &[]);
        let map = resolve(&a, &b);
        assert_eq!(map.matched_count(), 1);
        assert_eq!(map.get(1), None);
    }

    #[test]
    fn inverse_round_trips_pairs() {
        let map = CorrespondenceMap::from_entries(vec![Some(2), None, Some(0)]);
        let inv = map.inverse(3);
        assert_eq!(inv.entries(), &[Some(2), None, Some(0)]);
    }

    #[test]
    fn raw_index_fallback_fills_free_slots() {
        let map = CorrespondenceMap::from_entries(vec![Some(1), None, None, None])
            .with_raw_index_fallback(3);
        // 1 is taken by atom 0, 2 is free, 3 does not exist in B
        assert_eq!(map.entries(), &[Some(1), None, Some(2), None]);
        assert!(map.is_injective());
    }
}
