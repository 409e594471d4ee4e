//! Molecule data model: atoms, element tags and bonds.
//!
//! A [`Molecule`] is built once (usually by [`sdf::parse`]) and never mutated
//! afterwards. Alignment and normalization produce new molecules through
//! [`Molecule::map_positions`], which keeps every sequence entry
//! reproducible.

mod element;
pub mod sdf;

pub use element::Element;
use glam::Vec3;
use rustc_hash::FxHashSet;

use crate::error::MorphError;

/// A covalent bond between two atoms of the same molecule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bond {
    /// 0-based index of the first atom.
    pub from: usize,
    /// 0-based index of the second atom.
    pub to: usize,
    /// Bond order code (1 single, 2 double, 3 triple, 4 aromatic, ...).
    pub order: u8,
}

impl Bond {
    /// Bond between `from` and `to` with the given order code.
    #[must_use]
    pub fn new(from: usize, to: usize, order: u8) -> Self {
        Self { from, to, order }
    }

    /// Whether this bond joins `a` and `b` (in either direction).
    #[must_use]
    pub fn connects(&self, a: usize, b: usize) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }
}

/// Immutable single-molecule structure.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Molecule {
    atoms: Vec<Vec3>,
    elements: Vec<Element>,
    bonds: Vec<Bond>,
}

impl Molecule {
    /// Build a molecule, checking that `elements` parallels `atoms` and that
    /// every bond joins two distinct, valid atom indices.
    ///
    /// # Errors
    ///
    /// Returns [`MorphError::InvalidMolecule`] when an invariant is violated.
    pub fn new(
        atoms: Vec<Vec3>,
        elements: Vec<Element>,
        bonds: Vec<Bond>,
    ) -> Result<Self, MorphError> {
        if atoms.len() != elements.len() {
            return Err(MorphError::InvalidMolecule(format!(
                "{} atoms but {} element tags",
                atoms.len(),
                elements.len()
            )));
        }
        for (i, bond) in bonds.iter().enumerate() {
            if bond.from == bond.to {
                return Err(MorphError::InvalidMolecule(format!(
                    "bond {i} joins atom {} to itself",
                    bond.from
                )));
            }
            if bond.from >= atoms.len() || bond.to >= atoms.len() {
                return Err(MorphError::InvalidMolecule(format!(
                    "bond {i} ({}-{}) references an atom outside 0..{}",
                    bond.from,
                    bond.to,
                    atoms.len()
                )));
            }
        }
        Ok(Self {
            atoms,
            elements,
            bonds,
        })
    }

    /// Atom positions, indexed by atom index.
    #[must_use]
    pub fn atoms(&self) -> &[Vec3] {
        &self.atoms
    }

    /// Element tag per atom.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Bond list.
    #[must_use]
    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Number of atoms.
    #[must_use]
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Number of bonds.
    #[must_use]
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// Whether the molecule has no atoms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// New molecule with every atom position passed through `f`. Elements
    /// and bonds are carried over unchanged.
    #[must_use]
    pub fn map_positions(&self, f: impl Fn(Vec3) -> Vec3) -> Self {
        Self {
            atoms: self.atoms.iter().map(|&p| f(p)).collect(),
            elements: self.elements.clone(),
            bonds: self.bonds.clone(),
        }
    }

    /// Axis-aligned bounding box `(min, max)`, or `None` when empty.
    #[must_use]
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.atoms.first()?;
        Some(
            self.atoms
                .iter()
                .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p))),
        )
    }

    /// Mean atom position (origin when empty).
    #[must_use]
    pub fn centroid(&self) -> Vec3 {
        if self.atoms.is_empty() {
            return Vec3::ZERO;
        }
        self.atoms.iter().copied().sum::<Vec3>() / self.atoms.len() as f32
    }

    /// Undirected neighbor sets, one per atom.
    #[must_use]
    pub fn adjacency(&self) -> Vec<FxHashSet<usize>> {
        let mut adjacency = vec![FxHashSet::default(); self.atoms.len()];
        for bond in &self.bonds {
            let _ = adjacency[bond.from].insert(bond.to);
            let _ = adjacency[bond.to].insert(bond.from);
        }
        adjacency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water() -> Molecule {
        Molecule::new(
            vec![
                Vec3::ZERO,
                Vec3::new(0.96, 0.0, 0.0),
                Vec3::new(-0.24, 0.93, 0.0),
            ],
            vec![Element::O, Element::H, Element::H],
            vec![Bond::new(0, 1, 1), Bond::new(0, 2, 1)],
        )
        .unwrap()
    }

    #[test]
    fn rejects_mismatched_element_count() {
        let err = Molecule::new(vec![Vec3::ZERO], vec![], vec![]);
        assert!(matches!(err, Err(MorphError::InvalidMolecule(_))));
    }

    #[test]
    fn rejects_self_and_out_of_range_bonds() {
        let atoms = vec![Vec3::ZERO, Vec3::X];
        let elements = vec![Element::C, Element::C];
        assert!(Molecule::new(
            atoms.clone(),
            elements.clone(),
            vec![Bond::new(1, 1, 1)]
        )
        .is_err());
        assert!(
            Molecule::new(atoms, elements, vec![Bond::new(0, 2, 1)]).is_err()
        );
    }

    #[test]
    fn adjacency_is_undirected() {
        let adj = water().adjacency();
        assert!(adj[0].contains(&1) && adj[0].contains(&2));
        assert!(adj[1].contains(&0));
        assert!(!adj[1].contains(&2));
    }

    #[test]
    fn map_positions_keeps_topology() {
        let mol = water();
        let moved = mol.map_positions(|p| p + Vec3::Z);
        assert_eq!(moved.bonds(), mol.bonds());
        assert_eq!(moved.elements(), mol.elements());
        assert_eq!(moved.atoms()[0], Vec3::Z);
        // source untouched
        assert_eq!(mol.atoms()[0], Vec3::ZERO);
    }

    #[test]
    fn bounding_box_spans_atoms() {
        let (lo, hi) = water().bounding_box().unwrap();
        assert_eq!(lo, Vec3::new(-0.24, 0.0, 0.0));
        assert_eq!(hi, Vec3::new(0.96, 0.93, 0.0));
        assert!(Molecule::default().bounding_box().is_none());
    }
}
