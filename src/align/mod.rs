//! Structure-to-structure alignment: atom correspondence, rigid Kabsch fit,
//! and coordinate normalization.
//!
//! The three stages run in this order for every new structure (see
//! [`crate::sequence::SequenceBuilder`]):
//!
//! 1. [`correspondence::resolve`] pairs atoms of the new structure with the
//!    previous aligned one.
//! 2. [`kabsch::KabschSolver::solve`] fits a rotation + translation on the
//!    matched pairs, applied to every atom.
//! 3. [`normalize::normalize`] centers and scales the result.

pub mod correspondence;
pub mod kabsch;
pub mod normalize;

pub use correspondence::{resolve, CorrespondenceMap};
pub use kabsch::{align, AlignmentTransform, KabschSolver};
pub use normalize::normalize;
