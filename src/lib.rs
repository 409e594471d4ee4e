// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Correspondence-driven morph animation between molecular conformations.
//!
//! molmorph takes an ordered list of small-molecule structure records,
//! aligns every structure onto its predecessor, and animates smooth
//! transitions between them. Matching atoms glide into one another, atoms
//! without a partner fade out, and new atoms fade in.
//!
//! # Key entry points
//!
//! - [`molecule::sdf::parse`] - fixed-column structure record parser
//! - [`align`] - atom correspondence, rigid (Kabsch) alignment and
//!   normalization
//! - [`sequence::SequenceBuilder`] - the parse → correspond → align →
//!   normalize pipeline
//! - [`animation::MorphController`] - per-frame transition state machine
//! - [`viewer::MorphViewer`] - a self-contained viewer that ties the above
//!   together with auto-advance
//! - [`options::Options`] - runtime configuration (sequence, animation,
//!   geometry)
//!
//! # Architecture
//!
//! Everything is owned by explicit objects; there is no process-wide state,
//! so any number of viewers can coexist. The controller owns no clock: the
//! host calls [`animation::MorphController::tick`] once per rendered frame
//! and hands the resulting [`scene::SceneUpdate`] to its renderer. Building
//! new sequence entries can be moved off the frame thread with
//! [`sequence::loader::SequenceLoader`], which only ever publishes complete
//! entries.

pub mod align;
pub mod animation;
pub mod error;
pub mod molecule;
pub mod options;
pub mod scene;
pub mod sequence;
pub mod viewer;

pub use error::MorphError;
