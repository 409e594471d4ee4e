//! Animation system for smooth structural transitions.
//!
//! [`MorphController`] turns "go to entry N" into a per-frame stream of
//! [`SceneUpdate`](crate::scene::SceneUpdate)s; [`AutoAdvance`] decides when
//! to go to the next entry on its own.

pub mod auto_advance;
pub mod easing;
pub mod interpolation;
pub mod morph;

pub use auto_advance::AutoAdvance;
pub use easing::EasingFunction;
pub use interpolation::InterpolationContext;
pub use morph::{MorphController, MorphState};
