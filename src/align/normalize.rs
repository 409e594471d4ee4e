//! Bounding-box centering and uniform down-scaling.

use crate::molecule::Molecule;

/// Default largest bounding-box dimension after normalization.
pub const DEFAULT_SCALE_CAP: f32 = 1.0;

/// Center `molecule` on its bounding-box midpoint and scale it uniformly so
/// the largest box dimension is at most `scale_cap`.
///
/// Molecules that already fit are only centered (never upscaled). Empty
/// molecules are returned unchanged.
#[must_use]
pub fn normalize(molecule: &Molecule, scale_cap: f32) -> Molecule {
    let Some((lo, hi)) = molecule.bounding_box() else {
        return molecule.clone();
    };
    let center = (lo + hi) * 0.5;
    let extent = (hi - lo).max_element();
    let scale = if extent > scale_cap && extent > 0.0 {
        scale_cap / extent
    } else {
        1.0
    };
    molecule.map_positions(|p| (p - center) * scale)
}
