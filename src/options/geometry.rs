use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::molecule::Element;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Geometry", inline)]
#[serde(default)]
/// Ball-and-stick sizing, in normalized scene units.
pub struct GeometryOptions {
    /// Sphere radius of a carbon atom.
    #[schemars(title = "Atom Radius", range(min = 0.005, max = 0.2), extend("step" = 0.005))]
    pub atom_radius: f32,
    /// Scale atom spheres by covalent radius relative to carbon.
    #[schemars(title = "Size By Element")]
    pub size_by_element: bool,
    /// Bond cylinder radius.
    #[schemars(title = "Bond Radius", range(min = 0.002, max = 0.1), extend("step" = 0.002))]
    pub bond_radius: f32,
    /// Fraction of each endpoint radius trimmed off a bond. 1.0 makes bonds
    /// start exactly at the sphere surface, 0.0 runs them center to center.
    #[schemars(title = "Bond Overlap", range(min = 0.0, max = 1.0), extend("step" = 0.05))]
    pub bond_overlap: f32,
    /// Lower bound on the rendered bond length.
    #[schemars(skip)]
    pub min_bond_length: f32,
}

impl Default for GeometryOptions {
    fn default() -> Self {
        Self {
            atom_radius: 0.06,
            size_by_element: true,
            bond_radius: 0.018,
            bond_overlap: 1.0,
            min_bond_length: 0.001,
        }
    }
}

impl GeometryOptions {
    /// Display radius of an atom of `element`.
    #[must_use]
    pub fn radius_for(&self, element: Element) -> f32 {
        if self.size_by_element {
            self.atom_radius * element.relative_size()
        } else {
            self.atom_radius
        }
    }
}
