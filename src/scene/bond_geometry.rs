//! Cylinder placement for a bond between two atom spheres.

use glam::{Quat, Vec3};

/// Placement of one bond cylinder: trimmed endpoints, center, length and
/// the rotation carrying the cylinder's +Y axis onto the bond axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondGeometry {
    /// Start of the visible segment (surface of atom A).
    pub endpoint_a: Vec3,
    /// End of the visible segment (surface of atom B).
    pub endpoint_b: Vec3,
    /// Center of the visible segment.
    pub midpoint: Vec3,
    /// Rotation from +Y onto the A→B direction.
    pub orientation: Quat,
    /// Length of the visible segment, never below the configured minimum.
    pub length: f32,
}

impl BondGeometry {
    /// Cylinder between atom centers `a` and `b`.
    ///
    /// Each end is pulled in by that atom's radius times `overlap`, so with
    /// `overlap = 1.0` the cylinder starts at the sphere surfaces. When the
    /// trimmed length drops below `min_length` (overlapping spheres, atoms
    /// passing through each other mid-morph) the cylinder is `min_length`
    /// long and centered between the two atoms. Coincident atoms orient
    /// along +Y.
    #[must_use]
    pub fn between(
        a: Vec3,
        radius_a: f32,
        b: Vec3,
        radius_b: f32,
        overlap: f32,
        min_length: f32,
    ) -> Self {
        let delta = b - a;
        let distance = delta.length();
        let dir = if distance > f32::EPSILON {
            delta / distance
        } else {
            Vec3::Y
        };
        let orientation = Quat::from_rotation_arc(Vec3::Y, dir);

        let trim_a = radius_a * overlap;
        let trim_b = radius_b * overlap;
        let trimmed = distance - trim_a - trim_b;

        if trimmed >= min_length {
            let endpoint_a = a + dir * trim_a;
            let endpoint_b = b - dir * trim_b;
            Self {
                endpoint_a,
                endpoint_b,
                midpoint: (endpoint_a + endpoint_b) * 0.5,
                orientation,
                length: trimmed,
            }
        } else {
            let midpoint = (a + b) * 0.5;
            let half = dir * (min_length * 0.5);
            Self {
                endpoint_a: midpoint - half,
                endpoint_b: midpoint + half,
                midpoint,
                orientation,
                length: min_length,
            }
        }
    }

    /// Unit direction of the bond axis.
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        self.orientation * Vec3::Y
    }
}

/// Any unit vector perpendicular to `v`.
#[must_use]
pub fn find_perpendicular(v: Vec3) -> Vec3 {
    if v.length_squared() < 1e-8 {
        return Vec3::X;
    }
    let candidate = if v.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    v.cross(candidate).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn trims_by_both_radii() {
        let g = BondGeometry::between(
            Vec3::ZERO,
            0.1,
            Vec3::new(1.0, 0.0, 0.0),
            0.2,
            1.0,
            0.001,
        );
        assert!((g.length - 0.7).abs() < 1e-6);
        assert!(close(g.endpoint_a, Vec3::new(0.1, 0.0, 0.0)));
        assert!(close(g.endpoint_b, Vec3::new(0.8, 0.0, 0.0)));
        assert!(close(g.midpoint, Vec3::new(0.45, 0.0, 0.0)));
        assert!(close(g.direction(), Vec3::X));
    }

    #[test]
    fn overlap_factor_scales_trim() {
        let g = BondGeometry::between(
            Vec3::ZERO,
            0.1,
            Vec3::new(0.0, 0.0, 2.0),
            0.1,
            0.5,
            0.001,
        );
        assert!((g.length - 1.9).abs() < 1e-6);
        assert!(close(g.direction(), Vec3::Z));
    }

    #[test]
    fn overlapping_spheres_clamp_to_min_length() {
        let g = BondGeometry::between(
            Vec3::ZERO,
            0.3,
            Vec3::new(0.0, 0.4, 0.0),
            0.3,
            1.0,
            0.01,
        );
        assert_eq!(g.length, 0.01);
        assert!(close(g.midpoint, Vec3::new(0.0, 0.2, 0.0)));
        assert!(((g.endpoint_b - g.endpoint_a).length() - 0.01).abs() < 1e-6);
    }

    #[test]
    fn coincident_atoms_fall_back_to_y() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        let g = BondGeometry::between(p, 0.1, p, 0.1, 1.0, 0.001);
        assert!(close(g.direction(), Vec3::Y));
        assert!(g.orientation.is_finite());
        assert!(close(g.midpoint, p));
    }

    #[test]
    fn antiparallel_axis_is_finite() {
        let g = BondGeometry::between(
            Vec3::ZERO,
            0.0,
            Vec3::new(0.0, -1.0, 0.0),
            0.0,
            1.0,
            0.001,
        );
        assert!(g.orientation.is_finite());
        assert!(close(g.direction(), -Vec3::Y));
    }

    #[test]
    fn perpendicular_is_orthogonal_unit() {
        for v in [Vec3::X, Vec3::Y, Vec3::new(1.0, 2.0, -3.0)] {
            let p = find_perpendicular(v);
            assert!(p.dot(v).abs() < 1e-5);
            assert!((p.length() - 1.0).abs() < 1e-5);
        }
        assert_eq!(find_perpendicular(Vec3::ZERO), Vec3::X);
    }
}
