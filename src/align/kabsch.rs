//! Least-squares rigid superposition (Kabsch) with reflection correction.
//!
//! The SVD of the 3×3 cross-covariance is recovered from the symmetric
//! eigen-decomposition of `HᵀH`: power iteration with deflation gives a
//! starting basis, and cyclic Jacobi rotations polish it until the
//! off-diagonal part vanishes, so nearly equal eigenvalues still resolve.
//! Everything runs in `f64`; the resulting transform is handed out in `f32`
//! to match the rest of the scene data.

use glam::{DMat3, DVec3, Mat3, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Minimum number of point pairs for a meaningful fit.
pub const DEFAULT_MIN_PAIRS: usize = 3;

/// Power iterations per eigenvector.
pub const DEFAULT_POWER_ITERATIONS: usize = 64;

/// Seed for the power-iteration start vectors.
pub const DEFAULT_SEED: u64 = 0x6d6f_6c6d_6f72_7068;

/// Singular values below this fraction of the largest are treated as zero.
const RELATIVE_SINGULAR_EPS: f64 = 1e-9;

/// Upper bound on Jacobi sweeps; 3×3 converges in a handful.
const MAX_JACOBI_SWEEPS: usize = 32;

/// Rigid transform `p' = R·p + t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentTransform {
    /// Proper rotation (orthonormal, determinant +1).
    pub rotation: Mat3,
    /// Translation applied after the rotation.
    pub translation: Vec3,
}

impl AlignmentTransform {
    /// No rotation, no translation.
    pub const IDENTITY: Self = Self {
        rotation: Mat3::IDENTITY,
        translation: Vec3::ZERO,
    };

    /// Identity transform.
    #[must_use]
    pub fn identity() -> Self {
        Self::IDENTITY
    }

    /// Transform a single point.
    #[inline]
    #[must_use]
    pub fn apply(&self, p: Vec3) -> Vec3 {
        self.rotation * p + self.translation
    }

    /// Whether this is exactly the identity.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Root-mean-square distance between `apply(a)` and `b` over `pairs`
    /// (0 for an empty list).
    #[must_use]
    pub fn rmsd(&self, pairs: &[(Vec3, Vec3)]) -> f32 {
        if pairs.is_empty() {
            return 0.0;
        }
        let sum: f32 = pairs
            .iter()
            .map(|&(a, b)| self.apply(a).distance_squared(b))
            .sum();
        (sum / pairs.len() as f32).sqrt()
    }
}

impl Default for AlignmentTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Configured Kabsch solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KabschSolver {
    /// Fewer pairs than this yields the identity transform.
    pub min_pairs: usize,
    /// Power iterations per eigenvector.
    pub iterations: usize,
    /// Seed for the random start vectors.
    pub seed: u64,
}

impl Default for KabschSolver {
    fn default() -> Self {
        Self {
            min_pairs: DEFAULT_MIN_PAIRS,
            iterations: DEFAULT_POWER_ITERATIONS,
            seed: DEFAULT_SEED,
        }
    }
}

impl KabschSolver {
    /// Best rigid transform moving each `pairs[k].0` onto `pairs[k].1`.
    ///
    /// Below [`min_pairs`](Self::min_pairs) the exact identity is returned.
    #[must_use]
    pub fn solve(&self, pairs: &[(Vec3, Vec3)]) -> AlignmentTransform {
        if pairs.len() < self.min_pairs || pairs.is_empty() {
            log::debug!(
                "alignment skipped: {} pairs (< {}), using identity",
                pairs.len(),
                self.min_pairs
            );
            return AlignmentTransform::IDENTITY;
        }

        let n = pairs.len() as f64;
        let centroid_a =
            pairs.iter().map(|(a, _)| a.as_dvec3()).sum::<DVec3>() / n;
        let centroid_b =
            pairs.iter().map(|(_, b)| b.as_dvec3()).sum::<DVec3>() / n;

        let h = pairs.iter().fold(DMat3::ZERO, |acc, (a, b)| {
            acc + outer(a.as_dvec3() - centroid_a, b.as_dvec3() - centroid_b)
        });

        let rotation = self.rotation_from_covariance(&h);
        let translation = centroid_b - rotation * centroid_a;

        AlignmentTransform {
            rotation: rotation.as_mat3(),
            translation: translation.as_vec3(),
        }
    }

    /// `R = V·Uᵀ` from `H = U·S·Vᵀ`, reflection-corrected.
    fn rotation_from_covariance(&self, h: &DMat3) -> DMat3 {
        let hth = h.transpose() * *h;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let eigen = symmetric_eigen(&hth, self.iterations, &mut rng);

        let sigma = eigen.map(|(lambda, _)| lambda.max(0.0).sqrt());
        if sigma[0] <= f64::EPSILON {
            // all points coincide within each set
            return DMat3::IDENTITY;
        }
        let v = eigen.map(|(_, vec)| vec);

        let mut u = [DVec3::ZERO; 3];
        for k in 0..2 {
            let candidate = if sigma[k] > sigma[0] * RELATIVE_SINGULAR_EPS {
                let mut uk = *h * v[k] / sigma[k];
                for prev in &u[..k] {
                    uk -= *prev * uk.dot(*prev);
                }
                uk.try_normalize()
            } else {
                None
            };
            u[k] = candidate.unwrap_or_else(|| complete_basis(&u[..k]));
        }
        u[2] = u[0].cross(u[1]);

        let u_mat = DMat3::from_cols(u[0], u[1], u[2]);
        let mut v_mat = DMat3::from_cols(v[0], v[1], v[2]);
        let mut rotation = v_mat * u_mat.transpose();
        if rotation.determinant() < 0.0 {
            // negate the vector of the smallest singular value
            v_mat.z_axis = -v_mat.z_axis;
            rotation = v_mat * u_mat.transpose();
        }
        rotation
    }
}

/// Rigid transform moving `pairs[k].0` onto `pairs[k].1` with default
/// settings.
#[must_use]
pub fn align(pairs: &[(Vec3, Vec3)]) -> AlignmentTransform {
    KabschSolver::default().solve(pairs)
}

/// Outer product `a·bᵀ`.
fn outer(a: DVec3, b: DVec3) -> DMat3 {
    DMat3::from_cols(a * b.x, a * b.y, a * b.z)
}

/// Unit vector orthogonal to every vector in `basis` (at most two).
fn complete_basis(basis: &[DVec3]) -> DVec3 {
    match basis {
        [] => DVec3::X,
        [a] => a.any_orthonormal_vector(),
        [a, b, ..] => a.cross(*b).try_normalize().unwrap_or(DVec3::Z),
    }
}

/// Random unit vector orthogonal to `found`, falling back to basis
/// completion when the draw is (nearly) inside their span.
fn random_start(found: &[DVec3], rng: &mut impl Rng) -> DVec3 {
    let mut v = DVec3::new(
        rng.random_range(-1.0..1.0),
        rng.random_range(-1.0..1.0),
        rng.random_range(-1.0..1.0),
    );
    for f in found {
        v -= *f * v.dot(*f);
    }
    v.try_normalize()
        .filter(|n| n.is_finite())
        .unwrap_or_else(|| complete_basis(found))
}

/// Eigenpairs of a symmetric positive semi-definite 3×3 matrix, largest
/// eigenvalue first.
///
/// Three sequential dominant-eigenvector extractions by power iteration, each
/// followed by deflation `M ← M − λ·v·vᵀ`. Iterates are kept orthogonal to
/// the vectors already found; a subspace whose eigenvalues are all zero is
/// filled in by orthonormal completion. The resulting basis is then polished
/// by [`jacobi_polish`].
fn symmetric_eigen(
    m: &DMat3,
    iterations: usize,
    rng: &mut impl Rng,
) -> [(f64, DVec3); 3] {
    let scale = (m.x_axis.x + m.y_axis.y + m.z_axis.z).abs().max(f64::MIN_POSITIVE);
    let mut work = *m;
    let mut found: Vec<DVec3> = Vec::with_capacity(3);

    for _ in 0..3 {
        let mut v = random_start(&found, rng);
        for _ in 0..iterations {
            let mut next = work * v;
            for f in &found {
                next -= *f * next.dot(*f);
            }
            if next.length() <= scale * f64::EPSILON {
                // remaining subspace is null: any orthogonal vector will do
                v = complete_basis(&found);
                break;
            }
            v = next.normalize();
        }
        let lambda = v.dot(*m * v);
        work -= outer(v, v) * lambda;
        found.push(v);
    }

    jacobi_polish(m, DMat3::from_cols(found[0], found[1], found[2]))
}

/// Diagonalize `Bᵀ·M·B` for an orthonormal `basis` with cyclic Jacobi
/// rotations, rotating the basis along. Eigenpairs come back sorted by
/// descending eigenvalue.
fn jacobi_polish(m: &DMat3, basis: DMat3) -> [(f64, DVec3); 3] {
    let mut vectors = basis;
    let mut a = vectors.transpose() * *m * vectors;
    let tolerance = frobenius(m) * f64::EPSILON;

    for _ in 0..MAX_JACOBI_SWEEPS {
        let off = (entry(&a, 0, 1).powi(2)
            + entry(&a, 0, 2).powi(2)
            + entry(&a, 1, 2).powi(2))
        .sqrt();
        if off <= tolerance {
            break;
        }
        for (p, q) in [(0, 1), (0, 2), (1, 2)] {
            let apq = entry(&a, p, q);
            if apq == 0.0 {
                continue;
            }
            let theta = (entry(&a, q, q) - entry(&a, p, p)) / (2.0 * apq);
            let t = theta.signum() / (theta.abs() + theta.hypot(1.0));
            let c = 1.0 / t.hypot(1.0);
            let s = t * c;

            let mut rotation = DMat3::IDENTITY;
            rotation.col_mut(p)[p] = c;
            rotation.col_mut(q)[q] = c;
            rotation.col_mut(q)[p] = s;
            rotation.col_mut(p)[q] = -s;

            a = rotation.transpose() * a * rotation;
            vectors *= rotation;
        }
    }

    let mut pairs = [0, 1, 2].map(|k| (entry(&a, k, k), vectors.col(k)));
    pairs.sort_by(|x, y| y.0.total_cmp(&x.0));
    pairs
}

/// Element at `row`, `col` of a column-major matrix.
fn entry(m: &DMat3, row: usize, col: usize) -> f64 {
    m.col(col)[row]
}

fn frobenius(m: &DMat3) -> f64 {
    m.to_cols_array().iter().map(|x| x * x).sum::<f64>().sqrt()
}
