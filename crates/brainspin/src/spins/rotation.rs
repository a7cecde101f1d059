//! Uniform random rotations and their left/right mirror pair.

use nalgebra::{Matrix3, Vector3};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::hemi::Hemisphere;

/// Reflection across the Y-Z plane, `diag(-1, 1, 1)`.
pub fn reflect() -> Matrix3<f64> {
    Matrix3::from_diagonal(&Vector3::new(-1.0, 1.0, 1.0))
}

/// Rotation for each hemisphere; `right == F · left · F` with `F = reflect()`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationPair {
    pub left: Matrix3<f64>,
    pub right: Matrix3<f64>,
}

impl RotationPair {
    /// Mirrors `left` into the right hemisphere.
    pub fn from_left(left: Matrix3<f64>) -> Self {
        let f = reflect();
        Self {
            left,
            right: f * left * f,
        }
    }

    pub fn identity() -> Self {
        Self::from_left(Matrix3::identity())
    }

    #[inline]
    pub fn get(&self, hemi: Hemisphere) -> &Matrix3<f64> {
        match hemi {
            Hemisphere::Left => &self.left,
            Hemisphere::Right => &self.right,
        }
    }
}

/// Draws a Haar-uniform proper rotation.
///
/// QR of a 3×3 standard normal matrix; columns of Q are sign-corrected by the
/// diagonal of R, then column 0 is flipped if the determinant is negative.
pub fn gen_rotation<R: Rng + ?Sized>(rng: &mut R) -> RotationPair {
    let m = Matrix3::<f64>::from_fn(|_, _| rng.sample(StandardNormal));
    let qr = m.qr();
    let signs = qr.r().diagonal().map(|d| if d < 0.0 { -1.0 } else { 1.0 });
    let mut left = qr.q() * Matrix3::from_diagonal(&signs);
    if left.determinant() < 0.0 {
        left.column_mut(0).neg_mut();
    }
    RotationPair::from_left(left)
}

/// Rotates row-vector coordinates: `p · R` (i.e. `Rᵀ p`).
pub fn rotate(points: &[Vector3<f64>], rotation: &Matrix3<f64>) -> Vec<Vector3<f64>> {
    let rt = rotation.transpose();
    points.iter().map(|p| rt * p).collect()
}
