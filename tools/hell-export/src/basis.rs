//! Authoring space -> engine space conversion
//!
//! Authoring space is right-handed Z-up; engine space is Y-up with the
//! authoring Y axis flipped into -Z: `(x, y, z) -> (x, z, -y)`.
//! The same mapping is used for every position, direction and transform that
//! crosses the boundary.

use glam::{Mat3, Mat4, Vec3, Vec4};

/// Basis change for vectors and positions
pub const AUTHORING_TO_ENGINE: Mat3 = Mat3::from_cols(Vec3::X, Vec3::NEG_Z, Vec3::Y);

/// Basis change for 4x4 transforms
pub const AUTHORING_TO_ENGINE_4: Mat4 = Mat4::from_cols(Vec4::X, Vec4::NEG_Z, Vec4::Y, Vec4::W);

/// Inverse of [`AUTHORING_TO_ENGINE_4`] (the basis is orthonormal)
pub const ENGINE_TO_AUTHORING_4: Mat4 = Mat4::from_cols(Vec4::X, Vec4::Z, Vec4::NEG_Y, Vec4::W);

/// Inverse of [`AUTHORING_TO_ENGINE`]
pub const ENGINE_TO_AUTHORING: Mat3 = Mat3::from_cols(Vec3::X, Vec3::Z, Vec3::NEG_Y);

/// Converts authoring-space data to engine space with a uniform scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateConverter {
    scale: f32,
}

impl CoordinateConverter {
    pub fn new(scale: f32) -> Self {
        Self { scale }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Basis change, then uniform scale
    pub fn position(&self, p: Vec3) -> Vec3 {
        (AUTHORING_TO_ENGINE * p) * self.scale
    }

    /// Basis change, then renormalize. Never scaled; zero stays zero.
    pub fn direction(&self, d: Vec3) -> Vec3 {
        (AUTHORING_TO_ENGINE * d).normalize_or_zero()
    }

    /// `C4 · T · C4⁻¹`; translation is left unscaled (see `transform::scale_translation`)
    pub fn transform(&self, t: &Mat4) -> Mat4 {
        AUTHORING_TO_ENGINE_4 * *t * ENGINE_TO_AUTHORING_4
    }
}

impl Default for CoordinateConverter {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Engine-space position back into authoring space (no scale)
pub fn position_to_authoring(p: Vec3) -> Vec3 {
    ENGINE_TO_AUTHORING * p
}

/// Engine-space direction back into authoring space
pub fn direction_to_authoring(d: Vec3) -> Vec3 {
    (ENGINE_TO_AUTHORING * d).normalize_or_zero()
}

/// Engine-space transform back into authoring space: `C4⁻¹ · T · C4`
pub fn transform_to_authoring(t: &Mat4) -> Mat4 {
    ENGINE_TO_AUTHORING_4 * *t * AUTHORING_TO_ENGINE_4
}
