//! Local transforms relative to an engine-space parent
//!
//! World transforms are moved into engine space with `C4 · W · C4⁻¹`, made
//! relative to the parent (`P⁻¹ · W`) and then only the translation column is
//! multiplied by the export scale. Rotation/scale stays as authored.

use glam::Mat4;

use crate::basis::CoordinateConverter;
use crate::error::{ExportError, ExportResult};

/// Determinants at or below this magnitude are treated as singular
pub const SINGULAR_EPSILON: f32 = 1e-12;

/// Inverse of `m`, or `None` when `m` is (numerically) singular
pub fn try_inverse(m: &Mat4) -> Option<Mat4> {
    let det = m.determinant();
    if !det.is_finite() || det.abs() <= SINGULAR_EPSILON {
        return None;
    }
    let inverse = m.inverse();
    inverse.is_finite().then_some(inverse)
}

/// Scale elements (0..3, 3) of `m`, leaving the 3x3 block untouched
pub fn scale_translation(m: &mut Mat4, scale: f32) {
    m.w_axis.x *= scale;
    m.w_axis.y *= scale;
    m.w_axis.z *= scale;
}

/// A local transform and its inverse
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalTransform {
    pub local: Mat4,
    pub inverse: Mat4,
}

/// Parent link for [`TransformResolver::resolve`]
#[derive(Debug, Clone, Copy)]
pub struct ParentTransform<'a> {
    pub name: &'a str,
    pub world: &'a Mat4,
}

#[derive(Debug, Clone, Copy)]
pub struct TransformResolver {
    converter: CoordinateConverter,
}

impl TransformResolver {
    pub fn new(converter: CoordinateConverter) -> Self {
        Self { converter }
    }

    /// World transform in engine space, translation not yet scaled
    pub fn engine_world(&self, world: &Mat4) -> Mat4 {
        self.converter.transform(world)
    }

    /// Local transform of `object` relative to `parent` (or its world transform if none)
    pub fn resolve(
        &self,
        object: &str,
        world: &Mat4,
        parent: Option<ParentTransform<'_>>,
    ) -> ExportResult<LocalTransform> {
        let w = self.engine_world(world);
        let mut local = match parent {
            Some(parent) => {
                let pw = self.engine_world(parent.world);
                let pw_inv = try_inverse(&pw).ok_or_else(|| ExportError::SingularTransform {
                    object: parent.name.to_string(),
                })?;
                pw_inv * w
            }
            None => w,
        };
        scale_translation(&mut local, self.converter.scale());

        let inverse = try_inverse(&local).ok_or_else(|| ExportError::SingularTransform {
            object: object.to_string(),
        })?;
        Ok(LocalTransform { local, inverse })
    }

    /// Global rest matrix of a bone in engine space with scaled translation.
    ///
    /// `armature_space_rest` is the bone's rest matrix accumulated along its
    /// own bone chain (armature space); `armature_world` places the armature.
    pub fn bone_global_rest(&self, armature_world: &Mat4, armature_space_rest: &Mat4) -> Mat4 {
        let mut g = self
            .converter
            .transform(&(*armature_world * *armature_space_rest));
        scale_translation(&mut g, self.converter.scale());
        g
    }
}
