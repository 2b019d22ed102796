//! Model file header
//!
//! # Layout (version 3, 76 bytes)
//! ```text
//! 0x00: signature [u8; 32] "HELL_MODEL"
//! 0x20: version u32 (= 3)
//! 0x24: mesh_count u32
//! 0x28: armature_count u32
//! 0x2C: timestamp u64 (unix seconds)
//! 0x34: aabb_min [f32; 3]
//! 0x40: aabb_max [f32; 3]
//! ```
//!
//! Version 2 files omit `armature_count` (72 bytes) and carry no armatures.

use glam::Vec3;

use super::{
    check_signature, encode_fixed_str, ensure_len, FieldReader, FieldWriter, FormatError,
    MODEL_SIGNATURE, MODEL_VERSION, SIGNATURE_SIZE,
};

/// Model header (76 bytes in version 3)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelHeader {
    pub version: u32,
    pub mesh_count: u32,
    pub armature_count: u32,
    pub timestamp: u64,
    pub aabb_min: Vec3,
    pub aabb_max: Vec3,
}

impl ModelHeader {
    pub const SIZE: usize = 76;
    /// Size of the legacy version 2 header
    pub const SIZE_V2: usize = 72;

    pub fn new(
        mesh_count: u32,
        armature_count: u32,
        timestamp: u64,
        aabb_min: Vec3,
        aabb_max: Vec3,
    ) -> Self {
        Self {
            version: MODEL_VERSION,
            mesh_count,
            armature_count,
            timestamp,
            aabb_min,
            aabb_max,
        }
    }

    /// Serialized size for this header's version
    pub fn encoded_size(&self) -> usize {
        if self.version == 2 {
            Self::SIZE_V2
        } else {
            Self::SIZE
        }
    }

    /// Write header to bytes in the layout of `self.version`
    ///
    /// A version 2 header only fills the first [`Self::SIZE_V2`] bytes.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        let mut w = FieldWriter::new(&mut bytes);
        w.bytes(&encode_fixed_str::<SIGNATURE_SIZE>(MODEL_SIGNATURE));
        w.u32(self.version);
        w.u32(self.mesh_count);
        if self.version != 2 {
            w.u32(self.armature_count);
        }
        w.u64(self.timestamp);
        w.vec3(self.aabb_min);
        w.vec3(self.aabb_max);
        bytes
    }

    /// Read a version 2 or version 3 header
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        ensure_len("model header", bytes, Self::SIZE_V2)?;
        let mut r = FieldReader::new(bytes);
        check_signature(&r.bytes::<SIGNATURE_SIZE>(), MODEL_SIGNATURE)?;

        let version = r.u32();
        let mesh_count = r.u32();
        let armature_count = match version {
            2 => 0,
            3 => {
                ensure_len("model header", bytes, Self::SIZE)?;
                r.u32()
            }
            other => return Err(FormatError::UnsupportedVersion(other)),
        };

        Ok(Self {
            version,
            mesh_count,
            armature_count,
            timestamp: r.u64(),
            aabb_min: r.vec3(),
            aabb_max: r.vec3(),
        })
    }
}
