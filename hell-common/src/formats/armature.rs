//! Armature record
//!
//! # Layout
//! ```text
//! 0x000: signature [u8; 32] "HELL_ARMATURE"
//! 0x020: name [u8; 256]
//! 0x120: bone_count u32
//! 0x124: bones (bone_count × 200 bytes)
//! ```
//!
//! Each bone:
//! ```text
//! 0x00: name [u8; 64]
//! 0x40: local_rest [f32; 16] column-major (relative to parent bone)
//! 0x80: inverse_bind [f32; 16] column-major
//! 0xC0: parent_index i32 (-1 = root)
//! 0xC4: deform i32 (0 or 1)
//! ```
//!
//! Bones are ordered parent-before-child: `parent_index < own index`.

use glam::Mat4;

use super::{
    check_signature, decode_fixed_str, encode_fixed_str, ensure_len, FieldReader, FieldWriter,
    FormatError, ARMATURE_SIGNATURE, BONE_NAME_SIZE, NAME_SIZE, SIGNATURE_SIZE,
};

/// Armature header (292 bytes)
#[derive(Debug, Clone, PartialEq)]
pub struct ArmatureHeader {
    pub name: String,
    pub bone_count: u32,
}

impl ArmatureHeader {
    pub const SIZE: usize = 292;

    pub fn new(name: impl Into<String>, bone_count: u32) -> Self {
        Self {
            name: name.into(),
            bone_count,
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        let mut w = FieldWriter::new(&mut bytes);
        w.bytes(&encode_fixed_str::<SIGNATURE_SIZE>(ARMATURE_SIGNATURE));
        w.bytes(&encode_fixed_str::<NAME_SIZE>(&self.name));
        w.u32(self.bone_count);
        bytes
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        ensure_len("armature header", bytes, Self::SIZE)?;
        let mut r = FieldReader::new(bytes);
        check_signature(&r.bytes::<SIGNATURE_SIZE>(), ARMATURE_SIGNATURE)?;
        Ok(Self {
            name: decode_fixed_str(&r.bytes::<NAME_SIZE>()),
            bone_count: r.u32(),
        })
    }
}

/// One entry of an armature's bone table (200 bytes)
#[derive(Debug, Clone, PartialEq)]
pub struct BoneRecord {
    pub name: String,
    pub local_rest: Mat4,
    pub inverse_bind: Mat4,
    pub parent_index: i32,
    pub deform: bool,
}

impl BoneRecord {
    pub const SIZE: usize = 200;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        let mut w = FieldWriter::new(&mut bytes);
        w.bytes(&encode_fixed_str::<BONE_NAME_SIZE>(&self.name));
        w.mat4(&self.local_rest);
        w.mat4(&self.inverse_bind);
        w.i32(self.parent_index);
        w.i32(self.deform as i32);
        bytes
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        ensure_len("bone record", bytes, Self::SIZE)?;
        let mut r = FieldReader::new(bytes);
        Ok(Self {
            name: decode_fixed_str(&r.bytes::<BONE_NAME_SIZE>()),
            local_rest: r.mat4(),
            inverse_bind: r.mat4(),
            parent_index: r.i32(),
            deform: r.i32() != 0,
        })
    }
}
