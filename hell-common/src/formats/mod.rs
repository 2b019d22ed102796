//! Hell engine binary model format (.model)
//!
//! Little-endian, fixed-size records. Every record starts with a 32-byte
//! zero-padded signature; names are UTF-8, fixed width, zero padded.
//!
//! # File layout
//! ```text
//! ModelHeader
//! MeshHeader + vertices + indices        (mesh_count times)
//! ArmatureHeader + BoneRecord * N        (armature_count times, version 3 only)
//! ```
//!
//! Matrices are written column-major: element (row r, column c) lands at
//! linear index `c * 4 + r`, which is exactly `glam::Mat4::to_cols_array()`.
//!
//! All headers implement [`BinarySerializable`].

pub mod armature;
pub mod mesh;
pub mod model;
mod serialization;

pub use armature::*;
pub use mesh::*;
pub use model::*;
pub use serialization::BinarySerializable;

use glam::{Mat4, Vec3};

/// File extension for exported models
pub const MODEL_EXT: &str = "model";

/// Current model format version
pub const MODEL_VERSION: u32 = 3;

/// Width of every record signature
pub const SIGNATURE_SIZE: usize = 32;
/// Width of model, mesh and armature names
pub const NAME_SIZE: usize = 256;
/// Width of bone names
pub const BONE_NAME_SIZE: usize = 64;

pub const MODEL_SIGNATURE: &str = "HELL_MODEL";
pub const MESH_SIGNATURE: &str = "HELL_MESH";
pub const ARMATURE_SIGNATURE: &str = "HELL_ARMATURE";

/// Errors raised while decoding model data
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormatError {
    #[error("{what}: need {needed} bytes, got {available}")]
    TooShort {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("bad signature: expected '{expected}', found '{found}'")]
    BadSignature { expected: &'static str, found: String },

    #[error("unsupported model version {0} (supported: 2, 3)")]
    UnsupportedVersion(u32),
}

/// Encode a string into a fixed-width, zero-padded byte field.
///
/// Strings longer than `N` bytes are cut at the last UTF-8 character boundary
/// that fits. A name that fills the field exactly has no terminating NUL.
pub fn encode_fixed_str<const N: usize>(s: &str) -> [u8; N] {
    let mut end = s.len().min(N);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = [0u8; N];
    out[..end].copy_from_slice(&s.as_bytes()[..end]);
    out
}

/// Decode a fixed-width field up to its first NUL (or the whole field).
pub fn decode_fixed_str(bytes: &[u8]) -> String {
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..len]).into_owned()
}

/// Sequential little-endian writer over a fixed header buffer.
pub(crate) struct FieldWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> FieldWriter<'a> {
    pub(crate) fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn bytes(&mut self, data: &[u8]) {
        self.buf[self.pos..self.pos + data.len()].copy_from_slice(data);
        self.pos += data.len();
    }

    pub(crate) fn u32(&mut self, v: u32) {
        self.bytes(&v.to_le_bytes());
    }

    pub(crate) fn i32(&mut self, v: i32) {
        self.bytes(&v.to_le_bytes());
    }

    pub(crate) fn u64(&mut self, v: u64) {
        self.bytes(&v.to_le_bytes());
    }

    pub(crate) fn f32(&mut self, v: f32) {
        self.bytes(&v.to_le_bytes());
    }

    pub(crate) fn vec3(&mut self, v: Vec3) {
        for c in v.to_array() {
            self.f32(c);
        }
    }

    pub(crate) fn mat4(&mut self, m: &Mat4) {
        for c in m.to_cols_array() {
            self.f32(c);
        }
    }
}

/// Sequential little-endian reader; callers check the length up front.
pub(crate) struct FieldReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn bytes<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    pub(crate) fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.bytes())
    }

    pub(crate) fn i32(&mut self) -> i32 {
        i32::from_le_bytes(self.bytes())
    }

    pub(crate) fn u64(&mut self) -> u64 {
        u64::from_le_bytes(self.bytes())
    }

    pub(crate) fn f32(&mut self) -> f32 {
        f32::from_le_bytes(self.bytes())
    }

    pub(crate) fn vec3(&mut self) -> Vec3 {
        Vec3::new(self.f32(), self.f32(), self.f32())
    }

    pub(crate) fn mat4(&mut self) -> Mat4 {
        let mut cols = [0.0f32; 16];
        for c in cols.iter_mut() {
            *c = self.f32();
        }
        Mat4::from_cols_array(&cols)
    }
}

/// Check a signature field against the expected tag.
pub(crate) fn check_signature(
    field: &[u8; SIGNATURE_SIZE],
    expected: &'static str,
) -> Result<(), FormatError> {
    if field == &encode_fixed_str::<SIGNATURE_SIZE>(expected) {
        Ok(())
    } else {
        Err(FormatError::BadSignature {
            expected,
            found: decode_fixed_str(field),
        })
    }
}

pub(crate) fn ensure_len(
    what: &'static str,
    bytes: &[u8],
    needed: usize,
) -> Result<(), FormatError> {
    if bytes.len() < needed {
        return Err(FormatError::TooShort {
            what,
            needed,
            available: bytes.len(),
        });
    }
    Ok(())
}
