//! Mesh record
//!
//! # Layout (452-byte header)
//! ```text
//! 0x000: signature [u8; 32] "HELL_MESH"
//! 0x020: name [u8; 256]
//! 0x120: vertex_count u32
//! 0x124: index_count u32
//! 0x128: parent_index i32 (-1 = none)
//! 0x12C: aabb_min [f32; 3]
//! 0x138: aabb_max [f32; 3]
//! 0x144: local_transform [f32; 16] column-major
//! 0x184: inverse_local_transform [f32; 16] column-major
//! 0x1C4: vertices (vertex_count × 44 bytes)
//! var:   indices (index_count × u32)
//! ```

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use super::{
    check_signature, decode_fixed_str, encode_fixed_str, ensure_len, FieldReader, FieldWriter,
    FormatError, MESH_SIGNATURE, NAME_SIZE, SIGNATURE_SIZE,
};

/// Engine vertex: position, normal, uv, tangent (11 floats, 44 bytes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub tangent: [f32; 3],
}

impl Vertex {
    pub const SIZE: usize = 44;
    pub const FLOATS: usize = 11;
}

/// Mesh record header
#[derive(Debug, Clone, PartialEq)]
pub struct MeshHeader {
    pub name: String,
    pub vertex_count: u32,
    pub index_count: u32,
    pub parent_index: i32,
    pub aabb_min: Vec3,
    pub aabb_max: Vec3,
    pub local_transform: Mat4,
    pub inverse_local_transform: Mat4,
}

impl MeshHeader {
    pub const SIZE: usize = 452;

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        let mut w = FieldWriter::new(&mut bytes);
        w.bytes(&encode_fixed_str::<SIGNATURE_SIZE>(MESH_SIGNATURE));
        w.bytes(&encode_fixed_str::<NAME_SIZE>(&self.name));
        w.u32(self.vertex_count);
        w.u32(self.index_count);
        w.i32(self.parent_index);
        w.vec3(self.aabb_min);
        w.vec3(self.aabb_max);
        w.mat4(&self.local_transform);
        w.mat4(&self.inverse_local_transform);
        bytes
    }

    /// Read and validate a header
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        ensure_len("mesh header", bytes, Self::SIZE)?;
        let mut r = FieldReader::new(bytes);
        check_signature(&r.bytes::<SIGNATURE_SIZE>(), MESH_SIGNATURE)?;
        Ok(Self {
            name: decode_fixed_str(&r.bytes::<NAME_SIZE>()),
            vertex_count: r.u32(),
            index_count: r.u32(),
            parent_index: r.i32(),
            aabb_min: r.vec3(),
            aabb_max: r.vec3(),
            local_transform: r.mat4(),
            inverse_local_transform: r.mat4(),
        })
    }

    /// Size of the vertex and index payload that follows the header
    pub fn payload_size(&self) -> usize {
        self.vertex_count as usize * Vertex::SIZE + self.index_count as usize * 4
    }
}
