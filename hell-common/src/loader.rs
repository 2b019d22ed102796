//! Model loader
//!
//! Parses a complete `.model` file (version 2 or 3) into memory. This is the
//! reading half of the format; the exporter never uses it on its own output
//! while writing, but tooling and tests do.

use std::path::Path;

use glam::{Mat4, Vec3};

use crate::formats::{
    ensure_len, ArmatureHeader, BinarySerializable, BoneRecord, FormatError, MeshHeader,
    ModelHeader, Vertex,
};

/// A decoded mesh record
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub parent_index: i32,
    pub aabb_min: Vec3,
    pub aabb_max: Vec3,
    pub local_transform: Mat4,
    pub inverse_local_transform: Mat4,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// A decoded armature record
#[derive(Debug, Clone, PartialEq)]
pub struct ArmatureData {
    pub name: String,
    pub bones: Vec<BoneRecord>,
}

/// A decoded model file
#[derive(Debug, Clone, PartialEq)]
pub struct ModelData {
    pub header: ModelHeader,
    pub meshes: Vec<MeshData>,
    pub armatures: Vec<ArmatureData>,
}

/// Read one record at `*offset` and advance past it
fn read_record<T: BinarySerializable>(
    bytes: &[u8],
    offset: &mut usize,
) -> Result<T, FormatError> {
    let record = T::deserialize(&bytes[*offset..])?;
    *offset += record.encoded_size();
    Ok(record)
}

impl ModelData {
    /// Parse a whole model file
    ///
    /// Record counts come from the file, so nothing is reserved up front;
    /// a bogus count runs out of bytes and fails with `TooShort`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut offset = 0;
        let header: ModelHeader = read_record(bytes, &mut offset)?;

        let mut meshes = Vec::new();
        for _ in 0..header.mesh_count {
            let mesh_header: MeshHeader = read_record(bytes, &mut offset)?;

            let payload = &bytes[offset..];
            ensure_len("mesh payload", payload, mesh_header.payload_size())?;

            let vertex_bytes = mesh_header.vertex_count as usize * Vertex::SIZE;
            let floats: Vec<f32> = payload[..vertex_bytes]
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
            let vertices = bytemuck::cast_slice::<f32, Vertex>(&floats).to_vec();

            let index_bytes = &payload[vertex_bytes..mesh_header.payload_size()];
            let indices = index_bytes
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
            offset += mesh_header.payload_size();

            meshes.push(MeshData {
                name: mesh_header.name,
                parent_index: mesh_header.parent_index,
                aabb_min: mesh_header.aabb_min,
                aabb_max: mesh_header.aabb_max,
                local_transform: mesh_header.local_transform,
                inverse_local_transform: mesh_header.inverse_local_transform,
                vertices,
                indices,
            });
        }

        let mut armatures = Vec::new();
        for _ in 0..header.armature_count {
            let armature_header: ArmatureHeader = read_record(bytes, &mut offset)?;

            ensure_len(
                "bone table",
                &bytes[offset..],
                armature_header.bone_count as usize * BoneRecord::SIZE,
            )?;
            let bones = (0..armature_header.bone_count)
                .map(|_| read_record::<BoneRecord>(bytes, &mut offset))
                .collect::<Result<Vec<_>, _>>()?;

            armatures.push(ArmatureData {
                name: armature_header.name,
                bones,
            });
        }

        Ok(Self {
            header,
            meshes,
            armatures,
        })
    }

    /// Read and parse a model file from disk
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Total vertex count over all meshes
    pub fn total_vertices(&self) -> usize {
        self.meshes.iter().map(|m| m.vertices.len()).sum()
    }
}
