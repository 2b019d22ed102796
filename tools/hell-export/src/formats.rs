//! Binary writers for `.model` files
//!
//! Re-exports the record definitions from hell-common and adds the streaming
//! writers used by the export pipeline. Headers go out through
//! [`BinarySerializable::write_to`]. Everything is written in one forward
//! pass; nothing is ever read back or patched.

pub use hell_common::formats::*;

use std::io::{self, Write};

/// Write the file header
pub fn write_model_header<W: Write>(w: &mut W, header: &ModelHeader) -> io::Result<()> {
    header.write_to(w)
}

/// Write a complete mesh record: header, vertex buffer, index buffer
///
/// The header's counts must match the buffers.
pub fn write_mesh<W: Write>(
    w: &mut W,
    header: &MeshHeader,
    vertices: &[Vertex],
    indices: &[u32],
) -> io::Result<()> {
    debug_assert_eq!(header.vertex_count as usize, vertices.len());
    debug_assert_eq!(header.index_count as usize, indices.len());

    header.write_to(w)?;

    let floats: &[f32] = bytemuck::cast_slice(vertices);
    for f in floats {
        w.write_all(&f.to_le_bytes())?;
    }
    for i in indices {
        w.write_all(&i.to_le_bytes())?;
    }
    Ok(())
}

/// Write an armature record: header followed by its bone table
pub fn write_armature<W: Write>(w: &mut W, name: &str, bones: &[BoneRecord]) -> io::Result<()> {
    ArmatureHeader::new(name, bones.len() as u32).write_to(w)?;
    for bone in bones {
        bone.write_to(w)?;
    }
    Ok(())
}
