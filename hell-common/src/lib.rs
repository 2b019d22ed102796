//! Shared types for the Hell engine `.model` format
//!
//! This crate is used by:
//! - `hell-export` (asset pipeline, writes models)
//! - the `inspect` tooling and tests (reads models back)
//!
//! # Modules
//!
//! - [`formats`] - fixed-layout header and record definitions
//! - [`loader`] - parses a complete `.model` file into memory

pub mod formats;
pub mod loader;

pub use formats::{
    decode_fixed_str, encode_fixed_str, ArmatureHeader, BinarySerializable, BoneRecord,
    FormatError, MeshHeader, ModelHeader, Vertex, ARMATURE_SIGNATURE, BONE_NAME_SIZE,
    MESH_SIGNATURE, MODEL_EXT, MODEL_SIGNATURE, MODEL_VERSION, NAME_SIZE, SIGNATURE_SIZE,
};
pub use loader::{ArmatureData, MeshData, ModelData};
