//! hell-export library
//!
//! Converts scene meshes and armatures into Hell engine `.model` files.
//!
//! Pipeline, leaves first: [`collect`] picks objects, [`basis`] moves data into
//! engine space, [`aabb`] accumulates bounds, [`weld`] deduplicates vertices,
//! [`transform`] resolves local transforms, [`skeleton`] orders bone tables and
//! [`formats`] writes the file. [`export`] drives one run over a [`SceneQuery`].

pub mod aabb;
pub mod basis;
pub mod collect;
pub mod config;
pub mod error;
pub mod export;
pub mod formats;
pub mod manifest;
pub mod scene;
pub mod skeleton;
pub mod transform;
pub mod weld;

pub use aabb::Aabb;
pub use basis::CoordinateConverter;
pub use config::{ExportOptions, SelectionMode, DEFAULT_NORMAL_THRESHOLD, DEFAULT_ROUNDING};
pub use error::{ExportError, ExportResult};
pub use export::{export_scene, ExportContext, ExportSummary};
pub use manifest::{BuildJob, Manifest, MANIFEST_NAME};
pub use scene::{
    BoneData, EvaluatedMesh, GltfScene, MeshBuilder, MeshLoop, ObjectId, ObjectKind, SceneGraph,
    SceneObject, SceneQuery,
};
pub use weld::{VertexWelder, WeldedMesh};
