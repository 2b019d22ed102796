//! Read-only view of a host scene
//!
//! The exporter never walks a concrete scene format directly. It sees objects,
//! visibility, selection, evaluated (triangulated) meshes and armature bones
//! through [`SceneQuery`]. Two sources implement it:
//!
//! - [`SceneGraph`] - built in memory (tests, library users)
//! - [`GltfScene`] - loaded from a `.gltf`/`.glb` file
//!
//! All data handed out is in authoring space (right-handed, Z up, UV origin
//! bottom-left).

mod gltf_scene;
mod memory;
mod tangents;

pub use gltf_scene::GltfScene;
pub use memory::{MeshBuilder, SceneGraph};
pub use tangents::generate_tangents;

use glam::{Mat4, Vec2, Vec3};

use crate::error::{ExportError, ExportResult};

/// Index of an object in [`SceneQuery::objects`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub usize);

impl ObjectId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Mesh,
    Armature,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub kind: ObjectKind,
    /// Authoring-space world transform
    pub world: Mat4,
    pub parent: Option<ObjectId>,
}

/// One corner of an evaluated triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshLoop {
    /// Index into [`EvaluatedMesh::positions`]
    pub vertex: u32,
    pub normal: Vec3,
    pub uv: Vec2,
    /// Zero when the mesh has no UVs
    pub tangent: Vec3,
}

impl MeshLoop {
    pub fn new(vertex: u32, normal: Vec3) -> Self {
        Self {
            vertex,
            normal,
            uv: Vec2::ZERO,
            tangent: Vec3::ZERO,
        }
    }

    pub fn with_uv(mut self, uv: Vec2) -> Self {
        self.uv = uv;
        self
    }
}

pub type Triangle = [MeshLoop; 3];

/// Triangulated, modifier-applied copy of a mesh.
///
/// An owned temporary: dropping it releases it, on every exit path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluatedMesh {
    /// Object-local positions
    pub positions: Vec<Vec3>,
    pub triangles: Vec<Triangle>,
    pub has_uvs: bool,
}

impl EvaluatedMesh {
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Every loop must reference an existing position
    pub fn validate(&self, object: &str) -> ExportResult<()> {
        let count = self.positions.len();
        if let Some(bad) = self
            .triangles
            .iter()
            .flatten()
            .find(|l| l.vertex as usize >= count)
        {
            return Err(ExportError::missing(
                object,
                format!("vertex {} (mesh has {} positions)", bad.vertex, count),
            ));
        }
        Ok(())
    }

    pub fn position(&self, l: &MeshLoop) -> Vec3 {
        self.positions[l.vertex as usize]
    }
}

/// A bone as stored by the host armature
#[derive(Debug, Clone, PartialEq)]
pub struct BoneData {
    pub name: String,
    /// Index of the parent bone in the same list
    pub parent: Option<usize>,
    /// Rest matrix relative to the parent bone (armature space for roots)
    pub local_rest: Mat4,
    pub deform: bool,
}

/// Read-only access to a host scene
pub trait SceneQuery {
    fn objects(&self) -> &[SceneObject];

    fn is_visible(&self, id: ObjectId) -> bool;

    fn is_selected(&self, id: ObjectId) -> bool;

    /// Triangulated copy of a mesh object's geometry
    fn evaluate_mesh(&self, id: ObjectId) -> ExportResult<EvaluatedMesh>;

    /// Bones of an armature object
    fn bones(&self, id: ObjectId) -> ExportResult<Vec<BoneData>>;

    fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects().get(id.0)
    }

    fn find(&self, name: &str) -> Option<ObjectId> {
        self.objects()
            .iter()
            .position(|o| o.name == name)
            .map(ObjectId)
    }
}

/// Fan-triangulate a convex polygon: (0, i, i + 1) for every i
pub fn triangulate_fan(polygon: &[MeshLoop]) -> impl Iterator<Item = Triangle> + '_ {
    let first = polygon.first().copied();
    polygon
        .windows(2)
        .skip(1)
        .filter_map(move |pair| first.map(|f| [f, pair[0], pair[1]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loops(n: u32) -> Vec<MeshLoop> {
        (0..n).map(|i| MeshLoop::new(i, Vec3::Z)).collect()
    }

    #[test]
    fn test_triangulate_fan() {
        let tris: Vec<Vec<u32>> = triangulate_fan(&loops(5))
            .map(|t| t.iter().map(|l| l.vertex).collect())
            .collect();
        assert_eq!(tris, vec![vec![0, 1, 2], vec![0, 2, 3], vec![0, 3, 4]]);
    }

    #[test]
    fn test_triangulate_degenerate_polygons() {
        assert_eq!(triangulate_fan(&loops(2)).count(), 0);
        assert_eq!(triangulate_fan(&[]).count(), 0);
        assert_eq!(triangulate_fan(&loops(3)).count(), 1);
    }

    #[test]
    fn test_validate_rejects_out_of_range_loops() {
        let mesh = EvaluatedMesh {
            positions: vec![Vec3::ZERO; 2],
            triangles: vec![[
                MeshLoop::new(0, Vec3::Z),
                MeshLoop::new(1, Vec3::Z),
                MeshLoop::new(2, Vec3::Z),
            ]],
            has_uvs: false,
        };
        let err = mesh.validate("Broken").unwrap_err();
        assert!(err.is_input_error());
        assert!(err.to_string().contains("Broken"));
    }
}
