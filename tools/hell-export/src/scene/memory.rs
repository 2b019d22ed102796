//! In-memory scene graph
//!
//! Meshes are stored as polygons of any arity and fan-triangulated when
//! evaluated. Tangents are generated with MikkTSpace for meshes with UVs.

use glam::{Mat4, Vec3};

use super::{
    generate_tangents, triangulate_fan, BoneData, EvaluatedMesh, MeshLoop, ObjectId, ObjectKind,
    SceneObject, SceneQuery,
};
use crate::error::{ExportError, ExportResult};

/// Polygon mesh source for [`SceneGraph::add_mesh`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuilder {
    positions: Vec<Vec3>,
    polygons: Vec<Vec<MeshLoop>>,
    has_uvs: bool,
}

impl MeshBuilder {
    pub fn new(positions: impl IntoIterator<Item = Vec3>) -> Self {
        Self {
            positions: positions.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Mark the mesh as carrying a UV layer (enables tangent generation)
    pub fn with_uvs(mut self) -> Self {
        self.has_uvs = true;
        self
    }

    pub fn polygon(mut self, loops: impl IntoIterator<Item = MeshLoop>) -> Self {
        self.polygons.push(loops.into_iter().collect());
        self
    }

    /// Polygon whose loops share one normal
    pub fn flat_polygon(self, vertices: &[u32], normal: Vec3) -> Self {
        self.polygon(vertices.iter().map(|&v| MeshLoop::new(v, normal)))
    }

    fn evaluate(&self) -> EvaluatedMesh {
        let mut mesh = EvaluatedMesh {
            positions: self.positions.clone(),
            triangles: self
                .polygons
                .iter()
                .flat_map(|p| triangulate_fan(p))
                .collect(),
            has_uvs: self.has_uvs,
        };
        if mesh.has_uvs {
            generate_tangents(&mut mesh);
        }
        mesh
    }
}

#[derive(Debug, Clone)]
enum ObjectData {
    Mesh(MeshBuilder),
    Armature(Vec<BoneData>),
}

#[derive(Debug, Clone)]
struct Entry {
    visible: bool,
    selected: bool,
    data: ObjectData,
}

/// Scene assembled in code
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    objects: Vec<SceneObject>,
    entries: Vec<Entry>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, name: &str, kind: ObjectKind, world: Mat4, data: ObjectData) -> ObjectId {
        let id = ObjectId(self.objects.len());
        self.objects.push(SceneObject {
            name: name.to_string(),
            kind,
            world,
            parent: None,
        });
        self.entries.push(Entry {
            visible: true,
            selected: false,
            data,
        });
        id
    }

    pub fn add_mesh(&mut self, name: &str, world: Mat4, mesh: MeshBuilder) -> ObjectId {
        self.push(name, ObjectKind::Mesh, world, ObjectData::Mesh(mesh))
    }

    pub fn add_armature(&mut self, name: &str, world: Mat4, bones: Vec<BoneData>) -> ObjectId {
        self.push(name, ObjectKind::Armature, world, ObjectData::Armature(bones))
    }

    /// Set the scene-graph parent; world transforms are not touched
    pub fn set_parent(&mut self, child: ObjectId, parent: ObjectId) {
        if let Some(o) = self.objects.get_mut(child.0) {
            o.parent = Some(parent);
        }
    }

    pub fn set_visible(&mut self, id: ObjectId, visible: bool) {
        if let Some(e) = self.entries.get_mut(id.0) {
            e.visible = visible;
        }
    }

    pub fn set_selected(&mut self, id: ObjectId, selected: bool) {
        if let Some(e) = self.entries.get_mut(id.0) {
            e.selected = selected;
        }
    }

    fn entry(&self, id: ObjectId) -> ExportResult<&Entry> {
        self.entries
            .get(id.0)
            .ok_or_else(|| ExportError::Scene(format!("no object with id {}", id.0)))
    }

    fn name(&self, id: ObjectId) -> &str {
        self.objects.get(id.0).map(|o| o.name.as_str()).unwrap_or("?")
    }
}

impl SceneQuery for SceneGraph {
    fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    fn is_visible(&self, id: ObjectId) -> bool {
        self.entries.get(id.0).is_some_and(|e| e.visible)
    }

    fn is_selected(&self, id: ObjectId) -> bool {
        self.entries.get(id.0).is_some_and(|e| e.selected)
    }

    fn evaluate_mesh(&self, id: ObjectId) -> ExportResult<EvaluatedMesh> {
        match &self.entry(id)?.data {
            ObjectData::Mesh(builder) => {
                let mesh = builder.evaluate();
                mesh.validate(self.name(id))?;
                Ok(mesh)
            }
            ObjectData::Armature(_) => Err(ExportError::missing(self.name(id), "mesh data")),
        }
    }

    fn bones(&self, id: ObjectId) -> ExportResult<Vec<BoneData>> {
        match &self.entry(id)?.data {
            ObjectData::Armature(bones) => Ok(bones.clone()),
            ObjectData::Mesh(_) => Err(ExportError::missing(self.name(id), "armature data")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn square() -> MeshBuilder {
        MeshBuilder::new([
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ])
    }

    #[test]
    fn test_polygons_are_fan_triangulated() {
        let mut scene = SceneGraph::new();
        let quad = square().flat_polygon(&[0, 1, 2, 3], Vec3::Z);
        let id = scene.add_mesh("Quad", Mat4::IDENTITY, quad);
        let mesh = scene.evaluate_mesh(id).unwrap();
        assert_eq!(mesh.triangles.len(), 2);
        assert_eq!(mesh.triangles[1].map(|l| l.vertex), [0, 2, 3]);
        assert!(!mesh.has_uvs);
        assert!(mesh.triangles.iter().flatten().all(|l| l.tangent == Vec3::ZERO));
    }

    #[test]
    fn test_uv_meshes_get_tangents() {
        let uvs = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        let builder = square()
            .with_uvs()
            .polygon((0..4).map(|i| MeshLoop::new(i, Vec3::Z).with_uv(uvs[i as usize])));
        let mut scene = SceneGraph::new();
        let id = scene.add_mesh("Quad", Mat4::IDENTITY, builder);
        let mesh = scene.evaluate_mesh(id).unwrap();
        assert!(mesh
            .triangles
            .iter()
            .flatten()
            .all(|l| (l.tangent.length() - 1.0).abs() < 1e-4));
    }

    #[test]
    fn test_visibility_selection_and_parents() {
        let mut scene = SceneGraph::new();
        let a = scene.add_mesh("A", Mat4::IDENTITY, square());
        let b = scene.add_mesh("B", Mat4::IDENTITY, square());
        scene.set_parent(b, a);
        scene.set_visible(a, false);
        scene.set_selected(b, true);

        assert!(!scene.is_visible(a));
        assert!(scene.is_visible(b));
        assert!(scene.is_selected(b));
        assert!(!scene.is_selected(a));
        assert_eq!(scene.objects()[b.0].parent, Some(a));
        assert_eq!(scene.find("B"), Some(b));
        assert!(!scene.is_visible(ObjectId(99)));
    }

    #[test]
    fn test_kind_mismatch_is_missing_data() {
        let mut scene = SceneGraph::new();
        let mesh = scene.add_mesh("M", Mat4::IDENTITY, square());
        let arm = scene.add_armature("Rig", Mat4::IDENTITY, Vec::new());
        assert!(matches!(scene.bones(mesh), Err(ExportError::MissingData { .. })));
        assert!(matches!(scene.evaluate_mesh(arm), Err(ExportError::MissingData { .. })));
        assert!(matches!(scene.evaluate_mesh(ObjectId(7)), Err(ExportError::Scene(_))));
    }
}
