//! glTF/GLB scene source
//!
//! glTF is already in engine convention (Y up, -Z forward, UV origin top-left),
//! so everything read here is moved back into authoring space. The export
//! pipeline then applies its fixed conversion and lands on the original glTF
//! values again.
//!
//! Objects:
//! - every node with a mesh becomes a mesh object (all primitives merged)
//! - every skin becomes an armature object, its joints the bones

use std::path::Path;

use glam::{Mat4, Vec2, Vec3};
use gltf::mesh::Mode;
use hashbrown::{HashMap, HashSet};

use super::{
    generate_tangents, BoneData, EvaluatedMesh, MeshLoop, ObjectId, ObjectKind, SceneObject,
    SceneQuery,
};
use crate::basis::{direction_to_authoring, position_to_authoring, transform_to_authoring};
use crate::error::{ExportError, ExportResult};
use crate::transform::try_inverse;

#[derive(Debug, Clone)]
enum ObjectData {
    Mesh(EvaluatedMesh),
    Armature(Vec<BoneData>),
}

/// Placement of a node reached from the scene roots
#[derive(Debug, Clone, Copy)]
struct NodeInfo {
    /// glTF-space world transform
    world: Mat4,
    parent: Option<usize>,
}

/// A glTF document exposed as a scene
#[derive(Debug, Clone)]
pub struct GltfScene {
    objects: Vec<SceneObject>,
    data: Vec<ObjectData>,
    selected: HashSet<usize>,
}

impl GltfScene {
    /// Load a `.gltf` or `.glb` file
    pub fn load(path: &Path) -> ExportResult<Self> {
        let (document, buffers, _images) = gltf::import(path).map_err(|e| {
            ExportError::Scene(format!("failed to load glTF {}: {}", path.display(), e))
        })?;
        Self::from_document(&document, &buffers)
    }

    /// Build from an already imported document
    pub fn from_document(
        document: &gltf::Document,
        buffers: &[gltf::buffer::Data],
    ) -> ExportResult<Self> {
        let (order, nodes) = walk_nodes(document);

        let mut scene = GltfScene {
            objects: Vec::new(),
            data: Vec::new(),
            selected: HashSet::new(),
        };

        // Mesh nodes, in traversal order (parents before children)
        let mut mesh_objects: HashMap<usize, ObjectId> = HashMap::new();
        for node in &order {
            let Some(mesh) = node.mesh() else {
                continue;
            };
            let name = node
                .name()
                .or(mesh.name())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Mesh{}", node.index()));
            let evaluated = read_mesh(&name, &mesh, buffers)?;

            let info = nodes[&node.index()];
            let parent = info.parent.and_then(|p| mesh_objects.get(&p).copied());
            let id = scene.push(
                SceneObject {
                    name,
                    kind: ObjectKind::Mesh,
                    world: transform_to_authoring(&info.world),
                    parent,
                },
                ObjectData::Mesh(evaluated),
            );
            mesh_objects.insert(node.index(), id);
        }

        for skin in document.skins() {
            let name = skin
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Armature{}", skin.index()));
            let (world, bones) = read_skin(&name, &skin, &order, &nodes, buffers)?;
            scene.push(
                SceneObject {
                    name,
                    kind: ObjectKind::Armature,
                    world,
                    parent: None,
                },
                ObjectData::Armature(bones),
            );
        }

        tracing::debug!(
            "glTF scene: {} nodes, {} objects",
            order.len(),
            scene.objects.len()
        );
        Ok(scene)
    }

    fn push(&mut self, object: SceneObject, data: ObjectData) -> ObjectId {
        let id = ObjectId(self.objects.len());
        self.objects.push(object);
        self.data.push(data);
        id
    }

    /// Mark the named objects as selected (everything else unselected)
    pub fn with_selection<S: AsRef<str>>(mut self, names: &[S]) -> ExportResult<Self> {
        self.selected.clear();
        for name in names {
            let name = name.as_ref();
            let id = self
                .find(name)
                .ok_or_else(|| ExportError::Scene(format!("no object named '{}'", name)))?;
            self.selected.insert(id.0);
        }
        Ok(self)
    }

    fn object_data(&self, id: ObjectId) -> ExportResult<&ObjectData> {
        self.data
            .get(id.0)
            .ok_or_else(|| ExportError::Scene(format!("no object with id {}", id.0)))
    }

    fn name(&self, id: ObjectId) -> &str {
        self.objects.get(id.0).map(|o| o.name.as_str()).unwrap_or("?")
    }
}

impl SceneQuery for GltfScene {
    fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    fn is_visible(&self, id: ObjectId) -> bool {
        id.0 < self.objects.len()
    }

    fn is_selected(&self, id: ObjectId) -> bool {
        self.selected.contains(&id.0)
    }

    fn evaluate_mesh(&self, id: ObjectId) -> ExportResult<EvaluatedMesh> {
        match self.object_data(id)? {
            ObjectData::Mesh(mesh) => Ok(mesh.clone()),
            ObjectData::Armature(_) => Err(ExportError::missing(self.name(id), "mesh data")),
        }
    }

    fn bones(&self, id: ObjectId) -> ExportResult<Vec<BoneData>> {
        match self.object_data(id)? {
            ObjectData::Armature(bones) => Ok(bones.clone()),
            ObjectData::Mesh(_) => Err(ExportError::missing(self.name(id), "armature data")),
        }
    }
}

/// Pre-order walk of the default scene (or the first scene)
fn walk_nodes(document: &gltf::Document) -> (Vec<gltf::Node<'_>>, HashMap<usize, NodeInfo>) {
    let mut order = Vec::new();
    let mut nodes = HashMap::new();

    let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) else {
        return (order, nodes);
    };

    let mut stack: Vec<(gltf::Node<'_>, Mat4, Option<usize>)> = scene
        .nodes()
        .map(|n| (n, Mat4::IDENTITY, None))
        .collect();
    stack.reverse();

    while let Some((node, parent_world, parent)) = stack.pop() {
        if nodes.contains_key(&node.index()) {
            continue;
        }
        let world = parent_world * Mat4::from_cols_array_2d(&node.transform().matrix());
        nodes.insert(node.index(), NodeInfo { world, parent });

        let mut children: Vec<_> = node
            .children()
            .map(|c| (c, world, Some(node.index())))
            .collect();
        children.reverse();
        stack.extend(children);
        order.push(node);
    }

    (order, nodes)
}

/// Corner indices of the triangles a primitive draws, or `None` for non-triangle modes
fn assemble_triangles(mode: Mode, indices: &[u32]) -> Option<Vec<[u32; 3]>> {
    let n = indices.len();
    let tris = match mode {
        Mode::Triangles => indices
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect(),
        Mode::TriangleStrip => (0..n.saturating_sub(2))
            .map(|i| {
                if i % 2 == 0 {
                    [indices[i], indices[i + 1], indices[i + 2]]
                } else {
                    [indices[i + 1], indices[i], indices[i + 2]]
                }
            })
            .collect(),
        Mode::TriangleFan => (1..n.saturating_sub(1))
            .map(|i| [indices[0], indices[i], indices[i + 1]])
            .collect(),
        _ => return None,
    };
    Some(tris)
}

fn read_mesh(
    name: &str,
    mesh: &gltf::Mesh<'_>,
    buffers: &[gltf::buffer::Data],
) -> ExportResult<EvaluatedMesh> {
    let mut out = EvaluatedMesh::default();
    let mut tangents_complete = true;

    for primitive in mesh.primitives() {
        let Some(corners) = primitive_corners(name, &primitive, buffers)? else {
            continue;
        };
        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

        let positions: Vec<Vec3> = reader
            .read_positions()
            .ok_or_else(|| ExportError::missing(name, "vertex positions"))?
            .map(|p| position_to_authoring(Vec3::from(p)))
            .collect();
        let normals: Option<Vec<Vec3>> = reader
            .read_normals()
            .map(|iter| iter.map(|n| direction_to_authoring(Vec3::from(n))).collect());
        // Authoring UV origin is bottom-left
        let uvs: Option<Vec<Vec2>> = reader
            .read_tex_coords(0)
            .map(|iter| iter.into_f32().map(|[u, v]| Vec2::new(u, 1.0 - v)).collect());
        let tangents: Option<Vec<Vec3>> = reader.read_tangents().map(|iter| {
            iter.map(|t| direction_to_authoring(Vec3::new(t[0], t[1], t[2])))
                .collect()
        });

        if normals.is_none() {
            tracing::debug!("'{}': no normals, using face normals", name);
        }
        if uvs.is_some() && tangents.is_none() {
            tangents_complete = false;
        }

        let base = out.positions.len() as u32;
        for [a, b, c] in corners {
            if let Some(&bad) = [a, b, c].iter().find(|&&i| i as usize >= positions.len()) {
                return Err(ExportError::missing(
                    name,
                    format!("vertex {} (primitive has {})", bad, positions.len()),
                ));
            }
            let (pa, pb, pc) = (
                positions[a as usize],
                positions[b as usize],
                positions[c as usize],
            );
            let face_normal = (pb - pa).cross(pc - pa).normalize_or_zero();

            let corner = |i: u32| {
                let i_usize = i as usize;
                MeshLoop {
                    vertex: base + i,
                    normal: normals
                        .as_ref()
                        .and_then(|n| n.get(i_usize).copied())
                        .unwrap_or(face_normal),
                    uv: uvs
                        .as_ref()
                        .and_then(|uv| uv.get(i_usize).copied())
                        .unwrap_or(Vec2::ZERO),
                    tangent: tangents
                        .as_ref()
                        .and_then(|t| t.get(i_usize).copied())
                        .unwrap_or(Vec3::ZERO),
                }
            };
            out.triangles.push([corner(a), corner(b), corner(c)]);
        }

        out.has_uvs |= uvs.is_some();
        out.positions.extend(positions);
    }

    if out.has_uvs && !tangents_complete {
        generate_tangents(&mut out);
    }
    Ok(out)
}

/// Triangle corners of one primitive; `None` (with a warning) for point/line primitives
fn primitive_corners(
    name: &str,
    primitive: &gltf::Primitive<'_>,
    buffers: &[gltf::buffer::Data],
) -> ExportResult<Option<Vec<[u32; 3]>>> {
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
    let indices: Vec<u32> = match reader.read_indices() {
        Some(iter) => iter.into_u32().collect(),
        None => {
            let count = reader
                .read_positions()
                .ok_or_else(|| ExportError::missing(name, "vertex positions"))?
                .count();
            (0..count as u32).collect()
        }
    };

    let corners = assemble_triangles(primitive.mode(), &indices);
    if corners.is_none() {
        tracing::warn!(
            "'{}': skipping primitive {} with mode {:?}",
            name,
            primitive.index(),
            primitive.mode()
        );
    }
    Ok(corners)
}

fn read_skin(
    armature: &str,
    skin: &gltf::Skin<'_>,
    order: &[gltf::Node<'_>],
    nodes: &HashMap<usize, NodeInfo>,
    buffers: &[gltf::buffer::Data],
) -> ExportResult<(Mat4, Vec<BoneData>)> {
    let joints: Vec<gltf::Node<'_>> = skin.joints().collect();
    let slots: HashMap<usize, usize> = joints
        .iter()
        .enumerate()
        .map(|(slot, j)| (j.index(), slot))
        .collect();

    let mut infos = Vec::with_capacity(joints.len());
    for joint in &joints {
        let info = nodes.get(&joint.index()).copied().ok_or_else(|| {
            ExportError::missing(
                armature,
                format!("joint node {} in the scene hierarchy", joint.index()),
            )
        })?;
        infos.push(info);
    }

    // Nearest ancestor that is itself a joint of this skin
    let parents: Vec<Option<usize>> = infos
        .iter()
        .map(|info| {
            let mut current = info.parent;
            while let Some(p) = current {
                if let Some(&slot) = slots.get(&p) {
                    return Some(slot);
                }
                current = nodes.get(&p).and_then(|n| n.parent);
            }
            None
        })
        .collect();

    // The armature sits where the first root joint's parent node sits
    let armature_world = parents
        .iter()
        .position(Option::is_none)
        .and_then(|root| infos[root].parent)
        .and_then(|p| nodes.get(&p))
        .map(|n| n.world)
        .unwrap_or(Mat4::IDENTITY);
    let armature_inv = try_inverse(&armature_world).ok_or_else(|| {
        ExportError::SingularTransform {
            object: armature.to_string(),
        }
    })?;

    let globals: Vec<Mat4> = infos.iter().map(|info| armature_inv * info.world).collect();
    let deforming = deforming_joints(skin, order, joints.len(), buffers);

    let mut bones = Vec::with_capacity(joints.len());
    for (slot, joint) in joints.iter().enumerate() {
        let bone_name = joint
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Bone{}", joint.index()));
        let local = match parents[slot] {
            Some(p) => {
                let parent_inv =
                    try_inverse(&globals[p]).ok_or_else(|| ExportError::NonInvertibleRest {
                        armature: armature.to_string(),
                        bone: joints[p].name().unwrap_or_default().to_string(),
                    })?;
                parent_inv * globals[slot]
            }
            None => globals[slot],
        };
        bones.push(BoneData {
            name: bone_name,
            parent: parents[slot],
            local_rest: transform_to_authoring(&local),
            deform: deforming[slot],
        });
    }

    Ok((transform_to_authoring(&armature_world), bones))
}

/// A joint deforms when some skinned vertex gives it a non-zero weight
fn deforming_joints(
    skin: &gltf::Skin<'_>,
    order: &[gltf::Node<'_>],
    joint_count: usize,
    buffers: &[gltf::buffer::Data],
) -> Vec<bool> {
    let mut used = vec![false; joint_count];
    let skinned = order.iter().filter(|n| {
        n.skin().is_some_and(|s| s.index() == skin.index()) && n.mesh().is_some()
    });

    for node in skinned {
        let Some(mesh) = node.mesh() else {
            continue;
        };
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
            let (Some(joints), Some(weights)) = (reader.read_joints(0), reader.read_weights(0))
            else {
                continue;
            };
            for (j, w) in joints.into_u16().zip(weights.into_f32()) {
                for (&joint, &weight) in j.iter().zip(w.iter()) {
                    if weight > 0.0 {
                        if let Some(flag) = used.get_mut(joint as usize) {
                            *flag = true;
                        }
                    }
                }
            }
        }
    }
    used
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_triangle_modes() {
        let idx = [0, 1, 2, 3, 4];
        assert_eq!(
            assemble_triangles(Mode::Triangles, &idx[..3]),
            Some(vec![[0, 1, 2]])
        );
        assert_eq!(
            assemble_triangles(Mode::TriangleStrip, &idx),
            Some(vec![[0, 1, 2], [2, 1, 3], [2, 3, 4]])
        );
        assert_eq!(
            assemble_triangles(Mode::TriangleFan, &idx),
            Some(vec![[0, 1, 2], [0, 2, 3], [0, 3, 4]])
        );
        assert_eq!(assemble_triangles(Mode::Lines, &idx), None);
        assert_eq!(assemble_triangles(Mode::TriangleStrip, &idx[..2]), Some(vec![]));
    }
}
