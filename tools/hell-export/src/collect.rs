//! Picks the objects an export run writes
//!
//! Meshes come out parent-first: a mesh whose parent is another exported mesh
//! always follows that parent, so parent indices in the file point backwards.
//!
//! A mesh parent that is hidden or unselected still defines the child's local
//! transform; it only loses its place in the file, so the written index is -1.

use hashbrown::{HashMap, HashSet};

use crate::config::SelectionMode;
use crate::error::{ExportError, ExportResult};
use crate::scene::{ObjectId, ObjectKind, SceneQuery};

/// Objects selected for one export, in write order
#[derive(Debug, Clone, Default)]
pub struct CollectedScene {
    pub meshes: Vec<ObjectId>,
    pub armatures: Vec<ObjectId>,
    mesh_slots: HashMap<ObjectId, usize>,
    parents: HashMap<ObjectId, ObjectId>,
}

impl CollectedScene {
    /// Position of a mesh in the output
    pub fn mesh_index(&self, id: ObjectId) -> Option<usize> {
        self.mesh_slots.get(&id).copied()
    }

    /// Scene-graph parent of `id` when that parent is a mesh, exported or not
    pub fn mesh_parent(&self, id: ObjectId) -> Option<ObjectId> {
        self.parents.get(&id).copied()
    }

    /// Parent index as written to the file (-1 when the parent is not exported)
    pub fn parent_index(&self, id: ObjectId) -> i32 {
        self.mesh_parent(id)
            .and_then(|p| self.mesh_index(p))
            .map_or(-1, |i| i as i32)
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty() && self.armatures.is_empty()
    }
}

pub struct SceneCollector {
    mode: SelectionMode,
}

impl SceneCollector {
    pub fn new(mode: SelectionMode) -> Self {
        Self { mode }
    }

    fn wanted(&self, scene: &dyn SceneQuery, id: ObjectId) -> bool {
        scene.is_visible(id)
            && match self.mode {
                SelectionMode::AllVisible => true,
                SelectionMode::SelectedOnly => scene.is_selected(id),
            }
    }

    pub fn collect(&self, scene: &dyn SceneQuery) -> ExportResult<CollectedScene> {
        let mut candidates = Vec::new();
        let mut armatures = Vec::new();
        for (i, object) in scene.objects().iter().enumerate() {
            let id = ObjectId(i);
            if !self.wanted(scene, id) {
                continue;
            }
            match object.kind {
                ObjectKind::Mesh => candidates.push(id),
                ObjectKind::Armature => armatures.push(id),
            }
        }

        if candidates.is_empty() && armatures.is_empty() {
            return Err(ExportError::EmptySelection(self.mode.describe()));
        }

        let parents: HashMap<ObjectId, ObjectId> = candidates
            .iter()
            .filter_map(|&id| {
                let parent = scene.object(id)?.parent?;
                let is_mesh = scene.object(parent)?.kind == ObjectKind::Mesh;
                is_mesh.then_some((id, parent))
            })
            .collect();
        let in_set: HashSet<ObjectId> = candidates.iter().copied().collect();

        let mut meshes = Vec::with_capacity(candidates.len());
        let mut mesh_slots = HashMap::with_capacity(candidates.len());
        for &id in &candidates {
            // Unplaced ancestors first, nearest last
            let mut chain = vec![id];
            let mut current = id;
            while let Some(&p) = parents.get(&current) {
                if !in_set.contains(&p) || mesh_slots.contains_key(&p) || chain.contains(&p) {
                    break;
                }
                chain.push(p);
                current = p;
            }
            for &m in chain.iter().rev() {
                if !mesh_slots.contains_key(&m) {
                    mesh_slots.insert(m, meshes.len());
                    meshes.push(m);
                }
            }
        }

        tracing::debug!(
            "Collected {} meshes and {} armatures from the {}",
            meshes.len(),
            armatures.len(),
            self.mode.describe()
        );

        Ok(CollectedScene {
            meshes,
            armatures,
            mesh_slots,
            parents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MeshBuilder, SceneGraph};
    use glam::Mat4;

    fn mesh() -> MeshBuilder {
        MeshBuilder::new([])
    }

    #[test]
    fn test_parents_precede_children() {
        let mut scene = SceneGraph::new();
        let child = scene.add_mesh("Child", Mat4::IDENTITY, mesh());
        let grandchild = scene.add_mesh("Grandchild", Mat4::IDENTITY, mesh());
        let root = scene.add_mesh("Root", Mat4::IDENTITY, mesh());
        scene.set_parent(child, root);
        scene.set_parent(grandchild, child);

        let collected = SceneCollector::new(SelectionMode::AllVisible)
            .collect(&scene)
            .unwrap();
        assert_eq!(collected.meshes, vec![root, child, grandchild]);
        assert_eq!(collected.parent_index(root), -1);
        assert_eq!(collected.parent_index(child), 0);
        assert_eq!(collected.parent_index(grandchild), 1);
    }

    #[test]
    fn test_hidden_parent_keeps_transform_but_not_index() {
        let mut scene = SceneGraph::new();
        let parent = scene.add_mesh("Parent", Mat4::IDENTITY, mesh());
        let child = scene.add_mesh("Child", Mat4::IDENTITY, mesh());
        scene.set_parent(child, parent);
        scene.set_visible(parent, false);

        let collected = SceneCollector::new(SelectionMode::AllVisible)
            .collect(&scene)
            .unwrap();
        assert_eq!(collected.meshes, vec![child]);
        assert_eq!(collected.mesh_parent(child), Some(parent));
        assert_eq!(collected.mesh_index(parent), None);
        assert_eq!(collected.parent_index(child), -1);
    }

    #[test]
    fn test_armature_parent_is_not_a_mesh_parent() {
        let mut scene = SceneGraph::new();
        let rig = scene.add_armature("Rig", Mat4::IDENTITY, Vec::new());
        let body = scene.add_mesh("Body", Mat4::IDENTITY, mesh());
        scene.set_parent(body, rig);

        let collected = SceneCollector::new(SelectionMode::AllVisible)
            .collect(&scene)
            .unwrap();
        assert_eq!(collected.armatures, vec![rig]);
        assert_eq!(collected.mesh_parent(body), None);
        assert_eq!(collected.parent_index(body), -1);
    }

    #[test]
    fn test_selected_only() {
        let mut scene = SceneGraph::new();
        let a = scene.add_mesh("A", Mat4::IDENTITY, mesh());
        let b = scene.add_mesh("B", Mat4::IDENTITY, mesh());
        scene.set_selected(b, true);

        let collected = SceneCollector::new(SelectionMode::SelectedOnly)
            .collect(&scene)
            .unwrap();
        assert_eq!(collected.meshes, vec![b]);
        assert_eq!(collected.mesh_index(a), None);

        // Hidden and selected still does not count
        scene.set_visible(b, false);
        let err = SceneCollector::new(SelectionMode::SelectedOnly)
            .collect(&scene)
            .unwrap_err();
        assert!(matches!(err, ExportError::EmptySelection("selection")));
    }

    #[test]
    fn test_empty_scene_is_an_input_error() {
        let scene = SceneGraph::new();
        let err = SceneCollector::new(SelectionMode::AllVisible)
            .collect(&scene)
            .unwrap_err();
        assert!(err.is_input_error());
    }
}
