//! Armature bone tables
//!
//! Bones live in an arena indexed like the host's bone list, each node with
//! its parent index and child list. Output order is a pre-order walk of the
//! filtered hierarchy, so a bone's parent always has a smaller table index.

use glam::Mat4;
use hell_common::BoneRecord;

use crate::error::{ExportError, ExportResult};
use crate::scene::BoneData;
use crate::transform::{try_inverse, TransformResolver};

#[derive(Debug, Clone, Default)]
struct BoneNode {
    parent: Option<usize>,
    children: Vec<usize>,
    included: bool,
}

/// Bone arena for one armature
#[derive(Debug, Clone)]
pub struct BoneHierarchy<'a> {
    armature: &'a str,
    bones: &'a [BoneData],
    nodes: Vec<BoneNode>,
    /// Pre-order over the unfiltered hierarchy
    walk: Vec<usize>,
}

impl<'a> BoneHierarchy<'a> {
    /// Link bones to their parents; unknown parents and cycles are missing data
    pub fn new(armature: &'a str, bones: &'a [BoneData]) -> ExportResult<Self> {
        let mut nodes = vec![BoneNode::default(); bones.len()];
        for (i, bone) in bones.iter().enumerate() {
            if let Some(p) = bone.parent {
                if p >= bones.len() || p == i {
                    return Err(ExportError::missing(
                        armature,
                        format!("valid parent for bone '{}'", bone.name),
                    ));
                }
                nodes[i].parent = Some(p);
                nodes[p].children.push(i);
            }
        }

        let roots: Vec<usize> = (0..bones.len()).filter(|&i| nodes[i].parent.is_none()).collect();
        let walk = pre_order(&nodes, &roots, |_| true);
        if walk.len() != bones.len() {
            return Err(ExportError::missing(
                armature,
                "an acyclic bone hierarchy".to_string(),
            ));
        }

        Ok(Self {
            armature,
            bones,
            nodes,
            walk,
        })
    }

    /// Rest matrices accumulated down each bone chain, in armature space
    pub fn armature_space_rest(&self) -> Vec<Mat4> {
        let mut global = vec![Mat4::IDENTITY; self.bones.len()];
        for &i in &self.walk {
            let local = self.bones[i].local_rest;
            global[i] = match self.nodes[i].parent {
                Some(p) => global[p] * local,
                None => local,
            };
        }
        global
    }

    /// Mark bones that survive the deform filter
    pub fn filter(&mut self, include_non_deforming: bool) {
        for (node, bone) in self.nodes.iter_mut().zip(self.bones) {
            node.included = include_non_deforming || bone.deform;
        }
    }

    /// Included parent of `i`, if its direct parent survived the filter
    fn included_parent(&self, i: usize) -> Option<usize> {
        self.nodes[i].parent.filter(|&p| self.nodes[p].included)
    }

    /// Table order of the included bones
    pub fn table_order(&self) -> Vec<usize> {
        let roots: Vec<usize> = (0..self.bones.len())
            .filter(|&i| self.nodes[i].included && self.included_parent(i).is_none())
            .collect();
        pre_order(&self.nodes, &roots, |c| self.nodes[c].included)
    }

    /// Bone records for the filtered table.
    ///
    /// `global` holds each bone's engine-space global rest matrix (scaled translation).
    pub fn records(&self, global: &[Mat4]) -> ExportResult<Vec<BoneRecord>> {
        let order = self.table_order();
        let mut slot = vec![None; self.bones.len()];
        for (table_index, &i) in order.iter().enumerate() {
            slot[i] = Some(table_index);
        }

        let mut records = Vec::with_capacity(order.len());
        for &i in &order {
            let bone = &self.bones[i];
            let inverse_bind = self.invert(&global[i], i)?;
            let (local_rest, parent_index) = match self.included_parent(i) {
                Some(p) => {
                    let parent_inv = self.invert(&global[p], p)?;
                    let index = slot[p].map_or(-1, |s| s as i32);
                    (parent_inv * global[i], index)
                }
                None => (global[i], -1),
            };

            tracing::debug!(
                "Bone '{}' -> slot {} (parent {}, deform {})",
                bone.name,
                records.len(),
                parent_index,
                bone.deform
            );
            records.push(BoneRecord {
                name: bone.name.clone(),
                local_rest,
                inverse_bind,
                parent_index,
                deform: bone.deform,
            });
        }
        Ok(records)
    }

    fn invert(&self, m: &Mat4, bone: usize) -> ExportResult<Mat4> {
        try_inverse(m).ok_or_else(|| ExportError::NonInvertibleRest {
            armature: self.armature.to_string(),
            bone: self.bones[bone].name.clone(),
        })
    }
}

/// Parent-first depth-first walk from `roots`, following children that pass `keep`
fn pre_order(nodes: &[BoneNode], roots: &[usize], keep: impl Fn(usize) -> bool) -> Vec<usize> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(i) = stack.pop() {
        out.push(i);
        stack.extend(nodes[i].children.iter().rev().copied().filter(|&c| keep(c)));
    }
    out
}

/// Build the bone table of one armature
pub struct SkeletonBuilder<'r> {
    resolver: &'r TransformResolver,
    include_non_deforming: bool,
}

impl<'r> SkeletonBuilder<'r> {
    pub fn new(resolver: &'r TransformResolver, include_non_deforming: bool) -> Self {
        Self {
            resolver,
            include_non_deforming,
        }
    }

    pub fn build(
        &self,
        armature: &str,
        armature_world: &Mat4,
        bones: &[BoneData],
    ) -> ExportResult<Vec<BoneRecord>> {
        let mut hierarchy = BoneHierarchy::new(armature, bones)?;
        let global: Vec<Mat4> = hierarchy
            .armature_space_rest()
            .iter()
            .map(|g| self.resolver.bone_global_rest(armature_world, g))
            .collect();

        hierarchy.filter(self.include_non_deforming);
        hierarchy.records(&global)
    }
}
