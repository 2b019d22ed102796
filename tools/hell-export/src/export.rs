//! Export driver
//!
//! Runs the whole pipeline for one output file:
//!
//! 1. collect the meshes/armatures to write
//! 2. first pass: evaluate every mesh for its bounds and fetch every bone list,
//!    so input errors surface before the output file exists
//! 3. open the file and write the header with the scene bounds
//! 4. second pass: evaluate, weld, resolve transforms and write each mesh
//! 5. build and write each armature's bone table
//!
//! Per-run state lives in [`ExportContext`]; nothing is kept between runs.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use glam::{Mat4, Vec2};

use crate::aabb::Aabb;
use crate::basis::CoordinateConverter;
use crate::collect::{CollectedScene, SceneCollector};
use crate::config::ExportOptions;
use crate::error::{ExportError, ExportResult};
use crate::formats::{write_armature, write_mesh, write_model_header, MeshHeader, ModelHeader};
use crate::scene::{BoneData, EvaluatedMesh, ObjectId, SceneObject, SceneQuery};
use crate::skeleton::{BoneHierarchy, SkeletonBuilder};
use crate::transform::{ParentTransform, TransformResolver};
use crate::weld::{LoopAttributes, VertexWelder, WeldedMesh};

/// What an export run wrote
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub output: PathBuf,
    pub mesh_count: usize,
    pub armature_count: usize,
    pub vertex_count: usize,
    pub index_count: usize,
    pub bone_count: usize,
    pub bounds: Aabb,
    pub elapsed: Duration,
}

/// Armature data gathered in the first pass
struct ArmaturePlan {
    id: ObjectId,
    bones: Vec<BoneData>,
}

/// State threaded through one export run
pub struct ExportContext<'a> {
    scene: &'a dyn SceneQuery,
    options: &'a ExportOptions,
    converter: CoordinateConverter,
    resolver: TransformResolver,
    collected: CollectedScene,
    mesh_bounds: Vec<Aabb>,
    scene_bounds: Aabb,
}

impl<'a> ExportContext<'a> {
    /// Validate options and pick the objects to export
    pub fn new(scene: &'a dyn SceneQuery, options: &'a ExportOptions) -> ExportResult<Self> {
        options.validate()?;
        let collected = SceneCollector::new(options.selection).collect(scene)?;
        let converter = CoordinateConverter::new(options.scale);

        Ok(Self {
            scene,
            options,
            converter,
            resolver: TransformResolver::new(converter),
            collected,
            mesh_bounds: Vec::new(),
            scene_bounds: Aabb::new(),
        })
    }

    fn object(&self, id: ObjectId) -> ExportResult<&'a SceneObject> {
        self.scene
            .object(id)
            .ok_or_else(|| ExportError::Scene(format!("no object with id {}", id.0)))
    }

    /// Engine-space box over every vertex of an evaluated mesh, loose ones included
    fn vertex_bounds(&self, mesh: &EvaluatedMesh) -> Aabb {
        mesh.positions
            .iter()
            .map(|&p| self.converter.position(p))
            .collect()
    }

    /// First pass: bounds of every mesh, bones of every armature
    fn survey(&mut self) -> ExportResult<Vec<ArmaturePlan>> {
        for &id in &self.collected.meshes {
            let object = self.object(id)?;
            let mesh = self.scene.evaluate_mesh(id)?;
            let bounds = self.vertex_bounds(&mesh);
            if mesh.triangles.is_empty() {
                tracing::warn!("Mesh '{}' has no triangles", object.name);
            }
            self.scene_bounds.merge(&bounds);
            self.mesh_bounds.push(bounds);
        }

        let mut armatures = Vec::with_capacity(self.collected.armatures.len());
        for &id in &self.collected.armatures {
            let object = self.object(id)?;
            let bones = self.scene.bones(id)?;
            BoneHierarchy::new(&object.name, &bones)?;
            armatures.push(ArmaturePlan { id, bones });
        }
        Ok(armatures)
    }

    /// Engine-space loop attributes of an evaluated mesh, welded
    fn weld(&self, mesh: &EvaluatedMesh) -> WeldedMesh {
        let mut welder = VertexWelder::new(self.options.rounding, self.options.normal_threshold);
        for tri in &mesh.triangles {
            let corners = tri.map(|l| LoopAttributes {
                position: self.converter.position(mesh.position(&l)),
                normal: self.converter.direction(l.normal),
                // Engine UV origin is top-left
                uv: Vec2::new(l.uv.x, 1.0 - l.uv.y),
                tangent: self.converter.direction(l.tangent),
            });
            welder.push_triangle(&corners);
        }
        welder.finish()
    }

    fn write_meshes<W: Write>(&self, w: &mut W, summary: &mut ExportSummary) -> ExportResult<()> {
        for (slot, &id) in self.collected.meshes.iter().enumerate() {
            let object = self.object(id)?;
            let welded = {
                let mesh = self.scene.evaluate_mesh(id)?;
                self.weld(&mesh)
            };

            let parent = match self.collected.mesh_parent(id) {
                Some(p) => {
                    let parent = self.object(p)?;
                    Some(ParentTransform {
                        name: &parent.name,
                        world: &parent.world,
                    })
                }
                None => None,
            };
            let transform = self.resolver.resolve(&object.name, &object.world, parent)?;

            let (aabb_min, aabb_max) =
                self.mesh_bounds[slot].written_bounds(self.options.zero_empty_bounds);
            let header = MeshHeader {
                name: object.name.clone(),
                vertex_count: welded.vertices.len() as u32,
                index_count: welded.indices.len() as u32,
                parent_index: self.collected.parent_index(id),
                aabb_min,
                aabb_max,
                local_transform: transform.local,
                inverse_local_transform: transform.inverse,
            };
            write_mesh(w, &header, &welded.vertices, &welded.indices)?;

            tracing::info!(
                "Mesh '{}': {} vertices, {} triangles, parent {}",
                object.name,
                welded.vertices.len(),
                welded.triangle_count(),
                header.parent_index
            );
            summary.vertex_count += welded.vertices.len();
            summary.index_count += welded.indices.len();
        }
        Ok(())
    }

    fn write_armatures<W: Write>(
        &self,
        w: &mut W,
        armatures: &[ArmaturePlan],
        summary: &mut ExportSummary,
    ) -> ExportResult<()> {
        let builder = SkeletonBuilder::new(&self.resolver, self.options.include_non_deforming);
        for plan in armatures {
            let object = self.object(plan.id)?;
            let table = builder.build(&object.name, &object.world, &plan.bones)?;
            write_armature(w, &object.name, &table)?;

            tracing::info!(
                "Armature '{}': {} of {} bones",
                object.name,
                table.len(),
                plan.bones.len()
            );
            summary.bone_count += table.len();
        }
        Ok(())
    }

    /// Run the export, consuming the context
    pub fn run(mut self) -> ExportResult<ExportSummary> {
        let start = Instant::now();
        let armatures = self.survey()?;

        let path = &self.options.output;
        let file = File::create(path).map_err(|source| ExportError::Create {
            path: path.clone(),
            source,
        })?;
        let mut w = BufWriter::new(file);

        let (aabb_min, aabb_max) = self
            .scene_bounds
            .written_bounds(self.options.zero_empty_bounds);
        let header = ModelHeader::new(
            self.collected.meshes.len() as u32,
            armatures.len() as u32,
            unix_timestamp(),
            aabb_min,
            aabb_max,
        );
        write_model_header(&mut w, &header)?;

        let mut summary = ExportSummary {
            output: path.clone(),
            mesh_count: self.collected.meshes.len(),
            armature_count: armatures.len(),
            vertex_count: 0,
            index_count: 0,
            bone_count: 0,
            bounds: self.scene_bounds,
            elapsed: Duration::ZERO,
        };
        self.write_meshes(&mut w, &mut summary)?;
        self.write_armatures(&mut w, &armatures, &mut summary)?;
        w.flush()?;

        summary.elapsed = start.elapsed();
        tracing::info!("Export took {:.2}s", summary.elapsed.as_secs_f64());
        Ok(summary)
    }
}

fn unix_timestamp() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Export `scene` to `options.output`
pub fn export_scene(
    scene: &dyn SceneQuery,
    options: &ExportOptions,
) -> ExportResult<ExportSummary> {
    let summary = ExportContext::new(scene, options)?.run()?;
    tracing::info!(
        "Wrote {:?}: {} meshes, {} armatures, {} vertices, {} bones",
        summary.output,
        summary.mesh_count,
        summary.armature_count,
        summary.vertex_count,
        summary.bone_count
    );
    Ok(summary)
}

/// Engine-space world transform of an object (translation scaled)
pub fn engine_world(options: &ExportOptions, world: &Mat4) -> Mat4 {
    let converter = CoordinateConverter::new(options.scale);
    let mut m = converter.transform(world);
    crate::transform::scale_translation(&mut m, options.scale);
    m
}
