//! Vertex welding
//!
//! Collapses triangulated loops into a shared vertex buffer + index buffer.
//!
//! Loops are keyed by position and UV rounded to a fixed number of decimal
//! places. Under one key there can be several buckets: a loop joins the first
//! bucket whose running-average normal is within the cosine threshold of its
//! own normal, otherwise it opens a new bucket (a new vertex). Hard edges and
//! UV seams that happen to round to the same key therefore stay split.
//!
//! Normals and tangents of a bucket are summed while welding and normalized
//! once at the end.

use glam::{Vec2, Vec3};
use hashbrown::HashMap;
use hell_common::Vertex;

use crate::config::{DEFAULT_NORMAL_THRESHOLD, DEFAULT_ROUNDING};

/// Engine-space attributes of one triangle corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopAttributes {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub tangent: Vec3,
}

/// Quantized (position.xyz, uv.uv)
type WeldKey = [i64; 5];

#[derive(Debug, Clone)]
struct Bucket {
    index: u32,
    normal_sum: Vec3,
    tangent_sum: Vec3,
    count: u32,
}

impl Bucket {
    fn average_normal(&self) -> Vec3 {
        (self.normal_sum / self.count as f32).normalize_or_zero()
    }
}

/// Output of a weld: deduplicated vertices and triangle indices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeldedMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl WeldedMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Incremental welder; feed loops in triangle order, then [`finish`](Self::finish)
pub struct VertexWelder {
    factor: f64,
    normal_threshold: f32,
    buckets: HashMap<WeldKey, Vec<Bucket>>,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl VertexWelder {
    pub fn new(rounding: i32, normal_threshold: f32) -> Self {
        Self {
            factor: 10f64.powi(rounding),
            normal_threshold,
            buckets: HashMap::new(),
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    fn quantize(&self, v: f32) -> i64 {
        (v as f64 * self.factor).round() as i64
    }

    fn key(&self, attrs: &LoopAttributes) -> WeldKey {
        [
            self.quantize(attrs.position.x),
            self.quantize(attrs.position.y),
            self.quantize(attrs.position.z),
            self.quantize(attrs.uv.x),
            self.quantize(attrs.uv.y),
        ]
    }

    /// Add one loop and return the vertex index it resolved to
    pub fn push(&mut self, attrs: &LoopAttributes) -> u32 {
        let key = self.key(attrs);
        let threshold = self.normal_threshold;
        let bucket_list = self.buckets.entry(key).or_default();

        let index = match bucket_list
            .iter_mut()
            .find(|b| b.average_normal().dot(attrs.normal) >= threshold)
        {
            Some(bucket) => {
                bucket.normal_sum += attrs.normal;
                bucket.tangent_sum += attrs.tangent;
                bucket.count += 1;
                bucket.index
            }
            None => {
                let index = self.vertices.len() as u32;
                bucket_list.push(Bucket {
                    index,
                    normal_sum: attrs.normal,
                    tangent_sum: attrs.tangent,
                    count: 1,
                });
                self.vertices.push(Vertex {
                    position: attrs.position.to_array(),
                    normal: attrs.normal.to_array(),
                    uv: attrs.uv.to_array(),
                    tangent: attrs.tangent.to_array(),
                });
                index
            }
        };

        self.indices.push(index);
        index
    }

    /// Add a triangle, keeping its loop order
    pub fn push_triangle(&mut self, corners: &[LoopAttributes; 3]) {
        for corner in corners {
            self.push(corner);
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Average the accumulated normals and tangents into the vertex buffer
    pub fn finish(mut self) -> WeldedMesh {
        for bucket in self.buckets.values().flatten() {
            let vertex = &mut self.vertices[bucket.index as usize];
            vertex.normal = bucket.normal_sum.normalize_or_zero().to_array();
            vertex.tangent = if bucket.tangent_sum.length() > 0.0 {
                bucket.tangent_sum.normalize_or_zero().to_array()
            } else {
                [0.0; 3]
            };
        }

        tracing::debug!(
            "Welded {} loops into {} vertices ({} keys)",
            self.indices.len(),
            self.vertices.len(),
            self.buckets.len()
        );

        WeldedMesh {
            vertices: self.vertices,
            indices: self.indices,
        }
    }
}

impl Default for VertexWelder {
    fn default() -> Self {
        Self::new(DEFAULT_ROUNDING, DEFAULT_NORMAL_THRESHOLD)
    }
}

/// Weld a list of triangles in one call
pub fn weld_triangles(
    triangles: &[[LoopAttributes; 3]],
    rounding: i32,
    normal_threshold: f32,
) -> WeldedMesh {
    let mut welder = VertexWelder::new(rounding, normal_threshold);
    for tri in triangles {
        welder.push_triangle(tri);
    }
    welder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corner(position: Vec3, normal: Vec3, uv: Vec2) -> LoopAttributes {
        LoopAttributes {
            position,
            normal,
            uv,
            tangent: Vec3::X,
        }
    }

    fn quad(normal: Vec3) -> Vec<[LoopAttributes; 3]> {
        let a = corner(Vec3::new(0.0, 0.0, 0.0), normal, Vec2::new(0.0, 1.0));
        let b = corner(Vec3::new(1.0, 0.0, 0.0), normal, Vec2::new(1.0, 1.0));
        let c = corner(Vec3::new(1.0, 0.0, -1.0), normal, Vec2::new(1.0, 0.0));
        let d = corner(Vec3::new(0.0, 0.0, -1.0), normal, Vec2::new(0.0, 0.0));
        vec![[a, b, c], [a, c, d]]
    }

    #[test]
    fn test_flat_quad_welds_to_four_vertices() {
        let welded = weld_triangles(&quad(Vec3::Y), 6, 0.95);
        assert_eq!(welded.vertices.len(), 4);
        assert_eq!(welded.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(welded.triangle_count(), 2);
    }

    #[test]
    fn test_perpendicular_normals_stay_split() {
        let p = Vec3::new(0.5, 0.5, 0.5);
        let mut welder = VertexWelder::default();
        let i0 = welder.push(&corner(p, Vec3::X, Vec2::ZERO));
        let i1 = welder.push(&corner(p, Vec3::Y, Vec2::ZERO));
        assert_ne!(i0, i1);
        assert_eq!(welder.vertex_count(), 2);
    }

    #[test]
    fn test_one_degree_apart_normals_merge() {
        let p = Vec3::new(0.5, 0.5, 0.5);
        let angle = 1.0f32.to_radians();
        let tilted = Vec3::new(angle.sin(), angle.cos(), 0.0);

        let mut welder = VertexWelder::default();
        let i0 = welder.push(&corner(p, Vec3::Y, Vec2::ZERO));
        let i1 = welder.push(&corner(p, tilted, Vec2::ZERO));
        assert_eq!(i0, i1);

        let welded = welder.finish();
        let n = Vec3::from_array(welded.vertices[0].normal);
        assert!((n.length() - 1.0).abs() < 1e-5);
        // Averaged normal sits halfway between the two inputs
        assert!((n.angle_between(Vec3::Y) - angle / 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_second_bucket_under_same_key() {
        let p = Vec3::ZERO;
        let mut welder = VertexWelder::default();
        let up = welder.push(&corner(p, Vec3::Y, Vec2::ZERO));
        let side = welder.push(&corner(p, Vec3::X, Vec2::ZERO));
        // A third loop matching the second bucket joins it
        let side_again = welder.push(&corner(p, Vec3::X, Vec2::ZERO));
        assert_eq!(side, side_again);
        assert_ne!(up, side);
        assert_eq!(welder.vertex_count(), 2);
    }

    #[test]
    fn test_uv_seam_splits_vertices() {
        let p = Vec3::ONE;
        let mut welder = VertexWelder::default();
        let a = welder.push(&corner(p, Vec3::Y, Vec2::new(0.0, 0.0)));
        let b = welder.push(&corner(p, Vec3::Y, Vec2::new(0.5, 0.0)));
        assert_ne!(a, b);
    }

    #[test]
    fn test_rounding_merges_nearby_positions() {
        let mut welder = VertexWelder::new(3, 0.95);
        let a = welder.push(&corner(Vec3::new(1.0, 0.0, 0.0), Vec3::Y, Vec2::ZERO));
        let b = welder.push(&corner(Vec3::new(1.0001, 0.0, 0.0), Vec3::Y, Vec2::ZERO));
        assert_eq!(a, b);

        let mut fine = VertexWelder::new(6, 0.95);
        let a = fine.push(&corner(Vec3::new(1.0, 0.0, 0.0), Vec3::Y, Vec2::ZERO));
        let b = fine.push(&corner(Vec3::new(1.0001, 0.0, 0.0), Vec3::Y, Vec2::ZERO));
        assert_ne!(a, b);
    }

    #[test]
    fn test_zero_tangent_sum_stays_zero() {
        let mut welder = VertexWelder::default();
        welder.push(&LoopAttributes {
            position: Vec3::ZERO,
            normal: Vec3::Y,
            uv: Vec2::ZERO,
            tangent: Vec3::ZERO,
        });
        let welded = welder.finish();
        assert_eq!(welded.vertices[0].tangent, [0.0; 3]);
    }

    #[test]
    fn test_weld_is_idempotent() {
        // Cube-like corner: three faces meeting at one position
        let p = Vec3::ZERO;
        let mut triangles = Vec::new();
        for n in [Vec3::X, Vec3::Y, Vec3::Z] {
            let o = corner(p, n, Vec2::ZERO);
            let u = corner(p + n.any_orthonormal_vector(), n, Vec2::X);
            let v = corner(p + n.cross(n.any_orthonormal_vector()), n, Vec2::Y);
            triangles.push([o, u, v]);
            triangles.push([o, v, u]);
        }
        let first = weld_triangles(&triangles, 6, 0.95);

        // Re-weld the output, each vertex as its own loop
        let mut welder = VertexWelder::new(6, 0.95);
        for v in &first.vertices {
            welder.push(&LoopAttributes {
                position: Vec3::from_array(v.position),
                normal: Vec3::from_array(v.normal),
                uv: Vec2::from_array(v.uv),
                tangent: Vec3::from_array(v.tangent),
            });
        }
        assert_eq!(welder.finish().vertices.len(), first.vertices.len());
    }
}
