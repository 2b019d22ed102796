//! MikkTSpace tangents for evaluated meshes

use glam::Vec3;

use super::EvaluatedMesh;

impl mikktspace::Geometry for EvaluatedMesh {
    fn num_faces(&self) -> usize {
        self.triangles.len()
    }

    fn num_vertices_of_face(&self, _face: usize) -> usize {
        3
    }

    fn position(&self, face: usize, vert: usize) -> [f32; 3] {
        let l = &self.triangles[face][vert];
        self.positions[l.vertex as usize].to_array()
    }

    fn normal(&self, face: usize, vert: usize) -> [f32; 3] {
        self.triangles[face][vert].normal.to_array()
    }

    fn tex_coord(&self, face: usize, vert: usize) -> [f32; 2] {
        self.triangles[face][vert].uv.to_array()
    }

    fn set_tangent_encoded(&mut self, tangent: [f32; 4], face: usize, vert: usize) {
        // Handedness (w) is not part of the vertex layout
        self.triangles[face][vert].tangent = Vec3::new(tangent[0], tangent[1], tangent[2]);
    }
}

/// Fill per-loop tangents. Meshes without UVs get zero tangents.
///
/// Returns false if MikkTSpace gave up; loop tangents are then zeroed.
pub fn generate_tangents(mesh: &mut EvaluatedMesh) -> bool {
    let ok = mesh.has_uvs && !mesh.is_empty() && mikktspace::generate_tangents(mesh);
    if !ok {
        for l in mesh.triangles.iter_mut().flatten() {
            l.tangent = Vec3::ZERO;
        }
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MeshLoop;
    use glam::Vec2;

    fn quad(has_uvs: bool) -> EvaluatedMesh {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let uvs = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        let l = |i: usize| MeshLoop::new(i as u32, Vec3::Z).with_uv(uvs[i]);
        EvaluatedMesh {
            positions,
            triangles: vec![[l(0), l(1), l(2)], [l(0), l(2), l(3)]],
            has_uvs,
        }
    }

    #[test]
    fn test_tangent_follows_u_axis() {
        let mut mesh = quad(true);
        assert!(generate_tangents(&mut mesh));
        for l in mesh.triangles.iter().flatten() {
            assert!(l.tangent.abs_diff_eq(Vec3::X, 1e-4), "{:?}", l.tangent);
        }
    }

    #[test]
    fn test_no_uvs_means_zero_tangents() {
        let mut mesh = quad(false);
        assert!(!generate_tangents(&mut mesh));
        assert!(mesh.triangles.iter().flatten().all(|l| l.tangent == Vec3::ZERO));
    }
}
