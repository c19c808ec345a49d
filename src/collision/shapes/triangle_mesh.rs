use glam::Vec3A;

use super::TriangleShape;
use super::mesh_bvh::{BvhNode, BvhNodeKind, MeshBvh};
use crate::error::QueryError;
use crate::linear_math::aabb::Aabb;

/// An indexed triangle mesh with a prebuilt static BVH over its triangles.
///
/// Vertices and indices are validated once at construction; the shape is
/// immutable afterwards.
#[derive(Clone, Debug)]
pub struct TriangleMeshShape {
    vertices: Box<[Vec3A]>,
    triangles: Box<[[u32; 3]]>,
    bvh: MeshBvh,
    bounding_radius: f32,
}

impl TriangleMeshShape {
    pub fn new(vertices: Vec<Vec3A>, triangles: Vec<[u32; 3]>) -> Result<Self, QueryError> {
        if triangles.is_empty() {
            return Err(QueryError::InvalidGeometry("mesh has no triangles"));
        }

        if vertices.iter().any(|v| !v.is_finite()) {
            return Err(QueryError::InvalidGeometry(
                "mesh vertices must be finite",
            ));
        }

        let num_vertices = vertices.len() as u32;
        if triangles
            .iter()
            .any(|tri| tri.iter().any(|&i| i >= num_vertices))
        {
            return Err(QueryError::InvalidGeometry(
                "mesh triangle index out of range",
            ));
        }

        let leaves = triangles
            .iter()
            .enumerate()
            .map(|(triangle_index, tri)| BvhNode {
                aabb: Aabb::from_points(&[
                    vertices[tri[0] as usize],
                    vertices[tri[1] as usize],
                    vertices[tri[2] as usize],
                ]),
                kind: BvhNodeKind::Leaf { triangle_index },
            })
            .collect();

        let bounding_radius = vertices
            .iter()
            .map(|v| v.length())
            .fold(0.0f32, f32::max);

        Ok(Self {
            vertices: vertices.into_boxed_slice(),
            triangles: triangles.into_boxed_slice(),
            bvh: MeshBvh::build(leaves),
            bounding_radius,
        })
    }

    #[inline]
    #[must_use]
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    #[must_use]
    pub fn triangle(&self, index: usize) -> TriangleShape {
        let [i0, i1, i2] = self.triangles[index];
        TriangleShape {
            vertices: [
                self.vertices[i0 as usize],
                self.vertices[i1 as usize],
                self.vertices[i2 as usize],
            ],
        }
    }

    #[inline]
    #[must_use]
    pub const fn bvh(&self) -> &MeshBvh {
        &self.bvh
    }

    #[inline]
    #[must_use]
    pub const fn bounding_radius(&self) -> f32 {
        self.bounding_radius
    }

    #[inline]
    #[must_use]
    pub const fn local_aabb(&self) -> &Aabb {
        self.bvh.aabb()
    }
}
