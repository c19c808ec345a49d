use arrayvec::ArrayVec;
use glam::Vec3A;

use super::gjk;
use super::{ConvexPart, CsoPoint};
use crate::error::QueryError;
use crate::linear_math::plane_space;

const EPA_TOLERANCE: f32 = 1e-4;
const DEGENERATE_EPSILON: f32 = 1e-10;

pub(crate) struct EpaOutput {
    pub depth: f32,
    /// Minimum-translation direction, pointing from A toward B.
    pub normal: Vec3A,
    pub point_a: Vec3A,
    pub point_b: Vec3A,
}

#[derive(Clone, Copy)]
struct Face {
    verts: [usize; 3],
    normal: Vec3A,
    dist: f32,
}

struct Polytope {
    verts: Vec<CsoPoint>,
    faces: Vec<Face>,
    interior: Vec3A,
}

impl Polytope {
    fn make_face(&self, i: usize, j: usize, k: usize) -> Option<Face> {
        let a = self.verts[i].w;
        let n = (self.verts[j].w - a).cross(self.verts[k].w - a);
        if n.length_squared() <= DEGENERATE_EPSILON {
            return None;
        }

        let mut normal = n.normalize();
        if normal.dot(a - self.interior) < 0.0 {
            normal = -normal;
        }

        Some(Face {
            verts: [i, j, k],
            normal,
            dist: normal.dot(a),
        })
    }

    fn push_face(&mut self, i: usize, j: usize, k: usize) -> bool {
        match self.make_face(i, j, k) {
            Some(face) => {
                self.faces.push(face);
                true
            }
            None => false,
        }
    }
}

/// Grow a sub-dimensional GJK termination simplex into a tetrahedron
/// enclosing the origin, sampling supports orthogonal to the current
/// feature.
fn complete_simplex(
    a: &ConvexPart<'_>,
    b: &ConvexPart<'_>,
    simplex: &mut ArrayVec<CsoPoint, 4>,
) {
    while simplex.len() < 4 {
        let candidates: ArrayVec<Vec3A, 6> = match simplex.len() {
            1 => [Vec3A::X, Vec3A::NEG_X, Vec3A::Y, Vec3A::NEG_Y, Vec3A::Z, Vec3A::NEG_Z]
                .into_iter()
                .collect(),
            2 => {
                let axis = (simplex[1].w - simplex[0].w).normalize_or(Vec3A::Z);
                let (t1, t2) = plane_space(axis);
                [t1, t2, -t1, -t2].into_iter().collect()
            }
            3 => {
                let n = (simplex[1].w - simplex[0].w)
                    .cross(simplex[2].w - simplex[0].w)
                    .normalize_or(Vec3A::Z);
                [n, -n].into_iter().collect()
            }
            _ => unreachable!(),
        };

        let mut grew = false;
        for dir in candidates {
            let w = CsoPoint::support(a, b, dir);
            if simplex
                .iter()
                .all(|p| p.w.distance_squared(w.w) > DEGENERATE_EPSILON)
            {
                simplex.push(w);
                grew = true;
                break;
            }
        }

        if !grew {
            // flat configuration-space obstacle, nothing left to sample
            return;
        }
    }
}

/// Penetration depth, direction and witness points for a pair already known
/// to intersect, by expanding a polytope around the origin of the
/// configuration-space obstacle.
pub(crate) fn penetration(
    a: &ConvexPart<'_>,
    b: &ConvexPart<'_>,
    mut simplex: ArrayVec<CsoPoint, 4>,
    max_iterations: usize,
) -> Result<EpaOutput, QueryError> {
    complete_simplex(a, b, &mut simplex);

    if simplex.len() < 4 {
        // touching contact on a flat feature: zero depth, any normal
        // orthogonal to the feature works
        let normal = match simplex.len() {
            2 => plane_space((simplex[1].w - simplex[0].w).normalize_or(Vec3A::Z)).0,
            3 => (simplex[1].w - simplex[0].w)
                .cross(simplex[2].w - simplex[0].w)
                .normalize_or(Vec3A::Z),
            _ => Vec3A::Z,
        };
        let p = simplex[0];
        return Ok(EpaOutput {
            depth: 0.0,
            normal,
            point_a: p.on_a,
            point_b: p.on_b,
        });
    }

    let interior =
        (simplex[0].w + simplex[1].w + simplex[2].w + simplex[3].w) * 0.25;
    let mut polytope = Polytope {
        verts: simplex.to_vec(),
        faces: Vec::with_capacity(32),
        interior,
    };

    for [i, j, k] in [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]] {
        polytope.push_face(i, j, k);
    }

    if polytope.faces.is_empty() {
        return Err(QueryError::ConvergenceFailure { iterations: 0 });
    }

    for _ in 0..max_iterations {
        let best = polytope
            .faces
            .iter()
            .min_by(|f1, f2| f1.dist.total_cmp(&f2.dist))
            .copied()
            .expect("polytope keeps at least one face");

        let w = CsoPoint::support(a, b, best.normal);
        let growth = best.normal.dot(w.w) - best.dist;
        if growth <= EPA_TOLERANCE {
            return Ok(face_witness(&polytope, &best));
        }

        // remove every face visible from the new support and re-triangulate
        // the horizon against it
        let w_idx = polytope.verts.len();
        polytope.verts.push(w);

        let mut horizon: Vec<(usize, usize)> = Vec::new();
        let mut removed = false;
        let mut idx = 0;
        while idx < polytope.faces.len() {
            let face = polytope.faces[idx];
            if face.normal.dot(w.w) > face.dist + f32::EPSILON {
                for (e0, e1) in [
                    (face.verts[0], face.verts[1]),
                    (face.verts[1], face.verts[2]),
                    (face.verts[2], face.verts[0]),
                ] {
                    // an undirected edge shared by two removed faces is
                    // interior; one seen once is on the horizon
                    if let Some(pos) = horizon
                        .iter()
                        .position(|&(h0, h1)| (h0, h1) == (e1, e0) || (h0, h1) == (e0, e1))
                    {
                        horizon.swap_remove(pos);
                    } else {
                        horizon.push((e0, e1));
                    }
                }
                polytope.faces.swap_remove(idx);
                removed = true;
            } else {
                idx += 1;
            }
        }

        if !removed {
            return Ok(face_witness(&polytope, &best));
        }

        let mut sealed = true;
        for (e0, e1) in horizon {
            sealed &= polytope.push_face(e0, e1, w_idx);
        }

        if !sealed || polytope.faces.is_empty() {
            // the expansion collapsed on a degenerate feature; the best
            // face seen so far is the answer within tolerance
            return Ok(face_witness(&polytope, &best));
        }
    }

    Err(QueryError::ConvergenceFailure {
        iterations: max_iterations,
    })
}

fn face_witness(polytope: &Polytope, face: &Face) -> EpaOutput {
    let [i, j, k] = face.verts;
    let (point_a, point_b) = gjk::triangle_witness(
        polytope.verts[i],
        polytope.verts[j],
        polytope.verts[k],
    );

    EpaOutput {
        depth: face.dist.max(0.0),
        normal: face.normal,
        point_a,
        point_b,
    }
}
