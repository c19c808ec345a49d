use arrayvec::ArrayVec;
use glam::Vec3A;

use super::{ConvexPart, CsoPoint};
use crate::error::QueryError;

pub(crate) const GJK_REL_ERR: f32 = 1e-5;
pub(crate) const GJK_ABS_ERR: f32 = 1e-9;
pub(crate) const GJK_MAX_ITERATIONS: usize = 128;

// |v|^2 below this counts as touching the origin
const TOUCH_EPSILON_SQ: f32 = 1e-10;

pub(crate) struct GjkOutput {
    pub simplex: ArrayVec<CsoPoint, 4>,
    pub status: GjkStatus,
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum GjkStatus {
    Separated {
        distance: f32,
        point_a: Vec3A,
        point_b: Vec3A,
    },
    Intersecting,
}

struct Projection {
    point: Vec3A,
    witness_a: Vec3A,
    witness_b: Vec3A,
    kept: ArrayVec<CsoPoint, 4>,
    contained: bool,
}

impl Projection {
    fn vertex(p: CsoPoint) -> Self {
        let mut kept = ArrayVec::new();
        kept.push(p);
        Self {
            point: p.w,
            witness_a: p.on_a,
            witness_b: p.on_b,
            kept,
            contained: false,
        }
    }
}

fn project_segment(p0: CsoPoint, p1: CsoPoint) -> Projection {
    let ab = p1.w - p0.w;
    let denom = ab.length_squared();
    let t = if denom > f32::EPSILON {
        ((-p0.w).dot(ab) / denom).clamp(0.0, 1.0)
    } else {
        0.0
    };

    if t <= 0.0 {
        return Projection::vertex(p0);
    }
    if t >= 1.0 {
        return Projection::vertex(p1);
    }

    let mut kept = ArrayVec::new();
    kept.push(p0);
    kept.push(p1);
    Projection {
        point: p0.w + ab * t,
        witness_a: p0.on_a.lerp(p1.on_a, t),
        witness_b: p0.on_b.lerp(p1.on_b, t),
        kept,
        contained: false,
    }
}

/// Closest point to the origin on a triangle, by Voronoi-region
/// classification.
fn project_triangle(p0: CsoPoint, p1: CsoPoint, p2: CsoPoint) -> Projection {
    let a = p0.w;
    let b = p1.w;
    let c = p2.w;

    let ab = b - a;
    let ac = c - a;
    let ap = -a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return Projection::vertex(p0);
    }

    let bp = -b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return Projection::vertex(p1);
    }

    let cp = -c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return Projection::vertex(p2);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let t = d1 / (d1 - d3);
        return edge_projection(p0, p1, t);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let t = d2 / (d2 - d6);
        return edge_projection(p0, p2, t);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let t = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return edge_projection(p1, p2, t);
    }

    let sum = va + vb + vc;
    if sum.abs() <= f32::EPSILON {
        // flat triangle: fall back to the nearest edge
        let mut best = project_segment(p0, p1);
        for candidate in [project_segment(p0, p2), project_segment(p1, p2)] {
            if candidate.point.length_squared() < best.point.length_squared() {
                best = candidate;
            }
        }
        return best;
    }

    let denom = 1.0 / sum;
    let v = vb * denom;
    let w = vc * denom;
    let u = 1.0 - v - w;

    let mut kept = ArrayVec::new();
    kept.push(p0);
    kept.push(p1);
    kept.push(p2);
    Projection {
        point: a + ab * v + ac * w,
        witness_a: p0.on_a * u + p1.on_a * v + p2.on_a * w,
        witness_b: p0.on_b * u + p1.on_b * v + p2.on_b * w,
        kept,
        contained: false,
    }
}

fn edge_projection(p0: CsoPoint, p1: CsoPoint, t: f32) -> Projection {
    let mut kept = ArrayVec::new();
    kept.push(p0);
    kept.push(p1);
    Projection {
        point: p0.w.lerp(p1.w, t),
        witness_a: p0.on_a.lerp(p1.on_a, t),
        witness_b: p0.on_b.lerp(p1.on_b, t),
        kept,
        contained: false,
    }
}

fn project_tetrahedron(simplex: &ArrayVec<CsoPoint, 4>) -> Projection {
    // faces paired with their opposite vertex
    const FACES: [[usize; 4]; 4] = [
        [0, 1, 2, 3],
        [0, 1, 3, 2],
        [0, 2, 3, 1],
        [1, 2, 3, 0],
    ];

    let mut any_outside = false;
    let mut best: Option<Projection> = None;

    for [i, j, k, l] in FACES {
        let a = simplex[i].w;
        let n = (simplex[j].w - a).cross(simplex[k].w - a);
        let d_opposite = n.dot(simplex[l].w - a);
        let d_origin = -n.dot(a);

        // origin and the opposite vertex on the same side means the origin
        // is interior with respect to this face
        let outside = d_origin * d_opposite < 0.0 || d_opposite.abs() <= f32::EPSILON;
        if !outside {
            continue;
        }
        any_outside = true;

        let candidate = project_triangle(simplex[i], simplex[j], simplex[k]);
        let replace = match &best {
            Some(current) => candidate.point.length_squared() < current.point.length_squared(),
            None => true,
        };
        if replace {
            best = Some(candidate);
        }
    }

    if !any_outside {
        return Projection {
            point: Vec3A::ZERO,
            witness_a: Vec3A::ZERO,
            witness_b: Vec3A::ZERO,
            kept: simplex.clone(),
            contained: true,
        };
    }

    best.unwrap_or_else(|| Projection::vertex(simplex[0]))
}

fn project_origin(simplex: &ArrayVec<CsoPoint, 4>) -> Projection {
    match simplex.len() {
        1 => Projection::vertex(simplex[0]),
        2 => project_segment(simplex[0], simplex[1]),
        3 => project_triangle(simplex[0], simplex[1], simplex[2]),
        4 => project_tetrahedron(simplex),
        _ => unreachable!("simplex holds one to four points"),
    }
}

/// Witness points on A and B for the spot of a CSO triangle closest to the
/// origin. Used by the polytope expansion to read contact points off its
/// closest face.
pub(crate) fn triangle_witness(p0: CsoPoint, p1: CsoPoint, p2: CsoPoint) -> (Vec3A, Vec3A) {
    let proj = project_triangle(p0, p1, p2);
    (proj.witness_a, proj.witness_b)
}

/// Minimum distance between two bounded convex shapes with witness points,
/// via support-mapping descent over the Minkowski difference.
///
/// Convergence is governed by `rel_err`/`abs_err`; exhausting
/// `max_iterations` without converging is reported as degenerate input.
pub(crate) fn closest_points(
    a: &ConvexPart<'_>,
    b: &ConvexPart<'_>,
    rel_err: f32,
    abs_err: f32,
    max_iterations: usize,
) -> Result<GjkOutput, QueryError> {
    let mut init_dir = a.center() - b.center();
    if init_dir.length_squared() <= f32::EPSILON {
        init_dir = Vec3A::X;
    }

    let mut simplex: ArrayVec<CsoPoint, 4> = ArrayVec::new();
    simplex.push(CsoPoint::support(a, b, init_dir));

    for _ in 0..max_iterations {
        let proj = project_origin(&simplex);
        simplex = proj.kept.clone();

        if proj.contained {
            return Ok(GjkOutput {
                simplex,
                status: GjkStatus::Intersecting,
            });
        }

        let v = proj.point;
        let dist_sq = v.length_squared();
        if dist_sq <= TOUCH_EPSILON_SQ {
            return Ok(GjkOutput {
                simplex,
                status: GjkStatus::Intersecting,
            });
        }

        let w = CsoPoint::support(a, b, -v);

        // support made no measurable progress toward the origin: the
        // current witness pair is the answer
        let converged = dist_sq - v.dot(w.w) <= rel_err * dist_sq + abs_err;
        let duplicate = simplex
            .iter()
            .any(|p| p.w.distance_squared(w.w) <= f32::EPSILON);
        if converged || duplicate {
            return Ok(GjkOutput {
                simplex,
                status: GjkStatus::Separated {
                    distance: dist_sq.sqrt(),
                    point_a: proj.witness_a,
                    point_b: proj.witness_b,
                },
            });
        }

        simplex.push(w);
    }

    Err(QueryError::ConvergenceFailure {
        iterations: max_iterations,
    })
}
