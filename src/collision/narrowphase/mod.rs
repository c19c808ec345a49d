use glam::{Affine3A, Vec3A};

use super::shapes::{Geometry, support::local_support};
use crate::error::QueryError;

pub mod conservative_advancement;
pub mod epa;
pub mod gjk;
pub mod mesh;
pub mod primitives;

/// A bounded convex operand: geometry plus its world pose, exposing the
/// support mapping in world coordinates.
#[derive(Clone, Copy)]
pub(crate) struct ConvexPart<'a> {
    pub geometry: &'a Geometry,
    pub transform: &'a Affine3A,
}

impl ConvexPart<'_> {
    /// Furthest point along a world-frame direction.
    #[must_use]
    pub fn support(&self, world_dir: Vec3A) -> Vec3A {
        let local_dir = self.transform.matrix3.transpose() * world_dir;
        self.transform
            .transform_point3a(local_support(self.geometry, local_dir))
    }

    #[must_use]
    pub fn center(&self) -> Vec3A {
        self.transform.translation
    }
}

/// A vertex of the configuration-space obstacle (Minkowski difference
/// A - B), remembering the witness points that produced it.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CsoPoint {
    pub w: Vec3A,
    pub on_a: Vec3A,
    pub on_b: Vec3A,
}

impl CsoPoint {
    /// CSO support along `dir`: furthest point of A along `dir` minus
    /// furthest point of B along `-dir`.
    #[must_use]
    pub fn support(a: &ConvexPart<'_>, b: &ConvexPart<'_>, dir: Vec3A) -> Self {
        let on_a = a.support(dir);
        let on_b = b.support(-dir);
        Self {
            w: on_a - on_b,
            on_a,
            on_b,
        }
    }
}

/// Outcome of a signed-separation computation between two shapes.
///
/// `distance` is the surface separation when positive and the negated
/// penetration depth when negative; `normal` points from A toward B.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Separation {
    pub distance: f32,
    pub point_a: Vec3A,
    pub point_b: Vec3A,
    pub normal: Vec3A,
}

impl Separation {
    pub const DISJOINT: Self = Self {
        distance: f32::INFINITY,
        point_a: Vec3A::ZERO,
        point_b: Vec3A::ZERO,
        normal: Vec3A::X,
    };

    #[must_use]
    pub fn min(self, other: Self) -> Self {
        if other.distance < self.distance {
            other
        } else {
            self
        }
    }

    /// The same separation seen from the other operand's side.
    #[must_use]
    pub fn flipped(self) -> Self {
        Self {
            distance: self.distance,
            point_a: self.point_b,
            point_b: self.point_a,
            normal: -self.normal,
        }
    }
}

/// A contact before object identities are attached: position, normal from
/// the first operand toward the second, and penetration depth.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RawContact {
    pub position: Vec3A,
    pub normal: Vec3A,
    pub depth: f32,
}

impl RawContact {
    pub(crate) fn from_separation(sep: &Separation) -> Self {
        Self {
            position: (sep.point_a + sep.point_b) * 0.5,
            normal: sep.normal,
            depth: (-sep.distance).max(0.0),
        }
    }
}

/// Iteration budget shared by the support-mapping solvers.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SolverParams {
    pub rel_err: f32,
    pub abs_err: f32,
    pub max_iterations: usize,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            rel_err: gjk::GJK_REL_ERR,
            abs_err: gjk::GJK_ABS_ERR,
            max_iterations: gjk::GJK_MAX_ITERATIONS,
        }
    }
}

/// Signed separation of two bounded convex shapes: GJK for the separated
/// case, polytope expansion for penetration depth on overlap.
pub(crate) fn convex_convex(
    a: &ConvexPart<'_>,
    b: &ConvexPart<'_>,
    params: &SolverParams,
) -> Result<Separation, QueryError> {
    let output = gjk::closest_points(a, b, params.rel_err, params.abs_err, params.max_iterations)?;

    match output.status {
        gjk::GjkStatus::Separated {
            distance,
            point_a,
            point_b,
        } => {
            let normal = (point_b - point_a).normalize_or(Vec3A::X);
            Ok(Separation {
                distance,
                point_a,
                point_b,
                normal,
            })
        }
        gjk::GjkStatus::Intersecting => {
            let epa = epa::penetration(a, b, output.simplex, params.max_iterations)?;
            Ok(Separation {
                distance: -epa.depth,
                point_a: epa.point_a,
                point_b: epa.point_b,
                normal: epa.normal,
            })
        }
    }
}

/// Boolean-only convex pair test, skipping penetration depth entirely.
pub(crate) fn convex_intersects(
    a: &ConvexPart<'_>,
    b: &ConvexPart<'_>,
    params: &SolverParams,
) -> Result<bool, QueryError> {
    let output = gjk::closest_points(a, b, params.rel_err, params.abs_err, params.max_iterations)?;
    Ok(matches!(output.status, gjk::GjkStatus::Intersecting))
}

/// Dispatch classes of the geometry variants. The split drives the double
/// match in [`pair_separation`] and [`pair_contacts`]; adding a geometry
/// kind forces every arm below to be revisited.
enum ShapeClass<'a> {
    Convex,
    Mesh(&'a super::shapes::TriangleMeshShape),
    Boundary(mesh::Boundary),
}

fn classify(geometry: &Geometry) -> ShapeClass<'_> {
    match geometry {
        Geometry::Triangle(_)
        | Geometry::Box(_)
        | Geometry::Sphere(_)
        | Geometry::Ellipsoid(_)
        | Geometry::Capsule(_)
        | Geometry::Cone(_)
        | Geometry::Cylinder(_) => ShapeClass::Convex,
        Geometry::Halfspace(hs) => ShapeClass::Boundary(mesh::Boundary::Halfspace(*hs)),
        Geometry::Plane(plane) => ShapeClass::Boundary(mesh::Boundary::Plane(*plane)),
        Geometry::Mesh(m) => ShapeClass::Mesh(m),
    }
}

/// Signed separation between two arbitrary geometries under world poses.
/// Negative distance means penetration by that magnitude; the witness
/// normal points from A toward B.
pub(crate) fn pair_separation(
    geom_a: &Geometry,
    tf_a: &Affine3A,
    geom_b: &Geometry,
    tf_b: &Affine3A,
    params: &SolverParams,
) -> Result<Separation, QueryError> {
    let part_a = ConvexPart {
        geometry: geom_a,
        transform: tf_a,
    };
    let part_b = ConvexPart {
        geometry: geom_b,
        transform: tf_b,
    };

    match (classify(geom_a), classify(geom_b)) {
        (ShapeClass::Boundary(_), ShapeClass::Boundary(_)) => Err(
            QueryError::UnsupportedGeometryPair(geom_a.kind(), geom_b.kind()),
        ),
        (ShapeClass::Convex, ShapeClass::Convex) => {
            if let (Geometry::Sphere(s0), Geometry::Sphere(s1)) = (geom_a, geom_b) {
                Ok(primitives::sphere_sphere(s0, tf_a, s1, tf_b))
            } else {
                convex_convex(&part_a, &part_b, params)
            }
        }
        (ShapeClass::Convex, ShapeClass::Boundary(boundary)) => match boundary {
            mesh::Boundary::Halfspace(hs) => Ok(primitives::convex_halfspace(&part_a, &hs, tf_b)),
            mesh::Boundary::Plane(plane) => Ok(primitives::convex_plane(&part_a, &plane, tf_b)),
        },
        (ShapeClass::Boundary(boundary), ShapeClass::Convex) => match boundary {
            mesh::Boundary::Halfspace(hs) => {
                Ok(primitives::convex_halfspace(&part_b, &hs, tf_a).flipped())
            }
            mesh::Boundary::Plane(plane) => {
                Ok(primitives::convex_plane(&part_b, &plane, tf_a).flipped())
            }
        },
        (ShapeClass::Mesh(ma), ShapeClass::Mesh(mb)) => {
            mesh::mesh_mesh_distance(ma, tf_a, mb, tf_b, params)
        }
        (ShapeClass::Mesh(m), ShapeClass::Convex) => {
            mesh::mesh_convex_distance(m, tf_a, &part_b, params)
        }
        (ShapeClass::Convex, ShapeClass::Mesh(m)) => {
            Ok(mesh::mesh_convex_distance(m, tf_b, &part_a, params)?.flipped())
        }
        (ShapeClass::Mesh(m), ShapeClass::Boundary(boundary)) => {
            mesh::mesh_boundary_distance(m, tf_a, boundary, tf_b)
        }
        (ShapeClass::Boundary(boundary), ShapeClass::Mesh(m)) => {
            Ok(mesh::mesh_boundary_distance(m, tf_b, boundary, tf_a)?.flipped())
        }
    }
}

/// Contact generation between two arbitrary geometries under world poses.
/// Appends at most `max_contacts` records to `contacts` (none when
/// `enable_contact` is off) and reports whether the shapes touch.
#[allow(clippy::too_many_arguments)]
pub(crate) fn pair_contacts(
    geom_a: &Geometry,
    tf_a: &Affine3A,
    geom_b: &Geometry,
    tf_b: &Affine3A,
    params: &SolverParams,
    tolerance: f32,
    enable_contact: bool,
    max_contacts: usize,
    contacts: &mut Vec<RawContact>,
) -> Result<bool, QueryError> {
    let part_a = ConvexPart {
        geometry: geom_a,
        transform: tf_a,
    };
    let part_b = ConvexPart {
        geometry: geom_b,
        transform: tf_b,
    };

    let flip_from = contacts.len();
    let (hit, flip) = match (classify(geom_a), classify(geom_b)) {
        (ShapeClass::Boundary(_), ShapeClass::Boundary(_)) => {
            return Err(QueryError::UnsupportedGeometryPair(
                geom_a.kind(),
                geom_b.kind(),
            ));
        }
        (ShapeClass::Convex, ShapeClass::Convex) => {
            let both_spheres = matches!(
                (geom_a, geom_b),
                (Geometry::Sphere(_), Geometry::Sphere(_))
            );
            if !enable_contact && !both_spheres {
                (convex_intersects(&part_a, &part_b, params)?, false)
            } else {
                let sep = pair_separation(geom_a, tf_a, geom_b, tf_b, params)?;
                let hit = sep.distance <= tolerance;
                if hit && enable_contact && max_contacts > 0 {
                    contacts.push(RawContact::from_separation(&sep));
                }
                (hit, false)
            }
        }
        (ShapeClass::Convex, ShapeClass::Boundary(_))
        | (ShapeClass::Boundary(_), ShapeClass::Convex) => {
            let sep = pair_separation(geom_a, tf_a, geom_b, tf_b, params)?;
            let hit = sep.distance <= tolerance;
            if hit && enable_contact && max_contacts > 0 {
                contacts.push(RawContact::from_separation(&sep));
            }
            (hit, false)
        }
        (ShapeClass::Mesh(ma), ShapeClass::Mesh(mb)) => (
            mesh::mesh_mesh_contacts(
                ma,
                tf_a,
                mb,
                tf_b,
                params,
                tolerance,
                enable_contact,
                max_contacts,
                contacts,
            )?,
            false,
        ),
        (ShapeClass::Mesh(m), ShapeClass::Convex) => (
            mesh::mesh_convex_contacts(
                m,
                tf_a,
                &part_b,
                params,
                tolerance,
                enable_contact,
                max_contacts,
                contacts,
            )?,
            false,
        ),
        (ShapeClass::Convex, ShapeClass::Mesh(m)) => (
            mesh::mesh_convex_contacts(
                m,
                tf_b,
                &part_a,
                params,
                tolerance,
                enable_contact,
                max_contacts,
                contacts,
            )?,
            true,
        ),
        (ShapeClass::Mesh(m), ShapeClass::Boundary(boundary)) => (
            mesh::mesh_boundary_contacts(
                m,
                tf_a,
                boundary,
                tf_b,
                tolerance,
                enable_contact,
                max_contacts,
                contacts,
            )?,
            false,
        ),
        (ShapeClass::Boundary(boundary), ShapeClass::Mesh(m)) => (
            mesh::mesh_boundary_contacts(
                m,
                tf_b,
                boundary,
                tf_a,
                tolerance,
                enable_contact,
                max_contacts,
                contacts,
            )?,
            true,
        ),
    };

    if flip {
        // the algorithm ran with the operands swapped; reported normals
        // must still point from A toward B
        for contact in &mut contacts[flip_from..] {
            contact.normal = -contact.normal;
        }
    }

    Ok(hit)
}
