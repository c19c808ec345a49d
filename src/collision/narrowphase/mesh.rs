use glam::Affine3A;

use super::{ConvexPart, RawContact, Separation, SolverParams, convex_convex, primitives};
use crate::collision::shapes::mesh_bvh::BvhNodeKind;
use crate::collision::shapes::{Geometry, HalfspaceShape, PlaneShape, TriangleMeshShape};
use crate::error::QueryError;
use crate::linear_math::aabb::Aabb;

/// Contacts between a mesh (operand A) and a bounded convex shape
/// (operand B). Candidate triangles come from a stackless BVH walk with
/// the convex shape's box mapped into the mesh frame; each candidate is
/// resolved by the convex pair solver.
#[allow(clippy::too_many_arguments)]
pub(crate) fn mesh_convex_contacts(
    mesh: &TriangleMeshShape,
    tf_mesh: &Affine3A,
    other: &ConvexPart<'_>,
    params: &SolverParams,
    tolerance: f32,
    enable_contact: bool,
    max_contacts: usize,
    contacts: &mut Vec<RawContact>,
) -> Result<bool, QueryError> {
    let mesh_from_other = tf_mesh.inverse() * *other.transform;
    let query_aabb = other
        .geometry
        .local_aabb()
        .transformed_by(&mesh_from_other);

    let mut hit = false;
    let mut failure = None;

    mesh.bvh().for_each_overlapping(&query_aabb, &mut |tri| {
        let tri_geom = Geometry::Triangle(mesh.triangle(tri));
        let tri_part = ConvexPart {
            geometry: &tri_geom,
            transform: tf_mesh,
        };

        match convex_convex(&tri_part, other, params) {
            Ok(sep) if sep.distance <= tolerance => {
                hit = true;
                if !enable_contact {
                    return false;
                }
                contacts.push(RawContact::from_separation(&sep));
                contacts.len() < max_contacts
            }
            Ok(_) => true,
            Err(err) => {
                failure = Some(err);
                false
            }
        }
    });

    match failure {
        Some(err) => Err(err),
        None => Ok(hit),
    }
}

/// Minimum signed separation between a mesh (operand A) and a bounded
/// convex shape, pruning subtrees whose box cannot beat the best so far.
pub(crate) fn mesh_convex_distance(
    mesh: &TriangleMeshShape,
    tf_mesh: &Affine3A,
    other: &ConvexPart<'_>,
    params: &SolverParams,
) -> Result<Separation, QueryError> {
    let other_aabb = other.geometry.local_aabb().transformed_by(other.transform);
    let mut best = Separation::DISJOINT;

    mesh_convex_distance_recurse(
        mesh,
        tf_mesh,
        mesh.bvh().root(),
        other,
        &other_aabb,
        params,
        &mut best,
    )?;

    Ok(best)
}

fn mesh_convex_distance_recurse(
    mesh: &TriangleMeshShape,
    tf_mesh: &Affine3A,
    index: usize,
    other: &ConvexPart<'_>,
    other_aabb: &Aabb,
    params: &SolverParams,
    best: &mut Separation,
) -> Result<(), QueryError> {
    let node = mesh.bvh().node(index);
    if node.aabb.transformed_by(tf_mesh).distance(other_aabb) >= best.distance {
        return Ok(());
    }

    match node.kind {
        BvhNodeKind::Leaf { triangle_index } => {
            let tri_geom = Geometry::Triangle(mesh.triangle(triangle_index));
            let tri_part = ConvexPart {
                geometry: &tri_geom,
                transform: tf_mesh,
            };
            *best = best.min(convex_convex(&tri_part, other, params)?);
            Ok(())
        }
        BvhNodeKind::Branch { .. } => {
            let (left, right) = mesh.bvh().children(index);
            mesh_convex_distance_recurse(mesh, tf_mesh, left, other, other_aabb, params, best)?;
            mesh_convex_distance_recurse(mesh, tf_mesh, right, other, other_aabb, params, best)
        }
    }
}

/// Contacts between two meshes by simultaneous descent of both
/// hierarchies, splitting the larger box first.
#[allow(clippy::too_many_arguments)]
pub(crate) fn mesh_mesh_contacts(
    mesh_a: &TriangleMeshShape,
    tf_a: &Affine3A,
    mesh_b: &TriangleMeshShape,
    tf_b: &Affine3A,
    params: &SolverParams,
    tolerance: f32,
    enable_contact: bool,
    max_contacts: usize,
    contacts: &mut Vec<RawContact>,
) -> Result<bool, QueryError> {
    let mut hit = false;

    mesh_pair_recurse(
        mesh_a,
        tf_a,
        mesh_a.bvh().root(),
        mesh_b,
        tf_b,
        mesh_b.bvh().root(),
        &mut |ta, tb| {
            let tri_a = Geometry::Triangle(mesh_a.triangle(ta));
            let tri_b = Geometry::Triangle(mesh_b.triangle(tb));
            let part_a = ConvexPart {
                geometry: &tri_a,
                transform: tf_a,
            };
            let part_b = ConvexPart {
                geometry: &tri_b,
                transform: tf_b,
            };

            let sep = convex_convex(&part_a, &part_b, params)?;
            if sep.distance <= tolerance {
                hit = true;
                if !enable_contact {
                    return Ok(false);
                }
                contacts.push(RawContact::from_separation(&sep));
                return Ok(contacts.len() < max_contacts);
            }
            Ok(true)
        },
    )?;

    Ok(hit)
}

fn mesh_pair_recurse(
    mesh_a: &TriangleMeshShape,
    tf_a: &Affine3A,
    ia: usize,
    mesh_b: &TriangleMeshShape,
    tf_b: &Affine3A,
    ib: usize,
    visit: &mut impl FnMut(usize, usize) -> Result<bool, QueryError>,
) -> Result<bool, QueryError> {
    let node_a = mesh_a.bvh().node(ia);
    let node_b = mesh_b.bvh().node(ib);
    let world_a = node_a.aabb.transformed_by(tf_a);
    let world_b = node_b.aabb.transformed_by(tf_b);
    if !world_a.intersects(&world_b) {
        return Ok(true);
    }

    match (node_a.kind, node_b.kind) {
        (BvhNodeKind::Leaf { triangle_index: ta }, BvhNodeKind::Leaf { triangle_index: tb }) => {
            visit(ta, tb)
        }
        (BvhNodeKind::Leaf { .. }, BvhNodeKind::Branch { .. }) => {
            let (left, right) = mesh_b.bvh().children(ib);
            if !mesh_pair_recurse(mesh_a, tf_a, ia, mesh_b, tf_b, left, visit)? {
                return Ok(false);
            }
            mesh_pair_recurse(mesh_a, tf_a, ia, mesh_b, tf_b, right, visit)
        }
        (BvhNodeKind::Branch { .. }, BvhNodeKind::Leaf { .. }) => {
            let (left, right) = mesh_a.bvh().children(ia);
            if !mesh_pair_recurse(mesh_a, tf_a, left, mesh_b, tf_b, ib, visit)? {
                return Ok(false);
            }
            mesh_pair_recurse(mesh_a, tf_a, right, mesh_b, tf_b, ib, visit)
        }
        (BvhNodeKind::Branch { .. }, BvhNodeKind::Branch { .. }) => {
            if world_a.area() >= world_b.area() {
                let (left, right) = mesh_a.bvh().children(ia);
                if !mesh_pair_recurse(mesh_a, tf_a, left, mesh_b, tf_b, ib, visit)? {
                    return Ok(false);
                }
                mesh_pair_recurse(mesh_a, tf_a, right, mesh_b, tf_b, ib, visit)
            } else {
                let (left, right) = mesh_b.bvh().children(ib);
                if !mesh_pair_recurse(mesh_a, tf_a, ia, mesh_b, tf_b, left, visit)? {
                    return Ok(false);
                }
                mesh_pair_recurse(mesh_a, tf_a, ia, mesh_b, tf_b, right, visit)
            }
        }
    }
}

/// Minimum signed separation between two meshes with box-distance pruning.
pub(crate) fn mesh_mesh_distance(
    mesh_a: &TriangleMeshShape,
    tf_a: &Affine3A,
    mesh_b: &TriangleMeshShape,
    tf_b: &Affine3A,
    params: &SolverParams,
) -> Result<Separation, QueryError> {
    let mut best = Separation::DISJOINT;

    mesh_pair_distance_recurse(
        mesh_a,
        tf_a,
        mesh_a.bvh().root(),
        mesh_b,
        tf_b,
        mesh_b.bvh().root(),
        params,
        &mut best,
    )?;

    Ok(best)
}

#[allow(clippy::too_many_arguments)]
fn mesh_pair_distance_recurse(
    mesh_a: &TriangleMeshShape,
    tf_a: &Affine3A,
    ia: usize,
    mesh_b: &TriangleMeshShape,
    tf_b: &Affine3A,
    ib: usize,
    params: &SolverParams,
    best: &mut Separation,
) -> Result<(), QueryError> {
    let node_a = mesh_a.bvh().node(ia);
    let node_b = mesh_b.bvh().node(ib);
    let world_a = node_a.aabb.transformed_by(tf_a);
    let world_b = node_b.aabb.transformed_by(tf_b);
    if world_a.distance(&world_b) >= best.distance {
        return Ok(());
    }

    match (node_a.kind, node_b.kind) {
        (BvhNodeKind::Leaf { triangle_index: ta }, BvhNodeKind::Leaf { triangle_index: tb }) => {
            let tri_a = Geometry::Triangle(mesh_a.triangle(ta));
            let tri_b = Geometry::Triangle(mesh_b.triangle(tb));
            let part_a = ConvexPart {
                geometry: &tri_a,
                transform: tf_a,
            };
            let part_b = ConvexPart {
                geometry: &tri_b,
                transform: tf_b,
            };
            *best = best.min(convex_convex(&part_a, &part_b, params)?);
            Ok(())
        }
        (BvhNodeKind::Leaf { .. }, BvhNodeKind::Branch { .. }) => {
            let (left, right) = mesh_b.bvh().children(ib);
            mesh_pair_distance_recurse(mesh_a, tf_a, ia, mesh_b, tf_b, left, params, best)?;
            mesh_pair_distance_recurse(mesh_a, tf_a, ia, mesh_b, tf_b, right, params, best)
        }
        (BvhNodeKind::Branch { .. }, BvhNodeKind::Leaf { .. }) => {
            let (left, right) = mesh_a.bvh().children(ia);
            mesh_pair_distance_recurse(mesh_a, tf_a, left, mesh_b, tf_b, ib, params, best)?;
            mesh_pair_distance_recurse(mesh_a, tf_a, right, mesh_b, tf_b, ib, params, best)
        }
        (BvhNodeKind::Branch { .. }, BvhNodeKind::Branch { .. }) => {
            if world_a.area() >= world_b.area() {
                let (left, right) = mesh_a.bvh().children(ia);
                mesh_pair_distance_recurse(mesh_a, tf_a, left, mesh_b, tf_b, ib, params, best)?;
                mesh_pair_distance_recurse(mesh_a, tf_a, right, mesh_b, tf_b, ib, params, best)
            } else {
                let (left, right) = mesh_b.bvh().children(ib);
                mesh_pair_distance_recurse(mesh_a, tf_a, ia, mesh_b, tf_b, left, params, best)?;
                mesh_pair_distance_recurse(mesh_a, tf_a, ia, mesh_b, tf_b, right, params, best)
            }
        }
    }
}

/// An unbounded boundary operand: the two shapes whose surface is a plane.
#[derive(Clone, Copy)]
pub(crate) enum Boundary {
    Halfspace(HalfspaceShape),
    Plane(PlaneShape),
}

impl Boundary {
    fn separation(&self, tri_part: &ConvexPart<'_>, tf: &Affine3A) -> Separation {
        match self {
            Self::Halfspace(hs) => primitives::convex_halfspace(tri_part, hs, tf),
            Self::Plane(plane) => primitives::convex_plane(tri_part, plane, tf),
        }
    }

    /// Lower bound of the signed distance any triangle inside `aabb` can
    /// achieve against the boundary surface.
    fn aabb_bound(&self, aabb: &Aabb, tf: &Affine3A) -> f32 {
        let (normal, offset) = match self {
            Self::Halfspace(hs) => (tf.matrix3 * hs.normal(), hs.offset()),
            Self::Plane(plane) => (tf.matrix3 * plane.normal(), plane.offset()),
        };
        let offset = offset + normal.dot(tf.translation);

        let center = normal.dot(aabb.center());
        let reach = normal.abs().dot(aabb.half_extents());
        let lo = center - reach - offset;
        let hi = center + reach - offset;

        match self {
            Self::Halfspace(_) => lo,
            Self::Plane(_) => {
                if lo > 0.0 {
                    lo
                } else if hi < 0.0 {
                    -hi
                } else {
                    -(hi.min(-lo))
                }
            }
        }
    }
}

/// Contacts between a mesh (operand A) and an unbounded boundary shape.
#[allow(clippy::too_many_arguments)]
pub(crate) fn mesh_boundary_contacts(
    mesh: &TriangleMeshShape,
    tf_mesh: &Affine3A,
    boundary: Boundary,
    tf_boundary: &Affine3A,
    tolerance: f32,
    enable_contact: bool,
    max_contacts: usize,
    contacts: &mut Vec<RawContact>,
) -> Result<bool, QueryError> {
    let mut hit = false;

    mesh_boundary_recurse(
        mesh,
        tf_mesh,
        mesh.bvh().root(),
        boundary,
        tf_boundary,
        tolerance,
        &mut |sep| {
            if sep.distance <= tolerance {
                hit = true;
                if !enable_contact {
                    return false;
                }
                contacts.push(RawContact::from_separation(&sep));
                return contacts.len() < max_contacts;
            }
            true
        },
    );

    Ok(hit)
}

fn mesh_boundary_recurse(
    mesh: &TriangleMeshShape,
    tf_mesh: &Affine3A,
    index: usize,
    boundary: Boundary,
    tf_boundary: &Affine3A,
    cutoff: f32,
    visit: &mut impl FnMut(Separation) -> bool,
) -> bool {
    let node = mesh.bvh().node(index);
    if boundary.aabb_bound(&node.aabb.transformed_by(tf_mesh), tf_boundary) > cutoff {
        return true;
    }

    match node.kind {
        BvhNodeKind::Leaf { triangle_index } => {
            let tri_geom = Geometry::Triangle(mesh.triangle(triangle_index));
            let tri_part = ConvexPart {
                geometry: &tri_geom,
                transform: tf_mesh,
            };
            visit(boundary.separation(&tri_part, tf_boundary))
        }
        BvhNodeKind::Branch { .. } => {
            let (left, right) = mesh.bvh().children(index);
            mesh_boundary_recurse(mesh, tf_mesh, left, boundary, tf_boundary, cutoff, visit)
                && mesh_boundary_recurse(mesh, tf_mesh, right, boundary, tf_boundary, cutoff, visit)
        }
    }
}

/// Minimum signed separation between a mesh and an unbounded boundary
/// shape, pruning subtrees by their interval against the surface.
pub(crate) fn mesh_boundary_distance(
    mesh: &TriangleMeshShape,
    tf_mesh: &Affine3A,
    boundary: Boundary,
    tf_boundary: &Affine3A,
) -> Result<Separation, QueryError> {
    let mut best = Separation::DISJOINT;

    mesh_boundary_distance_recurse(
        mesh,
        tf_mesh,
        mesh.bvh().root(),
        boundary,
        tf_boundary,
        &mut best,
    );

    Ok(best)
}

fn mesh_boundary_distance_recurse(
    mesh: &TriangleMeshShape,
    tf_mesh: &Affine3A,
    index: usize,
    boundary: Boundary,
    tf_boundary: &Affine3A,
    best: &mut Separation,
) {
    let node = mesh.bvh().node(index);
    if boundary.aabb_bound(&node.aabb.transformed_by(tf_mesh), tf_boundary) >= best.distance {
        return;
    }

    match node.kind {
        BvhNodeKind::Leaf { triangle_index } => {
            let tri_geom = Geometry::Triangle(mesh.triangle(triangle_index));
            let tri_part = ConvexPart {
                geometry: &tri_geom,
                transform: tf_mesh,
            };
            *best = best.min(boundary.separation(&tri_part, tf_boundary));
        }
        BvhNodeKind::Branch { .. } => {
            let (left, right) = mesh.bvh().children(index);
            mesh_boundary_distance_recurse(mesh, tf_mesh, left, boundary, tf_boundary, best);
            mesh_boundary_distance_recurse(mesh, tf_mesh, right, boundary, tf_boundary, best);
        }
    }
}
