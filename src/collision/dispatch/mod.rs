use crate::collision::narrowphase::{self, SolverParams};
use crate::collision_object::CollisionObject;
use crate::error::QueryError;
use crate::linear_math::Isometry;

pub mod query;

use query::{
    CollisionRequest, CollisionResult, Contact, ContinuousCollisionRequest,
    ContinuousCollisionResult, CostSource, DistanceRequest, DistanceResult,
};

/// Discrete collision test between two objects. Appends generated contacts
/// to `result` and returns how many this call produced; generation stops
/// once `result` holds `request.max_contacts` contacts.
pub fn collide(
    obj_a: &CollisionObject,
    obj_b: &CollisionObject,
    request: &CollisionRequest,
    result: &mut CollisionResult,
) -> Result<usize, QueryError> {
    let budget = request.max_contacts.saturating_sub(result.num_contacts());
    if request.enable_contact && budget == 0 {
        return Ok(0);
    }

    let tf_a = obj_a.transform().to_affine();
    let tf_b = obj_b.transform().to_affine();
    let params = SolverParams::default();

    let mut raw = Vec::new();
    let hit = narrowphase::pair_contacts(
        obj_a.geometry(),
        &tf_a,
        obj_b.geometry(),
        &tf_b,
        &params,
        request.tolerance,
        request.enable_contact,
        budget,
        &mut raw,
    )?;

    if !hit {
        return Ok(0);
    }

    result.set_collision();

    if request.enable_cost && obj_a.aabb().intersects(obj_b.aabb()) {
        result.add_cost_source(
            CostSource::from_overlap(obj_a.aabb().overlap_region(obj_b.aabb()), 1.0),
            request.num_max_cost_sources,
        );
    }

    if !request.enable_contact {
        // boolean determination only: one detected contact, no geometry
        return Ok(1);
    }

    let produced = raw.len();
    for contact in raw {
        result.add_contact(Contact {
            object_a: obj_a.id(),
            object_b: obj_b.id(),
            position: contact.position,
            normal: contact.normal,
            penetration_depth: contact.depth,
        });
    }

    Ok(produced)
}

/// Minimum separation between two objects' surfaces. Negative when they
/// interpenetrate (the negated depth); `result` keeps the smallest value
/// seen, so one instance can fold over many pairs.
pub fn distance(
    obj_a: &CollisionObject,
    obj_b: &CollisionObject,
    request: &DistanceRequest,
    result: &mut DistanceResult,
) -> Result<f32, QueryError> {
    let tf_a = obj_a.transform().to_affine();
    let tf_b = obj_b.transform().to_affine();
    let params = SolverParams {
        rel_err: request.rel_err,
        abs_err: request.abs_err,
        max_iterations: request.max_iterations,
    };

    let sep = narrowphase::pair_separation(
        obj_a.geometry(),
        &tf_a,
        obj_b.geometry(),
        &tf_b,
        &params,
    )?;

    result.update(
        sep.distance,
        request
            .enable_nearest_points
            .then_some([sep.point_a, sep.point_b]),
        obj_a.id(),
        obj_b.id(),
    );

    Ok(sep.distance)
}

/// Earliest contact time of two objects moving linearly from their current
/// poses to the supplied goal poses over the normalized interval.
///
/// Returns 1.0 for a contact-free motion (including bodies that first touch
/// exactly at the end of it), 0.0 for initially overlapping bodies, and a
/// value strictly inside (0, 1) otherwise.
pub fn continuous_collide(
    obj_a: &CollisionObject,
    goal_a: &Isometry,
    obj_b: &CollisionObject,
    goal_b: &Isometry,
    request: &ContinuousCollisionRequest,
    result: &mut ContinuousCollisionResult,
) -> Result<f32, QueryError> {
    let output = narrowphase::conservative_advancement::conservative_advancement(
        obj_a.geometry(),
        obj_a.transform(),
        goal_a,
        obj_b.geometry(),
        obj_b.transform(),
        goal_b,
        request.max_iterations,
        request.toi_tolerance,
    )?;

    result.time_of_contact = output.time_of_contact;
    result.is_collide = output.is_collide;

    Ok(output.time_of_contact)
}
