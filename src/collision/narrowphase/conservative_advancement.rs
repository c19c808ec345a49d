use log::trace;

use super::{SolverParams, pair_separation};
use crate::collision::shapes::Geometry;
use crate::error::QueryError;
use crate::linear_math::Isometry;

pub(crate) struct CcdOutput {
    pub time_of_contact: f32,
    pub is_collide: bool,
}

const NO_CONTACT: CcdOutput = CcdOutput {
    time_of_contact: 1.0,
    is_collide: false,
};

/// Upper bound on how far any point of the shape travels over the whole
/// motion: translation plus swept rotation times the shape's bounding
/// radius.
fn motion_bound(geometry: &Geometry, start: &Isometry, goal: &Isometry) -> f32 {
    let linear = start.translation().distance(goal.translation());
    let angular = start.rotation_angle_to(goal) * geometry.bounding_radius();
    linear + angular
}

/// Earliest contact time of two shapes moving from their start poses to
/// their goal poses, by conservative advancement: at each step the current
/// separation divided by the maximum closing speed is a safe advance.
///
/// Contact strictly inside the interval reports the time of contact;
/// bodies that first touch at the very end of the motion report 1.0 by
/// convention. Initially overlapping bodies report 0.0.
#[allow(clippy::too_many_arguments)]
pub(crate) fn conservative_advancement(
    geom_a: &Geometry,
    start_a: &Isometry,
    goal_a: &Isometry,
    geom_b: &Geometry,
    start_b: &Isometry,
    goal_b: &Isometry,
    max_iterations: usize,
    toi_tolerance: f32,
) -> Result<CcdOutput, QueryError> {
    // swept-volume reject: if the motions' boxes never meet, neither do
    // the shapes
    let swept_a = geom_a.local_aabb().transformed_by(&start_a.to_affine())
        + geom_a.local_aabb().transformed_by(&goal_a.to_affine());
    let swept_b = geom_b.local_aabb().transformed_by(&start_b.to_affine())
        + geom_b.local_aabb().transformed_by(&goal_b.to_affine());
    if !swept_a.intersects(&swept_b) {
        return Ok(NO_CONTACT);
    }

    let bound = motion_bound(geom_a, start_a, goal_a) + motion_bound(geom_b, start_b, goal_b);
    let params = SolverParams::default();

    let mut t = 0.0f32;
    for iteration in 0..max_iterations {
        let tf_a = start_a.interpolate(goal_a, t).to_affine();
        let tf_b = start_b.interpolate(goal_b, t).to_affine();
        let sep = pair_separation(geom_a, &tf_a, geom_b, &tf_b, &params)?;

        if sep.distance <= toi_tolerance {
            // contact within the end-of-motion tolerance band counts as
            // touching exactly at t = 1, which is "no collision"
            if t + toi_tolerance >= 1.0 {
                return Ok(NO_CONTACT);
            }
            trace!("advancement contact at t = {t} after {iteration} iterations");
            return Ok(CcdOutput {
                time_of_contact: t,
                is_collide: true,
            });
        }

        if bound <= f32::EPSILON {
            // no relative motion can close a positive gap
            return Ok(NO_CONTACT);
        }

        let t_next = t + sep.distance / bound;
        if t_next >= 1.0 {
            // the gap cannot close strictly before the motion ends
            return Ok(NO_CONTACT);
        }
        t = t_next;
    }

    Err(QueryError::ConvergenceFailure {
        iterations: max_iterations,
    })
}
