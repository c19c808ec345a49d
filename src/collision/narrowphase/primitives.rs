use glam::{Affine3A, Vec3A};

use super::{ConvexPart, Separation};
use crate::collision::shapes::{HalfspaceShape, PlaneShape, SphereShape};

/// Signed separation of two spheres, in closed form.
pub(crate) fn sphere_sphere(
    s0: &SphereShape,
    tf0: &Affine3A,
    s1: &SphereShape,
    tf1: &Affine3A,
) -> Separation {
    let c0 = tf0.translation;
    let c1 = tf1.translation;

    let delta = c1 - c0;
    let center_dist = delta.length();
    let normal = if center_dist > f32::EPSILON {
        delta / center_dist
    } else {
        Vec3A::X
    };

    Separation {
        distance: center_dist - s0.radius() - s1.radius(),
        point_a: c0 + normal * s0.radius(),
        point_b: c1 - normal * s1.radius(),
        normal,
    }
}

/// Signed separation of a bounded convex shape against a halfspace: the
/// deepest support vertex against the boundary plane decides.
pub(crate) fn convex_halfspace(
    convex: &ConvexPart<'_>,
    halfspace: &HalfspaceShape,
    tf_hs: &Affine3A,
) -> Separation {
    let normal = tf_hs.matrix3 * halfspace.normal();
    let offset = halfspace.offset() + normal.dot(tf_hs.translation);

    // deepest point of the convex shape into the halfspace
    let deepest = convex.support(-normal);
    let distance = normal.dot(deepest) - offset;

    Separation {
        distance,
        point_a: deepest,
        point_b: deepest - normal * distance,
        // the halfspace's material lies against its outward normal
        normal: -normal,
    }
}

/// Signed separation of a bounded convex shape against a two-sided plane.
/// The shape's support interval along the plane normal decides the side;
/// straddling the plane counts as penetration by the smaller escape.
pub(crate) fn convex_plane(
    convex: &ConvexPart<'_>,
    plane: &PlaneShape,
    tf_plane: &Affine3A,
) -> Separation {
    let normal = tf_plane.matrix3 * plane.normal();
    let offset = plane.offset() + normal.dot(tf_plane.translation);

    let support_hi = convex.support(normal);
    let support_lo = convex.support(-normal);
    let hi = normal.dot(support_hi);
    let lo = normal.dot(support_lo);

    if lo >= offset {
        // entirely on the normal side
        Separation {
            distance: lo - offset,
            point_a: support_lo,
            point_b: support_lo - normal * (lo - offset),
            normal: -normal,
        }
    } else if hi <= offset {
        Separation {
            distance: offset - hi,
            point_a: support_hi,
            point_b: support_hi + normal * (offset - hi),
            normal,
        }
    } else if hi - offset < offset - lo {
        // straddling: escape along the cheaper side
        Separation {
            distance: -(hi - offset),
            point_a: support_hi,
            point_b: support_hi - normal * (hi - offset),
            normal,
        }
    } else {
        Separation {
            distance: -(offset - lo),
            point_a: support_lo,
            point_b: support_lo + normal * (offset - lo),
            normal: -normal,
        }
    }
}
