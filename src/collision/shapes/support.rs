use glam::Vec3A;

use super::Geometry;

/// Furthest point of a convex shape along `dir`, in the shape's local frame.
///
/// Only the bounded convex kinds have a support mapping; the dispatch layer
/// never routes planes, halfspaces or meshes here.
#[must_use]
pub(crate) fn local_support(geometry: &Geometry, dir: Vec3A) -> Vec3A {
    match geometry {
        Geometry::Triangle(tri) => {
            let dots = tri.vertices.map(|v| v.dot(dir));
            if dots[0] >= dots[1] && dots[0] >= dots[2] {
                tri.vertices[0]
            } else if dots[1] >= dots[2] {
                tri.vertices[1]
            } else {
                tri.vertices[2]
            }
        }
        Geometry::Box(b) => Vec3A::select(
            dir.cmpge(Vec3A::ZERO),
            b.half_extents(),
            -b.half_extents(),
        ),
        Geometry::Sphere(s) => dir.normalize_or(Vec3A::X) * s.radius(),
        Geometry::Ellipsoid(e) => {
            // support of an ellipsoid: scale the direction by the squared
            // radii, then renormalize onto the surface
            let radii = e.radii();
            let scaled = radii * radii * dir;
            let denom = (scaled.dot(dir)).sqrt();
            if denom > f32::EPSILON {
                scaled / denom
            } else {
                Vec3A::new(radii.x, 0.0, 0.0)
            }
        }
        Geometry::Capsule(c) => {
            let cap = Vec3A::new(0.0, 0.0, c.half_height().copysign(dir.z));
            cap + dir.normalize_or(Vec3A::X) * c.radius()
        }
        Geometry::Cone(c) => {
            let apex = Vec3A::new(0.0, 0.0, c.half_height());
            // the apex wins whenever dir points within the cone's
            // complement angle, otherwise the base rim does
            let sin_angle =
                c.radius() / c.radius().hypot(2.0 * c.half_height());
            let len = dir.length();
            if len > f32::EPSILON && dir.z >= len * sin_angle {
                return apex;
            }

            let radial = Vec3A::new(dir.x, dir.y, 0.0);
            let radial_len = radial.length();
            if radial_len > f32::EPSILON {
                radial * (c.radius() / radial_len) + Vec3A::new(0.0, 0.0, -c.half_height())
            } else {
                Vec3A::new(0.0, 0.0, -c.half_height())
            }
        }
        Geometry::Cylinder(c) => {
            let z = c.half_height().copysign(dir.z);
            let radial = Vec3A::new(dir.x, dir.y, 0.0);
            let radial_len = radial.length();
            if radial_len > f32::EPSILON {
                radial * (c.radius() / radial_len) + Vec3A::new(0.0, 0.0, z)
            } else {
                Vec3A::new(c.radius(), 0.0, z)
            }
        }
        Geometry::Halfspace(_) | Geometry::Plane(_) | Geometry::Mesh(_) => {
            unreachable!("support mapping requested for non-convex geometry")
        }
    }
}
