use glam::Vec3A;

use crate::error::QueryError;
use crate::linear_math::{LARGE_FLOAT, aabb::Aabb};

pub mod mesh_bvh;
pub mod support;
pub mod triangle_mesh;

pub use triangle_mesh::TriangleMeshShape;

fn require(condition: bool, reason: &'static str) -> Result<(), QueryError> {
    if condition {
        Ok(())
    } else {
        Err(QueryError::InvalidGeometry(reason))
    }
}

/// A single triangle, given by its three vertices.
#[derive(Clone, Copy, Debug)]
pub struct TriangleShape {
    pub vertices: [Vec3A; 3],
}

impl TriangleShape {
    pub fn new(p0: Vec3A, p1: Vec3A, p2: Vec3A) -> Result<Self, QueryError> {
        require(
            p0.is_finite() && p1.is_finite() && p2.is_finite(),
            "triangle vertices must be finite",
        )?;
        Ok(Self {
            vertices: [p0, p1, p2],
        })
    }
}

/// A box centered at the local origin, described by its half extents.
#[derive(Clone, Copy, Debug)]
pub struct BoxShape {
    half_extents: Vec3A,
}

impl BoxShape {
    pub fn new(half_extents: Vec3A) -> Result<Self, QueryError> {
        require(
            half_extents.is_finite() && half_extents.cmpgt(Vec3A::ZERO).all(),
            "box half extents must be positive and finite",
        )?;
        Ok(Self { half_extents })
    }

    #[inline]
    #[must_use]
    pub const fn half_extents(&self) -> Vec3A {
        self.half_extents
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SphereShape {
    radius: f32,
}

impl SphereShape {
    pub fn new(radius: f32) -> Result<Self, QueryError> {
        require(
            radius.is_finite() && radius > 0.0,
            "sphere radius must be positive and finite",
        )?;
        Ok(Self { radius })
    }

    #[inline]
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }
}

/// An ellipsoid with independent radii along the local axes.
#[derive(Clone, Copy, Debug)]
pub struct EllipsoidShape {
    radii: Vec3A,
}

impl EllipsoidShape {
    pub fn new(radii: Vec3A) -> Result<Self, QueryError> {
        require(
            radii.is_finite() && radii.cmpgt(Vec3A::ZERO).all(),
            "ellipsoid radii must be positive and finite",
        )?;
        Ok(Self { radii })
    }

    #[inline]
    #[must_use]
    pub const fn radii(&self) -> Vec3A {
        self.radii
    }
}

/// A capsule along the local Z axis: a segment of half length `half_height`
/// swept by a sphere of `radius`.
#[derive(Clone, Copy, Debug)]
pub struct CapsuleShape {
    radius: f32,
    half_height: f32,
}

impl CapsuleShape {
    pub fn new(radius: f32, half_height: f32) -> Result<Self, QueryError> {
        require(
            radius.is_finite() && radius > 0.0,
            "capsule radius must be positive and finite",
        )?;
        require(
            half_height.is_finite() && half_height >= 0.0,
            "capsule half height must be non-negative and finite",
        )?;
        Ok(Self {
            radius,
            half_height,
        })
    }

    #[inline]
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    #[must_use]
    pub const fn half_height(&self) -> f32 {
        self.half_height
    }
}

/// A cone along the local Z axis: apex at `+half_height`, base disc of
/// `radius` at `-half_height`.
#[derive(Clone, Copy, Debug)]
pub struct ConeShape {
    radius: f32,
    half_height: f32,
}

impl ConeShape {
    pub fn new(radius: f32, half_height: f32) -> Result<Self, QueryError> {
        require(
            radius.is_finite() && radius > 0.0,
            "cone radius must be positive and finite",
        )?;
        require(
            half_height.is_finite() && half_height > 0.0,
            "cone half height must be positive and finite",
        )?;
        Ok(Self {
            radius,
            half_height,
        })
    }

    #[inline]
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    #[must_use]
    pub const fn half_height(&self) -> f32 {
        self.half_height
    }
}

/// A cylinder along the local Z axis.
#[derive(Clone, Copy, Debug)]
pub struct CylinderShape {
    radius: f32,
    half_height: f32,
}

impl CylinderShape {
    pub fn new(radius: f32, half_height: f32) -> Result<Self, QueryError> {
        require(
            radius.is_finite() && radius > 0.0,
            "cylinder radius must be positive and finite",
        )?;
        require(
            half_height.is_finite() && half_height > 0.0,
            "cylinder half height must be positive and finite",
        )?;
        Ok(Self {
            radius,
            half_height,
        })
    }

    #[inline]
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    #[must_use]
    pub const fn half_height(&self) -> f32 {
        self.half_height
    }
}

/// The solid region `{x : dot(normal, x) <= offset}`.
#[derive(Clone, Copy, Debug)]
pub struct HalfspaceShape {
    normal: Vec3A,
    offset: f32,
}

impl HalfspaceShape {
    pub fn new(normal: Vec3A, offset: f32) -> Result<Self, QueryError> {
        require(
            normal.is_finite() && offset.is_finite() && normal.length_squared() > f32::EPSILON,
            "halfspace normal must be finite and non-zero",
        )?;
        Ok(Self {
            normal: normal.normalize(),
            offset,
        })
    }

    #[inline]
    #[must_use]
    pub const fn normal(&self) -> Vec3A {
        self.normal
    }

    #[inline]
    #[must_use]
    pub const fn offset(&self) -> f32 {
        self.offset
    }
}

/// The two-sided surface `{x : dot(normal, x) = offset}`.
#[derive(Clone, Copy, Debug)]
pub struct PlaneShape {
    normal: Vec3A,
    offset: f32,
}

impl PlaneShape {
    pub fn new(normal: Vec3A, offset: f32) -> Result<Self, QueryError> {
        require(
            normal.is_finite() && offset.is_finite() && normal.length_squared() > f32::EPSILON,
            "plane normal must be finite and non-zero",
        )?;
        Ok(Self {
            normal: normal.normalize(),
            offset,
        })
    }

    #[inline]
    #[must_use]
    pub const fn normal(&self) -> Vec3A {
        self.normal
    }

    #[inline]
    #[must_use]
    pub const fn offset(&self) -> f32 {
        self.offset
    }
}

/// World-placement-independent shape description. A closed variant: the
/// narrow-phase dispatch matches over every kind exhaustively, so a new
/// shape cannot be added without the compiler pointing at every dispatch
/// site that must learn about it.
#[derive(Clone, Debug)]
pub enum Geometry {
    Triangle(TriangleShape),
    Box(BoxShape),
    Sphere(SphereShape),
    Ellipsoid(EllipsoidShape),
    Capsule(CapsuleShape),
    Cone(ConeShape),
    Cylinder(CylinderShape),
    Halfspace(HalfspaceShape),
    Plane(PlaneShape),
    Mesh(TriangleMeshShape),
}

impl Geometry {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Triangle(_) => "triangle",
            Self::Box(_) => "box",
            Self::Sphere(_) => "sphere",
            Self::Ellipsoid(_) => "ellipsoid",
            Self::Capsule(_) => "capsule",
            Self::Cone(_) => "cone",
            Self::Cylinder(_) => "cylinder",
            Self::Halfspace(_) => "halfspace",
            Self::Plane(_) => "plane",
            Self::Mesh(_) => "mesh",
        }
    }

    /// Bounding box in the shape's local frame. Unbounded shapes clamp to
    /// [`LARGE_FLOAT`].
    #[must_use]
    pub fn local_aabb(&self) -> Aabb {
        match self {
            Self::Triangle(tri) => Aabb::from_points(&tri.vertices),
            Self::Box(b) => Aabb::new(-b.half_extents, b.half_extents),
            Self::Sphere(s) => {
                let r = Vec3A::splat(s.radius);
                Aabb::new(-r, r)
            }
            Self::Ellipsoid(e) => Aabb::new(-e.radii, e.radii),
            Self::Capsule(c) => {
                let ext = Vec3A::new(c.radius, c.radius, c.half_height + c.radius);
                Aabb::new(-ext, ext)
            }
            Self::Cone(c) => {
                let ext = Vec3A::new(c.radius, c.radius, c.half_height);
                Aabb::new(-ext, ext)
            }
            Self::Cylinder(c) => {
                let ext = Vec3A::new(c.radius, c.radius, c.half_height);
                Aabb::new(-ext, ext)
            }
            Self::Halfspace(_) | Self::Plane(_) => {
                let ext = Vec3A::splat(LARGE_FLOAT);
                Aabb::new(-ext, ext)
            }
            Self::Mesh(mesh) => *mesh.local_aabb(),
        }
    }

    /// Radius of the smallest origin-centered ball containing the shape.
    /// Used by the continuous-collision motion bound.
    #[must_use]
    pub fn bounding_radius(&self) -> f32 {
        match self {
            Self::Triangle(tri) => tri
                .vertices
                .iter()
                .map(|v| v.length())
                .fold(0.0f32, f32::max),
            Self::Box(b) => b.half_extents.length(),
            Self::Sphere(s) => s.radius,
            Self::Ellipsoid(e) => e.radii.max_element(),
            Self::Capsule(c) => c.half_height + c.radius,
            Self::Cone(c) => c.half_height.hypot(c.radius),
            Self::Cylinder(c) => c.half_height.hypot(c.radius),
            Self::Halfspace(_) | Self::Plane(_) => LARGE_FLOAT,
            Self::Mesh(mesh) => mesh.bounding_radius(),
        }
    }
}
