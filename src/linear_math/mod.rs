use glam::{Affine3A, Quat, Vec3A};
use std::f32::consts::FRAC_1_SQRT_2;

pub mod aabb;

/// Stand-in for infinity in bounding volumes of unbounded shapes.
pub const LARGE_FLOAT: f32 = 1e18;

/// A rigid pose: rotation followed by translation.
///
/// The rotation is canonically a unit quaternion; every constructor and
/// mutator renormalizes, so the orthonormality invariant survives arbitrary
/// mutation sequences.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Isometry {
    rotation: Quat,
    translation: Vec3A,
}

impl Default for Isometry {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Isometry {
    pub const IDENTITY: Self = Self {
        rotation: Quat::IDENTITY,
        translation: Vec3A::ZERO,
    };

    #[must_use]
    pub fn new(rotation: Quat, translation: Vec3A) -> Self {
        Self {
            rotation: rotation.normalize(),
            translation,
        }
    }

    #[must_use]
    pub const fn from_translation(translation: Vec3A) -> Self {
        Self {
            rotation: Quat::IDENTITY,
            translation,
        }
    }

    #[must_use]
    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation: rotation.normalize(),
            translation: Vec3A::ZERO,
        }
    }

    #[inline]
    #[must_use]
    pub const fn rotation(&self) -> Quat {
        self.rotation
    }

    #[inline]
    #[must_use]
    pub const fn translation(&self) -> Vec3A {
        self.translation
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
    }

    pub const fn set_translation(&mut self, translation: Vec3A) {
        self.translation = translation;
    }

    #[must_use]
    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_rotation_translation(self.rotation, self.translation.into())
    }

    #[inline]
    #[must_use]
    pub fn transform_point(&self, p: Vec3A) -> Vec3A {
        self.rotation * p + self.translation
    }

    /// Pose at parameter `t` of the screw motion from `self` to `goal`:
    /// translation lerp, rotation slerp.
    #[must_use]
    pub fn interpolate(&self, goal: &Self, t: f32) -> Self {
        Self {
            rotation: self.rotation.slerp(goal.rotation, t).normalize(),
            translation: self.translation.lerp(goal.translation, t),
        }
    }

    /// Rotation angle in radians swept when moving to `goal`.
    #[must_use]
    pub fn rotation_angle_to(&self, goal: &Self) -> f32 {
        self.rotation.angle_between(goal.rotation)
    }
}

/// Two unit vectors spanning the plane orthogonal to `n` (assumed unit).
#[must_use]
pub fn plane_space(n: Vec3A) -> (Vec3A, Vec3A) {
    if n.z.abs() > FRAC_1_SQRT_2 {
        // choose p in y-z plane
        let a = n.y.mul_add(n.y, n.z * n.z);
        let k = 1.0 / a.sqrt();
        let p = Vec3A::new(0.0, -n.z * k, n.y * k);
        (p, Vec3A::new(a * k, -n.x * p.z, n.x * p.y))
    } else {
        // choose p in x-y plane
        let a = n.x.mul_add(n.x, n.y * n.y);
        let k = 1.0 / a.sqrt();
        let p = Vec3A::new(-n.y * k, n.x * k, 0.0);
        (p, Vec3A::new(-n.z * p.y, n.z * p.x, a * k))
    }
}
