use glam::{Affine3A, Vec3A};
use std::ops::{Add, AddAssign};

/// An axis-aligned bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub min: Vec3A,
    pub max: Vec3A,
}

impl Aabb {
    pub const ZERO: Self = Self {
        min: Vec3A::ZERO,
        max: Vec3A::ZERO,
    };

    /// An empty box that is the identity of `+`: any union with it yields the
    /// other operand.
    pub const INVERTED: Self = Self {
        min: Vec3A::INFINITY,
        max: Vec3A::NEG_INFINITY,
    };

    #[inline]
    #[must_use]
    pub const fn new(min: Vec3A, max: Vec3A) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn from_points(points: &[Vec3A]) -> Self {
        points.iter().fold(Self::INVERTED, |aabb, &p| Self {
            min: aabb.min.min(p),
            max: aabb.max.max(p),
        })
    }

    #[inline]
    #[must_use]
    pub fn center(&self) -> Vec3A {
        (self.min + self.max) * 0.5
    }

    #[inline]
    #[must_use]
    pub fn half_extents(&self) -> Vec3A {
        (self.max - self.min) * 0.5
    }

    #[must_use]
    pub fn area(&self) -> f32 {
        let extents = self.max - self.min;
        2.0 * (extents.x * extents.y + extents.x * extents.z + extents.y * extents.z)
    }

    #[inline]
    #[must_use]
    pub fn intersects(&self, rhs: &Self) -> bool {
        self.min.cmple(rhs.max).all() && self.max.cmpge(rhs.min).all()
    }

    /// Lower bound on the distance between any point of `self` and any point
    /// of `rhs`. Zero when the boxes overlap.
    #[must_use]
    pub fn distance(&self, rhs: &Self) -> f32 {
        let gap = (rhs.min - self.max).max(self.min - rhs.max).max(Vec3A::ZERO);
        gap.length()
    }

    /// The box covering this box under a rigid transform, via the
    /// absolute-rotation extent bound.
    #[must_use]
    pub fn transformed_by(&self, t: &Affine3A) -> Self {
        let center = t.transform_point3a(self.center());
        let extent = t.matrix3.abs() * self.half_extents();

        Self {
            min: center - extent,
            max: center + extent,
        }
    }

    /// Intersection region of two overlapping boxes.
    #[must_use]
    pub fn overlap_region(&self, rhs: &Self) -> Self {
        Self {
            min: self.min.max(rhs.min),
            max: self.max.min(rhs.max),
        }
    }
}

impl Add for Aabb {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            min: self.min.min(rhs.min),
            max: self.max.max(rhs.max),
        }
    }
}

impl AddAssign for Aabb {
    fn add_assign(&mut self, rhs: Self) {
        self.min = self.min.min(rhs.min);
        self.max = self.max.max(rhs.max);
    }
}
