use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Quat, Vec3A};

use crate::collision::shapes::Geometry;
use crate::linear_math::{Isometry, aabb::Aabb};

/// Identity of a [`CollisionObject`]. Two objects sharing one geometry still
/// have distinct ids, so query results name the object, not the shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(0);

impl ObjectId {
    fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A shared immutable [`Geometry`] placed in the world by a mutable pose.
///
/// The world-space bounding box is cached and recomputed on every pose
/// mutation, so it is never stale.
pub struct CollisionObject {
    id: ObjectId,
    geometry: Rc<Geometry>,
    transform: Isometry,
    aabb: Aabb,
}

impl CollisionObject {
    #[must_use]
    pub fn new(geometry: Rc<Geometry>) -> Self {
        Self::with_transform(geometry, Isometry::IDENTITY)
    }

    #[must_use]
    pub fn with_transform(geometry: Rc<Geometry>, transform: Isometry) -> Self {
        let aabb = geometry
            .local_aabb()
            .transformed_by(&transform.to_affine());

        Self {
            id: ObjectId::next(),
            geometry,
            transform,
            aabb,
        }
    }

    #[inline]
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[must_use]
    pub fn geometry_handle(&self) -> Rc<Geometry> {
        Rc::clone(&self.geometry)
    }

    #[inline]
    #[must_use]
    pub const fn transform(&self) -> &Isometry {
        &self.transform
    }

    /// World-space bounding box of the geometry under the current pose.
    #[inline]
    #[must_use]
    pub const fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    pub fn set_transform(&mut self, transform: Isometry) {
        self.transform = transform;
        self.refresh_aabb();
    }

    pub fn set_translation(&mut self, translation: Vec3A) {
        self.transform.set_translation(translation);
        self.refresh_aabb();
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.transform.set_rotation(rotation);
        self.refresh_aabb();
    }

    fn refresh_aabb(&mut self) {
        self.aabb = self
            .geometry
            .local_aabb()
            .transformed_by(&self.transform.to_affine());
    }
}
