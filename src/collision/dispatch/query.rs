use glam::Vec3A;

use crate::collision_object::ObjectId;
use crate::linear_math::aabb::Aabb;

/// Touch threshold shared by the discrete queries: separations at or below
/// it count as contact.
pub const DEFAULT_CONTACT_TOLERANCE: f32 = 1e-5;

/// Configuration of a discrete collision query.
#[derive(Clone, Copy, Debug)]
pub struct CollisionRequest {
    /// Stop generating contacts once this many have accumulated.
    pub max_contacts: usize,
    /// When off, only the boolean outcome is computed and no contact
    /// geometry is produced.
    pub enable_contact: bool,
    /// Collect AABB-overlap cost regions for colliding pairs.
    pub enable_cost: bool,
    pub num_max_cost_sources: usize,
    /// Separations at or below this count as touching.
    pub tolerance: f32,
}

impl Default for CollisionRequest {
    fn default() -> Self {
        Self {
            max_contacts: 1,
            enable_contact: true,
            enable_cost: false,
            num_max_cost_sources: 1,
            tolerance: DEFAULT_CONTACT_TOLERANCE,
        }
    }
}

/// A single contact record. The normal points from `object_a`'s surface
/// toward `object_b`.
#[derive(Clone, Copy, Debug)]
pub struct Contact {
    pub object_a: ObjectId,
    pub object_b: ObjectId,
    pub position: Vec3A,
    pub normal: Vec3A,
    pub penetration_depth: f32,
}

/// An AABB-overlap region with a traversal cost density.
#[derive(Clone, Copy, Debug)]
pub struct CostSource {
    pub aabb_min: Vec3A,
    pub aabb_max: Vec3A,
    pub cost_density: f32,
}

impl CostSource {
    #[must_use]
    pub fn from_overlap(region: Aabb, cost_density: f32) -> Self {
        Self {
            aabb_min: region.min,
            aabb_max: region.max,
            cost_density,
        }
    }
}

/// Accumulator of a discrete collision query. Reusable across queries
/// after [`CollisionResult::clear`].
#[derive(Clone, Debug, Default)]
pub struct CollisionResult {
    collision: bool,
    contacts: Vec<Contact>,
    cost_sources: Vec<CostSource>,
}

impl CollisionResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub const fn is_collision(&self) -> bool {
        self.collision
    }

    #[inline]
    #[must_use]
    pub fn num_contacts(&self) -> usize {
        self.contacts.len()
    }

    #[must_use]
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    #[must_use]
    pub fn cost_sources(&self) -> &[CostSource] {
        &self.cost_sources
    }

    pub fn clear(&mut self) {
        self.collision = false;
        self.contacts.clear();
        self.cost_sources.clear();
    }

    pub(crate) fn set_collision(&mut self) {
        self.collision = true;
    }

    pub(crate) fn add_contact(&mut self, contact: Contact) {
        self.collision = true;
        self.contacts.push(contact);
    }

    pub(crate) fn add_cost_source(&mut self, source: CostSource, cap: usize) {
        if self.cost_sources.len() < cap {
            self.cost_sources.push(source);
        }
    }
}

/// Configuration of a minimum-distance query.
#[derive(Clone, Copy, Debug)]
pub struct DistanceRequest {
    /// Record the nearest point pair, not just the scalar distance.
    pub enable_nearest_points: bool,
    /// Relative convergence tolerance of the support-mapping descent.
    pub rel_err: f32,
    /// Absolute convergence tolerance of the support-mapping descent.
    pub abs_err: f32,
    pub max_iterations: usize,
}

impl Default for DistanceRequest {
    fn default() -> Self {
        Self {
            enable_nearest_points: true,
            rel_err: 1e-5,
            abs_err: 1e-9,
            max_iterations: 128,
        }
    }
}

/// Accumulator of a minimum-distance query. `min_distance` is negative
/// (the penetration depth, negated) when the pair overlaps; callers must
/// treat a negative value as "in collision", not as an error.
#[derive(Clone, Copy, Debug)]
pub struct DistanceResult {
    pub min_distance: f32,
    pub nearest_points: [Vec3A; 2],
    pub object_a: Option<ObjectId>,
    pub object_b: Option<ObjectId>,
}

impl Default for DistanceResult {
    fn default() -> Self {
        Self {
            min_distance: f32::INFINITY,
            nearest_points: [Vec3A::ZERO; 2],
            object_a: None,
            object_b: None,
        }
    }
}

impl DistanceResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn update(
        &mut self,
        distance: f32,
        points: Option<[Vec3A; 2]>,
        object_a: ObjectId,
        object_b: ObjectId,
    ) {
        if distance < self.min_distance {
            self.min_distance = distance;
            if let Some(points) = points {
                self.nearest_points = points;
            }
            self.object_a = Some(object_a);
            self.object_b = Some(object_b);
        }
    }
}

/// Configuration of a continuous (swept) collision query.
#[derive(Clone, Copy, Debug)]
pub struct ContinuousCollisionRequest {
    pub max_iterations: usize,
    /// Separations at or below this terminate the advancement as contact.
    pub toi_tolerance: f32,
}

impl Default for ContinuousCollisionRequest {
    fn default() -> Self {
        Self {
            max_iterations: 64,
            toi_tolerance: 1e-4,
        }
    }
}

/// Accumulator of a continuous collision query. `time_of_contact` is 1.0
/// when the swept motion is contact-free, 0.0 when the bodies already
/// overlap at the start, and strictly inside (0, 1) otherwise.
#[derive(Clone, Copy, Debug)]
pub struct ContinuousCollisionResult {
    pub time_of_contact: f32,
    pub is_collide: bool,
}

impl Default for ContinuousCollisionResult {
    fn default() -> Self {
        Self {
            time_of_contact: 1.0,
            is_collide: false,
        }
    }
}

impl ContinuousCollisionResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
