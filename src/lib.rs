//! Proximity and collision reasoning over rigid geometric models:
//! discrete collision detection, minimum-distance computation and
//! continuous (swept) collision detection across heterogeneous shape
//! types, plus a dynamic-AABB-tree broadphase for scalable many-object
//! queries.
//!
//! All queries are synchronous and single-threaded by contract; shared
//! state uses `Rc`/`RefCell` and is deliberately not `Send`.

pub mod collision;
pub mod collision_object;
pub mod error;
pub mod linear_math;

pub use collision::broadphase::manager::{DynamicAabbTreeManager, ManagerState};
pub use collision::broadphase::{CollideVisitor, CollisionData, DistanceData, DistanceVisitor};
pub use collision::dispatch::query::{
    CollisionRequest, CollisionResult, Contact, ContinuousCollisionRequest,
    ContinuousCollisionResult, CostSource, DistanceRequest, DistanceResult,
};
pub use collision::dispatch::{collide, continuous_collide, distance};
pub use collision::shapes::{
    BoxShape, CapsuleShape, ConeShape, CylinderShape, EllipsoidShape, Geometry, HalfspaceShape,
    PlaneShape, SphereShape, TriangleMeshShape, TriangleShape,
};
pub use collision_object::{CollisionObject, ObjectId};
pub use error::QueryError;
pub use linear_math::{Isometry, aabb::Aabb};
