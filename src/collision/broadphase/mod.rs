use std::cell::RefCell;
use std::rc::Rc;

use crate::collision::dispatch::{
    self,
    query::{CollisionRequest, CollisionResult, DistanceRequest, DistanceResult},
};
use crate::collision_object::CollisionObject;
use crate::error::QueryError;

pub mod dynamic_tree;
pub mod manager;

/// Consumer of candidate pairs produced by a collide traversal.
///
/// Returning `Ok(false)` terminates the traversal immediately; the
/// consumer controls termination by stopping, so there is no completion
/// flag to forget to reset between queries.
pub trait CollideVisitor {
    fn visit(
        &mut self,
        obj_a: &Rc<RefCell<CollisionObject>>,
        obj_b: &Rc<RefCell<CollisionObject>>,
    ) -> Result<bool, QueryError>;
}

/// Consumer of candidate pairs produced by a distance traversal.
///
/// `bound()` exposes the best distance seen so far; the traversal prunes
/// every subtree pair whose box distance already reaches it, which is the
/// only early exit a minimum query can take without losing the true
/// minimum.
pub trait DistanceVisitor {
    fn visit(
        &mut self,
        obj_a: &Rc<RefCell<CollisionObject>>,
        obj_b: &Rc<RefCell<CollisionObject>>,
    ) -> Result<bool, QueryError>;

    fn bound(&self) -> f32;
}

/// Default collide visitor: one request/result pair, narrow phase per
/// candidate, stop at the contact cap.
#[derive(Debug, Default)]
pub struct CollisionData {
    pub request: CollisionRequest,
    pub result: CollisionResult,
}

impl CollisionData {
    #[must_use]
    pub fn new(request: CollisionRequest) -> Self {
        Self {
            request,
            result: CollisionResult::new(),
        }
    }

    /// Clear the accumulator for reuse in another query.
    pub fn reset(&mut self) {
        self.result.clear();
    }
}

impl CollideVisitor for CollisionData {
    fn visit(
        &mut self,
        obj_a: &Rc<RefCell<CollisionObject>>,
        obj_b: &Rc<RefCell<CollisionObject>>,
    ) -> Result<bool, QueryError> {
        let obj_a = obj_a.borrow();
        let obj_b = obj_b.borrow();
        dispatch::collide(&obj_a, &obj_b, &self.request, &mut self.result)?;

        if !self.request.enable_contact && self.result.is_collision() {
            // boolean query answered
            return Ok(false);
        }
        Ok(self.result.num_contacts() < self.request.max_contacts)
    }
}

/// Default distance visitor: folds the running minimum over every
/// candidate pair and feeds it back as the prune bound.
#[derive(Debug, Default)]
pub struct DistanceData {
    pub request: DistanceRequest,
    pub result: DistanceResult,
}

impl DistanceData {
    #[must_use]
    pub fn new(request: DistanceRequest) -> Self {
        Self {
            request,
            result: DistanceResult::new(),
        }
    }

    pub fn reset(&mut self) {
        self.result.clear();
    }
}

impl DistanceVisitor for DistanceData {
    fn visit(
        &mut self,
        obj_a: &Rc<RefCell<CollisionObject>>,
        obj_b: &Rc<RefCell<CollisionObject>>,
    ) -> Result<bool, QueryError> {
        let obj_a = obj_a.borrow();
        let obj_b = obj_b.borrow();
        dispatch::distance(&obj_a, &obj_b, &self.request, &mut self.result)?;
        Ok(true)
    }

    fn bound(&self) -> f32 {
        self.result.min_distance
    }
}
