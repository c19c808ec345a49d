use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;
use log::debug;

use super::dynamic_tree::{DynamicAabbTree, NO_NODE, TreeNode, TreeNodeKind};
use super::{CollideVisitor, DistanceVisitor};
use crate::collision_object::{CollisionObject, ObjectId};
use crate::error::QueryError;
use crate::linear_math::aabb::Aabb;

/// Where the manager's tree stands relative to its registered set.
///
/// Membership changes move a built manager to `Stale`; queries are only
/// served in `Built` (or trivially in `Empty`) and fail loudly otherwise.
/// Pose mutation of a registered object is invisible to the manager, so
/// the documented discipline is to call [`DynamicAabbTreeManager::setup`]
/// or [`DynamicAabbTreeManager::update`] after moving objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManagerState {
    Empty,
    Populated,
    Built,
    Stale,
}

/// Broadphase manager over shared collision objects, indexed by a dynamic
/// AABB tree. Traversals enumerate candidate leaf pairs whose boxes
/// overlap and hand them to a caller-supplied visitor; the visitor's
/// return value terminates the traversal early.
#[derive(Default)]
pub struct DynamicAabbTreeManager {
    objects: Vec<Rc<RefCell<CollisionObject>>>,
    slot_by_id: AHashMap<ObjectId, usize>,
    leaf_by_slot: Vec<usize>,
    tree: DynamicAabbTree,
    state: ManagerState,
}

impl Default for ManagerState {
    fn default() -> Self {
        Self::Empty
    }
}

impl DynamicAabbTreeManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            slot_by_id: AHashMap::new(),
            leaf_by_slot: Vec::new(),
            tree: DynamicAabbTree::new(),
            state: ManagerState::Empty,
        }
    }

    #[inline]
    #[must_use]
    pub const fn state(&self) -> ManagerState {
        self.state
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    #[must_use]
    pub fn objects(&self) -> &[Rc<RefCell<CollisionObject>>] {
        &self.objects
    }

    /// Add one object to the pending set. The tree is not touched; call
    /// [`Self::setup`] or [`Self::update`] before querying. Registering an
    /// already-present object is a no-op.
    pub fn register_object(&mut self, object: &Rc<RefCell<CollisionObject>>) {
        let id = object.borrow().id();
        if self.slot_by_id.contains_key(&id) {
            return;
        }

        self.slot_by_id.insert(id, self.objects.len());
        self.objects.push(Rc::clone(object));
        self.leaf_by_slot.push(NO_NODE);

        self.state = match self.state {
            ManagerState::Empty | ManagerState::Populated => ManagerState::Populated,
            ManagerState::Built | ManagerState::Stale => ManagerState::Stale,
        };
    }

    /// Bulk registration.
    pub fn register_objects(&mut self, objects: &[Rc<RefCell<CollisionObject>>]) {
        for object in objects {
            self.register_object(object);
        }
    }

    /// Drop an object from the manager. Returns whether it was present.
    pub fn unregister_object(&mut self, id: ObjectId) -> bool {
        let Some(slot) = self.slot_by_id.remove(&id) else {
            return false;
        };

        let leaf = self.leaf_by_slot[slot];
        if leaf != NO_NODE {
            self.tree.remove(leaf);
        }

        self.objects.swap_remove(slot);
        self.leaf_by_slot.swap_remove(slot);

        // the displaced tail object now lives in `slot`
        if slot < self.objects.len() {
            let moved_id = self.objects[slot].borrow().id();
            self.slot_by_id.insert(moved_id, slot);
            if self.leaf_by_slot[slot] != NO_NODE {
                self.tree.set_leaf_slot(self.leaf_by_slot[slot], slot);
            }
        }

        self.state = if self.objects.is_empty() {
            ManagerState::Empty
        } else {
            match self.state {
                ManagerState::Built | ManagerState::Stale => ManagerState::Stale,
                populated => populated,
            }
        };

        true
    }

    /// Forget every object and drop the tree.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.slot_by_id.clear();
        self.leaf_by_slot.clear();
        self.tree.clear();
        self.state = ManagerState::Empty;
    }

    /// Rebuild the tree from scratch over the objects' current boxes.
    pub fn setup(&mut self) {
        let mut leaves: Vec<(usize, Aabb)> = self
            .objects
            .iter()
            .enumerate()
            .map(|(slot, object)| (slot, *object.borrow().aabb()))
            .collect();

        self.tree.rebuild(&mut leaves);

        self.leaf_by_slot.fill(NO_NODE);
        let leaf_by_slot = &mut self.leaf_by_slot;
        self.tree.for_each_leaf(&mut |slot, node| {
            leaf_by_slot[slot] = node;
        });

        self.state = if self.objects.is_empty() {
            ManagerState::Empty
        } else {
            ManagerState::Built
        };

        debug!("manager setup complete over {} objects", self.objects.len());
    }

    /// Incremental alternative to [`Self::setup`]: re-insert only the
    /// leaves whose object box moved since the tree last saw them, and
    /// insert leaves for newly registered objects.
    pub fn update(&mut self) {
        let mut moved = 0usize;
        for slot in 0..self.objects.len() {
            let current = *self.objects[slot].borrow().aabb();
            let leaf = self.leaf_by_slot[slot];

            if leaf == NO_NODE {
                self.leaf_by_slot[slot] = self.tree.insert(slot, current);
                moved += 1;
            } else if self.tree.node(leaf).aabb != current {
                self.tree.remove(leaf);
                self.leaf_by_slot[slot] = self.tree.insert(slot, current);
                moved += 1;
            }
        }

        self.state = if self.objects.is_empty() {
            ManagerState::Empty
        } else {
            ManagerState::Built
        };

        debug!(
            "manager update complete: {moved} of {} leaves re-inserted",
            self.objects.len()
        );
    }

    fn check_queryable(&self) -> Result<(), QueryError> {
        match self.state {
            ManagerState::Empty | ManagerState::Built => Ok(()),
            state => Err(QueryError::StaleTraversal(state)),
        }
    }

    fn node(&self, index: usize) -> &TreeNode {
        self.tree.node(index)
    }

    /// One-to-many collide: every registered object whose box overlaps the
    /// external object's box is paired with it through the visitor.
    pub fn collide_with<V: CollideVisitor>(
        &self,
        external: &Rc<RefCell<CollisionObject>>,
        visitor: &mut V,
    ) -> Result<(), QueryError> {
        self.check_queryable()?;
        if self.tree.root() == NO_NODE {
            return Ok(());
        }

        let external_aabb = *external.borrow().aabb();
        self.collide_one_recurse(self.tree.root(), &external_aabb, external, visitor)
            .map(|_| ())
    }

    fn collide_one_recurse<V: CollideVisitor>(
        &self,
        index: usize,
        external_aabb: &Aabb,
        external: &Rc<RefCell<CollisionObject>>,
        visitor: &mut V,
    ) -> Result<bool, QueryError> {
        let node = self.node(index);
        if !node.aabb.intersects(external_aabb) {
            return Ok(true);
        }

        match node.kind {
            TreeNodeKind::Leaf { slot } => {
                let object = &self.objects[slot];
                if Rc::ptr_eq(object, external) {
                    return Ok(true);
                }
                visitor.visit(object, external)
            }
            TreeNodeKind::Branch { left, right } => {
                if !self.collide_one_recurse(left, external_aabb, external, visitor)? {
                    return Ok(false);
                }
                self.collide_one_recurse(right, external_aabb, external, visitor)
            }
            TreeNodeKind::Free { .. } => unreachable!("traversal reached a freed node"),
        }
    }

    /// Internal many-to-many collide: every unordered pair of distinct
    /// registered objects with overlapping boxes is visited exactly once.
    pub fn collide<V: CollideVisitor>(&self, visitor: &mut V) -> Result<(), QueryError> {
        self.check_queryable()?;
        if self.tree.root() == NO_NODE {
            return Ok(());
        }

        self.collide_pair_recurse(self.tree.root(), self.tree.root(), visitor)
            .map(|_| ())
    }

    fn collide_pair_recurse<V: CollideVisitor>(
        &self,
        i: usize,
        j: usize,
        visitor: &mut V,
    ) -> Result<bool, QueryError> {
        if i == j {
            // one subtree against itself: pairs inside each child plus the
            // cross pairs, never a leaf against itself
            return match self.node(i).kind {
                TreeNodeKind::Leaf { .. } => Ok(true),
                TreeNodeKind::Branch { left, right } => {
                    if !self.collide_pair_recurse(left, left, visitor)? {
                        return Ok(false);
                    }
                    if !self.collide_pair_recurse(right, right, visitor)? {
                        return Ok(false);
                    }
                    self.collide_pair_recurse(left, right, visitor)
                }
                TreeNodeKind::Free { .. } => unreachable!("traversal reached a freed node"),
            };
        }

        let node_i = self.node(i);
        let node_j = self.node(j);
        if !node_i.aabb.intersects(&node_j.aabb) {
            return Ok(true);
        }

        match (node_i.kind, node_j.kind) {
            (TreeNodeKind::Leaf { slot: a }, TreeNodeKind::Leaf { slot: b }) => {
                visitor.visit(&self.objects[a], &self.objects[b])
            }
            (TreeNodeKind::Branch { left, right }, TreeNodeKind::Leaf { .. }) => {
                if !self.collide_pair_recurse(left, j, visitor)? {
                    return Ok(false);
                }
                self.collide_pair_recurse(right, j, visitor)
            }
            (_, TreeNodeKind::Branch { left, right }) => {
                if !self.collide_pair_recurse(i, left, visitor)? {
                    return Ok(false);
                }
                self.collide_pair_recurse(i, right, visitor)
            }
            _ => unreachable!("traversal reached a freed node"),
        }
    }

    /// Group many-to-many collide: cross-traversal of two managers' trees.
    pub fn collide_with_manager<V: CollideVisitor>(
        &self,
        other: &Self,
        visitor: &mut V,
    ) -> Result<(), QueryError> {
        self.check_queryable()?;
        other.check_queryable()?;
        if self.tree.root() == NO_NODE || other.tree.root() == NO_NODE {
            return Ok(());
        }

        self.cross_collide_recurse(self.tree.root(), other, other.tree.root(), visitor)
            .map(|_| ())
    }

    fn cross_collide_recurse<V: CollideVisitor>(
        &self,
        i: usize,
        other: &Self,
        j: usize,
        visitor: &mut V,
    ) -> Result<bool, QueryError> {
        let node_i = self.node(i);
        let node_j = other.node(j);
        if !node_i.aabb.intersects(&node_j.aabb) {
            return Ok(true);
        }

        match (node_i.kind, node_j.kind) {
            (TreeNodeKind::Leaf { slot: a }, TreeNodeKind::Leaf { slot: b }) => {
                let obj_a = &self.objects[a];
                let obj_b = &other.objects[b];
                if Rc::ptr_eq(obj_a, obj_b) {
                    return Ok(true);
                }
                visitor.visit(obj_a, obj_b)
            }
            (TreeNodeKind::Branch { left, right }, TreeNodeKind::Leaf { .. }) => {
                if !self.cross_collide_recurse(left, other, j, visitor)? {
                    return Ok(false);
                }
                self.cross_collide_recurse(right, other, j, visitor)
            }
            (_, TreeNodeKind::Branch { left, right }) => {
                if !self.cross_collide_recurse(i, other, left, visitor)? {
                    return Ok(false);
                }
                self.cross_collide_recurse(i, other, right, visitor)
            }
            _ => unreachable!("traversal reached a freed node"),
        }
    }

    /// One-to-many distance: fold the visitor over every candidate whose
    /// subtree could still beat the visitor's current bound.
    pub fn distance_with<V: DistanceVisitor>(
        &self,
        external: &Rc<RefCell<CollisionObject>>,
        visitor: &mut V,
    ) -> Result<(), QueryError> {
        self.check_queryable()?;
        if self.tree.root() == NO_NODE {
            return Ok(());
        }

        let external_aabb = *external.borrow().aabb();
        self.distance_one_recurse(self.tree.root(), &external_aabb, external, visitor)
            .map(|_| ())
    }

    fn distance_one_recurse<V: DistanceVisitor>(
        &self,
        index: usize,
        external_aabb: &Aabb,
        external: &Rc<RefCell<CollisionObject>>,
        visitor: &mut V,
    ) -> Result<bool, QueryError> {
        let node = self.node(index);
        if node.aabb.distance(external_aabb) >= visitor.bound() {
            return Ok(true);
        }

        match node.kind {
            TreeNodeKind::Leaf { slot } => {
                let object = &self.objects[slot];
                if Rc::ptr_eq(object, external) {
                    return Ok(true);
                }
                visitor.visit(object, external)
            }
            TreeNodeKind::Branch { left, right } => {
                // nearer child first tightens the bound sooner
                let d_left = self.node(left).aabb.distance(external_aabb);
                let d_right = self.node(right).aabb.distance(external_aabb);
                let (first, second) = if d_left <= d_right {
                    (left, right)
                } else {
                    (right, left)
                };

                if !self.distance_one_recurse(first, external_aabb, external, visitor)? {
                    return Ok(false);
                }
                self.distance_one_recurse(second, external_aabb, external, visitor)
            }
            TreeNodeKind::Free { .. } => unreachable!("traversal reached a freed node"),
        }
    }

    /// Internal many-to-many distance over distinct registered pairs.
    pub fn distance<V: DistanceVisitor>(&self, visitor: &mut V) -> Result<(), QueryError> {
        self.check_queryable()?;
        if self.tree.root() == NO_NODE {
            return Ok(());
        }

        self.distance_pair_recurse(self.tree.root(), self.tree.root(), visitor)
            .map(|_| ())
    }

    fn distance_pair_recurse<V: DistanceVisitor>(
        &self,
        i: usize,
        j: usize,
        visitor: &mut V,
    ) -> Result<bool, QueryError> {
        if i == j {
            return match self.node(i).kind {
                TreeNodeKind::Leaf { .. } => Ok(true),
                TreeNodeKind::Branch { left, right } => {
                    if !self.distance_pair_recurse(left, left, visitor)? {
                        return Ok(false);
                    }
                    if !self.distance_pair_recurse(right, right, visitor)? {
                        return Ok(false);
                    }
                    self.distance_pair_recurse(left, right, visitor)
                }
                TreeNodeKind::Free { .. } => unreachable!("traversal reached a freed node"),
            };
        }

        let node_i = self.node(i);
        let node_j = self.node(j);
        if node_i.aabb.distance(&node_j.aabb) >= visitor.bound() {
            return Ok(true);
        }

        match (node_i.kind, node_j.kind) {
            (TreeNodeKind::Leaf { slot: a }, TreeNodeKind::Leaf { slot: b }) => {
                visitor.visit(&self.objects[a], &self.objects[b])
            }
            (TreeNodeKind::Branch { left, right }, TreeNodeKind::Leaf { .. }) => {
                if !self.distance_pair_recurse(left, j, visitor)? {
                    return Ok(false);
                }
                self.distance_pair_recurse(right, j, visitor)
            }
            (_, TreeNodeKind::Branch { left, right }) => {
                if !self.distance_pair_recurse(i, left, visitor)? {
                    return Ok(false);
                }
                self.distance_pair_recurse(i, right, visitor)
            }
            _ => unreachable!("traversal reached a freed node"),
        }
    }

    /// Group many-to-many distance across two managers.
    pub fn distance_with_manager<V: DistanceVisitor>(
        &self,
        other: &Self,
        visitor: &mut V,
    ) -> Result<(), QueryError> {
        self.check_queryable()?;
        other.check_queryable()?;
        if self.tree.root() == NO_NODE || other.tree.root() == NO_NODE {
            return Ok(());
        }

        self.cross_distance_recurse(self.tree.root(), other, other.tree.root(), visitor)
            .map(|_| ())
    }

    fn cross_distance_recurse<V: DistanceVisitor>(
        &self,
        i: usize,
        other: &Self,
        j: usize,
        visitor: &mut V,
    ) -> Result<bool, QueryError> {
        let node_i = self.node(i);
        let node_j = other.node(j);
        if node_i.aabb.distance(&node_j.aabb) >= visitor.bound() {
            return Ok(true);
        }

        match (node_i.kind, node_j.kind) {
            (TreeNodeKind::Leaf { slot: a }, TreeNodeKind::Leaf { slot: b }) => {
                let obj_a = &self.objects[a];
                let obj_b = &other.objects[b];
                if Rc::ptr_eq(obj_a, obj_b) {
                    return Ok(true);
                }
                visitor.visit(obj_a, obj_b)
            }
            (TreeNodeKind::Branch { left, right }, TreeNodeKind::Leaf { .. }) => {
                if !self.cross_distance_recurse(left, other, j, visitor)? {
                    return Ok(false);
                }
                self.cross_distance_recurse(right, other, j, visitor)
            }
            (_, TreeNodeKind::Branch { left, right }) => {
                if !self.cross_distance_recurse(i, other, left, visitor)? {
                    return Ok(false);
                }
                self.cross_distance_recurse(i, other, right, visitor)
            }
            _ => unreachable!("traversal reached a freed node"),
        }
    }
}
