//! Entity pool - prototype-keyed recycling of transient entities
//!
//! Projectiles and explosions are spawned and retired many times a second.
//! [`EntityPool`] keeps one stack of inactive instances per prototype: a
//! spawn pops and restores an instance when one is waiting and only clones
//! the prototype template when the stack is empty. Instances the pool did
//! not create carry no tag and are never pushed onto a stack.

use std::collections::HashMap;

use glam::Vec2;
use rampart_core::{Handle, HandleError, HandleMap, IdGenerator, NodeId, PrototypeId};

use crate::{PoolError, Result};

/// Entities the pool can recycle
pub trait Poolable: Clone {
    /// Reset every piece of state accumulated while active
    ///
    /// Called with the template the instance was cloned from, right before a
    /// recycled instance is handed out again.
    fn restore(&mut self, prototype: &Self);
}

/// Position and orientation in the plane
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pose {
    pub position: Vec2,
    /// Radians, counter-clockwise from +X
    pub rotation: f32,
}

impl Pose {
    pub fn new(position: Vec2, rotation: f32) -> Self {
        Self { position, rotation }
    }

    pub fn at(position: Vec2) -> Self {
        Self::new(position, 0.0)
    }

    /// Unit vector the pose faces
    pub fn forward(&self) -> Vec2 {
        Vec2::from_angle(self.rotation)
    }
}

/// An entity plus the bookkeeping the pool keeps for it
#[derive(Clone, Debug)]
pub struct PooledEntity<T> {
    pub entity: T,
    pub pose: Pose,
    parent: Option<NodeId>,
    active: bool,
    tag: Option<PrototypeId>,
}

impl<T> PooledEntity<T> {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Prototype this instance was created from, `None` for adopted entities
    pub fn tag(&self) -> Option<PrototypeId> {
        self.tag
    }
}

/// Handle to an entity owned by an [`EntityPool`]
pub type PoolHandle<T> = Handle<PooledEntity<T>>;

#[derive(Clone, Debug)]
struct Prototype<T> {
    name: String,
    template: T,
}

/// Pool statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntityPoolStats {
    pub prototypes: usize,
    pub live: usize,
    pub active: usize,
    pub pooled: usize,
}

/// Object pool keyed by prototype identity
pub struct EntityPool<T> {
    /// Node inactive instances are parented under
    node: NodeId,
    ids: IdGenerator,
    prototypes: HashMap<PrototypeId, Prototype<T>>,
    entities: HandleMap<PooledEntity<T>>,
    stacks: HashMap<PrototypeId, Vec<PoolHandle<T>>>,
    stack_capacity: usize,
}

impl<T: Poolable> EntityPool<T> {
    /// Minimum stack capacity reserved for each prototype
    pub const DEFAULT_STACK_CAPACITY: usize = 16;

    pub fn new(node: NodeId) -> Self {
        Self::with_stack_capacity(node, Self::DEFAULT_STACK_CAPACITY)
    }

    pub fn with_stack_capacity(node: NodeId, stack_capacity: usize) -> Self {
        Self {
            node,
            ids: IdGenerator::new(),
            prototypes: HashMap::new(),
            entities: HandleMap::new(),
            stacks: HashMap::new(),
            stack_capacity,
        }
    }

    /// The pool's own node
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Register a template; every registration gets a distinct identity
    pub fn register_prototype(&mut self, name: impl Into<String>, template: T) -> PrototypeId {
        let id = self.ids.next_prototype();
        let name = name.into();
        log::debug!("Registered prototype '{}' as {}", name, id);
        self.prototypes.insert(id, Prototype { name, template });
        id
    }

    pub fn prototype(&self, id: PrototypeId) -> Result<&T> {
        self.prototypes
            .get(&id)
            .map(|p| &p.template)
            .ok_or(PoolError::UnknownPrototype(id))
    }

    /// Mutable template access; instances spawned afterwards see the change
    pub fn prototype_mut(&mut self, id: PrototypeId) -> Result<&mut T> {
        self.prototypes
            .get_mut(&id)
            .map(|p| &mut p.template)
            .ok_or(PoolError::UnknownPrototype(id))
    }

    pub fn prototype_name(&self, id: PrototypeId) -> Option<&str> {
        self.prototypes.get(&id).map(|p| p.name.as_str())
    }

    /// Hand out an active instance of `prototype`
    ///
    /// A recycled instance is reposed, reparented and restored before it is
    /// activated; otherwise the template is cloned and tagged.
    pub fn spawn(
        &mut self,
        prototype: PrototypeId,
        pose: Pose,
        parent: Option<NodeId>,
    ) -> Result<PoolHandle<T>> {
        let proto = self
            .prototypes
            .get(&prototype)
            .ok_or(PoolError::UnknownPrototype(prototype))?;

        let stack = self
            .stacks
            .entry(prototype)
            .or_insert_with(|| Vec::with_capacity(self.stack_capacity));

        while let Some(handle) = stack.pop() {
            let Some(slot) = self.entities.get_mut(handle) else {
                // Destroyed while pooled
                continue;
            };
            slot.pose = pose;
            slot.parent = parent;
            slot.entity.restore(&proto.template);
            slot.active = true;
            return Ok(handle);
        }

        let handle = self.entities.insert(PooledEntity {
            entity: proto.template.clone(),
            pose,
            parent,
            active: true,
            tag: Some(prototype),
        });
        log::debug!(
            "Pool grew: new '{}' instance {} ({} live)",
            proto.name,
            handle,
            self.entities.len()
        );
        Ok(handle)
    }

    /// Return an instance to its prototype's stack
    ///
    /// Returns false when the entity was not created by this pool; such an
    /// entity is destroyed if `destroy_on_fail` is set. Releasing an instance
    /// that is already pooled is a no-op that reports success.
    pub fn release(&mut self, handle: PoolHandle<T>, destroy_on_fail: bool) -> bool {
        let node = self.node;
        let Some(slot) = self.entities.get_mut(handle) else {
            log::warn!("Release of unknown entity {}", handle);
            return false;
        };

        let Some(tag) = slot.tag else {
            if destroy_on_fail {
                log::debug!("Destroying untagged entity {}", handle);
                self.entities.remove(handle);
            }
            return false;
        };

        if !slot.active {
            return true;
        }

        slot.active = false;
        slot.parent = Some(node);
        let capacity = self.stack_capacity;
        self.stacks
            .entry(tag)
            .or_insert_with(|| Vec::with_capacity(capacity))
            .push(handle);
        true
    }

    /// Take ownership of an entity the pool did not create
    ///
    /// The entity is active and untagged: releasing it fails.
    pub fn adopt(&mut self, entity: T, pose: Pose, parent: Option<NodeId>) -> PoolHandle<T> {
        self.entities.insert(PooledEntity {
            entity,
            pose,
            parent,
            active: true,
            tag: None,
        })
    }

    /// Permanently remove an entity, pooled or not
    pub fn destroy(&mut self, handle: PoolHandle<T>) -> Option<T> {
        self.entities.remove(handle).map(|slot| slot.entity)
    }

    /// Destroy every instance; prototypes stay registered
    pub fn clear(&mut self) {
        self.entities.clear();
        self.stacks.values_mut().for_each(Vec::clear);
    }
}

impl<T> EntityPool<T> {
    pub fn get(&self, handle: PoolHandle<T>) -> Option<&PooledEntity<T>> {
        self.entities.get(handle)
    }

    pub fn get_mut(&mut self, handle: PoolHandle<T>) -> Option<&mut PooledEntity<T>> {
        self.entities.get_mut(handle)
    }

    pub fn try_get(&self, handle: PoolHandle<T>) -> std::result::Result<&PooledEntity<T>, HandleError> {
        self.entities.try_get(handle)
    }

    pub fn entity(&self, handle: PoolHandle<T>) -> Option<&T> {
        self.entities.get(handle).map(|slot| &slot.entity)
    }

    pub fn entity_mut(&mut self, handle: PoolHandle<T>) -> Option<&mut T> {
        self.entities.get_mut(handle).map(|slot| &mut slot.entity)
    }

    pub fn contains(&self, handle: PoolHandle<T>) -> bool {
        self.entities.contains(handle)
    }

    pub fn is_active(&self, handle: PoolHandle<T>) -> bool {
        self.entities.get(handle).map_or(false, |slot| slot.active)
    }

    /// Snapshot of every active instance
    pub fn active_handles(&self) -> Vec<PoolHandle<T>> {
        self.entities
            .iter()
            .filter(|(_, slot)| slot.active)
            .map(|(handle, _)| handle)
            .collect()
    }

    pub fn iter_active(&self) -> impl Iterator<Item = (PoolHandle<T>, &PooledEntity<T>)> {
        self.entities.iter().filter(|(_, slot)| slot.active)
    }

    /// Active instances parented under `node`
    pub fn count_children(&self, node: NodeId) -> usize {
        self.iter_active()
            .filter(|(_, slot)| slot.parent == Some(node))
            .count()
    }

    /// Inactive instances waiting on `prototype`'s stack
    pub fn pooled_count(&self, prototype: PrototypeId) -> usize {
        self.stacks.get(&prototype).map_or(0, Vec::len)
    }

    pub fn stats(&self) -> EntityPoolStats {
        let live = self.entities.len();
        let active = self.iter_active().count();
        EntityPoolStats {
            prototypes: self.prototypes.len(),
            live,
            active,
            pooled: live - active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Dart {
        velocity: Vec2,
        age: f32,
    }

    impl Poolable for Dart {
        fn restore(&mut self, prototype: &Self) {
            self.velocity = prototype.velocity;
            self.age = 0.0;
        }
    }

    fn pool_with_dart() -> (EntityPool<Dart>, PrototypeId) {
        let mut pool = EntityPool::new(NodeId(1));
        let dart = pool.register_prototype(
            "dart",
            Dart {
                velocity: Vec2::ZERO,
                age: 0.0,
            },
        );
        (pool, dart)
    }

    #[test]
    fn test_round_trip_reuses_instance() {
        let (mut pool, dart) = pool_with_dart();
        let first = pool.spawn(dart, Pose::default(), Some(NodeId(7))).unwrap();
        {
            let entity = pool.entity_mut(first).unwrap();
            entity.age = 1.5;
            entity.velocity = Vec2::new(3.0, 4.0);
        }

        assert!(pool.release(first, false));
        assert_eq!(pool.pooled_count(dart), 1);
        assert_eq!(pool.get(first).unwrap().parent(), Some(NodeId(1)));
        assert!(!pool.is_active(first));

        let pose = Pose::at(Vec2::new(10.0, 2.0));
        let second = pool.spawn(dart, pose, Some(NodeId(9))).unwrap();
        assert_eq!(second, first);
        let slot = pool.get(second).unwrap();
        assert_eq!(slot.entity.age, 0.0);
        assert_eq!(slot.entity.velocity, Vec2::ZERO);
        assert_eq!(slot.pose, pose);
        assert_eq!(slot.parent(), Some(NodeId(9)));
        assert!(slot.is_active());
        assert_eq!(pool.pooled_count(dart), 0);
    }

    #[test]
    fn test_identical_prototypes_do_not_share_stacks() {
        let (mut pool, dart) = pool_with_dart();
        let twin = pool.register_prototype(
            "dart",
            Dart {
                velocity: Vec2::ZERO,
                age: 0.0,
            },
        );
        assert_ne!(dart, twin);

        let a = pool.spawn(dart, Pose::default(), None).unwrap();
        pool.release(a, false);

        let b = pool.spawn(twin, Pose::default(), None).unwrap();
        assert_ne!(a, b);
        assert_eq!(pool.get(b).unwrap().tag(), Some(twin));
        assert_eq!(pool.pooled_count(dart), 1);
    }

    #[test]
    fn test_release_untagged() {
        let (mut pool, _) = pool_with_dart();
        let stray = Dart {
            velocity: Vec2::X,
            age: 0.0,
        };

        let kept = pool.adopt(stray.clone(), Pose::default(), None);
        assert!(!pool.release(kept, false));
        assert!(pool.contains(kept));

        let doomed = pool.adopt(stray, Pose::default(), None);
        assert!(!pool.release(doomed, true));
        assert!(!pool.contains(doomed));
    }

    #[test]
    fn test_double_release_pushes_once() {
        let (mut pool, dart) = pool_with_dart();
        let h = pool.spawn(dart, Pose::default(), None).unwrap();
        assert!(pool.release(h, false));
        assert!(pool.release(h, false));
        assert_eq!(pool.pooled_count(dart), 1);
    }

    #[test]
    fn test_unknown_prototype() {
        let (mut pool, _) = pool_with_dart();
        let bogus = PrototypeId::from_raw(999);
        assert!(matches!(
            pool.spawn(bogus, Pose::default(), None),
            Err(PoolError::UnknownPrototype(id)) if id == bogus
        ));
    }

    #[test]
    fn test_count_children_ignores_pooled() {
        let (mut pool, dart) = pool_with_dart();
        let enemies = NodeId(42);
        let a = pool.spawn(dart, Pose::default(), Some(enemies)).unwrap();
        let _b = pool.spawn(dart, Pose::default(), Some(enemies)).unwrap();
        assert_eq!(pool.count_children(enemies), 2);

        pool.release(a, false);
        assert_eq!(pool.count_children(enemies), 1);

        let stats = pool.stats();
        assert_eq!(stats.live, 2);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.pooled, 1);
    }
}
