//! Stable identifiers
//!
//! [`PrototypeId`] is the identity key the entity pool segregates its stacks
//! by. [`ColliderId`] and [`NodeId`] are opaque handles owned by the host
//! engine (collision surfaces and transform nodes); this crate never
//! interprets their bits.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// Identity of a registered prototype asset
///
/// Two prototypes never share an id, even when structurally identical.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PrototypeId(u64);

impl PrototypeId {
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for PrototypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrototypeId({})", self.0)
    }
}

impl fmt::Display for PrototypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Collision surface handle supplied by the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColliderId(pub u64);

/// Transform node handle supplied by the engine (used as a parent)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u64);

impl fmt::Display for ColliderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "collider:{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

/// Thread-safe generator of monotonically increasing raw ids
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    pub const fn new() -> Self {
        Self::starting_at(1)
    }

    pub const fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    pub fn next_raw(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    pub fn next_prototype(&self) -> PrototypeId {
        PrototypeId(self.next_raw())
    }

    pub fn next_collider(&self) -> ColliderId {
        ColliderId(self.next_raw())
    }

    pub fn next_node(&self) -> NodeId {
        NodeId(self.next_raw())
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_never_repeats() {
        let gen = IdGenerator::new();
        let a = gen.next_prototype();
        let b = gen.next_prototype();
        assert_ne!(a, b);
        assert_eq!(b.raw(), a.raw() + 1);
    }

    #[test]
    fn test_kinds_share_one_sequence() {
        let gen = IdGenerator::starting_at(10);
        assert_eq!(gen.next_collider(), ColliderId(10));
        assert_eq!(gen.next_node(), NodeId(11));
        assert_eq!(gen.next_prototype().raw(), 12);
    }
}
