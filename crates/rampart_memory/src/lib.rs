//! # rampart_memory - Recycling Pools
//!
//! Allocation-free steady state for the combat loop:
//! - EventPool: free list of transaction records with a scoped return guard
//! - EntityPool: prototype-keyed object pool for transient entities
//!
//! Both pools are single-writer structures. `EventPool` sits behind a
//! `parking_lot::Mutex` so its guards can outlive a borrow of the owner;
//! `EntityPool` is plain data reached through `&mut`.

pub mod free_list;
pub mod pool;

pub use free_list::{EventPool, EventPoolStats, Pooled, Recycle};
pub use pool::{EntityPool, EntityPoolStats, PoolHandle, Poolable, PooledEntity, Pose};

use rampart_core::PrototypeId;
use thiserror::Error;

/// Pool errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Unknown prototype: {0}")]
    UnknownPrototype(PrototypeId),
}

pub type Result<T> = std::result::Result<T, PoolError>;
