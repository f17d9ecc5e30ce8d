//! # rampart_core - Rampart Core
//!
//! Primitives shared by every Rampart crate (no required dependencies):
//! - **Handles**: generational, non-owning references into slot storage
//! - **Ids**: stable prototype identities and opaque engine handles
//! - **Schedule**: resumable sequences with named wait-points and cancellation
//!
//! Everything here assumes the host drives a single logical thread of
//! gameplay; the few shared pieces (task cancellation flags, id generation)
//! are atomics so handles may still cross threads.

pub mod error;
pub mod handle;
pub mod id;
pub mod schedule;

pub use error::*;
pub use handle::*;
pub use id::*;
pub use schedule::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::HandleError;
    pub use crate::handle::{Handle, HandleMap};
    pub use crate::id::{ColliderId, IdGenerator, NodeId, PrototypeId};
    pub use crate::schedule::{Scheduled, Scheduler, Sequence, Step, TaskHandle, Tick, WaitPoint};
}
