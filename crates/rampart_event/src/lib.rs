//! # rampart_event - Event Delivery
//!
//! Two delivery styles:
//! - `Listeners<C, E>`: synchronous, priority-ordered subscriber lists.
//!   Handlers receive the owning context mutably so they may re-enter it
//!   (deal more damage, kill, spawn) before the outer call returns.
//! - `EventChannel<E>`: queued events pulled by consumers on their own
//!   schedule (UI, session bookkeeping).
//!
//! Dispatch always walks a snapshot of the subscriber list, so handlers may
//! subscribe or unsubscribe (themselves included) mid-dispatch. Changes take
//! effect from the next dispatch.

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};

/// Delivery priority
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Low = 0,
    Normal = 1,
    High = 2,
    Critical = 3,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Normal
    }
}

/// Subscriber ID, unique across every list in the process
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub u64);

impl SubscriberId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handler invoked with the owning context and the event record
pub type Handler<C, E> = Arc<dyn Fn(&mut C, &mut E) + Send + Sync>;

struct Entry<C, E> {
    id: SubscriberId,
    priority: Priority,
    handler: Handler<C, E>,
}

impl<C, E> Clone for Entry<C, E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            priority: self.priority,
            handler: Arc::clone(&self.handler),
        }
    }
}

/// Ordered list of synchronous subscribers
///
/// Equal priorities run in subscription order. Cloning shares the handlers.
pub struct Listeners<C, E> {
    entries: Vec<Entry<C, E>>,
}

impl<C, E> Listeners<C, E> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Subscribe with [`Priority::Normal`]
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriberId
    where
        F: Fn(&mut C, &mut E) + Send + Sync + 'static,
    {
        self.subscribe_with_priority(handler, Priority::Normal)
    }

    pub fn subscribe_with_priority<F>(&mut self, handler: F, priority: Priority) -> SubscriberId
    where
        F: Fn(&mut C, &mut E) + Send + Sync + 'static,
    {
        self.subscribe_handler(Arc::new(handler), priority)
    }

    /// Subscribe an already shared handler
    pub fn subscribe_handler(&mut self, handler: Handler<C, E>, priority: Priority) -> SubscriberId {
        let id = SubscriberId::next();
        self.entries.push(Entry {
            id,
            priority,
            handler,
        });
        // Stable: equal priorities keep subscription order
        self.entries.sort_by(|a, b| b.priority.cmp(&a.priority));
        id
    }

    /// Returns false if `id` was not subscribed here
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        before != self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of the current handlers, in delivery order
    pub fn snapshot(&self) -> Snapshot<C, E> {
        Snapshot {
            handlers: self
                .entries
                .iter()
                .map(|entry| Arc::clone(&entry.handler))
                .collect(),
        }
    }

    /// Deliver to a list that does not live inside `ctx`
    pub fn emit(&self, ctx: &mut C, event: &mut E) {
        self.snapshot().dispatch(ctx, event);
    }
}

impl<C, E> Clone for Listeners<C, E> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<C, E> Default for Listeners<C, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, E> fmt::Debug for Listeners<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}

/// Handlers captured for one dispatch
pub struct Snapshot<C, E> {
    handlers: Vec<Handler<C, E>>,
}

impl<C, E> Snapshot<C, E> {
    /// Invoke every captured handler, depth-first
    ///
    /// A handler that re-enters `ctx` and triggers further dispatches sees
    /// those complete before the next handler here runs.
    pub fn dispatch(self, ctx: &mut C, event: &mut E) {
        for handler in self.handlers {
            handler(ctx, event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }
}

/// Queue of single-type events for pull-based consumers
pub struct EventChannel<E> {
    sender: Sender<E>,
    receiver: Receiver<E>,
}

impl<E> EventChannel<E> {
    /// Create a new unbounded channel
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }

    /// A sender handlers can capture
    pub fn sender(&self) -> EventSender<E> {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    pub fn send(&self, event: E) {
        // Cannot disconnect: the channel holds its own receiver
        let _ = self.sender.send(event);
    }

    /// Receive one event
    pub fn receive(&self) -> Option<E> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Drain all pending events
    pub fn drain(&self) -> Vec<E> {
        self.receiver.try_iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Get pending count
    pub fn len(&self) -> usize {
        self.receiver.len()
    }
}

impl<E> Default for EventChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventChannel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("pending", &self.len())
            .finish()
    }
}

/// Sending half of an [`EventChannel`]
pub struct EventSender<E> {
    sender: Sender<E>,
}

impl<E> EventSender<E> {
    /// Returns false once the channel is gone
    pub fn send(&self, event: E) -> bool {
        if self.sender.send(event).is_err() {
            log::debug!("Event dropped: channel closed");
            return false;
        }
        true
    }
}

impl<E> Clone for EventSender<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<E> fmt::Debug for EventSender<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSender").finish()
    }
}

/// Prelude
pub mod prelude {
    pub use crate::{EventChannel, EventSender, Handler, Listeners, Priority, Snapshot, SubscriberId};
}
