//! Event free list - recycled transaction records
//!
//! Damage, death and heal transactions each need a small mutable record for
//! the duration of one synchronous call. [`EventPool`] keeps those records on
//! a free list; [`EventPool::checkout`] hands one out wrapped in a [`Pooled`]
//! guard that resets and returns it when dropped, whichever way the
//! transaction exits.

use core::fmt;
use core::mem::ManuallyDrop;
use core::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::Mutex;

/// Records that can be cleared before going back on the free list
pub trait Recycle {
    /// Drop every reference and output value held from the last transaction
    fn recycle(&mut self);
}

struct FreeList<T> {
    free: Vec<Box<T>>,
    /// Records currently checked out
    outstanding: usize,
    /// Records ever allocated
    created: usize,
}

/// Free list of reusable event records
///
/// Cloning an `EventPool` yields another handle to the same free list.
pub struct EventPool<T> {
    list: Arc<Mutex<FreeList<T>>>,
}

impl<T: Recycle + Default> EventPool<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a pool with `capacity` records allocated up front
    pub fn with_capacity(capacity: usize) -> Self {
        let free = (0..capacity).map(|_| Box::<T>::default()).collect();
        Self {
            list: Arc::new(Mutex::new(FreeList {
                free,
                outstanding: 0,
                created: capacity,
            })),
        }
    }

    /// Take a cleared record off the free list, allocating when it is empty
    pub fn checkout(&self) -> Pooled<T> {
        let mut list = self.list.lock();
        let value = match list.free.pop() {
            Some(value) => value,
            None => {
                list.created += 1;
                Box::default()
            }
        };
        list.outstanding += 1;
        drop(list);

        Pooled {
            value: ManuallyDrop::new(value),
            list: Arc::clone(&self.list),
        }
    }
}

impl<T> EventPool<T> {
    /// Records waiting on the free list
    pub fn available(&self) -> usize {
        self.list.lock().free.len()
    }

    /// Records checked out and not yet returned
    pub fn outstanding(&self) -> usize {
        self.list.lock().outstanding
    }

    /// Records allocated over the pool's lifetime
    pub fn created(&self) -> usize {
        self.list.lock().created
    }

    pub fn stats(&self) -> EventPoolStats {
        let list = self.list.lock();
        EventPoolStats {
            available: list.free.len(),
            outstanding: list.outstanding,
            created: list.created,
        }
    }
}

impl<T> Clone for EventPool<T> {
    fn clone(&self) -> Self {
        Self {
            list: Arc::clone(&self.list),
        }
    }
}

impl<T: Recycle + Default> Default for EventPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for EventPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventPool")
            .field("stats", &self.stats())
            .finish()
    }
}

/// Free list statistics
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventPoolStats {
    pub available: usize,
    pub outstanding: usize,
    pub created: usize,
}

/// A checked-out record; returned to its pool on drop
pub struct Pooled<T: Recycle> {
    value: ManuallyDrop<Box<T>>,
    list: Arc<Mutex<FreeList<T>>>,
}

impl<T: Recycle> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: Recycle> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: Recycle> Drop for Pooled<T> {
    fn drop(&mut self) {
        // SAFETY: `value` is never touched again after this point
        let mut value = unsafe { ManuallyDrop::take(&mut self.value) };
        value.recycle();

        let mut list = self.list.lock();
        list.outstanding -= 1;
        list.free.push(value);
    }
}

impl<T: Recycle + fmt::Debug> fmt::Debug for Pooled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self.value, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, Debug)]
    struct Record {
        amount: f32,
        output: Option<f32>,
    }

    impl Recycle for Record {
        fn recycle(&mut self) {
            self.amount = 0.0;
            self.output = None;
        }
    }

    #[test]
    fn test_checkout_reuses_records() {
        let pool: EventPool<Record> = EventPool::with_capacity(2);
        {
            let mut a = pool.checkout();
            a.amount = 5.0;
            a.output = Some(3.0);
            assert_eq!(pool.outstanding(), 1);
            assert_eq!(pool.available(), 1);
        }

        let b = pool.checkout();
        assert_eq!(b.amount, 0.0);
        assert_eq!(b.output, None);
        assert_eq!(pool.created(), 2);
    }

    #[test]
    fn test_grows_when_exhausted() {
        let pool: EventPool<Record> = EventPool::new();
        let a = pool.checkout();
        let b = pool.checkout();
        assert_eq!(pool.created(), 2);
        drop(a);
        drop(b);

        let stats = pool.stats();
        assert_eq!(stats.outstanding, 0);
        assert_eq!(stats.available, 2);
    }

    #[test]
    fn test_returned_on_early_exit() {
        fn transaction(pool: &EventPool<Record>, fail: bool) -> Result<f32, ()> {
            let mut record = pool.checkout();
            record.amount = 1.0;
            if fail {
                return Err(());
            }
            Ok(record.amount)
        }

        let pool: EventPool<Record> = EventPool::new();
        assert!(transaction(&pool, true).is_err());
        assert_eq!(transaction(&pool, false), Ok(1.0));
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.created(), 1);
    }
}
