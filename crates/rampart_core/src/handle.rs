//! Generational handles for non-owning references
//!
//! Health records, hitboxes and pooled entities refer to each other through
//! handles rather than pointers. A handle whose slot has been freed (and maybe
//! reused) no longer resolves, which turns a dangling owner reference into a
//! detectable condition instead of a silent bug.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

use crate::error::HandleError;

/// A type-safe handle to a value of type T stored in a [`HandleMap`]
#[repr(transparent)]
pub struct Handle<T> {
    /// Lower 32 bits: index, Upper 32 bits: generation
    bits: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// Create a new handle from index and generation
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self {
            bits: (generation as u64) << 32 | index as u64,
            _marker: PhantomData,
        }
    }

    /// Create an invalid/null handle
    #[inline]
    pub const fn null() -> Self {
        Self {
            bits: u64::MAX,
            _marker: PhantomData,
        }
    }

    /// Check if this handle is null
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.bits == u64::MAX
    }

    #[inline]
    pub const fn index(&self) -> u32 {
        self.bits as u32
    }

    #[inline]
    pub const fn generation(&self) -> u32 {
        (self.bits >> 32) as u32
    }

    /// Raw bits, stable for the lifetime of the slot
    #[inline]
    pub const fn to_bits(&self) -> u64 {
        self.bits
    }

    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self {
            bits,
            _marker: PhantomData,
        }
    }
}

// Manual trait implementations to avoid T bounds
impl<T> Clone for Handle<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl<T> Eq for Handle<T> {}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.bits.cmp(&other.bits)
    }
}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = core::any::type_name::<T>();
        let short = name.rsplit("::").next().unwrap_or(name);
        if self.is_null() {
            write!(f, "Handle<{}>(null)", short)
        } else {
            write!(f, "Handle<{}>({}v{})", short, self.index(), self.generation())
        }
    }
}

impl<T> fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "{}v{}", self.index(), self.generation())
        }
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::null()
    }
}

/// Slot storage addressed by generational handles
///
/// Freed slots are recycled LIFO; each reuse bumps the slot generation so
/// handles to the previous occupant stop resolving.
pub struct HandleMap<T> {
    generations: Vec<u32>,
    values: Vec<Option<T>>,
    free_list: Vec<u32>,
}

impl<T> HandleMap<T> {
    /// Create a new handle map
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            generations: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            free_list: Vec::new(),
        }
    }

    /// Insert a value and get a handle to it
    pub fn insert(&mut self, value: T) -> Handle<T> {
        if let Some(index) = self.free_list.pop() {
            let slot = index as usize;
            self.values[slot] = Some(value);
            return Handle::new(index, self.generations[slot]);
        }

        let index = self.values.len() as u32;
        self.generations.push(0);
        self.values.push(Some(value));
        Handle::new(index, 0)
    }

    /// Remove a value by its handle
    pub fn remove(&mut self, handle: Handle<T>) -> Option<T> {
        if !self.contains(handle) {
            return None;
        }

        let slot = handle.index() as usize;
        let value = self.values[slot].take();
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free_list.push(handle.index());
        value
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        if !self.contains(handle) {
            return None;
        }
        self.values[handle.index() as usize].as_ref()
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        if !self.contains(handle) {
            return None;
        }
        self.values[handle.index() as usize].as_mut()
    }

    /// Like [`HandleMap::get`] but reports why the lookup failed
    pub fn try_get(&self, handle: Handle<T>) -> Result<&T, HandleError> {
        self.check(handle)?;
        self.values[handle.index() as usize]
            .as_ref()
            .ok_or(HandleError::Stale)
    }

    pub fn try_get_mut(&mut self, handle: Handle<T>) -> Result<&mut T, HandleError> {
        self.check(handle)?;
        self.values[handle.index() as usize]
            .as_mut()
            .ok_or(HandleError::Stale)
    }

    /// Check if a handle still resolves
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.check(handle).is_ok()
    }

    fn check(&self, handle: Handle<T>) -> Result<(), HandleError> {
        if handle.is_null() {
            return Err(HandleError::Null);
        }
        let slot = handle.index() as usize;
        match self.generations.get(slot) {
            None => Err(HandleError::OutOfBounds),
            Some(gen) if *gen != handle.generation() => Err(HandleError::Stale),
            Some(_) if self.values[slot].is_none() => Err(HandleError::Stale),
            Some(_) => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len() - self.free_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every live handle, in slot order
    ///
    /// Callers that mutate the map while walking it iterate the snapshot.
    pub fn handles(&self) -> Vec<Handle<T>> {
        self.iter().map(|(handle, _)| handle).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        let gens = &self.generations;
        self.values
            .iter()
            .enumerate()
            .filter_map(move |(i, value)| {
                value.as_ref().map(|v| (Handle::new(i as u32, gens[i]), v))
            })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle<T>, &mut T)> {
        let gens = &self.generations;
        self.values
            .iter_mut()
            .enumerate()
            .filter_map(move |(i, value)| {
                value.as_mut().map(|v| (Handle::new(i as u32, gens[i]), v))
            })
    }

    /// Drop every value; outstanding handles all go stale
    pub fn clear(&mut self) {
        for (slot, value) in self.values.iter_mut().enumerate() {
            if value.take().is_some() {
                self.generations[slot] = self.generations[slot].wrapping_add(1);
                self.free_list.push(slot as u32);
            }
        }
    }
}

impl<T> Default for HandleMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for HandleMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
