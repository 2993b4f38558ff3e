#![forbid(unsafe_code)]

//! Per-instance side table.
//!
//! Native objects cannot carry binder state, so everything a mount produces
//! (storage, delegate, retained protocol adapters, lifetimes) is parked in a
//! [`StorageTable`] keyed by the native object's identity. The entry lives
//! until the instance is torn down; nothing in the native object graph holds
//! it strongly.
//!
//! The table is a generational arena: a [`StorageHandle`] names a slot plus
//! the generation it was issued for, so a handle kept across a teardown
//! resolves to `None` instead of aliasing whatever reuses the slot.
//!
//! # Invariants
//!
//! 1. At most one attachment per [`InstanceKey`].
//! 2. A handle resolves only while its generation matches the slot's.
//! 3. Dropping an [`Attachment`] cancels its lifetimes (reverse order) before
//!    releasing adapters, delegate and storage.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use fbind_reactive::LifetimeBag;

use crate::delegate::Delegate;

/// Identity of a native instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceKey(u64);

impl InstanceKey {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Generational reference to one table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorageHandle {
    index: usize,
    generation: u32,
}

/// Everything one mount leaves behind.
///
/// Field order is drop order.
pub struct Attachment {
    pub lifetimes: LifetimeBag,
    pub retained: Vec<Rc<dyn Any>>,
    pub delegate: Option<Rc<Delegate>>,
    pub storage: Rc<dyn Any>,
    pub widget: &'static str,
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("widget", &self.widget)
            .field("lifetimes", &self.lifetimes.len())
            .field("retained", &self.retained.len())
            .field("delegate", &self.delegate.is_some())
            .finish()
    }
}

struct Slot {
    generation: u32,
    entry: Option<Attachment>,
}

#[derive(Default)]
pub struct StorageTable {
    slots: Vec<Slot>,
    free: Vec<usize>,
    keys: AHashMap<InstanceKey, StorageHandle>,
}

impl StorageTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Park `attachment` for `key`.
    ///
    /// # Panics
    ///
    /// Panics if `key` already has an attachment.
    pub fn attach(&mut self, key: InstanceKey, attachment: Attachment) -> StorageHandle {
        if self.keys.contains_key(&key) {
            panic!(
                "a second storage attached to {} instance {key}",
                attachment.widget
            );
        }
        let handle = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.entry = Some(attachment);
                StorageHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len();
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(attachment),
                });
                StorageHandle {
                    index,
                    generation: 0,
                }
            }
        };
        self.keys.insert(key, handle);
        handle
    }

    #[must_use]
    pub fn handle(&self, key: InstanceKey) -> Option<StorageHandle> {
        self.keys.get(&key).copied()
    }

    #[must_use]
    pub fn get(&self, handle: StorageHandle) -> Option<&Attachment> {
        let slot = self.slots.get(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    #[must_use]
    pub fn lookup(&self, key: InstanceKey) -> Option<&Attachment> {
        self.get(self.handle(key)?)
    }

    /// Remove and return the attachment for `key`. The slot's generation is
    /// bumped so outstanding handles go stale.
    pub fn detach(&mut self, key: InstanceKey) -> Option<Attachment> {
        let handle = self.keys.remove(&key)?;
        let slot = &mut self.slots[handle.index];
        let entry = slot.entry.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        entry
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for StorageTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageTable")
            .field("attached", &self.keys.len())
            .field("slots", &self.slots.len())
            .finish()
    }
}
