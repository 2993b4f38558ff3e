#![forbid(unsafe_code)]

//! Application context.
//!
//! [`AppContext`] owns the [`BinderConfig`] and the [`StorageTable`] for
//! every instance mounted through it. It is an explicit, cheaply clonable
//! handle passed to `Binder::instance`; there is no process-wide state.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::config::BinderConfig;
use crate::delegate::Delegate;
use crate::storage::{Attachment, InstanceKey, StorageHandle, StorageTable};

struct AppInner {
    config: BinderConfig,
    table: RefCell<StorageTable>,
}

/// Shared handle to the binder runtime state of one application.
#[derive(Clone)]
pub struct AppContext {
    inner: Rc<AppInner>,
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(BinderConfig::default())
    }
}

impl AppContext {
    #[must_use]
    pub fn new(config: BinderConfig) -> Self {
        Self {
            inner: Rc::new(AppInner {
                config,
                table: RefCell::new(StorageTable::new()),
            }),
        }
    }

    /// A handle that does not keep the context alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakAppContext {
        WeakAppContext {
            inner: Rc::downgrade(&self.inner),
        }
    }

    #[must_use]
    pub fn config(&self) -> &BinderConfig {
        &self.inner.config
    }

    pub(crate) fn attach(&self, key: InstanceKey, attachment: Attachment) -> StorageHandle {
        self.inner.table.borrow_mut().attach(key, attachment)
    }

    #[must_use]
    pub fn handle(&self, key: InstanceKey) -> Option<StorageHandle> {
        self.inner.table.borrow().handle(key)
    }

    #[must_use]
    pub fn is_attached(&self, key: InstanceKey) -> bool {
        self.handle(key).is_some()
    }

    /// Number of live attachments.
    #[must_use]
    pub fn mounted(&self) -> usize {
        self.inner.table.borrow().len()
    }

    /// Storage of the instance behind `key`, if it is mounted and its storage
    /// has type `S`.
    #[must_use]
    pub fn storage<S: 'static>(&self, key: InstanceKey) -> Option<Rc<S>> {
        let table = self.inner.table.borrow();
        let storage = Rc::clone(&table.lookup(key)?.storage);
        storage.downcast::<S>().ok()
    }

    /// Like [`storage`](Self::storage), through a handle. Stale handles
    /// resolve to `None`.
    #[must_use]
    pub fn storage_by_handle<S: 'static>(&self, handle: StorageHandle) -> Option<Rc<S>> {
        let table = self.inner.table.borrow();
        let storage = Rc::clone(&table.get(handle)?.storage);
        storage.downcast::<S>().ok()
    }

    #[must_use]
    pub fn delegate(&self, key: InstanceKey) -> Option<Rc<Delegate>> {
        self.inner
            .table
            .borrow()
            .lookup(key)
            .and_then(|entry| entry.delegate.clone())
    }

    /// Number of live lifetimes held for `key`.
    #[must_use]
    pub fn lifetime_count(&self, key: InstanceKey) -> usize {
        self.inner
            .table
            .borrow()
            .lookup(key)
            .map_or(0, |entry| entry.lifetimes.len())
    }

    /// Detach the instance behind `key`: cancel its lifetimes, then release
    /// retained adapters, the delegate and the storage. Returns `false` if
    /// nothing was attached.
    pub fn teardown(&self, key: InstanceKey) -> bool {
        let entry = self.inner.table.borrow_mut().detach(key);
        match entry {
            Some(entry) => {
                tracing::debug!(
                    widget = entry.widget,
                    %key,
                    lifetimes = entry.lifetimes.len(),
                    "teardown"
                );
                // Cancellation callbacks may query the table; the borrow is
                // already released here.
                drop(entry);
                true
            }
            None => false,
        }
    }
}

/// Weak counterpart of [`AppContext`].
#[derive(Clone)]
pub struct WeakAppContext {
    inner: Weak<AppInner>,
}

impl WeakAppContext {
    #[must_use]
    pub fn upgrade(&self) -> Option<AppContext> {
        self.inner.upgrade().map(|inner| AppContext { inner })
    }
}

impl fmt::Debug for WeakAppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakAppContext")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.inner.config)
            .field("table", &*self.inner.table.borrow())
            .finish()
    }
}
