#![forbid(unsafe_code)]

//! Observable value wrapper with change notification and version tracking.
//!
//! # Design
//!
//! [`Observable<T>`] wraps a value of type `T` in shared, reference-counted
//! storage (`Rc<RefCell<..>>`). When the value changes (determined by
//! `PartialEq`), all live subscribers are notified in registration order.
//! An observable is the usual source behind a `Dynamic` binding: its current
//! value is applied at bind time and every later change is pushed through.
//!
//! # Failure Modes
//!
//! - **Re-entrant set**: calling `set()` from inside a subscriber is allowed
//!   (callbacks run outside the borrow), but the nested notification completes
//!   before the outer one continues.
//! - **Subscriber leak**: holding [`Lifetime`] guards forever accumulates
//!   callbacks. Dead entries are pruned lazily during `notify()`.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::lifetime::Lifetime;

struct Subscriber<T> {
    active: Cell<bool>,
    callback: Box<dyn Fn(&T)>,
}

struct ObservableInner<T> {
    value: T,
    version: u64,
    /// Subscribers stored as weak references. Dead entries are pruned on notify.
    subscribers: Vec<Weak<Subscriber<T>>>,
}

/// A shared, version-tracked value with change notification.
///
/// Cloning an `Observable` creates a new handle to the **same** inner state.
///
/// # Invariants
///
/// 1. `version` increments by exactly 1 on each value-changing mutation.
/// 2. `set(v)` where `v == current` is a no-op.
/// 3. Subscribers are notified in registration order.
/// 4. A cancelled subscriber is never called again, even mid-notification.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscriber_count", &inner.subscribers.len())
            .finish()
    }
}

impl<T: Clone + 'static> Observable<T> {
    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Access the current value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Subscribe to value changes. The callback receives each new value.
    ///
    /// The current value is *not* delivered; read it with [`get`](Self::get).
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Lifetime {
        let subscriber = Rc::new(Subscriber {
            active: Cell::new(true),
            callback: Box::new(callback),
        });
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&subscriber));
        Lifetime::new(move || subscriber.active.set(false))
    }

    /// Current version number.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of registered subscribers (including dead ones not yet pruned).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    fn notify(&self) {
        let (callbacks, value) = {
            let mut inner = self.inner.borrow_mut();
            inner
                .subscribers
                .retain(|w| w.upgrade().is_some_and(|s| s.active.get()));
            let callbacks: Vec<Rc<Subscriber<T>>> =
                inner.subscribers.iter().filter_map(Weak::upgrade).collect();
            (callbacks, inner.value.clone())
        };
        tracing::trace!(subscribers = callbacks.len(), "observable notify");
        for subscriber in &callbacks {
            if subscriber.active.get() {
                (subscriber.callback)(&value);
            }
        }
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create a new observable with the given initial value.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Set a new value. If it differs from the current value the version is
    /// incremented and all live subscribers are notified.
    pub fn set(&self, value: T) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value;
            inner.version += 1;
        }
        self.notify();
    }

    /// Modify the value in place. Notifies only if the value changed.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let changed = {
            let mut inner = self.inner.borrow_mut();
            let old = inner.value.clone();
            f(&mut inner.value);
            if inner.value != old {
                inner.version += 1;
                true
            } else {
                false
            }
        };
        if changed {
            self.notify();
        }
    }
}
