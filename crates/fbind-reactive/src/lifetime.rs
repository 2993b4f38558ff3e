#![forbid(unsafe_code)]

//! Cancellation handles for live subscriptions.
//!
//! A [`Lifetime`] represents one live effect (a subscription, a registered
//! handler, an observer token). Cancelling it releases the effect and stops
//! any further callbacks. It is the only cancellation primitive in fbind.
//!
//! # Invariants
//!
//! 1. `cancel()` runs the release action at most once; a second call is a
//!    no-op.
//! 2. Dropping a `Lifetime` cancels it.
//! 3. [`LifetimeBag`] cancels its members in reverse registration order.

use std::fmt;

type CancelFn = Box<dyn FnOnce()>;

/// Handle to one live subscription or effect.
#[must_use = "dropping a Lifetime cancels the effect it represents"]
pub struct Lifetime {
    cancel: Option<CancelFn>,
}

impl Lifetime {
    /// Create a lifetime that runs `cancel` when cancelled or dropped.
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A lifetime with nothing to release. Already cancelled.
    pub fn empty() -> Self {
        Self { cancel: None }
    }

    /// Keep `guard` alive until this lifetime is cancelled.
    pub fn retaining<G: 'static>(guard: G) -> Self {
        Self::new(move || drop(guard))
    }

    /// Combine several lifetimes into one. Members are cancelled in reverse
    /// order.
    pub fn merge(lifetimes: impl IntoIterator<Item = Lifetime>) -> Self {
        let mut members: Vec<Lifetime> = lifetimes.into_iter().collect();
        if members.is_empty() {
            return Self::empty();
        }
        Self::new(move || {
            while let Some(mut lifetime) = members.pop() {
                lifetime.cancel();
            }
        })
    }

    /// Cancel the effect. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Whether `cancel()` has already run (or there was nothing to cancel).
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_none()
    }
}

impl Drop for Lifetime {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifetime")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Ordered holder of lifetimes for one logical scope (e.g. a mounted widget).
///
/// Dropping the bag, or calling [`cancel_all`](Self::cancel_all), cancels
/// every held lifetime, most recent first.
#[derive(Default)]
pub struct LifetimeBag {
    lifetimes: Vec<Lifetime>,
}

impl LifetimeBag {
    /// Create an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lifetimes: Vec::new(),
        }
    }

    /// Hold `lifetime` until the bag is cancelled.
    pub fn hold(&mut self, lifetime: Lifetime) {
        if !lifetime.is_cancelled() {
            self.lifetimes.push(lifetime);
        }
    }

    /// Number of held lifetimes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lifetimes.len()
    }

    /// Whether the bag holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lifetimes.is_empty()
    }

    /// Cancel everything, most recent first. The bag stays reusable.
    pub fn cancel_all(&mut self) {
        while let Some(mut lifetime) = self.lifetimes.pop() {
            lifetime.cancel();
        }
    }

    /// Convert the bag into a single lifetime.
    pub fn into_lifetime(mut self) -> Lifetime {
        Lifetime::merge(std::mem::take(&mut self.lifetimes))
    }
}

impl Drop for LifetimeBag {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

impl Extend<Lifetime> for LifetimeBag {
    fn extend<I: IntoIterator<Item = Lifetime>>(&mut self, iter: I) {
        for lifetime in iter {
            self.hold(lifetime);
        }
    }
}

impl fmt::Debug for LifetimeBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifetimeBag")
            .field("len", &self.lifetimes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn cancel_runs_once() {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let mut lifetime = Lifetime::new(move || c.set(c.get() + 1));
        assert!(!lifetime.is_cancelled());

        lifetime.cancel();
        lifetime.cancel();
        drop(lifetime);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn drop_cancels() {
        let fired = Rc::new(Cell::new(false));
        let f = Rc::clone(&fired);
        {
            let _lifetime = Lifetime::new(move || f.set(true));
        }
        assert!(fired.get());
    }

    #[test]
    fn empty_is_cancelled() {
        assert!(Lifetime::empty().is_cancelled());
    }

    #[test]
    fn retaining_drops_guard_on_cancel() {
        let guard = Rc::new(());
        let mut lifetime = Lifetime::retaining(Rc::clone(&guard));
        assert_eq!(Rc::strong_count(&guard), 2);
        lifetime.cancel();
        assert_eq!(Rc::strong_count(&guard), 1);
    }

    #[test]
    fn merge_cancels_in_reverse() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let members = (0..3).map(|i| {
            let log = Rc::clone(&log);
            Lifetime::new(move || log.borrow_mut().push(i))
        });
        let mut merged = Lifetime::merge(members);
        merged.cancel();
        assert_eq!(*log.borrow(), vec![2, 1, 0]);
    }

    #[test]
    fn bag_cancels_in_reverse_on_drop() {
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let mut bag = LifetimeBag::new();
            for i in 0..4 {
                let log = Rc::clone(&log);
                bag.hold(Lifetime::new(move || log.borrow_mut().push(i)));
            }
            assert_eq!(bag.len(), 4);
        }
        assert_eq!(*log.borrow(), vec![3, 2, 1, 0]);
    }

    #[test]
    fn bag_skips_cancelled_members() {
        let mut bag = LifetimeBag::new();
        bag.hold(Lifetime::empty());
        assert!(bag.is_empty());
    }

    #[test]
    fn bag_reusable_after_cancel_all() {
        let count = Rc::new(Cell::new(0));
        let mut bag = LifetimeBag::new();
        let c = Rc::clone(&count);
        bag.hold(Lifetime::new(move || c.set(c.get() + 1)));
        bag.cancel_all();
        assert!(bag.is_empty());

        let c = Rc::clone(&count);
        bag.hold(Lifetime::new(move || c.set(c.get() + 10)));
        drop(bag);
        assert_eq!(count.get(), 11);
    }

    #[test]
    fn bag_into_lifetime() {
        let count = Rc::new(Cell::new(0));
        let mut bag = LifetimeBag::new();
        for _ in 0..3 {
            let c = Rc::clone(&count);
            bag.hold(Lifetime::new(move || c.set(c.get() + 1)));
        }
        let mut lifetime = bag.into_lifetime();
        assert_eq!(count.get(), 0);
        lifetime.cancel();
        assert_eq!(count.get(), 3);
    }
}
