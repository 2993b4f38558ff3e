#![forbid(unsafe_code)]

//! Push-based event streams.
//!
//! A [`Signal<T>`] is the receiving end of a stream and a [`SignalInput<T>`]
//! is the sending end. Values are delivered synchronously, on the caller's
//! thread, to every live subscriber in registration order.
//!
//! Signals come in two flavours:
//!
//! - **discrete** (`Signal::channel`): no current value; subscribers only see
//!   values sent after they subscribed.
//! - **continuous** (`Signal::continuous_channel`, `Signal::just`): the latest
//!   value is cached and replayed to each new subscriber immediately.
//!
//! Derived signals (`map`, `filter_map`, `merge`) keep their upstream
//! subscriptions alive for as long as the derived signal itself is alive.
//!
//! # Invariants
//!
//! 1. Sends made outside any delivery reach each subscriber in send order.
//! 2. A cancelled subscription is never invoked again, even if cancelled in
//!    the middle of a delivery round.
//! 3. Sending from inside a subscriber is permitted. The nested round runs to
//!    completion before the outer round continues, so subscribers later in
//!    registration order see the nested value before the outer one.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::lifetime::Lifetime;

struct Subscriber<T> {
    active: Cell<bool>,
    callback: Box<dyn Fn(&T)>,
}

struct SignalInner<T> {
    continuous: bool,
    latest: RefCell<Option<T>>,
    subscribers: RefCell<Vec<Weak<Subscriber<T>>>>,
    /// Upstream subscriptions feeding a derived signal.
    upstream: RefCell<Vec<Lifetime>>,
}

impl<T: Clone + 'static> SignalInner<T> {
    fn new(continuous: bool) -> Rc<Self> {
        Rc::new(Self {
            continuous,
            latest: RefCell::new(None),
            subscribers: RefCell::new(Vec::new()),
            upstream: RefCell::new(Vec::new()),
        })
    }

    fn deliver(&self, value: T) {
        if self.continuous {
            *self.latest.borrow_mut() = Some(value.clone());
        }
        let live: Vec<Rc<Subscriber<T>>> = {
            let mut subscribers = self.subscribers.borrow_mut();
            subscribers.retain(|w| w.upgrade().is_some_and(|s| s.active.get()));
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        tracing::trace!(subscribers = live.len(), continuous = self.continuous, "signal deliver");
        for subscriber in &live {
            if subscriber.active.get() {
                (subscriber.callback)(&value);
            }
        }
    }
}

/// The receiving end of a stream of values.
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

/// The sending end of a stream of values.
pub struct SignalInput<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Clone for SignalInput<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("continuous", &self.inner.continuous)
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .finish()
    }
}

impl<T> fmt::Debug for SignalInput<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalInput")
            .field("continuous", &self.inner.continuous)
            .finish()
    }
}

impl<T: Clone + 'static> Signal<T> {
    /// Create a discrete channel.
    #[must_use]
    pub fn channel() -> (SignalInput<T>, Signal<T>) {
        let inner = SignalInner::new(false);
        (
            SignalInput {
                inner: Rc::clone(&inner),
            },
            Signal { inner },
        )
    }

    /// Create a continuous channel: the latest value is replayed to new
    /// subscribers.
    #[must_use]
    pub fn continuous_channel() -> (SignalInput<T>, Signal<T>) {
        let inner = SignalInner::new(true);
        (
            SignalInput {
                inner: Rc::clone(&inner),
            },
            Signal { inner },
        )
    }

    /// A continuous signal holding a single value.
    #[must_use]
    pub fn just(value: T) -> Signal<T> {
        let (input, signal) = Self::continuous_channel();
        input.send(value);
        signal
    }

    /// Whether the signal replays its latest value to new subscribers.
    #[must_use]
    pub fn is_continuous(&self) -> bool {
        self.inner.continuous
    }

    /// The cached latest value of a continuous signal.
    #[must_use]
    pub fn latest(&self) -> Option<T> {
        self.inner.latest.borrow().clone()
    }

    /// Subscribe to values. For continuous signals the cached value, if any,
    /// is delivered before this call returns.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Lifetime {
        let subscriber = Rc::new(Subscriber {
            active: Cell::new(true),
            callback: Box::new(callback),
        });
        self.inner
            .subscribers
            .borrow_mut()
            .push(Rc::downgrade(&subscriber));

        let replay = self.latest();
        if let Some(value) = replay {
            (subscriber.callback)(&value);
        }
        Lifetime::new(move || subscriber.active.set(false))
    }

    /// Forward every value into `input` until the returned lifetime is
    /// cancelled.
    pub fn bind_to(&self, input: SignalInput<T>) -> Lifetime {
        self.subscribe(move |value| input.send(value.clone()))
    }

    /// Transform every value.
    #[must_use]
    pub fn map<U: Clone + 'static>(&self, f: impl Fn(&T) -> U + 'static) -> Signal<U> {
        self.filter_map(move |value| Some(f(value)))
    }

    /// Transform every value, dropping those mapped to `None`.
    #[must_use]
    pub fn filter_map<U: Clone + 'static>(
        &self,
        f: impl Fn(&T) -> Option<U> + 'static,
    ) -> Signal<U> {
        let derived = SignalInner::<U>::new(self.inner.continuous);
        let target = Rc::downgrade(&derived);
        let upstream = self.subscribe(move |value| {
            if let (Some(target), Some(mapped)) = (target.upgrade(), f(value)) {
                target.deliver(mapped);
            }
        });
        derived.upstream.borrow_mut().push(upstream);
        Signal { inner: derived }
    }

    /// Interleave this signal with `others`. The result is continuous only if
    /// every source is continuous.
    #[must_use]
    pub fn merge(&self, others: impl IntoIterator<Item = Signal<T>>) -> Signal<T> {
        let sources: Vec<Signal<T>> = std::iter::once(self.clone()).chain(others).collect();
        let continuous = sources.iter().all(Signal::is_continuous);
        let merged = SignalInner::<T>::new(continuous);
        for source in &sources {
            let target = Rc::downgrade(&merged);
            let upstream = source.subscribe(move |value| {
                if let Some(target) = target.upgrade() {
                    target.deliver(value.clone());
                }
            });
            merged.upstream.borrow_mut().push(upstream);
        }
        Signal { inner: merged }
    }

    /// Number of registered subscribers (dead ones included until pruned).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }
}

impl<T: Clone + 'static> SignalInput<T> {
    /// Send a value to every live subscriber.
    pub fn send(&self, value: T) {
        self.inner.deliver(value);
    }

    /// An input that calls `f` for every value sent into it.
    pub fn from_fn(f: impl Fn(&T) + 'static) -> SignalInput<T> {
        let (input, signal) = Signal::channel();
        let lifetime = signal.subscribe(f);
        input.inner.upstream.borrow_mut().push(lifetime);
        input
    }

    /// A signal observing the values sent through this input.
    #[must_use]
    pub fn signal(&self) -> Signal<T> {
        Signal {
            inner: Rc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder<T: Clone + 'static>(signal: &Signal<T>) -> (Rc<RefCell<Vec<T>>>, Lifetime) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let lifetime = signal.subscribe(move |v: &T| s.borrow_mut().push(v.clone()));
        (seen, lifetime)
    }

    #[test]
    fn discrete_delivers_only_future_values() {
        let (input, signal) = Signal::channel();
        input.send(1);
        let (seen, _l) = recorder(&signal);
        input.send(2);
        input.send(3);
        assert_eq!(*seen.borrow(), vec![2, 3]);
        assert_eq!(signal.latest(), None);
    }

    #[test]
    fn continuous_replays_latest() {
        let (input, signal) = Signal::continuous_channel();
        input.send("a");
        input.send("b");
        let (seen, _l) = recorder(&signal);
        input.send("c");
        assert_eq!(*seen.borrow(), vec!["b", "c"]);
    }

    #[test]
    fn just_replays_to_every_subscriber() {
        let signal = Signal::just(7);
        let (a, _la) = recorder(&signal);
        let (b, _lb) = recorder(&signal);
        assert_eq!(*a.borrow(), vec![7]);
        assert_eq!(*b.borrow(), vec![7]);
    }

    #[test]
    fn cancel_stops_delivery() {
        let (input, signal) = Signal::channel();
        let (seen, mut lifetime) = recorder(&signal);
        input.send(1);
        lifetime.cancel();
        lifetime.cancel();
        input.send(2);
        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn map_and_filter_map() {
        let (input, signal) = Signal::channel();
        let doubled = signal.map(|v: &i32| v * 2);
        let evens = signal.filter_map(|v: &i32| (v % 2 == 0).then_some(*v));
        let (d, _ld) = recorder(&doubled);
        let (e, _le) = recorder(&evens);
        for v in 1..=4 {
            input.send(v);
        }
        assert_eq!(*d.borrow(), vec![2, 4, 6, 8]);
        assert_eq!(*e.borrow(), vec![2, 4]);
    }

    #[test]
    fn map_preserves_continuity() {
        let signal = Signal::just(3).map(|v: &i32| v + 1);
        assert!(signal.is_continuous());
        assert_eq!(signal.latest(), Some(4));
    }

    #[test]
    fn merge_interleaves_in_send_order() {
        let (a_in, a) = Signal::channel();
        let (b_in, b) = Signal::channel();
        let merged = a.merge([b]);
        let (seen, _l) = recorder(&merged);
        a_in.send(1);
        b_in.send(2);
        a_in.send(3);
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn bind_to_forwards_until_cancelled() {
        let (src_in, src) = Signal::channel();
        let (dst_in, dst) = Signal::channel();
        let (seen, _l) = recorder(&dst);
        let mut binding = src.bind_to(dst_in);
        src_in.send(1);
        binding.cancel();
        src_in.send(2);
        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn from_fn_receives_values() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let input = SignalInput::from_fn(move |v: &u8| s.borrow_mut().push(*v));
        input.send(5);
        input.clone().send(6);
        assert_eq!(*seen.borrow(), vec![5, 6]);
    }

    #[test]
    fn reentrant_send_completes_nested_round_first() {
        let (input, signal) = Signal::channel();
        let log = Rc::new(RefCell::new(Vec::new()));
        let nested_input = input.clone();
        let l1 = Rc::clone(&log);
        let _a = signal.subscribe(move |v: &i32| {
            l1.borrow_mut().push(("a", *v));
            if *v == 1 {
                nested_input.send(2);
            }
        });
        let l2 = Rc::clone(&log);
        let _b = signal.subscribe(move |v: &i32| l2.borrow_mut().push(("b", *v)));
        input.send(1);
        assert_eq!(
            *log.borrow(),
            vec![("a", 1), ("a", 2), ("b", 2), ("b", 1)]
        );
    }
}
