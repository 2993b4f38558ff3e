#![forbid(unsafe_code)]

//! Reactive primitives for fbind.
//!
//! - [`Observable`]: a shared, version-tracked value with change notification.
//! - [`Signal`] / [`SignalInput`]: push-based event streams, discrete or
//!   continuous, with `map`, `filter_map`, `merge` and `bind_to`.
//! - [`Lifetime`]: cancellation handle for one live subscription.
//! - [`LifetimeBag`]: ordered holder that cancels everything it holds.
//!
//! # Architecture
//!
//! Everything here is single-threaded (`Rc<RefCell<..>>`). Subscribers are
//! held weakly by their source; the strong reference lives inside the
//! `Lifetime` returned from `subscribe`, so dropping or cancelling the
//! lifetime is what unsubscribes.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. Cancelling a lifetime is idempotent and takes effect immediately.
//! 3. Callbacks never run while a source's internal borrow is held, so
//!    re-entrant sends and sets are safe.

pub mod lifetime;
pub mod observable;
pub mod signal;

pub use lifetime::{Lifetime, LifetimeBag};
pub use observable::Observable;
pub use signal::{Signal, SignalInput};
