#![forbid(unsafe_code)]

//! Binding payload kinds.
//!
//! Every binding case carries exactly one payload, and every payload is one
//! of these kinds:
//!
//! | Kind | Type | Applied |
//! |------|------|---------|
//! | Constant | [`Constant<T>`] | once, during prepare/construct |
//! | Dynamic | [`Dynamic<T>`] | once at bind time, then on every change |
//! | Signal | [`Signal<T>`] | on each incoming event, no current value |
//! | SignalInput | [`SignalInput<T>`] | outbound, the widget sends into it |
//! | Callback | [`Callback<A, R>`] | outbound query, answered by the caller |

use std::fmt;
use std::rc::Rc;

use fbind_reactive::{Lifetime, Observable, Signal, SignalInput};

/// Discriminant of a binding payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Constant,
    Dynamic,
    Signal,
    SignalInput,
    Callback,
}

/// Implemented by every payload type.
pub trait BindingValue {
    fn kind(&self) -> ValueKind;
}

/// A value read once, during the prepare or construct phase.
#[derive(Clone, PartialEq, Eq)]
pub struct Constant<T>(T);

impl<T> Constant<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &T {
        &self.0
    }

    pub fn into_value(self) -> T {
        self.0
    }
}

impl<T: fmt::Debug> fmt::Debug for Constant<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Constant").field(&self.0).finish()
    }
}

impl<T> BindingValue for Constant<T> {
    fn kind(&self) -> ValueKind {
        ValueKind::Constant
    }
}

/// A value that is applied now and kept live afterwards.
///
/// `Dynamic::Constant` is the degenerate case: applied once, nothing to keep
/// alive.
pub enum Dynamic<T> {
    Constant(T),
    Observable(Observable<T>),
    Signal(Signal<T>),
}

impl<T: Clone + 'static> Dynamic<T> {
    /// The value available during the prepare pass, if any.
    ///
    /// Constants return their value, observables their current value and
    /// continuous signals their cached latest value.
    pub fn initial_value(&self) -> Option<T> {
        match self {
            Self::Constant(value) => Some(value.clone()),
            Self::Observable(observable) => Some(observable.get()),
            Self::Signal(signal) => signal.latest(),
        }
    }

    /// Apply the value through `setter`.
    ///
    /// The setter runs immediately with the initial value (when there is one)
    /// and then once per subsequent value, in emission order. Returns `None`
    /// for constants; otherwise the subscription, which must be retained for
    /// updates to keep flowing.
    pub fn apply(self, setter: impl Fn(T) + 'static) -> Option<Lifetime> {
        match self {
            Self::Constant(value) => {
                setter(value);
                None
            }
            Self::Observable(observable) => {
                setter(observable.get());
                Some(observable.subscribe(move |value| setter(value.clone())))
            }
            Self::Signal(signal) => Some(signal.subscribe(move |value| setter(value.clone()))),
        }
    }
}

impl<T> BindingValue for Dynamic<T> {
    fn kind(&self) -> ValueKind {
        ValueKind::Dynamic
    }
}

impl<T: Clone> Clone for Dynamic<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Constant(value) => Self::Constant(value.clone()),
            Self::Observable(observable) => Self::Observable(observable.clone()),
            Self::Signal(signal) => Self::Signal(signal.clone()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Dynamic<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => f.debug_tuple("Dynamic::Constant").field(value).finish(),
            Self::Observable(observable) => f
                .debug_tuple("Dynamic::Observable")
                .field(observable)
                .finish(),
            Self::Signal(signal) => f.debug_tuple("Dynamic::Signal").field(signal).finish(),
        }
    }
}

impl<T> From<Signal<T>> for Dynamic<T> {
    fn from(signal: Signal<T>) -> Self {
        Self::Signal(signal)
    }
}

impl<T> From<Observable<T>> for Dynamic<T> {
    fn from(observable: Observable<T>) -> Self {
        Self::Observable(observable)
    }
}

impl<T> BindingValue for Signal<T> {
    fn kind(&self) -> ValueKind {
        ValueKind::Signal
    }
}

impl<T> BindingValue for SignalInput<T> {
    fn kind(&self) -> ValueKind {
        ValueKind::SignalInput
    }
}

/// A caller-supplied closure answering a widget query or notification.
pub struct Callback<A, R = ()>(Rc<dyn Fn(A) -> R>);

impl<A, R> Callback<A, R> {
    pub fn new(f: impl Fn(A) -> R + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, args: A) -> R {
        (self.0)(args)
    }
}

impl<A, R> Clone for Callback<A, R> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<A, R> fmt::Debug for Callback<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback").finish_non_exhaustive()
    }
}

impl<A, R> BindingValue for Callback<A, R> {
    fn kind(&self) -> ValueKind {
        ValueKind::Callback
    }
}
