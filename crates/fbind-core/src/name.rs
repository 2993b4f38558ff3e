#![forbid(unsafe_code)]

//! Declarative binding construction.
//!
//! Each widget exposes one [`BindingName`] per binding case. The name knows
//! how to wrap a payload into the case, and offers constructors matching the
//! payload kind:
//!
//! | Call | Payload | Meaning |
//! |------|---------|---------|
//! | `name.is(v)` | `Constant<T>` / `Dynamic<T>` | fixed value |
//! | `name.bind(signal)` | `Dynamic<T>` / `Signal<T>` | values flow in |
//! | `name.observe(&obs)` | `Dynamic<T>` | values flow in from an observable |
//! | `name.to(input)` | `SignalInput<T>` | events flow out |
//! | `name.handle(f)` | `Callback<A, R>` | queries flow out |
//!
//! ```ignore
//! let button = Button::new(bindings![
//!     ButtonBinding::title().is("OK"),
//!     ControlBinding::action().to(clicked),
//! ]);
//! ```

use std::fmt;

use fbind_reactive::{Observable, Signal, SignalInput};

use crate::value::{Callback, Constant, Dynamic};

/// Names one binding case of widget binding enum `B`, with payload `V`.
pub struct BindingName<V, B> {
    name: &'static str,
    make: fn(V) -> B,
}

impl<V, B> BindingName<V, B> {
    pub const fn new(name: &'static str, make: fn(V) -> B) -> Self {
        Self { name, make }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Wrap an already-built payload.
    pub fn value(&self, value: V) -> B {
        (self.make)(value)
    }
}

impl<V, B> Clone for BindingName<V, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V, B> Copy for BindingName<V, B> {}

impl<V, B> fmt::Debug for BindingName<V, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BindingName").field(&self.name).finish()
    }
}

impl<T, B> BindingName<Constant<T>, B> {
    pub fn is(&self, value: impl Into<T>) -> B {
        self.value(Constant::new(value.into()))
    }
}

impl<T, B> BindingName<Dynamic<T>, B> {
    pub fn is(&self, value: impl Into<T>) -> B {
        self.value(Dynamic::Constant(value.into()))
    }

    pub fn bind(&self, signal: Signal<T>) -> B {
        self.value(Dynamic::Signal(signal))
    }

    pub fn observe(&self, observable: &Observable<T>) -> B {
        self.value(Dynamic::Observable(observable.clone()))
    }
}

impl<T, B> BindingName<Signal<T>, B> {
    pub fn bind(&self, signal: Signal<T>) -> B {
        self.value(signal)
    }
}

impl<T, B> BindingName<SignalInput<T>, B> {
    pub fn to(&self, input: SignalInput<T>) -> B {
        self.value(input)
    }
}

impl<A, R, B> BindingName<Callback<A, R>, B> {
    pub fn handle(&self, f: impl Fn(A) -> R + 'static) -> B {
        self.value(Callback::new(f))
    }
}

/// Build a binding array, lifting inherited cases into the concrete widget's
/// binding enum through `From`.
#[macro_export]
macro_rules! bindings {
    ($($binding:expr),* $(,)?) => {
        ::std::vec![$(::core::convert::Into::into($binding)),*]
    };
}

/// Generate `From` impls lifting inherited binding enums into a derived one.
///
/// The derived enum must have an `Inherited(..)` case holding the first
/// inherited enum. Further enums up the chain are lifted through it.
///
/// ```ignore
/// inherit_bindings!(ButtonBinding => ControlBinding => ViewBinding => BaseBinding<NativeView>);
/// ```
#[macro_export]
macro_rules! inherit_bindings {
    ($outer:ty => $inner:ty) => {
        impl ::core::convert::From<$inner> for $outer {
            fn from(binding: $inner) -> Self {
                Self::Inherited(binding)
            }
        }
    };
    ($outer:ty => $inner:ty => $($rest:ty)=>+) => {
        $crate::inherit_bindings!($outer => $inner);
        $(
            impl ::core::convert::From<$rest> for $outer {
                fn from(binding: $rest) -> Self {
                    Self::Inherited(<$inner as ::core::convert::From<$rest>>::from(binding))
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{BindingValue, ValueKind};

    enum Inner {
        Label(Dynamic<String>),
    }

    enum Outer {
        Inherited(Inner),
        Count(Constant<u32>),
        Clicked(SignalInput<()>),
        Query(Callback<u8, bool>),
    }

    crate::inherit_bindings!(Outer => Inner);

    impl Outer {
        fn count() -> BindingName<Constant<u32>, Outer> {
            BindingName::new("count", Outer::Count)
        }
        fn clicked() -> BindingName<SignalInput<()>, Outer> {
            BindingName::new("clicked", Outer::Clicked)
        }
        fn query() -> BindingName<Callback<u8, bool>, Outer> {
            BindingName::new("query", Outer::Query)
        }
    }

    impl Inner {
        fn label() -> BindingName<Dynamic<String>, Inner> {
            BindingName::new("label", Inner::Label)
        }
    }

    #[test]
    fn names_build_expected_cases() {
        let (input, _signal) = Signal::channel();
        let list: Vec<Outer> = crate::bindings![
            Inner::label().is("hi"),
            Outer::count().is(3u32),
            Outer::clicked().to(input),
            Outer::query().handle(|v| v > 2),
        ];
        assert_eq!(list.len(), 4);
        match &list[0] {
            Outer::Inherited(Inner::Label(Dynamic::Constant(text))) => assert_eq!(text, "hi"),
            _ => panic!("expected inherited label"),
        }
        match &list[1] {
            Outer::Count(c) => assert_eq!(*c.value(), 3),
            _ => panic!("expected count"),
        }
        match &list[2] {
            Outer::Clicked(input) => assert_eq!(input.kind(), ValueKind::SignalInput),
            _ => panic!("expected clicked"),
        }
        match &list[3] {
            Outer::Query(cb) => assert!(cb.call(5)),
            _ => panic!("expected query"),
        }
    }

    #[test]
    fn bind_and_observe_produce_live_dynamics() {
        let obs = Observable::new(String::from("a"));
        match Inner::label().observe(&obs) {
            Inner::Label(Dynamic::Observable(o)) => assert_eq!(o.get(), "a"),
            _ => panic!("expected observable"),
        }
        match Inner::label().bind(Signal::just(String::from("b"))) {
            Inner::Label(Dynamic::Signal(s)) => assert_eq!(s.latest().as_deref(), Some("b")),
            _ => panic!("expected signal"),
        }
    }

    #[test]
    fn name_is_reported() {
        assert_eq!(Inner::label().name(), "label");
        assert!(format!("{:?}", Outer::count()).contains("count"));
    }
}
