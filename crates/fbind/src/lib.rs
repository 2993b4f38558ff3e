#![forbid(unsafe_code)]

//! fbind: declarative, reactive binders over a retained-mode widget toolkit.
//!
//! ```ignore
//! use fbind::prelude::*;
//!
//! let app = AppContext::default();
//! let (clicked, clicks) = Signal::channel();
//! let button = Button::new(bindings![
//!     ButtonBinding::title().is("OK"),
//!     ControlBinding::action().to(clicked),
//! ])
//! .instance(&app);
//! ```
//!
//! The member crates are re-exported whole under [`reactive`], [`binding`],
//! [`native`] and (with the `widgets` feature) [`widgets`].

pub use fbind_core as binding;
pub use fbind_headless as native;
pub use fbind_reactive as reactive;
#[cfg(feature = "widgets")]
pub use fbind_widgets as widgets;

pub use fbind_core::{
    AppContext, Binder, BinderConfig, Callback, ConfigError, Constant, Delegate,
    DuplicateHandlerPolicy, Dynamic, Selector, bindings, inherit_bindings,
};
pub use fbind_reactive::{Lifetime, LifetimeBag, Observable, Signal, SignalInput};

pub mod prelude {
    //! Everything needed to declare and mount widgets.

    pub use fbind_core::{
        AppContext, BaseBinding, Binder, BinderConfig, BinderPreparer, Callback, Constant,
        Dynamic, bindings,
    };
    pub use fbind_headless::{ButtonState, ButtonType, Point, Rect, Size, StyleMask};
    pub use fbind_reactive::{Lifetime, LifetimeBag, Observable, Signal, SignalInput};

    #[cfg(feature = "widgets")]
    pub use fbind_widgets::{
        AnyView, Button, ButtonBinding, Control, ControlBinding, IndexPath, OutlineView,
        OutlineViewBinding, PopUpButton, PopUpButtonBinding, TreeNode, View, ViewBinding, Window,
        WindowBinding,
    };
}
