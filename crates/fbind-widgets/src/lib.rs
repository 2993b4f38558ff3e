#![forbid(unsafe_code)]

//! Declarative binders for a representative widget family.
//!
//! Each widget module defines a binding enum, a storage type, a preparer
//! and a `Binder` alias. Preparers nest by value along the native class
//! hierarchy:
//!
//! ```text
//! PopUpButton -> Button -> Control -> View -> BaseBinding<NativeView>
//! OutlineView ------------> Control -> View -> BaseBinding<NativeView>
//! Window -----------------------------------> BaseBinding<NativeWindow>
//! ```
//!
//! Bindings from any level up the chain can be listed directly in a
//! `bindings![..]` array; they are lifted through the `Inherited` cases.

pub mod button;
pub mod control;
pub mod outline_view;
pub mod pop_up_button;
pub mod view;
pub mod window;

pub use button::{Button, ButtonBinding, ButtonPreparer, ButtonStorage};
pub use control::{ActionTable, Control, ControlBinding, ControlPreparer, ControlStorage};
pub use outline_view::{
    IndexPath, OutlineView, OutlineViewBinding, OutlineViewPreparer, OutlineViewStorage,
    TreeDataSource, TreeNode,
};
pub use pop_up_button::{
    PopUpButton, PopUpButtonBinding, PopUpButtonPreparer, PopUpButtonStorage, logical_selection,
};
pub use view::{
    AnyView, View, ViewBinding, ViewConvertible, ViewInstance, ViewPreparer, ViewStorage,
};
pub use window::{Window, WindowBinding, WindowPreparer, WindowStorage};
