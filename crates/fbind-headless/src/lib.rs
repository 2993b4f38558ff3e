#![forbid(unsafe_code)]

//! Headless retained-mode widget toolkit.
//!
//! The objects here stand in for a platform toolkit: they hold state, expose
//! setters, send actions to targets, and call single-slot delegate and data
//! source protocols. Nothing is drawn.
//!
//! Handles are cheap clones of shared objects. Specialized objects deref to
//! the object they extend (`NativeButton` to `NativeControl` to
//! `NativeView`), and delegate, target and data source slots hold weak
//! references only.

pub mod button;
pub mod control;
pub mod geometry;
pub mod object;
pub mod outline;
pub mod pop_up;
pub mod view;
pub mod window;

pub use button::{ButtonState, ButtonType, NativeButton};
pub use control::{ActionTarget, NativeControl};
pub use geometry::{Point, Rect, Size};
pub use object::ObjectId;
pub use outline::{ItemRef, NativeOutlineView, OutlineViewDataSource, OutlineViewDelegate};
pub use pop_up::{NativePopUpButton, ObserverToken};
pub use view::NativeView;
pub use window::{NativeWindow, StyleMask, WindowDelegate};
