#![forbid(unsafe_code)]

//! Push buttons, toggles, switches and radio buttons.

use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use crate::control::NativeControl;
use crate::geometry::Rect;
use crate::view::NativeView;

/// On/off/mixed state of a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ButtonState {
    #[default]
    Off,
    On,
    Mixed,
}

/// Click behavior of a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ButtonType {
    #[default]
    MomentaryPushIn,
    Toggle,
    Switch,
    Radio,
}

impl ButtonType {
    /// Whether a click flips the state.
    #[must_use]
    pub const fn toggles(self) -> bool {
        matches!(self, Self::Toggle | Self::Switch)
    }
}

#[derive(Default)]
struct ButtonInner {
    title: String,
    state: ButtonState,
    button_type: ButtonType,
    key_equivalent: String,
}

#[derive(Clone)]
pub struct NativeButton {
    control: NativeControl,
    inner: Rc<RefCell<ButtonInner>>,
}

impl NativeButton {
    #[must_use]
    pub fn new(frame: Rect) -> Self {
        Self {
            control: NativeControl::new(frame),
            inner: Rc::new(RefCell::new(ButtonInner::default())),
        }
    }

    #[inline]
    #[must_use]
    pub fn as_control(&self) -> &NativeControl {
        &self.control
    }

    #[inline]
    #[must_use]
    pub fn as_view(&self) -> &NativeView {
        self.control.as_view()
    }

    #[must_use]
    pub fn title(&self) -> String {
        self.inner.borrow().title.clone()
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.inner.borrow_mut().title = title.into();
    }

    #[must_use]
    pub fn state(&self) -> ButtonState {
        self.inner.borrow().state
    }

    pub fn set_state(&self, state: ButtonState) {
        self.inner.borrow_mut().state = state;
    }

    #[must_use]
    pub fn button_type(&self) -> ButtonType {
        self.inner.borrow().button_type
    }

    pub fn set_button_type(&self, button_type: ButtonType) {
        self.inner.borrow_mut().button_type = button_type;
    }

    #[must_use]
    pub fn key_equivalent(&self) -> String {
        self.inner.borrow().key_equivalent.clone()
    }

    pub fn set_key_equivalent(&self, key: impl Into<String>) {
        self.inner.borrow_mut().key_equivalent = key.into();
    }

    /// Simulate a user click: flip the state for toggling types, select for
    /// radio buttons, then send the action. Disabled buttons ignore clicks.
    pub fn perform_click(&self) -> bool {
        if !self.control.is_enabled() {
            return false;
        }
        {
            let mut inner = self.inner.borrow_mut();
            if inner.button_type.toggles() {
                inner.state = match inner.state {
                    ButtonState::On => ButtonState::Off,
                    ButtonState::Off | ButtonState::Mixed => ButtonState::On,
                };
            } else if inner.button_type == ButtonType::Radio {
                inner.state = ButtonState::On;
            }
        }
        self.control.send_action()
    }
}

impl Deref for NativeButton {
    type Target = NativeControl;

    fn deref(&self) -> &NativeControl {
        &self.control
    }
}

impl PartialEq for NativeButton {
    fn eq(&self, other: &Self) -> bool {
        self.control == other.control
    }
}

impl Eq for NativeButton {}

impl fmt::Debug for NativeButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("NativeButton")
            .field("id", &self.id())
            .field("title", &inner.title)
            .field("state", &inner.state)
            .field("type", &inner.button_type)
            .finish()
    }
}
