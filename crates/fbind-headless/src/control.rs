#![forbid(unsafe_code)]

//! Controls: views that send an action to a target.

use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use crate::geometry::Rect;
use crate::object::ObjectId;
use crate::view::NativeView;

/// Receiver of control actions. The control holds it weakly.
pub trait ActionTarget {
    fn perform_action(&self, sender: ObjectId);
}

struct ControlState {
    enabled: bool,
    string_value: String,
    continuous: bool,
}

struct ControlInner {
    state: RefCell<ControlState>,
    target: RefCell<Option<Weak<dyn ActionTarget>>>,
}

#[derive(Clone)]
pub struct NativeControl {
    view: NativeView,
    inner: Rc<ControlInner>,
}

impl NativeControl {
    #[must_use]
    pub fn new(frame: Rect) -> Self {
        Self {
            view: NativeView::new(frame),
            inner: Rc::new(ControlInner {
                state: RefCell::new(ControlState {
                    enabled: true,
                    string_value: String::new(),
                    continuous: false,
                }),
                target: RefCell::new(None),
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn as_view(&self) -> &NativeView {
        &self.view
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.state.borrow().enabled
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.inner.state.borrow_mut().enabled = enabled;
    }

    #[must_use]
    pub fn string_value(&self) -> String {
        self.inner.state.borrow().string_value.clone()
    }

    pub fn set_string_value(&self, value: impl Into<String>) {
        self.inner.state.borrow_mut().string_value = value.into();
    }

    #[must_use]
    pub fn is_continuous(&self) -> bool {
        self.inner.state.borrow().continuous
    }

    pub fn set_continuous(&self, continuous: bool) {
        self.inner.state.borrow_mut().continuous = continuous;
    }

    pub fn set_target(&self, target: Option<Weak<dyn ActionTarget>>) {
        *self.inner.target.borrow_mut() = target;
    }

    #[must_use]
    pub fn has_target(&self) -> bool {
        self.inner
            .target
            .borrow()
            .as_ref()
            .is_some_and(|t| t.strong_count() > 0)
    }

    /// Deliver the action to the target. Returns `false` if the control is
    /// disabled or the target is gone.
    pub fn send_action(&self) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let target = self.inner.target.borrow().as_ref().and_then(Weak::upgrade);
        match target {
            Some(target) => {
                tracing::trace!(sender = %self.id(), "send_action");
                target.perform_action(self.id());
                true
            }
            None => false,
        }
    }
}

impl Deref for NativeControl {
    type Target = NativeView;

    fn deref(&self) -> &NativeView {
        &self.view
    }
}

impl PartialEq for NativeControl {
    fn eq(&self, other: &Self) -> bool {
        self.view == other.view
    }
}

impl Eq for NativeControl {}

impl fmt::Debug for NativeControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeControl")
            .field("id", &self.id())
            .field("enabled", &self.is_enabled())
            .field("has_target", &self.has_target())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Counter(Cell<u32>);

    impl ActionTarget for Counter {
        fn perform_action(&self, _sender: ObjectId) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn action_reaches_live_target() {
        let control = NativeControl::new(Rect::ZERO);
        let target = Rc::new(Counter(Cell::new(0)));
        let weak: Weak<dyn ActionTarget> = Rc::downgrade(&target) as Weak<dyn ActionTarget>;
        control.set_target(Some(weak));
        assert!(control.send_action());
        assert_eq!(target.0.get(), 1);
    }

    #[test]
    fn target_is_held_weakly() {
        let control = NativeControl::new(Rect::ZERO);
        let target = Rc::new(Counter(Cell::new(0)));
        control.set_target(Some(Rc::downgrade(&target) as Weak<dyn ActionTarget>));
        drop(target);
        assert!(!control.has_target());
        assert!(!control.send_action());
    }

    #[test]
    fn disabled_control_sends_nothing() {
        let control = NativeControl::new(Rect::ZERO);
        let target = Rc::new(Counter(Cell::new(0)));
        control.set_target(Some(Rc::downgrade(&target) as Weak<dyn ActionTarget>));
        control.set_enabled(false);
        assert!(!control.send_action());
        assert_eq!(target.0.get(), 0);
    }
}
