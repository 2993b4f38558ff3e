#![forbid(unsafe_code)]

//! Top-level windows.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Delegate dropped | only a weak reference is held | treated as no delegate |
//! | Close vetoed | delegate answers `false` to should-close | window stays open |

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use bitflags::bitflags;

use crate::geometry::Rect;
use crate::object::ObjectId;
use crate::view::NativeView;

bitflags! {
    /// Window chrome and behavior.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StyleMask: u32 {
        const TITLED = 1 << 0;
        const CLOSABLE = 1 << 1;
        const MINIATURIZABLE = 1 << 2;
        const RESIZABLE = 1 << 3;
        const FULL_SIZE_CONTENT_VIEW = 1 << 15;
    }
}

impl Default for StyleMask {
    fn default() -> Self {
        Self::TITLED | Self::CLOSABLE | Self::MINIATURIZABLE | Self::RESIZABLE
    }
}

/// Window delegate protocol. Every method has a default.
pub trait WindowDelegate {
    fn window_should_close(&self, _window: &NativeWindow) -> bool {
        true
    }

    fn window_will_close(&self, _window: &NativeWindow) {}

    fn window_did_become_key(&self, _window: &NativeWindow) {}
}

struct WindowState {
    content_rect: Rect,
    style_mask: StyleMask,
    title: String,
    content_view: Option<NativeView>,
    initial_first_responder: Option<NativeView>,
    visible: bool,
    key: bool,
}

struct WindowInner {
    id: ObjectId,
    deferred: bool,
    state: RefCell<WindowState>,
    delegate: RefCell<Option<Weak<dyn WindowDelegate>>>,
}

#[derive(Clone)]
pub struct NativeWindow {
    inner: Rc<WindowInner>,
}

impl NativeWindow {
    /// Create a window. `defer` is fixed for the window's life.
    #[must_use]
    pub fn new(content_rect: Rect, style_mask: StyleMask, defer: bool) -> Self {
        let window = Self {
            inner: Rc::new(WindowInner {
                id: ObjectId::next(),
                deferred: defer,
                state: RefCell::new(WindowState {
                    content_rect,
                    style_mask,
                    title: String::new(),
                    content_view: None,
                    initial_first_responder: None,
                    visible: false,
                    key: false,
                }),
                delegate: RefCell::new(None),
            }),
        };
        tracing::debug!(id = %window.id(), defer, "window created");
        window
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.inner.id
    }

    #[must_use]
    pub fn is_deferred(&self) -> bool {
        self.inner.deferred
    }

    #[must_use]
    pub fn content_rect(&self) -> Rect {
        self.inner.state.borrow().content_rect
    }

    pub fn set_content_rect(&self, rect: Rect) {
        self.inner.state.borrow_mut().content_rect = rect;
    }

    #[must_use]
    pub fn style_mask(&self) -> StyleMask {
        self.inner.state.borrow().style_mask
    }

    pub fn set_style_mask(&self, mask: StyleMask) {
        self.inner.state.borrow_mut().style_mask = mask;
    }

    #[must_use]
    pub fn title(&self) -> String {
        self.inner.state.borrow().title.clone()
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.inner.state.borrow_mut().title = title.into();
    }

    #[must_use]
    pub fn content_view(&self) -> Option<NativeView> {
        self.inner.state.borrow().content_view.clone()
    }

    pub fn set_content_view(&self, view: Option<NativeView>) {
        self.inner.state.borrow_mut().content_view = view;
    }

    #[must_use]
    pub fn initial_first_responder(&self) -> Option<NativeView> {
        self.inner.state.borrow().initial_first_responder.clone()
    }

    pub fn set_initial_first_responder(&self, view: Option<NativeView>) {
        self.inner.state.borrow_mut().initial_first_responder = view;
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.inner.state.borrow().visible
    }

    #[must_use]
    pub fn is_key(&self) -> bool {
        self.inner.state.borrow().key
    }

    pub fn set_delegate(&self, delegate: Option<Weak<dyn WindowDelegate>>) {
        *self.inner.delegate.borrow_mut() = delegate;
    }

    #[must_use]
    pub fn has_delegate(&self) -> bool {
        self.delegate().is_some()
    }

    fn delegate(&self) -> Option<Rc<dyn WindowDelegate>> {
        self.inner.delegate.borrow().as_ref().and_then(Weak::upgrade)
    }

    pub fn order_front(&self) {
        self.inner.state.borrow_mut().visible = true;
    }

    pub fn make_key_and_order_front(&self) {
        self.order_front();
        let became_key = !std::mem::replace(&mut self.inner.state.borrow_mut().key, true);
        if became_key && let Some(delegate) = self.delegate() {
            delegate.window_did_become_key(self);
        }
    }

    /// Close unconditionally. The delegate is told before the window hides.
    pub fn close(&self) {
        if !self.is_visible() {
            return;
        }
        if let Some(delegate) = self.delegate() {
            delegate.window_will_close(self);
        }
        let mut state = self.inner.state.borrow_mut();
        state.visible = false;
        state.key = false;
    }

    /// Close as if the user clicked the close button: the delegate may veto.
    /// Returns whether the window closed.
    pub fn perform_close(&self) -> bool {
        if let Some(delegate) = self.delegate()
            && !delegate.window_should_close(self)
        {
            tracing::debug!(id = %self.id(), "close vetoed by delegate");
            return false;
        }
        self.close();
        true
    }
}

impl PartialEq for NativeWindow {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for NativeWindow {}

impl fmt::Debug for NativeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("NativeWindow")
            .field("id", &self.inner.id)
            .field("deferred", &self.inner.deferred)
            .field("title", &state.title)
            .field("visible", &state.visible)
            .finish()
    }
}
