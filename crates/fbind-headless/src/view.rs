#![forbid(unsafe_code)]

//! Base view object.
//!
//! A [`NativeView`] is a cheap handle; clones refer to the same object.
//! Equality is identity.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::geometry::{Point, Rect};
use crate::object::ObjectId;

#[derive(Default)]
struct ViewState {
    frame: Rect,
    hidden: bool,
    tag: Option<i64>,
    tooltip: Option<String>,
    wants_layer: bool,
    scroll_origin: Point,
    subviews: Vec<NativeView>,
}

struct ViewInner {
    id: ObjectId,
    state: RefCell<ViewState>,
}

#[derive(Clone)]
pub struct NativeView {
    inner: Rc<ViewInner>,
}

impl NativeView {
    #[must_use]
    pub fn new(frame: Rect) -> Self {
        Self {
            inner: Rc::new(ViewInner {
                id: ObjectId::next(),
                state: RefCell::new(ViewState {
                    frame,
                    ..ViewState::default()
                }),
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.inner.id
    }

    #[must_use]
    pub fn frame(&self) -> Rect {
        self.inner.state.borrow().frame
    }

    pub fn set_frame(&self, frame: Rect) {
        self.inner.state.borrow_mut().frame = frame;
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.inner.state.borrow().hidden
    }

    pub fn set_hidden(&self, hidden: bool) {
        self.inner.state.borrow_mut().hidden = hidden;
    }

    #[must_use]
    pub fn tag(&self) -> Option<i64> {
        self.inner.state.borrow().tag
    }

    pub fn set_tag(&self, tag: Option<i64>) {
        self.inner.state.borrow_mut().tag = tag;
    }

    #[must_use]
    pub fn tooltip(&self) -> Option<String> {
        self.inner.state.borrow().tooltip.clone()
    }

    pub fn set_tooltip(&self, tooltip: Option<String>) {
        self.inner.state.borrow_mut().tooltip = tooltip;
    }

    #[must_use]
    pub fn wants_layer(&self) -> bool {
        self.inner.state.borrow().wants_layer
    }

    pub fn set_wants_layer(&self, wants_layer: bool) {
        self.inner.state.borrow_mut().wants_layer = wants_layer;
    }

    #[must_use]
    pub fn scroll_origin(&self) -> Point {
        self.inner.state.borrow().scroll_origin
    }

    pub fn scroll_to(&self, origin: Point) {
        tracing::trace!(id = %self.id(), x = origin.x, y = origin.y, "scroll_to");
        self.inner.state.borrow_mut().scroll_origin = origin;
    }

    #[must_use]
    pub fn subviews(&self) -> Vec<NativeView> {
        self.inner.state.borrow().subviews.clone()
    }

    pub fn set_subviews(&self, subviews: Vec<NativeView>) {
        self.inner.state.borrow_mut().subviews = subviews;
    }

    pub fn add_subview(&self, view: NativeView) {
        self.inner.state.borrow_mut().subviews.push(view);
    }

    /// Depth-first search of this view and its descendants for `tag`.
    #[must_use]
    pub fn view_with_tag(&self, tag: i64) -> Option<NativeView> {
        if self.tag() == Some(tag) {
            return Some(self.clone());
        }
        self.subviews()
            .iter()
            .find_map(|subview| subview.view_with_tag(tag))
    }
}

impl PartialEq for NativeView {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for NativeView {}

impl fmt::Debug for NativeView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("NativeView")
            .field("id", &self.inner.id)
            .field("frame", &state.frame)
            .field("tag", &state.tag)
            .field("subviews", &state.subviews.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let view = NativeView::new(Rect::ZERO);
        let other = view.clone();
        other.set_hidden(true);
        assert!(view.is_hidden());
        assert_eq!(view, other);
        assert_ne!(view, NativeView::new(Rect::ZERO));
    }

    #[test]
    fn tag_lookup_is_depth_first() {
        let root = NativeView::new(Rect::ZERO);
        let child = NativeView::new(Rect::ZERO);
        let grandchild = NativeView::new(Rect::ZERO);
        grandchild.set_tag(Some(7));
        child.add_subview(grandchild.clone());
        root.add_subview(child);
        assert_eq!(root.view_with_tag(7), Some(grandchild));
        assert_eq!(root.view_with_tag(8), None);
    }

    #[test]
    fn scroll_origin_is_recorded() {
        let view = NativeView::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        view.scroll_to(Point::new(0.0, 40.0));
        assert_eq!(view.scroll_origin(), Point::new(0.0, 40.0));
    }
}
