#![forbid(unsafe_code)]

//! Pop-up and pull-down menus.
//!
//! In pull-down mode the first menu item is the title item: it is shown as
//! the button's title and never becomes the selection. Menu indices are
//! native indices, so in pull-down mode the first real item is at index 1.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use crate::button::NativeButton;
use crate::control::NativeControl;
use crate::geometry::Rect;
use crate::view::NativeView;

/// Registration of a will-pop-up observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverToken(u64);

type Observer = Rc<dyn Fn()>;

#[derive(Default)]
struct PopUpState {
    pulls_down: bool,
    items: Vec<String>,
    selected: Option<usize>,
}

#[derive(Default)]
struct PopUpInner {
    state: RefCell<PopUpState>,
    observers: RefCell<Vec<(ObserverToken, Observer)>>,
    next_token: Cell<u64>,
}

#[derive(Clone)]
pub struct NativePopUpButton {
    button: NativeButton,
    inner: Rc<PopUpInner>,
}

impl NativePopUpButton {
    #[must_use]
    pub fn new(frame: Rect, pulls_down: bool) -> Self {
        let popup = Self {
            button: NativeButton::new(frame),
            inner: Rc::new(PopUpInner::default()),
        };
        popup.inner.state.borrow_mut().pulls_down = pulls_down;
        popup
    }

    #[inline]
    #[must_use]
    pub fn as_button(&self) -> &NativeButton {
        &self.button
    }

    #[inline]
    #[must_use]
    pub fn as_control(&self) -> &NativeControl {
        self.button.as_control()
    }

    #[inline]
    #[must_use]
    pub fn as_view(&self) -> &NativeView {
        self.button.as_view()
    }

    #[must_use]
    pub fn pulls_down(&self) -> bool {
        self.inner.state.borrow().pulls_down
    }

    /// Switch mode. The menu keeps its items; a selection that lands on the
    /// title item is cleared.
    pub fn set_pulls_down(&self, pulls_down: bool) {
        let mut state = self.inner.state.borrow_mut();
        state.pulls_down = pulls_down;
        if pulls_down && state.selected == Some(0) {
            state.selected = None;
        }
        drop(state);
        self.sync_title();
    }

    /// Replace the menu. Selection falls back to the first selectable item.
    pub fn set_items(&self, items: Vec<String>) {
        let mut state = self.inner.state.borrow_mut();
        let first = usize::from(state.pulls_down);
        state.selected = (items.len() > first).then_some(first);
        state.items = items;
        drop(state);
        self.sync_title();
    }

    #[must_use]
    pub fn item_titles(&self) -> Vec<String> {
        self.inner.state.borrow().items.clone()
    }

    #[must_use]
    pub fn number_of_items(&self) -> usize {
        self.inner.state.borrow().items.len()
    }

    #[must_use]
    pub fn index_of_selected_item(&self) -> Option<usize> {
        self.inner.state.borrow().selected
    }

    #[must_use]
    pub fn title_of_selected_item(&self) -> Option<String> {
        let state = self.inner.state.borrow();
        state.selected.and_then(|i| state.items.get(i).cloned())
    }

    /// Select by native index. Out-of-range indices and the title item of a
    /// pull-down clear the selection.
    pub fn select_item_at(&self, index: usize) {
        let mut state = self.inner.state.borrow_mut();
        let selectable = index < state.items.len() && !(state.pulls_down && index == 0);
        state.selected = selectable.then_some(index);
        drop(state);
        self.sync_title();
    }

    pub fn clear_selection(&self) {
        self.inner.state.borrow_mut().selected = None;
        self.sync_title();
    }

    fn sync_title(&self) {
        let state = self.inner.state.borrow();
        let title = if state.pulls_down {
            state.items.first().cloned()
        } else {
            state.selected.and_then(|i| state.items.get(i).cloned())
        };
        drop(state);
        self.button.set_title(title.unwrap_or_default());
    }

    pub fn add_will_pop_up_observer(&self, observer: impl Fn() + 'static) -> ObserverToken {
        let token = ObserverToken(self.inner.next_token.get());
        self.inner.next_token.set(token.0 + 1);
        self.inner
            .observers
            .borrow_mut()
            .push((token, Rc::new(observer)));
        token
    }

    pub fn remove_observer(&self, token: ObserverToken) -> bool {
        let mut observers = self.inner.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|(t, _)| *t != token);
        observers.len() != before
    }

    /// Simulate the user opening the menu and choosing `index` (native).
    /// Observers are told before the menu opens; the action is sent when a
    /// selectable item was chosen.
    pub fn pop_up_and_choose(&self, index: Option<usize>) -> bool {
        let observers: Vec<Observer> = self
            .inner
            .observers
            .borrow()
            .iter()
            .map(|(_, o)| Rc::clone(o))
            .collect();
        for observer in observers {
            observer();
        }
        let Some(index) = index else {
            return false;
        };
        self.select_item_at(index);
        if self.index_of_selected_item() == Some(index) {
            self.as_control().send_action()
        } else {
            false
        }
    }
}

impl Deref for NativePopUpButton {
    type Target = NativeButton;

    fn deref(&self) -> &NativeButton {
        &self.button
    }
}

impl PartialEq for NativePopUpButton {
    fn eq(&self, other: &Self) -> bool {
        self.button == other.button
    }
}

impl Eq for NativePopUpButton {}

impl fmt::Debug for NativePopUpButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("NativePopUpButton")
            .field("id", &self.id())
            .field("pulls_down", &state.pulls_down)
            .field("items", &state.items)
            .field("selected", &state.selected)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn pop_up_selects_first_item() {
        let popup = NativePopUpButton::new(Rect::ZERO, false);
        popup.set_items(items(&["a", "b"]));
        assert_eq!(popup.index_of_selected_item(), Some(0));
        assert_eq!(popup.title(), "a");
    }

    #[test]
    fn pull_down_skips_title_item() {
        let popup = NativePopUpButton::new(Rect::ZERO, true);
        popup.set_items(items(&["Actions", "copy", "paste"]));
        assert_eq!(popup.index_of_selected_item(), Some(1));
        assert_eq!(popup.title(), "Actions");
        popup.select_item_at(0);
        assert_eq!(popup.index_of_selected_item(), None);
    }

    #[test]
    fn mode_switch_updates_title() {
        let popup = NativePopUpButton::new(Rect::ZERO, false);
        popup.set_items(items(&["Actions", "copy"]));
        popup.select_item_at(1);
        assert_eq!(popup.title(), "copy");

        popup.set_pulls_down(true);
        assert_eq!(popup.title(), "Actions");
        popup.set_pulls_down(false);
        assert_eq!(popup.title(), "copy");
    }

    #[test]
    fn empty_menu_has_no_selection() {
        let popup = NativePopUpButton::new(Rect::ZERO, false);
        popup.set_items(Vec::new());
        assert_eq!(popup.index_of_selected_item(), None);
        assert_eq!(popup.title_of_selected_item(), None);
    }

    #[test]
    fn observers_run_and_can_be_removed() {
        let popup = NativePopUpButton::new(Rect::ZERO, false);
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let token = popup.add_will_pop_up_observer(move || h.set(h.get() + 1));
        popup.pop_up_and_choose(None);
        assert_eq!(hits.get(), 1);
        assert!(popup.remove_observer(token));
        assert!(!popup.remove_observer(token));
        popup.pop_up_and_choose(None);
        assert_eq!(hits.get(), 1);
    }
}
