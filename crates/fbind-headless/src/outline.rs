#![forbid(unsafe_code)]

//! Outline (tree table) view.
//!
//! Rows are pulled from a data source on [`NativeOutlineView::reload_data`]
//! and on every expand or collapse. Until the first reload the view has no
//! rows at all, so row and item queries answer `None`.
//!
//! # Invariants
//!
//! 1. A row is present only if every ancestor of its item is expanded.
//! 2. Delegate and data source are held weakly and called outside any
//!    internal borrow.
//! 3. Selection follows the selected item across reloads, and is cleared
//!    when that item disappears.

use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use ahash::AHashSet;

use crate::control::NativeControl;
use crate::geometry::Rect;
use crate::view::NativeView;

/// Opaque item reference handed out by a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemRef(u64);

impl ItemRef {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Supplies the tree. `None` as the parent item means the root.
pub trait OutlineViewDataSource {
    fn number_of_children(&self, outline: &NativeOutlineView, item: Option<ItemRef>) -> usize;
    fn child(&self, outline: &NativeOutlineView, index: usize, item: Option<ItemRef>)
    -> Option<ItemRef>;
    fn is_item_expandable(&self, outline: &NativeOutlineView, item: ItemRef) -> bool;
    fn object_value(&self, outline: &NativeOutlineView, item: ItemRef) -> Option<String>;
}

/// Outline delegate protocol. Every method has a default.
pub trait OutlineViewDelegate {
    fn should_expand_item(&self, _outline: &NativeOutlineView, _item: ItemRef) -> bool {
        true
    }

    fn item_will_expand(&self, _outline: &NativeOutlineView, _item: ItemRef) {}

    fn selection_did_change(&self, _outline: &NativeOutlineView) {}
}

#[derive(Debug, Clone, Copy)]
struct Row {
    item: ItemRef,
    level: usize,
    parent: Option<ItemRef>,
}

#[derive(Default)]
struct OutlineState {
    loaded: bool,
    rows: Vec<Row>,
    expanded: AHashSet<ItemRef>,
    selected: Option<ItemRef>,
}

#[derive(Default)]
struct OutlineInner {
    state: RefCell<OutlineState>,
    delegate: RefCell<Option<Weak<dyn OutlineViewDelegate>>>,
    data_source: RefCell<Option<Weak<dyn OutlineViewDataSource>>>,
}

#[derive(Clone)]
pub struct NativeOutlineView {
    control: NativeControl,
    inner: Rc<OutlineInner>,
}

impl NativeOutlineView {
    #[must_use]
    pub fn new(frame: Rect) -> Self {
        Self {
            control: NativeControl::new(frame),
            inner: Rc::new(OutlineInner::default()),
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

    pub fn set_delegate(&self, delegate: Option<Weak<dyn OutlineViewDelegate>>) {
        *self.inner.delegate.borrow_mut() = delegate;
    }

    pub fn set_data_source(&self, data_source: Option<Weak<dyn OutlineViewDataSource>>) {
        *self.inner.data_source.borrow_mut() = data_source;
    }

    #[must_use]
    pub fn has_delegate(&self) -> bool {
        self.delegate().is_some()
    }

    #[must_use]
    pub fn has_data_source(&self) -> bool {
        self.data_source().is_some()
    }

    fn delegate(&self) -> Option<Rc<dyn OutlineViewDelegate>> {
        self.inner.delegate.borrow().as_ref().and_then(Weak::upgrade)
    }

    fn data_source(&self) -> Option<Rc<dyn OutlineViewDataSource>> {
        self.inner
            .data_source
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
    }

    /// Whether rows have been loaded at least once.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.inner.state.borrow().loaded
    }

    /// Rebuild all rows from the data source.
    pub fn reload_data(&self) {
        let expanded = self.inner.state.borrow().expanded.clone();
        let mut rows = Vec::new();
        if let Some(source) = self.data_source() {
            self.collect_rows(source.as_ref(), None, 0, &expanded, &mut rows);
        }
        let mut state = self.inner.state.borrow_mut();
        state.expanded.retain(|item| rows.iter().any(|row| row.item == *item));
        if let Some(selected) = state.selected
            && !rows.iter().any(|row| row.item == selected)
        {
            state.selected = None;
        }
        tracing::trace!(id = %self.id(), rows = rows.len(), "outline reload");
        state.rows = rows;
        state.loaded = true;
    }

    fn collect_rows(
        &self,
        source: &dyn OutlineViewDataSource,
        parent: Option<ItemRef>,
        level: usize,
        expanded: &AHashSet<ItemRef>,
        rows: &mut Vec<Row>,
    ) {
        for index in 0..source.number_of_children(self, parent) {
            let Some(item) = source.child(self, index, parent) else {
                continue;
            };
            rows.push(Row {
                item,
                level,
                parent,
            });
            if expanded.contains(&item) && source.is_item_expandable(self, item) {
                self.collect_rows(source, Some(item), level + 1, expanded, rows);
            }
        }
    }

    #[must_use]
    pub fn number_of_rows(&self) -> usize {
        self.inner.state.borrow().rows.len()
    }

    #[must_use]
    pub fn item_at_row(&self, row: usize) -> Option<ItemRef> {
        self.inner.state.borrow().rows.get(row).map(|r| r.item)
    }

    #[must_use]
    pub fn row_for_item(&self, item: ItemRef) -> Option<usize> {
        self.inner
            .state
            .borrow()
            .rows
            .iter()
            .position(|r| r.item == item)
    }

    #[must_use]
    pub fn level_for_item(&self, item: ItemRef) -> Option<usize> {
        let row = self.row_for_item(item)?;
        self.inner.state.borrow().rows.get(row).map(|r| r.level)
    }

    #[must_use]
    pub fn parent_for_item(&self, item: ItemRef) -> Option<ItemRef> {
        let row = self.row_for_item(item)?;
        self.inner.state.borrow().rows.get(row).and_then(|r| r.parent)
    }

    #[must_use]
    pub fn object_value_at_row(&self, row: usize) -> Option<String> {
        let item = self.item_at_row(row)?;
        self.data_source()?.object_value(self, item)
    }

    #[must_use]
    pub fn is_item_expanded(&self, item: ItemRef) -> bool {
        self.inner.state.borrow().expanded.contains(&item)
    }

    /// Expand a visible, expandable item. The delegate may refuse. With
    /// `expand_children`, descendants are expanded too.
    pub fn expand_item(&self, item: ItemRef, expand_children: bool) -> bool {
        let Some(source) = self.data_source() else {
            return false;
        };
        if self.row_for_item(item).is_none() || !source.is_item_expandable(self, item) {
            return false;
        }
        if !self.is_item_expanded(item) {
            let delegate = self.delegate();
            if let Some(delegate) = &delegate
                && !delegate.should_expand_item(self, item)
            {
                tracing::debug!(id = %self.id(), item = item.get(), "expansion refused");
                return false;
            }
            if let Some(delegate) = &delegate {
                delegate.item_will_expand(self, item);
            }
            self.inner.state.borrow_mut().expanded.insert(item);
            self.reload_data();
        }
        if expand_children {
            let children: Vec<ItemRef> = (0..source.number_of_children(self, Some(item)))
                .filter_map(|i| source.child(self, i, Some(item)))
                .collect();
            for child in children {
                self.expand_item(child, true);
            }
        }
        true
    }

    pub fn collapse_item(&self, item: ItemRef) -> bool {
        let removed = self.inner.state.borrow_mut().expanded.remove(&item);
        if removed {
            self.reload_data();
        }
        removed
    }

    #[must_use]
    pub fn selected_row(&self) -> Option<usize> {
        let selected = self.inner.state.borrow().selected?;
        self.row_for_item(selected)
    }

    /// Select a row (or clear with `None`). Out-of-range rows clear the
    /// selection. The delegate is told when the selection changes.
    pub fn select_row(&self, row: Option<usize>) {
        let item = row.and_then(|r| self.item_at_row(r));
        let changed = {
            let mut state = self.inner.state.borrow_mut();
            std::mem::replace(&mut state.selected, item) != item
        };
        if changed && let Some(delegate) = self.delegate() {
            delegate.selection_did_change(self);
        }
    }
}

impl Deref for NativeOutlineView {
    type Target = NativeControl;

    fn deref(&self) -> &NativeControl {
        &self.control
    }
}

impl PartialEq for NativeOutlineView {
    fn eq(&self, other: &Self) -> bool {
        self.control == other.control
    }
}

impl Eq for NativeOutlineView {}

impl fmt::Debug for NativeOutlineView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("NativeOutlineView")
            .field("id", &self.id())
            .field("loaded", &state.loaded)
            .field("rows", &state.rows.len())
            .field("expanded", &state.expanded.len())
            .finish()
    }
}
