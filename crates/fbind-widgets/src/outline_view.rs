#![forbid(unsafe_code)]

//! Outline view binder.
//!
//! The tree content lives in the instance's storage: [`TreeDataSource`] is
//! the native data source, and it maps between opaque native [`ItemRef`]s and
//! [`IndexPath`]s. Everything crossing the binding boundary is an index path.
//!
//! # Invariants
//!
//! 1. Every content replacement hands out fresh item references; references
//!    from an older tree never resolve.
//! 2. Expanded paths and the selected path survive a content replacement
//!    when they still exist in the new tree. Restoring them does not reach
//!    the `should_expand`, `item_will_expand` or `selection_changed`
//!    handlers.
//! 3. Before the first `tree` value, row and path lookups answer `None`.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | `expand` with a path not in the tree | ignored, logged at `debug` |
//! | `select` with a path that is not visible | selection cleared |
//! | selected path missing after replacement | cleared, `selection_changed(None)` |

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use fbind_core::{
    BaseBinding, Binder, BinderPreparer, Binding, BindingName, Callback, Delegate, Dynamic,
    InstanceKey, Lifetime, MountContext, Preparer, Selector, Signal, SignalInput,
    inherit_bindings,
};
use fbind_headless::{
    ItemRef, NativeOutlineView, NativeView, OutlineViewDataSource, OutlineViewDelegate, Rect,
};

use crate::control::{ControlBinding, ControlPreparer, ControlStorage};
use crate::view::{ViewBinding, instance_key};

const PROTOCOL: &str = "OutlineViewDelegate";

pub const SHOULD_EXPAND: Selector = Selector::new(PROTOCOL, "should_expand_item");
pub const ITEM_WILL_EXPAND: Selector = Selector::new(PROTOCOL, "item_will_expand");
pub const SELECTION_DID_CHANGE: Selector = Selector::new(PROTOCOL, "selection_did_change");

/// Position of a node: one child index per level, starting at the roots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexPath(Vec<usize>);

impl IndexPath {
    #[must_use]
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The path one level up, or `None` for a root node.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        match self.0.split_last() {
            Some((_, [])) | None => None,
            Some((_, parent)) => Some(Self(parent.to_vec())),
        }
    }

    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Every proper prefix followed by the path itself, shortest first.
    fn prefixes(&self) -> impl Iterator<Item = IndexPath> + '_ {
        (1..=self.0.len()).map(|n| Self(self.0[..n].to_vec()))
    }
}

impl From<Vec<usize>> for IndexPath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}

/// One node of outline content. `children: None` is a leaf; `Some` is an
/// expandable node, possibly with no children yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode<T> {
    pub value: T,
    pub children: Option<Vec<TreeNode<T>>>,
}

impl<T> TreeNode<T> {
    pub fn leaf(value: T) -> Self {
        Self {
            value,
            children: None,
        }
    }

    pub fn branch(value: T, children: Vec<TreeNode<T>>) -> Self {
        Self {
            value,
            children: Some(children),
        }
    }
}

#[derive(Default)]
struct TreeIndex {
    populated: bool,
    roots: Vec<TreeNode<String>>,
    items: AHashMap<ItemRef, IndexPath>,
    paths: AHashMap<IndexPath, ItemRef>,
    next_item: u64,
}

impl TreeIndex {
    fn replace(&mut self, roots: Vec<TreeNode<String>>) {
        self.items.clear();
        self.paths.clear();
        let mut pending: Vec<(IndexPath, &TreeNode<String>)> = roots
            .iter()
            .enumerate()
            .map(|(i, node)| (IndexPath::new(vec![i]), node))
            .collect();
        while let Some((path, node)) = pending.pop() {
            self.next_item += 1;
            let item = ItemRef::new(self.next_item);
            if let Some(children) = &node.children {
                pending.extend(children.iter().enumerate().map(|(i, c)| (path.child(i), c)));
            }
            self.items.insert(item, path.clone());
            self.paths.insert(path, item);
        }
        self.roots = roots;
        self.populated = true;
    }

    fn node(&self, path: &IndexPath) -> Option<&TreeNode<String>> {
        let (first, rest) = path.indices().split_first()?;
        let mut node = self.roots.get(*first)?;
        for index in rest {
            node = node.children.as_ref()?.get(*index)?;
        }
        Some(node)
    }

    fn node_for_item(&self, item: ItemRef) -> Option<&TreeNode<String>> {
        self.node(self.items.get(&item)?)
    }
}

/// Native data source backed by the outline's current content.
#[derive(Default)]
pub struct TreeDataSource {
    index: RefCell<TreeIndex>,
    restoring: Cell<bool>,
}

impl TreeDataSource {
    /// Whether any content has been supplied.
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.index.borrow().populated
    }

    #[must_use]
    pub fn path_for_item(&self, item: ItemRef) -> Option<IndexPath> {
        self.index.borrow().items.get(&item).cloned()
    }

    #[must_use]
    pub fn item_for_path(&self, path: &IndexPath) -> Option<ItemRef> {
        self.index.borrow().paths.get(path).copied()
    }

    #[must_use]
    pub fn value_at(&self, path: &IndexPath) -> Option<String> {
        self.index.borrow().node(path).map(|node| node.value.clone())
    }

    fn replace(&self, roots: Vec<TreeNode<String>>) {
        self.index.borrow_mut().replace(roots);
    }

    fn is_restoring(&self) -> bool {
        self.restoring.get()
    }
}

impl fmt::Debug for TreeDataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index = self.index.borrow();
        f.debug_struct("TreeDataSource")
            .field("populated", &index.populated)
            .field("nodes", &index.items.len())
            .finish()
    }
}

impl OutlineViewDataSource for TreeDataSource {
    fn number_of_children(&self, _outline: &NativeOutlineView, item: Option<ItemRef>) -> usize {
        let index = self.index.borrow();
        match item {
            None => index.roots.len(),
            Some(item) => index
                .node_for_item(item)
                .and_then(|node| node.children.as_ref())
                .map_or(0, Vec::len),
        }
    }

    fn child(
        &self,
        _outline: &NativeOutlineView,
        position: usize,
        item: Option<ItemRef>,
    ) -> Option<ItemRef> {
        let index = self.index.borrow();
        let path = match item {
            None => IndexPath::new(vec![position]),
            Some(item) => index.items.get(&item)?.child(position),
        };
        index.paths.get(&path).copied()
    }

    fn is_item_expandable(&self, _outline: &NativeOutlineView, item: ItemRef) -> bool {
        self.index
            .borrow()
            .node_for_item(item)
            .is_some_and(|node| node.children.is_some())
    }

    fn object_value(&self, _outline: &NativeOutlineView, item: ItemRef) -> Option<String> {
        self.index
            .borrow()
            .node_for_item(item)
            .map(|node| node.value.clone())
    }
}

fn selected_path(outline: &NativeOutlineView, source: &TreeDataSource) -> Option<IndexPath> {
    let item = outline.item_at_row(outline.selected_row()?)?;
    source.path_for_item(item)
}

fn row_for_path(
    outline: &NativeOutlineView,
    source: &TreeDataSource,
    path: &IndexPath,
) -> Option<usize> {
    if !outline.is_loaded() {
        return None;
    }
    outline.row_for_item(source.item_for_path(path)?)
}

/// Expand `path` and every ancestor, outermost first.
fn expand_path(outline: &NativeOutlineView, source: &TreeDataSource, path: &IndexPath) -> bool {
    for prefix in path.prefixes() {
        let Some(item) = source.item_for_path(&prefix) else {
            tracing::debug!(path = %prefix, "expand: path not in tree");
            return false;
        };
        if !outline.expand_item(item, false) {
            return false;
        }
    }
    true
}

/// Native outline delegate fronting the mount's [`Delegate`].
struct OutlineDelegateAdapter {
    delegate: Rc<Delegate>,
    source: Rc<TreeDataSource>,
}

impl OutlineViewDelegate for OutlineDelegateAdapter {
    fn should_expand_item(&self, _outline: &NativeOutlineView, item: ItemRef) -> bool {
        if self.source.is_restoring() {
            return true;
        }
        let Some(path) = self.source.path_for_item(item) else {
            return true;
        };
        self.delegate
            .try_single_handler(SHOULD_EXPAND, path)
            .unwrap_or(true)
    }

    fn item_will_expand(&self, _outline: &NativeOutlineView, item: ItemRef) {
        if self.source.is_restoring() {
            return;
        }
        if let Some(path) = self.source.path_for_item(item) {
            self.delegate.multi_handler(ITEM_WILL_EXPAND, path);
        }
    }

    fn selection_did_change(&self, outline: &NativeOutlineView) {
        if self.source.is_restoring() {
            return;
        }
        let path = selected_path(outline, &self.source);
        self.delegate.multi_handler(SELECTION_DID_CHANGE, path);
    }
}

pub enum OutlineViewBinding {
    Inherited(ControlBinding),

    Tree(Dynamic<Vec<TreeNode<String>>>),
    Select(Dynamic<Option<IndexPath>>),

    Expand(Signal<IndexPath>),

    SelectionChanged(SignalInput<Option<IndexPath>>),
    ShouldExpand(Callback<IndexPath, bool>),
    ItemWillExpand(Callback<IndexPath>),
}

inherit_bindings!(
    OutlineViewBinding => ControlBinding => ViewBinding => BaseBinding<NativeView>
);

impl OutlineViewBinding {
    /// Outline content. Each value replaces the whole tree.
    pub fn tree() -> BindingName<Dynamic<Vec<TreeNode<String>>>, Self> {
        BindingName::new("tree", Self::Tree)
    }

    pub fn select() -> BindingName<Dynamic<Option<IndexPath>>, Self> {
        BindingName::new("select", Self::Select)
    }

    /// Expand the node at each path, along with its ancestors.
    pub fn expand() -> BindingName<Signal<IndexPath>, Self> {
        BindingName::new("expand", Self::Expand)
    }

    pub fn selection_changed() -> BindingName<SignalInput<Option<IndexPath>>, Self> {
        BindingName::new("selection_changed", Self::SelectionChanged)
    }

    pub fn should_expand() -> BindingName<Callback<IndexPath, bool>, Self> {
        BindingName::new("should_expand", Self::ShouldExpand)
    }

    pub fn item_will_expand() -> BindingName<Callback<IndexPath>, Self> {
        BindingName::new("item_will_expand", Self::ItemWillExpand)
    }
}

impl Binding for OutlineViewBinding {
    fn name(&self) -> &'static str {
        match self {
            Self::Inherited(b) => b.name(),
            Self::Tree(_) => "tree",
            Self::Select(_) => "select",
            Self::Expand(_) => "expand",
            Self::SelectionChanged(_) => "selection_changed",
            Self::ShouldExpand(_) => "should_expand",
            Self::ItemWillExpand(_) => "item_will_expand",
        }
    }
}

#[derive(Debug)]
pub struct OutlineViewStorage {
    control: ControlStorage,
    outline: NativeOutlineView,
    source: Rc<TreeDataSource>,
}

impl OutlineViewStorage {
    #[must_use]
    pub fn source(&self) -> &Rc<TreeDataSource> {
        &self.source
    }

    /// Path of the node shown at `row`. `None` before the first content.
    #[must_use]
    pub fn index_path_for_row(&self, row: usize) -> Option<IndexPath> {
        if !self.outline.is_loaded() {
            return None;
        }
        self.source.path_for_item(self.outline.item_at_row(row)?)
    }

    /// Row showing the node at `path`, if it is visible.
    #[must_use]
    pub fn row_for_index_path(&self, path: &IndexPath) -> Option<usize> {
        row_for_path(&self.outline, &self.source, path)
    }
}

/// Replace the content, then put back what the user had expanded and
/// selected.
fn replace_tree(
    outline: &NativeOutlineView,
    source: &TreeDataSource,
    delegate: Option<&Delegate>,
    roots: Vec<TreeNode<String>>,
) {
    let mut expanded: Vec<IndexPath> = (0..outline.number_of_rows())
        .filter_map(|row| outline.item_at_row(row))
        .filter(|item| outline.is_item_expanded(*item))
        .filter_map(|item| source.path_for_item(item))
        .collect();
    expanded.sort_by_key(IndexPath::len);
    let selected = selected_path(outline, source);

    source.replace(roots);
    source.restoring.set(true);
    outline.reload_data();
    for path in &expanded {
        if let Some(item) = source.item_for_path(path) {
            outline.expand_item(item, false);
        }
    }
    let row = selected
        .as_ref()
        .and_then(|path| row_for_path(outline, source, path));
    outline.select_row(row);
    source.restoring.set(false);

    let now = selected_path(outline, source);
    tracing::trace!(
        id = %outline.id(),
        rows = outline.number_of_rows(),
        expanded = expanded.len(),
        "outline content replaced"
    );
    if now != selected
        && let Some(delegate) = delegate
    {
        delegate.multi_handler(SELECTION_DID_CHANGE, now);
    }
}

#[derive(Debug, Default)]
pub struct OutlineViewPreparer {
    inherited: ControlPreparer,
}

impl Preparer for OutlineViewPreparer {
    type Binding = OutlineViewBinding;
    type Instance = NativeOutlineView;
    type Storage = OutlineViewStorage;

    fn prepare_binding(&mut self, binding: &OutlineViewBinding, ctx: &mut MountContext<'_>) {
        match binding {
            OutlineViewBinding::Inherited(b) => self.inherited.prepare_binding(b, ctx),
            OutlineViewBinding::ShouldExpand(callback) => {
                ctx.delegate().add_single_handler(SHOULD_EXPAND, callback.clone());
            }
            OutlineViewBinding::ItemWillExpand(callback) => {
                ctx.delegate().add_multi_handler(ITEM_WILL_EXPAND, callback.clone());
            }
            OutlineViewBinding::SelectionChanged(input) => {
                let input = input.clone();
                ctx.delegate().add_multi_handler(
                    SELECTION_DID_CHANGE,
                    Callback::new(move |path: Option<IndexPath>| input.send(path)),
                );
            }
            _ => {}
        }
    }

    fn prepare_instance(
        &mut self,
        instance: &NativeOutlineView,
        storage: &OutlineViewStorage,
        ctx: &mut MountContext<'_>,
    ) {
        let source: Weak<dyn OutlineViewDataSource> =
            Rc::downgrade(&storage.source) as Weak<dyn OutlineViewDataSource>;
        instance.set_data_source(Some(source));
        if let Some(delegate) = ctx.install_delegate("delegate") {
            let adapter = Rc::new(OutlineDelegateAdapter {
                delegate,
                source: Rc::clone(&storage.source),
            });
            let weak: Weak<dyn OutlineViewDelegate> =
                Rc::downgrade(&adapter) as Weak<dyn OutlineViewDelegate>;
            instance.set_delegate(Some(weak));
            ctx.retain(adapter);
        }
        self.inherited
            .prepare_instance(instance.as_control(), &storage.control, ctx);
    }

    fn apply_binding(
        &mut self,
        binding: OutlineViewBinding,
        instance: &NativeOutlineView,
        storage: &OutlineViewStorage,
        ctx: &mut MountContext<'_>,
    ) -> Option<Lifetime> {
        match binding {
            OutlineViewBinding::Inherited(b) => {
                self.inherited
                    .apply_binding(b, instance.as_control(), &storage.control, ctx)
            }
            OutlineViewBinding::ShouldExpand(_)
            | OutlineViewBinding::ItemWillExpand(_)
            | OutlineViewBinding::SelectionChanged(_) => None,
            OutlineViewBinding::Tree(value) => {
                let outline = instance.clone();
                let source = Rc::clone(&storage.source);
                let delegate = ctx.existing_delegate();
                value.apply(move |roots| {
                    replace_tree(&outline, &source, delegate.as_deref(), roots)
                })
            }
            OutlineViewBinding::Select(value) => {
                let outline = instance.clone();
                let source = Rc::clone(&storage.source);
                value.apply(move |path: Option<IndexPath>| {
                    let row = path.and_then(|p| row_for_path(&outline, &source, &p));
                    outline.select_row(row);
                })
            }
            OutlineViewBinding::Expand(signal) => {
                let outline = instance.clone();
                let source = Rc::clone(&storage.source);
                Some(signal.subscribe(move |path| {
                    expand_path(&outline, &source, path);
                }))
            }
        }
    }

    fn finalize_instance(
        &mut self,
        instance: &NativeOutlineView,
        storage: &OutlineViewStorage,
        ctx: &mut MountContext<'_>,
    ) -> Option<Lifetime> {
        self.inherited
            .finalize_instance(instance.as_control(), &storage.control, ctx)
    }
}

impl BinderPreparer for OutlineViewPreparer {
    const WIDGET: &'static str = "OutlineView";
    type Parameters = ();

    fn construct_instance(
        &mut self,
        _parameters: (),
        _ctx: &mut MountContext<'_>,
    ) -> NativeOutlineView {
        NativeOutlineView::new(Rect::ZERO)
    }

    fn construct_storage(&mut self, instance: &NativeOutlineView) -> OutlineViewStorage {
        OutlineViewStorage {
            control: ControlStorage::default(),
            outline: instance.clone(),
            source: Rc::new(TreeDataSource::default()),
        }
    }

    fn instance_key(instance: &NativeOutlineView) -> InstanceKey {
        instance_key(instance.as_view())
    }
}

pub type OutlineView = Binder<OutlineViewPreparer>;
