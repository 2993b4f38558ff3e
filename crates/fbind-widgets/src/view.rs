#![forbid(unsafe_code)]

//! View binder: the first level above the binder base.
//!
//! # Bindings
//!
//! | Binding | Kind | Phase |
//! |---------|------|-------|
//! | `layer_backed` | Constant | prepare instance |
//! | `tag` | Constant | apply |
//! | `frame`, `hidden`, `tooltip`, `subviews` | Dynamic | apply |
//! | `scroll_to` | Signal | apply |

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use fbind_core::{
    AppContext, BaseBinding, BasePreparer, Binder, BinderPreparer, Binding, BindingName, Constant,
    Dynamic, InstanceKey, Lifetime, MountContext, ObjectStorage, Preparer, Signal,
    WeakAppContext, inherit_bindings,
};
use fbind_headless::{
    NativeButton, NativeControl, NativeOutlineView, NativePopUpButton, NativeView, Point, Rect,
};

/// A native object that is, or extends, a view.
pub trait ViewInstance: Clone + 'static {
    fn native_view(&self) -> &NativeView;
}

impl ViewInstance for NativeView {
    fn native_view(&self) -> &NativeView {
        self
    }
}

impl ViewInstance for NativeControl {
    fn native_view(&self) -> &NativeView {
        self.as_view()
    }
}

impl ViewInstance for NativeButton {
    fn native_view(&self) -> &NativeView {
        self.as_view()
    }
}

impl ViewInstance for NativePopUpButton {
    fn native_view(&self) -> &NativeView {
        self.as_view()
    }
}

impl ViewInstance for NativeOutlineView {
    fn native_view(&self) -> &NativeView {
        self.as_view()
    }
}

/// Anything that can produce a native view on demand: a native view itself
/// or a binder whose instance is a view.
pub trait ViewConvertible {
    fn view_instance(&self, app: &AppContext) -> NativeView;

    /// Whether `view_instance` mounts into the context, making the caller
    /// responsible for the teardown.
    fn owns_mount(&self) -> bool {
        false
    }
}

impl ViewConvertible for NativeView {
    fn view_instance(&self, _app: &AppContext) -> NativeView {
        self.clone()
    }
}

impl<P> ViewConvertible for Binder<P>
where
    P: BinderPreparer,
    P::Instance: ViewInstance,
{
    fn view_instance(&self, app: &AppContext) -> NativeView {
        self.instance(app).native_view().clone()
    }

    fn owns_mount(&self) -> bool {
        true
    }
}

/// Type-erased [`ViewConvertible`]. Equality is identity.
#[derive(Clone)]
pub struct AnyView(Rc<dyn ViewConvertible>);

impl AnyView {
    pub fn new(view: impl ViewConvertible + 'static) -> Self {
        Self(Rc::new(view))
    }

    #[must_use]
    pub fn view_instance(&self, app: &AppContext) -> NativeView {
        self.0.view_instance(app)
    }

    #[must_use]
    pub fn owns_mount(&self) -> bool {
        self.0.owns_mount()
    }
}

impl PartialEq for AnyView {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for AnyView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyView").finish_non_exhaustive()
    }
}

impl From<NativeView> for AnyView {
    fn from(view: NativeView) -> Self {
        Self::new(view)
    }
}

impl<P> From<Binder<P>> for AnyView
where
    P: BinderPreparer + 'static,
    P::Instance: ViewInstance,
{
    fn from(binder: Binder<P>) -> Self {
        Self::new(binder)
    }
}

pub(crate) fn instance_key(view: &NativeView) -> InstanceKey {
    InstanceKey::new(view.id().get())
}

/// Child binders mounted by one parent binding.
///
/// A replacement tears down the children that left the batch; [`lifetime`]
/// tears down whatever is left when the parent goes.
///
/// [`lifetime`]: ChildMounts::lifetime
pub(crate) struct ChildMounts {
    app: WeakAppContext,
    keys: RefCell<Vec<InstanceKey>>,
}

impl ChildMounts {
    pub(crate) fn new(app: WeakAppContext) -> Rc<Self> {
        Rc::new(Self {
            app,
            keys: RefCell::new(Vec::new()),
        })
    }

    /// Materialize `views`, then detach the previous batch's children that
    /// are not part of this one.
    pub(crate) fn replace(&self, app: &AppContext, views: &[AnyView]) -> Vec<NativeView> {
        let mut keys = Vec::new();
        let natives = views
            .iter()
            .map(|view| {
                let native = view.view_instance(app);
                if view.owns_mount() {
                    keys.push(instance_key(&native));
                }
                native
            })
            .collect();
        let previous = self.keys.replace(keys.clone());
        for key in previous.into_iter().filter(|key| !keys.contains(key)) {
            app.teardown(key);
        }
        natives
    }

    fn teardown_all(&self) {
        let keys = self.keys.take();
        let Some(app) = self.app.upgrade() else {
            return;
        };
        tracing::debug!(children = keys.len(), "tearing down child mounts");
        for key in keys {
            app.teardown(key);
        }
    }

    /// Ends with the parent. `subscription`, if any, is cancelled first.
    pub(crate) fn lifetime(self: &Rc<Self>, subscription: Option<Lifetime>) -> Lifetime {
        let mounts = Rc::clone(self);
        let teardown = Lifetime::new(move || mounts.teardown_all());
        Lifetime::merge([teardown].into_iter().chain(subscription))
    }
}

pub enum ViewBinding {
    Inherited(BaseBinding<NativeView>),

    LayerBacked(Constant<bool>),
    Tag(Constant<i64>),

    Frame(Dynamic<Rect>),
    Hidden(Dynamic<bool>),
    Tooltip(Dynamic<Option<String>>),
    Subviews(Dynamic<Vec<AnyView>>),

    ScrollTo(Signal<Point>),
}

inherit_bindings!(ViewBinding => BaseBinding<NativeView>);

impl ViewBinding {
    pub fn layer_backed() -> BindingName<Constant<bool>, Self> {
        BindingName::new("layer_backed", Self::LayerBacked)
    }

    pub fn tag() -> BindingName<Constant<i64>, Self> {
        BindingName::new("tag", Self::Tag)
    }

    pub fn frame() -> BindingName<Dynamic<Rect>, Self> {
        BindingName::new("frame", Self::Frame)
    }

    pub fn hidden() -> BindingName<Dynamic<bool>, Self> {
        BindingName::new("hidden", Self::Hidden)
    }

    pub fn tooltip() -> BindingName<Dynamic<Option<String>>, Self> {
        BindingName::new("tooltip", Self::Tooltip)
    }

    pub fn subviews() -> BindingName<Dynamic<Vec<AnyView>>, Self> {
        BindingName::new("subviews", Self::Subviews)
    }

    pub fn scroll_to() -> BindingName<Signal<Point>, Self> {
        BindingName::new("scroll_to", Self::ScrollTo)
    }
}

impl Binding for ViewBinding {
    fn name(&self) -> &'static str {
        match self {
            Self::Inherited(b) => b.name(),
            Self::LayerBacked(_) => "layer_backed",
            Self::Tag(_) => "tag",
            Self::Frame(_) => "frame",
            Self::Hidden(_) => "hidden",
            Self::Tooltip(_) => "tooltip",
            Self::Subviews(_) => "subviews",
            Self::ScrollTo(_) => "scroll_to",
        }
    }
}

#[derive(Debug, Default)]
pub struct ViewStorage {
    base: ObjectStorage,
}

#[derive(Debug, Default)]
pub struct ViewPreparer {
    inherited: BasePreparer<NativeView>,
    layer_backed: Option<bool>,
}

impl Preparer for ViewPreparer {
    type Binding = ViewBinding;
    type Instance = NativeView;
    type Storage = ViewStorage;

    fn prepare_binding(&mut self, binding: &ViewBinding, ctx: &mut MountContext<'_>) {
        match binding {
            ViewBinding::Inherited(b) => self.inherited.prepare_binding(b, ctx),
            ViewBinding::LayerBacked(c) => self.layer_backed = Some(*c.value()),
            _ => {}
        }
    }

    fn prepare_instance(
        &mut self,
        instance: &NativeView,
        storage: &ViewStorage,
        ctx: &mut MountContext<'_>,
    ) {
        if let Some(layer_backed) = self.layer_backed {
            instance.set_wants_layer(layer_backed);
        }
        self.inherited.prepare_instance(instance, &storage.base, ctx);
    }

    fn apply_binding(
        &mut self,
        binding: ViewBinding,
        instance: &NativeView,
        storage: &ViewStorage,
        ctx: &mut MountContext<'_>,
    ) -> Option<Lifetime> {
        match binding {
            ViewBinding::Inherited(b) => {
                self.inherited.apply_binding(b, instance, &storage.base, ctx)
            }
            ViewBinding::LayerBacked(_) => None,
            ViewBinding::Tag(tag) => {
                instance.set_tag(Some(tag.into_value()));
                None
            }
            ViewBinding::Frame(value) => {
                let view = instance.clone();
                value.apply(move |frame| view.set_frame(frame))
            }
            ViewBinding::Hidden(value) => {
                let view = instance.clone();
                value.apply(move |hidden| view.set_hidden(hidden))
            }
            ViewBinding::Tooltip(value) => {
                let view = instance.clone();
                value.apply(move |tooltip| view.set_tooltip(tooltip))
            }
            ViewBinding::Subviews(value) => {
                let view = instance.clone();
                let app = ctx.app().downgrade();
                let mounts = ChildMounts::new(app.clone());
                let children = Rc::clone(&mounts);
                let subscription = value.apply(move |subviews: Vec<AnyView>| {
                    let Some(app) = app.upgrade() else {
                        return;
                    };
                    view.set_subviews(children.replace(&app, &subviews));
                });
                Some(mounts.lifetime(subscription))
            }
            ViewBinding::ScrollTo(signal) => {
                let view = instance.clone();
                Some(signal.subscribe(move |origin| view.scroll_to(*origin)))
            }
        }
    }

    fn finalize_instance(
        &mut self,
        instance: &NativeView,
        storage: &ViewStorage,
        ctx: &mut MountContext<'_>,
    ) -> Option<Lifetime> {
        self.inherited.finalize_instance(instance, &storage.base, ctx)
    }
}

impl BinderPreparer for ViewPreparer {
    const WIDGET: &'static str = "View";
    type Parameters = ();

    fn construct_instance(&mut self, _parameters: (), _ctx: &mut MountContext<'_>) -> NativeView {
        NativeView::new(Rect::ZERO)
    }

    fn construct_storage(&mut self, _instance: &NativeView) -> ViewStorage {
        ViewStorage::default()
    }

    fn instance_key(instance: &NativeView) -> InstanceKey {
        instance_key(instance)
    }
}

pub type View = Binder<ViewPreparer>;

#[cfg(test)]
mod tests {
    use super::*;
    use fbind_core::{Observable, bindings};

    #[test]
    fn layer_backing_is_set_before_apply() {
        let app = AppContext::default();
        let view = View::new(bindings![
            BaseBinding::on_prepare(|v: &NativeView| assert!(v.wants_layer())),
            ViewBinding::layer_backed().is(true),
        ])
        .instance(&app);
        assert!(view.wants_layer());
    }

    #[test]
    fn subviews_mount_child_binders() {
        let app = AppContext::default();
        let child = View::new(bindings![ViewBinding::tag().is(4i64)]);
        let parent = View::new(bindings![ViewBinding::subviews().is(vec![AnyView::from(child)])])
            .instance(&app);
        let subviews = parent.subviews();
        assert_eq!(subviews.len(), 1);
        assert_eq!(subviews[0].tag(), Some(4));
        assert_eq!(app.mounted(), 2);
    }

    #[test]
    fn hidden_tracks_observable() {
        let app = AppContext::default();
        let hidden = Observable::new(false);
        let view = View::new(bindings![ViewBinding::hidden().observe(&hidden)]).instance(&app);
        assert!(!view.is_hidden());
        hidden.set(true);
        assert!(view.is_hidden());
    }

    #[test]
    fn scroll_signal_moves_origin() {
        let app = AppContext::default();
        let (input, signal) = Signal::channel();
        let view = View::new(bindings![ViewBinding::scroll_to().bind(signal)]).instance(&app);
        input.send(Point::new(0.0, 12.0));
        assert_eq!(view.scroll_origin(), Point::new(0.0, 12.0));
    }
}
