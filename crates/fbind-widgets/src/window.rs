#![forbid(unsafe_code)]

//! Window binder.
//!
//! Windows are not views: the chain is `WindowPreparer` over the binder
//! base directly.
//!
//! # Bindings
//!
//! | Binding | Kind | Phase |
//! |---------|------|-------|
//! | `defer_creation` | Constant | construct |
//! | `style_mask`, `content_rect` | Dynamic | initial value at construct, then apply |
//! | `title`, `content_view` | Dynamic | apply |
//! | `initial_first_responder` | Constant (tag) | finalize |
//! | `should_close` | single delegate handler | prepare |
//! | `will_close`, `did_become_key` | multi delegate handler | prepare |
//! | `close`, `order_front` | Signal | apply |
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | first responder tag not found | logged at `debug`, slot left empty |
//! | content view binder mounted after the context is gone | update ignored |
//! | content view replaced or window torn down | previous content binder torn down |

use std::rc::{Rc, Weak};

use fbind_core::{
    BaseBinding, BasePreparer, Binder, BinderPreparer, Binding, BindingName, Callback, Constant,
    Delegate, Dynamic, InstanceKey, Lifetime, MountContext, ObjectStorage, Preparer, Selector,
    Signal, SignalInput, inherit_bindings,
};
use fbind_headless::{NativeWindow, Rect, StyleMask, WindowDelegate};

use crate::view::{AnyView, ChildMounts};

const PROTOCOL: &str = "WindowDelegate";

pub const SHOULD_CLOSE: Selector = Selector::new(PROTOCOL, "window_should_close");
pub const WILL_CLOSE: Selector = Selector::new(PROTOCOL, "window_will_close");
pub const DID_BECOME_KEY: Selector = Selector::new(PROTOCOL, "window_did_become_key");

/// Native window delegate fronting the mount's [`Delegate`].
struct WindowDelegateAdapter(Rc<Delegate>);

impl WindowDelegate for WindowDelegateAdapter {
    fn window_should_close(&self, _window: &NativeWindow) -> bool {
        self.0.try_single_handler(SHOULD_CLOSE, ()).unwrap_or(true)
    }

    fn window_will_close(&self, _window: &NativeWindow) {
        self.0.multi_handler(WILL_CLOSE, ());
    }

    fn window_did_become_key(&self, _window: &NativeWindow) {
        self.0.multi_handler(DID_BECOME_KEY, ());
    }
}

pub enum WindowBinding {
    Inherited(BaseBinding<NativeWindow>),

    DeferCreation(Constant<bool>),
    StyleMask(Dynamic<StyleMask>),
    ContentRect(Dynamic<Rect>),
    InitialFirstResponder(Constant<i64>),

    Title(Dynamic<String>),
    ContentView(Dynamic<AnyView>),

    Close(Signal<()>),
    OrderFront(Signal<()>),

    ShouldClose(Callback<(), bool>),
    WillClose(Callback<()>),
    DidBecomeKey(SignalInput<()>),
}

inherit_bindings!(WindowBinding => BaseBinding<NativeWindow>);

impl WindowBinding {
    pub fn defer_creation() -> BindingName<Constant<bool>, Self> {
        BindingName::new("defer_creation", Self::DeferCreation)
    }

    pub fn style_mask() -> BindingName<Dynamic<StyleMask>, Self> {
        BindingName::new("style_mask", Self::StyleMask)
    }

    pub fn content_rect() -> BindingName<Dynamic<Rect>, Self> {
        BindingName::new("content_rect", Self::ContentRect)
    }

    /// Tag of the view, inside the content view, that takes focus first.
    pub fn initial_first_responder() -> BindingName<Constant<i64>, Self> {
        BindingName::new("initial_first_responder", Self::InitialFirstResponder)
    }

    pub fn title() -> BindingName<Dynamic<String>, Self> {
        BindingName::new("title", Self::Title)
    }

    pub fn content_view() -> BindingName<Dynamic<AnyView>, Self> {
        BindingName::new("content_view", Self::ContentView)
    }

    pub fn close() -> BindingName<Signal<()>, Self> {
        BindingName::new("close", Self::Close)
    }

    /// Make the window key and bring it to the front.
    pub fn order_front() -> BindingName<Signal<()>, Self> {
        BindingName::new("order_front", Self::OrderFront)
    }

    /// Decides whether a user close goes ahead. Windows close when unset.
    pub fn should_close() -> BindingName<Callback<(), bool>, Self> {
        BindingName::new("should_close", Self::ShouldClose)
    }

    pub fn will_close() -> BindingName<Callback<()>, Self> {
        BindingName::new("will_close", Self::WillClose)
    }

    pub fn did_become_key() -> BindingName<SignalInput<()>, Self> {
        BindingName::new("did_become_key", Self::DidBecomeKey)
    }
}

impl Binding for WindowBinding {
    fn name(&self) -> &'static str {
        match self {
            Self::Inherited(b) => b.name(),
            Self::DeferCreation(_) => "defer_creation",
            Self::StyleMask(_) => "style_mask",
            Self::ContentRect(_) => "content_rect",
            Self::InitialFirstResponder(_) => "initial_first_responder",
            Self::Title(_) => "title",
            Self::ContentView(_) => "content_view",
            Self::Close(_) => "close",
            Self::OrderFront(_) => "order_front",
            Self::ShouldClose(_) => "should_close",
            Self::WillClose(_) => "will_close",
            Self::DidBecomeKey(_) => "did_become_key",
        }
    }
}

#[derive(Debug, Default)]
pub struct WindowStorage {
    base: ObjectStorage,
}

#[derive(Debug, Default)]
pub struct WindowPreparer {
    inherited: BasePreparer<NativeWindow>,
    defer_creation: bool,
    style_mask: Option<StyleMask>,
    content_rect: Option<Rect>,
    first_responder_tag: Option<i64>,
}

impl Preparer for WindowPreparer {
    type Binding = WindowBinding;
    type Instance = NativeWindow;
    type Storage = WindowStorage;

    fn prepare_binding(&mut self, binding: &WindowBinding, ctx: &mut MountContext<'_>) {
        match binding {
            WindowBinding::Inherited(b) => self.inherited.prepare_binding(b, ctx),
            WindowBinding::DeferCreation(defer) => self.defer_creation = *defer.value(),
            WindowBinding::StyleMask(mask) => {
                if let Some(mask) = mask.initial_value() {
                    self.style_mask = Some(mask);
                }
            }
            WindowBinding::ContentRect(rect) => {
                if let Some(rect) = rect.initial_value() {
                    self.content_rect = Some(rect);
                }
            }
            WindowBinding::InitialFirstResponder(tag) => {
                self.first_responder_tag = Some(*tag.value());
            }
            WindowBinding::ShouldClose(callback) => {
                ctx.delegate().add_single_handler(SHOULD_CLOSE, callback.clone());
            }
            WindowBinding::WillClose(callback) => {
                ctx.delegate().add_multi_handler(WILL_CLOSE, callback.clone());
            }
            WindowBinding::DidBecomeKey(input) => {
                let input = input.clone();
                ctx.delegate()
                    .add_multi_handler(DID_BECOME_KEY, Callback::new(move |()| input.send(())));
            }
            _ => {}
        }
    }

    fn prepare_instance(
        &mut self,
        instance: &NativeWindow,
        storage: &WindowStorage,
        ctx: &mut MountContext<'_>,
    ) {
        if let Some(delegate) = ctx.install_delegate("delegate") {
            let adapter = Rc::new(WindowDelegateAdapter(delegate));
            let weak: Weak<dyn WindowDelegate> =
                Rc::downgrade(&adapter) as Weak<dyn WindowDelegate>;
            instance.set_delegate(Some(weak));
            ctx.retain(adapter);
        }
        self.inherited.prepare_instance(instance, &storage.base, ctx);
    }

    fn apply_binding(
        &mut self,
        binding: WindowBinding,
        instance: &NativeWindow,
        storage: &WindowStorage,
        ctx: &mut MountContext<'_>,
    ) -> Option<Lifetime> {
        match binding {
            WindowBinding::Inherited(b) => {
                self.inherited.apply_binding(b, instance, &storage.base, ctx)
            }
            WindowBinding::DeferCreation(_)
            | WindowBinding::InitialFirstResponder(_)
            | WindowBinding::ShouldClose(_)
            | WindowBinding::WillClose(_)
            | WindowBinding::DidBecomeKey(_) => None,
            WindowBinding::StyleMask(value) => {
                let window = instance.clone();
                value.apply(move |mask| window.set_style_mask(mask))
            }
            WindowBinding::ContentRect(value) => {
                let window = instance.clone();
                value.apply(move |rect| window.set_content_rect(rect))
            }
            WindowBinding::Title(value) => {
                let window = instance.clone();
                value.apply(move |title: String| window.set_title(title))
            }
            WindowBinding::ContentView(value) => {
                let window = instance.clone();
                let app = ctx.app().downgrade();
                let mounts = ChildMounts::new(app.clone());
                let children = Rc::clone(&mounts);
                let subscription = value.apply(move |view: AnyView| {
                    let Some(app) = app.upgrade() else {
                        return;
                    };
                    let content = children.replace(&app, std::slice::from_ref(&view));
                    window.set_content_view(content.into_iter().next());
                });
                Some(mounts.lifetime(subscription))
            }
            WindowBinding::Close(signal) => {
                let window = instance.clone();
                Some(signal.subscribe(move |_| window.close()))
            }
            WindowBinding::OrderFront(signal) => {
                let window = instance.clone();
                Some(signal.subscribe(move |_| window.make_key_and_order_front()))
            }
        }
    }

    fn finalize_instance(
        &mut self,
        instance: &NativeWindow,
        storage: &WindowStorage,
        ctx: &mut MountContext<'_>,
    ) -> Option<Lifetime> {
        if let Some(tag) = self.first_responder_tag {
            let responder = instance
                .content_view()
                .and_then(|content| content.view_with_tag(tag));
            if responder.is_none() {
                tracing::debug!(tag, window = %instance.id(), "initial first responder not found");
            }
            instance.set_initial_first_responder(responder);
        }
        self.inherited.finalize_instance(instance, &storage.base, ctx)
    }
}

impl BinderPreparer for WindowPreparer {
    const WIDGET: &'static str = "Window";
    type Parameters = ();

    fn construct_instance(&mut self, _parameters: (), _ctx: &mut MountContext<'_>) -> NativeWindow {
        NativeWindow::new(
            self.content_rect.unwrap_or(Rect::ZERO),
            self.style_mask.unwrap_or_default(),
            self.defer_creation,
        )
    }

    fn construct_storage(&mut self, _instance: &NativeWindow) -> WindowStorage {
        WindowStorage::default()
    }

    fn instance_key(instance: &NativeWindow) -> InstanceKey {
        InstanceKey::new(instance.id().get())
    }
}

pub type Window = Binder<WindowPreparer>;
