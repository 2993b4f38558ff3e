#![forbid(unsafe_code)]

//! Control binder.
//!
//! Target-action is served from storage: every control's target is the
//! [`ActionTable`] in its [`ControlStorage`], and each `action` binding adds
//! one entry to it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use fbind_core::{
    BaseBinding, Binder, BinderPreparer, Binding, BindingName, Dynamic, InstanceKey, Lifetime,
    MountContext, Preparer, SignalInput, inherit_bindings,
};
use fbind_headless::{ActionTarget, NativeControl, NativeView, ObjectId, Rect};

use crate::view::{ViewBinding, ViewPreparer, ViewStorage, instance_key};

type ActionHandler = Rc<dyn Fn()>;

/// Closures run, in registration order, when the control sends its action.
#[derive(Default)]
pub struct ActionTable {
    handlers: RefCell<Vec<(u64, ActionHandler)>>,
    next_id: Cell<u64>,
}

impl ActionTable {
    /// Register `handler` until the returned lifetime ends.
    pub fn add(self: &Rc<Self>, handler: impl Fn() + 'static) -> Lifetime {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.handlers.borrow_mut().push((id, Rc::new(handler)));
        let table: Weak<Self> = Rc::downgrade(self);
        Lifetime::new(move || {
            if let Some(table) = table.upgrade() {
                table.handlers.borrow_mut().retain(|(h, _)| *h != id);
            }
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.borrow().is_empty()
    }
}

impl ActionTarget for ActionTable {
    fn perform_action(&self, sender: ObjectId) {
        let handlers: Vec<ActionHandler> = self
            .handlers
            .borrow()
            .iter()
            .map(|(_, h)| Rc::clone(h))
            .collect();
        tracing::trace!(%sender, handlers = handlers.len(), "action");
        for handler in handlers {
            handler();
        }
    }
}

impl fmt::Debug for ActionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionTable")
            .field("handlers", &self.len())
            .finish()
    }
}

pub enum ControlBinding {
    Inherited(ViewBinding),

    Enabled(Dynamic<bool>),
    StringValue(Dynamic<String>),
    Continuous(Dynamic<bool>),

    Action(SignalInput<()>),
}

inherit_bindings!(ControlBinding => ViewBinding => BaseBinding<NativeView>);

impl ControlBinding {
    pub fn enabled() -> BindingName<Dynamic<bool>, Self> {
        BindingName::new("enabled", Self::Enabled)
    }

    pub fn string_value() -> BindingName<Dynamic<String>, Self> {
        BindingName::new("string_value", Self::StringValue)
    }

    pub fn continuous() -> BindingName<Dynamic<bool>, Self> {
        BindingName::new("continuous", Self::Continuous)
    }

    pub fn action() -> BindingName<SignalInput<()>, Self> {
        BindingName::new("action", Self::Action)
    }
}

impl Binding for ControlBinding {
    fn name(&self) -> &'static str {
        match self {
            Self::Inherited(b) => b.name(),
            Self::Enabled(_) => "enabled",
            Self::StringValue(_) => "string_value",
            Self::Continuous(_) => "continuous",
            Self::Action(_) => "action",
        }
    }
}

#[derive(Debug, Default)]
pub struct ControlStorage {
    view: ViewStorage,
    actions: Rc<ActionTable>,
}

impl ControlStorage {
    #[must_use]
    pub fn actions(&self) -> &Rc<ActionTable> {
        &self.actions
    }
}

#[derive(Debug, Default)]
pub struct ControlPreparer {
    inherited: ViewPreparer,
}

impl Preparer for ControlPreparer {
    type Binding = ControlBinding;
    type Instance = NativeControl;
    type Storage = ControlStorage;

    fn prepare_binding(&mut self, binding: &ControlBinding, ctx: &mut MountContext<'_>) {
        if let ControlBinding::Inherited(b) = binding {
            self.inherited.prepare_binding(b, ctx);
        }
    }

    fn prepare_instance(
        &mut self,
        instance: &NativeControl,
        storage: &ControlStorage,
        ctx: &mut MountContext<'_>,
    ) {
        let target: Weak<dyn ActionTarget> =
            Rc::downgrade(&storage.actions) as Weak<dyn ActionTarget>;
        instance.set_target(Some(target));
        self.inherited
            .prepare_instance(instance.as_view(), &storage.view, ctx);
    }

    fn apply_binding(
        &mut self,
        binding: ControlBinding,
        instance: &NativeControl,
        storage: &ControlStorage,
        ctx: &mut MountContext<'_>,
    ) -> Option<Lifetime> {
        match binding {
            ControlBinding::Inherited(b) => {
                self.inherited
                    .apply_binding(b, instance.as_view(), &storage.view, ctx)
            }
            ControlBinding::Enabled(value) => {
                let control = instance.clone();
                value.apply(move |enabled| control.set_enabled(enabled))
            }
            ControlBinding::StringValue(value) => {
                let control = instance.clone();
                value.apply(move |text: String| control.set_string_value(text))
            }
            ControlBinding::Continuous(value) => {
                let control = instance.clone();
                value.apply(move |continuous| control.set_continuous(continuous))
            }
            ControlBinding::Action(input) => Some(storage.actions.add(move || input.send(()))),
        }
    }

    fn finalize_instance(
        &mut self,
        instance: &NativeControl,
        storage: &ControlStorage,
        ctx: &mut MountContext<'_>,
    ) -> Option<Lifetime> {
        self.inherited
            .finalize_instance(instance.as_view(), &storage.view, ctx)
    }
}

impl BinderPreparer for ControlPreparer {
    const WIDGET: &'static str = "Control";
    type Parameters = ();

    fn construct_instance(
        &mut self,
        _parameters: (),
        _ctx: &mut MountContext<'_>,
    ) -> NativeControl {
        NativeControl::new(Rect::ZERO)
    }

    fn construct_storage(&mut self, _instance: &NativeControl) -> ControlStorage {
        ControlStorage::default()
    }

    fn instance_key(instance: &NativeControl) -> InstanceKey {
        instance_key(instance.as_view())
    }
}

pub type Control = Binder<ControlPreparer>;

#[cfg(test)]
mod tests {
    use super::*;
    use fbind_core::{AppContext, Observable, Signal, bindings};

    #[test]
    fn action_table_entries_end_with_their_lifetime() {
        let table = Rc::new(ActionTable::default());
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let mut lifetime = table.add(move || h.set(h.get() + 1));
        table.perform_action(NativeView::new(Rect::ZERO).id());
        lifetime.cancel();
        assert!(table.is_empty());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn enabled_and_value_bindings() {
        let app = AppContext::default();
        let enabled = Observable::new(true);
        let (input, text) = Signal::channel();
        let control = Control::new(bindings![
            ControlBinding::enabled().observe(&enabled),
            ControlBinding::string_value().bind(text),
            ControlBinding::continuous().is(true),
        ])
        .instance(&app);
        assert!(control.is_enabled());
        assert!(control.is_continuous());
        enabled.set(false);
        input.send(String::from("typed"));
        assert!(!control.is_enabled());
        assert_eq!(control.string_value(), "typed");
    }

    #[test]
    fn target_is_the_storage_action_table() {
        let app = AppContext::default();
        let (input, clicks) = Signal::<()>::channel();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let _watch = clicks.subscribe(move |_| c.set(c.get() + 1));
        let control = Control::new(bindings![ControlBinding::action().to(input)]).instance(&app);
        assert!(control.has_target());
        assert!(control.send_action());
        assert_eq!(count.get(), 1);

        let key = ControlPreparer::instance_key(&control);
        assert_eq!(app.storage::<ControlStorage>(key).map(|s| s.actions().len()), Some(1));
        app.teardown(key);
        assert!(!control.has_target());
    }
}
