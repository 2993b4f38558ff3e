#![forbid(unsafe_code)]

//! Button binder.

use fbind_core::{
    BaseBinding, Binder, BinderPreparer, Binding, BindingName, Dynamic, InstanceKey, Lifetime,
    MountContext, Preparer, Signal, inherit_bindings,
};
use fbind_headless::{ButtonState, ButtonType, NativeButton, NativeView, Rect};

use crate::control::{ControlBinding, ControlPreparer, ControlStorage};
use crate::view::{ViewBinding, instance_key};

pub enum ButtonBinding {
    Inherited(ControlBinding),

    Title(Dynamic<String>),
    State(Dynamic<ButtonState>),
    ButtonType(Dynamic<ButtonType>),
    KeyEquivalent(Dynamic<String>),

    PerformClick(Signal<()>),
}

inherit_bindings!(ButtonBinding => ControlBinding => ViewBinding => BaseBinding<NativeView>);

impl ButtonBinding {
    pub fn title() -> BindingName<Dynamic<String>, Self> {
        BindingName::new("title", Self::Title)
    }

    pub fn state() -> BindingName<Dynamic<ButtonState>, Self> {
        BindingName::new("state", Self::State)
    }

    pub fn button_type() -> BindingName<Dynamic<ButtonType>, Self> {
        BindingName::new("button_type", Self::ButtonType)
    }

    pub fn key_equivalent() -> BindingName<Dynamic<String>, Self> {
        BindingName::new("key_equivalent", Self::KeyEquivalent)
    }

    /// Click the button programmatically on every event.
    pub fn perform_click() -> BindingName<Signal<()>, Self> {
        BindingName::new("perform_click", Self::PerformClick)
    }
}

impl Binding for ButtonBinding {
    fn name(&self) -> &'static str {
        match self {
            Self::Inherited(b) => b.name(),
            Self::Title(_) => "title",
            Self::State(_) => "state",
            Self::ButtonType(_) => "button_type",
            Self::KeyEquivalent(_) => "key_equivalent",
            Self::PerformClick(_) => "perform_click",
        }
    }
}

#[derive(Debug, Default)]
pub struct ButtonStorage {
    control: ControlStorage,
}

impl ButtonStorage {
    #[must_use]
    pub fn control(&self) -> &ControlStorage {
        &self.control
    }
}

#[derive(Debug, Default)]
pub struct ButtonPreparer {
    inherited: ControlPreparer,
}

impl Preparer for ButtonPreparer {
    type Binding = ButtonBinding;
    type Instance = NativeButton;
    type Storage = ButtonStorage;

    fn prepare_binding(&mut self, binding: &ButtonBinding, ctx: &mut MountContext<'_>) {
        if let ButtonBinding::Inherited(b) = binding {
            self.inherited.prepare_binding(b, ctx);
        }
    }

    fn prepare_instance(
        &mut self,
        instance: &NativeButton,
        storage: &ButtonStorage,
        ctx: &mut MountContext<'_>,
    ) {
        self.inherited
            .prepare_instance(instance.as_control(), &storage.control, ctx);
    }

    fn apply_binding(
        &mut self,
        binding: ButtonBinding,
        instance: &NativeButton,
        storage: &ButtonStorage,
        ctx: &mut MountContext<'_>,
    ) -> Option<Lifetime> {
        match binding {
            ButtonBinding::Inherited(b) => {
                self.inherited
                    .apply_binding(b, instance.as_control(), &storage.control, ctx)
            }
            ButtonBinding::Title(value) => {
                let button = instance.clone();
                value.apply(move |title: String| button.set_title(title))
            }
            ButtonBinding::State(value) => {
                let button = instance.clone();
                value.apply(move |state| button.set_state(state))
            }
            ButtonBinding::ButtonType(value) => {
                let button = instance.clone();
                value.apply(move |button_type| button.set_button_type(button_type))
            }
            ButtonBinding::KeyEquivalent(value) => {
                let button = instance.clone();
                value.apply(move |key: String| button.set_key_equivalent(key))
            }
            ButtonBinding::PerformClick(signal) => {
                let button = instance.clone();
                Some(signal.subscribe(move |_| {
                    button.perform_click();
                }))
            }
        }
    }

    fn finalize_instance(
        &mut self,
        instance: &NativeButton,
        storage: &ButtonStorage,
        ctx: &mut MountContext<'_>,
    ) -> Option<Lifetime> {
        self.inherited
            .finalize_instance(instance.as_control(), &storage.control, ctx)
    }
}

impl BinderPreparer for ButtonPreparer {
    const WIDGET: &'static str = "Button";
    type Parameters = ();

    fn construct_instance(&mut self, _parameters: (), _ctx: &mut MountContext<'_>) -> NativeButton {
        NativeButton::new(Rect::ZERO)
    }

    fn construct_storage(&mut self, _instance: &NativeButton) -> ButtonStorage {
        ButtonStorage::default()
    }

    fn instance_key(instance: &NativeButton) -> InstanceKey {
        instance_key(instance.as_view())
    }
}

pub type Button = Binder<ButtonPreparer>;
