#![forbid(unsafe_code)]

//! Pop-up button binder.
//!
//! Indices crossing the binding boundary are logical: index 0 is the first
//! real item in both modes. The native pull-down title item is hidden by
//! offsetting with the native `pulls_down` flag at the moment a value is
//! applied or an event is read.
//!
//! # Bindings
//!
//! | Binding | Kind | Notes |
//! |---------|------|-------|
//! | `pulls_down` | Dynamic | initial value chooses the construction mode |
//! | `items` | Dynamic | native items verbatim; pull-downs list the title first |
//! | `selected_index` | Dynamic | logical; `None` clears |
//! | `will_pop_up` | SignalInput | observer removed when the lifetime ends |
//! | `selection_changed` | SignalInput | logical index, sent from the action |

use fbind_core::{
    BaseBinding, Binder, BinderPreparer, Binding, BindingName, Dynamic, InstanceKey, Lifetime,
    MountContext, Preparer, SignalInput, inherit_bindings,
};
use fbind_headless::{NativePopUpButton, NativeView, Rect};

use crate::button::{ButtonBinding, ButtonPreparer, ButtonStorage};
use crate::control::ControlBinding;
use crate::view::{ViewBinding, instance_key};

fn title_offset(popup: &NativePopUpButton) -> usize {
    usize::from(popup.pulls_down())
}

/// Logical index of the native selection.
#[must_use]
pub fn logical_selection(popup: &NativePopUpButton) -> Option<usize> {
    let native = popup.index_of_selected_item()?;
    native.checked_sub(title_offset(popup))
}

pub enum PopUpButtonBinding {
    Inherited(ButtonBinding),

    PullsDown(Dynamic<bool>),
    Items(Dynamic<Vec<String>>),
    SelectedIndex(Dynamic<Option<usize>>),

    WillPopUp(SignalInput<()>),
    SelectionChanged(SignalInput<Option<usize>>),
}

inherit_bindings!(
    PopUpButtonBinding => ButtonBinding => ControlBinding => ViewBinding => BaseBinding<NativeView>
);

impl PopUpButtonBinding {
    pub fn pulls_down() -> BindingName<Dynamic<bool>, Self> {
        BindingName::new("pulls_down", Self::PullsDown)
    }

    pub fn items() -> BindingName<Dynamic<Vec<String>>, Self> {
        BindingName::new("items", Self::Items)
    }

    pub fn selected_index() -> BindingName<Dynamic<Option<usize>>, Self> {
        BindingName::new("selected_index", Self::SelectedIndex)
    }

    pub fn will_pop_up() -> BindingName<SignalInput<()>, Self> {
        BindingName::new("will_pop_up", Self::WillPopUp)
    }

    pub fn selection_changed() -> BindingName<SignalInput<Option<usize>>, Self> {
        BindingName::new("selection_changed", Self::SelectionChanged)
    }
}

impl Binding for PopUpButtonBinding {
    fn name(&self) -> &'static str {
        match self {
            Self::Inherited(b) => b.name(),
            Self::PullsDown(_) => "pulls_down",
            Self::Items(_) => "items",
            Self::SelectedIndex(_) => "selected_index",
            Self::WillPopUp(_) => "will_pop_up",
            Self::SelectionChanged(_) => "selection_changed",
        }
    }
}

#[derive(Debug, Default)]
pub struct PopUpButtonStorage {
    button: ButtonStorage,
}

#[derive(Debug, Default)]
pub struct PopUpButtonPreparer {
    inherited: ButtonPreparer,
    pulls_down: bool,
}

impl Preparer for PopUpButtonPreparer {
    type Binding = PopUpButtonBinding;
    type Instance = NativePopUpButton;
    type Storage = PopUpButtonStorage;

    fn prepare_binding(&mut self, binding: &PopUpButtonBinding, ctx: &mut MountContext<'_>) {
        match binding {
            PopUpButtonBinding::Inherited(b) => self.inherited.prepare_binding(b, ctx),
            PopUpButtonBinding::PullsDown(value) => {
                if let Some(pulls_down) = value.initial_value() {
                    self.pulls_down = pulls_down;
                }
            }
            _ => {}
        }
    }

    fn prepare_instance(
        &mut self,
        instance: &NativePopUpButton,
        storage: &PopUpButtonStorage,
        ctx: &mut MountContext<'_>,
    ) {
        self.inherited
            .prepare_instance(instance.as_button(), &storage.button, ctx);
    }

    fn apply_binding(
        &mut self,
        binding: PopUpButtonBinding,
        instance: &NativePopUpButton,
        storage: &PopUpButtonStorage,
        ctx: &mut MountContext<'_>,
    ) -> Option<Lifetime> {
        match binding {
            PopUpButtonBinding::Inherited(b) => {
                self.inherited
                    .apply_binding(b, instance.as_button(), &storage.button, ctx)
            }
            PopUpButtonBinding::PullsDown(value) => {
                let popup = instance.clone();
                value.apply(move |pulls_down| popup.set_pulls_down(pulls_down))
            }
            PopUpButtonBinding::Items(value) => {
                let popup = instance.clone();
                value.apply(move |items| popup.set_items(items))
            }
            PopUpButtonBinding::SelectedIndex(value) => {
                let popup = instance.clone();
                value.apply(move |index: Option<usize>| {
                    match index.and_then(|index| index.checked_add(title_offset(&popup))) {
                        Some(native) => popup.select_item_at(native),
                        None => popup.clear_selection(),
                    }
                })
            }
            PopUpButtonBinding::WillPopUp(input) => {
                let token = instance.add_will_pop_up_observer(move || input.send(()));
                let popup = instance.clone();
                Some(Lifetime::new(move || {
                    popup.remove_observer(token);
                }))
            }
            PopUpButtonBinding::SelectionChanged(input) => {
                let popup = instance.clone();
                let actions = storage.button.control().actions();
                Some(actions.add(move || input.send(logical_selection(&popup))))
            }
        }
    }

    fn finalize_instance(
        &mut self,
        instance: &NativePopUpButton,
        storage: &PopUpButtonStorage,
        ctx: &mut MountContext<'_>,
    ) -> Option<Lifetime> {
        self.inherited
            .finalize_instance(instance.as_button(), &storage.button, ctx)
    }
}

impl BinderPreparer for PopUpButtonPreparer {
    const WIDGET: &'static str = "PopUpButton";
    type Parameters = ();

    fn construct_instance(
        &mut self,
        _parameters: (),
        _ctx: &mut MountContext<'_>,
    ) -> NativePopUpButton {
        NativePopUpButton::new(Rect::ZERO, self.pulls_down)
    }

    fn construct_storage(&mut self, _instance: &NativePopUpButton) -> PopUpButtonStorage {
        PopUpButtonStorage::default()
    }

    fn instance_key(instance: &NativePopUpButton) -> InstanceKey {
        instance_key(instance.as_view())
    }
}

pub type PopUpButton = Binder<PopUpButtonPreparer>;

#[cfg(test)]
mod tests {
    use super::*;
    use fbind_core::{AppContext, Observable, Signal, bindings};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn items(titles: &[&str]) -> Vec<String> {
        titles.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn pull_down_mode_is_chosen_at_construction() {
        let app = AppContext::default();
        let popup = PopUpButton::new(bindings![
            PopUpButtonBinding::pulls_down().is(true),
            PopUpButtonBinding::items().is(items(&["Actions", "Copy", "Paste"])),
        ])
        .instance(&app);
        assert!(popup.pulls_down());
        assert_eq!(popup.title(), "Actions");
        assert_eq!(logical_selection(&popup), Some(0));
        assert_eq!(popup.title_of_selected_item().as_deref(), Some("Copy"));
    }

    #[test]
    fn selected_index_is_logical_in_both_modes() {
        let app = AppContext::default();
        let selection = Observable::new(Some(1));
        let pulls_down = Observable::new(false);
        let popup = PopUpButton::new(bindings![
            PopUpButtonBinding::pulls_down().observe(&pulls_down),
            PopUpButtonBinding::items().is(items(&["A", "B", "C"])),
            PopUpButtonBinding::selected_index().observe(&selection),
        ])
        .instance(&app);
        assert_eq!(popup.index_of_selected_item(), Some(1));

        pulls_down.set(true);
        selection.set(Some(0));
        assert_eq!(popup.index_of_selected_item(), Some(1));
        assert_eq!(logical_selection(&popup), Some(0));

        selection.set(None);
        assert_eq!(popup.index_of_selected_item(), None);
    }

    #[test]
    fn out_of_range_index_clears_pull_down_selection() {
        let app = AppContext::default();
        let selection = Observable::new(Some(0));
        let popup = PopUpButton::new(bindings![
            PopUpButtonBinding::pulls_down().is(true),
            PopUpButtonBinding::items().is(items(&["Actions", "Copy"])),
            PopUpButtonBinding::selected_index().observe(&selection),
        ])
        .instance(&app);
        assert_eq!(logical_selection(&popup), Some(0));

        selection.set(Some(usize::MAX));
        assert_eq!(popup.index_of_selected_item(), None);
        assert_eq!(logical_selection(&popup), None);
    }

    #[test]
    fn user_choice_reports_logical_index() {
        let app = AppContext::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let popup = PopUpButton::new(bindings![
            PopUpButtonBinding::pulls_down().is(true),
            PopUpButtonBinding::items().is(items(&["Title", "One", "Two"])),
            PopUpButtonBinding::selection_changed()
                .to(SignalInput::from_fn(move |i: &Option<usize>| s.borrow_mut().push(*i))),
        ])
        .instance(&app);
        assert!(popup.pop_up_and_choose(Some(2)));
        assert!(!popup.pop_up_and_choose(Some(0)));
        assert_eq!(*seen.borrow(), vec![Some(1)]);
    }

    #[test]
    fn will_pop_up_observer_ends_with_teardown() {
        let app = AppContext::default();
        let (input, opened) = Signal::<()>::channel();
        let count = Rc::new(RefCell::new(0));
        let c = Rc::clone(&count);
        let _watch = opened.subscribe(move |_| *c.borrow_mut() += 1);
        let popup = PopUpButton::new(bindings![PopUpButtonBinding::will_pop_up().to(input)])
            .instance(&app);
        popup.pop_up_and_choose(None);
        assert_eq!(*count.borrow(), 1);

        app.teardown(PopUpButtonPreparer::instance_key(&popup));
        popup.pop_up_and_choose(None);
        assert_eq!(*count.borrow(), 1);
    }
}
