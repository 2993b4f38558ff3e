#![forbid(unsafe_code)]

//! Preparer traits and the per-mount context.
//!
//! A preparer is the transient, per-declaration object that turns a binding
//! list into a configured native instance. Each widget level has one, and
//! holds the preparer of the level it inherits from by value in an
//! `inherited` field. Every method handles the cases its own binding enum
//! declares and forwards `Inherited(..)` cases, and the shared phases, to
//! `inherited` explicitly.
//!
//! # Phases
//!
//! | Phase | Method | Runs |
//! |-------|--------|------|
//! | 1 | [`Preparer::prepare_binding`] | per binding, declaration order |
//! | 2 | [`BinderPreparer::construct_instance`] | once |
//! | 3 | [`BinderPreparer::construct_storage`] | once |
//! | 4 | [`Preparer::prepare_instance`] | once, leaf level first |
//! | 5 | [`Preparer::apply_binding`] | per binding, declaration order |
//! | 6 | [`Preparer::finalize_instance`] | once |
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Late delegate | `delegate()` first called after phase 1 | panic |
//! | Conflicting delegate | `install_delegate` twice for one slot | panic |

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use fbind_reactive::Lifetime;

use crate::context::AppContext;
use crate::delegate::Delegate;
use crate::storage::InstanceKey;

/// A widget binding enum.
pub trait Binding: 'static {
    /// Case name, for logging.
    fn name(&self) -> &'static str;
}

/// One level of a preparer chain.
pub trait Preparer {
    type Binding: Binding;
    type Instance: Clone + 'static;
    type Storage: 'static;

    /// Phase 1. Record construction-time state; register delegate handlers.
    fn prepare_binding(&mut self, binding: &Self::Binding, ctx: &mut MountContext<'_>);

    /// Phase 4. One-time setup before any binding is applied.
    fn prepare_instance(
        &mut self,
        instance: &Self::Instance,
        storage: &Self::Storage,
        ctx: &mut MountContext<'_>,
    );

    /// Phase 5. Returns the lifetime of any live connection made.
    fn apply_binding(
        &mut self,
        binding: Self::Binding,
        instance: &Self::Instance,
        storage: &Self::Storage,
        ctx: &mut MountContext<'_>,
    ) -> Option<Lifetime>;

    /// Phase 6. Sees the fully configured instance.
    fn finalize_instance(
        &mut self,
        instance: &Self::Instance,
        storage: &Self::Storage,
        ctx: &mut MountContext<'_>,
    ) -> Option<Lifetime>;
}

/// The concrete (outermost) level of a chain, which owns construction.
pub trait BinderPreparer: Preparer + Default {
    /// Widget name, for logging and panic messages.
    const WIDGET: &'static str;

    /// Values passed to construction that are not bindings.
    type Parameters;

    fn construct_instance(
        &mut self,
        parameters: Self::Parameters,
        ctx: &mut MountContext<'_>,
    ) -> Self::Instance;

    fn construct_storage(&mut self, instance: &Self::Instance) -> Self::Storage;

    /// Identity under which the mount is attached.
    fn instance_key(instance: &Self::Instance) -> InstanceKey;
}

/// Mount phase, tracked by [`MountContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MountPhase {
    Prepare,
    Construct,
    PrepareInstance,
    Apply,
    Finalize,
}

/// State shared by every level of one mount.
pub struct MountContext<'a> {
    app: &'a AppContext,
    widget: &'static str,
    phase: MountPhase,
    delegate: Option<Rc<Delegate>>,
    installed: Vec<&'static str>,
    retained: Vec<Rc<dyn Any>>,
}

impl<'a> MountContext<'a> {
    #[must_use]
    pub fn new(app: &'a AppContext, widget: &'static str) -> Self {
        Self {
            app,
            widget,
            phase: MountPhase::Prepare,
            delegate: None,
            installed: Vec::new(),
            retained: Vec::new(),
        }
    }

    #[must_use]
    pub fn app(&self) -> &'a AppContext {
        self.app
    }

    #[must_use]
    pub fn widget(&self) -> &'static str {
        self.widget
    }

    #[must_use]
    pub fn phase(&self) -> MountPhase {
        self.phase
    }

    pub(crate) fn enter(&mut self, phase: MountPhase) {
        debug_assert!(phase >= self.phase, "mount phases run forward");
        self.phase = phase;
        if self.app.config().trace_phases {
            tracing::trace!(widget = self.widget, ?phase, "mount phase");
        }
    }

    /// The mount's delegate, created on first use.
    ///
    /// # Panics
    ///
    /// Panics if no delegate exists yet and the prepare pass is over.
    pub fn delegate(&mut self) -> Rc<Delegate> {
        if let Some(delegate) = &self.delegate {
            return Rc::clone(delegate);
        }
        if self.phase != MountPhase::Prepare {
            panic!(
                "{} delegate requested after the prepare phase ({:?})",
                self.widget, self.phase
            );
        }
        let delegate = Rc::new(Delegate::new(self.app.config().duplicate_handlers));
        self.delegate = Some(Rc::clone(&delegate));
        delegate
    }

    /// The delegate if one was created during the prepare pass.
    #[must_use]
    pub fn existing_delegate(&self) -> Option<Rc<Delegate>> {
        self.delegate.clone()
    }

    /// Claim the delegate for the native slot named `slot`. Returns `None`
    /// when no binding needed a delegate.
    ///
    /// # Panics
    ///
    /// Panics if `slot` was already claimed in this mount.
    pub fn install_delegate(&mut self, slot: &'static str) -> Option<Rc<Delegate>> {
        if self.installed.contains(&slot) {
            panic!("conflicting delegate assignment to {}.{slot}", self.widget);
        }
        self.installed.push(slot);
        self.delegate.clone()
    }

    /// Keep `object` alive for as long as the instance is mounted. Native
    /// slots hold weak references; this is the strong one.
    pub fn retain(&mut self, object: Rc<dyn Any>) {
        self.retained.push(object);
    }

    pub(crate) fn finish(self) -> (Option<Rc<Delegate>>, Vec<Rc<dyn Any>>) {
        (self.delegate, self.retained)
    }
}

impl fmt::Debug for MountContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountContext")
            .field("widget", &self.widget)
            .field("phase", &self.phase)
            .field("delegate", &self.delegate.is_some())
            .field("installed", &self.installed)
            .field("retained", &self.retained.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BinderConfig, DuplicateHandlerPolicy};
    use crate::delegate::Selector;
    use crate::value::Callback;

    #[test]
    fn delegate_is_created_once() {
        let app = AppContext::default();
        let mut ctx = MountContext::new(&app, "Window");
        assert!(ctx.existing_delegate().is_none());
        let a = ctx.delegate();
        let b = ctx.delegate();
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn delegate_uses_configured_policy() {
        let app = AppContext::new(
            BinderConfig::new().duplicate_handlers(DuplicateHandlerPolicy::Reject),
        );
        let mut ctx = MountContext::new(&app, "Window");
        let delegate = ctx.delegate();
        let sel = Selector::new("P", "m");
        delegate.add_single_handler(sel, Callback::new(|_: ()| ()));
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            delegate.add_single_handler(sel, Callback::new(|_: ()| ()));
        }));
        assert!(result.is_err());
    }

    #[test]
    #[should_panic(expected = "delegate requested after the prepare phase")]
    fn late_delegate_traps() {
        let app = AppContext::default();
        let mut ctx = MountContext::new(&app, "Window");
        ctx.enter(MountPhase::Apply);
        let _ = ctx.delegate();
    }

    #[test]
    fn existing_delegate_is_available_later() {
        let app = AppContext::default();
        let mut ctx = MountContext::new(&app, "Window");
        let created = ctx.delegate();
        ctx.enter(MountPhase::Finalize);
        assert!(Rc::ptr_eq(&created, &ctx.delegate()));
    }

    #[test]
    fn install_without_delegate_is_none() {
        let app = AppContext::default();
        let mut ctx = MountContext::new(&app, "OutlineView");
        assert!(ctx.install_delegate("delegate").is_none());
    }

    #[test]
    fn one_delegate_fills_several_slots() {
        let app = AppContext::default();
        let mut ctx = MountContext::new(&app, "OutlineView");
        let delegate = ctx.delegate();
        let a = ctx.install_delegate("delegate").unwrap();
        let b = ctx.install_delegate("data_source").unwrap();
        assert!(Rc::ptr_eq(&a, &delegate) && Rc::ptr_eq(&b, &delegate));
    }

    #[test]
    #[should_panic(expected = "conflicting delegate assignment")]
    fn double_install_traps() {
        let app = AppContext::default();
        let mut ctx = MountContext::new(&app, "Window");
        let _ = ctx.install_delegate("delegate");
        let _ = ctx.install_delegate("delegate");
    }
}
