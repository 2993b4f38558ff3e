#![forbid(unsafe_code)]

//! Declarative binder façade and the mount pipeline.
//!
//! A [`Binder`] captures a binding list and defers all work until
//! [`Binder::instance`]. The first call runs the pipeline and caches the
//! native instance; later calls return the cached instance.
//!
//! # State Machine
//!
//! ```text
//! Pending --instance()--> Constructing --mount done--> Instantiated
//!                              |
//!                              +--instance() again--> panic
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use fbind_reactive::LifetimeBag;

use crate::context::AppContext;
use crate::preparer::{BinderPreparer, Binding, MountContext, MountPhase, Preparer};
use crate::storage::Attachment;

enum BinderState<P: BinderPreparer> {
    Pending {
        parameters: P::Parameters,
        bindings: Vec<P::Binding>,
    },
    Constructing,
    Instantiated(P::Instance),
}

/// Declarative constructor for one widget.
pub struct Binder<P: BinderPreparer> {
    state: RefCell<BinderState<P>>,
}

impl<P: BinderPreparer> Binder<P>
where
    P::Parameters: Default,
{
    pub fn new(bindings: Vec<P::Binding>) -> Self {
        Self::with_parameters(P::Parameters::default(), bindings)
    }
}

impl<P: BinderPreparer> Binder<P> {
    pub fn with_parameters(parameters: P::Parameters, bindings: Vec<P::Binding>) -> Self {
        Self {
            state: RefCell::new(BinderState::Pending {
                parameters,
                bindings,
            }),
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(*self.state.borrow(), BinderState::Pending { .. })
    }

    #[must_use]
    pub fn is_instantiated(&self) -> bool {
        matches!(*self.state.borrow(), BinderState::Instantiated(_))
    }

    /// Materialize the native instance, mounting it into `app` on first use.
    ///
    /// # Panics
    ///
    /// Panics if called while this binder is already being mounted.
    pub fn instance(&self, app: &AppContext) -> P::Instance {
        let (parameters, bindings) = {
            let mut state = self.state.borrow_mut();
            match std::mem::replace(&mut *state, BinderState::Constructing) {
                BinderState::Pending {
                    parameters,
                    bindings,
                } => (parameters, bindings),
                BinderState::Instantiated(instance) => {
                    let shared = instance.clone();
                    *state = BinderState::Instantiated(instance);
                    return shared;
                }
                BinderState::Constructing => {
                    panic!("{} binder instantiated re-entrantly", P::WIDGET)
                }
            }
        };
        let instance = mount::<P>(parameters, bindings, app);
        *self.state.borrow_mut() = BinderState::Instantiated(instance.clone());
        instance
    }
}

impl<P: BinderPreparer> fmt::Debug for Binder<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.state.borrow() {
            BinderState::Pending { bindings, .. } => format!("Pending({})", bindings.len()),
            BinderState::Constructing => "Constructing".to_string(),
            BinderState::Instantiated(_) => "Instantiated".to_string(),
        };
        f.debug_struct("Binder")
            .field("widget", &P::WIDGET)
            .field("state", &state)
            .finish()
    }
}

/// Run the full pipeline for one binding list and attach the result to
/// `app`.
pub fn mount<P: BinderPreparer>(
    parameters: P::Parameters,
    bindings: Vec<P::Binding>,
    app: &AppContext,
) -> P::Instance {
    let span = tracing::debug_span!("binder_mount", widget = P::WIDGET, bindings = bindings.len());
    let _guard = span.enter();
    let trace = app.config().trace_phases;

    let mut preparer = P::default();
    let mut ctx = MountContext::new(app, P::WIDGET);

    for binding in &bindings {
        if trace {
            tracing::trace!(binding = binding.name(), "prepare");
        }
        preparer.prepare_binding(binding, &mut ctx);
    }

    ctx.enter(MountPhase::Construct);
    let instance = preparer.construct_instance(parameters, &mut ctx);
    let storage = Rc::new(preparer.construct_storage(&instance));

    ctx.enter(MountPhase::PrepareInstance);
    preparer.prepare_instance(&instance, &storage, &mut ctx);

    ctx.enter(MountPhase::Apply);
    let mut lifetimes = LifetimeBag::new();
    for binding in bindings {
        let name = binding.name();
        let lifetime = preparer.apply_binding(binding, &instance, &storage, &mut ctx);
        if trace {
            tracing::trace!(binding = name, live = lifetime.is_some(), "apply");
        }
        if let Some(lifetime) = lifetime {
            lifetimes.hold(lifetime);
        }
    }

    ctx.enter(MountPhase::Finalize);
    if let Some(lifetime) = preparer.finalize_instance(&instance, &storage, &mut ctx) {
        lifetimes.hold(lifetime);
    }

    let key = P::instance_key(&instance);
    let (delegate, retained) = ctx.finish();
    tracing::debug!(
        %key,
        lifetimes = lifetimes.len(),
        delegate = delegate.is_some(),
        "mounted"
    );
    app.attach(
        key,
        Attachment {
            lifetimes,
            retained,
            delegate,
            storage,
            widget: P::WIDGET,
        },
    );
    instance
}
