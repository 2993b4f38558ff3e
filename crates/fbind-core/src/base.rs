#![forbid(unsafe_code)]

//! Root level of every preparer chain.

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use fbind_reactive::Lifetime;

use crate::name::BindingName;
use crate::preparer::{Binding, MountContext, Preparer};
use crate::value::Constant;

type AdHocPrepare<I> = Rc<dyn Fn(&I)>;
type AdHocFinalize<I> = Rc<dyn Fn(&I) -> Option<Lifetime>>;

/// Bindings every widget accepts.
pub enum BaseBinding<I> {
    /// Adopt extra lifetimes; they end with the instance.
    Lifetimes(Constant<Vec<Lifetime>>),
    /// Run against the instance before any binding is applied.
    AdHocPrepare(AdHocPrepare<I>),
    /// Run against the configured instance.
    AdHocFinalize(AdHocFinalize<I>),
}

impl<I: 'static> BaseBinding<I> {
    pub fn lifetimes() -> BindingName<Constant<Vec<Lifetime>>, Self> {
        BindingName::new("lifetimes", Self::Lifetimes)
    }

    pub fn on_prepare(f: impl Fn(&I) + 'static) -> Self {
        Self::AdHocPrepare(Rc::new(f))
    }

    pub fn on_finalize(f: impl Fn(&I) -> Option<Lifetime> + 'static) -> Self {
        Self::AdHocFinalize(Rc::new(f))
    }
}

impl<I: 'static> Binding for BaseBinding<I> {
    fn name(&self) -> &'static str {
        match self {
            Self::Lifetimes(_) => "lifetimes",
            Self::AdHocPrepare(_) => "ad_hoc_prepare",
            Self::AdHocFinalize(_) => "ad_hoc_finalize",
        }
    }
}

impl<I> fmt::Debug for BaseBinding<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lifetimes(l) => write!(f, "Lifetimes({})", l.value().len()),
            Self::AdHocPrepare(_) => f.write_str("AdHocPrepare"),
            Self::AdHocFinalize(_) => f.write_str("AdHocFinalize"),
        }
    }
}

/// Storage of the root level. Holds nothing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ObjectStorage;

/// Root preparer: collects ad-hoc hooks and adopted lifetimes.
pub struct BasePreparer<I> {
    prepare: Vec<AdHocPrepare<I>>,
    finalize: Vec<AdHocFinalize<I>>,
    _instance: PhantomData<fn(&I)>,
}

impl<I> Default for BasePreparer<I> {
    fn default() -> Self {
        Self {
            prepare: Vec::new(),
            finalize: Vec::new(),
            _instance: PhantomData,
        }
    }
}

impl<I> fmt::Debug for BasePreparer<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasePreparer")
            .field("prepare", &self.prepare.len())
            .field("finalize", &self.finalize.len())
            .finish()
    }
}

impl<I: Clone + 'static> Preparer for BasePreparer<I> {
    type Binding = BaseBinding<I>;
    type Instance = I;
    type Storage = ObjectStorage;

    fn prepare_binding(&mut self, binding: &Self::Binding, _ctx: &mut MountContext<'_>) {
        match binding {
            BaseBinding::AdHocPrepare(f) => self.prepare.push(Rc::clone(f)),
            BaseBinding::AdHocFinalize(f) => self.finalize.push(Rc::clone(f)),
            BaseBinding::Lifetimes(_) => {}
        }
    }

    fn prepare_instance(
        &mut self,
        instance: &I,
        _storage: &ObjectStorage,
        _ctx: &mut MountContext<'_>,
    ) {
        for f in &self.prepare {
            f(instance);
        }
    }

    fn apply_binding(
        &mut self,
        binding: Self::Binding,
        _instance: &I,
        _storage: &ObjectStorage,
        _ctx: &mut MountContext<'_>,
    ) -> Option<Lifetime> {
        match binding {
            BaseBinding::Lifetimes(lifetimes) => Some(Lifetime::merge(lifetimes.into_value())),
            BaseBinding::AdHocPrepare(_) | BaseBinding::AdHocFinalize(_) => None,
        }
    }

    fn finalize_instance(
        &mut self,
        instance: &I,
        _storage: &ObjectStorage,
        _ctx: &mut MountContext<'_>,
    ) -> Option<Lifetime> {
        let lifetimes: Vec<Lifetime> = self.finalize.iter().filter_map(|f| f(instance)).collect();
        if lifetimes.is_empty() {
            None
        } else {
            Some(Lifetime::merge(lifetimes))
        }
    }
}
