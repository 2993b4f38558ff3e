#![forbid(unsafe_code)]

//! Binder machinery for fbind.
//!
//! A widget is declared as a list of bindings and materialized by a
//! [`Binder`]. The binder runs a chain of [`Preparer`]s (one per level of
//! the widget's class hierarchy, composed by value) through a fixed set of
//! phases, then parks the resulting storage, [`Delegate`] and lifetimes in
//! the [`AppContext`] side table until teardown.
//!
//! # Key Components
//!
//! - [`value`]: the payload kinds a binding can carry.
//! - [`BindingName`], [`bindings!`], [`inherit_bindings!`]: declarative
//!   construction.
//! - [`Preparer`], [`BinderPreparer`], [`MountContext`]: the chain protocol.
//! - [`Delegate`]: selector to closure multiplexer behind one native
//!   delegate slot.
//! - [`StorageTable`], [`AppContext`]: per-instance side table.
//! - [`BasePreparer`]: root of every chain.
//! - [`BinderConfig`]: runtime policy.

pub mod base;
pub mod binder;
pub mod config;
pub mod context;
pub mod delegate;
pub mod name;
pub mod preparer;
pub mod storage;
pub mod value;

pub use base::{BaseBinding, BasePreparer, ObjectStorage};
pub use binder::{Binder, mount};
pub use config::{BinderConfig, ConfigError, DuplicateHandlerPolicy};
pub use context::{AppContext, WeakAppContext};
pub use delegate::{Delegate, HandlerToken, Selector};
pub use name::BindingName;
pub use preparer::{BinderPreparer, Binding, MountContext, MountPhase, Preparer};
pub use storage::{Attachment, InstanceKey, StorageHandle, StorageTable};
pub use value::{BindingValue, Callback, Constant, Dynamic, ValueKind};

pub use fbind_reactive::{Lifetime, LifetimeBag, Observable, Signal, SignalInput};
