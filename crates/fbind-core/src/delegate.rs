#![forbid(unsafe_code)]

//! Delegate multiplexer.
//!
//! Native widgets expose a single delegate slot per protocol. A [`Delegate`]
//! is the one object behind that slot for a widget instance: it maps each
//! [`Selector`] to the closure(s) registered by the preparer chain, and the
//! native protocol adapter forwards every callback through it.
//!
//! # Invariants
//!
//! 1. A selector is either single-handler or multi-handler, never both.
//! 2. `multi_handler` invokes handlers in registration order.
//! 3. Re-registering a single-handler selector keeps only the last handler
//!    (subject to [`DuplicateHandlerPolicy`]).
//! 4. Handlers run outside the registry borrow; a handler may register or
//!    remove handlers on the same delegate.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Missing handler | `single_handler` on an unregistered selector | panic |
//! | Kind clash | single and multi on one selector | panic |
//! | Type clash | dispatch with argument/return types other than registered | panic |
//! | Duplicate single | second registration on a selector | per policy |

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;

use crate::config::DuplicateHandlerPolicy;
use crate::value::Callback;

/// Identity of one native delegate method.
///
/// The protocol is part of the identity so that identically named methods
/// of two protocols served by the same delegate never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selector {
    protocol: &'static str,
    method: &'static str,
}

impl Selector {
    pub const fn new(protocol: &'static str, method: &'static str) -> Self {
        Self { protocol, method }
    }

    #[must_use]
    pub const fn protocol(&self) -> &'static str {
        self.protocol
    }

    #[must_use]
    pub const fn method(&self) -> &'static str {
        self.method
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.protocol, self.method)
    }
}

/// Identifies one registration, for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerToken {
    selector: Selector,
    id: u64,
}

impl HandlerToken {
    #[must_use]
    pub fn selector(&self) -> Selector {
        self.selector
    }
}

type ErasedHandler = Rc<dyn Any>;

enum Slot {
    Single { id: u64, handler: ErasedHandler },
    Multi(Vec<(u64, ErasedHandler)>),
}

/// One delegate object per widget instance, fronting any number of closures.
pub struct Delegate {
    policy: DuplicateHandlerPolicy,
    handlers: RefCell<AHashMap<Selector, Slot>>,
    next_id: Cell<u64>,
}

impl Default for Delegate {
    fn default() -> Self {
        Self::new(DuplicateHandlerPolicy::default())
    }
}

impl Delegate {
    #[must_use]
    pub fn new(policy: DuplicateHandlerPolicy) -> Self {
        Self {
            policy,
            handlers: RefCell::new(AHashMap::new()),
            next_id: Cell::new(1),
        }
    }

    fn next_token(&self, selector: Selector) -> HandlerToken {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        HandlerToken { selector, id }
    }

    /// Register the single implementation backing `selector`.
    ///
    /// # Panics
    ///
    /// Panics if `selector` already has multi handlers, or if it already has
    /// a single handler and the policy is [`DuplicateHandlerPolicy::Reject`].
    pub fn add_single_handler<A: 'static, R: 'static>(
        &self,
        selector: Selector,
        handler: Callback<A, R>,
    ) -> HandlerToken {
        let token = self.next_token(selector);
        let erased: ErasedHandler = Rc::new(handler);
        let mut handlers = self.handlers.borrow_mut();
        match handlers.get(&selector) {
            Some(Slot::Multi(_)) => {
                panic!("selector {selector} has multi handlers; cannot add a single handler")
            }
            Some(Slot::Single { .. }) => match self.policy {
                DuplicateHandlerPolicy::Replace => {
                    tracing::debug!(%selector, "replacing single delegate handler");
                }
                DuplicateHandlerPolicy::Warn => {
                    tracing::warn!(%selector, "replacing single delegate handler");
                }
                DuplicateHandlerPolicy::Reject => {
                    panic!("selector {selector} already has a single handler")
                }
            },
            None => tracing::debug!(%selector, "registered single delegate handler"),
        }
        handlers.insert(
            selector,
            Slot::Single {
                id: token.id,
                handler: erased,
            },
        );
        token
    }

    /// Register one more handler for a notification-style `selector`.
    ///
    /// # Panics
    ///
    /// Panics if `selector` already has a single handler.
    pub fn add_multi_handler<A: 'static>(
        &self,
        selector: Selector,
        handler: Callback<A>,
    ) -> HandlerToken {
        let token = self.next_token(selector);
        let erased: ErasedHandler = Rc::new(handler);
        let mut handlers = self.handlers.borrow_mut();
        let slot = handlers
            .entry(selector)
            .or_insert_with(|| Slot::Multi(Vec::new()));
        match slot {
            Slot::Multi(list) => list.push((token.id, erased)),
            Slot::Single { .. } => {
                panic!("selector {selector} has a single handler; cannot add a multi handler")
            }
        }
        tracing::debug!(%selector, "registered multi delegate handler");
        token
    }

    /// Remove one registration. Returns `false` if it was already gone.
    pub fn remove_handler(&self, token: HandlerToken) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let (removed, now_empty) = match handlers.get_mut(&token.selector) {
            None => return false,
            Some(Slot::Single { id, .. }) => {
                let hit = *id == token.id;
                (hit, hit)
            }
            Some(Slot::Multi(list)) => {
                let before = list.len();
                list.retain(|(id, _)| *id != token.id);
                (list.len() != before, list.is_empty())
            }
        };
        if now_empty {
            handlers.remove(&token.selector);
        }
        removed
    }

    /// Whether any handler is registered for `selector`.
    #[must_use]
    pub fn responds_to(&self, selector: Selector) -> bool {
        self.handlers.borrow().contains_key(&selector)
    }

    /// Number of handlers registered for `selector`.
    #[must_use]
    pub fn handler_count(&self, selector: Selector) -> usize {
        match self.handlers.borrow().get(&selector) {
            None => 0,
            Some(Slot::Single { .. }) => 1,
            Some(Slot::Multi(list)) => list.len(),
        }
    }

    fn single(&self, selector: Selector) -> Option<ErasedHandler> {
        match self.handlers.borrow().get(&selector) {
            Some(Slot::Single { handler, .. }) => Some(Rc::clone(handler)),
            Some(Slot::Multi(_)) => {
                panic!("selector {selector} has multi handlers; dispatch with multi_handler")
            }
            None => None,
        }
    }

    /// Forward `args` to the handler registered for `selector`.
    ///
    /// # Panics
    ///
    /// Panics if no handler is registered, or if it was registered with
    /// different argument or return types.
    pub fn single_handler<A: 'static, R: 'static>(&self, selector: Selector, args: A) -> R {
        match self.try_single_handler(selector, args) {
            Some(result) => result,
            None => panic!("no delegate handler registered for {selector}"),
        }
    }

    /// Forward `args` to the handler registered for `selector`, if any.
    pub fn try_single_handler<A: 'static, R: 'static>(
        &self,
        selector: Selector,
        args: A,
    ) -> Option<R> {
        let erased = self.single(selector)?;
        let Some(handler) = erased.downcast_ref::<Callback<A, R>>() else {
            panic!("delegate handler for {selector} registered with different types");
        };
        tracing::trace!(%selector, "single delegate dispatch");
        Some(handler.call(args))
    }

    /// Invoke every handler registered for `selector`, in registration order.
    pub fn multi_handler<A: Clone + 'static>(&self, selector: Selector, args: A) {
        let list: Vec<ErasedHandler> = match self.handlers.borrow().get(&selector) {
            Some(Slot::Multi(list)) => list.iter().map(|(_, h)| Rc::clone(h)).collect(),
            Some(Slot::Single { .. }) => {
                panic!("selector {selector} has a single handler; dispatch with single_handler")
            }
            None => return,
        };
        tracing::trace!(%selector, handlers = list.len(), "multi delegate dispatch");
        for erased in list {
            let Some(handler) = erased.downcast_ref::<Callback<A>>() else {
                panic!("delegate handler for {selector} registered with different types");
            };
            handler.call(args.clone());
        }
    }
}

impl fmt::Debug for Delegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delegate")
            .field("policy", &self.policy)
            .field("selectors", &self.handlers.borrow().len())
            .finish()
    }
}
