#![forbid(unsafe_code)]

//! Object identity.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for native object ids.
static OBJECT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a native object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    pub(crate) fn next() -> Self {
        Self(OBJECT_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let a = ObjectId::next();
        let b = ObjectId::next();
        assert!(b > a);
        assert_ne!(a.get(), b.get());
    }
}
