//! Schedulable endpoint traits and the entity handle type
//!
//! A callback group never owns the endpoints it tracks; it stores
//! `Weak<dyn Kind>` references produced from the `Arc` the owner holds.
//! These traits define the seam between the group registry, the node
//! wiring layer, and the external executor. Implementations live with
//! the transport/timer layers, never in this crate.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a schedulable endpoint
///
/// This is the value a low-level wait/ready event reports; the executor
/// resolves it back to a live entity with the group's predicate lookups.
/// The maximum value (u64::MAX) is reserved as a sentinel for "no entity".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct EntityHandle(u64);

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(0);

impl EntityHandle {
    /// Sentinel value indicating no entity
    pub const NONE: EntityHandle = EntityHandle(u64::MAX);

    /// Create an EntityHandle from a raw value
    #[inline]
    pub const fn from_raw(id: u64) -> Self {
        EntityHandle(id)
    }

    /// Allocate the next process-unique handle
    #[inline]
    pub fn next() -> Self {
        EntityHandle(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw u64 value
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Check if this is the NONE sentinel
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u64::MAX
    }

    /// Check if this is a valid entity handle
    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != u64::MAX
    }
}

impl Default for EntityHandle {
    fn default() -> Self {
        EntityHandle::NONE
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "EntityHandle(NONE)")
        } else {
            write!(f, "EntityHandle({})", self.0)
        }
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "none")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Base trait for anything a callback group can reference
///
/// The group requires nothing from an endpoint beyond thread safety and a
/// stable handle; readiness polling and callback execution are executor
/// concerns and deliberately absent here.
pub trait Schedulable: Send + Sync {
    /// The wait-set level identifier for this endpoint
    fn handle(&self) -> EntityHandle;
}

/// A message publisher endpoint
pub trait Publisher: Schedulable {}

/// A message subscription endpoint
pub trait Subscription: Schedulable {}

/// A timer endpoint
pub trait Timer: Schedulable {}

/// A service (RPC server) endpoint
pub trait Service: Schedulable {}

/// A client (RPC caller) endpoint
pub trait Client: Schedulable {}

/// A generic waitable endpoint, for custom wait-set conditions
pub trait Waitable: Schedulable {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_basics() {
        let h = EntityHandle::from_raw(42);
        assert_eq!(h.as_u64(), 42);
        assert!(h.is_some());
        assert!(!h.is_none());
    }

    #[test]
    fn test_handle_none() {
        let none = EntityHandle::NONE;
        assert!(none.is_none());
        assert!(!none.is_some());
        assert_eq!(EntityHandle::default(), none);
    }

    #[test]
    fn test_handle_next_unique() {
        let a = EntityHandle::next();
        let b = EntityHandle::next();
        let c = EntityHandle::next();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }
}
