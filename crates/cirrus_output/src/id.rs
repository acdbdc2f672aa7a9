//! Resource identifiers used for dependency tracking.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// Process-unique identifier of a declared resource.
///
/// Outputs record the resources they were derived from by id rather than by
/// reference, so a value never keeps a resource alive and parent/child links
/// can be looked up through a registry instead of owned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(u64);

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

impl ResourceId {
    /// Creates an id from a raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Allocates a fresh id that no other resource in this process uses.
    #[must_use]
    pub fn allocate() -> Self {
        Self(NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resource_{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocated_ids_are_distinct() {
        let a = ResourceId::allocate();
        let b = ResourceId::allocate();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn display_uses_prefix() {
        assert_eq!(ResourceId::new(7).to_string(), "resource_7");
    }
}
