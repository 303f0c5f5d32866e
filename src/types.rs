//! Strong typing with newtypes for domain concepts.

use serde::{Deserialize, Serialize};

/// Opaque identifier naming one live analyzer session.
///
/// Zero is reserved to mean "no session" and is never issued. Handles are
/// allocated from a monotonically increasing counter and never reused, so a
/// stale handle can never address a later session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionHandle(pub u64);

impl SessionHandle {
    /// The reserved "no session" value.
    pub const NONE: Self = Self(0);

    /// Raw handle value.
    pub fn value(self) -> u64 {
        self.0
    }

    /// Whether this is the reserved zero handle.
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session_{}", self.0)
    }
}

impl From<u64> for SessionHandle {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}
