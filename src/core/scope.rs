//! core::scope
//!
//! Scope tokens for detecting use outside the owning transaction.
//!
//! # Architecture
//!
//! The weave holds no locks. Whoever serializes access to it (see
//! [`crate::core::ops::lock`]) exposes a [`Scope`]: a capability that
//! reports an opaque token for the currently active transaction. A weave
//! captures the token once at construction and compares it with a fresh one
//! before every mutation. A different token means the lock was released or
//! re-acquired since the weave was opened.

use std::fmt;

/// Opaque, comparable transaction handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeToken(u64);

impl ScopeToken {
    /// The token reported when no transaction is active.
    pub const DETACHED: ScopeToken = ScopeToken(0);

    /// Create a token from a raw generation number.
    pub fn new(generation: u64) -> Self {
        Self(generation)
    }

    /// Whether this is the detached token.
    pub fn is_detached(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ScopeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_detached() {
            write!(f, "detached")
        } else {
            write!(f, "scope#{}", self.0)
        }
    }
}

/// Capability reporting the current transaction token.
pub trait Scope: Send + Sync {
    /// The token of the transaction active right now.
    fn current(&self) -> ScopeToken;
}

impl<F> Scope for F
where
    F: Fn() -> ScopeToken + Send + Sync,
{
    fn current(&self) -> ScopeToken {
        self()
    }
}

/// A scope that never changes; weaves using it are never invalidated.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unscoped;

impl Scope for Unscoped {
    fn current(&self) -> ScopeToken {
        ScopeToken::DETACHED
    }
}
