#![forbid(unsafe_code)]

//! Grouped teardown of change registrations.
//!
//! Change tokens are removed explicitly; a widget or view that makes many
//! registrations needs one place to tear them all down. [`BindingScope`]
//! is that place: it owns tokens, and `clear()` (or drop) detaches every
//! one of them.

use std::fmt;

use crate::binding::ChangeToken;

/// Collects change tokens for a logical scope (e.g., one widget).
#[derive(Default)]
pub struct BindingScope {
    tokens: Vec<ChangeToken>,
}

impl BindingScope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a token; it is detached when the scope clears or
    /// drops.
    pub fn hold(&mut self, token: ChangeToken) {
        self.tokens.push(token);
    }

    /// Number of held tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Detach every held token. The scope stays usable afterwards.
    pub fn clear(&mut self) {
        for token in self.tokens.drain(..) {
            token.detach();
        }
    }
}

impl Drop for BindingScope {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for BindingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingScope")
            .field("tokens", &self.tokens.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
