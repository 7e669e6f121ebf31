//! Injectable session context.
//!
//! Holds the bearer token for the signed-in user, if any. Handed to the
//! engine at construction instead of being read from a global, so tests and
//! multi-tenant embedders can run isolated sessions side by side. The store
//! API client reads the token per request; a 401 anywhere tears the session
//! down (token and cart cleared) rather than retrying.

use std::sync::{Arc, PoisonError, RwLock};

use secrecy::SecretString;

/// Shared session state for one logical user.
///
/// Cheap to clone; all clones observe the same token.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<SessionContextInner>,
}

struct SessionContextInner {
    token: RwLock<Option<SecretString>>,
}

impl SessionContext {
    /// Create a session context, optionally seeded with a persisted token.
    #[must_use]
    pub fn new(initial_token: Option<SecretString>) -> Self {
        Self {
            inner: Arc::new(SessionContextInner {
                token: RwLock::new(initial_token),
            }),
        }
    }

    /// Install a token after sign-in.
    pub fn set_token(&self, token: SecretString) {
        let mut guard = self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Some(token);
    }

    /// Drop the token (sign-out, or server said 401).
    pub fn clear_token(&self) {
        let mut guard = self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }

    /// Current token, if the user is signed in.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a token is currently installed.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field(
                "token",
                &if self.is_authenticated() {
                    "[REDACTED]"
                } else {
                    "None"
                },
            )
            .finish()
    }
}
