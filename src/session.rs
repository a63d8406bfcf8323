//! Authenticated-session context.
//!
//! Identity is passed into the engine explicitly instead of being read
//! from ambient storage; the token lives only for the session and is
//! never persisted by this crate.

use secrecy::SecretString;

/// The authenticated user's identity, injected into the workflow engine
/// and the profile bootstrap.
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// The identity reference used in place of a task id when reusing a
    /// previously stored resume.
    pub email: String,
    /// Session-scoped auth token. Opaque to the wizard.
    pub token: SecretString,
    /// Paid-tier flag; seeds the workflow state's tier flag.
    pub premium: bool,
}

impl SessionContext {
    pub fn new(email: impl Into<String>, token: impl Into<String>, premium: bool) -> Self {
        Self {
            email: email.into(),
            token: SecretString::from(token.into()),
            premium,
        }
    }
}
