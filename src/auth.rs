//! Request authentication.
//!
//! One static username/password pair, configured at startup. Comparison is
//! exact string equality - no per-user store, no hashing, no lockout. A
//! rejected request short-circuits before the encoder or the control
//! channel are touched, so unauthenticated callers generate no channel
//! traffic.

use serde::Deserialize;

use crate::config::Settings;

/// Caller credentials, straight from the request body.
///
/// Lives only for the duration of one request.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

/// Check credentials against the configured static pair.
pub fn verify(credentials: &Credentials, settings: &Settings) -> bool {
    credentials.user == settings.user && credentials.password == settings.password
}
