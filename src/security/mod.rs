//! Authentication and authorization decorators.
//!
//! Two composition patterns sit on the decorator protocol:
//!
//! - **Token issuance** ([`TokenFactory`]): validates a submitted body
//!   against domain rules supplied through [`Authenticator`], then mints a
//!   signed HS256 token via a pluggable token-data builder. The encoded
//!   token is the decorator's produced value, injectable into handler slots.
//! - **Token verification** ([`TokenAuth`]): decodes the bearer credential's
//!   signature and expiry, optionally rejects blacklisted tokens, and yields
//!   the decoded claims. [`BusinessTokenAuth`] layers a privileged-claim
//!   check on top by delegating to the base check first — strict stacking,
//!   no duplicated logic.
//!
//! Decorators run before binding and before the handler body, so a handler
//! can assume any injected decorator value is already authorized. Failures
//! are a closed set of [`AuthenticationResult`] reason codes rendered as a
//! machine-readable 401 body.

mod token_auth;
mod token_factory;

pub use token_auth::{BusinessTokenAuth, TokenAuth};
pub use token_factory::{Authenticator, TokenFactory};

use crate::http::HttpRequest;
use serde::Serialize;
use std::env;
use std::time::Duration;

/// Signing configuration shared by issuance and verification.
///
/// The secret is supplied externally at process start and must exist before
/// the first decorator runs.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Validity window stamped into the `exp` claim of minted tokens.
    pub expiry: Duration,
}

impl JwtConfig {
    #[must_use]
    pub fn new(secret: impl Into<String>, expiry: Duration) -> Self {
        Self {
            secret: secret.into(),
            expiry,
        }
    }

    /// Read the secret from `GANTRY_JWT_SECRET` and the validity window
    /// from `GANTRY_TOKEN_EXPIRY_SECS` (default 1800, thirty minutes).
    pub fn from_env() -> Result<Self, env::VarError> {
        let secret = env::var("GANTRY_JWT_SECRET")?;
        let expiry_secs = env::var("GANTRY_TOKEN_EXPIRY_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1800);
        Ok(Self::new(secret, Duration::from_secs(expiry_secs)))
    }
}

/// Closed set of authentication reason codes. Variant names are the wire
/// contract: they serialize verbatim into failure bodies so clients can
/// render precise messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuthenticationResult {
    Success,
    TokenInvalid,
    PresentInBlacklist,
    NotBusiness,
    MissingFields,
    EmailInvalid,
    EmailExists,
    EmailIncorrect,
    PasswordInvalid,
    PasswordIncorrect,
    TooManyAttempts,
    WrongOTP,
    OTPBlocked,
}

/// Bearer credential from the `Authorization` header. Tolerates extra
/// whitespace after the scheme token.
#[must_use]
pub fn bearer_token(request: &HttpRequest) -> Option<&str> {
    request
        .header("Authorization")?
        .strip_prefix("Bearer ")
        .map(str::trim_start)
        .filter(|t| !t.is_empty())
}

/// Standard failure rendering for auth decorators: 401 with a JSON body
/// carrying the machine-readable reason code.
pub(crate) fn unauthorized_body(
    response: &mut crate::http::HttpResponse,
    detail: Option<&serde_json::Value>,
) -> Vec<u8> {
    response.status = http::StatusCode::UNAUTHORIZED;
    response.content_type = crate::http::ContentType::Json;
    let reason = detail.cloned().unwrap_or(serde_json::Value::Null);
    serde_json::to_vec(&serde_json::json!({ "reason": reason })).unwrap_or_default()
}
