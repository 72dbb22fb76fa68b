use super::{bearer_token, unauthorized_body, AuthenticationResult, JwtConfig};
use crate::blacklist::TokenBlacklist;
use crate::decorator::{Decorator, Verdict};
use crate::http::{HttpRequest, HttpResponse};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Verification decorator: decodes the bearer token's signature and expiry
/// and yields the decoded claims as its produced value. With a blacklist
/// attached, a revoked token fails with `PresentInBlacklist` even though
/// its signature is still valid.
pub struct TokenAuth {
    jwt: JwtConfig,
    blacklist: Option<Arc<TokenBlacklist>>,
}

impl TokenAuth {
    /// Key the decoded claims are published under for binding slots.
    pub const KEY: &'static str = "token_auth";

    #[must_use]
    pub fn new(jwt: JwtConfig) -> Self {
        Self {
            jwt,
            blacklist: None,
        }
    }

    /// Reject tokens present in the given revocation set.
    #[must_use]
    pub fn with_blacklist(mut self, blacklist: Arc<TokenBlacklist>) -> Self {
        self.blacklist = Some(blacklist);
        self
    }

    /// Base check shared with the privileged layer: extract the bearer
    /// credential, verify signature and expiry (zero leeway), then consult
    /// the blacklist.
    pub(crate) fn decode_claims(
        &self,
        request: &HttpRequest,
    ) -> Result<Value, AuthenticationResult> {
        let token = bearer_token(request).ok_or(AuthenticationResult::TokenInvalid)?;
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let decoded = decode::<Value>(
            token,
            &DecodingKey::from_secret(self.jwt.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            debug!(error = %e, "token rejected");
            AuthenticationResult::TokenInvalid
        })?;
        if let Some(blacklist) = &self.blacklist {
            if blacklist.contains(token) {
                debug!("token present in blacklist");
                return Err(AuthenticationResult::PresentInBlacklist);
            }
        }
        Ok(decoded.claims)
    }
}

impl Decorator for TokenAuth {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn evaluate(&self, request: &HttpRequest, _body: Option<&Value>) -> Verdict {
        match self.decode_claims(request) {
            Ok(claims) => Verdict::Proceed(Some(claims)),
            Err(reason) => Verdict::Halt(Some(json!(reason))),
        }
    }

    fn on_fail(
        &self,
        _request: &HttpRequest,
        response: &mut HttpResponse,
        detail: Option<&Value>,
    ) -> Vec<u8> {
        unauthorized_body(response, detail)
    }
}

/// Privileged layer on top of [`TokenAuth`]: the base check runs first and
/// unchanged; on top of it the claims must prove ownership of a business
/// (`business_id` present and non-null), else the request fails with
/// `NotBusiness`.
pub struct BusinessTokenAuth {
    inner: TokenAuth,
}

impl BusinessTokenAuth {
    /// Key the decoded claims are published under for binding slots.
    pub const KEY: &'static str = "business_token_auth";

    #[must_use]
    pub fn new(inner: TokenAuth) -> Self {
        Self { inner }
    }
}

impl Decorator for BusinessTokenAuth {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn evaluate(&self, request: &HttpRequest, _body: Option<&Value>) -> Verdict {
        match self.inner.decode_claims(request) {
            Ok(claims) => {
                let owns_business = claims
                    .get("business_id")
                    .is_some_and(|v| !v.is_null());
                if owns_business {
                    Verdict::Proceed(Some(claims))
                } else {
                    debug!("token carries no business claim");
                    Verdict::Halt(Some(json!(AuthenticationResult::NotBusiness)))
                }
            }
            Err(reason) => Verdict::Halt(Some(json!(reason))),
        }
    }

    fn on_fail(
        &self,
        _request: &HttpRequest,
        response: &mut HttpResponse,
        detail: Option<&Value>,
    ) -> Vec<u8> {
        unauthorized_body(response, detail)
    }
}
