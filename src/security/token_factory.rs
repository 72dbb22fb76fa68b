use super::{unauthorized_body, AuthenticationResult, JwtConfig};
use crate::decorator::{Decorator, Verdict};
use crate::http::{HttpRequest, HttpResponse};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Domain-supplied credential check for token issuance routes
/// (registration, login). The framework knows nothing about the rules;
/// it only turns a successful outcome into a signed token.
pub trait Authenticator: Send + Sync {
    /// Validate the request and its pre-decoded body. `Ok` carries the
    /// authenticated principal the token data is built from; `Err` carries
    /// the precise reason code for the client.
    fn authenticate(
        &self,
        request: &HttpRequest,
        body: Option<&Value>,
    ) -> Result<Value, AuthenticationResult>;
}

type TokenDataBuilder = dyn Fn(&Value) -> Value + Send + Sync;

/// Issuance decorator: on successful authentication it mints a fresh HS256
/// token whose claims come from the pluggable token-data builder, plus an
/// `exp` claim `expiry` from now. The encoded token is the decorator's
/// produced value.
pub struct TokenFactory {
    jwt: JwtConfig,
    authenticator: Arc<dyn Authenticator>,
    token_data: Box<TokenDataBuilder>,
}

impl TokenFactory {
    /// Key the minted token is published under for binding slots.
    pub const KEY: &'static str = "token_factory";

    #[must_use]
    pub fn new(jwt: JwtConfig, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            jwt,
            authenticator,
            // default claims: the principal object itself
            token_data: Box::new(Value::clone),
        }
    }

    /// Replace the claims built from the authenticated principal.
    #[must_use]
    pub fn token_data_builder<F>(mut self, builder: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.token_data = Box::new(builder);
        self
    }

    fn mint(&self, principal: &Value) -> Result<String, jsonwebtoken::errors::Error> {
        let mut claims = (self.token_data)(principal);
        if !claims.is_object() {
            claims = json!({ "sub": claims });
        }
        let exp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
            + self.jwt.expiry.as_secs();
        if let Some(map) = claims.as_object_mut() {
            map.insert("exp".to_string(), json!(exp));
        }
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt.secret.as_bytes()),
        )
    }
}

impl Decorator for TokenFactory {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn evaluate(&self, request: &HttpRequest, body: Option<&Value>) -> Verdict {
        match self.authenticator.authenticate(request, body) {
            Ok(principal) => match self.mint(&principal) {
                Ok(token) => {
                    debug!(path = %request.path, "token issued");
                    Verdict::Proceed(Some(Value::String(token)))
                }
                Err(e) => {
                    warn!(error = %e, "token encoding failed");
                    Verdict::Halt(Some(json!(AuthenticationResult::TokenInvalid)))
                }
            },
            Err(reason) => {
                debug!(path = %request.path, reason = ?reason, "authentication rejected");
                Verdict::Halt(Some(json!(reason)))
            }
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
