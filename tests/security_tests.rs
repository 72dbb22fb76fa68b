use gantry::decorator::{Decorator, Verdict};
use gantry::blacklist::{MemoryStore, TokenBlacklist};
use gantry::http::HttpResponse;
use gantry::parser::RequestParser;
use gantry::security::{
    Authenticator, AuthenticationResult, BusinessTokenAuth, JwtConfig, TokenAuth, TokenFactory,
};
use gantry::HttpRequest;
use http::StatusCode;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const SECRET: &str = "test-secret";

fn jwt() -> JwtConfig {
    JwtConfig::new(SECRET, Duration::from_secs(1800))
}

fn request(raw: &[u8]) -> HttpRequest {
    RequestParser::new(raw).parse().unwrap()
}

fn request_with_bearer(token: &str) -> HttpRequest {
    let raw = format!("GET /profile HTTP/1.1\r\nAuthorization: Bearer {token}\r\n\r\n");
    request(raw.as_bytes())
}

/// Accepts a fixed credential pair; principal carries whatever
/// `business_id` the test wants in the claims.
struct FixedAuthenticator {
    business_id: Value,
}

impl Authenticator for FixedAuthenticator {
    fn authenticate(
        &self,
        _request: &HttpRequest,
        body: Option<&Value>,
    ) -> Result<Value, AuthenticationResult> {
        let body = body.ok_or(AuthenticationResult::MissingFields)?;
        match body.get("password").and_then(Value::as_str) {
            Some("correct") => Ok(json!({
                "email": "a@b.c",
                "business_id": self.business_id,
            })),
            Some(_) => Err(AuthenticationResult::PasswordIncorrect),
            None => Err(AuthenticationResult::MissingFields),
        }
    }
}

fn issue_token(business_id: Value) -> String {
    let factory = TokenFactory::new(jwt(), Arc::new(FixedAuthenticator { business_id }));
    let req = request(b"POST /login HTTP/1.1\r\n\r\n{\"password\":\"correct\"}");
    let body = req.json_body();
    match factory.evaluate(&req, body.as_ref()) {
        Verdict::Proceed(Some(Value::String(token))) => token,
        other => panic!("expected a minted token, got {other:?}"),
    }
}

#[test]
fn test_factory_rejects_wrong_password_with_reason() {
    let factory = TokenFactory::new(jwt(), Arc::new(FixedAuthenticator { business_id: Value::Null }));
    let req = request(b"POST /login HTTP/1.1\r\n\r\n{\"password\":\"wrong\"}");
    let body = req.json_body();
    let Verdict::Halt(detail) = factory.evaluate(&req, body.as_ref()) else {
        panic!("expected halt");
    };
    assert_eq!(detail, Some(json!("PasswordIncorrect")));

    let mut response = HttpResponse::internal_error();
    let rendered = factory.on_fail(&req, &mut response, detail.as_ref());
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        serde_json::from_slice::<Value>(&rendered).unwrap(),
        json!({"reason": "PasswordIncorrect"})
    );
}

#[test]
fn test_minted_token_round_trips_through_auth() {
    let token = issue_token(Value::Null);
    let auth = TokenAuth::new(jwt());
    let Verdict::Proceed(Some(claims)) = auth.evaluate(&request_with_bearer(&token), None) else {
        panic!("expected proceed with claims");
    };
    assert_eq!(claims.get("email"), Some(&json!("a@b.c")));
    assert!(claims.get("exp").is_some());
}

#[test]
fn test_missing_authorization_header_is_invalid() {
    let auth = TokenAuth::new(jwt());
    let Verdict::Halt(detail) = auth.evaluate(&request(b"GET /profile HTTP/1.1\r\n\r\n"), None)
    else {
        panic!("expected halt");
    };
    assert_eq!(detail, Some(json!("TokenInvalid")));
}

#[test]
fn test_tampered_token_is_invalid() {
    let mut token = issue_token(Value::Null);
    token.push('x');
    let auth = TokenAuth::new(jwt());
    let Verdict::Halt(detail) = auth.evaluate(&request_with_bearer(&token), None) else {
        panic!("expected halt");
    };
    assert_eq!(detail, Some(json!("TokenInvalid")));
}

#[test]
fn test_expired_token_is_invalid() {
    let exp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
        - 120;
    let expired = encode(
        &Header::new(Algorithm::HS256),
        &json!({"email": "a@b.c", "exp": exp}),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    let auth = TokenAuth::new(jwt());
    let Verdict::Halt(detail) = auth.evaluate(&request_with_bearer(&expired), None) else {
        panic!("expected halt");
    };
    assert_eq!(detail, Some(json!("TokenInvalid")));
}

#[test]
fn test_blacklisted_token_is_rejected_with_precise_reason() {
    let token = issue_token(Value::Null);
    let blacklist =
        TokenBlacklist::open(Arc::new(MemoryStore::new()), Duration::from_secs(1800)).unwrap();
    let auth = TokenAuth::new(jwt()).with_blacklist(Arc::clone(&blacklist));

    assert!(matches!(
        auth.evaluate(&request_with_bearer(&token), None),
        Verdict::Proceed(_)
    ));
    blacklist.add(&token).unwrap();
    let Verdict::Halt(detail) = auth.evaluate(&request_with_bearer(&token), None) else {
        panic!("expected halt");
    };
    assert_eq!(detail, Some(json!("PresentInBlacklist")));
}

#[test]
fn test_business_auth_requires_business_claim() {
    let auth = BusinessTokenAuth::new(TokenAuth::new(jwt()));

    let personal = issue_token(Value::Null);
    let Verdict::Halt(detail) = auth.evaluate(&request_with_bearer(&personal), None) else {
        panic!("expected halt");
    };
    assert_eq!(detail, Some(json!("NotBusiness")));

    let business = issue_token(json!("60f1b2"));
    let Verdict::Proceed(Some(claims)) = auth.evaluate(&request_with_bearer(&business), None)
    else {
        panic!("expected proceed");
    };
    assert_eq!(claims.get("business_id"), Some(&json!("60f1b2")));
}

#[test]
fn test_business_auth_base_check_runs_first() {
    let auth = BusinessTokenAuth::new(TokenAuth::new(jwt()));
    let Verdict::Halt(detail) = auth.evaluate(&request(b"GET /profile HTTP/1.1\r\n\r\n"), None)
    else {
        panic!("expected halt");
    };
    assert_eq!(detail, Some(json!("TokenInvalid")));
}
