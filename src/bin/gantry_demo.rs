//! Demo service exercising the full pipeline: token issuance on login,
//! verified routes, logout via the blacklist, and a templated echo route.

use anyhow::Context;
use clap::Parser;
use gantry::app::App;
use gantry::binding::{Payload, Slot};
use gantry::blacklist::{JsonFileStore, TokenBlacklist};
use gantry::config::ServerConfig;
use gantry::security::{bearer_token, Authenticator, AuthenticationResult, JwtConfig, TokenAuth, TokenFactory};
use gantry::HttpRequest;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

// pattern is fixed, compilation cannot fail
#[allow(clippy::unwrap_used)]
static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

#[derive(Parser, Debug)]
#[command(name = "gantry-demo", version, about = "Demo login/logout service")]
struct Args {
    /// Listener bind address
    #[arg(long, env = "GANTRY_ADDR", default_value = "0.0.0.0:8080")]
    addr: String,

    /// Root directory for the static fallback
    #[arg(long, env = "GANTRY_STATIC_ROOT", default_value = "static")]
    static_root: PathBuf,

    /// Token signing secret
    #[arg(long, env = "GANTRY_JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    /// Token validity window in seconds
    #[arg(long, env = "GANTRY_TOKEN_EXPIRY_SECS", default_value_t = 1800)]
    token_expiry_secs: u64,

    /// Blacklist persistence file
    #[arg(long, default_value = "blacklist.json")]
    blacklist_path: PathBuf,
}

/// Single hard-coded account; a real deployment swaps in its user store.
struct DemoAuthenticator;

impl Authenticator for DemoAuthenticator {
    fn authenticate(
        &self,
        _request: &HttpRequest,
        body: Option<&Value>,
    ) -> Result<Value, AuthenticationResult> {
        let body = body.ok_or(AuthenticationResult::MissingFields)?;
        let email = body
            .get("email")
            .and_then(Value::as_str)
            .ok_or(AuthenticationResult::MissingFields)?;
        let password = body
            .get("password")
            .and_then(Value::as_str)
            .ok_or(AuthenticationResult::MissingFields)?;
        if !EMAIL_REGEX.is_match(email) {
            return Err(AuthenticationResult::EmailInvalid);
        }
        if email != "demo@example.com" {
            return Err(AuthenticationResult::EmailIncorrect);
        }
        if password != "hunter2!" {
            return Err(AuthenticationResult::PasswordIncorrect);
        }
        Ok(json!({ "email": email, "business_id": null }))
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let jwt = JwtConfig::new(
        args.jwt_secret,
        std::time::Duration::from_secs(args.token_expiry_secs),
    );

    let blacklist = TokenBlacklist::open(
        Arc::new(JsonFileStore::new(args.blacklist_path)),
        jwt.expiry,
    )
    .context("opening token blacklist")?;
    let purge = blacklist.spawn_purge_worker()?;

    let config = ServerConfig {
        addr: args.addr,
        static_root: args.static_root,
        ..ServerConfig::default()
    };
    let handle = build_app(config, jwt, Arc::clone(&blacklist))?
        .start()
        .context("starting server")?;
    info!(addr = %handle.local_addr(), "demo service up");

    handle.join();
    purge.stop();
    Ok(())
}

fn build_app(
    config: ServerConfig,
    jwt: JwtConfig,
    blacklist: Arc<TokenBlacklist>,
) -> anyhow::Result<App> {
    let mut app = App::new(config);

    let factory = Arc::new(TokenFactory::new(jwt.clone(), Arc::new(DemoAuthenticator)));
    app.post("/login")
        .decorate(factory)
        .slot(Slot::decorator_value("token", TokenFactory::KEY))
        .handler(|_req, _res, args| {
            Ok(Payload::Json(json!({ "token": args.get::<String>("token") })))
        })?;

    let auth = Arc::new(TokenAuth::new(jwt).with_blacklist(Arc::clone(&blacklist)));
    app.get("/profile")
        .decorate(Arc::<TokenAuth>::clone(&auth))
        .slot(Slot::decorator_value("claims", TokenAuth::KEY))
        .handler(|_req, _res, args| {
            Ok(Payload::Json(json!({ "claims": args.get::<Value>("claims") })))
        })?;

    let logout_blacklist = blacklist;
    app.post("/logout")
        .decorate(auth)
        .handler(move |req, _res, _args| {
            if let Some(token) = bearer_token(req) {
                logout_blacklist.add(token)?;
            }
            Ok(Payload::Json(json!({ "result": "Success" })))
        })?;

    app.get("/echo/{word}")
        .slot(Slot::path_variable("word"))
        .slot(Slot::query("repeat").with_default(json!(1)))
        .handler(|_req, _res, args| {
            let word: String = args.get("word").unwrap_or_default();
            let repeat: usize = args.get("repeat").unwrap_or(1);
            Ok(Payload::Json(json!({ "echo": vec![word; repeat] })))
        })?;

    Ok(app)
}
