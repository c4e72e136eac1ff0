//! JWT authentication middleware.
//!
//! # Responsibilities
//! - Run the extraction chain to find a token
//! - Resolve the verification key (static key or key-id map)
//! - Verify signature, algorithm and time claims
//! - Hand verified claims to the handler, or run the error continuation
//!
//! # Design Decisions
//! - The claims type is a generic parameter fixed per middleware instance
//! - Algorithm mismatch is rejected before any key lookup
//! - `exp`/`nbf` are checked when present but not required

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use axum::http::StatusCode;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Header, Validation};
use serde::de::DeserializeOwned;

use crate::auth::extractor::{extract_credential, parse_token_lookup, Extractor};
use crate::auth::AuthError;
use crate::config::AuthSettings;
use crate::context::Ctx;
use crate::error::Result;
use crate::middleware::{Handler, Middleware};

/// Continuation run after successful verification.
pub type SuccessHandler = Arc<dyn Fn(&mut Ctx, &dyn Handler) -> Result<()> + Send + Sync>;

/// Continuation run instead of the protected handler on failure.
pub type ErrorHandler = Arc<dyn Fn(&mut Ctx, &AuthError) -> Result<()> + Send + Sync>;

/// Verified claims, stored in the request context.
#[derive(Debug, Clone, PartialEq)]
pub struct Claims<C>(pub C);

/// Verification keys.
#[derive(Clone)]
pub enum KeySet {
    /// One key for every token.
    Static(DecodingKey),
    /// Keys selected by the token's `kid` header.
    ById(HashMap<String, DecodingKey>),
}

impl KeySet {
    pub fn secret(secret: &[u8]) -> Self {
        KeySet::Static(DecodingKey::from_secret(secret))
    }

    fn resolve(&self, header: &Header) -> std::result::Result<&DecodingKey, AuthError> {
        match self {
            KeySet::Static(key) => Ok(key),
            KeySet::ById(keys) => header
                .kid
                .as_deref()
                .and_then(|kid| keys.get(kid))
                .ok_or_else(|| {
                    AuthError::Verification(format!("unexpected jwt key id={:?}", header.kid))
                }),
        }
    }
}

impl fmt::Debug for KeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySet::Static(_) => f.write_str("Static(..)"),
            KeySet::ById(keys) => f
                .debug_tuple("ById")
                .field(&keys.keys().collect::<Vec<_>>())
                .finish(),
        }
    }
}

/// Settings for [`JwtAuth`].
#[derive(Clone)]
pub struct JwtConfig {
    pub extractors: Vec<Extractor>,
    pub algorithm: Algorithm,
    pub keys: KeySet,
    pub on_success: Option<SuccessHandler>,
    pub on_error: Option<ErrorHandler>,
}

impl JwtConfig {
    /// `Authorization: Bearer <token>` lookup with the given key material.
    pub fn new(algorithm: Algorithm, keys: KeySet) -> Self {
        Self {
            extractors: vec![Extractor::header("Authorization", "Bearer")],
            algorithm,
            keys,
            on_success: None,
            on_error: None,
        }
    }

    pub fn extractors(mut self, extractors: Vec<Extractor>) -> Self {
        self.extractors = extractors;
        self
    }

    pub fn on_success(
        mut self,
        f: impl Fn(&mut Ctx, &dyn Handler) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.on_success = Some(Arc::new(f));
        self
    }

    pub fn on_error(
        mut self,
        f: impl Fn(&mut Ctx, &AuthError) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Build from file settings (shared-secret algorithms only).
    pub fn from_settings(settings: &AuthSettings) -> std::result::Result<Self, AuthError> {
        let algorithm = signing_algorithm(&settings.signing_method)?;
        let keys = if settings.signing_keys.is_empty() {
            let secret = settings.signing_key.as_deref().ok_or(AuthError::MissingKey)?;
            KeySet::secret(secret.as_bytes())
        } else {
            KeySet::ById(
                settings
                    .signing_keys
                    .iter()
                    .map(|(kid, secret)| (kid.clone(), DecodingKey::from_secret(secret.as_bytes())))
                    .collect(),
            )
        };
        let extractors = parse_token_lookup(&settings.token_lookup, &settings.auth_scheme)?;
        Ok(Self::new(algorithm, keys).extractors(extractors))
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("extractors", &self.extractors)
            .field("algorithm", &self.algorithm)
            .field("keys", &self.keys)
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Parse a shared-secret signing method name.
pub fn signing_algorithm(name: &str) -> std::result::Result<Algorithm, AuthError> {
    match name {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(AuthError::UnsupportedAlgorithm(other.to_string())),
    }
}

/// Token authentication stage. `C` is the claims shape tokens must decode to.
pub struct JwtAuth<C = serde_json::Value> {
    config: JwtConfig,
    validation: Validation,
    _claims: PhantomData<fn() -> C>,
}

impl<C> JwtAuth<C>
where
    C: DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::new(config.algorithm);
        validation.required_spec_claims.clear();
        validation.validate_aud = false;
        Self {
            config,
            validation,
            _claims: PhantomData,
        }
    }

    pub fn from_settings(settings: &AuthSettings) -> std::result::Result<Self, AuthError> {
        Ok(Self::new(JwtConfig::from_settings(settings)?))
    }

    /// Verify `token` and decode its claims.
    pub fn verify(&self, token: &str) -> std::result::Result<C, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::Verification(e.to_string()))?;
        if header.alg != self.config.algorithm {
            return Err(AuthError::Verification(format!(
                "unexpected jwt signing method={:?}",
                header.alg
            )));
        }
        let key = self.config.keys.resolve(&header)?;
        decode::<C>(token, key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::Verification(e.to_string()))
    }

    /// Extract and verify the credential carried by `ctx`.
    pub fn authenticate(&self, ctx: &Ctx) -> std::result::Result<C, AuthError> {
        let token = extract_credential(&self.config.extractors, ctx)?;
        self.verify(&token)
    }
}

impl<C> Middleware for JwtAuth<C>
where
    C: DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn call(&self, ctx: &mut Ctx, next: &dyn Handler) -> Result<()> {
        match self.authenticate(ctx) {
            Ok(claims) => {
                ctx.insert_local(Claims(claims));
                match &self.config.on_success {
                    Some(on_success) => on_success(ctx, next),
                    None => next.call(ctx),
                }
            }
            Err(err) => {
                tracing::warn!(path = %ctx.path(), error = %err, "Authentication rejected");
                match &self.config.on_error {
                    Some(on_error) => on_error(ctx, &err),
                    None => default_error_response(ctx, &err),
                }
            }
        }
    }
}

impl<C> fmt::Debug for JwtAuth<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtAuth").field("config", &self.config).finish()
    }
}

fn default_error_response(ctx: &mut Ctx, err: &AuthError) -> Result<()> {
    let (status, message) = match err {
        AuthError::MissingCredential => (StatusCode::BAD_REQUEST, "Missing or malformed JWT"),
        _ => (StatusCode::UNAUTHORIZED, "Invalid or expired JWT"),
    };
    ctx.status(status).send_string(message)
}
