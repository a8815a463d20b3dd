//! Token verification pipeline.
//!
//! A [`VerifiedJwt`] is constructed per verification event: it delegates the
//! cryptographic decode to `jsonwebtoken`, then enforces issuer and audience
//! policy against the loaded [`Configuration`]. Either the whole pipeline
//! succeeds and the claims are available, or construction fails with a typed
//! error; no partially valid token escapes.
//!
//! Two roles exist, each with its own expected issuer and default audience:
//!
//! - access tokens validate against
//!   [`access_token_issuer`](Configuration::access_token_issuer) with the
//!   token-endpoint-auth algorithm list, defaulting the audience to the
//!   provider's well-known resource identifier;
//! - ID tokens validate against [`issuer`](Configuration::issuer) with the
//!   ID-token algorithm list, defaulting the audience to the client id.

use std::str::FromStr;

use jsonwebtoken::{Algorithm, Validation, decode, decode_header};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::configuration::Configuration;

/// Errors that can occur while verifying a token.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The token carries no `iss` claim.
    #[error("Missing issuer")]
    MissingIssuer,

    /// The `iss` claim does not match the expected issuer; carries the
    /// offending value.
    #[error("Invalid issuer: {0}")]
    InvalidIssuer(String),

    /// The token carries no `aud` claim.
    #[error("Missing audience")]
    MissingAudience,

    /// The `aud` claim does not match the effective audience; carries the
    /// offending value.
    #[error("Invalid audience: {0}")]
    InvalidAudience(String),

    /// The token header carries no key id, so no verification key can be
    /// selected.
    #[error("Token is missing key ID (kid) header")]
    MissingKeyId,

    /// The key id named by the token is not in the provider's key set.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// A signature, algorithm, or structural failure from the underlying
    /// JWT engine, propagated verbatim.
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Optional inputs to a verification.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// Expected audience, overriding the role's default.
    pub audience: Option<String>,

    /// Additional signing algorithms accepted on top of the
    /// configuration-sourced list.
    pub extra_algorithms: Vec<String>,
}

impl VerifyOptions {
    /// Creates empty options: role-default audience, configuration-sourced
    /// algorithms only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the expected audience.
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Adds extra accepted signing algorithms.
    #[must_use]
    pub fn with_extra_algorithms(mut self, algorithms: Vec<String>) -> Self {
        self.extra_algorithms = algorithms;
        self
    }
}

/// Role a token plays, selecting issuer, algorithm, and audience policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenRole {
    AccessToken,
    IdToken,
}

impl TokenRole {
    fn expected_issuer<'a>(self, config: &'a Configuration) -> &'a str {
        match self {
            Self::AccessToken => config.access_token_issuer(),
            Self::IdToken => config.issuer(),
        }
    }

    fn allowed_algorithms<'a>(self, config: &'a Configuration) -> &'a [String] {
        match self {
            Self::AccessToken => config.token_endpoint_auth_signing_alg_values_supported(),
            Self::IdToken => config.id_token_signing_alg_values_supported(),
        }
    }

    fn default_audience(self, config: &Configuration) -> String {
        match self {
            Self::AccessToken => config.provider().default_access_token_audience().to_string(),
            Self::IdToken => config.client_id().to_string(),
        }
    }
}

/// A token that passed signature, issuer, and audience validation.
///
/// Short-lived: constructed, read, discarded. Retries construct a new one.
#[derive(Debug, Clone)]
pub struct VerifiedJwt {
    raw_token: String,
    claims: Map<String, Value>,
}

impl VerifiedJwt {
    /// Verifies an access token against `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenError`] at the first violated step; see the module
    /// documentation for the pipeline order.
    pub fn access_token(
        config: &Configuration,
        token: impl Into<String>,
        options: VerifyOptions,
    ) -> Result<Self, TokenError> {
        Self::verify(TokenRole::AccessToken, config, token.into(), options)
    }

    /// Verifies an ID token against `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenError`] at the first violated step; see the module
    /// documentation for the pipeline order.
    pub fn id_token(
        config: &Configuration,
        token: impl Into<String>,
        options: VerifyOptions,
    ) -> Result<Self, TokenError> {
        Self::verify(TokenRole::IdToken, config, token.into(), options)
    }

    fn verify(
        role: TokenRole,
        config: &Configuration,
        raw_token: String,
        options: VerifyOptions,
    ) -> Result<Self, TokenError> {
        let audience = options
            .audience
            .unwrap_or_else(|| role.default_audience(config));

        let algorithms = resolve_algorithms(
            role.allowed_algorithms(config)
                .iter()
                .chain(options.extra_algorithms.iter()),
        );

        let header = decode_header(&raw_token)?;
        let kid = header.kid.ok_or(TokenError::MissingKeyId)?;
        let decoding_key = config
            .key_set()
            .get(&kid)
            .ok_or_else(|| TokenError::KeyNotFound(kid.clone()))?;

        // Issuer and audience are enforced by this pipeline; expiry is left
        // to the engine, so an expired token never constructs.
        let mut validation = Validation::new(header.alg);
        validation.algorithms = algorithms;
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims::<&str>(&[]);

        let token_data = decode::<Map<String, Value>>(&raw_token, decoding_key, &validation)?;
        let claims = token_data.claims;

        let expected_issuer = role.expected_issuer(config);
        match claims.get("iss") {
            None => return Err(TokenError::MissingIssuer),
            Some(iss) if iss.as_str() != Some(expected_issuer) => {
                return Err(TokenError::InvalidIssuer(claim_to_string(iss)));
            }
            Some(_) => {}
        }

        match claims.get("aud") {
            None => return Err(TokenError::MissingAudience),
            Some(aud) if aud.as_str() != Some(audience.as_str()) => {
                return Err(TokenError::InvalidAudience(claim_to_string(aud)));
            }
            Some(_) => {}
        }

        Ok(Self { raw_token, claims })
    }

    /// Returns `true` if the token's `exp` claim is in the past. A missing
    /// or non-numeric `exp` counts as expired.
    ///
    /// Verification already rejects tokens that are expired at construction
    /// time; this re-checks a token held past its lifetime.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        match self.claims.get("exp").and_then(Value::as_i64) {
            Some(exp) => exp <= now,
            None => true,
        }
    }

    /// The validated claim set.
    #[must_use]
    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    /// The original compact token string.
    #[must_use]
    pub fn raw_token(&self) -> &str {
        &self.raw_token
    }

    /// Returns the named claim, or `None` if the token does not carry it.
    /// A claim holding a legitimately falsy value is still `Some`.
    #[must_use]
    pub fn get(&self, claim: &str) -> Option<&Value> {
        self.claims.get(claim)
    }
}

/// Maps algorithm names to engine algorithms, skipping unknown names with a
/// warning.
fn resolve_algorithms<'a>(names: impl Iterator<Item = &'a String>) -> Vec<Algorithm> {
    names
        .filter_map(|name| match Algorithm::from_str(name) {
            Ok(alg) => Some(alg),
            Err(_) => {
                tracing::warn!("Ignoring unsupported signing algorithm: {}", name);
                None
            }
        })
        .collect()
}

/// Renders a claim value for an error message: strings verbatim, everything
/// else as JSON.
fn claim_to_string(value: &Value) -> String {
    value
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}
