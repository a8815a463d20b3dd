//! Provider configuration resolution and caching.
//!
//! A [`Configuration`] is built once per provider: the builder validates the
//! caller's options, resolves the metadata URI (an explicit override or the
//! provider's well-known template), then synchronously loads the OpenID
//! metadata document and the key set it points at, going through the cache
//! backend when one is configured. The result is immutable and can be shared
//! read-only across any number of token verifications.
//!
//! # Cached fetch protocol
//!
//! Each of the two documents is resolved with the same protocol:
//!
//! - no cache configured: fetch and parse, propagating failures;
//! - cache miss: fetch, write through, parse;
//! - cache hit: parse the cached bytes; if they no longer parse, treat the
//!   hit as a soft miss: refetch, overwrite, parse again.
//!
//! A hit that parses never rewrites the cache. The two cache keys are
//! independent and namespaced per provider family, and entries never expire
//! on their own.

use std::fmt;

use crate::cache::{CacheConfigError, CacheDescriptor, CacheError, CacheStore};
use crate::fetch::{DefaultFetcher, Fetch, FetchError};
use crate::keys::KeySet;
use crate::metadata::OpenIdMetadata;
use crate::provider::Provider;

/// Errors that can occur while building a [`Configuration`].
///
/// Two tiers share this enum: option errors (malformed caller input,
/// programmer errors that are never retried) and load errors (unreachable or
/// malformed remote documents, runtime conditions the application may retry).
/// The [`is_options_error`](Self::is_options_error) and
/// [`is_load_error`](Self::is_load_error) predicates distinguish them.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// AD FS provider constructed without a hostname.
    #[error("Missing hostname")]
    MissingHostname,

    /// Azure AD provider constructed without a tenant.
    #[error("Missing tenant")]
    MissingTenant,

    /// Azure AD provider constructed without a tenant identifier.
    #[error("Missing tenant_id")]
    MissingTenantId,

    /// No client id supplied.
    #[error("Missing client_id")]
    MissingClientId,

    /// The cache descriptor is malformed or its client handle is
    /// incompatible.
    #[error(transparent)]
    InvalidCache(#[from] CacheConfigError),

    /// A metadata or key-set document could not be fetched.
    #[error(transparent)]
    NotFound(#[from] FetchError),

    /// The metadata document is missing a required key or is not valid JSON.
    #[error("Invalid configuration document")]
    InvalidMetadata,

    /// The key set document could not be parsed into usable keys.
    #[error("Invalid key set document: {0}")]
    InvalidKeySet(String),

    /// The cache backend failed while loading.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ConfigurationError {
    /// Returns `true` for malformed-options errors that prevent the load
    /// from even starting.
    #[must_use]
    pub fn is_options_error(&self) -> bool {
        matches!(
            self,
            Self::MissingHostname
                | Self::MissingTenant
                | Self::MissingTenantId
                | Self::MissingClientId
                | Self::InvalidCache(_)
        )
    }

    /// Returns `true` for runtime load failures (unreachable or malformed
    /// documents, cache backend failures).
    #[must_use]
    pub fn is_load_error(&self) -> bool {
        !self.is_options_error()
    }
}

/// Builder for [`Configuration`].
///
/// Created through [`Configuration::builder`].
pub struct ConfigurationBuilder {
    provider: Provider,
    client_id: Option<String>,
    metadata_uri: Option<String>,
    cache: Option<CacheDescriptor>,
    fetcher: Option<Box<dyn Fetch>>,
}

impl ConfigurationBuilder {
    /// Sets the relying application's registered client id. Required.
    #[must_use]
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Overrides the metadata URI instead of using the provider's
    /// well-known template. May be a remote URL or a local file path.
    #[must_use]
    pub fn metadata_uri(mut self, uri: impl Into<String>) -> Self {
        self.metadata_uri = Some(uri.into());
        self
    }

    /// Configures a cache backend for the metadata and key-set documents.
    ///
    /// Without a cache, every build fetches both documents.
    #[must_use]
    pub fn cache(mut self, descriptor: CacheDescriptor) -> Self {
        self.cache = Some(descriptor);
        self
    }

    /// Replaces the document fetcher. Primarily useful in tests.
    #[must_use]
    pub fn fetcher(mut self, fetcher: Box<dyn Fetch>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Validates the options and runs the load sequence.
    ///
    /// # Errors
    ///
    /// Option errors are reported first, in a fixed order: provider identity
    /// fields (skipped when a metadata URI override supplies the locator;
    /// the Azure AD tenant id is always required), client id, cache
    /// descriptor. Load errors follow if fetching or parsing either document
    /// fails.
    pub fn build(self) -> Result<Configuration, ConfigurationError> {
        // The locator fields only exist to derive the metadata URI, so an
        // explicit override stands in for them. The Azure AD tenant id also
        // feeds issuer substitution and stays required.
        if self.metadata_uri.is_none() {
            match &self.provider {
                Provider::Adfs { hostname } if hostname.is_empty() => {
                    return Err(ConfigurationError::MissingHostname);
                }
                Provider::AzureAd { tenant, .. } if tenant.is_empty() => {
                    return Err(ConfigurationError::MissingTenant);
                }
                _ => {}
            }
        }
        if let Provider::AzureAd { tenant_id, .. } = &self.provider {
            if tenant_id.is_empty() {
                return Err(ConfigurationError::MissingTenantId);
            }
        }

        let client_id = self
            .client_id
            .filter(|id| !id.is_empty())
            .ok_or(ConfigurationError::MissingClientId)?;

        let cache = self.cache.map(CacheDescriptor::build).transpose()?;

        let metadata_uri = self
            .metadata_uri
            .unwrap_or_else(|| self.provider.metadata_uri());

        let fetcher = self
            .fetcher
            .unwrap_or_else(|| Box::new(DefaultFetcher::new()));

        Configuration::load(self.provider, client_id, metadata_uri, cache, fetcher)
    }
}

/// Loaded, immutable provider configuration.
///
/// Holds every field derived from the provider's metadata document plus the
/// parsed verification key set. `Send + Sync`; share it freely once built.
pub struct Configuration {
    provider: Provider,
    client_id: String,
    metadata_uri: String,
    authorization_endpoint: String,
    token_endpoint: String,
    userinfo_endpoint: String,
    device_authorization_endpoint: String,
    end_session_endpoint: String,
    jwks_uri: String,
    issuer: String,
    access_token_issuer: String,
    id_token_signing_alg_values_supported: Vec<String>,
    token_endpoint_auth_signing_alg_values_supported: Vec<String>,
    key_set: KeySet,
}

impl Configuration {
    /// Starts building a configuration for `provider`.
    #[must_use]
    pub fn builder(provider: Provider) -> ConfigurationBuilder {
        ConfigurationBuilder {
            provider,
            client_id: None,
            metadata_uri: None,
            cache: None,
            fetcher: None,
        }
    }

    fn load(
        provider: Provider,
        client_id: String,
        metadata_uri: String,
        cache: Option<Box<dyn CacheStore>>,
        fetcher: Box<dyn Fetch>,
    ) -> Result<Self, ConfigurationError> {
        let cache = cache.as_deref();
        let fetcher = fetcher.as_ref();
        let family = provider.cache_family();

        let metadata = cached_fetch(
            cache,
            &metadata_cache_key(family),
            &metadata_uri,
            fetcher,
            |bytes| {
                OpenIdMetadata::from_slice(bytes).map_err(|e| {
                    tracing::debug!("Failed to parse metadata document: {}", e);
                    ConfigurationError::InvalidMetadata
                })
            },
        )?;

        let key_set = cached_fetch(
            cache,
            &jwks_cache_key(family),
            &metadata.jwks_uri,
            fetcher,
            |bytes| {
                KeySet::from_slice(bytes)
                    .map_err(|e| ConfigurationError::InvalidKeySet(e.to_string()))
            },
        )?;

        let issuer = provider.post_process_issuer(&metadata.issuer);
        let access_token_issuer = metadata
            .access_token_issuer
            .clone()
            .unwrap_or_else(|| issuer.clone());

        let id_token_algs = metadata
            .id_token_signing_alg_values_supported
            .clone()
            .unwrap_or_else(|| provider.default_signing_algorithms());
        let token_endpoint_auth_algs = metadata
            .token_endpoint_auth_signing_alg_values_supported
            .clone()
            .unwrap_or_else(|| provider.default_signing_algorithms());

        tracing::debug!(
            "Loaded configuration for issuer {} with {} signing keys",
            issuer,
            key_set.len()
        );

        Ok(Self {
            provider,
            client_id,
            metadata_uri,
            authorization_endpoint: metadata.authorization_endpoint,
            token_endpoint: metadata.token_endpoint,
            userinfo_endpoint: metadata.userinfo_endpoint,
            device_authorization_endpoint: metadata.device_authorization_endpoint,
            end_session_endpoint: metadata.end_session_endpoint,
            jwks_uri: metadata.jwks_uri,
            issuer,
            access_token_issuer,
            id_token_signing_alg_values_supported: id_token_algs,
            token_endpoint_auth_signing_alg_values_supported: token_endpoint_auth_algs,
            key_set,
        })
    }

    /// The provider identity this configuration was built for.
    #[must_use]
    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// The relying application's client id.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The metadata URI the configuration was loaded from.
    #[must_use]
    pub fn metadata_uri(&self) -> &str {
        &self.metadata_uri
    }

    /// The authorization endpoint.
    #[must_use]
    pub fn authorization_endpoint(&self) -> &str {
        &self.authorization_endpoint
    }

    /// The token endpoint.
    #[must_use]
    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint
    }

    /// The UserInfo endpoint.
    #[must_use]
    pub fn userinfo_endpoint(&self) -> &str {
        &self.userinfo_endpoint
    }

    /// The device authorization endpoint.
    #[must_use]
    pub fn device_authorization_endpoint(&self) -> &str {
        &self.device_authorization_endpoint
    }

    /// The end-session endpoint.
    #[must_use]
    pub fn end_session_endpoint(&self) -> &str {
        &self.end_session_endpoint
    }

    /// The JWKS URI the key set was loaded from.
    #[must_use]
    pub fn jwks_uri(&self) -> &str {
        &self.jwks_uri
    }

    /// The issuer of ID tokens, after provider post-processing.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// The issuer of access tokens. Defaults to [`issuer`](Self::issuer)
    /// when the metadata document does not publish a separate value.
    #[must_use]
    pub fn access_token_issuer(&self) -> &str {
        &self.access_token_issuer
    }

    /// Signing algorithms accepted for ID tokens.
    #[must_use]
    pub fn id_token_signing_alg_values_supported(&self) -> &[String] {
        &self.id_token_signing_alg_values_supported
    }

    /// Signing algorithms accepted for token-endpoint authentication, used
    /// for access tokens.
    #[must_use]
    pub fn token_endpoint_auth_signing_alg_values_supported(&self) -> &[String] {
        &self.token_endpoint_auth_signing_alg_values_supported
    }

    /// The provider's verification keys.
    #[must_use]
    pub fn key_set(&self) -> &KeySet {
        &self.key_set
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("provider", &self.provider)
            .field("client_id", &self.client_id)
            .field("metadata_uri", &self.metadata_uri)
            .field("issuer", &self.issuer)
            .field("access_token_issuer", &self.access_token_issuer)
            .field("jwks_uri", &self.jwks_uri)
            .field("key_set", &self.key_set)
            .finish_non_exhaustive()
    }
}

/// Cache key of the metadata document for a provider family.
fn metadata_cache_key(family: &str) -> String {
    format!("{}.{}.configuration", crate::cache::CACHE_NAMESPACE, family)
}

/// Cache key of the key-set document for a provider family.
fn jwks_cache_key(family: &str) -> String {
    format!("{}.{}.jwks", crate::cache::CACHE_NAMESPACE, family)
}

/// Resolves one document through the cached fetch protocol.
fn cached_fetch<T>(
    cache: Option<&dyn CacheStore>,
    key: &str,
    uri: &str,
    fetcher: &dyn Fetch,
    parse: impl Fn(&[u8]) -> Result<T, ConfigurationError>,
) -> Result<T, ConfigurationError> {
    let Some(cache) = cache else {
        return parse(&fetcher.fetch(uri)?);
    };

    match cache.get_item(key)? {
        None => {
            tracing::debug!("Cache miss for {}, fetching {}", key, uri);
            let bytes = fetcher.fetch(uri)?;
            cache.save(key, &bytes)?;
            parse(&bytes)
        }
        Some(bytes) => match parse(&bytes) {
            Ok(value) => {
                tracing::trace!("Cache hit for {}", key);
                Ok(value)
            }
            Err(_) => {
                // Stale or corrupted entry: treat the hit as a soft miss.
                tracing::warn!("Cached entry for {} no longer parses, refetching {}", key, uri);
                let bytes = fetcher.fetch(uri)?;
                cache.save(key, &bytes)?;
                parse(&bytes)
            }
        },
    }
}
