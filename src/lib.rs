//! # microsoft-jwt
//!
//! Validation of identity tokens issued by Microsoft identity providers,
//! AD FS (on-premises federation service) and Azure AD (cloud directory),
//! for a relying application.
//!
//! The crate resolves a provider's OpenID Connect metadata and signing-key
//! set, optionally caches both documents in a pluggable cache backend, and
//! verifies that a presented token was issued by the expected authority,
//! targets the expected audience, and carries an acceptable signature
//! algorithm.
//!
//! ## Overview
//!
//! Construction is two-phase: a [`Configuration`] is built once (typically at
//! service start-up), loading and caching the provider metadata and key set
//! synchronously, and is then shared read-only across any number of
//! verifications. Each verification constructs a short-lived [`VerifiedJwt`]
//! which either holds a fully validated claim set or fails with a typed
//! error.
//!
//! ```ignore
//! use microsoft_jwt::{Configuration, Provider, VerifiedJwt, VerifyOptions};
//!
//! let config = Configuration::builder(Provider::adfs("adfs.example.com"))
//!     .client_id("my-client-id")
//!     .build()?;
//!
//! let token = VerifiedJwt::id_token(&config, raw_token, VerifyOptions::default())?;
//! assert!(!token.is_expired());
//! println!("subject: {:?}", token.get("sub"));
//! ```
//!
//! ## Modules
//!
//! - [`provider`] - Provider identities and their policy tables
//! - [`configuration`] - Metadata/key-set resolution and caching
//! - [`metadata`] - OpenID Connect metadata document types
//! - [`keys`] - Verification key sets parsed from JWKS documents
//! - [`cache`] - Pluggable cache store backends
//! - [`fetch`] - Remote/local document fetching
//! - [`token`] - Token verification pipeline

pub mod cache;
pub mod configuration;
pub mod fetch;
pub mod keys;
pub mod metadata;
pub mod provider;
pub mod token;

pub use cache::{
    CacheCapability, CacheConfigError, CacheDescriptor, CacheError, CacheStore, FileCacheStore,
    RemoteCacheClient,
};
pub use configuration::{Configuration, ConfigurationBuilder, ConfigurationError};
pub use fetch::{DefaultFetcher, Fetch, FetchError};
pub use keys::{KeySet, KeySetError};
pub use metadata::OpenIdMetadata;
pub use provider::Provider;
pub use token::{TokenError, VerifiedJwt, VerifyOptions};
