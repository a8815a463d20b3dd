//! Distributed cache stores behind caller-supplied clients.
//!
//! The crate does not open connections to distributed caches itself; the
//! application hands over a pre-built client implementing
//! [`RemoteCacheClient`]. The client advertises its capability so an
//! incompatible handle is rejected when the configuration is built.

use std::fmt;
use std::sync::Arc;

use super::{CacheError, CacheStore};

/// Capability a remote cache client provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheCapability {
    /// Key-value semantics (Redis-like).
    KeyValue,
    /// Object semantics (Memcached-like).
    Object,
}

impl fmt::Display for CacheCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyValue => write!(f, "key-value"),
            Self::Object => write!(f, "object"),
        }
    }
}

/// Pre-built client handle for a distributed cache.
///
/// Implementations wrap whatever connection the application already holds.
pub trait RemoteCacheClient: Send + Sync {
    /// The capability this client provides.
    fn capability(&self) -> CacheCapability;

    /// Reads the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] if the backend cannot be reached.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Stores `value` under `key`, overwriting any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] if the backend cannot be reached.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError>;
}

/// Cache store delegating to a [`RemoteCacheClient`].
pub struct DistributedCacheStore {
    client: Arc<dyn RemoteCacheClient>,
}

impl DistributedCacheStore {
    pub(crate) fn new(client: Arc<dyn RemoteCacheClient>) -> Self {
        Self { client }
    }
}

impl CacheStore for DistributedCacheStore {
    fn get_item(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.client.get(key)
    }

    fn save(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        self.client.set(key, value)
    }
}
