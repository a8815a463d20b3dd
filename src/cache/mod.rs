//! Pluggable cache store backends for metadata and key-set documents.
//!
//! The configuration loader treats the cache as an external shared resource
//! holding opaque byte blobs with a hit/miss signal. Three backend kinds are
//! supported, selected through a [`CacheDescriptor`]:
//!
//! - `file` - a local filesystem store rooted at a caller-supplied path
//! - `distributed-kv` - a caller-supplied key-value client (Redis-like)
//! - `distributed-object` - a caller-supplied object client (Memcached-like)
//!
//! Entries never expire on their own; an entry lives until it is explicitly
//! overwritten. Concurrent writers racing on the same key are last-writer-wins,
//! which is harmless because the cached content is idempotent remote truth.

mod distributed;
mod file;

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;

pub use distributed::{CacheCapability, DistributedCacheStore, RemoteCacheClient};
pub use file::FileCacheStore;

/// Namespace prefix shared by every cache key this crate writes.
pub const CACHE_NAMESPACE: &str = "microsoft_jwt";

/// Errors reported by cache store backends at runtime.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The backend failed to read or write an entry.
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// A filesystem error from the file backend.
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors in the cache descriptor itself, reported at configuration
/// construction time.
#[derive(Debug, thiserror::Error)]
pub enum CacheConfigError {
    /// The descriptor is not a JSON object or has no `type` key.
    #[error("Invalid cache configuration")]
    InvalidDescriptor,

    /// The descriptor names an unsupported backend kind.
    #[error("Invalid cache type: {0}")]
    InvalidType(String),

    /// A backend-specific parameter is missing (`path` for the file
    /// backend, `client` for the distributed backends).
    #[error("Missing cache parameter: {0}")]
    MissingParameter(&'static str),

    /// The supplied client does not have the capability the descriptor
    /// requires.
    #[error("Invalid cache client: expected {expected} capability, got {actual}")]
    InvalidClient {
        /// The capability the backend kind requires.
        expected: CacheCapability,
        /// The capability the supplied client reports.
        actual: CacheCapability,
    },
}

/// Keyed store of opaque byte blobs.
///
/// `get_item` returning `Ok(None)` is a miss; `save` overwrites any previous
/// value for the key.
pub trait CacheStore: Send + Sync {
    /// Looks up a cached entry.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] if the backend fails; a missing entry is
    /// `Ok(None)`, not an error.
    fn get_item(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Stores an entry, overwriting any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] if the backend fails to persist the entry.
    fn save(&self, key: &str, value: &[u8]) -> Result<(), CacheError>;
}

/// Validated description of a cache backend.
///
/// Built either directly through the typed constructors or from a loose
/// JSON descriptor via [`CacheDescriptor::from_value`].
pub enum CacheDescriptor {
    /// Filesystem store rooted at `path`.
    File {
        /// Directory the store writes under.
        path: PathBuf,
    },
    /// Distributed key-value store behind a caller-supplied client.
    DistributedKv {
        /// Pre-built client handle with [`CacheCapability::KeyValue`].
        client: Arc<dyn RemoteCacheClient>,
    },
    /// Distributed object store behind a caller-supplied client.
    DistributedObject {
        /// Pre-built client handle with [`CacheCapability::Object`].
        client: Arc<dyn RemoteCacheClient>,
    },
}

impl std::fmt::Debug for CacheDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File { path } => f.debug_struct("File").field("path", path).finish(),
            Self::DistributedKv { .. } => f.debug_struct("DistributedKv").finish_non_exhaustive(),
            Self::DistributedObject { .. } => {
                f.debug_struct("DistributedObject").finish_non_exhaustive()
            }
        }
    }
}

impl std::fmt::Debug for dyn CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CacheStore")
    }
}

impl CacheDescriptor {
    /// Describes a filesystem cache rooted at `path`.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into() }
    }

    /// Describes a distributed key-value cache behind `client`.
    #[must_use]
    pub fn distributed_kv(client: Arc<dyn RemoteCacheClient>) -> Self {
        Self::DistributedKv { client }
    }

    /// Describes a distributed object cache behind `client`.
    #[must_use]
    pub fn distributed_object(client: Arc<dyn RemoteCacheClient>) -> Self {
        Self::DistributedObject { client }
    }

    /// Parses a loose JSON descriptor of the form
    /// `{"type": "file", "path": "..."}` /
    /// `{"type": "distributed-kv"}` / `{"type": "distributed-object"}`.
    ///
    /// The distributed kinds take their client handle from `client`, since a
    /// live connection cannot be expressed in JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheConfigError`] if the descriptor is not an object,
    /// has no `type`, names an unsupported type, or lacks the
    /// backend-specific parameter.
    pub fn from_value(
        value: &Value,
        client: Option<Arc<dyn RemoteCacheClient>>,
    ) -> Result<Self, CacheConfigError> {
        let descriptor = value
            .as_object()
            .ok_or(CacheConfigError::InvalidDescriptor)?;
        let kind = descriptor
            .get("type")
            .and_then(Value::as_str)
            .ok_or(CacheConfigError::InvalidDescriptor)?;

        match kind {
            "file" => {
                let path = descriptor
                    .get("path")
                    .and_then(Value::as_str)
                    .ok_or(CacheConfigError::MissingParameter("path"))?;
                Ok(Self::file(path))
            }
            "distributed-kv" => Ok(Self::distributed_kv(
                client.ok_or(CacheConfigError::MissingParameter("client"))?,
            )),
            "distributed-object" => Ok(Self::distributed_object(
                client.ok_or(CacheConfigError::MissingParameter("client"))?,
            )),
            other => Err(CacheConfigError::InvalidType(other.to_string())),
        }
    }

    /// Validates the descriptor and builds the concrete store.
    ///
    /// # Errors
    ///
    /// Returns [`CacheConfigError::InvalidClient`] if a distributed client
    /// handle does not report the required capability.
    pub fn build(self) -> Result<Box<dyn CacheStore>, CacheConfigError> {
        match self {
            Self::File { path } => Ok(Box::new(FileCacheStore::new(path))),
            Self::DistributedKv { client } => {
                require_capability(client.as_ref(), CacheCapability::KeyValue)?;
                Ok(Box::new(DistributedCacheStore::new(client)))
            }
            Self::DistributedObject { client } => {
                require_capability(client.as_ref(), CacheCapability::Object)?;
                Ok(Box::new(DistributedCacheStore::new(client)))
            }
        }
    }
}

fn require_capability(
    client: &dyn RemoteCacheClient,
    expected: CacheCapability,
) -> Result<(), CacheConfigError> {
    let actual = client.capability();
    if actual == expected {
        Ok(())
    } else {
        Err(CacheConfigError::InvalidClient { expected, actual })
    }
}
