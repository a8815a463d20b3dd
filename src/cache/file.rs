//! Filesystem cache store.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use super::{CACHE_NAMESPACE, CacheError, CacheStore};

/// Cache store backed by a local directory.
///
/// Entries are written as plain files under `<root>/microsoft_jwt/`, one
/// file per key. Keys are sanitized so they are always valid file names.
pub struct FileCacheStore {
    root: PathBuf,
}

impl FileCacheStore {
    /// Creates a store writing under `path`.
    ///
    /// The directory is created lazily on the first `save`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            root: path.into().join(CACHE_NAMESPACE),
        }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(sanitize_key(key))
    }
}

impl CacheStore for FileCacheStore {
    fn get_item(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match fs::read(self.entry_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.entry_path(key), value)?;
        Ok(())
    }
}

/// Maps a cache key to a safe file name.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miss_then_hit() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path());

        assert!(store.get_item("microsoft_jwt.adfs.jwks").unwrap().is_none());

        store.save("microsoft_jwt.adfs.jwks", b"{\"keys\":[]}").unwrap();
        assert_eq!(
            store.get_item("microsoft_jwt.adfs.jwks").unwrap().unwrap(),
            b"{\"keys\":[]}"
        );
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path());

        store.save("key", b"old").unwrap();
        store.save("key", b"new").unwrap();
        assert_eq!(store.get_item("key").unwrap().unwrap(), b"new");
    }

    #[test]
    fn test_keys_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path());

        store.save("microsoft_jwt.adfs.configuration", b"a").unwrap();
        store.save("microsoft_jwt.azure_ad.configuration", b"b").unwrap();

        assert_eq!(
            store
                .get_item("microsoft_jwt.adfs.configuration")
                .unwrap()
                .unwrap(),
            b"a"
        );
        assert_eq!(
            store
                .get_item("microsoft_jwt.azure_ad.configuration")
                .unwrap()
                .unwrap(),
            b"b"
        );
    }

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("microsoft_jwt.adfs.jwks"), "microsoft_jwt.adfs.jwks");
        assert_eq!(sanitize_key("a/b\\c:d"), "a_b_c_d");
    }
}
