//! Filesystem-backed object store. The only backend SPEC_FULL requires a
//! working implementation of; wire protocols for a remote backend are out
//! of scope (see `ObjectStoreError::UnsupportedBackend`).

use crate::error::{ObjectStoreError, ObjectStoreResult};
use crate::traits::ObjectStore;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

pub struct LocalObjectStore {
    root: PathBuf,
    base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> ObjectStoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            base_url: base_url.into(),
        })
    }

    fn resolve(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl ObjectStore for LocalObjectStore {
    fn put(&self, key: &str, data: &[u8]) -> ObjectStoreResult<()> {
        let path = self.resolve(key);
        if let Some(parent) = Path::new(&path).parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, data)?;
        Ok(())
    }

    fn get_signed_url(&self, key: &str, _expires_in_seconds: u64) -> ObjectStoreResult<String> {
        Ok(format!("{}/storage/{}", self.base_url.trim_end_matches('/'), key))
    }

    fn get_object(&self, key: &str) -> ObjectStoreResult<Option<Box<dyn Read + Send>>> {
        let path = self.resolve(key);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(Box::new(File::open(path)?)))
    }

    fn exists(&self, key: &str) -> bool {
        self.resolve(key).is_file()
    }
}

/// Placeholder for a remote object store backend. SPEC_FULL excludes
/// object-storage wire protocols from scope; constructing one is a typed
/// error rather than a silently degraded local store.
pub struct UnconfiguredRemoteStore;

impl ObjectStore for UnconfiguredRemoteStore {
    fn put(&self, _key: &str, _data: &[u8]) -> ObjectStoreResult<()> {
        Err(ObjectStoreError::UnsupportedBackend("minio"))
    }

    fn get_signed_url(&self, _key: &str, _expires_in_seconds: u64) -> ObjectStoreResult<String> {
        Err(ObjectStoreError::UnsupportedBackend("minio"))
    }

    fn get_object(&self, _key: &str) -> ObjectStoreResult<Option<Box<dyn Read + Send>>> {
        Err(ObjectStoreError::UnsupportedBackend("minio"))
    }

    fn exists(&self, _key: &str) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path(), "http://localhost").unwrap();
        store.put("projects/1/documents/2/versions/3/source.docx", b"hello").unwrap();
        assert!(store.exists("projects/1/documents/2/versions/3/source.docx"));
        let mut buf = Vec::new();
        store
            .get_object("projects/1/documents/2/versions/3/source.docx")
            .unwrap()
            .unwrap()
            .read_to_end(&mut buf)
            .unwrap();
        assert_eq!(buf, b"hello");
    }

    #[test]
    fn missing_key_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path(), "http://localhost").unwrap();
        assert!(store.get_object("nope").unwrap().is_none());
        assert!(!store.exists("nope"));
    }

    #[test]
    fn signed_url_points_at_storage_route() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path(), "http://localhost/").unwrap();
        let url = store.get_signed_url("a/b", 1800).unwrap();
        assert_eq!(url, "http://localhost/storage/a/b");
    }
}
