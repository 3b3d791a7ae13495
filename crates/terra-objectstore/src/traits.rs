//! Object store abstraction (component A). Keys follow the DDS convention
//! `projects/{p}/documents/{d}/versions/{v}/{name}`; the backend does not
//! interpret the key beyond treating it as a path.

use crate::error::ObjectStoreResult;
use std::io::Read;

pub trait ObjectStore: Send + Sync {
    fn put(&self, key: &str, data: &[u8]) -> ObjectStoreResult<()>;

    /// A URL granting temporary access to the object. The local backend
    /// points at a static-file route; a real remote backend would presign.
    fn get_signed_url(&self, key: &str, expires_in_seconds: u64) -> ObjectStoreResult<String>;

    /// `None` when the key does not exist, matching the original's
    /// `get_object -> BinaryIO | None` contract.
    fn get_object(&self, key: &str) -> ObjectStoreResult<Option<Box<dyn Read + Send>>>;

    fn exists(&self, key: &str) -> bool;
}

/// Builds the DDS-convention object key for a document version's source file.
pub fn version_source_key(project_id: i64, document_id: i64, version_id: i64, filename: &str) -> String {
    format!("projects/{project_id}/documents/{document_id}/versions/{version_id}/{filename}")
}
