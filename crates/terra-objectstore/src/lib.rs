//! # terra-objectstore
//!
//! Object store abstraction (component A): a small trait plus a filesystem
//! backend. Remote backend wire protocols are out of scope.

pub mod error;
pub mod local;
pub mod traits;

pub use error::{ObjectStoreError, ObjectStoreResult};
pub use local::LocalObjectStore;
pub use traits::{version_source_key, ObjectStore};
