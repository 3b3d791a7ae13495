//! # terra-export
//!
//! Export Renderers (L): turns an in-memory issue list into owned
//! `.xlsx`/`.docx` bytes. No HTTP or store coupling — the caller loads
//! issues, outline, and anchors and hands them in.

pub mod docx;
pub mod error;
pub mod section;
pub mod xlsx;

pub use error::{ExportError, ExportResult};
pub use section::{group_issues_by_section, resolve_heading_pages};
