use crate::ids::{DocumentId, VersionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VersionStatus {
    Uploaded,
    Converting,
    Parsing,
    Aligning,
    ExtractingFacts,
    Ready,
    Failed,
}

impl VersionStatus {
    /// Stage progress shown to clients while a version moves through ingestion.
    pub fn progress_floor(self) -> u8 {
        match self {
            VersionStatus::Uploaded => 0,
            VersionStatus::Converting => 10,
            VersionStatus::Parsing => 30,
            VersionStatus::Aligning => 55,
            VersionStatus::ExtractingFacts => 80,
            VersionStatus::Ready => 100,
            VersionStatus::Failed => 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentVersion {
    pub id: VersionId,
    pub document_id: DocumentId,
    pub version_no: i32,
    pub status: VersionStatus,
    pub progress: u8,
    pub current_step: Option<String>,
    pub error_message: Option<String>,
    pub source_object_key: String,
    pub pdf_object_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentVersion {
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, VersionStatus::Ready | VersionStatus::Failed)
    }
}
