use crate::ids::{KbChunkId, KbSourceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KbSourceStatus {
    Pending,
    Indexing,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbSource {
    pub id: KbSourceId,
    pub name: String,
    pub status: KbSourceStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbChunk {
    pub id: KbChunkId,
    pub kb_source_id: KbSourceId,
    pub chunk_index: u32,
    pub text: String,
    pub char_start: u32,
    pub char_end: u32,
    pub page_start: Option<u32>,
    pub page_end: Option<u32>,
    /// blake3 hex digest of `text`, unique per `kb_source_id`.
    pub hash: String,
}
