use crate::ids::{BlockId, CheckpointId, IssueId, RunId, VersionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineType {
    Rule,
    Ai,
    Sql,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewType {
    Form,
    Tech,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRun {
    pub id: RunId,
    pub version_id: VersionId,
    pub engine_type: EngineType,
    pub status: RunStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// 致命
    Fatal,
    /// 高
    High,
    /// 中
    Medium,
    /// 低
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueStatus {
    Open,
    Confirmed,
    Dismissed,
    Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceQuote {
    pub block_id: BlockId,
    pub quote: String,
}

impl EvidenceQuote {
    pub const QUOTE_MAX: usize = 500;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    pub version_id: VersionId,
    pub run_id: RunId,
    pub checkpoint_code: Option<String>,
    pub issue_type: String,
    pub review_type: ReviewType,
    pub severity: Severity,
    pub status: IssueStatus,
    pub title: String,
    pub description: String,
    pub suggestion: Option<String>,
    pub confidence: f64,
    pub page_no: Option<u32>,
    pub evidence_block_ids: Vec<BlockId>,
    pub evidence_quotes: Vec<EvidenceQuote>,
    pub created_at: DateTime<Utc>,
}

impl Issue {
    pub const TITLE_MAX: usize = 255;
    pub const TEXT_MAX: usize = 2000;
    pub const EVIDENCE_BLOCK_IDS_MAX: usize = 5;
    pub const EVIDENCE_QUOTES_MAX: usize = 10;
    /// Fallback page used only when no anchor-based resolution succeeds.
    pub const DEFAULT_PAGE_NO: u32 = 1;
}

/// A candidate issue before it has a run/checkpoint attached — the shape
/// produced by both rule executors and the AI driver's mapping step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueDraft {
    pub issue_type: String,
    pub review_type: ReviewType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub suggestion: Option<String>,
    pub confidence: f64,
    pub evidence_block_ids: Vec<BlockId>,
    pub page_no: Option<u32>,
    pub evidence_quotes: Vec<EvidenceQuote>,
}

impl IssueDraft {
    pub fn truncated(mut self) -> Self {
        self.title.truncate(Issue::TITLE_MAX);
        self.description.truncate(Issue::TEXT_MAX);
        if let Some(s) = self.suggestion.as_mut() {
            s.truncate(Issue::TEXT_MAX);
        }
        self.evidence_block_ids.truncate(Issue::EVIDENCE_BLOCK_IDS_MAX);
        self.evidence_quotes.truncate(Issue::EVIDENCE_QUOTES_MAX);
        for q in &mut self.evidence_quotes {
            q.quote.truncate(EvidenceQuote::QUOTE_MAX);
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: CheckpointId,
    pub code: String,
    pub name: String,
    pub engine_type: EngineType,
    pub enabled: bool,
    pub order_index: i64,
    pub rule_config: serde_json::Value,
}
