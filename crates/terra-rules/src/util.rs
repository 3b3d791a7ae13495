//! Shared helpers for rule executors: draft construction, the
//! review-type classification, and numeric tolerance comparison.

use terra_core::ids::BlockId;
use terra_core::model::{EvidenceQuote, IssueDraft, ReviewType, Severity};

pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// Mirrors the original export service's issue_type -> review_type
/// classification (spec §4.7/§4.8): FORMAT/CONTENT are form (formal)
/// review, everything else is technical review.
pub fn review_type_for(issue_type: &str) -> ReviewType {
    let t = issue_type.to_uppercase();
    if t.contains("FORMAT") || t.contains("CONTENT") {
        ReviewType::Form
    } else {
        ReviewType::Tech
    }
}

pub struct DraftBuilder {
    issue_type: String,
    severity: Severity,
    title: String,
    description: String,
    suggestion: Option<String>,
    confidence: f64,
    evidence_block_ids: Vec<BlockId>,
    evidence_quotes: Vec<EvidenceQuote>,
}

impl DraftBuilder {
    pub fn new(issue_type: impl Into<String>, severity: Severity, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            issue_type: issue_type.into(),
            severity,
            title: title.into(),
            description: description.into(),
            suggestion: None,
            confidence: 0.9,
            evidence_block_ids: Vec::new(),
            evidence_quotes: Vec::new(),
        }
    }

    pub fn suggestion(mut self, s: impl Into<String>) -> Self {
        self.suggestion = Some(s.into());
        self
    }

    pub fn confidence(mut self, c: f64) -> Self {
        self.confidence = c;
        self
    }

    pub fn evidence_block(mut self, block_id: BlockId) -> Self {
        self.evidence_block_ids.push(block_id);
        self
    }

    pub fn evidence_quote(mut self, block_id: BlockId, quote: impl Into<String>) -> Self {
        self.evidence_quotes.push(EvidenceQuote { block_id, quote: quote.into() });
        if !self.evidence_block_ids.contains(&block_id) {
            self.evidence_block_ids.push(block_id);
        }
        self
    }

    pub fn build(self) -> IssueDraft {
        let review_type = review_type_for(&self.issue_type);
        IssueDraft {
            issue_type: self.issue_type,
            review_type,
            severity: self.severity,
            title: self.title,
            description: self.description,
            suggestion: self.suggestion,
            confidence: self.confidence,
            evidence_block_ids: self.evidence_block_ids,
            page_no: None,
            evidence_quotes: self.evidence_quotes,
        }
        .truncated()
    }
}

pub fn within_tolerance(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance.max((a.abs().max(b.abs())) * tolerance)
}

/// Reads `rule_config.only_checks` into a set of sub-check ids; an empty
/// or absent field means "run everything".
pub fn only_checks(config: &serde_json::Value) -> Option<std::collections::HashSet<String>> {
    let arr = config.get("only_checks")?.as_array()?;
    let set: std::collections::HashSet<String> = arr.iter().filter_map(|v| v.as_str().map(String::from)).collect();
    if set.is_empty() {
        None
    } else {
        Some(set)
    }
}

pub fn should_run(only: &Option<std::collections::HashSet<String>>, name: &str) -> bool {
    match only {
        None => true,
        Some(set) => set.contains(name),
    }
}

pub fn tolerance_from_config(config: &serde_json::Value) -> f64 {
    config.get("tolerance").and_then(|v| v.as_f64()).unwrap_or(DEFAULT_TOLERANCE)
}
