//! Issue mapping (spec §4.7 step 6): turns one wire-shape `AiIssue` into
//! an `IssueDraft`, resolving taxonomy, severity, page, and evidence.

use terra_core::ids::BlockId;
use terra_core::model::{EvidenceQuote, IssueDraft, ReviewType, Severity};

use crate::document::DocBlock;
use crate::prompts::AiIssue;

/// Strips whitespace and common ASCII/CJK punctuation for the
/// quote-is-a-substring-of-block-text check (spec §8 invariant). Distinct
/// from `terra_align`'s whitespace-only normalization: this one also
/// drops punctuation since model-produced quotes often add or drop a
/// comma the source text doesn't have.
fn normalize_for_match(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && !is_punctuation(*c))
        .collect()
}

fn is_punctuation(c: char) -> bool {
    matches!(
        c,
        '.' | ',' | ';' | ':' | '!' | '?' | '"' | '\'' | '(' | ')' | '、' | '，' | '。' | '；' | '：' | '！' | '？' | '“' | '”' | '‘' | '’' | '（' | '）' | '【' | '】'
    )
}

/// Finds the first block whose normalized text contains `text`
/// normalized, after truncating `text` to 50 chars (spec.md §4.7 step 6).
fn find_block_by_substring(text: &str, blocks: &[DocBlock]) -> Option<&DocBlock> {
    let needle: String = normalize_for_match(text).chars().take(50).collect();
    if needle.is_empty() {
        return None;
    }
    blocks.iter().find(|b| normalize_for_match(&b.text).contains(&needle))
}

fn map_issue_type(raw: &str) -> String {
    let t = raw.to_uppercase();
    let known = [
        "CONSISTENCY",
        "FORMAT",
        "SUM_MISMATCH_ROW",
        "SUM_MISMATCH_COL",
        "PERCENTAGE_SUM_MISMATCH",
        "BUSINESS_LOGIC",
        "CONTENT",
        "MISSING_SECTION",
        "UNIT_INCONSISTENT",
        "FORMULA_BALANCE_MISMATCH",
    ];
    if known.contains(&t.as_str()) {
        return t;
    }
    if raw.contains("行") && raw.contains("合计") {
        "SUM_MISMATCH_ROW".to_string()
    } else if raw.contains("列") && raw.contains("合计") {
        "SUM_MISMATCH_COL".to_string()
    } else if raw.contains("百分比") {
        "PERCENTAGE_SUM_MISMATCH".to_string()
    } else if raw.contains("公式") {
        "FORMULA_BALANCE_MISMATCH".to_string()
    } else if raw.contains("单位") {
        "UNIT_INCONSISTENT".to_string()
    } else if raw.contains("章节") || raw.contains("缺失") && raw.contains("章") {
        "MISSING_SECTION".to_string()
    } else if raw.contains("格式") {
        "FORMAT".to_string()
    } else if raw.contains("业务") || raw.contains("逻辑") {
        "BUSINESS_LOGIC".to_string()
    } else if raw.contains("一致") {
        "CONSISTENCY".to_string()
    } else if raw.contains("内容") {
        "CONTENT".to_string()
    } else {
        "AI_COMPLIANCE_GAP".to_string()
    }
}

fn map_severity(raw: Option<&str>) -> Severity {
    match raw {
        Some(s) if s.contains('致') => Severity::Fatal,
        Some(s) if s.contains('高') => Severity::High,
        Some(s) if s.contains('中') => Severity::Medium,
        Some(s) if s.contains('低') => Severity::Low,
        _ => Severity::High,
    }
}

fn compose_suggestion(fix: &crate::prompts::FixSuggestion) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(text) = &fix.suggested_text {
        if !text.trim().is_empty() {
            parts.push(text.trim().to_string());
        }
    }
    if !fix.fix_steps.is_empty() {
        let steps = fix
            .fix_steps
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. {}", i + 1, s))
            .collect::<Vec<_>>()
            .join(" ");
        parts.push(format!("建议步骤：{steps}"));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

struct ResolvedEvidence {
    block_ids: Vec<BlockId>,
    quotes: Vec<EvidenceQuote>,
}

/// Resolves each `evidence.snippets` entry to the block it actually
/// occurs in, dropping entries that don't match any block's full text
/// after normalization — the invariant from spec §8 is enforced here,
/// not approximated.
fn resolve_evidence(issue: &AiIssue, blocks: &[DocBlock]) -> ResolvedEvidence {
    let mut block_ids = Vec::new();
    let mut quotes = Vec::new();
    for snippet in &issue.evidence.snippets {
        let Some(block) = find_block_by_substring(snippet, blocks) else { continue };
        let normalized_snippet = normalize_for_match(snippet);
        if normalized_snippet.is_empty() || !normalize_for_match(&block.text).contains(&normalized_snippet) {
            continue;
        }
        if !block_ids.contains(&block.block_id) {
            block_ids.push(block.block_id);
        }
        quotes.push(EvidenceQuote { block_id: block.block_id, quote: snippet.clone() });
    }
    ResolvedEvidence { block_ids, quotes }
}

fn resolve_page_no(issue: &AiIssue, evidence: &ResolvedEvidence, blocks: &[DocBlock]) -> Option<u32> {
    if let Some(page) = issue.evidence.page_refs.first() {
        return Some(*page);
    }
    if let Some(page) = issue.location.page {
        return Some(page);
    }
    if let Some(anchor) = &issue.location.anchor_text {
        if let Some(block) = find_block_by_substring(anchor, blocks) {
            return block.page_no;
        }
    }
    if let Some(block_id) = evidence.block_ids.first() {
        if let Some(block) = blocks.iter().find(|b| b.block_id == *block_id) {
            return block.page_no;
        }
    }
    None
}

/// Maps one AI-returned issue, or `None` if it has no surviving evidence
/// after validation (spec §4.7 "Evidence validation"). `review_type`
/// comes from whichever batch rule the issue names (or the batch's first
/// rule, resolved by the caller).
pub fn map_ai_issue(issue: &AiIssue, review_type: ReviewType, blocks: &[DocBlock]) -> Option<IssueDraft> {
    let evidence = resolve_evidence(issue, blocks);
    if evidence.quotes.is_empty() {
        return None;
    }

    let page_no = resolve_page_no(issue, &evidence, blocks);

    Some(
        IssueDraft {
            issue_type: map_issue_type(&issue.issue_type),
            review_type,
            severity: map_severity(issue.severity.as_deref()),
            title: issue.issue_title.clone(),
            description: issue.issue_title.clone(),
            suggestion: compose_suggestion(&issue.fix_suggestion),
            confidence: 0.7,
            evidence_block_ids: evidence.block_ids,
            page_no,
            evidence_quotes: evidence.quotes,
        }
        .truncated(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::{Evidence, FixSuggestion, Location};

    fn block(id: i64, page: Option<u32>, text: &str) -> DocBlock {
        DocBlock { block_id: BlockId(id), page_no: page, text: text.to_string() }
    }

    fn base_issue(issue_type: &str, snippets: Vec<&str>) -> AiIssue {
        AiIssue {
            issue_id: None,
            issue_title: "占地面积描述不一致".to_string(),
            issue_type: issue_type.to_string(),
            severity: Some("高".to_string()),
            location: Location::default(),
            evidence: Evidence { snippets: snippets.into_iter().map(String::from).collect(), page_refs: Vec::new() },
            rule_definition: serde_json::Value::Null,
            norm_basis: serde_json::Value::Null,
            fix_suggestion: FixSuggestion::default(),
            dependencies: serde_json::Value::Null,
        }
    }

    #[test]
    fn scenario_5_maps_evidence_and_page_from_matching_block() {
        let blocks = vec![block(42, Some(7), "项目 总占地面积：1.5 hm² 位于…")];
        let issue = base_issue("一致性问题", vec!["占地面积 1.5 hm²"]);

        let draft = map_ai_issue(&issue, ReviewType::Tech, &blocks).expect("issue should map");
        assert_eq!(draft.evidence_block_ids, vec![BlockId(42)]);
        assert_eq!(draft.page_no, Some(7));
        assert_eq!(draft.issue_type, "CONSISTENCY");
    }

    #[test]
    fn unmatched_evidence_drops_the_issue() {
        let blocks = vec![block(1, Some(1), "与证据完全无关的文本")];
        let issue = base_issue("一致性问题", vec!["占地面积 1.5 hm²"]);
        assert!(map_ai_issue(&issue, ReviewType::Tech, &blocks).is_none());
    }

    #[test]
    fn severity_and_type_mapping() {
        assert_eq!(map_severity(Some("致命")), Severity::Fatal);
        assert_eq!(map_severity(Some("低")), Severity::Low);
        assert_eq!(map_severity(None), Severity::High);
        assert_eq!(map_issue_type("单位换算错误"), "UNIT_INCONSISTENT");
        assert_eq!(map_issue_type("未知类别"), "AI_COMPLIANCE_GAP");
    }

    #[test]
    fn page_resolution_prefers_page_refs_over_location() {
        let blocks = vec![block(1, Some(9), "无关文本")];
        let mut issue = base_issue("一致性问题", vec![]);
        issue.evidence.page_refs = vec![3];
        issue.location.page = Some(5);
        assert_eq!(resolve_page_no(&issue, &blocks), Some(3));
    }
}
