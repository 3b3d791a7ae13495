//! Cross-checks facts sharing the same key across scopes (document level,
//! table titles, outline sections) for numeric or textual disagreement
//! (spec §4.6, grounded in `consistency_check.py`).

use crate::util::{tolerance_from_config, within_tolerance, DraftBuilder};
use std::collections::BTreeSet;
use terra_checkpoints::ReviewContext;
use terra_core::ids::BlockId;
use terra_core::model::{Fact, FactValue, IssueDraft, Severity};

fn evidence_block(fact: &Fact) -> Option<BlockId> {
    fact.source_block_id.map(BlockId)
}

fn numeric_mismatch(ctx: &ReviewContext, fact_key: &str, facts: &[Fact], tolerance: f64) -> Option<IssueDraft> {
    let numeric: Vec<(&Fact, f64)> = facts.iter().filter_map(|f| f.value.as_numeric().map(|v| (f, v))).collect();
    if numeric.len() < 2 {
        return None;
    }
    let (base_fact, base_value) = numeric[0];
    let mismatched: Vec<&(&Fact, f64)> = numeric.iter().filter(|(_, v)| !within_tolerance(*v, base_value, tolerance)).collect();
    if mismatched.is_empty() {
        return None;
    }
    let mut parts = vec![format!("{}({}={})", fact_key, base_fact.scope.0, base_value)];
    for (fact, value) in &mismatched {
        parts.push(format!("{}({}={})", fact_key, fact.scope.0, value));
    }
    let mut builder = DraftBuilder::new(
        "CONSISTENCY_VALUE_MISMATCH",
        Severity::Fatal,
        format!("数值不一致：{}", fact_key),
        format!("同一指标「{}」在不同位置取值不一致：{}", fact_key, parts.join("，")),
    )
    .confidence(0.7);
    if let Some(block_id) = evidence_block(base_fact) {
        builder = builder.evidence_block(block_id);
    }
    for (fact, _) in &mismatched {
        if let Some(block_id) = evidence_block(fact) {
            builder = builder.evidence_block(block_id);
        }
    }
    let _ = ctx;
    Some(builder.build())
}

fn text_mismatch(fact_key: &str, facts: &[Fact]) -> Option<IssueDraft> {
    let texts: Vec<(&Fact, &str)> = facts.iter().filter_map(|f| f.value.as_text().map(|t| (f, t))).collect();
    let distinct: BTreeSet<&str> = texts.iter().map(|(_, t)| *t).collect();
    if distinct.len() <= 1 {
        return None;
    }
    let parts: Vec<String> = texts.iter().map(|(f, t)| format!("{}({}={})", fact_key, f.scope.0, t)).collect();
    let mut builder = DraftBuilder::new(
        "CONSISTENCY_TEXT_MISMATCH",
        Severity::Fatal,
        format!("文本不一致：{}", fact_key),
        format!("同一指标「{}」在不同位置取值不一致：{}", fact_key, parts.join("，")),
    )
    .confidence(0.65);
    for (fact, _) in &texts {
        if let Some(block_id) = evidence_block(fact) {
            builder = builder.evidence_block(block_id);
        }
    }
    Some(builder.build())
}

pub fn consistency_executor(ctx: &ReviewContext, config: &serde_json::Value) -> Vec<IssueDraft> {
    let tolerance = tolerance_from_config(config);
    let mut out = Vec::new();
    for (fact_key, facts) in &ctx.facts {
        if facts.len() < 2 {
            continue;
        }
        let all_numeric = facts.iter().all(|f| matches!(f.value, FactValue::Numeric(_)));
        if all_numeric {
            if let Some(issue) = numeric_mismatch(ctx, fact_key, facts, tolerance) {
                out.push(issue);
            }
        } else {
            let all_text = facts.iter().all(|f| matches!(f.value, FactValue::Text(_)));
            if all_text {
                if let Some(issue) = text_mismatch(fact_key, facts) {
                    out.push(issue);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use terra_core::ids::VersionId;
    use terra_core::model::FactScope;

    fn ctx_with_facts(facts: HashMap<String, Vec<Fact>>) -> ReviewContext {
        ReviewContext {
            version_id: VersionId(1),
            outline_index: HashMap::new(),
            outline_order: Vec::new(),
            blocks_by_id: HashMap::new(),
            blocks_by_outline: HashMap::new(),
            tables: Vec::new(),
            facts,
            outline_heading_block_map: HashMap::new(),
        }
    }

    #[test]
    fn flags_numeric_mismatch_across_scopes() {
        let mut facts = HashMap::new();
        facts.insert(
            "project_area".to_string(),
            vec![
                Fact { version_id: VersionId(1), fact_key: "project_area".into(), scope: FactScope::document(), value: FactValue::Numeric(100.0), unit: Some("m²".into()), confidence: 0.7, source_block_id: Some(1) },
                Fact { version_id: VersionId(1), fact_key: "project_area".into(), scope: FactScope("表3-1".into()), value: FactValue::Numeric(120.0), unit: Some("m²".into()), confidence: 0.7, source_block_id: Some(2) },
            ],
        );
        let issues = consistency_executor(&ctx_with_facts(facts), &serde_json::json!({}));
        assert!(issues.iter().any(|i| i.issue_type == "CONSISTENCY_VALUE_MISMATCH"));
    }

    #[test]
    fn no_issue_when_within_tolerance() {
        let mut facts = HashMap::new();
        facts.insert(
            "project_name".to_string(),
            vec![
                Fact { version_id: VersionId(1), fact_key: "project_name".into(), scope: FactScope::document(), value: FactValue::Numeric(100.0), unit: None, confidence: 0.7, source_block_id: Some(1) },
                Fact { version_id: VersionId(1), fact_key: "project_name".into(), scope: FactScope("表3-1".into()), value: FactValue::Numeric(100.0009), unit: None, confidence: 0.7, source_block_id: Some(2) },
            ],
        );
        let issues = consistency_executor(&ctx_with_facts(facts), &serde_json::json!({}));
        assert!(issues.is_empty());
    }
}
