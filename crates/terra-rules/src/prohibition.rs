//! Flags blocks that mention a disposal/storage trigger term alongside a
//! prohibited-zone term in the same text (spec §4.6, grounded in
//! `prohibition_check.py`). The seeded rule covers 消纳场/专门存放地
//! sited inside protected zones; `rule_config.prohibition_rules` can add
//! more trigger/prohibited keyword pairs.

use crate::util::DraftBuilder;
use serde::Deserialize;
use terra_checkpoints::ReviewContext;
use terra_core::model::{IssueDraft, Severity};

#[derive(Deserialize)]
struct ProhibitionRule {
    trigger_keywords: Vec<String>,
    prohibited_keywords: Vec<String>,
    #[serde(default)]
    name: Option<String>,
}

fn default_rules() -> Vec<ProhibitionRule> {
    vec![ProhibitionRule {
        trigger_keywords: vec!["消纳场".into(), "专门存放地".into()],
        prohibited_keywords: vec!["水源保护区".into(), "生态红线".into(), "自然保护区核心区".into()],
        name: Some("消纳场禁限区".into()),
    }]
}

fn rules_from_config(config: &serde_json::Value) -> Vec<ProhibitionRule> {
    config
        .get("prohibition_rules")
        .and_then(|v| serde_json::from_value::<Vec<ProhibitionRule>>(v.clone()).ok())
        .filter(|rules| !rules.is_empty())
        .unwrap_or_else(default_rules)
}

pub fn prohibition_executor(ctx: &ReviewContext, config: &serde_json::Value) -> Vec<IssueDraft> {
    let rules = rules_from_config(config);
    let mut out = Vec::new();
    for block in ctx.blocks_by_id.values() {
        for rule in &rules {
            let has_trigger = rule.trigger_keywords.iter().any(|k| block.text.contains(k.as_str()));
            if !has_trigger {
                continue;
            }
            let hit = rule.prohibited_keywords.iter().find(|k| block.text.contains(k.as_str()));
            let Some(hit) = hit else { continue };
            let name = rule.name.clone().unwrap_or_else(|| "选址禁限".to_string());
            out.push(
                DraftBuilder::new(
                    "PROHIBITION_VIOLATION",
                    Severity::Fatal,
                    format!("选址触碰禁限区：{}", name),
                    format!("文本「{}」同时出现选址关键词与禁限区关键词「{}」", block.text.chars().take(120).collect::<String>(), hit),
                )
                .confidence(0.7)
                .evidence_block(block.id)
                .build(),
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use terra_core::ids::{BlockId, VersionId};
    use terra_core::model::{Block, BlockType};

    fn ctx_with_block(text: &str) -> ReviewContext {
        let mut blocks_by_id = HashMap::new();
        let id = BlockId(1);
        blocks_by_id.insert(id, Block { id, version_id: VersionId(1), outline_node_id: None, block_type: BlockType::Para, order_index: 0, text: text.to_string(), table_id: None });
        ReviewContext {
            version_id: VersionId(1),
            outline_index: HashMap::new(),
            outline_order: Vec::new(),
            blocks_by_id,
            blocks_by_outline: HashMap::new(),
            tables: Vec::new(),
            facts: HashMap::new(),
            outline_heading_block_map: HashMap::new(),
        }
    }

    #[test]
    fn flags_disposal_site_in_protected_zone() {
        let ctx = ctx_with_block("本工程弃渣消纳场位于水源保护区边界内");
        let issues = prohibition_executor(&ctx, &serde_json::json!({}));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, "PROHIBITION_VIOLATION");
    }

    #[test]
    fn no_issue_without_prohibited_zone() {
        let ctx = ctx_with_block("本工程弃渣消纳场位于一般农用地内");
        let issues = prohibition_executor(&ctx, &serde_json::json!({}));
        assert!(issues.is_empty());
    }
}
