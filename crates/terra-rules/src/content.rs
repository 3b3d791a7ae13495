//! Content-completeness checks beyond raw section presence: required
//! sections (shared with `missing_section`), trigger-keyword-implies-
//! required-section rules, and required-element co-occurrence within a
//! single block (spec §4.6, grounded in `content_check.py`).

use crate::missing_section::{check_missing_sections, required_sections_from_config};
use crate::util::{only_checks, should_run, DraftBuilder};
use once_cell::sync::Lazy;
use serde::Deserialize;
use terra_checkpoints::ReviewContext;
use terra_core::model::{IssueDraft, Severity};

#[derive(Deserialize)]
struct TriggerRule {
    trigger_keywords: Vec<String>,
    required_sections: Vec<String>,
    #[serde(default)]
    name: Option<String>,
}

static AREA_UNIT_TOKENS: Lazy<Vec<&'static str>> = Lazy::new(|| vec!["m²", "m2", "hm²", "hm2", "亩", "公顷"]);

fn required_element_check(ctx: &ReviewContext) -> Vec<IssueDraft> {
    for block in ctx.blocks_by_id.values() {
        if block.text.contains("防治责任范围") && AREA_UNIT_TOKENS.iter().any(|u| block.text.contains(u)) {
            return Vec::new();
        }
    }
    let has_phrase = ctx.blocks_by_id.values().any(|b| b.text.contains("防治责任范围"));
    if !has_phrase {
        return Vec::new();
    }
    vec![DraftBuilder::new(
        "CONTENT_MISSING_AREA_UNIT",
        Severity::Medium,
        "防治责任范围缺少面积单位".to_string(),
        "报告提及「防治责任范围」但未在同一处给出带单位（m²/hm²/亩/公顷）的面积数值".to_string(),
    )
    .suggestion("在防治责任范围描述中补充具体面积及单位")
    .confidence(0.6)
    .build()]
}

fn trigger_requirement_check(ctx: &ReviewContext, config: &serde_json::Value) -> Vec<IssueDraft> {
    let Some(rules) = config.get("trigger_rules").and_then(|v| serde_json::from_value::<Vec<TriggerRule>>(v.clone()).ok()) else {
        return Vec::new();
    };
    let titles: Vec<&str> = ctx.outline_order.iter().filter_map(|id| ctx.outline_index.get(id)).map(|n| n.title.as_str()).collect();
    let mut out = Vec::new();
    for rule in &rules {
        let triggered = ctx.blocks_by_id.values().any(|b| rule.trigger_keywords.iter().any(|k| b.text.contains(k.as_str())));
        if !triggered {
            continue;
        }
        for section in &rule.required_sections {
            if titles.iter().any(|t| t.contains(section.as_str())) {
                continue;
            }
            let name = rule.name.clone().unwrap_or_default();
            out.push(
                DraftBuilder::new(
                    "CONTENT_TRIGGER_REQUIREMENT_MISSING",
                    Severity::High,
                    format!("触发项缺少必要章节：{}", section),
                    format!("检测到「{}」相关内容，但缺少「{}」章节（规则：{}）", rule.trigger_keywords.join("/"), section, name),
                )
                .confidence(0.65)
                .build(),
            );
        }
    }
    out
}

pub fn content_executor(ctx: &ReviewContext, config: &serde_json::Value) -> Vec<IssueDraft> {
    let only = only_checks(config);
    let mut out = Vec::new();
    if should_run(&only, "required_sections") {
        out.extend(check_missing_sections(ctx, &required_sections_from_config(config)));
    }
    if should_run(&only, "trigger_requirement") {
        out.extend(trigger_requirement_check(ctx, config));
    }
    if should_run(&only, "required_element") {
        out.extend(required_element_check(ctx));
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
    fn flags_missing_area_unit() {
        let ctx = ctx_with_block("本项目防治责任范围包括施工区和直接影响区");
        let issues = content_executor(&ctx, &serde_json::json!({"only_checks": ["required_element"]}));
        assert!(issues.iter().any(|i| i.issue_type == "CONTENT_MISSING_AREA_UNIT"));
    }

    #[test]
    fn no_issue_when_unit_present() {
        let ctx = ctx_with_block("本项目防治责任范围共计12.3hm²");
        let issues = content_executor(&ctx, &serde_json::json!({"only_checks": ["required_element"]}));
        assert!(issues.is_empty());
    }
}
