//! Checks that a fixed or configured set of section titles appear
//! somewhere in the outline (spec §4.6, grounded in `missing_section.py`).
//! Shared by the content executor's required-section sub-check.

use crate::util::DraftBuilder;
use once_cell::sync::Lazy;
use terra_checkpoints::ReviewContext;
use terra_core::model::{IssueDraft, Severity};

pub static REQUIRED_SECTIONS: Lazy<Vec<&'static str>> =
    Lazy::new(|| vec!["综合说明", "项目概况", "项目区概况", "水土保持", "投资", "结论"]);

pub fn required_sections_from_config(config: &serde_json::Value) -> Vec<String> {
    config
        .get("required_sections")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_else(|| REQUIRED_SECTIONS.iter().map(|s| s.to_string()).collect())
}

pub fn missing_section_executor(ctx: &ReviewContext, config: &serde_json::Value) -> Vec<IssueDraft> {
    check_missing_sections(ctx, &required_sections_from_config(config))
}

pub fn check_missing_sections(ctx: &ReviewContext, required: &[String]) -> Vec<IssueDraft> {
    let titles: Vec<&str> = ctx.outline_order.iter().filter_map(|id| ctx.outline_index.get(id)).map(|n| n.title.as_str()).collect();
    let mut out = Vec::new();
    for section in required {
        let found = titles.iter().any(|t| t.contains(section.as_str()));
        if found {
            continue;
        }
        let evidence_block = ctx
            .outline_order
            .first()
            .and_then(|id| ctx.heading_block_for(*id))
            .or_else(|| ctx.first_block_id());
        let mut builder = DraftBuilder::new(
            "MISSING_SECTION",
            Severity::Fatal,
            format!("缺少章节：{}", section),
            format!("报告未找到包含「{}」的章节标题", section),
        )
        .suggestion(format!("补充「{}」相关章节", section))
        .confidence(0.75);
        if let Some(block_id) = evidence_block {
            builder = builder.evidence_block(block_id);
        }
        out.push(builder.build());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use terra_core::ids::{BlockId, OutlineNodeId, VersionId};
    use terra_core::model::{Block, BlockType, OutlineNode};

    fn ctx_with_outline(titles: &[&str]) -> ReviewContext {
        let mut outline_index = HashMap::new();
        let mut outline_order = Vec::new();
        let mut blocks_by_id = HashMap::new();
        let mut outline_heading_block_map = HashMap::new();
        for (i, title) in titles.iter().enumerate() {
            let id = OutlineNodeId((i + 1) as i64);
            outline_order.push(id);
            outline_index.insert(
                id,
                OutlineNode { id, version_id: VersionId(1), parent_id: None, level: 1, node_no: None, title: title.to_string(), order_index: i as i64 },
            );
            let block_id = BlockId((i + 1) as i64);
            blocks_by_id.insert(
                block_id,
                Block { id: block_id, version_id: VersionId(1), outline_node_id: Some(id), block_type: BlockType::Heading, order_index: i as i64, text: title.to_string(), table_id: None },
            );
            outline_heading_block_map.insert(id, block_id);
        }
        ReviewContext {
            version_id: VersionId(1),
            outline_index,
            outline_order,
            blocks_by_id,
            blocks_by_outline: HashMap::new(),
            tables: Vec::new(),
            facts: HashMap::new(),
            outline_heading_block_map,
        }
    }

    #[test]
    fn flags_missing_required_section() {
        let ctx = ctx_with_outline(&["一、综合说明", "二、项目概况"]);
        let issues = missing_section_executor(&ctx, &serde_json::json!({}));
        assert!(issues.iter().any(|i| i.description.contains("水土保持")));
        assert!(!issues.iter().any(|i| i.description.contains("综合说明")));
    }
}
