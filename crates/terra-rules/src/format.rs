//! Document formatting checks: heading numbering continuity, table
//! numbering/title/reference conventions, and unit consistency within
//! data tables (spec §4.6, grounded in `format_check.py`). Numbering
//! continuity is checked at every heading level, generalizing the
//! original's level-1-only check.

use crate::unit_inconsistent;
use crate::util::{only_checks, should_run, DraftBuilder};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use terra_checkpoints::ReviewContext;
use terra_core::ids::OutlineNodeId;
use terra_core::model::{IssueDraft, Severity};

static TRAILING_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\D*$").unwrap());

const UNIT_FAMILY_AREA: [&str; 4] = ["m²", "hm²", "亩", "公顷"];
const UNIT_FAMILY_VOLUME: [&str; 3] = ["m³", "万m³", "方"];
const UNIT_FAMILY_MONEY: [&str; 3] = ["万元", "元", "亿元"];

fn last_numeric(node_no: &str) -> Option<u32> {
    TRAILING_NUMBER.captures(node_no)?.get(1)?.as_str().parse().ok()
}

fn heading_numbering_check(ctx: &ReviewContext) -> Vec<IssueDraft> {
    let mut siblings: HashMap<(Option<OutlineNodeId>, u8), Vec<&terra_core::model::OutlineNode>> = HashMap::new();
    for id in &ctx.outline_order {
        let Some(node) = ctx.outline_index.get(id) else { continue };
        siblings.entry((node.parent_id, node.level)).or_default().push(node);
    }
    let mut out = Vec::new();
    for ((_, level), mut nodes) in siblings {
        nodes.sort_by_key(|n| n.order_index);
        let numbered: Vec<(&terra_core::model::OutlineNode, u32)> =
            nodes.iter().filter_map(|n| n.node_no.as_deref().and_then(last_numeric).map(|num| (*n, num))).collect();
        if numbered.len() < 2 {
            continue;
        }
        for window in numbered.windows(2) {
            let (prev_node, prev_num) = window[0];
            let (node, num) = window[1];
            if num != prev_num + 1 {
                let block_id = ctx.heading_block_for(node.id);
                let mut builder = DraftBuilder::new(
                    "FORMAT_HEADING_NUMBERING_GAP",
                    Severity::Low,
                    format!("标题编号不连续：第{}级", level),
                    format!(
                        "「{}」（编号{}）与上一条「{}」（编号{}）之间编号不连续",
                        node.title,
                        node.node_no.clone().unwrap_or_default(),
                        prev_node.title,
                        prev_node.node_no.clone().unwrap_or_default()
                    ),
                )
                .confidence(0.55);
                if let Some(block_id) = block_id {
                    builder = builder.evidence_block(block_id);
                }
                out.push(builder.build());
            }
        }
    }
    out
}

fn table_numbering_check(ctx: &ReviewContext) -> Vec<IssueDraft> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for table in &ctx.tables {
        if let Some(no) = &table.table.table_no {
            *seen.entry(no.clone()).or_insert(0) += 1;
        }
    }
    let mut out = Vec::new();
    for (table_no, count) in seen {
        if count > 1 {
            out.push(
                DraftBuilder::new(
                    "FORMAT_TABLE_NUMBER_DUPLICATE",
                    Severity::Low,
                    format!("表编号重复：{}", table_no),
                    format!("表编号「{}」在文档中出现了{}次", table_no, count),
                )
                .confidence(0.7)
                .build(),
            );
        }
    }
    out
}

fn table_title_and_reference_check(ctx: &ReviewContext) -> Vec<IssueDraft> {
    let all_text: String = ctx.blocks_by_id.values().map(|b| b.text.as_str()).collect::<Vec<_>>().join("\n");
    let mut out = Vec::new();
    for table in &ctx.tables {
        if table.table.is_trivial() {
            continue;
        }
        let block_id = ctx.blocks_by_id.values().find(|b| b.table_id == Some(table.table.id)).map(|b| b.id);
        if table.table.title.as_deref().unwrap_or("").is_empty() {
            let mut builder = DraftBuilder::new(
                "FORMAT_TABLE_MISSING_TITLE",
                Severity::Low,
                "表格缺少标题".to_string(),
                format!("表{} 未找到标题", table.table.table_no.clone().unwrap_or_default()),
            )
            .confidence(0.6);
            if let Some(block_id) = block_id {
                builder = builder.evidence_block(block_id);
            }
            out.push(builder.build());
        }
        if let Some(table_no) = &table.table.table_no {
            let referenced = [
                format!("见表{}", table_no),
                format!("如表{}", table_no),
                format!("表{}所示", table_no),
                format!("表{}可见", table_no),
            ]
            .iter()
            .any(|phrase| all_text.contains(phrase.as_str()));
            if !referenced {
                let mut builder = DraftBuilder::new(
                    "FORMAT_TABLE_NOT_REFERENCED",
                    Severity::Low,
                    format!("表格未被正文引用：表{}", table_no),
                    format!("正文中未找到对表{}的引用（如“见表{}”“表{}所示”）", table_no, table_no, table_no),
                )
                .confidence(0.5);
                if let Some(block_id) = block_id {
                    builder = builder.evidence_block(block_id);
                }
                out.push(builder.build());
            }
        }
    }
    out
}

fn unit_family_check(ctx: &ReviewContext) -> Vec<IssueDraft> {
    let families: [HashSet<&str>; 3] = [
        UNIT_FAMILY_AREA.into_iter().collect(),
        UNIT_FAMILY_VOLUME.into_iter().collect(),
        UNIT_FAMILY_MONEY.into_iter().collect(),
    ];
    let refs: Vec<&terra_core::model::TableWithCells> = ctx.tables.iter().collect();
    let mut out = Vec::new();
    for family in &families {
        out.extend(unit_inconsistent::check_tables(ctx, &refs, Some(family)));
    }
    out
}

fn data_table_header_unit_check(ctx: &ReviewContext) -> Vec<IssueDraft> {
    let mut out = Vec::new();
    for table in &ctx.tables {
        let numeric_cols = (0..table.table.n_cols)
            .filter(|&c| table.column(c).into_iter().filter(|cell| cell.r != 0).any(|cell| cell.num_value.is_some()))
            .count();
        if numeric_cols < 2 {
            continue;
        }
        let header_has_unit = table.header_row().iter().any(|c| c.unit.as_deref().is_some_and(|u| !u.is_empty()));
        if header_has_unit {
            continue;
        }
        let block_id = ctx.blocks_by_id.values().find(|b| b.table_id == Some(table.table.id)).map(|b| b.id);
        let mut builder = DraftBuilder::new(
            "FORMAT_DATA_TABLE_MISSING_UNIT",
            Severity::Low,
            format!("数据表表头缺少单位：{}", table.table.title.clone().unwrap_or_default()),
            format!("表{} 含{}个数值列，但表头未标注任何单位", table.table.table_no.clone().unwrap_or_default(), numeric_cols),
        )
        .confidence(0.55);
        if let Some(block_id) = block_id {
            builder = builder.evidence_block(block_id);
        }
        out.push(builder.build());
    }
    out
}

pub fn format_executor(ctx: &ReviewContext, config: &serde_json::Value) -> Vec<IssueDraft> {
    let only = only_checks(config);
    let mut out = Vec::new();
    if should_run(&only, "heading_numbering") {
        out.extend(heading_numbering_check(ctx));
    }
    if should_run(&only, "table_numbering") {
        out.extend(table_numbering_check(ctx));
    }
    if should_run(&only, "table_title_reference") {
        out.extend(table_title_and_reference_check(ctx));
    }
    if should_run(&only, "unit_family") {
        out.extend(unit_family_check(ctx));
    }
    if should_run(&only, "data_table_unit") {
        out.extend(data_table_header_unit_check(ctx));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use terra_core::ids::VersionId;
    use terra_core::model::OutlineNode;

    fn node(id: i64, parent: Option<i64>, level: u8, no: &str, order: i64) -> OutlineNode {
        OutlineNode {
            id: OutlineNodeId(id),
            version_id: VersionId(1),
            parent_id: parent.map(OutlineNodeId),
            level,
            node_no: Some(no.to_string()),
            title: format!("节{}", no),
            order_index: order,
        }
    }

    fn ctx_with_outline(nodes: Vec<OutlineNode>) -> ReviewContext {
        let outline_order: Vec<OutlineNodeId> = nodes.iter().map(|n| n.id).collect();
        let outline_index: HashMap<OutlineNodeId, OutlineNode> = nodes.into_iter().map(|n| (n.id, n)).collect();
        ReviewContext {
            version_id: VersionId(1),
            outline_index,
            outline_order,
            blocks_by_id: HashMap::new(),
            blocks_by_outline: HashMap::new(),
            tables: Vec::new(),
            facts: HashMap::new(),
            outline_heading_block_map: HashMap::new(),
        }
    }

    #[test]
    fn flags_numbering_gap() {
        let ctx = ctx_with_outline(vec![node(1, None, 1, "1", 0), node(2, None, 1, "3", 1)]);
        let issues = format_executor(&ctx, &serde_json::json!({"only_checks": ["heading_numbering"]}));
        assert!(issues.iter().any(|i| i.issue_type == "FORMAT_HEADING_NUMBERING_GAP"));
    }

    #[test]
    fn no_issue_when_sequential() {
        let ctx = ctx_with_outline(vec![node(1, None, 1, "1", 0), node(2, None, 1, "2", 1), node(3, None, 1, "3", 2)]);
        let issues = format_executor(&ctx, &serde_json::json!({"only_checks": ["heading_numbering"]}));
        assert!(issues.is_empty());
    }
}
