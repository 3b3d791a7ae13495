//! Table-internal arithmetic checks: row sums, column sums, and
//! percentage-column totals (spec §4.6, grounded in `sum_mismatch.py`).

use crate::util::{only_checks, should_run, tolerance_from_config, within_tolerance, DraftBuilder};
use terra_checkpoints::ReviewContext;
use terra_core::model::{IssueDraft, Severity, TableWithCells};

const SUM_KEYWORDS: [&str; 6] = ["合计", "小计", "总计", "合计值", "合计金额", "合计面积"];
const PERCENTAGE_KEYWORDS: [&str; 4] = ["占比", "比例", "%", "百分比"];

fn row_text(table: &TableWithCells, r: u32) -> String {
    table.row(r).iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("")
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

fn table_block_id(ctx: &ReviewContext, table: &TableWithCells) -> Option<terra_core::ids::BlockId> {
    ctx.blocks_by_id
        .values()
        .find(|b| b.table_id == Some(table.table.id))
        .map(|b| b.id)
}

fn row_sum_check(ctx: &ReviewContext, tolerance: f64) -> Vec<IssueDraft> {
    let mut out = Vec::new();
    for table in &ctx.tables {
        let n_rows = table.table.n_rows;
        for r in 0..n_rows {
            if r == 0 || !contains_any(&row_text(table, r), &SUM_KEYWORDS) {
                continue;
            }
            for col in 0..table.table.n_cols {
                let Some(declared_cell) = table.cell(r, col) else { continue };
                let Some(declared) = declared_cell.num_value else { continue };
                let values: Vec<f64> = table
                    .column(col)
                    .into_iter()
                    .filter(|c| c.r != 0 && c.r != r)
                    .filter_map(|c| c.num_value)
                    .collect();
                if values.len() < 2 {
                    continue;
                }
                let computed: f64 = values.iter().sum();
                if !within_tolerance(computed, declared, tolerance) {
                    let title = table.table.title.clone().unwrap_or_default();
                    let mut builder = DraftBuilder::new(
                        "SUM_MISMATCH_ROW",
                        Severity::Fatal,
                        format!("表格合计行不一致：{}", title),
                        format!(
                            "表{} 第{}行：{} = {} ≠ {}，差值超出容差{}",
                            table.table.table_no.clone().unwrap_or_default(),
                            r,
                            values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" + "),
                            computed,
                            declared,
                            tolerance
                        ),
                    )
                    .confidence(0.85);
                    if let Some(block_id) = table_block_id(ctx, table) {
                        builder = builder.evidence_block(block_id);
                    }
                    out.push(builder.build());
                }
            }
        }
    }
    out
}

fn col_sum_check(ctx: &ReviewContext, tolerance: f64) -> Vec<IssueDraft> {
    let mut out = Vec::new();
    for table in &ctx.tables {
        let header = table.header_row();
        for (col, cell) in header.iter().enumerate() {
            if !contains_any(&cell.text, &SUM_KEYWORDS) {
                continue;
            }
            let col = col as u32;
            let values: Vec<&terra_core::model::TableCell> = table.column(col).into_iter().filter(|c| c.r != 0).collect();
            let Some((last, rest)) = values.split_last() else { continue };
            let Some(declared) = last.num_value else { continue };
            let nums: Vec<f64> = rest.iter().filter_map(|c| c.num_value).collect();
            if nums.len() < 2 {
                continue;
            }
            let computed: f64 = nums.iter().sum();
            if !within_tolerance(computed, declared, tolerance) {
                let title = table.table.title.clone().unwrap_or_default();
                let mut builder = DraftBuilder::new(
                    "SUM_MISMATCH_COL",
                    Severity::Fatal,
                    format!("表格合计列不一致：{}", title),
                    format!(
                        "表{} 第{}列声明合计为{}，但各行之和为{}，差值超出容差{}",
                        table.table.table_no.clone().unwrap_or_default(),
                        col,
                        declared,
                        computed,
                        tolerance
                    ),
                )
                .confidence(0.85);
                if let Some(block_id) = table_block_id(ctx, table) {
                    builder = builder.evidence_block(block_id);
                }
                out.push(builder.build());
            }
        }
    }
    out
}

fn percentage_value(cell: &terra_core::model::TableCell) -> Option<f64> {
    if cell.text.trim().ends_with('%') {
        return cell.text.trim().trim_end_matches('%').parse::<f64>().ok();
    }
    cell.num_value.map(|v| if v <= 1.0 { v * 100.0 } else { v })
}

fn percentage_check(ctx: &ReviewContext, tolerance: f64) -> Vec<IssueDraft> {
    let mut out = Vec::new();
    for table in &ctx.tables {
        let header = table.header_row();
        for (col, cell) in header.iter().enumerate() {
            if !contains_any(&cell.text, &PERCENTAGE_KEYWORDS) {
                continue;
            }
            let col = col as u32;
            let values: Vec<f64> = table
                .column(col)
                .into_iter()
                .filter(|c| c.r != 0)
                .filter_map(percentage_value)
                .collect();
            if values.is_empty() {
                continue;
            }
            let total: f64 = values.iter().sum();
            if !within_tolerance(total, 100.0, tolerance.max(0.5)) {
                let title = table.table.title.clone().unwrap_or_default();
                let mut builder = DraftBuilder::new(
                    "PERCENTAGE_MISMATCH",
                    Severity::High,
                    format!("百分比合计不为100%：{}", title),
                    format!(
                        "表{} 第{}列百分比之和为{:.2}%，应为100%",
                        table.table.table_no.clone().unwrap_or_default(),
                        col,
                        total
                    ),
                )
                .confidence(0.7);
                if let Some(block_id) = table_block_id(ctx, table) {
                    builder = builder.evidence_block(block_id);
                }
                out.push(builder.build());
            }
        }
    }
    out
}

pub fn sum_mismatch_executor(ctx: &ReviewContext, config: &serde_json::Value) -> Vec<IssueDraft> {
    let only = only_checks(config);
    let tolerance = tolerance_from_config(config);
    let mut out = Vec::new();
    if should_run(&only, "row_sum") {
        out.extend(row_sum_check(ctx, tolerance));
    }
    if should_run(&only, "col_sum") {
        out.extend(col_sum_check(ctx, tolerance));
    }
    if should_run(&only, "percentage") {
        out.extend(percentage_check(ctx, tolerance));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use terra_core::ids::{TableId, VersionId};
    use terra_core::model::{Table, TableCell};

    fn ctx_with_table(table: TableWithCells) -> ReviewContext {
        ReviewContext {
            version_id: VersionId(1),
            outline_index: HashMap::new(),
            outline_order: Vec::new(),
            blocks_by_id: HashMap::new(),
            blocks_by_outline: HashMap::new(),
            tables: vec![table],
            facts: HashMap::new(),
            outline_heading_block_map: HashMap::new(),
        }
    }

    fn cell(r: u32, c: u32, text: &str, num: Option<f64>) -> TableCell {
        TableCell { table_id: TableId(1), r, c, text: text.to_string(), num_value: num, unit: None }
    }

    #[test]
    fn flags_row_sum_mismatch() {
        let table = TableWithCells {
            table: Table { id: TableId(1), version_id: VersionId(1), outline_node_id: None, table_no: Some("3-1".into()), title: Some("弃方统计".into()), n_rows: 4, n_cols: 3 },
            cells: vec![
                cell(0, 0, "项目", None),
                cell(0, 1, "挖方", None),
                cell(0, 2, "填方", None),
                cell(1, 0, "合计", None),
                cell(1, 1, "100", Some(100.0)),
                cell(1, 2, "50", Some(50.0)),
                cell(2, 0, "子项A", None),
                cell(2, 1, "40", Some(40.0)),
                cell(2, 2, "30", Some(30.0)),
                cell(3, 0, "子项B", None),
                cell(3, 1, "70", Some(70.0)),
                cell(3, 2, "10", Some(10.0)),
            ],
        };
        let issues = sum_mismatch_executor(&ctx_with_table(table), &serde_json::json!({}));
        let issue = issues.iter().find(|i| i.issue_type == "SUM_MISMATCH_ROW").expect("row mismatch issue");
        assert!(issue.description.contains("40 + 70 = 110 ≠ 100"), "{}", issue.description);
    }
}
