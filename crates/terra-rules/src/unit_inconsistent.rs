//! Flags a table column whose numeric cells carry more than one distinct
//! non-empty unit (spec §4.6, `unit_inconsistent.py`).

use crate::util::DraftBuilder;
use std::collections::HashSet;
use terra_checkpoints::ReviewContext;
use terra_core::model::{IssueDraft, Severity};

pub fn unit_inconsistent_executor(ctx: &ReviewContext, _config: &serde_json::Value) -> Vec<IssueDraft> {
    check_tables(ctx, &ctx.tables.iter().collect::<Vec<_>>(), None)
}

/// Shared with the format executor's unit-family check, which restricts
/// the grouping to a specific set of unit strings.
pub fn check_tables(
    ctx: &ReviewContext,
    tables: &[&terra_core::model::TableWithCells],
    restrict_to: Option<&HashSet<&str>>,
) -> Vec<IssueDraft> {
    let mut out = Vec::new();
    for table in tables {
        for col in 0..table.table.n_cols {
            let units: HashSet<String> = table
                .column(col)
                .into_iter()
                .filter(|c| c.r != 0)
                .filter_map(|c| c.unit.clone())
                .filter(|u| !u.is_empty())
                .filter(|u| restrict_to.map(|set| set.contains(u.as_str())).unwrap_or(true))
                .collect();
            if units.len() > 1 {
                let block_id = ctx
                    .blocks_by_id
                    .values()
                    .find(|b| b.table_id == Some(table.table.id))
                    .map(|b| b.id);
                let mut builder = DraftBuilder::new(
                    "UNIT_INCONSISTENT",
                    Severity::High,
                    format!("表格单位不一致：{}", table.table.title.clone().unwrap_or_default()),
                    format!(
                        "表{} 第{}列混用了多种单位：{}",
                        table.table.table_no.clone().unwrap_or_default(),
                        col,
                        units.into_iter().collect::<Vec<_>>().join("、")
                    ),
                )
                .confidence(0.8);
                if let Some(block_id) = block_id {
                    builder = builder.evidence_block(block_id);
                }
                out.push(builder.build());
            }
        }
    }
    out
}
