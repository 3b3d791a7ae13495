//! Domain formula checks: the six soil-and-water-conservation ratio
//! indicators, the earthwork balance identity, and the erosion
//! prediction formula (spec §4.6, grounded in `formula_check.py`; the
//! prediction family completes a formula the original left unimplemented).

use crate::util::{tolerance_from_config, within_tolerance, DraftBuilder};
use terra_checkpoints::ReviewContext;
use terra_core::ids::BlockId;
use terra_core::model::{Fact, IssueDraft, Severity};

struct RatioIndicator {
    name: &'static str,
    numerator: &'static str,
    denominator: &'static str,
}

const SIX_INDICATORS: [RatioIndicator; 6] = [
    RatioIndicator { name: "治理度", numerator: "治理达标面积", denominator: "水土流失总面积" },
    RatioIndicator { name: "控制比", numerator: "防治措施面积", denominator: "扰动面积" },
    RatioIndicator { name: "渣土防护率", numerator: "渣土防护量", denominator: "渣土总量" },
    RatioIndicator { name: "表土保护率", numerator: "表土保护量", denominator: "可剥离表土量" },
    RatioIndicator { name: "恢复率", numerator: "恢复面积", denominator: "可恢复面积" },
    RatioIndicator { name: "覆盖率", numerator: "植被覆盖面积", denominator: "可绿化面积" },
];

fn first_numeric<'a>(ctx: &'a ReviewContext, key: &str) -> Option<(&'a Fact, f64)> {
    ctx.facts.get(key).and_then(|facts| facts.iter().find_map(|f| f.value.as_numeric().map(|v| (f, v))))
}

fn evidence_of<'a>(facts: impl IntoIterator<Item = &'a Fact>) -> Vec<BlockId> {
    facts.into_iter().filter_map(|f| f.source_block_id.map(BlockId)).collect()
}

/// Looks up the declared "implementation value" cell for `name` in a
/// table titled "六项指标": the cell whose text contains the indicator
/// name, e.g. "治理度=0.85", carries its parsed ratio as `num_value`. Per
/// spec, only a value in [0,1] counts as the declared ratio.
fn declared_ratio_value(table: &terra_core::model::TableWithCells, name: &str) -> Option<f64> {
    table
        .cells
        .iter()
        .find(|c| c.text.contains(name))
        .and_then(|c| c.num_value)
        .filter(|v| (0.0..=1.0).contains(v))
}

fn six_indicators_check(ctx: &ReviewContext, tolerance: f64) -> Vec<IssueDraft> {
    let mut out = Vec::new();
    for indicator in &SIX_INDICATORS {
        let (Some((num_fact, num)), Some((den_fact, den))) = (first_numeric(ctx, indicator.numerator), first_numeric(ctx, indicator.denominator)) else {
            continue;
        };
        if den == 0.0 {
            continue;
        }
        let ratio = num / den;

        let declared = ctx
            .tables
            .iter()
            .filter(|t| t.table.title.as_deref().map(|title| title.contains("六项指标")).unwrap_or(false))
            .find_map(|table| declared_ratio_value(table, indicator.name));

        if let Some(declared) = declared {
            if !within_tolerance(ratio, declared, tolerance) {
                let mut builder = DraftBuilder::new(
                    "FORMULA_RATIO_MISMATCH",
                    Severity::Fatal,
                    format!("指标与表内实施值不一致：{}", indicator.name),
                    format!("{} / {} = {:.4} ≠ {:.4}", num, den, ratio, declared),
                )
                .confidence(0.85);
                for block_id in evidence_of([num_fact, den_fact]) {
                    builder = builder.evidence_block(block_id);
                }
                out.push(builder.build());
            }
            continue;
        }

        if !(0.0..=1.0).contains(&ratio) {
            let mut builder = DraftBuilder::new(
                "FORMULA_RATIO_OUT_OF_RANGE",
                Severity::High,
                format!("指标超出合理范围：{}", indicator.name),
                format!(
                    "{} = {} / {} = {:.4}，不在[0,1]区间内",
                    indicator.name, indicator.numerator, indicator.denominator, ratio
                ),
            )
            .confidence(0.75);
            for block_id in evidence_of([num_fact, den_fact]) {
                builder = builder.evidence_block(block_id);
            }
            out.push(builder.build());
        }
    }
    out
}

fn balance_check(ctx: &ReviewContext, tolerance: f64) -> Vec<IssueDraft> {
    let (Some((excavation_fact, excavation)), Some((fill_fact, fill)), Some((dump_fact, dump)), Some((haul_fact, haul))) = (
        first_numeric(ctx, "挖方"),
        first_numeric(ctx, "填方"),
        first_numeric(ctx, "弃方"),
        first_numeric(ctx, "外运量"),
    ) else {
        return Vec::new();
    };
    let computed = fill + dump + haul;
    if within_tolerance(excavation, computed, tolerance) {
        return Vec::new();
    }
    let mut builder = DraftBuilder::new(
        "FORMULA_BALANCE_MISMATCH",
        Severity::Fatal,
        "土石方平衡不一致".to_string(),
        format!(
            "挖方({})应等于填方+弃方+外运量之和({}+{}+{}={})，差值超出容差{}",
            excavation, fill, dump, haul, computed, tolerance
        ),
    )
    .confidence(0.8);
    for block_id in evidence_of([excavation_fact, fill_fact, dump_fact, haul_fact]) {
        builder = builder.evidence_block(block_id);
    }
    vec![builder.build()]
}

fn prediction_check(ctx: &ReviewContext, tolerance: f64) -> Vec<IssueDraft> {
    let mut out = Vec::new();
    for table in &ctx.tables {
        let title = table.table.title.clone().unwrap_or_default();
        if !(title.contains("预测") || title.contains("侵蚀")) {
            continue;
        }
        let scope = terra_core::model::FactScope(title.clone());
        let area = ctx.facts.get("分区面积").and_then(|fs| fs.iter().find(|f| f.scope == scope)).and_then(|f| f.value.as_numeric());
        let period = ctx.facts.get("时段").and_then(|fs| fs.iter().find(|f| f.scope == scope)).and_then(|f| f.value.as_numeric());
        let modulus = ctx.facts.get("侵蚀模数").and_then(|fs| fs.iter().find(|f| f.scope == scope)).and_then(|f| f.value.as_numeric());
        let (Some(area), Some(period), Some(modulus)) = (area, period, modulus) else { continue };
        let computed = area * period * modulus;
        let declared_cell = table.cells.iter().find(|c| c.text.contains("侵蚀量")).and_then(|header_cell| {
            table.column(header_cell.c).into_iter().filter(|c| c.r != 0).find_map(|c| c.num_value)
        });
        let Some(declared) = declared_cell else { continue };
        if within_tolerance(computed, declared, tolerance.max(0.05)) {
            continue;
        }
        let block_id = ctx.blocks_by_id.values().find(|b| b.table_id == Some(table.table.id)).map(|b| b.id);
        let mut builder = DraftBuilder::new(
            "FORMULA_PREDICTION_MISMATCH",
            Severity::Medium,
            format!("侵蚀量预测值不一致：{}", title),
            format!("分区面积×时段×侵蚀模数={:.4}，但表中侵蚀量为{}", computed, declared),
        )
        .confidence(0.6);
        if let Some(block_id) = block_id {
            builder = builder.evidence_block(block_id);
        }
        out.push(builder.build());
    }
    out
}

pub fn formula_executor(ctx: &ReviewContext, config: &serde_json::Value) -> Vec<IssueDraft> {
    let tolerance = tolerance_from_config(config);
    let mut out = Vec::new();
    out.extend(six_indicators_check(ctx, tolerance));
    out.extend(balance_check(ctx, tolerance));
    out.extend(prediction_check(ctx, tolerance));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use terra_core::ids::VersionId;
    use terra_core::model::FactScope;

    fn fact(key: &str, value: f64, scope: FactScope) -> Fact {
        Fact { version_id: VersionId(1), fact_key: key.to_string(), scope, value: terra_core::model::FactValue::Numeric(value), unit: None, confidence: 0.8, source_block_id: Some(1) }
    }

    fn ctx_with_facts(facts: HashMap<String, Vec<Fact>>) -> ReviewContext {
        ctx_with_facts_and_tables(facts, Vec::new())
    }

    fn ctx_with_facts_and_tables(facts: HashMap<String, Vec<Fact>>, tables: Vec<terra_core::model::TableWithCells>) -> ReviewContext {
        ReviewContext {
            version_id: VersionId(1),
            outline_index: HashMap::new(),
            outline_order: Vec::new(),
            blocks_by_id: HashMap::new(),
            blocks_by_outline: HashMap::new(),
            tables,
            facts,
            outline_heading_block_map: HashMap::new(),
        }
    }

    #[test]
    fn flags_ratio_out_of_range() {
        let mut facts = HashMap::new();
        facts.insert("治理达标面积".to_string(), vec![fact("治理达标面积", 150.0, FactScope::document())]);
        facts.insert("水土流失总面积".to_string(), vec![fact("水土流失总面积", 100.0, FactScope::document())]);
        let issues = formula_executor(&ctx_with_facts(facts), &serde_json::json!({}));
        assert!(issues.iter().any(|i| i.issue_type == "FORMULA_RATIO_OUT_OF_RANGE"));
    }

    #[test]
    fn flags_declared_ratio_mismatch() {
        use terra_core::ids::TableId;
        use terra_core::model::{Table, TableCell, TableWithCells};

        let mut facts = HashMap::new();
        facts.insert("治理达标面积".to_string(), vec![fact("治理达标面积", 8000.0, FactScope::document())]);
        facts.insert("水土流失总面积".to_string(), vec![fact("水土流失总面积", 10000.0, FactScope::document())]);

        let table = TableWithCells {
            table: Table {
                id: TableId(1),
                version_id: VersionId(1),
                outline_node_id: None,
                table_no: None,
                title: Some("六项指标".to_string()),
                n_rows: 1,
                n_cols: 1,
            },
            cells: vec![TableCell { table_id: TableId(1), r: 0, c: 0, text: "治理度=0.85".to_string(), num_value: Some(0.85), unit: None }],
        };

        let issues = formula_executor(&ctx_with_facts_and_tables(facts, vec![table]), &serde_json::json!({}));
        let issue = issues.iter().find(|i| i.issue_type == "FORMULA_RATIO_MISMATCH").expect("mismatch issue");
        assert_eq!(issue.severity, Severity::Fatal);
        assert!(issue.description.contains("8000 / 10000 = 0.8000 ≠ 0.8500"), "{}", issue.description);
    }

    #[test]
    fn flags_balance_mismatch() {
        let mut facts = HashMap::new();
        facts.insert("挖方".to_string(), vec![fact("挖方", 100.0, FactScope::document())]);
        facts.insert("填方".to_string(), vec![fact("填方", 40.0, FactScope::document())]);
        facts.insert("弃方".to_string(), vec![fact("弃方", 20.0, FactScope::document())]);
        facts.insert("外运量".to_string(), vec![fact("外运量", 10.0, FactScope::document())]);
        let issues = formula_executor(&ctx_with_facts(facts), &serde_json::json!({}));
        assert!(issues.iter().any(|i| i.issue_type == "FORMULA_BALANCE_MISMATCH"));
    }
}
