//! Fact extraction from blocks and tables (component F, spec §4.4).
//! Pure in-memory transform: callers own persistence.

use crate::keys::default_fact_keys;
use regex::Regex;
use std::collections::HashMap;
use terra_core::ids::OutlineNodeId;
use terra_core::model::{Block, BlockType, FactScope, FactValue, OutlineNode, TableWithCells};

pub struct ExtractedFact {
    pub fact_key: String,
    pub value: FactValue,
    pub unit: Option<String>,
    pub scope: FactScope,
    pub source_block_id: Option<i64>,
    pub confidence: f64,
}

/// Applies the unit-normalization table: strip "万" (×10,000), then fold
/// hm²/公顷 into m² (×10,000). Both rules may fire in sequence.
fn normalize_unit(mut value: f64, unit: Option<String>) -> (f64, Option<String>) {
    let Some(mut unit) = unit else {
        return (value, None);
    };
    if unit.contains('万') {
        value *= 10_000.0;
        unit = unit.replace('万', "");
    }
    if unit == "hm²" || unit == "公顷" {
        value *= 10_000.0;
        unit = "m²".to_string();
    }
    (value, Some(unit))
}

fn scope_for(outline_node_id: Option<OutlineNodeId>, outline_map: &HashMap<OutlineNodeId, &OutlineNode>) -> FactScope {
    let Some(id) = outline_node_id else {
        return FactScope("项目整体".to_string());
    };
    let Some(node) = outline_map.get(&id) else {
        return FactScope("项目整体".to_string());
    };
    let label = format!("{} {}", node.node_no.clone().unwrap_or_default(), node.title)
        .trim()
        .to_string();
    if label.is_empty() {
        FactScope("项目整体".to_string())
    } else {
        FactScope(label)
    }
}

fn pattern_regex(pattern: &str) -> Regex {
    Regex::new(&format!(
        r"{}[：:：\s]*([\d.，,]+)\s*([^\d\s，,。.；;]+)?",
        regex::escape(pattern)
    ))
    .expect("valid fact pattern regex")
}

/// Extracts facts from a version's blocks and tables given the outline
/// index they resolve against.
pub fn extract_facts(blocks: &[Block], tables: &[TableWithCells], outline: &[OutlineNode]) -> Vec<ExtractedFact> {
    let outline_map: HashMap<OutlineNodeId, &OutlineNode> = outline.iter().map(|n| (n.id, n)).collect();
    let fact_keys = default_fact_keys();
    let mut out = Vec::new();

    for block in blocks {
        if block.text.trim().is_empty() {
            continue;
        }
        let scope = scope_for(block.outline_node_id, &outline_map);
        for def in &fact_keys {
            for pattern in def.synonyms {
                let re = pattern_regex(pattern);
                for caps in re.captures_iter(&block.text) {
                    let raw_value = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                    let value_str = raw_value.replace('，', "").replace(',', "");
                    let unit = caps.get(2).map(|m| m.as_str().trim().to_string()).filter(|s| !s.is_empty());

                    match value_str.parse::<f64>() {
                        Ok(num) => {
                            let (num, unit) = normalize_unit(num, unit);
                            out.push(ExtractedFact {
                                fact_key: def.key.to_string(),
                                value: FactValue::Numeric(num),
                                unit,
                                scope: scope.clone(),
                                source_block_id: Some(block.id.get()),
                                confidence: 0.7,
                            });
                        }
                        Err(_) => {
                            let whole = caps.get(0).map(|m| m.as_str().to_string()).unwrap_or_default();
                            out.push(ExtractedFact {
                                fact_key: def.key.to_string(),
                                value: FactValue::Text(whole),
                                unit: None,
                                scope: scope.clone(),
                                source_block_id: Some(block.id.get()),
                                confidence: 0.6,
                            });
                        }
                    }
                }
            }
        }
    }

    for table in tables {
        let table_no = table
            .table
            .table_no
            .clone()
            .unwrap_or_else(|| format!("表{}", table.table.id.get()));
        let scope = match table.table.outline_node_id {
            Some(id) => FactScope(format!("{}({})", table_no, scope_for(Some(id), &outline_map).0)),
            None => FactScope(table_no.clone()),
        };
        let source_block_id = blocks
            .iter()
            .find(|b| b.table_id == Some(table.table.id) && b.block_type == BlockType::Table)
            .map(|b| b.id.get());

        let header = table.header_row();
        if header.is_empty() {
            continue;
        }
        for def in &fact_keys {
            for pattern in def.synonyms {
                for (hi, cell) in header.iter().enumerate() {
                    if !cell.text.contains(pattern) {
                        continue;
                    }
                    let col = hi as u32;
                    for row_cell in table.column(col) {
                        if row_cell.r == 0 {
                            continue;
                        }
                        if let Some(num) = row_cell.num_value {
                            out.push(ExtractedFact {
                                fact_key: def.key.to_string(),
                                value: FactValue::Numeric(num),
                                unit: row_cell.unit.clone(),
                                scope: scope.clone(),
                                source_block_id,
                                confidence: 0.8,
                            });
                        }
                    }
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use terra_core::ids::{BlockId, TableId, VersionId};
    use terra_core::model::{Table, TableCell};

    fn block(text: &str) -> Block {
        Block {
            id: BlockId(1),
            version_id: VersionId(1),
            outline_node_id: None,
            block_type: BlockType::Para,
            order_index: 0,
            text: text.to_string(),
            table_id: None,
        }
    }

    #[test]
    fn extracts_numeric_fact_with_wan_unit() {
        let blocks = vec![block("总占地面积：12.5万m²")];
        let facts = extract_facts(&blocks, &[], &[]);
        let f = facts.iter().find(|f| f.fact_key == "总占地面积").unwrap();
        assert_eq!(f.value.as_numeric(), Some(125_000.0));
        assert_eq!(f.unit.as_deref(), Some("m²"));
        assert_eq!(f.confidence, 0.7);
    }

    #[test]
    fn extracts_numeric_fact_with_hectare_unit() {
        let blocks = vec![block("永久占地面积2.0公顷")];
        let facts = extract_facts(&blocks, &[], &[]);
        let f = facts.iter().find(|f| f.fact_key == "永久占地").unwrap();
        assert_eq!(f.value.as_numeric(), Some(20_000.0));
        assert_eq!(f.unit.as_deref(), Some("m²"));
    }

    #[test]
    fn table_header_match_extracts_column_values() {
        let table = TableWithCells {
            table: Table {
                id: TableId(1),
                version_id: VersionId(1),
                outline_node_id: None,
                table_no: Some("表3-1".to_string()),
                title: Some("挖填方量统计表".to_string()),
                n_rows: 2,
                n_cols: 2,
            },
            cells: vec![
                TableCell { table_id: TableId(1), r: 0, c: 0, text: "挖方".to_string(), num_value: None, unit: None },
                TableCell { table_id: TableId(1), r: 0, c: 1, text: "填方".to_string(), num_value: None, unit: None },
                TableCell { table_id: TableId(1), r: 1, c: 0, text: "100".to_string(), num_value: Some(100.0), unit: Some("m³".to_string()) },
                TableCell { table_id: TableId(1), r: 1, c: 1, text: "80".to_string(), num_value: Some(80.0), unit: Some("m³".to_string()) },
            ],
        };
        let facts = extract_facts(&[], &[table], &[]);
        let wafang = facts.iter().find(|f| f.fact_key == "挖方").unwrap();
        assert_eq!(wafang.value.as_numeric(), Some(100.0));
        assert_eq!(wafang.confidence, 0.8);
    }
}
