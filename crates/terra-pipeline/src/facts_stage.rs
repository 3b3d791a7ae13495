//! Stage 5: fact extraction (spec §4.1 stage 5, §4.4). A soft stage: the
//! driver logs and swallows failures here rather than marking the whole
//! version FAILED, since a badly-formed document can still be reviewed
//! without every fact resolving.

use rusqlite::Connection;
use terra_core::ids::VersionId;
use terra_core::model::FactValue;
use terra_facts::extract_facts;
use terra_store::{queries, BatchWriter, Row};

use crate::error::PipelineResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct FactsOutcome {
    pub fact_count: usize,
}

pub fn run(conn: &Connection, writer: &BatchWriter, version_id: VersionId) -> PipelineResult<FactsOutcome> {
    queries::delete_facts(conn, version_id)?;

    let blocks = queries::load_blocks(conn, version_id)?;
    let tables = queries::load_tables_with_cells(conn, version_id)?;
    let outline = queries::load_outline(conn, version_id)?;

    let facts = extract_facts(&blocks, &tables, &outline);
    for fact in &facts {
        let (value_num, value_text) = match &fact.value {
            FactValue::Numeric(n) => (Some(*n), None),
            FactValue::Text(t) => (None, Some(t.clone())),
        };
        writer.send(Row::Fact {
            version_id: version_id.get(),
            fact_key: fact.fact_key.clone(),
            scope: fact.scope.0.clone(),
            value_num,
            value_text,
            unit: fact.unit.clone(),
            confidence: fact.confidence,
            source_block_id: fact.source_block_id,
        })?;
    }

    writer.flush_sync()?;
    Ok(FactsOutcome { fact_count: facts.len() })
}
