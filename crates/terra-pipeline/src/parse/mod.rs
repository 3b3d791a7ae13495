//! Stage 2: structural parsing (spec §4.1 stage 2). Opens the `.docx`
//! zip package, walks `word/document.xml` and `word/styles.xml`, builds
//! the outline/block/table structure, and persists it delete-then-insert.

pub mod docx_xml;
pub mod heading;
pub mod styles;

use std::io::{Cursor, Read};

use rusqlite::Connection;
use terra_core::config::ParseConfig;
use terra_core::ids::VersionId;
use terra_store::{queries, BatchWriter, Row};

use crate::error::{PipelineError, PipelineResult};
use heading::{build_structure, ParsedStructure};

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOutcome {
    pub outline_count: usize,
    pub block_count: usize,
    pub table_count: usize,
}

/// Reads `word/document.xml` and `word/styles.xml` out of a `.docx` zip
/// archive. Styles are optional — a document without custom heading
/// styles still parses, it just falls back to the appendix/numeric
/// detectors for every paragraph.
fn read_docx_parts(bytes: &[u8]) -> PipelineResult<(String, String)> {
    let cursor = Cursor::new(bytes);
    let mut archive =
        zip::ZipArchive::new(cursor).map_err(|e| PipelineError::ParseStructure(format!("not a valid docx/zip: {e}")))?;

    let mut document_xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| PipelineError::ParseStructure(format!("missing word/document.xml: {e}")))?
        .read_to_string(&mut document_xml)
        .map_err(|e| PipelineError::ParseStructure(format!("reading word/document.xml: {e}")))?;

    let mut styles_xml = String::new();
    if let Ok(mut entry) = archive.by_name("word/styles.xml") {
        let _ = entry.read_to_string(&mut styles_xml);
    }

    Ok((document_xml, styles_xml))
}

/// Assigns sequential ids to a freshly-built structure and writes it
/// through the batch writer, then blocks until committed.
fn persist_structure(conn: &Connection, writer: &BatchWriter, version_id: VersionId, structure: &ParsedStructure) -> PipelineResult<ParseOutcome> {
    queries::delete_structure(conn, version_id)?;

    let mut next_outline_id = queries::next_id(conn, "doc_outline_node")?;
    let mut next_table_id = queries::next_id(conn, "doc_table")?;
    let mut next_block_id = queries::next_id(conn, "doc_block")?;

    let outline_ids: Vec<i64> = structure
        .outline
        .iter()
        .map(|_| {
            let id = next_outline_id;
            next_outline_id += 1;
            id
        })
        .collect();

    for (idx, node) in structure.outline.iter().enumerate() {
        let parent_id = node.parent_idx.map(|p| outline_ids[p]);
        writer.send(Row::OutlineNode {
            id: outline_ids[idx],
            version_id: version_id.get(),
            parent_id,
            level: node.level as i64,
            node_no: Some(node.node_no.clone()).filter(|s| !s.is_empty()),
            title: node.title.clone(),
            order_index: idx as i64,
        })?;
    }

    let table_ids: Vec<i64> = structure
        .tables
        .iter()
        .map(|_| {
            let id = next_table_id;
            next_table_id += 1;
            id
        })
        .collect();

    for (idx, table) in structure.tables.iter().enumerate() {
        let outline_node_id = table.outline_idx.map(|i| outline_ids[i]);
        let n_rows = table.rows.len() as i64;
        let n_cols = table.rows.iter().map(|r| r.len()).max().unwrap_or(0) as i64;
        writer.send(Row::Table {
            id: table_ids[idx],
            version_id: version_id.get(),
            outline_node_id,
            table_no: table.table_no.clone(),
            title: table.title.clone(),
            n_rows,
            n_cols,
        })?;
        for (r, row) in table.rows.iter().enumerate() {
            for (c, text) in row.iter().enumerate() {
                let (num_value, unit) = terra_core::numeric::parse_number(text);
                writer.send(Row::TableCell {
                    table_id: table_ids[idx],
                    r: r as i64,
                    c: c as i64,
                    text: text.clone(),
                    num_value,
                    unit,
                })?;
            }
        }
    }

    for (order_index, block) in structure.blocks.iter().enumerate() {
        let id = next_block_id;
        next_block_id += 1;
        let outline_node_id = block.outline_idx.map(|i| outline_ids[i]);
        let table_id = block.table_idx.map(|i| table_ids[i]);
        let block_type = match block.block_type {
            terra_core::model::BlockType::ListItem => "LIST_ITEM".to_string(),
            other => format!("{other:?}").to_uppercase(),
        };
        writer.send(Row::Block {
            id,
            version_id: version_id.get(),
            outline_node_id,
            block_type,
            order_index: order_index as i64,
            text: block.text.chars().take(terra_core::model::Block::TEXT_MAX).collect(),
            table_id,
        })?;
    }

    writer.flush_sync()?;

    Ok(ParseOutcome {
        outline_count: outline_ids.len(),
        block_count: structure.blocks.len(),
        table_count: table_ids.len(),
    })
}

/// Runs the full structural-parse stage for one version: reads the
/// `.docx` package, builds the outline/block/table structure, and
/// persists it (replacing anything previously parsed for this version).
pub fn run(conn: &Connection, writer: &BatchWriter, version_id: VersionId, docx_bytes: &[u8], cfg: &ParseConfig) -> PipelineResult<ParseOutcome> {
    let (document_xml, styles_xml) = read_docx_parts(docx_bytes)?;
    let style_levels = styles::heading_levels(&styles_xml);
    let elements = docx_xml::walk_body(&document_xml);
    let structure = build_structure(elements, &style_levels, *cfg);
    persist_structure(conn, writer, version_id, &structure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use terra_store::DatabaseManager;

    fn sample_docx_bytes() -> Vec<u8> {
        let document_xml = r#"<?xml version="1.0"?>
<w:document xmlns:w="x"><w:body>
<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>1 综合说明</w:t></w:r></w:p>
<w:p><w:r><w:t>本项目位于示例省示例市，总占地面积：12.5万m²。</w:t></w:r></w:p>
<w:p><w:r><w:t>表3-1：挖填方量统计表</w:t></w:r></w:p>
<w:tbl>
<w:tr><w:tc><w:p><w:r><w:t>挖方</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>填方</w:t></w:r></w:p></w:tc></w:tr>
<w:tr><w:tc><w:p><w:r><w:t>100</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>80</w:t></w:r></w:p></w:tc></w:tr>
</w:tbl>
</w:body></w:document>"#;
        let styles_xml = r#"<w:styles xmlns:w="x">
<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style>
</w:styles>"#;

        let mut buf = Vec::new();
        {
            let cursor = Cursor::new(&mut buf);
            let mut zip = zip::ZipWriter::new(cursor);
            let opts = zip::write::SimpleFileOptions::default();
            zip.start_file("word/document.xml", opts).unwrap();
            std::io::Write::write_all(&mut zip, document_xml.as_bytes()).unwrap();
            zip.start_file("word/styles.xml", opts).unwrap();
            std::io::Write::write_all(&mut zip, styles_xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn parses_and_persists_a_minimal_docx() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("t.db").to_string_lossy().to_string();
        let db = DatabaseManager::open(&db_path, 1, 1).unwrap();
        let conn = db.open_direct().unwrap();
        conn.execute("INSERT INTO project (id, name) VALUES (1, 'p')", []).unwrap();
        conn.execute("INSERT INTO document (id, project_id, title) VALUES (1, 1, 'd')", []).unwrap();
        conn.execute(
            "INSERT INTO document_version (id, document_id, version_no, status, progress, source_object_key, created_at, updated_at) \
             VALUES (1, 1, 1, 'UPLOADED', 0, 'k', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        let outcome = run(&conn, db.writer(), VersionId(1), &sample_docx_bytes(), &ParseConfig::default()).unwrap();
        assert_eq!(outcome.outline_count, 1);
        assert_eq!(outcome.table_count, 1);
        assert!(outcome.block_count >= 3);

        let outline = queries::load_outline(&conn, VersionId(1)).unwrap();
        assert_eq!(outline.len(), 1);
        assert_eq!(outline[0].title, "1 综合说明");

        let tables = queries::load_tables_with_cells(&conn, VersionId(1)).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].table.table_no.as_deref(), Some("3-1"));
        assert_eq!(tables[0].cells.len(), 4);
    }
}
