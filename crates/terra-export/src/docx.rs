//! Word export: a FORM/TECH summary table followed by the issues grouped
//! under their outline section, built as a minimal OOXML package — no
//! template dependency, just `[Content_Types].xml`, `_rels/.rels` and
//! `word/document.xml` zipped together.

use std::collections::HashMap;
use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};
use quick_xml::Writer;
use terra_core::ids::OutlineNodeId;
use terra_core::model::{Issue, OutlineNode, ReviewType, Severity};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ExportResult;
use crate::section::group_issues_by_section;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Fatal => "致命",
        Severity::High => "高",
        Severity::Medium => "中",
        Severity::Low => "低",
    }
}

fn write_run(writer: &mut Writer<Vec<u8>>, text: &str, bold: bool) -> ExportResult<()> {
    writer.write_event(Event::Start(BytesStart::new("w:r")))?;
    if bold {
        writer.write_event(Event::Start(BytesStart::new("w:rPr")))?;
        writer.write_event(Event::Empty(BytesStart::new("w:b")))?;
        writer.write_event(Event::End(BytesStart::new("w:rPr").to_end()))?;
    }
    let mut t = BytesStart::new("w:t");
    t.push_attribute(("xml:space", "preserve"));
    writer.write_event(Event::Start(t))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesStart::new("w:t").to_end()))?;
    writer.write_event(Event::End(BytesStart::new("w:r").to_end()))?;
    Ok(())
}

fn write_paragraph(writer: &mut Writer<Vec<u8>>, text: &str, bold: bool) -> ExportResult<()> {
    writer.write_event(Event::Start(BytesStart::new("w:p")))?;
    write_run(writer, text, bold)?;
    writer.write_event(Event::End(BytesStart::new("w:p").to_end()))?;
    Ok(())
}

fn write_table_row(writer: &mut Writer<Vec<u8>>, cells: &[&str]) -> ExportResult<()> {
    writer.write_event(Event::Start(BytesStart::new("w:tr")))?;
    for cell in cells {
        writer.write_event(Event::Start(BytesStart::new("w:tc")))?;
        write_paragraph(writer, cell, false)?;
        writer.write_event(Event::End(BytesStart::new("w:tc").to_end()))?;
    }
    writer.write_event(Event::End(BytesStart::new("w:tr").to_end()))?;
    Ok(())
}

fn write_summary_table(writer: &mut Writer<Vec<u8>>, form_count: usize, tech_count: usize) -> ExportResult<()> {
    writer.write_event(Event::Start(BytesStart::new("w:tbl")))?;
    write_table_row(writer, &["形式审查问题数", "技术审查问题数"])?;
    write_table_row(writer, &[&form_count.to_string(), &tech_count.to_string()])?;
    writer.write_event(Event::End(BytesStart::new("w:tbl").to_end()))?;
    Ok(())
}

fn build_document_xml(
    issues: &[Issue],
    outline: &[OutlineNode],
    heading_pages: &HashMap<OutlineNodeId, u32>,
) -> ExportResult<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

    let mut root = BytesStart::new("w:document");
    root.push_attribute(("xmlns:w", "http://schemas.openxmlformats.org/wordprocessingml/2006/main"));
    writer.write_event(Event::Start(root.clone()))?;
    writer.write_event(Event::Start(BytesStart::new("w:body")))?;

    write_paragraph(&mut writer, "审查问题报告", true)?;

    let form_count = issues.iter().filter(|i| i.review_type == ReviewType::Form).count();
    let tech_count = issues.iter().filter(|i| i.review_type == ReviewType::Tech).count();
    write_summary_table(&mut writer, form_count, tech_count)?;

    for (node, group) in group_issues_by_section(issues, outline, heading_pages) {
        if group.is_empty() {
            continue;
        }
        let heading = format!("{} {}", node.node_no.clone().unwrap_or_default(), node.title).trim().to_string();
        write_paragraph(&mut writer, &heading, true)?;
        for issue in group {
            let page = issue.page_no.unwrap_or(Issue::DEFAULT_PAGE_NO);
            write_paragraph(&mut writer, &format!("[{}] {}（第{}页）", severity_label(issue.severity), issue.title, page), false)?;
            write_paragraph(&mut writer, &issue.description, false)?;
            if let Some(suggestion) = &issue.suggestion {
                write_paragraph(&mut writer, &format!("建议：{suggestion}"), false)?;
            }
        }
    }

    writer.write_event(Event::End(BytesStart::new("w:body").to_end()))?;
    writer.write_event(Event::End(root.to_end()))?;
    Ok(writer.into_inner())
}

/// Renders `issues` grouped by outline section into a `.docx` byte buffer.
/// `outline` must be in document order; `heading_pages` resolves each
/// node's page, typically via [`crate::section::resolve_heading_pages`].
pub fn render(issues: &[Issue], outline: &[OutlineNode], heading_pages: &HashMap<OutlineNodeId, u32>) -> ExportResult<Vec<u8>> {
    let document_xml = build_document_xml(issues, outline, heading_pages)?;

    let mut buf = Vec::new();
    {
        let cursor = Cursor::new(&mut buf);
        let mut zip = ZipWriter::new(cursor);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(CONTENT_TYPES_XML.as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(RELS_XML.as_bytes())?;

        zip.start_file("word/document.xml", options)?;
        zip.write_all(&document_xml)?;

        zip.finish()?;
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use terra_core::ids::{IssueId, RunId, VersionId};
    use terra_core::model::{IssueStatus, Severity};

    fn node(id: i64, title: &str) -> OutlineNode {
        OutlineNode { id: OutlineNodeId(id), version_id: VersionId(1), parent_id: None, level: 1, node_no: None, title: title.into(), order_index: id }
    }

    fn issue(review_type: ReviewType, page: Option<u32>) -> Issue {
        Issue {
            id: IssueId(1),
            version_id: VersionId(1),
            run_id: RunId(1),
            checkpoint_code: None,
            issue_type: "X".into(),
            review_type,
            severity: Severity::High,
            status: IssueStatus::Open,
            title: "不一致".into(),
            description: "描述".into(),
            suggestion: Some("建议修改".into()),
            confidence: 0.6,
            page_no: page,
            evidence_block_ids: Vec::new(),
            evidence_quotes: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn renders_nonempty_zip_with_required_parts() {
        let outline = vec![node(1, "总则")];
        let heading_pages = HashMap::new();
        let issues = vec![issue(ReviewType::Form, Some(1)), issue(ReviewType::Tech, Some(2))];
        let bytes = render(&issues, &outline, &heading_pages).unwrap();
        assert_eq!(&bytes[0..2], b"PK");

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert!(archive.by_name("word/document.xml").is_ok());
        assert!(archive.by_name("[Content_Types].xml").is_ok());
    }

    #[test]
    fn renders_with_empty_outline_and_issues() {
        let bytes = render(&[], &[], &HashMap::new()).unwrap();
        assert_eq!(&bytes[0..2], b"PK");
    }
}
