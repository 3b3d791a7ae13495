//! Spreadsheet export: one row per issue, grounded in the original
//! `export_service.py`'s column order.

use rust_xlsxwriter::{Format, Workbook};
use terra_core::model::{Issue, IssueStatus, Severity};

use crate::error::ExportResult;

const HEADERS: [&str; 10] =
    ["id", "type", "severity", "title", "description", "suggestion", "confidence", "status", "page", "created_at"];

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Fatal => "致命",
        Severity::High => "高",
        Severity::Medium => "中",
        Severity::Low => "低",
    }
}

fn status_label(status: IssueStatus) -> &'static str {
    match status {
        IssueStatus::Open => "待处理",
        IssueStatus::Confirmed => "已确认",
        IssueStatus::Dismissed => "已忽略",
        IssueStatus::Fixed => "已修复",
    }
}

/// Renders `issues` as a single-sheet workbook, returning the `.xlsx`
/// bytes in memory. Caller owns pagination/filtering before this is called.
pub fn render(issues: &[Issue]) -> ExportResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet().set_name("Issues")?;
    let header_format = Format::new().set_bold();

    for (col, header) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (idx, issue) in issues.iter().enumerate() {
        let row = (idx + 1) as u32;
        sheet.write_number(row, 0, issue.id.get() as f64)?;
        sheet.write_string(row, 1, &issue.issue_type)?;
        sheet.write_string(row, 2, severity_label(issue.severity))?;
        sheet.write_string(row, 3, &issue.title)?;
        sheet.write_string(row, 4, &issue.description)?;
        sheet.write_string(row, 5, issue.suggestion.as_deref().unwrap_or(""))?;
        sheet.write_number(row, 6, issue.confidence)?;
        sheet.write_string(row, 7, status_label(issue.status))?;
        sheet.write_number(row, 8, issue.page_no.unwrap_or(0) as f64)?;
        sheet.write_string(row, 9, &issue.created_at.to_rfc3339())?;
    }

    sheet.autofit();
    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use terra_core::ids::{IssueId, RunId, VersionId};
    use terra_core::model::ReviewType;

    fn sample_issue() -> Issue {
        Issue {
            id: IssueId(1),
            version_id: VersionId(1),
            run_id: RunId(1),
            checkpoint_code: Some("consistency".into()),
            issue_type: "CONSISTENCY_VALUE_MISMATCH".into(),
            review_type: ReviewType::Tech,
            severity: Severity::High,
            status: IssueStatus::Open,
            title: "数值不一致".into(),
            description: "同一指标在不同位置取值不一致".into(),
            suggestion: None,
            confidence: 0.7,
            page_no: Some(3),
            evidence_block_ids: Vec::new(),
            evidence_quotes: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn renders_nonempty_workbook_bytes() {
        let bytes = render(&[sample_issue()]).unwrap();
        // xlsx files are zip archives; the local-file-header signature is a
        // cheap sanity check that we produced a real archive, not garbage.
        assert!(bytes.len() > 4);
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn renders_empty_issue_list() {
        let bytes = render(&[]).unwrap();
        assert_eq!(&bytes[0..2], b"PK");
    }
}
