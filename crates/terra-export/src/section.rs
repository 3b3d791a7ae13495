//! Maps issues onto outline sections for the Word export (spec §4.10):
//! an issue belongs to the last outline node whose resolved heading page
//! is <= the issue's page, defaulting to the first node.

use std::collections::HashMap;

use terra_core::ids::OutlineNodeId;
use terra_core::model::{Block, BlockType, Issue, OutlineNode, PageAnchor};

/// Resolves each outline node's page from the first `HEADING` block that
/// points back to it, using whatever anchors the caller already loaded.
pub fn resolve_heading_pages(blocks: &[Block], anchors: &HashMap<i64, PageAnchor>) -> HashMap<OutlineNodeId, u32> {
    let mut pages = HashMap::new();
    for block in blocks {
        if block.block_type != BlockType::Heading {
            continue;
        }
        let Some(node_id) = block.outline_node_id else { continue };
        if pages.contains_key(&node_id) {
            continue;
        }
        if let Some(page) = anchors.get(&block.id.get()).and_then(|a| a.page_no) {
            pages.insert(node_id, page);
        }
    }
    pages
}

/// Groups `issues` under the outline nodes in `outline`, which must already
/// be in document order (as `terra_store::queries::load_outline` returns).
pub fn group_issues_by_section<'a>(
    issues: &'a [Issue],
    outline: &'a [OutlineNode],
    heading_pages: &HashMap<OutlineNodeId, u32>,
) -> Vec<(&'a OutlineNode, Vec<&'a Issue>)> {
    if outline.is_empty() {
        return Vec::new();
    }
    let mut buckets: Vec<Vec<&Issue>> = vec![Vec::new(); outline.len()];
    for issue in issues {
        let issue_page = issue.page_no.unwrap_or(Issue::DEFAULT_PAGE_NO);
        let mut best_idx = 0usize;
        for (idx, node) in outline.iter().enumerate() {
            if heading_pages.get(&node.id).is_some_and(|&page| page <= issue_page) {
                best_idx = idx;
            }
        }
        buckets[best_idx].push(issue);
    }
    outline.iter().zip(buckets).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use terra_core::ids::{BlockId, IssueId, RunId, VersionId};
    use terra_core::model::{IssueStatus, ReviewType, Severity};

    fn node(id: i64, order_index: i64, title: &str) -> OutlineNode {
        OutlineNode { id: OutlineNodeId(id), version_id: VersionId(1), parent_id: None, level: 1, node_no: None, title: title.into(), order_index }
    }

    fn issue_at_page(page: Option<u32>) -> Issue {
        Issue {
            id: IssueId(1),
            version_id: VersionId(1),
            run_id: RunId(1),
            checkpoint_code: None,
            issue_type: "X".into(),
            review_type: ReviewType::Tech,
            severity: Severity::Medium,
            status: IssueStatus::Open,
            title: "t".into(),
            description: "d".into(),
            suggestion: None,
            confidence: 0.5,
            page_no: page,
            evidence_block_ids: Vec::new(),
            evidence_quotes: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issue_falls_under_last_qualifying_section() {
        let outline = vec![node(1, 0, "一"), node(2, 1, "二"), node(3, 2, "三")];
        let mut pages = HashMap::new();
        pages.insert(OutlineNodeId(1), 1);
        pages.insert(OutlineNodeId(2), 5);
        pages.insert(OutlineNodeId(3), 10);

        let issue = issue_at_page(Some(7));
        let groups = group_issues_by_section(std::slice::from_ref(&issue), &outline, &pages);
        assert_eq!(groups[1].1.len(), 1); // node 2 (page 5) qualifies, node 3 (page 10) does not
        assert!(groups[0].1.is_empty());
        assert!(groups[2].1.is_empty());
    }

    #[test]
    fn issue_with_no_qualifying_section_defaults_to_first() {
        let outline = vec![node(1, 0, "一"), node(2, 1, "二")];
        let pages: HashMap<OutlineNodeId, u32> = HashMap::new();
        let issue = issue_at_page(Some(99));
        let groups = group_issues_by_section(std::slice::from_ref(&issue), &outline, &pages);
        assert_eq!(groups[0].1.len(), 1);
    }

    #[test]
    fn resolve_heading_pages_uses_first_heading_block_per_node() {
        let blocks = vec![
            Block { id: BlockId(1), version_id: VersionId(1), outline_node_id: Some(OutlineNodeId(1)), block_type: BlockType::Heading, order_index: 0, text: "一".into(), table_id: None },
            Block { id: BlockId(2), version_id: VersionId(1), outline_node_id: Some(OutlineNodeId(1)), block_type: BlockType::Heading, order_index: 1, text: "一之一".into(), table_id: None },
        ];
        let mut anchors = HashMap::new();
        anchors.insert(1, PageAnchor { block_id: BlockId(1), page_no: Some(3), rect: None, confidence: 1.0 });
        anchors.insert(2, PageAnchor { block_id: BlockId(2), page_no: Some(4), rect: None, confidence: 1.0 });

        let pages = resolve_heading_pages(&blocks, &anchors);
        assert_eq!(pages.get(&OutlineNodeId(1)), Some(&3));
    }
}
