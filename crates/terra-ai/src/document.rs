//! Document assembly for the model request (spec §4.7 step 1).

use terra_core::ids::BlockId;

/// One PARA/HEADING block with its resolved page, as handed to the
/// driver by the caller (the block/anchor join lives in `terra-review`).
#[derive(Debug, Clone)]
pub struct DocBlock {
    pub block_id: BlockId,
    pub page_no: Option<u32>,
    pub text: String,
}

const PER_BLOCK_TEXT_CAP: usize = 2_000;

/// Concatenates blocks as `"[block_id=ID][page=P]\n<text[:2000]>"`
/// separated by blank lines, cut at `char_cap` total characters. The cut
/// lands on a whole-block boundary: a block that would only partially
/// fit is dropped rather than truncated mid-text, so every emitted block
/// still carries its full `[block_id=...]` header for the mapping step.
pub fn assemble_document(blocks: &[DocBlock], char_cap: usize) -> String {
    let mut out = String::new();
    for block in blocks {
        let page = block.page_no.map(|p| p.to_string()).unwrap_or_default();
        let text: String = block.text.chars().take(PER_BLOCK_TEXT_CAP).collect();
        let entry = format!("[block_id={}][page={}]\n{}\n\n", block.block_id.get(), page, text);
        if out.chars().count() + entry.chars().count() > char_cap {
            break;
        }
        out.push_str(&entry);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(id: i64, page: Option<u32>, text: &str) -> DocBlock {
        DocBlock { block_id: BlockId(id), page_no: page, text: text.to_string() }
    }

    #[test]
    fn assembles_header_and_text() {
        let doc = assemble_document(&[block(1, Some(3), "总占地面积：1.5 hm²")], 10_000);
        assert!(doc.contains("[block_id=1][page=3]"));
        assert!(doc.contains("总占地面积：1.5 hm²"));
    }

    #[test]
    fn stops_at_char_cap_on_block_boundary() {
        let blocks = vec![block(1, Some(1), &"a".repeat(50)), block(2, Some(1), &"b".repeat(50))];
        let doc = assemble_document(&blocks, 60);
        assert!(doc.contains("block_id=1"));
        assert!(!doc.contains("block_id=2"));
    }

    #[test]
    fn missing_page_renders_empty_page_field() {
        let doc = assemble_document(&[block(7, None, "x")], 1_000);
        assert!(doc.contains("[block_id=7][page=]"));
    }
}
