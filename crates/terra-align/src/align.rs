//! Block-to-page alignment (component E, spec §4.2), verified against
//! `align_blocks_to_pdf` in the original pipeline.

use crate::layout::PdfPageLayout;
use crate::normalize::{norm_text, snippet_candidates};
use crate::search;
use std::collections::HashMap;
use terra_core::ids::BlockId;
use terra_core::model::PageAnchor;

/// One block's search text, already resolved by the caller (PARA blocks
/// use their own text; TABLE blocks use `table_no` + title concatenated).
pub struct AlignInput {
    pub block_id: BlockId,
    pub search_text: String,
}

const WINDOWS: [usize; 3] = [3, 8, 20];

#[derive(Debug, Default, Clone, Copy)]
pub struct AlignStats {
    pub search_calls: u64,
    pub candidate_pages: u64,
    pub hits: u64,
    pub blocks: u64,
}

/// Carries the forward-progression cursors across blocks in document
/// order — resetting these per block would defeat the whole point of the
/// window ladder (nearby pages first).
pub struct Aligner<'a> {
    pages: &'a [PdfPageLayout],
    page_norm: Vec<String>,
    last_page: usize,
    y_last: HashMap<u32, f64>,
    stats: AlignStats,
}

impl<'a> Aligner<'a> {
    pub fn new(pages: &'a [PdfPageLayout]) -> Self {
        let page_norm = pages.iter().map(|p| p.normalized_text()).collect();
        Self {
            pages,
            page_norm,
            last_page: 1,
            y_last: HashMap::new(),
            stats: AlignStats::default(),
        }
    }

    pub fn stats(&self) -> AlignStats {
        self.stats
    }

    /// Aligns one block. Returns an unanchored `PageAnchor` (page `None`,
    /// confidence 0) if nothing in the document matches.
    pub fn align(&mut self, input: &AlignInput) -> PageAnchor {
        self.stats.blocks += 1;
        let num_pages = self.pages.len();
        if num_pages == 0 {
            return PageAnchor::unanchored(input.block_id);
        }

        let text = norm_text(&input.search_text);
        let candidates = snippet_candidates(&text);
        if candidates.is_empty() {
            return PageAnchor::unanchored(input.block_id);
        }
        // shortest candidate is last (candidates are longest-first)
        let probe = candidates.last().unwrap();

        let mut candidate_pages = self.ladder_candidate_pages(probe, num_pages);
        if candidate_pages.is_empty() {
            candidate_pages = self.full_scan_candidate_pages(probe, num_pages);
        }
        if candidate_pages.is_empty() {
            return PageAnchor::unanchored(input.block_id);
        }

        for &page_idx in &candidate_pages {
            for frag in &candidates {
                self.stats.search_calls += 1;
                let mut rects = search::search_for(&self.pages[page_idx], frag);
                if rects.is_empty() {
                    continue;
                }
                rects.sort_by(|a, b| {
                    a.y0.partial_cmp(&b.y0)
                        .unwrap()
                        .then(a.x0.partial_cmp(&b.x0).unwrap())
                });
                let page_no = self.pages[page_idx].page_no;
                let prev_y = *self.y_last.get(&page_no).unwrap_or(&f64::MIN);
                let chosen = rects
                    .iter()
                    .find(|r| r.y0 >= prev_y - 2.0)
                    .unwrap_or(&rects[0])
                    .clone();

                self.stats.hits += 1;
                self.last_page = page_idx + 1;
                self.y_last.insert(page_no, chosen.y0);

                let confidence = (frag.chars().count() as f64 / 40.0).min(1.0);
                return PageAnchor {
                    block_id: input.block_id,
                    page_no: Some(page_no),
                    rect: Some(chosen),
                    confidence,
                };
            }
        }

        PageAnchor::unanchored(input.block_id)
    }

    /// `[3, 8, 20]` window ladder, `start = max(1, last_page - 1)`. Stops at
    /// the first window whose pages contain the probe substring.
    fn ladder_candidate_pages(&mut self, probe: &str, num_pages: usize) -> Vec<usize> {
        for &w in &WINDOWS {
            let start = self.last_page.saturating_sub(1).max(1);
            let end = num_pages.min(start + w - 1);
            self.stats.candidate_pages += (end - start + 1) as u64;
            let found: Vec<usize> = ((start - 1)..end)
                .filter(|&idx| self.page_norm[idx].contains(probe))
                .collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    /// Unbounded fallback scan across every page, tried once the ladder is
    /// exhausted with no hits.
    fn full_scan_candidate_pages(&mut self, probe: &str, num_pages: usize) -> Vec<usize> {
        self.stats.candidate_pages += num_pages as u64;
        (0..num_pages).filter(|&idx| self.page_norm[idx].contains(probe)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::TextSpan;
    use terra_core::model::RectPoints;

    fn page(page_no: u32, spans: Vec<(&str, f64)>) -> PdfPageLayout {
        PdfPageLayout {
            page_no,
            width: 600.0,
            height: 800.0,
            spans: spans
                .into_iter()
                .map(|(t, y)| TextSpan {
                    text: t.to_string(),
                    rect: RectPoints::new(0.0, y, 100.0, y + 10.0),
                })
                .collect(),
        }
    }

    #[test]
    fn anchors_block_to_matching_page() {
        let pages = vec![
            page(1, vec![("项目概况与建设内容说明文本段落超过二十个字符的正文", 10.0)]),
            page(2, vec![("其他无关内容填充到此处以便凑够长度使用", 10.0)]),
        ];
        let mut aligner = Aligner::new(&pages);
        let anchor = aligner.align(&AlignInput {
            block_id: BlockId(1),
            search_text: "项目概况与建设内容说明文本段落超过二十个字符的正文".to_string(),
        });
        assert_eq!(anchor.page_no, Some(1));
        assert!(anchor.confidence > 0.0);
    }

    #[test]
    fn unmatched_block_is_unanchored() {
        let pages = vec![page(1, vec![("完全不相关的内容占满这一整页的文字长度充足", 10.0)])];
        let mut aligner = Aligner::new(&pages);
        let anchor = aligner.align(&AlignInput {
            block_id: BlockId(2),
            search_text: "找不到这段话在任何页面里面出现过的文字内容".to_string(),
        });
        assert_eq!(anchor.page_no, None);
        assert_eq!(anchor.confidence, 0.0);
    }

    #[test]
    fn forward_progression_prefers_later_rect_on_same_page() {
        let pages = vec![page(
            1,
            vec![
                ("第一段内容足够长用于测试前向推进游标的行为表现", 10.0),
                ("第二段内容足够长用于测试前向推进游标的行为表现", 50.0),
            ],
        )];
        let mut aligner = Aligner::new(&pages);
        let first = aligner.align(&AlignInput {
            block_id: BlockId(1),
            search_text: "第一段内容足够长用于测试前向推进游标的行为表现".to_string(),
        });
        assert_eq!(first.rect.unwrap().y0, 10.0);
        let second = aligner.align(&AlignInput {
            block_id: BlockId(2),
            search_text: "第二段内容足够长用于测试前向推进游标的行为表现".to_string(),
        });
        assert_eq!(second.rect.unwrap().y0, 50.0);
    }

    #[test]
    fn no_pages_yields_unanchored() {
        let pages: Vec<PdfPageLayout> = vec![];
        let mut aligner = Aligner::new(&pages);
        let anchor = aligner.align(&AlignInput {
            block_id: BlockId(1),
            search_text: "任何内容".to_string(),
        });
        assert_eq!(anchor.page_no, None);
    }
}
