//! Finds a normalized text fragment within a page's spans and returns the
//! bounding rectangle of each occurrence — a text-geometry analogue of
//! PyMuPDF's `page.search_for`.

use crate::layout::PdfPageLayout;
use terra_core::model::RectPoints;

struct SpanRange {
    start: usize,
    end: usize,
    span_idx: usize,
}

/// Returns the bounding rect of every occurrence of `needle` (already
/// normalized) in the page's normalized, space-joined span text.
pub fn search_for(page: &PdfPageLayout, needle: &str) -> Vec<RectPoints> {
    if needle.is_empty() || page.spans.is_empty() {
        return Vec::new();
    }

    let mut concatenated = String::new();
    let mut ranges = Vec::with_capacity(page.spans.len());
    for (idx, span) in page.spans.iter().enumerate() {
        let norm = crate::normalize::norm_text(&span.text);
        if norm.is_empty() {
            continue;
        }
        if !concatenated.is_empty() {
            concatenated.push(' ');
        }
        let start = concatenated.len();
        concatenated.push_str(&norm);
        ranges.push(SpanRange {
            start,
            end: concatenated.len(),
            span_idx: idx,
        });
    }

    let mut rects = Vec::new();
    let mut search_from = 0usize;
    while let Some(pos) = concatenated[search_from..].find(needle) {
        let match_start = search_from + pos;
        let match_end = match_start + needle.len();
        let contributing: Vec<usize> = ranges
            .iter()
            .filter(|r| r.start < match_end && r.end > match_start)
            .map(|r| r.span_idx)
            .collect();
        if let Some(rect) = bounding_rect(page, &contributing) {
            rects.push(rect);
        }
        search_from = match_start + 1;
        if search_from >= concatenated.len() {
            break;
        }
    }
    rects
}

fn bounding_rect(page: &PdfPageLayout, span_indices: &[usize]) -> Option<RectPoints> {
    if span_indices.is_empty() {
        return None;
    }
    let mut x0 = f64::MAX;
    let mut y0 = f64::MAX;
    let mut x1 = f64::MIN;
    let mut y1 = f64::MIN;
    for &idx in span_indices {
        let rect = &page.spans[idx].rect;
        x0 = x0.min(rect.x0);
        y0 = y0.min(rect.y0);
        x1 = x1.max(rect.x1);
        y1 = y1.max(rect.y1);
    }
    Some(RectPoints::new(x0, y0, x1, y1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use terra_core::model::RectPoints as R;

    fn span(text: &str, y0: f64) -> crate::layout::TextSpan {
        crate::layout::TextSpan {
            text: text.to_string(),
            rect: R::new(0.0, y0, 100.0, y0 + 10.0),
        }
    }

    #[test]
    fn finds_single_occurrence() {
        let page = PdfPageLayout {
            page_no: 1,
            width: 600.0,
            height: 800.0,
            spans: vec![span("总占地面积为", 10.0), span("100公顷", 20.0)],
        };
        let hits = search_for(&page, "总占地面积为 100公顷");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].y0, 10.0);
        assert_eq!(hits[0].y1, 30.0);
    }

    #[test]
    fn no_match_returns_empty() {
        let page = PdfPageLayout {
            page_no: 1,
            width: 600.0,
            height: 800.0,
            spans: vec![span("不相关文本", 10.0)],
        };
        assert!(search_for(&page, "找不到的片段").is_empty());
    }
}
