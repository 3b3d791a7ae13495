//! Text chunking shared by the standalone KB indexer (component K) and
//! pipeline stage 6's self-indexing, grounded on the original's
//! `_chunk_text` defaults: 800-char chunks, 100-char overlap.

pub const DEFAULT_CHUNK_SIZE: usize = 800;
pub const DEFAULT_OVERLAP: usize = 100;

#[derive(Debug, Clone)]
pub struct RawChunk {
    pub text: String,
    pub char_start: usize,
    pub char_end: usize,
}

/// Splits `text` into overlapping chunks of up to `chunk_size` chars,
/// each subsequent chunk starting `overlap` chars before the previous
/// one's end. Offsets are in chars, not bytes (Chinese text dominates
/// the corpus this indexes).
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<RawChunk> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    if len == 0 {
        return Vec::new();
    }
    let chunk_size = chunk_size.max(1);
    let overlap = overlap.min(chunk_size.saturating_sub(1));

    let mut out = Vec::new();
    let mut start = 0usize;
    loop {
        let end = (start + chunk_size).min(len);
        let piece: String = chars[start..end].iter().collect();
        out.push(RawChunk {
            text: piece,
            char_start: start,
            char_end: end,
        });
        if end >= len {
            break;
        }
        start = end - overlap;
    }
    out
}

/// blake3 hex digest of a chunk's text, the uniqueness discriminator
/// alongside `kb_source_id` in the `kb_chunk` table.
pub fn content_hash(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

/// Resolves the page a char offset falls on, given a sorted list of
/// `(char_offset_where_page_starts, page_no)` boundaries. `None` if no
/// page-boundary map is available (e.g. a plain-text KB source with no
/// page concept).
pub fn page_at(offset: usize, boundaries: &[(usize, u32)]) -> Option<u32> {
    boundaries
        .iter()
        .rev()
        .find(|(start, _)| *start <= offset)
        .map(|(_, page)| *page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_with_overlap() {
        let text = "a".repeat(1000);
        let chunks = chunk_text(&text, 800, 100);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].char_start, 0);
        assert_eq!(chunks[0].char_end, 800);
        assert_eq!(chunks[1].char_start, 700);
        assert_eq!(chunks[1].char_end, 1000);
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = chunk_text("短文本", 800, 100);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].char_start, 0);
        assert_eq!(chunks[0].char_end, 3);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_text("", 800, 100).is_empty());
    }

    #[test]
    fn resolves_page_boundaries() {
        let boundaries = vec![(0, 1), (500, 2), (1200, 3)];
        assert_eq!(page_at(0, &boundaries), Some(1));
        assert_eq!(page_at(499, &boundaries), Some(1));
        assert_eq!(page_at(500, &boundaries), Some(2));
        assert_eq!(page_at(5000, &boundaries), Some(3));
    }
}
