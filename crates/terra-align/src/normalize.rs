//! Text normalization and candidate-fragment generation shared by the page
//! precompute step and the per-block probe step (spec §4.2 step 1).

fn is_zero_width(ch: char) -> bool {
    matches!(ch, '\u{feff}' | '\u{200b}' | '\u{200c}' | '\u{200d}')
}

/// Replaces the ideographic space, removes zero-width characters
/// (BOM/ZWSP/ZWNJ/ZWJ) wherever they occur, and collapses runs of
/// whitespace to a single ASCII space.
pub fn norm_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = false;
    for ch in s.chars() {
        if is_zero_width(ch) {
            continue;
        }
        let ch = if ch == '\u{3000}' { ' ' } else { ch };
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    out.trim().to_string()
}

const CANDIDATE_LENGTHS: [usize; 3] = [40, 30, 20];
const MIN_FRAGMENT_LEN: usize = 8;

/// Generates prefix fragments at decreasing lengths, longest first,
/// discarding anything shorter than 8 chars and de-duplicating while
/// preserving order — mirrors `_snip_candidates`.
pub fn snippet_candidates(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    for &len in &CANDIDATE_LENGTHS {
        if chars.len() < MIN_FRAGMENT_LEN {
            continue;
        }
        let take = len.min(chars.len());
        if take < MIN_FRAGMENT_LEN {
            continue;
        }
        let frag: String = chars[..take].iter().collect();
        if !out.contains(&frag) {
            out.push(frag);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_ideographic_space_and_bom() {
        let s = norm_text("\u{feff}a\u{3000}\u{3000}b");
        assert_eq!(s, "a b");
    }

    #[test]
    fn removes_embedded_zero_width_characters() {
        let s = norm_text("a\u{200b}b\u{feff}c\u{200d}d");
        assert_eq!(s, "abcd");
    }

    #[test]
    fn short_text_yields_no_candidates() {
        assert!(snippet_candidates("short").is_empty());
    }

    #[test]
    fn candidates_are_longest_first_and_deduped() {
        let text: String = std::iter::repeat('x').take(50).collect();
        let cands = snippet_candidates(&text);
        assert_eq!(cands.len(), 3);
        assert_eq!(cands[0].chars().count(), 40);
        assert_eq!(cands[2].chars().count(), 20);
    }

    #[test]
    fn text_between_min_and_20_yields_one_candidate() {
        let text: String = std::iter::repeat('x').take(12).collect();
        let cands = snippet_candidates(&text);
        assert_eq!(cands, vec![text]);
    }
}
