//! Cell and number parsing (component C / spec §4.3).
//!
//! A single pure function shared by table-cell ingestion and fact
//! extraction, so both walk the exact same numeric grammar.

use once_cell::sync::Lazy;
use regex::Regex;

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?x)
        ([-+]?\d*\.?\d+(?:[eE][-+]?\d+)?)   # numeric
        \s*
        ([^\d\s\-+.]+)?                      # optional trailing unit
        $
    ").expect("static regex")
});

/// Parses a raw cell/fragment string into `(numeric value, unit)`.
///
/// Whitespace is stripped, thousands separators are removed, a leading
/// sign is honored, and a value wrapped in parentheses — the common
/// accounting convention for negatives — is negated. Failure to match the
/// trailing-numeric grammar yields `(None, None)`; the original text is
/// never touched by this function, callers keep it separately.
pub fn parse_number(text: &str) -> (Option<f64>, Option<String>) {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return (None, None);
    }

    let mut negated = false;
    let mut body = trimmed.replace(',', "").replace('，', "");
    if body.starts_with('(') && body.ends_with(')') && body.len() >= 2 {
        negated = true;
        body = body[1..body.len() - 1].to_string();
    } else if body.starts_with('（') && body.ends_with('）') {
        negated = true;
        let inner: String = body.chars().skip(1).take(body.chars().count() - 2).collect();
        body = inner;
    }
    let body = body.trim();

    let caps = match NUMBER_RE.captures(body) {
        Some(c) => c,
        None => return (None, None),
    };

    let num_str = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let mut value = match num_str.parse::<f64>() {
        Ok(v) => v,
        Err(_) => return (None, None),
    };
    if negated {
        value = -value;
    }

    let unit = caps
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty());

    (Some(value), unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_integer() {
        assert_eq!(parse_number("123"), (Some(123.0), None));
    }

    #[test]
    fn with_unit() {
        let (v, u) = parse_number("12.5万元");
        assert_eq!(v, Some(12.5));
        assert_eq!(u.as_deref(), Some("万元"));
    }

    #[test]
    fn thousands_separator() {
        assert_eq!(parse_number("1,234.5"), (Some(1234.5), None));
    }

    #[test]
    fn negative_sign() {
        assert_eq!(parse_number("-42"), (Some(-42.0), None));
    }

    #[test]
    fn parenthesized_negative() {
        assert_eq!(parse_number("(42)"), (Some(-42.0), None));
    }

    #[test]
    fn full_width_parens_negative() {
        let (v, _) = parse_number("（3.2）");
        assert_eq!(v, Some(-3.2));
    }

    #[test]
    fn unparseable_preserves_nothing_but_returns_none() {
        assert_eq!(parse_number("见附件"), (None, None));
    }

    #[test]
    fn empty_string() {
        assert_eq!(parse_number(""), (None, None));
    }

    #[test]
    fn scientific_notation() {
        let (v, _) = parse_number("1.2e3");
        assert_eq!(v, Some(1200.0));
    }
}
