//! The page layout shape produced by stage 3 (layout extraction) and
//! consumed here — one page dictionary's worth of text spans plus
//! geometry, already JSON-serializable upstream.

use serde::{Deserialize, Serialize};
use terra_core::model::RectPoints;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    pub rect: RectPoints,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfPageLayout {
    pub page_no: u32,
    pub width: f64,
    pub height: f64,
    pub spans: Vec<TextSpan>,
}

impl PdfPageLayout {
    /// Normalized full-page text, spans joined in reading order with a
    /// single space, matching how the aligner's page precompute step
    /// builds `page_norm`.
    pub fn normalized_text(&self) -> String {
        let joined = self
            .spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        crate::normalize::norm_text(&joined)
    }
}
