//! # terra-align
//!
//! Block-to-page aligner (component E): given a document's PDF layout and
//! its blocks in document order, resolves each block to a page, rectangle,
//! and confidence.

pub mod align;
pub mod error;
pub mod layout;
pub mod normalize;
pub mod search;

pub use align::{AlignInput, AlignStats, Aligner};
pub use error::{AlignError, AlignResult};
pub use layout::{PdfPageLayout, TextSpan};
