//! # terra-facts
//!
//! Fact store extraction (component F): pulls structured facts out of
//! blocks and tables for downstream consistency/formula checks.

pub mod error;
pub mod extract;
pub mod keys;

pub use error::{FactError, FactResult};
pub use extract::{extract_facts, ExtractedFact};
pub use keys::{default_fact_keys, FactKeyDef};
