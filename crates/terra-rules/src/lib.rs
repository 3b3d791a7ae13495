//! # terra-rules
//!
//! Deterministic rule executors for the RULE-engine checkpoints (spec
//! §4.6): sum/percentage arithmetic, unit consistency, section
//! completeness, cross-fact consistency, domain formulas, siting
//! prohibitions, content completeness, and document formatting.
//!
//! Executors are plain functions (`ReviewContext`, `rule_config`) ->
//! `Vec<IssueDraft>` so a caller (e.g. `terra-review`) can assemble them
//! into a `terra_checkpoints::ExecutorRegistry` keyed by checkpoint code
//! without this crate depending on the registry's owner.

pub mod consistency;
pub mod content;
pub mod format;
pub mod formula;
pub mod missing_section;
pub mod prohibition;
pub mod sum_mismatch;
pub mod unit_inconsistent;
pub mod util;

use terra_checkpoints::Executor;

pub use consistency::consistency_executor;
pub use content::content_executor;
pub use format::format_executor;
pub use formula::formula_executor;
pub use missing_section::missing_section_executor;
pub use prohibition::prohibition_executor;
pub use sum_mismatch::sum_mismatch_executor;
pub use unit_inconsistent::unit_inconsistent_executor;

/// `(checkpoint code, executor fn)` pairs for every rule executor this
/// crate ships, ready to be folded into an `ExecutorRegistry`.
pub fn all_executors() -> Vec<(&'static str, Executor)> {
    vec![
        ("sum_mismatch", sum_mismatch_executor as Executor),
        ("unit_inconsistent", unit_inconsistent_executor as Executor),
        ("missing_section", missing_section_executor as Executor),
        ("consistency", consistency_executor as Executor),
        ("formula", formula_executor as Executor),
        ("prohibition", prohibition_executor as Executor),
        ("content", content_executor as Executor),
        ("format", format_executor as Executor),
    ]
}
