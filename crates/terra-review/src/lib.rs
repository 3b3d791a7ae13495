//! # terra-review
//!
//! Review Run Service (components G/H/I/J glued together): dispatches a
//! RULE-engine run through `terra-checkpoints`/`terra-rules`, an
//! AI-engine run through `terra-ai`, and inserts the resulting issues
//! with page-no back-fill from persisted anchors (spec §4.8).

pub mod ai_run;
pub mod error;
pub mod insertion;
pub mod rule_run;

pub use ai_run::{execute_ai_review_run, run_ai_review, AiRunOutcome};
pub use error::{ReviewError, ReviewResult};
pub use insertion::insert_issues;
pub use rule_run::{run_rule_review, RuleRunOutcome};
