//! Stage contract: every pipeline stage is a `fn(&PipelineCx, VersionId) ->
//! Result<StageOutcome, PipelineError>`, run in sequence by the driver.

use terra_core::ids::VersionId;
use terra_core::model::VersionStatus;

use crate::driver::PipelineCx;
use crate::error::PipelineResult;

/// The uniform stage-function shape named in spec §4.1; the driver calls
/// each concrete stage module directly rather than through a dispatch
/// table (their parameter lists differ), but this alias documents the
/// contract every stage conforms to.
pub type Stage = fn(&PipelineCx, VersionId) -> PipelineResult<StageOutcome>;

#[derive(Debug, Clone, Default)]
pub struct StageOutcome {
    pub status: Option<VersionStatus>,
    pub current_step: &'static str,
    /// `true` for stage 5 (fact extraction): a failure here is logged and
    /// swallowed by the driver rather than marking the version FAILED.
    pub soft: bool,
}

impl StageOutcome {
    pub fn new(status: VersionStatus, current_step: &'static str) -> Self {
        Self {
            status: Some(status),
            current_step,
            soft: false,
        }
    }
}
