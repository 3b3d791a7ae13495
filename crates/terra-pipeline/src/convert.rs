//! Stage 1: convert the source authoring document to a fixed-page
//! (PDF) artifact (spec §4.1 stage 1). The actual renderer is an opaque
//! external subprocess — this module only owns the bounded-wall-clock
//! invocation contract, not the renderer's internals.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::error::{PipelineError, PipelineResult};

/// Anything that turns a source document's bytes into fixed-page (PDF)
/// bytes. The production implementation shells out to LibreOffice; tests
/// substitute a stub that echoes fixture bytes back.
pub trait DocumentConverter: Send + Sync {
    fn convert(&self, source_path: &Path, out_dir: &Path, budget: Duration) -> PipelineResult<Vec<u8>>;
}

/// Invokes `soffice --headless --invisible --nologo --convert-to pdf` with
/// a private `UserInstallation` profile directory (avoids cross-run lock
/// contention on the LibreOffice user profile when many versions convert
/// concurrently), polling for the output file up to `budget`.
pub struct LibreOfficeConverter {
    pub binary: String,
    pub poll_interval: Duration,
}

impl Default for LibreOfficeConverter {
    fn default() -> Self {
        Self {
            binary: "soffice".to_string(),
            poll_interval: Duration::from_secs(5),
        }
    }
}

impl DocumentConverter for LibreOfficeConverter {
    fn convert(&self, source_path: &Path, out_dir: &Path, budget: Duration) -> PipelineResult<Vec<u8>> {
        std::fs::create_dir_all(out_dir).map_err(|e| PipelineError::Convert(e.to_string()))?;
        let profile_dir = out_dir.join("profile");
        std::fs::create_dir_all(&profile_dir).map_err(|e| PipelineError::Convert(e.to_string()))?;
        let profile_url = format!("-env:UserInstallation=file://{}", profile_dir.display());

        let mut child: Child = Command::new(&self.binary)
            .arg("--headless")
            .arg("--invisible")
            .arg("--nologo")
            .arg("--nolockcheck")
            .arg(&profile_url)
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(out_dir)
            .arg(source_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PipelineError::Convert(format!("spawn soffice: {e}")))?;

        let expected: PathBuf = out_dir.join(
            source_path
                .file_stem()
                .map(|s| format!("{}.pdf", s.to_string_lossy()))
                .unwrap_or_else(|| "preview.pdf".to_string()),
        );

        let started = Instant::now();
        loop {
            if let Ok(Some(status)) = child.try_wait() {
                if !status.success() {
                    return Err(PipelineError::Convert(format!("soffice exited with {status}")));
                }
                break;
            }
            if started.elapsed() >= budget {
                warn!("soffice conversion exceeded {:?} budget, killing", budget);
                let _ = child.kill();
                let _ = child.wait();
                return Err(PipelineError::Convert("conversion subprocess timed out".to_string()));
            }
            std::thread::sleep(self.poll_interval.min(budget - started.elapsed()));
        }

        if !expected.exists() {
            return Err(PipelineError::Convert("conversion produced no output file".to_string()));
        }
        let bytes = std::fs::read(&expected).map_err(|e| PipelineError::Convert(e.to_string()))?;
        if bytes.is_empty() {
            return Err(PipelineError::Convert("conversion produced empty output".to_string()));
        }
        info!(bytes = bytes.len(), "converted source to fixed-page artifact");
        Ok(bytes)
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;

    /// Echoes fixed bytes back regardless of input, for driver tests that
    /// don't have a real LibreOffice binary available.
    pub struct StubConverter(pub Vec<u8>);

    impl DocumentConverter for StubConverter {
        fn convert(&self, _source_path: &Path, _out_dir: &Path, _budget: Duration) -> PipelineResult<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    pub struct FailingConverter;

    impl DocumentConverter for FailingConverter {
        fn convert(&self, _source_path: &Path, _out_dir: &Path, _budget: Duration) -> PipelineResult<Vec<u8>> {
            Err(PipelineError::Convert("stub failure".to_string()))
        }
    }
}
