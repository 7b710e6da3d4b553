use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::{PipelineError, PipelineResult};

/// External sequence labeller driven through files.
pub trait SequenceTagger {
    fn train(&self, patterns: &Path, train: &Path, model: &Path) -> PipelineResult<()>;
    fn label(&self, model: &Path, test: &Path, result: &Path) -> PipelineResult<()>;
}

/// Wapiti-compatible command line. Calls block until the child exits.
#[derive(Debug, Clone)]
pub struct WapitiEngine {
    binary: PathBuf,
}

impl WapitiEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn run(&self, args: Vec<OsString>) -> PipelineResult<()> {
        let rendered = std::iter::once(self.binary.as_os_str().to_os_string())
            .chain(args.iter().cloned())
            .map(|part| part.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ");
        debug!(command = %rendered, "running sequence tagger");

        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .map_err(|err| PipelineError::EngineFailed {
                command: rendered.clone(),
                status: "not started".to_string(),
                stderr: err.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::EngineFailed {
                command: rendered,
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(())
    }
}

impl SequenceTagger for WapitiEngine {
    fn train(&self, patterns: &Path, train: &Path, model: &Path) -> PipelineResult<()> {
        info!(train = %train.display(), model = %model.display(), "training model");
        self.run(vec![
            "train".into(),
            "-p".into(),
            patterns.into(),
            train.into(),
            model.into(),
        ])
    }

    fn label(&self, model: &Path, test: &Path, result: &Path) -> PipelineResult<()> {
        info!(test = %test.display(), result = %result.display(), "labelling test file");
        self.run(vec![
            "label".into(),
            "-m".into(),
            model.into(),
            "-s".into(),
            "-p".into(),
            test.into(),
            result.into(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{SequenceTagger, WapitiEngine};
    use crate::error::PipelineError;

    #[test]
    fn missing_binary_reports_engine_failure() {
        let engine = WapitiEngine::new("definitely-not-a-real-tagger-binary");
        let err = engine
            .train(Path::new("p"), Path::new("t"), Path::new("m"))
            .expect_err("binary does not exist");
        match err {
            PipelineError::EngineFailed { command, status, .. } => {
                assert!(command.starts_with("definitely-not-a-real-tagger-binary train -p p t m"));
                assert_eq!(status, "not started");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn labelling_requests_posterior_scores() {
        let engine = WapitiEngine::new("definitely-not-a-real-tagger-binary");
        let err = engine
            .label(Path::new("m"), Path::new("t"), Path::new("r"))
            .expect_err("binary does not exist");
        match err {
            PipelineError::EngineFailed { command, .. } => {
                assert_eq!(command, "definitely-not-a-real-tagger-binary label -m m -s -p t r");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_decides_success() {
        let ok = WapitiEngine::new("true");
        assert!(ok.label(Path::new("m"), Path::new("t"), Path::new("r")).is_ok());

        let failing = WapitiEngine::new("false");
        assert!(matches!(
            failing.label(Path::new("m"), Path::new("t"), Path::new("r")),
            Err(PipelineError::EngineFailed { .. })
        ));
    }
}
