//! Pieces shared by the submission stages.

use crate::context::ensure_dir;
use crate::error::PipelineError;
use camino::{Utf8Path, Utf8PathBuf};
use hepsub_core::ProcessLauncher;
use hepsub_slurm::{JobId, JobScript, JobSpec};

pub const JOB_SCRIPT: &str = "jobscript.sh";
pub const LOG_DIR: &str = "logs";
pub const SEED_FROM_JOB_ID: &str = "SEED=$SLURM_JOBID";

/// Job ids of one pipeline: the stage itself and the merge chained after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineJobs {
    pub stage: JobId,
    pub merge: Option<JobId>,
}

/// Create `<dir>/logs` and return the per-slot log pattern inside it.
pub(crate) fn array_log_file(output_dir: &Utf8Path) -> Result<Utf8PathBuf, PipelineError> {
    let log_dir = output_dir.join(LOG_DIR);
    ensure_dir(&log_dir)?;
    Ok(log_dir.join("joboutput_%a.log"))
}

/// What a job does once its working directory is set up.
pub(crate) struct Payload<'a> {
    pub start_message: Option<&'a str>,
    pub setup: Option<&'a str>,
    pub launcher: &'a ProcessLauncher,
    pub done_message: &'a str,
}

/// Write a complete job script: header, payload, self-removal, done marker.
pub(crate) fn write_job_script(
    path: &Utf8Path,
    spec: JobSpec,
    payload: &Payload<'_>,
) -> Result<Utf8PathBuf, PipelineError> {
    let mut script = JobScript::new(spec);
    script.init(path)?;
    if let Some(message) = payload.start_message {
        script.message(message)?;
    }
    if let Some(setup) = payload.setup {
        script.write_instruction(setup)?;
    }
    script.launch(payload.launcher)?;
    script.remove(path)?;
    script.message(payload.done_message)?;
    Ok(script.finish()?)
}
