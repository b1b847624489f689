//! Submit job scripts via sbatch.

use crate::types::JobId;
use camino::Utf8Path;
use hepsub_parsers::{last_token, run_command};
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum SbatchError {
    #[error("Failed to execute sbatch: {0}")]
    ExecutionError(String),
    #[error("Failed to parse job id from sbatch output: {0:?}")]
    InvalidJobId(String),
}

/// Extract the job id from sbatch output ("Submitted batch job 4821").
///
/// The id is the last whitespace separated token; anything else is an error.
pub fn parse_job_id(stdout: &str) -> Result<JobId, SbatchError> {
    last_token(stdout)
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| SbatchError::InvalidJobId(stdout.trim().to_string()))
}

/// Submit a job script and return the id assigned by SLURM.
pub async fn submit_job(script: &Utf8Path) -> Result<JobId, SbatchError> {
    let mut cmd = Command::new("sbatch");
    cmd.arg(script.as_str());

    let stdout = run_command(&mut cmd, "sbatch")
        .await
        .map_err(|e| SbatchError::ExecutionError(e.to_string()))?;

    let job_id = parse_job_id(&stdout)?;
    tracing::debug!("sbatch accepted {} as job {}", script, job_id);
    println!("Submitted batch job {}", job_id);
    Ok(job_id)
}
