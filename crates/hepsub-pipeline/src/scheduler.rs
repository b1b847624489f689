//! The seam between stages and the batch system.

use camino::{Utf8Path, Utf8PathBuf};
use hepsub_slurm::{JobId, SbatchError, submit_job};

/// Accepts a finished job script and returns the id the job runs under.
#[allow(async_fn_in_trait)]
pub trait Scheduler {
    async fn submit(&mut self, script: &Utf8Path) -> Result<JobId, SbatchError>;
}

/// Submits through `sbatch`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sbatch;

impl Scheduler for Sbatch {
    async fn submit(&mut self, script: &Utf8Path) -> Result<JobId, SbatchError> {
        submit_job(script).await
    }
}

/// Keeps the scripts on disk and hands out consecutive fake job ids, so
/// dependency chains can be inspected without a cluster.
#[derive(Debug, Clone)]
pub struct DryRun {
    next_id: u64,
    submitted: Vec<Utf8PathBuf>,
}

impl Default for DryRun {
    fn default() -> Self {
        Self {
            next_id: 1,
            submitted: Vec::new(),
        }
    }
}

impl DryRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts seen so far, in submission order.
    pub fn submitted(&self) -> &[Utf8PathBuf] {
        &self.submitted
    }
}

impl Scheduler for DryRun {
    async fn submit(&mut self, script: &Utf8Path) -> Result<JobId, SbatchError> {
        let job_id = JobId(self.next_id);
        self.next_id += 1;
        self.submitted.push(script.to_path_buf());
        tracing::info!("Dry run: not submitting {} (placeholder job id {})", script, job_id);
        Ok(job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_ids_increase() {
        let mut scheduler = DryRun::new();
        let first = scheduler.submit(Utf8Path::new("/a/jobscript.sh")).await.unwrap();
        let second = scheduler.submit(Utf8Path::new("/a/jobscript_merge.sh")).await.unwrap();
        assert_eq!(first, JobId(1));
        assert_eq!(second, JobId(2));
        assert_eq!(scheduler.submitted().len(), 2);
    }
}
