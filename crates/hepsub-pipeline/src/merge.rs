//! Merge stage: combine the per-slot ROOT files of one output directory.

use crate::context::SubmitContext;
use crate::error::PipelineError;
use crate::scheduler::Scheduler;
use crate::stage::{Payload, write_job_script};
use camino::{Utf8Path, Utf8PathBuf};
use hepsub_core::ProcessLauncher;
use hepsub_slurm::{JobId, JobSpec};

pub const MERGE_SCRIPT: &str = "jobscript_merge.sh";
pub const MERGE_WORKER: &str = "run_merge.sh";
pub const MERGE_TIME_LIMIT: &str = "01:00:00";
pub const MERGE_MEMORY: &str = "2G";

#[derive(Debug, Clone)]
pub struct MergeRequest {
    pub work_dir: Utf8PathBuf,
    pub root_file: String,
    pub dependency: Option<JobId>,
    pub queue: String,
}

/// Write the merge job script for `request` and return its path.
pub fn create_merge_script(
    ctx: &SubmitContext,
    request: &MergeRequest,
) -> Result<Utf8PathBuf, PipelineError> {
    let work_dir = &request.work_dir;
    if !work_dir.is_dir() {
        return Err(PipelineError::MissingInput(work_dir.clone()));
    }

    let spec = JobSpec::new(
        "merge_sim",
        work_dir.join("merge.log"),
        MERGE_TIME_LIMIT,
        MERGE_MEMORY,
    )
    .configure_from(&ctx.profile)
    .with_workdir(work_dir.as_path())
    .with_dependency(request.dependency)
    .with_partition(&request.queue);

    let launcher = ProcessLauncher::new(
        ctx.worker_script(MERGE_WORKER),
        [work_dir.as_str(), request.root_file.as_str()],
    )
    .for_cluster(&ctx.profile, &ctx.repository);

    write_job_script(
        &work_dir.join(MERGE_SCRIPT),
        spec,
        &Payload {
            start_message: None,
            setup: None,
            launcher: &launcher,
            done_message: "Done ...",
        },
    )
}

/// Submit a merge job, optionally waiting on an upstream job.
pub async fn submit_merge<S: Scheduler>(
    ctx: &SubmitContext,
    scheduler: &mut S,
    request: &MergeRequest,
) -> Result<JobId, PipelineError> {
    let script = create_merge_script(ctx, request)?;
    match request.dependency {
        Some(dependency) => tracing::info!(
            "Submitting merge of {} in {} after job {}",
            request.root_file,
            request.work_dir,
            dependency
        ),
        None => tracing::info!("Submitting merge of {} in {}", request.root_file, request.work_dir),
    }
    Ok(scheduler.submit(&script).await?)
}

/// Submit one merge job for every bin directory below `base`.
pub async fn submit_merge_many<S: Scheduler>(
    ctx: &SubmitContext,
    scheduler: &mut S,
    base: &Utf8Path,
    root_file: &str,
    queue: &str,
) -> Result<Vec<JobId>, PipelineError> {
    let mut job_ids = Vec::new();
    for work_dir in crate::sweep::bin_directories(base)? {
        tracing::info!("Submit merging for {}", work_dir);
        let request = MergeRequest {
            work_dir,
            root_file: root_file.to_string(),
            dependency: None,
            queue: queue.to_string(),
        };
        job_ids.push(submit_merge(ctx, scheduler, &request).await?);
    }
    Ok(job_ids)
}
