//! Analysis stage: run a ROOT macro over existing HepMC output.
//!
//! Input files are split into chunks, one per array slot. Each chunk gets a
//! `<%04d>/inputfiles.txt` in the output directory, which is also the
//! slot's `$WORKDIR`.

use crate::context::{SubmitContext, ensure_dir};
use crate::error::PipelineError;
use crate::scheduler::Scheduler;
use crate::simulate::chain_merge;
use crate::stage::{JOB_SCRIPT, Payload, PipelineJobs, array_log_file, write_job_script};
use camino::{Utf8Path, Utf8PathBuf};
use hepsub_core::ProcessLauncher;
use hepsub_slurm::JobSpec;
use std::fs;
use walkdir::WalkDir;

pub const ANALYSIS_WORKER: &str = "run_analysis_general.sh";
pub const FILE_LIST: &str = "inputfiles.txt";

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub input_dir: Utf8PathBuf,
    pub output_dir: Utf8PathBuf,
    pub files_per_job: usize,
    pub macro_name: String,
    pub time_limit: String,
    pub mem_limit: String,
    pub root_file: Option<String>,
    pub queue: String,
}

/// All files below `input_dir` with "hepmc" in their name, sorted.
pub fn find_hepmc_files(input_dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, PipelineError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(input_dir) {
        let entry = entry.map_err(|e| PipelineError::Io {
            path: input_dir.to_path_buf(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() || !entry.file_name().to_string_lossy().contains("hepmc") {
            continue;
        }
        let path = Utf8PathBuf::try_from(entry.into_path())
            .map_err(|e| PipelineError::NonUtf8Path(e.into_path_buf()))?;
        files.push(path);
    }
    files.sort();
    Ok(files)
}

/// Write one `inputfiles.txt` per chunk of `files_per_job` files.
///
/// Returns the number of chunks.
pub fn write_chunks(
    output_dir: &Utf8Path,
    files: &[Utf8PathBuf],
    files_per_job: usize,
) -> Result<u32, PipelineError> {
    let mut nchunk = 0;
    for chunk in files.chunks(files_per_job.max(1)) {
        let chunk_dir = output_dir.join(format!("{:04}", nchunk));
        ensure_dir(&chunk_dir)?;
        let list_path = chunk_dir.join(FILE_LIST);
        let content: String = chunk.iter().map(|f| format!("{}\n", f)).collect();
        fs::write(&list_path, content).map_err(PipelineError::io(&list_path))?;
        nchunk += 1;
    }
    Ok(nchunk)
}

/// Prepare chunk directories and the job script for `request`.
pub fn create_analysis_script(
    ctx: &SubmitContext,
    request: &AnalysisRequest,
) -> Result<Utf8PathBuf, PipelineError> {
    if !request.input_dir.is_dir() {
        return Err(PipelineError::MissingInput(request.input_dir.clone()));
    }
    let files = find_hepmc_files(&request.input_dir)?;
    if files.is_empty() {
        return Err(PipelineError::NoInputFiles(request.input_dir.clone()));
    }
    tracing::debug!("Found {} hepmc files below {}", files.len(), request.input_dir);

    let output_dir = &request.output_dir;
    ensure_dir(output_dir)?;
    let nchunk = write_chunks(output_dir, &files, request.files_per_job)?;

    let macro_path = ctx.resolve_macro(&request.macro_name);
    let launcher = ProcessLauncher::new(
        ctx.worker_script(ANALYSIS_WORKER),
        [
            format!("$WORKDIR/{}", FILE_LIST),
            "$WORKDIR".to_string(),
            macro_path.to_string(),
        ],
    )
    .with_log_file("run_analysis.log")
    .for_cluster(&ctx.profile, &ctx.repository);

    let spec = JobSpec::new(
        "hepmc_analysis",
        array_log_file(output_dir)?,
        request.time_limit.as_str(),
        request.mem_limit.as_str(),
    )
    .configure_from(&ctx.profile)
    .with_partition(&request.queue)
    .with_array_size(nchunk)
    .with_workdir(output_dir.as_path());

    write_job_script(
        &output_dir.join(JOB_SCRIPT),
        spec,
        &Payload {
            start_message: Some("Starting analysis in current workdir ..."),
            setup: None,
            launcher: &launcher,
            done_message: "Job done ...",
        },
    )
}

/// Submit an analysis and, if requested, its merge.
pub async fn submit_analysis<S: Scheduler>(
    ctx: &SubmitContext,
    scheduler: &mut S,
    request: &AnalysisRequest,
) -> Result<PipelineJobs, PipelineError> {
    let script = create_analysis_script(ctx, request)?;
    tracing::info!(
        "Submitting analysis of {} to {}",
        request.input_dir,
        request.output_dir
    );
    let stage = scheduler.submit(&script).await?;
    let merge = chain_merge(
        ctx,
        scheduler,
        &request.output_dir,
        request.root_file.as_deref(),
        &request.queue,
        stage,
    )
    .await?;
    Ok(PipelineJobs { stage, merge })
}

/// Analyse every bin directory of `request.input_dir` into the directory of
/// the same name below `request.output_dir`.
pub async fn submit_analysis_many<S: Scheduler>(
    ctx: &SubmitContext,
    scheduler: &mut S,
    request: &AnalysisRequest,
) -> Result<Vec<PipelineJobs>, PipelineError> {
    if !request.input_dir.is_dir() {
        return Err(PipelineError::MissingInput(request.input_dir.clone()));
    }
    let mut jobs = Vec::new();
    for input_dir in crate::sweep::bin_directories(&request.input_dir)? {
        let Some(name) = input_dir.file_name() else {
            continue;
        };
        let output_dir = request.output_dir.join(name);
        tracing::info!("Submit analysis for {} to outputdir {}", input_dir, output_dir);
        let bin_request = AnalysisRequest {
            input_dir: input_dir.clone(),
            output_dir,
            ..request.clone()
        };
        jobs.push(submit_analysis(ctx, scheduler, &bin_request).await?);
    }
    Ok(jobs)
}
