//! Simulation stage: runcard, job script and submission for one output
//! directory, optionally followed by a merge.

use crate::context::{SubmitContext, ensure_dir};
use crate::error::PipelineError;
use crate::merge::{MergeRequest, submit_merge};
use crate::scheduler::Scheduler;
use crate::stage::{
    JOB_SCRIPT, Payload, PipelineJobs, SEED_FROM_JOB_ID, array_log_file, write_job_script,
};
use camino::{Utf8Path, Utf8PathBuf};
use hepsub_core::ProcessLauncher;
use hepsub_engine::{
    Generator, ProcessSpec, RuncardError, SimulationParam, Tune, encode, herwig, write_runcard,
};
use hepsub_slurm::{JobId, JobSpec};

pub const SIMULATION_WORKER: &str = "simrun.sh";
pub const PYTHIA_WORKER: &str = "run_pythia_general.sh";
pub const HEPMC_FILE: &str = "events.hepmc";

/// A Herwig or Sherpa production in one output directory.
#[derive(Debug, Clone)]
pub struct SimulationRequest {
    pub generator: Generator,
    pub output_dir: Utf8PathBuf,
    /// Number of array slots
    pub jobs: u32,
    /// Events per slot
    pub events: u64,
    pub beam_energy: f64,
    pub process: ProcessSpec,
    pub tune: Tune,
    pub pdf_set: String,
    pub macro_name: String,
    pub time_limit: String,
    pub mem_limit: String,
    /// Chain a merge of this file after the simulation
    pub root_file: Option<String>,
    pub queue: String,
}

/// A Pythia production for one pt-hard bin.
#[derive(Debug, Clone)]
pub struct PythiaRequest {
    pub output_dir: Utf8PathBuf,
    pub jobs: u32,
    pub events: u64,
    pub beam_energy: f64,
    pub pt_hard_bin: u32,
    pub macro_name: String,
    pub time_limit: String,
    pub mem_limit: String,
    pub root_file: Option<String>,
    pub queue: String,
}

/// Write runcard and job script for `request`, returning the script path.
pub fn create_simulation_script(
    ctx: &SubmitContext,
    request: &SimulationRequest,
) -> Result<Utf8PathBuf, PipelineError> {
    let generator = request.generator;
    let runcard_name = generator
        .runcard_name()
        .ok_or_else(|| RuncardError::NoRuncard(generator.to_string()))?;
    let params = SimulationParam::new(request.process)
        .with_beam_energy(request.beam_energy)
        .with_events(request.events)
        .with_pdf_set(request.pdf_set.as_str())
        .with_hepmc_file(HEPMC_FILE)
        .with_tune(request.tune);
    // Rejected processes must not leave a directory behind.
    let lines = encode(generator, &params)?;

    let output_dir = &request.output_dir;
    ensure_dir(output_dir)?;
    let runcard = output_dir.join(runcard_name);
    write_runcard(&runcard, &lines)?;
    tracing::debug!("Runcard for {} written to {}", request.process, runcard);

    let inputs = match generator {
        Generator::Herwig => herwig::input_files(&runcard, &ctx.repository)?,
        _ => vec![runcard.clone()],
    };

    let macro_path = ctx.resolve_macro(&request.macro_name);
    let launcher = ProcessLauncher::new(
        ctx.worker_script(SIMULATION_WORKER),
        [
            ctx.profile.name().to_string(),
            generator.to_string(),
            runcard_name.to_string(),
            request.events.to_string(),
            "$SEED".to_string(),
            macro_path.to_string(),
        ],
    )
    .with_log_file(format!("run_{}.log", generator))
    .for_cluster(&ctx.profile, &ctx.repository);

    let spec = JobSpec::new(
        generator.name(),
        array_log_file(output_dir)?,
        request.time_limit.as_str(),
        request.mem_limit.as_str(),
    )
    .with_array_size(request.jobs)
    .with_partition(&request.queue)
    .configure_from(&ctx.profile)
    .with_workdir(output_dir.as_path())
    .with_stage_files(inputs);

    write_job_script(&output_dir.join(JOB_SCRIPT), spec, &simulation_payload(&launcher))
}

/// Write the job script for a Pythia production.
pub fn create_pythia_script(
    ctx: &SubmitContext,
    request: &PythiaRequest,
) -> Result<Utf8PathBuf, PipelineError> {
    let output_dir = &request.output_dir;
    ensure_dir(output_dir)?;

    let macro_path = ctx.resolve_macro(&request.macro_name);
    let launcher = ProcessLauncher::new(
        ctx.worker_script(PYTHIA_WORKER),
        [
            request.events.to_string(),
            "$SEED".to_string(),
            (2. * request.beam_energy).to_string(),
            request.pt_hard_bin.to_string(),
            macro_path.to_string(),
        ],
    )
    .with_log_file("run_pythia.log")
    .for_cluster(&ctx.profile, &ctx.repository);

    let spec = JobSpec::new(
        Generator::Pythia.name(),
        array_log_file(output_dir)?,
        request.time_limit.as_str(),
        request.mem_limit.as_str(),
    )
    .with_partition(&request.queue)
    .with_array_size(request.jobs)
    .with_workdir(output_dir.as_path())
    .configure_from(&ctx.profile);

    write_job_script(&output_dir.join(JOB_SCRIPT), spec, &simulation_payload(&launcher))
}

fn simulation_payload(launcher: &ProcessLauncher) -> Payload<'_> {
    Payload {
        start_message: Some("Running simulation ..."),
        setup: Some(SEED_FROM_JOB_ID),
        launcher,
        done_message: "Job done ...",
    }
}

/// Submit a Herwig or Sherpa production and, if requested, its merge.
pub async fn submit_simulation<S: Scheduler>(
    ctx: &SubmitContext,
    scheduler: &mut S,
    request: &SimulationRequest,
) -> Result<PipelineJobs, PipelineError> {
    let script = create_simulation_script(ctx, request)?;
    tracing::info!(
        "Submitting {} {} production with {} slots in {}",
        request.generator,
        request.process,
        request.jobs,
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

/// Submit a Pythia production and, if requested, its merge.
pub async fn submit_pythia<S: Scheduler>(
    ctx: &SubmitContext,
    scheduler: &mut S,
    request: &PythiaRequest,
) -> Result<PipelineJobs, PipelineError> {
    let script = create_pythia_script(ctx, request)?;
    tracing::info!(
        "Submitting pythia pt-hard bin {} with {} slots in {}",
        request.pt_hard_bin,
        request.jobs,
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

pub(crate) async fn chain_merge<S: Scheduler>(
    ctx: &SubmitContext,
    scheduler: &mut S,
    work_dir: &Utf8Path,
    root_file: Option<&str>,
    queue: &str,
    upstream: JobId,
) -> Result<Option<JobId>, PipelineError> {
    let Some(root_file) = root_file else {
        return Ok(None);
    };
    let request = MergeRequest {
        work_dir: work_dir.to_path_buf(),
        root_file: root_file.to_string(),
        dependency: Some(upstream),
        queue: queue.to_string(),
    };
    Ok(Some(submit_merge(ctx, scheduler, &request).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::testing::Recorder;
    use hepsub_core::ClusterProfile;
    use std::fs;
    use tempfile::TempDir;

    fn request(output_dir: &Utf8Path, process: &str) -> SimulationRequest {
        SimulationRequest {
            generator: Generator::Herwig,
            output_dir: output_dir.to_path_buf(),
            jobs: 10,
            events: 50000,
            beam_energy: 6500.,
            process: process.parse().unwrap(),
            tune: Tune::SoftTune,
            pdf_set: "CT14lo".to_string(),
            macro_name: "makeJetSpectrumAndSoftDrop.C".to_string(),
            time_limit: "10:00:00".to_string(),
            mem_limit: "4G".to_string(),
            root_file: None,
            queue: "gpu".to_string(),
        }
    }

    #[tokio::test]
    async fn test_herwig_submission() {
        let temp = TempDir::new().unwrap();
        let out = Utf8Path::from_path(temp.path()).unwrap().join("mb");
        let ctx = SubmitContext::new(ClusterProfile::b587(), "/opt/hepsub");
        let mut recorder = Recorder::default();

        let jobs = submit_simulation(&ctx, &mut recorder, &request(&out, "mb")).await.unwrap();
        assert_eq!(jobs, PipelineJobs { stage: JobId(4821), merge: None });
        assert_eq!(recorder.scripts.len(), 1);

        let runcard = fs::read_to_string(out.join("herwig.in")).unwrap();
        assert!(runcard.starts_with("read snippets/PPCollider.in\n"));
        assert!(runcard.contains("Energy 13000.000000\n"));
        assert!(out.join("logs").is_dir());

        let lines = recorder.lines(0);
        assert!(lines.contains(&"#SBATCH --array=0-9".to_string()));
        assert!(lines.contains(&"#SBATCH -J herwig".to_string()));
        assert!(lines.contains(&format!("#SBATCH -o {}/logs/joboutput_%a.log", out)));
        assert!(lines.contains(&format!("cp {0}/herwig.in $WORKDIR/herwig.in", out)));
        let seed = lines.iter().position(|l| l == SEED_FROM_JOB_ID).unwrap();
        assert_eq!(
            lines[seed + 1],
            "/opt/hepsub/simrun.sh B587 herwig herwig.in 50000 $SEED \
             /opt/hepsub/macros/makeJetSpectrumAndSoftDrop.C &> run_herwig.log"
        );
        assert_eq!(lines[seed + 2], format!("rm -f {}/jobscript.sh", out));
    }

    #[tokio::test]
    async fn test_root_file_chains_merge() {
        let temp = TempDir::new().unwrap();
        let out = Utf8Path::from_path(temp.path()).unwrap().join("bin3");
        let ctx = SubmitContext::new(ClusterProfile::cades(), "/opt/hepsub");
        let mut recorder = Recorder::default();

        let mut req = request(&out, "pthard_3");
        req.root_file = Some("jetspectrum.root".to_string());
        let jobs = submit_simulation(&ctx, &mut recorder, &req).await.unwrap();

        assert_eq!(jobs.stage, JobId(4821));
        assert_eq!(jobs.merge, Some(JobId(4822)));
        let merge = recorder.lines(1);
        assert!(merge.contains(&"#SBATCH --dependency=4821".to_string()));
        assert!(recorder.lines(0).iter().any(|l| l.starts_with(
            "/opt/hepsub/containerwrapper.sh singularity exec -B /nfs/home:/nfs/home"
        )));
    }

    #[tokio::test]
    async fn test_sherpa_submission() {
        let temp = TempDir::new().unwrap();
        let out = Utf8Path::from_path(temp.path()).unwrap().to_path_buf();
        let ctx = SubmitContext::new(ClusterProfile::b587(), "/opt/hepsub");
        let mut recorder = Recorder::default();

        let mut req = request(&out, "dijet_lo");
        req.generator = Generator::Sherpa;
        submit_simulation(&ctx, &mut recorder, &req).await.unwrap();

        assert!(out.join("Run.dat").is_file());
        let lines = recorder.lines(0);
        assert!(lines.contains(&"#SBATCH -J sherpa".to_string()));
        assert!(lines.iter().any(|l| l.contains("simrun.sh B587 sherpa Run.dat")));
    }

    #[tokio::test]
    async fn test_rejected_runcard_submits_nothing() {
        let temp = TempDir::new().unwrap();
        let out = Utf8Path::from_path(temp.path()).unwrap().join("mb");
        let ctx = SubmitContext::new(ClusterProfile::b587(), "/opt/hepsub");
        let mut recorder = Recorder::default();

        let mut req = request(&out, "mb");
        req.generator = Generator::Sherpa;
        let result = submit_simulation(&ctx, &mut recorder, &req).await;
        assert!(matches!(result, Err(PipelineError::Runcard(_))));
        assert!(recorder.scripts.is_empty());
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_pythia_submission() {
        let temp = TempDir::new().unwrap();
        let out = Utf8Path::from_path(temp.path()).unwrap().join("bin5");
        let ctx = SubmitContext::new(ClusterProfile::b587(), "/opt/hepsub");
        let mut recorder = Recorder::default();

        let request = PythiaRequest {
            output_dir: out.clone(),
            jobs: 2,
            events: 1000,
            beam_energy: 6500.,
            pt_hard_bin: 5,
            macro_name: "/abs/macro.C".to_string(),
            time_limit: "14:00:00".to_string(),
            mem_limit: "4G".to_string(),
            root_file: None,
            queue: String::new(),
        };
        submit_pythia(&ctx, &mut recorder, &request).await.unwrap();

        let lines = recorder.lines(0);
        assert!(lines.contains(&"#SBATCH -J pythia".to_string()));
        assert!(lines.contains(
            &"/opt/hepsub/run_pythia_general.sh 1000 $SEED 13000 5 /abs/macro.C &> run_pythia.log"
                .to_string()
        ));
        assert!(!lines.iter().any(|l| l.starts_with("cp ")));
    }
}
