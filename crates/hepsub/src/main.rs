//! hepsub - event generator productions on SLURM.

use camino::Utf8PathBuf;
use clap::Parser;
use hepsub_cli::{Args, Command, exit_code};
use hepsub_core::{ClusterRegistry, read_hostname};
use hepsub_pipeline::{
    DryRun, PipelineJobs, Sbatch, Scheduler, SubmitContext, absolute_path, run_task, store_output,
    submit_analysis, submit_analysis_many, submit_merge, submit_merge_many, submit_pythia,
    submit_pythia_many, submit_simulation, submit_sweep,
};
use miette::{IntoDiagnostic, Result, WrapErr};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // Usage errors exit with 1 like every other failure.
            let _ = err.print();
            std::process::exit(exit_code(&err));
        }
    };
    init_logging(args.debug);
    run(args).await
}

/// Log to stderr; `RUST_LOG` overrides the level chosen by `--debug`.
fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<()> {
    // Neither needs a cluster.
    match &args.command {
        Command::StoreOutput(store) => {
            let input = absolute_path(&store.inputdir).into_diagnostic()?;
            let output = absolute_path(&store.outputdir).into_diagnostic()?;
            let stored = store_output(&input, &output, &store.rootfile).into_diagnostic()?;
            tracing::info!("Stored {} file(s) in {}", stored.len(), output);
            return Ok(());
        }
        Command::RunTask(task) => {
            let request = task.request().into_diagnostic()?;
            return run_task(&request).await.into_diagnostic();
        }
        _ => {}
    }

    let ctx = submit_context(&args)?;
    tracing::debug!("Using cluster {} with repository {}", ctx.profile.name(), ctx.repository);
    if args.dry_run {
        let mut scheduler = DryRun::new();
        submit(&ctx, &mut scheduler, &args.command).await?;
        tracing::info!(
            "Dry run: {} job script(s) written, nothing submitted",
            scheduler.submitted().len()
        );
        Ok(())
    } else {
        submit(&ctx, &mut Sbatch, &args.command).await
    }
}

fn submit_context(args: &Args) -> Result<SubmitContext> {
    let mut registry = ClusterRegistry::builtin();
    if let Some(config) = &args.cluster_config {
        registry
            .load_file(config)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to load cluster profiles from {}", config))?;
    }
    let profile = registry
        .resolve(args.cluster.as_deref(), &read_hostname())
        .into_diagnostic()?;
    let repository = match &args.repo {
        Some(repo) => absolute_path(repo).into_diagnostic()?,
        None => executable_dir()?,
    };
    Ok(SubmitContext::new(profile, repository))
}

fn executable_dir() -> Result<Utf8PathBuf> {
    let exe = std::env::current_exe().into_diagnostic()?;
    let exe = Utf8PathBuf::try_from(exe).into_diagnostic()?;
    exe.parent()
        .map(|dir| dir.to_path_buf())
        .ok_or_else(|| miette::miette!("Cannot determine directory of {}", exe))
}

async fn submit<S: Scheduler>(
    ctx: &SubmitContext,
    scheduler: &mut S,
    command: &Command,
) -> Result<()> {
    match command {
        Command::Simulate(simulate) => {
            let request = simulate.request().into_diagnostic()?;
            let jobs = submit_simulation(ctx, scheduler, &request).await.into_diagnostic()?;
            report(&[jobs]);
        }
        Command::Process(process) => {
            let sweep = process.sweep().into_diagnostic()?;
            let bins = process.selected_bins().into_diagnostic()?;
            let template = process.template().into_diagnostic()?;
            let jobs = submit_sweep(ctx, scheduler, sweep, &bins, &template)
                .await
                .into_diagnostic()?;
            report(&jobs);
        }
        Command::Pythia(pythia) => {
            let request = pythia.request().into_diagnostic()?;
            let jobs = submit_pythia(ctx, scheduler, &request).await.into_diagnostic()?;
            report(&[jobs]);
        }
        Command::PythiaMany(pythia) => {
            let bins = pythia.selected_bins().into_diagnostic()?;
            let template = pythia.template().into_diagnostic()?;
            let jobs = submit_pythia_many(ctx, scheduler, &bins, &template)
                .await
                .into_diagnostic()?;
            report(&jobs);
        }
        Command::Analyze(analyze) => {
            let request = analyze.request().into_diagnostic()?;
            let jobs = submit_analysis(ctx, scheduler, &request).await.into_diagnostic()?;
            report(&[jobs]);
        }
        Command::AnalyzeMany(analyze) => {
            let request = analyze.request().into_diagnostic()?;
            let jobs = submit_analysis_many(ctx, scheduler, &request).await.into_diagnostic()?;
            report(&jobs);
        }
        Command::Merge(merge) => {
            let request = merge.request().into_diagnostic()?;
            let job_id = submit_merge(ctx, scheduler, &request).await.into_diagnostic()?;
            tracing::debug!("Merge job {}", job_id);
        }
        Command::MergeMany(merge) => {
            let base = merge.base().into_diagnostic()?;
            let job_ids = submit_merge_many(ctx, scheduler, &base, &merge.rootfile, &merge.queue)
                .await
                .into_diagnostic()?;
            tracing::info!("Submitted {} merge job(s)", job_ids.len());
        }
        Command::StoreOutput(_) | Command::RunTask(_) => {}
    }
    Ok(())
}

fn report(jobs: &[PipelineJobs]) {
    for job in jobs {
        match job.merge {
            Some(merge) => tracing::debug!("Job {} followed by merge {}", job.stage, merge),
            None => tracing::debug!("Job {}", job.stage),
        }
    }
}
