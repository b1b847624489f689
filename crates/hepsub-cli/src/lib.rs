//! CLI argument parsing for hepsub.
//!
//! Values that need domain validation (processes, generators, limits) are
//! taken as strings here and checked when a request is built, so a bad value
//! is reported like any other submission error.

use camino::{Utf8Path, Utf8PathBuf};
use clap::error::ErrorKind;
use clap::{Args as ClapArgs, Parser, Subcommand};
use hepsub_engine::{Generator, ProcessSpec, RuncardError, Tune, pt_hard_limits};
use hepsub_parsers::{non_empty_string, normalize_memory_limit, normalize_time_limit};
use hepsub_pipeline::{
    AnalysisRequest, MergeRequest, PipelineError, PythiaRequest, SimulationRequest, Sweep,
    TaskRequest, absolute_path,
};
use hepsub_slurm::JobId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid time limit: {0}")]
    InvalidTimeLimit(String),
    #[error("Invalid memory limit: {0}")]
    InvalidMemoryLimit(String),
    #[error(transparent)]
    Runcard(#[from] RuncardError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Process exit code for a failed parse: help and version requests succeed,
/// every usage error is a plain failure.
pub fn exit_code(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

#[derive(Parser, Debug)]
#[command(name = "hepsub", version)]
#[command(about = "Submit event generator productions and their analysis to SLURM")]
pub struct Args {
    /// Enable debug messages
    #[arg(long, global = true)]
    pub debug: bool,

    /// Cluster profile to use instead of detecting it from the hostname
    #[arg(long, global = true, env = "HEPSUB_CLUSTER")]
    pub cluster: Option<String>,

    /// JSON file with additional cluster profiles
    #[arg(long, global = true)]
    pub cluster_config: Option<Utf8PathBuf>,

    /// Directory holding worker scripts, macros and HerwigIn
    /// (default: directory of the executable)
    #[arg(long, global = true, env = "HEPSUB_REPO")]
    pub repo: Option<Utf8PathBuf>,

    /// Write job scripts without submitting them
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Herwig or Sherpa production in one output directory
    Simulate(SimulateArgs),
    /// Binned production, one subdirectory per pt-hard or ktmin bin
    Process(ProcessArgs),
    /// Pythia production for one pt-hard bin
    Pythia(PythiaArgs),
    /// Pythia production for all pt-hard bins
    PythiaMany(PythiaManyArgs),
    /// Run an analysis macro over HepMC files
    Analyze(AnalyzeArgs),
    /// Analyze every bin subdirectory of a production
    AnalyzeMany(AnalyzeArgs),
    /// Merge the ROOT files of one output directory
    Merge(MergeArgs),
    /// Merge every bin subdirectory of a production
    MergeMany(MergeManyArgs),
    /// Copy merged ROOT files to a persistent location
    StoreOutput(StoreOutputArgs),
    /// Run generator and analysis inside a job slot
    RunTask(RunTaskArgs),
}

/// Options shared by all stages that run a payload.
#[derive(ClapArgs, Debug, Clone)]
pub struct JobArgs {
    /// Analysis macro, name in the macro directory or path
    #[arg(short, long = "macro", default_value = "makeJetSpectrumAndSoftDrop.C")]
    pub macro_name: String,

    /// ROOT file to merge after the stage (optional)
    #[arg(short, long)]
    pub rootfile: Option<String>,

    /// Queue/partition
    #[arg(short, long, default_value = "gpu")]
    pub queue: String,

    /// Memory limit per slot
    #[arg(long, default_value = "4G")]
    pub mem: String,
}

impl JobArgs {
    fn root_file(&self) -> Option<String> {
        self.rootfile.as_deref().and_then(non_empty_string)
    }

    fn mem_limit(&self) -> Result<String, CliError> {
        normalize_memory_limit(&self.mem)
            .ok_or_else(|| CliError::InvalidMemoryLimit(self.mem.clone()))
    }
}

fn time_limit(value: &str) -> Result<String, CliError> {
    normalize_time_limit(value).ok_or_else(|| CliError::InvalidTimeLimit(value.to_string()))
}

fn output_dir(path: &Utf8Path) -> Result<Utf8PathBuf, CliError> {
    Ok(absolute_path(path)?)
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SimulateArgs {
    /// Output directory
    #[arg(short, long)]
    pub outputdir: Utf8PathBuf,

    /// Number of jobs
    #[arg(short, long, default_value = "10")]
    pub jobs: u32,

    /// Number of events per job
    #[arg(short, long, default_value = "50000")]
    pub nevents: u64,

    /// Beam energy in GeV
    #[arg(short, long, default_value = "6500")]
    pub ebeam: f64,

    /// Process: mb, charm, beauty, dijet_lo, ktmin_<n> or pthard_<bin>
    #[arg(short, long, default_value = "mb")]
    pub process: String,

    /// Event generator (herwig or sherpa)
    #[arg(short, long, default_value = "herwig")]
    pub generator: String,

    /// Max. time per slot
    #[arg(short, long, default_value = "10:00:00")]
    pub time: String,

    /// Underlying event tune (SoftTune or DefaultTune)
    #[arg(short, long, default_value = "SoftTune")]
    pub uetune: String,

    /// PDF set
    #[arg(long, default_value = "CT14lo")]
    pub pdfset: String,

    #[command(flatten)]
    pub job: JobArgs,
}

impl SimulateArgs {
    pub fn request(&self) -> Result<SimulationRequest, CliError> {
        self.request_for(self.process.parse()?)
    }

    fn request_for(&self, process: ProcessSpec) -> Result<SimulationRequest, CliError> {
        Ok(SimulationRequest {
            generator: self.generator.parse()?,
            output_dir: output_dir(&self.outputdir)?,
            jobs: self.jobs,
            events: self.nevents,
            beam_energy: self.ebeam,
            process,
            tune: self.uetune.parse::<Tune>()?,
            pdf_set: self.pdfset.clone(),
            macro_name: self.job.macro_name.clone(),
            time_limit: time_limit(&self.time)?,
            mem_limit: self.job.mem_limit()?,
            root_file: self.job.root_file(),
            queue: self.job.queue.clone(),
        })
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ProcessArgs {
    /// Output base directory
    #[arg(short, long)]
    pub outputdir: Utf8PathBuf,

    /// Number of jobs per bin
    #[arg(short, long, default_value = "1000")]
    pub jobs: u32,

    /// Number of events per job
    #[arg(short, long, default_value = "10000")]
    pub nevents: u64,

    /// Beam energy in GeV
    #[arg(short, long, default_value = "6500")]
    pub ebeam: f64,

    /// Binning (pthard or ktmin)
    #[arg(short, long, default_value = "pthard")]
    pub process: String,

    /// Event generator (herwig or sherpa)
    #[arg(short, long, default_value = "herwig")]
    pub generator: String,

    /// Max. time per slot
    #[arg(short, long, default_value = "10:00:00")]
    pub time: String,

    /// Underlying event tune (SoftTune or DefaultTune)
    #[arg(short, long, default_value = "SoftTune")]
    pub uetune: String,

    /// PDF set
    #[arg(long, default_value = "CT14lo")]
    pub pdfset: String,

    /// Bins to submit, e.g. 3,5,7 (default: all bins of the binning)
    #[arg(long, value_delimiter = ',')]
    pub bins: Vec<u32>,

    #[command(flatten)]
    pub job: JobArgs,
}

impl ProcessArgs {
    pub fn sweep(&self) -> Result<Sweep, CliError> {
        Ok(self.process.parse()?)
    }

    pub fn selected_bins(&self) -> Result<Vec<u32>, CliError> {
        Ok(self.sweep()?.select(&self.bins)?)
    }

    /// Request shared by all bins; the sweep fills in process and directory.
    pub fn template(&self) -> Result<SimulationRequest, CliError> {
        let simulate = SimulateArgs {
            outputdir: self.outputdir.clone(),
            jobs: self.jobs,
            nevents: self.nevents,
            ebeam: self.ebeam,
            process: self.process.clone(),
            generator: self.generator.clone(),
            time: self.time.clone(),
            uetune: self.uetune.clone(),
            pdfset: self.pdfset.clone(),
            job: self.job.clone(),
        };
        simulate.request_for(ProcessSpec::DijetLo)
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PythiaArgs {
    /// Output directory
    #[arg(short, long)]
    pub outputdir: Utf8PathBuf,

    /// Number of jobs
    #[arg(short, long, default_value = "10")]
    pub jobs: u32,

    /// Number of events per job
    #[arg(short, long, default_value = "50000")]
    pub nevents: u64,

    /// Beam energy in GeV
    #[arg(short, long, default_value = "6500")]
    pub ebeam: f64,

    /// Pt-hard bin
    #[arg(short, long)]
    pub pthardbin: u32,

    /// Max. time per slot
    #[arg(short, long, default_value = "10:00:00")]
    pub time: String,

    #[command(flatten)]
    pub job: JobArgs,
}

impl PythiaArgs {
    pub fn request(&self) -> Result<PythiaRequest, CliError> {
        if pt_hard_limits(self.pthardbin).is_none() {
            return Err(RuncardError::InvalidPtHardBin(self.pthardbin).into());
        }
        pythia_request(
            &self.outputdir,
            self.jobs,
            self.nevents,
            self.ebeam,
            self.pthardbin,
            &self.time,
            &self.job,
        )
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PythiaManyArgs {
    /// Output base directory
    #[arg(short, long)]
    pub outputdir: Utf8PathBuf,

    /// Number of jobs per bin
    #[arg(short, long, default_value = "1000")]
    pub jobs: u32,

    /// Number of events per job
    #[arg(short, long, default_value = "10000")]
    pub nevents: u64,

    /// Beam energy in GeV
    #[arg(short, long, default_value = "6500")]
    pub ebeam: f64,

    /// Max. time per slot
    #[arg(short, long, default_value = "14:00:00")]
    pub time: String,

    /// Pt-hard bins to submit, e.g. 3,5,7 (default: all)
    #[arg(long, value_delimiter = ',')]
    pub bins: Vec<u32>,

    #[command(flatten)]
    pub job: JobArgs,
}

impl PythiaManyArgs {
    pub fn selected_bins(&self) -> Result<Vec<u32>, CliError> {
        Ok(Sweep::PtHard.select(&self.bins)?)
    }

    pub fn template(&self) -> Result<PythiaRequest, CliError> {
        pythia_request(
            &self.outputdir,
            self.jobs,
            self.nevents,
            self.ebeam,
            0,
            &self.time,
            &self.job,
        )
    }
}

fn pythia_request(
    outputdir: &Utf8Path,
    jobs: u32,
    events: u64,
    beam_energy: f64,
    pt_hard_bin: u32,
    time: &str,
    job: &JobArgs,
) -> Result<PythiaRequest, CliError> {
    Ok(PythiaRequest {
        output_dir: output_dir(outputdir)?,
        jobs,
        events,
        beam_energy,
        pt_hard_bin,
        macro_name: job.macro_name.clone(),
        time_limit: time_limit(time)?,
        mem_limit: job.mem_limit()?,
        root_file: job.root_file(),
        queue: job.queue.clone(),
    })
}

#[derive(ClapArgs, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Input directory
    #[arg(short, long)]
    pub inputdir: Utf8PathBuf,

    /// Output directory
    #[arg(short, long)]
    pub outputdir: Utf8PathBuf,

    /// Number of files per slot
    #[arg(short, long, visible_alias = "numfiles", default_value = "10")]
    pub nfiles: usize,

    /// Max. time per slot
    #[arg(short, long, visible_alias = "timelimit", default_value = "10:00:00")]
    pub time: String,

    #[command(flatten)]
    pub job: JobArgs,
}

impl AnalyzeArgs {
    pub fn request(&self) -> Result<AnalysisRequest, CliError> {
        Ok(AnalysisRequest {
            input_dir: output_dir(&self.inputdir)?,
            output_dir: output_dir(&self.outputdir)?,
            files_per_job: self.nfiles,
            macro_name: self.job.macro_name.clone(),
            time_limit: time_limit(&self.time)?,
            mem_limit: self.job.mem_limit()?,
            root_file: self.job.root_file(),
            queue: self.job.queue.clone(),
        })
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct MergeArgs {
    /// Output directory
    #[arg(short, long)]
    pub outputdir: Utf8PathBuf,

    /// ROOT file name
    #[arg(short, long, visible_alias = "rootfilename")]
    pub rootfile: String,

    /// Job to wait for (0: none)
    #[arg(short, long, default_value = "0")]
    pub dependency: u64,

    /// Queue/partition
    #[arg(short, long, default_value = "gpu")]
    pub queue: String,
}

impl MergeArgs {
    pub fn request(&self) -> Result<MergeRequest, CliError> {
        Ok(MergeRequest {
            work_dir: output_dir(&self.outputdir)?,
            root_file: self.rootfile.clone(),
            dependency: (self.dependency != 0).then_some(JobId(self.dependency)),
            queue: self.queue.clone(),
        })
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct MergeManyArgs {
    /// Output base directory
    #[arg(short, long)]
    pub outputdir: Utf8PathBuf,

    /// ROOT file name
    #[arg(short, long)]
    pub rootfile: String,

    /// Queue/partition
    #[arg(short, long, default_value = "gpu")]
    pub queue: String,
}

impl MergeManyArgs {
    pub fn base(&self) -> Result<Utf8PathBuf, CliError> {
        output_dir(&self.outputdir)
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct StoreOutputArgs {
    /// Input location
    pub inputdir: Utf8PathBuf,

    /// Output location
    pub outputdir: Utf8PathBuf,

    /// Name of the ROOT file
    #[arg(short, long, default_value = "jetspectrum.root")]
    pub rootfile: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunTaskArgs {
    /// Runcard
    #[arg(short = 'c', long, default_value = "")]
    pub runcard: String,

    /// Generator (empty: no simulation)
    #[arg(short, long, default_value = "")]
    pub generator: String,

    /// Number of events
    #[arg(short, long, default_value = "100")]
    pub events: u64,

    /// Random seed
    #[arg(short, long, default_value = "123456789")]
    pub seed: u64,

    /// File with HepMC events
    #[arg(short = 'f', long, default_value = "events.hepmc")]
    pub hepmcfile: String,

    /// Analysis macro (empty: no analysis)
    #[arg(short, long = "macro", default_value = "")]
    pub macro_name: String,
}

impl RunTaskArgs {
    pub fn request(&self) -> Result<TaskRequest, CliError> {
        let generator = non_empty_string(&self.generator)
            .map(|g| g.parse::<Generator>())
            .transpose()?;
        Ok(TaskRequest {
            runcard: self.runcard.clone(),
            generator,
            events: self.events,
            seed: self.seed,
            hepmc_file: self.hepmcfile.clone(),
            macro_name: non_empty_string(&self.macro_name),
        })
    }
}
