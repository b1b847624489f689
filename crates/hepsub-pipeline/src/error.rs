use camino::Utf8PathBuf;
use hepsub_engine::RuncardError;
use hepsub_parsers::CommandError;
use hepsub_slurm::{JobScriptError, SbatchError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Runcard(#[from] RuncardError),
    #[error(transparent)]
    JobScript(#[from] JobScriptError),
    #[error(transparent)]
    Sbatch(#[from] SbatchError),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("IO error on {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
    #[error("Input location {0} does not exist")]
    MissingInput(Utf8PathBuf),
    #[error("No hepmc files found below {0}")]
    NoInputFiles(Utf8PathBuf),
    #[error("Process {0} unknown - select either pthard or ktmin")]
    UnknownSweep(String),
    #[error("Bin {bin} is not part of the {sweep} binning")]
    UnknownBin { sweep: String, bin: u32 },
    #[error("Engine for generator {0} not initialized")]
    UnsupportedTaskGenerator(String),
    #[error("Path is not valid UTF-8: {0:?}")]
    NonUtf8Path(PathBuf),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<Utf8PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
