use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuncardError {
    #[error("Process '{0}' not implemented")]
    UnsupportedProcess(String),
    #[error("Process '{process}' not implemented for {generator}")]
    UnsupportedForGenerator { process: String, generator: String },
    #[error("Tune {0} not supported - select either SoftTune (default) or DefaultTune")]
    UnsupportedTune(String),
    #[error("Generator '{0}' not supported")]
    UnsupportedGenerator(String),
    #[error("Pt-hard bin {0} out of range")]
    InvalidPtHardBin(u32),
    #[error("Generator {0} does not use a runcard")]
    NoRuncard(String),
    #[error("Failed to write runcard {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
}
