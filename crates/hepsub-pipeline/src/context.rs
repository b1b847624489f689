//! Submission context shared by all stages.

use crate::error::PipelineError;
use camino::{Utf8Path, Utf8PathBuf};
use hepsub_core::ClusterProfile;
use std::fs;

/// Directory below the repository holding the default analysis macros.
pub const MACRO_DIR: &str = "macros";

/// Resolved cluster profile and the repository holding the worker scripts.
#[derive(Debug, Clone)]
pub struct SubmitContext {
    pub profile: ClusterProfile,
    pub repository: Utf8PathBuf,
}

impl SubmitContext {
    pub fn new(profile: ClusterProfile, repository: impl Into<Utf8PathBuf>) -> Self {
        Self {
            profile,
            repository: repository.into(),
        }
    }

    /// Path of a worker script shipped with the repository.
    pub fn worker_script(&self, name: &str) -> Utf8PathBuf {
        self.repository.join(name)
    }

    /// A bare macro name refers to the repository's macro directory; anything
    /// with a `/` is taken as given.
    pub fn resolve_macro(&self, macro_name: &str) -> Utf8PathBuf {
        if macro_name.contains('/') {
            return Utf8PathBuf::from(macro_name);
        }
        let location = self.repository.join(MACRO_DIR);
        tracing::info!("Loading macro from default macro location {}", location);
        location.join(macro_name)
    }
}

/// Make `path` absolute against the current directory without touching the
/// filesystem.
pub fn absolute_path(path: &Utf8Path) -> Result<Utf8PathBuf, PipelineError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(PipelineError::io("."))?;
    let cwd = Utf8PathBuf::try_from(cwd).map_err(|e| PipelineError::NonUtf8Path(e.into_path_buf()))?;
    Ok(cwd.join(path))
}

/// `mkdir -p`
pub(crate) fn ensure_dir(path: &Utf8Path) -> Result<(), PipelineError> {
    fs::create_dir_all(path).map_err(PipelineError::io(path))
}
