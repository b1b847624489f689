//! Copy merged results out of a production into persistent storage.

use crate::context::ensure_dir;
use crate::error::PipelineError;
use crate::sweep::bin_directories;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Copy `root_file` from every bin directory of `input` into the same
/// layout below `output`. Bins without the file are skipped.
///
/// Returns the written files.
pub fn store_output(
    input: &Utf8Path,
    output: &Utf8Path,
    root_file: &str,
) -> Result<Vec<Utf8PathBuf>, PipelineError> {
    if !input.exists() {
        return Err(PipelineError::MissingInput(input.to_path_buf()));
    }
    ensure_dir(output)?;
    tracing::info!("Copying files {} from {} to {} ...", root_file, input, output);

    let mut stored = Vec::new();
    for bin_dir in bin_directories(input)? {
        let source = bin_dir.join(root_file);
        if !source.is_file() {
            tracing::debug!("No {} in {}", root_file, bin_dir);
            continue;
        }
        let Some(name) = bin_dir.file_name() else {
            continue;
        };
        let target_dir = output.join(name);
        ensure_dir(&target_dir)?;
        let target = target_dir.join(root_file);
        fs::copy(&source, &target).map_err(PipelineError::io(&target))?;
        stored.push(target);
    }
    Ok(stored)
}
