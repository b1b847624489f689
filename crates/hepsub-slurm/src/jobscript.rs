//! Build SLURM job scripts.
//!
//! A job script is written line by line: the shebang and `#SBATCH`
//! directives first, then module loads, the working directory setup and
//! finally the payload. Later lines assume `$WORKDIR` is the current
//! directory, so the order of the writes matters.

use crate::types::JobId;
use camino::{Utf8Path, Utf8PathBuf};
use hepsub_core::{ClusterProfile, ProcessLauncher};
use std::fs::File;
use std::io::{BufWriter, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobScriptError {
    #[error("Job script not initialized - call init first")]
    NotInitialized,
    #[error("Job script {0} already initialized")]
    AlreadyInitialized(Utf8PathBuf),
    #[error("Failed to write job script {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
}

/// Everything that ends up in the header of a job script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub job_name: String,
    /// Output file (`-o`); `%a` expands to the array index
    pub log_file: Utf8PathBuf,
    pub time_limit: String,
    pub mem_limit: String,
    pub account: Option<String>,
    pub partition: String,
    pub num_nodes: u32,
    pub num_tasks: u32,
    pub num_cores: u32,
    /// Number of array slots, 0 for a plain job
    pub array_size: u32,
    pub dependency: Option<JobId>,
    pub modules: Vec<String>,
    pub workdir: Option<Utf8PathBuf>,
    /// Files copied into `$WORKDIR` before the payload starts
    pub stage_files: Vec<Utf8PathBuf>,
    pub has_time_limit: bool,
    pub has_memory_limit: bool,
}

impl JobSpec {
    pub fn new(
        job_name: impl Into<String>,
        log_file: impl Into<Utf8PathBuf>,
        time_limit: impl Into<String>,
        mem_limit: impl Into<String>,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            log_file: log_file.into(),
            time_limit: time_limit.into(),
            mem_limit: mem_limit.into(),
            account: None,
            partition: "gpu".to_string(),
            num_nodes: 1,
            num_tasks: 1,
            num_cores: 1,
            array_size: 0,
            dependency: None,
            modules: Vec::new(),
            workdir: None,
            stage_files: Vec::new(),
            has_time_limit: false,
            has_memory_limit: false,
        }
    }

    /// Take account, base modules and resource limit flags from the cluster.
    pub fn configure_from(mut self, profile: &ClusterProfile) -> Self {
        self.account = profile.account().map(str::to_string);
        let mut modules = profile.base_modules().to_vec();
        modules.append(&mut self.modules);
        self.modules = modules;
        self.has_time_limit = profile.has_time_limit();
        self.has_memory_limit = profile.has_memory_limit();
        self
    }

    /// Override the partition; an empty name keeps the default.
    pub fn with_partition(mut self, partition: &str) -> Self {
        if !partition.is_empty() {
            self.partition = partition.to_string();
        }
        self
    }

    pub fn with_array_size(mut self, array_size: u32) -> Self {
        self.array_size = array_size;
        self
    }

    pub fn with_dependency(mut self, dependency: Option<JobId>) -> Self {
        self.dependency = dependency;
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.modules.push(module.into());
        self
    }

    pub fn with_workdir(mut self, workdir: impl Into<Utf8PathBuf>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    pub fn with_stage_files(mut self, files: Vec<Utf8PathBuf>) -> Self {
        self.stage_files = files;
        self
    }

    /// Shebang, `#SBATCH` directives and module loads, in script order.
    pub fn header_lines(&self) -> Vec<String> {
        let mut lines = vec!["#! /bin/bash".to_string()];
        if let Some(account) = &self.account {
            lines.push(format!("#SBATCH -A {}", account));
        }
        lines.push(format!("#SBATCH -N {}", self.num_nodes));
        lines.push(format!("#SBATCH -n {}", self.num_tasks));
        lines.push(format!("#SBATCH -c {}", self.num_cores));
        if self.array_size > 0 {
            lines.push(format!("#SBATCH --array=0-{}", self.array_size - 1));
        }
        if let Some(dependency) = self.dependency {
            lines.push(format!("#SBATCH --dependency={}", dependency));
        }
        lines.push(format!("#SBATCH -p {}", self.partition));
        lines.push(format!("#SBATCH -J {}", self.job_name));
        lines.push(format!("#SBATCH -o {}", self.log_file));
        if self.has_time_limit {
            lines.push(format!("#SBATCH -t {}", self.time_limit));
        }
        if self.has_memory_limit {
            lines.push(format!("#SBATCH --mem={}", self.mem_limit));
        }
        for module in &self.modules {
            lines.push(format!("module load {}", module));
        }
        lines
    }

    /// `WORKDIR` setup: create it, stage input files, enter it.
    ///
    /// Empty when no workdir is configured.
    pub fn workdir_lines(&self) -> Vec<String> {
        let Some(workdir) = &self.workdir else {
            return Vec::new();
        };
        let mut lines = Vec::new();
        if self.array_size > 0 {
            lines.push(format!(
                "WORKDIR=$(printf \"{}/%04d\" $SLURM_ARRAY_TASK_ID)",
                workdir
            ));
        } else {
            lines.push(format!("WORKDIR={}", workdir));
        }
        lines.push("if [ ! -d $WORKDIR ]; then mkdir -p $WORKDIR; fi".to_string());
        for file in &self.stage_files {
            let base = file.file_name().unwrap_or(file.as_str());
            lines.push(format!("cp {} $WORKDIR/{}", file, base));
        }
        lines.push("cd $WORKDIR".to_string());
        lines
    }
}

enum ScriptState {
    Uninitialized,
    Open(BufWriter<File>),
    Finalized,
}

/// A job script on disk.
///
/// The file handle is owned by the script and released when it is finished
/// or dropped.
pub struct JobScript {
    spec: JobSpec,
    path: Option<Utf8PathBuf>,
    state: ScriptState,
}

impl JobScript {
    pub fn new(spec: JobSpec) -> Self {
        Self {
            spec,
            path: None,
            state: ScriptState::Uninitialized,
        }
    }

    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    pub fn path(&self) -> Option<&Utf8Path> {
        self.path.as_deref()
    }

    /// Open `path` and write header and working directory setup.
    pub fn init(&mut self, path: &Utf8Path) -> Result<(), JobScriptError> {
        if !matches!(self.state, ScriptState::Uninitialized) {
            return Err(JobScriptError::AlreadyInitialized(path.to_path_buf()));
        }
        let file = File::create(path).map_err(|source| JobScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.path = Some(path.to_path_buf());
        self.state = ScriptState::Open(BufWriter::new(file));
        tracing::debug!("Writing job script {}", path);

        for line in self.spec.header_lines() {
            self.write_instruction(&line)?;
        }
        self.message("Preparing working directories and configurations ...")?;
        for line in self.spec.workdir_lines() {
            self.write_instruction(&line)?;
        }
        Ok(())
    }

    pub fn write_instruction(&mut self, instruction: &str) -> Result<(), JobScriptError> {
        let ScriptState::Open(writer) = &mut self.state else {
            return Err(JobScriptError::NotInitialized);
        };
        writeln!(writer, "{}", instruction).map_err(|source| JobScriptError::Io {
            path: self.path.clone().unwrap_or_default(),
            source,
        })
    }

    /// Progress marker in the job log.
    pub fn message(&mut self, text: &str) -> Result<(), JobScriptError> {
        self.write_instruction(&format!("echo \"{}\"", text))
    }

    pub fn launch(&mut self, launcher: &ProcessLauncher) -> Result<(), JobScriptError> {
        self.write_instruction(&launcher.command_line())
    }

    /// `rm -f <path>`, run by the job itself.
    pub fn remove(&mut self, path: &Utf8Path) -> Result<(), JobScriptError> {
        self.write_instruction(&format!("rm -f {}", path))
    }

    /// Flush and close the script, returning its path.
    pub fn finish(&mut self) -> Result<Utf8PathBuf, JobScriptError> {
        let mut writer = match std::mem::replace(&mut self.state, ScriptState::Finalized) {
            ScriptState::Open(writer) => writer,
            other => {
                self.state = other;
                return Err(JobScriptError::NotInitialized);
            }
        };
        let path = self.path.clone().unwrap_or_default();
        writer.flush().map_err(|source| JobScriptError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}
