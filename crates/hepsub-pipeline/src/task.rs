//! In-job task runner: generator run followed by an optional analysis macro.

use crate::error::PipelineError;
use hepsub_engine::{AnalysisTask, Generator, SimulationTask};
use hepsub_parsers::run_shell;

#[derive(Debug, Clone)]
pub struct TaskRequest {
    pub runcard: String,
    /// Skip the simulation step when None
    pub generator: Option<Generator>,
    pub events: u64,
    pub seed: u64,
    pub hepmc_file: String,
    /// Skip the analysis step when None
    pub macro_name: Option<String>,
}

/// Shell lines to run for `request`, in order.
pub fn task_commands(request: &TaskRequest) -> Result<Vec<String>, PipelineError> {
    let mut commands = Vec::new();
    if let Some(generator) = request.generator {
        let task = SimulationTask {
            generator,
            runcard: request.runcard.clone(),
            events: request.events,
            seed: request.seed,
        };
        let shell = task
            .shell()
            .ok_or_else(|| PipelineError::UnsupportedTaskGenerator(generator.to_string()))?;
        commands.push(shell.command().to_string());
    }
    if let Some(macro_path) = &request.macro_name {
        let task = AnalysisTask {
            macro_path: macro_path.clone(),
            hepmc_file: request.hepmc_file.clone(),
        };
        commands.push(task.shell().command().to_string());
    }
    Ok(commands)
}

/// Run the task in the current directory.
///
/// A non-zero exit of a step is logged and the next step still runs; only
/// failing to start the shell is an error.
pub async fn run_task(request: &TaskRequest) -> Result<(), PipelineError> {
    for command in task_commands(request)? {
        tracing::debug!("Running {}", command);
        let status = run_shell(&command).await?;
        if !status.success() {
            tracing::warn!("Task step finished with {}", status);
        }
    }
    Ok(())
}
