//! Submission pipelines for hepsub.
//!
//! Each stage writes a job script into its output directory and hands it to
//! a [`Scheduler`]. Stages are chained by passing the returned job id as the
//! dependency of the next one.

pub mod analyze;
pub mod context;
pub mod error;
pub mod merge;
pub mod scheduler;
pub mod simulate;
pub mod stage;
pub mod store;
pub mod sweep;
pub mod task;

pub use analyze::{AnalysisRequest, submit_analysis, submit_analysis_many};
pub use context::{SubmitContext, absolute_path};
pub use error::PipelineError;
pub use merge::{MergeRequest, submit_merge, submit_merge_many};
pub use scheduler::{DryRun, Sbatch, Scheduler};
pub use simulate::{PythiaRequest, SimulationRequest, submit_pythia, submit_simulation};
pub use stage::PipelineJobs;
pub use store::store_output;
pub use sweep::{Sweep, bin_directories, submit_pythia_many, submit_sweep};
pub use task::{TaskRequest, run_task};
