//! SLURM integration for hepsub.
//!
//! Write job scripts and submit them via sbatch.

pub mod jobscript;
pub mod sbatch;
pub mod types;

pub use jobscript::{JobScript, JobScriptError, JobSpec};
pub use sbatch::{SbatchError, parse_job_id, submit_job};
pub use types::JobId;
