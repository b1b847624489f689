//! Sweeps: one independent pipeline per bin subdirectory.

use crate::context::SubmitContext;
use crate::error::PipelineError;
use crate::scheduler::Scheduler;
use crate::simulate::{PythiaRequest, SimulationRequest, submit_pythia, submit_simulation};
use crate::stage::PipelineJobs;
use camino::{Utf8Path, Utf8PathBuf};
use hepsub_engine::ProcessSpec;
use std::fmt;
use std::fs;
use std::str::FromStr;

const KT_MIN_BINS: [u32; 11] = [0, 5, 10, 15, 20, 30, 40, 50, 90, 150, 230];
const PT_HARD_BIN_COUNT: u32 = 21;

/// Subdirectories of `base` named all digits or containing `bin`, sorted by name.
pub fn bin_directories(base: &Utf8Path) -> Result<Vec<Utf8PathBuf>, PipelineError> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(base).map_err(PipelineError::io(base))? {
        let entry = entry.map_err(PipelineError::io(base))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !is_bin_name(&name) {
            continue;
        }
        let path = base.join(&name);
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn is_bin_name(name: &str) -> bool {
    let all_digits = !name.is_empty() && name.chars().all(|c| c.is_ascii_digit());
    all_digits || name.contains("bin")
}

/// Binned production driven by `process`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sweep {
    PtHard,
    KtMin,
}

impl Sweep {
    pub fn bins(&self) -> Vec<u32> {
        match self {
            Self::PtHard => (0..PT_HARD_BIN_COUNT).collect(),
            Self::KtMin => KT_MIN_BINS.to_vec(),
        }
    }

    /// Bins to submit: all of them when `requested` is empty, otherwise
    /// `requested` in order, each checked against the table.
    pub fn select(&self, requested: &[u32]) -> Result<Vec<u32>, PipelineError> {
        let table = self.bins();
        if requested.is_empty() {
            return Ok(table);
        }
        let mut bins = Vec::with_capacity(requested.len());
        for &bin in requested {
            if !table.contains(&bin) {
                return Err(PipelineError::UnknownBin { sweep: self.to_string(), bin });
            }
            if !bins.contains(&bin) {
                bins.push(bin);
            }
        }
        Ok(bins)
    }

    /// Subdirectory receiving `bin`.
    pub fn dir_name(&self, bin: u32) -> String {
        match self {
            Self::PtHard => format!("bin{}", bin),
            Self::KtMin => format!("{:02}", bin),
        }
    }

    pub fn process(&self, bin: u32) -> ProcessSpec {
        match self {
            Self::PtHard => ProcessSpec::PtHard(bin),
            Self::KtMin => ProcessSpec::KtMin(f64::from(bin)),
        }
    }
}

impl fmt::Display for Sweep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PtHard => f.write_str("pthard"),
            Self::KtMin => f.write_str("ktmin"),
        }
    }
}

impl FromStr for Sweep {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pthard" => Ok(Self::PtHard),
            "ktmin" => Ok(Self::KtMin),
            other => Err(PipelineError::UnknownSweep(other.to_string())),
        }
    }
}

/// Submit `template` once per selected bin of `sweep` (all bins when `bins`
/// is empty), each into its own subdirectory of `template.output_dir`.
pub async fn submit_sweep<S: Scheduler>(
    ctx: &SubmitContext,
    scheduler: &mut S,
    sweep: Sweep,
    bins: &[u32],
    template: &SimulationRequest,
) -> Result<Vec<PipelineJobs>, PipelineError> {
    let bins = sweep.select(bins)?;
    let mut jobs = Vec::new();
    for bin in bins {
        let request = SimulationRequest {
            output_dir: template.output_dir.join(sweep.dir_name(bin)),
            process: sweep.process(bin),
            ..template.clone()
        };
        jobs.push(submit_simulation(ctx, scheduler, &request).await?);
    }
    tracing::info!("Submitted {} {} bins", jobs.len(), sweep);
    Ok(jobs)
}

/// Submit a Pythia production for each selected pt-hard bin (all bins when
/// `bins` is empty) into `bin<n>`.
pub async fn submit_pythia_many<S: Scheduler>(
    ctx: &SubmitContext,
    scheduler: &mut S,
    bins: &[u32],
    template: &PythiaRequest,
) -> Result<Vec<PipelineJobs>, PipelineError> {
    let bins = Sweep::PtHard.select(bins)?;
    let mut jobs = Vec::new();
    for bin in bins {
        let request = PythiaRequest {
            output_dir: template.output_dir.join(Sweep::PtHard.dir_name(bin)),
            pt_hard_bin: bin,
            ..template.clone()
        };
        jobs.push(submit_pythia(ctx, scheduler, &request).await?);
    }
    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::JOB_SCRIPT;
    use crate::stage::testing::Recorder;
    use hepsub_core::ClusterProfile;
    use hepsub_engine::{Generator, Tune};
    use hepsub_slurm::JobId;
    use tempfile::TempDir;

    fn template(output_dir: &Utf8Path) -> SimulationRequest {
        SimulationRequest {
            generator: Generator::Herwig,
            output_dir: output_dir.to_path_buf(),
            jobs: 1000,
            events: 10000,
            beam_energy: 6500.,
            process: ProcessSpec::MinBias,
            tune: Tune::SoftTune,
            pdf_set: "CT14lo".to_string(),
            macro_name: "makeJetSpectrumAndSoftDrop.C".to_string(),
            time_limit: "10:00:00".to_string(),
            mem_limit: "4G".to_string(),
            root_file: None,
            queue: "gpu".to_string(),
        }
    }

    #[test]
    fn test_bin_names() {
        assert!(is_bin_name("05"));
        assert!(is_bin_name("bin12"));
        assert!(is_bin_name("ptbins"));
        assert!(!is_bin_name("logs"));
        assert!(!is_bin_name(""));
        assert!(!is_bin_name("5a"));
    }

    #[test]
    fn test_sweep_parse() {
        assert_eq!("pthard".parse::<Sweep>().unwrap(), Sweep::PtHard);
        assert_eq!("ktmin".parse::<Sweep>().unwrap(), Sweep::KtMin);
        assert!(matches!(
            "mb".parse::<Sweep>(),
            Err(PipelineError::UnknownSweep(name)) if name == "mb"
        ));
    }

    #[test]
    fn test_sweep_bins() {
        assert_eq!(Sweep::PtHard.bins().len(), 21);
        assert_eq!(Sweep::PtHard.dir_name(3), "bin3");
        assert_eq!(Sweep::PtHard.process(3), ProcessSpec::PtHard(3));
        assert_eq!(Sweep::KtMin.bins().first(), Some(&0));
        assert_eq!(Sweep::KtMin.bins().last(), Some(&230));
        assert_eq!(Sweep::KtMin.dir_name(5), "05");
        assert_eq!(Sweep::KtMin.dir_name(150), "150");
        assert_eq!(Sweep::KtMin.process(20).to_string(), "ktmin_20");
    }

    #[test]
    fn test_sweep_select() {
        assert_eq!(Sweep::PtHard.select(&[]).unwrap().len(), 21);
        assert_eq!(Sweep::PtHard.select(&[3, 5, 7]).unwrap(), vec![3, 5, 7]);
        assert_eq!(Sweep::KtMin.select(&[50, 5, 50]).unwrap(), vec![50, 5]);
        assert!(matches!(
            Sweep::PtHard.select(&[3, 21]),
            Err(PipelineError::UnknownBin { bin: 21, .. })
        ));
        assert!(matches!(
            Sweep::KtMin.select(&[25]),
            Err(PipelineError::UnknownBin { sweep, bin: 25 }) if sweep == "ktmin"
        ));
    }

    #[test]
    fn test_bin_directories_missing_base() {
        let result = bin_directories(Utf8Path::new("/nonexistent-dir-12345"));
        assert!(matches!(result, Err(PipelineError::Io { .. })));
    }

    #[tokio::test]
    async fn test_ktmin_sweep() {
        let temp = TempDir::new().unwrap();
        let base = Utf8Path::from_path(temp.path()).unwrap();
        let ctx = SubmitContext::new(ClusterProfile::b587(), "/opt/hepsub");
        let mut recorder = Recorder::default();

        let jobs = submit_sweep(&ctx, &mut recorder, Sweep::KtMin, &[], &template(base))
            .await
            .unwrap();
        assert_eq!(jobs.len(), 11);
        assert_eq!(jobs[0].stage, JobId(4821));
        assert!(jobs.iter().all(|j| j.merge.is_none()));
        assert_eq!(recorder.scripts[1].0, base.join("05").join(JOB_SCRIPT));

        let runcard = fs::read_to_string(base.join("05/herwig.in")).unwrap();
        assert!(runcard.contains("set /Herwig/Cuts/JetKtCut:MinKT 5.000000*GeV"));
    }

    #[tokio::test]
    async fn test_pthard_sweep_with_merges() {
        let temp = TempDir::new().unwrap();
        let base = Utf8Path::from_path(temp.path()).unwrap();
        let ctx = SubmitContext::new(ClusterProfile::b587(), "/opt/hepsub");
        let mut recorder = Recorder::default();

        let mut request = template(base);
        request.root_file = Some("jetspectrum.root".to_string());
        let jobs = submit_sweep(&ctx, &mut recorder, Sweep::PtHard, &[], &request)
            .await
            .unwrap();
        assert_eq!(jobs.len(), 21);
        assert_eq!(recorder.scripts.len(), 42);
        assert_eq!(jobs[20].merge, Some(JobId(4820 + 42)));
        assert!(base.join("bin20/herwig.in").is_file());
    }

    #[tokio::test]
    async fn test_pythia_many() {
        let temp = TempDir::new().unwrap();
        let base = Utf8Path::from_path(temp.path()).unwrap();
        let ctx = SubmitContext::new(ClusterProfile::b587(), "/opt/hepsub");
        let mut recorder = Recorder::default();

        let template = PythiaRequest {
            output_dir: base.to_path_buf(),
            jobs: 1000,
            events: 10000,
            beam_energy: 6500.,
            pt_hard_bin: 0,
            macro_name: "makeJetSpectrumAndSoftDrop.C".to_string(),
            time_limit: "14:00:00".to_string(),
            mem_limit: "4G".to_string(),
            root_file: None,
            queue: "gpu".to_string(),
        };
        let jobs = submit_pythia_many(&ctx, &mut recorder, &[], &template).await.unwrap();
        assert_eq!(jobs.len(), 21);
        assert_eq!(recorder.scripts[7].0, base.join("bin7").join(JOB_SCRIPT));
        assert!(recorder.lines(7).iter().any(|l| l.contains("13000 7 ")));
    }

    #[tokio::test]
    async fn test_pthard_sweep_subset() {
        let temp = TempDir::new().unwrap();
        let base = Utf8Path::from_path(temp.path()).unwrap();
        let ctx = SubmitContext::new(ClusterProfile::b587(), "/opt/hepsub");
        let mut recorder = Recorder::default();

        let jobs = submit_sweep(&ctx, &mut recorder, Sweep::PtHard, &[3, 5, 7], &template(base))
            .await
            .unwrap();
        assert_eq!(jobs.len(), 3);
        assert_eq!(recorder.scripts[1].0, base.join("bin5").join(JOB_SCRIPT));
        assert!(base.join("bin7/herwig.in").is_file());
        assert!(!base.join("bin0").exists());
    }

    #[tokio::test]
    async fn test_sweep_rejects_unknown_bin_before_writing() {
        let temp = TempDir::new().unwrap();
        let base = Utf8Path::from_path(temp.path()).unwrap();
        let ctx = SubmitContext::new(ClusterProfile::b587(), "/opt/hepsub");
        let mut recorder = Recorder::default();

        let result =
            submit_sweep(&ctx, &mut recorder, Sweep::PtHard, &[3, 40], &template(base)).await;
        assert!(matches!(result, Err(PipelineError::UnknownBin { bin: 40, .. })));
        assert!(recorder.scripts.is_empty());
        assert!(!base.join("bin3").exists());

        let pythia = PythiaRequest {
            output_dir: base.to_path_buf(),
            jobs: 1,
            events: 10,
            beam_energy: 6500.,
            pt_hard_bin: 0,
            macro_name: "jets.C".to_string(),
            time_limit: "14:00:00".to_string(),
            mem_limit: "4G".to_string(),
            root_file: None,
            queue: "gpu".to_string(),
        };
        let result = submit_pythia_many(&ctx, &mut recorder, &[21], &pythia).await;
        assert!(matches!(result, Err(PipelineError::UnknownBin { bin: 21, .. })));
        assert!(recorder.scripts.is_empty());
    }

    #[tokio::test]
    async fn test_sherpa_pthard_sweep_creates_no_bins() {
        let temp = TempDir::new().unwrap();
        let base = Utf8Path::from_path(temp.path()).unwrap();
        let ctx = SubmitContext::new(ClusterProfile::b587(), "/opt/hepsub");
        let mut recorder = Recorder::default();

        let mut request = template(base);
        request.generator = Generator::Sherpa;
        let result = submit_sweep(&ctx, &mut recorder, Sweep::PtHard, &[], &request).await;
        assert!(matches!(result, Err(PipelineError::Runcard(_))));
        assert!(recorder.scripts.is_empty());
        assert!(!base.join("bin0").exists());
    }
}
