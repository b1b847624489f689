//! Event generator runcards for hepsub.
//!
//! Runcards are encoded into lines by pure functions first and only then
//! written to disk, so a rejected configuration never leaves a partial file.

pub mod error;
pub mod herwig;
pub mod params;
pub mod runcard;
pub mod sherpa;
pub mod task;

pub use error::RuncardError;
pub use params::{Generator, PT_HARD_BINS, ProcessSpec, SimulationParam, Tune, pt_hard_limits};
pub use runcard::{RuncardWriter, write_runcard};
pub use task::{AnalysisTask, ModuleShell, SimulationTask};

use camino::Utf8Path;

/// Encode the runcard of `generator` for `params`.
pub fn encode(generator: Generator, params: &SimulationParam) -> Result<Vec<String>, RuncardError> {
    match generator {
        Generator::Herwig => herwig::encode(params),
        Generator::Sherpa => sherpa::encode(params),
        Generator::Pythia => Err(RuncardError::NoRuncard(generator.to_string())),
    }
}

/// Encode and write a runcard to `path`.
pub fn generate_runcard(
    generator: Generator,
    params: &SimulationParam,
    path: &Utf8Path,
) -> Result<(), RuncardError> {
    let lines = encode(generator, params)?;
    write_runcard(path, &lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_herwig_min_bias() {
        let temp = TempDir::new().unwrap();
        let path = Utf8Path::from_path(temp.path()).unwrap().join("herwig.in");
        let params = SimulationParam::new(ProcessSpec::MinBias).with_cms_energy(13000.);
        generate_runcard(Generator::Herwig, &params, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "read snippets/PPCollider.in");
        assert!(lines[1].contains("13000.000000"));
        assert_eq!(
            &lines[2..5],
            [
                "set /Herwig/Shower/ShowerHandler:IntrinsicPtGaussian 2.2*GeV",
                "read snippets/MB.in",
                "read snippets/Diffraction.in",
            ]
        );
    }

    #[test]
    fn test_rejected_process_leaves_no_file() {
        let temp = TempDir::new().unwrap();
        let path = Utf8Path::from_path(temp.path()).unwrap().join("Run.dat");
        let params = SimulationParam::new(ProcessSpec::Charm).with_cms_energy(13000.);
        assert!(generate_runcard(Generator::Sherpa, &params, &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_pythia_has_no_runcard() {
        let params = SimulationParam::new(ProcessSpec::PtHard(3));
        assert!(matches!(
            encode(Generator::Pythia, &params),
            Err(RuncardError::NoRuncard(_))
        ));
    }
}
