//! Herwig `.in` runcards.
//!
//! Minimum bias settings follow the mcplots defaults
//! (http://mcplots.cern.ch/dat/pp/jets/pt/atlas3-akt4/7000/herwig++/2.7.1/default.params),
//! jet settings follow
//! http://mcplots.cern.ch/dat/pp/jets/pt/cms2011-y0.5/7000/herwig++/2.7.1/default.params.

use crate::error::RuncardError;
use crate::params::{ProcessSpec, SimulationParam, Tune, pt_hard_limits};
use camino::{Utf8Path, Utf8PathBuf};

/// Directory in the repository with extra Herwig input files to stage.
pub const HERWIG_INPUT_DIR: &str = "HerwigIn";

/// Heavy quark flavour for `MEHeavyQuark`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quark {
    Charm,
    Beauty,
}

impl Quark {
    fn pdg_code(&self) -> u32 {
        match self {
            Self::Charm => 4,
            Self::Beauty => 5,
        }
    }
}

/// Phase space cuts of a hard process, in GeV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HardCuts {
    pub kt_min: f64,
    pub kt_max: f64,
    pub mhat_max: f64,
}

/// Herwig process blocks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HerwigProcess {
    MinBias,
    Dijet(HardCuts),
    HeavyFlavour(Quark, HardCuts),
}

impl HerwigProcess {
    /// Map a requested process onto a Herwig process block.
    pub fn from_params(params: &SimulationParam) -> Result<Self, RuncardError> {
        let cuts = |kt_min: f64, kt_max: f64| HardCuts {
            kt_min,
            kt_max,
            mhat_max: 0.,
        };
        let full_range = params.cms_energy();
        let process = match params.process {
            ProcessSpec::MinBias => Self::MinBias,
            ProcessSpec::Charm => Self::HeavyFlavour(Quark::Charm, cuts(0., full_range)),
            ProcessSpec::Beauty => Self::HeavyFlavour(Quark::Beauty, cuts(0., full_range)),
            ProcessSpec::DijetLo => Self::Dijet(cuts(5., full_range)),
            ProcessSpec::KtMin(kt) => Self::Dijet(cuts(kt, full_range)),
            ProcessSpec::PtHard(bin) => {
                let (low, high) = pt_hard_limits(bin).ok_or(RuncardError::InvalidPtHardBin(bin))?;
                Self::Dijet(cuts(low, high))
            }
        };
        Ok(process)
    }

    fn encode(&self, tune: Option<Tune>, pdf_set: &str, lines: &mut Vec<String>) {
        let cuts = match self {
            Self::MinBias => {
                lines.push("set /Herwig/Shower/ShowerHandler:IntrinsicPtGaussian 2.2*GeV".into());
                lines.push("read snippets/MB.in".into());
                lines.push("read snippets/Diffraction.in".into());
                return;
            }
            Self::Dijet(cuts) => {
                lines.push(
                    "insert /Herwig/MatrixElements/SubProcess:MatrixElements[0] /Herwig/MatrixElements/MEQCD2to2"
                        .into(),
                );
                cuts
            }
            Self::HeavyFlavour(quark, cuts) => {
                lines.push(format!(
                    "set /Herwig/MatrixElements/MEHeavyQuark:QuarkType {}",
                    quark.pdg_code()
                ));
                lines.push(
                    "insert /Herwig/MatrixElements/SubProcess:MatrixElements[0] /Herwig/MatrixElements/MEHeavyQuark"
                        .into(),
                );
                cuts
            }
        };

        if let Some(tune) = tune {
            lines.push(format!("read {}.in", tune));
        }
        lines.push(format!("set /Herwig/Cuts/JetKtCut:MinKT {:.6}*GeV", cuts.kt_min));
        lines.push(format!("set /Herwig/Cuts/JetKtCut:MaxKT {:.6}*GeV", cuts.kt_max));
        lines.push(format!("set /Herwig/Cuts/Cuts:MHatMax {:.6}*GeV", cuts.mhat_max));
        lines.push("set /Herwig/Cuts/Cuts:MHatMin 0.0*GeV".into());
        for pdf in ["HardLOPDF", "ShowerLOPDF", "MPIPDF", "RemnantPDF"] {
            lines.push(format!("set /Herwig/Partons/{}:PDFName {}", pdf, pdf_set));
        }
        lines.push("set /Herwig/UnderlyingEvent/MPIHandler:IdenticalToUE -1".into());
    }
}

/// Encode a complete Herwig runcard.
pub fn encode(params: &SimulationParam) -> Result<Vec<String>, RuncardError> {
    let process = HerwigProcess::from_params(params)?;

    let mut lines = vec![
        "read snippets/PPCollider.in".to_string(),
        format!(
            "set /Herwig/Generators/EventGenerator:EventHandler:LuminosityFunction:Energy {:.6}",
            params.cms_energy()
        ),
    ];
    process.encode(params.tune, &params.pdf_set, &mut lines);

    // Stable particles with a lifetime > 10 mm (decay externally)
    lines.push("set /Herwig/Decays/DecayHandler:MaxLifeTime 10*mm".into());
    lines.push("set /Herwig/Decays/DecayHandler:LifeTimeOption Average".into());

    lines.push("read snippets/HepMC.in".into());
    lines.push(format!("set /Herwig/Analysis/HepMC:Filename {}", params.hepmc_file));
    lines.push(format!("set /Herwig/Analysis/HepMC:PrintEvent {}", params.events));
    lines.push("saverun herwig /Herwig/Generators/EventGenerator".into());
    Ok(lines)
}

/// Files a Herwig job needs in its working directory: the runcard plus
/// everything in `<repository>/HerwigIn`.
pub fn input_files(
    runcard: &Utf8Path,
    repository: &Utf8Path,
) -> Result<Vec<Utf8PathBuf>, RuncardError> {
    let mut files = vec![runcard.to_path_buf()];
    let input_dir = repository.join(HERWIG_INPUT_DIR);
    if !input_dir.is_dir() {
        return Ok(files);
    }
    let io_error = |source| RuncardError::Io {
        path: input_dir.clone(),
        source,
    };
    let mut extra = Vec::new();
    for entry in input_dir.read_dir_utf8().map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        if entry.path().is_file() {
            extra.push(entry.path().to_path_buf());
        }
    }
    extra.sort();
    files.extend(extra);
    Ok(files)
}
