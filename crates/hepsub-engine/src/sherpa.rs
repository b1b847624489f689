//! Sherpa `Run.dat` runcards.

use crate::error::RuncardError;
use crate::params::{ProcessSpec, SimulationParam};
use camino::Utf8Path;

const PROTON: i32 = 2212;

/// Jet clustering algorithm understood by `NJetFinder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JetAlgorithm {
    Kt,
    AntiKt,
}

impl JetAlgorithm {
    fn code(&self) -> i32 {
        match self {
            Self::Kt => 1,
            Self::AntiKt => -1,
        }
    }
}

/// `NJetFinder` selector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JetSelector {
    pub algorithm: JetAlgorithm,
    pub njets: u32,
    pub radius: f64,
    pub pt_min: f64,
    pub et_min: f64,
}

impl JetSelector {
    fn encode(&self) -> String {
        format!(
            "NJetFinder {} {} {} {} {}",
            self.njets,
            self.pt_min,
            self.et_min,
            self.radius,
            self.algorithm.code()
        )
    }
}

/// Sherpa process blocks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SherpaProcess {
    Dijet,
}

impl SherpaProcess {
    fn encode(&self, lines: &mut Vec<String>) {
        match self {
            Self::Dijet => {
                lines.push("  Process 93 93 -> 93 93 93{0}".into());
                lines.push("  Order (*,0);".into());
                lines.push("  CKKW sqr(20/E_CMS)".into());
                lines.push("  Integration_Error 0.02;".into());
                lines.push("  End process;".into());
            }
        }
    }
}

/// Output name for `EVENT_OUTPUT`: the file name without directory and extension.
fn hepmc_stem(hepmc_file: &str) -> &str {
    let path = Utf8Path::new(hepmc_file);
    path.file_stem().unwrap_or(hepmc_file)
}

/// Encode a complete Sherpa runcard.
///
/// Only dijet production is available; a kt threshold becomes the jet pt cut.
pub fn encode(params: &SimulationParam) -> Result<Vec<String>, RuncardError> {
    let (process, pt_min) = match params.process {
        ProcessSpec::DijetLo => (SherpaProcess::Dijet, 0.),
        ProcessSpec::KtMin(kt) => (SherpaProcess::Dijet, kt),
        other => {
            return Err(RuncardError::UnsupportedForGenerator {
                process: other.to_string(),
                generator: "sherpa".to_string(),
            });
        }
    };
    let selector = JetSelector {
        algorithm: JetAlgorithm::AntiKt,
        njets: 2,
        radius: 0.7,
        pt_min,
        et_min: 0.,
    };

    let mut lines = vec!["(run){".to_string()];
    for beam in 1..=2 {
        lines.push(format!(
            "  BEAM_{id} {pdg}: BEAM_ENERGY_{id} {energy};",
            id = beam,
            pdg = PROTON,
            energy = params.beam_energy()
        ));
    }
    lines.push(format!(
        "  EVENT_OUTPUT=HepMC_GenEvent[{}]",
        hepmc_stem(&params.hepmc_file)
    ));
    if !params.pdf_set.is_empty() {
        lines.push(format!("  PDF_LIBRARY={}", params.pdf_set));
    }
    lines.push("}(run)".into());

    lines.push("(process){".into());
    process.encode(&mut lines);
    lines.push("}(process)".into());

    lines.push("(selector){".into());
    lines.push(format!("  {}", selector.encode()));
    lines.push("}(selector)".into());
    Ok(lines)
}
