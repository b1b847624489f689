//! Simulation parameters shared by all generators.

use crate::error::RuncardError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// Event generator driven by a simulation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generator {
    Herwig,
    Sherpa,
    Pythia,
}

impl Generator {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Herwig => "herwig",
            Self::Sherpa => "sherpa",
            Self::Pythia => "pythia",
        }
    }

    /// File name of the runcard in the output directory, if the generator takes one.
    pub fn runcard_name(&self) -> Option<&'static str> {
        match self {
            Self::Herwig => Some("herwig.in"),
            Self::Sherpa => Some("Run.dat"),
            Self::Pythia => None,
        }
    }
}

impl fmt::Display for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Generator {
    type Err = RuncardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "herwig" => Ok(Self::Herwig),
            "sherpa" => Ok(Self::Sherpa),
            "pythia" => Ok(Self::Pythia),
            other => Err(RuncardError::UnsupportedGenerator(other.to_string())),
        }
    }
}

/// Underlying event tune.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tune {
    #[default]
    SoftTune,
    DefaultTune,
}

impl Tune {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SoftTune => "SoftTune",
            Self::DefaultTune => "DefaultTune",
        }
    }
}

impl fmt::Display for Tune {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tune {
    type Err = RuncardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SoftTune" => Ok(Self::SoftTune),
            "DefaultTune" => Ok(Self::DefaultTune),
            other => Err(RuncardError::UnsupportedTune(other.to_string())),
        }
    }
}

/// Physics process requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcessSpec {
    /// `mb`
    MinBias,
    /// `charm`
    Charm,
    /// `beauty`
    Beauty,
    /// `dijet_lo`
    DijetLo,
    /// `ktmin_<n>`: dijets above a kt threshold
    KtMin(f64),
    /// `pthard_<bin>`: dijets within one pt-hard bin
    PtHard(u32),
}

static BINNED_PROCESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(pthard|ktmin)_(\d+)$").expect("valid regex"));

impl FromStr for ProcessSpec {
    type Err = RuncardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mb" => return Ok(Self::MinBias),
            "charm" => return Ok(Self::Charm),
            "beauty" => return Ok(Self::Beauty),
            "dijet_lo" => return Ok(Self::DijetLo),
            _ => {}
        }
        let unsupported = || RuncardError::UnsupportedProcess(s.to_string());
        let caps = BINNED_PROCESS.captures(s).ok_or_else(unsupported)?;
        let value = &caps[2];
        match &caps[1] {
            "pthard" => {
                let bin: u32 = value.parse().map_err(|_| unsupported())?;
                if pt_hard_limits(bin).is_none() {
                    return Err(RuncardError::InvalidPtHardBin(bin));
                }
                Ok(Self::PtHard(bin))
            }
            _ => Ok(Self::KtMin(value.parse().map_err(|_| unsupported())?)),
        }
    }
}

impl fmt::Display for ProcessSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinBias => f.write_str("mb"),
            Self::Charm => f.write_str("charm"),
            Self::Beauty => f.write_str("beauty"),
            Self::DijetLo => f.write_str("dijet_lo"),
            Self::KtMin(kt) => write!(f, "ktmin_{}", kt),
            Self::PtHard(bin) => write!(f, "pthard_{}", bin),
        }
    }
}

/// Pt-hard bin limits in GeV, indexed by bin number.
pub const PT_HARD_BINS: [(f64, f64); 21] = [
    (0., 5.),
    (5., 7.),
    (7., 9.),
    (9., 12.),
    (12., 16.),
    (16., 21.),
    (21., 28.),
    (28., 36.),
    (36., 45.),
    (45., 57.),
    (57., 70.),
    (70., 85.),
    (85., 99.),
    (99., 115.),
    (115., 132.),
    (132., 150.),
    (150., 169.),
    (169., 190.),
    (190., 212.),
    (212., 235.),
    (235., 1000.),
];

/// Limits of a pt-hard bin, None outside the table.
pub fn pt_hard_limits(bin: u32) -> Option<(f64, f64)> {
    PT_HARD_BINS.get(bin as usize).copied()
}

/// Parameters of one simulation, consumed once to produce a runcard.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParam {
    cms_energy: f64,
    beam_energy: f64,
    pub events: u64,
    pub process: ProcessSpec,
    pub pdf_set: String,
    pub tune: Option<Tune>,
    pub hepmc_file: String,
}

impl Default for SimulationParam {
    fn default() -> Self {
        Self {
            cms_energy: 0.,
            beam_energy: 0.,
            events: 0,
            process: ProcessSpec::MinBias,
            pdf_set: String::new(),
            tune: None,
            hepmc_file: String::new(),
        }
    }
}

impl SimulationParam {
    pub fn new(process: ProcessSpec) -> Self {
        Self {
            process,
            ..Self::default()
        }
    }

    /// Set the centre-of-mass energy; the beam energy follows.
    pub fn with_cms_energy(mut self, energy: f64) -> Self {
        self.cms_energy = energy;
        self.beam_energy = energy / 2.;
        self
    }

    /// Set the energy per beam; the centre-of-mass energy follows.
    pub fn with_beam_energy(mut self, energy: f64) -> Self {
        self.beam_energy = energy;
        self.cms_energy = energy * 2.;
        self
    }

    pub fn with_events(mut self, events: u64) -> Self {
        self.events = events;
        self
    }

    pub fn with_pdf_set(mut self, pdf_set: impl Into<String>) -> Self {
        self.pdf_set = pdf_set.into();
        self
    }

    pub fn with_tune(mut self, tune: Tune) -> Self {
        self.tune = Some(tune);
        self
    }

    pub fn with_hepmc_file(mut self, hepmc_file: impl Into<String>) -> Self {
        self.hepmc_file = hepmc_file.into();
        self
    }

    pub fn cms_energy(&self) -> f64 {
        self.cms_energy
    }

    pub fn beam_energy(&self) -> f64 {
        self.beam_energy
    }

    /// Index of the pt-hard bin, if the process is binned in pt-hard.
    pub fn pt_hard_bin(&self) -> Option<u32> {
        match self.process {
            ProcessSpec::PtHard(bin) => Some(bin),
            _ => None,
        }
    }

    /// Minimum kt requested by the process, 0 when unconstrained.
    pub fn kt_min(&self) -> f64 {
        match self.process {
            ProcessSpec::KtMin(kt) => kt,
            _ => 0.,
        }
    }
}
