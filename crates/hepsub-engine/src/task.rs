//! Shell lines run inside a job: module setup plus the generator or
//! analysis invocation.

use crate::params::Generator;

const HERWIG_REPOSITORY: &str = "$HERWIG_ROOT/share/Herwig/HerwigDefaults.rpo";
const LHAPDF_SETUP: &str = "$CLUSTER_HOME/lhapdf_data_setenv";

/// Accumulates `;`-separated shell instructions with alienv module loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleShell {
    command: String,
    alienv_initialized: bool,
}

impl ModuleShell {
    pub fn new() -> Self {
        Self::default()
    }

    fn init_alienv(&mut self) {
        if self.alienv_initialized {
            return;
        }
        self.command.push_str("ALIENV=`which alienv`;");
        self.alienv_initialized = true;
    }

    pub fn load_module(&mut self, module: &str) {
        self.init_alienv();
        self.command
            .push_str(&format!("eval `$ALIENV --no-refresh load {}`;", module));
    }

    pub fn print_modules(&mut self) {
        self.init_alienv();
        self.command.push_str("$ALIENV list;");
    }

    pub fn source_script(&mut self, script: &str) {
        self.command.push_str(&format!("source {};", script));
    }

    pub fn write_instruction(&mut self, instruction: &str) {
        self.command.push_str(instruction);
        self.command.push(';');
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    fn with_modules(modules: &[&str]) -> Self {
        let mut shell = Self::new();
        for module in modules {
            shell.load_module(module);
        }
        shell.print_modules();
        shell
    }
}

/// Generator run for one array slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationTask {
    pub generator: Generator,
    pub runcard: String,
    pub events: u64,
    pub seed: u64,
}

impl SimulationTask {
    /// Shell line running the generator, None when the generator is not
    /// driven through a runcard.
    pub fn shell(&self) -> Option<ModuleShell> {
        let (module, invocations) = match self.generator {
            Generator::Herwig => (
                "Herwig/latest",
                vec![
                    format!(
                        "Herwig --repo={} read {} &> hw_setup.log",
                        HERWIG_REPOSITORY, self.runcard
                    ),
                    format!(
                        "Herwig --repo={} run herwig.run -N {} -s {} &> hw_run.log",
                        HERWIG_REPOSITORY, self.events, self.seed
                    ),
                ],
            ),
            Generator::Sherpa => (
                "Sherpa/latest",
                vec![format!(
                    "Sherpa -f {} -e {} -R {} &> sherpa_run.log",
                    self.runcard, self.events, self.seed
                )],
            ),
            Generator::Pythia => return None,
        };
        let mut shell = ModuleShell::with_modules(&[module]);
        shell.source_script(LHAPDF_SETUP);
        for invocation in &invocations {
            shell.write_instruction(invocation);
        }
        Some(shell)
    }
}

/// ROOT macro run over a HepMC file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTask {
    pub macro_path: String,
    pub hepmc_file: String,
}

impl AnalysisTask {
    pub fn shell(&self) -> ModuleShell {
        let mut shell = ModuleShell::with_modules(&["fastjet/latest", "HepMC/latest", "ROOT/latest"]);
        shell.write_instruction(&format!(
            "root -l -b -q '{}(\"{}\")'",
            self.macro_path, self.hepmc_file
        ));
        shell
    }
}
