//! Payload command line composition.

use crate::cluster::ClusterProfile;
use crate::container::ContainerWrapper;
use camino::{Utf8Path, Utf8PathBuf};

/// Name of the container wrapper script inside the repository.
pub const CONTAINER_WRAPPER: &str = "containerwrapper.sh";

/// Builds the single shell line that starts a payload inside a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessLauncher {
    executable: Utf8PathBuf,
    arguments: Vec<String>,
    log_file: Option<String>,
    container: Option<ContainerWrapper>,
}

impl ProcessLauncher {
    pub fn new<I, S>(executable: impl Into<Utf8PathBuf>, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Self {
            executable: executable.into(),
            arguments: arguments.into_iter().map(|a| a.to_string()).collect(),
            log_file: None,
            container: None,
        }
    }

    /// Redirect stdout and stderr of the payload (`&> <log>`).
    pub fn with_log_file(mut self, log_file: impl Into<String>) -> Self {
        let log_file = log_file.into();
        self.log_file = Some(log_file).filter(|l| !l.is_empty());
        self
    }

    pub fn with_container(mut self, container: ContainerWrapper) -> Self {
        self.container = Some(container);
        self
    }

    /// Enable container wrapping when the cluster runs payloads in an image.
    ///
    /// The wrapper script is looked up in `repository`.
    pub fn for_cluster(mut self, profile: &ClusterProfile, repository: &Utf8Path) -> Self {
        if let Some(image) = profile.container_image() {
            let mut container = ContainerWrapper::new(repository.join(CONTAINER_WRAPPER), image);
            container.add_mounts(profile.mount_paths().iter().cloned());
            self.container = Some(container);
        }
        self
    }

    pub fn container(&self) -> Option<&ContainerWrapper> {
        self.container.as_ref()
    }

    /// The composed command line. Pure: identical inputs give identical output.
    pub fn command_line(&self) -> String {
        let mut command = self.executable.to_string();
        for arg in &self.arguments {
            command.push(' ');
            command.push_str(arg);
        }
        if let Some(log) = &self.log_file {
            command.push_str(" &> ");
            command.push_str(log);
        }
        match &self.container {
            Some(container) => container.wrap(&command),
            None => command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_command() {
        let launcher = ProcessLauncher::new("/repo/run_merge.sh", ["/data/bin3", "jets.root"]);
        assert_eq!(launcher.command_line(), "/repo/run_merge.sh /data/bin3 jets.root");
    }

    #[test]
    fn test_command_with_log() {
        let launcher = ProcessLauncher::new("/repo/simrun.sh", ["B587", "herwig"])
            .with_log_file("run_herwig.log");
        assert_eq!(
            launcher.command_line(),
            "/repo/simrun.sh B587 herwig &> run_herwig.log"
        );
    }

    #[test]
    fn test_empty_log_is_ignored() {
        let launcher = ProcessLauncher::new("/bin/true", Vec::<String>::new()).with_log_file("");
        assert_eq!(launcher.command_line(), "/bin/true");
    }

    #[test]
    fn test_container_wrapping_from_profile() {
        let launcher = ProcessLauncher::new("/repo/simrun.sh", ["CADES", "herwig", "10"])
            .with_log_file("run_herwig.log")
            .for_cluster(&ClusterProfile::cades(), Utf8Path::new("/repo"));
        assert_eq!(
            launcher.command_line(),
            "/repo/containerwrapper.sh singularity exec -B /nfs/home:/nfs/home -B /lustre:/lustre \
             /home/mfasel_alice/mfasel_cc7_alice.simg /repo/simrun.sh CADES herwig 10 &> run_herwig.log"
        );
    }

    #[test]
    fn test_no_container_for_bare_metal_profile() {
        let launcher = ProcessLauncher::new("/repo/simrun.sh", ["B587"])
            .for_cluster(&ClusterProfile::b587(), Utf8Path::new("/repo"));
        assert!(launcher.container().is_none());
    }

    #[test]
    fn test_command_line_is_deterministic() {
        let launcher = ProcessLauncher::new("/repo/simrun.sh", ["a", "b"])
            .with_log_file("x.log")
            .for_cluster(&ClusterProfile::cades(), Utf8Path::new("/repo"));
        assert_eq!(launcher.command_line(), launcher.command_line());
        assert_eq!(launcher.clone().command_line(), launcher.command_line());
    }
}
