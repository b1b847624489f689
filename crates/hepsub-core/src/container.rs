//! Singularity command wrapping.

use camino::{Utf8Path, Utf8PathBuf};

/// A bind mount, `source` on the host visible at `target` in the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub source: String,
    pub target: String,
}

impl Mount {
    /// Mount with an explicit target; `None` mounts at the same path.
    pub fn new(source: impl Into<String>, target: Option<String>) -> Self {
        let source = source.into();
        let target = target.unwrap_or_else(|| source.clone());
        Self { source, target }
    }

    /// Mount at the same path inside the container.
    pub fn identity(path: impl Into<String>) -> Self {
        Self::new(path, None)
    }

    pub fn to_arg(&self) -> String {
        format!("-B {}:{}", self.source, self.target)
    }
}

/// Runs a command inside a container image via an external wrapper script.
///
/// The wrapper receives the full `singularity exec ...` argument vector and
/// is responsible for setting up the environment before exec'ing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerWrapper {
    wrapper_script: Utf8PathBuf,
    image: String,
    mounts: Vec<Mount>,
}

impl ContainerWrapper {
    pub fn new(wrapper_script: impl Into<Utf8PathBuf>, image: impl Into<String>) -> Self {
        Self {
            wrapper_script: wrapper_script.into(),
            image: image.into(),
            mounts: Vec::new(),
        }
    }

    pub fn add_mount(&mut self, mount: Mount) {
        self.mounts.push(mount);
    }

    /// Add identity mounts for every path.
    pub fn add_mounts<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mounts.extend(paths.into_iter().map(Mount::identity));
    }

    pub fn wrapper_script(&self) -> &Utf8Path {
        &self.wrapper_script
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn mounts(&self) -> &[Mount] {
        &self.mounts
    }

    /// `<wrapper> singularity exec [-B src:tgt]* <image> <command>`
    pub fn wrap(&self, command: &str) -> String {
        let mut line = format!("{} singularity exec", self.wrapper_script);
        for mount in &self.mounts {
            line.push(' ');
            line.push_str(&mount.to_arg());
        }
        line.push(' ');
        line.push_str(&self.image);
        line.push(' ');
        line.push_str(command);
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_target_defaults_to_source() {
        assert_eq!(Mount::identity("/lustre").to_arg(), "-B /lustre:/lustre");
        assert_eq!(
            Mount::new("/nfs/home/user", Some("/home".to_string())).to_arg(),
            "-B /nfs/home/user:/home"
        );
    }

    #[test]
    fn test_wrap_without_mounts() {
        let wrapper = ContainerWrapper::new("/repo/containerwrapper.sh", "cc7.simg");
        assert_eq!(
            wrapper.wrap("echo hi"),
            "/repo/containerwrapper.sh singularity exec cc7.simg echo hi"
        );
    }

    #[test]
    fn test_wrap_keeps_mount_order() {
        let mut wrapper = ContainerWrapper::new("/repo/containerwrapper.sh", "cc7.simg");
        wrapper.add_mounts(["/nfs/home", "/lustre"]);
        wrapper.add_mount(Mount::new("/scratch/me", Some("/scratch".to_string())));
        assert_eq!(
            wrapper.wrap("run.sh 1"),
            "/repo/containerwrapper.sh singularity exec -B /nfs/home:/nfs/home \
             -B /lustre:/lustre -B /scratch/me:/scratch cc7.simg run.sh 1"
        );
    }
}
