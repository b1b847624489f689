//! Cluster profiles and the registry used to pick one.

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::fs;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("Unknown cluster '{0}'")]
    UnknownCluster(String),
    #[error("Host '{0}' does not match any known cluster - use --cluster to select one")]
    UnrecognizedHost(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Scheduling constraints of one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterProfile {
    name: String,

    /// Singularity image the payload runs in (if any)
    #[serde(default)]
    container_image: Option<String>,

    /// Host paths bind-mounted into the container
    #[serde(default)]
    mount_paths: Vec<String>,

    /// Modules loaded at the top of every job script
    #[serde(default)]
    base_modules: Vec<String>,

    /// Slurm account (`#SBATCH -A`)
    #[serde(default)]
    account: Option<String>,

    #[serde(default)]
    has_memory_limit: bool,

    #[serde(default)]
    has_time_limit: bool,
}

impl ClusterProfile {
    /// A profile with no container, no modules and no resource directives.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            container_image: None,
            mount_paths: Vec::new(),
            base_modules: Vec::new(),
            account: None,
            has_memory_limit: false,
            has_time_limit: false,
        }
    }

    /// ORNL CADES condo: containerised, accounted, memory and time limits enforced.
    pub fn cades() -> Self {
        Self::new("CADES")
            .with_container("/home/mfasel_alice/mfasel_cc7_alice.simg", ["/nfs/home", "/lustre"])
            .with_modules(["python/3.6.3", "PE-gnu", "singularity"])
            .with_account("birthright")
            .with_limits(true, true)
    }

    /// Local B587 workstation cluster: bare metal, no limits.
    pub fn b587() -> Self {
        Self::new("B587")
    }

    pub fn with_container<I, S>(mut self, image: impl Into<String>, mounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.container_image = Some(image.into());
        self.mount_paths = mounts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base_modules = modules.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    pub fn with_limits(mut self, memory: bool, time: bool) -> Self {
        self.has_memory_limit = memory;
        self.has_time_limit = time;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn container_image(&self) -> Option<&str> {
        self.container_image.as_deref()
    }

    pub fn mount_paths(&self) -> &[String] {
        &self.mount_paths
    }

    pub fn base_modules(&self) -> &[String] {
        &self.base_modules
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    /// Whether `#SBATCH --mem` is honoured on this cluster.
    pub fn has_memory_limit(&self) -> bool {
        self.has_memory_limit
    }

    /// Whether `#SBATCH -t` is honoured on this cluster.
    pub fn has_time_limit(&self) -> bool {
        self.has_time_limit
    }
}

/// Registry entry: a hostname fragment and the profile it selects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterEntry {
    pub host_pattern: String,
    pub profile: ClusterProfile,
}

impl ClusterEntry {
    fn matches_host(&self, hostname: &str) -> bool {
        !self.host_pattern.is_empty() && hostname.contains(&self.host_pattern)
    }
}

/// Known clusters, searched in order.
#[derive(Debug, Clone)]
pub struct ClusterRegistry {
    entries: Vec<ClusterEntry>,
}

impl Default for ClusterRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ClusterRegistry {
    /// The clusters this tool ships with.
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                ClusterEntry {
                    host_pattern: "or-slurm".to_string(),
                    profile: ClusterProfile::cades(),
                },
                ClusterEntry {
                    host_pattern: "pc059".to_string(),
                    profile: ClusterProfile::b587(),
                },
            ],
        }
    }

    pub fn entries(&self) -> &[ClusterEntry] {
        &self.entries
    }

    /// Add an entry ahead of the existing ones.
    pub fn register(&mut self, entry: ClusterEntry) {
        self.entries.insert(0, entry);
    }

    /// Load additional entries from a JSON array file.
    ///
    /// Loaded entries take precedence over the built-in ones.
    pub fn load_file(&mut self, path: &Utf8Path) -> Result<(), ClusterError> {
        let content = fs::read_to_string(path)?;
        let loaded: Vec<ClusterEntry> = serde_json::from_str(&content)?;
        tracing::debug!("Loaded {} cluster profile(s) from {}", loaded.len(), path);
        for entry in loaded.into_iter().rev() {
            self.register(entry);
        }
        Ok(())
    }

    /// Look up a profile by name, ignoring case.
    pub fn by_name(&self, name: &str) -> Option<&ClusterProfile> {
        self.entries
            .iter()
            .map(|e| &e.profile)
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// First profile whose host pattern occurs in `hostname`.
    pub fn detect(&self, hostname: &str) -> Option<&ClusterProfile> {
        self.entries
            .iter()
            .find(|e| e.matches_host(hostname))
            .map(|e| &e.profile)
    }

    /// Resolve the profile to use: an explicit name wins over hostname matching.
    pub fn resolve(
        &self,
        explicit: Option<&str>,
        hostname: &str,
    ) -> Result<ClusterProfile, ClusterError> {
        if let Some(name) = explicit {
            return self
                .by_name(name)
                .cloned()
                .ok_or_else(|| ClusterError::UnknownCluster(name.to_string()));
        }
        let profile = self
            .detect(hostname)
            .cloned()
            .ok_or_else(|| ClusterError::UnrecognizedHost(hostname.to_string()))?;
        tracing::debug!("Host {} identified as cluster {}", hostname, profile.name());
        Ok(profile)
    }
}

/// Hostname of this machine, "unknown" if it cannot be read.
pub fn read_hostname() -> String {
    fs::read_to_string("/proc/sys/kernel/hostname")
        .map(|s| s.trim().to_string())
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_profiles() {
        let cades = ClusterProfile::cades();
        assert!(cades.has_memory_limit());
        assert!(cades.has_time_limit());
        assert_eq!(cades.account(), Some("birthright"));
        assert_eq!(cades.mount_paths(), ["/nfs/home", "/lustre"]);

        let b587 = ClusterProfile::b587();
        assert!(!b587.has_memory_limit());
        assert!(!b587.has_time_limit());
        assert!(b587.container_image().is_none());
        assert!(b587.base_modules().is_empty());
    }

    #[test]
    fn test_detect_by_hostname() {
        let registry = ClusterRegistry::builtin();
        assert_eq!(registry.detect("or-slurm-login01.ornl.gov").unwrap().name(), "CADES");
        assert_eq!(registry.detect("pc059.physik.uni").unwrap().name(), "B587");
        assert!(registry.detect("laptop").is_none());
    }

    #[test]
    fn test_resolve_prefers_explicit_name() {
        let registry = ClusterRegistry::builtin();
        let profile = registry.resolve(Some("b587"), "or-slurm-login01").unwrap();
        assert_eq!(profile.name(), "B587");

        assert!(matches!(
            registry.resolve(Some("summit"), "or-slurm-login01"),
            Err(ClusterError::UnknownCluster(_))
        ));
        assert!(matches!(
            registry.resolve(None, "laptop"),
            Err(ClusterError::UnrecognizedHost(_))
        ));
    }

    #[test]
    fn test_load_file_takes_precedence() {
        let temp = TempDir::new().unwrap();
        let path = Utf8Path::from_path(temp.path()).unwrap().join("clusters.json");
        fs::write(
            &path,
            r#"[{"host_pattern": "or-slurm", "profile": {"name": "CADES-test", "has_time_limit": true}}]"#,
        )
        .unwrap();

        let mut registry = ClusterRegistry::builtin();
        registry.load_file(&path).unwrap();
        assert_eq!(registry.entries().len(), 3);

        let profile = registry.detect("or-slurm-login01").unwrap();
        assert_eq!(profile.name(), "CADES-test");
        assert!(profile.has_time_limit());
        assert!(!profile.has_memory_limit());
        assert!(profile.mount_paths().is_empty());
    }

    #[test]
    fn test_load_file_rejects_bad_json() {
        let temp = TempDir::new().unwrap();
        let path = Utf8Path::from_path(temp.path()).unwrap().join("clusters.json");
        fs::write(&path, "{not json").unwrap();
        let mut registry = ClusterRegistry::builtin();
        assert!(matches!(registry.load_file(&path), Err(ClusterError::Json(_))));
    }
}
