//! Cluster profiles and command composition for hepsub.
//!
//! This crate knows which cluster a job goes to and how the payload command
//! line is assembled, optionally inside a container.

pub mod cluster;
pub mod container;
pub mod launcher;

pub use cluster::{ClusterEntry, ClusterError, ClusterProfile, ClusterRegistry, read_hostname};
pub use container::{ContainerWrapper, Mount};
pub use launcher::ProcessLauncher;
