//! oci-sweep - dependency-ordered teardown of an OCI compartment
//!
//! This crate provides the teardown orchestrator (discovery, pre-teardown
//! cleanup, scheduling, deletion, progress accounting and scope
//! finalization) and the `oci-sweep` binary that drives it.

pub mod backoff;
pub mod cli;
pub mod config;
pub mod oci;
pub mod teardown;
pub mod wait;

pub use teardown::Orchestrator;
