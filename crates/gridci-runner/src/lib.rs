//! Local shell execution engine for gridci.
//!
//! Implements the `ExecutionEngine` port by running job commands through
//! `sh -c` on the host. Target environment provisioning stays with a real
//! external engine; this adapter exists for local runs and testing.

pub mod shell;

pub use shell::{EngineConfig, ShellEngine};
