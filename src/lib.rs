//! Sherpa: intent-routed workflow orchestrator plugin core for agentic
//! coding runtimes.
//!
//! A host runtime hands sherpa a user message; sherpa classifies it into a
//! BUILD/DEBUG/REVIEW/PLAN workflow, expands the matching task graph, drives
//! it against the host's sub-agent surface, and persists cross-session state
//! as three section-addressable markdown files. The host supplies all I/O
//! through the traits in [`host`]; [`router::Session`] is the entry point.

pub mod cli;
pub mod commands;
pub mod compat;
pub mod error;
pub mod executor;
pub mod exit_codes;
pub mod host;
pub mod intent;
pub mod memory;
pub mod orchestrator;
pub mod router;

#[cfg(test)]
pub(crate) mod test_support;
