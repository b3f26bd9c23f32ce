//! CLI argument parsing for sherpa.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Args, Parser, Subcommand};

/// Sherpa: intent-routed workflow orchestrator plugin core for agentic
/// coding runtimes.
///
/// Sherpa classifies development requests into BUILD/DEBUG/REVIEW/PLAN
/// workflows, drives the matching task graph against the host's sub-agents,
/// and keeps cross-session state in three markdown memory files.
#[derive(Parser, Debug)]
#[command(name = "sherpa")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for sherpa.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install sherpa into the current project.
    ///
    /// Creates `.sherpa/config.yaml` and seeds the three memory files
    /// (activeContext.md, patterns.md, progress.md) with their default
    /// templates.
    Init(InitArgs),
}

/// Arguments for the `init` command.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration and memory files.
    #[arg(long)]
    pub force: bool,

    /// Project-relative directory for the memory files.
    #[arg(long = "memory-dir")]
    pub memory_dir: Option<String>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_debug_assert() {
        // Verifies the CLI arguments configuration is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_init() {
        let cli = Cli::try_parse_from(["sherpa", "init"]).unwrap();
        let Command::Init(args) = cli.command;
        assert!(!args.force);
        assert!(args.memory_dir.is_none());
    }

    #[test]
    fn parse_init_with_flags() {
        let cli = Cli::try_parse_from([
            "sherpa",
            "init",
            "--force",
            "--memory-dir",
            "notes/memory",
        ])
        .unwrap();
        let Command::Init(args) = cli.command;
        assert!(args.force);
        assert_eq!(args.memory_dir.as_deref(), Some("notes/memory"));
    }

    #[test]
    fn missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["sherpa"]).is_err());
    }
}
