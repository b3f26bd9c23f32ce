//! Command implementations for sherpa.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations.

mod init;

use crate::cli::Command;
use crate::error::Result;

/// Dispatch a command to its implementation.
pub async fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Init(args) => init::cmd_init(args).await,
    }
}
