//! Implementation of the `sherpa init` command.
//!
//! Installs sherpa into the current project:
//!
//! 1. Creates `.sherpa/` with a `config.yaml`
//! 2. Creates the memory directory
//! 3. Seeds `activeContext.md`, `patterns.md`, and `progress.md` with their
//!    default templates
//!
//! The command is idempotent: existing files are left alone unless
//! `--force` is passed.

use crate::cli::InitArgs;
use crate::compat::LocalProcessIo;
use crate::error::{Result, SherpaError};
use crate::host::HostIo;
use crate::memory::paths;
use crate::memory::store;
use serde::{Deserialize, Serialize};
use std::path::Path;

const CONFIG_PATH: &str = ".sherpa/config.yaml";

/// Installed configuration, serialized as YAML.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Project-relative directory holding the memory files.
    pub memory_dir: String,
    /// Default tracing filter for hosts that run sherpa in-process.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            memory_dir: paths::CURRENT_MEMORY_DIR.to_string(),
            log_filter: "sherpa=info".to_string(),
        }
    }
}

/// Execute the `sherpa init` command in the current directory.
pub async fn cmd_init(args: InitArgs) -> Result<()> {
    let root = std::env::current_dir()
        .map_err(|e| SherpaError::UserError(format!("cannot resolve current directory: {}", e)))?;
    let memory_dir = init_at(&root, &args).await?;

    println!("Initialized sherpa.");
    println!();
    println!("Configuration: {}", CONFIG_PATH);
    println!("Memory files:");
    for path in paths::memory_file_paths(&memory_dir) {
        println!("  {}", path);
    }
    Ok(())
}

/// Install config and memory files under `root`. Returns the memory
/// directory that was used.
async fn init_at(root: &Path, args: &InitArgs) -> Result<String> {
    let io = LocalProcessIo::new(root);

    if !args.force && io.read_text(CONFIG_PATH).await.is_ok() {
        return Err(SherpaError::UserError(format!(
            "{} already exists. Use --force to overwrite.",
            CONFIG_PATH
        )));
    }

    let memory_dir = match &args.memory_dir {
        Some(dir) => {
            // Sanitizing falls back to the default on unsafe input; an
            // explicit CLI argument should fail loudly instead.
            let sanitized = paths::sanitize_memory_dir(dir);
            if sanitized == paths::CURRENT_MEMORY_DIR && dir.trim() != paths::CURRENT_MEMORY_DIR {
                return Err(SherpaError::UserError(format!(
                    "invalid memory directory '{}': must be a relative path inside the project",
                    dir
                )));
            }
            sanitized
        }
        None => paths::preferred_memory_dir(root, None),
    };

    let config = Config {
        memory_dir: memory_dir.clone(),
        ..Default::default()
    };
    let yaml = serde_yaml::to_string(&config)
        .map_err(|e| SherpaError::HostError(format!("serialize config: {}", e)))?;
    io.write_text(CONFIG_PATH, &yaml).await?;

    store::write_default_files(&io, &memory_dir, args.force).await?;
    Ok(memory_dir)
}
