//! Local host adapter.
//!
//! [`LocalProcessIo`] implements [`HostIo`] directly against the local
//! filesystem and process table. The installer uses it, and it doubles as the
//! reference adapter for hosts that run sherpa in-process.

use crate::error::{Result, SherpaError};
use crate::host::{HostIo, ShellOutput};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Host I/O backed by `std::fs` and `std::process`.
///
/// Relative paths resolve against `root`; absolute paths are used as-is.
pub struct LocalProcessIo {
    root: PathBuf,
}

impl LocalProcessIo {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(p)
        }
    }
}

#[async_trait]
impl HostIo for LocalProcessIo {
    async fn read_text(&self, path: &str) -> Result<String> {
        match std::fs::read_to_string(self.resolve(path)) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(SherpaError::NotFound(path.to_string()))
            }
            Err(e) => Err(SherpaError::HostError(format!("read {}: {}", path, e))),
        }
    }

    async fn write_text(&self, path: &str, content: &str) -> Result<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SherpaError::HostError(format!("mkdir {}: {}", parent.display(), e)))?;
        }
        std::fs::write(&full, content)
            .map_err(|e| SherpaError::HostError(format!("write {}: {}", path, e)))
    }

    async fn replace_text(&self, path: &str, old: &str, new: &str) -> Result<()> {
        let current = self.read_text(path).await?;
        if current != old {
            return Err(SherpaError::HostError(format!(
                "edit {}: current content does not match expected content",
                path
            )));
        }
        self.write_text(path, new).await
    }

    async fn run_shell(&self, command_line: &str) -> Result<ShellOutput> {
        let words = shell_words::split(command_line)
            .map_err(|e| SherpaError::HostError(format!("parse command: {}", e)))?;
        let Some((program, args)) = words.split_first() else {
            return Err(SherpaError::HostError("empty command line".to_string()));
        };

        let output = Command::new(program)
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| SherpaError::HostError(format!("spawn {}: {}", program, e)))?;

        Ok(ShellOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
