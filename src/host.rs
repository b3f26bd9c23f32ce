//! Collaborator traits for the host runtime.
//!
//! Sherpa never touches the filesystem, shell, sub-agents, or the external
//! task tracker directly. Everything goes through these three traits so the
//! host runtime (or a test harness) can supply the concrete behavior.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Output of a shell command run through the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// File and shell access provided by the host runtime.
///
/// `read_text` must return [`crate::error::SherpaError::NotFound`] when the
/// file is absent; callers rely on that to distinguish "missing" from
/// "broken". `replace_text` performs an exact old-for-new content swap and
/// fails when `old` does not match the current file content.
#[async_trait]
pub trait HostIo: Send + Sync {
    async fn read_text(&self, path: &str) -> Result<String>;

    async fn write_text(&self, path: &str, content: &str) -> Result<()>;

    async fn replace_text(&self, path: &str, old: &str, new: &str) -> Result<()>;

    async fn run_shell(&self, command_line: &str) -> Result<ShellOutput>;
}

/// A single agent invocation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeRequest {
    /// Fully assembled prompt for the sub-agent.
    pub prompt: String,
    /// Task node id this invocation executes, for host-side correlation.
    pub task_id: String,
}

/// Sub-agent invocation provided by the host runtime.
///
/// The result is an opaque payload; sherpa only inspects string results for
/// a `### Memory Notes` section. An `Err` is a hard task failure.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    async fn invoke(&self, agent: &str, request: InvokeRequest) -> Result<serde_json::Value>;
}

/// Status vocabulary shared with the external task tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerStatus {
    Pending,
    InProgress,
    Completed,
    Blocked,
}

/// Payload for creating a tracker task mirroring a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTrackerTask {
    pub subject: String,
    pub description: String,
    pub active_form: String,
}

/// External task tracker mirror.
///
/// All tracker calls are best-effort from the caller's perspective: local
/// workflow state is authoritative and a tracker failure never fails the
/// workflow.
#[async_trait]
pub trait TaskTracker: Send + Sync {
    async fn create_task(&self, task: NewTrackerTask) -> Result<String>;

    async fn update_task(&self, task_id: &str, status: TrackerStatus) -> Result<()>;
}
