use crate::error::{Result, SherpaError};
use crate::host::{
    AgentInvoker, HostIo, InvokeRequest, NewTrackerTask, ShellOutput, TaskTracker, TrackerStatus,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory [`HostIo`] with failure injection and an operation log.
pub(crate) struct MemoryHostIo {
    files: Mutex<HashMap<String, String>>,
    operations: Mutex<Vec<String>>,
    fail_writes: Mutex<bool>,
    fail_shell: Mutex<bool>,
}

impl MemoryHostIo {
    pub(crate) fn new() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            operations: Mutex::new(Vec::new()),
            fail_writes: Mutex::new(false),
            fail_shell: Mutex::new(false),
        }
    }

    pub(crate) fn seed(&self, path: &str, content: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
    }

    pub(crate) fn content(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub(crate) fn operations(&self) -> Vec<String> {
        self.operations.lock().unwrap().clone()
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }

    pub(crate) fn fail_shell(&self, fail: bool) {
        *self.fail_shell.lock().unwrap() = fail;
    }

    fn record(&self, op: String) {
        self.operations.lock().unwrap().push(op);
    }
}

#[async_trait]
impl HostIo for MemoryHostIo {
    async fn read_text(&self, path: &str) -> Result<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| SherpaError::NotFound(path.to_string()))
    }

    async fn write_text(&self, path: &str, content: &str) -> Result<()> {
        if *self.fail_writes.lock().unwrap() {
            return Err(SherpaError::HostError(format!("write {} rejected", path)));
        }
        self.record(format!("write {}", path));
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
        Ok(())
    }

    async fn replace_text(&self, path: &str, old: &str, new: &str) -> Result<()> {
        if *self.fail_writes.lock().unwrap() {
            return Err(SherpaError::HostError(format!("edit {} rejected", path)));
        }
        let mut files = self.files.lock().unwrap();
        let current = files
            .get(path)
            .ok_or_else(|| SherpaError::NotFound(path.to_string()))?;
        if current != old {
            return Err(SherpaError::HostError(format!(
                "edit {}: stale old content",
                path
            )));
        }
        files.insert(path.to_string(), new.to_string());
        drop(files);
        self.record(format!("edit {}", path));
        Ok(())
    }

    async fn run_shell(&self, command_line: &str) -> Result<ShellOutput> {
        if *self.fail_shell.lock().unwrap() {
            return Err(SherpaError::HostError("shell unavailable".to_string()));
        }
        self.record(format!("shell {}", command_line));
        Ok(ShellOutput {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

/// [`AgentInvoker`] that records invocations and returns canned results.
///
/// Results are JSON values per agent name; unspecified agents return a plain
/// acknowledgement string. Agents listed in `failing` return an error.
pub(crate) struct ScriptedInvoker {
    results: Mutex<HashMap<String, serde_json::Value>>,
    failing: Mutex<Vec<String>>,
    invocations: Mutex<Vec<(String, InvokeRequest)>>,
}

impl ScriptedInvoker {
    pub(crate) fn new() -> Self {
        Self {
            results: Mutex::new(HashMap::new()),
            failing: Mutex::new(Vec::new()),
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn respond_with(&self, agent: &str, result: serde_json::Value) {
        self.results
            .lock()
            .unwrap()
            .insert(agent.to_string(), result);
    }

    pub(crate) fn fail_agent(&self, agent: &str) {
        self.failing.lock().unwrap().push(agent.to_string());
    }

    pub(crate) fn invocations(&self) -> Vec<(String, InvokeRequest)> {
        self.invocations.lock().unwrap().clone()
    }

    pub(crate) fn invoked_agents(&self) -> Vec<String> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .map(|(agent, _)| agent.clone())
            .collect()
    }
}

#[async_trait]
impl AgentInvoker for ScriptedInvoker {
    async fn invoke(&self, agent: &str, request: InvokeRequest) -> Result<serde_json::Value> {
        self.invocations
            .lock()
            .unwrap()
            .push((agent.to_string(), request));
        if self.failing.lock().unwrap().iter().any(|a| a == agent) {
            return Err(SherpaError::AgentError(format!("{} exploded", agent)));
        }
        Ok(self
            .results
            .lock()
            .unwrap()
            .get(agent)
            .cloned()
            .unwrap_or_else(|| serde_json::Value::String(format!("{} done", agent))))
    }
}

/// [`TaskTracker`] that records mirror calls and can be toggled to fail.
pub(crate) struct RecordingTracker {
    calls: Mutex<Vec<String>>,
    fail: Mutex<bool>,
    next_id: Mutex<u64>,
}

impl RecordingTracker {
    pub(crate) fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: Mutex::new(false),
            next_id: Mutex::new(1),
        }
    }

    pub(crate) fn fail_calls(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskTracker for RecordingTracker {
    async fn create_task(&self, task: NewTrackerTask) -> Result<String> {
        if *self.fail.lock().unwrap() {
            return Err(SherpaError::HostError("tracker offline".to_string()));
        }
        let mut next = self.next_id.lock().unwrap();
        let id = format!("trk-{}", *next);
        *next += 1;
        self.calls
            .lock()
            .unwrap()
            .push(format!("create {} {}", id, task.subject));
        Ok(id)
    }

    async fn update_task(&self, task_id: &str, status: TrackerStatus) -> Result<()> {
        if *self.fail.lock().unwrap() {
            return Err(SherpaError::HostError("tracker offline".to_string()));
        }
        self.calls
            .lock()
            .unwrap()
            .push(format!("update {} {:?}", task_id, status));
        Ok(())
    }
}
