//! Task graphs and workflow state.
//!
//! An intent expands into a fixed DAG of agent task nodes with blocking
//! edges. The orchestrator owns the authoritative in-process state for every
//! workflow; the external task tracker only mirrors it. Mirror calls that
//! fail land in an outbox where they can be inspected or retried instead of
//! disappearing into a log line.

use crate::error::Result;
use crate::host::{NewTrackerTask, TaskTracker, TrackerStatus};
use crate::intent::Intent;
use crate::memory::{Memory, MemoryDocument};
use chrono::{SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

/// Lifecycle status of one task node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Blocked,
}

impl TaskStatus {
    fn as_tracker(self) -> TrackerStatus {
        match self {
            TaskStatus::Pending => TrackerStatus::Pending,
            TaskStatus::InProgress => TrackerStatus::InProgress,
            TaskStatus::Completed => TrackerStatus::Completed,
            TaskStatus::Blocked => TrackerStatus::Blocked,
        }
    }
}

/// Lifecycle status of a whole workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Active,
    Completed,
    Failed,
}

/// Sub-agent roles a task node can be assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentRole {
    Builder,
    Reviewer,
    Hunter,
    Verifier,
    Investigator,
    Planner,
    /// The orchestrating process itself persists memory; no sub-agent runs.
    MemoryUpdate,
}

impl AgentRole {
    /// Agent name used when invoking the host's sub-agent surface.
    pub fn agent_name(&self) -> &'static str {
        match self {
            AgentRole::Builder => "component-builder",
            AgentRole::Reviewer => "code-reviewer",
            AgentRole::Hunter => "silent-failure-hunter",
            AgentRole::Verifier => "integration-verifier",
            AgentRole::Investigator => "bug-investigator",
            AgentRole::Planner => "planner",
            AgentRole::MemoryUpdate => "router",
        }
    }

    /// Suffix appended to the workflow id to form the node id.
    pub fn node_suffix(&self) -> &'static str {
        match self {
            AgentRole::Builder => "builder",
            AgentRole::Reviewer => "reviewer",
            AgentRole::Hunter => "hunter",
            AgentRole::Verifier => "verifier",
            AgentRole::Investigator => "investigator",
            AgentRole::Planner => "planner",
            AgentRole::MemoryUpdate => "memory-update",
        }
    }
}

/// One node in a workflow task graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskNode {
    pub id: String,
    pub workflow_id: String,
    pub subject: String,
    pub description: String,
    pub status: TaskStatus,
    pub role: AgentRole,
    pub blocked_by: Vec<String>,
    pub active_form: String,
    pub result: Option<serde_json::Value>,
}

/// A workflow: the graph plus the request and memory snapshot it came from.
#[derive(Debug, Clone)]
pub struct WorkflowTask {
    pub id: String,
    /// Parent task id in the external tracker, `local-*` when the mirror
    /// create failed.
    pub tracker_task_id: String,
    pub intent: Intent,
    pub user_request: String,
    pub memory: Arc<Memory>,
    pub tasks: Vec<TaskNode>,
    pub created_at: String,
    pub status: WorkflowStatus,
    pub failure: Option<String>,
}

impl WorkflowTask {
    pub fn task(&self, id: &str) -> Option<&TaskNode> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn node_id(&self, role: AgentRole) -> String {
        format!("{}-{}", self.id, role.node_suffix())
    }
}

/// A mirror call that failed and can be retried.
#[derive(Debug, Clone)]
pub enum MirrorOp {
    Create {
        workflow_id: String,
        task: NewTrackerTask,
    },
    Update {
        task_id: String,
        status: TrackerStatus,
    },
}

static WORKFLOW_COUNTER: AtomicU64 = AtomicU64::new(0);

fn base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

fn new_workflow_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let counter = WORKFLOW_COUNTER.fetch_add(1, Ordering::Relaxed);
    // Unique within a process; cross-host collisions accepted as negligible.
    format!("WF-{}-{}", millis, base36(millis.rotate_left(17) ^ (counter << 8 | 0x2a)))
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Owns all workflow state for one session.
pub struct TaskOrchestrator {
    workflows: HashMap<String, WorkflowTask>,
    /// Insertion order of workflow ids, for deterministic iteration.
    order: Vec<String>,
    outbox: Vec<MirrorOp>,
}

impl Default for TaskOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskOrchestrator {
    pub fn new() -> Self {
        Self {
            workflows: HashMap::new(),
            order: Vec::new(),
            outbox: Vec::new(),
        }
    }

    /// Build and store a workflow for the intent and return its first task
    /// node. The parent task is mirrored to the tracker; a mirror failure
    /// falls back to a local id and lands in the outbox.
    pub async fn create_workflow(
        &mut self,
        tracker: &dyn TaskTracker,
        user_request: &str,
        intent: Intent,
        memory: Arc<Memory>,
    ) -> Result<TaskNode> {
        let workflow_id = new_workflow_id();
        let created_at = now_timestamp();
        let tasks = build_task_graph(&workflow_id, intent, user_request, &memory);

        let mut workflow = WorkflowTask {
            id: workflow_id.clone(),
            tracker_task_id: String::new(),
            intent,
            user_request: user_request.to_string(),
            memory,
            tasks,
            created_at,
            status: WorkflowStatus::Active,
            failure: None,
        };

        let parent = NewTrackerTask {
            subject: format!("{}: {}", intent, truncate_chars(user_request, 50)),
            description: workflow_description(&workflow),
            active_form: format!("Starting {} workflow", intent),
        };
        workflow.tracker_task_id = match tracker.create_task(parent.clone()).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(workflow_id = workflow.id.as_str(), error = %e, "tracker create failed, keeping local id");
                self.outbox.push(MirrorOp::Create {
                    workflow_id: workflow.id.clone(),
                    task: parent,
                });
                format!("local-{}", Utc::now().timestamp_millis())
            }
        };

        tracing::info!(
            workflow_id = workflow.id.as_str(),
            intent = intent.as_str(),
            tasks = workflow.tasks.len(),
            "created workflow"
        );

        let first = workflow.tasks[0].clone();
        self.order.push(workflow.id.clone());
        self.workflows.insert(workflow.id.clone(), workflow);
        Ok(first)
    }

    pub fn workflow(&self, id: &str) -> Option<&WorkflowTask> {
        self.workflows.get(id)
    }

    /// Update a task's local status (authoritative) and mirror it to the
    /// tracker (best-effort; failures go to the outbox).
    pub async fn update_task_status(
        &mut self,
        tracker: &dyn TaskTracker,
        task_id: &str,
        status: TaskStatus,
        result: Option<serde_json::Value>,
    ) {
        for workflow in self.workflows.values_mut() {
            if let Some(task) = workflow.tasks.iter_mut().find(|t| t.id == task_id) {
                task.status = status;
                if result.is_some() {
                    task.result = result;
                }
                break;
            }
        }

        if let Err(e) = tracker.update_task(task_id, status.as_tracker()).await {
            tracing::warn!(task_id, error = %e, "tracker update failed, queued for retry");
            self.outbox.push(MirrorOp::Update {
                task_id: task_id.to_string(),
                status: status.as_tracker(),
            });
        }
    }

    /// Pending tasks whose blockers have all completed, across active
    /// workflows, in insertion order.
    pub fn runnable_tasks(&self) -> Vec<&TaskNode> {
        let mut runnable = Vec::new();
        for id in &self.order {
            let Some(workflow) = self.workflows.get(id) else {
                continue;
            };
            if workflow.status != WorkflowStatus::Active {
                continue;
            }
            for task in &workflow.tasks {
                if task.status != TaskStatus::Pending {
                    continue;
                }
                let unblocked = task.blocked_by.iter().all(|blocker| {
                    workflow
                        .task(blocker)
                        .is_some_and(|t| t.status == TaskStatus::Completed)
                });
                if unblocked {
                    runnable.push(task);
                }
            }
        }
        runnable
    }

    /// First active workflow that still has pending tasks, if any.
    pub fn check_for_active_workflows(&self) -> Option<&WorkflowTask> {
        self.order
            .iter()
            .filter_map(|id| self.workflows.get(id))
            .find(|w| {
                w.status == WorkflowStatus::Active
                    && w.tasks.iter().any(|t| t.status == TaskStatus::Pending)
            })
    }

    pub fn complete_workflow(&mut self, workflow_id: &str) {
        if let Some(workflow) = self.workflows.get_mut(workflow_id) {
            workflow.status = WorkflowStatus::Completed;
            tracing::info!(workflow_id, "workflow completed");
        }
    }

    pub fn fail_workflow(&mut self, workflow_id: &str, reason: &str) {
        if let Some(workflow) = self.workflows.get_mut(workflow_id) {
            workflow.status = WorkflowStatus::Failed;
            workflow.failure = Some(reason.to_string());
            tracing::error!(workflow_id, reason, "workflow failed");
        }
    }

    /// Mirror calls that failed and have not been retried yet.
    pub fn pending_mirror_ops(&self) -> &[MirrorOp] {
        &self.outbox
    }

    /// Retry every queued mirror call; ops that fail again stay queued.
    pub async fn retry_mirror_ops(&mut self, tracker: &dyn TaskTracker) {
        let ops = std::mem::take(&mut self.outbox);
        for op in ops {
            let outcome = match &op {
                MirrorOp::Create { workflow_id, task } => {
                    match tracker.create_task(task.clone()).await {
                        Ok(id) => {
                            if let Some(workflow) = self.workflows.get_mut(workflow_id) {
                                workflow.tracker_task_id = id;
                            }
                            Ok(())
                        }
                        Err(e) => Err(e),
                    }
                }
                MirrorOp::Update { task_id, status } => tracker.update_task(task_id, *status).await,
            };
            if outcome.is_err() {
                self.outbox.push(op);
            }
        }
    }
}

static PLAN_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"- Plan:\s*`([^`]+)`").expect("plan reference pattern"));

/// Extract a plan file path from the activeContext References section, when
/// one is recorded as `` - Plan: `path` ``.
pub fn extract_plan_file(memory: &Memory) -> Option<String> {
    let doc = MemoryDocument::parse(&memory.active_context);
    let references = doc.section_text("References");
    PLAN_REFERENCE
        .captures(&references)
        .map(|caps| caps[1].to_string())
}

fn build_task_graph(
    workflow_id: &str,
    intent: Intent,
    user_request: &str,
    memory: &Memory,
) -> Vec<TaskNode> {
    let node = |role: AgentRole, subject: &str, description: String, blocked_by: Vec<AgentRole>, active_form: &str| {
        TaskNode {
            id: format!("{}-{}", workflow_id, role.node_suffix()),
            workflow_id: workflow_id.to_string(),
            subject: subject.to_string(),
            description,
            status: TaskStatus::Pending,
            role,
            blocked_by: blocked_by
                .into_iter()
                .map(|r| format!("{}-{}", workflow_id, r.node_suffix()))
                .collect(),
            active_form: active_form.to_string(),
            result: None,
        }
    };

    let mut tasks = match intent {
        Intent::Build => vec![
            node(
                AgentRole::Builder,
                "component-builder: Implement feature",
                format!(
                    "Build feature with TDD: {}\n\nPlan: {}",
                    user_request,
                    extract_plan_file(memory).unwrap_or_else(|| "N/A".to_string())
                ),
                vec![],
                "Building components with TDD",
            ),
            node(
                AgentRole::Reviewer,
                "code-reviewer: Review implementation",
                "Review code quality, patterns, security".to_string(),
                vec![AgentRole::Builder],
                "Reviewing code quality",
            ),
            node(
                AgentRole::Hunter,
                "silent-failure-hunter: Hunt edge cases",
                "Find silent failures and edge cases".to_string(),
                vec![AgentRole::Builder],
                "Hunting for failures",
            ),
            node(
                AgentRole::Verifier,
                "integration-verifier: Verify implementation",
                "End-to-end validation of the implementation".to_string(),
                vec![AgentRole::Reviewer, AgentRole::Hunter],
                "Verifying integration",
            ),
        ],
        Intent::Debug => vec![
            node(
                AgentRole::Investigator,
                "bug-investigator: Investigate issue",
                format!("Debug issue with log-first approach: {}", user_request),
                vec![],
                "Investigating bug",
            ),
            node(
                AgentRole::Reviewer,
                "code-reviewer: Validate fix",
                "Review fix for correctness and quality".to_string(),
                vec![AgentRole::Investigator],
                "Reviewing fix",
            ),
            node(
                AgentRole::Verifier,
                "integration-verifier: Verify fix",
                "Verify the fix resolves the issue".to_string(),
                vec![AgentRole::Reviewer],
                "Verifying fix",
            ),
        ],
        Intent::Review => vec![node(
            AgentRole::Reviewer,
            "code-reviewer: Comprehensive review",
            format!("Review code with 80%+ confidence: {}", user_request),
            vec![],
            "Reviewing code",
        )],
        Intent::Plan => vec![node(
            AgentRole::Planner,
            "planner: Create comprehensive plan",
            format!("Create detailed plan: {}", user_request),
            vec![],
            "Creating plan",
        )],
    };

    // Workflow-final memory update, blocked by every other node.
    let all_ids: Vec<String> = tasks.iter().map(|t| t.id.clone()).collect();
    let mut memory_update = node(
        AgentRole::MemoryUpdate,
        "Memory Update",
        "Persist workflow learnings to memory".to_string(),
        vec![],
        "Updating memory",
    );
    memory_update.blocked_by = all_ids;
    tasks.push(memory_update);

    tasks
}

fn workflow_description(workflow: &WorkflowTask) -> String {
    let task_list = workflow
        .tasks
        .iter()
        .map(|t| {
            let blockers = if t.blocked_by.is_empty() {
                String::new()
            } else {
                format!(" [blocked by: {}]", t.blocked_by.join(", "))
            };
            format!("- {} (pending){}", t.subject, blockers)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let loaded = |text: &str| if text.is_empty() { "Empty" } else { "Loaded" };

    format!(
        "User Request: {}\nWorkflow Type: {}\nCreated: {}\n\nTask Hierarchy:\n{}\n\nMemory Context:\n- Active Context: {}\n- Patterns: {}\n- Progress: {}\n\nCheck blocking dependencies before proceeding.\nParallel execution: code-reviewer and silent-failure-hunter can run simultaneously.",
        workflow.user_request,
        workflow.intent,
        workflow.created_at,
        task_list,
        loaded(&workflow.memory.active_context),
        loaded(&workflow.memory.patterns),
        loaded(&workflow.memory.progress),
    )
}
