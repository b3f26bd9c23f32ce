//! Workflow execution.
//!
//! Walks the task graph for an intent in its required order, invoking the
//! agent collaborator per node. The BUILD review step fans out to two agents
//! concurrently; every other step is sequential. A failed invocation marks
//! its node blocked and aborts the walk, after which the single top-level
//! failure path records the failure into memory and fails the workflow.

pub mod prompt;

use crate::error::{Result, SherpaError};
use crate::host::{AgentInvoker, HostIo, InvokeRequest, TaskTracker};
use crate::intent::Intent;
use crate::memory::store::{ActiveContextUpdate, MemoryStore, ProgressUpdate};
use crate::orchestrator::{AgentRole, TaskOrchestrator, TaskStatus};
use std::sync::Arc;

/// Run the workflow to completion or failure. On success the memory-update
/// node persists accumulated notes and the workflow completes; on failure
/// the failure is recorded into memory, the workflow is failed, and a
/// `WorkflowError` carrying the causing error is returned.
pub async fn run(
    io: &dyn HostIo,
    agents: &dyn AgentInvoker,
    tracker: &dyn TaskTracker,
    store: &mut MemoryStore,
    orchestrator: &mut TaskOrchestrator,
    workflow_id: &str,
) -> Result<()> {
    let (intent, user_request, memory) = {
        let workflow = orchestrator
            .workflow(workflow_id)
            .ok_or_else(|| SherpaError::UserError(format!("unknown workflow {}", workflow_id)))?;
        (
            workflow.intent,
            workflow.user_request.clone(),
            Arc::clone(&workflow.memory),
        )
    };

    tracing::info!(workflow_id, intent = intent.as_str(), "executing workflow");

    let walked = walk_graph(
        agents,
        tracker,
        store,
        orchestrator,
        workflow_id,
        intent,
        &user_request,
        &memory,
    )
    .await;

    let outcome = match walked {
        Ok(()) => finalize(io, tracker, store, orchestrator, workflow_id).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => {
            orchestrator.complete_workflow(workflow_id);
            Ok(())
        }
        Err(e) => {
            record_failure(io, store, workflow_id, &e).await;
            orchestrator.fail_workflow(workflow_id, &e.to_string());
            Err(SherpaError::WorkflowError(e.to_string()))
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn walk_graph(
    agents: &dyn AgentInvoker,
    tracker: &dyn TaskTracker,
    store: &mut MemoryStore,
    orchestrator: &mut TaskOrchestrator,
    workflow_id: &str,
    intent: Intent,
    user_request: &str,
    memory: &crate::memory::Memory,
) -> Result<()> {
    match intent {
        Intent::Build => {
            invoke_one(
                agents,
                tracker,
                store,
                orchestrator,
                workflow_id,
                AgentRole::Builder,
                prompt::builder_prompt(user_request, memory),
            )
            .await?;

            invoke_review_pair(
                agents,
                tracker,
                store,
                orchestrator,
                workflow_id,
                prompt::review_and_hunt_prompt(user_request, memory),
            )
            .await?;

            invoke_one(
                agents,
                tracker,
                store,
                orchestrator,
                workflow_id,
                AgentRole::Verifier,
                prompt::verifier_prompt(workflow_id),
            )
            .await
        }
        Intent::Debug => {
            invoke_one(
                agents,
                tracker,
                store,
                orchestrator,
                workflow_id,
                AgentRole::Investigator,
                prompt::debug_prompt(user_request, memory),
            )
            .await?;
            invoke_one(
                agents,
                tracker,
                store,
                orchestrator,
                workflow_id,
                AgentRole::Reviewer,
                prompt::review_fix_prompt(user_request, memory),
            )
            .await?;
            invoke_one(
                agents,
                tracker,
                store,
                orchestrator,
                workflow_id,
                AgentRole::Verifier,
                prompt::verifier_prompt(workflow_id),
            )
            .await
        }
        Intent::Review => {
            invoke_one(
                agents,
                tracker,
                store,
                orchestrator,
                workflow_id,
                AgentRole::Reviewer,
                prompt::review_prompt(user_request, memory),
            )
            .await
        }
        Intent::Plan => {
            invoke_one(
                agents,
                tracker,
                store,
                orchestrator,
                workflow_id,
                AgentRole::Planner,
                prompt::plan_prompt(user_request, memory),
            )
            .await
        }
    }
}

/// Invoke a single agent for its node: in_progress, invoke, then completed
/// with the result attached, or blocked on failure.
async fn invoke_one(
    agents: &dyn AgentInvoker,
    tracker: &dyn TaskTracker,
    store: &mut MemoryStore,
    orchestrator: &mut TaskOrchestrator,
    workflow_id: &str,
    role: AgentRole,
    prompt_text: String,
) -> Result<()> {
    let task_id = format!("{}-{}", workflow_id, role.node_suffix());
    tracing::info!(agent = role.agent_name(), task_id = task_id.as_str(), "invoking agent");

    orchestrator
        .update_task_status(tracker, &task_id, TaskStatus::InProgress, None)
        .await;

    let request = InvokeRequest {
        prompt: prompt_text,
        task_id: task_id.clone(),
    };
    match agents.invoke(role.agent_name(), request).await {
        Ok(result) => {
            store.accumulate_notes(&prompt::extract_memory_notes(&result));
            orchestrator
                .update_task_status(tracker, &task_id, TaskStatus::Completed, Some(result))
                .await;
            Ok(())
        }
        Err(e) => {
            tracing::error!(agent = role.agent_name(), error = %e, "agent failed");
            orchestrator
                .update_task_status(tracker, &task_id, TaskStatus::Blocked, None)
                .await;
            Err(e)
        }
    }
}

/// The BUILD parallel step: reviewer and hunter run concurrently with a
/// shared prompt. Both invocations are awaited and both statuses recorded
/// before the first failure propagates, so a surviving sibling never keeps a
/// stale in_progress status.
async fn invoke_review_pair(
    agents: &dyn AgentInvoker,
    tracker: &dyn TaskTracker,
    store: &mut MemoryStore,
    orchestrator: &mut TaskOrchestrator,
    workflow_id: &str,
    shared_prompt: String,
) -> Result<()> {
    let roles = [AgentRole::Reviewer, AgentRole::Hunter];
    let task_ids: Vec<String> = roles
        .iter()
        .map(|r| format!("{}-{}", workflow_id, r.node_suffix()))
        .collect();

    for task_id in &task_ids {
        orchestrator
            .update_task_status(tracker, task_id, TaskStatus::InProgress, None)
            .await;
    }

    let (reviewer_result, hunter_result) = futures::join!(
        agents.invoke(
            roles[0].agent_name(),
            InvokeRequest {
                prompt: shared_prompt.clone(),
                task_id: task_ids[0].clone(),
            },
        ),
        agents.invoke(
            roles[1].agent_name(),
            InvokeRequest {
                prompt: shared_prompt,
                task_id: task_ids[1].clone(),
            },
        ),
    );

    let mut first_error = None;
    for (task_id, result) in task_ids.iter().zip([reviewer_result, hunter_result]) {
        match result {
            Ok(value) => {
                store.accumulate_notes(&prompt::extract_memory_notes(&value));
                orchestrator
                    .update_task_status(tracker, task_id, TaskStatus::Completed, Some(value))
                    .await;
            }
            Err(e) => {
                orchestrator
                    .update_task_status(tracker, task_id, TaskStatus::Blocked, None)
                    .await;
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Workflow-final memory update: the orchestrating process persists notes
/// and records completion; no sub-agent runs for this node.
async fn finalize(
    io: &dyn HostIo,
    tracker: &dyn TaskTracker,
    store: &mut MemoryStore,
    orchestrator: &mut TaskOrchestrator,
    workflow_id: &str,
) -> Result<()> {
    let task_id = format!(
        "{}-{}",
        workflow_id,
        AgentRole::MemoryUpdate.node_suffix()
    );
    orchestrator
        .update_task_status(tracker, &task_id, TaskStatus::InProgress, None)
        .await;

    store.persist_accumulated_notes(io).await?;
    store
        .update_progress(
            io,
            ProgressUpdate {
                completed: vec![format!("Workflow {} completed with verification", workflow_id)],
                ..Default::default()
            },
        )
        .await?;

    orchestrator
        .update_task_status(tracker, &task_id, TaskStatus::Completed, None)
        .await;
    Ok(())
}

/// Record a workflow failure into persistent memory. Recording failures are
/// logged but never mask the original error.
async fn record_failure(
    io: &dyn HostIo,
    store: &mut MemoryStore,
    workflow_id: &str,
    error: &SherpaError,
) {
    let message = error.to_string();
    let update = ActiveContextUpdate {
        recent_changes: vec![format!("Workflow {} failed: {}", workflow_id, message)],
        next_steps: vec![format!("Investigate workflow failure: {}", message)],
        ..Default::default()
    };
    if let Err(e) = store.update_active_context(io, update).await {
        tracing::error!(workflow_id, error = %e, "could not record workflow failure");
    }
}
