//! Message routing and session lifecycle.
//!
//! [`Session`] is the explicit context object a host creates once per
//! running session: it owns the memory store and orchestrator and borrows
//! nothing global. Hosts feed it user messages and lifecycle signals; it
//! decides whether a message starts a workflow and reports the outcome
//! instead of raising, so the host conversation is never blocked.

use crate::executor;
use crate::host::{AgentInvoker, HostIo, TaskTracker};
use crate::intent::{self, Intent};
use crate::memory::MemoryStore;
use crate::orchestrator::TaskOrchestrator;

/// What the router did with one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Not a development request; the host handles it normally.
    Ignored,
    /// A workflow is already active; the message was recorded as a note for
    /// the next persistence pass instead of starting a second workflow.
    Deferred { workflow_id: String },
    /// A workflow ran to completion.
    Completed { workflow_id: String, intent: Intent },
    /// A workflow started and failed; the failure is recorded in memory.
    Failed { workflow_id: String, error: String },
}

/// One session's routing state and collaborators.
pub struct Session<IO, A, T>
where
    IO: HostIo,
    A: AgentInvoker,
    T: TaskTracker,
{
    io: IO,
    agents: A,
    tracker: T,
    store: MemoryStore,
    orchestrator: TaskOrchestrator,
}

impl<IO, A, T> Session<IO, A, T>
where
    IO: HostIo,
    A: AgentInvoker,
    T: TaskTracker,
{
    pub fn new(io: IO, agents: A, tracker: T, store: MemoryStore) -> Self {
        Self {
            io,
            agents,
            tracker,
            store,
            orchestrator: TaskOrchestrator::new(),
        }
    }

    pub fn orchestrator(&self) -> &TaskOrchestrator {
        &self.orchestrator
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Route one user message.
    pub async fn handle_message(&mut self, message: &str) -> RouteOutcome {
        if !intent::is_development_request(message) {
            tracing::debug!("message is not a development request, ignoring");
            return RouteOutcome::Ignored;
        }

        if let Some(active) = self.orchestrator.check_for_active_workflows() {
            let workflow_id = active.id.clone();
            tracing::info!(
                workflow_id = workflow_id.as_str(),
                "workflow already active, deferring message"
            );
            self.store.accumulate_notes(&[format!(
                "Deferred while workflow {} was active: {}",
                workflow_id, message
            )]);
            return RouteOutcome::Deferred { workflow_id };
        }

        let memory = self.store.load(&self.io).await;
        let classification = intent::classify(message, Some(&memory));
        tracing::info!(
            intent = classification.intent.as_str(),
            confidence = classification.confidence,
            rationale = classification.rationale.as_str(),
            "classified message"
        );

        let first = match self
            .orchestrator
            .create_workflow(&self.tracker, message, classification.intent, memory)
            .await
        {
            Ok(first) => first,
            Err(e) => {
                tracing::error!(error = %e, "could not create workflow");
                return RouteOutcome::Failed {
                    workflow_id: String::new(),
                    error: e.to_string(),
                };
            }
        };
        let workflow_id = first.workflow_id;

        match executor::run(
            &self.io,
            &self.agents,
            &self.tracker,
            &mut self.store,
            &mut self.orchestrator,
            &workflow_id,
        )
        .await
        {
            Ok(()) => RouteOutcome::Completed {
                workflow_id,
                intent: classification.intent,
            },
            Err(e) => RouteOutcome::Failed {
                workflow_id,
                error: e.to_string(),
            },
        }
    }

    /// Host signal: a session started. Makes sure the memory directory
    /// exists before anything tries to persist into it.
    pub async fn on_session_start(&mut self) {
        self.store.ensure_directory(&self.io).await;
    }

    /// Host signal: conversation history is about to be truncated. Flushes
    /// buffered notes so they survive the compaction.
    pub async fn on_compaction(&mut self) {
        if let Err(e) = self.store.save_compaction_checkpoint(&self.io).await {
            tracing::error!(error = %e, "compaction checkpoint failed");
        }
    }

    /// Host signal: an observation worth remembering (tool output, agent
    /// side-channel). Buffered until the next persistence pass.
    pub fn on_note(&mut self, note: &str) {
        self.store.accumulate_notes(&[note.to_string()]);
    }
}
