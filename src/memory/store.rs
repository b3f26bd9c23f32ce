//! Memory store: load, auto-heal, cache, and section-scoped updates.
//!
//! The store owns the three memory documents as raw text plus a parsed-on-
//! demand section model. Loads are cached; callers may rely on `Arc` identity
//! to detect that no reload happened. Read failures during load are treated
//! as "file does not exist yet"; write and edit failures during updates
//! propagate as hard errors.

use crate::error::Result;
use crate::host::HostIo;
use crate::memory::document::MemoryDocument;
use crate::memory::paths;
use chrono::{SecondsFormat, Utc};
use std::path::PathBuf;
use std::sync::Arc;

/// Sections a non-empty activeContext document must carry.
const ACTIVE_CONTEXT_REQUIRED: [&str; 3] = ["References", "Decisions", "Learnings"];

/// Sections a non-empty progress document must carry.
const PROGRESS_REQUIRED: [&str; 1] = ["Verification"];

const ANCHOR_COMMENT: &str = "<!-- sherpa: Do not rename headings. Used as edit anchors. -->";

/// The three memory documents as loaded text.
#[derive(Debug, Clone)]
pub struct Memory {
    pub active_context: String,
    pub patterns: String,
    pub progress: String,
    /// Timestamp of the load, RFC3339 with millisecond precision.
    pub last_updated: String,
}

impl Memory {
    /// Lower-cased concatenation of all three document bodies, used by the
    /// intent classifier's memory blending.
    pub fn combined_lowercase(&self) -> String {
        format!(
            "{}\n{}\n{}",
            self.active_context, self.patterns, self.progress
        )
        .to_lowercase()
    }
}

/// Named update buckets for the activeContext document.
#[derive(Debug, Default, Clone)]
pub struct ActiveContextUpdate {
    pub recent_changes: Vec<String>,
    pub next_steps: Vec<String>,
    pub decisions: Vec<String>,
    pub learnings: Vec<String>,
}

/// Named update buckets for the progress document. `current_workflow`
/// replaces the section body; the rest append.
#[derive(Debug, Default, Clone)]
pub struct ProgressUpdate {
    pub current_workflow: Vec<String>,
    pub tasks: Vec<String>,
    pub completed: Vec<String>,
    pub verification: Vec<String>,
}

/// Named update buckets for the patterns document.
#[derive(Debug, Default, Clone)]
pub struct PatternsUpdate {
    pub common_gotchas: Vec<String>,
    pub code_conventions: Vec<String>,
    pub architecture_decisions: Vec<String>,
}

/// Owns memory state for one session.
pub struct MemoryStore {
    project_root: PathBuf,
    override_dir: Option<String>,
    cache: Option<Arc<Memory>>,
    pending_notes: Vec<String>,
}

impl MemoryStore {
    pub fn new(project_root: impl Into<PathBuf>, override_dir: Option<String>) -> Self {
        Self {
            project_root: project_root.into(),
            override_dir,
            cache: None,
            pending_notes: Vec::new(),
        }
    }

    /// Construct with the override taken from the process environment.
    pub fn from_env(project_root: impl Into<PathBuf>) -> Self {
        let override_dir = std::env::var(paths::MEMORY_DIR_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty());
        Self::new(project_root, override_dir)
    }

    /// The directory reads and writes target.
    pub fn preferred_dir(&self) -> String {
        paths::preferred_memory_dir(&self.project_root, self.override_dir.as_deref())
    }

    /// Best-effort create of the memory directory. Failures are logged and
    /// swallowed; the directory usually already exists.
    pub async fn ensure_directory(&self, io: &dyn HostIo) {
        let dir = self.preferred_dir();
        match io
            .run_shell(&format!("mkdir -p {}", shell_words::quote(&dir)))
            .await
        {
            Ok(out) if out.exit_code != 0 => {
                tracing::warn!(dir = %dir, stderr = %out.stderr, "memory directory create failed");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(dir = %dir, error = %e, "memory directory create unavailable");
            }
        }
    }

    /// Load the three documents, probing fallback directories per file and
    /// auto-healing missing structure. Returns the cached value unchanged
    /// when one exists.
    pub async fn load(&mut self, io: &dyn HostIo) -> Arc<Memory> {
        if let Some(cached) = &self.cache {
            return Arc::clone(cached);
        }

        let dirs = paths::known_memory_dirs(&self.project_root, self.override_dir.as_deref());
        let mut bodies = [String::new(), String::new(), String::new()];
        for (i, name) in paths::MEMORY_FILE_NAMES.iter().enumerate() {
            for dir in &dirs {
                match io.read_text(&format!("{}/{}", dir, name)).await {
                    Ok(content) => {
                        bodies[i] = content;
                        break;
                    }
                    Err(e) => {
                        if !e.is_not_found() {
                            tracing::warn!(file = %name, dir = %dir, error = %e, "memory read failed, trying fallback");
                        }
                    }
                }
            }
        }

        let now = now_timestamp();
        let [active_context, patterns, progress] = bodies;
        let memory = Memory {
            active_context: heal(
                active_context,
                &ACTIVE_CONTEXT_REQUIRED,
                || default_active_context(&now),
            ),
            patterns: heal(patterns, &[], || default_patterns(&now)),
            progress: heal(progress, &PROGRESS_REQUIRED, || default_progress(&now)),
            last_updated: now,
        };

        let memory = Arc::new(memory);
        self.cache = Some(Arc::clone(&memory));
        memory
    }

    /// Drop the cache, forcing the next load to re-read from disk.
    pub fn clear_cache(&mut self) {
        self.cache = None;
    }

    /// Buffer free-text notes without touching disk.
    pub fn accumulate_notes(&mut self, notes: &[String]) {
        self.pending_notes
            .extend(notes.iter().filter(|n| !n.trim().is_empty()).cloned());
    }

    pub fn has_pending_notes(&self) -> bool {
        !self.pending_notes.is_empty()
    }

    /// Append dated entries to activeContext sections and persist.
    pub async fn update_active_context(
        &mut self,
        io: &dyn HostIo,
        updates: ActiveContextUpdate,
    ) -> Result<()> {
        let memory = self.load(io).await;
        let date = today();
        let mut doc = MemoryDocument::parse(&memory.active_context);
        doc.append_entries("Recent Changes", &updates.recent_changes, &date);
        doc.append_entries("Next Steps", &updates.next_steps, &date);
        doc.append_entries("Decisions", &updates.decisions, &date);
        doc.append_entries("Learnings", &updates.learnings, &date);
        doc.touch_last_updated(&now_timestamp());

        let new_text = doc.serialize();
        self.persist_file(io, "activeContext.md", &new_text).await?;
        self.cache_with(|m| m.active_context = new_text);
        Ok(())
    }

    /// Update progress sections and persist. Current Workflow is replaced,
    /// the other buckets append.
    pub async fn update_progress(&mut self, io: &dyn HostIo, updates: ProgressUpdate) -> Result<()> {
        let memory = self.load(io).await;
        let date = today();
        let mut doc = MemoryDocument::parse(&memory.progress);
        doc.replace_entries("Current Workflow", &updates.current_workflow, &date);
        doc.append_entries("Tasks", &updates.tasks, &date);
        doc.append_entries("Completed", &updates.completed, &date);
        doc.append_entries("Verification", &updates.verification, &date);
        doc.touch_last_updated(&now_timestamp());

        let new_text = doc.serialize();
        self.persist_file(io, "progress.md", &new_text).await?;
        self.cache_with(|m| m.progress = new_text);
        Ok(())
    }

    /// Append dated entries to patterns sections and persist.
    pub async fn update_patterns(&mut self, io: &dyn HostIo, updates: PatternsUpdate) -> Result<()> {
        let memory = self.load(io).await;
        let date = today();
        let mut doc = MemoryDocument::parse(&memory.patterns);
        doc.append_entries("Common Gotchas", &updates.common_gotchas, &date);
        doc.append_entries("Code Conventions", &updates.code_conventions, &date);
        doc.append_entries("Architecture Decisions", &updates.architecture_decisions, &date);
        doc.touch_last_updated(&now_timestamp());

        let new_text = doc.serialize();
        self.persist_file(io, "patterns.md", &new_text).await?;
        self.cache_with(|m| m.patterns = new_text);
        Ok(())
    }

    /// Triage buffered notes into their destination sections, persist, and
    /// clear the buffer. Read-only sub-agents get their findings durably
    /// recorded through this path.
    pub async fn persist_accumulated_notes(&mut self, io: &dyn HostIo) -> Result<()> {
        if self.pending_notes.is_empty() {
            return Ok(());
        }

        let notes = std::mem::take(&mut self.pending_notes);
        let mut verification = Vec::new();
        let mut gotchas = Vec::new();
        let mut learnings = Vec::new();
        for note in notes {
            let lower = note.to_lowercase();
            if lower.contains("verification") || lower.contains("exit code") {
                verification.push(note);
            } else if lower.contains("pattern") || lower.contains("gotcha") {
                gotchas.push(note);
            } else {
                learnings.push(note);
            }
        }

        if !verification.is_empty() {
            self.update_progress(
                io,
                ProgressUpdate {
                    verification,
                    ..Default::default()
                },
            )
            .await?;
        }
        if !gotchas.is_empty() {
            self.update_patterns(
                io,
                PatternsUpdate {
                    common_gotchas: gotchas,
                    ..Default::default()
                },
            )
            .await?;
        }
        if !learnings.is_empty() {
            self.update_active_context(
                io,
                ActiveContextUpdate {
                    learnings,
                    ..Default::default()
                },
            )
            .await?;
        }
        Ok(())
    }

    /// Flush buffered notes before the host truncates conversation history.
    pub async fn save_compaction_checkpoint(&mut self, io: &dyn HostIo) -> Result<()> {
        self.persist_accumulated_notes(io).await
    }

    /// Persist one document: edit in place when the file exists, create it
    /// otherwise. The edit anchors on the content read from disk, which can
    /// be older than the cache when `load` healed structure in memory.
    async fn persist_file(&self, io: &dyn HostIo, file_name: &str, new_text: &str) -> Result<()> {
        let path = format!("{}/{}", self.preferred_dir(), file_name);
        match io.read_text(&path).await {
            Ok(on_disk) => io.replace_text(&path, &on_disk, new_text).await,
            Err(_) => io.write_text(&path, new_text).await,
        }
    }

    fn cache_with(&mut self, apply: impl FnOnce(&mut Memory)) {
        let mut updated = match &self.cache {
            Some(cached) => (**cached).clone(),
            None => return,
        };
        apply(&mut updated);
        updated.last_updated = now_timestamp();
        self.cache = Some(Arc::new(updated));
    }
}

/// Replace an empty body with its default template, and synthesize required
/// sections in a non-empty one.
fn heal(body: String, required: &[&str], default: impl FnOnce() -> String) -> String {
    if body.trim().is_empty() {
        return default();
    }
    let mut doc = MemoryDocument::parse(&body);
    let mut changed = false;
    for header in required {
        if !doc.has_section(header) {
            doc.ensure_section(header);
            changed = true;
        }
    }
    if changed { doc.serialize() } else { body }
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

fn default_active_context(now: &str) -> String {
    format!(
        "# Active Context\n\n{ANCHOR_COMMENT}\n\n## Current Focus\n- [None yet - first workflow]\n\n## Recent Changes\n- [Initial setup]\n\n## Next Steps\n- [Awaiting first task]\n\n## Decisions\n- [No decisions recorded yet]\n\n## Learnings\n- [No learnings yet]\n\n## References\n- Plan: N/A\n- Spec: N/A\n- Research: N/A\n\n## Blockers\n- [None]\n\n## Last Updated\n{now}\n"
    )
}

fn default_patterns(now: &str) -> String {
    format!(
        "# Project Patterns\n\n{ANCHOR_COMMENT}\n\n## Common Gotchas\n- [List project-specific issues and solutions here]\n\n## Code Conventions\n- [Document coding patterns and standards]\n\n## Architecture Decisions\n- [Record important architectural choices]\n\n## Last Updated\n{now}\n"
    )
}

fn default_progress(now: &str) -> String {
    format!(
        "# Progress Tracking\n\n{ANCHOR_COMMENT}\n\n## Current Workflow\n- [None active]\n\n## Tasks\n- [ ] [No tasks yet]\n\n## Completed\n- [ ] [No completions yet]\n\n## Verification\n- [None yet]\n\n## Last Updated\n{now}\n"
    )
}

/// Seed the three default documents through `io`, used by the installer.
/// Existing files are left alone unless `overwrite` is set.
pub async fn write_default_files(io: &dyn HostIo, dir: &str, overwrite: bool) -> Result<()> {
    let now = now_timestamp();
    let defaults = [
        default_active_context(&now),
        default_patterns(&now),
        default_progress(&now),
    ];
    for (path, content) in paths::memory_file_paths(dir).iter().zip(defaults) {
        if !overwrite && io.read_text(path).await.is_ok() {
            continue;
        }
        io.write_text(path, &content).await?;
    }
    Ok(())
}
