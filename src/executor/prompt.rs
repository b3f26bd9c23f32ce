//! Prompt assembly for sub-agent invocations.
//!
//! Builders are pure functions over the user request and loaded memory.
//! Each role gets a fixed instruction template; memory contributes a short
//! extracted summary rather than the full documents.

use crate::memory::{Memory, MemoryDocument};

const SUMMARY_LIMIT: usize = 200;

fn truncated(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= SUMMARY_LIMIT {
        format!("{}...", trimmed)
    } else {
        let cut: String = trimmed.chars().take(SUMMARY_LIMIT).collect();
        format!("{}...", cut)
    }
}

/// Short memory summary embedded in every prompt: current focus, known
/// gotchas, and recent completions, each truncated.
pub fn format_memory_context(memory: &Memory) -> String {
    let mut parts = Vec::new();

    let focus = MemoryDocument::parse(&memory.active_context).section_text("Current Focus");
    if !focus.trim().is_empty() {
        parts.push(format!("Current Focus: {}", focus.trim()));
    }

    let gotchas = MemoryDocument::parse(&memory.patterns).section_text("Common Gotchas");
    if !gotchas.trim().is_empty() {
        parts.push(format!("Common Gotchas: {}", truncated(&gotchas)));
    }

    let completed = MemoryDocument::parse(&memory.progress).section_text("Completed");
    if !completed.trim().is_empty() {
        parts.push(format!("Recent Completions: {}", truncated(&completed)));
    }

    if parts.is_empty() {
        "Memory files empty or not loaded".to_string()
    } else {
        parts.join("\n")
    }
}

pub fn builder_prompt(user_request: &str, memory: &Memory) -> String {
    format!(
        "# Component Builder (TDD)\n\n## User Request\n{}\n\n## Memory Context\n{}\n\n## Instructions\nFollow the TDD cycle strictly:\n1. RED: Write a failing test first (must exit with code 1)\n2. GREEN: Write minimal code to pass (must exit with code 0)\n3. REFACTOR: Clean up while keeping tests green\n4. VERIFY: All tests must pass\n\n## Pre-Implementation Checklist\n- API: CORS? Auth middleware? Input validation? Rate limiting?\n- UI: Loading states? Error boundaries? Accessibility?\n- DB: Migrations? N+1 queries? Transactions?\n- All: Edge cases listed? Error handling planned?\n\n## Output Requirements\n- Provide TDD evidence with exact commands and exit codes\n- Include Dev Journal with decisions and assumptions\n- Include a \"### Memory Notes\" section for workflow persistence",
        user_request,
        format_memory_context(memory)
    )
}

/// Shared prompt for the parallel code-review and silent-failure-hunt step.
pub fn review_and_hunt_prompt(user_request: &str, memory: &Memory) -> String {
    format!(
        "# Code Review & Silent Failure Hunt\n\n## User Request\n{}\n\n## Memory Context\n{}\n\n## Instructions\nAnalyze the implementation from the component-builder. Focus on:\n\n### Code Reviewer Focus\n- Code quality and best practices\n- Security vulnerabilities (OWASP top 10)\n- Performance implications (N+1 queries, etc.)\n- Maintainability and readability\n- API design and contracts\n\n### Silent Failure Hunter Focus\n- Empty catch blocks\n- Missing error handling\n- Unvalidated inputs\n- Resource leaks\n- Race conditions\n- Edge cases not covered by tests\n\n## Confidence Scoring\nOnly report issues with >=80% confidence. Provide file:line citations.\n\n## Output Requirements\n- Critical Issues section with confidence scores\n- Verdict: APPROVED or CHANGES REQUESTED\n- Include a \"### Memory Notes\" section for workflow persistence",
        user_request,
        format_memory_context(memory)
    )
}

pub fn verifier_prompt(workflow_id: &str) -> String {
    format!(
        "# Integration Verifier\n\n## Task Context\n- Workflow: {}\n- Previous agents: code-reviewer, silent-failure-hunter\n\n## Instructions\nVerify the implementation considering ALL findings from previous agents.\n\n### Verification Checklist\n- [ ] All tests pass (exit code 0)\n- [ ] No critical security issues\n- [ ] No silent failures detected\n- [ ] Error handling is comprehensive\n- [ ] Performance is acceptable\n- [ ] Code follows project patterns\n\n### Critical Issues\nAny CRITICAL issues should block PASS verdict.\n\n## Output Requirements\n- Verdict: PASS or FAIL with reasoning\n- Include verification evidence (commands + exit codes)\n- Include a \"### Memory Notes\" section",
        workflow_id
    )
}

pub fn debug_prompt(user_request: &str, memory: &Memory) -> String {
    format!(
        "# Bug Investigator (LOG FIRST)\n\n## User Request\n{}\n\n## Memory Context\n{}\n\n## Iron Law: LOG FIRST\nNever fix without evidence. Follow this process:\n\n1. **Reproduce** - Get exact error conditions\n2. **Log** - Gather all relevant logs, stack traces, system state\n3. **Analyze** - Root cause analysis using debugging patterns\n4. **Fix** - Minimal change to resolve\n5. **Verify** - Confirm fix works and doesn't break other things\n\n## Common Debugging Patterns\n- Check recent changes (git diff)\n- Examine error logs and stack traces\n- Validate assumptions with print statements\n- Isolate the failing component\n- Check for null/undefined values\n- Verify data types and formats\n\n## Output Requirements\n- Evidence before any fix proposal\n- Root cause analysis with confidence\n- Minimal fix with verification\n- Include a \"### Memory Notes\" section with gotchas discovered",
        user_request,
        format_memory_context(memory)
    )
}

pub fn review_fix_prompt(user_request: &str, memory: &Memory) -> String {
    format!(
        "# Code Reviewer (Fix Validation)\n\n## User Request\n{}\n\n## Memory Context\n{}\n\n## Instructions\nReview the bug fix from bug-investigator. Focus on:\n\n- Fix correctness: Does it actually solve the problem?\n- Side effects: Does it introduce new issues?\n- Code quality: Is the fix clean and maintainable?\n- Testing: Are there tests for the fix?\n- Security: Does the fix introduce vulnerabilities?\n\n## Confidence Scoring\nOnly report issues with >=80% confidence.\n\n## Output Requirements\n- Verdict: APPROVED or CHANGES REQUESTED\n- Critical Issues with file:line citations\n- Include a \"### Memory Notes\" section",
        user_request,
        format_memory_context(memory)
    )
}

pub fn review_prompt(user_request: &str, memory: &Memory) -> String {
    format!(
        "# Code Reviewer (Comprehensive Review)\n\n## User Request\n{}\n\n## Memory Context\n{}\n\n## Instructions\nPerform comprehensive code review with 80%+ confidence threshold.\n\n### Review Dimensions\n- **Security**: OWASP top 10, input validation, authentication/authorization\n- **Performance**: Algorithm efficiency, database queries, memory usage\n- **Maintainability**: Code structure, naming, documentation\n- **Reliability**: Error handling, edge cases, resource management\n- **Testing**: Test coverage, test quality, edge case coverage\n\n## Output Requirements\n- Only report issues with >=80% confidence\n- File:line citations for every finding\n- Verdict: APPROVED or CHANGES REQUESTED\n- Include a \"### Memory Notes\" section",
        user_request,
        format_memory_context(memory)
    )
}

pub fn plan_prompt(user_request: &str, memory: &Memory) -> String {
    format!(
        "# Planner (Comprehensive Planning)\n\n## User Request\n{}\n\n## Memory Context\n{}\n\n## Planning Requirements\nCreate a comprehensive plan that includes:\n\n### 1. Analysis\n- Current state assessment\n- Requirements clarification\n- Constraints and dependencies\n- Risk assessment\n\n### 2. Architecture\n- System design decisions\n- Technology choices with rationale\n- API design (if applicable)\n- Data model (if applicable)\n\n### 3. Implementation Plan\n- Phased approach with milestones\n- Specific files to create/modify\n- Testing strategy\n- Rollback plan\n\n### 4. Research Needs\n- External packages to investigate\n- Best practices to research\n- Alternatives to evaluate\n\n## Output Requirements\n- Save plan to docs/plans/YYYY-MM-DD-<topic>-plan.md\n- Record the plan reference in the active context References section\n- Provide clear next steps",
        user_request,
        format_memory_context(memory)
    )
}

/// Pull bullet lines out of a string agent result's `### Memory Notes`
/// section. Non-string results yield nothing.
pub fn extract_memory_notes(result: &serde_json::Value) -> Vec<String> {
    let Some(text) = result.as_str() else {
        return Vec::new();
    };

    let mut notes = Vec::new();
    let mut in_section = false;
    for line in text.lines() {
        if line.contains("### Memory Notes") {
            in_section = true;
            continue;
        }
        if in_section {
            if line.starts_with("###") {
                break;
            }
            let trimmed = line.trim();
            if !trimmed.is_empty() && !trimmed.starts_with('#') {
                notes.push(trimmed.trim_start_matches("- ").to_string());
            }
        }
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory(active_context: &str, patterns: &str, progress: &str) -> Memory {
        Memory {
            active_context: active_context.to_string(),
            patterns: patterns.to_string(),
            progress: progress.to_string(),
            last_updated: String::new(),
        }
    }

    #[test]
    fn memory_context_extracts_the_three_summaries() {
        let m = memory(
            "# A\n\n## Current Focus\n- shipping the search feature\n\n## Last Updated\nx\n",
            "# P\n\n## Common Gotchas\n- config loader caches stale values\n\n## Last Updated\nx\n",
            "# G\n\n## Completed\n- [x] auth middleware\n\n## Last Updated\nx\n",
        );
        let context = format_memory_context(&m);
        assert!(context.contains("Current Focus: - shipping the search feature"));
        assert!(context.contains("Common Gotchas: - config loader caches stale values..."));
        assert!(context.contains("Recent Completions: - [x] auth middleware..."));
    }

    #[test]
    fn memory_context_truncates_long_sections() {
        let long = format!("## Common Gotchas\n- {}\n", "g".repeat(500));
        let m = memory("", &format!("# P\n\n{}", long), "");
        let context = format_memory_context(&m);
        let line = context
            .lines()
            .find(|l| l.starts_with("Common Gotchas:"))
            .unwrap();
        assert!(line.len() < 250);
        assert!(line.ends_with("..."));
    }

    #[test]
    fn empty_memory_yields_placeholder() {
        let m = memory("", "", "");
        assert_eq!(format_memory_context(&m), "Memory files empty or not loaded");
    }

    #[test]
    fn prompts_embed_request_and_memory() {
        let m = memory("## Current Focus\n- payments\n", "", "");
        for prompt in [
            builder_prompt("add retries", &m),
            review_and_hunt_prompt("add retries", &m),
            debug_prompt("add retries", &m),
            review_fix_prompt("add retries", &m),
            review_prompt("add retries", &m),
            plan_prompt("add retries", &m),
        ] {
            assert!(prompt.contains("add retries"));
            assert!(prompt.contains("Current Focus: - payments"));
        }
    }

    #[test]
    fn verifier_prompt_names_the_workflow() {
        let prompt = verifier_prompt("WF-1-abc");
        assert!(prompt.contains("Workflow: WF-1-abc"));
        assert!(prompt.contains("PASS or FAIL"));
    }

    #[test]
    fn memory_notes_are_extracted_from_string_results() {
        let result = serde_json::Value::String(
            "## Findings\n- fine\n\n### Memory Notes\n- watch the cache gotcha\n- verification ran clean\n\n### Next\nignored\n".to_string(),
        );
        assert_eq!(
            extract_memory_notes(&result),
            vec![
                "watch the cache gotcha".to_string(),
                "verification ran clean".to_string()
            ]
        );
    }

    #[test]
    fn memory_notes_ignore_non_string_results() {
        let result = serde_json::json!({ "verdict": "PASS" });
        assert!(extract_memory_notes(&result).is_empty());
    }

    #[test]
    fn memory_notes_section_at_end_of_output() {
        let result = serde_json::Value::String("### Memory Notes\nplain note\n".to_string());
        assert_eq!(extract_memory_notes(&result), vec!["plain note".to_string()]);
    }
}
