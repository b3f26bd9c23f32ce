//! Intent classification for incoming development requests.
//!
//! Classification is keyword scoring with a fixed priority policy: DEBUG
//! signals always win outright, then PLAN, REVIEW, and BUILD compete on
//! score with ties going to the earlier intent in that order. Memory content
//! contributes a weak secondary signal that can override a low-confidence
//! keyword selection.

use crate::memory::Memory;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four workflow intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    Build,
    Debug,
    Review,
    Plan,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Build => "BUILD",
            Intent::Debug => "DEBUG",
            Intent::Review => "REVIEW",
            Intent::Plan => "PLAN",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentClassification {
    pub intent: Intent,
    /// Keyword-based selection confidence, 0 to 100. Kept at the keyword
    /// figure even when a memory suggestion overrides the selection; the
    /// rationale names the override when that happens.
    pub confidence: u8,
    /// Every keyword occurrence that fired, duplicates included.
    pub matched_keywords: Vec<String>,
    /// Human-readable summary for logs, never parsed downstream.
    pub rationale: String,
}

const DEBUG_KEYWORDS: &[&str] = &[
    "error",
    "bug",
    "fix",
    "broken",
    "crash",
    "fail",
    "debug",
    "troubleshoot",
    "issue",
    "problem",
    "doesn't work",
    "not working",
    "exception",
    "traceback",
    "stack trace",
    "panic",
    "segfault",
    "syntax error",
    "runtime error",
];

const PLAN_KEYWORDS: &[&str] = &[
    "plan",
    "design",
    "architect",
    "roadmap",
    "strategy",
    "spec",
    "before we build",
    "how should we",
    "what's the approach",
    "proposal",
    "recommendation",
    "should we use",
    "options",
    "alternatives",
    "research",
    "investigate",
];

const REVIEW_KEYWORDS: &[&str] = &[
    "review",
    "audit",
    "check",
    "analyze",
    "assess",
    "what do you think",
    "is this good",
    "evaluate",
    "inspect",
    "examine",
    "critique",
    "feedback",
    "suggestions",
    "improve",
    "optimize",
];

const BUILD_KEYWORDS: &[&str] = &[
    "build",
    "implement",
    "create",
    "make",
    "write",
    "add",
    "develop",
    "code",
    "feature",
    "component",
    "app",
    "application",
    "module",
    "class",
    "function",
    "endpoint",
    "api",
    "interface",
    "service",
    "generate",
    "scaffold",
];

/// Broad keyword gate used by the router to skip non-development messages.
const DEVELOPMENT_KEYWORDS: &[&str] = &[
    "build",
    "implement",
    "create",
    "make",
    "write",
    "add",
    "develop",
    "code",
    "feature",
    "component",
    "app",
    "application",
    "debug",
    "fix",
    "error",
    "bug",
    "broken",
    "troubleshoot",
    "review",
    "audit",
    "check",
    "analyze",
    "plan",
    "design",
    "architect",
    "roadmap",
    "strategy",
    "test",
    "tdd",
];

fn keywords_for(intent: Intent) -> &'static [&'static str] {
    match intent {
        Intent::Build => BUILD_KEYWORDS,
        Intent::Debug => DEBUG_KEYWORDS,
        Intent::Review => REVIEW_KEYWORDS,
        Intent::Plan => PLAN_KEYWORDS,
    }
}

/// Count every substring occurrence of each keyword, recording duplicates.
fn score_intent(lower_message: &str, intent: Intent, matched: &mut Vec<String>) -> usize {
    let mut score = 0;
    for keyword in keywords_for(intent) {
        let hits = lower_message.match_indices(keyword).count();
        for _ in 0..hits {
            matched.push((*keyword).to_string());
        }
        score += hits;
    }
    score
}

/// Scan memory content for a weak workflow suggestion. First phrase pair
/// that appears wins, always at confidence 70.
fn memory_suggestion(memory: Option<&Memory>) -> Option<Intent> {
    let combined = memory?.combined_lowercase();
    const HINTS: [(Intent, [&str; 2]); 4] = [
        (Intent::Debug, ["debugging", "investigating"]),
        (Intent::Plan, ["planning", "design"]),
        (Intent::Review, ["reviewing", "audit"]),
        (Intent::Build, ["building", "implementing"]),
    ];
    HINTS
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|p| combined.contains(p)))
        .map(|(intent, _)| *intent)
}

const MEMORY_CONFIDENCE: u8 = 70;

/// Classify a message into a workflow intent.
pub fn classify(message: &str, memory: Option<&Memory>) -> IntentClassification {
    let lower = message.to_lowercase();
    let mut matched_keywords = Vec::new();

    let debug_score = score_intent(&lower, Intent::Debug, &mut matched_keywords);
    let plan_score = score_intent(&lower, Intent::Plan, &mut matched_keywords);
    let review_score = score_intent(&lower, Intent::Review, &mut matched_keywords);
    let build_score = score_intent(&lower, Intent::Build, &mut matched_keywords);

    // Error signals take precedence over everything else. Among the rest,
    // the highest score wins with ties broken toward PLAN then REVIEW.
    // BUILD is the default when nothing matches at all.
    let (selected, selected_score) = if debug_score > 0 {
        (Intent::Debug, debug_score)
    } else if plan_score + review_score + build_score == 0 {
        (Intent::Build, 0)
    } else {
        let candidates = [
            (Intent::Plan, plan_score),
            (Intent::Review, review_score),
            (Intent::Build, build_score),
        ];
        let max = candidates.iter().map(|(_, s)| *s).max().unwrap_or(0);
        *candidates
            .iter()
            .find(|(_, s)| *s == max)
            .unwrap_or(&(Intent::Build, 0))
    };

    let keyword_count = keywords_for(selected).len().max(1);
    let confidence = ((selected_score as f64 / keyword_count as f64) * 100.0)
        .round()
        .min(100.0) as u8;

    let suggestion = memory_suggestion(memory);
    let mut intent = selected;
    if let Some(suggested) = suggestion
        && suggested != selected
        && MEMORY_CONFIDENCE > confidence
    {
        intent = suggested;
    }

    let mut rationale_parts = Vec::new();
    if !matched_keywords.is_empty() {
        let shown: Vec<&str> = matched_keywords.iter().take(3).map(|s| s.as_str()).collect();
        rationale_parts.push(format!("Detected keywords: {}", shown.join(", ")));
    }
    if let Some(suggested) = suggestion {
        rationale_parts.push(format!("Memory context suggests {} workflow", suggested));
    }
    rationale_parts.push(format!("Selected {} workflow based on priority rules", intent));

    IntentClassification {
        intent,
        confidence,
        matched_keywords,
        rationale: rationale_parts.join(". "),
    }
}

/// Does the message look like a development request at all?
pub fn is_development_request(message: &str) -> bool {
    let lower = message.to_lowercase();
    DEVELOPMENT_KEYWORDS.iter().any(|k| lower.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_with(active_context: &str) -> Memory {
        Memory {
            active_context: active_context.to_string(),
            patterns: String::new(),
            progress: String::new(),
            last_updated: String::new(),
        }
    }

    #[test]
    fn debug_signals_win_outright() {
        let result = classify("build a feature but there is a bug and an error", None);
        assert_eq!(result.intent, Intent::Debug);
        assert!(result.matched_keywords.contains(&"bug".to_string()));
        assert!(result.matched_keywords.contains(&"error".to_string()));
    }

    #[test]
    fn empty_message_defaults_to_build_with_zero_confidence() {
        let result = classify("", None);
        assert_eq!(result.intent, Intent::Build);
        assert_eq!(result.confidence, 0);
        assert!(result.matched_keywords.is_empty());
        assert_eq!(
            result.rationale,
            "Selected BUILD workflow based on priority rules"
        );
    }

    #[test]
    fn non_matching_message_defaults_to_build() {
        let result = classify("hello there, how was your weekend?", None);
        assert_eq!(result.intent, Intent::Build);
        assert_eq!(result.confidence, 0);
    }

    #[test]
    fn plan_beats_review_and_build_on_ties() {
        // One keyword each: "plan", "review", "build".
        let result = classify("plan review build", None);
        assert_eq!(result.intent, Intent::Plan);
    }

    #[test]
    fn higher_score_beats_priority_order() {
        let result = classify("build the feature component and endpoint", None);
        assert_eq!(result.intent, Intent::Build);
        assert!(result.confidence > 0);
    }

    #[test]
    fn classification_is_case_insensitive() {
        let upper = classify("FIX THE CRASH IN THE PARSER", None);
        let lower = classify("fix the crash in the parser", None);
        assert_eq!(upper.intent, Intent::Debug);
        assert_eq!(upper.intent, lower.intent);
        assert_eq!(upper.confidence, lower.confidence);
    }

    #[test]
    fn repeated_keywords_count_every_occurrence() {
        let once = classify("fix it", None);
        let twice = classify("fix it, fix it now", None);
        assert_eq!(once.intent, Intent::Debug);
        assert_eq!(twice.intent, Intent::Debug);
        assert!(twice.confidence > once.confidence);
        assert_eq!(
            twice
                .matched_keywords
                .iter()
                .filter(|k| k.as_str() == "fix")
                .count(),
            2
        );
    }

    #[test]
    fn confidence_is_capped_at_100() {
        let message = DEBUG_KEYWORDS.join(" ").repeat(3);
        let result = classify(&message, None);
        assert_eq!(result.confidence, 100);
    }

    #[test]
    fn memory_overrides_low_confidence_selection() {
        let memory = memory_with("Currently debugging the flaky socket timeout");
        let result = classify("make a small tweak", Some(&memory));
        // Keyword selection is BUILD ("make") at low confidence; memory
        // suggests DEBUG at 70 and wins the selection.
        assert_eq!(result.intent, Intent::Debug);
        assert!(result.confidence < MEMORY_CONFIDENCE);
        assert!(result.rationale.contains("Memory context suggests DEBUG"));
        assert!(result.rationale.contains("Selected DEBUG"));
    }

    #[test]
    fn memory_does_not_override_high_confidence_selection() {
        let memory = memory_with("Currently debugging the flaky socket timeout");
        let message = format!("{} {}", BUILD_KEYWORDS.join(" "), BUILD_KEYWORDS.join(" "));
        let result = classify(&message, Some(&memory));
        assert_eq!(result.intent, Intent::Build);
        assert_eq!(result.confidence, 100);
    }

    #[test]
    fn confidence_stays_at_keyword_figure_after_override() {
        let memory = memory_with("planning the next milestone");
        let result = classify("add a small thing", Some(&memory));
        assert_eq!(result.intent, Intent::Plan);
        // 1 of 21 BUILD keywords, rounded.
        assert_eq!(result.confidence, 5);
    }

    #[test]
    fn rationale_shows_at_most_three_keywords() {
        let result = classify("build a feature component endpoint api", None);
        assert!(result.rationale.starts_with("Detected keywords: "));
        let listed = result
            .rationale
            .split(". ")
            .next()
            .unwrap()
            .trim_start_matches("Detected keywords: ")
            .split(", ")
            .count();
        assert_eq!(listed, 3);
    }

    #[test]
    fn development_gate_matches_broadly() {
        assert!(is_development_request("please fix the login page"));
        assert!(is_development_request("DESIGN a caching layer"));
        assert!(!is_development_request("what's for lunch?"));
    }
}
