//! Structured model of a memory markdown document.
//!
//! Documents are machine-written markdown where `## Header` lines act as
//! stable anchors. Instead of splicing text around substring matches, the
//! document is parsed once into an ordered list of sections, mutated on that
//! structure, and serialized back. Headers are never renamed or reordered,
//! and unknown sections round-trip untouched.

/// Header of the timestamp section every document ends with.
pub const LAST_UPDATED_HEADER: &str = "Last Updated";

/// One `## Header` section and the body lines that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Header text without the `## ` prefix.
    pub header: String,
    /// Body lines between this header and the next one.
    pub lines: Vec<String>,
}

/// A parsed memory document: preamble lines, then ordered sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryDocument {
    /// Lines before the first `## ` header (usually a `# Title` and a blank).
    pub preamble: Vec<String>,
    pub sections: Vec<Section>,
}

impl MemoryDocument {
    /// Parse document text into preamble and sections.
    pub fn parse(text: &str) -> Self {
        let mut doc = MemoryDocument::default();
        for line in text.lines() {
            if let Some(header) = line.strip_prefix("## ") {
                doc.sections.push(Section {
                    header: header.trim().to_string(),
                    lines: Vec::new(),
                });
            } else if let Some(current) = doc.sections.last_mut() {
                current.lines.push(line.to_string());
            } else {
                doc.preamble.push(line.to_string());
            }
        }
        doc
    }

    /// Serialize back to text. Output always ends with a newline.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for line in &self.preamble {
            out.push_str(line);
            out.push('\n');
        }
        for section in &self.sections {
            out.push_str("## ");
            out.push_str(&section.header);
            out.push('\n');
            for line in &section.lines {
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }

    pub fn has_section(&self, header: &str) -> bool {
        self.sections.iter().any(|s| s.header == header)
    }

    fn section_mut(&mut self, header: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.header == header)
    }

    /// Index where a synthesized section should go: immediately before the
    /// Last Updated section, or at the end when that anchor is absent.
    fn insertion_index(&self) -> usize {
        self.sections
            .iter()
            .position(|s| s.header == LAST_UPDATED_HEADER)
            .unwrap_or(self.sections.len())
    }

    /// Ensure `header` exists, synthesizing it with a `- [N/A]` placeholder
    /// before the Last Updated anchor when missing.
    pub fn ensure_section(&mut self, header: &str) {
        if self.has_section(header) {
            return;
        }
        let idx = self.insertion_index();
        self.sections.insert(
            idx,
            Section {
                header: header.to_string(),
                lines: vec!["- [N/A]".to_string(), String::new()],
            },
        );
    }

    /// Insert dated bullet entries immediately after the header line of
    /// `header`, before any existing body. The section is synthesized when
    /// absent.
    pub fn append_entries(&mut self, header: &str, items: &[String], date: &str) {
        if items.is_empty() {
            return;
        }
        let entries: Vec<String> = items
            .iter()
            .map(|item| format!("- [{}] {}", date, item))
            .collect();

        if let Some(section) = self.section_mut(header) {
            for (i, entry) in entries.into_iter().enumerate() {
                section.lines.insert(i, entry);
            }
        } else {
            let idx = self.insertion_index();
            let mut lines = entries;
            lines.push(String::new());
            self.sections.insert(
                idx,
                Section {
                    header: header.to_string(),
                    lines,
                },
            );
        }
    }

    /// Replace the whole body of `header` with dated bullet entries. Used
    /// for sections that describe a single current value rather than a
    /// history.
    pub fn replace_entries(&mut self, header: &str, items: &[String], date: &str) {
        if items.is_empty() {
            return;
        }
        let mut lines: Vec<String> = items
            .iter()
            .map(|item| format!("- [{}] {}", date, item))
            .collect();
        lines.push(String::new());

        if let Some(section) = self.section_mut(header) {
            section.lines = lines;
        } else {
            let idx = self.insertion_index();
            self.sections.insert(
                idx,
                Section {
                    header: header.to_string(),
                    lines,
                },
            );
        }
    }

    /// Rewrite the Last Updated body with `timestamp`, creating the section
    /// at the end of the document when missing.
    pub fn touch_last_updated(&mut self, timestamp: &str) {
        let lines = vec![timestamp.to_string(), String::new()];
        if let Some(section) = self.section_mut(LAST_UPDATED_HEADER) {
            section.lines = lines;
        } else {
            self.sections.push(Section {
                header: LAST_UPDATED_HEADER.to_string(),
                lines,
            });
        }
    }

    /// Full body text of a section, joined with newlines. Empty when absent.
    pub fn section_text(&self, header: &str) -> String {
        self.sections
            .iter()
            .find(|s| s.header == header)
            .map(|s| s.lines.join("\n"))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# Active Context\n\n## Current Focus\n- [N/A]\n\n## Recent Changes\n- [2026-01-01] initial setup\n\n## Last Updated\n2026-01-01T00:00:00Z\n";

    #[test]
    fn parse_splits_preamble_and_sections() {
        let doc = MemoryDocument::parse(SAMPLE);
        assert_eq!(doc.preamble, vec!["# Active Context", ""]);
        assert_eq!(doc.sections.len(), 3);
        assert_eq!(doc.sections[0].header, "Current Focus");
        assert_eq!(doc.sections[1].header, "Recent Changes");
        assert_eq!(doc.sections[2].header, LAST_UPDATED_HEADER);
    }

    #[test]
    fn serialize_round_trips_unknown_sections() {
        let text = "# Doc\n\n## Custom Notes\nfree text here\n\n## Last Updated\nnever\n";
        let doc = MemoryDocument::parse(text);
        assert_eq!(doc.serialize(), text);
    }

    #[test]
    fn append_inserts_dated_bullets_after_header() {
        let mut doc = MemoryDocument::parse(SAMPLE);
        doc.append_entries(
            "Recent Changes",
            &["added parser".to_string(), "fixed tests".to_string()],
            "2026-08-27",
        );

        let section = &doc.sections[1];
        assert_eq!(section.lines[0], "- [2026-08-27] added parser");
        assert_eq!(section.lines[1], "- [2026-08-27] fixed tests");
        // Prior entries and trailing structure survive below the new ones.
        assert_eq!(section.lines[2], "- [2026-01-01] initial setup");
        assert_eq!(doc.sections[2].header, LAST_UPDATED_HEADER);
    }

    #[test]
    fn append_synthesizes_missing_section_before_last_updated() {
        let mut doc = MemoryDocument::parse(SAMPLE);
        doc.append_entries("Decisions", &["use sections".to_string()], "2026-08-27");

        let headers: Vec<&str> = doc.sections.iter().map(|s| s.header.as_str()).collect();
        assert_eq!(
            headers,
            vec!["Current Focus", "Recent Changes", "Decisions", LAST_UPDATED_HEADER]
        );
        assert_eq!(
            doc.section_text("Decisions"),
            "- [2026-08-27] use sections\n"
        );
    }

    #[test]
    fn append_without_last_updated_anchor_appends_at_end() {
        let mut doc = MemoryDocument::parse("# Doc\n\n## Tasks\n- [N/A]\n");
        doc.append_entries("Completed", &["step one".to_string()], "2026-08-27");
        assert_eq!(doc.sections.last().unwrap().header, "Completed");
    }

    #[test]
    fn replace_clears_existing_body() {
        let mut doc = MemoryDocument::parse(
            "# Progress\n\n## Current Workflow\n- [2026-01-01] old workflow\n\n## Last Updated\nx\n",
        );
        doc.replace_entries(
            "Current Workflow",
            &["BUILD workflow WF-1 active".to_string()],
            "2026-08-27",
        );
        assert_eq!(
            doc.section_text("Current Workflow"),
            "- [2026-08-27] BUILD workflow WF-1 active\n"
        );
    }

    #[test]
    fn ensure_section_is_idempotent() {
        let mut doc = MemoryDocument::parse(SAMPLE);
        doc.ensure_section("References");
        doc.ensure_section("References");
        let count = doc
            .sections
            .iter()
            .filter(|s| s.header == "References")
            .count();
        assert_eq!(count, 1);
        assert_eq!(doc.section_text("References"), "- [N/A]\n");
    }

    #[test]
    fn touch_last_updated_rewrites_timestamp() {
        let mut doc = MemoryDocument::parse(SAMPLE);
        doc.touch_last_updated("2026-08-27T12:00:00.000Z");
        assert_eq!(
            doc.section_text(LAST_UPDATED_HEADER),
            "2026-08-27T12:00:00.000Z\n"
        );
    }

    #[test]
    fn empty_bucket_is_a_no_op() {
        let mut doc = MemoryDocument::parse(SAMPLE);
        let before = doc.serialize();
        doc.append_entries("Recent Changes", &[], "2026-08-27");
        assert_eq!(doc.serialize(), before);
    }
}
