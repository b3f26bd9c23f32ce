//! Memory directory resolution.
//!
//! State lives under a project-relative directory. The current convention is
//! `.sherpa/memory`; installations created before the rename used
//! `.assistant/sherpa` and are still honored as a fallback. An explicit
//! override (typically environment-supplied) is sanitized so it can never
//! escape the project directory.

use std::path::Path;

/// Current on-disk convention for the memory directory.
pub const CURRENT_MEMORY_DIR: &str = ".sherpa/memory";

/// Pre-rename location, still probed for existing installations.
pub const LEGACY_MEMORY_DIR: &str = ".assistant/sherpa";

/// Environment variable that overrides the memory directory.
pub const MEMORY_DIR_ENV: &str = "SHERPA_MEMORY_DIR";

/// The three file names inside the memory directory.
pub const MEMORY_FILE_NAMES: [&str; 3] = ["activeContext.md", "patterns.md", "progress.md"];

/// Normalize a path string: forward slashes, collapsed separators, no
/// leading `./`, no trailing slash.
fn normalize(value: &str) -> String {
    let mut s = value.trim().replace('\\', "/");
    while s.contains("//") {
        s = s.replace("//", "/");
    }
    if let Some(rest) = s.strip_prefix("./") {
        s = rest.to_string();
    }
    while s.ends_with('/') {
        s.pop();
    }
    s
}

fn is_absolute_like(value: &str) -> bool {
    if value.starts_with('/') {
        return true;
    }
    // Windows drive prefix such as C:/
    let bytes = value.as_bytes();
    bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'/'
}

fn has_traversal(value: &str) -> bool {
    value.split('/').any(|segment| segment == "..")
}

/// Sanitize an override value, falling back to [`CURRENT_MEMORY_DIR`] when
/// the value is empty, absolute-looking, or contains a `..` segment.
pub fn sanitize_memory_dir(value: &str) -> String {
    let normalized = normalize(value);
    if normalized.is_empty() || is_absolute_like(&normalized) || has_traversal(&normalized) {
        tracing::warn!(
            override_value = value,
            fallback = CURRENT_MEMORY_DIR,
            "unsafe memory directory override ignored"
        );
        return CURRENT_MEMORY_DIR.to_string();
    }
    normalized
}

/// Resolve the directory that reads and writes should target.
///
/// Resolution order: sanitized explicit override, then an existing directory
/// at the current location, then an existing directory at the legacy
/// location, then the current location as the default.
pub fn preferred_memory_dir(project_root: &Path, override_dir: Option<&str>) -> String {
    if let Some(explicit) = override_dir
        && !explicit.trim().is_empty()
    {
        return sanitize_memory_dir(explicit);
    }

    if project_root.join(CURRENT_MEMORY_DIR).is_dir() {
        return CURRENT_MEMORY_DIR.to_string();
    }
    if project_root.join(LEGACY_MEMORY_DIR).is_dir() {
        return LEGACY_MEMORY_DIR.to_string();
    }
    CURRENT_MEMORY_DIR.to_string()
}

/// All directories worth probing for an existing memory file, preferred
/// first, deduplicated.
pub fn known_memory_dirs(project_root: &Path, override_dir: Option<&str>) -> Vec<String> {
    let preferred = preferred_memory_dir(project_root, override_dir);
    let mut dirs = vec![
        preferred,
        CURRENT_MEMORY_DIR.to_string(),
        LEGACY_MEMORY_DIR.to_string(),
    ];
    let mut seen = Vec::new();
    dirs.retain(|d| {
        if seen.contains(d) {
            false
        } else {
            seen.push(d.clone());
            true
        }
    });
    dirs
}

/// Paths of the three memory files inside `dir`.
pub fn memory_file_paths(dir: &str) -> [String; 3] {
    MEMORY_FILE_NAMES.map(|name| format!("{}/{}", dir, name))
}
