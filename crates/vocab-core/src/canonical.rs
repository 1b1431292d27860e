//! Name canonicalization.
//!
//! Canonical names are the sole key-equality mechanism for vocabulary
//! nodes, so [`canonicalize`] must stay deterministic: the same input
//! always yields the same output.

/// Converts a display string into its canonical, comparable form.
///
/// Trims surrounding whitespace, lower-cases, and replaces underscores
/// and runs of internal whitespace with a single `-`.
///
/// ```
/// use vocab_core::canonical::canonicalize;
///
/// assert_eq!(canonicalize("  Activity_ID "), "activity-id");
/// assert_eq!(canonicalize("Ocean  BGC"), "ocean-bgc");
/// ```
pub fn canonicalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_dash = false;
    for ch in raw.trim().chars() {
        if ch.is_whitespace() {
            pending_dash = true;
            continue;
        }
        if pending_dash {
            out.push('-');
            pending_dash = false;
        }
        if ch == '_' {
            out.push('-');
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

/// True if `raw` cannot appear as a namespace segment or file name:
/// it contains `:` or a path separator, or is `.` or `..`.
pub fn is_reserved(raw: &str) -> bool {
    let raw = raw.trim();
    raw.contains([':', '/', '\\']) || raw == "." || raw == ".."
}

/// Trims a display string without altering its case or separators.
pub fn format_string(raw: &str) -> String {
    raw.trim().to_string()
}
