//! Subtitle cleanup: VTT/SRT tracks to plain spoken text.
//!
//! Auto-generated captions repeat lines heavily and carry timing cues and
//! inline styling. The cleaner keeps each spoken line once, in order.

use regex::Regex;
use std::sync::LazyLock;

/// Minimum character count for cleaned subtitles to be considered usable.
pub const MIN_SUBTITLE_LENGTH: usize = 20;

static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{2}:\d{2}").unwrap());
static SEQUENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static STYLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[^}]+\}").unwrap());

/// Reduce a raw VTT or SRT track to readable text.
///
/// Returns `None` when the input is empty or the cleaned text is too short
/// to be worth feeding to extraction. Idempotent on its own output.
pub fn clean_subtitles(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }

    let mut lines: Vec<String> = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("WEBVTT") || line.starts_with("NOTE") {
            continue;
        }
        if TIMESTAMP_RE.is_match(line) {
            continue;
        }
        if SEQUENCE_RE.is_match(line) {
            continue;
        }
        if line.contains("-->") {
            continue;
        }

        // Remove inline VTT formatting
        let line = TAG_RE.replace_all(line, "");
        let line = STYLE_RE.replace_all(&line, "");
        let line = line.trim();

        // Subtitles often repeat; keep first occurrence only
        if !line.is_empty() && !seen.contains(line) {
            seen.insert(line.to_string());
            lines.push(line.to_string());
        }
    }

    let text = lines.join(" ");
    if text.chars().count() > MIN_SUBTITLE_LENGTH {
        Some(text)
    } else {
        None
    }
}
