//! Orchestrator utility functions
//!
//! Helpers for handling raw model output (reasoning segments, fenced JSON)
//! and for keeping log lines short.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

/// Compute a short hash for an utterance
///
/// Returns an 8-character hexadecimal hash suitable for logging and tracing
/// without writing the user's text into every log line.
pub fn hash_utterance(utterance: &str) -> String {
    let mut hasher = DefaultHasher::new();
    utterance.hash(&mut hasher);
    format!("{:016x}", hasher.finish())[..8].to_string()
}

/// Remove `<think>…</think>` segments from model output
///
/// # Returns
/// * `(cleaned, thoughts)` - the trimmed text without reasoning segments, and
///   the segments joined by newlines (`None` if there were none)
///
/// An opening marker without a matching close is left in place.
pub fn strip_reasoning(text: &str) -> (String, Option<String>) {
    let mut cleaned = String::with_capacity(text.len());
    let mut thoughts = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find(THINK_OPEN) {
        let after_open = &rest[start + THINK_OPEN.len()..];
        let Some(end) = after_open.find(THINK_CLOSE) else {
            break;
        };
        cleaned.push_str(&rest[..start]);
        thoughts.push(after_open[..end].to_string());
        rest = &after_open[end + THINK_CLOSE.len()..];
    }
    cleaned.push_str(rest);

    let thoughts = if thoughts.is_empty() {
        None
    } else {
        Some(thoughts.join("\n"))
    };
    (cleaned.trim().to_string(), thoughts)
}

/// Locate the JSON payload inside model output
///
/// Prefers a ```` ```json ```` fence, then any ```` ``` ```` fence (skipping a
/// language tag line), and otherwise returns the whole trimmed text. An
/// unterminated fence runs to the end of the text.
pub fn locate_json_payload(text: &str) -> &str {
    if let Some(start) = text.find("```json") {
        return fenced_body(&text[start + "```json".len()..]);
    }
    if let Some(start) = text.find("```") {
        let body = &text[start + 3..];
        return fenced_body(skip_language_tag(body));
    }
    text.trim()
}

fn fenced_body(body: &str) -> &str {
    let end = body.find("```").unwrap_or(body.len());
    body[..end].trim()
}

fn skip_language_tag(body: &str) -> &str {
    match body.find('\n') {
        Some(newline) => {
            let tag = body[..newline].trim();
            if !tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphanumeric()) {
                &body[newline + 1..]
            } else {
                body
            }
        }
        None => body,
    }
}

/// Truncate a string for logging, appending the original length
pub fn truncate_for_log(input: &str, max_chars: usize) -> String {
    let char_count = input.chars().count();
    if char_count <= max_chars {
        return input.to_string();
    }
    let mut preview: String = input.chars().take(max_chars).collect();
    preview.push_str(&format!("... [truncated, total_chars={}]", char_count));
    preview
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_utterance_is_stable_and_short() {
        let a = hash_utterance("search coffee");
        let b = hash_utterance("search coffee");
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
        assert_ne!(a, hash_utterance("search tea"));
    }

    #[test]
    fn test_strip_reasoning_removes_all_segments() {
        let raw = "<think>first</think>[1]<think>second</think>  ";
        let (cleaned, thoughts) = strip_reasoning(raw);
        assert_eq!(cleaned, "[1]");
        assert_eq!(thoughts.as_deref(), Some("first\nsecond"));
    }

    #[test]
    fn test_strip_reasoning_without_markers() {
        let (cleaned, thoughts) = strip_reasoning("  [] ");
        assert_eq!(cleaned, "[]");
        assert!(thoughts.is_none());
    }

    #[test]
    fn test_strip_reasoning_keeps_unterminated_marker() {
        let (cleaned, thoughts) = strip_reasoning("<think>never closed [1]");
        assert_eq!(cleaned, "<think>never closed [1]");
        assert!(thoughts.is_none());
    }

    #[test]
    fn test_locate_json_payload_prefers_json_fence() {
        let text = "Here you go:\n```json\n[{\"a\": 1}]\n```\nthanks";
        assert_eq!(locate_json_payload(text), "[{\"a\": 1}]");
    }

    #[test]
    fn test_locate_json_payload_plain_fence_with_tag() {
        let text = "```JSON\n[1, 2]\n```";
        assert_eq!(locate_json_payload(text), "[1, 2]");
    }

    #[test]
    fn test_locate_json_payload_plain_fence_without_tag() {
        let text = "```\n[1, 2]\n```";
        assert_eq!(locate_json_payload(text), "[1, 2]");
    }

    #[test]
    fn test_locate_json_payload_bare_text() {
        assert_eq!(locate_json_payload("  [3]\n"), "[3]");
    }

    #[test]
    fn test_locate_json_payload_unterminated_fence() {
        assert_eq!(locate_json_payload("```json\n[4]"), "[4]");
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("short", 10), "short");
        let long = "abcdefghij";
        assert_eq!(
            truncate_for_log(long, 4),
            "abcd... [truncated, total_chars=10]"
        );
    }
}
