//! Fenced code blocks sized to their content.
//!
//! The fence is always longer than any backtick run inside the content, so
//! arbitrary shell output can be quoted without escaping it.

use super::escape::escape_markdown;

/// Character used to build fences
pub const FENCE_CHAR: char = '`';

/// Shortest fence ever emitted
pub const MIN_FENCE_LEN: usize = 3;

/// Appended to content cut at the length limit
pub const TRUNCATION_MARKER: char = '…';

/// Rendered instead of a block when there is nothing to show
pub const PLACEHOLDER: &str = "(no output)";

/// Length of the longest run of `c` in `text`
pub fn longest_run(text: &str, c: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == c {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Cut `text` to at most `max_len` characters, marking the cut.
///
/// A limit below 1 is treated as 1.
pub fn truncate(text: &str, max_len: usize) -> String {
    let max_len = max_len.max(1);
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_len - 1).collect();
    cut.push(TRUNCATION_MARKER);
    cut
}

/// Wrap `content` in a fence that cannot collide with it.
///
/// Absent or empty content renders as the escaped placeholder.
pub fn fence_wrap(content: Option<&str>, max_len: usize) -> String {
    let content = match content {
        Some(text) if !text.is_empty() => truncate(text, max_len),
        _ => return escape_markdown(PLACEHOLDER),
    };

    let fence_len = (longest_run(&content, FENCE_CHAR) + 1).max(MIN_FENCE_LEN);
    let fence = FENCE_CHAR.to_string().repeat(fence_len);
    format!("{fence}\n{content}\n{fence}")
}
