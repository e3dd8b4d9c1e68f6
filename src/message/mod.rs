//! Chat Message Formatting
//!
//! Renders an [`Outcome`] as markdown text: a header with escaped plain
//! text, followed by fenced blocks holding the shell output verbatim. Each
//! fence is sized to its content, so the output never needs escaping.

pub mod escape;
pub mod fence;

pub use escape::escape_markdown;
pub use fence::{fence_wrap, truncate, PLACEHOLDER, TRUNCATION_MARKER};

use crate::models::Outcome;
use fence::{longest_run, FENCE_CHAR, MIN_FENCE_LEN};

/// One line of a reply
enum Part<'a> {
    /// Already rendered text
    Line(String),
    /// Raw content to be fenced
    Block(&'a str),
}

/// Renders outcomes for a transport with a fixed message size
#[derive(Debug, Clone, Copy)]
pub struct MessageFormatter {
    max_len: usize,
}

impl MessageFormatter {
    /// `max_len` bounds the characters of the whole rendered message
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len: max_len.max(1),
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn format(&self, outcome: &Outcome) -> String {
        let mut parts = Vec::new();

        match outcome {
            Outcome::Completed {
                output,
                exit_status,
                signal_status,
            } => {
                if exit_status.is_none() && signal_status.is_none() {
                    parts.push(Part::Line("✅ *Done*".to_string()));
                } else {
                    parts.push(Part::Line("🏁 *Process exited*".to_string()));
                    if let Some(code) = exit_status {
                        parts.push(Part::Line(escape_markdown(&format!("exit status: {}", code))));
                    }
                    if let Some(signal) = signal_status {
                        parts.push(Part::Line(escape_markdown(&format!("signal: {}", signal))));
                    }
                }
                parts.push(Part::Block(output.as_str()));
            }
            Outcome::Continuing {
                output,
                matched_pattern,
            } => {
                parts.push(Part::Line("⌨️ *Waiting for input*".to_string()));
                parts.push(Part::Block(output.as_str()));
                parts.push(Part::Line(escape_markdown("Matched:")));
                parts.push(Part::Block(matched_pattern.as_str()));
            }
            Outcome::TimedOut {
                output,
                timeout_seconds,
            } => {
                parts.push(Part::Line("⏳ *Still running*".to_string()));
                parts.push(Part::Line(escape_markdown(&format!(
                    "No prompt after {}s. Send an empty line to keep waiting.",
                    timeout_seconds
                ))));
                parts.push(Part::Block(output.as_str()));
            }
            Outcome::Failed {
                message,
                partial_output,
            } => {
                parts.push(Part::Line("❌ *Session failed*".to_string()));
                parts.push(Part::Block(message.as_str()));
                if let Some(partial) = partial_output {
                    parts.push(Part::Line(escape_markdown("Partial output:")));
                    parts.push(Part::Block(partial.as_str()));
                }
            }
        }

        self.render(parts)
    }

    /// Join the parts, sharing what the lines leave of `max_len` among the
    /// blocks. Blocks that fit get their full size; the rest split the
    /// remainder evenly.
    fn render(&self, parts: Vec<Part<'_>>) -> String {
        let fixed: usize = parts
            .iter()
            .map(|part| match part {
                Part::Line(text) => text.chars().count(),
                Part::Block(_) => 0,
            })
            .sum::<usize>()
            + parts.len().saturating_sub(1);

        let blocks: Vec<&str> = parts
            .iter()
            .filter_map(|part| match part {
                Part::Block(content) => Some(*content),
                Part::Line(_) => None,
            })
            .collect();
        let mut budgets = share_budget(self.max_len.saturating_sub(fixed), &blocks).into_iter();

        parts
            .into_iter()
            .map(|part| match part {
                Part::Line(text) => text,
                Part::Block(content) => {
                    let budget = budgets.next().unwrap_or(0);
                    let limit = budget.saturating_sub(fence_overhead(content)).max(1);
                    fence_wrap(Some(content), limit)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Characters a fenced block adds around its content
fn fence_overhead(content: &str) -> usize {
    let fence_len = (longest_run(content, FENCE_CHAR) + 1).max(MIN_FENCE_LEN);
    2 * fence_len + 2
}

/// Characters `content` takes when rendered without a limit
fn full_size(content: &str) -> usize {
    if content.is_empty() {
        escape_markdown(PLACEHOLDER).chars().count()
    } else {
        content.chars().count() + fence_overhead(content)
    }
}

/// Split `available` characters among blocks, smallest first
fn share_budget(available: usize, blocks: &[&str]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..blocks.len()).collect();
    order.sort_by_key(|&i| full_size(blocks[i]));

    let mut budgets = vec![0; blocks.len()];
    let mut remaining = available;
    for (done, &i) in order.iter().enumerate() {
        let share = remaining / (blocks.len() - done);
        budgets[i] = full_size(blocks[i]).min(share);
        remaining -= budgets[i];
    }
    budgets
}

/// Render `outcome` as a message of at most `max_len` characters
pub fn format(outcome: &Outcome, max_len: usize) -> String {
    MessageFormatter::new(max_len).format(outcome)
}
