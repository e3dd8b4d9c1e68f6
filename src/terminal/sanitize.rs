//! Output Sanitization
//!
//! Turns raw terminal output into plain text: escape sequences and control
//! characters are removed and surrounding whitespace is trimmed.

use once_cell::sync::Lazy;
use regex::Regex;

/// OSC, DCS/SOS/PM/APC strings, CSI (7-bit and C1) and two-byte escapes
static ESCAPE_SEQUENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)",
        r"|\x1b[PX^_][^\x1b]*\x1b\\",
        r"|\x1b\[[0-?]*[ -/]*[@-~]",
        r"|\x{9b}[0-?]*[ -/]*[@-~]",
        r"|\x1b[ -/]*[0-~]",
    ))
    .expect("escape sequence regex is valid")
});

/// Strip terminal control sequences and trim the result.
///
/// Newlines and tabs survive; carriage returns and every other control
/// character are dropped, so `\r\n` line endings become `\n`. Applying this
/// to its own output returns it unchanged.
pub fn sanitize(raw: &str) -> String {
    let without_escapes = ESCAPE_SEQUENCE.replace_all(raw, "");
    let text: String = without_escapes
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();
    text.trim().to_string()
}

/// Drop the first line of `output` when it is the echo of `input`
pub fn strip_echo(output: &str, input: &str) -> String {
    let input = input.trim();
    if input.is_empty() {
        return output.to_string();
    }

    match output.split_once('\n') {
        Some((first, rest)) if first.trim() == input => rest.trim_start_matches('\n').to_string(),
        None if output.trim() == input => String::new(),
        _ => output.to_string(),
    }
}
