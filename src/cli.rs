//! Terminal input for the `draft-reply` binary.

use std::io::BufRead;

pub const READY_MESSAGE: &str =
    "Email RAG agent ready. Paste the client's email below, then press Enter twice.";
pub const NO_INPUT_MESSAGE: &str = "No email text provided. Exiting.";
pub const REPLY_HEADER: &str = "--- Drafted Reply ---";

/// Reads lines until a blank line that follows some content, or EOF.
/// Blank lines before any content are kept and trimmed away at the end.
pub fn read_email<R: BufRead>(reader: R) -> std::io::Result<String> {
    let mut lines: Vec<String> = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() && !lines.is_empty() {
            break;
        }
        lines.push(line);
    }

    Ok(lines.join("\n").trim().to_string())
}
