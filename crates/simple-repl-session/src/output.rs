//! Reading a session's display buffer.

use serde::Serialize;

use crate::session::Session;

/// Output read result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRead {
    /// The most recent lines, oldest first
    pub lines: Vec<String>,
    /// Lines held in the buffer
    pub total_lines: usize,
    /// Index of the last non-blank line in the buffer
    pub last_non_blank: usize,
    /// Whether older lines were left out
    pub has_more: bool,
}

impl Session {
    /// Read the last `max_lines` lines of output.
    pub fn read_output(&self, max_lines: usize) -> OutputRead {
        let buffer = self.buffer();
        let lines = buffer.tail(max_lines);
        let snapshot = buffer.snapshot();

        OutputRead {
            has_more: snapshot.line_count > lines.len(),
            lines,
            total_lines: snapshot.line_count,
            last_non_blank: snapshot.last_non_blank,
        }
    }

    /// Read the lines up to and including the last non-blank one, at most
    /// `max_lines` of them.
    ///
    /// This is what a HUD shows: trailing blank lines left by a prompt are
    /// not worth a peek.
    pub fn read_latest(&self, max_lines: usize) -> OutputRead {
        let buffer = self.buffer();
        let all = buffer.lines();
        let last_non_blank = buffer.last_non_blank_line();

        let end = (last_non_blank + 1).min(all.len());
        let start = end.saturating_sub(max_lines);

        OutputRead {
            lines: all[start..end].to_vec(),
            total_lines: all.len(),
            last_non_blank,
            has_more: start > 0,
        }
    }
}
