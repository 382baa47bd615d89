//! Line-oriented display buffer for a REPL session.
//!
//! Raw PTY output goes through a VTE parser that keeps only what matters for
//! peeking at a REPL: printable text, line breaks, carriage returns,
//! backspaces and line erasure. Colors and cursor addressing are dropped.
//! Lines wrap at the terminal width, as they would on screen.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tracing::{debug, warn};
use vte::{Params, Perform};

use simple_repl_core::BufferId;

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

const TAB_WIDTH: usize = 8;

/// Width used when none is given.
pub const DEFAULT_WIDTH: usize = 80;

/// Snapshot handed to change listeners after new output landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentChange {
    /// Buffer that changed
    pub buffer: BufferId,
    /// Number of lines now in the buffer
    pub line_count: usize,
    /// Index of the last line containing something other than whitespace
    pub last_non_blank: usize,
}

impl ContentChange {
    /// Index of the last line.
    pub fn last_line(&self) -> usize {
        self.line_count.saturating_sub(1)
    }
}

type Listener = Box<dyn FnMut(&ContentChange) -> bool + Send>;

/// Display buffer fed by a session's output.
///
/// Always holds at least one (possibly empty) line.
pub struct Scrollback {
    id: BufferId,
    state: Mutex<ParseState>,
    listeners: Mutex<Vec<Listener>>,
}

struct ParseState {
    parser: vte::Parser,
    lines: Lines,
}

/// The text model the VTE parser writes into.
#[derive(Debug)]
struct Lines {
    lines: Vec<String>,
    /// Cursor column (in chars) on the last line, at most `width`
    col: usize,
    width: usize,
    max_lines: usize,
}

impl Scrollback {
    /// Create an empty buffer keeping at most `max_lines` lines of
    /// [`DEFAULT_WIDTH`] columns.
    pub fn new(max_lines: usize) -> Self {
        Self::with_width(max_lines, DEFAULT_WIDTH)
    }

    /// Create an empty buffer keeping at most `max_lines` lines, wrapping
    /// at `width` columns.
    pub fn with_width(max_lines: usize, width: usize) -> Self {
        Self {
            id: BufferId(NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed)),
            state: Mutex::new(ParseState {
                parser: vte::Parser::new(),
                lines: Lines::new(max_lines.max(1), width.max(1)),
            }),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Handle identifying this buffer to the surface host.
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Feed raw process output, then notify change listeners.
    ///
    /// Listeners run after the text lock is released, so they may read the
    /// buffer. They must not register new listeners.
    pub fn feed(&self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }

        let change = {
            let mut state = match self.state.lock() {
                Ok(state) => state,
                Err(poisoned) => {
                    warn!("Scrollback lock poisoned: {}", self.id);
                    poisoned.into_inner()
                }
            };
            let ParseState { parser, lines } = &mut *state;
            for byte in bytes {
                parser.advance(lines, *byte);
            }
            lines.change(self.id)
        };

        debug!(
            "Fed {} bytes into {}: {} lines",
            bytes.len(),
            self.id,
            change.line_count
        );
        self.notify(&change);
    }

    /// Register a listener called after every change.
    ///
    /// The listener stays attached while it returns `true`.
    pub fn on_change<F>(&self, listener: F)
    where
        F: FnMut(&ContentChange) -> bool + Send + 'static,
    {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push(Box::new(listener));
        }
    }

    /// Number of attached listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }

    /// All lines currently held.
    pub fn lines(&self) -> Vec<String> {
        self.with_lines(|lines| lines.lines.clone())
    }

    /// The last `n` lines.
    pub fn tail(&self, n: usize) -> Vec<String> {
        self.with_lines(|lines| {
            let start = lines.lines.len().saturating_sub(n);
            lines.lines[start..].to_vec()
        })
    }

    /// Number of lines currently held.
    pub fn line_count(&self) -> usize {
        self.with_lines(|lines| lines.lines.len())
    }

    /// Index of the last line with visible content, or of the last line when
    /// every line is blank.
    pub fn last_non_blank_line(&self) -> usize {
        self.with_lines(Lines::last_non_blank)
    }

    /// Current state as a change record.
    pub fn snapshot(&self) -> ContentChange {
        self.with_lines(|lines| lines.change(self.id))
    }

    fn with_lines<T>(&self, f: impl FnOnce(&Lines) -> T) -> T {
        match self.state.lock() {
            Ok(state) => f(&state.lines),
            Err(poisoned) => f(&poisoned.into_inner().lines),
        }
    }

    fn notify(&self, change: &ContentChange) {
        let mut listeners = match self.listeners.lock() {
            Ok(listeners) => listeners,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = listeners.len();
        listeners.retain_mut(|listener| listener(change));
        if listeners.len() != before {
            debug!(
                "Detached {} listener(s) from {}",
                before - listeners.len(),
                self.id
            );
        }
    }
}

impl std::fmt::Debug for Scrollback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scrollback")
            .field("id", &self.id)
            .field("line_count", &self.line_count())
            .finish_non_exhaustive()
    }
}

impl Lines {
    fn new(max_lines: usize, width: usize) -> Self {
        Self {
            lines: vec![String::new()],
            col: 0,
            width,
            max_lines,
        }
    }

    /// Move the cursor to `col`, kept on screen.
    fn move_to(&mut self, col: usize) {
        self.col = col.min(self.width - 1);
    }

    fn current(&mut self) -> &mut String {
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        let last = self.lines.len() - 1;
        &mut self.lines[last]
    }

    fn newline(&mut self) {
        self.lines.push(String::new());
        self.col = 0;
        if self.lines.len() > self.max_lines {
            let excess = self.lines.len() - self.max_lines;
            self.lines.drain(..excess);
        }
    }

    /// Write `c` at the cursor, overwriting what is there. Past the last
    /// column the text wraps onto a new line.
    fn put(&mut self, c: char) {
        if self.col >= self.width {
            self.newline();
        }
        let col = self.col;
        let line = self.current();
        let len = line.chars().count();
        if col >= len {
            line.extend(std::iter::repeat(' ').take(col - len));
            line.push(c);
        } else {
            *line = line
                .chars()
                .enumerate()
                .map(|(i, existing)| if i == col { c } else { existing })
                .collect();
        }
        self.col += 1;
    }

    /// Erase from the cursor to the end of the line.
    fn erase_to_end(&mut self) {
        let col = self.col;
        let line = self.current();
        if let Some((byte_idx, _)) = line.char_indices().nth(col) {
            line.truncate(byte_idx);
        }
    }

    fn last_non_blank(&self) -> usize {
        self.lines
            .iter()
            .rposition(|line| !line.trim().is_empty())
            .unwrap_or(self.lines.len().saturating_sub(1))
    }

    fn change(&self, buffer: BufferId) -> ContentChange {
        ContentChange {
            buffer,
            line_count: self.lines.len(),
            last_non_blank: self.last_non_blank(),
        }
    }
}

fn first_param(params: &Params, default: u16) -> u16 {
    params
        .iter()
        .next()
        .and_then(|p| p.first().copied())
        .filter(|&n| n != 0)
        .unwrap_or(default)
}

impl Perform for Lines {
    fn print(&mut self, c: char) {
        self.put(c);
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            // Backspace
            0x08 => self.col = self.col.saturating_sub(1),
            // Horizontal tab
            0x09 => self.move_to((self.col / TAB_WIDTH + 1) * TAB_WIDTH),
            // Line feed, vertical tab, form feed
            0x0A..=0x0C => self.newline(),
            // Carriage return
            0x0D => self.col = 0,
            _ => {}
        }
    }

    fn csi_dispatch(&mut self, params: &Params, _intermediates: &[u8], _ignore: bool, c: char) {
        match c {
            // Cursor forward
            'C' => self.move_to(self.col + first_param(params, 1) as usize),
            // Cursor backward
            'D' => self.col = self.col.saturating_sub(first_param(params, 1) as usize),
            // Cursor horizontal absolute (1-based)
            'G' => self.move_to(first_param(params, 1) as usize - 1),
            // Erase in line
            'K' => {
                let mode = params
                    .iter()
                    .next()
                    .and_then(|p| p.first().copied())
                    .unwrap_or(0);
                match mode {
                    0 => self.erase_to_end(),
                    2 => {
                        self.current().clear();
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
}
