//! MCP Tool Types
//!
//! Parameter and response types for every tool the server exposes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use simple_repl_core::{EditorEvent, HudGeometry, Placement, SessionStatus, ShowPolicy};
use simple_repl_session::{HudOutcome, SurfaceInfo};

// =============================================================================
// Session Tools
// =============================================================================

/// Parameters for repl_open
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ReplOpenParams {
    /// Session name; the bare prefix session when omitted
    #[serde(default)]
    pub name: Option<String>,

    /// Command typed into the shell when the session is created (e.g. "python3")
    #[serde(default)]
    pub cmd: Option<String>,

    /// Working directory for a new session
    #[serde(default)]
    pub cwd: Option<String>,

    /// Placement: current, split, vsplit, hud or none
    #[serde(default)]
    pub win: Option<Placement>,

    /// Focus the new window
    #[serde(default)]
    pub focus: Option<bool>,

    /// Show policy when win is hud: always, never or if_not_visible
    #[serde(default)]
    pub show: Option<ShowPolicy>,

    /// HUD geometry override
    #[serde(default)]
    pub hud: Option<HudGeometry>,
}

/// Response for repl_open
#[derive(Debug, Clone, Serialize)]
pub struct ReplOpenResponse {
    /// Composite session name
    pub session: String,

    /// Session identifier
    pub session_id: String,

    /// Whether the session was created by this call
    pub created: bool,

    /// Window opened for the session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface: Option<u64>,

    /// HUD result when win was hud
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hud: Option<HudOutcome>,

    /// Success message
    pub message: String,
}

/// Parameters for repl_send
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ReplSendParams {
    /// Session name
    #[serde(default)]
    pub name: Option<String>,

    /// Lines to send
    #[serde(default)]
    pub lines: Vec<String>,

    /// Single text to send, appended after `lines`
    #[serde(default)]
    pub text: Option<String>,

    /// Line separator (default "\n")
    #[serde(default)]
    pub separator: Option<String>,

    /// Show policy: always, never or if_not_visible
    #[serde(default)]
    pub show: Option<ShowPolicy>,

    /// HUD geometry override
    #[serde(default)]
    pub hud: Option<HudGeometry>,
}

impl ReplSendParams {
    /// All lines to send, `text` last.
    pub fn all_lines(&self) -> Vec<String> {
        let mut lines = self.lines.clone();
        if let Some(text) = &self.text {
            lines.push(text.clone());
        }
        lines
    }
}

/// Response for repl_send
#[derive(Debug, Clone, Serialize)]
pub struct ReplSendResponse {
    /// Whether anything was written
    pub sent: bool,

    /// Composite session name
    pub session: String,

    /// Bytes written
    pub bytes: usize,

    /// HUD result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hud: Option<HudOutcome>,
}

/// Parameters for repl_close
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ReplCloseParams {
    /// Session to close
    #[serde(default)]
    pub name: Option<String>,
}

/// Response for repl_close
#[derive(Debug, Clone, Serialize)]
pub struct ReplCloseResponse {
    /// Session that was closed
    pub session: String,

    /// Windows closed along with it
    pub closed_surfaces: Vec<u64>,

    /// Success message
    pub message: String,
}

/// Parameters for repl_list
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ReplListParams {}

/// Response for repl_list
#[derive(Debug, Clone, Serialize)]
pub struct ReplListResponse {
    /// Registered sessions
    pub sessions: Vec<SessionEntry>,

    /// Total count
    pub count: usize,
}

/// Information about a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionEntry {
    /// Composite session name
    pub name: String,

    /// Session identifier
    pub session_id: String,

    /// Shell running the session
    pub command: String,

    /// Working directory
    pub cwd: String,

    /// Process status
    pub status: SessionStatus,

    /// Session age in seconds
    pub age_seconds: u64,
}

/// Parameters for repl_read
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReplReadParams {
    /// Session to read
    #[serde(default)]
    pub name: Option<String>,

    /// Maximum number of lines to return
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,

    /// Stop at the last non-blank line instead of the last line
    #[serde(default)]
    pub latest: bool,
}

fn default_max_lines() -> usize {
    50
}

/// Response for repl_read
#[derive(Debug, Clone, Serialize)]
pub struct ReplReadResponse {
    /// Session read
    pub session: String,

    /// Output lines, oldest first
    pub lines: Vec<String>,

    /// Lines held in the buffer
    pub total_lines: usize,

    /// Index of the last non-blank line
    pub last_non_blank: usize,

    /// Whether older lines were left out
    pub has_more: bool,
}

/// Parameters for repl_hud
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ReplHudParams {
    /// Session to peek at
    #[serde(default)]
    pub name: Option<String>,

    /// Show policy (default always)
    #[serde(default)]
    pub show: Option<ShowPolicy>,

    /// HUD geometry override
    #[serde(default)]
    pub hud: Option<HudGeometry>,
}

// =============================================================================
// Editor Tools
// =============================================================================

/// Parameters for editor_event
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EditorEventParams {
    /// Event: cursor_moved, cmdline_enter or insert_enter
    pub event: EditorEvent,
}

/// Response for editor_event
#[derive(Debug, Clone, Serialize)]
pub struct EditorEventResponse {
    /// Event delivered
    pub event: EditorEvent,

    /// Triggers that fired
    pub fired: usize,
}

/// Tabpage action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TabAction {
    /// Open a new tabpage and make it active
    New,
    /// Make an existing tabpage active
    Switch,
}

/// Parameters for editor_tab
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EditorTabParams {
    /// Action to take
    pub action: TabAction,

    /// Target tabpage for switch
    #[serde(default)]
    pub tabpage: Option<u64>,
}

/// Parameters for editor_layout
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct EditorLayoutParams {
    /// Include every tabpage instead of only the active one
    #[serde(default)]
    pub all_tabs: bool,
}

/// Response for editor_layout and editor_tab
#[derive(Debug, Clone, Serialize)]
pub struct EditorLayoutResponse {
    /// Active tabpage
    pub active_tab: u64,

    /// Every tabpage
    pub tabpages: Vec<u64>,

    /// Focused window of the active tabpage
    pub focused: u64,

    /// Windows
    pub surfaces: Vec<SurfaceInfo>,
}
