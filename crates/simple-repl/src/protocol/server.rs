//! simple-repl MCP Server Implementation
//!
//! Routes MCP tool calls to the `ReplManager` and, for the editor tools, to
//! the in-memory workspace standing in for an editor.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router, ErrorData as McpError,
};
use serde::Serialize;
use tracing::{debug, error, info, instrument};

use simple_repl_core::{Error, TabpageId};
use simple_repl_session::{
    OpenOptions, ReplManager, SendOptions, StartupConfig, TabScope, Workspace,
};

use crate::tools::*;

/// Map a library error onto a JSON-RPC error.
fn mcp_error(e: Error) -> McpError {
    let code = match e {
        Error::SessionNotFound(_) | Error::InvalidInput(_) => ErrorCode(-32602), // Invalid params
        _ => ErrorCode(-32603),                                                  // Internal error
    };
    McpError::new(code, e.to_string(), None)
}

fn json_result<T: Serialize>(response: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(response).map_err(|e| {
        error!("Failed to serialize response: {}", e);
        mcp_error(Error::from(e))
    })?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

/// simple-repl MCP Server
///
/// Manages named REPL sessions and exposes them via MCP tools.
#[derive(Clone)]
pub struct ReplServer {
    manager: Arc<ReplManager>,
    workspace: Arc<Workspace>,
    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ReplServer {
    /// Create a server over `manager`, whose surface host is `workspace`.
    pub fn new(manager: Arc<ReplManager>, workspace: Arc<Workspace>) -> Self {
        Self {
            manager,
            workspace,
            tool_router: Self::tool_router(),
        }
    }

    /// The session manager.
    pub fn manager(&self) -> &Arc<ReplManager> {
        &self.manager
    }

    fn layout(&self, scope: TabScope) -> EditorLayoutResponse {
        EditorLayoutResponse {
            active_tab: self.workspace.active_tab().0,
            tabpages: self.workspace.tabpages().into_iter().map(|t| t.0).collect(),
            focused: self.workspace.focused().0,
            surfaces: self.workspace.surfaces(scope),
        }
    }

    /// Open (or reuse) a named REPL session
    #[tool(
        description = "Open a named REPL session, creating it on first use, and show it (current, split, vsplit, hud or none)"
    )]
    #[instrument(skip_all)]
    async fn repl_open(
        &self,
        Parameters(params): Parameters<ReplOpenParams>,
    ) -> Result<CallToolResult, McpError> {
        info!(
            "Opening session: name={:?}, cmd={:?}, win={:?}",
            params.name, params.cmd, params.win
        );

        let startup = StartupConfig {
            cwd: params.cwd.map(PathBuf::from),
            cmd: params.cmd,
            on_create: None,
        };
        let options = OpenOptions {
            win: params.win,
            focus: params.focus,
            show: params.show,
            hud: params.hud,
        };

        let outcome = self
            .manager
            .open(params.name.as_deref(), startup, options)
            .map_err(|e| {
                error!("Failed to open session: {}", e);
                mcp_error(e)
            })?;

        let response = ReplOpenResponse {
            message: if outcome.created {
                format!("Session '{}' created", outcome.session)
            } else {
                format!("Session '{}' reused", outcome.session)
            },
            session: outcome.session.to_string(),
            session_id: outcome.id.to_string(),
            created: outcome.created,
            surface: outcome.surface.map(|s| s.0),
            hud: outcome.hud,
        };
        json_result(&response)
    }

    /// Send lines to a session
    #[tool(
        description = "Send lines of text to a session. Lines are joined with the separator and terminated. Missing sessions are not created."
    )]
    #[instrument(skip_all)]
    async fn repl_send(
        &self,
        Parameters(params): Parameters<ReplSendParams>,
    ) -> Result<CallToolResult, McpError> {
        let lines = params.all_lines();
        debug!("Sending {} line(s) to {:?}", lines.len(), params.name);

        let options = SendOptions {
            separator: params.separator,
            show: params.show,
            hud: params.hud,
        };
        let response = match self.manager.send(params.name.as_deref(), &lines, options) {
            Some(outcome) => ReplSendResponse {
                sent: outcome.bytes > 0,
                session: outcome.session.to_string(),
                bytes: outcome.bytes,
                hud: outcome.hud,
            },
            None => ReplSendResponse {
                sent: false,
                session: self.manager.session_name(params.name.as_deref()).to_string(),
                bytes: 0,
                hud: None,
            },
        };
        json_result(&response)
    }

    /// Close a session
    #[tool(description = "Close a session: kill its process and close every window showing it")]
    #[instrument(skip_all)]
    async fn repl_close(
        &self,
        Parameters(params): Parameters<ReplCloseParams>,
    ) -> Result<CallToolResult, McpError> {
        let session = self.manager.session_name(params.name.as_deref());
        info!("Closing session: {}", session);

        let closed = self
            .manager
            .close(params.name.as_deref())
            .map_err(mcp_error)?;

        let response = ReplCloseResponse {
            message: format!("Session '{}' closed", session),
            session: session.to_string(),
            closed_surfaces: closed.into_iter().map(|s| s.0).collect(),
        };
        json_result(&response)
    }

    /// List sessions
    #[tool(description = "List registered REPL sessions")]
    #[instrument(skip_all)]
    async fn repl_list(
        &self,
        Parameters(_params): Parameters<ReplListParams>,
    ) -> Result<CallToolResult, McpError> {
        let now = SystemTime::now();
        let sessions: Vec<SessionEntry> = self
            .manager
            .list()
            .into_iter()
            .map(|info| SessionEntry {
                name: info.name.to_string(),
                session_id: info.session_id.to_string(),
                command: info.command,
                cwd: info.cwd.display().to_string(),
                status: info.status,
                age_seconds: now
                    .duration_since(info.created_at)
                    .map(|d| d.as_secs())
                    .unwrap_or(0),
            })
            .collect();

        debug!("Found {} sessions", sessions.len());
        let response = ReplListResponse {
            count: sessions.len(),
            sessions,
        };
        json_result(&response)
    }

    /// Read session output
    #[tool(description = "Read the most recent output lines of a session")]
    #[instrument(skip_all)]
    async fn repl_read(
        &self,
        Parameters(params): Parameters<ReplReadParams>,
    ) -> Result<CallToolResult, McpError> {
        let name = self.manager.session_name(params.name.as_deref());
        let session = self
            .manager
            .get(params.name.as_deref())
            .ok_or_else(|| mcp_error(Error::SessionNotFound(name.to_string())))?;

        let read = if params.latest {
            session.read_latest(params.max_lines)
        } else {
            session.read_output(params.max_lines)
        };

        let response = ReplReadResponse {
            session: session.name().to_string(),
            lines: read.lines,
            total_lines: read.total_lines,
            last_non_blank: read.last_non_blank,
            has_more: read.has_more,
        };
        json_result(&response)
    }

    /// Peek at a session through the HUD
    #[tool(description = "Run the HUD policy for a session without sending text")]
    #[instrument(skip_all)]
    async fn repl_hud(
        &self,
        Parameters(params): Parameters<ReplHudParams>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .manager
            .hud(params.name.as_deref(), params.show, params.hud)
            .map_err(mcp_error)?;
        info!("HUD decision: {:?}", outcome.decision);
        json_result(&outcome)
    }

    /// Deliver an editor event
    #[tool(
        description = "Deliver an editor event (cursor_moved, cmdline_enter, insert_enter); an open HUD is dismissed by any of them"
    )]
    #[instrument(skip_all)]
    async fn editor_event(
        &self,
        Parameters(params): Parameters<EditorEventParams>,
    ) -> Result<CallToolResult, McpError> {
        let fired = self.workspace.notify(params.event);
        json_result(&EditorEventResponse {
            event: params.event,
            fired,
        })
    }

    /// Open or switch tabpages
    #[tool(description = "Open a new tabpage or switch to an existing one")]
    #[instrument(skip_all)]
    async fn editor_tab(
        &self,
        Parameters(params): Parameters<EditorTabParams>,
    ) -> Result<CallToolResult, McpError> {
        match params.action {
            TabAction::New => {
                self.workspace.new_tab();
            }
            TabAction::Switch => {
                let tabpage = params.tabpage.ok_or_else(|| {
                    McpError::new(
                        ErrorCode(-32602),
                        "tabpage is required for switch".to_string(),
                        None,
                    )
                })?;
                self.workspace
                    .switch_tab(TabpageId(tabpage))
                    .map_err(|e| McpError::new(ErrorCode(-32602), e.to_string(), None))?;
            }
        }
        json_result(&self.layout(TabScope::Active))
    }

    /// Describe the window layout
    #[tool(description = "Describe tabpages and windows, including which buffer each shows")]
    #[instrument(skip_all)]
    async fn editor_layout(
        &self,
        Parameters(params): Parameters<EditorLayoutParams>,
    ) -> Result<CallToolResult, McpError> {
        let scope = if params.all_tabs {
            TabScope::All
        } else {
            TabScope::Active
        };
        json_result(&self.layout(scope))
    }
}

// Implement the ServerHandler trait to define server capabilities
#[tool_handler]
impl rmcp::ServerHandler for ReplServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "simple-repl - Named REPL sessions with a peek-at-output HUD. \
                 Use repl_open to start a session (e.g. name 'py', cmd 'python3'), \
                 repl_send to send lines to it, repl_read to read its output and \
                 repl_close to end it. editor_event dismisses an open HUD."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
