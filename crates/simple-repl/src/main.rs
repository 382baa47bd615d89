//! # simple-repl
//!
//! Model Context Protocol server managing named REPL sessions.
//!
//! ## Overview
//!
//! This server provides MCP tools for:
//! - Session management (open, close, list)
//! - Sending text to a session
//! - Reading a session's output
//! - Peeking at output through a transient HUD, dismissed by editor events
//!
//! ## Architecture
//!
//! This is Layer 3 - the binary that ties together:
//! - simple-repl-core: Core types and configuration
//! - simple-repl-term: PTY processes and display buffers
//! - simple-repl-session: Session registry, dispatch and the HUD

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use rmcp::{transport::stdio, ServiceExt};
use simple_repl::ReplServer;
use simple_repl_core::ReplConfig;
use simple_repl_session::{PtyProcessHost, ReplManager, TokioScheduler, Workspace};

const CONFIG_ENV: &str = "SIMPLE_REPL_CONFIG";

/// `--config <path>` or `--config=<path>`, else `$SIMPLE_REPL_CONFIG`.
fn config_path(args: &[String]) -> Option<PathBuf> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            return iter.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(path));
        }
    }
    std::env::var_os(CONFIG_ENV).map(PathBuf::from)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let config = match config_path(&args) {
        Some(path) => ReplConfig::from_file(&path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ReplConfig::default(),
    };

    // Initialize logging; stdout carries the MCP transport
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.server.log_level)),
        )
        .init();

    tracing::info!(
        "simple-repl v{} starting (prefix '{}', shell '{}')",
        env!("CARGO_PKG_VERSION"),
        config.session.prefix,
        config.session.shell
    );

    let scheduler = TokioScheduler::current().context("no tokio runtime for deferred tasks")?;
    let workspace = Arc::new(Workspace::new());
    let manager = Arc::new(ReplManager::new(
        config,
        Arc::new(PtyProcessHost),
        workspace.clone(),
        Arc::new(scheduler),
    ));
    let server = ReplServer::new(Arc::clone(&manager), workspace);

    tracing::info!("Server initialized, starting stdio transport...");

    // Serve the MCP server over stdio
    let service = server.serve(stdio()).await.map_err(|e| {
        tracing::error!("Error starting server: {}", e);
        e
    })?;

    // Wait for the service to complete
    service.waiting().await?;

    let closed = manager.close_all();
    tracing::info!("simple-repl shutting down ({} session(s) closed)", closed);

    Ok(())
}
