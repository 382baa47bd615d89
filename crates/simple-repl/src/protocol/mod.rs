//! MCP Protocol Layer
//!
//! Implements the Model Context Protocol server using rmcp 0.9, exposing the
//! session manager and the workspace as MCP tools.

pub mod server;

pub use server::ReplServer;
