//! # simple-repl-term
//!
//! Terminal plumbing for simple-repl.
//!
//! This crate provides:
//! - PTY (pseudo-terminal) lifecycle management for REPL processes
//! - A line-oriented display buffer fed through a VTE parser, with change
//!   listeners for anything that follows the latest output
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends on simple-repl-core
//! only.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod pty;
pub mod scrollback;

// Re-export commonly used types
pub use pty::PtyHandle;
pub use scrollback::{ContentChange, Scrollback};
