//! # simple-repl-session
//!
//! Session lifecycle management for simple-repl.
//!
//! This crate provides:
//! - Named session registry with lazy creation and idempotent reuse
//! - Text dispatch (line normalization and writes to a session)
//! - The surface host seam, with an in-memory workspace implementation
//! - The HUD: a transient overlay revealing a session's latest output
//! - `ReplManager`, the `open` / `send` / `close` facade tying them together
//!
//! ## Architecture
//!
//! This is Layer 2 in the architecture - it depends on simple-repl-core
//! and simple-repl-term to manage REPL session lifecycles.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dispatch;
pub mod hud;
pub mod manager;
pub mod output;
pub mod process;
pub mod registry;
pub mod schedule;
pub mod session;
pub mod surface;
pub mod testing;

// Re-export commonly used types
pub use dispatch::normalize;
pub use hud::{decide, Hud, HudDecision, HudOutcome, Visibility};
pub use manager::{OpenOptions, OpenOutcome, ReplManager, SendOptions, SendOutcome};
pub use output::OutputRead;
pub use process::{ProcessHost, PtyProcessHost, ReplProcess, SpawnSpec};
pub use registry::{SessionInfo, SessionRegistry, SpawnSettings, StartupConfig};
pub use schedule::{ManualScheduler, Scheduler, TokioScheduler};
pub use session::Session;
pub use surface::{SurfaceHost, SurfaceInfo, SurfaceKind, TabScope, Workspace};
