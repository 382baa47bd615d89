//! # simple-repl-core
//!
//! Core types for simple-repl.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other simple-repl crates. It provides:
//!
//! - Session identity (SessionName, SessionId, SessionStatus)
//! - Surface vocabulary (BufferId, SurfaceId, Placement, ShowPolicy, EditorEvent)
//! - Geometry types (Dimensions, HudGeometry)
//! - Configuration loaded from YAML
//! - Error types
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other simple-repl crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod geometry;
pub mod session;
pub mod surface;

// Re-export commonly used types
pub use config::{
    HudSettings, OpenSettings, ReplConfig, SendSettings, ServerSettings, SessionSettings,
    TerminalSettings,
};
pub use error::{Error, Result};
pub use geometry::{Dimensions, HudAnchor, HudBorder, HudGeometry};
pub use session::{SessionId, SessionName, SessionStatus, DEFAULT_PREFIX};
pub use surface::{BufferId, EditorEvent, Placement, ShowPolicy, SurfaceId, TabpageId};
