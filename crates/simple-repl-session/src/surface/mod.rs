//! Surface host support: where a session's display buffer is shown.
//!
//! Window layout belongs to the host. simple-repl only asks it to open,
//! close, list and scroll surfaces, and to call back on a few events.

use serde::Serialize;

use simple_repl_core::{
    BufferId, EditorEvent, HudGeometry, Placement, Result, SurfaceId, TabpageId,
};

pub mod triggers;
pub mod workspace;

pub use triggers::Triggers;
pub use workspace::Workspace;

/// Kind of surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    /// A regular window, kept until the user closes it
    Regular,
    /// A transient HUD window
    Overlay,
}

/// Which tabpages a query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabScope {
    /// Only the active tabpage
    Active,
    /// Every tabpage
    All,
}

/// A surface as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurfaceInfo {
    /// Surface handle
    pub id: SurfaceId,
    /// Tabpage holding the surface
    pub tabpage: TabpageId,
    /// Buffer shown, if any
    pub buffer: Option<BufferId>,
    /// Regular or overlay
    pub kind: SurfaceKind,
    /// Line the viewport cursor is on
    pub cursor_line: usize,
    /// Whether the surface has focus
    pub focused: bool,
}

/// Callback run when a registered event fires. Receives the host so it can
/// act on surfaces without holding a reference of its own.
pub type EventCallback = Box<dyn FnOnce(&dyn SurfaceHost) + Send>;

/// Platform-agnostic surface host interface.
pub trait SurfaceHost: Send + Sync {
    /// Show `buffer` in a regular surface on the active tabpage.
    ///
    /// Only `current`, `split` and `vsplit` are regular placements.
    fn open_regular(&self, buffer: BufferId, placement: Placement, focus: bool)
        -> Result<SurfaceId>;

    /// Show `buffer` in an overlay surface on the active tabpage, without
    /// taking focus. `geometry` is passed through uninterpreted.
    fn open_overlay(&self, buffer: BufferId, geometry: &HudGeometry) -> Result<SurfaceId>;

    /// Close a surface. Returns `false` when it was already gone.
    fn close(&self, surface: SurfaceId) -> bool;

    /// Whether a surface still exists.
    fn is_valid(&self, surface: SurfaceId) -> bool;

    /// Surfaces showing `buffer` within `scope`.
    fn surfaces_showing(&self, buffer: BufferId, scope: TabScope) -> Vec<SurfaceInfo>;

    /// Put a surface's viewport cursor on `line`. Returns `false` when the
    /// surface is gone.
    fn set_cursor(&self, surface: SurfaceId, line: usize) -> bool;

    /// Run `callback` once, on the first of `events` to fire.
    fn once(&self, events: &[EditorEvent], callback: EventCallback);
}
