//! The HUD: a transient overlay revealing a session's latest output.
//!
//! Whether to open, keep or close the overlay depends only on the show policy
//! and on how many regular and overlay surfaces already show the session's
//! buffer on the active tabpage. [`decide`] is that rule; [`Hud`] applies it
//! against a surface host.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use simple_repl_core::{EditorEvent, HudGeometry, Result, ShowPolicy, SurfaceId};
use simple_repl_term::Scrollback;

use crate::schedule::Scheduler;
use crate::surface::{SurfaceHost, SurfaceKind, TabScope};

/// Where a session's buffer is visible on the active tabpage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Not shown anywhere
    Hidden,
    /// Shown in one or more regular surfaces
    VisibleRegular,
    /// Shown in an overlay only
    VisibleOverlay,
    /// Shown in both
    VisibleBoth,
}

impl Visibility {
    /// Classify from regular and overlay surface counts.
    pub fn from_counts(regular: usize, overlay: usize) -> Self {
        match (regular > 0, overlay > 0) {
            (false, false) => Visibility::Hidden,
            (true, false) => Visibility::VisibleRegular,
            (false, true) => Visibility::VisibleOverlay,
            (true, true) => Visibility::VisibleBoth,
        }
    }
}

/// What the visibility policy decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HudDecision {
    /// Close every existing overlay
    CloseExisting,
    /// Leave the existing overlay alone
    KeepExisting,
    /// Do nothing
    Skip,
    /// Open a new overlay
    Open,
}

/// Apply the visibility rule.
///
/// An overlay is never stacked on top of another one.
pub fn decide(show: ShowPolicy, regular: usize, overlay: usize) -> HudDecision {
    if overlay > 0 {
        return match show {
            ShowPolicy::Never => HudDecision::CloseExisting,
            ShowPolicy::IfNotVisible if regular > 0 => HudDecision::CloseExisting,
            _ => HudDecision::KeepExisting,
        };
    }

    match show {
        ShowPolicy::Never => HudDecision::Skip,
        ShowPolicy::IfNotVisible if regular > 0 => HudDecision::Skip,
        _ => HudDecision::Open,
    }
}

/// Result of running the HUD for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HudOutcome {
    /// Decision taken
    pub decision: HudDecision,
    /// Visibility before acting
    pub visibility: Visibility,
    /// Overlay opened, if any
    pub opened: Option<SurfaceId>,
    /// Overlays closed
    pub closed: Vec<SurfaceId>,
}

/// Runs the visibility policy against a surface host.
///
/// Counting surfaces and acting on the decision happen under one lock, so
/// concurrent callers never both see `O == 0` and open two overlays.
pub struct Hud {
    host: Arc<dyn SurfaceHost>,
    scheduler: Arc<dyn Scheduler>,
    settle: Duration,
    policy: Mutex<()>,
}

impl Hud {
    /// Create a HUD. `settle` is how long to wait for fresh output before
    /// re-positioning a newly opened overlay.
    pub fn new(host: Arc<dyn SurfaceHost>, scheduler: Arc<dyn Scheduler>, settle: Duration) -> Self {
        Self {
            host,
            scheduler,
            settle,
            policy: Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        match self.policy.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("HUD lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Apply `show` for the session displayed in `buffer`.
    ///
    /// Only a refused overlay open is an error.
    pub fn show(
        &self,
        buffer: &Arc<Scrollback>,
        show: ShowPolicy,
        geometry: &HudGeometry,
    ) -> Result<HudOutcome> {
        let _policy = self.lock();
        let surfaces = self.host.surfaces_showing(buffer.id(), TabScope::Active);
        let (overlays, regular): (Vec<_>, Vec<_>) = surfaces
            .into_iter()
            .partition(|s| s.kind == SurfaceKind::Overlay);

        let visibility = Visibility::from_counts(regular.len(), overlays.len());
        let decision = decide(show, regular.len(), overlays.len());
        debug!(
            "HUD for {}: show={:?}, regular={}, overlay={} -> {:?}",
            buffer.id(),
            show,
            regular.len(),
            overlays.len(),
            decision
        );

        let mut outcome = HudOutcome {
            decision,
            visibility,
            opened: None,
            closed: Vec::new(),
        };

        match decision {
            HudDecision::CloseExisting => {
                for overlay in overlays {
                    if self.host.close(overlay.id) {
                        info!("Closed HUD {} for {}", overlay.id, buffer.id());
                        outcome.closed.push(overlay.id);
                    }
                }
            }
            HudDecision::Open => {
                outcome.opened = Some(self.open(buffer, geometry)?);
            }
            HudDecision::KeepExisting | HudDecision::Skip => {}
        }

        Ok(outcome)
    }

    fn open(&self, buffer: &Arc<Scrollback>, geometry: &HudGeometry) -> Result<SurfaceId> {
        let surface = self.host.open_overlay(buffer.id(), geometry)?;
        self.host.set_cursor(surface, buffer.last_non_blank_line());
        info!("Opened HUD {} for {}", surface, buffer.id());

        let host = Arc::clone(&self.host);
        let settled = Arc::clone(buffer);
        self.scheduler.defer(
            self.settle,
            Box::new(move || {
                if host.is_valid(surface) {
                    host.set_cursor(surface, settled.last_non_blank_line());
                }
            }),
        );

        self.host.once(
            &EditorEvent::DISMISS,
            Box::new(move |host: &dyn SurfaceHost| {
                if host.close(surface) {
                    info!("Dismissed HUD {}", surface);
                }
            }),
        );

        let host = Arc::clone(&self.host);
        buffer.on_change(move |change| {
            if !host.is_valid(surface) {
                debug!("HUD {} gone, no longer following {}", surface, change.buffer);
                return false;
            }
            host.set_cursor(surface, change.last_line());
            true
        });

        Ok(surface)
    }
}

impl std::fmt::Debug for Hud {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hud").field("settle", &self.settle).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ManualScheduler;
    use crate::surface::Workspace;
    use simple_repl_core::Placement;

    struct Fixture {
        workspace: Arc<Workspace>,
        scheduler: Arc<ManualScheduler>,
        hud: Hud,
        buffer: Arc<Scrollback>,
    }

    fn fixture() -> Fixture {
        let workspace = Arc::new(Workspace::new());
        let scheduler = Arc::new(ManualScheduler::new());
        let hud = Hud::new(
            workspace.clone(),
            scheduler.clone(),
            Duration::from_millis(50),
        );
        Fixture {
            workspace,
            scheduler,
            hud,
            buffer: Arc::new(Scrollback::new(100)),
        }
    }

    fn overlay_count(f: &Fixture) -> usize {
        f.workspace
            .surfaces_showing(f.buffer.id(), TabScope::Active)
            .iter()
            .filter(|s| s.kind == SurfaceKind::Overlay)
            .count()
    }

    #[test]
    fn test_decide_with_overlay() {
        assert_eq!(decide(ShowPolicy::Never, 0, 1), HudDecision::CloseExisting);
        assert_eq!(decide(ShowPolicy::Never, 2, 1), HudDecision::CloseExisting);
        assert_eq!(
            decide(ShowPolicy::IfNotVisible, 1, 1),
            HudDecision::CloseExisting
        );
        assert_eq!(
            decide(ShowPolicy::IfNotVisible, 0, 1),
            HudDecision::KeepExisting
        );
        assert_eq!(decide(ShowPolicy::Always, 0, 1), HudDecision::KeepExisting);
        assert_eq!(decide(ShowPolicy::Always, 3, 1), HudDecision::KeepExisting);
    }

    #[test]
    fn test_decide_without_overlay() {
        assert_eq!(decide(ShowPolicy::IfNotVisible, 1, 0), HudDecision::Skip);
        assert_eq!(decide(ShowPolicy::Always, 1, 0), HudDecision::Open);
        assert_eq!(decide(ShowPolicy::Never, 1, 0), HudDecision::Skip);
        assert_eq!(decide(ShowPolicy::IfNotVisible, 0, 0), HudDecision::Open);
        assert_eq!(decide(ShowPolicy::Always, 0, 0), HudDecision::Open);
        assert_eq!(decide(ShowPolicy::Never, 0, 0), HudDecision::Skip);
    }

    #[test]
    fn test_visibility_from_counts() {
        assert_eq!(Visibility::from_counts(0, 0), Visibility::Hidden);
        assert_eq!(Visibility::from_counts(2, 0), Visibility::VisibleRegular);
        assert_eq!(Visibility::from_counts(0, 1), Visibility::VisibleOverlay);
        assert_eq!(Visibility::from_counts(1, 1), Visibility::VisibleBoth);
    }

    #[test]
    fn test_open_positions_at_last_non_blank_line() {
        let f = fixture();
        f.buffer.feed(b"one\r\ntwo\r\n\r\n");

        let outcome = f
            .hud
            .show(&f.buffer, ShowPolicy::IfNotVisible, &HudGeometry::default())
            .unwrap();
        assert_eq!(outcome.decision, HudDecision::Open);
        assert_eq!(outcome.visibility, Visibility::Hidden);

        let overlay = outcome.opened.unwrap();
        let info = f.workspace.surfaces_showing(f.buffer.id(), TabScope::Active);
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].id, overlay);
        assert_eq!(info[0].cursor_line, 1);
        assert!(!info[0].focused);
    }

    #[test]
    fn test_never_stacks_overlays() {
        let f = fixture();
        let geometry = HudGeometry::default();

        f.hud.show(&f.buffer, ShowPolicy::Always, &geometry).unwrap();
        let second = f.hud.show(&f.buffer, ShowPolicy::Always, &geometry).unwrap();

        assert_eq!(second.decision, HudDecision::KeepExisting);
        assert_eq!(overlay_count(&f), 1);
    }

    #[test]
    fn test_if_not_visible_closes_overlay_when_regular_exists() {
        let f = fixture();
        let geometry = HudGeometry::default();
        let opened = f
            .hud
            .show(&f.buffer, ShowPolicy::Always, &geometry)
            .unwrap()
            .opened
            .unwrap();
        f.workspace
            .open_regular(f.buffer.id(), Placement::Split, false)
            .unwrap();

        let outcome = f
            .hud
            .show(&f.buffer, ShowPolicy::IfNotVisible, &geometry)
            .unwrap();
        assert_eq!(outcome.decision, HudDecision::CloseExisting);
        assert_eq!(outcome.closed, vec![opened]);
        assert_eq!(overlay_count(&f), 0);
    }

    #[test]
    fn test_deferred_reposition_after_output() {
        let f = fixture();
        let overlay = f
            .hud
            .show(&f.buffer, ShowPolicy::Always, &HudGeometry::default())
            .unwrap()
            .opened
            .unwrap();
        assert_eq!(f.scheduler.pending(), 1);

        f.workspace.set_cursor(overlay, 0);
        f.buffer.feed(b"a\r\nb\r\nc\r\n");
        f.workspace.set_cursor(overlay, 0);

        f.scheduler.run_pending();
        let info = f.workspace.surfaces_showing(f.buffer.id(), TabScope::Active);
        assert_eq!(info[0].cursor_line, 2);
    }

    #[test]
    fn test_deferred_reposition_skips_closed_surface() {
        let f = fixture();
        let overlay = f
            .hud
            .show(&f.buffer, ShowPolicy::Always, &HudGeometry::default())
            .unwrap()
            .opened
            .unwrap();
        f.workspace.close(overlay);

        assert_eq!(f.scheduler.run_pending(), 1);
        assert!(!f.workspace.is_valid(overlay));
    }

    #[test]
    fn test_follow_pins_to_last_line_until_closed() {
        let f = fixture();
        let overlay = f
            .hud
            .show(&f.buffer, ShowPolicy::Always, &HudGeometry::default())
            .unwrap()
            .opened
            .unwrap();
        assert_eq!(f.buffer.listener_count(), 1);

        f.buffer.feed(b"x\r\ny\r\nz");
        let info = f.workspace.surfaces_showing(f.buffer.id(), TabScope::Active);
        assert_eq!(info[0].cursor_line, 2);

        f.workspace.close(overlay);
        f.buffer.feed(b"\r\nmore");
        assert_eq!(f.buffer.listener_count(), 0);
    }

    #[test]
    fn test_dismiss_closes_only_the_overlay() {
        let f = fixture();
        let regular = f
            .workspace
            .open_regular(f.buffer.id(), Placement::Split, false)
            .unwrap();
        let overlay = f
            .hud
            .show(&f.buffer, ShowPolicy::Always, &HudGeometry::default())
            .unwrap()
            .opened
            .unwrap();

        f.workspace.notify(EditorEvent::CursorMoved);

        assert!(!f.workspace.is_valid(overlay));
        assert!(f.workspace.is_valid(regular));
        assert_eq!(f.workspace.surfaces(TabScope::All).len(), 2);
    }

    struct SlowHost(Arc<Workspace>);

    impl SurfaceHost for SlowHost {
        fn open_regular(
            &self,
            buffer: simple_repl_core::BufferId,
            placement: Placement,
            focus: bool,
        ) -> Result<SurfaceId> {
            self.0.open_regular(buffer, placement, focus)
        }

        fn open_overlay(
            &self,
            buffer: simple_repl_core::BufferId,
            geometry: &HudGeometry,
        ) -> Result<SurfaceId> {
            self.0.open_overlay(buffer, geometry)
        }

        fn close(&self, surface: SurfaceId) -> bool {
            self.0.close(surface)
        }

        fn is_valid(&self, surface: SurfaceId) -> bool {
            self.0.is_valid(surface)
        }

        fn surfaces_showing(
            &self,
            buffer: simple_repl_core::BufferId,
            scope: TabScope,
        ) -> Vec<crate::surface::SurfaceInfo> {
            let found = self.0.surfaces_showing(buffer, scope);
            std::thread::sleep(Duration::from_millis(20));
            found
        }

        fn set_cursor(&self, surface: SurfaceId, line: usize) -> bool {
            self.0.set_cursor(surface, line)
        }

        fn once(&self, events: &[EditorEvent], callback: crate::surface::EventCallback) {
            self.0.once(events, callback)
        }
    }

    #[test]
    fn test_concurrent_show_opens_one_overlay() {
        let workspace = Arc::new(Workspace::new());
        let hud = Hud::new(
            Arc::new(SlowHost(workspace.clone())),
            Arc::new(ManualScheduler::new()),
            Duration::from_millis(50),
        );
        let buffer = Arc::new(Scrollback::new(100));
        let barrier = std::sync::Barrier::new(2);

        let show = || {
            barrier.wait();
            hud.show(&buffer, ShowPolicy::Always, &HudGeometry::default())
                .unwrap()
                .decision
        };
        let (first, second) = std::thread::scope(|scope| {
            let first = scope.spawn(show);
            let second = scope.spawn(show);
            (first.join().unwrap(), second.join().unwrap())
        });

        let overlays = workspace
            .surfaces_showing(buffer.id(), TabScope::Active)
            .iter()
            .filter(|s| s.kind == SurfaceKind::Overlay)
            .count();
        assert_eq!(overlays, 1);
        let mut decisions = [first, second];
        decisions.sort_by_key(|d| *d == HudDecision::Open);
        assert_eq!(decisions, [HudDecision::KeepExisting, HudDecision::Open]);
    }

    #[test]
    fn test_never_with_nothing_open_skips() {
        let f = fixture();
        let outcome = f
            .hud
            .show(&f.buffer, ShowPolicy::Never, &HudGeometry::default())
            .unwrap();
        assert_eq!(outcome.decision, HudDecision::Skip);
        assert!(outcome.opened.is_none());
        assert_eq!(f.scheduler.pending(), 0);
    }
}
