//! `ReplManager`: the `open` / `send` / `close` facade.
//!
//! Ties the registry, dispatch and the HUD to a process host and a surface
//! host, filling every option the caller leaves out from [`ReplConfig`].

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use simple_repl_core::{
    Error, HudGeometry, Placement, ReplConfig, Result, SessionId, SessionName, ShowPolicy,
    SurfaceId,
};
use simple_repl_term::Scrollback;

use crate::dispatch::{self, normalize};
use crate::hud::{Hud, HudOutcome};
use crate::output::OutputRead;
use crate::process::ProcessHost;
use crate::registry::{SessionInfo, SessionRegistry, SpawnSettings, StartupConfig};
use crate::schedule::Scheduler;
use crate::session::Session;
use crate::surface::{SurfaceHost, SurfaceKind, TabScope};

/// Display options for [`ReplManager::open`]. `None` means the configured
/// default.
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    /// Where to show the session (default `split`)
    pub win: Option<Placement>,
    /// Focus a newly opened regular surface (default `false`)
    pub focus: Option<bool>,
    /// Show policy when `win` is `hud` (default `always`)
    pub show: Option<ShowPolicy>,
    /// HUD geometry override
    pub hud: Option<HudGeometry>,
}

/// Result of [`ReplManager::open`].
#[derive(Debug, Clone, Serialize)]
pub struct OpenOutcome {
    /// Composite session name
    pub session: SessionName,
    /// Session identifier
    pub id: SessionId,
    /// Whether this call created the session
    pub created: bool,
    /// Regular surface opened, if any
    pub surface: Option<SurfaceId>,
    /// HUD result when `win` was `hud`
    pub hud: Option<HudOutcome>,
}

/// Options for [`ReplManager::send`]. `None` means the configured default.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Line separator (default `"\n"`)
    pub separator: Option<String>,
    /// Show policy (default `if_not_visible`)
    pub show: Option<ShowPolicy>,
    /// HUD geometry override
    pub hud: Option<HudGeometry>,
}

/// Result of a [`ReplManager::send`] that reached a session.
#[derive(Debug, Clone, Serialize)]
pub struct SendOutcome {
    /// Composite session name
    pub session: SessionName,
    /// Bytes written
    pub bytes: usize,
    /// HUD result
    pub hud: Option<HudOutcome>,
}

/// Manages named REPL sessions and how they are displayed.
pub struct ReplManager {
    config: ReplConfig,
    registry: SessionRegistry,
    surfaces: Arc<dyn SurfaceHost>,
    hud: Hud,
}

impl ReplManager {
    /// Create a manager.
    pub fn new(
        config: ReplConfig,
        processes: Arc<dyn ProcessHost>,
        surfaces: Arc<dyn SurfaceHost>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let registry = SessionRegistry::new(processes, SpawnSettings::from(&config));
        let hud = Hud::new(
            Arc::clone(&surfaces),
            scheduler,
            Duration::from_millis(config.hud.settle_ms),
        );
        Self {
            config,
            registry,
            surfaces,
            hud,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &ReplConfig {
        &self.config
    }

    /// Composite name for a caller-supplied name.
    pub fn session_name(&self, name: Option<&str>) -> SessionName {
        SessionName::compose(&self.config.session.prefix, name)
    }

    /// Look up a live session.
    pub fn get(&self, name: Option<&str>) -> Option<Arc<Session>> {
        self.registry.get(&self.session_name(name))
    }

    /// Open (creating if needed) a session and show it.
    ///
    /// `startup` only applies when the session does not exist yet. The
    /// display step runs every time, so re-opening an existing session
    /// places it again. Only a failed spawn is an error.
    pub fn open(
        &self,
        name: Option<&str>,
        mut startup: StartupConfig,
        options: OpenOptions,
    ) -> Result<OpenOutcome> {
        let name = self.session_name(name);

        if self.config.session.auto_scroll {
            let surfaces = Arc::clone(&self.surfaces);
            let user_callback = startup.on_create.take();
            startup.on_create = Some(Box::new(move |session: &Arc<Session>| {
                follow_regular_surfaces(surfaces, session.buffer());
                if let Some(callback) = user_callback {
                    callback(session);
                }
            }));
        }

        let (session, created) = self.registry.start(&name, startup)?;
        if created {
            info!("Opened session: name='{}', id={}", name, session.id());
        }

        let win = options.win.unwrap_or(self.config.open.win);
        let focus = options.focus.unwrap_or(self.config.open.focus);

        let mut outcome = OpenOutcome {
            session: name,
            id: *session.id(),
            created,
            surface: None,
            hud: None,
        };

        match win {
            Placement::Hud => {
                let show = options.show.unwrap_or(self.config.open.show);
                let geometry = options.hud.unwrap_or_else(|| self.config.hud.geometry.clone());
                outcome.hud = self.reveal(&session, show, &geometry);
            }
            regular if regular.is_regular() => {
                match self.surfaces.open_regular(session.buffer_id(), regular, focus) {
                    Ok(surface) => outcome.surface = Some(surface),
                    Err(e) => warn!("Could not show '{}': {}", outcome.session, e),
                }
            }
            _ => {}
        }

        Ok(outcome)
    }

    /// Positional form of [`open`](Self::open) taking the startup command
    /// directly.
    #[deprecated(note = "use `open` with `StartupConfig::with_cmd`")]
    pub fn open_repl(
        &self,
        name: Option<&str>,
        cmd: &str,
        options: OpenOptions,
    ) -> Result<OpenOutcome> {
        self.open(name, StartupConfig::with_cmd(cmd), options)
    }

    /// Send `lines` to a session, then run the HUD policy.
    ///
    /// Returns `None` without touching anything when the payload is empty
    /// or no such session is live. Never creates a session.
    pub fn send<S: AsRef<str>>(
        &self,
        name: Option<&str>,
        lines: &[S],
        options: SendOptions,
    ) -> Option<SendOutcome> {
        let name = self.session_name(name);
        let separator = match options.separator.as_deref() {
            Some("") => {
                debug!("Empty separator for '{}', using the configured one", name);
                self.config.send.separator.as_str()
            }
            Some(separator) => separator,
            None => self.config.send.separator.as_str(),
        };

        let payload = normalize(lines, separator);
        if payload.is_empty() {
            debug!("Nothing to send to '{}'", name);
            return None;
        }

        let Some(session) = self.registry.get(&name) else {
            debug!("No session '{}', dropping {} bytes", name, payload.len());
            return None;
        };

        let bytes = dispatch::send(Some(&session), &payload);
        debug!("Sent {} bytes to '{}'", bytes, name);

        let show = options.show.unwrap_or(self.config.send.show);
        let geometry = options.hud.unwrap_or_else(|| self.config.hud.geometry.clone());
        let hud = self.reveal(&session, show, &geometry);

        Some(SendOutcome {
            session: name,
            bytes,
            hud,
        })
    }

    /// Run the HUD policy for a session without sending anything.
    ///
    /// Unlike [`send`](Self::send), a missing session or a refused overlay
    /// is reported.
    pub fn hud(
        &self,
        name: Option<&str>,
        show: Option<ShowPolicy>,
        geometry: Option<HudGeometry>,
    ) -> Result<HudOutcome> {
        let name = self.session_name(name);
        let session = self
            .registry
            .get(&name)
            .ok_or_else(|| Error::SessionNotFound(name.to_string()))?;
        let show = show.unwrap_or(self.config.open.show);
        let geometry = geometry.unwrap_or_else(|| self.config.hud.geometry.clone());
        self.hud.show(session.buffer(), show, &geometry)
    }

    fn reveal(
        &self,
        session: &Session,
        show: ShowPolicy,
        geometry: &HudGeometry,
    ) -> Option<HudOutcome> {
        match self.hud.show(session.buffer(), show, geometry) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!("HUD failed for '{}': {}", session.name(), e);
                None
            }
        }
    }

    /// Read the tail of a session's output.
    pub fn read(&self, name: Option<&str>, max_lines: usize) -> Result<OutputRead> {
        let name = self.session_name(name);
        let session = self
            .registry
            .get(&name)
            .ok_or_else(|| Error::SessionNotFound(name.to_string()))?;
        Ok(session.read_output(max_lines))
    }

    /// Close a session: kill its process and close every surface showing it,
    /// on every tabpage.
    ///
    /// Returns the surfaces closed.
    pub fn close(&self, name: Option<&str>) -> Result<Vec<SurfaceId>> {
        let name = self.session_name(name);
        let session = self
            .registry
            .terminate(&name)?
            .ok_or_else(|| Error::SessionNotFound(name.to_string()))?;

        let closed = self.teardown(&session);
        info!("Closed session: name='{}', {} surface(s)", name, closed.len());
        Ok(closed)
    }

    /// Close every session. Returns how many were closed.
    pub fn close_all(&self) -> usize {
        let sessions = self.registry.drain();
        for session in &sessions {
            self.teardown(session);
            if let Err(e) = session.terminate() {
                warn!("Failed to terminate '{}': {}", session.name(), e);
            }
        }
        info!("Closed all sessions: {}", sessions.len());
        sessions.len()
    }

    fn teardown(&self, session: &Session) -> Vec<SurfaceId> {
        self.surfaces
            .surfaces_showing(session.buffer_id(), TabScope::All)
            .into_iter()
            .filter(|s| self.surfaces.close(s.id))
            .map(|s| s.id)
            .collect()
    }

    /// List registered sessions, sorted by name.
    pub fn list(&self) -> Vec<SessionInfo> {
        self.registry.list()
    }

    /// Number of registered sessions.
    pub fn session_count(&self) -> usize {
        self.registry.session_count()
    }
}

impl std::fmt::Debug for ReplManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplManager")
            .field("prefix", &self.config.session.prefix)
            .field("sessions", &self.registry.session_count())
            .finish()
    }
}

/// Keep every regular surface showing `buffer` scrolled to its last line.
fn follow_regular_surfaces(surfaces: Arc<dyn SurfaceHost>, buffer: &Scrollback) {
    buffer.on_change(move |change| {
        for surface in surfaces.surfaces_showing(change.buffer, TabScope::All) {
            if surface.kind == SurfaceKind::Regular {
                surfaces.set_cursor(surface.id, change.last_line());
            }
        }
        true
    });
}
