//! In-memory surface host: tabpages holding windows.
//!
//! Used when simple-repl runs without an editor attached (the MCP server
//! drives it through tool calls) and by tests. Nothing is drawn; the model
//! only tracks which window shows which buffer, where its cursor is, and
//! which window has focus.

use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, info, warn};

use simple_repl_core::{
    BufferId, EditorEvent, Error, HudGeometry, Placement, Result, SurfaceId, TabpageId,
};

use super::{EventCallback, SurfaceHost, SurfaceInfo, SurfaceKind, TabScope, Triggers};

/// Direction a regular window was split in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitDirection {
    /// Stacked above/below
    Horizontal,
    /// Side by side
    Vertical,
}

#[derive(Debug)]
struct Window {
    id: SurfaceId,
    buffer: Option<BufferId>,
    kind: SurfaceKind,
    cursor_line: usize,
    split: Option<SplitDirection>,
    geometry: Option<HudGeometry>,
}

#[derive(Debug)]
struct Tabpage {
    id: TabpageId,
    windows: Vec<Window>,
    focused: SurfaceId,
}

impl Tabpage {
    fn regular_count(&self) -> usize {
        self.windows
            .iter()
            .filter(|w| w.kind == SurfaceKind::Regular)
            .count()
    }

    fn info(&self, window: &Window) -> SurfaceInfo {
        SurfaceInfo {
            id: window.id,
            tabpage: self.id,
            buffer: window.buffer,
            kind: window.kind,
            cursor_line: window.cursor_line,
            focused: window.id == self.focused,
        }
    }
}

#[derive(Debug)]
struct State {
    tabpages: Vec<Tabpage>,
    active: usize,
    next_surface: u64,
    next_tabpage: u64,
    triggers: Triggers,
}

impl State {
    fn alloc_surface(&mut self) -> SurfaceId {
        let id = SurfaceId(self.next_surface);
        self.next_surface += 1;
        id
    }

    fn push_tabpage(&mut self) -> TabpageId {
        let tab_id = TabpageId(self.next_tabpage);
        self.next_tabpage += 1;
        let window_id = self.alloc_surface();
        self.tabpages.push(Tabpage {
            id: tab_id,
            windows: vec![Window {
                id: window_id,
                buffer: None,
                kind: SurfaceKind::Regular,
                cursor_line: 0,
                split: None,
                geometry: None,
            }],
            focused: window_id,
        });
        tab_id
    }

    fn active_mut(&mut self) -> &mut Tabpage {
        let active = self.active;
        &mut self.tabpages[active]
    }

    fn find_mut(&mut self, surface: SurfaceId) -> Option<(usize, usize)> {
        self.tabpages.iter().enumerate().find_map(|(t, tab)| {
            tab.windows
                .iter()
                .position(|w| w.id == surface)
                .map(|w| (t, w))
        })
    }
}

/// In-memory surface host.
#[derive(Debug)]
pub struct Workspace {
    state: Mutex<State>,
}

impl Workspace {
    /// Create a workspace with one tabpage holding one empty window.
    pub fn new() -> Self {
        let mut state = State {
            tabpages: Vec::new(),
            active: 0,
            next_surface: 1,
            next_tabpage: 1,
            triggers: Triggers::new(),
        };
        state.push_tabpage();
        Self {
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Workspace lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Deliver an event, running every trigger waiting on it.
    ///
    /// Returns how many triggers fired.
    pub fn notify(&self, event: EditorEvent) -> usize {
        let callbacks = self.lock().triggers.take(event);
        let fired = callbacks.len();
        debug!("Event {:?}: {} trigger(s) fired", event, fired);
        for callback in callbacks {
            callback(self);
        }
        fired
    }

    /// Open a new tabpage with one empty window and make it active.
    pub fn new_tab(&self) -> TabpageId {
        let mut state = self.lock();
        let id = state.push_tabpage();
        state.active = state.tabpages.len() - 1;
        info!("Opened tabpage {:?}", id);
        id
    }

    /// Make `tabpage` the active one.
    pub fn switch_tab(&self, tabpage: TabpageId) -> Result<()> {
        let mut state = self.lock();
        let index = state
            .tabpages
            .iter()
            .position(|t| t.id == tabpage)
            .ok_or_else(|| Error::Surface(format!("no such tabpage: {}", tabpage.0)))?;
        state.active = index;
        Ok(())
    }

    /// The active tabpage.
    pub fn active_tab(&self) -> TabpageId {
        let state = self.lock();
        state.tabpages[state.active].id
    }

    /// All tabpages, in order.
    pub fn tabpages(&self) -> Vec<TabpageId> {
        self.lock().tabpages.iter().map(|t| t.id).collect()
    }

    /// Surfaces within `scope`.
    pub fn surfaces(&self, scope: TabScope) -> Vec<SurfaceInfo> {
        let state = self.lock();
        let tabs: Vec<&Tabpage> = match scope {
            TabScope::Active => vec![&state.tabpages[state.active]],
            TabScope::All => state.tabpages.iter().collect(),
        };
        tabs.into_iter()
            .flat_map(|tab| tab.windows.iter().map(move |w| tab.info(w)))
            .collect()
    }

    /// The focused surface of the active tabpage.
    pub fn focused(&self) -> SurfaceId {
        let state = self.lock();
        state.tabpages[state.active].focused
    }

    /// Focus a regular surface on the active tabpage.
    pub fn focus(&self, surface: SurfaceId) -> bool {
        let mut state = self.lock();
        let tab = state.active_mut();
        let focusable = tab
            .windows
            .iter()
            .any(|w| w.id == surface && w.kind == SurfaceKind::Regular);
        if focusable {
            tab.focused = surface;
        }
        focusable
    }

    /// Geometry an overlay was opened with.
    pub fn geometry(&self, surface: SurfaceId) -> Option<HudGeometry> {
        let mut state = self.lock();
        let (t, w) = state.find_mut(surface)?;
        state.tabpages[t].windows[w].geometry.clone()
    }

    /// Split direction a regular window was opened with.
    pub fn split_direction(&self, surface: SurfaceId) -> Option<SplitDirection> {
        let mut state = self.lock();
        let (t, w) = state.find_mut(surface)?;
        state.tabpages[t].windows[w].split
    }

    /// Number of triggers waiting for an event.
    pub fn pending_triggers(&self) -> usize {
        self.lock().triggers.len()
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceHost for Workspace {
    fn open_regular(
        &self,
        buffer: BufferId,
        placement: Placement,
        focus: bool,
    ) -> Result<SurfaceId> {
        let split = match placement {
            Placement::Current => None,
            Placement::Split => Some(SplitDirection::Horizontal),
            Placement::Vsplit => Some(SplitDirection::Vertical),
            Placement::Hud | Placement::None => {
                return Err(Error::InvalidInput(format!(
                    "not a regular placement: {placement:?}"
                )))
            }
        };

        let mut state = self.lock();
        let Some(direction) = split else {
            let tab = state.active_mut();
            let focused = tab.focused;
            if let Some(window) = tab.windows.iter_mut().find(|w| w.id == focused) {
                window.buffer = Some(buffer);
                window.cursor_line = 0;
            }
            debug!("Showing {} in current window {}", buffer, focused);
            return Ok(focused);
        };

        let id = state.alloc_surface();
        let tab = state.active_mut();
        let at = tab
            .windows
            .iter()
            .position(|w| w.id == tab.focused)
            .map_or(tab.windows.len(), |i| i + 1);
        tab.windows.insert(
            at,
            Window {
                id,
                buffer: Some(buffer),
                kind: SurfaceKind::Regular,
                cursor_line: 0,
                split: Some(direction),
                geometry: None,
            },
        );
        if focus {
            tab.focused = id;
        }
        debug!("Opened {:?} split {} showing {}", direction, id, buffer);
        Ok(id)
    }

    fn open_overlay(&self, buffer: BufferId, geometry: &HudGeometry) -> Result<SurfaceId> {
        let mut state = self.lock();
        let id = state.alloc_surface();
        state.active_mut().windows.push(Window {
            id,
            buffer: Some(buffer),
            kind: SurfaceKind::Overlay,
            cursor_line: 0,
            split: None,
            geometry: Some(geometry.clone()),
        });
        debug!("Opened overlay {} showing {}", id, buffer);
        Ok(id)
    }

    /// Close a surface.
    ///
    /// The last regular window of a tabpage cannot go away; closing it only
    /// empties it.
    fn close(&self, surface: SurfaceId) -> bool {
        let mut state = self.lock();
        let Some((t, w)) = state.find_mut(surface) else {
            return false;
        };

        let tab = &mut state.tabpages[t];
        let window = &tab.windows[w];
        if window.kind == SurfaceKind::Regular && tab.regular_count() == 1 {
            tab.windows[w].buffer = None;
            tab.windows[w].cursor_line = 0;
            debug!("Emptied last window {}", surface);
            return true;
        }

        tab.windows.remove(w);
        if tab.focused == surface {
            if let Some(next) = tab.windows.iter().find(|w| w.kind == SurfaceKind::Regular) {
                tab.focused = next.id;
            }
        }
        debug!("Closed {}", surface);
        true
    }

    fn is_valid(&self, surface: SurfaceId) -> bool {
        self.lock().find_mut(surface).is_some()
    }

    fn surfaces_showing(&self, buffer: BufferId, scope: TabScope) -> Vec<SurfaceInfo> {
        self.surfaces(scope)
            .into_iter()
            .filter(|s| s.buffer == Some(buffer))
            .collect()
    }

    fn set_cursor(&self, surface: SurfaceId, line: usize) -> bool {
        let mut state = self.lock();
        match state.find_mut(surface) {
            Some((t, w)) => {
                state.tabpages[t].windows[w].cursor_line = line;
                true
            }
            None => false,
        }
    }

    fn once(&self, events: &[EditorEvent], callback: EventCallback) {
        self.lock().triggers.register(events, callback);
    }
}
