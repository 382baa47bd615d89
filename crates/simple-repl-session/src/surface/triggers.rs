//! One-shot event triggers.

use simple_repl_core::EditorEvent;

use super::EventCallback;

struct Trigger {
    events: Vec<EditorEvent>,
    callback: EventCallback,
}

/// Pending one-shot triggers.
///
/// A trigger registered for several events fires on the first of them and
/// is then gone for all of them.
#[derive(Default)]
pub struct Triggers {
    pending: Vec<Trigger>,
}

impl Triggers {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `events`. An empty event list never fires
    /// and is not kept.
    pub fn register(&mut self, events: &[EditorEvent], callback: EventCallback) {
        if events.is_empty() {
            return;
        }
        self.pending.push(Trigger {
            events: events.to_vec(),
            callback,
        });
    }

    /// Remove and return every callback waiting on `event`, oldest first.
    ///
    /// Callers run them after releasing whatever lock guards this set.
    pub fn take(&mut self, event: EditorEvent) -> Vec<EventCallback> {
        let (fired, kept): (Vec<Trigger>, Vec<Trigger>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|t| t.events.contains(&event));
        self.pending = kept;
        fired.into_iter().map(|t| t.callback).collect()
    }

    /// Number of pending triggers.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no trigger is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl std::fmt::Debug for Triggers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Triggers")
            .field("pending", &self.pending.len())
            .finish()
    }
}
