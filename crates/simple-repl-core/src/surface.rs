//! Vocabulary shared with the surface host: buffers, surfaces, placements and
//! the events that dismiss a HUD.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};


/// Handle to a session's display buffer (the content a surface shows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct BufferId(pub u64);

/// Handle to one on-screen surface (a window showing a buffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SurfaceId(pub u64);

/// Handle to a tabpage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct TabpageId(pub u64);

impl std::fmt::Display for BufferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "buf#{}", self.0)
    }
}

impl std::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "win#{}", self.0)
    }
}

/// Where a session's display buffer is shown when it is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Replace the buffer of the focused window
    Current,
    /// Horizontal split
    #[default]
    Split,
    /// Vertical split
    Vsplit,
    /// Transient overlay (HUD)
    #[serde(alias = "overlay")]
    Hud,
    /// Do not show it
    None,
}

impl Placement {
    /// Whether this placement produces a regular (non-overlay) surface.
    pub fn is_regular(&self) -> bool {
        matches!(self, Placement::Current | Placement::Split | Placement::Vsplit)
    }
}

/// When a HUD should reveal a session's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ShowPolicy {
    /// Always show a HUD
    Always,
    /// Never show one, and dismiss an existing one
    Never,
    /// Only when no regular surface on the active tabpage shows the session
    #[default]
    IfNotVisible,
}

/// Host events that can dismiss a HUD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EditorEvent {
    /// The cursor moved
    CursorMoved,
    /// The command line was entered
    CmdlineEnter,
    /// Insert mode was entered
    InsertEnter,
}

impl EditorEvent {
    /// Events that dismiss a HUD.
    pub const DISMISS: [EditorEvent; 3] = [
        EditorEvent::CursorMoved,
        EditorEvent::CmdlineEnter,
        EditorEvent::InsertEnter,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_deserializes_overlay_alias() {
        let placement: Placement = serde_json::from_str("\"overlay\"").unwrap();
        assert_eq!(placement, Placement::Hud);
    }

    #[test]
    fn test_placement_is_regular() {
        assert!(Placement::Current.is_regular());
        assert!(Placement::Vsplit.is_regular());
        assert!(!Placement::Hud.is_regular());
        assert!(!Placement::None.is_regular());
    }

    #[test]
    fn test_show_policy_default() {
        assert_eq!(ShowPolicy::default(), ShowPolicy::IfNotVisible);
    }

    #[test]
    fn test_show_policy_serialization() {
        assert_eq!(
            serde_json::to_string(&ShowPolicy::IfNotVisible).unwrap(),
            "\"if_not_visible\""
        );
        let policy: ShowPolicy = serde_json::from_str("\"never\"").unwrap();
        assert_eq!(policy, ShowPolicy::Never);
    }
}
