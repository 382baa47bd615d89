//! Geometry types for terminals and HUD windows.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Dimensions of a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Dimensions {
    /// Number of rows
    pub rows: u16,
    /// Number of columns
    pub cols: u16,
}

impl Dimensions {
    /// Create new dimensions.
    pub fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::new(24, 80)
    }
}

/// What a HUD window is positioned relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum HudAnchor {
    /// Relative to the cursor of the focused window
    #[default]
    Cursor,
    /// Relative to the focused window
    Window,
    /// Relative to the whole editor
    Editor,
}

/// Border drawn around a HUD window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum HudBorder {
    /// No border
    None,
    /// Single line
    Single,
    /// Double line
    Double,
    /// Rounded corners
    #[default]
    Rounded,
}

/// Geometry of a HUD (overlay) window.
///
/// Not interpreted by simple-repl: it is handed to the surface host verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct HudGeometry {
    /// Width in columns
    pub width: u16,
    /// Height in rows
    pub height: u16,
    /// Row offset from the anchor
    pub row: i32,
    /// Column offset from the anchor
    pub col: i32,
    /// Anchor the offsets are relative to
    pub anchor: HudAnchor,
    /// Border style
    pub border: HudBorder,
}

impl Default for HudGeometry {
    fn default() -> Self {
        Self {
            width: 80,
            height: 12,
            row: 1,
            col: 0,
            anchor: HudAnchor::Cursor,
            border: HudBorder::Rounded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_default() {
        let dims = Dimensions::default();
        assert_eq!(dims.rows, 24);
        assert_eq!(dims.cols, 80);
    }

    #[test]
    fn test_hud_geometry_partial_yaml_keeps_defaults() {
        let geometry: HudGeometry = serde_json::from_str(r#"{"height": 5, "border": "none"}"#).unwrap();
        assert_eq!(geometry.height, 5);
        assert_eq!(geometry.border, HudBorder::None);
        assert_eq!(geometry.width, 80);
        assert_eq!(geometry.anchor, HudAnchor::Cursor);
    }

    #[test]
    fn test_hud_anchor_serialization() {
        assert_eq!(serde_json::to_string(&HudAnchor::Editor).unwrap(), "\"editor\"");
    }
}
