//! Configuration types for simple-repl.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Dimensions, Error, HudGeometry, Placement, ShowPolicy, DEFAULT_PREFIX};

/// Configuration loaded from a YAML file.
///
/// Every section falls back to its defaults field by field, so a file only
/// needs to name what it overrides.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReplConfig {
    /// Server settings
    pub server: ServerSettings,
    /// Session settings
    pub session: SessionSettings,
    /// Terminal settings
    pub terminal: TerminalSettings,
    /// Defaults for sending text
    pub send: SendSettings,
    /// Defaults for opening sessions
    pub open: OpenSettings,
    /// HUD settings
    pub hud: HudSettings,
}

impl ReplConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    pub fn from_yaml(yaml: &str) -> crate::Result<Self> {
        let config: ReplConfig =
            serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> crate::Result<()> {
        if self.session.prefix.trim().is_empty() {
            return Err(Error::Config("session.prefix must not be empty".to_string()));
        }

        if self.session.scrollback_lines == 0 {
            return Err(Error::Config(
                "session.scrollback_lines must be > 0".to_string(),
            ));
        }

        if self.terminal.default_rows == 0 || self.terminal.default_cols == 0 {
            return Err(Error::Config("terminal dimensions must be > 0".to_string()));
        }

        if self.send.separator.is_empty() {
            return Err(Error::Config("send.separator must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Log level (trace, debug, info, warn, error), used when RUST_LOG is unset
    pub log_level: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Prefix composed into every session name
    pub prefix: String,
    /// Shell spawned for every session
    pub shell: String,
    /// Lines kept in a session's display buffer
    pub scrollback_lines: usize,
    /// Keep regular surfaces scrolled to the latest output
    pub auto_scroll: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            shell: default_shell(),
            scrollback_lines: 10000,
            auto_scroll: true,
        }
    }
}

fn default_shell() -> String {
    if cfg!(windows) {
        "cmd.exe".to_string()
    } else {
        std::env::var("SHELL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "/bin/sh".to_string())
    }
}

/// Terminal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalSettings {
    /// Default terminal rows
    pub default_rows: u16,
    /// Default terminal columns
    pub default_cols: u16,
    /// TERM environment variable value
    pub term: String,
}

impl TerminalSettings {
    /// Terminal dimensions from the configured defaults.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.default_rows, self.default_cols)
    }
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            default_rows: 24,
            default_cols: 80,
            term: "xterm-256color".to_string(),
        }
    }
}

/// Defaults applied to `send` requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SendSettings {
    /// Separator placed between lines and after the last one
    pub separator: String,
    /// When to reveal output in a HUD
    pub show: ShowPolicy,
}

impl Default for SendSettings {
    fn default() -> Self {
        Self {
            separator: "\n".to_string(),
            show: ShowPolicy::IfNotVisible,
        }
    }
}

/// Defaults applied to `open` requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenSettings {
    /// Placement of the session's display when opened
    pub win: Placement,
    /// Focus the new surface after opening it
    pub focus: bool,
    /// Show policy used when `win` is `hud`
    pub show: ShowPolicy,
}

impl Default for OpenSettings {
    fn default() -> Self {
        Self {
            win: Placement::Split,
            focus: false,
            show: ShowPolicy::Always,
        }
    }
}

/// HUD settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HudSettings {
    /// Geometry handed to the surface host
    #[serde(flatten)]
    pub geometry: HudGeometry,
    /// Delay before the HUD is re-positioned, letting fresh output land
    pub settle_ms: u64,
}

impl Default for HudSettings {
    fn default() -> Self {
        Self {
            geometry: HudGeometry::default(),
            settle_ms: 50,
        }
    }
}
