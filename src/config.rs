use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub search: SearchConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the lookup server
    pub base_url: String,

    /// Access password, if the server is password protected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Per-request timeout. No timeout when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Queries shorter than this never reach the server
    pub min_query_chars: usize,

    /// Quiet period after the last keystroke before suggesting
    pub debounce_ms: u64,

    /// Suggestions shown per response
    pub max_suggestions: usize,

    /// `limit` parameter sent to /api/suggest
    pub suggest_limit: usize,

    /// Placeholder cards while a lookup is running
    pub skeleton_cards: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Shown for empty fields and missing titles
    pub placeholder: String,

    /// Row keys starting with this are never displayed
    pub reserved_prefix: String,

    /// Use Unicode glyphs in the TUI chrome
    pub use_glyphs: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is not set
    pub level: String,

    /// Also write logs to a file under the data directory
    pub log_to_file: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            password: None,
            request_timeout_ms: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_query_chars: 2,
            debounce_ms: 250,
            max_suggestions: 300,
            suggest_limit: 100,
            skeleton_cards: 2,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            placeholder: "—".to_string(),
            reserved_prefix: "_".to_string(),
            use_glyphs: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: true,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

impl Config {
    /// Load config from `path`. A missing file means defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Apply `LOOKUP_API_URL` and `LOOKUP_PASSWORD` on top of the file
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var("LOOKUP_API_URL").ok(),
            std::env::var("LOOKUP_PASSWORD").ok(),
        );
    }

    /// Override server settings; `None` keeps the current value
    pub fn apply_overrides(&mut self, base_url: Option<String>, password: Option<String>) {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.server.base_url = url;
        }
        if let Some(password) = password {
            self.server.password = Some(password);
        }
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("lookup-cli").join("config.toml"))
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# lookup-cli configuration
# Location: ~/.config/lookup-cli/config.toml (Linux)
#           ~/Library/Application Support/lookup-cli/config.toml (macOS)
#           %APPDATA%\lookup-cli\config.toml (Windows)

[server]
# Lookup server; LOOKUP_API_URL and --url take precedence
base_url = "http://127.0.0.1:8000"

# Access password for protected servers (or LOOKUP_PASSWORD / --password)
# password = "change_me"

# Per-request timeout in milliseconds. Requests wait forever when unset.
# request_timeout_ms = 10000

[search]
# Queries shorter than this (after trimming) are never sent
min_query_chars = 2

# Wait this long after the last keystroke before asking for suggestions
debounce_ms = 250

# Suggestions kept from each response
max_suggestions = 300

# How many suggestions to ask the server for
suggest_limit = 100

# Placeholder cards shown while a lookup is running
skeleton_cards = 2

[display]
# Shown for empty values and missing names
placeholder = "—"

# Columns starting with this prefix are internal and never shown
reserved_prefix = "_"

# Set to false for ASCII-only terminals
use_glyphs = true

[logging]
# Default log filter when RUST_LOG is not set: trace, debug, info, warn, error
level = "info"

# Write logs to ~/.local/share/lookup-cli/logs as well
log_to_file = true
"#
        .to_string()
    }
}
