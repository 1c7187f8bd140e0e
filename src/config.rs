//! Configuration management for the proto explorer
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (proto-explorer.toml)
//! - Environment variables (PROTO_EXPLORER__*)
//!
//! ## Example config file (proto-explorer.toml):
//! ```toml
//! [resolver]
//! max_levels = 16
//! extension = "proto"
//!
//! [compiler]
//! program = "protoc"
//! include_paths = ["/usr/include"]
//! include_imports = true
//!
//! [render]
//! filter_mode = false
//! indent_width = 2
//! repeated_marker = "[repeated]"
//! highlight_open = "<mark>"
//! highlight_close = "</mark>"
//!
//! [logging]
//! level = "warn"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the explorer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Import-root resolution settings
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// External schema compiler settings
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Tree rendering settings
    #[serde(default)]
    pub render: RenderConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Import-root resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// How many ancestor directories are considered as candidate roots
    #[serde(default = "default_max_levels")]
    pub max_levels: usize,

    /// Recognized schema source suffix (without the dot)
    #[serde(default = "default_extension")]
    pub extension: String,
}

/// External compiler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Compiler binary (looked up on PATH when relative)
    #[serde(default = "default_program")]
    pub program: String,

    /// Extra include directories, passed after the detected root
    #[serde(default)]
    pub include_paths: Vec<PathBuf>,

    /// Whether the descriptor set carries the transitive imports
    #[serde(default = "default_true")]
    pub include_imports: bool,
}

/// Rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Only show branches that contain a match
    #[serde(default)]
    pub filter_mode: bool,

    /// Spaces per depth level in text output
    #[serde(default = "default_indent_width")]
    pub indent_width: usize,

    /// Suffix appended to repeated (non-map) fields
    #[serde(default = "default_repeated_marker")]
    pub repeated_marker: String,

    /// Marker inserted before each highlighted match
    #[serde(default = "default_highlight_open")]
    pub highlight_open: String,

    /// Marker inserted after each highlighted match
    #[serde(default = "default_highlight_close")]
    pub highlight_close: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; RUST_LOG takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_max_levels() -> usize {
    crate::resolver::DEFAULT_MAX_LEVELS
}

fn default_extension() -> String {
    crate::resolver::DEFAULT_EXTENSION.to_string()
}

fn default_program() -> String {
    "protoc".to_string()
}

fn default_true() -> bool {
    true
}

fn default_indent_width() -> usize {
    2
}

fn default_repeated_marker() -> String {
    "[repeated]".to_string()
}

fn default_highlight_open() -> String {
    "<mark>".to_string()
}

fn default_highlight_close() -> String {
    "</mark>".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_levels: default_max_levels(),
            extension: default_extension(),
        }
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            include_paths: Vec::new(),
            include_imports: true,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            filter_mode: false,
            indent_width: default_indent_width(),
            repeated_marker: default_repeated_marker(),
            highlight_open: default_highlight_open(),
            highlight_close: default_highlight_close(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ExplorerConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file on top of the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "proto-explorer.toml",
            ".proto-explorer.toml",
            "config/proto-explorer.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "proto-explorer", "proto-explorer") {
            let xdg_config = config_dir.config_dir().join("proto-explorer.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // PROTO_EXPLORER__RENDER__INDENT_WIDTH=4
        builder = builder.add_source(
            Environment::with_prefix("PROTO_EXPLORER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
