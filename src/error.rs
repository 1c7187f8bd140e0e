//! Error types for the proto explorer

use std::path::PathBuf;
use thiserror::Error;

/// Result type for explorer operations
pub type Result<T> = std::result::Result<T, ExplorerError>;

/// Explorer errors
#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Schema file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Expected a .{expected} file, got: {}", .path.display())]
    InvalidExtension { path: PathBuf, expected: String },

    #[error("Invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Message not found: {name}{}", format_suggestions(.suggestions))]
    UnknownMessage { name: String, suggestions: Vec<String> },

    #[error("File not found in descriptor set: {name}")]
    UnknownFile { name: String },

    #[error("Failed to compile {} (exit code {}):\n{diagnostic}", .file.display(), format_exit_code(.code))]
    Compile {
        file: PathBuf,
        code: Option<i32>,
        diagnostic: String,
    },

    #[error("Schema compiler '{program}' could not be started: {source}")]
    CompilerUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Descriptor set decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

fn format_exit_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string())
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}
