// ABOUTME: Error types for the command-line tool
// ABOUTME: Input, configuration, and analysis failures surfaced to the user

use std::path::PathBuf;

use thiserror::Error;
use uieasy_analyzer::AnalyzerError;
use uieasy_config::ConfigError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read standard input: {0}")]
    Stdin(#[source] std::io::Error),

    #[error("No requirement text given (pass TEXT, --file, or pipe text on stdin)")]
    EmptyInput,

    #[error("Invalid analysis file {path}: {source}")]
    InvalidAnalysis {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
}

pub type Result<T> = std::result::Result<T, CliError>;
