use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Upload phase that produced a `success: false` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    MapInit,
    Client,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::MapInit => f.write_str("Map init"),
            Stage::Client => f.write_str("Client upload"),
        }
    }
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Input required and not supplied: {0}")]
    MissingInput(&'static str),

    #[error("Invalid input '{name}': {reason}")]
    InvalidInput { name: &'static str, reason: String },

    #[error("No coverage files specified")]
    NoCoverageFiles,

    #[error("Coverage file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to read coverage file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse coverage file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Coverage file {} is not a JSON object keyed by file path", .0.display())]
    NotAnObject(PathBuf),

    #[error("No coverage data found in files")]
    EmptyCoverage,

    #[error("HTTP {status}: {status_text}\n{body}")]
    Http {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Invalid JSON response from {url}: {source}")]
    Response {
        url: String,
        source: serde_json::Error,
    },

    #[error("{stage} failed: {message}")]
    Rejected { stage: Stage, message: String },

    #[error("Failed to set output '{name}': {source}")]
    Output {
        name: &'static str,
        source: std::io::Error,
    },

    #[error("Failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, UploadError>;
