//! Error types for the platformio-upload MCP server

use rmcp::ErrorData as McpError;
use thiserror::Error;

use crate::pio_client::{BuildResult, Stage};

/// Main error type for the platformio-upload MCP server
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("PlatformIO CLI not found: {0}")]
    ToolNotFound(String),

    #[error("pio {} exited with code {}", .0.stage, .0.exit_code)]
    Subprocess(Box<BuildResult>),

    #[error("pio {stage} timed out after {seconds}s")]
    Timeout { stage: Stage, seconds: u64 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, UploadError>;

impl From<UploadError> for McpError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Validation(_) | UploadError::ProjectNotFound(_) => {
                McpError::invalid_params(err.to_string(), None)
            }
            _ => McpError::internal_error(err.to_string(), None),
        }
    }
}
