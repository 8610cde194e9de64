//! Error types for the Catalogist domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Catalogist operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Template errors ---
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- I/O ---
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),
}

impl ProviderError {
    /// Whether a retry has a chance of succeeding (timeouts, dropped connections).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::Timeout(_) | ProviderError::Network(_) | ProviderError::StreamInterrupted(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Node not found: {path} (no child named '{segment}')")]
    NodeNotFound { path: String, segment: String },

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Unknown module type '{0}', expected business, technical or pricing")]
    UnknownModule(String),

    #[error("Template library has no entry '{0}'")]
    MissingTemplate(String),

    #[error("Failed to read template library at {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("Failed to parse template library: {0}")]
    Parse(String),
}
