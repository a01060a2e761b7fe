//! # AppError
//!
//! Centralized error handling for the Sister-Board ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all sb-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Post, User)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., missing username or empty comment)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Well-formed request missing required fields (e.g., a post without a category)
    #[error("unprocessable: {0}")]
    Unprocessable(String),

    /// Security/Auth failure (e.g., bad password, expired token)
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Infrastructure failure (e.g., DB down)
    #[error("internal service error: {0}")]
    Internal(String),

    /// Resource already exists (e.g., duplicate username)
    #[error("conflict: {0}")]
    Conflict(String),

    /// The news search API answered with a non-success status
    #[error("upstream returned HTTP {status}")]
    Upstream { status: u16 },
}

/// A specialized Result type for Sister-Board logic.
pub type Result<T> = std::result::Result<T, AppError>;
