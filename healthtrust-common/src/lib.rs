//! Shared error types and observability helpers for the HealthTrust crates.
//!
//! Kept dependency-light so every crate in the workspace can depend on it.
//!
//! - [`HealthTrustError`] and [`Result`]: shared error handling
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! ```rust
//! use healthtrust_common::HealthTrustError;
//!
//! let err = HealthTrustError::ContentFlagged { keywords: vec!["microchip".into()] };
//! assert!(err.to_string().contains("provide sources"));
//! ```

pub mod observability;

/// Error types used across HealthTrust.
#[derive(thiserror::Error, Debug)]
pub enum HealthTrustError {
    /// A remote collaborator (AI service or backend) rejected or failed a call.
    #[error("Service error: {0}")]
    Service(String),

    /// The backend answered 401; the session has been discarded.
    #[error("Unauthorized: please sign in again")]
    Unauthorized,

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading or writing the persisted session failed.
    #[error("Session error: {0}")]
    Session(String),

    /// Post submission blocked by the local misinformation check.
    #[error("Content flagged for potential misinformation. Please review and provide sources.")]
    ContentFlagged { keywords: Vec<String> },

    /// Submitted content was empty or otherwise unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A referenced post does not exist in the feed.
    #[error("Post not found: {0}")]
    PostNotFound(u64),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenient alias for results that use [`HealthTrustError`].
pub type Result<T> = std::result::Result<T, HealthTrustError>;
