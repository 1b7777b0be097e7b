//! Error types for the authorization system.
//!
//! Denials carry only the action and resource name; the user's grant set is
//! never echoed back.

use thiserror::Error;

/// Errors that can occur during authorization operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthzError {
    /// No grant in the user's permission set matched the request.
    #[error("Permission denied: {action} on {resource}")]
    PermissionDenied { action: String, resource: String },

    /// A permission string did not follow `"<action>:<scope>"`.
    #[error("Invalid permission grant: {0}")]
    InvalidGrant(String),

    /// An unknown action name.
    #[error("Invalid action: {0}")]
    InvalidAction(String),
}

/// A specialized Result type for authorization operations.
pub type Result<T> = std::result::Result<T, AuthzError>;
