// File: src/error.rs
// Purpose: Error taxonomy shared by every codec operation

use crate::target::ViewClass;

/// Errors raised while matching, decoding or encoding hybrid URLs.
///
/// Every variant is scoped to a single request; none of them leaves shared
/// state behind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// No mount matched the request path
    #[error("No mount matches path: {path}")]
    RouteNotFound { path: String },

    /// A listener callback referenced an instance that no longer resolves
    #[error("Instance of {view_class} is no longer available (scope: {scope_name:?})")]
    InstanceExpired {
        scope_name: Option<String>,
        view_class: ViewClass,
    },

    /// No collision-free escape marker exists for this segment
    #[error("Could not escape separator in path segment: {segment}")]
    EncodingOverflow { segment: String },

    /// A path segment could not be percent-decoded
    #[error("Malformed path parameter: {segment}")]
    MalformedParameter { segment: String },

    /// The target cannot be encoded by this mount
    #[error("Unsupported target for mount {mount_path}")]
    UnsupportedTarget { mount_path: String },

    #[error("Invalid mount path {path:?}: {reason}")]
    InvalidMountPath { path: String, reason: &'static str },

    /// Scope names must be non-empty and made of letters, digits, `-` and `_`
    #[error("Scope name cannot be encoded: {scope_name:?}")]
    InvalidScopeName { scope_name: String },

    #[error("Invalid instance-info delimiters: {reason}")]
    InvalidDelimiters { reason: &'static str },
}

impl RouteError {
    /// True for conditions that map to an ordinary "not found" response
    pub fn is_not_found(&self) -> bool {
        matches!(self, RouteError::RouteNotFound { .. })
    }

    /// True when the client referenced an instance that has expired
    pub fn is_expired(&self) -> bool {
        matches!(self, RouteError::InstanceExpired { .. })
    }
}
