//! Application-wide error taxonomy.
//!
//! Every fallible operation in the core surfaces one of these kinds. The
//! taxonomy is deliberately small: callers (and UIs) must be able to
//! distinguish "doesn't exist" from "exists but not yours" from "the numbers
//! are wrong" from "wrong state for that transition".

use thiserror::Error;

/// Result type alias using `DomainError`.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain error kinds.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Referenced entity does not exist. Never used to mask an
    /// authorization failure.
    #[error("{resource} with ID '{id}' not found")]
    NotFound {
        /// The resource type, e.g. "Account".
        resource: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// Entity exists but the actor lacks rights to it.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A numeric input violates a business rule.
    #[error("Invalid amount {amount}: {reason}")]
    InvalidAmount {
        /// The offending value.
        amount: i64,
        /// Why it was rejected.
        reason: String,
    },

    /// A state-machine transition was attempted from a state that forbids it.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Storage layer fault (connection lost, constraint violation, corrupt row).
    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    /// Convenience constructor for [`DomainError::NotFound`].
    #[must_use]
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::PermissionDenied(_) => 403,
            Self::InvalidAmount { .. } => 400,
            Self::InvalidOperation(_) => 422,
            Self::Storage(_) => 500,
        }
    }

    /// Returns the stable machine-readable code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "RESOURCE_NOT_FOUND",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::InvalidOperation(_) => "INVALID_OPERATION",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(DomainError::not_found("Account", "a1").status_code(), 404);
        assert_eq!(
            DomainError::PermissionDenied(String::new()).status_code(),
            403
        );
        assert_eq!(
            DomainError::InvalidAmount {
                amount: 0,
                reason: String::new()
            }
            .status_code(),
            400
        );
        assert_eq!(
            DomainError::InvalidOperation(String::new()).status_code(),
            422
        );
        assert_eq!(DomainError::Storage(String::new()).status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            DomainError::not_found("Account", "a1").error_code(),
            "RESOURCE_NOT_FOUND"
        );
        assert_eq!(
            DomainError::PermissionDenied(String::new()).error_code(),
            "PERMISSION_DENIED"
        );
        assert_eq!(
            DomainError::InvalidAmount {
                amount: 0,
                reason: String::new()
            }
            .error_code(),
            "INVALID_AMOUNT"
        );
        assert_eq!(
            DomainError::InvalidOperation(String::new()).error_code(),
            "INVALID_OPERATION"
        );
        assert_eq!(
            DomainError::Storage(String::new()).error_code(),
            "STORAGE_ERROR"
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            DomainError::not_found("Account", "a1").to_string(),
            "Account with ID 'a1' not found"
        );
        assert_eq!(
            DomainError::InvalidAmount {
                amount: 8000,
                reason: "Insufficient balance. Current: 7000, Required: 8000".into()
            }
            .to_string(),
            "Invalid amount 8000: Insufficient balance. Current: 7000, Required: 8000"
        );
        assert_eq!(
            DomainError::InvalidOperation("Request already approved".into()).to_string(),
            "Invalid operation: Request already approved"
        );
    }
}
