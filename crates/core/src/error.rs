//! Client-wide error taxonomy.
//!
//! Every public operation in the API and state layers returns
//! `Result<_, ClientError>`; callers branch on the variant to decide
//! between retry prompts, silent redirects, and optimistic rollback.

#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// The backend could not be reached or the transport failed mid-flight.
    #[error("Network error: {0}")]
    Network(String),

    /// The token is missing, expired, or rejected by the backend.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The authenticated user may not perform the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A payload failed validation, either locally before the round trip
    /// or while decoding the server's response.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The backend rejected the operation on business grounds
    /// (insufficient balance, duplicate account, unavailable item).
    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for fallible client operations.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// True for transient transport failures worth a retry prompt.
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }

    /// True when the variant signals an invalid or expired token.
    ///
    /// Callers treat this as "session dead" and route through the same
    /// path as an explicit logout.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_predicate() {
        assert!(ClientError::Network("timed out".to_string()).is_network());
        assert!(!ClientError::Rejected("insufficient coins".to_string()).is_network());
    }

    #[test]
    fn test_unauthorized_predicate() {
        assert!(ClientError::Unauthorized("token expired".to_string()).is_unauthorized());
        assert!(!ClientError::Forbidden("wrong role".to_string()).is_unauthorized());
    }

    #[test]
    fn test_display_carries_the_cause() {
        let err = ClientError::Validation("name must not be empty".to_string());
        assert_eq!(err.to_string(), "Validation failed: name must not be empty");
    }
}
