//! Engine Error Types
//!
//! Every public operation returns a success value or exactly ONE of these
//! kinds. All failures are synchronous and terminal for that call: state
//! is unchanged and any retry policy belongs to the caller.

use thiserror::Error;

use crate::core_types::{Amount, RequestId, ResourceId};

/// Engine error taxonomy.
///
/// Numeric codes are stable across releases for API consumers; see
/// [`EngineError::code`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    // === Authorization ===
    #[error("Caller is not authorized for this operation")]
    Unauthorized,

    #[error("Requester priority {have} below required level {need}")]
    InsufficientPriority { have: u8, need: u8 },

    // === Quantity / bounds ===
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Allocation of {amount} exceeds limit {limit}")]
    AllocationExceeded { amount: Amount, limit: Amount },

    #[error("Insufficient balance: need {need}, have {have}")]
    InsufficientBalance { need: Amount, have: Amount },

    // === Lookup ===
    #[error("Resource {0} not found")]
    ResourceNotFound(ResourceId),

    #[error("Request {0} not found")]
    RequestNotFound(RequestId),

    // === Lifecycle / gating ===
    #[error("System already initialized")]
    AlreadyInitialized,

    #[error("System not initialized")]
    NotInitialized,

    #[error("Resource {0} already registered")]
    AlreadyExists(ResourceId),

    #[error("Resource {0} is frozen")]
    ResourceFrozen(ResourceId),

    #[error("System is frozen or in maintenance")]
    SystemFrozen,

    #[error("Request {0} expired before settlement")]
    RequestTimeout(RequestId),

    // === Parameters ===
    #[error("Invalid recipient")]
    InvalidRecipient,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl EngineError {
    /// Stable numeric code for API responses.
    pub fn code(&self) -> u16 {
        match self {
            EngineError::Unauthorized => 1,
            EngineError::InvalidQuantity(_) => 2,
            EngineError::InsufficientBalance { .. } => 3,
            EngineError::ResourceNotFound(_) => 4,
            EngineError::AlreadyInitialized => 5,
            EngineError::InvalidRecipient => 6,
            EngineError::AllocationExceeded { .. } => 7,
            EngineError::InsufficientPriority { .. } => 8,
            EngineError::ResourceFrozen(_) => 9,
            EngineError::RequestTimeout(_) => 10,
            EngineError::InvalidParameter(_) => 11,
            EngineError::SystemFrozen => 12,
            EngineError::NotInitialized => 13,
            EngineError::AlreadyExists(_) => 14,
            EngineError::RequestNotFound(_) => 15,
        }
    }
}

/// Convenience alias used by every engine operation.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let errs = [
            EngineError::Unauthorized,
            EngineError::InvalidQuantity("x".into()),
            EngineError::InsufficientBalance { need: 1, have: 0 },
            EngineError::ResourceNotFound(1),
            EngineError::AlreadyInitialized,
            EngineError::InvalidRecipient,
            EngineError::AllocationExceeded {
                amount: 2,
                limit: 1,
            },
            EngineError::InsufficientPriority { have: 1, need: 5 },
            EngineError::ResourceFrozen(1),
            EngineError::RequestTimeout(1),
            EngineError::InvalidParameter("x".into()),
            EngineError::SystemFrozen,
            EngineError::NotInitialized,
            EngineError::AlreadyExists(1),
            EngineError::RequestNotFound(1),
        ];
        let mut codes: Vec<u16> = errs.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errs.len());
    }
}
