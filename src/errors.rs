//! Common error type for issuance operations
//!
//! Unifies the bridge and persistence errors with the failures owned by the
//! document and session layers, so callers at the application edge handle a
//! single type.

use crate::bridge::BridgeError;
use crate::storage::StorageError;
use std::fmt;

/// Error returned by the application-level operations
#[derive(Debug)]
pub enum InsuranceError {
    /// Host capability, auth exchange or payment failures
    Bridge(BridgeError),
    /// Local persistence failures
    Persistence(StorageError),
    /// The operation requires a signed-in user
    Unauthenticated,
    /// Caller-supplied data is incomplete or malformed
    InvalidRequest(String),
    /// No document with the given identifier
    NotFound(String),
    /// Both the rich and the plain rendering failed
    Render(String),
}

impl fmt::Display for InsuranceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsuranceError::Bridge(err) => write!(f, "Host bridge error: {err}"),
            InsuranceError::Persistence(err) => write!(f, "Persistence error: {err}"),
            InsuranceError::Unauthenticated => {
                write!(f, "User must be logged in to perform this operation")
            }
            InsuranceError::InvalidRequest(msg) => write!(f, "Invalid request: {msg}"),
            InsuranceError::NotFound(id) => write!(f, "Document not found: {id}"),
            InsuranceError::Render(msg) => write!(f, "Rendering failed: {msg}"),
        }
    }
}

impl std::error::Error for InsuranceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InsuranceError::Bridge(err) => Some(err),
            InsuranceError::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BridgeError> for InsuranceError {
    fn from(err: BridgeError) -> Self {
        InsuranceError::Bridge(err)
    }
}

impl From<StorageError> for InsuranceError {
    fn from(err: StorageError) -> Self {
        InsuranceError::Persistence(err)
    }
}
