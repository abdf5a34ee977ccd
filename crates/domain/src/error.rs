//! Domain error types.

use store::StoreError;
use thiserror::Error;

use crate::invoice::InvoiceError;
use crate::payment::PaymentError;

/// A malformed input field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {field}: {reason}")]
pub struct ValidationError {
    /// Name of the offending field.
    pub field: &'static str,

    /// What is wrong with it.
    pub reason: String,
}

impl ValidationError {
    /// Creates a validation error for `field`.
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// The closed taxonomy of failures the core reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input field on construction or update.
    Validation,
    /// Mutation attempted outside `Draft`.
    ImmutableState,
    /// Illegal `send` / `mark_paid` precondition.
    InvalidStateTransition,
    /// Operation not allowed in the current status.
    InvalidOperation,
    /// Payment exceeds the remaining balance.
    InsufficientBalance,
    /// Payment construction precondition violated.
    InvalidPayment,
    /// Stale version on save.
    VersionConflict,
    /// Referenced aggregate or line item is absent.
    NotFound,
    /// Unique value already taken.
    Duplicate,
    /// Storage or serialization failure.
    Internal,
}

impl ErrorKind {
    /// Returns true for conditions that occur in normal operation and are
    /// reported to users rather than treated as defects.
    pub fn is_expected(&self) -> bool {
        matches!(self, ErrorKind::VersionConflict | ErrorKind::InsufficientBalance)
    }

    /// Returns true if reloading the aggregate and re-applying the command
    /// may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::VersionConflict)
    }
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// An error occurred in the invoice aggregate.
    #[error("Invoice error: {0}")]
    Invoice(#[from] InvoiceError),

    /// A payment could not be created.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Store(err) => match err {
                StoreError::VersionConflict { .. } => ErrorKind::VersionConflict,
                StoreError::NotFound { .. } => ErrorKind::NotFound,
                StoreError::DuplicateKey { .. } => ErrorKind::Duplicate,
                StoreError::Serialization(_) => ErrorKind::Internal,
            },
            DomainError::Invoice(err) => err.kind(),
            DomainError::Payment(_) => ErrorKind::InvalidPayment,
            DomainError::Serialization(_) => ErrorKind::Internal,
        }
    }

    /// See [`ErrorKind::is_expected`].
    pub fn is_expected(&self) -> bool {
        self.kind().is_expected()
    }
}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        DomainError::Invoice(InvoiceError::Validation(err))
    }
}
