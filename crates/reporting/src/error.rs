//! Reporting error types.

use common::InvoiceId;
use domain::DomainError;
use thiserror::Error;

/// Errors that can occur while building a report.
#[derive(Debug, Error)]
pub enum ReportingError {
    /// Loading records failed.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// The requested invoice does not exist.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),
}

/// Result type for reporting operations.
pub type Result<T> = std::result::Result<T, ReportingError>;
