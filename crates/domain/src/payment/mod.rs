//! Payments recorded against sent invoices.

mod commands;
mod entity;
mod service;

pub use commands::RecordPayment;
pub use entity::{Payment, PaymentBuilder, PaymentMethod};
pub use service::{PaymentService, RecordedPayment};

use thiserror::Error;

/// Errors that can occur when creating a payment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// A construction precondition was violated.
    #[error("Invalid payment {field}: {reason}")]
    InvalidPayment { field: &'static str, reason: String },
}

impl PaymentError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        PaymentError::InvalidPayment {
            field,
            reason: reason.into(),
        }
    }

    /// Returns the name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            PaymentError::InvalidPayment { field, .. } => field,
        }
    }
}
