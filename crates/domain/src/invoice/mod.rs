//! Invoice aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod numbering;
mod service;
mod status;

pub use aggregate::{Invoice, InvoiceDetails};
pub use commands::*;
pub use events::{
    DetailsUpdatedData, InvoiceCreatedData, InvoiceEvent, LineItemAddedData, LineItemRemovedData,
    LineItemUpdatedData, LineItemsClearedData, PaymentAppliedData, StatusChangedData,
};
pub use numbering::{InvoiceNumberGenerator, SequentialInvoiceNumbers};
pub use service::InvoiceService;
pub use status::InvoiceStatus;

use common::LineItemId;
use thiserror::Error;

use crate::error::{ErrorKind, ValidationError};
use crate::money::Money;

/// Errors that can occur during invoice operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvoiceError {
    /// A field failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Line items or details were modified outside Draft.
    #[error("Cannot {action} while invoice is {status}")]
    ImmutableState {
        status: InvoiceStatus,
        action: &'static str,
    },

    /// A lifecycle transition's precondition does not hold.
    #[error("Invalid state transition: cannot {action} from {current_status}: {reason}")]
    InvalidStateTransition {
        current_status: InvoiceStatus,
        action: &'static str,
        reason: &'static str,
    },

    /// The operation is not available in the current status.
    #[error("Invalid operation: cannot {action} while invoice is {status}")]
    InvalidOperation {
        status: InvoiceStatus,
        action: &'static str,
    },

    /// A payment exceeds the remaining balance.
    #[error("Insufficient balance: payment of {requested} exceeds balance of {balance}")]
    InsufficientBalance { requested: Money, balance: Money },

    /// No line item with this id exists on the invoice.
    #[error("Line item not found: {0}")]
    LineItemNotFound(LineItemId),
}

impl InvoiceError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            InvoiceError::Validation(_) => ErrorKind::Validation,
            InvoiceError::ImmutableState { .. } => ErrorKind::ImmutableState,
            InvoiceError::InvalidStateTransition { .. } => ErrorKind::InvalidStateTransition,
            InvoiceError::InvalidOperation { .. } => ErrorKind::InvalidOperation,
            InvoiceError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            InvoiceError::LineItemNotFound(_) => ErrorKind::NotFound,
        }
    }
}
