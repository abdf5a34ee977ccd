//! Read-side reports over invoices and payments.
//!
//! Nothing here is stored: every report is recomputed from the current
//! invoice and payment records when it is requested.
//! - [`running_balance`] replays payments against an invoice total
//! - [`PaymentStatistics`] reduces a payment set to collection totals
//! - [`StatementReader`] loads an invoice with its payments as an [`InvoiceStatement`]

pub mod error;
pub mod running_balance;
pub mod statement;
pub mod statistics;

pub use error::{ReportingError, Result};
pub use running_balance::{BalanceEntry, PaymentClassification, running_balance};
pub use statement::{InvoiceStatement, StatementReader};
pub use statistics::PaymentStatistics;
