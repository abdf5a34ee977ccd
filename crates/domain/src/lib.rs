//! Domain layer for the billing core.
//!
//! This crate provides:
//! - Money and rate types with half-up rounding
//! - The LineItem value object and its derived amounts
//! - The Invoice aggregate with its Draft → Sent → Paid lifecycle
//! - The Payment entity and payment recording
//! - A typed repository with optimistic concurrency
//! - An idempotency guard for retried commands

pub mod aggregate;
pub mod error;
pub mod idempotency;
pub mod invoice;
pub mod line_item;
pub mod money;
pub mod payment;
pub mod repository;

pub use aggregate::{Aggregate, DomainEvent, Entity};
pub use error::{DomainError, ErrorKind, ValidationError};
pub use idempotency::IdempotencyGuard;
pub use invoice::{
    AddLineItem, ClearLineItems, CreateInvoice, Invoice, InvoiceDetails, InvoiceError,
    InvoiceEvent, InvoiceNumberGenerator, InvoiceService, InvoiceStatus, MarkInvoicePaid,
    RemoveLineItem, SendInvoice, SequentialInvoiceNumbers, UpdateInvoiceFields, UpdateLineItem,
};
pub use line_item::{LineItem, LineItemBreakdown};
pub use money::{Money, Rate, round2, round4};
pub use payment::{
    Payment, PaymentBuilder, PaymentError, PaymentMethod, PaymentService, RecordPayment,
    RecordedPayment,
};
pub use repository::{Command, CommandResult, Repository};
