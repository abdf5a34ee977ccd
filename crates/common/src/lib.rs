//! Shared types for the billing core.
//!
//! Holds the strongly typed identifiers used across crates and the
//! [`Clock`] collaborator through which the domain reads "now" and "today".

pub mod clock;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use types::{CustomerId, InvoiceId, LineItemId, PaymentId};
