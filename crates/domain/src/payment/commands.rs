//! Payment commands.

use chrono::NaiveDate;
use common::InvoiceId;
use rust_decimal::Decimal;
use store::Version;
use uuid::Uuid;

use crate::invoice::Invoice;
use crate::repository::Command;

use super::PaymentMethod;

/// Command to record a payment against a sent invoice.
#[derive(Debug, Clone)]
pub struct RecordPayment {
    pub invoice_id: InvoiceId,
    pub expected_version: Version,
    pub payment_date: NaiveDate,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_by: String,
}

impl RecordPayment {
    /// Creates a new RecordPayment command without reference or notes.
    pub fn new(
        invoice_id: InvoiceId,
        expected_version: Version,
        payment_date: NaiveDate,
        amount: Decimal,
        method: PaymentMethod,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            invoice_id,
            expected_version,
            payment_date,
            amount,
            method,
            reference: None,
            notes: None,
            created_by: created_by.into(),
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

impl Command for RecordPayment {
    type Aggregate = Invoice;

    fn aggregate_id(&self) -> Uuid {
        self.invoice_id.as_uuid()
    }

    fn expected_version(&self) -> Version {
        self.expected_version
    }
}
