//! Invoice commands.

use chrono::NaiveDate;
use common::{CustomerId, InvoiceId, LineItemId};
use store::Version;
use uuid::Uuid;

use crate::line_item::LineItem;
use crate::repository::Command;

use super::{Invoice, InvoiceDetails};

/// Command to create a new draft invoice.
///
/// The invoice number is assigned by the service, never by the caller.
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub customer_id: CustomerId,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub payment_terms: Option<String>,
}

impl CreateInvoice {
    /// Creates a new CreateInvoice command.
    pub fn new(customer_id: CustomerId, issue_date: NaiveDate, due_date: NaiveDate) -> Self {
        Self {
            customer_id,
            issue_date,
            due_date,
            payment_terms: None,
        }
    }

    /// Sets the payment terms.
    pub fn with_payment_terms(mut self, terms: impl Into<String>) -> Self {
        self.payment_terms = Some(terms.into());
        self
    }
}

/// Command to append a line item.
#[derive(Debug, Clone)]
pub struct AddLineItem {
    pub invoice_id: InvoiceId,
    pub expected_version: Version,
    pub item: LineItem,
}

impl AddLineItem {
    pub fn new(invoice_id: InvoiceId, expected_version: Version, item: LineItem) -> Self {
        Self {
            invoice_id,
            expected_version,
            item,
        }
    }
}

/// Command to remove a line item.
#[derive(Debug, Clone)]
pub struct RemoveLineItem {
    pub invoice_id: InvoiceId,
    pub expected_version: Version,
    pub line_item_id: LineItemId,
}

impl RemoveLineItem {
    pub fn new(invoice_id: InvoiceId, expected_version: Version, line_item_id: LineItemId) -> Self {
        Self {
            invoice_id,
            expected_version,
            line_item_id,
        }
    }
}

/// Command to replace a line item in place.
#[derive(Debug, Clone)]
pub struct UpdateLineItem {
    pub invoice_id: InvoiceId,
    pub expected_version: Version,
    pub line_item_id: LineItemId,

    /// The replacement; its id is overwritten with `line_item_id`.
    pub item: LineItem,
}

impl UpdateLineItem {
    pub fn new(
        invoice_id: InvoiceId,
        expected_version: Version,
        line_item_id: LineItemId,
        item: LineItem,
    ) -> Self {
        Self {
            invoice_id,
            expected_version,
            line_item_id,
            item,
        }
    }
}

/// Command to remove every line item.
#[derive(Debug, Clone)]
pub struct ClearLineItems {
    pub invoice_id: InvoiceId,
    pub expected_version: Version,
}

impl ClearLineItems {
    pub fn new(invoice_id: InvoiceId, expected_version: Version) -> Self {
        Self {
            invoice_id,
            expected_version,
        }
    }
}

/// Command to replace the invoice header fields.
#[derive(Debug, Clone)]
pub struct UpdateInvoiceFields {
    pub invoice_id: InvoiceId,
    pub expected_version: Version,
    pub details: InvoiceDetails,
}

impl UpdateInvoiceFields {
    pub fn new(invoice_id: InvoiceId, expected_version: Version, details: InvoiceDetails) -> Self {
        Self {
            invoice_id,
            expected_version,
            details,
        }
    }
}

/// Command to send a draft invoice.
#[derive(Debug, Clone)]
pub struct SendInvoice {
    pub invoice_id: InvoiceId,
    pub expected_version: Version,
}

impl SendInvoice {
    pub fn new(invoice_id: InvoiceId, expected_version: Version) -> Self {
        Self {
            invoice_id,
            expected_version,
        }
    }
}

/// Command to mark a fully paid invoice as paid.
#[derive(Debug, Clone)]
pub struct MarkInvoicePaid {
    pub invoice_id: InvoiceId,
    pub expected_version: Version,
}

impl MarkInvoicePaid {
    pub fn new(invoice_id: InvoiceId, expected_version: Version) -> Self {
        Self {
            invoice_id,
            expected_version,
        }
    }
}

macro_rules! invoice_command {
    ($($command:ty),+ $(,)?) => {
        $(
            impl Command for $command {
                type Aggregate = Invoice;

                fn aggregate_id(&self) -> Uuid {
                    self.invoice_id.as_uuid()
                }

                fn expected_version(&self) -> Version {
                    self.expected_version
                }
            }
        )+
    };
}

invoice_command!(
    AddLineItem,
    RemoveLineItem,
    UpdateLineItem,
    ClearLineItems,
    UpdateInvoiceFields,
    SendInvoice,
    MarkInvoicePaid,
);
