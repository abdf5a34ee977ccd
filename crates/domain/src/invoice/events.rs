//! Invoice domain events.

use chrono::{DateTime, Utc};
use common::{CustomerId, InvoiceId, LineItemId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::line_item::LineItem;
use crate::money::Money;

use super::InvoiceStatus;

/// Events recorded by the invoice aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InvoiceEvent {
    /// Invoice was created in Draft.
    InvoiceCreated(InvoiceCreatedData),

    /// A line item was appended.
    LineItemAdded(LineItemAddedData),

    /// A line item was replaced in place.
    LineItemUpdated(LineItemUpdatedData),

    /// A line item was removed.
    LineItemRemoved(LineItemRemovedData),

    /// All line items were removed.
    LineItemsCleared(LineItemsClearedData),

    /// Header fields (customer, dates, terms, notes) changed.
    DetailsUpdated(DetailsUpdatedData),

    /// Status moved along the lifecycle.
    StatusChanged(StatusChangedData),

    /// A payment reduced the balance.
    PaymentApplied(PaymentAppliedData),
}

impl DomainEvent for InvoiceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InvoiceEvent::InvoiceCreated(_) => "InvoiceCreated",
            InvoiceEvent::LineItemAdded(_) => "LineItemAdded",
            InvoiceEvent::LineItemUpdated(_) => "LineItemUpdated",
            InvoiceEvent::LineItemRemoved(_) => "LineItemRemoved",
            InvoiceEvent::LineItemsCleared(_) => "LineItemsCleared",
            InvoiceEvent::DetailsUpdated(_) => "DetailsUpdated",
            InvoiceEvent::StatusChanged(_) => "StatusChanged",
            InvoiceEvent::PaymentApplied(_) => "PaymentApplied",
        }
    }
}

impl InvoiceEvent {
    /// Returns when the event was recorded.
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InvoiceEvent::InvoiceCreated(data) => data.occurred_at,
            InvoiceEvent::LineItemAdded(data) => data.occurred_at,
            InvoiceEvent::LineItemUpdated(data) => data.occurred_at,
            InvoiceEvent::LineItemRemoved(data) => data.occurred_at,
            InvoiceEvent::LineItemsCleared(data) => data.occurred_at,
            InvoiceEvent::DetailsUpdated(data) => data.occurred_at,
            InvoiceEvent::StatusChanged(data) => data.occurred_at,
            InvoiceEvent::PaymentApplied(data) => data.occurred_at,
        }
    }
}

/// Data for InvoiceCreated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceCreatedData {
    pub invoice_id: InvoiceId,
    pub invoice_number: String,
    pub customer_id: CustomerId,
    pub occurred_at: DateTime<Utc>,
}

/// Data for LineItemAdded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemAddedData {
    pub line_item_id: LineItemId,
    pub description: String,
    /// Line total at the time of adding.
    pub total: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Data for LineItemUpdated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemUpdatedData {
    pub line_item_id: LineItemId,
    pub old_total: Money,
    pub new_total: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Data for LineItemRemoved event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemRemovedData {
    pub line_item_id: LineItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Data for LineItemsCleared event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemsClearedData {
    /// Number of line items removed.
    pub removed: usize,
    pub occurred_at: DateTime<Utc>,
}

/// Data for DetailsUpdated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailsUpdatedData {
    /// Names of the fields whose values changed.
    pub changed_fields: Vec<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Data for StatusChanged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChangedData {
    pub from: InvoiceStatus,
    pub to: InvoiceStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Data for PaymentApplied event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAppliedData {
    pub amount: Money,
    pub balance_after: Money,
    pub occurred_at: DateTime<Utc>,
}

// Convenience constructors for events, stamped with the caller's clock.
impl InvoiceEvent {
    pub fn invoice_created(
        invoice_id: InvoiceId,
        invoice_number: impl Into<String>,
        customer_id: CustomerId,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        InvoiceEvent::InvoiceCreated(InvoiceCreatedData {
            invoice_id,
            invoice_number: invoice_number.into(),
            customer_id,
            occurred_at,
        })
    }

    pub fn line_item_added(item: &LineItem, occurred_at: DateTime<Utc>) -> Self {
        InvoiceEvent::LineItemAdded(LineItemAddedData {
            line_item_id: item.id(),
            description: item.description().to_string(),
            total: item.total(),
            occurred_at,
        })
    }

    pub fn line_item_updated(
        line_item_id: LineItemId,
        old_total: Money,
        new_total: Money,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        InvoiceEvent::LineItemUpdated(LineItemUpdatedData {
            line_item_id,
            old_total,
            new_total,
            occurred_at,
        })
    }

    pub fn line_item_removed(line_item_id: LineItemId, occurred_at: DateTime<Utc>) -> Self {
        InvoiceEvent::LineItemRemoved(LineItemRemovedData {
            line_item_id,
            occurred_at,
        })
    }

    pub fn line_items_cleared(removed: usize, occurred_at: DateTime<Utc>) -> Self {
        InvoiceEvent::LineItemsCleared(LineItemsClearedData {
            removed,
            occurred_at,
        })
    }

    pub fn details_updated(changed_fields: Vec<String>, occurred_at: DateTime<Utc>) -> Self {
        InvoiceEvent::DetailsUpdated(DetailsUpdatedData {
            changed_fields,
            occurred_at,
        })
    }

    pub fn status_changed(
        from: InvoiceStatus,
        to: InvoiceStatus,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        InvoiceEvent::StatusChanged(StatusChangedData {
            from,
            to,
            occurred_at,
        })
    }

    pub fn payment_applied(
        amount: Money,
        balance_after: Money,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        InvoiceEvent::PaymentApplied(PaymentAppliedData {
            amount,
            balance_after,
            occurred_at,
        })
    }
}
