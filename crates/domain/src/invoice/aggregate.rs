//! Invoice aggregate implementation.

use chrono::{DateTime, NaiveDate, Utc};
use common::{CustomerId, InvoiceId, LineItemId};
use serde::{Deserialize, Serialize};
use store::Version;
use uuid::Uuid;

use crate::aggregate::{Aggregate, Entity};
use crate::error::ValidationError;
use crate::line_item::LineItem;
use crate::money::Money;

use super::{InvoiceError, InvoiceEvent, InvoiceStatus};

/// Editable header fields of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDetails {
    pub customer_id: CustomerId,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
}

/// Invoice aggregate root.
///
/// Owns its line items and the totals cached from them. While the invoice is
/// a draft every line-item change recomputes the totals and resets the
/// balance to the new total; once sent, only payments move the balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    id: InvoiceId,

    /// Assigned once at creation, never regenerated.
    invoice_number: String,

    customer_id: CustomerId,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    status: InvoiceStatus,
    payment_terms: Option<String>,
    line_items: Vec<LineItem>,

    subtotal: Money,
    total_discount: Money,
    total_tax: Money,
    total_amount: Money,

    /// Remaining unpaid amount, always within `[0, total_amount]`.
    balance: Money,

    notes: Option<String>,
    created_at: DateTime<Utc>,

    /// Persisted version; populated by the repository.
    #[serde(skip)]
    version: Version,

    #[serde(skip)]
    pending_events: Vec<InvoiceEvent>,
}

impl Entity for Invoice {
    fn kind() -> &'static str {
        "Invoice"
    }

    fn record_id(&self) -> Uuid {
        self.id.as_uuid()
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("invoice_number", self.invoice_number.clone())]
    }

    fn tags(&self) -> Vec<(&'static str, String)> {
        vec![("customer_id", self.customer_id.to_string())]
    }
}

impl Aggregate for Invoice {
    type Event = InvoiceEvent;

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn pending_events(&self) -> &[InvoiceEvent] {
        &self.pending_events
    }

    fn drain_events(&mut self) -> Vec<InvoiceEvent> {
        std::mem::take(&mut self.pending_events)
    }
}

// Query methods
impl Invoice {
    pub fn id(&self) -> InvoiceId {
        self.id
    }

    pub fn invoice_number(&self) -> &str {
        &self.invoice_number
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn issue_date(&self) -> NaiveDate {
        self.issue_date
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn payment_terms(&self) -> Option<&str> {
        self.payment_terms.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the line items in insertion order.
    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    /// Returns a line item by id.
    pub fn line_item(&self, id: LineItemId) -> Option<&LineItem> {
        self.line_items.iter().find(|item| item.id() == id)
    }

    pub fn line_item_count(&self) -> usize {
        self.line_items.len()
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn total_discount(&self) -> Money {
        self.total_discount
    }

    pub fn total_tax(&self) -> Money {
        self.total_tax
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    /// Returns how much has been paid so far.
    pub fn amount_paid(&self) -> Money {
        self.total_amount - self.balance
    }

    /// Returns true if the invoice could be sent now.
    pub fn can_be_sent(&self) -> bool {
        self.status.can_send() && !self.line_items.is_empty() && self.total_amount.is_positive()
    }

    /// Returns true if a payment could be applied now.
    pub fn can_accept_payment(&self) -> bool {
        self.status.accepts_payments() && self.balance.is_positive()
    }

    /// Returns true if the invoice could be marked paid now.
    pub fn can_be_paid(&self) -> bool {
        self.status.can_mark_paid() && self.balance.is_zero()
    }

    /// Returns true if the invoice is sent, unpaid and past its due date.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == InvoiceStatus::Sent && today > self.due_date
    }

    /// Returns the number of days past the due date, or 0 if not overdue.
    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        if self.is_overdue(today) {
            (today - self.due_date).num_days()
        } else {
            0
        }
    }
}

// Command methods
impl Invoice {
    /// Creates a draft invoice with no line items, stamped at `now`.
    pub fn create(
        customer_id: CustomerId,
        issue_date: NaiveDate,
        due_date: NaiveDate,
        payment_terms: Option<String>,
        invoice_number: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, InvoiceError> {
        let invoice_number = invoice_number.into();
        if invoice_number.trim().is_empty() {
            return Err(ValidationError::new("invoice_number", "is required").into());
        }
        validate_details(customer_id, issue_date, due_date)?;

        let id = InvoiceId::new();
        let mut invoice = Self {
            id,
            invoice_number: invoice_number.clone(),
            customer_id,
            issue_date,
            due_date,
            status: InvoiceStatus::Draft,
            payment_terms: normalize_text(payment_terms),
            line_items: Vec::new(),
            subtotal: Money::zero(),
            total_discount: Money::zero(),
            total_tax: Money::zero(),
            total_amount: Money::zero(),
            balance: Money::zero(),
            notes: None,
            created_at: now,
            version: Version::initial(),
            pending_events: Vec::new(),
        };
        invoice.record(InvoiceEvent::invoice_created(id, invoice_number, customer_id, now));

        Ok(invoice)
    }

    /// Appends a line item.
    pub fn add_line_item(
        &mut self,
        item: LineItem,
        now: DateTime<Utc>,
    ) -> Result<(), InvoiceError> {
        self.ensure_editable("add line item")?;

        if self.line_item(item.id()).is_some() {
            return Err(ValidationError::new(
                "line_item_id",
                format!("{} is already on the invoice", item.id()),
            )
            .into());
        }

        let mut items = self.line_items.clone();
        items.push(item);
        let totals = Totals::of(&items)?;

        let event = InvoiceEvent::line_item_added(&items[items.len() - 1], now);
        self.replace_line_items(items, totals);
        self.record(event);

        Ok(())
    }

    /// Removes a line item.
    pub fn remove_line_item(
        &mut self,
        id: LineItemId,
        now: DateTime<Utc>,
    ) -> Result<(), InvoiceError> {
        self.ensure_editable("remove line item")?;

        let position = self.position_of(id)?;
        let mut items = self.line_items.clone();
        items.remove(position);
        let totals = Totals::of(&items)?;

        self.replace_line_items(items, totals);
        self.record(InvoiceEvent::line_item_removed(id, now));

        Ok(())
    }

    /// Replaces a line item in place, keeping its id and position.
    pub fn update_line_item(
        &mut self,
        id: LineItemId,
        item: LineItem,
        now: DateTime<Utc>,
    ) -> Result<(), InvoiceError> {
        self.ensure_editable("update line item")?;

        let position = self.position_of(id)?;
        let item = item.with_id(id);
        if self.line_items[position] == item {
            return Ok(());
        }

        let mut items = self.line_items.clone();
        items[position] = item;
        let totals = Totals::of(&items)?;
        let old_total = self.line_items[position].total();
        let new_total = items[position].total();

        self.replace_line_items(items, totals);
        self.record(InvoiceEvent::line_item_updated(id, old_total, new_total, now));

        Ok(())
    }

    /// Removes every line item.
    pub fn clear_line_items(&mut self, now: DateTime<Utc>) -> Result<(), InvoiceError> {
        self.ensure_editable("clear line items")?;

        if self.line_items.is_empty() {
            return Ok(());
        }

        let removed = self.line_items.len();
        self.replace_line_items(Vec::new(), Totals::default());
        self.record(InvoiceEvent::line_items_cleared(removed, now));

        Ok(())
    }

    /// Replaces the header fields. The invoice number is not editable.
    pub fn update_fields(
        &mut self,
        details: InvoiceDetails,
        now: DateTime<Utc>,
    ) -> Result<(), InvoiceError> {
        self.ensure_editable("update invoice details")?;
        validate_details(details.customer_id, details.issue_date, details.due_date)?;

        let payment_terms = normalize_text(details.payment_terms);
        let notes = normalize_text(details.notes);

        let mut changed = Vec::new();
        if self.customer_id != details.customer_id {
            changed.push("customer_id".to_string());
        }
        if self.issue_date != details.issue_date {
            changed.push("issue_date".to_string());
        }
        if self.due_date != details.due_date {
            changed.push("due_date".to_string());
        }
        if self.payment_terms != payment_terms {
            changed.push("payment_terms".to_string());
        }
        if self.notes != notes {
            changed.push("notes".to_string());
        }
        if changed.is_empty() {
            return Ok(());
        }

        self.customer_id = details.customer_id;
        self.issue_date = details.issue_date;
        self.due_date = details.due_date;
        self.payment_terms = payment_terms;
        self.notes = notes;
        self.record(InvoiceEvent::details_updated(changed, now));

        Ok(())
    }

    /// Issues the invoice, freezing its line items.
    pub fn send(&mut self, now: DateTime<Utc>) -> Result<(), InvoiceError> {
        if !self.status.can_send() {
            return Err(self.transition_error("send", "invoice is not a draft"));
        }
        if self.line_items.is_empty() {
            return Err(self.transition_error("send", "invoice has no line items"));
        }
        if !self.total_amount.is_positive() {
            return Err(self.transition_error("send", "total amount must be positive"));
        }

        self.change_status(InvoiceStatus::Sent, now);
        Ok(())
    }

    /// Reduces the balance by `amount`.
    ///
    /// When the balance reaches zero the invoice becomes Paid in the same
    /// call.
    pub fn apply_payment(&mut self, amount: Money, now: DateTime<Utc>) -> Result<(), InvoiceError> {
        if !self.status.accepts_payments() {
            return Err(InvoiceError::InvalidOperation {
                status: self.status,
                action: "apply payment",
            });
        }
        if !amount.is_positive() {
            return Err(ValidationError::new(
                "amount",
                format!("must be greater than 0 (got {amount})"),
            )
            .into());
        }
        if amount > self.balance {
            return Err(InvoiceError::InsufficientBalance {
                requested: amount,
                balance: self.balance,
            });
        }

        self.balance -= amount;
        self.record(InvoiceEvent::payment_applied(amount, self.balance, now));

        if self.balance.is_zero() {
            self.change_status(InvoiceStatus::Paid, now);
        }

        Ok(())
    }

    /// Marks a sent invoice with zero balance as paid.
    pub fn mark_paid(&mut self, now: DateTime<Utc>) -> Result<(), InvoiceError> {
        if !self.status.can_mark_paid() {
            return Err(self.transition_error("mark paid", "invoice is not sent"));
        }
        if !self.balance.is_zero() {
            return Err(self.transition_error("mark paid", "balance is not zero"));
        }

        self.change_status(InvoiceStatus::Paid, now);
        Ok(())
    }
}

// Internal helpers
impl Invoice {
    fn ensure_editable(&self, action: &'static str) -> Result<(), InvoiceError> {
        if self.status.is_editable() {
            Ok(())
        } else {
            Err(InvoiceError::ImmutableState {
                status: self.status,
                action,
            })
        }
    }

    fn position_of(&self, id: LineItemId) -> Result<usize, InvoiceError> {
        self.line_items
            .iter()
            .position(|item| item.id() == id)
            .ok_or(InvoiceError::LineItemNotFound(id))
    }

    fn transition_error(&self, action: &'static str, reason: &'static str) -> InvoiceError {
        InvoiceError::InvalidStateTransition {
            current_status: self.status,
            action,
            reason,
        }
    }

    fn change_status(&mut self, to: InvoiceStatus, now: DateTime<Utc>) {
        let from = self.status;
        self.status = to;
        self.record(InvoiceEvent::status_changed(from, to, now));
    }

    /// Installs new line items with their precomputed totals and resets the
    /// balance to the new total.
    fn replace_line_items(&mut self, items: Vec<LineItem>, totals: Totals) {
        self.line_items = items;
        self.subtotal = totals.subtotal;
        self.total_discount = totals.total_discount;
        self.total_tax = totals.total_tax;
        self.total_amount = totals.total_amount;
        self.balance = totals.total_amount;
    }

    fn record(&mut self, event: InvoiceEvent) {
        self.pending_events.push(event);
    }
}

/// Invoice totals: sums of the already-rounded per-item figures.
#[derive(Debug, Default)]
struct Totals {
    subtotal: Money,
    total_discount: Money,
    total_tax: Money,
    total_amount: Money,
}

impl Totals {
    /// Sums `items`, failing if any amount or sum is out of range.
    fn of(items: &[LineItem]) -> Result<Self, ValidationError> {
        let out_of_range = || ValidationError::new("line_items", "invoice total out of range");
        let mut totals = Totals::default();

        for item in items {
            let b = item.checked_breakdown().ok_or_else(out_of_range)?;
            totals.subtotal = totals.subtotal.checked_add(b.subtotal).ok_or_else(out_of_range)?;
            totals.total_discount = totals
                .total_discount
                .checked_add(b.discount_amount)
                .ok_or_else(out_of_range)?;
            totals.total_tax = totals.total_tax.checked_add(b.tax_amount).ok_or_else(out_of_range)?;
            totals.total_amount = totals
                .total_amount
                .checked_add(b.total)
                .ok_or_else(out_of_range)?;
        }

        Ok(totals)
    }
}

fn validate_details(
    customer_id: CustomerId,
    issue_date: NaiveDate,
    due_date: NaiveDate,
) -> Result<(), ValidationError> {
    if customer_id.is_nil() {
        return Err(ValidationError::new("customer_id", "is required"));
    }
    if due_date < issue_date {
        return Err(ValidationError::new(
            "due_date",
            format!("{due_date} is before issue date {issue_date}"),
        ));
    }
    Ok(())
}

fn normalize_text(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
