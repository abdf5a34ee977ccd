//! Payment entity and its validating builder.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use common::{Clock, InvoiceId, PaymentId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::Entity;
use crate::money::Money;

use super::PaymentError;

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CreditCard,
    BankTransfer,
    Check,
    Cash,
}

impl PaymentMethod {
    /// All methods, in declaration order.
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::CreditCard,
        PaymentMethod::BankTransfer,
        PaymentMethod::Check,
        PaymentMethod::Cash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
            PaymentMethod::Check => "CHECK",
            PaymentMethod::Cash => "CASH",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PaymentError::invalid("method", format!("unknown method '{s}'")))
    }
}

/// A payment against an invoice.
///
/// Immutable once built; the only construction path is [`PaymentBuilder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    id: PaymentId,
    invoice_id: InvoiceId,
    payment_date: NaiveDate,
    amount: Money,
    method: PaymentMethod,
    reference: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    created_by: String,
    #[serde(skip)]
    sequence: u64,
}

impl Payment {
    /// Starts building a payment.
    pub fn builder() -> PaymentBuilder {
        PaymentBuilder::default()
    }

    pub fn id(&self) -> PaymentId {
        self.id
    }

    pub fn invoice_id(&self) -> InvoiceId {
        self.invoice_id
    }

    pub fn payment_date(&self) -> NaiveDate {
        self.payment_date
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    /// Position in the store's insertion order; 0 until loaded from a store.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl Entity for Payment {
    fn kind() -> &'static str {
        "Payment"
    }

    fn record_id(&self) -> Uuid {
        self.id.as_uuid()
    }

    fn tags(&self) -> Vec<(&'static str, String)> {
        vec![("invoice_id", self.invoice_id.to_string())]
    }

    fn set_sequence(&mut self, sequence: u64) {
        self.sequence = sequence;
    }
}

/// Builder for [`Payment`].
///
/// `build` checks every field and reports the first one that is missing or
/// invalid.
#[derive(Debug, Clone, Default)]
pub struct PaymentBuilder {
    invoice_id: Option<InvoiceId>,
    payment_date: Option<NaiveDate>,
    amount: Option<Decimal>,
    method: Option<PaymentMethod>,
    reference: Option<String>,
    notes: Option<String>,
    created_by: Option<String>,
}

impl PaymentBuilder {
    pub fn invoice_id(mut self, invoice_id: InvoiceId) -> Self {
        self.invoice_id = Some(invoice_id);
        self
    }

    pub fn payment_date(mut self, payment_date: NaiveDate) -> Self {
        self.payment_date = Some(payment_date);
        self
    }

    /// Sets the amount; it is rounded half-up to cents.
    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn method(mut self, method: PaymentMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }

    /// Validates the fields and builds the payment.
    ///
    /// The clock supplies "today" for the future-date check and the
    /// creation timestamp.
    pub fn build(self, clock: &impl Clock) -> Result<Payment, PaymentError> {
        let invoice_id = self
            .invoice_id
            .filter(|id| !id.is_nil())
            .ok_or_else(|| PaymentError::invalid("invoice_id", "is required"))?;

        let payment_date = self
            .payment_date
            .ok_or_else(|| PaymentError::invalid("payment_date", "is required"))?;
        let today = clock.today();
        if payment_date > today {
            return Err(PaymentError::invalid(
                "payment_date",
                format!("{payment_date} is in the future (today is {today})"),
            ));
        }

        let amount = self
            .amount
            .map(Money::new)
            .ok_or_else(|| PaymentError::invalid("amount", "is required"))?;
        if !amount.is_positive() {
            return Err(PaymentError::invalid(
                "amount",
                format!("must be greater than 0 (got {amount})"),
            ));
        }

        let method = self
            .method
            .ok_or_else(|| PaymentError::invalid("method", "is required"))?;

        let created_by = self
            .created_by
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| PaymentError::invalid("created_by", "is required"))?;

        Ok(Payment {
            id: PaymentId::new(),
            invoice_id,
            payment_date,
            amount,
            method,
            reference: self.reference.filter(|r| !r.trim().is_empty()),
            notes: self.notes.filter(|n| !n.trim().is_empty()),
            created_at: clock.now(),
            created_by,
            sequence: 0,
        })
    }
}
