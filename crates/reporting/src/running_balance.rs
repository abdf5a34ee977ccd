//! Running-balance reconstruction.

use chrono::NaiveDate;
use common::PaymentId;
use domain::{Money, Payment, PaymentMethod};
use serde::Serialize;

/// Whether a payment settled the invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentClassification {
    /// The running balance reached exactly zero with this payment.
    Full,
    Partial,
}

impl PaymentClassification {
    fn for_balance(balance_after: Money) -> Self {
        if balance_after.is_zero() {
            PaymentClassification::Full
        } else {
            PaymentClassification::Partial
        }
    }
}

/// One payment and the balance it left behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceEntry {
    pub payment_id: PaymentId,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    pub amount: Money,
    pub balance_after: Money,
    pub classification: PaymentClassification,
}

/// Replays `payments` against `total_amount` in chronological order.
///
/// Payments are ordered by payment date, then creation time, then store
/// insertion sequence. Payments never loaded from a store share sequence 0
/// and keep their input order on a full tie. The result has one entry per
/// payment.
pub fn running_balance(total_amount: Money, payments: &[Payment]) -> Vec<BalanceEntry> {
    let mut ordered: Vec<&Payment> = payments.iter().collect();
    ordered.sort_by_key(|payment| {
        (
            payment.payment_date(),
            payment.created_at(),
            payment.sequence(),
        )
    });

    let mut balance = total_amount;
    ordered
        .into_iter()
        .map(|payment| {
            balance -= payment.amount();
            BalanceEntry {
                payment_id: payment.id(),
                payment_date: payment.payment_date(),
                method: payment.method(),
                amount: payment.amount(),
                balance_after: balance,
                classification: PaymentClassification::for_balance(balance),
            }
        })
        .collect()
}
