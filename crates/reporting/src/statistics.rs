//! Collection statistics over a set of payments.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use domain::{Money, Payment, PaymentMethod};
use serde::Serialize;

/// Totals collected, by period and by payment method.
///
/// Periods are calendar periods containing `today`, judged by payment date.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PaymentStatistics {
    pub payment_count: usize,
    pub total_collected: Money,
    pub collected_today: Money,
    pub collected_this_month: Money,
    pub collected_this_year: Money,
    pub by_method: BTreeMap<PaymentMethod, Money>,
}

impl PaymentStatistics {
    /// Reduces `payments` to totals relative to `today`.
    pub fn compute<'a>(payments: impl IntoIterator<Item = &'a Payment>, today: NaiveDate) -> Self {
        let mut stats = Self::default();

        for payment in payments {
            let amount = payment.amount();
            let date = payment.payment_date();

            stats.payment_count += 1;
            stats.total_collected += amount;
            *stats.by_method.entry(payment.method()).or_default() += amount;

            if date.year() == today.year() {
                stats.collected_this_year += amount;
                if date.month() == today.month() {
                    stats.collected_this_month += amount;
                    if date.day() == today.day() {
                        stats.collected_today += amount;
                    }
                }
            }
        }

        stats
    }

    /// Returns the total collected through `method`, zero if none.
    pub fn collected_by(&self, method: PaymentMethod) -> Money {
        self.by_method.get(&method).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{FixedClock, InvoiceId};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn payment(on: NaiveDate, amount: Decimal, method: PaymentMethod) -> Payment {
        Payment::builder()
            .invoice_id(InvoiceId::new())
            .payment_date(on)
            .amount(amount)
            .method(method)
            .created_by("clerk")
            .build(&FixedClock::at_date(date(2024, 12, 31)))
            .unwrap()
    }

    #[test]
    fn totals_by_period_and_method() {
        let today = date(2024, 6, 15);
        let payments = vec![
            payment(today, dec!(100), PaymentMethod::Cash),
            payment(date(2024, 6, 1), dec!(50), PaymentMethod::Cash),
            payment(date(2024, 2, 10), dec!(25.50), PaymentMethod::CreditCard),
            payment(date(2023, 6, 15), dec!(1000), PaymentMethod::BankTransfer),
        ];

        let stats = PaymentStatistics::compute(&payments, today);

        assert_eq!(stats.payment_count, 4);
        assert_eq!(stats.total_collected, Money::from_cents(117550));
        assert_eq!(stats.collected_today, Money::from_cents(10000));
        assert_eq!(stats.collected_this_month, Money::from_cents(15000));
        assert_eq!(stats.collected_this_year, Money::from_cents(17550));
        assert_eq!(stats.collected_by(PaymentMethod::Cash), Money::from_cents(15000));
        assert_eq!(stats.collected_by(PaymentMethod::CreditCard), Money::from_cents(2550));
        assert_eq!(stats.collected_by(PaymentMethod::BankTransfer), Money::from_cents(100000));
        assert!(stats.collected_by(PaymentMethod::Check).is_zero());
    }

    #[test]
    fn empty_set_is_all_zero() {
        let stats = PaymentStatistics::compute(&Vec::<Payment>::new(), date(2024, 1, 1));
        assert_eq!(stats, PaymentStatistics::default());
    }
}
