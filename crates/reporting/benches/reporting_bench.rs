use chrono::{Duration, NaiveDate};
use common::{FixedClock, InvoiceId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Money, Payment, PaymentMethod};
use reporting::{PaymentStatistics, running_balance};
use rust_decimal_macros::dec;

/// Builds `n` payments spread over the year, in reverse date order.
fn payments(n: usize) -> Vec<Payment> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let clock = FixedClock::at_date(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    let invoice_id = InvoiceId::new();

    (0..n)
        .rev()
        .map(|i| {
            Payment::builder()
                .invoice_id(invoice_id)
                .payment_date(start + Duration::days((i % 365) as i64))
                .amount(dec!(12.34))
                .method(PaymentMethod::ALL[i % PaymentMethod::ALL.len()])
                .created_by("bench")
                .build(&clock)
                .unwrap()
        })
        .collect()
}

fn bench_running_balance(c: &mut Criterion) {
    let payments = payments(1_000);
    let total = Money::from_cents(1_234_000);

    c.bench_function("reporting/running_balance_1000", |b| {
        b.iter(|| std::hint::black_box(running_balance(total, &payments)));
    });
}

fn bench_statistics(c: &mut Criterion) {
    let payments = payments(10_000);
    let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();

    c.bench_function("reporting/statistics_10000", |b| {
        b.iter(|| std::hint::black_box(PaymentStatistics::compute(&payments, today)));
    });
}

criterion_group!(benches, bench_running_balance, bench_statistics);
criterion_main!(benches);
