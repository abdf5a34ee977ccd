//! Integration tests for statements built from stored invoices and payments.

use chrono::NaiveDate;
use common::{Clock, CustomerId, FixedClock, InvoiceId};
use domain::{
    AddLineItem, CreateInvoice, InvoiceService, InvoiceStatus, LineItem, Money, PaymentMethod,
    PaymentService, RecordPayment, SendInvoice, SequentialInvoiceNumbers,
};
use reporting::{PaymentClassification, ReportingError, StatementReader};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use store::{InMemoryRecordStore, Version};

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

struct Setup {
    invoices: InvoiceService<InMemoryRecordStore>,
    payments: PaymentService<InMemoryRecordStore, FixedClock>,
    reader: StatementReader<InMemoryRecordStore, FixedClock>,
    clock: FixedClock,
}

fn setup() -> Setup {
    let store = InMemoryRecordStore::new();
    let clock = FixedClock::at_date(date(3, 1));
    Setup {
        invoices: InvoiceService::new(
            store.clone(),
            SequentialInvoiceNumbers::new(),
            clock.clone(),
        ),
        payments: PaymentService::new(store.clone(), clock.clone()),
        reader: StatementReader::new(store, clock.clone()),
        clock,
    }
}

async fn sent_invoice(
    setup: &Setup,
    customer_id: CustomerId,
    due: NaiveDate,
    amount: Decimal,
) -> (InvoiceId, Version) {
    let created = setup
        .invoices
        .create_invoice(CreateInvoice::new(customer_id, date(1, 1), due))
        .await
        .unwrap();
    let id = created.aggregate.id();
    let item = LineItem::new("Retainer", 1, amount, dec!(0), dec!(0)).unwrap();
    let added = setup
        .invoices
        .add_line_item(AddLineItem::new(id, created.new_version, item))
        .await
        .unwrap();
    let sent = setup
        .invoices
        .send_invoice(SendInvoice::new(id, added.new_version))
        .await
        .unwrap();
    (id, sent.new_version)
}

async fn pay(
    setup: &Setup,
    id: InvoiceId,
    version: Version,
    on: NaiveDate,
    amount: Decimal,
    method: PaymentMethod,
) -> Version {
    setup
        .payments
        .record_payment(RecordPayment::new(id, version, on, amount, method, "clerk"))
        .await
        .unwrap()
        .invoice
        .new_version
}

#[tokio::test]
async fn statement_orders_payments_by_date() {
    let setup = setup();
    let customer = CustomerId::new();
    let (id, version) = sent_invoice(&setup, customer, date(1, 31), dec!(500)).await;

    // Recorded out of chronological order.
    let version = pay(&setup, id, version, date(2, 15), dec!(300), PaymentMethod::Cash).await;
    pay(&setup, id, version, date(2, 1), dec!(200), PaymentMethod::Check).await;

    let statement = setup.reader.statement(id).await.unwrap();

    assert_eq!(statement.status, InvoiceStatus::Paid);
    assert!(statement.balance.is_zero());
    assert_eq!(statement.days_overdue, 0);
    let dates: Vec<_> = statement.entries.iter().map(|e| e.payment_date).collect();
    assert_eq!(dates, vec![date(2, 1), date(2, 15)]);
    assert_eq!(statement.entries[0].balance_after, Money::from_cents(30000));
    assert_eq!(
        statement.entries[0].classification,
        PaymentClassification::Partial
    );
    assert_eq!(
        statement.entries[1].classification,
        PaymentClassification::Full
    );
}

#[tokio::test]
async fn overdue_statements_are_sorted_by_lateness() {
    let setup = setup();
    let customer = CustomerId::new();
    let (slightly_late, _) = sent_invoice(&setup, customer, date(2, 20), dec!(100)).await;
    let (very_late, _) = sent_invoice(&setup, customer, date(1, 15), dec!(100)).await;
    let (not_due, _) = sent_invoice(&setup, customer, date(3, 31), dec!(100)).await;
    let (paid, version) = sent_invoice(&setup, customer, date(1, 10), dec!(100)).await;
    pay(&setup, paid, version, date(1, 5), dec!(100), PaymentMethod::Cash).await;

    let overdue = setup.reader.overdue_statements(customer).await.unwrap();

    let ids: Vec<_> = overdue.iter().map(|s| s.invoice_id).collect();
    assert_eq!(ids, vec![very_late, slightly_late]);
    assert_eq!(overdue[0].days_overdue, 46);

    let all = setup.reader.customer_statements(customer).await.unwrap();
    assert_eq!(all.len(), 4);
    assert!(all.iter().any(|s| s.invoice_id == not_due));
}

#[tokio::test]
async fn payment_statistics_use_clock_today() {
    let setup = setup();
    let (id, version) = sent_invoice(&setup, CustomerId::new(), date(3, 31), dec!(1000)).await;
    let version = pay(&setup, id, version, date(3, 1), dec!(100), PaymentMethod::Cash).await;
    let version = pay(&setup, id, version, date(2, 10), dec!(200), PaymentMethod::CreditCard).await;
    pay(&setup, id, version, date(1, 5), dec!(50), PaymentMethod::Cash).await;

    let stats = setup.reader.payment_statistics().await.unwrap();

    assert_eq!(setup.clock.today(), date(3, 1));
    assert_eq!(stats.payment_count, 3);
    assert_eq!(stats.total_collected, Money::from_cents(35000));
    assert_eq!(stats.collected_today, Money::from_cents(10000));
    assert_eq!(stats.collected_this_month, Money::from_cents(10000));
    assert_eq!(stats.collected_this_year, Money::from_cents(35000));
    assert_eq!(stats.collected_by(PaymentMethod::Cash), Money::from_cents(15000));
}

#[tokio::test]
async fn missing_invoice_is_reported() {
    let setup = setup();
    let missing = InvoiceId::new();

    let err = setup.reader.statement(missing).await.unwrap_err();

    assert!(matches!(err, ReportingError::InvoiceNotFound(id) if id == missing));
}

#[tokio::test]
async fn statement_serializes_for_export() {
    let setup = setup();
    let (id, version) = sent_invoice(&setup, CustomerId::new(), date(3, 31), dec!(80)).await;
    pay(&setup, id, version, date(2, 1), dec!(30), PaymentMethod::BankTransfer).await;

    let statement = setup.reader.statement(id).await.unwrap();
    let json = serde_json::to_value(&statement).unwrap();

    assert_eq!(json["invoice_number"], "INV-000001");
    assert_eq!(json["entries"][0]["classification"], "PARTIAL");
    assert_eq!(json["entries"][0]["method"], "BANK_TRANSFER");
}
