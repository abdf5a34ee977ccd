//! Payment service: records payments and applies them to invoices.

use common::{Clock, InvoiceId, PaymentId};
use store::RecordStore;

use crate::error::DomainError;
use crate::invoice::{Invoice, InvoiceStatus};
use crate::repository::{CommandResult, Repository};

use super::{Payment, RecordPayment};

/// Outcome of a recorded payment.
#[derive(Debug)]
pub struct RecordedPayment {
    /// The stored payment.
    pub payment: Payment,

    /// The invoice after the payment was applied.
    pub invoice: CommandResult<Invoice>,
}

/// Service for recording and querying payments.
pub struct PaymentService<S: RecordStore, C: Clock> {
    invoices: Repository<S, Invoice>,
    payments: Repository<S, Payment>,
    clock: C,
}

impl<S, C> PaymentService<S, C>
where
    S: RecordStore + Clone,
    C: Clock,
{
    /// Creates a new payment service sharing one store for invoices and payments.
    pub fn new(store: S, clock: C) -> Self {
        Self {
            invoices: Repository::new(store.clone()),
            payments: Repository::new(store),
            clock,
        }
    }
}

impl<S: RecordStore, C: Clock> PaymentService<S, C> {
    /// Records a payment against a sent invoice.
    ///
    /// The invoice is saved first under the command's expected version; the
    /// payment is stored only once that save has succeeded.
    #[tracing::instrument(skip(self), fields(invoice_id = %cmd.invoice_id, amount = %cmd.amount))]
    pub async fn record_payment(&self, cmd: RecordPayment) -> Result<RecordedPayment, DomainError> {
        let mut builder = Payment::builder()
            .invoice_id(cmd.invoice_id)
            .payment_date(cmd.payment_date)
            .amount(cmd.amount)
            .method(cmd.method)
            .created_by(cmd.created_by.clone());
        if let Some(reference) = &cmd.reference {
            builder = builder.reference(reference.clone());
        }
        if let Some(notes) = &cmd.notes {
            builder = builder.notes(notes.clone());
        }
        let payment = builder.build(&self.clock)?;

        let amount = payment.amount();
        let now = self.clock.now();
        let invoice = self
            .invoices
            .execute_command(&cmd, |invoice| invoice.apply_payment(amount, now))
            .await?;

        self.payments.insert(&payment).await.inspect_err(|err| {
            tracing::error!(
                payment_id = %payment.id(),
                error = %err,
                "invoice updated but payment record could not be stored"
            );
        })?;

        metrics::counter!("payments_recorded_total").increment(1);
        tracing::info!(
            payment_id = %payment.id(),
            balance = %invoice.aggregate.balance(),
            "payment recorded"
        );

        if invoice.aggregate.status() == InvoiceStatus::Paid {
            metrics::counter!("invoices_paid_total").increment(1);
            tracing::info!(invoice_id = %cmd.invoice_id, "invoice fully paid");
        }

        Ok(RecordedPayment { payment, invoice })
    }

    /// Returns the payments of an invoice in the order they were recorded.
    #[tracing::instrument(skip(self))]
    pub async fn payments_for_invoice(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<Vec<Payment>, DomainError> {
        self.payments
            .find_by_tag("invoice_id", &invoice_id.to_string())
            .await
    }

    /// Returns every recorded payment, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn all_payments(&self) -> Result<Vec<Payment>, DomainError> {
        self.payments.find_all().await
    }

    /// Loads a payment by ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_payment(&self, payment_id: PaymentId) -> Result<Option<Payment>, DomainError> {
        self.payments.find_by_id(payment_id.as_uuid()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregate;
    use crate::error::ErrorKind;
    use crate::invoice::{
        AddLineItem, CreateInvoice, InvoiceService, SendInvoice, SequentialInvoiceNumbers,
    };
    use crate::line_item::LineItem;
    use crate::money::Money;
    use crate::payment::PaymentMethod;
    use chrono::NaiveDate;
    use common::{CustomerId, FixedClock};
    use rust_decimal_macros::dec;
    use store::{InMemoryRecordStore, Version};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()
    }

    struct Fixture {
        invoices: InvoiceService<InMemoryRecordStore>,
        payments: PaymentService<InMemoryRecordStore, FixedClock>,
    }

    impl Fixture {
        fn new() -> Self {
            let store = InMemoryRecordStore::new();
            let clock = FixedClock::at_date(today());
            Self {
                invoices: InvoiceService::new(
                    store.clone(),
                    SequentialInvoiceNumbers::new(),
                    clock.clone(),
                ),
                payments: PaymentService::new(store, clock),
            }
        }

        async fn sent_invoice(&self) -> (InvoiceId, Version) {
            let created = self
                .invoices
                .create_invoice(CreateInvoice::new(
                    CustomerId::new(),
                    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
                ))
                .await
                .unwrap();
            let id = created.aggregate.id();
            let item = LineItem::new("Consulting", 5, dec!(100), dec!(0), dec!(0)).unwrap();
            let added = self
                .invoices
                .add_line_item(AddLineItem::new(id, created.new_version, item))
                .await
                .unwrap();
            let sent = self
                .invoices
                .send_invoice(SendInvoice::new(id, added.new_version))
                .await
                .unwrap();
            (id, sent.new_version)
        }
    }

    fn pay(id: InvoiceId, version: Version, amount: rust_decimal::Decimal) -> RecordPayment {
        RecordPayment::new(id, version, today(), amount, PaymentMethod::Cash, "clerk")
    }

    #[tokio::test]
    async fn test_record_partial_then_full_payment() {
        let fx = Fixture::new();
        let (id, version) = fx.sent_invoice().await;

        let first = fx.payments.record_payment(pay(id, version, dec!(200))).await.unwrap();
        assert_eq!(first.invoice.aggregate.balance(), Money::from_cents(30000));
        assert_eq!(first.invoice.aggregate.status(), InvoiceStatus::Sent);

        let second = fx
            .payments
            .record_payment(pay(id, first.invoice.new_version, dec!(300)))
            .await
            .unwrap();
        assert!(second.invoice.aggregate.balance().is_zero());
        assert_eq!(second.invoice.aggregate.status(), InvoiceStatus::Paid);

        let payments = fx.payments.payments_for_invoice(id).await.unwrap();
        let ids: Vec<_> = payments.iter().map(Payment::id).collect();
        assert_eq!(ids, vec![first.payment.id(), second.payment.id()]);
        assert!(payments[0].sequence() < payments[1].sequence());
    }

    #[tokio::test]
    async fn test_overpayment_stores_nothing() {
        let fx = Fixture::new();
        let (id, version) = fx.sent_invoice().await;

        let err = fx
            .payments
            .record_payment(pay(id, version, dec!(500.01)))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
        assert!(err.is_expected());
        assert!(fx.payments.payments_for_invoice(id).await.unwrap().is_empty());
        let invoice = fx.invoices.get_invoice(id).await.unwrap().unwrap();
        assert_eq!(invoice.balance(), Money::from_cents(50000));
        assert_eq!(invoice.version(), version);
    }

    #[tokio::test]
    async fn test_stale_version_stores_nothing() {
        let fx = Fixture::new();
        let (id, version) = fx.sent_invoice().await;
        fx.payments.record_payment(pay(id, version, dec!(100))).await.unwrap();

        let err = fx
            .payments
            .record_payment(pay(id, version, dec!(100)))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::VersionConflict);
        assert_eq!(fx.payments.payments_for_invoice(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_payment_is_rejected_before_loading() {
        let fx = Fixture::new();

        let mut cmd = pay(InvoiceId::new(), Version::first(), dec!(10));
        cmd.payment_date = today().succ_opt().unwrap();
        let err = fx.payments.record_payment(cmd).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidPayment);
    }

    #[tokio::test]
    async fn test_payment_on_missing_invoice_is_not_found() {
        let fx = Fixture::new();

        let err = fx
            .payments
            .record_payment(pay(InvoiceId::new(), Version::first(), dec!(10)))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_payment_on_draft_is_invalid_operation() {
        let fx = Fixture::new();
        let created = fx
            .invoices
            .create_invoice(CreateInvoice::new(CustomerId::new(), today(), today()))
            .await
            .unwrap();

        let err = fx
            .payments
            .record_payment(pay(created.aggregate.id(), created.new_version, dec!(10)))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    }

    #[tokio::test]
    async fn test_get_payment() {
        let fx = Fixture::new();
        let (id, version) = fx.sent_invoice().await;
        let recorded = fx
            .payments
            .record_payment(pay(id, version, dec!(50)).with_reference("R-1"))
            .await
            .unwrap();

        let loaded = fx
            .payments
            .get_payment(recorded.payment.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.reference(), Some("R-1"));
        assert!(fx.payments.get_payment(PaymentId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_all_payments_spans_invoices() {
        let fx = Fixture::new();
        let (first, first_version) = fx.sent_invoice().await;
        let (second, second_version) = fx.sent_invoice().await;

        fx.payments.record_payment(pay(first, first_version, dec!(10))).await.unwrap();
        fx.payments.record_payment(pay(second, second_version, dec!(20))).await.unwrap();

        let all = fx.payments.all_payments().await.unwrap();
        let invoices: Vec<_> = all.iter().map(Payment::invoice_id).collect();
        assert_eq!(invoices, vec![first, second]);
    }
}
