//! Invoice statements: an invoice together with its payment history.

use chrono::NaiveDate;
use common::{Clock, CustomerId, InvoiceId};
use domain::{Invoice, InvoiceStatus, Money, Payment, Repository};
use serde::Serialize;
use store::RecordStore;

use crate::running_balance::{BalanceEntry, running_balance};
use crate::statistics::PaymentStatistics;
use crate::{ReportingError, Result};

/// An invoice's current position and its payments in chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceStatement {
    pub invoice_id: InvoiceId,
    pub invoice_number: String,
    pub customer_id: CustomerId,
    pub status: InvoiceStatus,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub total_amount: Money,
    pub amount_paid: Money,
    pub balance: Money,
    pub days_overdue: i64,
    pub entries: Vec<BalanceEntry>,
}

impl InvoiceStatement {
    /// Builds a statement from an invoice and its payments as of `today`.
    pub fn new(invoice: &Invoice, payments: &[Payment], today: NaiveDate) -> Self {
        Self {
            invoice_id: invoice.id(),
            invoice_number: invoice.invoice_number().to_string(),
            customer_id: invoice.customer_id(),
            status: invoice.status(),
            issue_date: invoice.issue_date(),
            due_date: invoice.due_date(),
            total_amount: invoice.total_amount(),
            amount_paid: invoice.amount_paid(),
            balance: invoice.balance(),
            days_overdue: invoice.days_overdue(today),
            entries: running_balance(invoice.total_amount(), payments),
        }
    }

    /// Returns true if the invoice is past due and unpaid.
    pub fn is_overdue(&self) -> bool {
        self.days_overdue > 0
    }
}

/// Loads invoices and payments from a store and turns them into reports.
pub struct StatementReader<S: RecordStore, C: Clock> {
    invoices: Repository<S, Invoice>,
    payments: Repository<S, Payment>,
    clock: C,
}

impl<S, C> StatementReader<S, C>
where
    S: RecordStore + Clone,
    C: Clock,
{
    /// Creates a reader over the store invoices and payments are kept in.
    pub fn new(store: S, clock: C) -> Self {
        Self {
            invoices: Repository::new(store.clone()),
            payments: Repository::new(store),
            clock,
        }
    }
}

impl<S: RecordStore, C: Clock> StatementReader<S, C> {
    /// Builds the statement of one invoice.
    #[tracing::instrument(skip(self))]
    pub async fn statement(&self, invoice_id: InvoiceId) -> Result<InvoiceStatement> {
        let invoice = self
            .invoices
            .find_by_id(invoice_id.as_uuid())
            .await?
            .ok_or(ReportingError::InvoiceNotFound(invoice_id))?;

        self.build(&invoice).await
    }

    /// Builds statements for every invoice of a customer, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn customer_statements(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<InvoiceStatement>> {
        let invoices = self
            .invoices
            .find_by_tag("customer_id", &customer_id.to_string())
            .await?;

        let mut statements = Vec::with_capacity(invoices.len());
        for invoice in &invoices {
            statements.push(self.build(invoice).await?);
        }

        tracing::debug!(count = statements.len(), "customer statements built");
        Ok(statements)
    }

    /// Builds statements for a customer's overdue invoices, most overdue first.
    #[tracing::instrument(skip(self))]
    pub async fn overdue_statements(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<InvoiceStatement>> {
        let mut overdue: Vec<_> = self
            .customer_statements(customer_id)
            .await?
            .into_iter()
            .filter(InvoiceStatement::is_overdue)
            .collect();
        overdue.sort_by(|a, b| b.days_overdue.cmp(&a.days_overdue));
        Ok(overdue)
    }

    /// Computes collection statistics over all payments as of today.
    #[tracing::instrument(skip(self))]
    pub async fn payment_statistics(&self) -> Result<PaymentStatistics> {
        let payments = self.payments.find_all().await?;
        Ok(PaymentStatistics::compute(&payments, self.clock.today()))
    }

    async fn build(&self, invoice: &Invoice) -> Result<InvoiceStatement> {
        let payments = self
            .payments
            .find_by_tag("invoice_id", &invoice.id().to_string())
            .await?;

        Ok(InvoiceStatement::new(invoice, &payments, self.clock.today()))
    }
}
