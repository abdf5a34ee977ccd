//! Invoice service providing a simplified API for invoice operations.

use std::sync::Arc;

use common::{Clock, CustomerId, InvoiceId};
use store::{RecordStore, StoreError};

use crate::aggregate::Entity;
use crate::error::DomainError;
use crate::repository::{CommandResult, Repository};

use super::{
    AddLineItem, ClearLineItems, CreateInvoice, Invoice, InvoiceNumberGenerator, MarkInvoicePaid,
    RemoveLineItem, SendInvoice, UpdateInvoiceFields, UpdateLineItem,
};

/// Service for managing invoices.
///
/// Every command loads the invoice, checks the version the caller last
/// read, applies the mutation and saves it back.
pub struct InvoiceService<S: RecordStore> {
    repository: Repository<S, Invoice>,
    numbers: Arc<dyn InvoiceNumberGenerator>,
    clock: Arc<dyn Clock>,
}

impl<S: RecordStore> InvoiceService<S> {
    /// Creates a new invoice service.
    ///
    /// `clock` stamps creation times and domain events.
    pub fn new(
        store: S,
        numbers: impl InvoiceNumberGenerator + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        Self {
            repository: Repository::new(store),
            numbers: Arc::new(numbers),
            clock: Arc::new(clock),
        }
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &Repository<S, Invoice> {
        &self.repository
    }

    /// Creates a draft invoice under a freshly assigned number.
    #[tracing::instrument(skip(self))]
    pub async fn create_invoice(
        &self,
        cmd: CreateInvoice,
    ) -> Result<CommandResult<Invoice>, DomainError> {
        let invoice_number = self.numbers.next_number();

        if self
            .repository
            .exists_by_unique_key("invoice_number", &invoice_number)
            .await?
        {
            return Err(StoreError::DuplicateKey {
                kind: Invoice::kind().to_string(),
                field: "invoice_number".to_string(),
                value: invoice_number,
            }
            .into());
        }

        let invoice = Invoice::create(
            cmd.customer_id,
            cmd.issue_date,
            cmd.due_date,
            cmd.payment_terms,
            invoice_number,
            self.clock.now(),
        )?;
        let result = self.repository.create(invoice).await?;

        metrics::counter!("invoices_created_total").increment(1);
        tracing::info!(
            invoice_id = %result.aggregate.id(),
            invoice_number = result.aggregate.invoice_number(),
            "invoice created"
        );

        Ok(result)
    }

    /// Adds a line item to a draft invoice.
    #[tracing::instrument(skip(self))]
    pub async fn add_line_item(
        &self,
        cmd: AddLineItem,
    ) -> Result<CommandResult<Invoice>, DomainError> {
        let item = cmd.item.clone();
        let now = self.clock.now();

        self.repository
            .execute_command(&cmd, |invoice| invoice.add_line_item(item, now))
            .await
    }

    /// Removes a line item from a draft invoice.
    #[tracing::instrument(skip(self))]
    pub async fn remove_line_item(
        &self,
        cmd: RemoveLineItem,
    ) -> Result<CommandResult<Invoice>, DomainError> {
        let line_item_id = cmd.line_item_id;
        let now = self.clock.now();

        self.repository
            .execute_command(&cmd, |invoice| invoice.remove_line_item(line_item_id, now))
            .await
    }

    /// Replaces a line item on a draft invoice.
    #[tracing::instrument(skip(self))]
    pub async fn update_line_item(
        &self,
        cmd: UpdateLineItem,
    ) -> Result<CommandResult<Invoice>, DomainError> {
        let line_item_id = cmd.line_item_id;
        let item = cmd.item.clone();
        let now = self.clock.now();

        self.repository
            .execute_command(&cmd, |invoice| invoice.update_line_item(line_item_id, item, now))
            .await
    }

    /// Removes every line item from a draft invoice.
    #[tracing::instrument(skip(self))]
    pub async fn clear_line_items(
        &self,
        cmd: ClearLineItems,
    ) -> Result<CommandResult<Invoice>, DomainError> {
        let now = self.clock.now();

        self.repository
            .execute_command(&cmd, |invoice| invoice.clear_line_items(now))
            .await
    }

    /// Replaces the header fields of a draft invoice.
    #[tracing::instrument(skip(self))]
    pub async fn update_fields(
        &self,
        cmd: UpdateInvoiceFields,
    ) -> Result<CommandResult<Invoice>, DomainError> {
        let details = cmd.details.clone();
        let now = self.clock.now();

        self.repository
            .execute_command(&cmd, |invoice| invoice.update_fields(details, now))
            .await
    }

    /// Sends a draft invoice.
    #[tracing::instrument(skip(self))]
    pub async fn send_invoice(
        &self,
        cmd: SendInvoice,
    ) -> Result<CommandResult<Invoice>, DomainError> {
        let now = self.clock.now();
        let result = self
            .repository
            .execute_command(&cmd, |invoice| invoice.send(now))
            .await?;

        metrics::counter!("invoices_sent_total").increment(1);
        tracing::info!(
            invoice_id = %cmd.invoice_id,
            total = %result.aggregate.total_amount(),
            "invoice sent"
        );

        Ok(result)
    }

    /// Marks a sent invoice with zero balance as paid.
    #[tracing::instrument(skip(self))]
    pub async fn mark_paid(
        &self,
        cmd: MarkInvoicePaid,
    ) -> Result<CommandResult<Invoice>, DomainError> {
        let now = self.clock.now();
        let result = self
            .repository
            .execute_command(&cmd, |invoice| invoice.mark_paid(now))
            .await?;

        metrics::counter!("invoices_paid_total").increment(1);
        tracing::info!(invoice_id = %cmd.invoice_id, "invoice marked paid");

        Ok(result)
    }

    /// Loads an invoice by ID.
    ///
    /// Returns None if the invoice doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_invoice(&self, invoice_id: InvoiceId) -> Result<Option<Invoice>, DomainError> {
        self.repository.find(invoice_id.as_uuid()).await
    }

    /// Loads all invoices of a customer, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn invoices_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Invoice>, DomainError> {
        self.repository
            .load_by_tag("customer_id", &customer_id.to_string())
            .await
    }
}
