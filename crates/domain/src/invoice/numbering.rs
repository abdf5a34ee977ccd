//! Invoice number assignment.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of invoice numbers.
///
/// Numbers must be unique across all invoices; the store rejects duplicates
/// at save time regardless.
pub trait InvoiceNumberGenerator: Send + Sync {
    /// Returns the next unused number.
    fn next_number(&self) -> String;
}

/// Generates `INV-000001`, `INV-000002`, ... from an in-process counter.
#[derive(Debug)]
pub struct SequentialInvoiceNumbers {
    next: AtomicU64,
}

impl SequentialInvoiceNumbers {
    /// Starts at `INV-000001`.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Starts at the given sequence number.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialInvoiceNumbers {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceNumberGenerator for SequentialInvoiceNumbers {
    fn next_number(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("INV-{n:06}")
    }
}
