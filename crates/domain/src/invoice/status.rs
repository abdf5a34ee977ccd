//! Invoice status state machine.

use serde::{Deserialize, Serialize};

/// The status of an invoice in its lifecycle.
///
/// State transitions:
/// ```text
/// Draft ──send──► Sent ──balance reaches 0──► Paid
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum InvoiceStatus {
    /// Line items and details can be edited.
    #[default]
    Draft,

    /// Issued to the customer; line items are frozen and payments accepted.
    Sent,

    /// Fully paid (terminal state).
    Paid,
}

impl InvoiceStatus {
    /// Returns true if line items and details can be modified in this status.
    pub fn is_editable(&self) -> bool {
        matches!(self, InvoiceStatus::Draft)
    }

    /// Returns true if the invoice can be sent from this status.
    pub fn can_send(&self) -> bool {
        matches!(self, InvoiceStatus::Draft)
    }

    /// Returns true if payments can be applied in this status.
    pub fn accepts_payments(&self) -> bool {
        matches!(self, InvoiceStatus::Sent)
    }

    /// Returns true if the invoice can be marked paid from this status.
    pub fn can_mark_paid(&self) -> bool {
        matches!(self, InvoiceStatus::Sent)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Paid)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "Draft",
            InvoiceStatus::Sent => "Sent",
            InvoiceStatus::Paid => "Paid",
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_status_is_draft() {
        assert_eq!(InvoiceStatus::default(), InvoiceStatus::Draft);
    }

    #[test]
    fn only_draft_is_editable() {
        assert!(InvoiceStatus::Draft.is_editable());
        assert!(!InvoiceStatus::Sent.is_editable());
        assert!(!InvoiceStatus::Paid.is_editable());
    }

    #[test]
    fn only_sent_accepts_payments() {
        assert!(!InvoiceStatus::Draft.accepts_payments());
        assert!(InvoiceStatus::Sent.accepts_payments());
        assert!(!InvoiceStatus::Paid.accepts_payments());
    }

    #[test]
    fn transitions_never_skip_sent() {
        assert!(InvoiceStatus::Draft.can_send());
        assert!(!InvoiceStatus::Draft.can_mark_paid());
        assert!(InvoiceStatus::Sent.can_mark_paid());
        assert!(!InvoiceStatus::Paid.can_send());
        assert!(!InvoiceStatus::Paid.can_mark_paid());
    }

    #[test]
    fn paid_is_terminal() {
        assert!(!InvoiceStatus::Draft.is_terminal());
        assert!(!InvoiceStatus::Sent.is_terminal());
        assert!(InvoiceStatus::Paid.is_terminal());
    }

    #[test]
    fn display_and_serialization() {
        assert_eq!(InvoiceStatus::Sent.to_string(), "Sent");
        let json = serde_json::to_string(&InvoiceStatus::Paid).unwrap();
        assert_eq!(json, "\"Paid\"");
        let back: InvoiceStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, InvoiceStatus::Paid);
    }
}
