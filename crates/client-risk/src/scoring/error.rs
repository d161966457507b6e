use super::domain::{CustomerId, InvoiceId};
use chrono::NaiveDate;

/// Error raised by the scoring engine. Validation failures carry enough context to point at the
/// offending record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("invoice {invoice_id} for customer {customer_id} is invalid: {issue}")]
    Validation {
        customer_id: CustomerId,
        invoice_id: InvoiceId,
        issue: ValidationIssue,
    },
    #[error("customer {customer_id} has no invoices to score")]
    InsufficientData { customer_id: CustomerId },
    #[error("sentiment score {score} for customer {customer_id} is outside [0, 1]")]
    InvalidSentiment { customer_id: CustomerId, score: f64 },
    #[error("invalid scoring configuration: {0}")]
    InvalidConfig(String),
}

impl ScoringError {
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ScoringError::Validation { .. } | ScoringError::InvalidSentiment { .. }
        )
    }
}

/// Specific rule an invoice record violated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationIssue {
    #[error("amount {0} must be a positive number")]
    NonPositiveAmount(f64),
    #[error("amount paid {0} must be a non-negative number")]
    NegativeAmountPaid(f64),
    #[error("amount paid {amount_paid} exceeds invoice amount {amount}")]
    AmountPaidExceedsAmount { amount: f64, amount_paid: f64 },
    #[error("due date {due_date} precedes issue date {issue_date}")]
    DueBeforeIssue {
        issue_date: NaiveDate,
        due_date: NaiveDate,
    },
    #[error("running invoice total {total} is not a finite amount")]
    TotalOutOfRange { total: f64 },
    #[error("paid date recorded on an unpaid invoice")]
    PaidDateWithoutPayment,
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("invalid value '{value}' for field '{field}'")]
    InvalidField { field: &'static str, value: String },
    #[error("invoice belongs to customer {found}, expected {expected}")]
    CustomerMismatch {
        expected: CustomerId,
        found: CustomerId,
    },
}
