use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier wrapper for billing customers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub String);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CustomerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CustomerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identifier wrapper for invoices.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub String);

impl fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InvoiceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Paid,
    Unpaid,
    PartiallyPaid,
}

impl InvoiceStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Paid => "Paid",
            Self::Unpaid => "Unpaid",
            Self::PartiallyPaid => "Partially Paid",
        }
    }

    /// Statuses that record a payment event and therefore count toward the on-time ratio.
    pub const fn records_payment(self) -> bool {
        matches!(self, Self::Paid | Self::PartiallyPaid)
    }
}

/// Immutable invoice record supplied by the storage collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub customer_id: CustomerId,
    pub amount: f64,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<NaiveDate>,
    pub status: InvoiceStatus,
    #[serde(default)]
    pub disputed: bool,
    #[serde(default)]
    pub amount_paid: f64,
}

impl Invoice {
    /// Amount still owed on the invoice, never negative.
    pub fn outstanding(&self) -> f64 {
        (self.amount - self.amount_paid).max(0.0)
    }

    /// Outstanding remainder that aging and overdue totals consider; zero once marked paid.
    pub fn open_balance(&self) -> f64 {
        if self.status == InvoiceStatus::Paid {
            0.0
        } else {
            self.outstanding()
        }
    }

    pub fn days_past_due(&self, evaluation_date: NaiveDate) -> i64 {
        (evaluation_date - self.due_date).num_days().max(0)
    }

    pub fn paid_on_time(&self) -> Option<bool> {
        if !self.status.records_payment() {
            return None;
        }
        self.paid_date.map(|paid| paid <= self.due_date)
    }
}

/// A customer's invoices gathered for one scoring pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerBillingProfile {
    pub customer_id: CustomerId,
    pub invoices: Vec<Invoice>,
}

impl CustomerBillingProfile {
    pub fn new(customer_id: impl Into<CustomerId>, invoices: Vec<Invoice>) -> Self {
        Self {
            customer_id: customer_id.into(),
            invoices,
        }
    }

    pub fn total_invoiced(&self) -> f64 {
        self.invoices.iter().map(|invoice| invoice.amount).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    #[default]
    Stable,
}

impl Trend {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Declining => "declining",
            Self::Stable => "stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Communication sentiment produced by the external sentiment collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentInput {
    pub sentiment_score: f64,
    pub trend: Trend,
}

/// Why the sentiment collaborator could not supply a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentUnavailable {
    Timeout,
    Malformed,
    QuotaExceeded,
    NotFound,
}

impl SentimentUnavailable {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Timeout => "timed out",
            Self::Malformed => "malformed response",
            Self::QuotaExceeded => "quota exceeded",
            Self::NotFound => "no communication history",
        }
    }
}

/// Result of a sentiment lookup. Any unavailable outcome degrades to billing-only scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SentimentOutcome {
    Available(SentimentInput),
    Unavailable { reason: SentimentUnavailable },
}

impl SentimentOutcome {
    /// Decodes one provider payload. Anything that does not match the contract, including a
    /// missing `trend`, becomes [`SentimentUnavailable::Malformed`].
    pub fn from_value(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or(Self::Unavailable {
            reason: SentimentUnavailable::Malformed,
        })
    }

    pub fn into_input(self) -> Option<SentimentInput> {
        match self {
            Self::Available(input) => Some(input),
            Self::Unavailable { .. } => None,
        }
    }
}
