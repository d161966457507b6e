use crate::scoring::{Invoice, InvoiceStatus, ValidationIssue};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};

/// One CSV row as written by the billing system export. Every cell is optional at this stage so
/// that missing values surface as precise validation issues instead of generic CSV errors.
#[derive(Debug, Deserialize)]
pub(crate) struct LedgerRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) invoice_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    customer_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    amount: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    amount_paid: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    issue_date: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    due_date: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    paid_date: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    status: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    disputed: Option<String>,
}

impl LedgerRow {
    pub(crate) fn into_invoice(self) -> Result<Invoice, ValidationIssue> {
        let id = required("invoice_id", self.invoice_id)?;
        let customer_id = required("customer_id", self.customer_id)?;
        let amount = parse_amount("amount", &required("amount", self.amount)?)?;
        let status = parse_status(&required("status", self.status)?)?;
        let issue_date = parse_date("issue_date", &required("issue_date", self.issue_date)?)?;
        let due_date = parse_date("due_date", &required("due_date", self.due_date)?)?;
        let paid_date = self
            .paid_date
            .map(|value| parse_date("paid_date", &value))
            .transpose()?;

        let amount_paid = match self.amount_paid {
            Some(value) => parse_amount("amount_paid", &value)?,
            None if status == InvoiceStatus::Paid => amount,
            None => 0.0,
        };

        let disputed = match self.disputed {
            Some(value) => parse_flag("disputed", &value)?,
            None => false,
        };

        Ok(Invoice {
            id: id.as_str().into(),
            customer_id: customer_id.into(),
            amount,
            issue_date,
            due_date,
            paid_date,
            status,
            disputed,
            amount_paid,
        })
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, ValidationIssue> {
    value.ok_or(ValidationIssue::MissingField(field))
}

fn invalid(field: &'static str, value: &str) -> ValidationIssue {
    ValidationIssue::InvalidField {
        field,
        value: value.to_string(),
    }
}

fn parse_amount(field: &'static str, value: &str) -> Result<f64, ValidationIssue> {
    let cleaned: String = value
        .chars()
        .filter(|ch| !matches!(ch, '$' | ',' | ' '))
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
        .ok_or_else(|| invalid(field, value))
}

pub(crate) fn parse_status(value: &str) -> Result<InvoiceStatus, ValidationIssue> {
    match value.trim().to_ascii_lowercase().as_str() {
        "paid" => Ok(InvoiceStatus::Paid),
        "unpaid" | "open" => Ok(InvoiceStatus::Unpaid),
        "partially_paid" | "partially paid" | "partial" => Ok(InvoiceStatus::PartiallyPaid),
        _ => Err(invalid("status", value)),
    }
}

fn parse_flag(field: &'static str, value: &str) -> Result<bool, ValidationIssue> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" => Ok(false),
        _ => Err(invalid(field, value)),
    }
}

/// Accepts plain `YYYY-MM-DD` dates as well as RFC 3339 timestamps.
pub(crate) fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationIssue> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.date_naive())
        .map_err(|_| invalid(field, value))
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_accepts_common_spellings() {
        assert_eq!(parse_status("Paid"), Ok(InvoiceStatus::Paid));
        assert_eq!(parse_status("UNPAID"), Ok(InvoiceStatus::Unpaid));
        assert_eq!(parse_status("Partially Paid"), Ok(InvoiceStatus::PartiallyPaid));
        assert_eq!(parse_status("partial"), Ok(InvoiceStatus::PartiallyPaid));
        assert!(matches!(
            parse_status("void"),
            Err(ValidationIssue::InvalidField { field: "status", .. })
        ));
    }

    #[test]
    fn dates_accept_plain_and_rfc3339_forms() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date");
        assert_eq!(parse_date("due_date", "2025-03-14"), Ok(expected));
        assert_eq!(parse_date("due_date", "2025-03-14T09:30:00Z"), Ok(expected));
        assert!(parse_date("due_date", "14/03/2025").is_err());
    }

    #[test]
    fn amounts_tolerate_currency_formatting() {
        assert_eq!(parse_amount("amount", "$12,500.75"), Ok(12_500.75));
        assert!(parse_amount("amount", "twelve").is_err());
    }
}
