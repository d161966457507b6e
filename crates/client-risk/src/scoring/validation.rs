use super::domain::{
    CustomerBillingProfile, CustomerId, Invoice, InvoiceStatus, SentimentInput,
};
use super::error::{ScoringError, ValidationIssue};

/// Check every invoice before any math runs. The first violation wins so callers get a precise
/// pointer to the offending record.
pub(crate) fn validate_profile(profile: &CustomerBillingProfile) -> Result<(), ScoringError> {
    if profile.invoices.is_empty() {
        return Err(ScoringError::InsufficientData {
            customer_id: profile.customer_id.clone(),
        });
    }

    let mut running_total = 0.0_f64;
    for invoice in &profile.invoices {
        if invoice.customer_id != profile.customer_id {
            return Err(reject(
                profile,
                invoice,
                ValidationIssue::CustomerMismatch {
                    expected: profile.customer_id.clone(),
                    found: invoice.customer_id.clone(),
                },
            ));
        }

        if let Some(issue) = invoice_issue(invoice) {
            return Err(reject(profile, invoice, issue));
        }

        running_total += invoice.amount;
        if !running_total.is_finite() {
            return Err(reject(
                profile,
                invoice,
                ValidationIssue::TotalOutOfRange {
                    total: running_total,
                },
            ));
        }
    }

    Ok(())
}

pub(crate) fn invoice_issue(invoice: &Invoice) -> Option<ValidationIssue> {
    if !invoice.amount.is_finite() || invoice.amount <= 0.0 {
        return Some(ValidationIssue::NonPositiveAmount(invoice.amount));
    }
    if !invoice.amount_paid.is_finite() || invoice.amount_paid < 0.0 {
        return Some(ValidationIssue::NegativeAmountPaid(invoice.amount_paid));
    }
    if invoice.amount_paid > invoice.amount {
        return Some(ValidationIssue::AmountPaidExceedsAmount {
            amount: invoice.amount,
            amount_paid: invoice.amount_paid,
        });
    }
    if invoice.due_date < invoice.issue_date {
        return Some(ValidationIssue::DueBeforeIssue {
            issue_date: invoice.issue_date,
            due_date: invoice.due_date,
        });
    }

    match (invoice.status, invoice.paid_date) {
        (InvoiceStatus::Unpaid, Some(_)) => Some(ValidationIssue::PaidDateWithoutPayment),
        (InvoiceStatus::Paid | InvoiceStatus::PartiallyPaid, None) => {
            Some(ValidationIssue::MissingField("paid_date"))
        }
        _ => None,
    }
}

pub(crate) fn validate_sentiment(
    customer_id: &CustomerId,
    sentiment: &SentimentInput,
) -> Result<(), ScoringError> {
    if (0.0..=1.0).contains(&sentiment.sentiment_score) {
        Ok(())
    } else {
        Err(ScoringError::InvalidSentiment {
            customer_id: customer_id.clone(),
            score: sentiment.sentiment_score,
        })
    }
}

fn reject(
    profile: &CustomerBillingProfile,
    invoice: &Invoice,
    issue: ValidationIssue,
) -> ScoringError {
    ScoringError::Validation {
        customer_id: profile.customer_id.clone(),
        invoice_id: invoice.id.clone(),
        issue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn invoice() -> Invoice {
        let issue_date = NaiveDate::from_ymd_opt(2025, 4, 1).expect("valid date");
        Invoice {
            id: "INV-1".into(),
            customer_id: "acme".into(),
            amount: 250.0,
            issue_date,
            due_date: issue_date + chrono::Duration::days(30),
            paid_date: None,
            status: InvoiceStatus::Unpaid,
            disputed: false,
            amount_paid: 0.0,
        }
    }

    #[test]
    fn well_formed_invoice_passes() {
        assert_eq!(invoice_issue(&invoice()), None);
    }

    #[test]
    fn amount_rules_are_enforced() {
        let mut zero = invoice();
        zero.amount = 0.0;
        assert_eq!(
            invoice_issue(&zero),
            Some(ValidationIssue::NonPositiveAmount(0.0))
        );

        let mut overpaid = invoice();
        overpaid.amount_paid = 300.0;
        assert!(matches!(
            invoice_issue(&overpaid),
            Some(ValidationIssue::AmountPaidExceedsAmount { .. })
        ));

        let mut negative = invoice();
        negative.amount_paid = -1.0;
        assert_eq!(
            invoice_issue(&negative),
            Some(ValidationIssue::NegativeAmountPaid(-1.0))
        );
    }

    #[test]
    fn paid_date_must_match_status() {
        let mut paid = invoice();
        paid.status = InvoiceStatus::Paid;
        paid.amount_paid = paid.amount;
        assert_eq!(
            invoice_issue(&paid),
            Some(ValidationIssue::MissingField("paid_date"))
        );

        let mut unpaid = invoice();
        unpaid.paid_date = Some(unpaid.due_date);
        assert_eq!(
            invoice_issue(&unpaid),
            Some(ValidationIssue::PaidDateWithoutPayment)
        );
    }

    #[test]
    fn profile_rejects_foreign_invoices_with_context() {
        let mut foreign = invoice();
        foreign.id = "INV-2".into();
        foreign.customer_id = "globex".into();
        let profile = CustomerBillingProfile::new("acme", vec![invoice(), foreign]);

        match validate_profile(&profile) {
            Err(ScoringError::Validation {
                customer_id,
                invoice_id,
                issue: ValidationIssue::CustomerMismatch { .. },
            }) => {
                assert_eq!(customer_id, CustomerId::from("acme"));
                assert_eq!(invoice_id.0, "INV-2");
            }
            other => panic!("expected customer mismatch, got {other:?}"),
        }
    }

    #[test]
    fn profile_rejects_totals_beyond_f64_range() {
        let mut first = invoice();
        first.amount = 1e308;
        let mut second = invoice();
        second.id = "INV-2".into();
        second.amount = 1e308;
        let profile = CustomerBillingProfile::new("acme", vec![first, second]);

        match validate_profile(&profile) {
            Err(ScoringError::Validation {
                invoice_id,
                issue: ValidationIssue::TotalOutOfRange { total },
                ..
            }) => {
                assert_eq!(invoice_id.0, "INV-2");
                assert!(total.is_infinite());
            }
            other => panic!("expected total out of range, got {other:?}"),
        }
    }

    #[test]
    fn sentiment_bounds_are_inclusive() {
        let customer = CustomerId::from("acme");
        for score in [0.0, 1.0] {
            let sentiment = SentimentInput {
                sentiment_score: score,
                trend: Default::default(),
            };
            assert!(validate_sentiment(&customer, &sentiment).is_ok());
        }

        let sentiment = SentimentInput {
            sentiment_score: f64::NAN,
            trend: Default::default(),
        };
        assert!(validate_sentiment(&customer, &sentiment).is_err());
    }
}
