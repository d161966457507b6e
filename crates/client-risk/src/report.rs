use crate::scoring::{AgingBucket, CustomerAssessment, RankedFactor};
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;

/// Flat per-customer export row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentRow {
    pub customer_id: String,
    pub evaluation_date: NaiveDate,
    pub client_score: f64,
    pub blended_score: f64,
    pub risk_level: &'static str,
    pub overdue_score: f64,
    pub on_time_ratio: f64,
    pub aging_score: f64,
    pub behavioral_score: f64,
    pub trend_adjustment: f64,
    pub project_value_bonus: f64,
    pub sentiment_applied: bool,
    pub trend: &'static str,
    pub has_disputes: bool,
    pub recurring_delays: bool,
    pub overdue_percentage: f64,
    pub total_invoiced: f64,
    pub total_overdue: f64,
    pub aging_early: f64,
    pub aging_late: f64,
    pub aging_serious: f64,
    pub aging_severe: f64,
    /// Factor names, strongest first, separated by `;`.
    pub ranked_factors: String,
    pub summary: String,
}

impl From<&CustomerAssessment> for AssessmentRow {
    fn from(value: &CustomerAssessment) -> Self {
        let result = &value.result;
        let assessment = &value.assessment;
        let buckets = &result.aging_buckets;

        Self {
            customer_id: result.customer_id.to_string(),
            evaluation_date: result.evaluation_date,
            client_score: result.client_score,
            blended_score: assessment.blended_score,
            risk_level: assessment.risk_level.label(),
            overdue_score: result.factors.overdue_score,
            on_time_ratio: result.factors.on_time_ratio,
            aging_score: result.factors.aging_score,
            behavioral_score: result.factors.behavioral_score,
            trend_adjustment: result.factors.trend_adjustment,
            project_value_bonus: result.factors.project_value_bonus.unwrap_or(0.0),
            sentiment_applied: assessment.sentiment_applied,
            trend: result.trend.label(),
            has_disputes: result.has_disputes,
            recurring_delays: result.recurring_delays,
            overdue_percentage: result.overdue_percentage,
            total_invoiced: result.metrics.total_invoiced,
            total_overdue: result.metrics.total_overdue,
            aging_early: buckets.amount(AgingBucket::Early),
            aging_late: buckets.amount(AgingBucket::Late),
            aging_serious: buckets.amount(AgingBucket::Serious),
            aging_severe: buckets.amount(AgingBucket::Severe),
            ranked_factors: assessment
                .ranked_factors
                .iter()
                .map(RankedFactor::name)
                .collect::<Vec<_>>()
                .join(";"),
            summary: assessment.summary.clone(),
        }
    }
}

/// Writes one row per assessment, preceded by a header row.
pub fn write_assessments_csv<W: Write>(
    writer: W,
    assessments: &[CustomerAssessment],
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for assessment in assessments {
        csv_writer.serialize(AssessmentRow::from(assessment))?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{CustomerBillingProfile, Invoice, InvoiceStatus, RiskAssessmentEngine};

    fn assessment() -> CustomerAssessment {
        let evaluation_date = NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date");
        let due_date = evaluation_date - chrono::Duration::days(45);
        let profile = CustomerBillingProfile::new(
            "initech",
            vec![Invoice {
                id: "INV-7".into(),
                customer_id: "initech".into(),
                amount: 900.0,
                issue_date: due_date - chrono::Duration::days(30),
                due_date,
                paid_date: None,
                status: InvoiceStatus::Unpaid,
                disputed: false,
                amount_paid: 0.0,
            }],
        );

        RiskAssessmentEngine::default()
            .assess(&profile, None, evaluation_date)
            .expect("assessment succeeds")
    }

    #[test]
    fn row_flattens_buckets_and_factors() {
        let row = AssessmentRow::from(&assessment());

        assert_eq!(row.customer_id, "initech");
        assert_eq!(row.risk_level, "High");
        assert_eq!(row.aging_late, 900.0);
        assert_eq!(row.aging_early + row.aging_serious + row.aging_severe, 0.0);
        assert_eq!(row.overdue_percentage, 1.0);
        assert!(row.ranked_factors.split(';').count() >= 5);
    }

    #[test]
    fn csv_output_has_header_and_one_row_per_customer() {
        let mut buffer = Vec::new();
        write_assessments_csv(&mut buffer, &[assessment()]).expect("csv written");
        let text = String::from_utf8(buffer).expect("utf8 output");
        let mut lines = text.lines();

        let header = lines.next().expect("header line");
        assert!(header.starts_with("customer_id,evaluation_date,client_score,blended_score"));
        assert!(header.ends_with("ranked_factors,summary"));
        let row = lines.next().expect("data row");
        assert!(row.starts_with("initech,2025-06-30,"));
        assert!(lines.next().is_none());
    }
}
