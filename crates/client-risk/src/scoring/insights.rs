use super::client_score::ClientScoreResult;
use super::domain::{RiskLevel, Trend};
use super::risk::RankedFactor;

const MAX_KEY_FACTORS: usize = 5;
const HIGH_OVERDUE_RATIO: f64 = 0.3;
const LOW_ON_TIME_RATIO: f64 = 0.6;

pub(crate) fn key_factors(result: &ClientScoreResult) -> Vec<String> {
    let mut observations = Vec::new();

    if result.overdue_percentage > HIGH_OVERDUE_RATIO {
        observations.push(format!(
            "High overdue amount ratio: {:.2}%",
            result.overdue_percentage * 100.0
        ));
    }

    if result.factors.on_time_ratio < LOW_ON_TIME_RATIO {
        observations.push(format!(
            "Low on-time payment ratio: {:.2}%",
            result.factors.on_time_ratio * 100.0
        ));
    }

    match result.trend {
        Trend::Declining => observations.push("Payment behavior is worsening".to_string()),
        Trend::Improving => observations.push("Payment behavior is improving".to_string()),
        Trend::Stable => {}
    }

    if result.aging_buckets.severe_amount() > 0.0 {
        observations.push(format!(
            "Has invoices overdue by more than {} days",
            result.aging_buckets.severe_after_days()
        ));
    }

    if result.has_disputes {
        observations.push(format!(
            "Disputed invoices on record: {}",
            result.metrics.disputed_invoice_count
        ));
    }

    if result.recurring_delays {
        observations.push("Recurring payment delays detected".to_string());
    }

    if observations.is_empty() {
        observations.push("Excellent payment behavior".to_string());
    }

    observations.truncate(MAX_KEY_FACTORS);
    observations
}

pub(crate) fn summary(blended_score: f64, risk_level: RiskLevel, ranked: &[RankedFactor]) -> String {
    let drivers: Vec<&str> = ranked.iter().take(2).map(RankedFactor::name).collect();
    if drivers.is_empty() {
        format!("Client score is {blended_score:.2} ({risk_level} risk)")
    } else {
        format!(
            "Client score is {blended_score:.2} ({risk_level} risk), driven by: {}",
            drivers.join(", ")
        )
    }
}
