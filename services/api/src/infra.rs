use chrono::NaiveDate;
use client_risk::error::AppError;
use client_risk::scoring::{
    CustomerId, RiskAssessmentEngine, SentimentInput, SentimentOutcome, SentimentUnavailable,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) engine: Arc<RiskAssessmentEngine>,
}

/// Sentiment lookups keyed by customer, as produced by the upstream sentiment job.
pub(crate) type SentimentBook = BTreeMap<CustomerId, SentimentOutcome>;

/// Reads a `{customer_id: outcome}` JSON object. An entry that breaks the sentiment contract is
/// kept as a malformed outcome; a file that is not such an object fails the load.
pub(crate) fn load_sentiment_file(path: &Path) -> Result<SentimentBook, AppError> {
    let raw = std::fs::read_to_string(path)?;
    parse_sentiment_book(&raw).map_err(|source| AppError::SentimentFile {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_sentiment_book(raw: &str) -> Result<SentimentBook, serde_json::Error> {
    let entries: BTreeMap<CustomerId, serde_json::Value> = serde_json::from_str(raw)?;
    Ok(entries
        .into_iter()
        .map(|(customer_id, value)| (customer_id, SentimentOutcome::from_value(value)))
        .collect())
}

/// Unwraps a sentiment outcome, logging why it was dropped when the provider had nothing usable.
pub(crate) fn resolve_sentiment(
    customer_id: &CustomerId,
    outcome: Option<SentimentOutcome>,
) -> Option<SentimentInput> {
    let outcome = outcome.unwrap_or(SentimentOutcome::Unavailable {
        reason: SentimentUnavailable::NotFound,
    });

    if let SentimentOutcome::Unavailable { reason } = outcome {
        warn!(
            %customer_id,
            reason = reason.label(),
            "sentiment unavailable; scoring on billing history only"
        );
    }

    outcome.into_input()
}

/// Request-side sentiment: a payload that breaks the contract degrades to a malformed outcome
/// rather than failing the request.
pub(crate) fn deserialize_optional_sentiment<'de, D>(
    deserializer: D,
) -> Result<Option<SentimentOutcome>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.map(SentimentOutcome::from_value))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_risk::scoring::Trend;

    #[test]
    fn parse_date_reports_bad_input() {
        assert_eq!(
            parse_date(" 2025-06-30 "),
            Ok(NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date"))
        );
        assert!(parse_date("30/06/2025")
            .expect_err("wrong format rejected")
            .contains("YYYY-MM-DD"));
    }

    #[test]
    fn sentiment_book_parses_available_and_unavailable_entries() {
        let book = parse_sentiment_book(
            r#"{
                "acme": { "status": "available", "sentiment_score": 0.7, "trend": "declining" },
                "globex": { "status": "unavailable", "reason": "timeout" }
            }"#,
        )
        .expect("book parses");

        let acme = resolve_sentiment(&"acme".into(), book.get(&CustomerId::from("acme")).copied());
        assert_eq!(
            acme,
            Some(SentimentInput {
                sentiment_score: 0.7,
                trend: Trend::Declining
            })
        );
        assert_eq!(
            resolve_sentiment(&"globex".into(), book.get(&CustomerId::from("globex")).copied()),
            None
        );
        assert_eq!(resolve_sentiment(&"initech".into(), None), None);
    }

    #[test]
    fn entries_without_trend_are_malformed() {
        let book = parse_sentiment_book(
            r#"{
                "acme": { "status": "available", "sentiment_score": 0.7 },
                "globex": { "status": "available", "sentiment_score": 0.4, "trend": "stable" }
            }"#,
        )
        .expect("book parses");

        assert_eq!(
            book.get(&CustomerId::from("acme")),
            Some(&SentimentOutcome::Unavailable {
                reason: SentimentUnavailable::Malformed
            })
        );
        assert!(book
            .get(&CustomerId::from("globex"))
            .and_then(|outcome| outcome.into_input())
            .is_some());
    }

    #[test]
    fn unreadable_sentiment_file_reports_its_path() {
        let path = std::env::temp_dir().join(format!(
            "client-risk-api-{}-sentiment.json",
            std::process::id()
        ));
        std::fs::write(&path, "[1, 2, 3]").expect("scratch file written");

        let err = load_sentiment_file(&path).expect_err("array is not a sentiment book");
        std::fs::remove_file(&path).ok();

        match err {
            AppError::SentimentFile { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("expected sentiment file error, got {other:?}"),
        }
    }
}
