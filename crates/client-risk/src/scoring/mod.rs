//! Billing risk scoring: aging, payment history, composite score, sentiment blend and risk tier.
//!
//! Every component is a pure function over in-memory invoices and an explicit evaluation date.
//! [`RiskAssessmentEngine`] wires them together for one customer at a time and can be shared
//! across threads.

pub mod aging;
pub mod client_score;
pub mod config;
pub mod domain;
pub mod error;
pub mod history;
mod insights;
pub mod risk;
pub mod sentiment;
pub(crate) mod validation;

pub use aging::{AgingBucket, AgingBuckets, AgingCalculator};
pub use client_score::{ClientScoreEngine, ClientScoreResult, FactorKind, ScoreFactors};
pub use config::{
    AgingNormalization, AgingPolicy, BehaviorPolicy, ProjectValuePolicy, RiskCutoffs,
    ScoreWeights, ScoringConfig, SentimentPolicy, TrendPolicy,
};
pub use domain::{
    CustomerBillingProfile, CustomerId, Invoice, InvoiceId, InvoiceStatus, RiskLevel,
    SentimentInput, SentimentOutcome, SentimentUnavailable, Trend,
};
pub use error::{ScoringError, ValidationIssue};
pub use history::{BillingMetrics, PaymentHistory, PaymentHistoryAnalyzer};
pub use risk::{FinalAssessment, RankedFactor, RecommendationKey, RiskClassifier};
pub use sentiment::{BlendedScore, SentimentBlender};

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::debug;

/// Billing score and final classification for one customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerAssessment {
    pub result: ClientScoreResult,
    pub assessment: FinalAssessment,
}

/// Runs the full scoring pipeline with a single validated configuration.
#[derive(Debug, Clone)]
pub struct RiskAssessmentEngine {
    scorer: ClientScoreEngine,
    blender: SentimentBlender,
    classifier: RiskClassifier,
}

impl RiskAssessmentEngine {
    pub fn new(config: ScoringConfig) -> Result<Self, ScoringError> {
        config.validate()?;
        let blender = SentimentBlender::new(config.sentiment);
        let classifier = RiskClassifier::new(config.risk, config.weights);
        Ok(Self {
            scorer: ClientScoreEngine::new(config),
            blender,
            classifier,
        })
    }

    pub fn config(&self) -> &ScoringConfig {
        self.scorer.config()
    }

    pub fn score(
        &self,
        profile: &CustomerBillingProfile,
        evaluation_date: NaiveDate,
    ) -> Result<ClientScoreResult, ScoringError> {
        self.scorer.score(profile, evaluation_date)
    }

    /// Blend and classify an existing billing result.
    pub fn finalize(
        &self,
        result: &ClientScoreResult,
        sentiment: Option<&SentimentInput>,
    ) -> Result<FinalAssessment, ScoringError> {
        let blended = self.blender.blend(result, sentiment)?;
        Ok(self.classifier.assess(result, &blended))
    }

    pub fn assess(
        &self,
        profile: &CustomerBillingProfile,
        sentiment: Option<&SentimentInput>,
        evaluation_date: NaiveDate,
    ) -> Result<CustomerAssessment, ScoringError> {
        let result = self.score(profile, evaluation_date)?;
        let assessment = self.finalize(&result, sentiment)?;

        debug!(
            customer_id = %result.customer_id,
            blended_score = assessment.blended_score,
            risk_level = %assessment.risk_level,
            sentiment_applied = assessment.sentiment_applied,
            "customer assessed"
        );

        Ok(CustomerAssessment { result, assessment })
    }

    /// [`Self::assess`] evaluated against today's local date.
    pub fn assess_now(
        &self,
        profile: &CustomerBillingProfile,
        sentiment: Option<&SentimentInput>,
    ) -> Result<CustomerAssessment, ScoringError> {
        self.assess(profile, sentiment, Local::now().date_naive())
    }
}

impl Default for RiskAssessmentEngine {
    fn default() -> Self {
        let config = ScoringConfig::default();
        Self {
            blender: SentimentBlender::new(config.sentiment),
            classifier: RiskClassifier::new(config.risk, config.weights),
            scorer: ClientScoreEngine::new(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn evaluation_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date")
    }

    fn paid_late(id: &str, due_offset: i64, delay: i64) -> Invoice {
        let due_date = evaluation_date() - Duration::days(due_offset);
        Invoice {
            id: id.into(),
            customer_id: "globex".into(),
            amount: 2_000.0,
            issue_date: due_date - Duration::days(30),
            due_date,
            paid_date: Some(due_date + Duration::days(delay)),
            status: InvoiceStatus::Paid,
            disputed: false,
            amount_paid: 2_000.0,
        }
    }

    fn open(id: &str, due_offset: i64) -> Invoice {
        let mut invoice = paid_late(id, due_offset, 0);
        invoice.amount = 4_000.0;
        invoice.status = InvoiceStatus::Unpaid;
        invoice.paid_date = None;
        invoice.amount_paid = 0.0;
        invoice
    }

    #[test]
    fn engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RiskAssessmentEngine>();
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let mut config = ScoringConfig::default();
        config.risk.high_below = 0.9;
        config.risk.low_above = 0.4;

        let err = RiskAssessmentEngine::new(config).expect_err("unordered cutoffs rejected");
        assert!(matches!(err, ScoringError::InvalidConfig(_)));
    }

    #[test]
    fn troubled_customer_is_high_risk_with_explanations() {
        let mut disputed = open("open-2", 95);
        disputed.disputed = true;
        let profile = CustomerBillingProfile::new(
            "globex",
            vec![
                paid_late("paid-1", 150, 0),
                paid_late("paid-2", 120, 20),
                paid_late("paid-3", 100, 14),
                open("open-1", 70),
                disputed,
            ],
        );

        let assessed = RiskAssessmentEngine::default()
            .assess(&profile, None, evaluation_date())
            .expect("assessment succeeds");
        let assessment = &assessed.assessment;

        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert!(!assessment.sentiment_applied);
        assert_eq!(
            assessment.recommendations[0],
            "Recommend shortened payment terms and deposit requirement"
        );
        assert_eq!(
            assessment.key_factors,
            vec![
                "High overdue amount ratio: 57.14%".to_string(),
                "Low on-time payment ratio: 33.33%".to_string(),
                "Payment behavior is worsening".to_string(),
                "Has invoices overdue by more than 60 days".to_string(),
                "Disputed invoices on record: 1".to_string(),
            ]
        );
        assert!(assessment
            .recommendations
            .iter()
            .any(|text| text == "Propose structured payment plan for overdue amounts"));
        assert!(assessed.result.recurring_delays);
        assert!(assessment
            .summary
            .starts_with(&format!("Client score is {:.2} (High risk)", assessment.blended_score)));
    }

    #[test]
    fn clean_customer_gets_excellent_observation() {
        let profile = CustomerBillingProfile::new(
            "globex",
            vec![paid_late("a", 60, -1), paid_late("b", 30, 0)],
        );
        let sentiment = SentimentInput {
            sentiment_score: 0.9,
            trend: Trend::Stable,
        };

        let assessed = RiskAssessmentEngine::default()
            .assess(&profile, Some(&sentiment), evaluation_date())
            .expect("assessment succeeds");

        assert_eq!(assessed.assessment.risk_level, RiskLevel::Low);
        assert!(assessed.assessment.sentiment_applied);
        assert_eq!(
            assessed.assessment.key_factors,
            vec!["Excellent payment behavior".to_string()]
        );
        assert_eq!(
            assessed.assessment.ranked_factors[0].factor,
            FactorKind::Overdue
        );
    }
}
