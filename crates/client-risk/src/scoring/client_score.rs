use super::aging::{AgingBuckets, AgingCalculator};
use super::config::{ScoreWeights, ScoringConfig};
use super::domain::{CustomerBillingProfile, CustomerId, Trend};
use super::error::ScoringError;
use super::history::{BillingMetrics, PaymentHistory, PaymentHistoryAnalyzer};
use super::validation::validate_profile;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

/// Named inputs to the composite score, declared in tie-break priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    Overdue,
    OnTime,
    Aging,
    Behavioral,
    Trend,
    Sentiment,
    ProjectValue,
}

impl FactorKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Overdue => "overdue",
            Self::OnTime => "on_time",
            Self::Aging => "aging",
            Self::Behavioral => "behavioral",
            Self::Trend => "trend",
            Self::Sentiment => "sentiment",
            Self::ProjectValue => "project_value",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreFactors {
    pub overdue_score: f64,
    pub on_time_ratio: f64,
    pub aging_score: f64,
    pub behavioral_score: f64,
    pub trend_adjustment: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_value_bonus: Option<f64>,
}

impl ScoreFactors {
    /// Each factor's share of the composite score, before clamping.
    pub fn contributions(&self, weights: &ScoreWeights) -> Vec<(FactorKind, f64)> {
        let mut contributions = vec![
            (FactorKind::Overdue, self.overdue_score * weights.overdue),
            (FactorKind::OnTime, self.on_time_ratio * weights.on_time),
            (FactorKind::Aging, self.aging_score * weights.aging),
            (FactorKind::Behavioral, self.behavioral_score * weights.behavioral),
            (FactorKind::Trend, self.trend_adjustment),
        ];
        if let Some(bonus) = self.project_value_bonus {
            contributions.push((FactorKind::ProjectValue, bonus));
        }
        contributions
    }

    fn composite(&self, weights: &ScoreWeights) -> f64 {
        self.contributions(weights)
            .into_iter()
            .map(|(_, contribution)| contribution)
            .sum::<f64>()
            .clamp(0.0, 1.0)
    }
}

/// Billing-only scoring outcome for one customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientScoreResult {
    pub customer_id: CustomerId,
    pub evaluation_date: NaiveDate,
    pub client_score: f64,
    pub factors: ScoreFactors,
    pub aging_buckets: AgingBuckets,
    pub overdue_percentage: f64,
    pub trend: Trend,
    pub has_disputes: bool,
    pub recurring_delays: bool,
    pub metrics: BillingMetrics,
}

/// Stateless engine that turns an invoice history into a composite reliability score.
#[derive(Debug, Clone)]
pub struct ClientScoreEngine {
    config: ScoringConfig,
    aging: AgingCalculator,
    history: PaymentHistoryAnalyzer,
}

impl ClientScoreEngine {
    pub fn new(config: ScoringConfig) -> Self {
        let aging = AgingCalculator::new(config.aging);
        let history = PaymentHistoryAnalyzer::new(config.behavior, config.trend);
        Self {
            config,
            aging,
            history,
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(
        &self,
        profile: &CustomerBillingProfile,
        evaluation_date: NaiveDate,
    ) -> Result<ClientScoreResult, ScoringError> {
        validate_profile(profile)?;

        let history = self.history.analyze(profile, evaluation_date)?;
        let aging_buckets = self.aging.bucket(profile, evaluation_date)?;
        let factors = self.factors(&history, &aging_buckets);
        let client_score = factors.composite(&self.config.weights);

        debug!(
            customer_id = %profile.customer_id,
            invoices = profile.invoices.len(),
            client_score,
            trend = %history.trend,
            "client score computed"
        );

        Ok(ClientScoreResult {
            customer_id: profile.customer_id.clone(),
            evaluation_date,
            client_score,
            factors,
            aging_buckets,
            overdue_percentage: history.overdue_percentage,
            trend: history.trend,
            has_disputes: history.has_disputes,
            recurring_delays: history.recurring_delays,
            metrics: history.metrics,
        })
    }

    fn factors(&self, history: &PaymentHistory, aging_buckets: &AgingBuckets) -> ScoreFactors {
        let behavior = &self.config.behavior;
        let mut behavioral_score = 1.0;
        if history.has_disputes {
            behavioral_score -= behavior.dispute_penalty;
        }
        if history.recurring_delays {
            behavioral_score -= behavior.recurring_delay_penalty;
        }

        let trend_adjustment = match history.trend {
            Trend::Improving => self.config.trend.adjustment,
            Trend::Declining => -self.config.trend.adjustment,
            Trend::Stable => 0.0,
        };

        let project_value = &self.config.project_value;
        let project_value_bonus = (history.metrics.total_invoiced
            > project_value.high_value_threshold)
            .then_some(project_value.bonus);

        let severity = self
            .aging
            .severity(aging_buckets, history.metrics.total_invoiced);

        ScoreFactors {
            overdue_score: (1.0 - history.overdue_percentage).clamp(0.0, 1.0),
            on_time_ratio: history.on_time_ratio.clamp(0.0, 1.0),
            aging_score: (1.0 - severity).clamp(0.0, 1.0),
            behavioral_score: f64::max(behavioral_score, 0.0),
            trend_adjustment,
            project_value_bonus,
        }
    }
}
