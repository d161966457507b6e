use super::error::ScoringError;
use serde::{Deserialize, Serialize};

/// Policy constants driving every scoring stage. Defaults reproduce the documented policy;
/// callers may override any subset per deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoreWeights,
    pub aging: AgingPolicy,
    pub behavior: BehaviorPolicy,
    pub trend: TrendPolicy,
    pub project_value: ProjectValuePolicy,
    pub sentiment: SentimentPolicy,
    pub risk: RiskCutoffs,
}

/// Weights of the four primary sub-scores; they must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub overdue: f64,
    pub on_time: f64,
    pub aging: f64,
    pub behavioral: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            overdue: 0.40,
            on_time: 0.25,
            aging: 0.20,
            behavioral: 0.15,
        }
    }
}

impl ScoreWeights {
    pub fn total(&self) -> f64 {
        self.overdue + self.on_time + self.aging + self.behavioral
    }
}

/// Denominator used when turning bucket severity into the aging score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgingNormalization {
    /// Severity is the amount-weighted average over overdue balances. Adding overdue money to a
    /// milder bucket can lower it, so scores are not monotone in overdue amounts.
    Outstanding,
    /// Severity is measured against everything the customer was invoiced; more overdue money
    /// never lowers it.
    #[default]
    Invoiced,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgingPolicy {
    /// Inclusive upper day bounds of the first three buckets; anything beyond lands in the last.
    pub bucket_upper_bounds: [i64; 3],
    pub severity_weights: [f64; 4],
    pub normalization: AgingNormalization,
}

impl Default for AgingPolicy {
    fn default() -> Self {
        Self {
            bucket_upper_bounds: [30, 60, 90],
            severity_weights: [0.1, 0.3, 0.6, 1.0],
            normalization: AgingNormalization::Invoiced,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorPolicy {
    pub dispute_penalty: f64,
    pub recurring_delay_penalty: f64,
    /// Number of most recent paid invoices inspected for late payments.
    pub recurring_delay_lookback: usize,
    /// Late payments within the lookback that mark a recurring delay.
    pub recurring_delay_min_late: usize,
}

impl Default for BehaviorPolicy {
    fn default() -> Self {
        Self {
            dispute_penalty: 0.15,
            recurring_delay_penalty: 0.10,
            recurring_delay_lookback: 3,
            recurring_delay_min_late: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendPolicy {
    pub margin: f64,
    pub min_invoices: usize,
    pub adjustment: f64,
}

impl Default for TrendPolicy {
    fn default() -> Self {
        Self {
            margin: 0.1,
            min_invoices: 4,
            adjustment: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectValuePolicy {
    pub high_value_threshold: f64,
    pub bonus: f64,
}

impl Default for ProjectValuePolicy {
    fn default() -> Self {
        Self {
            high_value_threshold: 500_000.0,
            bonus: 0.02,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentPolicy {
    pub billing_weight: f64,
    pub sentiment_weight: f64,
    pub compounding_decline_penalty: f64,
}

impl Default for SentimentPolicy {
    fn default() -> Self {
        Self {
            billing_weight: 0.70,
            sentiment_weight: 0.30,
            compounding_decline_penalty: 0.03,
        }
    }
}

/// Blended-score cutoffs: below `high_below` is High risk, above `low_above` is Low risk,
/// anything in between (inclusive) is Medium.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskCutoffs {
    pub high_below: f64,
    pub low_above: f64,
}

impl Default for RiskCutoffs {
    fn default() -> Self {
        Self {
            high_below: 0.50,
            low_above: 0.70,
        }
    }
}

const WEIGHT_TOLERANCE: f64 = 1e-6;

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ScoringError> {
        let weights = [
            self.weights.overdue,
            self.weights.on_time,
            self.weights.aging,
            self.weights.behavioral,
        ];
        if weights.iter().any(|weight| !weight.is_finite() || *weight < 0.0) {
            return Err(invalid("score weights must be finite and non-negative"));
        }
        if (self.weights.total() - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(invalid(format!(
                "score weights must sum to 1.0 (got {:.4})",
                self.weights.total()
            )));
        }

        let [first, second, third] = self.aging.bucket_upper_bounds;
        if first < 0 || first >= second || second >= third {
            return Err(invalid(
                "aging bucket bounds must be non-negative and strictly increasing",
            ));
        }
        if self
            .aging
            .severity_weights
            .iter()
            .any(|weight| !(0.0..=1.0).contains(weight))
        {
            return Err(invalid("aging severity weights must lie in [0, 1]"));
        }

        let behavior = &self.behavior;
        if !(0.0..=1.0).contains(&behavior.dispute_penalty)
            || !(0.0..=1.0).contains(&behavior.recurring_delay_penalty)
        {
            return Err(invalid("behavioral penalties must lie in [0, 1]"));
        }
        if behavior.recurring_delay_lookback == 0 {
            return Err(invalid("recurring delay lookback must be at least 1"));
        }
        if behavior.recurring_delay_min_late == 0
            || behavior.recurring_delay_min_late > behavior.recurring_delay_lookback
        {
            return Err(invalid(
                "recurring delay threshold must be between 1 and the lookback window",
            ));
        }

        if !self.trend.margin.is_finite() || self.trend.margin < 0.0 {
            return Err(invalid("trend margin must be non-negative"));
        }
        if self.trend.min_invoices < 2 {
            return Err(invalid("trend detection needs at least 2 invoices"));
        }
        if !(0.0..=1.0).contains(&self.trend.adjustment) {
            return Err(invalid("trend adjustment must lie in [0, 1]"));
        }

        if !(0.0..=1.0).contains(&self.project_value.bonus)
            || !self.project_value.high_value_threshold.is_finite()
        {
            return Err(invalid("project value bonus must lie in [0, 1]"));
        }

        let sentiment = &self.sentiment;
        if sentiment.billing_weight < 0.0
            || sentiment.sentiment_weight < 0.0
            || (sentiment.billing_weight + sentiment.sentiment_weight - 1.0).abs()
                > WEIGHT_TOLERANCE
        {
            return Err(invalid(
                "sentiment blend weights must be non-negative and sum to 1.0",
            ));
        }
        if !(0.0..=1.0).contains(&sentiment.compounding_decline_penalty) {
            return Err(invalid("compounding decline penalty must lie in [0, 1]"));
        }

        let risk = &self.risk;
        if !(0.0..=1.0).contains(&risk.high_below)
            || !(0.0..=1.0).contains(&risk.low_above)
            || risk.high_below > risk.low_above
        {
            return Err(invalid(
                "risk cutoffs must lie in [0, 1] with high_below <= low_above",
            ));
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ScoringError {
    ScoringError::InvalidConfig(message.into())
}
