use super::client_score::{ClientScoreResult, FactorKind};
use super::config::{RiskCutoffs, ScoreWeights};
use super::domain::{RiskLevel, Trend};
use super::insights;
use super::sentiment::BlendedScore;
use serde::Serialize;

/// Tier, explanation and follow-up actions for one customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalAssessment {
    pub blended_score: f64,
    pub risk_level: RiskLevel,
    pub ranked_factors: Vec<RankedFactor>,
    pub recommendations: Vec<String>,
    pub sentiment_applied: bool,
    pub key_factors: Vec<String>,
    pub summary: String,
}

/// A factor and its weighted share of the blended score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedFactor {
    pub factor: FactorKind,
    pub contribution: f64,
}

impl RankedFactor {
    pub fn name(&self) -> &'static str {
        self.factor.name()
    }
}

/// One row of the recommendation table. Empty `risks` matches every tier and `None` matches
/// either flag value or any trend.
struct RecommendationRule {
    risks: &'static [RiskLevel],
    disputes: Option<bool>,
    recurring_delays: Option<bool>,
    overdue_balance: Option<bool>,
    trend: Option<Trend>,
    text: &'static str,
}

impl RecommendationRule {
    fn matches(&self, key: &RecommendationKey) -> bool {
        (self.risks.is_empty() || self.risks.contains(&key.risk_level))
            && self.disputes.map_or(true, |flag| flag == key.has_disputes)
            && self
                .recurring_delays
                .map_or(true, |flag| flag == key.recurring_delays)
            && self
                .overdue_balance
                .map_or(true, |flag| flag == key.has_overdue_balance)
            && self.trend.map_or(true, |trend| trend == key.trend)
    }
}

const fn rule(
    risks: &'static [RiskLevel],
    disputes: Option<bool>,
    recurring_delays: Option<bool>,
    trend: Option<Trend>,
    text: &'static str,
) -> RecommendationRule {
    RecommendationRule {
        risks,
        disputes,
        recurring_delays,
        overdue_balance: None,
        trend,
        text,
    }
}

const HIGH: &[RiskLevel] = &[RiskLevel::High];
const MEDIUM: &[RiskLevel] = &[RiskLevel::Medium];
const LOW: &[RiskLevel] = &[RiskLevel::Low];
const NOT_LOW: &[RiskLevel] = &[RiskLevel::High, RiskLevel::Medium];
const NOT_HIGH: &[RiskLevel] = &[RiskLevel::Medium, RiskLevel::Low];
const ANY: &[RiskLevel] = &[];

/// Evaluated top to bottom; every matching rule contributes its text once.
const RECOMMENDATION_RULES: &[RecommendationRule] = &[
    rule(
        HIGH,
        None,
        Some(true),
        None,
        "Recommend shortened payment terms and deposit requirement",
    ),
    rule(
        HIGH,
        Some(true),
        None,
        None,
        "Escalate disputed invoices to the account owner before accepting new work",
    ),
    rule(
        HIGH,
        None,
        None,
        None,
        "Implement stricter payment terms and late payment penalties",
    ),
    rule(HIGH, None, None, None, "Require upfront deposits for new projects"),
    rule(
        MEDIUM,
        None,
        Some(true),
        None,
        "Send automated reminders ahead of each due date",
    ),
    rule(MEDIUM, None, None, None, "Offer incentives for early payments"),
    rule(MEDIUM, None, None, None, "Monitor upcoming invoices closely"),
    rule(
        NOT_HIGH,
        Some(true),
        None,
        None,
        "Resolve open invoice disputes before the next billing cycle",
    ),
    rule(LOW, None, None, None, "Offer extended credit terms for retention"),
    rule(LOW, None, None, None, "Maintain current terms"),
    RecommendationRule {
        risks: ANY,
        disputes: None,
        recurring_delays: None,
        overdue_balance: Some(true),
        trend: None,
        text: "Propose structured payment plan for overdue amounts",
    },
    rule(
        ANY,
        None,
        None,
        Some(Trend::Declining),
        "Schedule a payment-behavior review with the customer",
    ),
    rule(
        NOT_LOW,
        None,
        None,
        Some(Trend::Improving),
        "Acknowledge improving payment behavior and revisit terms next quarter",
    ),
];

/// Lookup key for the recommendation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationKey {
    pub risk_level: RiskLevel,
    pub has_disputes: bool,
    pub recurring_delays: bool,
    /// Any outstanding balance past its due date.
    pub has_overdue_balance: bool,
    pub trend: Trend,
}

/// Maps blended scores to risk tiers and explains what drove them.
#[derive(Debug, Clone, Copy)]
pub struct RiskClassifier {
    cutoffs: RiskCutoffs,
    weights: ScoreWeights,
}

impl RiskClassifier {
    pub fn new(cutoffs: RiskCutoffs, weights: ScoreWeights) -> Self {
        Self { cutoffs, weights }
    }

    pub fn assess(&self, result: &ClientScoreResult, blended: &BlendedScore) -> FinalAssessment {
        let risk_level = self.classify(blended.blended_score);
        let ranked_factors = self.rank_factors(result, blended);
        let recommendations = self.recommendations(RecommendationKey {
            risk_level,
            has_disputes: result.has_disputes,
            recurring_delays: result.recurring_delays,
            has_overdue_balance: result.metrics.total_overdue > 0.0,
            trend: result.trend,
        });

        FinalAssessment {
            blended_score: blended.blended_score,
            risk_level,
            summary: insights::summary(blended.blended_score, risk_level, &ranked_factors),
            key_factors: insights::key_factors(result),
            ranked_factors,
            recommendations,
            sentiment_applied: blended.sentiment_applied(),
        }
    }

    /// A score that is not a number is treated as the worst tier.
    pub fn classify(&self, blended_score: f64) -> RiskLevel {
        if blended_score.is_nan() || blended_score < self.cutoffs.high_below {
            RiskLevel::High
        } else if blended_score <= self.cutoffs.low_above {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Factors ordered by absolute contribution to the blended score, ties broken by
    /// [`FactorKind`] priority.
    pub fn rank_factors(
        &self,
        result: &ClientScoreResult,
        blended: &BlendedScore,
    ) -> Vec<RankedFactor> {
        let mut ranked: Vec<RankedFactor> = result
            .factors
            .contributions(&self.weights)
            .into_iter()
            .map(|(factor, contribution)| RankedFactor {
                factor,
                contribution: contribution * blended.billing_share,
            })
            .collect();

        if let Some(contribution) = blended.sentiment_contribution {
            ranked.push(RankedFactor {
                factor: FactorKind::Sentiment,
                contribution,
            });
        }

        ranked.sort_by(|a, b| {
            b.contribution
                .abs()
                .total_cmp(&a.contribution.abs())
                .then_with(|| a.factor.cmp(&b.factor))
        });
        ranked
    }

    pub fn recommendations(&self, key: RecommendationKey) -> Vec<String> {
        RECOMMENDATION_RULES
            .iter()
            .filter(|rule| rule.matches(&key))
            .map(|rule| rule.text.to_string())
            .collect()
    }
}
