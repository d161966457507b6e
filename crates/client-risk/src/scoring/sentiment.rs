use super::client_score::ClientScoreResult;
use super::config::SentimentPolicy;
use super::domain::{SentimentInput, Trend};
use super::error::ScoringError;
use super::validation::validate_sentiment;
use serde::Serialize;

/// Billing score merged with the communication signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlendedScore {
    pub blended_score: f64,
    /// Portion of the blend carried by the billing score (1.0 when sentiment is absent).
    pub billing_share: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment_contribution: Option<f64>,
    pub compounding_decline: bool,
}

impl BlendedScore {
    pub fn sentiment_applied(&self) -> bool {
        self.sentiment_contribution.is_some()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SentimentBlender {
    policy: SentimentPolicy,
}

impl SentimentBlender {
    pub fn new(policy: SentimentPolicy) -> Self {
        Self { policy }
    }

    pub fn blend(
        &self,
        result: &ClientScoreResult,
        sentiment: Option<&SentimentInput>,
    ) -> Result<BlendedScore, ScoringError> {
        let Some(sentiment) = sentiment else {
            return Ok(BlendedScore {
                blended_score: result.client_score,
                billing_share: 1.0,
                sentiment_contribution: None,
                compounding_decline: false,
            });
        };

        validate_sentiment(&result.customer_id, sentiment)?;

        let contribution = sentiment.sentiment_score * self.policy.sentiment_weight;
        let mut blended_score = result.client_score * self.policy.billing_weight + contribution;

        let compounding_decline =
            result.trend == Trend::Declining && sentiment.trend == Trend::Declining;
        if compounding_decline {
            blended_score -= self.policy.compounding_decline_penalty;
        }

        Ok(BlendedScore {
            blended_score: blended_score.clamp(0.0, 1.0),
            billing_share: self.policy.billing_weight,
            sentiment_contribution: Some(contribution),
            compounding_decline,
        })
    }
}
