use super::config::{AgingNormalization, AgingPolicy};
use super::domain::{CustomerBillingProfile, Invoice};
use super::error::{ScoringError, ValidationIssue};
use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// The four fixed aging ranges, ordered from least to most overdue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgingBucket {
    Early,
    Late,
    Serious,
    Severe,
}

impl AgingBucket {
    pub const fn ordered() -> [Self; 4] {
        [Self::Early, Self::Late, Self::Serious, Self::Severe]
    }

    const fn index(self) -> usize {
        match self {
            Self::Early => 0,
            Self::Late => 1,
            Self::Serious => 2,
            Self::Severe => 3,
        }
    }
}

/// Outstanding overdue amounts and invoice counts split by days past due.
#[derive(Debug, Clone, PartialEq)]
pub struct AgingBuckets {
    bounds: [i64; 3],
    amounts: [f64; 4],
    counts: [usize; 4],
}

impl AgingBuckets {
    pub fn empty(policy: &AgingPolicy) -> Self {
        Self {
            bounds: policy.bucket_upper_bounds,
            amounts: [0.0; 4],
            counts: [0; 4],
        }
    }

    pub fn amount(&self, bucket: AgingBucket) -> f64 {
        self.amounts[bucket.index()]
    }

    /// Number of overdue invoices whose balance landed in `bucket`.
    pub fn count(&self, bucket: AgingBucket) -> usize {
        self.counts[bucket.index()]
    }

    /// Human label such as `0-30`, `31-60`, `61-90` or `90+` for the default bounds.
    pub fn label(&self, bucket: AgingBucket) -> String {
        let [first, second, third] = self.bounds;
        match bucket {
            AgingBucket::Early => format!("0-{first}"),
            AgingBucket::Late => format!("{}-{second}", first + 1),
            AgingBucket::Serious => format!("{}-{third}", second + 1),
            AgingBucket::Severe => format!("{third}+"),
        }
    }

    pub fn total(&self) -> f64 {
        self.amounts.iter().sum()
    }

    /// Amount sitting beyond the second bound (61+ days with the default bounds).
    pub fn severe_amount(&self) -> f64 {
        self.amount(AgingBucket::Serious) + self.amount(AgingBucket::Severe)
    }

    pub fn severe_after_days(&self) -> i64 {
        self.bounds[1]
    }

    pub fn entries(&self) -> impl Iterator<Item = (AgingBucket, String, f64)> + '_ {
        AgingBucket::ordered()
            .into_iter()
            .map(|bucket| (bucket, self.label(bucket), self.amount(bucket)))
    }

    pub fn bucket_for(&self, days_overdue: i64) -> AgingBucket {
        let [first, second, third] = self.bounds;
        if days_overdue <= first {
            AgingBucket::Early
        } else if days_overdue <= second {
            AgingBucket::Late
        } else if days_overdue <= third {
            AgingBucket::Serious
        } else {
            AgingBucket::Severe
        }
    }

    fn add(&mut self, days_overdue: i64, amount: f64) {
        let bucket = self.bucket_for(days_overdue);
        self.amounts[bucket.index()] += amount;
        self.counts[bucket.index()] += 1;
    }
}

impl Serialize for AgingBuckets {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        for (bucket, label, amount) in self.entries() {
            let summary = BucketSummary {
                count: self.count(bucket),
                amount,
            };
            map.serialize_entry(&label, &summary)?;
        }
        map.end()
    }
}

#[derive(serde::Serialize)]
struct BucketSummary {
    count: usize,
    amount: f64,
}

/// Days past due and remaining balance for an invoice that is overdue on `evaluation_date`.
/// Invoices that are settled, fully paid or not yet past their due date yield `None`.
pub(crate) fn overdue_balance(
    invoice: &Invoice,
    evaluation_date: NaiveDate,
) -> Option<(i64, f64)> {
    let balance = invoice.open_balance();
    let days = invoice.days_past_due(evaluation_date);
    if balance > 0.0 && days > 0 {
        Some((days, balance))
    } else {
        None
    }
}

/// Buckets each customer's overdue balances by how long they have been past due.
#[derive(Debug, Clone, Copy)]
pub struct AgingCalculator {
    policy: AgingPolicy,
}

impl AgingCalculator {
    pub fn new(policy: AgingPolicy) -> Self {
        Self { policy }
    }

    pub fn bucket(
        &self,
        profile: &CustomerBillingProfile,
        evaluation_date: NaiveDate,
    ) -> Result<AgingBuckets, ScoringError> {
        let mut buckets = AgingBuckets::empty(&self.policy);

        for invoice in &profile.invoices {
            if invoice.amount_paid > invoice.amount {
                return Err(ScoringError::Validation {
                    customer_id: profile.customer_id.clone(),
                    invoice_id: invoice.id.clone(),
                    issue: ValidationIssue::AmountPaidExceedsAmount {
                        amount: invoice.amount,
                        amount_paid: invoice.amount_paid,
                    },
                });
            }

            if let Some((days, balance)) = overdue_balance(invoice, evaluation_date) {
                buckets.add(days, balance);
            }
        }

        Ok(buckets)
    }

    /// Severity in [0, 1]: bucket amounts weighted by their configured severity and divided by
    /// the configured denominator.
    pub(crate) fn severity(&self, buckets: &AgingBuckets, total_invoiced: f64) -> f64 {
        let outstanding = buckets.total();
        if outstanding <= 0.0 {
            return 0.0;
        }

        let weighted: f64 = AgingBucket::ordered()
            .into_iter()
            .map(|bucket| buckets.amount(bucket) * self.policy.severity_weights[bucket.index()])
            .sum();

        let denominator = match self.policy.normalization {
            AgingNormalization::Outstanding => outstanding,
            AgingNormalization::Invoiced => total_invoiced.max(outstanding),
        };

        (weighted / denominator).clamp(0.0, 1.0)
    }
}
