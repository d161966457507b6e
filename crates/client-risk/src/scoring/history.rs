use super::aging::overdue_balance;
use super::config::{BehaviorPolicy, TrendPolicy};
use super::domain::{CustomerBillingProfile, Invoice, Trend};
use super::error::ScoringError;
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;

/// Billing totals and counters kept alongside the score for reporting.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BillingMetrics {
    pub invoice_count: usize,
    pub total_invoiced: f64,
    pub total_received: f64,
    pub total_receivable: f64,
    pub total_overdue: f64,
    pub overdue_invoice_count: usize,
    /// Open invoices due on or after the evaluation date.
    pub upcoming_invoice_count: usize,
    pub upcoming_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_upcoming_due_date: Option<NaiveDate>,
    pub paid_on_time_count: usize,
    pub paid_late_count: usize,
    pub late_payment_ratio: f64,
    pub disputed_invoice_count: usize,
    pub max_overdue_days: i64,
    pub avg_overdue_days: f64,
    /// Spread of per-invoice overdue balances, linearly interpolated; zero without overdue
    /// invoices.
    pub overdue_amount_percentile_25: f64,
    pub overdue_amount_median: f64,
    pub overdue_amount_percentile_75: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_invoice_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_payment_date: Option<NaiveDate>,
}

/// Payment behavior signals derived from a customer's invoice history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentHistory {
    pub on_time_ratio: f64,
    pub overdue_percentage: f64,
    pub has_disputes: bool,
    pub recurring_delays: bool,
    pub trend: Trend,
    pub metrics: BillingMetrics,
}

#[derive(Debug, Clone, Copy)]
pub struct PaymentHistoryAnalyzer {
    behavior: BehaviorPolicy,
    trend: TrendPolicy,
}

impl PaymentHistoryAnalyzer {
    pub fn new(behavior: BehaviorPolicy, trend: TrendPolicy) -> Self {
        Self { behavior, trend }
    }

    pub fn analyze(
        &self,
        profile: &CustomerBillingProfile,
        evaluation_date: NaiveDate,
    ) -> Result<PaymentHistory, ScoringError> {
        if profile.invoices.is_empty() {
            return Err(ScoringError::InsufficientData {
                customer_id: profile.customer_id.clone(),
            });
        }

        let metrics = collect_metrics(&profile.invoices, evaluation_date);
        let overdue_percentage = if metrics.total_invoiced > 0.0 {
            (metrics.total_overdue / metrics.total_invoiced).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let mut chronological: Vec<&Invoice> = profile.invoices.iter().collect();
        chronological.sort_by(|a, b| chronological_order(a, b));

        Ok(PaymentHistory {
            on_time_ratio: on_time_ratio(chronological.iter().copied()),
            overdue_percentage,
            has_disputes: metrics.disputed_invoice_count > 0,
            recurring_delays: self.recurring_delays(&chronological),
            trend: self.trend(&chronological),
            metrics,
        })
    }

    fn recurring_delays(&self, chronological: &[&Invoice]) -> bool {
        let late = chronological
            .iter()
            .rev()
            .filter_map(|invoice| invoice.paid_on_time())
            .take(self.behavior.recurring_delay_lookback)
            .filter(|on_time| !on_time)
            .count();

        late >= self.behavior.recurring_delay_min_late
    }

    fn trend(&self, chronological: &[&Invoice]) -> Trend {
        if chronological.len() < self.trend.min_invoices {
            return Trend::Stable;
        }

        let midpoint = chronological.len() / 2;
        let (earlier, recent) = chronological.split_at(midpoint);
        let earlier_ratio = on_time_ratio(earlier.iter().copied());
        let recent_ratio = on_time_ratio(recent.iter().copied());
        let delta = recent_ratio - earlier_ratio;

        if delta > self.trend.margin {
            Trend::Improving
        } else if delta < -self.trend.margin {
            Trend::Declining
        } else {
            Trend::Stable
        }
    }
}

/// Orders by due date, then issue date, then id so every sort is total and repeatable.
fn chronological_order(a: &Invoice, b: &Invoice) -> Ordering {
    a.due_date
        .cmp(&b.due_date)
        .then_with(|| a.issue_date.cmp(&b.issue_date))
        .then_with(|| a.id.cmp(&b.id))
}

fn on_time_ratio<'a>(invoices: impl Iterator<Item = &'a Invoice>) -> f64 {
    let mut with_payment = 0usize;
    let mut on_time = 0usize;

    for invoice in invoices {
        if invoice.status.records_payment() {
            with_payment += 1;
            if invoice.paid_on_time() == Some(true) {
                on_time += 1;
            }
        }
    }

    if with_payment == 0 {
        0.0
    } else {
        on_time as f64 / with_payment as f64
    }
}

fn collect_metrics(invoices: &[Invoice], evaluation_date: NaiveDate) -> BillingMetrics {
    let mut metrics = BillingMetrics {
        invoice_count: invoices.len(),
        ..BillingMetrics::default()
    };
    let mut overdue: Vec<(i64, f64)> = Vec::new();
    let mut with_payment = 0usize;

    for invoice in invoices {
        metrics.total_invoiced += invoice.amount;
        metrics.total_received += invoice.amount_paid;
        metrics.total_receivable += invoice.open_balance();

        if invoice.disputed {
            metrics.disputed_invoice_count += 1;
        }

        match overdue_balance(invoice, evaluation_date) {
            Some((days, balance)) => {
                metrics.total_overdue += balance;
                metrics.overdue_invoice_count += 1;
                metrics.max_overdue_days = metrics.max_overdue_days.max(days);
                overdue.push((days, balance));
            }
            None if invoice.due_date >= evaluation_date => {
                let balance = invoice.open_balance();
                metrics.upcoming_amount += balance;
                if balance > 0.0 {
                    metrics.upcoming_invoice_count += 1;
                    let next = metrics
                        .next_upcoming_due_date
                        .map_or(invoice.due_date, |next| next.min(invoice.due_date));
                    metrics.next_upcoming_due_date = Some(next);
                }
            }
            None => {}
        }

        if invoice.status.records_payment() {
            with_payment += 1;
        }
        match invoice.paid_on_time() {
            Some(true) => metrics.paid_on_time_count += 1,
            Some(false) => metrics.paid_late_count += 1,
            None => {}
        }

        metrics.last_invoice_date = metrics.last_invoice_date.max(Some(invoice.issue_date));
        if invoice.paid_date.is_some() {
            metrics.last_payment_date = metrics.last_payment_date.max(invoice.paid_date);
        }
    }

    if metrics.total_overdue > 0.0 {
        metrics.avg_overdue_days = overdue
            .iter()
            .map(|(days, balance)| *days as f64 * (balance / metrics.total_overdue))
            .sum();
    }
    if with_payment > 0 {
        metrics.late_payment_ratio = metrics.paid_late_count as f64 / with_payment as f64;
    }

    let mut overdue_amounts: Vec<f64> = overdue.iter().map(|(_, balance)| *balance).collect();
    overdue_amounts.sort_by(f64::total_cmp);
    metrics.overdue_amount_percentile_25 = percentile(&overdue_amounts, 0.25);
    metrics.overdue_amount_median = percentile(&overdue_amounts, 0.50);
    metrics.overdue_amount_percentile_75 = percentile(&overdue_amounts, 0.75);

    metrics
}

/// Linear interpolation between closest ranks over an ascending slice.
fn percentile(sorted: &[f64], fraction: f64) -> f64 {
    let Some(last) = sorted.len().checked_sub(1) else {
        return 0.0;
    };
    let rank = fraction * last as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (rank - lower as f64)
}
