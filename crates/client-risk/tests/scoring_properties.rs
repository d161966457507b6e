use chrono::{Duration, NaiveDate};
use client_risk::scoring::{
    CustomerBillingProfile, Invoice, InvoiceStatus, RiskAssessmentEngine, SentimentInput, Trend,
};
use proptest::prelude::*;

const TOLERANCE: f64 = 1e-9;

fn evaluation_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid evaluation date")
}

#[derive(Debug, Clone)]
struct InvoiceSpec {
    amount: f64,
    status: InvoiceStatus,
    paid_fraction: f64,
    due_offset: i64,
    delay: i64,
    disputed: bool,
}

impl InvoiceSpec {
    fn build(&self, id: usize) -> Invoice {
        let due_date = evaluation_date() - Duration::days(self.due_offset);
        let (paid_date, amount_paid) = match self.status {
            InvoiceStatus::Paid => (Some(due_date + Duration::days(self.delay)), self.amount),
            InvoiceStatus::PartiallyPaid => (
                Some(due_date + Duration::days(self.delay)),
                self.amount * self.paid_fraction,
            ),
            InvoiceStatus::Unpaid => (None, 0.0),
        };

        Invoice {
            id: format!("INV-{id:03}").as_str().into(),
            customer_id: "acme".into(),
            amount: self.amount,
            issue_date: due_date - Duration::days(30),
            due_date,
            paid_date,
            status: self.status,
            disputed: self.disputed,
            amount_paid,
        }
    }
}

fn status() -> impl Strategy<Value = InvoiceStatus> {
    prop_oneof![
        Just(InvoiceStatus::Paid),
        Just(InvoiceStatus::Unpaid),
        Just(InvoiceStatus::PartiallyPaid),
    ]
}

fn trend() -> impl Strategy<Value = Trend> {
    prop_oneof![Just(Trend::Improving), Just(Trend::Declining), Just(Trend::Stable)]
}

fn invoice_spec() -> impl Strategy<Value = InvoiceSpec> {
    (
        1.0f64..60_000.0,
        status(),
        0.0f64..1.0,
        -60i64..400,
        -10i64..60,
        any::<bool>(),
    )
        .prop_map(
            |(amount, status, paid_fraction, due_offset, delay, disputed)| InvoiceSpec {
                amount,
                status,
                paid_fraction,
                due_offset,
                delay,
                disputed,
            },
        )
}

fn profile() -> impl Strategy<Value = CustomerBillingProfile> {
    prop::collection::vec(invoice_spec(), 1..24).prop_map(|specs| {
        let invoices = specs
            .iter()
            .enumerate()
            .map(|(idx, spec)| spec.build(idx))
            .collect();
        CustomerBillingProfile::new("acme", invoices)
    })
}

fn sentiment() -> impl Strategy<Value = Option<SentimentInput>> {
    prop::option::of((0.0f64..=1.0, trend()).prop_map(|(sentiment_score, trend)| {
        SentimentInput {
            sentiment_score,
            trend,
        }
    }))
}

fn within_unit(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

proptest! {
    #[test]
    fn scores_and_factors_stay_in_unit_interval(profile in profile(), sentiment in sentiment()) {
        let assessed = RiskAssessmentEngine::default()
            .assess(&profile, sentiment.as_ref(), evaluation_date())
            .expect("generated profiles are valid");
        let factors = &assessed.result.factors;

        prop_assert!(within_unit(assessed.result.client_score));
        prop_assert!(within_unit(assessed.assessment.blended_score));
        prop_assert!(within_unit(factors.overdue_score));
        prop_assert!(within_unit(factors.on_time_ratio));
        prop_assert!(within_unit(factors.aging_score));
        prop_assert!(within_unit(factors.behavioral_score));
    }

    #[test]
    fn extreme_amounts_are_rejected_or_bounded(
        amounts in prop::collection::vec(1e300f64..f64::MAX, 1..6),
        days_overdue in 1i64..400,
    ) {
        let due_date = evaluation_date() - Duration::days(days_overdue);
        let invoices = amounts
            .iter()
            .enumerate()
            .map(|(idx, amount)| Invoice {
                id: format!("INV-{idx}").as_str().into(),
                customer_id: "acme".into(),
                amount: *amount,
                issue_date: due_date - Duration::days(30),
                due_date,
                paid_date: None,
                status: InvoiceStatus::Unpaid,
                disputed: false,
                amount_paid: 0.0,
            })
            .collect();
        let profile = CustomerBillingProfile::new("acme", invoices);

        match RiskAssessmentEngine::default().assess(&profile, None, evaluation_date()) {
            Ok(assessed) => {
                prop_assert!(within_unit(assessed.result.client_score));
                prop_assert!(within_unit(assessed.assessment.blended_score));
            }
            Err(err) => prop_assert!(err.is_validation()),
        }
    }

    #[test]
    fn aging_buckets_conserve_overdue_balance(profile in profile()) {
        let result = RiskAssessmentEngine::default()
            .score(&profile, evaluation_date())
            .expect("generated profiles are valid");

        let expected: f64 = profile
            .invoices
            .iter()
            .filter(|invoice| invoice.status != InvoiceStatus::Paid)
            .filter(|invoice| invoice.due_date < evaluation_date())
            .map(|invoice| invoice.amount - invoice.amount_paid)
            .filter(|outstanding| *outstanding > 0.0)
            .sum();
        let total = result.aging_buckets.total();

        prop_assert!(
            (total - expected).abs() <= TOLERANCE * expected.max(1.0),
            "buckets {} vs outstanding overdue {}", total, expected
        );
        prop_assert!((total - result.metrics.total_overdue).abs() <= TOLERANCE * total.max(1.0));
    }

    #[test]
    fn assessment_is_deterministic(profile in profile(), sentiment in sentiment()) {
        let engine = RiskAssessmentEngine::default();
        let first = engine
            .assess(&profile, sentiment.as_ref(), evaluation_date())
            .expect("generated profiles are valid");
        let second = engine
            .assess(&profile, sentiment.as_ref(), evaluation_date())
            .expect("generated profiles are valid");

        prop_assert_eq!(
            first.assessment.blended_score.to_bits(),
            second.assessment.blended_score.to_bits()
        );
        prop_assert_eq!(first, second);
    }

    #[test]
    fn more_overdue_never_raises_score(
        profile in profile(),
        amount in 100.0f64..20_000.0,
        paid_high in 0.5f64..0.99,
        paid_cut in 0.0f64..1.0,
        days_overdue in 1i64..400,
    ) {
        let engine = RiskAssessmentEngine::default();
        let paid_low = paid_high * paid_cut;
        let due_date = evaluation_date() - Duration::days(days_overdue);
        let partial = |amount_paid: f64| Invoice {
            id: "INV-extra".into(),
            customer_id: "acme".into(),
            amount,
            issue_date: due_date - Duration::days(30),
            due_date,
            paid_date: Some(due_date),
            status: InvoiceStatus::PartiallyPaid,
            disputed: false,
            amount_paid: amount * amount_paid,
        };

        let mut less_overdue = profile.clone();
        less_overdue.invoices.push(partial(paid_high));
        let mut more_overdue = profile;
        more_overdue.invoices.push(partial(paid_low));

        let before = engine
            .score(&less_overdue, evaluation_date())
            .expect("generated profiles are valid");
        let after = engine
            .score(&more_overdue, evaluation_date())
            .expect("generated profiles are valid");

        prop_assert!(
            after.client_score <= before.client_score + TOLERANCE,
            "score rose from {} to {}", before.client_score, after.client_score
        );
    }
}

fn partially_paid(id: &str, amount: f64, amount_paid: f64, days_overdue: i64) -> Invoice {
    let due_date = evaluation_date() - Duration::days(days_overdue);
    Invoice {
        id: id.into(),
        customer_id: "acme".into(),
        amount,
        issue_date: due_date - Duration::days(30),
        due_date,
        paid_date: Some(due_date),
        status: InvoiceStatus::PartiallyPaid,
        disputed: false,
        amount_paid,
    }
}

#[test]
fn fresh_overdue_next_to_old_debt_does_not_raise_score() {
    let profile_with = |amount_paid: f64| {
        let mut old = partially_paid("INV-old", 100.0, 0.0, 120);
        old.status = InvoiceStatus::Unpaid;
        old.paid_date = None;
        CustomerBillingProfile::new(
            "acme",
            vec![
                partially_paid("INV-settled", 10_000.0, 10_000.0, 200),
                old,
                partially_paid("INV-fresh", 100.0, amount_paid, 10),
            ],
        )
    };
    let engine = RiskAssessmentEngine::default();

    let before = engine
        .score(&profile_with(100.0), evaluation_date())
        .expect("valid profile");
    let after = engine
        .score(&profile_with(0.0), evaluation_date())
        .expect("valid profile");

    assert!(after.metrics.total_overdue > before.metrics.total_overdue);
    assert!(
        after.client_score <= before.client_score,
        "score rose from {} to {}",
        before.client_score,
        after.client_score
    );
}
