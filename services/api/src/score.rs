use crate::infra::{load_sentiment_file, parse_date, resolve_sentiment, SentimentBook};
use chrono::{Local, NaiveDate};
use clap::{Args, ValueEnum};
use client_risk::config::AppConfig;
use client_risk::error::AppError;
use client_risk::ledger::InvoiceLedgerImporter;
use client_risk::report::write_assessments_csv;
use client_risk::scoring::{CustomerAssessment, RiskAssessmentEngine, ScoringError};
use client_risk::telemetry;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Text,
    Csv,
    Json,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Invoice ledger CSV export
    #[arg(long)]
    pub(crate) invoices: PathBuf,
    /// JSON file mapping customer ids to sentiment outcomes
    #[arg(long)]
    pub(crate) sentiment: Option<PathBuf>,
    /// Evaluation date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub(crate) format: OutputFormat,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let engine = RiskAssessmentEngine::new(config.scoring)?;
    let evaluation_date = args.as_of.unwrap_or_else(|| Local::now().date_naive());
    let mut sentiment = match &args.sentiment {
        Some(path) => load_sentiment_file(path)?,
        None => SentimentBook::new(),
    };

    let profiles = InvoiceLedgerImporter::from_path(&args.invoices)?;
    info!(customers = profiles.len(), %evaluation_date, "scoring invoice ledger");

    let mut assessments = Vec::with_capacity(profiles.len());
    let mut failures = Vec::new();
    for profile in &profiles {
        let outcome = sentiment.remove(&profile.customer_id);
        // Without a sentiment file there is nothing to warn about.
        let input = if args.sentiment.is_some() {
            resolve_sentiment(&profile.customer_id, outcome)
        } else {
            None
        };

        match engine.assess(profile, input.as_ref(), evaluation_date) {
            Ok(assessment) => assessments.push(assessment),
            Err(err) => {
                warn!(customer_id = %profile.customer_id, error = %err, "customer skipped");
                failures.push(err);
            }
        }
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Text => render_text(&mut out, evaluation_date, &assessments, &failures)?,
        OutputFormat::Csv => write_assessments_csv(&mut out, &assessments)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &assessments).map_err(std::io::Error::from)?;
            writeln!(out)?;
        }
    }

    Ok(())
}

pub(crate) fn render_text<W: Write>(
    out: &mut W,
    evaluation_date: NaiveDate,
    assessments: &[CustomerAssessment],
    failures: &[ScoringError],
) -> std::io::Result<()> {
    writeln!(out, "Client risk report (evaluated {evaluation_date})")?;

    for CustomerAssessment { result, assessment } in assessments {
        writeln!(out, "\n{}", result.customer_id)?;
        writeln!(out, "  {}", assessment.summary)?;
        writeln!(
            out,
            "  Billing score {:.2} | trend {} | overdue {:.1}% | sentiment {}",
            result.client_score,
            result.trend,
            result.overdue_percentage * 100.0,
            if assessment.sentiment_applied {
                "applied"
            } else {
                "not available"
            }
        )?;

        let aging: Vec<String> = result
            .aging_buckets
            .entries()
            .map(|(_, label, amount)| format!("{label}: {amount:.2}"))
            .collect();
        writeln!(out, "  Aging {}", aging.join(", "))?;

        writeln!(out, "  Key factors")?;
        for factor in &assessment.key_factors {
            writeln!(out, "  - {factor}")?;
        }
        writeln!(out, "  Recommendations")?;
        for recommendation in &assessment.recommendations {
            writeln!(out, "  - {recommendation}")?;
        }
    }

    if !failures.is_empty() {
        writeln!(out, "\nSkipped customers")?;
        for failure in failures {
            writeln!(out, "- {failure}")?;
        }
    }

    Ok(())
}
