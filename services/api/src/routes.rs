use crate::infra::{
    deserialize_optional_date, deserialize_optional_sentiment, resolve_sentiment, AppState,
};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{Local, NaiveDate};
use client_risk::error::AppError;
use client_risk::scoring::{
    CustomerAssessment, CustomerBillingProfile, CustomerId, Invoice, SentimentOutcome,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
pub(crate) struct CustomerInvoices {
    pub(crate) customer_id: CustomerId,
    pub(crate) invoices: Vec<Invoice>,
    #[serde(default, deserialize_with = "deserialize_optional_sentiment")]
    pub(crate) sentiment: Option<SentimentOutcome>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssessCustomerRequest {
    #[serde(flatten)]
    pub(crate) customer: CustomerInvoices,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) as_of: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssessPortfolioRequest {
    pub(crate) customers: Vec<CustomerInvoices>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) as_of: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub(crate) enum PortfolioEntry {
    Assessed(Box<CustomerAssessment>),
    Failed {
        customer_id: CustomerId,
        error: String,
    },
}

#[derive(Debug, Serialize)]
pub(crate) struct AssessPortfolioResponse {
    pub(crate) evaluation_date: NaiveDate,
    pub(crate) assessed: usize,
    pub(crate) failed: usize,
    pub(crate) customers: Vec<PortfolioEntry>,
}

pub(crate) fn router() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/customers/assess", post(assess_customer_endpoint))
        .route("/api/v1/portfolio/assess", post(assess_portfolio_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn assess_customer_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<AssessCustomerRequest>,
) -> Result<Json<CustomerAssessment>, AppError> {
    let AssessCustomerRequest { customer, as_of } = payload;
    let evaluation_date = as_of.unwrap_or_else(|| Local::now().date_naive());
    let sentiment = resolve_sentiment(&customer.customer_id, customer.sentiment);
    let profile = CustomerBillingProfile::new(customer.customer_id, customer.invoices);

    let assessment = state
        .engine
        .assess(&profile, sentiment.as_ref(), evaluation_date)?;
    Ok(Json(assessment))
}

/// Scores every customer on the blocking pool; response order follows the request.
pub(crate) async fn assess_portfolio_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<AssessPortfolioRequest>,
) -> Result<Json<AssessPortfolioResponse>, AppError> {
    let evaluation_date = payload
        .as_of
        .unwrap_or_else(|| Local::now().date_naive());

    let workers: Vec<_> = payload
        .customers
        .into_iter()
        .map(|customer| {
            let engine = state.engine.clone();
            tokio::task::spawn_blocking(move || {
                let sentiment = resolve_sentiment(&customer.customer_id, customer.sentiment);
                let profile = CustomerBillingProfile::new(customer.customer_id, customer.invoices);
                match engine.assess(&profile, sentiment.as_ref(), evaluation_date) {
                    Ok(assessment) => PortfolioEntry::Assessed(Box::new(assessment)),
                    Err(err) => PortfolioEntry::Failed {
                        customer_id: profile.customer_id,
                        error: err.to_string(),
                    },
                }
            })
        })
        .collect();

    let mut customers = Vec::with_capacity(workers.len());
    for worker in workers {
        customers.push(worker.await.map_err(axum::Error::new)?);
    }

    let failed = customers
        .iter()
        .filter(|entry| matches!(entry, PortfolioEntry::Failed { .. }))
        .count();

    Ok(Json(AssessPortfolioResponse {
        evaluation_date,
        assessed: customers.len() - failed,
        failed,
        customers,
    }))
}
