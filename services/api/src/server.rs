use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::router;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use client_risk::config::AppConfig;
use client_risk::error::AppError;
use client_risk::scoring::RiskAssessmentEngine;
use client_risk::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let engine = Arc::new(RiskAssessmentEngine::new(config.scoring.clone())?);
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        engine,
    };

    let app = router()
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        high_below = config.scoring.risk.high_below,
        low_above = config.scoring.risk.low_above,
        "client risk service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
