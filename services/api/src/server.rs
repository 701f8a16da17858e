use crate::cli::ServeArgs;
use crate::infra::{AdviceRotation, AppState, InMemoryAttemptStore};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use subject_survey::config::AppConfig;
use subject_survey::error::AppError;
use subject_survey::survey::{CatalogImporter, SurveyService};
use subject_survey::telemetry;
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        advice: Arc::new(AdviceRotation::default()),
    };

    // Catalogs are parsed once at startup and shared read-only for the
    // life of the process.
    let lite = Arc::new(CatalogImporter::from_path(&config.survey.lite_catalog)?);
    let full = Arc::new(CatalogImporter::from_path(&config.survey.full_catalog)?);
    info!(
        lite_questions = lite.len(),
        full_questions = full.len(),
        "question catalogs loaded"
    );

    let store = Arc::new(InMemoryAttemptStore::default());
    let survey_service = Arc::new(SurveyService::new(
        lite,
        full,
        store,
        config.survey.preview_password.clone(),
    ));

    let app = with_operational_routes(survey_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "subject survey service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
