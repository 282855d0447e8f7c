use crate::cli::ServeArgs;
use crate::infra::{
    seed_field_definitions, AppState, InMemoryFieldStore, InMemorySubmissionStore,
};
use crate::routes::with_forms_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use inquiry::config::AppConfig;
use inquiry::error::AppError;
use inquiry::forms::{FieldRegistry, FormsState, SubmissionIntake, TriageService};
use inquiry::telemetry;
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let field_store = Arc::new(InMemoryFieldStore::default());
    let submission_store = Arc::new(InMemorySubmissionStore::default());
    let registry = Arc::new(FieldRegistry::new(field_store));
    let forms_state = FormsState {
        registry: registry.clone(),
        intake: Arc::new(SubmissionIntake::new(submission_store.clone())),
        triage: Arc::new(TriageService::new(submission_store)),
    };

    if config.forms.seed_fields {
        seed_field_definitions(&registry)?;
        info!("installed built-in field definitions for the known categories");
    }

    let app = with_forms_routes(forms_state)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "enquiry form backend ready");

    axum::serve(listener, app).await?;
    Ok(())
}
