use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use inquiry::forms::{forms_router, FieldStore, FormsState, SubmissionStore};

pub(crate) fn with_forms_routes<F, S>(state: FormsState<F, S>) -> axum::Router
where
    F: FieldStore + 'static,
    S: SubmissionStore + 'static,
{
    forms_router(state)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{
        seed_field_definitions, InMemoryFieldStore, InMemorySubmissionStore,
    };
    use axum::body::Body;
    use axum::http::Request;
    use inquiry::forms::{FieldRegistry, SubmissionIntake, TriageService};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn forms_state() -> FormsState<InMemoryFieldStore, InMemorySubmissionStore> {
        let field_store = Arc::new(InMemoryFieldStore::default());
        let submission_store = Arc::new(InMemorySubmissionStore::default());
        let registry = Arc::new(FieldRegistry::new(field_store));
        seed_field_definitions(&registry).expect("seed definitions");
        FormsState {
            registry,
            intake: Arc::new(SubmissionIntake::new(submission_store.clone())),
            triage: Arc::new(TriageService::new(submission_store)),
        }
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body.get("status").and_then(|v| v.as_str()), Some("ok"));
    }

    #[tokio::test]
    async fn seeded_form_is_served_for_every_known_category() {
        let router = with_forms_routes(forms_state());

        for tag in inquiry::forms::ServiceCategory::KNOWN {
            let response = router
                .clone()
                .oneshot(
                    Request::builder()
                        .method("GET")
                        .uri(format!("/api/v1/forms/{tag}"))
                        .body(Body::empty())
                        .expect("request"),
                )
                .await
                .expect("router dispatch");
            assert_eq!(response.status(), StatusCode::OK, "schema for {tag}");

            let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
                .await
                .expect("read body");
            let payload: serde_json::Value = serde_json::from_slice(&body).expect("json");
            let fields = payload
                .get("fields")
                .and_then(|fields| fields.as_array())
                .expect("fields array");
            assert_eq!(fields.len(), 7, "six shared fields plus one extra for {tag}");
        }
    }
}
