use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    FieldDefinition, FieldDraft, FieldId, FieldPatch, ServiceCategory, SubmissionFilter,
    SubmissionId, SubmissionStatus, ValidationError,
};
use super::intake::{IntakeError, SubmissionIntake};
use super::layout::{layout, FormLayout};
use super::registry::{FieldRegistry, RegistryError, ReorderDirection};
use super::store::{FieldStore, PersistenceError, SubmissionStore};
use super::triage::{TriageError, TriageService};

/// Shared handler state: the three services over the two stores.
pub struct FormsState<F, S> {
    pub registry: Arc<FieldRegistry<F>>,
    pub intake: Arc<SubmissionIntake<S>>,
    pub triage: Arc<TriageService<S>>,
}

impl<F, S> Clone for FormsState<F, S> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            intake: self.intake.clone(),
            triage: self.triage.clone(),
        }
    }
}

/// Router builder exposing the public form endpoints and the administrative
/// registry/triage endpoints.
pub fn forms_router<F, S>(state: FormsState<F, S>) -> Router
where
    F: FieldStore + 'static,
    S: SubmissionStore + 'static,
{
    Router::new()
        .route("/api/v1/forms/:service_type", get(schema_handler::<F, S>))
        .route(
            "/api/v1/forms/:service_type/submissions",
            post(submit_handler::<F, S>),
        )
        .route(
            "/api/v1/admin/fields",
            get(list_fields_handler::<F, S>).post(create_field_handler::<F, S>),
        )
        .route(
            "/api/v1/admin/fields/:id",
            patch(update_field_handler::<F, S>).delete(delete_field_handler::<F, S>),
        )
        .route(
            "/api/v1/admin/fields/:id/reorder",
            post(reorder_field_handler::<F, S>),
        )
        .route(
            "/api/v1/admin/fields/:id/toggle",
            post(toggle_field_handler::<F, S>),
        )
        .route(
            "/api/v1/admin/submissions",
            get(list_submissions_handler::<F, S>),
        )
        .route(
            "/api/v1/admin/submissions/export",
            get(export_submissions_handler::<F, S>),
        )
        .route(
            "/api/v1/admin/submissions/:id/status",
            post(set_status_handler::<F, S>),
        )
        .with_state(state)
}

/// Active schema plus its computed layout, as served to the rendering client.
/// A category with no active fields yields empty `fields` and `layout` —
/// the client shows a message-only fallback instead of a broken form.
#[derive(Debug, Serialize)]
pub struct FormView {
    pub service_type: ServiceCategory,
    pub fields: Vec<FieldDefinition>,
    pub layout: FormLayout,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryQuery {
    service_type: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReorderRequest {
    direction: ReorderDirection,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusRequest {
    status: SubmissionStatus,
}

pub(crate) async fn schema_handler<F, S>(
    State(state): State<FormsState<F, S>>,
    Path(service_type): Path<String>,
) -> Response
where
    F: FieldStore + 'static,
    S: SubmissionStore + 'static,
{
    let category = ServiceCategory::new(service_type);
    match state.registry.list_fields(&category, true) {
        Ok(fields) => {
            let view = FormView {
                service_type: category,
                layout: layout(&fields),
                fields,
            };
            (StatusCode::OK, Json(view)).into_response()
        }
        Err(error) => registry_error_response(error),
    }
}

pub(crate) async fn submit_handler<F, S>(
    State(state): State<FormsState<F, S>>,
    Path(service_type): Path<String>,
    Json(values): Json<BTreeMap<String, String>>,
) -> Response
where
    F: FieldStore + 'static,
    S: SubmissionStore + 'static,
{
    let category = ServiceCategory::new(service_type);
    let schema = match state.registry.list_fields(&category, true) {
        Ok(schema) => schema,
        Err(error) => return registry_error_response(error),
    };

    match state.intake.submit(&category, &schema, &values) {
        Ok(submission) => (StatusCode::CREATED, Json(submission)).into_response(),
        Err(IntakeError::Validation(error)) => {
            let payload = match &error {
                ValidationError::MissingRequired(labels) => json!({
                    "error": "required fields missing",
                    "missing": labels,
                }),
                other => json!({ "error": other.to_string() }),
            };
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        Err(IntakeError::Persistence(error)) => persistence_response(error),
        Err(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn list_fields_handler<F, S>(
    State(state): State<FormsState<F, S>>,
    Query(query): Query<CategoryQuery>,
) -> Response
where
    F: FieldStore + 'static,
    S: SubmissionStore + 'static,
{
    let category = ServiceCategory::new(query.service_type);
    match state.registry.list_fields(&category, false) {
        Ok(fields) => (StatusCode::OK, Json(fields)).into_response(),
        Err(error) => registry_error_response(error),
    }
}

pub(crate) async fn create_field_handler<F, S>(
    State(state): State<FormsState<F, S>>,
    Json(draft): Json<FieldDraft>,
) -> Response
where
    F: FieldStore + 'static,
    S: SubmissionStore + 'static,
{
    match state.registry.create_field(draft) {
        Ok(definition) => (StatusCode::CREATED, Json(definition)).into_response(),
        Err(error) => registry_error_response(error),
    }
}

pub(crate) async fn update_field_handler<F, S>(
    State(state): State<FormsState<F, S>>,
    Path(id): Path<String>,
    Json(field_patch): Json<FieldPatch>,
) -> Response
where
    F: FieldStore + 'static,
    S: SubmissionStore + 'static,
{
    match state.registry.update_field(&FieldId(id), field_patch) {
        Ok(definition) => (StatusCode::OK, Json(definition)).into_response(),
        Err(error) => registry_error_response(error),
    }
}

pub(crate) async fn delete_field_handler<F, S>(
    State(state): State<FormsState<F, S>>,
    Path(id): Path<String>,
) -> Response
where
    F: FieldStore + 'static,
    S: SubmissionStore + 'static,
{
    match state.registry.delete_field(&FieldId(id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => registry_error_response(error),
    }
}

pub(crate) async fn reorder_field_handler<F, S>(
    State(state): State<FormsState<F, S>>,
    Path(id): Path<String>,
    Json(request): Json<ReorderRequest>,
) -> Response
where
    F: FieldStore + 'static,
    S: SubmissionStore + 'static,
{
    match state.registry.reorder_field(&FieldId(id), request.direction) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => registry_error_response(error),
    }
}

pub(crate) async fn toggle_field_handler<F, S>(
    State(state): State<FormsState<F, S>>,
    Path(id): Path<String>,
) -> Response
where
    F: FieldStore + 'static,
    S: SubmissionStore + 'static,
{
    match state.registry.toggle_active(&FieldId(id)) {
        Ok(definition) => (StatusCode::OK, Json(definition)).into_response(),
        Err(error) => registry_error_response(error),
    }
}

pub(crate) async fn list_submissions_handler<F, S>(
    State(state): State<FormsState<F, S>>,
    Query(filter): Query<SubmissionFilter>,
) -> Response
where
    F: FieldStore + 'static,
    S: SubmissionStore + 'static,
{
    match state.triage.list_submissions(&filter) {
        Ok(submissions) => (StatusCode::OK, Json(submissions)).into_response(),
        Err(error) => persistence_response(error),
    }
}

pub(crate) async fn set_status_handler<F, S>(
    State(state): State<FormsState<F, S>>,
    Path(id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> Response
where
    F: FieldStore + 'static,
    S: SubmissionStore + 'static,
{
    match state.triage.set_status(&SubmissionId(id), request.status) {
        Ok(submission) => (StatusCode::OK, Json(submission)).into_response(),
        Err(error) => persistence_response(error),
    }
}

pub(crate) async fn export_submissions_handler<F, S>(
    State(state): State<FormsState<F, S>>,
    Query(filter): Query<SubmissionFilter>,
) -> Response
where
    F: FieldStore + 'static,
    S: SubmissionStore + 'static,
{
    match state.triage.export_csv(&filter) {
        Ok(csv) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv")],
            csv,
        )
            .into_response(),
        Err(TriageError::Persistence(error)) => persistence_response(error),
        Err(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

fn registry_error_response(error: RegistryError) -> Response {
    match error {
        RegistryError::Validation(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        RegistryError::Persistence(error) => persistence_response(error),
    }
}

fn persistence_response(error: PersistenceError) -> Response {
    let status = match error {
        PersistenceError::NotFound => StatusCode::NOT_FOUND,
        PersistenceError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}
