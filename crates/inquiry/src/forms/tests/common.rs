use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::forms::domain::{
    FieldDefinition, FieldDraft, FieldId, FieldKind, ServiceCategory, Submission, SubmissionDraft,
    SubmissionFilter, SubmissionId, SubmissionStatus,
};
use crate::forms::intake::SubmissionIntake;
use crate::forms::registry::FieldRegistry;
use crate::forms::router::{forms_router, FormsState};
use crate::forms::session::FormSession;
use crate::forms::store::{FieldStore, PersistenceError, SubmissionStore};
use crate::forms::triage::TriageService;

/// Insertion-ordered in-memory field store with a mutation counter so tests
/// can assert that boundary reorders write nothing.
#[derive(Default, Clone)]
pub(super) struct MemoryFieldStore {
    fields: Arc<Mutex<Vec<FieldDefinition>>>,
    writes: Arc<AtomicU64>,
}

impl MemoryFieldStore {
    pub(super) fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

impl FieldStore for MemoryFieldStore {
    fn list(&self, category: &ServiceCategory) -> Result<Vec<FieldDefinition>, PersistenceError> {
        let guard = self.fields.lock().expect("field store mutex poisoned");
        Ok(guard
            .iter()
            .filter(|field| field.service_type == *category)
            .cloned()
            .collect())
    }

    fn fetch(&self, id: &FieldId) -> Result<Option<FieldDefinition>, PersistenceError> {
        let guard = self.fields.lock().expect("field store mutex poisoned");
        Ok(guard.iter().find(|field| field.id == *id).cloned())
    }

    fn insert(&self, definition: FieldDefinition) -> Result<FieldDefinition, PersistenceError> {
        let mut guard = self.fields.lock().expect("field store mutex poisoned");
        self.writes.fetch_add(1, Ordering::Relaxed);
        guard.push(definition.clone());
        Ok(definition)
    }

    fn update(&self, definition: FieldDefinition) -> Result<(), PersistenceError> {
        let mut guard = self.fields.lock().expect("field store mutex poisoned");
        let slot = guard
            .iter_mut()
            .find(|field| field.id == definition.id)
            .ok_or(PersistenceError::NotFound)?;
        self.writes.fetch_add(1, Ordering::Relaxed);
        *slot = definition;
        Ok(())
    }

    fn delete(&self, id: &FieldId) -> Result<(), PersistenceError> {
        let mut guard = self.fields.lock().expect("field store mutex poisoned");
        let before = guard.len();
        guard.retain(|field| field.id != *id);
        if guard.len() == before {
            return Err(PersistenceError::NotFound);
        }
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn swap_order(&self, first: &FieldId, second: &FieldId) -> Result<(), PersistenceError> {
        let mut guard = self.fields.lock().expect("field store mutex poisoned");
        let first_index = guard
            .iter()
            .position(|field| field.id == *first)
            .ok_or(PersistenceError::NotFound)?;
        let second_index = guard
            .iter()
            .position(|field| field.id == *second)
            .ok_or(PersistenceError::NotFound)?;
        self.writes.fetch_add(1, Ordering::Relaxed);
        let first_order = guard[first_index].sort_order;
        guard[first_index].sort_order = guard[second_index].sort_order;
        guard[second_index].sort_order = first_order;
        Ok(())
    }
}

/// Submission store assigning deterministic ids and strictly increasing
/// timestamps so ordering assertions are stable.
#[derive(Default, Clone)]
pub(super) struct MemorySubmissionStore {
    submissions: Arc<Mutex<Vec<Submission>>>,
    sequence: Arc<AtomicU64>,
}

impl MemorySubmissionStore {
    pub(super) fn stored(&self) -> Vec<Submission> {
        self.submissions
            .lock()
            .expect("submission store mutex poisoned")
            .clone()
    }
}

impl SubmissionStore for MemorySubmissionStore {
    fn insert(&self, draft: SubmissionDraft) -> Result<Submission, PersistenceError> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let created_at = Utc
            .with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
            .single()
            .expect("valid base timestamp")
            + chrono::Duration::seconds(sequence as i64);
        let submission = Submission {
            id: SubmissionId(format!("sub-{:06}", sequence + 1)),
            service_type: draft.service_type,
            name: draft.name,
            email: draft.email,
            phone: draft.phone,
            company: draft.company,
            subject: draft.subject,
            message: draft.message,
            form_data: draft.form_data,
            status: SubmissionStatus::New,
            created_at,
        };
        let mut guard = self
            .submissions
            .lock()
            .expect("submission store mutex poisoned");
        guard.push(submission.clone());
        Ok(submission)
    }

    fn fetch(&self, id: &SubmissionId) -> Result<Option<Submission>, PersistenceError> {
        let guard = self
            .submissions
            .lock()
            .expect("submission store mutex poisoned");
        Ok(guard.iter().find(|submission| submission.id == *id).cloned())
    }

    fn list(&self, filter: &SubmissionFilter) -> Result<Vec<Submission>, PersistenceError> {
        let guard = self
            .submissions
            .lock()
            .expect("submission store mutex poisoned");
        Ok(guard
            .iter()
            .filter(|submission| filter.matches(submission))
            .cloned()
            .collect())
    }

    fn set_status(
        &self,
        id: &SubmissionId,
        status: SubmissionStatus,
    ) -> Result<Submission, PersistenceError> {
        let mut guard = self
            .submissions
            .lock()
            .expect("submission store mutex poisoned");
        let submission = guard
            .iter_mut()
            .find(|submission| submission.id == *id)
            .ok_or(PersistenceError::NotFound)?;
        submission.status = status;
        Ok(submission.clone())
    }
}

/// Field store that fails every call, for surfacing storage errors.
pub(super) struct UnavailableFieldStore;

impl FieldStore for UnavailableFieldStore {
    fn list(&self, _category: &ServiceCategory) -> Result<Vec<FieldDefinition>, PersistenceError> {
        Err(PersistenceError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &FieldId) -> Result<Option<FieldDefinition>, PersistenceError> {
        Err(PersistenceError::Unavailable("database offline".to_string()))
    }

    fn insert(&self, _definition: FieldDefinition) -> Result<FieldDefinition, PersistenceError> {
        Err(PersistenceError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _definition: FieldDefinition) -> Result<(), PersistenceError> {
        Err(PersistenceError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &FieldId) -> Result<(), PersistenceError> {
        Err(PersistenceError::Unavailable("database offline".to_string()))
    }

    fn swap_order(&self, _first: &FieldId, _second: &FieldId) -> Result<(), PersistenceError> {
        Err(PersistenceError::Unavailable("database offline".to_string()))
    }
}

/// Submission store that fails every call.
pub(super) struct UnavailableSubmissionStore;

impl SubmissionStore for UnavailableSubmissionStore {
    fn insert(&self, _draft: SubmissionDraft) -> Result<Submission, PersistenceError> {
        Err(PersistenceError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &SubmissionId) -> Result<Option<Submission>, PersistenceError> {
        Err(PersistenceError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _filter: &SubmissionFilter) -> Result<Vec<Submission>, PersistenceError> {
        Err(PersistenceError::Unavailable("database offline".to_string()))
    }

    fn set_status(
        &self,
        _id: &SubmissionId,
        _status: SubmissionStatus,
    ) -> Result<Submission, PersistenceError> {
        Err(PersistenceError::Unavailable("database offline".to_string()))
    }
}

/// Field store that fails a fixed number of list calls before recovering,
/// for exercising the retry affordance after a failed schema load.
#[derive(Clone)]
pub(super) struct FlakyFieldStore {
    inner: MemoryFieldStore,
    failures_remaining: Arc<Mutex<u32>>,
}

impl FlakyFieldStore {
    pub(super) fn failing_once(inner: MemoryFieldStore) -> Self {
        Self {
            inner,
            failures_remaining: Arc::new(Mutex::new(1)),
        }
    }
}

impl FieldStore for FlakyFieldStore {
    fn list(&self, category: &ServiceCategory) -> Result<Vec<FieldDefinition>, PersistenceError> {
        let mut remaining = self.failures_remaining.lock().expect("flaky mutex poisoned");
        if *remaining > 0 {
            *remaining -= 1;
            return Err(PersistenceError::Unavailable("timeout".to_string()));
        }
        drop(remaining);
        self.inner.list(category)
    }

    fn fetch(&self, id: &FieldId) -> Result<Option<FieldDefinition>, PersistenceError> {
        self.inner.fetch(id)
    }

    fn insert(&self, definition: FieldDefinition) -> Result<FieldDefinition, PersistenceError> {
        self.inner.insert(definition)
    }

    fn update(&self, definition: FieldDefinition) -> Result<(), PersistenceError> {
        self.inner.update(definition)
    }

    fn delete(&self, id: &FieldId) -> Result<(), PersistenceError> {
        self.inner.delete(id)
    }

    fn swap_order(&self, first: &FieldId, second: &FieldId) -> Result<(), PersistenceError> {
        self.inner.swap_order(first, second)
    }
}

pub(super) fn category(tag: &str) -> ServiceCategory {
    ServiceCategory::new(tag)
}

pub(super) fn draft(
    tag: &str,
    field_name: &str,
    field_label: &str,
    field_type: FieldKind,
    is_required: bool,
) -> FieldDraft {
    FieldDraft {
        service_type: category(tag),
        field_name: field_name.to_string(),
        field_label: field_label.to_string(),
        field_type,
        placeholder: None,
        is_required,
        is_active: true,
        sort_order: None,
    }
}

/// The contact schema used by most scenarios: required name, email, message.
pub(super) fn seed_contact_fields(registry: &FieldRegistry<MemoryFieldStore>, tag: &str) {
    registry
        .create_field(draft(tag, "name", "Name", FieldKind::Text, true))
        .expect("name field");
    registry
        .create_field(draft(tag, "email", "Email", FieldKind::Email, true))
        .expect("email field");
    registry
        .create_field(draft(tag, "message", "Message", FieldKind::Textarea, true))
        .expect("message field");
}

pub(super) fn values(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

pub(super) fn build_registry() -> (FieldRegistry<MemoryFieldStore>, Arc<MemoryFieldStore>) {
    let store = Arc::new(MemoryFieldStore::default());
    (FieldRegistry::new(store.clone()), store)
}

pub(super) struct Engine {
    pub(super) registry: Arc<FieldRegistry<MemoryFieldStore>>,
    pub(super) intake: Arc<SubmissionIntake<MemorySubmissionStore>>,
    pub(super) triage: Arc<TriageService<MemorySubmissionStore>>,
    pub(super) submission_store: Arc<MemorySubmissionStore>,
}

pub(super) fn build_engine() -> Engine {
    let field_store = Arc::new(MemoryFieldStore::default());
    let submission_store = Arc::new(MemorySubmissionStore::default());
    Engine {
        registry: Arc::new(FieldRegistry::new(field_store)),
        intake: Arc::new(SubmissionIntake::new(submission_store.clone())),
        triage: Arc::new(TriageService::new(submission_store.clone())),
        submission_store,
    }
}

pub(super) fn build_session(
    engine: &Engine,
    tag: &str,
) -> FormSession<MemoryFieldStore, MemorySubmissionStore> {
    FormSession::new(engine.registry.clone(), engine.intake.clone(), category(tag))
}

pub(super) fn build_router(engine: &Engine) -> axum::Router {
    forms_router(FormsState {
        registry: engine.registry.clone(),
        intake: engine.intake.clone(),
        triage: engine.triage.clone(),
    })
}

pub(super) async fn read_json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
