use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use inquiry::forms::{
    FieldDefinition, FieldDraft, FieldId, FieldKind, FieldRegistry, FieldStore, PersistenceError,
    RegistryError, ServiceCategory, Submission, SubmissionDraft, SubmissionFilter, SubmissionId,
    SubmissionStatus, SubmissionStore,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Insertion-ordered field store backing the served API and the demo.
#[derive(Default, Clone)]
pub(crate) struct InMemoryFieldStore {
    fields: Arc<Mutex<Vec<FieldDefinition>>>,
}

impl FieldStore for InMemoryFieldStore {
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
        guard.push(definition.clone());
        Ok(definition)
    }

    fn update(&self, definition: FieldDefinition) -> Result<(), PersistenceError> {
        let mut guard = self.fields.lock().expect("field store mutex poisoned");
        let slot = guard
            .iter_mut()
            .find(|field| field.id == definition.id)
            .ok_or(PersistenceError::NotFound)?;
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
        Ok(())
    }

    // Both order writes happen under the one lock, so concurrent reorders
    // cannot interleave here the way they can against a non-transactional
    // remote store.
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
        let order = guard[first_index].sort_order;
        guard[first_index].sort_order = guard[second_index].sort_order;
        guard[second_index].sort_order = order;
        Ok(())
    }
}

/// Submission store assigning sequence ids and wall-clock timestamps.
#[derive(Default, Clone)]
pub(crate) struct InMemorySubmissionStore {
    submissions: Arc<Mutex<Vec<Submission>>>,
    sequence: Arc<AtomicU64>,
}

impl SubmissionStore for InMemorySubmissionStore {
    fn insert(&self, draft: SubmissionDraft) -> Result<Submission, PersistenceError> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
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
            created_at: Utc::now(),
        };
        self.submissions
            .lock()
            .expect("submission store mutex poisoned")
            .push(submission.clone());
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

/// Install the standard contact schema for every known category whose store
/// is still empty. Seeding goes through the registry so normalization and the
/// append-at-end order policy apply exactly as they would for an
/// administrator.
pub(crate) fn seed_field_definitions<F>(registry: &FieldRegistry<F>) -> Result<(), RegistryError>
where
    F: FieldStore,
{
    for tag in ServiceCategory::KNOWN {
        let category = ServiceCategory::new(tag);
        if !registry.list_fields(&category, false)?.is_empty() {
            continue;
        }
        for draft in default_drafts(&category) {
            registry.create_field(draft)?;
        }
    }
    Ok(())
}

fn default_drafts(category: &ServiceCategory) -> Vec<FieldDraft> {
    let field = |name: &str, label: &str, kind: FieldKind, placeholder: Option<&str>, required| {
        FieldDraft {
            service_type: category.clone(),
            field_name: name.to_string(),
            field_label: label.to_string(),
            field_type: kind,
            placeholder: placeholder.map(str::to_string),
            is_required: required,
            is_active: true,
            sort_order: None,
        }
    };

    let mut drafts = vec![
        field("name", "Name", FieldKind::Text, Some("Your full name"), true),
        field("email", "Email", FieldKind::Email, Some("you@company.com"), true),
        field("phone", "Phone", FieldKind::Phone, None, false),
        field("company", "Company", FieldKind::Text, None, false),
        field("subject", "Subject", FieldKind::Text, None, false),
        field(
            "message",
            "Message",
            FieldKind::Textarea,
            Some("How can we help?"),
            true,
        ),
    ];

    drafts.push(match category.as_str() {
        "conferences" => field("preferred_date", "Preferred date", FieldKind::Date, None, false),
        "roundtable" => field("participants", "Participants", FieldKind::Number, None, false),
        "in-house" => field("team_size", "Team size", FieldKind::Number, None, false),
        _ => field(
            "sample_url",
            "Sample data URL",
            FieldKind::Url,
            Some("https://"),
            false,
        ),
    });

    drafts
}
