use std::collections::BTreeMap;
use std::sync::Arc;

use super::domain::{
    FieldDefinition, ServiceCategory, Submission, SubmissionDraft, ValidationError,
};
use super::store::{PersistenceError, SubmissionStore};

/// Check every required field of the schema against the entered values.
///
/// Returns the labels of the failing fields in schema order; an empty list
/// means the submission may be written. A value of pure whitespace counts as
/// missing. Kinds are deliberately not format-checked — an `email` field
/// accepts any non-empty string, matching the engine's observed behavior.
pub fn validate(schema: &[FieldDefinition], values: &BTreeMap<String, String>) -> Vec<String> {
    schema
        .iter()
        .filter(|field| field.is_required)
        .filter(|field| {
            values
                .get(&field.field_name)
                .map_or(true, |value| value.trim().is_empty())
        })
        .map(|field| field.field_label.clone())
        .collect()
}

/// Assemble the dual-shaped submission payload.
///
/// The six well-known columns are promoted out of `values` when present —
/// an absent key is simply empty or `None`, never an error — and `form_data`
/// always carries the complete map, promoted keys included, so every entered
/// value is recoverable by its field name.
pub fn build_payload(
    category: &ServiceCategory,
    values: &BTreeMap<String, String>,
) -> SubmissionDraft {
    SubmissionDraft {
        service_type: category.clone(),
        name: values.get("name").cloned().unwrap_or_default(),
        email: values.get("email").cloned().unwrap_or_default(),
        phone: values.get("phone").cloned(),
        company: values.get("company").cloned(),
        subject: values.get("subject").cloned(),
        message: values.get("message").cloned().unwrap_or_default(),
        form_data: values.clone(),
    }
}

/// Validates entered values against the live schema and writes the payload.
pub struct SubmissionIntake<S> {
    store: Arc<S>,
}

impl<S> SubmissionIntake<S>
where
    S: SubmissionStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Validate, build the payload, and persist it.
    ///
    /// Resubmitting identical input after a transient failure creates a
    /// duplicate submission; there is no idempotency key.
    pub fn submit(
        &self,
        category: &ServiceCategory,
        schema: &[FieldDefinition],
        values: &BTreeMap<String, String>,
    ) -> Result<Submission, IntakeError> {
        let missing = validate(schema, values);
        if !missing.is_empty() {
            return Err(ValidationError::MissingRequired(missing).into());
        }

        let draft = build_payload(category, values);
        Ok(self.store.insert(draft)?)
    }
}

/// Error raised on the submission path.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("form schema is not loaded")]
    SchemaNotLoaded,
}
