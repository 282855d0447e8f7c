use std::sync::Arc;

use super::domain::{Submission, SubmissionFilter, SubmissionId, SubmissionStatus};
use super::store::{PersistenceError, SubmissionStore};

/// Reviewer-facing service over stored submissions: filtered listing, status
/// transitions, and a flat CSV export.
///
/// Triage never rewrites field definitions, and merely viewing a submission
/// never changes its status.
pub struct TriageService<S> {
    store: Arc<S>,
}

impl<S> TriageService<S>
where
    S: SubmissionStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Submissions matching the filter, newest first. Equal timestamps keep
    /// the store's insertion order.
    pub fn list_submissions(
        &self,
        filter: &SubmissionFilter,
    ) -> Result<Vec<Submission>, PersistenceError> {
        let mut submissions = self.store.list(filter)?;
        submissions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(submissions)
    }

    /// Overwrite the status. Any state may move to any other — `resolved`
    /// back to `in-progress` is as valid as `new` to `closed`.
    pub fn set_status(
        &self,
        id: &SubmissionId,
        status: SubmissionStatus,
    ) -> Result<Submission, PersistenceError> {
        self.store.set_status(id, status)
    }

    /// Flatten the filtered listing to CSV: one row per submission with the
    /// promoted columns and `form_data` as a JSON object string.
    pub fn export_csv(&self, filter: &SubmissionFilter) -> Result<String, TriageError> {
        let submissions = self.list_submissions(filter)?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "id",
            "service_type",
            "status",
            "created_at",
            "name",
            "email",
            "phone",
            "company",
            "subject",
            "message",
            "form_data",
        ])?;

        for submission in &submissions {
            let form_data = serde_json::to_string(&submission.form_data)?;
            writer.write_record([
                submission.id.0.as_str(),
                submission.service_type.as_str(),
                submission.status.label(),
                &submission.created_at.to_rfc3339(),
                submission.name.as_str(),
                submission.email.as_str(),
                submission.phone.as_deref().unwrap_or(""),
                submission.company.as_deref().unwrap_or(""),
                submission.subject.as_deref().unwrap_or(""),
                submission.message.as_str(),
                form_data.as_str(),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|error| TriageError::Export(error.into_error().into()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Error raised by triage operations.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("failed to write export: {0}")]
    Export(#[from] csv::Error),
    #[error("failed to encode form data: {0}")]
    Encode(#[from] serde_json::Error),
}
