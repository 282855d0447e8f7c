use super::domain::{
    FieldDefinition, FieldId, ServiceCategory, Submission, SubmissionDraft, SubmissionFilter,
    SubmissionId, SubmissionStatus,
};

/// Storage abstraction for field definitions so the registry and renderer can
/// be exercised in isolation.
pub trait FieldStore: Send + Sync {
    /// Every definition of the category, active or not, in insertion order.
    fn list(&self, category: &ServiceCategory) -> Result<Vec<FieldDefinition>, PersistenceError>;

    fn fetch(&self, id: &FieldId) -> Result<Option<FieldDefinition>, PersistenceError>;

    fn insert(&self, definition: FieldDefinition) -> Result<FieldDefinition, PersistenceError>;

    fn update(&self, definition: FieldDefinition) -> Result<(), PersistenceError>;

    /// Hard delete. Remaining `sort_order` values are left as-is.
    fn delete(&self, id: &FieldId) -> Result<(), PersistenceError>;

    /// Exchange the `sort_order` values of two definitions.
    ///
    /// A backend with transactions must apply both writes as one; a backend
    /// without them has a window where two concurrent reorders interleave and
    /// leave duplicate `sort_order` values behind. Implementations that accept
    /// that window should say so in their own docs.
    fn swap_order(&self, first: &FieldId, second: &FieldId) -> Result<(), PersistenceError>;
}

/// Storage abstraction for submissions.
pub trait SubmissionStore: Send + Sync {
    /// Persist a new submission with `status = new`, assigning its id and
    /// creation timestamp.
    fn insert(&self, draft: SubmissionDraft) -> Result<Submission, PersistenceError>;

    fn fetch(&self, id: &SubmissionId) -> Result<Option<Submission>, PersistenceError>;

    /// Submissions matching the filter, in no particular order.
    fn list(&self, filter: &SubmissionFilter) -> Result<Vec<Submission>, PersistenceError>;

    /// Unconditional status overwrite; returns the updated record.
    fn set_status(
        &self,
        id: &SubmissionId,
        status: SubmissionStatus,
    ) -> Result<Submission, PersistenceError>;
}

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("record not found")]
    NotFound,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
