//! The schema-driven enquiry-form engine: per-category field definitions,
//! form rendering state, submission validation and persistence, and the
//! reviewer triage workflow.
//!
//! Data flows one way at submission time (registry → session → intake) and
//! one way at review time (submission store → triage). The registry and the
//! submission store are independent; a stored submission is a point-in-time
//! snapshot that outlives later edits to the definitions it was rendered
//! from.

pub mod domain;
pub mod intake;
pub mod layout;
pub mod registry;
pub mod router;
pub mod session;
pub mod store;
pub mod triage;

#[cfg(test)]
mod tests;

pub use domain::{
    FieldDefinition, FieldDraft, FieldId, FieldKind, FieldPatch, ServiceCategory, Submission,
    SubmissionDraft, SubmissionFilter, SubmissionId, SubmissionStatus, ValidationError,
};
pub use intake::{build_payload, validate, IntakeError, SubmissionIntake};
pub use layout::{layout, FormLayout, FormRow};
pub use registry::{normalize_field_name, FieldRegistry, RegistryError, ReorderDirection};
pub use router::{forms_router, FormView, FormsState};
pub use session::{FormSession, SessionPhase};
pub use store::{FieldStore, PersistenceError, SubmissionStore};
pub use triage::{TriageError, TriageService};
