use std::collections::BTreeMap;
use std::sync::Arc;

use super::domain::{FieldDefinition, ServiceCategory, Submission};
use super::intake::{IntakeError, SubmissionIntake};
use super::layout::{layout, FormLayout};
use super::registry::{FieldRegistry, RegistryError};
use super::store::{FieldStore, SubmissionStore};

/// Where a session currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionPhase {
    /// The schema fetch has not completed. Callers must not render a form in
    /// this phase — doing so flashes an empty form before the fields arrive.
    Loading,
    /// Schema loaded; the form can be rendered and edited.
    Ready {
        schema: Vec<FieldDefinition>,
        values: BTreeMap<String, String>,
    },
    /// The category has zero active fields. Render a message-only fallback.
    Empty,
    /// The schema fetch failed. Offer a retry affordance, not an empty form;
    /// calling [`FormSession::load_schema`] again retries.
    Failed { message: String },
}

/// Per-visitor state of one enquiry form: the loaded schema and the value
/// entered so far for each rendered field.
///
/// The session only ever creates submissions; it never rewrites stored ones,
/// and nothing it does mutates the field definitions it rendered from.
pub struct FormSession<F, S> {
    registry: Arc<FieldRegistry<F>>,
    intake: Arc<SubmissionIntake<S>>,
    category: ServiceCategory,
    phase: SessionPhase,
}

impl<F, S> FormSession<F, S>
where
    F: FieldStore,
    S: SubmissionStore,
{
    pub fn new(
        registry: Arc<FieldRegistry<F>>,
        intake: Arc<SubmissionIntake<S>>,
        category: ServiceCategory,
    ) -> Self {
        Self {
            registry,
            intake,
            category,
            phase: SessionPhase::Loading,
        }
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, SessionPhase::Loading)
    }

    pub fn category(&self) -> &ServiceCategory {
        &self.category
    }

    /// Fetch the active schema and reset the input state to empty strings,
    /// one entry per rendered field.
    pub fn load_schema(&mut self) -> Result<(), RegistryError> {
        self.phase = SessionPhase::Loading;
        match self.registry.list_fields(&self.category, true) {
            Ok(schema) if schema.is_empty() => {
                self.phase = SessionPhase::Empty;
                Ok(())
            }
            Ok(schema) => {
                let values = schema
                    .iter()
                    .map(|field| (field.field_name.clone(), String::new()))
                    .collect();
                self.phase = SessionPhase::Ready { schema, values };
                Ok(())
            }
            Err(error) => {
                self.phase = SessionPhase::Failed {
                    message: error.to_string(),
                };
                Err(error)
            }
        }
    }

    /// Record what the visitor typed. Purely local: no storage call, no
    /// validation. A key that was never rendered is ignored.
    pub fn update_value(&mut self, field_name: &str, value: impl Into<String>) {
        if let SessionPhase::Ready { values, .. } = &mut self.phase {
            if let Some(entry) = values.get_mut(field_name) {
                *entry = value.into();
            }
        }
    }

    /// Current value of one field, when the form is ready and renders it.
    pub fn value(&self, field_name: &str) -> Option<&str> {
        match &self.phase {
            SessionPhase::Ready { values, .. } => {
                values.get(field_name).map(String::as_str)
            }
            _ => None,
        }
    }

    /// Layout of the loaded schema; empty in every other phase.
    pub fn layout(&self) -> FormLayout {
        match &self.phase {
            SessionPhase::Ready { schema, .. } => layout(schema),
            _ => FormLayout::default(),
        }
    }

    /// Submit the entered values against the schema rendered to the visitor.
    ///
    /// On success every input resets to the empty string so the form is ready
    /// for another enquiry. On any failure — missing required fields or a
    /// storage error — the entered values are left untouched so the visitor
    /// can correct and resubmit.
    pub fn submit(&mut self) -> Result<Submission, IntakeError> {
        let SessionPhase::Ready { schema, values } = &mut self.phase else {
            return Err(IntakeError::SchemaNotLoaded);
        };

        let submission = self.intake.submit(&self.category, schema, values)?;

        for value in values.values_mut() {
            value.clear();
        }
        Ok(submission)
    }
}
