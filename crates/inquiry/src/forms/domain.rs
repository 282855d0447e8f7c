use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for field definitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldId(pub String);

/// Identifier wrapper for stored submissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub String);

/// Business-service context a form or submission belongs to.
///
/// Categories are an open set: a new one comes into existence by creating
/// field definitions under a fresh tag, not by touching code. The four tags
/// in [`ServiceCategory::KNOWN`] are the ones the marketing site links to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceCategory(String);

impl ServiceCategory {
    pub const KNOWN: [&'static str; 4] =
        ["conferences", "roundtable", "in-house", "data-generation"];

    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self(tag.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input kind of a form field.
///
/// Closed set: every kind must say how it renders, so a new kind is a
/// compile-checked extension of the `match`es below rather than a stringly
/// branch somewhere in a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Email,
    #[serde(rename = "tel")]
    Phone,
    Textarea,
    Number,
    Url,
    Date,
}

impl FieldKind {
    /// Compact kinds are short enough to share a two-column row; a textarea
    /// always takes a full-width row of its own.
    pub const fn is_compact(self) -> bool {
        match self {
            FieldKind::Text
            | FieldKind::Email
            | FieldKind::Phone
            | FieldKind::Number
            | FieldKind::Url
            | FieldKind::Date => true,
            FieldKind::Textarea => false,
        }
    }

    /// HTML input type (or element, for `textarea`) the kind renders as.
    pub const fn input_type(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Email => "email",
            FieldKind::Phone => "tel",
            FieldKind::Textarea => "textarea",
            FieldKind::Number => "number",
            FieldKind::Url => "url",
            FieldKind::Date => "date",
        }
    }
}

/// Administrator-configured description of one input in a dynamic form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: FieldId,
    pub service_type: ServiceCategory,
    /// Machine name, unique among active definitions of the category; used as
    /// the key in submitted `form_data`.
    pub field_name: String,
    pub field_label: String,
    pub field_type: FieldKind,
    pub placeholder: Option<String>,
    pub is_required: bool,
    /// Inactive definitions are excluded from rendering but kept so historical
    /// submissions stay interpretable.
    pub is_active: bool,
    /// Render position within the category; gaps are fine, ordering is by
    /// relative value with ties broken by insertion order.
    pub sort_order: i32,
}

/// Payload for creating a new field definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDraft {
    pub service_type: ServiceCategory,
    pub field_name: String,
    pub field_label: String,
    pub field_type: FieldKind,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default = "FieldDraft::default_active")]
    pub is_active: bool,
    /// When absent the registry appends at the end of the category.
    #[serde(default)]
    pub sort_order: Option<i32>,
}

impl FieldDraft {
    fn default_active() -> bool {
        true
    }
}

/// Partial update for an existing field definition. Absent entries leave the
/// stored value alone; an empty `placeholder` clears the hint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldPatch {
    #[serde(default)]
    pub field_name: Option<String>,
    #[serde(default)]
    pub field_label: Option<String>,
    #[serde(default)]
    pub field_type: Option<FieldKind>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub is_required: Option<bool>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub sort_order: Option<i32>,
}

/// Review lifecycle of a stored submission. `New` is the only initial state;
/// any state may transition to any other, `Closed` is terminal by convention
/// only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmissionStatus {
    New,
    InProgress,
    Resolved,
    Closed,
}

impl SubmissionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionStatus::New => "new",
            SubmissionStatus::InProgress => "in-progress",
            SubmissionStatus::Resolved => "resolved",
            SubmissionStatus::Closed => "closed",
        }
    }
}

/// A visitor's enquiry, persisted as a point-in-time snapshot.
///
/// `form_data` holds every rendered field keyed by `field_name`; the promoted
/// columns duplicate the well-known entries for convenient querying. The
/// record stays valid even if the originating field definitions are later
/// edited or deactivated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub service_type: ServiceCategory,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub form_data: BTreeMap<String, String>,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
}

/// A submission before the store assigns its id and creation timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionDraft {
    pub service_type: ServiceCategory,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub form_data: BTreeMap<String, String>,
}

/// Triage listing filter; absent entries match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionFilter {
    #[serde(default)]
    pub service_type: Option<ServiceCategory>,
    #[serde(default)]
    pub status: Option<SubmissionStatus>,
}

impl SubmissionFilter {
    pub fn matches(&self, submission: &Submission) -> bool {
        if let Some(category) = &self.service_type {
            if submission.service_type != *category {
                return false;
            }
        }
        if let Some(status) = self.status {
            if submission.status != status {
                return false;
            }
        }
        true
    }
}

/// Rejections raised before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("field name cannot be empty")]
    EmptyFieldName,
    #[error("field name '{0}' does not normalize to lowercase letters, digits, and underscores")]
    UnusableFieldName(String),
    #[error("an active field named '{field_name}' already exists for '{service_type}'")]
    DuplicateFieldName {
        field_name: String,
        service_type: ServiceCategory,
    },
    #[error("required fields missing: {}", .0.join(", "))]
    MissingRequired(Vec<String>),
}
