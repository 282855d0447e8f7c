use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::domain::{
    FieldDefinition, FieldDraft, FieldId, FieldPatch, ServiceCategory, ValidationError,
};
use super::store::{FieldStore, PersistenceError};

/// Administrative service over the per-category field definitions.
pub struct FieldRegistry<F> {
    store: Arc<F>,
}

static FIELD_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_field_id() -> FieldId {
    let id = FIELD_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    FieldId(format!("fld-{id:06}"))
}

/// Reduce a human-entered field name to the machine format used as the
/// `form_data` key: trimmed, ASCII-lowercased, runs of whitespace collapsed
/// to single underscores.
pub fn normalize_field_name(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyFieldName);
    }

    let mut normalized = String::with_capacity(trimmed.len());
    let mut in_gap = false;
    for ch in trimmed.chars() {
        if ch.is_whitespace() {
            if !in_gap {
                normalized.push('_');
                in_gap = true;
            }
            continue;
        }
        in_gap = false;
        normalized.push(ch.to_ascii_lowercase());
    }

    if !normalized
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_')
    {
        return Err(ValidationError::UnusableFieldName(raw.to_string()));
    }

    Ok(normalized)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReorderDirection {
    Up,
    Down,
}

impl<F> FieldRegistry<F>
where
    F: FieldStore,
{
    pub fn new(store: Arc<F>) -> Self {
        Self { store }
    }

    /// Definitions of the category sorted ascending by `sort_order`, ties
    /// kept in insertion order. An empty category is an empty list, never an
    /// error.
    pub fn list_fields(
        &self,
        category: &ServiceCategory,
        only_active: bool,
    ) -> Result<Vec<FieldDefinition>, RegistryError> {
        let mut fields = self.store.list(category)?;
        if only_active {
            fields.retain(|field| field.is_active);
        }
        // Stable sort: equal sort_order values keep the store's insertion order.
        fields.sort_by_key(|field| field.sort_order);
        Ok(fields)
    }

    /// Create a definition, normalizing the field name and appending at the
    /// end of the category unless the draft carries an explicit position.
    pub fn create_field(&self, draft: FieldDraft) -> Result<FieldDefinition, RegistryError> {
        let field_name = normalize_field_name(&draft.field_name)?;
        let siblings = self.store.list(&draft.service_type)?;

        if draft.is_active
            && siblings
                .iter()
                .any(|field| field.is_active && field.field_name == field_name)
        {
            return Err(ValidationError::DuplicateFieldName {
                field_name,
                service_type: draft.service_type,
            }
            .into());
        }

        let sort_order = draft
            .sort_order
            .unwrap_or_else(|| siblings.len() as i32);

        let definition = FieldDefinition {
            id: next_field_id(),
            service_type: draft.service_type,
            field_name,
            field_label: draft.field_label,
            field_type: draft.field_type,
            placeholder: draft.placeholder.filter(|hint| !hint.trim().is_empty()),
            is_required: draft.is_required,
            is_active: draft.is_active,
            sort_order,
        };

        Ok(self.store.insert(definition)?)
    }

    /// Apply a partial update. `sort_order` only changes when the patch
    /// carries it; a renamed field is re-normalized and re-checked for
    /// collisions with its active siblings.
    pub fn update_field(
        &self,
        id: &FieldId,
        patch: FieldPatch,
    ) -> Result<FieldDefinition, RegistryError> {
        let mut definition = self
            .store
            .fetch(id)?
            .ok_or(PersistenceError::NotFound)?;

        if let Some(raw) = patch.field_name {
            let field_name = normalize_field_name(&raw)?;
            if field_name != definition.field_name {
                let siblings = self.store.list(&definition.service_type)?;
                let taken = siblings.iter().any(|field| {
                    field.id != definition.id
                        && field.is_active
                        && field.field_name == field_name
                });
                if definition.is_active && taken {
                    return Err(ValidationError::DuplicateFieldName {
                        field_name,
                        service_type: definition.service_type,
                    }
                    .into());
                }
                definition.field_name = field_name;
            }
        }
        if let Some(label) = patch.field_label {
            definition.field_label = label;
        }
        if let Some(kind) = patch.field_type {
            definition.field_type = kind;
        }
        if let Some(placeholder) = patch.placeholder {
            definition.placeholder = if placeholder.trim().is_empty() {
                None
            } else {
                Some(placeholder)
            };
        }
        if let Some(required) = patch.is_required {
            definition.is_required = required;
        }
        if let Some(active) = patch.is_active {
            definition.is_active = active;
        }
        if let Some(sort_order) = patch.sort_order {
            definition.sort_order = sort_order;
        }

        self.store.update(definition.clone())?;
        Ok(definition)
    }

    /// Hard delete. The surviving definitions keep their `sort_order` values,
    /// gaps included.
    pub fn delete_field(&self, id: &FieldId) -> Result<(), RegistryError> {
        Ok(self.store.delete(id)?)
    }

    /// Swap the definition with its neighbor in the current sort order. At
    /// either boundary this is a no-op: nothing is written and no error is
    /// raised.
    pub fn reorder_field(
        &self,
        id: &FieldId,
        direction: ReorderDirection,
    ) -> Result<(), RegistryError> {
        let current = self
            .store
            .fetch(id)?
            .ok_or(PersistenceError::NotFound)?;

        let mut fields = self.store.list(&current.service_type)?;
        fields.sort_by_key(|field| field.sort_order);

        let position = fields
            .iter()
            .position(|field| field.id == current.id)
            .ok_or(PersistenceError::NotFound)?;

        let neighbor = match direction {
            ReorderDirection::Up => position.checked_sub(1),
            ReorderDirection::Down => (position + 1 < fields.len()).then_some(position + 1),
        };
        let Some(neighbor) = neighbor else {
            return Ok(());
        };

        self.store
            .swap_order(&fields[position].id, &fields[neighbor].id)?;
        Ok(())
    }

    /// Flip `is_active` without touching anything else.
    pub fn toggle_active(&self, id: &FieldId) -> Result<FieldDefinition, RegistryError> {
        let mut definition = self
            .store
            .fetch(id)?
            .ok_or(PersistenceError::NotFound)?;
        definition.is_active = !definition.is_active;
        self.store.update(definition.clone())?;
        Ok(definition)
    }
}

/// Error raised by registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
