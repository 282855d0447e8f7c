use serde::Serialize;

use super::domain::FieldDefinition;

/// One rendered row of an enquiry form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "row", rename_all = "snake_case")]
pub enum FormRow {
    /// Full-width row holding a single multi-line field.
    Full { field: FieldDefinition },
    /// Two-column row of compact fields; `right` is absent for an odd field
    /// out, which renders alone in its row.
    Pair {
        left: FieldDefinition,
        right: Option<FieldDefinition>,
    },
}

/// Computed layout for a schema, ready for a template to walk.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormLayout {
    pub rows: Vec<FormRow>,
}

impl FormLayout {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Lay out a schema for rendering.
///
/// Multi-line fields each take a full-width row and come before the compact
/// grid; the compact kinds then fill two-column rows, first with second,
/// third with fourth, and so on. Both groups keep the relative order of the
/// schema they were filtered from — the textarea-first split is a deliberate
/// layout rule, not a sorting accident, and it is applied the same way
/// everywhere a schema is rendered.
pub fn layout(schema: &[FieldDefinition]) -> FormLayout {
    let mut rows: Vec<FormRow> = schema
        .iter()
        .filter(|field| !field.field_type.is_compact())
        .map(|field| FormRow::Full {
            field: field.clone(),
        })
        .collect();

    let compact: Vec<&FieldDefinition> = schema
        .iter()
        .filter(|field| field.field_type.is_compact())
        .collect();
    for pair in compact.chunks(2) {
        rows.push(FormRow::Pair {
            left: pair[0].clone(),
            right: pair.get(1).map(|field| (*field).clone()),
        });
    }

    FormLayout { rows }
}
