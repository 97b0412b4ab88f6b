//! Template context: serializable rendering payload built from a [`Record`].

use std::collections::BTreeMap;

use serde::Serialize;

use sheetmail_core::Record;

use crate::error::RenderError;
use crate::mustache::slot_ident;

/// Slot values for one record.
///
/// Every slot the template references is present. A field the record lacks
/// is bound to the empty string, which is what a missing mustache key renders
/// as and what makes `{{#name}}` sections false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RecordContext {
    values: BTreeMap<String, String>,
}

impl RecordContext {
    /// Bind `record` to the template's `slots` (field names in slot order).
    pub fn from_record(slots: &[String], record: &Record) -> Self {
        let values = slots
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let value = record.get(name).unwrap_or_default().to_string();
                (slot_ident(idx), value)
            })
            .collect();
        RecordContext { values }
    }

    /// Value bound to slot `idx`, if the template has that slot.
    pub fn slot(&self, idx: usize) -> Option<&str> {
        self.values.get(&slot_ident(idx)).map(String::as_str)
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}
