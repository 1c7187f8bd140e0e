//! Field type labels
//!
//! Human-readable type names: `map<K,V>` for map entries, the full name for
//! message and enum references, and the scalar name for everything else.

use serde::{Deserialize, Serialize};

use crate::descriptor::{scalar_type_name, DescriptorPool, FieldDescriptor, MessageDescriptor};

const UNKNOWN: &str = "UNKNOWN";

/// Resolved label parts for a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldLabel {
    pub name: String,
    pub type_name: String,
    pub is_map: bool,
    /// Repeated and not a map
    pub repeated: bool,
}

impl FieldLabel {
    /// `name: type`, the text search patterns are applied to
    pub fn match_text(&self) -> String {
        format!("{}: {}", self.name, self.type_name)
    }

    /// Display text, with `marker` appended to repeated fields
    pub fn text(&self, repeated_marker: &str) -> String {
        if self.repeated {
            format!("{} {}", self.match_text(), repeated_marker)
        } else {
            self.match_text()
        }
    }
}

/// The map entry message behind a map field
pub fn map_entry_of<'a>(pool: &'a DescriptorPool, field: &FieldDescriptor) -> Option<&'a MessageDescriptor> {
    field
        .message_type()
        .and_then(|target| pool.message(target))
        .filter(|message| message.map_entry)
}

/// Human-readable type of a field
pub fn resolve_type_name(pool: &DescriptorPool, field: &FieldDescriptor) -> String {
    resolve_with_entries(pool, field, &mut Vec::new())
}

/// `entries` holds the map entries being expanded; an entry whose value leads
/// back to one of them is named instead of expanded again
fn resolve_with_entries<'a>(
    pool: &'a DescriptorPool,
    field: &FieldDescriptor,
    entries: &mut Vec<&'a str>,
) -> String {
    if let Some(entry) = map_entry_of(pool, field) {
        if !entries.contains(&entry.full_name.as_str()) {
            entries.push(entry.full_name.as_str());
            let key = entry
                .field("key")
                .map(|key| resolve_with_entries(pool, key, entries))
                .unwrap_or_else(|| UNKNOWN.to_string());
            let value = entry
                .field("value")
                .map(|value| resolve_with_entries(pool, value, entries))
                .unwrap_or_else(|| UNKNOWN.to_string());
            entries.pop();
            return format!("map<{},{}>", key, value);
        }
    }

    if let Some(target) = field.message_type() {
        return target.to_string();
    }
    if let Some(target) = field.enum_type() {
        return target.to_string();
    }

    scalar_type_name(field.type_code)
        .map(str::to_string)
        .unwrap_or_else(|| field.type_code.to_string())
}

/// Label for a field; maps are never marked repeated
pub fn field_label(pool: &DescriptorPool, field: &FieldDescriptor) -> FieldLabel {
    let is_map = map_entry_of(pool, field).is_some();
    FieldLabel {
        name: field.name.clone(),
        type_name: resolve_type_name(pool, field),
        is_map,
        repeated: field.repeated && !is_map,
    }
}
