//! Typed form values.
//!
//! [`FormValue`] is the recursive union produced by extraction: scalar leaves
//! (text, boolean, null), ordered mappings (one entry per distinct field name,
//! insertion order = document order), and sequences for repeated groups.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// A value extracted from a form subtree.
///
/// Every leaf name maps to exactly one scalar; a fieldset or form maps to a
/// `Map`; repeated elements sharing a base name map to a `List` ordered by
/// document position.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    /// Text content of a control (inputs, selects, textareas).
    Text(String),
    /// Checked state of a checkbox.
    Bool(bool),
    /// Explicit null, for consumer-built request values.
    Null,
    /// Nested mapping from a fieldset or form; preserves insertion order.
    Map(Vec<(String, FormValue)>),
    /// Ordered sequence from a repeated group.
    List(Vec<FormValue>),
}

impl FormValue {
    /// Look up an entry of a `Map` value by name. Returns `None` for
    /// non-mapping values.
    pub fn get(&self, name: &str) -> Option<&FormValue> {
        match self {
            FormValue::Map(entries) => entries
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Convert to a `serde_json::Value`. Mapping order is not observable in
    /// the `Value` representation; use the `Serialize` impl when order on the
    /// wire matters.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FormValue::Text(s) => serde_json::Value::String(s.clone()),
            FormValue::Bool(b) => serde_json::Value::Bool(*b),
            FormValue::Null => serde_json::Value::Null,
            FormValue::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
            FormValue::List(items) => {
                serde_json::Value::Array(items.iter().map(FormValue::to_json).collect())
            }
        }
    }
}

impl Serialize for FormValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FormValue::Text(s) => serializer.serialize_str(s),
            FormValue::Bool(b) => serializer.serialize_bool(*b),
            FormValue::Null => serializer.serialize_none(),
            FormValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            FormValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}
