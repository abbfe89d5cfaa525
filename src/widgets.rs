//! Schema-driven form construction.
//!
//! Builds labeled controls from declarative field descriptors through an
//! explicit type-to-builder registry. Unknown field types are a configuration
//! error, never a silent no-op: the whole schema is validated before any
//! widget is built.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::annotate::{FIELD_GROUP_CLASS, HELP_BLOCK_CLASS};
use crate::dom::{Document, NodeId};
use crate::error::EngineError;

/// Control type of a field descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Single-line text control.
    String,
    /// Multi-line text control.
    Text,
    /// Numeric control constrained to positive integers.
    Integer,
    /// Any type tag this crate does not know. Schemas carrying it fail
    /// validation in [`WidgetRegistry::build_form`] unless a consumer
    /// registered a builder for it.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Default value carried by a descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldDefault {
    Text(String),
    Number(i64),
}

impl fmt::Display for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::Text(s) => f.write_str(s),
            FieldDefault::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Declarative description of one form control.
///
/// `id` doubles as the control's name/id attributes and as the key in
/// extracted values; the visible label is derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldDefault>,
}

impl FieldDescriptor {
    /// Create a descriptor with no description or default.
    pub fn new(id: &str, field_type: FieldType) -> Self {
        Self {
            id: id.to_string(),
            field_type,
            description: None,
            default: None,
        }
    }

    /// Create a single-line string descriptor.
    pub fn string(id: &str) -> Self {
        Self::new(id, FieldType::String)
    }

    /// Create a multi-line text descriptor.
    pub fn text(id: &str) -> Self {
        Self::new(id, FieldType::Text)
    }

    /// Create a positive-integer descriptor.
    pub fn integer(id: &str) -> Self {
        Self::new(id, FieldType::Integer)
    }
}

/// Derive a display label from a field id: split on underscores, capitalize
/// each word.
pub fn derive_label(id: &str) -> String {
    id.split('_')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A registered widget builder: produces the labeled field group for one
/// descriptor.
pub type WidgetBuilder = fn(&mut Document, &FieldDescriptor) -> NodeId;

/// Explicit table from field type to builder.
///
/// [`WidgetRegistry::new`] registers the built-in builders; consumers may
/// register more (or start [`WidgetRegistry::empty`] and allow a subset).
pub struct WidgetRegistry {
    builders: HashMap<FieldType, WidgetBuilder>,
}

impl Default for WidgetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetRegistry {
    /// Registry with the built-in string/text/integer builders.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(FieldType::String, build_string_input);
        registry.register(FieldType::Text, build_text_input);
        registry.register(FieldType::Integer, build_integer_input);
        registry
    }

    /// Registry with no builders.
    pub fn empty() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Register (or replace) the builder for a field type.
    pub fn register(&mut self, field_type: FieldType, builder: WidgetBuilder) {
        self.builders.insert(field_type, builder);
    }

    /// Build a form containing one labeled control per descriptor, in
    /// descriptor order.
    ///
    /// The whole schema is validated first: an unregistered field type or a
    /// duplicate id fails the build before any widget exists.
    pub fn build_form(
        &self,
        doc: &mut Document,
        descriptors: &[FieldDescriptor],
    ) -> Result<NodeId, EngineError> {
        for (index, descriptor) in descriptors.iter().enumerate() {
            if !self.builders.contains_key(&descriptor.field_type) {
                return Err(EngineError::UnknownFieldType {
                    field: descriptor.id.clone(),
                });
            }
            if descriptors[..index].iter().any(|d| d.id == descriptor.id) {
                return Err(EngineError::DuplicateFieldId {
                    field: descriptor.id.clone(),
                });
            }
        }

        let form = doc.create_element("form");
        doc.set_attr(form, "role", "form");
        for descriptor in descriptors {
            let group = self.builders[&descriptor.field_type](doc, descriptor);
            doc.append_child(form, group);
        }
        Ok(form)
    }
}

/// Wrap a control in a field group with a derived label and, if present, a
/// description line.
fn wrap_control(doc: &mut Document, control: NodeId, descriptor: &FieldDescriptor) -> NodeId {
    let group = doc.create_element("div");
    doc.add_class(group, FIELD_GROUP_CLASS);

    let label = doc.create_element("label");
    doc.set_attr(label, "for", &descriptor.id);
    doc.set_text(label, &derive_label(&descriptor.id));
    doc.append_child(group, label);
    doc.append_child(group, control);

    if let Some(description) = &descriptor.description {
        let help = doc.create_element("p");
        doc.add_class(help, HELP_BLOCK_CLASS);
        doc.set_text(help, description);
        doc.append_child(group, help);
    }
    group
}

fn named_control(doc: &mut Document, tag: &str, descriptor: &FieldDescriptor) -> NodeId {
    let control = doc.create_element(tag);
    doc.add_class(control, "form-control");
    doc.set_attr(control, "id", &descriptor.id);
    doc.set_attr(control, "name", &descriptor.id);
    control
}

fn build_string_input(doc: &mut Document, descriptor: &FieldDescriptor) -> NodeId {
    let input = named_control(doc, "input", descriptor);
    doc.set_attr(input, "type", "text");
    if let Some(default) = &descriptor.default {
        doc.set_attr(input, "placeholder", &default.to_string());
    }
    wrap_control(doc, input, descriptor)
}

fn build_text_input(doc: &mut Document, descriptor: &FieldDescriptor) -> NodeId {
    let area = named_control(doc, "textarea", descriptor);
    doc.set_attr(area, "rows", "3");
    if let Some(default) = &descriptor.default {
        doc.set_attr(area, "placeholder", &default.to_string());
    }
    wrap_control(doc, area, descriptor)
}

fn build_integer_input(doc: &mut Document, descriptor: &FieldDescriptor) -> NodeId {
    let input = named_control(doc, "input", descriptor);
    doc.set_attr(input, "type", "number");
    doc.set_attr(input, "min", "1");
    doc.set_attr(input, "step", "1");
    if let Some(default) = &descriptor.default {
        doc.set_attr(input, "value", &default.to_string());
    }
    wrap_control(doc, input, descriptor)
}
