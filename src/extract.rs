//! Structured value extraction from a form subtree.
//!
//! Pure functions over [`Document`]: no state, no side effects, so extraction
//! is idempotent and never fails — controls that cannot be resolved are
//! skipped, never turned into placeholders.

use crate::dom::{Document, NodeId};
use crate::value::FormValue;

/// Suffix marking a field as part of a repeated group. Stripped from the key
/// in the extracted mapping; matching elements collect into an ordered list.
pub const REPEAT_MARKER: &str = "[]";

/// Extract the value of a form or fieldset subtree as an ordered mapping.
///
/// Enumerates the container's controls in document order, skipping submit and
/// button controls. Checkboxes resolve to their checked state, radios to the
/// checked member of their group, fieldsets recurse into nested mappings, and
/// everything else to its current value text. Names ending in [`REPEAT_MARKER`]
/// collect all same-named elements into a list under the stripped name. The
/// first occurrence of a name wins; later duplicates are ignored, so a radio
/// or checkbox group is scanned once.
pub fn extract(doc: &Document, root: NodeId) -> FormValue {
    container_value(doc, root)
}

fn is_control_tag(tag: &str) -> bool {
    matches!(tag, "input" | "button" | "select" | "textarea" | "fieldset")
}

/// Controls in `container`'s subtree, document order. Does not descend into
/// nested fieldsets: their controls belong to the nested mapping produced by
/// recursion, so a leaf name never surfaces at two levels at once.
fn controls_in(doc: &Document, container: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    collect_controls(doc, container, &mut out);
    out
}

fn collect_controls(doc: &Document, node: NodeId, out: &mut Vec<NodeId>) {
    for &child in doc.children(node) {
        if is_control_tag(doc.tag(child)) {
            out.push(child);
        }
        if doc.tag(child) != "fieldset" {
            collect_controls(doc, child, out);
        }
    }
}

fn container_value(doc: &Document, container: NodeId) -> FormValue {
    let controls = controls_in(doc, container);
    let mut entries: Vec<(String, FormValue)> = Vec::new();

    for &control in &controls {
        if doc.tag(control) == "button" {
            continue;
        }
        if matches!(doc.attr(control, "type"), Some("submit") | Some("button")) {
            continue;
        }
        let Some(name) = doc.attr(control, "name") else {
            tracing::debug!(tag = doc.tag(control), "skipping unnamed control");
            continue;
        };
        let name = name.to_string();

        let (base, repeated) = match name.strip_suffix(REPEAT_MARKER) {
            Some(base) => (base.to_string(), true),
            None => (name.clone(), false),
        };
        if entries.iter().any(|(key, _)| *key == base) {
            continue;
        }

        if repeated {
            let items: Vec<FormValue> = controls
                .iter()
                .filter(|&&c| doc.attr(c, "name") == Some(name.as_str()))
                .filter_map(|&c| control_value(doc, c))
                .collect();
            entries.push((base, FormValue::List(items)));
        } else if let Some(value) = control_value(doc, control) {
            entries.push((base, value));
        }
    }

    FormValue::Map(entries)
}

/// Resolve one control to a value, or `None` when it has none (a radio group
/// with no checked member).
fn control_value(doc: &Document, control: NodeId) -> Option<FormValue> {
    match logical_type(doc, control).as_str() {
        "fieldset" | "form" => Some(container_value(doc, control)),
        "checkbox" => Some(FormValue::Bool(doc.attr(control, "checked").is_some())),
        "radio" => checked_radio_value(doc, control),
        _ => Some(FormValue::Text(
            doc.attr(control, "value").unwrap_or_default().to_string(),
        )),
    }
}

/// Logical control type: the `type` attribute for generic inputs (defaulting
/// to text), the tag name for everything else.
fn logical_type(doc: &Document, control: NodeId) -> String {
    if doc.tag(control) == "input" {
        doc.attr(control, "type").unwrap_or("text").to_ascii_lowercase()
    } else {
        doc.tag(control).to_string()
    }
}

/// Value of the checked radio sharing this radio's name within the nearest
/// enclosing form. Absent when no member is checked or there is no form.
fn checked_radio_value(doc: &Document, radio: NodeId) -> Option<FormValue> {
    let name = doc.attr(radio, "name")?.to_string();
    let form = doc.closest(radio, |d, n| d.tag(n) == "form")?;
    let checked = doc.find_first(form, |d, n| {
        d.tag(n) == "input"
            && d.attr(n, "type") == Some("radio")
            && d.attr(n, "name") == Some(name.as_str())
            && d.attr(n, "checked").is_some()
    })?;
    Some(FormValue::Text(
        doc.attr(checked, "value").unwrap_or_default().to_string(),
    ))
}
