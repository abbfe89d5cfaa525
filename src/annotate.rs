//! Inline annotation of server-reported validation errors.
//!
//! Maps the structured error shapes from a failed submission back onto the
//! element tree: field errors mark the enclosing field group and append a
//! message block; form errors prepend a dismissible banner. Clearing is
//! idempotent. The class vocabulary is public so consumer styling can target
//! the inserted markup.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::dom::{Document, NodeId};
use crate::extract::REPEAT_MARKER;

/// Class marking a labeled control wrapper.
pub const FIELD_GROUP_CLASS: &str = "form-group";
/// Class marking a field group as errored.
pub const ERROR_STATE_CLASS: &str = "has-error";
/// Class on help/message blocks under a field group.
pub const HELP_BLOCK_CLASS: &str = "help-block";
/// Class distinguishing inserted error messages from static help text.
pub const ERROR_MESSAGE_CLASS: &str = "err-msg";
/// Classes on the form-wide error banner.
pub const ALERT_CLASS: &str = "alert";
pub const ALERT_DANGER_CLASS: &str = "alert-danger";
pub const ALERT_DISMISSABLE_CLASS: &str = "alert-dismissable";
pub const FORM_ERROR_CLASS: &str = "form-error";
/// Class on the loading spinner inserted into a submitting control.
pub const SPINNER_CLASS: &str = "spin";

/// Default message used by [`require_value`].
pub const REQUIRED_MESSAGE: &str = "A value is required.";

/// Errors for one field: either a flat message list, or a positional
/// list-of-lists aligned to the document order of a repeated group.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldErrors {
    Flat(Vec<String>),
    Positional(Vec<Vec<String>>),
}

/// Field-name-keyed validation feedback, as sent by the server.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct FieldErrorSet(pub BTreeMap<String, FieldErrors>);

impl FieldErrorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a flat message list for a field.
    pub fn insert(&mut self, field: &str, messages: Vec<String>) {
        self.0.insert(field.to_string(), FieldErrors::Flat(messages));
    }

    /// Add a positional list-of-lists for a repeated field.
    pub fn insert_positional(&mut self, field: &str, lists: Vec<Vec<String>>) {
        self.0
            .insert(field.to_string(), FieldErrors::Positional(lists));
    }
}

/// Validation feedback not attributable to a single field.
pub type FormErrorSet = Vec<String>;

/// Apply field errors under `root`.
///
/// A flat entry annotates the first control matching the field name, falling
/// back to the first element under the repetition-marker-qualified name; all
/// messages join into one block. A positional entry annotates each matching
/// repetition element by index; lists at indexes beyond the matched elements
/// are dropped silently.
pub fn apply_field_errors(doc: &mut Document, root: NodeId, errors: &FieldErrorSet) {
    for (field, entry) in &errors.0 {
        let qualified = format!("{field}{REPEAT_MARKER}");
        match entry {
            FieldErrors::Flat(messages) => {
                let target = doc
                    .find_by_name(root, field)
                    .or_else(|| doc.find_all_by_name(root, &qualified).first().copied());
                match target {
                    Some(control) => mark_errored(doc, control, messages),
                    None => tracing::debug!(field = %field, "no element for field error"),
                }
            }
            FieldErrors::Positional(lists) => {
                let elements = doc.find_all_by_name(root, &qualified);
                for (index, messages) in lists.iter().enumerate() {
                    match elements.get(index) {
                        Some(&control) => mark_errored(doc, control, messages),
                        None => {
                            tracing::debug!(field = %field, index, "dropping mis-indexed field error");
                        }
                    }
                }
            }
        }
    }
}

/// Remove every error mark and message block under `root`. No-op on an
/// already clear tree.
pub fn clear_field_errors(doc: &mut Document, root: NodeId) {
    let groups = doc.find_all(root, |d, n| {
        d.has_class(n, FIELD_GROUP_CLASS) && d.has_class(n, ERROR_STATE_CLASS)
    });
    for group in groups {
        doc.remove_class(group, ERROR_STATE_CLASS);
        remove_message_blocks(doc, group);
    }
}

/// Prepend a dismissible banner joining all messages. Successive calls stack
/// banners; no dedup.
pub fn apply_form_errors(doc: &mut Document, root: NodeId, errors: &[String]) {
    let banner = doc.create_element("div");
    doc.add_class(banner, ALERT_CLASS);
    doc.add_class(banner, ALERT_DANGER_CLASS);
    doc.add_class(banner, ALERT_DISMISSABLE_CLASS);
    doc.add_class(banner, FORM_ERROR_CLASS);
    doc.set_attr(banner, "role", "alert");
    doc.set_text(banner, &errors.join("\n"));

    let close = doc.create_element("button");
    doc.set_attr(close, "type", "button");
    doc.add_class(close, "close");
    doc.set_text(close, "\u{d7}");
    doc.append_child(banner, close);

    doc.prepend_child(root, banner);
}

/// Remove every form-error banner under `root`. No-op on an already clear
/// tree.
pub fn clear_form_errors(doc: &mut Document, root: NodeId) {
    let banners = doc.find_all(root, |d, n| {
        d.has_class(n, ALERT_CLASS) && d.has_class(n, FORM_ERROR_CLASS)
    });
    for banner in banners {
        doc.detach(banner);
    }
}

/// Set (replacing, not appending) the error message on a control's enclosing
/// field group.
pub fn show_error(doc: &mut Document, control: NodeId, message: &str) {
    let Some(group) = enclosing_group(doc, control) else {
        return;
    };
    doc.add_class(group, ERROR_STATE_CLASS);
    let block = doc
        .find_first(group, |d, n| {
            d.has_class(n, HELP_BLOCK_CLASS) && d.has_class(n, ERROR_MESSAGE_CLASS)
        })
        .unwrap_or_else(|| {
            let block = message_block(doc);
            doc.append_child(group, block);
            block
        });
    doc.set_text(block, message);
}

/// Clear the error state of a control's enclosing field group.
pub fn hide_error(doc: &mut Document, control: NodeId) {
    let Some(group) = enclosing_group(doc, control) else {
        return;
    };
    doc.remove_class(group, ERROR_STATE_CLASS);
    remove_message_blocks(doc, group);
}

/// Require a non-empty value on `control`, toggling the error state of its
/// group. Returns whether a value is present. `message` defaults to
/// [`REQUIRED_MESSAGE`].
pub fn require_value(doc: &mut Document, control: NodeId, message: Option<&str>) -> bool {
    let present = doc.attr(control, "value").is_some_and(|v| !v.is_empty());
    if present {
        hide_error(doc, control);
    } else {
        show_error(doc, control, message.unwrap_or(REQUIRED_MESSAGE));
    }
    present
}

/// Toggle the loading state of a trigger control: disabled with a spinner
/// child while loading, re-enabled and spinner-free when not. Setting an
/// already loading control to loading is a no-op.
pub fn set_loading(doc: &mut Document, control: NodeId, loading: bool) {
    let spinners = doc.find_all(control, |d, n| {
        d.tag(n) == "span" && d.has_class(n, SPINNER_CLASS)
    });
    if loading {
        if spinners.is_empty() {
            doc.set_attr(control, "disabled", "disabled");
            let spinner = doc.create_element("span");
            doc.add_class(spinner, SPINNER_CLASS);
            doc.prepend_child(control, spinner);
        }
    } else {
        doc.remove_attr(control, "disabled");
        for spinner in spinners {
            doc.detach(spinner);
        }
    }
}

fn enclosing_group(doc: &Document, control: NodeId) -> Option<NodeId> {
    doc.closest(control, |d, n| d.has_class(n, FIELD_GROUP_CLASS))
}

fn message_block(doc: &mut Document) -> NodeId {
    let block = doc.create_element("p");
    doc.add_class(block, HELP_BLOCK_CLASS);
    doc.add_class(block, ERROR_MESSAGE_CLASS);
    block
}

fn remove_message_blocks(doc: &mut Document, group: NodeId) {
    let blocks = doc.find_all(group, |d, n| {
        d.has_class(n, HELP_BLOCK_CLASS) && d.has_class(n, ERROR_MESSAGE_CLASS)
    });
    for block in blocks {
        doc.detach(block);
    }
}

fn mark_errored(doc: &mut Document, control: NodeId, messages: &[String]) {
    if messages.is_empty() {
        return;
    }
    let Some(group) = enclosing_group(doc, control) else {
        return;
    };
    doc.add_class(group, ERROR_STATE_CLASS);
    let block = message_block(doc);
    doc.set_text(block, &messages.join("\n"));
    doc.append_child(group, block);
}
