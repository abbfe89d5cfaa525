//! formbind - generic form binding engine
//!
//! Converts a form/fieldset element tree into a structured value, maps a
//! structured server error response back onto the tree as inline annotations,
//! and builds labeled controls from a declarative field-descriptor schema.
//! Page wiring (endpoints, success handling, layout) stays with the consumer,
//! which plugs in through [`submit::SubmitOptions`] hooks.

pub mod annotate;
pub mod dom;
pub mod error;
pub mod extract;
pub mod submit;
pub mod value;
pub mod widgets;

pub use annotate::{FieldErrorSet, FieldErrors, FormErrorSet};
pub use dom::{Document, NodeId};
pub use error::EngineError;
pub use extract::{extract, REPEAT_MARKER};
pub use submit::{SubmissionController, SubmitFailure, SubmitOptions, SubmitState};
pub use value::FormValue;
pub use widgets::{FieldDefault, FieldDescriptor, FieldType, WidgetRegistry};
