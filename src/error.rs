//! Error types for the form engine.
//!
//! Configuration errors use [`EngineError`] via `thiserror`. The async
//! transport seam returns `anyhow::Result` instead; see `submit::transport`.

/// Schema/configuration errors raised while building widgets.
///
/// These are fatal to the affected form construction and are never swallowed.
/// Runtime conditions (missing elements, unparseable error bodies) are
/// recovered locally and do not surface here.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A field descriptor names a type with no registered builder.
    #[error("no builder registered for field '{field}'")]
    UnknownFieldType { field: String },

    /// Two field descriptors share the same id.
    #[error("duplicate field id '{field}' in schema")]
    DuplicateFieldId { field: String },
}
