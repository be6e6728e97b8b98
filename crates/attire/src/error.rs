//! Error types for configuration parsing.

use thiserror::Error;

/// Errors raised while normalizing raw configuration input.
///
/// Every variant surfaces synchronously at parse/construction time (or when
/// parsing per-call adjustments). A successfully constructed registry can
/// never fail resolution for structural reasons: unknown selection keys are
/// tolerated silently.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The raw document text could not be parsed at all.
    #[error("invalid {format} document: {message}")]
    InvalidDocument {
        format: &'static str,
        message: String,
    },

    /// Input did not have the required shape at some level.
    #[error("invalid structure at {context}: {found}")]
    InvalidStructure { context: String, found: String },

    /// An operation object carried zero or more than one operation kind.
    #[error(
        "invalid operation at {context}: expected exactly one of set/append/prepend/remove, found {kinds}"
    )]
    InvalidOperation { context: String, kinds: String },

    /// A compound variant condition value was nested instead of a plain
    /// option key.
    #[error("invalid compound condition: group '{group}' must map to a plain option key")]
    InvalidVariantCondition { group: String },

    /// Defaults were not a flat group-to-option mapping.
    #[error("invalid defaults: {message}")]
    InvalidDefaults { message: String },
}

/// Result type for parsing and resolution.
pub type Result<T> = std::result::Result<T, ParseError>;
