//! Error types for moderation operations

use std::error::Error;
use std::fmt;

/// Boxed error type for error sources
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Result type alias for moderation operations
pub type Result<T> = std::result::Result<T, ModerationError>;

/// Moderation pipeline error with rich diagnostics
///
/// Every failure the pipeline can surface carries an [`ErrorKind`] so callers
/// can decide how to react (show a form error, return 404, retry) without
/// matching on message text.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub struct ModerationError {
    kind: ErrorKind,
    #[source]
    source: Option<BoxError>,
    #[help]
    help: Option<String>,
    context: Option<String>,
}

/// Error categories for moderation operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Empty or malformed input, rejected before any scoring or writes
    Validation,
    /// The referenced content item or report does not exist
    NotFound,
    /// The item is not in a state that allows the requested transition
    InvalidState,
    /// Lost a per-item version race; the whole operation may be retried
    ConcurrencyConflict,
    /// Persistence backend failed
    Storage,
    /// Rule or threshold configuration is invalid
    Config,
    /// Serialization/deserialization failed
    Serialization,
    /// I/O error
    Io,
}

impl ErrorKind {
    /// Stable machine-readable name for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "Validation",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::InvalidState => "InvalidState",
            ErrorKind::ConcurrencyConflict => "ConcurrencyConflict",
            ErrorKind::Storage => "Storage",
            ErrorKind::Config => "Config",
            ErrorKind::Serialization => "Serialization",
            ErrorKind::Io => "Io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ModerationError {
    /// Create a new error with the given kind and optional source
    pub fn new(kind: ErrorKind, source: Option<BoxError>) -> Self {
        Self {
            kind,
            source,
            help: None,
            context: None,
        }
    }

    /// Add a help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Add context information to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Context string, if any
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Whether the caller should retry the whole operation
    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::ConcurrencyConflict
    }

    // Constructors for different error kinds

    /// Create a validation error
    pub fn validation(field: &str, msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, Some(msg.into().into()))
            .with_context(format!("field: {}", field))
    }

    /// Create a not found error
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        Self::new(ErrorKind::NotFound, None)
            .with_context(format!("{} not found: {}", resource, id))
    }

    /// Create an invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidState, None).with_context(msg)
    }

    /// Create a concurrency conflict error
    pub fn conflict(resource: &str, id: impl fmt::Display) -> Self {
        Self::new(ErrorKind::ConcurrencyConflict, None)
            .with_context(format!("{} {} was modified concurrently", resource, id))
            .with_help("retry the whole operation; nothing was applied")
    }

    /// Create a storage error
    pub fn storage(source: impl Error + Send + Sync + 'static) -> Self {
        Self::new(ErrorKind::Storage, Some(Box::new(source)))
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, Some(msg.into().into()))
    }

    /// Create a serialization error
    pub fn serialization(source: impl Error + Send + Sync + 'static) -> Self {
        Self::new(ErrorKind::Serialization, Some(Box::new(source)))
    }

    /// Create an I/O error
    pub fn io(source: impl Error + Send + Sync + 'static) -> Self {
        Self::new(ErrorKind::Io, Some(Box::new(source)))
    }
}

impl fmt::Display for ModerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(ctx) = &self.context {
            write!(f, ": {}", ctx)?;
        }

        if let Some(src) = &self.source {
            write!(f, ": {}", src)?;
        }

        Ok(())
    }
}

impl From<std::io::Error> for ModerationError {
    fn from(e: std::io::Error) -> Self {
        ModerationError::io(e)
    }
}

impl From<serde_json::Error> for ModerationError {
    fn from(e: serde_json::Error) -> Self {
        ModerationError::serialization(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_context() {
        let err = ModerationError::not_found("content", "3kabc");
        assert_eq!(err.to_string(), "NotFound: content not found: 3kabc");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn only_conflicts_are_retryable() {
        assert!(ModerationError::conflict("content", "x").is_retryable());
        assert!(!ModerationError::invalid_state("done").is_retryable());
        assert!(!ModerationError::validation("text", "empty").is_retryable());
    }

    #[test]
    fn validation_carries_field_and_message() {
        let err = ModerationError::validation("reporter", "must not be empty");
        let rendered = err.to_string();
        assert!(rendered.starts_with("Validation: field: reporter"));
        assert!(rendered.ends_with("must not be empty"));
    }
}
