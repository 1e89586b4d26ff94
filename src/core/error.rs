//! Error types for the stage/channel system.

use std::sync::Arc;
use thiserror::Error;

/// The main error type for pipelines, stages and supervisors.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// A source failed to generate an item
    #[error("Source error: {0}")]
    Source(Arc<dyn std::error::Error + Send + Sync>),

    /// A processor failed to transform an item
    #[error("Processor error: {0}")]
    Processor(Arc<dyn std::error::Error + Send + Sync>),

    /// A sink failed to accept an item
    #[error("Sink error: {0}")]
    Sink(Arc<dyn std::error::Error + Send + Sync>),

    /// A stage gave up early (reported when the pipeline runs fail-fast)
    #[error("Stage {stage} stopped: {reason}")]
    Stage { stage: String, reason: String },

    /// The receiving side of a transport was dropped
    #[error("Channel was closed by the receiver")]
    ChannelClosed,

    /// A polymorphic item did not wrap the expected concrete type
    #[error("Downcast failed: expected {expected}, found {found}")]
    Downcast {
        expected: &'static str,
        found: &'static str,
    },

    /// A supervised task panicked or was aborted
    #[error("Task {task} panicked: {message}")]
    TaskPanicked { task: String, message: String },

    /// I/O failure inside a sink or source
    #[error("I/O error: {0}")]
    Io(Arc<std::io::Error>),

    /// A custom error with a message
    #[error("{0}")]
    Custom(String),

    /// Multiple errors occurred (e.g. several supervised tasks failed)
    #[error("Multiple errors occurred: {}", join_errors(.0))]
    Multiple(Vec<Error>),
}

fn join_errors(errors: &[Error]) -> String {
    errors
        .iter()
        .map(|e| format!("[{}]", e))
        .collect::<Vec<_>>()
        .join(", ")
}

// Convenience constructors
impl Error {
    /// Create a source error from any error type
    pub fn source<E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        Error::Source(Arc::new(error))
    }

    /// Create a processor error from any error type
    pub fn processor<E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        Error::Processor(Arc::new(error))
    }

    /// Create a sink error from any error type
    pub fn sink<E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        Error::Sink(Arc::new(error))
    }

    /// Create a custom error with a message
    pub fn custom<S: Into<String>>(message: S) -> Self {
        Error::Custom(message.into())
    }

    /// Whether this error signals a wiring bug rather than a runtime condition.
    ///
    /// Contract violations are never downgraded to an ordinary end-of-stream;
    /// the stage that hits one returns it from its task.
    pub fn is_contract_violation(&self) -> bool {
        match self {
            Error::Downcast { .. } => true,
            Error::Multiple(errors) => errors.iter().any(Error::is_contract_violation),
            _ => false,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(Arc::new(e))
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Custom(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Custom(s.to_string())
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Helper trait for converting errors into our Error type
pub trait IntoError<T> {
    fn into_source_error(self) -> Result<T>;
    fn into_processor_error(self) -> Result<T>;
    fn into_sink_error(self) -> Result<T>;
}

impl<T, E> IntoError<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn into_source_error(self) -> Result<T> {
        self.map_err(Error::source)
    }

    fn into_processor_error(self) -> Result<T> {
        self.map_err(Error::processor)
    }

    fn into_sink_error(self) -> Result<T> {
        self.map_err(Error::sink)
    }
}
