//! Core traits and types for the streamrelay library.
//!
//! This module contains the fundamental traits and error types that define
//! the stage model.

pub mod error;
pub mod traits;

// Re-export core items
pub use error::{Error, IntoError, Result};
pub use traits::{BoxProcessor, Processor, Sink, Source};
