//! Items flowing through a pipeline.
//!
//! [`Book`] is the concrete record carried at the edges of the book
//! pipeline. [`PrintableItem`] is the capability view used by stages that
//! only need a printable representation; it owns the boxed concrete value,
//! so moving it between stages moves the same heap allocation and
//! [`PrintableItem::downcast`] hands that value back without copying.

use std::any::Any;
use std::fmt;

use crate::core::{Error, Result};

/// Type-erasure plumbing for [`Printable`]. Implemented for every sized
/// `'static` type; never implement it by hand.
pub trait AsAny: Any + Send + Sync {
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
    fn as_any(&self) -> &(dyn Any + Send + Sync);
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }

    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Anything that can produce a printable representation of itself.
pub trait Printable: AsAny {
    fn print(&self) -> String;
}

/// A concrete record with an author and a content body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Book {
    pub author: String,
    pub content: String,
}

impl Book {
    pub fn new(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            content: content.into(),
        }
    }

    /// The `index`-th generated book: `Author-{index}` / `Content-{index}`.
    pub fn numbered(index: usize) -> Self {
        Self::new(format!("Author-{}", index), format!("Content-{}", index))
    }
}

impl Printable for Book {
    fn print(&self) -> String {
        self.content.clone()
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.author, self.content)
    }
}

/// A type-erased handle exposing only the [`Printable`] capability.
pub struct PrintableItem(Box<dyn Printable>);

impl PrintableItem {
    /// Wrap a concrete value.
    pub fn new<T: Printable>(value: T) -> Self {
        Self(Box::new(value))
    }

    pub fn print(&self) -> String {
        self.0.print()
    }

    /// Name of the concrete type behind this handle.
    pub fn type_name(&self) -> &'static str {
        (*self.0).type_name()
    }

    pub fn is<T: Printable>(&self) -> bool {
        (*self.0).as_any().is::<T>()
    }

    /// Recover the concrete value.
    ///
    /// Fails with [`Error::Downcast`] if the handle wraps some other type.
    pub fn downcast<T: Printable>(self) -> Result<T> {
        let found = self.type_name();
        AsAny::into_any(self.0)
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| Error::Downcast {
                expected: std::any::type_name::<T>(),
                found,
            })
    }
}

impl fmt::Debug for PrintableItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrintableItem")
            .field("type", &self.type_name())
            .field("print", &self.print())
            .finish()
    }
}
