//! Adapters between a concrete item stream and a [`PrintableItem`] stream.
//!
//! `Widen<T>` followed (possibly several stages later) by `Narrow<T>` is the
//! identity on a `T` stream. `Narrow` aborts its stage with
//! [`Error::Downcast`](crate::core::Error::Downcast) if it ever meets a
//! handle wrapping some other type, which only happens when a stage that
//! emits a different concrete type is wired into the erased segment.

use async_trait::async_trait;
use std::marker::PhantomData;

use crate::core::{Processor, Result};
use crate::item::{Printable, PrintableItem};

/// Erases `T` to its [`PrintableItem`] view.
pub struct Widen<T> {
    _phantom: PhantomData<fn(T)>,
}

impl<T> Widen<T> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T> Default for Widen<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Printable> Processor for Widen<T> {
    type Input = T;
    type Output = PrintableItem;

    async fn process(&mut self, item: Self::Input) -> Result<Self::Output> {
        Ok(PrintableItem::new(item))
    }
}

/// Recovers `T` from a [`PrintableItem`] with a checked downcast.
pub struct Narrow<T> {
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Narrow<T> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T> Default for Narrow<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Printable> Processor for Narrow<T> {
    type Input = PrintableItem;
    type Output = T;

    async fn process(&mut self, item: Self::Input) -> Result<Self::Output> {
        item.downcast::<T>()
    }
}
