//! Processor implementations for the streamrelay library.
//!
//! Every processor here is one-in, one-out: it never reorders, drops or
//! duplicates items, so a chain of them preserves the source order.

pub mod adapters;

use async_trait::async_trait;
use std::marker::PhantomData;

use crate::core::{Processor, Result};
use crate::item::PrintableItem;

pub use adapters::{Narrow, Widen};

/// A processor that maps items using a total function.
pub struct MapProcessor<F, T, U> {
    f: F,
    _phantom: PhantomData<fn(T) -> U>,
}

impl<F, T, U> MapProcessor<F, T, U> {
    /// Create a new map processor
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<F, T, U> Processor for MapProcessor<F, T, U>
where
    F: FnMut(T) -> U + Send,
    T: Send + 'static,
    U: Send + 'static,
{
    type Input = T;
    type Output = U;

    async fn process(&mut self, item: Self::Input) -> Result<Self::Output> {
        Ok((self.f)(item))
    }
}

/// A processor that maps items using a fallible function.
///
/// The first `Err` stops the stage running it.
pub struct TryMapProcessor<F, T, U> {
    f: F,
    _phantom: PhantomData<fn(T) -> U>,
}

impl<F, T, U> TryMapProcessor<F, T, U> {
    /// Create a new fallible map processor
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<F, T, U> Processor for TryMapProcessor<F, T, U>
where
    F: FnMut(T) -> Result<U> + Send,
    T: Send + 'static,
    U: Send + 'static,
{
    type Input = T;
    type Output = U;

    async fn process(&mut self, item: Self::Input) -> Result<Self::Output> {
        (self.f)(item)
    }
}

/// A processor that relays items unchanged.
pub struct RelayProcessor<T> {
    _phantom: PhantomData<fn(T) -> T>,
}

impl<T> RelayProcessor<T> {
    /// Create a new relay processor
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T> Default for RelayProcessor<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send + 'static> Processor for RelayProcessor<T> {
    type Input = T;
    type Output = T;

    async fn process(&mut self, item: Self::Input) -> Result<Self::Output> {
        Ok(item)
    }
}

/// A processor that runs a side effect on each item and relays it.
pub struct InspectProcessor<F, T> {
    f: F,
    _phantom: PhantomData<fn(T) -> T>,
}

impl<F, T> InspectProcessor<F, T> {
    /// Create a new inspect processor
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<F, T> Processor for InspectProcessor<F, T>
where
    F: FnMut(&T) + Send,
    T: Send + 'static,
{
    type Input = T;
    type Output = T;

    async fn process(&mut self, item: Self::Input) -> Result<Self::Output> {
        (self.f)(&item);
        Ok(item)
    }
}

/// Emits the printable representation of each [`PrintableItem`] and relays
/// the item unchanged.
pub struct PrintRelay {
    emit: Box<dyn FnMut(&str) + Send>,
}

impl PrintRelay {
    /// Print each representation to stdout as `Printing: <text>`.
    pub fn new() -> Self {
        Self::with_emitter(|text| println!("Printing: {}", text))
    }

    /// Hand each representation to `emit` instead of stdout.
    pub fn with_emitter<F>(emit: F) -> Self
    where
        F: FnMut(&str) + Send + 'static,
    {
        Self {
            emit: Box::new(emit),
        }
    }
}

impl Default for PrintRelay {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Processor for PrintRelay {
    type Input = PrintableItem;
    type Output = PrintableItem;

    async fn process(&mut self, item: Self::Input) -> Result<Self::Output> {
        let text = item.print();
        tracing::debug!(text = %text, "printing");
        (self.emit)(&text);
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Error;
    use crate::item::Book;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_map_processor() {
        let mut processor = MapProcessor::new(|x: i32| x.to_string());
        assert_eq!(processor.process(42).await.unwrap(), "42");
    }

    #[tokio::test]
    async fn test_try_map_processor_propagates_error() {
        let mut processor = TryMapProcessor::new(|s: &'static str| {
            s.parse::<u8>().map_err(Error::processor)
        });
        assert_eq!(processor.process("7").await.unwrap(), 7);
        assert!(matches!(
            processor.process("x").await,
            Err(Error::Processor(_))
        ));
    }

    #[tokio::test]
    async fn test_relay_processor_is_identity() {
        let mut processor = RelayProcessor::new();
        assert_eq!(processor.process("same").await.unwrap(), "same");
    }

    #[tokio::test]
    async fn test_inspect_processor_sees_every_item() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut processor =
            InspectProcessor::new(move |x: &u32| sink.lock().unwrap().push(*x));

        for i in 0..3 {
            assert_eq!(processor.process(i).await.unwrap(), i);
        }
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_print_relay_emits_and_relays() {
        let printed = Arc::new(Mutex::new(Vec::new()));
        let out = printed.clone();
        let mut relay =
            PrintRelay::with_emitter(move |text| out.lock().unwrap().push(text.to_string()));

        let item = relay
            .process(PrintableItem::new(Book::numbered(5)))
            .await
            .unwrap();

        assert_eq!(*printed.lock().unwrap(), vec!["Content-5".to_string()]);
        assert_eq!(item.downcast::<Book>().unwrap(), Book::numbered(5));
    }
}
