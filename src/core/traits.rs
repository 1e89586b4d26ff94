//! Core traits for the stage system.
//!
//! A pipeline is built from three kinds of stage: a [`Source`] generates
//! items, a [`Processor`] maps each input item to exactly one output item,
//! and a [`Sink`] consumes items at the end of the chain. Each stage is
//! driven by its own task (see [`crate::stage`]) and only ever talks to its
//! neighbours through a rendezvous [`crate::channel`].

use crate::core::error::Result;
use async_trait::async_trait;

/// A source generates a finite or infinite sequence of items.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use streamrelay::core::{Result, Source};
///
/// struct CounterSource {
///     current: u64,
///     max: u64,
/// }
///
/// #[async_trait]
/// impl Source for CounterSource {
///     type Item = u64;
///
///     async fn produce(&mut self) -> Result<Option<Self::Item>> {
///         if self.current < self.max {
///             let item = self.current;
///             self.current += 1;
///             Ok(Some(item))
///         } else {
///             Ok(None) // Signal completion
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Source {
    /// The type of items this source generates
    type Item: Send + 'static;

    /// Produce the next item, or `None` once generation is exhausted.
    ///
    /// An `Err` stops the source stage early; downstream observes it as an
    /// ordinary end of stream.
    async fn produce(&mut self) -> Result<Option<Self::Item>>;
}

/// A processor turns each input item into exactly one output item.
///
/// Returning an `Err` is a transformation failure: the driving stage closes
/// its output without forwarding anything for that item and terminates.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use streamrelay::core::{Processor, Result};
///
/// struct DoubleProcessor;
///
/// #[async_trait]
/// impl Processor for DoubleProcessor {
///     type Input = i32;
///     type Output = i32;
///
///     async fn process(&mut self, item: Self::Input) -> Result<Self::Output> {
///         Ok(item * 2)
///     }
/// }
/// ```
#[async_trait]
pub trait Processor {
    /// The type of items this processor accepts
    type Input: Send + 'static;
    /// The type of items this processor produces
    type Output: Send + 'static;

    /// Transform one input item.
    async fn process(&mut self, item: Self::Input) -> Result<Self::Output>;
}

/// A sink consumes items at the end of a pipeline.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use streamrelay::core::{Result, Sink};
///
/// struct LogSink;
///
/// #[async_trait]
/// impl Sink for LogSink {
///     type Item = String;
///
///     async fn write(&mut self, item: Self::Item) -> Result<()> {
///         println!("Logged: {}", item);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Sink {
    /// The type of items this sink accepts
    type Item: Send + 'static;

    /// Accept a single item.
    async fn write(&mut self, item: Self::Item) -> Result<()>;

    /// Called once the upstream stream has closed.
    ///
    /// This allows sinks to flush any buffered state.
    async fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A heap-allocated processor, used to chain stages chosen at runtime.
pub type BoxProcessor<T, U> = Box<dyn Processor<Input = T, Output = U> + Send>;

#[async_trait]
impl<S> Source for Box<S>
where
    S: Source + Send + ?Sized,
{
    type Item = S::Item;

    async fn produce(&mut self) -> Result<Option<Self::Item>> {
        (**self).produce().await
    }
}

#[async_trait]
impl<P> Processor for Box<P>
where
    P: Processor + Send + ?Sized,
{
    type Input = P::Input;
    type Output = P::Output;

    async fn process(&mut self, item: Self::Input) -> Result<Self::Output> {
        (**self).process(item).await
    }
}

#[async_trait]
impl<C> Sink for Box<C>
where
    C: Sink + Send + ?Sized,
{
    type Item = C::Item;

    async fn write(&mut self, item: Self::Item) -> Result<()> {
        (**self).write(item).await
    }

    async fn finish(&mut self) -> Result<()> {
        (**self).finish().await
    }
}
