//! Source implementations for the streamrelay library.
//!
//! This module provides concrete sources that generate data for pipelines.

use async_trait::async_trait;
use std::ops::Range;
use std::time::Duration;
use tokio::time::sleep;
use tokio_stream::{Stream, StreamExt};

use crate::core::{Result, Source};
use crate::item::Book;

/// A source that generates `count` numbered books.
///
/// Book `i` has author `Author-i` and content `Content-i`.
pub struct BookSource {
    next: usize,
    count: usize,
}

impl BookSource {
    pub fn new(count: usize) -> Self {
        Self { next: 0, count }
    }

    /// Books still to be generated
    pub fn remaining(&self) -> usize {
        self.count - self.next
    }
}

#[async_trait]
impl Source for BookSource {
    type Item = Book;

    async fn produce(&mut self) -> Result<Option<Self::Item>> {
        if self.next >= self.count {
            return Ok(None);
        }
        let book = Book::numbered(self.next);
        self.next += 1;
        Ok(Some(book))
    }
}

/// A source that counts through a range, optionally pausing before each item
pub struct RangeSource {
    range: Range<i64>,
    delay: Option<Duration>,
}

impl RangeSource {
    /// Create a new range source
    pub fn new(range: Range<i64>) -> Self {
        Self { range, delay: None }
    }

    /// Sleep for `delay` before producing each item
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Source for RangeSource {
    type Item = i64;

    async fn produce(&mut self) -> Result<Option<Self::Item>> {
        if self.range.is_empty() {
            return Ok(None);
        }
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }
        Ok(self.range.next())
    }
}

/// A source that yields the items of an iterator
pub struct IterSource<I> {
    iter: I,
}

impl<I: Iterator> IterSource<I> {
    pub fn new<T>(items: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            iter: items.into_iter(),
        }
    }
}

#[async_trait]
impl<I> Source for IterSource<I>
where
    I: Iterator + Send,
    I::Item: Send + 'static,
{
    type Item = I::Item;

    async fn produce(&mut self) -> Result<Option<Self::Item>> {
        Ok(self.iter.next())
    }
}

/// A source that pulls from any [`Stream`]
pub struct StreamSource<S> {
    stream: S,
}

impl<S> StreamSource<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl<S> Source for StreamSource<S>
where
    S: Stream + Send + Unpin,
    S::Item: Send + 'static,
{
    type Item = S::Item;

    async fn produce(&mut self) -> Result<Option<Self::Item>> {
        Ok(self.stream.next().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_book_source_generates_numbered_books() {
        let mut source = BookSource::new(2);
        assert_eq!(source.remaining(), 2);
        assert_eq!(source.produce().await.unwrap(), Some(Book::numbered(0)));
        assert_eq!(source.produce().await.unwrap(), Some(Book::numbered(1)));
        assert_eq!(source.produce().await.unwrap(), None);
        assert_eq!(source.produce().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_book_source() {
        let mut source = BookSource::new(0);
        assert_eq!(source.produce().await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_range_source_with_delay() {
        let start = tokio::time::Instant::now();
        let mut source = RangeSource::new(0..3).with_delay(Duration::from_millis(100));

        let mut items = Vec::new();
        while let Some(item) = source.produce().await.unwrap() {
            items.push(item);
        }

        assert_eq!(items, vec![0, 1, 2]);
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_stream_source() {
        let mut source = StreamSource::new(tokio_stream::iter(vec!["a", "b"]));
        assert_eq!(source.produce().await.unwrap(), Some("a"));
        assert_eq!(source.produce().await.unwrap(), Some("b"));
        assert_eq!(source.produce().await.unwrap(), None);
    }
}
