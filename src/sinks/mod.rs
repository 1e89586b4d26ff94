//! Sink implementations for the streamrelay library.
//!
//! This module provides concrete sinks that consume the tail of a pipeline.

use async_trait::async_trait;
use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex as TokioMutex;

use crate::core::{Result, Sink};

/// A sink that hands every item to a closure.
pub struct FnSink<F, T> {
    f: F,
    _phantom: PhantomData<fn(T)>,
}

impl<F, T> FnSink<F, T>
where
    F: FnMut(T) + Send,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<F, T> Sink for FnSink<F, T>
where
    F: FnMut(T) + Send,
    T: Send + 'static,
{
    type Item = T;

    async fn write(&mut self, item: Self::Item) -> Result<()> {
        (self.f)(item);
        Ok(())
    }
}

/// A sink that prints each item on its own line.
pub struct PrintSink<T> {
    /// The prefix to print before each item
    prefix: Option<String>,
    _phantom: PhantomData<fn(T)>,
}

impl<T> PrintSink<T> {
    /// Create a new print sink
    pub fn new() -> Self {
        Self {
            prefix: None,
            _phantom: PhantomData,
        }
    }

    /// Create a new print sink with a prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            _phantom: PhantomData,
        }
    }
}

impl<T> Default for PrintSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send + 'static + Display> Sink for PrintSink<T> {
    type Item = T;

    async fn write(&mut self, item: Self::Item) -> Result<()> {
        match &self.prefix {
            Some(prefix) => println!("{} {}", prefix, item),
            None => println!("{}", item),
        }
        Ok(())
    }
}

/// A sink that collects items into a shared vector.
///
/// Clones share the same storage, so keep one clone to read the results
/// after handing the other to a pipeline.
pub struct CollectSink<T> {
    items: Arc<TokioMutex<Vec<T>>>,
}

impl<T: Send + 'static> CollectSink<T> {
    /// Create a new collect sink
    pub fn new() -> Self {
        Self {
            items: Arc::new(TokioMutex::new(Vec::new())),
        }
    }

    /// Take the collected items
    pub async fn into_items(self) -> Vec<T> {
        std::mem::take(&mut *self.items.lock().await)
    }

    /// Number of items collected so far
    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }
}

impl<T: Send + 'static> Default for CollectSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for CollectSink<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
        }
    }
}

#[async_trait]
impl<T: Send + 'static> Sink for CollectSink<T> {
    type Item = T;

    async fn write(&mut self, item: Self::Item) -> Result<()> {
        self.items.lock().await.push(item);
        Ok(())
    }
}

/// A sink that counts items and discards them
pub struct CountSink<T> {
    count: Arc<AtomicU64>,
    _phantom: PhantomData<fn(T)>,
}

impl<T> CountSink<T> {
    /// Create a new count sink
    pub fn new() -> Self {
        Self {
            count: Arc::new(AtomicU64::new(0)),
            _phantom: PhantomData,
        }
    }

    /// Get the current count
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }
}

impl<T> Default for CountSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for CountSink<T> {
    fn clone(&self) -> Self {
        Self {
            count: self.count.clone(),
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Send + 'static> Sink for CountSink<T> {
    type Item = T;

    async fn write(&mut self, _item: Self::Item) -> Result<()> {
        self.count.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

/// A sink that writes one line per item to a file
pub struct FileSink<T> {
    writer: tokio::io::BufWriter<tokio::fs::File>,
    _phantom: PhantomData<fn(T)>,
}

impl<T> FileSink<T> {
    /// Create (or truncate) the file at `path`
    pub async fn new<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = tokio::fs::File::create(path).await?;
        Ok(Self {
            writer: tokio::io::BufWriter::new(file),
            _phantom: PhantomData,
        })
    }

    /// Create a file sink that appends to an existing file
    pub async fn append<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        Ok(Self {
            writer: tokio::io::BufWriter::new(file),
            _phantom: PhantomData,
        })
    }
}

#[async_trait]
impl<T: Send + 'static + Display> Sink for FileSink<T> {
    type Item = T;

    async fn write(&mut self, item: Self::Item) -> Result<()> {
        let line = format!("{}\n", item);
        self.writer.write_all(line.as_bytes()).await?;
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        self.writer.flush().await?;
        Ok(())
    }
}
