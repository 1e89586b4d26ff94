//! Helpers for building stages out of async closures.

use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;

use crate::core::{Processor, Result, Sink, Source};

/// Create a source from a closure returning the next item
pub fn source_from_fn<F, Fut, T>(f: F) -> FnSource<F, Fut, T>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<Option<T>>> + Send,
    T: Send + 'static,
{
    FnSource {
        f,
        _phantom: PhantomData,
    }
}

/// A source created from a function
pub struct FnSource<F, Fut, T> {
    f: F,
    _phantom: PhantomData<fn() -> (Fut, T)>,
}

#[async_trait]
impl<F, Fut, T> Source for FnSource<F, Fut, T>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<Option<T>>> + Send,
    T: Send + 'static,
{
    type Item = T;

    async fn produce(&mut self) -> Result<Option<Self::Item>> {
        (self.f)().await
    }
}

/// Create a processor from an async closure
pub fn processor_from_fn<F, Fut, T, U>(f: F) -> FnProcessor<F, Fut, T, U>
where
    F: FnMut(T) -> Fut + Send,
    Fut: Future<Output = Result<U>> + Send,
    T: Send + 'static,
    U: Send + 'static,
{
    FnProcessor {
        f,
        _phantom: PhantomData,
    }
}

/// A processor created from a function
pub struct FnProcessor<F, Fut, T, U> {
    f: F,
    _phantom: PhantomData<fn(T) -> (Fut, U)>,
}

#[async_trait]
impl<F, Fut, T, U> Processor for FnProcessor<F, Fut, T, U>
where
    F: FnMut(T) -> Fut + Send,
    Fut: Future<Output = Result<U>> + Send,
    T: Send + 'static,
    U: Send + 'static,
{
    type Input = T;
    type Output = U;

    async fn process(&mut self, item: Self::Input) -> Result<Self::Output> {
        (self.f)(item).await
    }
}

/// Create a sink from an async closure
pub fn sink_from_fn<F, Fut, T>(f: F) -> AsyncFnSink<F, Fut, T>
where
    F: FnMut(T) -> Fut + Send,
    Fut: Future<Output = Result<()>> + Send,
    T: Send + 'static,
{
    AsyncFnSink {
        f,
        _phantom: PhantomData,
    }
}

/// A sink created from an async function
pub struct AsyncFnSink<F, Fut, T> {
    f: F,
    _phantom: PhantomData<fn(T) -> Fut>,
}

#[async_trait]
impl<F, Fut, T> Sink for AsyncFnSink<F, Fut, T>
where
    F: FnMut(T) -> Fut + Send,
    Fut: Future<Output = Result<()>> + Send,
    T: Send + 'static,
{
    type Item = T;

    async fn write(&mut self, item: Self::Item) -> Result<()> {
        (self.f)(item).await
    }
}
