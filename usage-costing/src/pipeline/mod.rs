use std::{marker::PhantomData, pin::Pin};

use futures::Stream;

use crate::nem12::DecodeError;

#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    /// 1-based line of the input the payload was read from.
    pub line: u64,
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("source error: {0}")]
    Source(String),
    #[error("line {line}: invalid {record} record: {source}")]
    Decode {
        line: u64,
        record: u16,
        source: DecodeError,
    },
    #[error("line {line}: {message}")]
    State { line: u64, message: String },
    #[error("line {line}: header declares format '{version}', expected NEM12")]
    NotNem12 { line: u64, version: String },
    #[error("sink error: {0}")]
    Sink(String),
}

pub type EnvelopeStream<T> = Pin<Box<dyn Stream<Item = Result<Envelope<T>, PipelineError>> + Send>>;

#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(&self) -> EnvelopeStream<T>;
}

#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    type Output: Send;

    async fn run<S>(&self, input: S) -> Result<Self::Output, PipelineError>
    where
        S: Stream<Item = Result<Envelope<T>, PipelineError>> + Send + Unpin + 'static;
}

/// A single source feeding a single sink, in order.
pub struct Pipeline<S, T, K> {
    pub source: S,
    pub sink: K,
    _payload: PhantomData<fn() -> T>,
}

impl<S, T, K> Pipeline<S, T, K> {
    pub fn new(source: S, sink: K) -> Self {
        Self {
            source,
            sink,
            _payload: PhantomData,
        }
    }
}

impl<T, S, K> Pipeline<S, T, K>
where
    T: Send + 'static,
    S: Source<T> + Send + Sync + 'static,
    K: Sink<T> + Send + Sync + 'static,
{
    pub async fn run(self) -> Result<K::Output, PipelineError> {
        let stream = self.source.stream().await;
        self.sink.run(stream).await
    }
}
