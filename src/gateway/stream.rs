//! Progressive display of a resolved response.
//!
//! Replays the content word by word so a terminal UI can render a typing
//! effect. Resolution goes through the normal query path first; the
//! stream only paces delivery.
//!
//! Events travel through a bounded `tokio::sync::mpsc` channel, so the
//! producer waits when the consumer falls behind and stops when the
//! consumer drops the stream.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures_util::Stream;
use tokio_stream::wrappers::ReceiverStream;

use crate::types::QueryResponse;

/// Default number of events buffered between producer and consumer.
pub const DEFAULT_STREAM_BUFFER: usize = 64;

/// Configuration for progressive streaming.
///
/// ```rust
/// # use hermod::StreamConfig;
/// # use std::time::Duration;
/// let config = StreamConfig::new().word_delay(Duration::ZERO);
/// assert_eq!(config.buffer, 64);
/// ```
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Pause after each word. Default: 20ms.
    pub word_delay: Duration,
    /// Channel capacity in events. Default: 64.
    pub buffer: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            word_delay: Duration::from_millis(20),
            buffer: DEFAULT_STREAM_BUFFER,
        }
    }
}

impl StreamConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pause after each word.
    pub fn word_delay(mut self, delay: Duration) -> Self {
        self.word_delay = delay;
        self
    }

    /// Set the channel capacity.
    pub fn buffer(mut self, n: usize) -> Self {
        self.buffer = n;
        self
    }
}

/// One step of a progressive response
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Text revealed so far.
    Partial(String),
    /// The complete response; always the last event.
    Done(QueryResponse),
}

/// Resolve `response` on a spawned task and replay it word by word.
///
/// # Panics
///
/// Requires a tokio runtime context.
pub(crate) fn progressive<F>(
    response: F,
    config: &StreamConfig,
) -> Pin<Box<dyn Stream<Item = StreamEvent> + Send>>
where
    F: Future<Output = QueryResponse> + Send + 'static,
{
    let (tx, rx) = tokio::sync::mpsc::channel(config.buffer.max(1));
    let word_delay = config.word_delay;

    tokio::spawn(async move {
        let response = response.await;
        let mut revealed = String::with_capacity(response.content.len());
        for word in response.content.split(' ').filter(|w| !w.is_empty()) {
            if !revealed.is_empty() {
                revealed.push(' ');
            }
            revealed.push_str(word);
            if tx.send(StreamEvent::Partial(revealed.clone())).await.is_err() {
                return; // receiver dropped
            }
            if !word_delay.is_zero() {
                tokio::time::sleep(word_delay).await;
            }
        }
        let _ = tx.send(StreamEvent::Done(response)).await;
    });

    Box::pin(ReceiverStream::new(rx))
}
