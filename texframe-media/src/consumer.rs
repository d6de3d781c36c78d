//! Frame consumers and the producer contract
//!
//! Sources push frames to exactly one registered consumer. The registration
//! is non-owning: the source never keeps a consumer alive, and pushes after
//! the consumer is gone are dropped.

use crate::bridge::TextureFrame;
use futures::Stream;
use parking_lot::RwLock;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::debug;

/// Receives texture frames as they become available
pub trait TextureFrameConsumer: Send + Sync {
    fn on_new_frame(&self, frame: TextureFrame);
}

/// Push-style frame producer
pub trait TextureFrameProducer {
    /// Register the single downstream consumer, or clear it with `None`
    fn set_consumer(&self, consumer: Option<&Arc<dyn TextureFrameConsumer>>);
}

/// Non-owning registration of one consumer
#[derive(Default)]
pub struct ConsumerSlot {
    consumer: RwLock<Option<Weak<dyn TextureFrameConsumer>>>,
}

impl ConsumerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, consumer: Option<&Arc<dyn TextureFrameConsumer>>) {
        *self.consumer.write() = consumer.map(Arc::downgrade);
    }

    pub fn is_registered(&self) -> bool {
        self.consumer
            .read()
            .as_ref()
            .map(|weak| weak.strong_count() > 0)
            .unwrap_or(false)
    }

    /// Deliver a frame; returns false when nobody took it
    pub fn push(&self, frame: TextureFrame) -> bool {
        let consumer = self.consumer.read().as_ref().and_then(Weak::upgrade);
        match consumer {
            Some(consumer) => {
                consumer.on_new_frame(frame);
                true
            }
            None => {
                debug!("No live consumer; dropping frame");
                false
            }
        }
    }
}

impl std::fmt::Debug for ConsumerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumerSlot")
            .field("registered", &self.is_registered())
            .finish()
    }
}

/// Consumer half of a [`FrameStream`]; the caller must keep it alive
#[derive(Debug)]
pub struct FrameStreamSender {
    sender: mpsc::Sender<TextureFrame>,
    dropped: AtomicU64,
}

impl FrameStreamSender {
    /// Frames discarded because the stream was full or closed
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl TextureFrameConsumer for FrameStreamSender {
    fn on_new_frame(&self, frame: TextureFrame) {
        if self.sender.try_send(frame).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Async pull face of the pushed frame sequence
#[derive(Debug)]
pub struct FrameStream {
    receiver: mpsc::Receiver<TextureFrame>,
}

impl Stream for FrameStream {
    type Item = TextureFrame;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Create a bounded frame stream
pub fn frame_stream(capacity: usize) -> (Arc<FrameStreamSender>, FrameStream) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (
        Arc::new(FrameStreamSender {
            sender,
            dropped: AtomicU64::new(0),
        }),
        FrameStream { receiver },
    )
}
