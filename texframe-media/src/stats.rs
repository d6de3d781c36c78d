//! Frame delivery counters

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of a source's frame delivery
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStats {
    pub frames_delivered: u64,
    /// No target binding was attached
    pub frames_dropped_unbound: u64,
    /// Every pooled texture was still held by the consumer
    pub frames_dropped_pool_exhausted: u64,
    /// The consumer was never registered or has gone away
    pub frames_dropped_no_consumer: u64,
    pub frames_render_failed: u64,
}

impl SourceStats {
    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped_unbound
            + self.frames_dropped_pool_exhausted
            + self.frames_dropped_no_consumer
            + self.frames_render_failed
    }
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    delivered: AtomicU64,
    unbound: AtomicU64,
    pool_exhausted: AtomicU64,
    no_consumer: AtomicU64,
    render_failed: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum FrameOutcome {
    Delivered,
    Unbound,
    PoolExhausted,
    NoConsumer,
    RenderFailed,
}

impl StatsCounters {
    pub(crate) fn record(&self, outcome: FrameOutcome) {
        let counter = match outcome {
            FrameOutcome::Delivered => &self.delivered,
            FrameOutcome::Unbound => &self.unbound,
            FrameOutcome::PoolExhausted => &self.pool_exhausted,
            FrameOutcome::NoConsumer => &self.no_consumer,
            FrameOutcome::RenderFailed => &self.render_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> SourceStats {
        SourceStats {
            frames_delivered: self.delivered.load(Ordering::Relaxed),
            frames_dropped_unbound: self.unbound.load(Ordering::Relaxed),
            frames_dropped_pool_exhausted: self.pool_exhausted.load(Ordering::Relaxed),
            frames_dropped_no_consumer: self.no_consumer.load(Ordering::Relaxed),
            frames_render_failed: self.render_failed.load(Ordering::Relaxed),
        }
    }
}
