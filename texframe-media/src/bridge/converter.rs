//! Raw frame to texture conversion

use super::pool::{TextureFrame, TexturePool};
use crate::consumer::ConsumerSlot;
use crate::platform::GraphicsContext;
use crate::stats::{FrameOutcome, StatsCounters};
use crate::surface::{DestinationSurface, FrameAvailableListener, RawFrame};
use crate::viewport::Size;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{trace, warn};

/// Display target the converter renders for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceBinding {
    pub surface_id: u64,
    pub size: Size,
}

pub(crate) struct TextureConverter {
    gl: Arc<dyn GraphicsContext>,
    pool: Arc<TexturePool>,
    binding: RwLock<Option<SurfaceBinding>>,
    consumer: ConsumerSlot,
    stats: StatsCounters,
}

impl TextureConverter {
    pub(crate) fn new(gl: Arc<dyn GraphicsContext>, num_buffers: usize) -> Self {
        let pool = TexturePool::new(Arc::clone(&gl), num_buffers);
        Self {
            gl,
            pool,
            binding: RwLock::new(None),
            consumer: ConsumerSlot::new(),
            stats: StatsCounters::default(),
        }
    }

    pub(crate) fn pool(&self) -> &Arc<TexturePool> {
        &self.pool
    }

    pub(crate) fn consumer(&self) -> &ConsumerSlot {
        &self.consumer
    }

    pub(crate) fn stats(&self) -> &StatsCounters {
        &self.stats
    }

    pub(crate) fn binding(&self) -> Option<SurfaceBinding> {
        *self.binding.read()
    }

    /// Waits for any in-flight render to finish before swapping
    pub(crate) fn rebind(&self, binding: Option<SurfaceBinding>) {
        *self.binding.write() = binding;
    }

    fn convert(&self, frame: &RawFrame) -> Result<TextureFrame, FrameOutcome> {
        // Held across the render so a rebind never lands mid-frame
        let binding = self.binding.read();
        let target = (*binding).ok_or(FrameOutcome::Unbound)?;

        let texture = match self.pool.acquire(target.size) {
            Ok(Some(texture)) => texture,
            Ok(None) => return Err(FrameOutcome::PoolExhausted),
            Err(e) => {
                warn!(error = %e, "Failed to allocate output texture");
                return Err(FrameOutcome::RenderFailed);
            }
        };
        let output = TextureFrame::new(
            texture,
            frame.timestamp_ns,
            target.surface_id,
            Arc::clone(&self.pool),
        );

        if let Err(e) = self
            .gl
            .render_external_frame(frame, texture.name, target.size)
        {
            warn!(error = %e, "Failed to render frame into texture");
            return Err(FrameOutcome::RenderFailed);
        }
        Ok(output)
    }
}

impl FrameAvailableListener for TextureConverter {
    fn on_frame_available(&self, surface: &DestinationSurface, frame: RawFrame) {
        let outcome = match self.convert(&frame) {
            Ok(output) => {
                if self.consumer.push(output) {
                    FrameOutcome::Delivered
                } else {
                    FrameOutcome::NoConsumer
                }
            }
            Err(outcome) => outcome,
        };
        trace!(surface_id = surface.id(), ?outcome, "Frame processed");
        self.stats.record(outcome);
    }
}
