//! Texture-backed destination surfaces
//!
//! A [`DestinationSurface`] is the target a capture session or media player
//! writes raw frames into. Its identity is stable for its whole life: hosts
//! may rebind what is displayed, but never swap the object a producer holds.

use crate::error::{MediaError, MediaResult};
use crate::viewport::Size;
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Where a surface came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceOrigin {
    /// Created privately, not bound to any on-screen view
    Detached,
    /// Supplied by the host UI
    Host,
}

/// A raw frame written by a producer
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    /// Producer timestamp in nanoseconds
    pub timestamp_ns: i64,
    pub data: Bytes,
}

impl RawFrame {
    pub fn new(width: u32, height: u32, timestamp_ns: i64, data: Bytes) -> Self {
        Self {
            width,
            height,
            timestamp_ns,
            data,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Notified on the producer's thread for every frame queued on a surface
pub trait FrameAvailableListener: Send + Sync {
    fn on_frame_available(&self, surface: &DestinationSurface, frame: RawFrame);
}

pub struct DestinationSurface {
    id: u64,
    origin: SurfaceOrigin,
    buffer_size: Mutex<Size>,
    listener: RwLock<Option<Arc<dyn FrameAvailableListener>>>,
    released: AtomicBool,
    frames_queued: AtomicU64,
}

impl DestinationSurface {
    fn with_origin(origin: SurfaceOrigin) -> Arc<Self> {
        Arc::new(Self {
            id: NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed),
            origin,
            buffer_size: Mutex::new(Size::ZERO),
            listener: RwLock::new(None),
            released: AtomicBool::new(false),
            frames_queued: AtomicU64::new(0),
        })
    }

    /// A private surface sized (0,0) until the producer size is known
    pub fn detached() -> Arc<Self> {
        Self::with_origin(SurfaceOrigin::Detached)
    }

    /// A surface owned by the host UI
    pub fn from_host() -> Arc<Self> {
        Self::with_origin(SurfaceOrigin::Host)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn origin(&self) -> SurfaceOrigin {
        self.origin
    }

    pub fn is_detached(&self) -> bool {
        self.origin == SurfaceOrigin::Detached
    }

    pub fn default_buffer_size(&self) -> Size {
        *self.buffer_size.lock()
    }

    pub fn set_default_buffer_size(&self, size: Size) {
        *self.buffer_size.lock() = size;
        debug!(surface_id = self.id, %size, "Surface buffer size set");
    }

    pub fn set_on_frame_available_listener(
        &self,
        listener: Option<Arc<dyn FrameAvailableListener>>,
    ) {
        *self.listener.write() = listener;
    }

    /// Queue a frame from a producer. The listener runs on the calling thread.
    pub fn queue_frame(&self, frame: RawFrame) -> MediaResult<()> {
        if self.is_released() {
            return Err(MediaError::SurfaceReleased {
                surface_id: self.id,
            });
        }
        self.frames_queued.fetch_add(1, Ordering::Relaxed);

        let listener = self.listener.read().clone();
        if let Some(listener) = listener {
            listener.on_frame_available(self, frame);
        }
        Ok(())
    }

    pub fn frames_queued(&self) -> u64 {
        self.frames_queued.load(Ordering::Relaxed)
    }

    /// Release the surface; later writes are rejected
    pub fn release(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            self.listener.write().take();
            debug!(surface_id = self.id, "Surface released");
        }
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl fmt::Debug for DestinationSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DestinationSurface")
            .field("id", &self.id)
            .field("origin", &self.origin)
            .field("buffer_size", &self.default_buffer_size())
            .field("released", &self.is_released())
            .finish()
    }
}
