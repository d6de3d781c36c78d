//! Frame surface bridge
//!
//! Owns the destination surface a capture device renders into and keeps the
//! texture converter listening on it. When no surface was supplied up front a
//! private detached one is created on demand, sized (0,0) until the device's
//! frame size is known.
//!
//! Reattaching only mutates the target binding (which display surface and at
//! what dimensions frames are rendered for); the destination surface the
//! capture session writes into keeps its identity.

mod converter;
mod pool;

pub use converter::SurfaceBinding;
pub use pool::TextureFrame;

use converter::TextureConverter;

use crate::consumer::TextureFrameConsumer;
use crate::error::{MediaError, MediaResult};
use crate::platform::GraphicsContext;
use crate::stats::SourceStats;
use crate::surface::{DestinationSurface, FrameAvailableListener};
use crate::viewport::Size;
use parking_lot::Mutex;
use std::sync::Arc;
use texframe_core::{keys, Options};
use tracing::{debug, info};

/// Converter pool size when `converterNumBuffers` is absent
pub const DEFAULT_NUM_BUFFERS: usize = 2;

/// Conversion stage settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeConfig {
    pub num_buffers: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            num_buffers: DEFAULT_NUM_BUFFERS,
        }
    }
}

impl BridgeConfig {
    pub fn from_options(options: &Options) -> MediaResult<Self> {
        let num_buffers = match options.get(keys::CONVERTER_NUM_BUFFERS) {
            None => DEFAULT_NUM_BUFFERS,
            Some(_) => match options.get_int(keys::CONVERTER_NUM_BUFFERS) {
                Some(n) if n >= 1 => n as usize,
                _ => {
                    return Err(MediaError::InvalidConfiguration {
                        message: format!("{} must be an integer >= 1", keys::CONVERTER_NUM_BUFFERS),
                    })
                }
            },
        };
        Ok(Self { num_buffers })
    }
}

pub struct FrameSurfaceBridge {
    surface: Mutex<Option<Arc<DestinationSurface>>>,
    converter: Arc<TextureConverter>,
}

impl FrameSurfaceBridge {
    /// Bridge around an optional host supplied surface
    pub fn new(
        gl: Arc<dyn GraphicsContext>,
        config: BridgeConfig,
        surface: Option<Arc<DestinationSurface>>,
    ) -> Self {
        let bridge = Self {
            surface: Mutex::new(None),
            converter: Arc::new(TextureConverter::new(gl, config.num_buffers)),
        };
        if let Some(surface) = surface {
            bridge.install(&surface);
            *bridge.surface.lock() = Some(surface);
        }
        bridge
    }

    fn install(&self, surface: &Arc<DestinationSurface>) {
        let listener: Arc<dyn FrameAvailableListener> = self.converter.clone();
        surface.set_on_frame_available_listener(Some(listener));
    }

    /// The destination surface, creating a detached one if none is live
    pub fn ensure_surface(&self) -> Arc<DestinationSurface> {
        let mut slot = self.surface.lock();
        if let Some(surface) = slot.as_ref().filter(|s| !s.is_released()) {
            return Arc::clone(surface);
        }
        let surface = DestinationSurface::detached();
        debug!(surface_id = surface.id(), "Created detached destination surface");
        self.install(&surface);
        self.converter.pool().reopen();
        *slot = Some(Arc::clone(&surface));
        surface
    }

    pub fn surface(&self) -> Option<Arc<DestinationSurface>> {
        self.surface.lock().clone()
    }

    /// Match the surface buffer to the producer's intrinsic frame size
    pub fn resize(&self, size: Size) {
        self.ensure_surface().set_default_buffer_size(size);
    }

    /// Rebind the display target. `None` or an empty size detaches.
    pub fn attach(&self, surface: Option<&Arc<DestinationSurface>>, width: u32, height: u32) {
        let size = Size::new(width, height);
        let binding = match surface {
            Some(surface) if !size.is_empty() => Some(SurfaceBinding {
                surface_id: surface.id(),
                size,
            }),
            _ => None,
        };
        if self.converter.binding() == binding {
            return;
        }
        match binding {
            Some(b) => info!(surface_id = b.surface_id, size = %b.size, "Attached display target"),
            None => info!("Detached display target"),
        }
        self.converter.rebind(binding);
    }

    pub fn detach(&self) {
        self.attach(None, 0, 0);
    }

    pub fn binding(&self) -> Option<SurfaceBinding> {
        self.converter.binding()
    }

    pub fn set_consumer(&self, consumer: Option<&Arc<dyn TextureFrameConsumer>>) {
        self.converter.consumer().set(consumer);
    }

    pub fn has_consumer(&self) -> bool {
        self.converter.consumer().is_registered()
    }

    pub fn num_buffers(&self) -> usize {
        self.converter.pool().capacity()
    }

    pub fn stats(&self) -> SourceStats {
        self.converter.stats().snapshot()
    }

    /// Tear down after producers have stopped. Safe without a session.
    pub fn close(&self) {
        self.detach();
        if let Some(surface) = self.surface.lock().take() {
            surface.set_on_frame_available_listener(None);
            if surface.is_detached() {
                surface.release();
            }
        }
        self.converter.pool().close();
        debug!("Frame surface bridge closed");
    }
}

impl std::fmt::Debug for FrameSurfaceBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSurfaceBridge")
            .field("surface", &self.surface())
            .field("binding", &self.binding())
            .field("pool", self.converter.pool())
            .finish()
    }
}
