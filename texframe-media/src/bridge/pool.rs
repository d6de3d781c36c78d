//! Output texture pool
//!
//! Holds at most `capacity` textures. A [`TextureFrame`] owns one pooled
//! texture and returns it when dropped; textures returned after the pool is
//! closed are deleted instead.

use crate::error::MediaResult;
use crate::platform::{GraphicsContext, TextureName};
use crate::viewport::Size;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PooledTexture {
    pub(crate) name: TextureName,
    pub(crate) size: Size,
}

#[derive(Debug, Default)]
struct PoolState {
    free: Vec<PooledTexture>,
    outstanding: usize,
    closed: bool,
}

pub(crate) struct TexturePool {
    gl: Arc<dyn GraphicsContext>,
    capacity: usize,
    state: Mutex<PoolState>,
}

impl TexturePool {
    pub(crate) fn new(gl: Arc<dyn GraphicsContext>, capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            gl,
            capacity: capacity.max(1),
            state: Mutex::new(PoolState::default()),
        })
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Take a texture of `size`; `None` when all are in use or the pool is closed
    pub(crate) fn acquire(&self, size: Size) -> MediaResult<Option<PooledTexture>> {
        let stale = {
            let mut state = self.state.lock();
            if state.closed {
                return Ok(None);
            }
            match state.free.pop() {
                Some(texture) if texture.size == size => {
                    state.outstanding += 1;
                    return Ok(Some(texture));
                }
                Some(texture) => {
                    state.outstanding += 1;
                    Some(texture)
                }
                None if state.outstanding >= self.capacity => return Ok(None),
                None => {
                    state.outstanding += 1;
                    None
                }
            }
        };

        if let Some(stale) = stale {
            debug!(texture = stale.name.0, from = %stale.size, to = %size, "Resizing pooled texture");
            self.gl.delete_texture(stale.name);
        }

        match self.gl.create_texture(size) {
            Ok(name) => Ok(Some(PooledTexture { name, size })),
            Err(e) => {
                self.state.lock().outstanding -= 1;
                Err(e)
            }
        }
    }

    pub(crate) fn recycle(&self, texture: PooledTexture) {
        let mut state = self.state.lock();
        state.outstanding = state.outstanding.saturating_sub(1);
        if state.closed {
            drop(state);
            self.gl.delete_texture(texture.name);
        } else {
            state.free.push(texture);
        }
    }

    /// Delete free textures and refuse new acquisitions
    pub(crate) fn close(&self) {
        let free = {
            let mut state = self.state.lock();
            state.closed = true;
            std::mem::take(&mut state.free)
        };
        for texture in free {
            self.gl.delete_texture(texture.name);
        }
    }

    pub(crate) fn reopen(&self) {
        self.state.lock().closed = false;
    }

    #[cfg(test)]
    pub(crate) fn outstanding(&self) -> usize {
        self.state.lock().outstanding
    }
}

impl fmt::Debug for TexturePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TexturePool")
            .field("capacity", &self.capacity)
            .field("free", &state.free.len())
            .field("outstanding", &state.outstanding)
            .field("closed", &state.closed)
            .finish()
    }
}

/// A converted frame living in a pooled GL texture
#[derive(Debug)]
pub struct TextureFrame {
    texture: PooledTexture,
    timestamp_ns: i64,
    surface_id: u64,
    pool: Arc<TexturePool>,
}

impl TextureFrame {
    pub(crate) fn new(
        texture: PooledTexture,
        timestamp_ns: i64,
        surface_id: u64,
        pool: Arc<TexturePool>,
    ) -> Self {
        Self {
            texture,
            timestamp_ns,
            surface_id,
            pool,
        }
    }

    pub fn texture_name(&self) -> TextureName {
        self.texture.name
    }

    pub fn size(&self) -> Size {
        self.texture.size
    }

    pub fn width(&self) -> u32 {
        self.texture.size.width
    }

    pub fn height(&self) -> u32 {
        self.texture.size.height
    }

    pub fn timestamp_ns(&self) -> i64 {
        self.timestamp_ns
    }

    /// Surface bound as the display target when this frame was rendered
    pub fn surface_id(&self) -> u64 {
        self.surface_id
    }

    /// Hand the texture back to the pool
    pub fn release(self) {}
}

impl Drop for TextureFrame {
    fn drop(&mut self) {
        self.pool.recycle(self.texture);
    }
}
