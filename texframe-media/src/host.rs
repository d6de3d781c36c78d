//! Host contract
//!
//! The capabilities the surrounding UI layer provides to a frame source. The
//! core calls into these; it never manages the host's lifecycle.

use crate::error::{MediaError, MediaResult};
use crate::permission::PermissionResolver;
use crate::platform::{CameraManager, CameraProvider, GraphicsContext, MediaPlayerFactory};
use crate::surface::DestinationSurface;
use std::sync::Arc;

/// The foreground UI context and the system services reachable from it
pub trait ForegroundContext: Send + Sync {
    fn permission_resolver(&self) -> Arc<dyn PermissionResolver>;

    fn camera_manager(&self) -> MediaResult<Arc<dyn CameraManager>> {
        Err(MediaError::ResourceNotAvailable {
            resource: "camera service".to_string(),
        })
    }

    fn camera_provider(&self) -> MediaResult<Arc<dyn CameraProvider>> {
        Err(MediaError::ResourceNotAvailable {
            resource: "camera provider".to_string(),
        })
    }

    fn media_player_factory(&self) -> MediaResult<Arc<dyn MediaPlayerFactory>> {
        Err(MediaError::ResourceNotAvailable {
            resource: "media player".to_string(),
        })
    }
}

/// What a frame source needs from its host
pub trait TextureFrameHost: Send + Sync {
    fn graphics_context(&self) -> Arc<dyn GraphicsContext>;

    fn foreground_context(&self) -> Arc<dyn ForegroundContext>;

    /// Called once a real frame target exists; the host may reveal its
    /// display view from here
    fn set_surface_texture(&self, surface: Arc<DestinationSurface>);
}
