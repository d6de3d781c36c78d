//! File backed source

use super::{SourceKind, TextureFrameSource};
use crate::bridge::{BridgeConfig, FrameSurfaceBridge};
use crate::consumer::{TextureFrameConsumer, TextureFrameProducer};
use crate::error::{MediaError, MediaResult};
use crate::host::TextureFrameHost;
use crate::permission::PermissionGate;
use crate::platform::MediaPlayer;
use crate::stats::SourceStats;
use crate::surface::DestinationSurface;
use crate::viewport::Size;
use std::sync::{Arc, Weak};
use texframe_core::{keys, Options, TexFrameError};
use tracing::{error, info, warn};

/// Plays a media file into the destination surface
pub struct MediaPlayerTextureFrameSource {
    host: Weak<dyn TextureFrameHost>,
    gate: PermissionGate,
    media_file: String,
    looping: bool,
    bridge: FrameSurfaceBridge,
    player: Option<Box<dyn MediaPlayer>>,
}

impl MediaPlayerTextureFrameSource {
    pub fn create(host: &Arc<dyn TextureFrameHost>, options: &Options) -> MediaResult<Self> {
        let media_file = options
            .get_string(keys::MEDIA_FILE)
            .ok_or_else(|| TexFrameError::MissingConfiguration {
                key: keys::MEDIA_FILE.to_string(),
            })?
            .to_string();
        let config = BridgeConfig::from_options(options)?;
        Ok(Self {
            host: Arc::downgrade(host),
            gate: PermissionGate::storage(host.foreground_context().permission_resolver()),
            media_file,
            looping: options.get_bool_or(keys::MEDIA_LOOP, false),
            bridge: FrameSurfaceBridge::new(host.graphics_context(), config, None),
            player: None,
        })
    }

    pub fn media_file(&self) -> &str {
        &self.media_file
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn bridge(&self) -> &FrameSurfaceBridge {
        &self.bridge
    }
}

impl TextureFrameProducer for MediaPlayerTextureFrameSource {
    fn set_consumer(&self, consumer: Option<&Arc<dyn TextureFrameConsumer>>) {
        self.bridge.set_consumer(consumer);
    }
}

impl TextureFrameSource for MediaPlayerTextureFrameSource {
    fn kind(&self) -> SourceKind {
        SourceKind::MediaPlayer
    }

    fn permission_gate(&self) -> &PermissionGate {
        &self.gate
    }

    fn start(&mut self) -> MediaResult<()> {
        if self.player.is_some() {
            return Ok(());
        }
        if !self.gate.permissions_granted() {
            info!("Storage permission not granted; not starting playback");
            return Ok(());
        }
        let host = self.host.upgrade().ok_or_else(|| MediaError::ResourceNotAvailable {
            resource: "texture frame host".to_string(),
        })?;
        let factory = host.foreground_context().media_player_factory()?;

        let surface = self.bridge.ensure_surface();
        let mut player = match factory.create(&self.media_file) {
            Ok(player) => player,
            Err(e) => {
                error!(media_file = %self.media_file, error = %e, "Failed to create media player");
                self.bridge.close();
                return Ok(());
            }
        };
        player.set_surface(Some(Arc::clone(&surface)));
        player.set_looping(self.looping);
        host.set_surface_texture(surface);

        if let Err(e) = player.start() {
            error!(media_file = %self.media_file, error = %e, "Failed to start playback");
            player.set_surface(None);
            player.release();
            self.bridge.close();
            return Ok(());
        }
        info!(media_file = %self.media_file, looping = self.looping, "Playback started");
        self.player = Some(player);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut player) = self.player.take() {
            if let Err(e) = player.stop() {
                warn!(error = %e, "Failed to stop playback");
            }
            player.set_surface(None);
            player.release();
            info!(media_file = %self.media_file, "Playback stopped");
        }
        self.bridge.close();
    }

    fn is_started(&self) -> bool {
        self.player.is_some()
    }

    fn compute_display_size_from_view_size(&self, view_size: Size) -> Option<Size> {
        (!view_size.is_empty()).then_some(view_size)
    }

    fn is_rotated(&self) -> bool {
        false
    }

    fn attach(&self, surface: Option<&Arc<DestinationSurface>>, width: u32, height: u32) {
        self.bridge.attach(surface, width, height);
    }

    fn stats(&self) -> SourceStats {
        self.bridge.stats()
    }
}

impl Drop for MediaPlayerTextureFrameSource {
    fn drop(&mut self) {
        self.stop();
    }
}
