//! Preview lifecycle glue
//!
//! [`PreviewController`] performs what the host activity does around a
//! texture frame source: build the source on resume, stop it on pause, and
//! re-attach it whenever the display surface changes size.
//! [`PreviewDisplay`] is the host-side record of the surface handed over by
//! the source and whether the preview view is shown.

use parking_lot::Mutex;
use std::sync::Arc;
use texframe_core::{keys, Options};
use texframe_media::{
    build_texture_frame_source, DestinationSurface, MediaResult, PermissionStatus, Size,
    TextureFrameConsumer, TextureFrameHost, TextureFrameProducer, TextureFrameSource,
};
use tracing::{debug, info};

/// Frames are flipped vertically unless the options say otherwise
pub const DEFAULT_FLIP_FRAMES_VERTICALLY: bool = true;

#[derive(Debug, Default)]
struct DisplayState {
    surface: Option<Arc<DestinationSurface>>,
    visible: bool,
}

/// Host-side preview view state
#[derive(Debug, Default)]
pub struct PreviewDisplay {
    state: Mutex<DisplayState>,
}

impl PreviewDisplay {
    /// Hidden display with no surface
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the source's surface and reveal the view.
    ///
    /// Hosts call this from [`TextureFrameHost::set_surface_texture`].
    pub fn set_surface_texture(&self, surface: Arc<DestinationSurface>) {
        let mut state = self.state.lock();
        debug!(surface_id = surface.id(), "Preview display shown");
        state.surface = Some(surface);
        state.visible = true;
    }

    /// Hide the view until a new surface arrives
    pub fn hide(&self) {
        self.state.lock().visible = false;
    }

    /// Whether the view is shown
    pub fn is_visible(&self) -> bool {
        self.state.lock().visible
    }

    /// Last surface handed over by the source
    pub fn preview_surface(&self) -> Option<Arc<DestinationSurface>> {
        self.state.lock().surface.clone()
    }
}

/// Drives one texture frame source through the host's lifecycle
pub struct PreviewController {
    host: Arc<dyn TextureFrameHost>,
    display: Arc<PreviewDisplay>,
    options: Options,
    consumer: Option<Arc<dyn TextureFrameConsumer>>,
    source: Option<Box<dyn TextureFrameSource>>,
}

impl PreviewController {
    /// Controller for the given host, display and merged options
    pub fn new(host: Arc<dyn TextureFrameHost>, display: Arc<PreviewDisplay>, options: Options) -> Self {
        Self {
            host,
            display,
            options,
            consumer: None,
            source: None,
        }
    }

    /// Consumer registered on every source this controller builds
    pub fn set_consumer(&mut self, consumer: Option<Arc<dyn TextureFrameConsumer>>) {
        if let Some(source) = &self.source {
            source.set_consumer(consumer.as_ref());
        }
        self.consumer = consumer;
    }

    /// Options the sources are built from
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Whether output frames should be flipped vertically for display
    pub fn flip_frames_vertically(&self) -> bool {
        self.options
            .get_bool_or(keys::FLIP_FRAMES_VERTICALLY, DEFAULT_FLIP_FRAMES_VERTICALLY)
    }

    /// The current source, if one was built
    pub fn source(&self) -> Option<&dyn TextureFrameSource> {
        self.source.as_deref()
    }

    /// The display this controller reveals and hides
    pub fn display(&self) -> &Arc<PreviewDisplay> {
        &self.display
    }

    /// Build a fresh source, request permissions and start it.
    ///
    /// Without permissions the source stays idle; call `resume` again once
    /// the grant arrives.
    pub fn resume(&mut self) -> MediaResult<()> {
        if let Some(mut previous) = self.source.take() {
            previous.stop();
        }
        let mut source = build_texture_frame_source(&self.host, &self.options)?;
        source.check_and_request_permissions();
        source.set_consumer(self.consumer.as_ref());
        source.start()?;
        info!(source = %source.kind(), started = source.is_started(), "Preview resumed");
        self.source = Some(source);
        Ok(())
    }

    /// Stop the source and hide the display until the next start
    pub fn pause(&mut self) {
        if let Some(source) = self.source.as_mut() {
            source.stop();
        }
        self.display.hide();
        debug!("Preview paused");
    }

    /// Forward the host's permission result to the source
    pub fn on_request_permissions_result(
        &self,
        request_code: i32,
        permissions: &[String],
        grants: &[PermissionStatus],
    ) {
        if let Some(source) = &self.source {
            source.on_request_permissions_result(request_code, permissions, grants);
        }
    }

    /// Recompute the display size for a resized view and re-attach the
    /// preview surface. Width and height are exchanged for rotated sources.
    ///
    /// Returns the display size, or `None` while it is not yet known.
    pub fn on_display_surface_changed(&self, width: u32, height: u32) -> Option<Size> {
        let source = self.source.as_ref()?;
        let view_size = Size::new(width, height);
        let display_size = source.compute_display_size_from_view_size(view_size)?;
        let attached = if source.is_rotated() {
            display_size.transposed()
        } else {
            display_size
        };
        debug!(view = %view_size, display = %display_size, attached = %attached, "Display surface changed");
        source.attach(
            self.display.preview_surface().as_ref(),
            attached.width,
            attached.height,
        );
        Some(display_size)
    }
}

impl std::fmt::Debug for PreviewController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewController")
            .field("source", &self.source.as_ref().map(|s| s.kind()))
            .field("display", &self.display)
            .field("options", &self.options)
            .finish()
    }
}
