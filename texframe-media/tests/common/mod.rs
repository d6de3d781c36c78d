//! In-process fakes of every platform seam used by the integration tests

#![allow(dead_code)]

use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use texframe_media::*;

/// Poll `condition` until it holds or two seconds pass
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

pub fn raw_frame(timestamp_ns: i64) -> RawFrame {
    RawFrame::new(640, 480, timestamp_ns, Bytes::from_static(&[0u8; 16]))
}

// ============================================================================
// PERMISSIONS
// ============================================================================

#[derive(Default)]
pub struct FakeResolver {
    pub granted: Mutex<Vec<Permission>>,
    pub requests: Mutex<Vec<(Vec<Permission>, i32)>>,
    pub results: Mutex<Vec<(i32, Vec<String>, Vec<PermissionStatus>)>>,
}

impl FakeResolver {
    pub fn granting(permissions: &[Permission]) -> Arc<Self> {
        let resolver = Self::default();
        *resolver.granted.lock() = permissions.to_vec();
        Arc::new(resolver)
    }

    pub fn grant(&self, permission: Permission) {
        self.granted.lock().push(permission);
    }
}

impl PermissionResolver for FakeResolver {
    fn check_self_permission(&self, permission: Permission) -> PermissionStatus {
        if self.granted.lock().contains(&permission) {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }

    fn request_permissions(&self, permissions: &[Permission], request_code: i32) {
        self.requests
            .lock()
            .push((permissions.to_vec(), request_code));
    }

    fn on_request_permissions_result(
        &self,
        request_code: i32,
        permissions: &[String],
        grants: &[PermissionStatus],
    ) {
        self.results
            .lock()
            .push((request_code, permissions.to_vec(), grants.to_vec()));
    }
}

// ============================================================================
// GRAPHICS
// ============================================================================

#[derive(Default)]
pub struct FakeGl {
    next: AtomicU32,
    pub created: AtomicUsize,
    pub deleted: Mutex<Vec<TextureName>>,
    pub renders: Mutex<Vec<(TextureName, Size, i64)>>,
    pub fail_render: AtomicBool,
}

impl GraphicsContext for FakeGl {
    fn create_texture(&self, _size: Size) -> MediaResult<TextureName> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(TextureName(self.next.fetch_add(1, Ordering::SeqCst) + 1))
    }

    fn render_external_frame(
        &self,
        frame: &RawFrame,
        target: TextureName,
        size: Size,
    ) -> MediaResult<()> {
        if self.fail_render.load(Ordering::SeqCst) {
            return Err(MediaError::Graphics {
                message: "render failed".to_string(),
            });
        }
        self.renders.lock().push((target, size, frame.timestamp_ns));
        Ok(())
    }

    fn delete_texture(&self, texture: TextureName) {
        self.deleted.lock().push(texture);
    }
}

// ============================================================================
// HARDWARE CAMERA
// ============================================================================

/// Whether the fake camera service answers callbacks immediately
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Auto,
    Manual,
}

#[derive(Default)]
pub struct FakeSession {
    pub requests: Mutex<Vec<CaptureRequest>>,
    pub closed: AtomicUsize,
    pub fail_request: AtomicBool,
    pub fail_close: AtomicBool,
    /// While set, `set_repeating_request` blocks; shared with the manager
    pub hold_requests: Arc<AtomicBool>,
    pub request_entered: AtomicBool,
}

impl CaptureSessionHandle for FakeSession {
    fn set_repeating_request(&self, request: CaptureRequest) -> MediaResult<()> {
        self.request_entered.store(true, Ordering::SeqCst);
        while self.hold_requests.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(2));
        }
        if self.fail_request.load(Ordering::SeqCst) {
            return Err(MediaError::SessionNegotiationFailed {
                reason: "request rejected".to_string(),
            });
        }
        self.requests.lock().push(request);
        Ok(())
    }

    fn close(&self) -> MediaResult<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(MediaError::SessionNegotiationFailed {
                reason: "session already abandoned".to_string(),
            });
        }
        Ok(())
    }
}

pub struct FakeCameraDevice {
    id: String,
    mode: Mode,
    pub closed: AtomicUsize,
    pub fail_close: AtomicBool,
    pub reject_session: AtomicBool,
    pub session: Arc<FakeSession>,
    pub session_outputs: Mutex<Vec<Arc<DestinationSurface>>>,
    pub pending_session: Mutex<Option<Arc<dyn SessionStateCallback>>>,
}

impl FakeCameraDevice {
    fn new(id: &str, mode: Mode, hold_requests: Arc<AtomicBool>) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            mode,
            closed: AtomicUsize::new(0),
            fail_close: AtomicBool::new(false),
            reject_session: AtomicBool::new(false),
            session: Arc::new(FakeSession {
                hold_requests,
                ..FakeSession::default()
            }),
            session_outputs: Mutex::new(Vec::new()),
            pending_session: Mutex::new(None),
        })
    }

    /// Deliver a stored session outcome in manual mode
    pub fn complete_session(&self) {
        if let Some(callback) = self.pending_session.lock().take() {
            callback.on_configured(self.session.clone());
        }
    }
}

impl CameraDeviceHandle for FakeCameraDevice {
    fn id(&self) -> &str {
        &self.id
    }

    fn create_capture_session(
        &self,
        outputs: Vec<Arc<DestinationSurface>>,
        callback: Arc<dyn SessionStateCallback>,
    ) -> MediaResult<()> {
        *self.session_outputs.lock() = outputs;
        if self.reject_session.load(Ordering::SeqCst) {
            callback.on_configure_failed();
            return Ok(());
        }
        match self.mode {
            Mode::Auto => callback.on_configured(self.session.clone()),
            Mode::Manual => *self.pending_session.lock() = Some(callback),
        }
        Ok(())
    }

    fn close(&self) -> MediaResult<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(MediaError::CameraAccess {
                camera_id: self.id.clone(),
                reason: "already closed".to_string(),
            });
        }
        Ok(())
    }
}

pub struct FakeCameraManager {
    mode: Mode,
    pub cameras: Mutex<Vec<(String, CameraCharacteristics)>>,
    pub fail_list: AtomicBool,
    pub deny_open: AtomicBool,
    /// Blocks preview requests on every session this manager creates
    pub hold_requests: Arc<AtomicBool>,
    pub opened: Mutex<Vec<String>>,
    pub devices: Mutex<Vec<Arc<FakeCameraDevice>>>,
    pub pending: Mutex<Vec<(Arc<FakeCameraDevice>, Arc<dyn DeviceStateCallback>)>>,
    pub callbacks: Mutex<Vec<Arc<dyn DeviceStateCallback>>>,
}

impl FakeCameraManager {
    pub fn new(mode: Mode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            cameras: Mutex::new(vec![
                (
                    "0".to_string(),
                    characteristics(LensFacing::Front, 270, Size::new(1280, 720)),
                ),
                (
                    "1".to_string(),
                    characteristics(LensFacing::Back, 90, Size::new(1920, 1080)),
                ),
            ]),
            fail_list: AtomicBool::new(false),
            deny_open: AtomicBool::new(false),
            hold_requests: Arc::new(AtomicBool::new(false)),
            opened: Mutex::new(Vec::new()),
            devices: Mutex::new(Vec::new()),
            pending: Mutex::new(Vec::new()),
            callbacks: Mutex::new(Vec::new()),
        })
    }

    pub fn last_device(&self) -> Option<Arc<FakeCameraDevice>> {
        self.devices.lock().last().cloned()
    }

    /// Deliver the oldest stored open outcome in manual mode
    pub fn complete_open(&self) -> Option<Arc<FakeCameraDevice>> {
        let (device, callback) = {
            let mut pending = self.pending.lock();
            if pending.is_empty() {
                return None;
            }
            pending.remove(0)
        };
        callback.on_opened(device.clone());
        Some(device)
    }

    pub fn last_callback(&self) -> Option<Arc<dyn DeviceStateCallback>> {
        self.callbacks.lock().last().cloned()
    }
}

pub fn characteristics(facing: LensFacing, orientation: i32, size: Size) -> CameraCharacteristics {
    CameraCharacteristics {
        lens_facing: Some(facing),
        sensor_orientation: orientation,
        output_sizes: vec![size, Size::new(640, 480)],
    }
}

impl CameraManager for FakeCameraManager {
    fn camera_id_list(&self) -> MediaResult<Vec<String>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(MediaError::DeviceEnumerationFailed {
                reason: "camera service unavailable".to_string(),
            });
        }
        Ok(self.cameras.lock().iter().map(|(id, _)| id.clone()).collect())
    }

    fn camera_characteristics(&self, camera_id: &str) -> MediaResult<CameraCharacteristics> {
        self.cameras
            .lock()
            .iter()
            .find(|(id, _)| id == camera_id)
            .map(|(_, characteristics)| characteristics.clone())
            .ok_or_else(|| MediaError::CameraAccess {
                camera_id: camera_id.to_string(),
                reason: "unknown camera".to_string(),
            })
    }

    fn open_camera(
        &self,
        camera_id: &str,
        callback: Arc<dyn DeviceStateCallback>,
    ) -> MediaResult<()> {
        if self.deny_open.load(Ordering::SeqCst) {
            return Err(MediaError::CameraAccess {
                camera_id: camera_id.to_string(),
                reason: "camera disabled by policy".to_string(),
            });
        }
        self.opened.lock().push(camera_id.to_string());
        let device = FakeCameraDevice::new(camera_id, self.mode, self.hold_requests.clone());
        self.devices.lock().push(device.clone());
        self.callbacks.lock().push(callback.clone());
        match self.mode {
            Mode::Auto => callback.on_opened(device),
            Mode::Manual => self.pending.lock().push((device, callback)),
        }
        Ok(())
    }
}

// ============================================================================
// CAMERA SELECTION LIBRARY
// ============================================================================

#[derive(Default)]
pub struct FakeBinding {
    pub opened: AtomicUsize,
    pub streaming: AtomicUsize,
    pub unbound: AtomicUsize,
    pub fail_streaming: AtomicBool,
    pub callback: Mutex<Option<Arc<dyn PreviewStateCallback>>>,
}

impl PreviewBinding for FakeBinding {
    fn open(&self, callback: Arc<dyn PreviewStateCallback>) -> MediaResult<()> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        *self.callback.lock() = Some(callback.clone());
        callback.on_camera_opened();
        Ok(())
    }

    fn start_streaming(&self) -> MediaResult<()> {
        if self.fail_streaming.load(Ordering::SeqCst) {
            return Err(MediaError::SessionNegotiationFailed {
                reason: "use case rejected".to_string(),
            });
        }
        self.streaming.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn unbind(&self) -> MediaResult<()> {
        self.unbound.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FakeCameraProvider {
    pub cameras: Vec<CameraInfo>,
    pub bindings: Mutex<Vec<(String, Arc<FakeBinding>)>>,
    pub fail_streaming: AtomicBool,
}

impl FakeCameraProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            cameras: vec![
                CameraInfo {
                    camera_id: "front".to_string(),
                    lens_facing: Some(LensFacing::Front),
                    sensor_rotation_degrees: 270,
                    preview_size: Size::new(1280, 720),
                },
                CameraInfo {
                    camera_id: "back".to_string(),
                    lens_facing: Some(LensFacing::Back),
                    sensor_rotation_degrees: 0,
                    preview_size: Size::new(1920, 1080),
                },
            ],
            bindings: Mutex::new(Vec::new()),
            fail_streaming: AtomicBool::new(false),
        })
    }

    pub fn last_binding(&self) -> Option<Arc<FakeBinding>> {
        self.bindings.lock().last().map(|(_, binding)| binding.clone())
    }
}

impl CameraProvider for FakeCameraProvider {
    fn available_cameras(&self) -> MediaResult<Vec<CameraInfo>> {
        Ok(self.cameras.clone())
    }

    fn bind_preview(
        &self,
        camera: &CameraInfo,
        _surface: Arc<DestinationSurface>,
    ) -> MediaResult<Arc<dyn PreviewBinding>> {
        let binding = Arc::new(FakeBinding::default());
        binding
            .fail_streaming
            .store(self.fail_streaming.load(Ordering::SeqCst), Ordering::SeqCst);
        self.bindings
            .lock()
            .push((camera.camera_id.clone(), binding.clone()));
        Ok(binding)
    }
}

// ============================================================================
// MEDIA PLAYER
// ============================================================================

pub struct FakePlayer {
    log: Arc<Mutex<Vec<String>>>,
    fail_start: bool,
}

impl MediaPlayer for FakePlayer {
    fn set_surface(&mut self, surface: Option<Arc<DestinationSurface>>) {
        let entry = match surface {
            Some(surface) => format!("set_surface({})", surface.id()),
            None => "set_surface(none)".to_string(),
        };
        self.log.lock().push(entry);
    }

    fn set_looping(&mut self, looping: bool) {
        self.log.lock().push(format!("set_looping({looping})"));
    }

    fn start(&mut self) -> MediaResult<()> {
        self.log.lock().push("start".to_string());
        if self.fail_start {
            return Err(MediaError::Playback {
                message: "unsupported codec".to_string(),
            });
        }
        Ok(())
    }

    fn stop(&mut self) -> MediaResult<()> {
        self.log.lock().push("stop".to_string());
        Ok(())
    }

    fn release(&mut self) {
        self.log.lock().push("release".to_string());
    }
}

#[derive(Default)]
pub struct FakePlayerFactory {
    pub log: Arc<Mutex<Vec<String>>>,
    pub uris: Mutex<Vec<String>>,
    pub fail_create: AtomicBool,
    pub fail_start: AtomicBool,
}

impl MediaPlayerFactory for FakePlayerFactory {
    fn create(&self, uri: &str) -> MediaResult<Box<dyn MediaPlayer>> {
        self.uris.lock().push(uri.to_string());
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(MediaError::Playback {
                message: format!("cannot open {uri}"),
            });
        }
        Ok(Box::new(FakePlayer {
            log: self.log.clone(),
            fail_start: self.fail_start.load(Ordering::SeqCst),
        }))
    }
}

// ============================================================================
// HOST
// ============================================================================

pub struct FakeForeground {
    pub resolver: Arc<FakeResolver>,
    pub manager: Arc<FakeCameraManager>,
    pub provider: Arc<FakeCameraProvider>,
    pub players: Arc<FakePlayerFactory>,
}

impl ForegroundContext for FakeForeground {
    fn permission_resolver(&self) -> Arc<dyn PermissionResolver> {
        self.resolver.clone()
    }

    fn camera_manager(&self) -> MediaResult<Arc<dyn CameraManager>> {
        Ok(self.manager.clone())
    }

    fn camera_provider(&self) -> MediaResult<Arc<dyn CameraProvider>> {
        Ok(self.provider.clone())
    }

    fn media_player_factory(&self) -> MediaResult<Arc<dyn MediaPlayerFactory>> {
        Ok(self.players.clone())
    }
}

pub struct FakeHost {
    pub gl: Arc<FakeGl>,
    pub foreground: Arc<FakeForeground>,
    pub surfaces: Mutex<Vec<Arc<DestinationSurface>>>,
}

impl FakeHost {
    pub fn new(mode: Mode, granted: &[Permission]) -> Arc<Self> {
        Arc::new(Self {
            gl: Arc::new(FakeGl::default()),
            foreground: Arc::new(FakeForeground {
                resolver: FakeResolver::granting(granted),
                manager: FakeCameraManager::new(mode),
                provider: FakeCameraProvider::new(),
                players: Arc::new(FakePlayerFactory::default()),
            }),
            surfaces: Mutex::new(Vec::new()),
        })
    }

    pub fn as_host(self: &Arc<Self>) -> Arc<dyn TextureFrameHost> {
        self.clone()
    }

    pub fn manager(&self) -> &Arc<FakeCameraManager> {
        &self.foreground.manager
    }

    pub fn last_surface(&self) -> Option<Arc<DestinationSurface>> {
        self.surfaces.lock().last().cloned()
    }
}

impl TextureFrameHost for FakeHost {
    fn graphics_context(&self) -> Arc<dyn GraphicsContext> {
        self.gl.clone()
    }

    fn foreground_context(&self) -> Arc<dyn ForegroundContext> {
        self.foreground.clone()
    }

    fn set_surface_texture(&self, surface: Arc<DestinationSurface>) {
        self.surfaces.lock().push(surface);
    }
}

// ============================================================================
// CONSUMER
// ============================================================================

#[derive(Default)]
pub struct CollectingConsumer {
    pub frames: Mutex<Vec<(u64, Size, i64)>>,
    /// Keep delivered frames alive instead of returning them to the pool
    pub hold: AtomicBool,
    pub held: Mutex<Vec<TextureFrame>>,
}

impl TextureFrameConsumer for CollectingConsumer {
    fn on_new_frame(&self, frame: TextureFrame) {
        self.frames
            .lock()
            .push((frame.surface_id(), frame.size(), frame.timestamp_ns()));
        if self.hold.load(Ordering::SeqCst) {
            self.held.lock().push(frame);
        }
    }
}
