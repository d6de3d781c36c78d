//! Camera Preview Demo - Drive a Camera2 source against a simulated camera
//!
//! Runs the whole preview lifecycle (resume, surface change, frame stream,
//! pause) with an in-process camera service that renders synthetic frames.

use bytes::Bytes;
use futures::StreamExt;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use texframe::{
    frame_stream, keys, ForegroundContext, GlobalConfig, GraphicsContext,
    NativeLibraryLoader, Options, Permission, PermissionResolver, PermissionStatus,
    PreviewDisplay, Size, SourceReport, TexFrame, TextureFrameConsumer, TextureFrameHost,
};
use texframe_media::{
    CameraCharacteristics, CameraDeviceHandle, CameraManager, CaptureRequest,
    CaptureSessionHandle, DestinationSurface, DeviceStateCallback, LensFacing, MediaResult,
    RawFrame, SessionStateCallback, TextureName,
};

const FRAME_SIZE: Size = Size::new(1280, 720);

struct NoopLoader;

impl NativeLibraryLoader for NoopLoader {
    fn load_library(&self, name: &str) -> Result<(), String> {
        println!("📦 Loading native library {name}");
        Ok(())
    }
}

struct AllowAll;

impl PermissionResolver for AllowAll {
    fn check_self_permission(&self, _permission: Permission) -> PermissionStatus {
        PermissionStatus::Granted
    }

    fn request_permissions(&self, _permissions: &[Permission], _request_code: i32) {}

    fn on_request_permissions_result(&self, _: i32, _: &[String], _: &[PermissionStatus]) {}
}

#[derive(Default)]
struct CountingGl {
    next: AtomicU32,
}

impl GraphicsContext for CountingGl {
    fn create_texture(&self, _size: Size) -> MediaResult<TextureName> {
        Ok(TextureName(self.next.fetch_add(1, Ordering::Relaxed) + 1))
    }

    fn render_external_frame(&self, _: &RawFrame, _: TextureName, _: Size) -> MediaResult<()> {
        Ok(())
    }

    fn delete_texture(&self, _texture: TextureName) {}
}

/// Pushes synthetic frames into the session's targets until closed
struct SimulatedSession {
    running: Arc<AtomicBool>,
}

impl CaptureSessionHandle for SimulatedSession {
    fn set_repeating_request(&self, request: CaptureRequest) -> MediaResult<()> {
        let running = self.running.clone();
        running.store(true, Ordering::SeqCst);
        thread::spawn(move || {
            let mut timestamp_ns = 0i64;
            while running.load(Ordering::SeqCst) {
                for target in &request.targets {
                    let frame = RawFrame::new(
                        FRAME_SIZE.width,
                        FRAME_SIZE.height,
                        timestamp_ns,
                        Bytes::from_static(&[0x80; 64]),
                    );
                    if target.queue_frame(frame).is_err() {
                        return;
                    }
                }
                timestamp_ns += 33_333_333;
                thread::sleep(Duration::from_millis(33));
            }
        });
        Ok(())
    }

    fn close(&self) -> MediaResult<()> {
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }
}

struct SimulatedDevice;

impl CameraDeviceHandle for SimulatedDevice {
    fn id(&self) -> &str {
        "sim-back"
    }

    fn create_capture_session(
        &self,
        _outputs: Vec<Arc<DestinationSurface>>,
        callback: Arc<dyn SessionStateCallback>,
    ) -> MediaResult<()> {
        callback.on_configured(Arc::new(SimulatedSession {
            running: Arc::new(AtomicBool::new(false)),
        }));
        Ok(())
    }

    fn close(&self) -> MediaResult<()> {
        println!("📷 Simulated camera closed");
        Ok(())
    }
}

struct SimulatedCameraService;

impl CameraManager for SimulatedCameraService {
    fn camera_id_list(&self) -> MediaResult<Vec<String>> {
        Ok(vec!["sim-back".to_string()])
    }

    fn camera_characteristics(&self, _camera_id: &str) -> MediaResult<CameraCharacteristics> {
        Ok(CameraCharacteristics {
            lens_facing: Some(LensFacing::Back),
            sensor_orientation: 90,
            output_sizes: vec![FRAME_SIZE],
        })
    }

    fn open_camera(
        &self,
        _camera_id: &str,
        callback: Arc<dyn DeviceStateCallback>,
    ) -> MediaResult<()> {
        // The real service answers from its own thread
        thread::spawn(move || callback.on_opened(Arc::new(SimulatedDevice)));
        Ok(())
    }
}

struct DemoForeground;

impl ForegroundContext for DemoForeground {
    fn permission_resolver(&self) -> Arc<dyn PermissionResolver> {
        Arc::new(AllowAll)
    }

    fn camera_manager(&self) -> MediaResult<Arc<dyn CameraManager>> {
        Ok(Arc::new(SimulatedCameraService))
    }
}

struct DemoHost {
    gl: Arc<CountingGl>,
    display: Arc<PreviewDisplay>,
    shown: Mutex<u32>,
}

impl TextureFrameHost for DemoHost {
    fn graphics_context(&self) -> Arc<dyn GraphicsContext> {
        self.gl.clone()
    }

    fn foreground_context(&self) -> Arc<dyn ForegroundContext> {
        Arc::new(DemoForeground)
    }

    fn set_surface_texture(&self, surface: Arc<DestinationSurface>) {
        *self.shown.lock() += 1;
        println!("🖼️  Preview surface {} ready", surface.id());
        self.display.set_surface_texture(surface);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🎥 Camera Preview Demo - Simulated Camera2 Source");
    println!("==================================================");

    // Installs the debug logger before loading the native libraries
    let config = GlobalConfig::default().with_debug_logging(true);
    let texframe = TexFrame::init_with(config, &NoopLoader)?;
    println!("✅ Native runtime ready: {:?}", texframe.loaded_libraries());

    let display = Arc::new(PreviewDisplay::new());
    let host = Arc::new(DemoHost {
        gl: Arc::new(CountingGl::default()),
        display: display.clone(),
        shown: Mutex::new(0),
    });
    let options = Options::new()
        .with(keys::TEXTURE_FRAME_SOURCE, "Camera2")
        .with(keys::CAMERA_FACING_FRONT, false)
        .with(keys::CONVERTER_NUM_BUFFERS, 3);

    let (sender, mut frames) = frame_stream(8);
    let consumer: Arc<dyn TextureFrameConsumer> = sender.clone();
    let mut preview = texframe.preview(host.clone(), display.clone(), options);
    preview.set_consumer(Some(consumer));

    println!("🚀 Resuming preview...");
    preview.resume()?;

    // Wait for the camera to open and hand out its surface
    while !display.is_visible() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let displayed = preview
        .on_display_surface_changed(1080, 1920)
        .ok_or("display size not known yet")?;
    println!("📐 Display size for a 1080x1920 view: {displayed}");

    println!("📹 Receiving frames...");
    for _ in 0..10 {
        match tokio::time::timeout(Duration::from_secs(2), frames.next()).await {
            Ok(Some(frame)) => println!(
                "  frame texture={:?} {}x{} ts={}ns",
                frame.texture_name(),
                frame.width(),
                frame.height(),
                frame.timestamp_ns()
            ),
            Ok(None) => break,
            Err(_) => {
                println!("⏰ Timed out waiting for a frame");
                break;
            }
        }
    }

    if let Some(source) = preview.source() {
        let report = SourceReport::capture(source);
        println!("📊 {}", report.summary());
        println!("{}", report.to_json()?);
    }

    println!("⏸️  Pausing preview...");
    preview.pause();
    println!(
        "🏁 Done: surface shown {} time(s), {} frame(s) dropped by the stream",
        *host.shown.lock(),
        sender.dropped()
    );
    Ok(())
}
