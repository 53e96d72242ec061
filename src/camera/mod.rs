//! Camera capture module
//!
//! Cross-platform webcam capture via nokhwa. Frames are captured on a
//! background thread into a latest-frame slot; each frame carries a
//! milliseconds-since-start timestamp, which keeps the landmark detector's
//! video-mode contract (non-decreasing timestamps) easy to honor.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use nokhwa::pixel_format::RgbAFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use parking_lot::Mutex;

/// One captured frame
#[derive(Clone)]
pub struct CameraFrame {
    /// RGBA pixel data
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Frame number, starting at 0
    pub frame_number: u64,
    /// Capture time in milliseconds since the capture started
    pub timestamp_ms: u64,
}

/// Information about an available camera
#[derive(Clone, Debug)]
pub struct CameraInfo {
    pub index: u32,
    pub name: String,
}

/// Webcam capture handle
pub struct CameraCapture {
    latest: Arc<Mutex<Option<CameraFrame>>>,
    running: Arc<AtomicBool>,
    frame_count: Arc<AtomicU64>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl CameraCapture {
    /// List available cameras
    pub fn list_cameras() -> Vec<CameraInfo> {
        match nokhwa::query(nokhwa::utils::ApiBackend::Auto) {
            Ok(camera_list) => camera_list
                .iter()
                .enumerate()
                .map(|(idx, info)| CameraInfo {
                    index: idx as u32,
                    name: info.human_name().to_string(),
                })
                .collect(),
            Err(e) => {
                log::warn!("Failed to enumerate cameras: {:?}", e);
                Vec::new()
            }
        }
    }

    /// Open a camera and start capturing on a background thread
    pub fn new(camera_index: u32) -> Result<Self, String> {
        let latest: Arc<Mutex<Option<CameraFrame>>> = Arc::new(Mutex::new(None));
        let running = Arc::new(AtomicBool::new(true));
        let frame_count = Arc::new(AtomicU64::new(0));

        let latest_clone = latest.clone();
        let running_clone = running.clone();
        let frame_count_clone = frame_count.clone();

        let thread_handle = std::thread::Builder::new()
            .name("camera-capture".to_string())
            .spawn(move || {
                Self::capture_thread(camera_index, latest_clone, running_clone, frame_count_clone);
            })
            .map_err(|e| format!("Failed to spawn capture thread: {}", e))?;

        Ok(Self {
            latest,
            running,
            frame_count,
            thread_handle: Some(thread_handle),
        })
    }

    fn capture_thread(
        camera_index: u32,
        latest: Arc<Mutex<Option<CameraFrame>>>,
        running: Arc<AtomicBool>,
        frame_count: Arc<AtomicU64>,
    ) {
        log::info!("Starting camera capture thread (camera {})", camera_index);

        let index = CameraIndex::Index(camera_index);
        let requested =
            RequestedFormat::new::<RgbAFormat>(RequestedFormatType::AbsoluteHighestFrameRate);

        let mut camera = match Camera::new(index.clone(), requested) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Failed to open camera at highest frame rate: {:?}", e);

                let fallback = RequestedFormat::new::<RgbAFormat>(RequestedFormatType::None);
                match Camera::new(index, fallback) {
                    Ok(c) => c,
                    Err(e2) => {
                        // Without a camera the prediction loop never starts
                        log::error!("Failed to open camera: {:?}", e2);
                        running.store(false, Ordering::Release);
                        return;
                    }
                }
            }
        };

        if let Err(e) = camera.open_stream() {
            log::error!("Failed to open camera stream: {:?}", e);
            running.store(false, Ordering::Release);
            return;
        }

        log::info!(
            "Camera opened: {} ({}x{})",
            camera.info().human_name(),
            camera.resolution().width(),
            camera.resolution().height()
        );

        let started = Instant::now();

        while running.load(Ordering::Acquire) {
            match camera.frame() {
                Ok(frame) => match frame.decode_image::<RgbAFormat>() {
                    Ok(image) => {
                        let frame_number = frame_count.fetch_add(1, Ordering::Relaxed);
                        let width = image.width();
                        let height = image.height();

                        *latest.lock() = Some(CameraFrame {
                            data: image.into_raw(),
                            width,
                            height,
                            frame_number,
                            timestamp_ms: started.elapsed().as_millis() as u64,
                        });
                    }
                    Err(e) => {
                        log::warn!("Failed to decode frame: {:?}", e);
                    }
                },
                Err(e) => {
                    log::warn!("Failed to capture frame: {:?}", e);
                    std::thread::sleep(std::time::Duration::from_millis(10));
                }
            }
        }

        log::info!("Camera capture thread stopped");
    }

    /// Get the most recently captured frame
    pub fn latest_frame(&self) -> Option<CameraFrame> {
        self.latest.lock().clone()
    }

    /// Whether the capture thread is still running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Total frames captured so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count.load(Ordering::Relaxed)
    }

    /// Stop capturing and join the thread
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        self.stop();
    }
}
