//! ML inference module
//!
//! Wraps the two pretrained models behind one engine: the hand-landmark
//! detector and the gesture classifier, both running through ONNX Runtime.
//! Model loading happens on a background thread; once the readiness flag is
//! set, per-frame inference runs synchronously on the caller's thread so a
//! frame's detect and classify steps always finish before the next frame
//! starts.

pub mod classifier;
pub mod landmarker;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

pub use classifier::{Classification, GestureClassifier, GestureModelPaths};
pub use landmarker::HandLandmarker;

use crate::camera::CameraFrame;

/// Number of landmarks per detected hand
pub const LANDMARK_COUNT: usize = 21;

/// A single hand landmark, coordinates normalized to the frame
#[derive(Clone, Copy, Debug, Default)]
pub struct HandLandmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// One detected hand: 21 landmarks plus the detector's presence score
#[derive(Clone, Debug)]
pub struct HandLandmarkSet {
    pub landmarks: [HandLandmark; LANDMARK_COUNT],
    pub score: f32,
}

/// Errors from model loading or per-frame inference
#[derive(Debug, thiserror::Error)]
pub enum MlError {
    #[error("model file not found: {0}")]
    ModelNotFound(PathBuf),
    #[error("model metadata error: {0}")]
    Metadata(String),
    #[error("onnx runtime error: {0}")]
    Ort(#[from] ort::Error),
    #[error("unexpected model output: {0}")]
    BadOutput(String),
}

/// Result of one prediction-loop iteration
#[derive(Clone, Debug, Default)]
pub struct GestureFrame {
    /// Landmark sets detected this frame (0 or 1 with `max_hands = 1`)
    pub hands: Vec<HandLandmarkSet>,
    /// Classifier output for the first hand, highest confidence first
    pub classifications: Vec<Classification>,
}

/// Loaded model sessions, produced by the init thread
struct Sessions {
    landmarker: HandLandmarker,
    classifier: GestureClassifier,
}

/// The gesture inference engine
///
/// Created immediately; `is_ready` stays false until the init thread has
/// loaded both models. If loading fails the flag never becomes true and
/// `process` keeps returning empty frames, so gestures are silently skipped
/// forever.
pub struct GestureEngine {
    sessions: Option<Sessions>,
    pending: Arc<Mutex<Option<Sessions>>>,
    ready: Arc<AtomicBool>,
}

impl GestureEngine {
    /// Start loading models in the background
    ///
    /// `model_dir` must contain `hand_landmarker.onnx` plus the classifier
    /// descriptor bundle (`gesture_classifier.onnx`,
    /// `gesture_classifier_meta.json`).
    pub fn new(model_dir: PathBuf, max_hands: usize) -> Self {
        let pending: Arc<Mutex<Option<Sessions>>> = Arc::new(Mutex::new(None));
        let ready = Arc::new(AtomicBool::new(false));

        let pending_clone = pending.clone();
        let ready_clone = ready.clone();

        let spawned = std::thread::Builder::new()
            .name("model-init".to_string())
            .spawn(move || match Self::load_sessions(&model_dir, max_hands) {
                Ok(sessions) => {
                    *pending_clone.lock() = Some(sessions);
                    ready_clone.store(true, Ordering::Release);
                    log::info!("Gesture models loaded");
                }
                Err(e) => {
                    log::warn!("Failed to load gesture models: {}. Gestures disabled.", e);
                }
            });

        if let Err(e) = spawned {
            log::warn!("Failed to spawn model init thread: {}", e);
        }

        Self {
            sessions: None,
            pending,
            ready,
        }
    }

    fn load_sessions(model_dir: &std::path::Path, max_hands: usize) -> Result<Sessions, MlError> {
        ort::init().with_name("GestureGallery").commit()?;

        let landmarker = HandLandmarker::new(model_dir.join("hand_landmarker.onnx"), max_hands)?;
        let classifier = GestureClassifier::load(GestureModelPaths {
            model: model_dir.join("gesture_classifier.onnx"),
            metadata: model_dir.join("gesture_classifier_meta.json"),
        })?;

        Ok(Sessions {
            landmarker,
            classifier,
        })
    }

    /// Whether both models have finished loading
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Run one iteration: detect hands, then classify the first one
    ///
    /// Returns an empty frame until the models are ready. Both inference calls
    /// complete before this returns, keeping iterations strictly sequential.
    pub fn process(
        &mut self,
        frame: &CameraFrame,
        timestamp_ms: u64,
    ) -> Result<GestureFrame, MlError> {
        if self.sessions.is_none() && self.is_ready() {
            self.sessions = self.pending.lock().take();
        }

        let Some(sessions) = self.sessions.as_mut() else {
            return Ok(GestureFrame::default());
        };

        let hands = sessions.landmarker.detect_for_video(frame, timestamp_ms)?;

        // First detected hand is authoritative; the detector is configured for
        // at most one anyway.
        let classifications = match hands.first() {
            Some(hand) => {
                let features = crate::predict::extract_features(hand);
                sessions.classifier.classify(&features)?
            }
            None => Vec::new(),
        };

        Ok(GestureFrame {
            hands,
            classifications,
        })
    }
}

/// Find the models directory, probing next to the executable and the cwd
pub fn find_model_dir() -> Option<PathBuf> {
    if let Ok(exe_path) = std::env::current_exe() {
        // Walk up a few levels to cover `cargo run` from target/debug
        let mut dir = exe_path.parent().map(|p| p.to_path_buf());
        for _ in 0..3 {
            let Some(parent) = dir else { break };
            let candidate = parent.join("models");
            if candidate.exists() {
                return Some(candidate);
            }
            dir = parent.parent().map(|p| p.to_path_buf());
        }
    }

    let cwd = std::env::current_dir().ok()?;
    let candidate = cwd.join("models");
    candidate.exists().then_some(candidate)
}
