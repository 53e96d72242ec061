//! Hand landmark adapter
//!
//! Wraps a MediaPipe-style hand landmark ONNX model. The model takes a
//! 224x224 RGB frame and returns 63 floats (21 landmarks, x/y/z in input
//! pixels) plus a hand-presence score. `detect_for_video` follows the
//! video-mode contract: timestamps must be monotonically non-decreasing, and
//! the adapter clamps any regression.

use std::path::PathBuf;

use ndarray::Array4;

use super::{HandLandmark, HandLandmarkSet, MlError, LANDMARK_COUNT};
use crate::camera::CameraFrame;

/// Model input edge length in pixels
const INPUT_SIZE: u32 = 224;

/// Minimum presence score for a detection to count as a hand
const MIN_PRESENCE_SCORE: f32 = 0.5;

/// Hand landmark detector
pub struct HandLandmarker {
    session: ort::session::Session,
    max_hands: usize,
    last_timestamp_ms: u64,
}

impl HandLandmarker {
    /// Load the detector from an ONNX file
    pub fn new(model_path: PathBuf, max_hands: usize) -> Result<Self, MlError> {
        if !model_path.exists() {
            return Err(MlError::ModelNotFound(model_path));
        }

        let session = ort::session::Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(&model_path)?;

        log::info!("Loaded hand landmark model from {:?}", model_path);

        Ok(Self {
            session,
            max_hands,
            last_timestamp_ms: 0,
        })
    }

    /// Detect hands in a video frame
    ///
    /// Returns 0 to `max_hands` landmark sets. The frame timestamp is clamped
    /// to be non-decreasing across calls.
    pub fn detect_for_video(
        &mut self,
        frame: &CameraFrame,
        timestamp_ms: u64,
    ) -> Result<Vec<HandLandmarkSet>, MlError> {
        self.last_timestamp_ms = clamp_timestamp(self.last_timestamp_ms, timestamp_ms);

        let input = preprocess_rgba(&frame.data, frame.width, frame.height, INPUT_SIZE);
        let input_array = Array4::from_shape_vec(
            (1, INPUT_SIZE as usize, INPUT_SIZE as usize, 3),
            input,
        )
        .map_err(|e| MlError::BadOutput(format!("input shape: {}", e)))?;

        let input_tensor = ort::value::Tensor::from_array(input_array)?;
        let outputs = self.session.run(ort::inputs![input_tensor])?;

        // The model has two float outputs; tell them apart by element count
        // rather than by name, which varies between exports.
        let mut raw_landmarks: Option<Vec<f32>> = None;
        let mut score: Option<f32> = None;

        for (_name, value) in outputs.iter() {
            let Ok((_shape, data)) = value.try_extract_tensor::<f32>() else {
                continue;
            };
            match data.len() {
                n if n == LANDMARK_COUNT * 3 => raw_landmarks = Some(data.to_vec()),
                1 => score = Some(data[0]),
                _ => {}
            }
        }

        let raw = raw_landmarks
            .ok_or_else(|| MlError::BadOutput("no landmark tensor in output".to_string()))?;
        let score = score.unwrap_or(0.0);

        if score < MIN_PRESENCE_SCORE {
            return Ok(Vec::new());
        }

        let landmarks = decode_landmarks(&raw, INPUT_SIZE)
            .ok_or_else(|| MlError::BadOutput("landmark tensor too short".to_string()))?;

        if self.max_hands == 0 {
            return Ok(Vec::new());
        }
        Ok(vec![HandLandmarkSet { landmarks, score }])
    }
}

/// Clamp a frame timestamp so the sequence never decreases
pub(crate) fn clamp_timestamp(last_ms: u64, timestamp_ms: u64) -> u64 {
    if timestamp_ms < last_ms {
        log::debug!(
            "Frame timestamp went backwards ({} < {}), clamping",
            timestamp_ms,
            last_ms
        );
        last_ms
    } else {
        timestamp_ms
    }
}

/// Decode the raw 63-float landmark tensor into normalized landmarks
pub(crate) fn decode_landmarks(raw: &[f32], input_size: u32) -> Option<[HandLandmark; LANDMARK_COUNT]> {
    if raw.len() < LANDMARK_COUNT * 3 {
        return None;
    }

    let scale = input_size as f32;
    let mut landmarks = [HandLandmark::default(); LANDMARK_COUNT];
    for (i, landmark) in landmarks.iter_mut().enumerate() {
        landmark.x = raw[i * 3] / scale;
        landmark.y = raw[i * 3 + 1] / scale;
        landmark.z = raw[i * 3 + 2] / scale;
    }
    Some(landmarks)
}

/// Resize an RGBA frame to `size` x `size` RGB floats in [0, 1], NHWC order
pub(crate) fn preprocess_rgba(data: &[u8], width: u32, height: u32, size: u32) -> Vec<f32> {
    let mut output = vec![0.0f32; (size * size * 3) as usize];

    let x_ratio = width as f32 / size as f32;
    let y_ratio = height as f32 / size as f32;

    for y in 0..size {
        for x in 0..size {
            let src_x = (x as f32 * x_ratio) as u32;
            let src_y = (y as f32 * y_ratio) as u32;
            let src_idx = ((src_y * width + src_x) * 4) as usize;

            if src_idx + 2 < data.len() {
                let out_idx = ((y * size + x) * 3) as usize;
                output[out_idx] = data[src_idx] as f32 / 255.0;
                output[out_idx + 1] = data[src_idx + 1] as f32 / 255.0;
                output[out_idx + 2] = data[src_idx + 2] as f32 / 255.0;
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_timestamp_monotonic() {
        assert_eq!(clamp_timestamp(100, 150), 150);
        assert_eq!(clamp_timestamp(100, 100), 100);
        assert_eq!(clamp_timestamp(100, 50), 100);
    }

    #[test]
    fn test_decode_landmarks_layout() {
        let mut raw = vec![0.0f32; 63];
        // Landmark 5 at input pixel (112, 56, 28)
        raw[15] = 112.0;
        raw[16] = 56.0;
        raw[17] = 28.0;

        let landmarks = decode_landmarks(&raw, 224).unwrap();
        assert_eq!(landmarks.len(), 21);
        assert!((landmarks[5].x - 0.5).abs() < 1e-6);
        assert!((landmarks[5].y - 0.25).abs() < 1e-6);
        assert!((landmarks[5].z - 0.125).abs() < 1e-6);
    }

    #[test]
    fn test_decode_landmarks_rejects_short_tensor() {
        assert!(decode_landmarks(&[0.0; 62], 224).is_none());
    }

    #[test]
    fn test_preprocess_size_and_range() {
        // 2x2 RGBA frame: one white pixel, rest black
        let data = vec![
            255, 255, 255, 255, //
            0, 0, 0, 255, //
            0, 0, 0, 255, //
            0, 0, 0, 255,
        ];

        let out = preprocess_rgba(&data, 2, 2, 4);
        assert_eq!(out.len(), 4 * 4 * 3);
        assert!(out.iter().all(|&v| (0.0..=1.0).contains(&v)));
        // Top-left of the output samples the white source pixel
        assert_eq!(out[0], 1.0);
        assert_eq!(out[1], 1.0);
        assert_eq!(out[2], 1.0);
    }
}
