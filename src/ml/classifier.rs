//! Gesture classifier adapter
//!
//! Wraps the pretrained gesture classification model. The descriptor bundle is
//! an ONNX file (weights embedded) plus a metadata JSON carrying the ordered
//! label list. Input is the flat 63-float landmark vector; output is one score
//! per label, returned highest confidence first.

use std::path::PathBuf;

use ndarray::Array2;
use serde::Deserialize;

use super::MlError;
use crate::predict::FEATURE_LEN;

/// Classifier descriptor bundle
pub struct GestureModelPaths {
    /// ONNX model (topology + weights)
    pub model: PathBuf,
    /// Metadata JSON with the label list
    pub metadata: PathBuf,
}

/// One classification result
#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    pub label: String,
    pub confidence: f32,
}

#[derive(Deserialize)]
struct ModelMetadata {
    labels: Vec<String>,
}

/// Gesture classifier
pub struct GestureClassifier {
    session: ort::session::Session,
    labels: Vec<String>,
}

impl GestureClassifier {
    /// Load the classifier from its descriptor bundle
    pub fn load(paths: GestureModelPaths) -> Result<Self, MlError> {
        if !paths.model.exists() {
            return Err(MlError::ModelNotFound(paths.model));
        }

        let metadata = std::fs::read_to_string(&paths.metadata)
            .map_err(|e| MlError::Metadata(format!("{:?}: {}", paths.metadata, e)))?;
        let metadata: ModelMetadata = serde_json::from_str(&metadata)
            .map_err(|e| MlError::Metadata(format!("{:?}: {}", paths.metadata, e)))?;

        if metadata.labels.is_empty() {
            return Err(MlError::Metadata("empty label list".to_string()));
        }

        let session = ort::session::Session::builder()?
            .with_intra_threads(1)?
            .commit_from_file(&paths.model)?;

        log::info!(
            "Loaded gesture classifier from {:?} ({} labels)",
            paths.model,
            metadata.labels.len()
        );

        Ok(Self {
            session,
            labels: metadata.labels,
        })
    }

    /// Classify a flat landmark feature vector
    ///
    /// Returns one entry per label, sorted by descending confidence.
    pub fn classify(&mut self, features: &[f32; FEATURE_LEN]) -> Result<Vec<Classification>, MlError> {
        let input_array = Array2::from_shape_vec((1, FEATURE_LEN), features.to_vec())
            .map_err(|e| MlError::BadOutput(format!("input shape: {}", e)))?;
        let input_tensor = ort::value::Tensor::from_array(input_array)?;

        let outputs = self.session.run(ort::inputs![input_tensor])?;
        let output = outputs
            .iter()
            .next()
            .ok_or_else(|| MlError::BadOutput("no output from classifier".to_string()))?;

        let (_shape, scores) = output.1.try_extract_tensor::<f32>()?;

        if scores.len() < self.labels.len() {
            return Err(MlError::BadOutput(format!(
                "expected {} scores, got {}",
                self.labels.len(),
                scores.len()
            )));
        }

        Ok(rank_labels(&self.labels, scores))
    }
}

/// Pair labels with scores and sort by descending confidence
pub(crate) fn rank_labels(labels: &[String], scores: &[f32]) -> Vec<Classification> {
    let mut ranked: Vec<Classification> = labels
        .iter()
        .zip(scores)
        .map(|(label, &score)| Classification {
            label: label.clone(),
            confidence: score.clamp(0.0, 1.0),
        })
        .collect();

    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        ["down", "like", "up"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_rank_labels_highest_first() {
        let ranked = rank_labels(&labels(), &[0.1, 0.7, 0.2]);

        assert_eq!(ranked[0].label, "like");
        assert!((ranked[0].confidence - 0.7).abs() < 1e-6);
        assert_eq!(ranked[1].label, "up");
        assert_eq!(ranked[2].label, "down");
    }

    #[test]
    fn test_rank_labels_clamps_confidence() {
        let ranked = rank_labels(&labels(), &[1.3, -0.2, 0.5]);

        assert_eq!(ranked[0].label, "down");
        assert_eq!(ranked[0].confidence, 1.0);
        assert_eq!(ranked[2].confidence, 0.0);
    }

    #[test]
    fn test_metadata_parses() {
        let meta: ModelMetadata =
            serde_json::from_str(r#"{ "labels": ["up", "down", "like"] }"#).unwrap();
        assert_eq!(meta.labels.len(), 3);
    }
}
