//! # Plant Classifier Module
//!
//! Single-shot image classification. The dispatcher only sees the
//! [`ImageClassifier`] trait; [`OnnxClassifier`] runs an exported model through
//! ONNX Runtime. The session is loaded once at startup and only read afterwards,
//! so one instance is shared by all concurrently handled events.

use anyhow::{Context, Result};
use ndarray::Array4;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Once;
use tracing::{error, info};

use crate::errors::PipelineError;

static INIT: Once = Once::new();

/// Top-scoring class and its score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub class_index: usize,
    /// Score of the top class, in [0,1]
    pub confidence: f32,
}

/// An image classifier over NHWC `[1, size, size, 3]` tensors
pub trait ImageClassifier: Send + Sync {
    fn classify(&self, input: Array4<f32>) -> Result<Prediction, PipelineError>;
}

/// Index and value of the highest score, first one on ties
pub fn argmax(scores: &[f32]) -> Option<Prediction> {
    scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, score)| !score.is_nan())
        .fold(None, |best: Option<Prediction>, (class_index, score)| match best {
            Some(current) if current.confidence >= score => Some(current),
            _ => Some(Prediction {
                class_index,
                confidence: score,
            }),
        })
}

/// Classifier backed by an ONNX Runtime session
#[derive(Debug)]
pub struct OnnxClassifier {
    session: Session,
    input_name: String,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<OnnxClassifier>();
    }
};

fn ensure_runtime_initialized() {
    INIT.call_once(|| {
        if let Err(e) = ort::init().with_name("doctor-roots").commit() {
            error!(error = %e, "Failed to initialize ONNX Runtime environment");
        }
    });
}

impl OnnxClassifier {
    /// Load the model artifact from disk
    pub fn load(model_path: &Path) -> Result<Self> {
        ensure_runtime_initialized();

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .commit_from_file(model_path)
            .with_context(|| format!("Failed to load model from {}", model_path.display()))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .context("Model declares no inputs")?;

        info!(
            model = %model_path.display(),
            input = %input_name,
            outputs = session.outputs.len(),
            "Classifier model loaded"
        );

        Ok(Self {
            session,
            input_name,
        })
    }
}

impl ImageClassifier for OnnxClassifier {
    fn classify(&self, input: Array4<f32>) -> Result<Prediction, PipelineError> {
        let input_dyn = input.into_dyn();
        let input_view = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            self.input_name.as_str(),
            Tensor::from_array(&input_view).map_err(|e| {
                PipelineError::Inference(format!("Failed to create input tensor: {e}"))
            })?,
        );

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| PipelineError::Inference(format!("Failed to run model: {e}")))?;
        let scores = outputs[0].try_extract_tensor::<f32>().map_err(|e| {
            PipelineError::Inference(format!("Failed to extract output tensor: {e}"))
        })?;
        let scores: Vec<f32> = scores.iter().copied().collect();

        argmax(&scores)
            .ok_or_else(|| PipelineError::Inference("Model produced no scores".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_picks_highest() {
        let prediction = argmax(&[0.1, 0.7, 0.2]).unwrap();
        assert_eq!(prediction.class_index, 1);
        assert_eq!(prediction.confidence, 0.7);
    }

    #[test]
    fn test_argmax_first_on_tie() {
        assert_eq!(argmax(&[0.5, 0.5]).unwrap().class_index, 0);
    }

    #[test]
    fn test_argmax_skips_nan_and_empty() {
        assert_eq!(argmax(&[f32::NAN, 0.3]).unwrap().class_index, 1);
        assert!(argmax(&[]).is_none());
        assert!(argmax(&[f32::NAN]).is_none());
    }
}
