//! # Pipeline Error Types Module
//!
//! This module defines the error types produced by each stage of the image
//! identification pipeline (fetch, decode, preprocess, infer). The dispatcher
//! turns the first failure into its associated user-facing reply.

use crate::templates::Template;

/// Custom error types for image pipeline stages
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Network-level failure while downloading the media
    Download(String),
    /// Media endpoint answered with a non-success status
    HttpStatus(u16),
    /// Media endpoint served something that is not an image (carries the content type)
    NotAnImage(String),
    /// Payload exceeds the configured size limit (carries the observed size)
    TooLarge(u64),
    /// Magic bytes do not match any known image format
    UnrecognizedFormat,
    /// Format was recognized but the payload could not be decoded
    Decode(String),
    /// Classifier invocation failed
    Inference(String),
}

impl PipelineError {
    /// The reply sent to the user when this error ends the pipeline
    pub fn template(&self) -> Template {
        match self {
            PipelineError::Download(msg) => Template::DownloadFailed(msg.clone()),
            PipelineError::HttpStatus(status) => Template::DownloadStatus(*status),
            PipelineError::NotAnImage(_) => Template::NotAnImage,
            PipelineError::TooLarge(_) => Template::MediaTooLarge,
            PipelineError::UnrecognizedFormat => Template::FormatNotRecognized,
            PipelineError::Decode(_) => Template::FormatNotSupported,
            PipelineError::Inference(_) => Template::ProcessingError,
        }
    }

    /// Whether the failure points at the service rather than at the user's input
    pub fn is_internal(&self) -> bool {
        matches!(self, PipelineError::Inference(_))
    }
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Download(msg) => write!(f, "Download error: {msg}"),
            PipelineError::HttpStatus(status) => write!(f, "Media endpoint returned HTTP {status}"),
            PipelineError::NotAnImage(content_type) => {
                write!(f, "Content type is not an image: {content_type}")
            }
            PipelineError::TooLarge(size) => write!(f, "Media payload too large: {size} bytes"),
            PipelineError::UnrecognizedFormat => write!(f, "Image format not recognized"),
            PipelineError::Decode(msg) => write!(f, "Image decode error: {msg}"),
            PipelineError::Inference(msg) => write!(f, "Inference error: {msg}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::Download(err.to_string())
    }
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(err: tokio::task::JoinError) -> Self {
        PipelineError::Inference(format!("inference task did not complete: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_formatting() {
        assert_eq!(
            PipelineError::HttpStatus(404).to_string(),
            "Media endpoint returned HTTP 404"
        );
        assert_eq!(
            PipelineError::Decode("bad huffman table".into()).to_string(),
            "Image decode error: bad huffman table"
        );
    }

    #[test]
    fn test_only_inference_is_internal() {
        assert!(PipelineError::Inference("boom".into()).is_internal());
        assert!(!PipelineError::HttpStatus(500).is_internal());
        assert!(!PipelineError::UnrecognizedFormat.is_internal());
    }
}
