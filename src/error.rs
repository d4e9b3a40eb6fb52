//! Error kinds of the classification pipeline. Every stage returns one of
//! these; only the HTTP layer turns them into a response.

use thiserror::Error;

/// Failure to turn a request payload into an RGB image
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("image payload is empty")]
    EmptyInput,

    #[error("image payload is not valid base64: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    #[error("payload is not a decodable image: {0}")]
    InvalidImage(#[from] image::ImageError),
}

/// Failure inside the inference engine or in the shape of its output
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference engine failed: {0:#}")]
    EngineFailure(anyhow::Error),
}

/// Any failure that ends a classification request
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("malformed request body: {0}")]
    MalformedRequest(#[from] serde_json::Error),

    /// The HTTP layer could not read the body, e.g. it exceeds the size limit
    #[error("request body rejected: {0}")]
    BodyRejected(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// The blocking task running the pipeline panicked or was dropped
    #[error("classification task aborted")]
    Aborted,
}
