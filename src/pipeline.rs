//! The per-request classification pipeline: decode, normalize, infer.
//! Every stage runs synchronously on the caller's thread and the first
//! failing stage ends the request.

use crate::config::{INPUT_HEIGHT, INPUT_WIDTH};
use crate::decode;
use crate::error::{DecodeError, PipelineError};
use crate::preprocess;
use crate::torch::{Classifier, Prediction};
use tracing::*;

#[derive(Debug)]
pub struct ClassificationPipeline {
    classifier: Classifier,
    height: u32,
    width: u32,
}

impl ClassificationPipeline {
    pub fn new(classifier: Classifier) -> Self {
        Self::with_input_size(classifier, INPUT_HEIGHT, INPUT_WIDTH)
    }

    /// A pipeline resizing images to `height` x `width` before inference
    pub fn with_input_size(classifier: Classifier, height: u32, width: u32) -> Self {
        ClassificationPipeline {
            classifier,
            height,
            width,
        }
    }

    /// Classify one base64 payload. A missing payload fails the same way an
    /// empty one does and never reaches the model.
    pub fn classify(&self, payload: Option<&str>) -> Result<Prediction, PipelineError> {
        let payload = payload.ok_or(DecodeError::EmptyInput)?;

        let image = decode::decode(payload)?;
        debug!("decoded {}x{} image", image.width(), image.height());

        let input = preprocess::prepare(&image, self.height, self.width);
        let prediction = self.classifier.infer(&input)?;

        info!(
            "predicted {} ({:.2}%)",
            prediction.label, prediction.score
        );
        Ok(prediction)
    }
}
