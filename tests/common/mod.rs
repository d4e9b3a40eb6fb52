use anyhow::Result;
use base64::{engine::general_purpose, Engine as _};
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use std::io::Cursor;
use tch::Tensor;
use wan_classify::config::LABELS;
use wan_classify::pipeline::ClassificationPipeline;
use wan_classify::torch::{Classifier, Engine};

/// A model that always answers with the same logits
pub struct MockEngine {
    logits: Vec<f32>,
}

impl MockEngine {
    /// Logits strongly favouring class `id`
    pub fn favouring(id: usize) -> Self {
        let mut logits = vec![0.0; LABELS.len()];
        logits[id] = 8.0;
        MockEngine { logits }
    }

    pub fn with_logits(logits: Vec<f32>) -> Self {
        MockEngine { logits }
    }
}

impl Engine for MockEngine {
    fn forward(&self, _input: &Tensor) -> Result<Tensor> {
        Ok(Tensor::from_slice(&self.logits).unsqueeze(0))
    }
}

pub fn pipeline(engine: MockEngine) -> ClassificationPipeline {
    ClassificationPipeline::new(Classifier::new(engine, &LABELS))
}

/// A solid-colored image encoded in `format` and then base64
pub fn encoded_image(color: [u8; 3], format: ImageOutputFormat) -> String {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb(color)));
    let mut bytes: Vec<u8> = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    general_purpose::STANDARD.encode(bytes)
}
