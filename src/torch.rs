//! Code for loading and running the trained TorchScript classifier

use crate::config::TOP_N;
use crate::error::InferenceError;
use anyhow::{anyhow, ensure, Context, Result};
use std::fmt::Debug;
use std::time::Instant;
use tch::{no_grad, Device, Kind, Tensor};
use tracing::*;

/// A model that maps an input tensor to a vector of raw class scores.
/// Implementations hold only read-only state and are shared across requests.
pub trait Engine: Send + Sync {
    fn forward(&self, input: &Tensor) -> Result<Tensor>;
}

/// Load and run a TorchScript file
#[derive(Debug)]
pub struct TorchModel {
    /// The loaded torch model
    model: tch::CModule,
}

impl TorchModel {
    pub fn new(filename: &str) -> Result<Self> {
        let mut model = tch::CModule::load_on_device(filename, Device::Cpu)
            .with_context(|| format!("failed to load TorchScript model {filename:?}"))?;
        model.set_eval();
        Ok(TorchModel { model })
    }
}

impl Engine for TorchModel {
    fn forward(&self, input: &Tensor) -> Result<Tensor> {
        Ok(no_grad(|| self.model.forward_ts(&[input]))?)
    }
}

/// A class prediction outputted by the classifier
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub id: usize,
    pub label: String,
    pub probability: f64,
}

/// The top-1 class of a request and its confidence as a percentage
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub score: f64,
}

impl From<Class> for Prediction {
    fn from(class: Class) -> Self {
        Prediction {
            label: class.label,
            score: class.probability * 100.0,
        }
    }
}

/// Runs an `Engine` and turns its raw output into labelled probabilities
pub struct Classifier {
    engine: Box<dyn Engine>,
    labels: Vec<String>,
}

impl Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Classifier {{ engine: <model>, labels: {:?} }}", self.labels)
    }
}

impl Classifier {
    pub fn new<E, L>(engine: E, labels: &[L]) -> Self
    where
        E: Engine + 'static,
        L: AsRef<str>,
    {
        Classifier {
            engine: Box::new(engine),
            labels: labels.iter().map(|l| l.as_ref().to_string()).collect(),
        }
    }

    pub fn num_classes(&self) -> usize {
        self.labels.len()
    }

    /// Probe the engine once with a zero tensor of `input_shape` and check
    /// that it produces one score per label. Run at startup: a mismatch means
    /// the model and the label table do not belong together.
    pub fn verify(&self, input_shape: &[i64]) -> Result<()> {
        let probe = Tensor::zeros(input_shape, (Kind::Float, Device::Cpu));
        let output = self
            .engine
            .forward(&probe)
            .context("model failed on a probe input")?;
        let classes = output.size().last().copied().unwrap_or(0);
        ensure!(
            classes == self.num_classes() as i64,
            "model outputs {classes} classes but the label table has {}",
            self.num_classes()
        );
        Ok(())
    }

    /// Flatten raw engine output of shape (N) or (1, N) into (N), where N must
    /// equal the number of labels
    fn class_scores(&self, output: Tensor) -> Result<Tensor> {
        let n = self.num_classes() as i64;
        match output.size().as_slice() {
            [c] | [1, c] if *c == n && n > 0 => Ok(output.f_view([-1])?),
            shape => Err(anyhow!(
                "unexpected output shape {shape:?}, expected {n} class scores"
            )),
        }
    }

    /// Run the engine once and rank every class by softmax probability,
    /// highest first
    #[tracing::instrument(skip_all)]
    pub fn rank(&self, input: &Tensor) -> Result<Vec<Class>, InferenceError> {
        let start = Instant::now();
        let output = self.engine.forward(input);
        info!(
            "inference time: {:.3} ms",
            start.elapsed().as_secs_f64() * 1000.0
        );

        let ranked = output
            .and_then(|output| self.class_scores(output))
            .and_then(|scores| {
                let (probs, ids) = scores
                    .f_softmax(-1, Some(Kind::Float))?
                    .f_sort(-1, true)?;
                let probs = Vec::<f32>::try_from(&probs)?;
                let ids = Vec::<i64>::try_from(&ids)?;
                ensure!(
                    probs.iter().all(|p| p.is_finite()),
                    "model produced non-finite scores"
                );
                Ok(probs.into_iter().zip(ids).collect::<Vec<_>>())
            })
            .map_err(InferenceError::EngineFailure)?;

        // The shape check above ties every id to a label
        Ok(ranked
            .into_iter()
            .map(|(probability, id)| Class {
                id: id as usize,
                label: self.labels[id as usize].clone(),
                probability: probability as f64,
            })
            .collect())
    }

    /// Top-1 prediction for a normalized input tensor
    pub fn infer(&self, input: &Tensor) -> Result<Prediction, InferenceError> {
        let ranked = self.rank(input)?;
        debug!("top classes: {:?}", &ranked[..TOP_N.min(ranked.len())]);
        ranked
            .into_iter()
            .next()
            .map(Prediction::from)
            .ok_or_else(|| InferenceError::EngineFailure(anyhow!("model produced no classes")))
    }
}
