//! JSON shapes exchanged over HTTP and the mapping from pipeline results to
//! responses

use crate::error::PipelineError;
use crate::torch::Prediction;
use actix_web::body::BoxBody;
use actix_web::http::header::ContentType;
use actix_web::http::{Method, StatusCode};
use actix_web::{HttpRequest, HttpResponse, HttpResponseBuilder, Responder};
use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

/// Header set on every `/classify` reply, success or failure
pub const REPLY_HEADER: (&str, &str) = ("x-asyik-reply", "ok");

/// Body of a `/classify` request
#[derive(Debug, Default, Deserialize)]
pub struct ClassifyRequest {
    /// Base64 image, optionally prefixed with a data URI header
    pub image: Option<String>,
}

impl ClassifyRequest {
    /// Parse a raw request body. An empty body is a request without an image;
    /// any other body must be a JSON object.
    pub fn parse(body: &[u8]) -> Result<Self, PipelineError> {
        if body.is_empty() {
            return Ok(ClassifyRequest::default());
        }
        match serde_json::from_slice::<Value>(body)? {
            object @ Value::Object(_) => Ok(serde_json::from_value(object)?),
            _ => Err(serde_json::Error::custom("request body is not a JSON object").into()),
        }
    }
}

/// Outcome of one classification request
#[derive(Debug)]
pub enum ClassificationResponse {
    Success { label: String, score: f64 },
    /// The reason is only logged, it never reaches the client
    Failure { reason: String },
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ResultBody {
    pub predicted: Option<String>,
    /// Percentage confidence
    pub score: Option<f64>,
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Envelope {
    pub result: ResultBody,
}

impl ClassificationResponse {
    pub fn build(result: Result<Prediction, PipelineError>) -> Self {
        match result {
            Ok(Prediction { label, score }) => ClassificationResponse::Success { label, score },
            Err(err) => ClassificationResponse::Failure {
                reason: err.to_string(),
            },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ClassificationResponse::Success { .. } => StatusCode::OK,
            ClassificationResponse::Failure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> Envelope {
        let result = match self {
            ClassificationResponse::Success { label, score } => ResultBody {
                predicted: Some(label.clone()),
                score: Some(*score),
                status: "ok",
                message: "success",
            },
            ClassificationResponse::Failure { .. } => ResultBody {
                predicted: None,
                score: None,
                status: "failed",
                message: "failed",
            },
        };
        Envelope { result }
    }
}

impl Responder for ClassificationResponse {
    type Body = BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        let mut builder = HttpResponse::build(self.status_code());
        builder.insert_header(REPLY_HEADER);
        pretty_json(builder, &self.body())
    }
}

/// Finish `builder` with `body` as pretty-printed JSON
pub fn pretty_json<T: Serialize>(mut builder: HttpResponseBuilder, body: &T) -> HttpResponse {
    builder.insert_header(ContentType::json());
    match serde_json::to_string_pretty(body) {
        Ok(json) => builder.body(json),
        Err(err) => {
            error!("failed to serialize response: {err}");
            builder.finish()
        }
    }
}

/// Body of the 404 reply for unknown routes
#[derive(Debug, Serialize, PartialEq)]
pub struct NotFound {
    pub title: &'static str,
    pub message: String,
}

impl NotFound {
    pub fn new(method: &Method, path: &str) -> Self {
        NotFound {
            title: "not_found_exception",
            message: format!("No route found for {method} {path}"),
        }
    }
}
