//! HTTP handlers

use super::protocol::{pretty_json, ClassificationResponse, ClassifyRequest, NotFound};
use crate::error::PipelineError;
use crate::pipeline::ClassificationPipeline;
use actix_web::{post, web, HttpRequest, HttpResponse};
use std::time::Instant;
use tracing::*;

/// Classify the base64 image in the JSON body. Any failure, including a body
/// that is not JSON or is over the size limit, produces the uniform failure
/// reply.
#[post("/classify")]
pub async fn classify(
    body: Result<web::Bytes, actix_web::Error>,
    state: web::Data<ClassificationPipeline>,
) -> ClassificationResponse {
    let start = Instant::now();
    let body = body.map_err(|err| PipelineError::BodyRejected(err.to_string()));
    if let Ok(body) = &body {
        info!("got classification request ({} bytes)", body.len());
    }

    // The pipeline blocks on the model; keep it off the async workers
    let pipeline = state.into_inner();
    let result = web::block(move || {
        let request = ClassifyRequest::parse(&body?)?;
        pipeline.classify(request.image.as_deref())
    })
    .await
    .unwrap_or_else(|_| Err(PipelineError::Aborted));

    let response = ClassificationResponse::build(result);
    if let ClassificationResponse::Failure { reason } = &response {
        error!("classification failed: {reason}");
    }
    info!(
        "end-to-end time: {:.3} ms, response: {:?}",
        start.elapsed().as_secs_f64() * 1000.0,
        response.body()
    );
    response
}

/// Fallback for every unmatched method and path
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    let body = NotFound::new(req.method(), req.path());
    warn!("{}", body.message);
    pretty_json(HttpResponse::NotFound(), &body)
}
