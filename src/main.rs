use actix_web::{middleware, web, App, HttpServer};
use anyhow::{Context, Result};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wan_classify::config::{Settings, INPUT_SHAPE, LABELS, RUST_LOG};
use wan_classify::pipeline::ClassificationPipeline;
use wan_classify::server::{self, routes};
use wan_classify::torch::{Classifier, TorchModel};

#[actix_web::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(RUST_LOG));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = Settings::load().context("invalid configuration")?;
    info!("loaded settings: {settings:?}");

    // Load the model once; every request shares it read-only
    let start = Instant::now();
    let model = TorchModel::new(&settings.model_path)?;
    let classifier = Classifier::new(model, &LABELS);
    classifier
        .verify(&INPUT_SHAPE)
        .context("model does not match the label table")?;
    info!(
        "loaded model {} in {:.1} ms",
        settings.model_path,
        start.elapsed().as_secs_f64() * 1000.0
    );

    let pipeline = web::Data::new(ClassificationPipeline::new(classifier));
    let max_payload_bytes = settings.max_payload_bytes;

    info!("listening at {}", settings.bind_address());
    HttpServer::new(move || {
        App::new()
            .app_data(pipeline.clone())
            .wrap(middleware::Logger::default())
            .configure(server::configure(max_payload_bytes))
            .default_service(web::route().to(routes::not_found))
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await?;

    Ok(())
}
