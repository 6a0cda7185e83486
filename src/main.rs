// genmedia-clients - shared Google generative AI client handles
// Author: kelexine (https://github.com/kelexine)

use anyhow::Result;
use clap::Parser;
use genmedia_clients::cache::{ClientRequest, ModelClientCache};
use genmedia_clients::cli::Args;
use genmedia_clients::config::AppConfig;
use genmedia_clients::genai::GenAiClientFactory;
use genmedia_clients::metrics::gather_metrics;
use genmedia_clients::utils::logging;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Phase 1: Load configuration
    let mut config = AppConfig::load(args.config.as_deref())?;
    if args.public {
        config.defaults.use_vertexai = false;
    }

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting genmedia-clients v{}", env!("CARGO_PKG_VERSION"));

    // Phase 3: Build the shared client cache
    let factory = GenAiClientFactory::from_config(&config);
    let cache = ModelClientCache::new(factory, config.defaults.clone());

    // Phase 4: Acquire a client for the requested coordinates
    let request = ClientRequest {
        project_id: args.project,
        location: args.location,
        model_id: args.model,
    };
    let (client, model_id) = cache.acquire(&request).await?;
    info!(
        "Client ready: backend={} model={} url={}",
        client.backend().as_str(),
        model_id,
        client.model_url(&model_id)
    );

    // Phase 5: Optional connectivity check
    if args.check {
        let latency = client.check_model(&model_id).await?;
        info!("Model {} reachable in {:?}", model_id, latency);
    }

    if args.metrics {
        print!("{}", gather_metrics());
    }

    Ok(())
}
