use std::net::TcpListener;

use anyhow::Context;
use env_logger::Env;
use holocron::{
    configuration::get_configuration,
    dal::artifact_store::ArtifactStore,
    services::{ContentExtractor, PageRenderer, ScrapeCoordinator},
    startup::run,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().context("Failed to read configuration")?;

    let store = ArtifactStore::new(configuration.cache.root.clone());
    store
        .ensure_root()
        .context("Failed to create the cache root")?;

    let renderer = PageRenderer::new(configuration.renderer.clone());
    let extractor = ContentExtractor::new(&configuration.extractor);
    let coordinator = ScrapeCoordinator::new(renderer, extractor, store.clone());

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener =
        TcpListener::bind(&address).with_context(|| format!("Failed to bind {}", address))?;
    log::info!("Snapshot service listening on {}", address);

    run(listener, coordinator, store, configuration.cache.root)?.await?;
    Ok(())
}
