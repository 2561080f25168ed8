use std::net::TcpListener;
use std::path::PathBuf;

use actix_files::Files;
use actix_web::{
    dev::Server,
    middleware::Logger,
    web, App, HttpServer,
};

use crate::{
    dal::artifact_store::ArtifactStore,
    routes::{default_route, snapshot_route},
    services::scrape_coordinator::ScrapeCoordinator,
};

pub fn run(
    listener: TcpListener,
    coordinator: ScrapeCoordinator,
    store: ArtifactStore,
    cache_root: PathBuf,
) -> Result<Server, std::io::Error> {
    let coordinator = web::Data::new(coordinator);
    let store = web::Data::new(store);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(Files::new("/cache", cache_root.clone()).prefer_utf8(true))
            .service(default_route::default)
            .service(
                web::scope("/snapshot")
                    .service(snapshot_route::scrape_job)
                    .service(snapshot_route::snapshot_status)
                    .service(snapshot_route::snapshot_data)
                    .service(snapshot_route::snapshot_text)
                    .service(snapshot_route::snapshot_html)
                    .service(snapshot_route::snapshot_screenshot),
            )
            .app_data(coordinator.clone())
            .app_data(store.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
