use actix_files::NamedFile;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::dal::artifact_store::ArtifactStore;
use crate::domain::scrape_request::{FallbackMetadata, ScrapeRequest};
use crate::services::error::ScrapeError;
use crate::services::scrape_coordinator::ScrapeCoordinator;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeJobBody {
    url: String,
    job_id: Option<String>,
    company: Option<String>,
    position: Option<String>,
}

#[post("/scrape")]
async fn scrape_job(
    coordinator: web::Data<ScrapeCoordinator>,
    body: web::Json<ScrapeJobBody>,
) -> HttpResponse {
    let body = body.into_inner();
    let job_id = body
        .job_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let fallback = match (body.company, body.position) {
        (None, None) => None,
        (company, position) => Some(FallbackMetadata { company, position }),
    };

    let request = ScrapeRequest {
        url: body.url,
        job_id,
        fallback,
    };

    match coordinator.scrape(request).await {
        Ok(record) => HttpResponse::Ok().json(record),
        Err(e @ ScrapeError::Validation { .. }) => {
            log::error!("Rejected scrape request: {}", e);
            HttpResponse::BadRequest().body(e.to_string())
        }
        Err(e @ (ScrapeError::Launch { .. } | ScrapeError::Navigation { .. })) => {
            log::error!("Scrape failed at the rendering engine: {}", e);
            HttpResponse::BadGateway().body(e.to_string())
        }
        Err(e) => {
            log::error!("Scrape failed persisting artifacts: {}", e);
            HttpResponse::InternalServerError().body(e.to_string())
        }
    }
}

#[get("/{job_id}/status")]
async fn snapshot_status(store: web::Data<ArtifactStore>, path: web::Path<String>) -> HttpResponse {
    let job_id = path.into_inner();
    HttpResponse::Ok().json(serde_json::json!({
        "jobId": job_id,
        "scraped": store.exists(&job_id),
    }))
}

#[get("/{job_id}/data")]
async fn snapshot_data(store: web::Data<ArtifactStore>, path: web::Path<String>) -> HttpResponse {
    let job_id = path.into_inner();
    match store.read_json(&job_id) {
        Some(record) => HttpResponse::Ok().json(record),
        None => HttpResponse::NotFound().body(format!("No snapshot for job {}", job_id)),
    }
}

#[get("/{job_id}/text")]
async fn snapshot_text(store: web::Data<ArtifactStore>, path: web::Path<String>) -> HttpResponse {
    let job_id = path.into_inner();
    match store.read_text(&job_id) {
        Some(text) => HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body(text),
        None => HttpResponse::NotFound().body(format!("No extracted text for job {}", job_id)),
    }
}

#[get("/{job_id}/html")]
async fn snapshot_html(store: web::Data<ArtifactStore>, path: web::Path<String>) -> HttpResponse {
    let job_id = path.into_inner();
    match store.read_html(&job_id) {
        Some(html) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(html),
        None => HttpResponse::NotFound().body(format!("No rendered page for job {}", job_id)),
    }
}

#[get("/{job_id}/screenshot")]
async fn snapshot_screenshot(
    req: HttpRequest,
    store: web::Data<ArtifactStore>,
    path: web::Path<String>,
) -> HttpResponse {
    let job_id = path.into_inner();
    match store.screenshot_path(&job_id) {
        Some(path) => match NamedFile::open_async(&path).await {
            Ok(file) => file.into_response(&req),
            Err(e) => {
                log::error!("Failed serving screenshot for job {}: {:?}", job_id, e);
                HttpResponse::InternalServerError().body("Screenshot unavailable")
            }
        },
        None => HttpResponse::NotFound().body(format!("No screenshot for job {}", job_id)),
    }
}
