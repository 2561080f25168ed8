use chrono::Utc;
use url::Url;

use crate::dal::artifact_store::{
    ArtifactStore, HTML_ARTIFACT, SCREENSHOT_ARTIFACT, TEXT_ARTIFACT,
};
use crate::domain::rendered_page::RenderedPage;
use crate::domain::scrape_request::{DebugInfo, ScrapeRequest};
use crate::domain::snapshot_record::{ArtifactPaths, SnapshotRecord};
use crate::services::content_extractor::ContentExtractor;
use crate::services::error::ScrapeError;
use crate::services::page_renderer::PageRenderer;

const ACCEPTED_SCHEMES: [&str; 2] = ["http", "https"];

/// One end-to-end scrape: validate, render, extract, persist, report.
/// Callers must not issue concurrent scrapes for the same job id; distinct
/// ids are fully independent.
pub struct ScrapeCoordinator {
    renderer: PageRenderer,
    extractor: ContentExtractor,
    store: ArtifactStore,
}

impl ScrapeCoordinator {
    pub fn new(renderer: PageRenderer, extractor: ContentExtractor, store: ArtifactStore) -> Self {
        ScrapeCoordinator {
            renderer,
            extractor,
            store,
        }
    }

    pub async fn scrape(&self, request: ScrapeRequest) -> Result<SnapshotRecord, ScrapeError> {
        // Reject bad input before any side effect: no directory, no browser.
        validate_job_url(&request.url)?;

        let job_dir = self.store.ensure_directory(&request.job_id)?;

        let debug = DebugInfo {
            job_id: request.job_id.clone(),
            url: request.url.clone(),
            parsed_at: Utc::now(),
            job_data: request.fallback.clone(),
        };
        if let Err(e) = self.store.write_debug(&request.job_id, &debug) {
            log::warn!("Debug artifact write failed for job {}: {}", request.job_id, e);
        }

        log::info!("Rendering job {}: {}", request.job_id, request.url);
        let page = self.renderer.render(&request.url).await?;
        log::info!(
            "Rendered job {} at {} ({} bytes of html, screenshot: {})",
            request.job_id,
            page.captured_at.to_rfc3339(),
            page.html.len(),
            page.screenshot.is_some()
        );

        let content = self
            .extractor
            .extract(&page.html, request.fallback.as_ref());

        let record = SnapshotRecord {
            job_id: request.job_id.clone(),
            url: request.url.clone(),
            title: content.title,
            h1: content.h1,
            company: content.company,
            salary: content.salary,
            description: content.description,
            parsed_at: Utc::now(),
            files: ArtifactPaths {
                html: job_dir.join(HTML_ARTIFACT),
                screenshot: job_dir.join(SCREENSHOT_ARTIFACT),
                text: job_dir.join(TEXT_ARTIFACT),
            },
        };

        self.persist_artifacts(&request.job_id, &page, &record)?;

        log::info!("Snapshot complete for job {}", request.job_id);
        Ok(record)
    }

    /// Each artifact is written independently; only the structured record is
    /// load-bearing for the overall outcome.
    fn persist_artifacts(
        &self,
        job_id: &str,
        page: &RenderedPage,
        record: &SnapshotRecord,
    ) -> Result<(), ScrapeError> {
        if let Err(e) = self.store.write_html(job_id, &page.html) {
            log::error!("Persist step {} failed for job {}: {}", HTML_ARTIFACT, job_id, e);
        }

        match &page.screenshot {
            Some(png) => {
                if let Err(e) = self.store.write_screenshot(job_id, png) {
                    log::error!(
                        "Persist step {} failed for job {}: {}",
                        SCREENSHOT_ARTIFACT,
                        job_id,
                        e
                    );
                }
            }
            None => {
                // Wholesale replacement: a stale image from the previous
                // generation must not survive into this one.
                if let Err(e) = self.store.discard_screenshot(job_id) {
                    log::error!(
                        "Persist step {} failed for job {}: {}",
                        SCREENSHOT_ARTIFACT,
                        job_id,
                        e
                    );
                }
            }
        }

        if let Err(e) = self.store.write_text(job_id, &record.description) {
            log::error!("Persist step {} failed for job {}: {}", TEXT_ARTIFACT, job_id, e);
        }

        self.store.write_json(job_id, record)?;
        Ok(())
    }
}

pub fn validate_job_url(raw: &str) -> Result<(), ScrapeError> {
    match Url::parse(raw) {
        Ok(parsed) if !ACCEPTED_SCHEMES.contains(&parsed.scheme()) => {
            Err(ScrapeError::Validation {
                url: raw.to_string(),
                reason: format!("unsupported scheme {:?}", parsed.scheme()),
            })
        }
        Ok(parsed) if parsed.host_str().map_or(true, str::is_empty) => {
            Err(ScrapeError::Validation {
                url: raw.to_string(),
                reason: "missing host".to_string(),
            })
        }
        Ok(_) => Ok(()),
        Err(e) => Err(ScrapeError::Validation {
            url: raw.to_string(),
            reason: e.to_string(),
        }),
    }
}
