use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One scrape of one posting. The job id is caller-supplied and unique per
/// target; the route layer mints one when the caller has none.
#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub url: String,
    pub job_id: String,
    pub fallback: Option<FallbackMetadata>,
}

/// What the caller already knows about the posting. Only ever backfills
/// title/company when extraction comes up empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackMetadata {
    pub company: Option<String>,
    pub position: Option<String>,
}

/// Written as debug_info.json before rendering starts, so failed attempts
/// leave forensic evidence.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    pub job_id: String,
    pub url: String,
    pub parsed_at: DateTime<Utc>,
    pub job_data: Option<FallbackMetadata>,
}
