use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The structured record persisted as data.json. Its presence on disk is the
/// external signal that a scrape completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRecord {
    pub job_id: String,
    pub url: String,
    pub title: String,
    pub h1: String,
    pub company: String,
    pub salary: Option<String>,
    pub description: String,
    pub parsed_at: DateTime<Utc>,
    pub files: ArtifactPaths,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub html: PathBuf,
    pub screenshot: PathBuf,
    pub text: PathBuf,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{ArtifactPaths, SnapshotRecord};

    #[test]
    fn record_serializes_with_camel_case_keys() {
        let record = SnapshotRecord {
            job_id: "j-1".to_string(),
            url: "https://example.com/job/1".to_string(),
            title: "Pilot".to_string(),
            h1: "Pilot".to_string(),
            company: "Acme".to_string(),
            salary: None,
            description: "Fly things.".to_string(),
            parsed_at: Utc::now(),
            files: ArtifactPaths {
                html: "cache/j-1/page.html".into(),
                screenshot: "cache/j-1/screenshot.png".into(),
                text: "cache/j-1/content.txt".into(),
            },
        };

        let json = serde_json::to_value(&record).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(|k| k.as_str()).collect();

        assert!(keys.contains(&"jobId"));
        assert!(keys.contains(&"parsedAt"));
        assert!(keys.contains(&"files"));
        assert!(json["salary"].is_null());
        assert_eq!(json["files"]["html"], "cache/j-1/page.html");
    }

    #[test]
    fn record_round_trips_through_json() {
        let record = SnapshotRecord {
            job_id: "j-2".to_string(),
            url: "https://example.com/job/2".to_string(),
            title: "Engineer".to_string(),
            h1: String::new(),
            company: String::new(),
            salary: Some("$50,000 - $70,000".to_string()),
            description: "Build things.".to_string(),
            parsed_at: Utc::now(),
            files: ArtifactPaths {
                html: "cache/j-2/page.html".into(),
                screenshot: "cache/j-2/screenshot.png".into(),
                text: "cache/j-2/content.txt".into(),
            },
        };

        let bytes = serde_json::to_vec_pretty(&record).unwrap();
        let parsed: SnapshotRecord = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(parsed.job_id, record.job_id);
        assert_eq!(parsed.salary, record.salary);
        assert_eq!(parsed.parsed_at, record.parsed_at);
    }
}
