use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::scrape_request::DebugInfo;
use crate::domain::snapshot_record::SnapshotRecord;

pub const HTML_ARTIFACT: &str = "page.html";
pub const SCREENSHOT_ARTIFACT: &str = "screenshot.png";
pub const TEXT_ARTIFACT: &str = "content.txt";
pub const DATA_ARTIFACT: &str = "data.json";
pub const DEBUG_ARTIFACT: &str = "debug_info.json";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("failed to write {artifact} for job {job_id}: {source}")]
    Write {
        artifact: &'static str,
        job_id: String,
        source: io::Error,
    },
    #[error("failed to encode {artifact} for job {job_id}: {source}")]
    Encode {
        artifact: &'static str,
        job_id: String,
        source: serde_json::Error,
    },
}

/// Filesystem-backed store for the per-job artifact set. Every path is
/// derived from the cache root and the sanitized job id, so writes always
/// land on the same file and fully overwrite the previous generation.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    cache_root: PathBuf,
}

impl ArtifactStore {
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        ArtifactStore {
            cache_root: cache_root.into(),
        }
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn ensure_root(&self) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(&self.cache_root).map_err(|source| {
            PersistenceError::CreateDir {
                path: self.cache_root.clone(),
                source,
            }
        })
    }

    pub fn job_dir(&self, job_id: &str) -> PathBuf {
        self.cache_root.join(sanitize_job_id(job_id))
    }

    pub fn ensure_directory(&self, job_id: &str) -> Result<PathBuf, PersistenceError> {
        let dir = self.job_dir(job_id);
        std::fs::create_dir_all(&dir).map_err(|source| PersistenceError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }

    pub fn write_html(&self, job_id: &str, html: &str) -> Result<PathBuf, PersistenceError> {
        self.write_artifact(job_id, HTML_ARTIFACT, html.as_bytes())
    }

    pub fn write_screenshot(&self, job_id: &str, png: &[u8]) -> Result<PathBuf, PersistenceError> {
        self.write_artifact(job_id, SCREENSHOT_ARTIFACT, png)
    }

    pub fn write_text(&self, job_id: &str, text: &str) -> Result<PathBuf, PersistenceError> {
        self.write_artifact(job_id, TEXT_ARTIFACT, text.as_bytes())
    }

    pub fn write_json(
        &self,
        job_id: &str,
        record: &SnapshotRecord,
    ) -> Result<PathBuf, PersistenceError> {
        let bytes = serde_json::to_vec_pretty(record).map_err(|source| {
            PersistenceError::Encode {
                artifact: DATA_ARTIFACT,
                job_id: job_id.to_string(),
                source,
            }
        })?;
        self.write_artifact(job_id, DATA_ARTIFACT, &bytes)
    }

    pub fn write_debug(&self, job_id: &str, debug: &DebugInfo) -> Result<PathBuf, PersistenceError> {
        let bytes = serde_json::to_vec_pretty(debug).map_err(|source| {
            PersistenceError::Encode {
                artifact: DEBUG_ARTIFACT,
                job_id: job_id.to_string(),
                source,
            }
        })?;
        self.write_artifact(job_id, DEBUG_ARTIFACT, &bytes)
    }

    /// Drops a previous generation's screenshot so a re-scrape that captured
    /// none does not leave its record pointing at a stale image.
    pub fn discard_screenshot(&self, job_id: &str) -> Result<(), PersistenceError> {
        let path = self.job_dir(job_id).join(SCREENSHOT_ARTIFACT);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PersistenceError::Write {
                artifact: SCREENSHOT_ARTIFACT,
                job_id: job_id.to_string(),
                source,
            }),
        }
    }

    pub fn read_json(&self, job_id: &str) -> Option<SnapshotRecord> {
        let path = self.job_dir(job_id).join(DATA_ARTIFACT);
        let bytes = read_optional(&path)?;
        match serde_json::from_slice(&bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                log::error!("Unreadable {} for job {}: {:?}", DATA_ARTIFACT, job_id, e);
                None
            }
        }
    }

    pub fn read_html(&self, job_id: &str) -> Option<String> {
        let bytes = read_optional(&self.job_dir(job_id).join(HTML_ARTIFACT))?;
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn read_text(&self, job_id: &str) -> Option<String> {
        let bytes = read_optional(&self.job_dir(job_id).join(TEXT_ARTIFACT))?;
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn screenshot_path(&self, job_id: &str) -> Option<PathBuf> {
        let path = self.job_dir(job_id).join(SCREENSHOT_ARTIFACT);
        path.exists().then_some(path)
    }

    /// True iff the structured record is present: the sole external signal
    /// that a scrape completed.
    pub fn exists(&self, job_id: &str) -> bool {
        self.job_dir(job_id).join(DATA_ARTIFACT).exists()
    }

    fn write_artifact(
        &self,
        job_id: &str,
        artifact: &'static str,
        bytes: &[u8],
    ) -> Result<PathBuf, PersistenceError> {
        let path = self.job_dir(job_id).join(artifact);
        std::fs::write(&path, bytes).map_err(|source| PersistenceError::Write {
            artifact,
            job_id: job_id.to_string(),
            source,
        })?;
        Ok(path)
    }
}

// Job ids name directories, so anything outside [A-Za-z0-9_-] becomes '_'.
fn sanitize_job_id(job_id: &str) -> String {
    job_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn read_optional(path: &Path) -> Option<Vec<u8>> {
    match std::fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            log::error!("Failed reading {}: {:?}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::domain::snapshot_record::{ArtifactPaths, SnapshotRecord};

    use super::{sanitize_job_id, ArtifactStore, DATA_ARTIFACT};

    fn record(job_id: &str, title: &str, store: &ArtifactStore) -> SnapshotRecord {
        let dir = store.job_dir(job_id);
        SnapshotRecord {
            job_id: job_id.to_string(),
            url: format!("https://example.com/{}", job_id),
            title: title.to_string(),
            h1: String::new(),
            company: String::new(),
            salary: None,
            description: "desc".to_string(),
            parsed_at: Utc::now(),
            files: ArtifactPaths {
                html: dir.join("page.html"),
                screenshot: dir.join("screenshot.png"),
                text: dir.join("content.txt"),
            },
        }
    }

    #[test]
    fn ensure_directory_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());

        let first = store.ensure_directory("job-1").unwrap();
        let second = store.ensure_directory("job-1").unwrap();

        assert_eq!(first, second);
        assert!(first.is_dir());
    }

    #[test]
    fn exists_requires_the_structured_record() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        store.ensure_directory("job-1").unwrap();

        store.write_html("job-1", "<html></html>").unwrap();
        store.write_text("job-1", "text").unwrap();
        assert!(!store.exists("job-1"));

        store
            .write_json("job-1", &record("job-1", "Pilot", &store))
            .unwrap();
        assert!(store.exists("job-1"));
    }

    #[test]
    fn reads_report_not_found_instead_of_raising() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());

        assert!(store.read_json("never-scraped").is_none());
        assert!(store.read_html("never-scraped").is_none());
        assert!(store.read_text("never-scraped").is_none());
        assert!(store.screenshot_path("never-scraped").is_none());
        assert!(!store.exists("never-scraped"));
    }

    #[test]
    fn writes_fully_overwrite_the_previous_generation() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        store.ensure_directory("job-1").unwrap();

        store
            .write_json("job-1", &record("job-1", "First title", &store))
            .unwrap();
        store
            .write_json("job-1", &record("job-1", "Second", &store))
            .unwrap();

        let read = store.read_json("job-1").unwrap();
        assert_eq!(read.title, "Second");
        let raw = std::fs::read_to_string(store.job_dir("job-1").join(DATA_ARTIFACT)).unwrap();
        assert!(!raw.contains("First title"));
    }

    #[test]
    fn screenshot_is_independent_of_the_other_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        store.ensure_directory("job-1").unwrap();

        store
            .write_json("job-1", &record("job-1", "Pilot", &store))
            .unwrap();
        assert!(store.exists("job-1"));
        assert!(store.screenshot_path("job-1").is_none());

        store.write_screenshot("job-1", b"\x89PNG").unwrap();
        assert!(store.screenshot_path("job-1").is_some());

        store.discard_screenshot("job-1").unwrap();
        assert!(store.screenshot_path("job-1").is_none());
        // Discarding twice is fine.
        store.discard_screenshot("job-1").unwrap();
        assert!(store.exists("job-1"));
    }

    #[test]
    fn traversal_shaped_ids_stay_under_the_cache_root() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());

        let dir = store.ensure_directory("../../etc/passwd").unwrap();
        assert!(dir.starts_with(tmp.path()));
        assert_eq!(sanitize_job_id("../../etc/passwd"), "______etc_passwd");
        assert_eq!(sanitize_job_id("550e8400-e29b-41d4"), "550e8400-e29b-41d4");
    }

    #[test]
    fn concurrent_writes_to_distinct_ids_do_not_interfere() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    let job_id = format!("job-{}", i);
                    store.ensure_directory(&job_id).unwrap();
                    let title = format!("title-{}", i);
                    store
                        .write_json(&job_id, &record(&job_id, &title, &store))
                        .unwrap();
                    store.write_text(&job_id, &title).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for i in 0..4 {
            let job_id = format!("job-{}", i);
            assert_eq!(store.read_json(&job_id).unwrap().title, format!("title-{}", i));
            assert_eq!(store.read_text(&job_id).unwrap(), format!("title-{}", i));
        }
    }
}
