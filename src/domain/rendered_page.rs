use chrono::{DateTime, Utc};

/// Product of one rendering session. Lives only for the duration of the
/// coordinator call that requested it; persisted pieces go through the
/// artifact store, never this value.
#[derive(Debug)]
pub struct RenderedPage {
    pub html: String,
    pub screenshot: Option<Vec<u8>>,
    pub captured_at: DateTime<Utc>,
}
