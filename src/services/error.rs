use thirtyfour::error::WebDriverError;
use thiserror::Error;

use crate::dal::artifact_store::PersistenceError;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Malformed input. Rejected before any side effect.
    #[error("invalid job url {url:?}: {reason}")]
    Validation { url: String, reason: String },

    /// The rendering engine session could not be started.
    #[error("failed to launch rendering session at {webdriver_url}: {source}")]
    Launch {
        webdriver_url: String,
        #[source]
        source: WebDriverError,
    },

    /// Both wait tiers were exhausted, or the session died mid-render. The
    /// debug artifact is still on disk.
    #[error("navigation to {url} failed after both wait tiers")]
    Navigation {
        url: String,
        #[source]
        source: Option<WebDriverError>,
    },

    /// Only fatal when it is the structured record itself; other artifact
    /// write failures are logged and absorbed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
