use chrono::Utc;
use fake_user_agent::get_chrome_rua;
use thirtyfour::error::WebDriverResult;
use thirtyfour::{ChromeCapabilities, ChromiumLikeCapabilities, DesiredCapabilities, WebDriver};
use tokio::time::Instant;

use crate::configuration::RendererSettings;
use crate::domain::rendered_page::RenderedPage;
use crate::services::error::ScrapeError;

const RESOURCE_COUNT_SCRIPT: &str =
    "return window.performance.getEntriesByType('resource').length;";
const READY_STATE_SCRIPT: &str = "return document.readyState;";
const SCROLL_SCRIPT: &str =
    "window.scrollBy(0, arguments[0]); return document.body ? document.body.scrollHeight : 0;";

/// Which wait tier the page settled at. Many pages never reach network idle
/// (polling, beacons) yet are perfectly usable once the DOM is constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavigationTier {
    NetworkIdle,
    DomReady,
}

/// Drives one headless Chrome session per render call through the WebDriver
/// endpoint. No browser state is shared across scrapes.
pub struct PageRenderer {
    settings: RendererSettings,
}

impl PageRenderer {
    pub fn new(settings: RendererSettings) -> Self {
        PageRenderer { settings }
    }

    pub async fn render(&self, url: &str) -> Result<RenderedPage, ScrapeError> {
        let caps = self.build_capabilities().map_err(|source| ScrapeError::Launch {
            webdriver_url: self.settings.webdriver_url.clone(),
            source,
        })?;

        let driver = WebDriver::new(&self.settings.webdriver_url, caps)
            .await
            .map_err(|source| ScrapeError::Launch {
                webdriver_url: self.settings.webdriver_url.clone(),
                source,
            })?;

        let page = self.drive(&driver, url).await;

        // The session is scoped to this one render; tear it down whether or
        // not the drive succeeded.
        if let Err(e) = driver.quit().await {
            log::warn!("Failed to shut down rendering session for {}: {:?}", url, e);
        }

        page
    }

    fn build_capabilities(&self) -> WebDriverResult<ChromeCapabilities> {
        let mut caps = DesiredCapabilities::chrome();
        caps.add_arg("--headless=new")?;
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--disable-dev-shm-usage")?;
        caps.add_arg("--disable-gpu")?;
        caps.add_arg(&format!(
            "--window-size={},{}",
            self.settings.window_width, self.settings.window_height
        ))?;
        caps.add_arg(&format!("--user-agent={}", get_chrome_rua()))?;
        Ok(caps)
    }

    async fn drive(&self, driver: &WebDriver, url: &str) -> Result<RenderedPage, ScrapeError> {
        let tier = self.navigate(driver, url).await?;
        log::info!("Page settled at {:?} tier: {}", tier, url);

        if let Err(e) = self.scroll_to_bottom(driver).await {
            log::warn!("Scrolling failed on {}, capturing as-is: {:?}", url, e);
        }

        // Screenshot and HTML are independent side effects: losing the
        // screenshot must not cost us the page source.
        let screenshot = match driver.screenshot_as_png().await {
            Ok(png) => Some(png),
            Err(e) => {
                log::warn!("Screenshot capture failed on {}: {:?}", url, e);
                None
            }
        };

        let html = driver
            .source()
            .await
            .map_err(|source| ScrapeError::Navigation {
                url: url.to_string(),
                source: Some(source),
            })?;

        Ok(RenderedPage {
            html,
            screenshot,
            captured_at: Utc::now(),
        })
    }

    async fn navigate(&self, driver: &WebDriver, url: &str) -> Result<NavigationTier, ScrapeError> {
        if let Err(e) = driver
            .set_page_load_timeout(self.settings.network_idle_timeout())
            .await
        {
            return Err(ScrapeError::Navigation {
                url: url.to_string(),
                source: Some(e),
            });
        }

        match driver.goto(url).await {
            Ok(()) => match self.wait_for_network_idle(driver).await {
                Ok(true) => return Ok(NavigationTier::NetworkIdle),
                Ok(false) => log::warn!(
                    "Network never settled on {}, falling back to DOM readiness",
                    url
                ),
                Err(e) => log::warn!(
                    "Network idle polling failed on {}, falling back to DOM readiness: {:?}",
                    url,
                    e
                ),
            },
            Err(e) => log::warn!(
                "Navigation to {} did not complete, falling back to DOM readiness: {:?}",
                url,
                e
            ),
        }

        match self.wait_for_dom_ready(driver).await {
            Ok(true) => Ok(NavigationTier::DomReady),
            Ok(false) => Err(ScrapeError::Navigation {
                url: url.to_string(),
                source: None,
            }),
            Err(source) => Err(ScrapeError::Navigation {
                url: url.to_string(),
                source: Some(source),
            }),
        }
    }

    /// Idle means no new resource entries for a full quiet period. The count
    /// only ever grows, so a stable count is a quiet network.
    async fn wait_for_network_idle(&self, driver: &WebDriver) -> WebDriverResult<bool> {
        let deadline = Instant::now() + self.settings.network_idle_timeout();
        let mut last_count: Option<u64> = None;
        let mut stable_since = Instant::now();

        while Instant::now() < deadline {
            let count: u64 = driver
                .execute(RESOURCE_COUNT_SCRIPT, vec![])
                .await?
                .convert()?;

            if last_count == Some(count) {
                if stable_since.elapsed() >= self.settings.network_quiet_period() {
                    return Ok(true);
                }
            } else {
                last_count = Some(count);
                stable_since = Instant::now();
            }

            tokio::time::sleep(self.settings.poll_interval()).await;
        }

        Ok(false)
    }

    /// Chrome's own error documents report a ready DOM, so readiness also
    /// requires the settled URL to still be http(s).
    async fn wait_for_dom_ready(&self, driver: &WebDriver) -> WebDriverResult<bool> {
        let deadline = Instant::now() + self.settings.dom_ready_timeout();

        loop {
            let ready_state: String = driver
                .execute(READY_STATE_SCRIPT, vec![])
                .await?
                .convert()?;

            if ready_state != "loading" {
                let current = driver.current_url().await?;
                return Ok(matches!(current.scheme(), "http" | "https"));
            }

            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(self.settings.poll_interval()).await;
        }
    }

    /// Forces lazy-loaded sections into the DOM: keep stepping down until the
    /// scrolled distance catches up with a height that has stopped growing.
    /// Capped so infinite feeds cannot pin the session.
    async fn scroll_to_bottom(&self, driver: &WebDriver) -> WebDriverResult<()> {
        let step = self.settings.scroll_step_px;
        let mut scrolled: u64 = 0;

        for _ in 0..self.settings.max_scroll_steps {
            let height: u64 = driver
                .execute(SCROLL_SCRIPT, vec![serde_json::json!(step)])
                .await?
                .convert()?;

            scrolled += u64::from(step);
            if scrolled >= height {
                break;
            }

            tokio::time::sleep(self.settings.scroll_interval()).await;
        }

        Ok(())
    }
}
