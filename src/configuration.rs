use std::path::PathBuf;
use std::time::Duration;

use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(Clone, serde::Deserialize)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub cache: CacheSettings,
    pub renderer: RendererSettings,
    pub extractor: ExtractorSettings,
}

#[derive(Clone, serde::Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

#[derive(Clone, serde::Deserialize)]
pub struct CacheSettings {
    pub root: PathBuf,
}

// Every field here is a tuning knob, not structural logic. Defaults live in
// configuration.yaml.
#[derive(Clone, serde::Deserialize)]
pub struct RendererSettings {
    pub webdriver_url: String,
    pub window_width: u32,
    pub window_height: u32,
    pub network_idle_timeout_secs: u64,
    pub network_quiet_millis: u64,
    pub poll_interval_millis: u64,
    pub dom_ready_timeout_secs: u64,
    pub scroll_step_px: u32,
    pub scroll_interval_millis: u64,
    pub max_scroll_steps: u32,
}

impl RendererSettings {
    pub fn network_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.network_idle_timeout_secs)
    }

    pub fn network_quiet_period(&self) -> Duration {
        Duration::from_millis(self.network_quiet_millis)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_millis)
    }

    pub fn dom_ready_timeout(&self) -> Duration {
        Duration::from_secs(self.dom_ready_timeout_secs)
    }

    pub fn scroll_interval(&self) -> Duration {
        Duration::from_millis(self.scroll_interval_millis)
    }
}

#[derive(Clone, serde::Deserialize)]
pub struct ExtractorSettings {
    pub company_text_cap: usize,
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");

    let settings = config::Config::builder()
        .add_source(config::File::from(base_path.join("configuration.yaml")))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
