use std::{path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub browser: BrowserSettings,
    pub site: SiteSettings,
    pub scrape: ScrapeSettings,
    pub output: OutputSettings,
    pub credentials: Option<Credentials>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    /// Finished runs kept for the dashboard; older ones are forgotten.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub retained_runs: usize,
}

#[derive(Deserialize, Clone, Debug)]
pub struct BrowserSettings {
    pub webdriver_url: String,
    pub headless: bool,
    pub maximize_window: bool,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SiteSettings {
    pub base_url: String,
    pub search_url: String,
    pub login_url: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ScrapeSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_pages: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub per_page_cap: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub settle_delay_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub navigation_wait_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub poll_interval_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub inter_page_delay_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub inter_page_jitter_ms: u64,
}

impl ScrapeSettings {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn navigation_wait(&self) -> Duration {
        Duration::from_millis(self.navigation_wait_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct OutputSettings {
    pub directory: PathBuf,
    pub write_csv: bool,
    pub write_json: bool,
    pub write_summary: bool,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine the current directory: {}", e))
    })?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[cfg(test)]
pub(crate) fn test_scrape_settings() -> ScrapeSettings {
    ScrapeSettings {
        max_pages: 10,
        per_page_cap: 20,
        settle_delay_ms: 0,
        navigation_wait_ms: 30,
        poll_interval_ms: 2,
        inter_page_delay_ms: 0,
        inter_page_jitter_ms: 0,
    }
}
