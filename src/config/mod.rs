// ABOUTME: Configuration types and parsing for cfship.yml.
// ABOUTME: Handles YAML parsing, env var interpolation, and mapping to runtime settings.

mod env_value;
mod init;

pub use env_value::EnvValue;
pub use init::init_config;

use crate::deploy::{DeploySettings, StartupPolling};
use crate::error::{Error, Result};
use crate::pipeline::DEFAULT_ROLLBACK_MESSAGE;
use crate::platform::BitsTimeouts;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "cfship.yml";
pub const CONFIG_FILENAME_ALT: &str = "cfship.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".cfship/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,

    #[serde(default)]
    pub skip_ssl_validation: bool,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub deploy: DeployConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(deserialize_with = "deserialize_endpoint")]
    pub endpoint: String,
    pub token: EnvValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_staging_timeout", with = "humantime_serde")]
    pub staging_timeout: Duration,

    #[serde(default = "default_job_interval", with = "humantime_serde")]
    pub job_interval: Duration,

    #[serde(default = "default_upload_timeout", with = "humantime_serde")]
    pub upload_timeout: Duration,

    #[serde(default = "default_download_timeout", with = "humantime_serde")]
    pub download_timeout: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            staging_timeout: default_staging_timeout(),
            job_interval: default_job_interval(),
            upload_timeout: default_upload_timeout(),
            download_timeout: default_download_timeout(),
        }
    }
}

fn default_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_staging_timeout() -> Duration {
    Duration::from_secs(15 * 60)
}

fn default_job_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_upload_timeout() -> Duration {
    Duration::from_secs(15 * 60)
}

fn default_download_timeout() -> Duration {
    Duration::from_secs(2)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeployConfig {
    #[serde(default)]
    pub no_blue_green_deploy: bool,

    #[serde(default)]
    pub no_blue_green_restage: bool,

    #[serde(default = "default_rollback_message")]
    pub rollback_message: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            no_blue_green_deploy: false,
            no_blue_green_restage: false,
            rollback_message: default_rollback_message(),
        }
    }
}

fn default_rollback_message() -> String {
    DEFAULT_ROLLBACK_MESSAGE.to_string()
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    pub fn template() -> Self {
        Config {
            api: ApiConfig {
                endpoint: "https://api.example.com".to_string(),
                token: EnvValue::FromEnv {
                    var: "CF_TOKEN".to_string(),
                    default: None,
                },
            },
            skip_ssl_validation: false,
            polling: PollingConfig::default(),
            deploy: DeployConfig::default(),
        }
    }

    pub fn startup_polling(&self) -> StartupPolling {
        StartupPolling {
            interval: self.polling.interval,
            staging_timeout: self.polling.staging_timeout,
        }
    }

    pub fn bits_timeouts(&self) -> BitsTimeouts {
        BitsTimeouts {
            job_interval: self.polling.job_interval,
            upload_timeout: self.polling.upload_timeout,
            download_timeout: self.polling.download_timeout,
        }
    }

    pub fn deploy_settings(&self) -> DeploySettings {
        DeploySettings {
            no_blue_green_deploy: self.deploy.no_blue_green_deploy,
            no_blue_green_restage: self.deploy.no_blue_green_restage,
            rollback_message: self.deploy.rollback_message.clone(),
            polling: self.startup_polling(),
        }
    }
}

fn deserialize_endpoint<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let url = url::Url::parse(&s).map_err(serde::de::Error::custom)?;
    match url.scheme() {
        "http" | "https" => Ok(s.trim_end_matches('/').to_string()),
        other => Err(serde::de::Error::custom(format!(
            "endpoint must be http or https, got {other}"
        ))),
    }
}
