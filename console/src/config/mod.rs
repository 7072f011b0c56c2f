use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use evadmin_client::resources::Credentials;
use evadmin_utils::logger::LoggerConfig;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,

    pub session: SessionConfig,

    pub list: ListConfig,

    pub logger: LoggerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Root of the back-office API, every resource path is appended to it.
    ///
    /// Default: `http://localhost:5001/api`
    pub base_url: String,

    /// Per-request timeout.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001/api".to_owned(),
            timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Where the token pair is kept between invocations.
    pub path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("evadmin-session.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    pub page_size: u32,

    /// Quiet period before typed text becomes a filter.
    #[serde(with = "humantime_serde")]
    pub debounce: Duration,

    #[serde(with = "humantime_serde")]
    pub vehicles_debounce: Duration,

    pub vehicles_page_size: u32,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: 5,
            debounce: Duration::from_millis(500),
            vehicles_debounce: Duration::from_millis(400),
            vehicles_page_size: 10,
        }
    }
}

/// Login password, loaded exclusively from the environment.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct LoginSecrets {
    pub password: String,
}

impl LoginSecrets {
    pub const PASSWORD_ENV: &str = "EVADMIN_PASSWORD";

    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            password: std::env::var(Self::PASSWORD_ENV)
                .with_context(|| format!("{} not set", Self::PASSWORD_ENV))?,
        })
    }

    pub fn credentials(&self, email: &str) -> Credentials {
        Credentials::new(email, self.password.as_str())
    }
}
