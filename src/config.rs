use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the customer REST backend.
    pub api_base_url: String,
    /// Base URL of the login endpoint. Defaults to `api_base_url`.
    pub auth_base_url: String,
    /// Where the session credential is persisted between runs.
    pub session_file: PathBuf,
    /// Per-request timeout. `None` leaves requests unbounded.
    pub http_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("API_BASE_URL")
            .ok_or_else(|| anyhow::anyhow!("API_BASE_URL environment variable required"))
            .and_then(|url| validate_base_url("API_BASE_URL", url))?;

        let auth_base_url = match lookup("AUTH_BASE_URL").filter(|s| !s.trim().is_empty()) {
            Some(url) => validate_base_url("AUTH_BASE_URL", url)?,
            None => api_base_url.clone(),
        };

        let session_file = lookup("SESSION_FILE")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_session_file);

        let http_timeout = match lookup("HTTP_TIMEOUT_SECS").filter(|s| !s.trim().is_empty()) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    anyhow::anyhow!("HTTP_TIMEOUT_SECS must be a positive whole number")
                })?;
                if secs == 0 {
                    anyhow::bail!("HTTP_TIMEOUT_SECS must be a positive whole number");
                }
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let config = Self {
            api_base_url,
            auth_base_url,
            session_file,
            http_timeout,
        };

        tracing::debug!("API Base URL: {}", config.api_base_url);
        tracing::debug!("Auth Base URL: {}", config.auth_base_url);
        tracing::debug!("Session file: {}", config.session_file.display());
        match config.http_timeout {
            Some(timeout) => tracing::debug!("HTTP timeout: {}s", timeout.as_secs()),
            None => tracing::debug!("HTTP timeout: none"),
        }

        Ok(config)
    }
}

fn validate_base_url(name: &str, url: String) -> anyhow::Result<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        anyhow::bail!("{} cannot be empty", name);
    }
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Url::parse(trimmed).map_err(|e| anyhow::anyhow!("{} is not a valid URL: {}", name, e))?;
    Ok(trimmed.trim_end_matches('/').to_string())
}

fn default_session_file() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("bank-admin"))
        .unwrap_or_else(|| PathBuf::from(".bank-admin"))
        .join("session.json")
}
