use crate::errors::AppError;
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_OUTPUT_PATH: &str = "chart/index.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub token: Option<String>,
    pub interval: Duration,
    pub output_path: PathBuf,
}

impl Settings {
    pub fn resolve(
        base_url: &str,
        token: Option<String>,
        interval_secs: u64,
        output_path: PathBuf,
    ) -> Result<Self, AppError> {
        let base_url = base_url.trim().trim_end_matches('/');
        Url::parse(base_url)
            .map_err(|err| AppError::config(format!("base url `{base_url}`: {err}")))?;

        if interval_secs == 0 {
            return Err(AppError::config("poll interval must be at least one second"));
        }

        let token = token
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        Ok(Self {
            base_url: base_url.to_string(),
            token,
            interval: Duration::from_secs(interval_secs),
            output_path,
        })
    }
}
