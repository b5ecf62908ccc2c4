//! Process-wide settings, resolved once at startup and passed to every component.

use std::time::Duration;

use secrecy::SecretString;

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_LAW_BASE_URL: &str = "https://www.law.go.kr";
pub const DEFAULT_DRF_BASE_URL: &str = "https://www.law.go.kr/DRF";

/// Bounds for direct network fetches (scrape, liveness, DRF).
pub const MIN_FETCH_TIMEOUT_SECS: u64 = 3;
pub const MAX_FETCH_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 8;

/// Shared configuration.
///
/// Optional services are `None` when unconfigured; components treat that as
/// "step unavailable", never as an error.
#[derive(Debug, Clone)]
pub struct Settings {
    /// OpenAI-compatible endpoint root, e.g. `https://api.openai.com/v1`.
    pub llm_base_url: String,
    /// Bearer token; local servers usually need none.
    pub llm_api_key: Option<SecretString>,
    pub model: String,
    /// Statute site root used for deep links.
    pub law_base_url: String,
    /// DRF open-API root.
    pub drf_base_url: String,
    /// DRF service key (`OC` parameter).
    pub drf_service_key: Option<SecretString>,
    /// Pass-through proxy in front of DRF (`/search`).
    pub proxy_url: Option<String>,
    /// Shared secret sent as `X-Proxy-Token`.
    pub proxy_token: Option<SecretString>,
    pub fetch_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            llm_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            law_base_url: DEFAULT_LAW_BASE_URL.to_string(),
            drf_base_url: DEFAULT_DRF_BASE_URL.to_string(),
            drf_service_key: None,
            proxy_url: None,
            proxy_token: None,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }
}

impl Settings {
    /// Set the fetch timeout, clamped to the allowed range.
    pub fn with_fetch_timeout_secs(mut self, secs: u64) -> Self {
        let secs = secs.clamp(MIN_FETCH_TIMEOUT_SECS, MAX_FETCH_TIMEOUT_SECS);
        self.fetch_timeout = Duration::from_secs(secs);
        self
    }
}

/// Treat unset and blank values alike.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// [`non_blank`] wrapped as a secret.
pub fn secret(value: Option<String>) -> Option<SecretString> {
    non_blank(value).map(SecretString::from)
}
