use std::time::Duration;

pub const SPONSORBLOCK_API_URL: &str = "https://sponsor.ajay.app/api/skipSegments";
pub const API_URL_ENV: &str = "SMARTSKIP_API_URL";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where and how segment lookups are sent.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub api_url: String,
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: SPONSORBLOCK_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ProviderConfig {
    /// Default provider, with the endpoint overridable through `SMARTSKIP_API_URL`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.api_url = url.trim().to_string();
            }
        }
        config
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        if self.api_url == SPONSORBLOCK_API_URL {
            "SponsorBlock"
        } else {
            "custom provider"
        }
    }
}
