/// Backend endpoint configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development; override via
/// environment variables in other deployments.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the CoinCraft backend, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

/// Default backend endpoint for local development.
const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default per-request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

impl ApiConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default                 |
    /// |----------------------------------|-------------------------|
    /// | `COINCRAFT_API_URL`              | `http://localhost:8000` |
    /// | `COINCRAFT_REQUEST_TIMEOUT_SECS` | `10`                    |
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("COINCRAFT_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());

        let request_timeout_secs: u64 = std::env::var("COINCRAFT_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout_secs,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}
