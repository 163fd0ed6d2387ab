//! JSON-RPC ledger client configuration.
//!
//! Loaded from the environment or built explicitly for tests. The bearer
//! token is zeroized on drop and redacted from `Debug` output.

use url::Url;
use zeroize::Zeroizing;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for [`RpcLedger`](crate::RpcLedger).
#[derive(Clone)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint.
    pub url: Url,
    /// Optional bearer token.
    pub token: Option<Zeroizing<String>>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for LedgerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerConfig")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl LedgerConfig {
    /// Configuration for `url` with no token and the default timeout.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Parse `url` and build a configuration for it.
    pub fn for_url(url: &str) -> Result<Self, ConfigError> {
        let parsed =
            Url::parse(url).map_err(|e| ConfigError::InvalidUrl(url.to_string(), e.to_string()))?;
        Ok(Self::new(parsed))
    }

    /// Attach a bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(Zeroizing::new(token.into()));
        self
    }

    /// Load configuration from environment variables.
    ///
    /// - `CERTCHAIN_LEDGER_URL` (required)
    /// - `CERTCHAIN_LEDGER_TOKEN` (optional)
    /// - `CERTCHAIN_LEDGER_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = std::env::var("CERTCHAIN_LEDGER_URL").map_err(|_| ConfigError::MissingUrl)?;
        let url = Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidUrl("CERTCHAIN_LEDGER_URL".into(), e.to_string()))?;
        let token = std::env::var("CERTCHAIN_LEDGER_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .map(Zeroizing::new);
        let timeout_secs = match std::env::var("CERTCHAIN_LEDGER_TIMEOUT_SECS") {
            Ok(s) => s
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(s.clone()))?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };
        Ok(Self {
            url,
            token,
            timeout_secs,
        })
    }

    /// Ledger identifier derived from the endpoint host.
    pub fn ledger_id(&self) -> String {
        format!("rpc:{}", self.url.host_str().unwrap_or("unknown"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("CERTCHAIN_LEDGER_URL environment variable is required")]
    MissingUrl,
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid ledger timeout {0:?}: expected whole seconds")]
    InvalidTimeout(String),
}
