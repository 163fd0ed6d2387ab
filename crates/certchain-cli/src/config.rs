//! # CLI Configuration
//!
//! Loaded from a YAML file. Every field has a default, so an absent file
//! is a valid configuration.
//!
//! ```yaml
//! origin: https://certs.example.org
//! backend: plain-hash          # or succinct-proof
//! data_dir: .certchain
//! ledger:
//!   url: https://ledger.example/rpc   # omit for the local file ledger
//!   timeout_secs: 30
//! poll:
//!   interval_ms: 1000
//!   deadline_ms: 60000
//! retry:
//!   max_retries: 3
//!   base_delay_ms: 200
//! ```
//!
//! `CERTCHAIN_ORIGIN` overrides `origin`. The RPC bearer token is read from
//! `CERTCHAIN_LEDGER_TOKEN` and never from the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use certchain_ledger::{LedgerConfig, PollPolicy, RetryPolicy};
use certchain_zkp::BackendKind;
use serde::{Deserialize, Serialize};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "certchain.yaml";

/// Public origin used for share links when nothing else is configured.
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Ledger connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSection {
    /// JSON-RPC endpoint. `None` selects the local file-backed ledger.
    pub url: Option<String>,
    /// Request timeout for the RPC ledger.
    pub timeout_secs: u64,
    /// Confirmation depth for the local ledger.
    pub local_confirmations: u64,
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: certchain_ledger::config::DEFAULT_TIMEOUT_SECS,
            local_confirmations: 0,
        }
    }
}

impl LedgerSection {
    /// RPC client configuration, if an endpoint is set.
    pub fn rpc_config(&self) -> Result<Option<LedgerConfig>> {
        let Some(url) = &self.url else {
            return Ok(None);
        };
        let mut config = LedgerConfig::for_url(url)?;
        config.timeout_secs = self.timeout_secs;
        if let Ok(token) = std::env::var("CERTCHAIN_LEDGER_TOKEN") {
            if !token.is_empty() {
                config = config.with_token(token);
            }
        }
        Ok(Some(config))
    }
}

/// Top-level CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertchainConfig {
    pub origin: String,
    pub backend: BackendKind,
    pub data_dir: PathBuf,
    pub ledger: LedgerSection,
    pub poll: PollPolicy,
    pub retry: RetryPolicy,
}

impl Default for CertchainConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            backend: BackendKind::default(),
            data_dir: PathBuf::from(".certchain"),
            ledger: LedgerSection::default(),
            poll: PollPolicy::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl CertchainConfig {
    /// Parse a YAML document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).context("invalid certchain configuration")
    }

    /// Load `path`, or `certchain.yaml` in the working directory if present,
    /// or the defaults. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)
                    .with_context(|| format!("failed to read config: {}", p.display()))?;
                Self::from_yaml(&text)
                    .with_context(|| format!("failed to parse config: {}", p.display()))?
            }
            None => match std::fs::read_to_string(DEFAULT_CONFIG_FILE) {
                Ok(text) => Self::from_yaml(&text)
                    .with_context(|| format!("failed to parse {DEFAULT_CONFIG_FILE}"))?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
                Err(e) => {
                    return Err(e).context(format!("failed to read {DEFAULT_CONFIG_FILE}"))
                }
            },
        };
        config.apply_env(std::env::var("CERTCHAIN_ORIGIN").ok());
        Ok(config)
    }

    fn apply_env(&mut self, origin: Option<String>) {
        if let Some(origin) = origin.filter(|o| !o.trim().is_empty()) {
            tracing::debug!(%origin, "origin overridden by CERTCHAIN_ORIGIN");
            self.origin = origin;
        }
    }
}
