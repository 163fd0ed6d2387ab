//! # JSON-RPC Ledger Client
//!
//! Talks JSON-RPC 2.0 to a commitment log service.
//!
//! | Method | Params | Result |
//! |--------|--------|--------|
//! | `commitment_lookup` | `[digest]` | reference or `null` |
//! | `commitment_submit` | `[{scheme, digest}]` | reference |
//! | `commitment_status` | `[reference]` | `"pending"` \| `"confirmed"` \| `"not_found"` |
//! | `commitment_get` | `[reference]` | `{scheme, digest}` or `null` |
//!
//! Transport failures, timeouts, HTTP 429 and 5xx map to
//! [`LedgerError::Unavailable`]. Other HTTP errors and JSON-RPC error
//! objects map to [`LedgerError::Rejected`]. Malformed bodies map to
//! [`LedgerError::Protocol`].
//!
//! `publish` is lookup-before-write: a commitment already on the ledger is
//! never submitted twice.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use certchain_zkp::Commitment;
use serde_json::{json, Value};

use crate::anchor::{LedgerAnchor, LedgerReference, LedgerStatus};
use crate::config::LedgerConfig;
use crate::error::LedgerError;

/// JSON-RPC ledger client.
#[derive(Debug)]
pub struct RpcLedger {
    client: reqwest::Client,
    config: LedgerConfig,
    ledger_id: String,
    next_id: AtomicU64,
}

impl RpcLedger {
    /// Build a client from configuration.
    pub fn new(config: LedgerConfig) -> Result<Self, LedgerError> {
        let ledger_id = config.ledger_id();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LedgerError::Unavailable {
                ledger: ledger_id.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            config,
            ledger_id,
            next_id: AtomicU64::new(1),
        })
    }

    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });

        let mut req = self.client.post(self.config.url.clone()).json(&body);
        if let Some(token) = &self.config.token {
            req = req.bearer_auth(token.as_str());
        }

        let resp = req.send().await.map_err(|e| LedgerError::Unavailable {
            ledger: self.ledger_id.clone(),
            reason: if e.is_timeout() {
                format!("{method}: request timed out")
            } else {
                format!("{method}: {e}")
            },
        })?;

        let status = resp.status();
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LedgerError::Unavailable {
                ledger: self.ledger_id.clone(),
                reason: format!("{method}: HTTP {status}"),
            });
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(LedgerError::Rejected {
                ledger: self.ledger_id.clone(),
                reason: format!("{method}: HTTP {status}: {text}"),
            });
        }

        let json: Value = resp.json().await.map_err(|e| self.protocol(method, e))?;

        if let Some(error) = json.get("error") {
            let msg = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown RPC error");
            let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
            return Err(LedgerError::Rejected {
                ledger: self.ledger_id.clone(),
                reason: format!("{method}: {msg} (code {code})"),
            });
        }

        json.get("result")
            .cloned()
            .ok_or_else(|| self.protocol(method, "response missing 'result' field"))
    }

    fn protocol(&self, method: &str, reason: impl std::fmt::Display) -> LedgerError {
        LedgerError::Protocol {
            ledger: self.ledger_id.clone(),
            reason: format!("{method}: {reason}"),
        }
    }

    fn reference_from(&self, method: &str, v: Value) -> Result<LedgerReference, LedgerError> {
        match v {
            Value::String(s) if !s.is_empty() => Ok(LedgerReference::new(s)),
            other => Err(self.protocol(method, format!("expected reference string, got {other}"))),
        }
    }
}

#[async_trait]
impl LedgerAnchor for RpcLedger {
    fn ledger_id(&self) -> &str {
        &self.ledger_id
    }

    async fn lookup(&self, commitment: &Commitment) -> Result<Option<LedgerReference>, LedgerError> {
        let result = self
            .rpc_call("commitment_lookup", json!([commitment.digest]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        self.reference_from("commitment_lookup", result).map(Some)
    }

    async fn publish(&self, commitment: &Commitment) -> Result<LedgerReference, LedgerError> {
        if let Some(existing) = self.lookup(commitment).await? {
            tracing::debug!(ledger = %self.ledger_id, reference = %existing, "publish dedup hit");
            return Ok(existing);
        }
        let result = self
            .rpc_call("commitment_submit", json!([commitment]))
            .await?;
        let reference = self.reference_from("commitment_submit", result)?;
        tracing::info!(ledger = %self.ledger_id, reference = %reference, "commitment submitted");
        Ok(reference)
    }

    async fn resolve(&self, reference: &LedgerReference) -> Result<LedgerStatus, LedgerError> {
        let result = self
            .rpc_call("commitment_status", json!([reference]))
            .await?;
        serde_json::from_value(result).map_err(|e| self.protocol("commitment_status", e))
    }

    async fn verify(
        &self,
        reference: &LedgerReference,
        commitment: &Commitment,
    ) -> Result<bool, LedgerError> {
        let result = self.rpc_call("commitment_get", json!([reference])).await?;
        if result.is_null() {
            return Ok(false);
        }
        let stored: Commitment =
            serde_json::from_value(result).map_err(|e| self.protocol("commitment_get", e))?;
        Ok(&stored == commitment)
    }
}
