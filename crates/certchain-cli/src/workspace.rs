//! # Local Workspace
//!
//! The data directory the CLI operates on:
//!
//! ```text
//! <data_dir>/
//!   objects/sha256/ab/abcd…   certificate files (filesystem CAS)
//!   records.json              certificate records
//!   ledger.json               local ledger snapshot (absent with an RPC ledger)
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use certchain_crypto::BlobStore;
use certchain_ledger::{LedgerAnchor, MockLedger, MockLedgerSnapshot, RpcLedger};
use certchain_registry::{CasObjectStore, CertificateService, JsonFileRecordStore};

use crate::config::CertchainConfig;

/// Identifier of the file-backed local ledger.
pub const LOCAL_LEDGER_ID: &str = "local";

/// An opened data directory and the service wired over it.
#[derive(Debug)]
pub struct Workspace {
    pub config: CertchainConfig,
    pub service: CertificateService,
    local_ledger: Option<(Arc<MockLedger>, PathBuf)>,
}

impl Workspace {
    /// Open (creating if needed) the configured data directory.
    pub async fn open(config: CertchainConfig) -> Result<Self> {
        let dir = config.data_dir.clone();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create data dir: {}", dir.display()))?;

        let records = JsonFileRecordStore::open(dir.join("records.json")).await?;
        let objects = CasObjectStore::new(BlobStore::new(dir.join("objects")));

        let (ledger, local_ledger): (Arc<dyn LedgerAnchor>, _) = match config.ledger.rpc_config()? {
            Some(rpc) => {
                tracing::debug!(?rpc, "using RPC ledger");
                (Arc::new(RpcLedger::new(rpc)?), None)
            }
            None => {
                let path = dir.join("ledger.json");
                let local = Arc::new(load_local_ledger(&path, config.ledger.local_confirmations)?);
                (local.clone(), Some((local, path)))
            }
        };

        let service = CertificateService::new(
            Arc::new(records),
            Arc::new(objects),
            ledger,
            config.backend.build(),
        )
        .with_retry(config.retry)
        .with_poll(config.poll);

        tracing::debug!(data_dir = %dir.display(), backend = %config.backend, "workspace opened");
        Ok(Self {
            config,
            service,
            local_ledger,
        })
    }

    /// Persist the local ledger, if one is in use.
    pub fn save(&self) -> Result<()> {
        let Some((ledger, path)) = &self.local_ledger else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(&ledger.snapshot())?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

fn load_local_ledger(path: &Path, confirmations: u64) -> Result<MockLedger> {
    match std::fs::read(path) {
        Ok(bytes) => {
            let snapshot: MockLedgerSnapshot = serde_json::from_slice(&bytes)
                .with_context(|| format!("corrupt ledger file: {}", path.display()))?;
            Ok(MockLedger::from_snapshot(LOCAL_LEDGER_ID, snapshot))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Ok(MockLedger::with_confirmations(LOCAL_LEDGER_ID, confirmations))
        }
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_ledger_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let config = CertchainConfig {
            data_dir: dir.path().to_path_buf(),
            ..CertchainConfig::default()
        };

        let ws = Workspace::open(config.clone()).await.unwrap();
        let (ledger, _) = ws.local_ledger.as_ref().unwrap();
        ledger.mine(5);
        ws.save().unwrap();

        let reopened = Workspace::open(config).await.unwrap();
        let (ledger, _) = reopened.local_ledger.as_ref().unwrap();
        assert_eq!(ledger.snapshot().height, 5);
        assert!(dir.path().join("ledger.json").is_file());
    }
}
