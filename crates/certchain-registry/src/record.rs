//! # Certificate Record
//!
//! The unit of persistence. A record binds immutable metadata, the content
//! id of the uploaded file, and the commitment over both, to a mutable
//! lifecycle and an optional ledger reference.
//!
//! `metadata`, `content_id`, `committed_at` and `commitment` never change
//! after creation. `ledger_reference` is set at most once.

use certchain_core::{CertificateId, CertificateMetadata, OwnerAddress, Timestamp};
use certchain_crypto::ContentId;
use certchain_ledger::LedgerReference;
use certchain_state::{CertificateLifecycle, CertificateState};
use certchain_zkp::Commitment;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::objects::ObjectLocator;

/// Kind of uploaded certificate file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// `application/pdf`.
    Pdf,
    /// Any `image/*` type.
    Image,
}

impl FileKind {
    /// Classify a MIME type. Anything other than PDF or an image is rejected.
    pub fn from_mime(mime: &str) -> Result<Self, RegistryError> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if essence == "application/pdf" {
            Ok(Self::Pdf)
        } else if essence
            .strip_prefix("image/")
            .is_some_and(|sub| !sub.is_empty())
        {
            Ok(Self::Image)
        } else {
            Err(RegistryError::Input(format!(
                "unsupported file type {mime:?}: expected a PDF or an image"
            )))
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
        })
    }
}

/// A persisted certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRecord {
    pub id: CertificateId,
    pub metadata: CertificateMetadata,
    pub content_id: ContentId,
    pub locator: ObjectLocator,
    pub file_kind: FileKind,
    /// Timestamp bound into the commitment.
    pub committed_at: Timestamp,
    pub commitment: Commitment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_reference: Option<LedgerReference>,
    pub lifecycle: CertificateLifecycle,
    pub owner: OwnerAddress,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CertificateRecord {
    /// Stored lifecycle state.
    pub fn state(&self) -> CertificateState {
        self.lifecycle.state()
    }

    /// State as observed at `now`, with expiry applied.
    pub fn effective_state(&self, now: Timestamp) -> CertificateState {
        self.lifecycle.effective_state(now)
    }

    /// Whether `address` owns this record.
    pub fn is_owned_by(&self, address: &OwnerAddress) -> bool {
        self.owner.matches(address)
    }

    /// Attach the ledger reference. Setting the same reference again is a
    /// no-op; replacing one is refused.
    pub fn attach_reference(&mut self, reference: LedgerReference) -> Result<(), RegistryError> {
        match &self.ledger_reference {
            Some(existing) if *existing == reference => Ok(()),
            Some(existing) => Err(RegistryError::Consistency {
                id: self.id,
                reason: format!(
                    "ledger reference already set to {existing}, refusing {reference}"
                ),
            }),
            None => {
                self.ledger_reference = Some(reference);
                Ok(())
            }
        }
    }

    /// Advance `updated_at` to `now`. Never moves it backwards.
    pub fn touch(&mut self, now: Timestamp) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}
