//! # Certificate Metadata
//!
//! The human-facing fields of a certificate. All fields are immutable once
//! committed; the commitment encoding in `certchain-zkp` reads them in a
//! fixed order.
//!
//! Dates are stored as the strings the issuer supplied. [`CertificateMetadata::validate()`]
//! checks them, and the commitment encoder calls it, so a malformed date is
//! an encoding error rather than a silently normalized value.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::identity::IssuerId;
use crate::temporal::CalendarDate;

/// Immutable certificate metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateMetadata {
    /// Certificate title.
    pub name: String,
    /// Free-form description. May be empty.
    pub description: String,
    /// Recipient the certificate is issued to.
    pub issued_to: String,
    /// Issuing organization identifier.
    pub issuer_id: IssuerId,
    /// Issuing organization display name.
    pub issuer_name: String,
    /// Issue date, `YYYY-MM-DD`.
    pub issue_date: String,
    /// Optional expiry date, `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
}

impl CertificateMetadata {
    /// Check that every date field parses and that expiry does not precede issue.
    pub fn validate(&self) -> Result<(), CoreError> {
        let issued = self.issue_date()?;
        if let Some(expiry) = self.expiry_date()? {
            if expiry < issued {
                return Err(CoreError::InvalidDate {
                    field: "expiryDate",
                    value: expiry.to_string(),
                    reason: format!("precedes issue date {issued}"),
                });
            }
        }
        Ok(())
    }

    /// Parsed issue date.
    pub fn issue_date(&self) -> Result<CalendarDate, CoreError> {
        CalendarDate::parse("issueDate", &self.issue_date)
    }

    /// Parsed expiry date, if any.
    pub fn expiry_date(&self) -> Result<Option<CalendarDate>, CoreError> {
        self.expiry_date
            .as_deref()
            .map(|s| CalendarDate::parse("expiryDate", s))
            .transpose()
    }
}

/// Partially filled metadata as submitted by an uploader.
///
/// Missing fields fall back to the defaults the issuing UI has always used,
/// applied by [`MetadataDraft::complete()`] before anything is committed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub issued_to: Option<String>,
    #[serde(default)]
    pub issuer_id: Option<String>,
    #[serde(default)]
    pub issuer_name: Option<String>,
    #[serde(default)]
    pub issue_date: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<String>,
}

/// Default title for certificates uploaded without a name.
pub const DEFAULT_NAME: &str = "Untitled Certificate";
/// Default recipient.
pub const DEFAULT_RECIPIENT: &str = "Unknown";
/// Default issuer id.
pub const DEFAULT_ISSUER_ID: &str = "issuer-unknown";
/// Default issuer display name.
pub const DEFAULT_ISSUER_NAME: &str = "Unknown Issuer";

impl MetadataDraft {
    /// Fill defaults and validate. `today` supplies the default issue date.
    ///
    /// Blank strings count as missing, except for `description` which may be
    /// legitimately empty. A blank `expiryDate` means "no expiry".
    pub fn complete(self, today: CalendarDate) -> Result<CertificateMetadata, CoreError> {
        fn present(v: Option<String>) -> Option<String> {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }

        let metadata = CertificateMetadata {
            name: present(self.name).unwrap_or_else(|| DEFAULT_NAME.to_string()),
            description: self.description.unwrap_or_default(),
            issued_to: present(self.issued_to).unwrap_or_else(|| DEFAULT_RECIPIENT.to_string()),
            issuer_id: IssuerId::new(
                present(self.issuer_id).unwrap_or_else(|| DEFAULT_ISSUER_ID.to_string()),
            )?,
            issuer_name: present(self.issuer_name)
                .unwrap_or_else(|| DEFAULT_ISSUER_NAME.to_string()),
            issue_date: present(self.issue_date).unwrap_or_else(|| today.to_string()),
            expiry_date: present(self.expiry_date),
        };
        metadata.validate()?;
        Ok(metadata)
    }
}
