//! # Canonical Commitment Input
//!
//! The byte encoding that every backend commits to:
//!
//! ```text
//! JCS({
//!   "contentId": "sha256:<hex>",
//!   "metadata": {
//!     "description", "expiryDate" | null, "issueDate", "issuedTo",
//!     "issuerId", "issuerName", "name"
//!   },
//!   "timestamp": "YYYY-MM-DDTHH:MM:SSZ",
//!   "v": 1
//! })
//! ```
//!
//! Every metadata field is always present. An absent expiry date is `null`,
//! which JCS keeps distinct from `""`. Dates are validated before encoding;
//! they are committed exactly as supplied, never reformatted.

use certchain_core::{CanonicalBytes, CertificateMetadata, Timestamp};
use certchain_crypto::ContentId;
use serde_json::{json, Value};

use crate::error::CommitmentError;

/// Encoding version bound into every commitment.
pub const ENCODING_VERSION: u64 = 1;

/// Build the commitment input as a JSON value.
///
/// # Errors
///
/// [`CommitmentError::Encoding`] if a date field is malformed.
pub fn commitment_input(
    metadata: &CertificateMetadata,
    content_id: &ContentId,
    timestamp: &Timestamp,
) -> Result<Value, CommitmentError> {
    metadata.validate()?;
    Ok(json!({
        "contentId": content_id.to_string(),
        "metadata": {
            "description": metadata.description,
            "expiryDate": metadata.expiry_date,
            "issueDate": metadata.issue_date,
            "issuedTo": metadata.issued_to,
            "issuerId": metadata.issuer_id.as_str(),
            "issuerName": metadata.issuer_name,
            "name": metadata.name,
        },
        "timestamp": timestamp.to_iso8601(),
        "v": ENCODING_VERSION,
    }))
}

/// Canonical bytes of the commitment input.
pub fn encode_commitment_input(
    metadata: &CertificateMetadata,
    content_id: &ContentId,
    timestamp: &Timestamp,
) -> Result<CanonicalBytes, CommitmentError> {
    Ok(CanonicalBytes::from_value(commitment_input(
        metadata, content_id, timestamp,
    )?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use certchain_core::IssuerId;
    use certchain_crypto::address_of;

    fn metadata() -> CertificateMetadata {
        CertificateMetadata {
            name: "X".into(),
            description: String::new(),
            issued_to: "Y".into(),
            issuer_id: IssuerId::new("issuer-1").unwrap(),
            issuer_name: "Acme University".into(),
            issue_date: "2025-01-01".into(),
            expiry_date: None,
        }
    }

    fn encoded(m: &CertificateMetadata) -> String {
        let id = address_of(b"file").unwrap();
        let ts = Timestamp::parse("2025-01-01T00:00:00Z").unwrap();
        let cb = encode_commitment_input(m, &id, &ts).unwrap();
        String::from_utf8(cb.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn layout_is_fixed() {
        let s = encoded(&metadata());
        let id = address_of(b"file").unwrap();
        assert_eq!(
            s,
            format!(
                r#"{{"contentId":"{id}","metadata":{{"description":"","expiryDate":null,"issueDate":"2025-01-01","issuedTo":"Y","issuerId":"issuer-1","issuerName":"Acme University","name":"X"}},"timestamp":"2025-01-01T00:00:00Z","v":1}}"#
            )
        );
    }

    #[test]
    fn absent_expiry_differs_from_present() {
        let mut with_expiry = metadata();
        with_expiry.expiry_date = Some("2030-01-01".into());
        assert_ne!(encoded(&metadata()), encoded(&with_expiry));
    }

    #[test]
    fn malformed_date_is_encoding_error() {
        let mut m = metadata();
        m.issue_date = "2025-13-01".into();
        let id = address_of(b"file").unwrap();
        let err = encode_commitment_input(&m, &id, &Timestamp::now()).unwrap_err();
        assert!(matches!(err, CommitmentError::Encoding(_)));
        assert!(err.to_string().contains("issueDate"));
    }

    #[test]
    fn malformed_expiry_is_encoding_error() {
        let mut m = metadata();
        m.expiry_date = Some("next year".into());
        let id = address_of(b"file").unwrap();
        assert!(encode_commitment_input(&m, &id, &Timestamp::now()).is_err());
    }
}
