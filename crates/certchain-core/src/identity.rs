//! # Identity Newtypes
//!
//! Newtype wrappers for the identifiers that flow through the pipeline.
//! You cannot pass an `IssuerId` where an `OwnerAddress` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Globally unique certificate identifier. Assigned at creation, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CertificateId(Uuid);

impl CertificateId {
    /// Generate a new random certificate identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse from the textual UUID form.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| CoreError::InvalidIdentifier {
                kind: "certificate id",
                reason: format!("{s:?}: {e}"),
            })
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CertificateId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CertificateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the issuing organization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssuerId(String);

impl IssuerId {
    /// Create an issuer id, rejecting blank values.
    pub fn new(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(CoreError::InvalidIdentifier {
                kind: "issuer id",
                reason: "must not be empty".into(),
            });
        }
        Ok(Self(s))
    }

    /// The issuer id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IssuerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wallet address of a record owner.
///
/// The original casing is preserved for display. Comparison goes through
/// [`OwnerAddress::matches()`]: hex addresses (`0x…`) compare
/// case-insensitively because checksummed and lowercase renderings denote
/// the same account; every other encoding (e.g. base58) compares exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerAddress(String);

impl OwnerAddress {
    /// Create an owner address. Surrounding whitespace is trimmed.
    pub fn new(s: impl AsRef<str>) -> Result<Self, CoreError> {
        let s = s.as_ref().trim();
        if s.is_empty() {
            return Err(CoreError::InvalidIdentifier {
                kind: "owner address",
                reason: "must not be empty".into(),
            });
        }
        if s.chars().any(char::is_whitespace) {
            return Err(CoreError::InvalidIdentifier {
                kind: "owner address",
                reason: format!("{s:?} contains whitespace"),
            });
        }
        Ok(Self(s.to_string()))
    }

    /// The address as supplied.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is a `0x`-prefixed hex address.
    pub fn is_hex(&self) -> bool {
        let body = self
            .0
            .strip_prefix("0x")
            .or_else(|| self.0.strip_prefix("0X"));
        matches!(body, Some(b) if !b.is_empty() && b.chars().all(|c| c.is_ascii_hexdigit()))
    }

    /// Ownership comparison.
    pub fn matches(&self, other: &OwnerAddress) -> bool {
        if self.is_hex() && other.is_hex() {
            self.0.eq_ignore_ascii_case(&other.0)
        } else {
            self.0 == other.0
        }
    }
}

impl std::fmt::Display for OwnerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certificate_id_parse_roundtrip() {
        let id = CertificateId::new();
        assert_eq!(CertificateId::parse(&id.to_string()).unwrap(), id);
        assert!(CertificateId::parse("cert-123").is_err());
    }

    #[test]
    fn certificate_ids_are_unique() {
        assert_ne!(CertificateId::new(), CertificateId::new());
    }

    #[test]
    fn issuer_id_rejects_blank() {
        assert!(IssuerId::new("  ").is_err());
        assert_eq!(IssuerId::new("issuer-1").unwrap().as_str(), "issuer-1");
    }

    #[test]
    fn hex_addresses_match_case_insensitively() {
        let a = OwnerAddress::new("0xAbCdEf0123456789abcdef0123456789ABCDEF01").unwrap();
        let b = OwnerAddress::new("0xabcdef0123456789abcdef0123456789abcdef01").unwrap();
        assert!(a.is_hex());
        assert!(a.matches(&b));
        assert!(b.matches(&a));
    }

    #[test]
    fn non_hex_addresses_match_exactly() {
        let a = OwnerAddress::new("7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU").unwrap();
        let b = OwnerAddress::new("7xkxtg2cw87d97txjsdpbd5jbkhetqa83tzrujosgasu").unwrap();
        assert!(!a.is_hex());
        assert!(!a.matches(&b));
        assert!(a.matches(&a.clone()));
    }

    #[test]
    fn different_hex_addresses_do_not_match() {
        let a = OwnerAddress::new("0x01").unwrap();
        let b = OwnerAddress::new("0x02").unwrap();
        assert!(!a.matches(&b));
    }

    #[test]
    fn owner_address_validation() {
        assert!(OwnerAddress::new("").is_err());
        assert!(OwnerAddress::new("0x12 34").is_err());
        assert_eq!(OwnerAddress::new("  0x12  ").unwrap().as_str(), "0x12");
        assert!(!OwnerAddress::new("0x").unwrap().is_hex());
    }
}
